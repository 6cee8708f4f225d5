//! Server-rendered HTML pages
//!
//! Every page shares one layout: navigation that reflects whether the visitor
//! is signed in, and the flash messages queued on their session.

use axum::http::StatusCode;
use axum::response::Html;

use crate::store::{Flash, FlashLevel, Report};

/// Per-request data the layout needs
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub authenticated: bool,
    pub user_name: Option<String>,
    pub flashes: Vec<Flash>,
}

impl PageContext {
    /// Context for pages rendered without a session (fallback errors)
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Escape text for use in HTML content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn nav(ctx: &PageContext, active: &str) -> String {
    let link = |href: &str, name: &str, label: &str| {
        let class = if name == active { " class=\"active\"" } else { "" };
        format!("<a href=\"{}\"{}>{}</a>", href, class, label)
    };

    let mut items = vec![link("/", "home", "Home")];
    if ctx.authenticated {
        items.push(link("/history", "history", "History"));
        if let Some(name) = &ctx.user_name {
            items.push(format!("<span class=\"user\">{}</span>", escape(name)));
        }
        items.push(link("/logout", "logout", "Logout"));
    } else {
        items.push(link("/login", "login", "Login"));
    }
    items.join("\n        ")
}

fn flashes(ctx: &PageContext) -> String {
    ctx.flashes
        .iter()
        .map(|f| {
            let class = match f.level {
                FlashLevel::Success => "flash flash-success",
                FlashLevel::Error => "flash flash-error",
            };
            format!("<div class=\"{}\">{}</div>", class, escape(&f.message))
        })
        .collect::<Vec<_>>()
        .join("\n    ")
}

fn layout(title: &str, active: &str, ctx: &PageContext, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} | MarketMapper</title>
    <link rel="stylesheet" href="/public/style.css">
</head>
<body>
    <header>
        <span class="brand">MarketMapper</span>
        <nav>
        {nav}
        </nav>
    </header>
    {flashes}
    <main>
{body}
    </main>
</body>
</html>
"#,
        title = escape(title),
        nav = nav(ctx, active),
        flashes = flashes(ctx),
        body = body,
    ))
}

/// GET / - submission form
pub fn home_page(ctx: &PageContext) -> Html<String> {
    let body = r#"        <h1>Is your business idea viable here?</h1>
        <p>Describe the business and pick a spot. We look at competitors, complementary
        businesses and transit access within 1 km and score the location.</p>
        <form method="post" action="/result" class="submission">
            <label>Business <input name="business" placeholder="coffee shop" required></label>
            <label>Location <input name="location" placeholder="Downtown" required></label>
            <label>Latitude <input name="lat" placeholder="12.9716" required></label>
            <label>Longitude <input name="lon" placeholder="77.5946" required></label>
            <button type="submit">Analyse</button>
        </form>"#;
    layout("Home", "home", ctx, body)
}

/// GET /login
pub fn login_page(ctx: &PageContext) -> Html<String> {
    let body = r#"        <h1>Continue with Google</h1>
        <p>Sign in to analyse locations and browse past reports.</p>
        <a class="button" href="/auth/google">Continue with Google</a>"#;
    layout("Continue with Google", "login", ctx, body)
}

fn score_table(report: &Report) -> String {
    let s = &report.score.scores;
    format!(
        r#"<table class="scores">
            <tr><th>Competition</th><td>{:.0}</td></tr>
            <tr><th>Complementary</th><td>{:.0}</td></tr>
            <tr><th>Accessibility</th><td>{:.0}</td></tr>
            <tr><th>Density</th><td>{:.0}</td></tr>
            <tr class="overall"><th>Overall</th><td>{:.0}</td></tr>
        </table>"#,
        s.competition,
        s.complementary,
        s.accessibility,
        s.density,
        report.score.overall(),
    )
}

/// POST /result - the freshly saved report
pub fn result_page(ctx: &PageContext, report: &Report) -> Html<String> {
    let body = format!(
        r#"        <h1>{business} in {location}</h1>
        <p class="coords">{lat}, {lon}</p>
        {table}
        <p class="verdict">{verdict}</p>
        <a href="/history">See all reports</a>"#,
        business = escape(&report.business),
        location = escape(&report.location),
        lat = report.latitude,
        lon = report.longitude,
        table = score_table(report),
        verdict = escape(&report.score.verdict),
    );
    layout("Result", "result", ctx, &body)
}

/// GET /history - every stored report, newest first
pub fn history_page(ctx: &PageContext, reports: &[Report]) -> Html<String> {
    let body = if reports.is_empty() {
        "        <h1>History</h1>\n        <p>No reports yet.</p>".to_string()
    } else {
        let rows = reports
            .iter()
            .map(|r| {
                format!(
                    r#"            <tr>
                <td>{created}</td>
                <td>{business}</td>
                <td>{location}</td>
                <td>{overall:.0}</td>
                <td>{verdict}</td>
            </tr>"#,
                    created = r.created_at.format("%Y-%m-%d %H:%M"),
                    business = escape(&r.business),
                    location = escape(&r.location),
                    overall = r.score.overall(),
                    verdict = escape(&r.score.verdict),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"        <h1>History</h1>
        <table class="history">
            <tr><th>Date</th><th>Business</th><th>Location</th><th>Score</th><th>Verdict</th></tr>
{rows}
        </table>"#
        )
    };
    layout("History", "history", ctx, &body)
}

/// Error page with the status code and a human-readable message
pub fn error_page(ctx: &PageContext, status: StatusCode, message: &str) -> Html<String> {
    let body = format!(
        r#"        <h1>{code}</h1>
        <p class="error-message">{message}</p>
        <a href="/">Back to home</a>"#,
        code = status.as_u16(),
        message = escape(message),
    );
    layout("Error", "error", ctx, &body)
}
