//! Static pages: home, login and the not-found fallback

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};
use tower_cookies::Cookies;

use super::session::{load_session, page_context};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{ReportStore, SessionStore, UserStore};
use crate::views;

/// GET /
pub async fn home<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    cookies: Cookies,
) -> Result<Html<String>, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let mut session = load_session(&state, &cookies)?;
    let ctx = page_context(&state, &mut session)?;
    Ok(views::home_page(&ctx))
}

/// GET /login
pub async fn login<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    cookies: Cookies,
) -> Result<Html<String>, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let mut session = load_session(&state, &cookies)?;
    let ctx = page_context(&state, &mut session)?;
    Ok(views::login_page(&ctx))
}

/// Fallback for unknown routes
pub async fn not_found<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    cookies: Cookies,
) -> Response
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let ctx = load_session(&state, &cookies)
        .and_then(|mut session| page_context(&state, &mut session));
    match ctx {
        Ok(ctx) => AppError::NotFound.into_page(&ctx),
        Err(e) => e.into_response(),
    }
}
