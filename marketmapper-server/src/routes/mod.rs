//! HTTP routes

mod auth;
mod diagnostics;
mod guard;
mod history;
mod pages;
mod result;
mod session;

pub use auth::{SIGN_IN_FAILED, WELCOME};
pub use diagnostics::ANALYSIS_FAILED;
pub use guard::{CurrentUser, NOT_AUTHENTICATED};
pub use result::SUBMISSION_REQUIRED;
pub use session::SESSION_COOKIE;

use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::{ReportStore, SessionStore, UserStore};

/// Create the router with all routes
pub fn create_router<U, S, R>(state: Arc<AppState<U, S, R>>) -> Router
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    R: ReportStore + 'static,
{
    create_router_with_public_path(state, "public")
}

/// Create the router with a custom static asset directory
pub fn create_router_with_public_path<U, S, R>(
    state: Arc<AppState<U, S, R>>,
    public_path: &str,
) -> Router
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    R: ReportStore + 'static,
{
    let guarded = Router::new()
        .route("/logout", get(auth::logout))
        .route("/result", get(result::show).post(result::submit))
        .route("/history", get(history::list))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_login::<U, S, R>,
        ));

    Router::new()
        .route("/", get(pages::home))
        .route("/login", get(pages::login))
        .route("/auth/google", get(auth::google_start))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/test", get(diagnostics::model_check))
        .merge(guarded)
        .nest_service("/public", ServeDir::new(public_path))
        .fallback(pages::not_found)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
