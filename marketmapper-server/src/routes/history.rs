//! Report history

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use tower_cookies::Cookies;

use super::session::{load_session, page_context};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{ReportStore, SessionStore, UserStore};
use crate::views;

/// GET /history
pub async fn list<U, S, R>(
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
    let reports = state.report_store.list_reports()?;
    Ok(views::history_page(&ctx, &reports))
}
