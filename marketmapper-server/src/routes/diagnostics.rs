//! Model connectivity check

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use marketmapper_core::prompts::DIAGNOSTIC_PROMPT;
use tower_cookies::Cookies;

use super::session::load_session;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Flash, ReportStore, SessionStore, UserStore};

pub const ANALYSIS_FAILED: &str = "AI Analysis failed. Please try again.";

/// GET /test
///
/// Sends a fixed prompt to the model and returns the raw reply text.
pub async fn model_check<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    cookies: Cookies,
) -> Result<Response, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    match state.model.generate(DIAGNOSTIC_PROMPT).await {
        Ok(text) => Ok(text.into_response()),
        Err(e) => {
            tracing::warn!(error = %e, "Model check failed");
            let mut session = load_session(&state, &cookies)?;
            session.push_flash(Flash::error(ANALYSIS_FAILED));
            state.session_store.save(&session)?;
            Ok(Redirect::to("/").into_response())
        }
    }
}
