//! Google sign-in and logout

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Redirect;
use serde::Deserialize;
use tower_cookies::Cookies;

use super::session::{load_session, set_session_cookie};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Flash, ReportStore, Session, SessionStore, UserStore};

pub const WELCOME: &str = "Welcome to MarketMapper !!";
pub const SIGN_IN_FAILED: &str = "Sign-in with Google failed. Please try again.";

/// GET /auth/google
///
/// Starts the authorization-code flow with a fresh CSRF state.
pub async fn google_start<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    cookies: Cookies,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let mut session = load_session(&state, &cookies)?;
    let csrf = uuid::Uuid::new_v4().to_string();
    session.oauth_state = Some(csrf.clone());
    state.session_store.save(&session)?;

    tracing::debug!(provider = state.identity.name(), "Redirecting to identity provider");
    Ok(Redirect::to(&state.identity.authorization_url(&csrf)))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/google/callback
pub async fn google_callback<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    cookies: Cookies,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let mut session = load_session(&state, &cookies)?;

    match complete_login(&state, &mut session, params).await {
        Ok((fresh, target)) => {
            set_session_cookie(&state, &cookies, &fresh.id);
            Ok(Redirect::to(target.as_deref().unwrap_or("/")))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            session.oauth_state = None;
            session.push_flash(Flash::error(SIGN_IN_FAILED));
            state.session_store.save(&session)?;
            Ok(Redirect::to("/"))
        }
    }
}

/// Verify the callback, record the user and rotate the session
///
/// Returns the new session and the stored redirect target.
async fn complete_login<U, S, R>(
    state: &AppState<U, S, R>,
    session: &mut Session,
    params: CallbackParams,
) -> Result<(Session, Option<String>), AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    if let Some(error) = params.error {
        return Err(AppError::BadRequest(format!("provider returned {}", error)));
    }

    let expected = session
        .oauth_state
        .take()
        .ok_or_else(|| AppError::BadRequest("no sign-in in progress".to_string()))?;
    if params.state.as_deref() != Some(expected.as_str()) {
        return Err(AppError::BadRequest("state mismatch".to_string()));
    }
    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;

    let profile = state
        .identity
        .exchange_code(&code)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let (user, created) = state.user_store.find_or_create(&profile)?;
    if created {
        tracing::info!(user_id = user.id.0, email = %user.email, "Created user");
    }

    let mut fresh = state.session_store.create(state.session_ttl)?;
    fresh.user_id = Some(user.id);
    fresh.push_flash(Flash::success(WELCOME));
    state.session_store.save(&fresh)?;
    state.session_store.delete(&session.id)?;

    tracing::info!(user_id = user.id.0, "User signed in");
    Ok((fresh, session.redirect_to.take()))
}

/// GET /logout
pub async fn logout<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    cookies: Cookies,
) -> Result<Redirect, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let mut session = load_session(&state, &cookies)?;
    if let Some(user_id) = session.user_id.take() {
        tracing::info!(user_id = user_id.0, "User signed out");
    }
    session.redirect_to = None;
    state.session_store.save(&session)?;
    Ok(Redirect::to("/"))
}
