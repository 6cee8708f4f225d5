//! Access guard for routes that need a signed-in user

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tower_cookies::Cookies;

use super::session::load_session;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Flash, ReportStore, SessionStore, User, UserStore};

pub const NOT_AUTHENTICATED: &str = "You are not authenticated to perform this operation .";

/// The signed-in user, attached to guarded requests
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Middleware: let signed-in users through, send everyone else to `/login`
///
/// The requested path is remembered so the callback can return to it.
pub async fn require_login<U, S, R>(
    State(state): State<Arc<AppState<U, S, R>>>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    R: ReportStore + 'static,
{
    match authorize(&state, &cookies, &request) {
        Ok(Some(user)) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Ok(None) => Redirect::to("/login").into_response(),
        Err(e) => e.into_response(),
    }
}

fn authorize<U, S, R>(
    state: &AppState<U, S, R>,
    cookies: &Cookies,
    request: &Request,
) -> Result<Option<User>, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let mut session = load_session(state, cookies)?;

    let user = match session.user_id {
        Some(id) => state.user_store.get_user(id)?,
        None => None,
    };

    match user {
        Some(user) => {
            session.touch(state.session_ttl);
            state.session_store.save(&session)?;
            Ok(Some(user))
        }
        None => {
            let target = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string());
            tracing::debug!(target = %target, "Unauthenticated request to guarded route");

            session.user_id = None;
            session.redirect_to = Some(target);
            session.push_flash(Flash::error(NOT_AUTHENTICATED));
            state.session_store.save(&session)?;
            Ok(None)
        }
    }
}
