//! Session cookie handling
//!
//! Every browser gets a session on its first request. The cookie carries only
//! the session id and is signed, so a tampered id is treated as no cookie.

use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::{Cookie, Cookies};

use crate::error::AppError;
use crate::state::AppState;
use crate::store::{ReportStore, Session, SessionId, SessionStore, UserStore};
use crate::views::PageContext;

pub const SESSION_COOKIE: &str = "marketmapper_session";

/// Load the caller's live session, creating one if there is none
pub fn load_session<U, S, R>(
    state: &AppState<U, S, R>,
    cookies: &Cookies,
) -> Result<Session, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let existing = match cookies.signed(&state.cookie_key).get(SESSION_COOKIE) {
        Some(cookie) => state
            .session_store
            .get(&SessionId(cookie.value().to_string()))?,
        None => None,
    };

    let session = match existing {
        Some(session) => session,
        None => {
            let session = state.session_store.create(state.session_ttl)?;
            tracing::debug!(session = %session.id.0, "Created session");
            session
        }
    };

    set_session_cookie(state, cookies, &session.id);
    Ok(session)
}

/// Write the signed session cookie; max-age follows the session lifetime
pub fn set_session_cookie<U, S, R>(state: &AppState<U, S, R>, cookies: &Cookies, id: &SessionId)
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let cookie = Cookie::build((SESSION_COOKIE, id.0.clone()))
        .path("/")
        .http_only(true)
        .max_age(CookieDuration::seconds(state.session_ttl.num_seconds()))
        .build();
    cookies.signed(&state.cookie_key).add(cookie);
}

/// Build the layout context, draining queued flashes from the session
pub fn page_context<U, S, R>(
    state: &AppState<U, S, R>,
    session: &mut Session,
) -> Result<PageContext, AppError>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    let user = match session.user_id {
        Some(id) => state.user_store.get_user(id)?,
        None => None,
    };

    let flashes = session.take_flashes();
    if !flashes.is_empty() {
        state.session_store.save(session)?;
    }

    Ok(PageContext {
        authenticated: user.is_some(),
        user_name: user.map(|u| u.name),
        flashes,
    })
}
