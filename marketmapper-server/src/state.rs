//! Shared application state

use std::sync::Arc;

use sha2::{Digest, Sha512};
use tower_cookies::Key;

use crate::analysis::MarketAnalyzer;
use crate::identity::IdentityProvider;
use crate::llm::LanguageModel;
use crate::store::{ReportStore, SessionStore, UserStore};

/// Application state shared by every handler
pub struct AppState<U, S, R>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    pub user_store: Arc<U>,
    pub session_store: Arc<S>,
    pub report_store: Arc<R>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Used directly by the diagnostic route; the analyzer holds its own handle
    pub model: Arc<dyn LanguageModel>,
    pub analyzer: MarketAnalyzer,
    /// Signing key for the session cookie
    pub cookie_key: Key,
    pub session_ttl: chrono::Duration,
}

impl<U, S, R> AppState<U, S, R>
where
    U: UserStore,
    S: SessionStore,
    R: ReportStore,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_store: Arc<U>,
        session_store: Arc<S>,
        report_store: Arc<R>,
        identity: Arc<dyn IdentityProvider>,
        model: Arc<dyn LanguageModel>,
        analyzer: MarketAnalyzer,
        session_secret: &str,
        session_ttl: chrono::Duration,
    ) -> Self {
        Self {
            user_store,
            session_store,
            report_store,
            identity,
            model,
            analyzer,
            cookie_key: cookie_key(session_secret),
            session_ttl,
        }
    }
}

/// Derive the 64-byte cookie signing key from an arbitrary-length secret
pub fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}
