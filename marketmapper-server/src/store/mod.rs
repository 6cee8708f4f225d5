//! Storage abstractions for MarketMapper

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemoryReportStore, InMemorySessionStore, InMemoryUserStore};
pub use models::*;
pub use sqlite::SqliteStore;

use chrono::Duration;

use crate::error::AppError;
use crate::identity::ProviderProfile;

/// Result type for store operations
pub type StoreResult<T> = Result<T, AppError>;

/// Trait for user storage
pub trait UserStore: Send + Sync {
    /// Get a user by ID
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Get a user by identity-provider subject id
    fn find_by_provider_id(&self, provider_id: &str) -> StoreResult<Option<User>>;

    /// Return the user for this provider id, creating it on first sight
    ///
    /// The flag is `true` when a new record was created. Existing records
    /// are returned untouched even if the profile has changed.
    fn find_or_create(&self, profile: &ProviderProfile) -> StoreResult<(User, bool)>;

    /// Number of stored users
    fn count_users(&self) -> StoreResult<u64>;
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new anonymous session that lives for `ttl`
    fn create(&self, ttl: Duration) -> StoreResult<Session>;

    /// Get a live session by ID; expired sessions are reported as absent
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Persist changes to an existing session
    fn save(&self, session: &Session) -> StoreResult<()>;

    /// Delete a session
    fn delete(&self, session_id: &SessionId) -> StoreResult<()>;

    /// Delete expired sessions, returning how many were removed
    fn cleanup_expired(&self) -> StoreResult<u64>;
}

/// Trait for report storage
pub trait ReportStore: Send + Sync {
    /// Store a new report
    fn create_report(&self, report: NewReport) -> StoreResult<Report>;

    /// All reports, newest first
    fn list_reports(&self) -> StoreResult<Vec<Report>>;

    /// Number of stored reports
    fn count_reports(&self) -> StoreResult<u64>;
}

pub(crate) fn new_session_id() -> SessionId {
    SessionId(uuid::Uuid::new_v4().to_string())
}
