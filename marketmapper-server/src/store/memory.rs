//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{Duration, Utc};

use super::{
    new_session_id, NewReport, Report, ReportId, ReportStore, Session, SessionId, SessionStore,
    StoreResult, User, UserId, UserStore,
};
use crate::error::AppError;
use crate::identity::ProviderProfile;

fn poisoned<T>(_: T) -> AppError {
    AppError::Internal("store lock poisoned".to_string())
}

/// In-memory user store
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
    next_user_id: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_user_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self.users.read().map_err(poisoned)?.get(&user_id).cloned())
    }

    fn find_by_provider_id(&self, provider_id: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.values().find(|u| u.provider_id == provider_id).cloned())
    }

    fn find_or_create(&self, profile: &ProviderProfile) -> StoreResult<(User, bool)> {
        // Hold the write lock across lookup and insert so two callbacks for
        // the same provider id cannot both create a record
        let mut users = self.users.write().map_err(poisoned)?;
        if let Some(existing) = users.values().find(|u| u.provider_id == profile.provider_id) {
            return Ok((existing.clone(), false));
        }

        let id = UserId(self.next_user_id.fetch_add(1, Ordering::SeqCst));
        let user = User {
            id,
            provider_id: profile.provider_id.clone(),
            name: profile.display_name.clone(),
            email: profile.email.clone(),
            created_at: Utc::now(),
        };
        users.insert(id, user.clone());
        Ok((user, true))
    }

    fn count_users(&self) -> StoreResult<u64> {
        Ok(self.users.read().map_err(poisoned)?.len() as u64)
    }
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, ttl: Duration) -> StoreResult<Session> {
        let session = Session::new(new_session_id(), ttl);
        self.sessions
            .write()
            .map_err(poisoned)?
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(session_id).filter(|s| !s.is_expired()).cloned())
    }

    fn save(&self, session: &Session) -> StoreResult<()> {
        self.sessions
            .write()
            .map_err(poisoned)?
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        self.sessions.write().map_err(poisoned)?.remove(session_id);
        Ok(())
    }

    fn cleanup_expired(&self) -> StoreResult<u64> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

/// In-memory report store
pub struct InMemoryReportStore {
    reports: RwLock<Vec<Report>>,
    next_report_id: AtomicU64,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self {
            reports: RwLock::new(Vec::new()),
            next_report_id: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportStore for InMemoryReportStore {
    fn create_report(&self, report: NewReport) -> StoreResult<Report> {
        let id = ReportId(self.next_report_id.fetch_add(1, Ordering::SeqCst));
        let report = Report::from_new(id, report, Utc::now());
        self.reports.write().map_err(poisoned)?.push(report.clone());
        Ok(report)
    }

    fn list_reports(&self) -> StoreResult<Vec<Report>> {
        // Stored in insertion order
        Ok(self.reports.read().map_err(poisoned)?.iter().rev().cloned().collect())
    }

    fn count_reports(&self) -> StoreResult<u64> {
        Ok(self.reports.read().map_err(poisoned)?.len() as u64)
    }
}
