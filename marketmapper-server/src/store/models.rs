//! Data models for MarketMapper storage

use chrono::{DateTime, Duration, Utc};
use marketmapper_core::ScoreReport;
use serde::{Deserialize, Serialize};

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Unique report identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportId(pub u64);

/// A user account, keyed by the identity provider's subject id
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub provider_id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Severity of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot notice shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

/// A browser session
///
/// Created on the first request from a browser, whether or not anyone signs
/// in, so that flash messages and the post-login redirect survive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub flash: Vec<Flash>,
    /// Where to send the user after a successful sign-in
    pub redirect_to: Option<String>,
    /// CSRF state of an authorization request in flight
    pub oauth_state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: None,
            flash: Vec::new(),
            redirect_to: None,
            oauth_state: None,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Push the expiry out by `ttl` from now
    pub fn touch(&mut self, ttl: Duration) {
        self.expires_at = Utc::now() + ttl;
    }

    pub fn push_flash(&mut self, flash: Flash) {
        self.flash.push(flash);
    }

    /// Remove and return all queued flash messages
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flash)
    }
}

/// A report about to be stored
#[derive(Debug, Clone)]
pub struct NewReport {
    pub business: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub score: ScoreReport,
}

/// A stored viability report
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub id: ReportId,
    pub business: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub score: ScoreReport,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn from_new(id: ReportId, new: NewReport, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            business: new.business,
            location: new.location,
            latitude: new.latitude,
            longitude: new.longitude,
            score: new.score,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flashes_are_one_shot() {
        let mut session = Session::new(SessionId("s".to_string()), Duration::hours(1));
        session.push_flash(Flash::success("Welcome"));
        session.push_flash(Flash::error("Oops"));

        let taken = session.take_flashes();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].level, FlashLevel::Success);
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn test_expiry_and_touch() {
        let mut session = Session::new(SessionId("s".to_string()), Duration::seconds(-1));
        assert!(session.is_expired());

        session.touch(Duration::hours(1));
        assert!(!session.is_expired());
    }

    #[test]
    fn test_session_serializes_as_document() {
        let mut session = Session::new(SessionId("abc".to_string()), Duration::hours(1));
        session.user_id = Some(UserId(7));
        session.push_flash(Flash::error("nope"));

        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"level\":\"error\""));
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
