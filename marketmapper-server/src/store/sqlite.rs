//! SQLite-based storage implementation
//!
//! Sessions and report payloads are stored as JSON documents next to the
//! few columns that are queried directly.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    new_session_id, NewReport, Report, ReportId, ReportStore, Session, SessionId, SessionStore,
    StoreResult, User, UserId, UserStore,
};
use crate::error::AppError;
use crate::identity::ProviderProfile;

/// Schema steps in order; step `n` brings the database to `user_version` `n + 1`
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        provider_id TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    -- Whole session document in `data`; expiry duplicated for cleanup
    CREATE TABLE sessions (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        expires_at INTEGER NOT NULL
    );
    CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);

    CREATE TABLE reports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        business TEXT NOT NULL,
        location TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        payload TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    "#,
];

fn db_err(e: rusqlite::Error) -> AppError {
    AppError::Internal(e.to_string())
}

fn json_err(e: serde_json::Error) -> AppError {
    AppError::Internal(format!("stored document is corrupt: {}", e))
}

fn parse_time(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// SQLite-based store implementing UserStore, SessionStore and ReportStore
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, AppError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(db_err)?;

        Self::migrate(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database lock poisoned".to_string()))
    }

    /// Apply every schema step newer than the database's `user_version`
    fn migrate(conn: &mut Connection) -> Result<(), AppError> {
        let current: usize = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(db_err)?;
        let latest = MIGRATIONS.len();

        if current > latest {
            return Err(AppError::Internal(format!(
                "database schema version {} is newer than this build ({})",
                current, latest
            )));
        }

        for (index, step) in MIGRATIONS.iter().enumerate().skip(current) {
            let version = index + 1;
            tracing::info!(version, "Applying schema step");
            let tx = conn.transaction().map_err(db_err)?;
            tx.execute_batch(step).map_err(db_err)?;
            tx.pragma_update(None, "user_version", version).map_err(db_err)?;
            tx.commit().map_err(db_err)?;
        }

        Ok(())
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: i64 = row.get(0)?;
    let created_at: String = row.get(4)?;
    Ok(User {
        id: UserId(id as u64),
        provider_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        created_at: parse_time(&created_at),
    })
}

const USER_COLUMNS: &str = "id, provider_id, name, email, created_at";

impl UserStore for SqliteStore {
    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![user_id.0 as i64],
            user_from_row,
        )
        .optional()
        .map_err(db_err)
    }

    fn find_by_provider_id(&self, provider_id: &str) -> StoreResult<Option<User>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE provider_id = ?1", USER_COLUMNS),
            params![provider_id],
            user_from_row,
        )
        .optional()
        .map_err(db_err)
    }

    fn find_or_create(&self, profile: &ProviderProfile) -> StoreResult<(User, bool)> {
        let conn = self.conn()?;
        let inserted = conn
            .execute(
                "INSERT INTO users (provider_id, name, email, created_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(provider_id) DO NOTHING",
                params![
                    profile.provider_id,
                    profile.display_name,
                    profile.email,
                    Utc::now().to_rfc3339()
                ],
            )
            .map_err(db_err)?;

        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE provider_id = ?1", USER_COLUMNS),
                params![profile.provider_id],
                user_from_row,
            )
            .map_err(db_err)?;

        Ok((user, inserted == 1))
    }

    fn count_users(&self) -> StoreResult<u64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(db_err)
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, ttl: Duration) -> StoreResult<Session> {
        let session = Session::new(new_session_id(), ttl);
        let data = serde_json::to_string(&session).map_err(json_err)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (id, data, expires_at) VALUES (?1, ?2, ?3)",
            params![session.id.0, data, session.expires_at.timestamp()],
        )
        .map_err(db_err)?;

        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn()?;
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM sessions WHERE id = ?1",
                params![session_id.0],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;

        match data {
            Some(data) => {
                let session: Session = serde_json::from_str(&data).map_err(json_err)?;
                Ok(Some(session).filter(|s| !s.is_expired()))
            }
            None => Ok(None),
        }
    }

    fn save(&self, session: &Session) -> StoreResult<()> {
        let data = serde_json::to_string(session).map_err(json_err)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO sessions (id, data, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, expires_at = excluded.expires_at",
            params![session.id.0, data, session.expires_at.timestamp()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])
            .map_err(db_err)?;
        Ok(())
    }

    fn cleanup_expired(&self) -> StoreResult<u64> {
        let conn = self.conn()?;
        let removed = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![Utc::now().timestamp()],
            )
            .map_err(db_err)?;
        Ok(removed as u64)
    }
}

impl ReportStore for SqliteStore {
    fn create_report(&self, report: NewReport) -> StoreResult<Report> {
        let payload = serde_json::to_string(&report.score).map_err(json_err)?;
        let created_at = Utc::now();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO reports (business, location, latitude, longitude, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                report.business,
                report.location,
                report.latitude,
                report.longitude,
                payload,
                created_at.to_rfc3339()
            ],
        )
        .map_err(db_err)?;

        let id = ReportId(conn.last_insert_rowid() as u64);
        Ok(Report::from_new(id, report, created_at))
    }

    fn list_reports(&self) -> StoreResult<Vec<Report>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, business, location, latitude, longitude, payload, created_at
                 FROM reports ORDER BY id DESC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .map_err(db_err)?;

        let mut reports = Vec::new();
        for row in rows {
            let (id, business, location, latitude, longitude, payload, created_at) =
                row.map_err(db_err)?;
            reports.push(Report {
                id: ReportId(id as u64),
                business,
                location,
                latitude,
                longitude,
                score: serde_json::from_str(&payload).map_err(json_err)?,
                created_at: parse_time(&created_at),
            });
        }
        Ok(reports)
    }

    fn count_reports(&self) -> StoreResult<u64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
            .map_err(db_err)
    }
}
