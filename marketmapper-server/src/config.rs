//! Service configuration
//!
//! Read once at start-up from the process environment (after `.env` is
//! loaded) and handed to the components that need it.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::llm::gemini::DEFAULT_MODEL;
use crate::overpass::DEFAULT_ENDPOINT;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Public base URL, used to build the OAuth callback URL
    pub client_url: String,

    pub google_client_id: String,
    pub google_client_secret: String,

    /// Secret the session cookie signing key is derived from
    pub session_secret: String,

    /// SQLite database path; `None` selects the in-memory stores
    pub database_path: Option<String>,

    pub gemini_api_key: String,
    pub gemini_model: String,

    /// Alternative Gemini endpoint; `None` uses the public API
    pub gemini_base_url: Option<String>,

    pub overpass_url: String,

    /// Minimum spacing between two Overpass requests
    pub overpass_min_interval: Duration,

    pub session_ttl: chrono::Duration,

    /// Directory served under `/public`
    pub public_dir: String,
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = parse_or(&get, "PORT", 8080u16)?;
        let interval_ms = parse_or(&get, "OVERPASS_MIN_INTERVAL_MS", 1000u64)?;
        let ttl_hours = parse_or(&get, "SESSION_TTL_HOURS", 168i64)?;
        if ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                name: "SESSION_TTL_HOURS",
                value: ttl_hours.to_string(),
            });
        }

        let database_path = get("DATABASE_LINK").filter(|p| p != ":memory:");

        Ok(Self {
            port,
            client_url: required("CLIENT_URL")?.trim_end_matches('/').to_string(),
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            google_client_secret: required("GOOGLE_CLIENT_SECRET")?,
            session_secret: required("SECRET")?,
            database_path,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL"),
            overpass_url: get("OVERPASS_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            overpass_min_interval: Duration::from_millis(interval_ms),
            session_ttl: chrono::Duration::hours(ttl_hours),
            public_dir: get("PUBLIC_DIR").unwrap_or_else(|| "public".to_string()),
        })
    }
}

fn parse_or<G, T>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("client_url", &self.client_url)
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret", &REDACTED)
            .field("session_secret", &REDACTED)
            .field("database_path", &self.database_path)
            .field("gemini_api_key", &REDACTED)
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("overpass_url", &self.overpass_url)
            .field("overpass_min_interval", &self.overpass_min_interval)
            .field("session_ttl_hours", &self.session_ttl.num_hours())
            .field("public_dir", &self.public_dir)
            .finish()
    }
}
