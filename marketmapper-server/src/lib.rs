//! MarketMapper web service
//!
//! Signed-in users describe a business idea and a location; the service asks
//! a language model for map queries, counts nearby features on OpenStreetMap
//! through Overpass, has the model score the spot and keeps every report.

pub mod analysis;
pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
pub mod overpass;
pub mod routes;
pub mod state;
pub mod store;
pub mod throttle;
pub mod views;

pub use analysis::{Analysis, AnalysisError, MarketAnalyzer};
pub use config::{Config, ConfigError};
pub use error::AppError;
pub use identity::{GoogleProvider, IdentityProvider, ProviderProfile};
pub use llm::{GeminiClient, LanguageModel, ModelError};
pub use overpass::{MapDataError, MapDataSource, OverpassClient};
pub use state::AppState;
pub use store::{
    InMemoryReportStore, InMemorySessionStore, InMemoryUserStore, ReportStore, SessionStore,
    SqliteStore, UserStore,
};
pub use throttle::{GovernorThrottle, Throttle};
