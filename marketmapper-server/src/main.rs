//! MarketMapper server

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketmapper_server::{
    routes, AppState, Config, GeminiClient, GoogleProvider, GovernorThrottle,
    InMemoryReportStore, InMemorySessionStore, InMemoryUserStore, MarketAnalyzer, OverpassClient,
    ReportStore, SessionStore, SqliteStore, UserStore,
};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marketmapper_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "Loaded configuration");

    match config.database_path.as_deref() {
        Some(path) => {
            let store = Arc::new(SqliteStore::open(path)?);
            tracing::info!(path, "Using SQLite storage");
            serve(&config, store.clone(), store.clone(), store).await
        }
        None => {
            tracing::warn!("No database configured, data will not survive a restart");
            serve(
                &config,
                Arc::new(InMemoryUserStore::new()),
                Arc::new(InMemorySessionStore::new()),
                Arc::new(InMemoryReportStore::new()),
            )
            .await
        }
    }
}

async fn serve<U, S, R>(
    config: &Config,
    user_store: Arc<U>,
    session_store: Arc<S>,
    report_store: Arc<R>,
) -> Result<()>
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    R: ReportStore + 'static,
{
    let identity = Arc::new(GoogleProvider::new(
        &config.google_client_id,
        &config.google_client_secret,
        &config.client_url,
    )?);
    let model = Arc::new(match &config.gemini_base_url {
        Some(base_url) => {
            GeminiClient::with_base_url(&config.gemini_api_key, &config.gemini_model, base_url)?
        }
        None => GeminiClient::new(&config.gemini_api_key, &config.gemini_model)?,
    });
    let maps = Arc::new(OverpassClient::new(&config.overpass_url)?);
    let throttle = Arc::new(GovernorThrottle::new(config.overpass_min_interval));
    let analyzer = MarketAnalyzer::new(model.clone(), maps, throttle);

    spawn_session_cleanup(session_store.clone());

    let state = Arc::new(AppState::new(
        user_store,
        session_store,
        report_store,
        identity,
        model,
        analyzer,
        &config.session_secret,
        config.session_ttl,
    ));

    let app = routes::create_router_with_public_path(state, &config.public_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("MarketMapper listening on http://{}", addr);
    tracing::info!("OAuth callback at {}/auth/google/callback", config.client_url);

    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_session_cleanup<S: SessionStore + 'static>(store: Arc<S>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            match store.cleanup_expired() {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
            }
        }
    });
}
