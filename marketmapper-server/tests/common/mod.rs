//! Common test utilities for MarketMapper integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use marketmapper_core::prompts::DIAGNOSTIC_PROMPT;
use marketmapper_core::{OverpassElement, OverpassQuery, OverpassResponse};
use marketmapper_server::identity::IdentityError;
use marketmapper_server::routes::SESSION_COOKIE;
use marketmapper_server::{
    routes, AppState, IdentityProvider, InMemoryReportStore, InMemorySessionStore,
    InMemoryUserStore, LanguageModel, MapDataError, MapDataSource, MarketAnalyzer, ModelError,
    ProviderProfile, ReportStore, SessionStore, Throttle, UserStore,
};

pub const TEST_SECRET: &str = "integration-test-secret";

pub const QUERY_REPLY: &str =
    "```overpassql\n[out:json][timeout:30];\n(\n  node(around:1000,12.97,77.64)[amenity~\"cafe\",i];\n);\nout tags center;\n```";

pub const DENSITY_REPLY: &str =
    r#"{"densityScore": 65, "caps": {"competition": 12, "complementary": 10, "accessibility": 6}}"#;

pub const SCORE_REPLY: &str = r#"```json
{
  "densityScore": 65,
  "scores": {"competition": 75, "complementary": 40, "accessibility": 90, "density": 65},
  "verdict": "Strong foot traffic with few direct competitors."
}
```"#;

pub const DIAGNOSTIC_REPLY: &str = "I'm doing well, thank you!";

/// Identity provider that accepts any code except `bad-code`
///
/// The code doubles as the user's handle: code `alice` signs in
/// `sub-alice` / `alice@example.com`.
#[derive(Default)]
pub struct MockIdentityProvider {
    pub exchanges: AtomicUsize,
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn authorization_url(&self, state: &str) -> String {
        format!("https://accounts.example.test/authorize?client_id=test&state={}", state)
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderProfile, IdentityError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if code == "bad-code" {
            return Err(IdentityError::Exchange("invalid_grant".to_string()));
        }
        Ok(ProviderProfile {
            provider_id: format!("sub-{}", code),
            display_name: format!("User {}", code),
            email: format!("{}@example.com", code),
        })
    }
}

/// Language model that answers by recognising the prompt
pub struct MockLanguageModel {
    pub prompts: Mutex<Vec<String>>,
    pub query_reply: Mutex<String>,
    pub score_reply: Mutex<String>,
    pub fail: AtomicBool,
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            query_reply: Mutex::new(QUERY_REPLY.to_string()),
            score_reply: Mutex::new(SCORE_REPLY.to_string()),
            fail: AtomicBool::new(false),
        }
    }
}

impl MockLanguageModel {
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn set_score_reply(&self, reply: &str) {
        *self.score_reply.lock().unwrap() = reply.to_string();
    }

    pub fn set_query_reply(&self, reply: &str) {
        *self.query_reply.lock().unwrap() = reply.to_string();
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ModelError::Status {
                status: 503,
                message: "model overloaded".to_string(),
            });
        }

        let reply = if prompt == DIAGNOSTIC_PROMPT {
            DIAGNOSTIC_REPLY.to_string()
        } else if prompt.contains("Competitor count:") {
            self.score_reply.lock().unwrap().clone()
        } else if prompt.contains("densityScore") {
            DENSITY_REPLY.to_string()
        } else {
            self.query_reply.lock().unwrap().clone()
        };
        Ok(reply)
    }
}

/// Map source returning a fixed number of elements per query
pub struct MockMapSource {
    pub queries: Mutex<Vec<String>>,
    pub elements: AtomicUsize,
    pub fail: AtomicBool,
}

impl Default for MockMapSource {
    fn default() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            elements: AtomicUsize::new(4),
            fail: AtomicBool::new(false),
        }
    }
}

impl MockMapSource {
    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MapDataSource for MockMapSource {
    async fn run_query(&self, query: &OverpassQuery) -> Result<OverpassResponse, MapDataError> {
        self.queries.lock().unwrap().push(query.as_str().to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(MapDataError::Status(504));
        }

        let elements = (0..self.elements.load(Ordering::SeqCst) as u64)
            .map(|id| {
                serde_json::from_value::<OverpassElement>(serde_json::json!({
                    "type": "node",
                    "id": id,
                    "lat": 12.97,
                    "lon": 77.64,
                    "tags": {"name": format!("Place {}", id)}
                }))
                .unwrap()
            })
            .collect();
        Ok(OverpassResponse {
            elements,
            remark: None,
        })
    }
}

/// Throttle that never waits and counts permits
#[derive(Default)]
pub struct CountingThrottle {
    pub permits: AtomicUsize,
}

#[async_trait]
impl Throttle for CountingThrottle {
    async fn acquire(&self) {
        self.permits.fetch_add(1, Ordering::SeqCst);
    }
}

/// A running test server plus handles on every mock
pub struct TestApp<U: UserStore, S: SessionStore, R: ReportStore> {
    pub server: TestServer,
    pub state: Arc<AppState<U, S, R>>,
    pub identity: Arc<MockIdentityProvider>,
    pub model: Arc<MockLanguageModel>,
    pub maps: Arc<MockMapSource>,
    pub throttle: Arc<CountingThrottle>,
}

pub type MemoryApp = TestApp<InMemoryUserStore, InMemorySessionStore, InMemoryReportStore>;

/// Create a test server backed by the in-memory stores
pub fn create_test_server() -> MemoryApp {
    create_test_server_with(
        Arc::new(InMemoryUserStore::new()),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(InMemoryReportStore::new()),
    )
}

/// Create a test server over the given stores
pub fn create_test_server_with<U, S, R>(
    user_store: Arc<U>,
    session_store: Arc<S>,
    report_store: Arc<R>,
) -> TestApp<U, S, R>
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    R: ReportStore + 'static,
{
    let identity = Arc::new(MockIdentityProvider::default());
    let model = Arc::new(MockLanguageModel::default());
    let maps = Arc::new(MockMapSource::default());
    let throttle = Arc::new(CountingThrottle::default());

    let analyzer = MarketAnalyzer::new(model.clone(), maps.clone(), throttle.clone());
    let state = Arc::new(AppState::new(
        user_store,
        session_store,
        report_store,
        identity.clone(),
        model.clone(),
        analyzer,
        TEST_SECRET,
        chrono::Duration::hours(1),
    ));

    let app = routes::create_router(state.clone());
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        state,
        identity,
        model,
        maps,
        throttle,
    }
}

/// Start a fresh session and return its signed cookie value
pub async fn new_session(server: &TestServer) -> String {
    let response = server.get("/").await;
    assert_eq!(response.status_code(), 200);
    session_cookie(&response)
}

pub fn session_cookie(response: &axum_test::TestResponse) -> String {
    response
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string()
}

pub fn auth_cookie(value: &str) -> cookie::Cookie<'static> {
    cookie::Cookie::new(SESSION_COOKIE, value.to_string())
}

pub fn location(response: &axum_test::TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("Location is not ASCII")
        .to_string()
}

/// Run the sign-in flow from an existing session
///
/// Returns the rotated session cookie and the callback's redirect target.
pub async fn login_with(server: &TestServer, session: &str, code: &str) -> (String, String) {
    let response = server.get("/auth/google").add_cookie(auth_cookie(session)).await;
    assert_eq!(response.status_code(), 303);
    let authorize = location(&response);
    let state = authorize
        .split("state=")
        .nth(1)
        .expect("No state in authorization URL")
        .to_string();

    let response = server
        .get("/auth/google/callback")
        .add_query_param("code", code)
        .add_query_param("state", &state)
        .add_cookie(auth_cookie(session))
        .await;
    assert_eq!(response.status_code(), 303);

    (session_cookie(&response), location(&response))
}

/// Sign in as `code` from a brand new session, returning the session cookie
pub async fn login(server: &TestServer, code: &str) -> String {
    let session = new_session(server).await;
    login_with(server, &session, code).await.0
}
