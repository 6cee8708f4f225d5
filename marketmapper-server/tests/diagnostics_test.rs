//! Model connectivity check at /test

mod common;

use common::{auth_cookie, create_test_server, location, session_cookie, DIAGNOSTIC_REPLY};
use marketmapper_core::prompts::DIAGNOSTIC_PROMPT;
use marketmapper_server::routes::ANALYSIS_FAILED;

/// Test: the raw model reply is returned
#[tokio::test]
async fn test_model_check_returns_text() {
    let app = create_test_server();

    let response = app.server.get("/test").await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), DIAGNOSTIC_REPLY);
    assert_eq!(app.model.prompts.lock().unwrap().as_slice(), [DIAGNOSTIC_PROMPT]);
}

/// Test: a model failure flashes and redirects home
#[tokio::test]
async fn test_model_check_failure() {
    let app = create_test_server();
    app.model.set_failing(true);

    let response = app.server.get("/test").await;
    assert_eq!(response.status_code(), 303);
    assert_eq!(location(&response), "/");

    let page = app
        .server
        .get("/")
        .add_cookie(auth_cookie(&session_cookie(&response)))
        .await
        .text();
    assert!(page.contains(ANALYSIS_FAILED));
}
