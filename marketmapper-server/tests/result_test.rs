//! Submission analysis and report persistence

mod common;

use std::sync::atomic::Ordering;

use common::{auth_cookie, create_test_server, location, login, session_cookie, SCORE_REPLY};
use marketmapper_core::ScoreReport;
use marketmapper_server::routes::SUBMISSION_REQUIRED;
use marketmapper_server::ReportStore;
use serde_json::json;

fn valid_submission() -> serde_json::Value {
    json!({
        "business": "specialty coffee shop",
        "location": "Indiranagar, Bengaluru",
        "lat": "12.9719",
        "lon": "77.6412",
    })
}

/// Test: an empty submission lists every field and makes no outbound call
#[tokio::test]
async fn test_missing_fields_all_reported() {
    let app = create_test_server();
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&json!({}))
        .await;

    assert_eq!(response.status_code(), 400);
    let page = response.text();
    for field in ["business", "location", "lat", "lon"] {
        assert!(
            page.contains(&format!("&quot;{}&quot; is required", field)),
            "missing message for {field}"
        );
    }
    assert_eq!(app.model.calls(), 0);
    assert_eq!(app.maps.calls(), 0);
    assert_eq!(app.state.report_store.count_reports().unwrap(), 0);
}

/// Test: blank and out-of-range values are rejected together
#[tokio::test]
async fn test_blank_and_out_of_range_fields() {
    let app = create_test_server();
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&json!({
            "business": "   ",
            "location": "Old Town",
            "lat": "91",
            "lon": "east",
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let page = response.text();
    assert!(page.contains("&quot;business&quot; is not allowed to be empty"));
    assert!(page.contains("&quot;lat&quot; must be a number between -90 and 90"));
    assert!(page.contains("&quot;lon&quot; must be a number between -180 and 180"));
    assert_eq!(app.model.calls(), 0);
}

/// Test: a valid submission is scored, stored once and rendered
#[tokio::test]
async fn test_end_to_end_report() {
    let app = create_test_server();
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&valid_submission())
        .await;

    assert_eq!(response.status_code(), 200);
    let page = response.text();
    assert!(page.contains("Strong foot traffic with few direct competitors."));
    assert!(page.contains("specialty coffee shop"));

    let reports = app.state.report_store.list_reports().unwrap();
    assert_eq!(reports.len(), 1);
    let expected = ScoreReport::from_model_reply(SCORE_REPLY).unwrap();
    assert_eq!(reports[0].score, expected);
    assert_eq!(reports[0].business, "specialty coffee shop");
    assert_eq!(reports[0].latitude, 12.9719);

    // Three query prompts, then density, then scoring
    assert_eq!(app.model.calls(), 5);
    assert_eq!(app.maps.calls(), 3);
    assert_eq!(app.throttle.permits.load(Ordering::SeqCst), 3);
    assert!(app
        .maps
        .queries
        .lock()
        .unwrap()
        .iter()
        .all(|q| q.starts_with("[out:json]")));
}

/// Test: an area with no matching places still produces and stores a report
#[tokio::test]
async fn test_end_to_end_with_empty_map_results() {
    let app = create_test_server();
    app.maps.elements.store(0, Ordering::SeqCst);
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&json!({
            "business": "coffee shop",
            "location": "Downtown",
            "lat": "12.9",
            "lon": "77.6",
        }))
        .await;

    assert_eq!(response.status_code(), 200);
    assert!(response
        .text()
        .contains("Strong foot traffic with few direct competitors."));

    let reports = app.state.report_store.list_reports().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].score, ScoreReport::from_model_reply(SCORE_REPLY).unwrap());
    assert_eq!(reports[0].location, "Downtown");
    assert_eq!(reports[0].longitude, 77.6);

    let prompts = app.model.prompts.lock().unwrap();
    let scoring = prompts.last().expect("No prompts sent");
    assert!(scoring.contains("Competitor count: 0"));
    assert!(scoring.contains("Complementary count: 0"));
    assert!(scoring.contains("Accessibility count: 0"));
}

/// Test: the counts reach the scoring prompt
#[tokio::test]
async fn test_scoring_prompt_carries_counts() {
    let app = create_test_server();
    app.maps.elements.store(7, Ordering::SeqCst);
    let session = login(&app.server, "alice").await;

    app.server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&valid_submission())
        .await;

    let prompts = app.model.prompts.lock().unwrap();
    let scoring = prompts.last().expect("No prompts sent");
    assert!(scoring.contains("Competitor count: 7"));
    assert!(scoring.contains("Accessibility count: 7"));
}

/// Test: form-encoded submissions are accepted
#[tokio::test]
async fn test_form_submission() {
    let app = create_test_server();
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .form(&[
            ("business", "bakery"),
            ("location", "Old Town"),
            ("lat", "48.137"),
            ("lon", "11.575"),
        ])
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(app.state.report_store.count_reports().unwrap(), 1);
}

/// Test: a failing map fetch aborts without storing anything
#[tokio::test]
async fn test_map_failure_persists_nothing() {
    let app = create_test_server();
    app.maps.set_failing(true);
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&valid_submission())
        .await;

    assert_eq!(response.status_code(), 502);
    assert!(response.text().contains("<h1>502</h1>"));
    assert_eq!(app.maps.calls(), 1);
    assert_eq!(app.state.report_store.count_reports().unwrap(), 0);
}

/// Test: a prose scoring reply aborts without storing anything
#[tokio::test]
async fn test_non_json_score_persists_nothing() {
    let app = create_test_server();
    app.model
        .set_score_reply("This looks like a great place for a coffee shop!");
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&valid_submission())
        .await;

    assert_eq!(response.status_code(), 502);
    assert_eq!(app.model.calls(), 5);
    assert_eq!(app.state.report_store.count_reports().unwrap(), 0);
}

/// Test: a score reply with extra fields is rejected
#[tokio::test]
async fn test_score_with_unknown_field_persists_nothing() {
    let app = create_test_server();
    app.model.set_score_reply(
        r#"{"densityScore": 50, "scores": {"competition": 1, "complementary": 2, "accessibility": 3, "density": 50}, "verdict": "ok", "confidence": 0.9}"#,
    );
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&valid_submission())
        .await;

    assert_eq!(response.status_code(), 502);
    assert_eq!(app.state.report_store.count_reports().unwrap(), 0);
}

/// Test: a generated query that is not an [out:json] query is never run
#[tokio::test]
async fn test_invalid_query_never_fetched() {
    let app = create_test_server();
    app.model.set_query_reply("Sorry, I cannot help with that.");
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&valid_submission())
        .await;

    assert_eq!(response.status_code(), 502);
    assert_eq!(app.model.calls(), 1);
    assert_eq!(app.maps.calls(), 0);
    assert_eq!(app.state.report_store.count_reports().unwrap(), 0);
}

/// Test: a model outage is reported as an upstream failure
#[tokio::test]
async fn test_model_failure() {
    let app = create_test_server();
    app.model.set_failing(true);
    let session = login(&app.server, "alice").await;

    let response = app
        .server
        .post("/result")
        .add_cookie(auth_cookie(&session))
        .json(&valid_submission())
        .await;

    assert_eq!(response.status_code(), 502);
    assert_eq!(app.maps.calls(), 0);
    assert_eq!(app.state.report_store.count_reports().unwrap(), 0);
}

/// Test: GET /result sends the user back to the form
#[tokio::test]
async fn test_get_result_redirects_home() {
    let app = create_test_server();
    let session = login(&app.server, "alice").await;

    let response = app.server.get("/result").add_cookie(auth_cookie(&session)).await;
    assert_eq!(response.status_code(), 303);
    assert_eq!(location(&response), "/");

    let page = app
        .server
        .get("/")
        .add_cookie(auth_cookie(&session_cookie(&response)))
        .await
        .text();
    assert!(page.contains(SUBMISSION_REQUIRED));
}
