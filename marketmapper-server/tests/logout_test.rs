//! Logout

mod common;

use common::{auth_cookie, create_test_server, location, login, session_cookie};

/// Test: logout redirects home without a flash
#[tokio::test]
async fn test_logout_when_authenticated() {
    let app = create_test_server();
    let session = login(&app.server, "alice").await;
    // Drain the welcome flash
    app.server.get("/").add_cookie(auth_cookie(&session)).await;

    let response = app.server.get("/logout").add_cookie(auth_cookie(&session)).await;
    assert_eq!(response.status_code(), 303);
    assert_eq!(location(&response), "/");

    let page = app
        .server
        .get("/")
        .add_cookie(auth_cookie(&session_cookie(&response)))
        .await
        .text();
    assert!(page.contains("href=\"/login\""));
    assert!(!page.contains("class=\"flash"));
}

/// Test: after logout, guarded routes redirect to /login again
#[tokio::test]
async fn test_unauthenticated_after_logout() {
    let app = create_test_server();
    let session = login(&app.server, "alice").await;

    app.server.get("/logout").add_cookie(auth_cookie(&session)).await;

    let response = app.server.get("/history").add_cookie(auth_cookie(&session)).await;
    assert_eq!(response.status_code(), 303);
    assert_eq!(location(&response), "/login");
}

/// Test: can sign in again after logout, reusing the same user record
#[tokio::test]
async fn test_can_relogin_after_logout() {
    use marketmapper_server::UserStore;

    let app = create_test_server();
    let session = login(&app.server, "alice").await;
    app.server.get("/logout").add_cookie(auth_cookie(&session)).await;

    let session = login(&app.server, "alice").await;
    let response = app.server.get("/history").add_cookie(auth_cookie(&session)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(app.state.user_store.count_users().unwrap(), 1);
}
