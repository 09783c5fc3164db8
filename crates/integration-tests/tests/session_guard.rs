//! Session guard and login flow.

use axum::http::StatusCode;
use serde_json::json;

use semecall_integration_tests::{TEST_PASSWORD, TestApp, create_admin, test_pool, unique_email};

// =============================================================================
// Without a database
// =============================================================================

#[tokio::test]
async fn test_anonymous_admin_requests_are_rejected() {
    let mut app = TestApp::offline();

    for (method, uri) in [
        ("GET", "/api/admin/contacts?status=new"),
        ("GET", "/api/admin/stats"),
        ("GET", "/api/admin/smtp-settings"),
        ("GET", "/api/admin/users?search=jane"),
        ("GET", "/api/admin/profile"),
        ("DELETE", "/api/admin/contacts?id=00000000-0000-0000-0000-000000000000"),
    ] {
        let (status, body) = app.request(method, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }
}

#[tokio::test]
async fn test_forged_cookie_is_rejected() {
    let mut app = TestApp::offline();
    // An id the store never issued.
    app.set_cookie("semecall_admin_session=AAAAAAAAAAAAAAAAAAAAAA");

    let (status, body) = app.request("GET", "/api/admin/stats", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));
}

// =============================================================================
// With a database
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (SEMECALL_TEST_DATABASE_URL)"]
async fn test_login_grants_access_until_logout() {
    let pool = test_pool().await;
    let email = unique_email("guard");
    create_admin(&pool, &email).await;

    let mut app = TestApp::new(pool);
    assert_eq!(app.login(&email, "wrong password").await, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login(&email, TEST_PASSWORD).await, StatusCode::OK);

    let (status, body) = app.request("GET", "/api/admin/profile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], email.as_str());
    assert!(body.get("passwordHash").is_none());

    let (status, _) = app.request("POST", "/api/auth/logout", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request("GET", "/api/admin/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SEMECALL_TEST_DATABASE_URL)"]
async fn test_login_email_is_case_insensitive() {
    let pool = test_pool().await;
    let email = unique_email("case");
    create_admin(&pool, &email).await;

    let mut app = TestApp::new(pool);
    assert_eq!(
        app.login(&email.to_uppercase(), TEST_PASSWORD).await,
        StatusCode::OK
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SEMECALL_TEST_DATABASE_URL)"]
async fn test_change_password_ends_session() {
    let pool = test_pool().await;
    let email = unique_email("rotate");
    create_admin(&pool, &email).await;

    let mut app = TestApp::new(pool);
    assert_eq!(app.login(&email, TEST_PASSWORD).await, StatusCode::OK);

    let (status, body) = app
        .request(
            "POST",
            "/api/admin/change-password",
            Some(json!({ "currentPassword": "not it at all", "newPassword": "another secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Current password is incorrect");

    let (status, body) = app
        .request(
            "POST",
            "/api/admin/change-password",
            Some(json!({ "currentPassword": TEST_PASSWORD, "newPassword": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 8 characters long");

    let (status, body) = app
        .request(
            "POST",
            "/api/admin/change-password",
            Some(json!({ "currentPassword": TEST_PASSWORD, "newPassword": "another secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed successfully");

    let (status, _) = app.request("GET", "/api/admin/profile", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.login(&email, TEST_PASSWORD).await, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login(&email, "another secret").await, StatusCode::OK);
}
