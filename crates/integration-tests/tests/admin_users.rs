//! Admin account management.

use axum::http::StatusCode;
use serde_json::json;

use semecall_core::AdminRole;
use semecall_integration_tests::{TEST_PASSWORD, TestApp, create_admin, test_pool, unique_email};
use semecall_server::services::{AdminAuthService, AuthError, auth::CreateAdmin};

#[tokio::test]
#[ignore = "Requires PostgreSQL (SEMECALL_TEST_DATABASE_URL)"]
async fn test_email_differing_only_in_case_conflicts() {
    let pool = test_pool().await;
    let email = unique_email("dupe");
    create_admin(&pool, &email).await;

    let err = AdminAuthService::new(&pool)
        .create_user(CreateAdmin {
            name: "Shadow",
            email: &email.to_uppercase(),
            password: TEST_PASSWORD,
            role: AdminRole::Moderator,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserAlreadyExists));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SEMECALL_TEST_DATABASE_URL)"]
async fn test_user_management_over_http() {
    let pool = test_pool().await;
    let admin_email = unique_email("boss");
    let admin = create_admin(&pool, &admin_email).await;

    let mut app = TestApp::new(pool);
    assert_eq!(app.login(&admin_email, TEST_PASSWORD).await, StatusCode::OK);

    let new_email = unique_email("mod");
    let (status, created) = app
        .request(
            "POST",
            "/api/admin/users",
            Some(json!({
                "name": "Moderator",
                "email": new_email,
                "password": "moderator pw",
                "role": "moderator"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "moderator");
    assert!(created.get("passwordHash").is_none());

    let (status, body) = app
        .request(
            "POST",
            "/api/admin/users",
            Some(json!({
                "name": "Copy",
                "email": new_email.to_uppercase(),
                "password": "moderator pw"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "User with this email already exists");

    let (status, body) = app
        .request(
            "POST",
            "/api/admin/users",
            Some(json!({ "name": "Weak", "email": unique_email("weak"), "password": "short" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Password must be at least 8 characters long");

    let search = new_email.split('@').next().unwrap().to_uppercase();
    let (status, listed) = app
        .request("GET", &format!("/api/admin/users?search={search}&role=moderator"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["email"], new_email.as_str());

    let id = created["id"].as_str().unwrap().to_owned();
    let (status, updated) = app
        .request(
            "PATCH",
            "/api/admin/users",
            Some(json!({ "userId": id, "name": "Renamed", "email": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["email"], new_email.as_str());

    let (status, body) = app
        .request("DELETE", &format!("/api/admin/users?id={}", admin.id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "You cannot delete your own account");

    let (status, _) = app
        .request("DELETE", &format!("/api/admin/users?id={id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request("DELETE", &format!("/api/admin/users?id={id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SEMECALL_TEST_DATABASE_URL)"]
async fn test_profile_update_refreshes_session() {
    let pool = test_pool().await;
    let email = unique_email("me");
    create_admin(&pool, &email).await;

    let mut app = TestApp::new(pool);
    assert_eq!(app.login(&email, TEST_PASSWORD).await, StatusCode::OK);

    let renamed_email = unique_email("me-renamed");
    let (status, body) = app
        .request(
            "PATCH",
            "/api/admin/profile",
            Some(json!({ "name": "New Name", "email": renamed_email })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "New Name");

    let (status, body) = app.request("GET", "/api/admin/profile", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], renamed_email.as_str());

    let (status, body) = app
        .request("PATCH", "/api/admin/profile", Some(json!({ "name": "", "email": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name and email are required");
}
