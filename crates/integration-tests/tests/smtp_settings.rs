//! SMTP settings singleton.

use axum::http::StatusCode;
use serde_json::json;

use semecall_integration_tests::{TEST_PASSWORD, TestApp, create_admin, test_pool, unique_email};
use semecall_server::db::SmtpSettingsRepository;

#[tokio::test]
#[ignore = "Requires PostgreSQL (SEMECALL_TEST_DATABASE_URL)"]
async fn test_settings_upsert_keeps_one_row() {
    let pool = test_pool().await;
    let admin_email = unique_email("smtp");
    create_admin(&pool, &admin_email).await;

    let mut app = TestApp::new(pool.clone());
    assert_eq!(app.login(&admin_email, TEST_PASSWORD).await, StatusCode::OK);

    for host in ["smtp.first.test", "smtp.second.test"] {
        let (status, body) = app
            .request(
                "POST",
                "/api/admin/smtp-settings",
                Some(json!({
                    "host": host,
                    "port": 587,
                    "secure": false,
                    "user": "mailer",
                    "password": "",
                    "fromEmail": "contact@semecall.com",
                    "fromName": "Semecall"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "SMTP settings saved successfully");
    }

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM semecall.smtp_settings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    let stored = SmtpSettingsRepository::new(&pool).get().await.unwrap().unwrap();
    assert_eq!(stored.host, "smtp.second.test");
    assert_eq!(stored.updated_by.as_deref(), Some(admin_email.as_str()));

    let (status, body) = app.request("GET", "/api/admin/smtp-settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["host"], "smtp.second.test");
    assert_eq!(body["password"], "");
    assert_eq!(body["fromEmail"], "contact@semecall.com");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (SEMECALL_TEST_DATABASE_URL)"]
async fn test_settings_validation() {
    let pool = test_pool().await;
    let admin_email = unique_email("smtpbad");
    create_admin(&pool, &admin_email).await;

    let mut app = TestApp::new(pool);
    assert_eq!(app.login(&admin_email, TEST_PASSWORD).await, StatusCode::OK);

    let (status, body) = app
        .request(
            "POST",
            "/api/admin/smtp-settings",
            Some(json!({ "host": "smtp.semecall.test", "port": 0, "user": "mailer" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Host, port, user, and from email are required");

    let (status, body) = app
        .request("POST", "/api/admin/test-smtp", Some(json!({ "testEmail": "" })))
        .await;
    // Either SMTP is not configured yet, or the address check fires.
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
