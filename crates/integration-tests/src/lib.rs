//! Integration tests for the Semecall back-office.
//!
//! # Running Tests
//!
//! ```bash
//! # Tests that need no database
//! cargo test -p semecall-integration-tests
//!
//! # Database lifecycle tests
//! SEMECALL_TEST_DATABASE_URL=postgres://localhost/semecall_test \
//!     cargo test -p semecall-integration-tests -- --include-ignored
//! ```
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` and an
//! in-memory session store, so no server is started.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use secrecy::SecretString;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use uuid::Uuid;

use semecall_core::AdminRole;
use semecall_server::{
    config::{BrandingConfig, ServerConfig},
    middleware::session_layer,
    models::AdminUser,
    routes,
    services::{AdminAuthService, auth::CreateAdmin},
    state::AppState,
};

/// Environment variable naming the throwaway test database.
pub const TEST_DATABASE_URL_VAR: &str = "SEMECALL_TEST_DATABASE_URL";

/// Password given to every account created by [`create_admin`].
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Configuration pointing at `database_url`.
#[must_use]
pub fn test_config(database_url: &str) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from(database_url.to_owned()),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost".to_string(),
        log_json: false,
        branding: BrandingConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// Connect to the test database and apply the migrations.
pub async fn test_pool() -> PgPool {
    let url = std::env::var(TEST_DATABASE_URL_VAR)
        .unwrap_or_else(|_| panic!("{TEST_DATABASE_URL_VAR} must be set"));
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("../server/migrations").run(&pool).await.unwrap();
    pool
}

/// Pool that never connects; only requests rejected before any query may
/// reach it.
#[must_use]
pub fn offline_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://localhost/semecall_offline")
        .unwrap()
}

/// A unique address so concurrent tests never collide.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@semecall.test", Uuid::new_v4().simple())
}

/// Create an admin account with [`TEST_PASSWORD`].
pub async fn create_admin(pool: &PgPool, email: &str) -> AdminUser {
    AdminAuthService::new(pool)
        .create_user(CreateAdmin {
            name: "Test Admin",
            email,
            password: TEST_PASSWORD,
            role: AdminRole::Admin,
        })
        .await
        .unwrap()
}

/// In-process client that carries the session cookie between requests.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    /// Router over `pool` with an in-memory session store.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let state = AppState::new(test_config("postgres://unused"), pool);
        Self {
            router: routes::app(state, session_layer(MemoryStore::default(), false)),
            cookie: None,
        }
    }

    /// Router that must not touch the database.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(offline_pool())
    }

    /// Replace the cookie sent with later requests.
    pub fn set_cookie(&mut self, cookie: &str) {
        self.cookie = Some(cookie.to_owned());
    }

    /// Send a request, remembering any session cookie handed back.
    pub async fn request(
        &mut self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie
                .to_str()
                .unwrap()
                .split(';')
                .next()
                .unwrap()
                .to_owned();
            self.cookie = Some(pair);
        }

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    /// Log in and keep the session cookie.
    pub async fn login(&mut self, email: &str, password: &str) -> StatusCode {
        let (status, _) = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await;
        status
    }
}
