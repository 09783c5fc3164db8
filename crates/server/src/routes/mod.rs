//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness check
//! GET    /health/ready              - Readiness check (database ping)
//!
//! # Public
//! POST   /api/contact               - Contact form intake
//!
//! # Auth
//! POST   /api/auth/login            - Password login, issues the session
//! POST   /api/auth/logout           - Drop the session
//!
//! # Admin (session required)
//! GET    /api/admin/contacts        - Inbox, optional ?status=
//! PATCH  /api/admin/contacts        - Change a message status
//! DELETE /api/admin/contacts?id=    - Delete a message
//! GET    /api/admin/stats           - Inbox counters
//! POST   /api/admin/send-reply      - Email a reply, mark the message replied
//! GET    /api/admin/smtp-settings   - Current SMTP settings
//! POST   /api/admin/smtp-settings   - Save SMTP settings
//! POST   /api/admin/test-smtp       - Handshake and send a probe email
//! GET    /api/admin/users           - List accounts, ?search= & ?role=
//! POST   /api/admin/users           - Create an account
//! PATCH  /api/admin/users           - Update an account
//! DELETE /api/admin/users?id=       - Delete an account
//! GET    /api/admin/profile         - Own account
//! PATCH  /api/admin/profile         - Update own name and email
//! POST   /api/admin/change-password - Change own password
//! ```

pub mod admin;
pub mod auth;
pub mod contact;

use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::state::AppState;

/// Build the application router.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(contact::router())
        .merge(auth::router())
        .merge(admin::router())
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
