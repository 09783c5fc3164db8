//! Admin API. Every handler takes [`RequireAdminAuth`] as its first
//! argument, so an anonymous request is rejected before any data access.
//!
//! [`RequireAdminAuth`]: crate::middleware::RequireAdminAuth

pub mod contacts;
pub mod profile;
pub mod replies;
pub mod smtp;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Build the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(contacts::router())
        .merge(replies::router())
        .merge(smtp::router())
        .merge(users::router())
        .merge(profile::router())
}

/// `{"success": true, "message": ...}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl Ack {
    /// Bare `{"success": true}`.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// `{"success": true, "message": message}`.
    #[must_use]
    pub const fn with_message(message: &'static str) -> Self {
        Self {
            success: true,
            message: Some(message),
        }
    }
}
