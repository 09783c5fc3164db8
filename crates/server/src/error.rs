//! Unified error handling for the HTTP layer.
//!
//! Every failure leaves a handler as an [`AppError`] and is rendered as a
//! JSON body `{"error": "...", "details": "..."}` (`details` only when there
//! is underlying transport text worth showing to the admin).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::email::EmailError;

/// Generic message for failures whose cause must stay server-side.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// A prerequisite (SMTP settings) has not been configured.
    #[error("{0}")]
    Configuration(String),

    /// No authenticated admin session.
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation.
    #[error("{0}")]
    Conflict(String),

    /// The SMTP server could not be reached or refused the handshake.
    #[error("{message}: {details}")]
    Handshake {
        /// Message shown as `error`.
        message: String,
        /// Raw transport error, shown as `details`.
        details: String,
    },

    /// The mail transport rejected or failed a send.
    #[error("{message}: {details}")]
    Delivery {
        /// Message shown as `error`.
        message: String,
        /// Raw transport error, shown as `details`.
        details: String,
    },

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Not found".to_string()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::InvalidTransition(e) => Self::Validation(e.to_string()),
            other => Self::Database(other),
        }
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Configuration(_) | Self::Handshake { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Delivery { .. } | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Shorthand for the session guard rejection.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Delivery { .. }
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status_code();

        // Don't expose internal error details to clients
        let body = match self {
            Self::Database(_) | Self::Internal(_) => ErrorBody {
                error: INTERNAL_ERROR_MESSAGE.to_string(),
                details: None,
            },
            Self::Handshake { message, details } | Self::Delivery { message, details } => ErrorBody {
                error: message,
                details: Some(details),
            },
            Self::Validation(message)
            | Self::Configuration(message)
            | Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Conflict(message) => ErrorBody {
                error: message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Set the Sentry user context from an admin user.
pub fn set_sentry_user(admin_user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
