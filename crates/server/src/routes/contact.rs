//! Public contact form intake.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use semecall_core::Email;

use crate::{
    db::ContactMessageRepository, error::AppError, models::NewContactMessage, state::AppState,
};

const ALL_FIELDS_REQUIRED: &str = "All fields are required";

/// Build the public contact router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/contact", post(submit))
}

/// Contact form body. Unknown fields such as `status` or `createdAt` are
/// dropped during deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub consent: bool,
}

impl ContactForm {
    /// Check required fields, consent and the email address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` naming the first problem found.
    pub fn validate(self) -> Result<NewContactMessage, AppError> {
        let required = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Validation(ALL_FIELDS_REQUIRED.to_string()))
        };

        let first_name = required(self.first_name)?;
        let last_name = required(self.last_name)?;
        let email = required(self.email)?;
        let phone = required(self.phone)?;
        let message = required(self.message)?;
        if !self.consent {
            return Err(AppError::Validation(ALL_FIELDS_REQUIRED.to_string()));
        }

        let email = Email::parse(&email)
            .map_err(|_| AppError::Validation("Please enter a valid email address".to_string()))?;

        Ok(NewContactMessage {
            first_name,
            last_name,
            email,
            phone,
            company: self
                .company
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty()),
            message,
        })
    }
}

/// Intake response. The stored id is never returned to the public.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Accept a contact form submission.
///
/// POST /api/contact
///
/// # Errors
///
/// Returns 400 for missing fields or a bad email, 500 if storage fails.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    let Json(form) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected contact form body");
        AppError::Validation(ALL_FIELDS_REQUIRED.to_string())
    })?;
    let new_message = form.validate()?;

    let id = ContactMessageRepository::new(state.pool())
        .create(&new_message)
        .await?;
    tracing::info!(contact_message_id = %id, "Contact form submitted");

    Ok(Json(SubmitResponse {
        success: true,
        message: "Form submitted successfully",
    }))
}
