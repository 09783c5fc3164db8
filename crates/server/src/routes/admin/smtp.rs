//! SMTP settings page and connectivity probe.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use lettre::AsyncTransport;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;

use semecall_core::Email;

use super::Ack;
use crate::{
    db::SmtpSettingsRepository,
    error::AppError,
    middleware::{ApiJson, RequireAdminAuth},
    models::{SmtpSettings, SmtpSettingsView},
    services::{SmtpMailer, email},
    state::AppState,
};

/// Rejection for any mail operation attempted before settings exist.
pub const SMTP_NOT_CONFIGURED: &str =
    "SMTP not configured. Please configure SMTP settings first.";

/// Build the SMTP settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/smtp-settings", get(show).post(save))
        .route("/api/admin/test-smtp", post(test_smtp))
}

/// Load the stored settings or fail with a configuration error.
pub(crate) async fn load_smtp_settings(pool: &PgPool) -> Result<SmtpSettings, AppError> {
    SmtpSettingsRepository::new(pool)
        .get()
        .await?
        .ok_or_else(|| AppError::Configuration(SMTP_NOT_CONFIGURED.to_string()))
}

/// Settings form body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSmtpRequest {
    pub host: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from_email: Option<String>,
    pub from_name: Option<String>,
}

impl SaveSmtpRequest {
    /// Validate into a settings record attributed to `updated_by`.
    ///
    /// The password is kept exactly as sent, including the empty string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if host, port, user or from email is
    /// missing, or the from email does not parse.
    pub fn into_settings(self, updated_by: &Email) -> Result<SmtpSettings, AppError> {
        let missing = || {
            AppError::Validation("Host, port, user, and from email are required".to_string())
        };
        let present = |value: Option<String>| {
            value
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let host = present(self.host).ok_or_else(missing)?;
        let port = self.port.filter(|p| *p > 0).ok_or_else(missing)?;
        let user = present(self.user).ok_or_else(missing)?;
        let from_email = present(self.from_email).ok_or_else(missing)?;
        let from_email = Email::parse(&from_email)
            .map_err(|_| AppError::Validation("Please enter a valid email address".to_string()))?;

        Ok(SmtpSettings {
            host,
            port,
            secure: self.secure,
            user,
            password: SecretString::from(self.password.unwrap_or_default()),
            from_email,
            from_name: present(self.from_name),
            updated_at: None,
            updated_by: Some(updated_by.to_string()),
        })
    }
}

/// Probe request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSmtpRequest {
    #[serde(default)]
    pub test_email: String,
}

/// Probe response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSmtpResponse {
    pub success: bool,
    pub message: &'static str,
    pub message_id: String,
}

/// Current settings, or empty placeholders when none are stored.
///
/// GET /api/admin/smtp-settings
///
/// # Errors
///
/// Returns 500 if the query fails.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<SmtpSettingsView>, AppError> {
    let view = SmtpSettingsRepository::new(state.pool())
        .get()
        .await?
        .as_ref()
        .map_or_else(SmtpSettingsView::placeholder, SmtpSettingsView::from);
    Ok(Json(view))
}

/// Replace the stored settings.
///
/// POST /api/admin/smtp-settings
///
/// # Errors
///
/// Returns 400 for missing fields, 500 if the upsert fails.
#[instrument(skip(admin, state, body), fields(admin = %admin.email))]
pub async fn save(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SaveSmtpRequest>,
) -> Result<Json<Ack>, AppError> {
    let settings = body.into_settings(&admin.email)?;

    SmtpSettingsRepository::new(state.pool())
        .save(&settings)
        .await?;
    tracing::info!(host = %settings.host, port = settings.port, "SMTP settings saved");

    Ok(Json(Ack::with_message("SMTP settings saved successfully")))
}

/// Handshake with the configured server, then send one probe email.
///
/// POST /api/admin/test-smtp
///
/// # Errors
///
/// Returns 400 when settings are missing, the address is missing or the
/// handshake fails; 500 when the probe cannot be delivered.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn test_smtp(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TestSmtpRequest>,
) -> Result<Json<TestSmtpResponse>, AppError> {
    let settings = load_smtp_settings(state.pool()).await?;

    if body.test_email.trim().is_empty() {
        return Err(AppError::Validation(
            "Test email address is required".to_string(),
        ));
    }
    let to = Email::parse(&body.test_email)
        .map_err(|_| AppError::Validation("Please enter a valid email address".to_string()))?;

    let handshake_failed = |details: String| AppError::Handshake {
        message: "Failed to connect to SMTP server. Please check your settings.".to_string(),
        details,
    };
    let mailer =
        SmtpMailer::from_settings(&settings).map_err(|e| handshake_failed(e.to_string()))?;
    mailer.test_connection().await.map_err(|e| {
        tracing::warn!(error = %e, host = %settings.host, "SMTP handshake failed");
        handshake_failed(e.to_string())
    })?;

    let rendered = email::render_smtp_test(&state.config().branding, &settings)?;
    let (message, message_id) = email::build_message(&settings, &to, rendered)?;
    mailer
        .transport()
        .send(message)
        .await
        .map_err(|e| AppError::Delivery {
            message: "Failed to send test email".to_string(),
            details: e.to_string(),
        })?;
    tracing::info!(email_message_id = %message_id, "SMTP test email sent");

    Ok(Json(TestSmtpResponse {
        success: true,
        message: "Test email sent successfully!",
        message_id,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn admin_email() -> Email {
        Email::parse("admin@semecall.com").unwrap()
    }

    fn request() -> SaveSmtpRequest {
        SaveSmtpRequest {
            host: Some("smtp.example.com".to_string()),
            port: Some(465),
            secure: true,
            user: Some("mailer".to_string()),
            password: Some(String::new()),
            from_email: Some("contact@semecall.com".to_string()),
            from_name: Some("Semecall".to_string()),
        }
    }

    fn validation_message(result: Result<SmtpSettings, AppError>) -> String {
        match result {
            Err(AppError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_into_settings() {
        let settings = request().into_settings(&admin_email()).unwrap();
        assert_eq!(settings.host, "smtp.example.com");
        assert_eq!(settings.port, 465);
        assert!(settings.secure);
        assert_eq!(settings.password.expose_secret(), "");
        assert_eq!(settings.updated_by.as_deref(), Some("admin@semecall.com"));
    }

    #[test]
    fn test_required_fields() {
        let required = "Host, port, user, and from email are required";
        for request in [
            SaveSmtpRequest { host: None, ..request() },
            SaveSmtpRequest { port: Some(0), ..request() },
            SaveSmtpRequest { port: None, ..request() },
            SaveSmtpRequest { user: Some(" ".to_string()), ..request() },
            SaveSmtpRequest { from_email: None, ..request() },
        ] {
            assert_eq!(validation_message(request.into_settings(&admin_email())), required);
        }
    }

    #[test]
    fn test_password_is_optional() {
        let settings = SaveSmtpRequest {
            password: None,
            ..request()
        }
        .into_settings(&admin_email())
        .unwrap();
        assert_eq!(settings.password.expose_secret(), "");
    }

    #[test]
    fn test_blank_from_name_dropped() {
        let settings = SaveSmtpRequest {
            from_name: Some("  ".to_string()),
            ..request()
        }
        .into_settings(&admin_email())
        .unwrap();
        assert!(settings.from_name.is_none());
    }
}
