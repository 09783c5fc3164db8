//! Outgoing mail configuration.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use semecall_core::Email;

/// Default submission port shown when nothing has been saved yet.
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// The singleton SMTP configuration.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    /// Implicit TLS (SMTPS) when true, opportunistic STARTTLS otherwise.
    pub secure: bool,
    pub user: String,
    pub password: SecretString,
    pub from_email: Email,
    pub from_name: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("updated_at", &self.updated_at)
            .field("updated_by", &self.updated_by)
            .finish()
    }
}

/// JSON shape returned to the settings page.
///
/// Absent settings render as empty strings with port 587 so the form can
/// always be populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpSettingsView {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl SmtpSettingsView {
    /// Placeholder values for an unconfigured installation.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SMTP_PORT,
            secure: false,
            user: String::new(),
            password: String::new(),
            from_email: String::new(),
            from_name: String::new(),
        }
    }
}

impl From<&SmtpSettings> for SmtpSettingsView {
    fn from(settings: &SmtpSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            secure: settings.secure,
            user: settings.user.clone(),
            password: settings.password.expose_secret().to_owned(),
            from_email: settings.from_email.to_string(),
            from_name: settings.from_name.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_defaults() {
        let view = SmtpSettingsView::placeholder();
        assert_eq!(view.port, 587);
        assert!(view.host.is_empty());
        assert!(!view.secure);
    }

    #[test]
    fn test_debug_redacts_password() {
        let settings = SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 465,
            secure: true,
            user: "mailer".to_string(),
            password: SecretString::from("hunter22"),
            from_email: Email::parse("noreply@example.com").unwrap(),
            from_name: None,
            updated_at: None,
            updated_by: None,
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let json = serde_json::to_value(SmtpSettingsView::placeholder()).unwrap();
        assert_eq!(json["port"], 587);
        assert_eq!(json["fromEmail"], "");
        assert_eq!(json["fromName"], "");
    }
}
