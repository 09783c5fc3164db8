//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SEMECALL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SEMECALL_BASE_URL` - Public URL of the site (https enables Secure cookies)
//!
//! ## Optional
//! - `SEMECALL_HOST` - Bind address (default: 127.0.0.1)
//! - `SEMECALL_PORT` - Listen port (default: 3000)
//! - `SEMECALL_LOG_JSON` - Emit JSON logs when set to anything but `0`/`false`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)
//!
//! ## Optional (email branding)
//! - `BRAND_NAME` - Name shown in email header/footer (default: Semecall)
//! - `BRAND_TAGLINE` - Header subtitle
//! - `BRAND_CONTACT_EMAIL` - Footer contact address
//! - `BRAND_PHONE` - Footer phone line
//! - `BRAND_ADDRESS` - Footer postal address, lines separated by `|`
//!
//! ## Optional (TLS)
//! - `SEMECALL_TLS_CERT` - PEM-encoded certificate chain
//! - `SEMECALL_TLS_KEY` - PEM-encoded private key

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_BRAND_NAME: &str = "Semecall";
const DEFAULT_BRAND_TAGLINE: &str = "Expert in Remote Sales Performance";
const DEFAULT_BRAND_CONTACT_EMAIL: &str = "contact@semecall.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Branding used in outgoing emails
    pub branding: BrandingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Sender branding rendered into every outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandingConfig {
    /// Company name shown in the header and footer.
    pub name: String,
    /// Short line under the header name.
    pub tagline: String,
    /// Contact address printed in the footer.
    pub contact_email: String,
    /// Phone line printed in the footer.
    pub phone: Option<String>,
    /// Postal address lines printed in the footer.
    pub address_lines: Vec<String>,
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_BRAND_NAME.to_owned(),
            tagline: DEFAULT_BRAND_TAGLINE.to_owned(),
            contact_email: DEFAULT_BRAND_CONTACT_EMAIL.to_owned(),
            phone: None,
            address_lines: Vec::new(),
        }
    }
}

impl BrandingConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: get_optional_env("BRAND_NAME").unwrap_or(defaults.name),
            tagline: get_optional_env("BRAND_TAGLINE").unwrap_or(defaults.tagline),
            contact_email: get_optional_env("BRAND_CONTACT_EMAIL")
                .unwrap_or(defaults.contact_email),
            phone: get_optional_env("BRAND_PHONE"),
            address_lines: get_optional_env("BRAND_ADDRESS")
                .map(|raw| split_address(&raw))
                .unwrap_or_default(),
        }
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("SEMECALL_TLS_CERT");
        let key_pem = get_optional_env("SEMECALL_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SEMECALL_TLS_*".to_string(),
                "Both SEMECALL_TLS_CERT and SEMECALL_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SEMECALL_DATABASE_URL")?;
        let host = get_env_or_default("SEMECALL_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SEMECALL_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SEMECALL_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SEMECALL_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("SEMECALL_BASE_URL")?;
        let log_json = get_optional_env("SEMECALL_LOG_JSON").is_some_and(|v| is_truthy(&v));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            log_json,
            branding: BrandingConfig::from_env(),
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (controls Secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

/// Split a `|`-separated postal address into trimmed, non-empty lines.
fn split_address(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
