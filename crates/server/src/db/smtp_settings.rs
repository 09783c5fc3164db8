//! SMTP settings singleton repository.
//!
//! The table holds at most one row (`id BOOLEAN PRIMARY KEY CHECK (id)`);
//! saving is an upsert against that row.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use semecall_core::Email;

use super::RepositoryError;
use crate::models::SmtpSettings;

#[derive(sqlx::FromRow)]
struct SmtpSettingsRow {
    host: String,
    port: i32,
    secure: bool,
    smtp_user: String,
    password: String,
    from_email: String,
    from_name: Option<String>,
    updated_at: DateTime<Utc>,
    updated_by: Option<String>,
}

impl TryFrom<SmtpSettingsRow> for SmtpSettings {
    type Error = RepositoryError;

    fn try_from(row: SmtpSettingsRow) -> Result<Self, Self::Error> {
        let port = u16::try_from(row.port).map_err(|_| {
            RepositoryError::DataCorruption(format!("invalid SMTP port in database: {}", row.port))
        })?;
        let from_email = Email::parse(&row.from_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid from email in database: {e}"))
        })?;

        Ok(Self {
            host: row.host,
            port,
            secure: row.secure,
            user: row.smtp_user,
            password: SecretString::from(row.password),
            from_email,
            from_name: row.from_name.filter(|n| !n.is_empty()),
            updated_at: Some(row.updated_at),
            updated_by: row.updated_by,
        })
    }
}

/// Repository for the SMTP settings singleton.
pub struct SmtpSettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SmtpSettingsRepository<'a> {
    /// Create a new SMTP settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the saved settings, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self) -> Result<Option<SmtpSettings>, RepositoryError> {
        let row = sqlx::query_as::<_, SmtpSettingsRow>(
            r"
            SELECT host, port, secure, smtp_user, password, from_email, from_name,
                   updated_at, updated_by
            FROM semecall.smtp_settings
            WHERE id
            ",
        )
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert or replace the singleton. The password is stored exactly as given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn save(&self, settings: &SmtpSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO semecall.smtp_settings
                (id, host, port, secure, smtp_user, password, from_email, from_name,
                 updated_at, updated_by)
            VALUES (TRUE, $1, $2, $3, $4, $5, $6, $7, NOW(), $8)
            ON CONFLICT (id) DO UPDATE SET
                host = EXCLUDED.host,
                port = EXCLUDED.port,
                secure = EXCLUDED.secure,
                smtp_user = EXCLUDED.smtp_user,
                password = EXCLUDED.password,
                from_email = EXCLUDED.from_email,
                from_name = EXCLUDED.from_name,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            ",
        )
        .bind(&settings.host)
        .bind(i32::from(settings.port))
        .bind(settings.secure)
        .bind(&settings.user)
        .bind(settings.password.expose_secret())
        .bind(&settings.from_email)
        .bind(settings.from_name.as_deref())
        .bind(settings.updated_by.as_deref())
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
