//! Contact message repository.
//!
//! Queries are checked at runtime (`sqlx::query_as`) so the crate builds
//! without a live database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use semecall_core::{ContactMessageId, ContactStatus, Email, StatusFilter};

use super::RepositoryError;
use crate::models::{ContactMessage, NewContactMessage};

const SELECT_COLUMNS: &str = "id, first_name, last_name, email, phone, company, message, \
     status, created_at, updated_at, replied_at, replied_by";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ContactMessageRow {
    id: ContactMessageId,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    company: Option<String>,
    message: String,
    status: ContactStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    replied_at: Option<DateTime<Utc>>,
    replied_by: Option<String>,
}

impl TryFrom<ContactMessageRow> for ContactMessage {
    type Error = RepositoryError;

    fn try_from(row: ContactMessageRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            phone: row.phone,
            company: row.company,
            message: row.message,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            replied_at: row.replied_at,
            replied_by: row.replied_by,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for contact message database operations.
pub struct ContactMessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactMessageRepository<'a> {
    /// Create a new contact message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a public submission with status `new` and `created_at = NOW()`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        message: &NewContactMessage,
    ) -> Result<ContactMessageId, RepositoryError> {
        let id: ContactMessageId = sqlx::query_scalar(
            r"
            INSERT INTO semecall.contact_message
                (first_name, last_name, email, phone, company, message, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'new')
            RETURNING id
            ",
        )
        .bind(&message.first_name)
        .bind(&message.last_name)
        .bind(&message.email)
        .bind(&message.phone)
        .bind(message.company.as_deref())
        .bind(&message.message)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// List messages matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list(&self, filter: StatusFilter) -> Result<Vec<ContactMessage>, RepositoryError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM semecall.contact_message \
             WHERE ($1::semecall.contact_status IS NULL OR status = $1) \
             ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, ContactMessageRow>(&sql)
            .bind(filter.status())
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a message by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(
        &self,
        id: ContactMessageId,
    ) -> Result<Option<ContactMessage>, RepositoryError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM semecall.contact_message WHERE id = $1");
        let row = sqlx::query_as::<_, ContactMessageRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Move a message to `status`, bumping `updated_at`.
    ///
    /// The current status is read under a row lock and validated with
    /// [`ContactStatus::transition_to`] before the write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message doesn't exist.
    /// Returns `RepositoryError::InvalidTransition` if the change is not permitted.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: ContactMessageId,
        status: ContactStatus,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: ContactStatus = sqlx::query_scalar(
            "SELECT status FROM semecall.contact_message WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let next = current.transition_to(status)?;

        sqlx::query(
            r"
            UPDATE semecall.contact_message
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(next)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Mark a message as replied by `replied_by`.
    ///
    /// Stamps `replied_at` and `updated_at` with the current time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message doesn't exist.
    /// Returns `RepositoryError::InvalidTransition` if the change is not permitted.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_replied(
        &self,
        id: ContactMessageId,
        replied_by: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: ContactStatus = sqlx::query_scalar(
            "SELECT status FROM semecall.contact_message WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let next = current.transition_to(ContactStatus::Replied)?;

        sqlx::query(
            r"
            UPDATE semecall.contact_message
            SET status = $2, replied_at = NOW(), replied_by = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(next)
        .bind(replied_by)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Permanently delete a message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ContactMessageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM semecall.contact_message WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count messages matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: StatusFilter) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM semecall.contact_message
            WHERE ($1::semecall.contact_status IS NULL OR status = $1)
            ",
        )
        .bind(filter.status())
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
