//! Contact message domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use semecall_core::{ContactMessageId, ContactStatus, Email};

/// A stored contact-form submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replied_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replied_by: Option<String>,
}

impl ContactMessage {
    /// Sender's display name as "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A validated submission ready to be inserted.
///
/// Status and timestamps are not part of this type: the store always
/// inserts with status `new` and the current time.
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub company: Option<String>,
    pub message: String,
}
