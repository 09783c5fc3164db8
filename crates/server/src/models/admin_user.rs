//! Admin user domain types.
//!
//! These types represent validated domain objects for back-office accounts.
//! Password hashes never leave the repository layer except through
//! [`crate::db::AdminUserRepository::get_password_hash`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use semecall_core::{AdminRole, AdminUserId, Email};

/// An admin user (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    /// Unique admin user ID.
    pub id: AdminUserId,
    /// Admin's display name.
    pub name: String,
    /// Admin's email address.
    pub email: Email,
    /// Admin's role.
    pub role: AdminRole,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
    /// When the admin was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new account. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: AdminRole,
}

/// Partial update. `None` leaves the column untouched; `updated_at` is
/// always bumped.
#[derive(Debug, Clone, Default)]
pub struct AdminUserUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub password_hash: Option<String>,
    pub role: Option<AdminRole>,
}

/// Listing filter for the accounts page.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring matched against name and email.
    pub search: Option<String>,
    /// Exact role match.
    pub role: Option<AdminRole>,
}
