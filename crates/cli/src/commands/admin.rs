//! Admin account commands.
//!
//! Goes through the same service as the HTTP API, so password length,
//! hashing and the case-insensitive email index apply identically.

use semecall_core::AdminRole;
use semecall_server::services::{AdminAuthService, auth::CreateAdmin};

use super::{CliError, connect};

/// Create a new admin user.
///
/// # Errors
///
/// Returns `CliError::InvalidRole` for an unknown role, or `CliError::Auth`
/// for a short password, a malformed email or an existing account.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<(), CliError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;

    let pool = connect().await?;

    tracing::info!("Creating admin user: {} ({})", email, role);
    let user = AdminAuthService::new(&pool)
        .create_user(CreateAdmin {
            name,
            email,
            password,
            role,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}

/// Replace the password of an existing admin user.
///
/// # Errors
///
/// Returns `CliError::Auth` for a short password or an unknown account.
pub async fn reset_password(email: &str, password: &str) -> Result<(), CliError> {
    let pool = connect().await?;

    AdminAuthService::new(&pool)
        .reset_password(email, password)
        .await?;

    tracing::info!("Password reset for {}", email);
    Ok(())
}
