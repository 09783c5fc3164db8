//! Authentication and account management service.
//!
//! Passwords are hashed with Argon2id (PHC string format). Email uniqueness
//! is left to the database index; a violation surfaces as
//! [`AuthError::UserAlreadyExists`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use semecall_core::{AdminRole, AdminUserId, Email};

use crate::db::AdminUserRepository;
use crate::models::{AdminUser, AdminUserUpdate, NewAdminUser, UserFilter};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Input for [`AdminAuthService::create_user`].
#[derive(Debug, Clone)]
pub struct CreateAdmin<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: AdminRole,
}

/// Input for [`AdminAuthService::update_user`]. Empty strings count as absent.
#[derive(Debug, Clone, Default)]
pub struct UpdateAdmin<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password: Option<&'a str>,
    pub role: Option<AdminRole>,
}

/// Authentication and account service.
pub struct AdminAuthService<'a> {
    users: AdminUserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: AdminUserRepository::new(pool),
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong,
    /// including when the email is malformed.
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash).map_err(|_| AuthError::InvalidCredentials)?;

        Ok(user)
    }

    /// Change the password of `user_id` after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if either password is empty.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    /// Returns `AuthError::IncorrectPassword` if `current` does not match.
    pub async fn change_password(
        &self,
        user_id: AdminUserId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        if current.is_empty() || new.is_empty() {
            return Err(AuthError::MissingFields(
                "Current password and new password are required",
            ));
        }
        validate_password(new)?;

        let stored = self
            .users
            .get_password_hash_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(current, &stored).map_err(|_| AuthError::IncorrectPassword)?;

        let update = AdminUserUpdate {
            password_hash: Some(hash_password(new)?),
            ..AdminUserUpdate::default()
        };
        self.users.update(user_id, &update).await?;

        tracing::info!(admin_user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Overwrite the password of the account with this email (operator reset).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::UserNotFound`.
    pub async fn reset_password(&self, email: &str, new: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        validate_password(new)?;
        let hash = hash_password(new)?;
        self.users.set_password_hash_by_email(&email, &hash).await?;
        Ok(())
    }

    // =========================================================================
    // Account Management
    // =========================================================================

    /// List accounts matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn list_users(&self, filter: &UserFilter) -> Result<Vec<AdminUser>, AuthError> {
        Ok(self.users.list(filter).await?)
    }

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: AdminUserId) -> Result<AdminUser, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if name, email or password is empty.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken (any case).
    pub async fn create_user(&self, input: CreateAdmin<'_>) -> Result<AdminUser, AuthError> {
        let name = input.name.trim();
        if name.is_empty() || input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingFields(
                "Name, email, and password are required",
            ));
        }
        let email = Email::parse(input.email)?;
        validate_password(input.password)?;

        let user = self
            .users
            .create(&NewAdminUser {
                name: name.to_owned(),
                email,
                password_hash: hash_password(input.password)?,
                role: input.role,
            })
            .await?;

        tracing::info!(admin_user_id = %user.id, role = %user.role, "Admin user created");
        Ok(user)
    }

    /// Apply a partial update to an account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if a new email is malformed.
    /// Returns `AuthError::WeakPassword` if a new password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the new email is taken.
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn update_user(
        &self,
        user_id: AdminUserId,
        input: UpdateAdmin<'_>,
    ) -> Result<AdminUser, AuthError> {
        let email = non_empty(input.email).map(Email::parse).transpose()?;
        let password_hash = match input.password.filter(|p| !p.is_empty()) {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let update = AdminUserUpdate {
            name: non_empty(input.name).map(ToOwned::to_owned),
            email,
            password_hash,
            role: input.role,
        };

        let user = self.users.update(user_id, &update).await?;
        tracing::info!(admin_user_id = %user.id, "Admin user updated");
        Ok(user)
    }

    /// Update the caller's own name and email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if name or email is empty.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is taken.
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn update_profile(
        &self,
        user_id: AdminUserId,
        name: &str,
        email: &str,
    ) -> Result<AdminUser, AuthError> {
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(AuthError::MissingFields("Name and email are required"));
        }
        self.update_user(
            user_id,
            UpdateAdmin {
                name: Some(name),
                email: Some(email),
                ..UpdateAdmin::default()
            },
        )
        .await
    }

    /// Delete `target`, refusing when it is the caller's own account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CannotDeleteSelf` if `target == current`.
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn delete_user(
        &self,
        current: AdminUserId,
        target: AdminUserId,
    ) -> Result<(), AuthError> {
        if current == target {
            return Err(AuthError::CannotDeleteSelf);
        }
        self.users.delete(target).await?;
        tracing::info!(admin_user_id = %target, deleted_by = %current, "Admin user deleted");
        Ok(())
    }
}

/// Trimmed value, or `None` when absent or blank.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Validate password strength.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if shorter than [`MIN_PASSWORD_LENGTH`].
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is malformed or does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_auth_error_http_mapping() {
        let status = |e: AuthError| AppError::from(e).status_code();
        assert_eq!(status(AuthError::InvalidCredentials).as_u16(), 401);
        assert_eq!(status(AuthError::IncorrectPassword).as_u16(), 400);
        assert_eq!(status(AuthError::CannotDeleteSelf).as_u16(), 400);
        assert_eq!(status(AuthError::UserAlreadyExists).as_u16(), 409);
        assert_eq!(status(AuthError::UserNotFound).as_u16(), 404);
        assert_eq!(
            status(AuthError::WeakPassword("short".to_string())).as_u16(),
            400
        );
    }

    #[test]
    fn test_cannot_delete_self_message() {
        let err = AppError::from(AuthError::CannotDeleteSelf);
        assert_eq!(err.to_string(), "You cannot delete your own account");
    }
}
