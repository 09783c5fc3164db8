//! The signed-in admin's own account.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::Ack;
use crate::{
    error::AppError,
    middleware::{ApiJson, RequireAdminAuth, set_current_admin},
    models::{AdminUser, CurrentAdmin},
    services::AdminAuthService,
    state::AppState,
};

/// Build the profile router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/profile", get(show).patch(update))
        .route("/api/admin/change-password", post(change_password))
}

/// Profile update body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Password change body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// The caller's account.
///
/// GET /api/admin/profile
///
/// # Errors
///
/// Returns 404 if the account was deleted while the session lived.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<AdminUser>, AppError> {
    let user = AdminAuthService::new(state.pool())
        .get_user(admin.id)
        .await?;
    Ok(Json(user))
}

/// Update the caller's name and email and refresh the session identity.
///
/// PATCH /api/admin/profile
///
/// # Errors
///
/// Returns 400 for missing fields, 409 if the email is taken.
#[instrument(skip(admin, state, session, body), fields(admin = %admin.email))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<Json<AdminUser>, AppError> {
    let user = AdminAuthService::new(state.pool())
        .update_profile(admin.id, &body.name, &body.email)
        .await?;

    set_current_admin(&session, &CurrentAdmin::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(user))
}

/// Change the caller's password. The session is dropped on success.
///
/// POST /api/admin/change-password
///
/// # Errors
///
/// Returns 400 for missing fields, a short new password or a wrong current
/// password.
#[instrument(skip_all, fields(admin = %admin.email))]
pub async fn change_password(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<Json<Ack>, AppError> {
    AdminAuthService::new(state.pool())
        .change_password(admin.id, &body.current_password, &body.new_password)
        .await?;

    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(Ack::with_message("Password changed successfully")))
}
