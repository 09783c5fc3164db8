//! Admin account management.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use semecall_core::{AdminRole, AdminUserId};

use super::Ack;
use crate::{
    error::AppError,
    middleware::{ApiJson, RequireAdminAuth},
    models::{AdminUser, UserFilter},
    services::{
        AdminAuthService,
        auth::{CreateAdmin, UpdateAdmin},
    },
    state::AppState,
};

/// Build the accounts router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/admin/users",
        get(list).post(create).patch(update).delete(delete),
    )
}

/// `?search=&role=` listing filter.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub role: Option<String>,
}

/// Account creation body.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

/// Partial account update body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// `?id=` for deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteUserQuery {
    pub id: Option<String>,
}

/// Parse an optional role; absent, blank and `all` mean no role.
fn parse_role(raw: Option<&str>) -> Result<Option<AdminRole>, AppError> {
    match raw.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(role) => role
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation("Invalid role".to_string())),
    }
}

fn parse_user_id(raw: Option<&str>) -> Result<AdminUserId, AppError> {
    raw.map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("User ID is required".to_string()))?
        .parse()
        .map_err(|_| AppError::Validation("Invalid user ID".to_string()))
}

/// List accounts, newest first. Password hashes are never included.
///
/// GET /api/admin/users
///
/// # Errors
///
/// Returns 400 for an unknown role.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn list(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<AdminUser>>, AppError> {
    let filter = UserFilter {
        search: query
            .search
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty()),
        role: parse_role(query.role.as_deref())?,
    };

    let users = AdminAuthService::new(state.pool())
        .list_users(&filter)
        .await?;
    Ok(Json(users))
}

/// Create an account.
///
/// POST /api/admin/users
///
/// # Errors
///
/// Returns 400 for missing fields or a short password, 409 for a taken email.
#[instrument(skip(admin, state, body), fields(admin = %admin.email, email = %body.email))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<AdminUser>), AppError> {
    let role = parse_role(body.role.as_deref())?.unwrap_or_default();

    let user = AdminAuthService::new(state.pool())
        .create_user(CreateAdmin {
            name: &body.name,
            email: &body.email,
            password: &body.password,
            role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Update an account. Absent or blank fields are left untouched.
///
/// PATCH /api/admin/users
///
/// # Errors
///
/// Returns 400 for a missing id or short password, 404 for an unknown
/// account, 409 for a taken email.
#[instrument(skip(admin, state, body), fields(admin = %admin.email))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<AdminUser>, AppError> {
    let user_id = parse_user_id(body.user_id.as_deref())?;
    let role = parse_role(body.role.as_deref())?;

    let user = AdminAuthService::new(state.pool())
        .update_user(
            user_id,
            UpdateAdmin {
                name: body.name.as_deref(),
                email: body.email.as_deref(),
                password: body.password.as_deref(),
                role,
            },
        )
        .await?;

    Ok(Json(user))
}

/// Delete an account other than the caller's own.
///
/// DELETE /api/admin/users?id=
///
/// # Errors
///
/// Returns 400 for a missing id or a self-delete, 404 for an unknown account.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<DeleteUserQuery>,
) -> Result<Json<Ack>, AppError> {
    let target = parse_user_id(query.id.as_deref())?;

    AdminAuthService::new(state.pool())
        .delete_user(admin.id, target)
        .await?;

    Ok(Json(Ack::ok()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role(None).unwrap(), None);
        assert_eq!(parse_role(Some("all")).unwrap(), None);
        assert_eq!(parse_role(Some("")).unwrap(), None);
        assert_eq!(
            parse_role(Some("moderator")).unwrap(),
            Some(AdminRole::Moderator)
        );
        assert!(matches!(
            parse_role(Some("root")),
            Err(AppError::Validation(m)) if m == "Invalid role"
        ));
    }

    #[test]
    fn test_parse_user_id() {
        assert!(matches!(
            parse_user_id(None),
            Err(AppError::Validation(m)) if m == "User ID is required"
        ));
        assert!(matches!(
            parse_user_id(Some("nope")),
            Err(AppError::Validation(m)) if m == "Invalid user ID"
        ));
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_user_id(Some(&id.to_string())).unwrap().as_uuid(), id);
    }
}
