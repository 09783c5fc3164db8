//! Session issuance: password login and logout.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::{AppError, clear_sentry_user, set_sentry_user},
    middleware::{ApiJson, set_current_admin},
    models::CurrentAdmin,
    services::AdminAuthService,
    state::AppState,
};

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: CurrentAdmin,
}

/// Generic success body.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Verify credentials and store the admin in a fresh session.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 "Invalid credentials" for any unknown email or wrong password.
#[instrument(skip_all, fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = AdminAuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    // New id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let current_admin = CurrentAdmin::from(&user);
    set_current_admin(&session, &current_admin)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    set_sentry_user(&current_admin.id.to_string(), Some(current_admin.email.as_str()));
    tracing::info!(admin_user_id = %current_admin.id, "Admin logged in");

    Ok(Json(LoginResponse {
        success: true,
        user: current_admin,
    }))
}

/// Drop the session.
///
/// POST /api/auth/logout
///
/// # Errors
///
/// Returns 500 if the session store cannot delete the session.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Json<SuccessResponse>, AppError> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();

    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{offline_app, send};

    #[tokio::test]
    async fn test_logout_without_session_succeeds() {
        let (status, body) = send(offline_app(), "POST", "/api/auth/logout", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
    }

    #[tokio::test]
    async fn test_login_with_malformed_email_is_unauthorized() {
        // Rejected while parsing the email, before any query runs.
        let (status, body) = send(
            offline_app(),
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "nobody", "password": "whatever1" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid credentials" }));
    }
}
