//! Inbox handlers: list, status change, delete and counters.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use semecall_core::{ContactMessageId, ContactStatus, StatusFilter};

use super::Ack;
use crate::{
    db::{ContactMessageRepository, RepositoryError},
    error::AppError,
    middleware::{ApiJson, RequireAdminAuth},
    models::ContactMessage,
    state::AppState,
};

/// Build the inbox router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/contacts",
            get(list).patch(update_status).delete(delete),
        )
        .route("/api/admin/stats", get(stats))
}

/// `?status=` filter for the inbox.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub id: Option<String>,
    pub status: Option<String>,
}

/// `?id=` for deletion.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

/// Inbox counters.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_messages: i64,
    pub new_messages: i64,
    pub replied_messages: i64,
    pub archived_messages: i64,
}

fn parse_message_id(raw: Option<&str>) -> Result<ContactMessageId, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Message ID is required".to_string()))?;
    raw.parse()
        .map_err(|_| AppError::Validation("Invalid message ID".to_string()))
}

fn message_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound("Message not found".to_string()),
        other => other.into(),
    }
}

/// List messages, newest first.
///
/// GET /api/admin/contacts?status=new|read|replied|archived|all
///
/// # Errors
///
/// Returns 400 for an unknown status.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn list(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ContactMessage>>, AppError> {
    let filter = StatusFilter::from_query(query.status.as_deref())
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let messages = ContactMessageRepository::new(state.pool())
        .list(filter)
        .await?;
    Ok(Json(messages))
}

/// Move a message to another status.
///
/// PATCH /api/admin/contacts
///
/// # Errors
///
/// Returns 400 for a missing id or status, 404 for an unknown message.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Ack>, AppError> {
    let (Some(raw_id), Some(raw_status)) = (body.id.as_deref(), body.status.as_deref()) else {
        return Err(AppError::Validation(
            "ID and status are required".to_string(),
        ));
    };
    let id = parse_message_id(Some(raw_id))?;
    let status: ContactStatus = raw_status
        .parse()
        .map_err(|e: semecall_core::ParseStatusError| AppError::Validation(e.to_string()))?;

    ContactMessageRepository::new(state.pool())
        .update_status(id, status)
        .await
        .map_err(message_not_found)?;
    tracing::info!(contact_message_id = %id, %status, "Message status updated");

    Ok(Json(Ack::ok()))
}

/// Hard-delete a message.
///
/// DELETE /api/admin/contacts?id=
///
/// # Errors
///
/// Returns 400 for a missing or malformed id, 404 for an unknown message.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Ack>, AppError> {
    let id = parse_message_id(query.id.as_deref())?;

    ContactMessageRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(message_not_found)?;
    tracing::info!(contact_message_id = %id, "Message deleted");

    Ok(Json(Ack::ok()))
}

/// Inbox counters. The four counts run concurrently and are not taken
/// from a single snapshot.
///
/// GET /api/admin/stats
///
/// # Errors
///
/// Returns 500 if any count fails.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn stats(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let repo = ContactMessageRepository::new(state.pool());

    let (total_messages, new_messages, replied_messages, archived_messages) = tokio::try_join!(
        repo.count(StatusFilter::All),
        repo.count(ContactStatus::New.into()),
        repo.count(ContactStatus::Replied.into()),
        repo.count(ContactStatus::Archived.into()),
    )?;

    Ok(Json(StatsResponse {
        total_messages,
        new_messages,
        replied_messages,
        archived_messages,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_parse_message_id() {
        assert!(matches!(
            parse_message_id(None),
            Err(AppError::Validation(m)) if m == "Message ID is required"
        ));
        assert!(matches!(
            parse_message_id(Some("  ")),
            Err(AppError::Validation(m)) if m == "Message ID is required"
        ));
        assert!(matches!(
            parse_message_id(Some("abc")),
            Err(AppError::Validation(m)) if m == "Invalid message ID"
        ));

        let id = Uuid::new_v4();
        assert_eq!(
            parse_message_id(Some(&id.to_string())).unwrap().as_uuid(),
            id
        );
    }

    #[test]
    fn test_not_found_is_renamed() {
        assert!(matches!(
            message_not_found(RepositoryError::NotFound),
            AppError::NotFound(m) if m == "Message not found"
        ));
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let body = serde_json::to_value(StatsResponse {
            total_messages: 4,
            new_messages: 1,
            replied_messages: 2,
            archived_messages: 1,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "totalMessages": 4,
                "newMessages": 1,
                "repliedMessages": 2,
                "archivedMessages": 1
            })
        );
    }
}
