//! Reply composer endpoint.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::smtp::load_smtp_settings;
use crate::{
    db::ContactMessageRepository,
    error::AppError,
    middleware::{ApiJson, RequireAdminAuth},
    services::{ReplyDraft, ReplyError, ReplyService, SmtpMailer},
    state::AppState,
};

/// Build the reply router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/send-reply", post(send_reply))
}

/// Reply body. `replyText` is admin-authored HTML.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReplyRequest {
    pub message_id: Option<String>,
    #[serde(default)]
    pub to: String,
    pub subject: Option<String>,
    #[serde(default)]
    pub reply_text: String,
}

/// Reply response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReplyResponse {
    pub success: bool,
    pub message: &'static str,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Send a reply and, when linked to a message, mark it replied.
///
/// POST /api/admin/send-reply
///
/// # Errors
///
/// Returns 400 when SMTP is not configured or the draft is incomplete,
/// 500 with transport details when the send fails.
#[instrument(skip(admin, state, body), fields(admin = %admin.email))]
pub async fn send_reply(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SendReplyRequest>,
) -> Result<Json<SendReplyResponse>, AppError> {
    let settings = load_smtp_settings(state.pool()).await?;

    let draft = ReplyDraft::parse(
        body.message_id.as_deref(),
        &body.to,
        body.subject.as_deref(),
        &body.reply_text,
    )?;

    let mailer = SmtpMailer::from_settings(&settings).map_err(ReplyError::from)?;
    let store = ContactMessageRepository::new(state.pool());
    let outcome = ReplyService::new(
        &store,
        mailer.transport(),
        &settings,
        &state.config().branding,
    )
    .send(&draft, admin.email.as_str())
    .await?;

    Ok(Json(SendReplyResponse {
        success: true,
        message: "Reply sent successfully",
        message_id: outcome.message_id,
        warning: outcome.warning,
    }))
}
