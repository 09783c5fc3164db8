//! JSON body extractor for the API routes.

use axum::extract::{FromRequest, rejection::JsonRejection};

use crate::error::AppError;

/// Prefix of the error returned for a body that is not the expected JSON.
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

/// `axum::Json` whose rejection is an [`AppError`], so a wrong content type,
/// unparseable JSON or a mistyped field answers `400 {"error": ...}` like any
/// other validation failure.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected JSON body");
        Self::Validation(format!("{INVALID_BODY_MESSAGE}: {}", rejection.body_text()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        routing::post,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Payload {
        id: String,
    }

    async fn echo(ApiJson(payload): ApiJson<Payload>) -> String {
        payload.id
    }

    async fn call(content_type: Option<&str>, body: &str) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            request = request.header(header::CONTENT_TYPE, content_type);
        }
        let response = Router::new()
            .route("/", post(echo))
            .oneshot(request.body(Body::from(body.to_owned())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_valid_body_is_extracted() {
        let (status, _) = call(Some("application/json"), r#"{"id":"abc"}"#).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rejections_become_validation_errors() {
        for (content_type, body) in [
            (Some("application/json"), r#"{"id":5}"#),
            (Some("application/json"), "{not json"),
            (None, r#"{"id":"abc"}"#),
        ] {
            let (status, value) = call(content_type, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{content_type:?} {body}");
            assert!(
                value["error"]
                    .as_str()
                    .unwrap()
                    .starts_with(INVALID_BODY_MESSAGE)
            );
        }
    }
}
