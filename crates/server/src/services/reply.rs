//! Admin reply pipeline.
//!
//! Order of operations:
//!
//! 1. validate the draft (recipient and body present, recipient parses);
//! 2. look up the original message when an id is given, tolerating a miss;
//! 3. render and dispatch through the transport;
//! 4. only after the transport accepted the message, and only when the
//!    original was found, mark it as `replied`.
//!
//! Dispatch is the commit point. A failure in step 4 does not undo the send;
//! it is logged and reported back as [`ReplyOutcome::warning`].

use std::future::Future;

use lettre::{AsyncTransport, Message};
use thiserror::Error;

use semecall_core::{ContactMessageId, Email};

use crate::config::BrandingConfig;
use crate::db::{ContactMessageRepository, RepositoryError};
use crate::error::AppError;
use crate::models::{ContactMessage, SmtpSettings};
use crate::services::email::{self, EmailError};

/// Access to the messages a reply refers to.
pub trait ReplyStore {
    /// Load a message, `None` when it does not exist.
    fn find_message(
        &self,
        id: ContactMessageId,
    ) -> impl Future<Output = Result<Option<ContactMessage>, RepositoryError>> + Send;

    /// Move a message to `replied`, stamping `replied_at` and `replied_by`.
    fn mark_replied(
        &self,
        id: ContactMessageId,
        replied_by: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

impl ReplyStore for ContactMessageRepository<'_> {
    fn find_message(
        &self,
        id: ContactMessageId,
    ) -> impl Future<Output = Result<Option<ContactMessage>, RepositoryError>> + Send {
        self.get_by_id(id)
    }

    fn mark_replied(
        &self,
        id: ContactMessageId,
        replied_by: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        Self::mark_replied(self, id, replied_by)
    }
}

/// Errors from the reply pipeline.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// Recipient or body missing.
    #[error("Recipient email and reply text are required")]
    MissingFields,

    /// Recipient is not a valid address.
    #[error("Please enter a valid email address")]
    InvalidRecipient,

    /// Rendering or assembling the message failed.
    #[error("failed to prepare reply: {0}")]
    Compose(#[from] EmailError),

    /// The transport failed; nothing was sent.
    #[error("Failed to send reply: {0}")]
    Delivery(String),

    /// Loading the original message failed.
    #[error("failed to load original message: {0}")]
    Store(#[from] RepositoryError),
}

impl From<ReplyError> for AppError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::MissingFields | ReplyError::InvalidRecipient => {
                Self::Validation(err.to_string())
            }
            ReplyError::Compose(e) => Self::Internal(e.to_string()),
            ReplyError::Delivery(details) => Self::Delivery {
                message: "Failed to send reply".to_string(),
                details,
            },
            ReplyError::Store(e) => Self::Database(e),
        }
    }
}

/// A validated reply.
#[derive(Debug, Clone)]
pub struct ReplyDraft {
    /// Linked message, when the id given was well-formed.
    pub message_id: Option<ContactMessageId>,
    pub to: Email,
    pub subject: Option<String>,
    /// Admin-authored HTML, sent unescaped.
    pub reply_html: String,
}

impl ReplyDraft {
    /// Validate raw request fields.
    ///
    /// A message id that does not parse is treated like one that does not
    /// match a stored message: the reply is still sent, without quoting or
    /// status change.
    ///
    /// # Errors
    ///
    /// Returns `ReplyError::MissingFields` if `to` or `reply_html` is blank.
    /// Returns `ReplyError::InvalidRecipient` if `to` is not an address.
    pub fn parse(
        message_id: Option<&str>,
        to: &str,
        subject: Option<&str>,
        reply_html: &str,
    ) -> Result<Self, ReplyError> {
        if to.trim().is_empty() || reply_html.trim().is_empty() {
            return Err(ReplyError::MissingFields);
        }
        let to = Email::parse(to).map_err(|_| ReplyError::InvalidRecipient)?;

        let message_id = message_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .and_then(|id| match id.parse::<ContactMessageId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring malformed reply message id");
                    None
                }
            });

        Ok(Self {
            message_id,
            to,
            subject: subject.map(ToOwned::to_owned),
            reply_html: reply_html.to_owned(),
        })
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyOutcome {
    /// `Message-ID` header of the sent email.
    pub message_id: String,
    /// Whether the linked message was moved to `replied`.
    pub status_updated: bool,
    /// Set when the email went out but the status update failed.
    pub warning: Option<String>,
}

/// Sends admin replies through a mail transport.
pub struct ReplyService<'a, S, T> {
    store: &'a S,
    transport: &'a T,
    settings: &'a SmtpSettings,
    branding: &'a BrandingConfig,
}

impl<'a, S, T> ReplyService<'a, S, T>
where
    S: ReplyStore + Sync,
    T: AsyncTransport + Sync,
    T::Error: std::fmt::Display,
{
    /// Create a reply service.
    #[must_use]
    pub const fn new(
        store: &'a S,
        transport: &'a T,
        settings: &'a SmtpSettings,
        branding: &'a BrandingConfig,
    ) -> Self {
        Self {
            store,
            transport,
            settings,
            branding,
        }
    }

    /// Render, send and (when linked) mark the original as replied.
    ///
    /// # Errors
    ///
    /// Returns `ReplyError::Delivery` if the transport fails; the stored
    /// message is left untouched in that case.
    #[tracing::instrument(skip_all, fields(to = %draft.to, message_id = ?draft.message_id))]
    pub async fn send(
        &self,
        draft: &ReplyDraft,
        replied_by: &str,
    ) -> Result<ReplyOutcome, ReplyError> {
        let original = match draft.message_id {
            Some(id) => self.store.find_message(id).await?,
            None => None,
        };
        if draft.message_id.is_some() && original.is_none() {
            tracing::debug!("Original message not found, sending without quote");
        }

        let rendered = email::render_reply(
            self.branding,
            draft.subject.as_deref(),
            &draft.reply_html,
            original.as_ref(),
        )?;
        let (message, message_id) = email::build_message(self.settings, &draft.to, rendered)?;

        self.dispatch(message).await?;
        tracing::info!(email_message_id = %message_id, "Reply sent");

        // A linked id with no stored message was already tolerated above.
        let Some(id) = original.as_ref().map(|m| m.id) else {
            return Ok(ReplyOutcome {
                message_id,
                status_updated: false,
                warning: None,
            });
        };

        match self.store.mark_replied(id, replied_by).await {
            Ok(()) => Ok(ReplyOutcome {
                message_id,
                status_updated: true,
                warning: None,
            }),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    contact_message_id = %id,
                    email_message_id = %message_id,
                    "Reply sent but message status was not updated"
                );
                Ok(ReplyOutcome {
                    message_id,
                    status_updated: false,
                    warning: Some(status_warning(&e)),
                })
            }
        }
    }

    async fn dispatch(&self, message: Message) -> Result<(), ReplyError> {
        self.transport.send(message).await.map_err(|e| {
            tracing::warn!(error = %e, "Reply delivery failed");
            ReplyError::Delivery(e.to_string())
        })?;
        Ok(())
    }
}

fn status_warning(err: &RepositoryError) -> String {
    match err {
        RepositoryError::NotFound => {
            "Reply sent, but the message no longer exists so its status was not updated"
                .to_string()
        }
        _ => "Reply sent, but the message status could not be updated to replied".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use lettre::transport::stub::AsyncStubTransport;
    use secrecy::SecretString;
    use uuid::Uuid;

    use semecall_core::ContactStatus;

    use super::*;

    /// In-memory store recording status changes.
    #[derive(Default)]
    struct MemoryStore {
        messages: Mutex<Vec<ContactMessage>>,
        fail_updates: bool,
    }

    impl MemoryStore {
        fn with_message(message: ContactMessage) -> Self {
            Self {
                messages: Mutex::new(vec![message]),
                fail_updates: false,
            }
        }

        fn status_of(&self, id: ContactMessageId) -> (ContactStatus, Option<String>) {
            let messages = self.messages.lock().unwrap();
            let m = messages.iter().find(|m| m.id == id).unwrap();
            (m.status, m.replied_by.clone())
        }
    }

    impl ReplyStore for MemoryStore {
        fn find_message(
            &self,
            id: ContactMessageId,
        ) -> impl Future<Output = Result<Option<ContactMessage>, RepositoryError>> + Send {
            let found = self
                .messages
                .lock()
                .unwrap()
                .iter()
                .find(|m| m.id == id)
                .cloned();
            async move { Ok(found) }
        }

        fn mark_replied(
            &self,
            id: ContactMessageId,
            replied_by: &str,
        ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
            let result = if self.fail_updates {
                Err(RepositoryError::DataCorruption("simulated".to_string()))
            } else {
                let mut messages = self.messages.lock().unwrap();
                match messages.iter_mut().find(|m| m.id == id) {
                    Some(m) => {
                        m.status = ContactStatus::Replied;
                        m.replied_at = Some(Utc::now());
                        m.replied_by = Some(replied_by.to_owned());
                        Ok(())
                    }
                    None => Err(RepositoryError::NotFound),
                }
            };
            async move { result }
        }
    }

    fn jane() -> ContactMessage {
        ContactMessage {
            id: ContactMessageId::from_uuid(Uuid::new_v4()),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: Email::parse("jane@x.com").unwrap(),
            phone: "123".to_string(),
            company: None,
            message: "Hello there, need info".to_string(),
            status: ContactStatus::Read,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            replied_at: None,
            replied_by: None,
        }
    }

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".to_string(),
            port: 587,
            secure: false,
            user: "mailer".to_string(),
            password: SecretString::from("secret"),
            from_email: Email::parse("contact@semecall.com").unwrap(),
            from_name: Some("Semecall".to_string()),
            updated_at: None,
            updated_by: None,
        }
    }

    fn draft(message_id: Option<ContactMessageId>) -> ReplyDraft {
        ReplyDraft {
            message_id,
            to: Email::parse("jane@x.com").unwrap(),
            subject: None,
            reply_html: "<p>Thanks!</p>".to_string(),
        }
    }

    #[test]
    fn test_draft_requires_recipient_and_body() {
        assert!(matches!(
            ReplyDraft::parse(None, "", None, "<p>x</p>"),
            Err(ReplyError::MissingFields)
        ));
        assert!(matches!(
            ReplyDraft::parse(None, "jane@x.com", None, "   "),
            Err(ReplyError::MissingFields)
        ));
        assert!(matches!(
            ReplyDraft::parse(None, "not-an-address", None, "<p>x</p>"),
            Err(ReplyError::InvalidRecipient)
        ));
    }

    #[test]
    fn test_draft_ignores_malformed_message_id() {
        let draft = ReplyDraft::parse(Some("abc"), "jane@x.com", None, "<p>x</p>").unwrap();
        assert!(draft.message_id.is_none());

        let id = Uuid::new_v4().to_string();
        let draft = ReplyDraft::parse(Some(&id), "jane@x.com", None, "<p>x</p>").unwrap();
        assert_eq!(draft.message_id.unwrap().to_string(), id);
    }

    #[tokio::test]
    async fn test_successful_reply_marks_message_replied() {
        let message = jane();
        let id = message.id;
        let store = MemoryStore::with_message(message);
        let transport = AsyncStubTransport::new_ok();
        let settings = settings();
        let branding = BrandingConfig::default();

        let outcome = ReplyService::new(&store, &transport, &settings, &branding)
            .send(&draft(Some(id)), "admin@semecall.com")
            .await
            .unwrap();

        assert!(outcome.status_updated);
        assert!(outcome.warning.is_none());
        assert_eq!(
            store.status_of(id),
            (ContactStatus::Replied, Some("admin@semecall.com".to_string()))
        );

        let sent = transport.messages().await;
        assert_eq!(sent.len(), 1);
        let (envelope, raw) = &sent[0];
        assert_eq!(envelope.to()[0].to_string(), "jane@x.com");
        assert!(raw.contains("Subject: Re: Your contact message"));
        assert!(raw.contains(&outcome.message_id));
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_status_unchanged() {
        let message = jane();
        let id = message.id;
        let store = MemoryStore::with_message(message);
        let transport = AsyncStubTransport::new_error();
        let settings = settings();
        let branding = BrandingConfig::default();

        let err = ReplyService::new(&store, &transport, &settings, &branding)
            .send(&draft(Some(id)), "admin@semecall.com")
            .await
            .unwrap_err();

        assert!(matches!(err, ReplyError::Delivery(_)));
        assert_eq!(store.status_of(id), (ContactStatus::Read, None));
    }

    #[tokio::test]
    async fn test_reply_without_message_id_touches_nothing() {
        let message = jane();
        let id = message.id;
        let store = MemoryStore::with_message(message);
        let transport = AsyncStubTransport::new_ok();
        let settings = settings();
        let branding = BrandingConfig::default();

        let outcome = ReplyService::new(&store, &transport, &settings, &branding)
            .send(&draft(None), "admin@semecall.com")
            .await
            .unwrap();

        assert!(!outcome.status_updated);
        assert_eq!(store.status_of(id), (ContactStatus::Read, None));
        assert_eq!(transport.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_message_id_is_tolerated() {
        let store = MemoryStore::default();
        let transport = AsyncStubTransport::new_ok();
        let settings = settings();
        let branding = BrandingConfig::default();
        let unknown = ContactMessageId::from_uuid(Uuid::new_v4());

        let outcome = ReplyService::new(&store, &transport, &settings, &branding)
            .send(&draft(Some(unknown)), "admin@semecall.com")
            .await
            .unwrap();

        assert_eq!(transport.messages().await.len(), 1);
        assert!(!outcome.status_updated);
        assert!(outcome.warning.is_none());
        assert!(store.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_failure_after_send_is_surfaced() {
        let message = jane();
        let id = message.id;
        let store = MemoryStore {
            messages: Mutex::new(vec![message]),
            fail_updates: true,
        };
        let transport = AsyncStubTransport::new_ok();
        let settings = settings();
        let branding = BrandingConfig::default();

        let outcome = ReplyService::new(&store, &transport, &settings, &branding)
            .send(&draft(Some(id)), "admin@semecall.com")
            .await
            .unwrap();

        assert_eq!(transport.messages().await.len(), 1);
        assert!(!outcome.status_updated);
        assert!(outcome.warning.unwrap().contains("could not be updated"));
    }

    #[test]
    fn test_reply_error_http_mapping() {
        let status = |e: ReplyError| AppError::from(e).status_code().as_u16();
        assert_eq!(status(ReplyError::MissingFields), 400);
        assert_eq!(status(ReplyError::InvalidRecipient), 400);
        assert_eq!(status(ReplyError::Delivery("refused".to_string())), 500);
    }
}
