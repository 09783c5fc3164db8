//! Business logic sitting between the HTTP handlers and the repositories.
//!
//! - [`auth`] - Admin login, password management and user administration
//! - [`email`] - SMTP transport, email templates and message assembly
//! - [`reply`] - Sending a reply and marking the original message replied

pub mod auth;
pub mod email;
pub mod reply;

pub use auth::{AdminAuthService, AuthError};
pub use email::{EmailError, SmtpMailer};
pub use reply::{ReplyDraft, ReplyError, ReplyOutcome, ReplyService, ReplyStore};
