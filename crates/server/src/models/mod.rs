//! Domain models for the back-office.

pub mod admin_user;
pub mod contact_message;
pub mod session;
pub mod smtp_settings;

pub use admin_user::{AdminUser, AdminUserUpdate, NewAdminUser, UserFilter};
pub use contact_message::{ContactMessage, NewContactMessage};
pub use session::{CurrentAdmin, keys as session_keys};
pub use smtp_settings::{SmtpSettings, SmtpSettingsView};
