//! HTTP middleware and extractors.
//!
//! # Layer Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Admin routes are guarded per handler by the [`RequireAdminAuth`]
//! extractor rather than a router-wide layer. JSON bodies go through
//! [`ApiJson`] so malformed input is answered like any other `AppError`.

pub mod auth;
pub mod json;
pub mod session;

pub use auth::{RequireAdminAuth, set_current_admin};
pub use json::ApiJson;
pub use session::{SESSION_COOKIE_NAME, create_session_layer, session_layer};
