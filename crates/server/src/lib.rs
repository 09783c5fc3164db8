//! Semecall back-office server library.
//!
//! Public contact intake plus the session-guarded admin API: inbox and
//! status changes, email replies, SMTP settings and admin accounts.
//!
//! The binary in `main.rs` wires configuration, tracing, Sentry and the
//! listener around [`routes::app`]; everything else lives here so the CLI
//! and the integration tests can reuse it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
