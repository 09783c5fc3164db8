//! Semecall Core - Shared domain types.
//!
//! This crate provides the types shared by every Semecall component:
//! - `server` - Public contact intake and the admin back-office API
//! - `cli` - Command-line tools for migrations and account bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no mail transport. The optional `postgres` feature adds `sqlx`
//! encoding so the same types can be bound directly into queries.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, email addresses, the contact status machine and admin roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
