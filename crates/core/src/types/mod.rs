//! Core types for Semecall.
//!
//! This module provides type-safe wrappers for the back-office domain.

pub mod email;
pub mod id;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
