//! Casebook Core Library
//!
//! Error taxonomy, storage port traits and input validation for the
//! business-case dashboard.

// Re-export pure types from casebook-types
pub use casebook_types::*;

pub mod error;
pub mod ports;
pub mod validate;

pub use error::{CasebookError, Result};
