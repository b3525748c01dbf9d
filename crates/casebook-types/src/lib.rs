//! Casebook Types - Pure type definitions
//!
//! Entity records, create inputs and partial-update types shared by the
//! storage backends and the HTTP layer. No async runtime dependencies.

pub mod case;
pub mod client;
pub mod item;
pub mod patch;
pub mod timing;

pub use case::*;
pub use client::*;
pub use item::*;
pub use patch::Patch;
pub use timing::*;

// Exact-precision amounts are part of the public record shape
pub use rust_decimal::Decimal;
