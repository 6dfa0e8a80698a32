//! Common types and utilities shared across the crate.
//!
//! Text decoding, HTML helpers and the unified error type live here so the
//! RTF modules stay focused on the formats themselves.

// Submodule declarations
pub mod encoding;
pub mod error;
pub mod html;

// Re-exports for convenience
pub use error::{Error, Result};
