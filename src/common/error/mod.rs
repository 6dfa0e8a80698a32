//! Unified error types for the crate.
//!
//! This module provides the error type returned by entry points that span
//! more than one stage (decompression followed by de-encapsulation).

// Submodule declarations
pub mod types;
pub mod conversions;

// Re-exports
pub use types::{Error, Result};
