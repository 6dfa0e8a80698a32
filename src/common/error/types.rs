//! Unified error types for the crate.
//!
//! Format modules keep their own error enums; this type is what the
//! cross-module entry points return.
use thiserror::Error;

/// Main error type for compressed RTF operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Input is not a compressed RTF stream
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Stream is recognized but its contents are damaged
    #[error("Corrupted stream: {0}")]
    CorruptedFile(String),

    /// Input exceeds what the format can describe
    #[error("Unsupported input: {0}")]
    Unsupported(String),
}

/// Result type for crate-level operations.
pub type Result<T> = std::result::Result<T, Error>;
