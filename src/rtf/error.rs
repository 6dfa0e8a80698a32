//! Error types for compressed RTF handling.
//!
//! Only header-level problems are errors. Truncated streams and malformed RTF
//! escapes are tolerated: the former is reported through
//! [`DecompressedRtf::truncated`](super::DecompressedRtf::truncated), the latter
//! is absorbed by the lexer.

use thiserror::Error;

/// Result type for RTF operations.
pub type RtfResult<T> = Result<T, RtfError>;

/// Compressed RTF errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RtfError {
    /// The 16-byte header is missing or carries an unknown compression type.
    #[error("Malformed compressed RTF header: {0}")]
    MalformedHeader(String),

    /// The payload checksum does not match the header (only checked on request).
    #[error("CRC32 mismatch: expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch { expected: u32, actual: u32 },

    /// The input is too large to be described by a 32-bit header.
    #[error("Input too large for compressed RTF: {0} bytes")]
    TooLarge(usize),
}
