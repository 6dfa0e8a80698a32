//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::rtf::RtfError;

impl From<RtfError> for Error {
    fn from(err: RtfError) -> Self {
        match err {
            RtfError::MalformedHeader(s) => Error::InvalidFormat(s),
            err @ RtfError::CrcMismatch { .. } => Error::CorruptedFile(err.to_string()),
            err @ RtfError::TooLarge(_) => Error::Unsupported(err.to_string()),
        }
    }
}
