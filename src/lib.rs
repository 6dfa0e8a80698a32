//! compressed-rtf - Compressed RTF decoding and HTML de-encapsulation
//!
//! Outlook message bodies (`PR_RTF_COMPRESSED`) are stored as LZFu-compressed
//! RTF, and HTML mail is carried inside that RTF as encapsulated markup. This
//! library recovers both layers from raw bytes.
//!
//! # Features
//!
//! - **Decompression**: LZFu and MELA streams, with optional CRC verification
//! - **Compression**: Produce LZFu or MELA streams from RTF bytes
//! - **De-encapsulation**: Extract the original HTML from `\htmltag` destinations
//! - **Validation**: Structural checks that flag truncated or damaged RTF
//! - **Tolerant decoding**: Truncated streams and malformed escapes degrade instead of failing
//!
//! # Example - From stored stream to HTML
//!
//! ```no_run
//! use compressed_rtf::rtf::{DeEncapsulationOptions, html_from_compressed_rtf};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = std::fs::read("body.rtf.lzfu")?;
//! let html = html_from_compressed_rtf(&stream, &DeEncapsulationOptions::default())?;
//!
//! if html.is_empty() {
//!     println!("Body is plain RTF");
//! } else {
//!     println!("HTML body: {}", html.content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Step by step
//!
//! ```no_run
//! use compressed_rtf::rtf::{DecompressOptions, Decompressor, deencapsulate_html};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = std::fs::read("body.rtf.lzfu")?;
//! let decompressor = Decompressor::new(DecompressOptions::new().with_crc_check(true));
//! let rtf = decompressor.decompress(&stream)?;
//!
//! let report = rtf.validate();
//! if !report.is_valid {
//!     eprintln!("RTF looks damaged: {:?}", report.details);
//! }
//!
//! println!("{}", deencapsulate_html(&rtf.text()));
//! # Ok(())
//! # }
//! ```

/// Shared utilities: text decoding, HTML helpers and the unified error type
pub mod common;

/// Compressed RTF streams and HTML de-encapsulation
///
/// This module provides the LZFu codec, the RTF lexer, the de-encapsulation
/// state machine and the structural validator.
pub mod rtf;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use rtf::{DeEncapsulator, DecompressedRtf, Decompressor, Encapsulated, EncapsulationMode};
