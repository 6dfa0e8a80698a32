//! Compressed RTF and HTML de-encapsulation.
//!
//! Outlook stores message bodies as compressed RTF (MS-OXRTFCP), and HTML
//! bodies inside that RTF as encapsulated markup (MS-OXRTFEX). This module
//! covers both steps with no I/O of its own.
//!
//! # Architecture
//!
//! - **Compressed**: LZFu/MELA header parsing, decompression and compression
//! - **Lexer**: Tokenizes RTF input into control words, symbols, and text
//! - **Encapsulation**: Walks the tokens and copies out the wrapped HTML
//! - **Validate**: Structural checks that flag truncated or damaged RTF
//!
//! # Example
//!
//! ```rust
//! use compressed_rtf::rtf::{DeEncapsulationOptions, compress, html_from_compressed_rtf};
//!
//! let rtf = br"{\rtf1\ansi\fromhtml1{\*\htmltag64 <p>}\htmlrtf Hi\htmlrtf0{\*\htmltag72 </p>}}";
//! let stream = compress(rtf, true)?;
//! let html = html_from_compressed_rtf(&stream, &DeEncapsulationOptions::default())?;
//! assert_eq!(html.content, "<p></p>");
//! # Ok::<(), compressed_rtf::common::Error>(())
//! ```

mod compressed;
mod config;
mod encapsulation;
mod error;
mod lexer;
mod validate;

// Re-exports
pub use compressed::{
    CompressedRtfHeader, CompressionType, DecompressedRtf, Decompressor, HEADER_SIZE, LZFU_MAGIC,
    MELA_MAGIC, compress, decompress, is_compressed_rtf, payload_crc, read_header,
};
pub use config::{DeEncapsulationOptions, DecompressOptions, OutsideText};
pub use encapsulation::{
    DeEncapsulator, Encapsulated, EncapsulationMode, deencapsulate_html, has_html_encapsulation,
};
pub use error::{RtfError, RtfResult};
pub use lexer::{Lexer, Token};
pub use validate::{
    ValidationDetails, ValidationReport, contains_null_bytes, has_balanced_braces, has_font_table,
    has_rtf_header, validate,
};

use crate::common::Result;

/// Decompress an RTF stream and recover the HTML (or text) wrapped in it.
///
/// The decompressed bytes are decoded as Windows-1252 before the walk, so
/// `\'hh` escapes and literal high bytes agree. A truncated stream still
/// yields whatever content its prefix carries.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`](crate::common::Error::InvalidFormat) if the
/// header is missing or unknown.
pub fn html_from_compressed_rtf(
    bytes: &[u8],
    options: &DeEncapsulationOptions,
) -> Result<Encapsulated> {
    let decompressed = decompress(bytes)?;
    if decompressed.truncated() {
        tracing::debug!(
            produced = decompressed.bytes().len(),
            expected = decompressed.expected_size(),
            "de-encapsulating truncated RTF"
        );
    }
    Ok(DeEncapsulator::new(*options).deencapsulate(&decompressed.text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;

    const HTML_RTF: &[u8] = br"{\rtf1\ansi\ansicpg1252\fromhtml1 {\fonttbl{\f0 Arial;}}{\*\htmltag19 <html>}{\*\htmltag64 <p>}\htmlrtf {\htmlrtf0 Caf\'e9\htmlrtf }\htmlrtf0 {\*\htmltag72 </p>}{\*\htmltag27 </html>}}";

    #[test]
    fn test_pipeline_lzfu() {
        let stream = compress(HTML_RTF, true).unwrap();
        let out = html_from_compressed_rtf(&stream, &DeEncapsulationOptions::default()).unwrap();
        assert_eq!(out.mode, EncapsulationMode::Html);
        assert_eq!(out.content, "<html><p></p></html>");

        let honoring = DeEncapsulationOptions::new().with_outside_text(OutsideText::HonorHtmlRtf);
        let out = html_from_compressed_rtf(&stream, &honoring).unwrap();
        assert_eq!(out.content, "<html><p>Café</p></html>");
    }

    #[test]
    fn test_pipeline_mela() {
        let stream = compress(HTML_RTF, false).unwrap();
        let out = html_from_compressed_rtf(&stream, &DeEncapsulationOptions::default()).unwrap();
        assert_eq!(out.content, "<html><p></p></html>");
    }

    #[test]
    fn test_pipeline_high_byte_is_cp1252() {
        let stream = compress(b"{\\*\\htmltag1 \x80}", true).unwrap();
        let out = html_from_compressed_rtf(&stream, &DeEncapsulationOptions::default()).unwrap();
        assert_eq!(out.content, "€");
    }

    #[test]
    fn test_pipeline_rejects_bad_header() {
        let err = html_from_compressed_rtf(b"not compressed rtf", &DeEncapsulationOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_decompressed_body_validates() {
        let stream = compress(HTML_RTF, true).unwrap();
        let decompressed = decompress(&stream).unwrap();
        assert!(has_html_encapsulation(&decompressed.text()));
        assert!(decompressed.validate().is_valid);
        assert!(validate(&decompressed.text(), Some(read_header(&stream).unwrap().raw_size)).is_valid);
    }
}
