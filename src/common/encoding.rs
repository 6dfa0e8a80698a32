//! Character decoding utilities.
//!
//! RTF emits raw bytes through `\'hh` escapes, and by convention those bytes are
//! Windows-1252 (CP-1252). The decompressed stream itself is also byte-oriented,
//! so both the lexer and the decompressor decode through the table below.
//!
//! Unlike the WHATWG definition of `windows-1252`, the five code points left
//! undefined by Microsoft (0x81, 0x8D, 0x8F, 0x90, 0x9D) decode to U+FFFD rather
//! than to C1 control characters.

use std::borrow::Cow;

/// Replacement character used for undefined bytes and invalid code points.
pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Decode a single Windows-1252 byte to a `char`.
///
/// This function never fails: bytes outside the Windows-1252 repertoire map to
/// [`REPLACEMENT_CHAR`].
///
/// # Examples
/// ```
/// use compressed_rtf::common::encoding::decode_cp1252_byte;
///
/// assert_eq!(decode_cp1252_byte(b'A'), 'A');
/// assert_eq!(decode_cp1252_byte(0x80), '€');
/// assert_eq!(decode_cp1252_byte(0xE9), 'é');
/// assert_eq!(decode_cp1252_byte(0x81), '\u{FFFD}');
/// ```
#[inline]
pub const fn decode_cp1252_byte(byte: u8) -> char {
    match byte {
        0x00..=0x7F | 0xA0..=0xFF => byte as char,
        0x80 => '\u{20AC}', // Euro sign
        0x82 => '\u{201A}', // Single low-9 quotation mark
        0x83 => '\u{0192}', // Latin small f with hook
        0x84 => '\u{201E}', // Double low-9 quotation mark
        0x85 => '\u{2026}', // Horizontal ellipsis
        0x86 => '\u{2020}', // Dagger
        0x87 => '\u{2021}', // Double dagger
        0x88 => '\u{02C6}', // Modifier circumflex accent
        0x89 => '\u{2030}', // Per mille sign
        0x8A => '\u{0160}', // S with caron
        0x8B => '\u{2039}', // Single left-pointing angle quotation mark
        0x8C => '\u{0152}', // Ligature OE
        0x8E => '\u{017D}', // Z with caron
        0x91 => '\u{2018}', // Left single quotation mark
        0x92 => '\u{2019}', // Right single quotation mark
        0x93 => '\u{201C}', // Left double quotation mark
        0x94 => '\u{201D}', // Right double quotation mark
        0x95 => '\u{2022}', // Bullet
        0x96 => '\u{2013}', // En dash
        0x97 => '\u{2014}', // Em dash
        0x98 => '\u{02DC}', // Small tilde
        0x99 => '\u{2122}', // Trade mark sign
        0x9A => '\u{0161}', // s with caron
        0x9B => '\u{203A}', // Single right-pointing angle quotation mark
        0x9C => '\u{0153}', // Ligature oe
        0x9E => '\u{017E}', // z with caron
        0x9F => '\u{0178}', // Y with diaeresis
        // 0x81, 0x8D, 0x8F, 0x90, 0x9D
        _ => REPLACEMENT_CHAR,
    }
}

/// Decode a Windows-1252 byte buffer into a `String`.
///
/// Every input byte yields exactly one `char`, so `decode_cp1252(b).chars().count()`
/// always equals `b.len()`. Pure ASCII input is borrowed without copying.
pub fn decode_cp1252(bytes: &[u8]) -> Cow<'_, str> {
    if bytes.is_ascii() {
        // ASCII is valid UTF-8 and maps 1:1.
        if let Ok(text) = std::str::from_utf8(bytes) {
            return Cow::Borrowed(text);
        }
    }

    let mut text = String::with_capacity(bytes.len() + bytes.len() / 2);
    text.extend(bytes.iter().map(|&b| decode_cp1252_byte(b)));
    Cow::Owned(text)
}

/// Decode a raw byte buffer supplied as RTF source text.
///
/// RTF is 7-bit in practice, but callers frequently hand over buffers read from
/// disk or from a mail container. The buffer is decoded as UTF-8 with a leading
/// byte order mark removed; malformed sequences become U+FFFD.
pub fn decode_utf8_input(bytes: &[u8]) -> Cow<'_, str> {
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if had_errors {
        tracing::debug!(len = bytes.len(), "input contained malformed UTF-8");
    }
    text
}
