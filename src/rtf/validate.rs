//! Structural sanity checks for decompressed RTF.
//!
//! These checks are diagnostics, not preconditions: the lexer and the
//! de-encapsulator accept anything. They exist to tell a caller whether a
//! decompressed body looks complete, most importantly whether the stream was
//! cut short, before deciding how much to trust the recovered content.

use memchr::{memchr, memchr3_iter, memmem};
use serde::{Deserialize, Serialize};

/// Outcome of the individual checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDetails {
    /// Text starts with `{\rtf` (leading whitespace ignored)
    pub header: bool,
    /// Braces balance, ignoring escaped braces
    pub balanced: bool,
    /// A `\fonttbl` destination is present
    pub font_table: bool,
    /// Text contains at least one NUL character
    pub null_bytes: bool,
    /// Decompressed length equals the header's raw size, if one was supplied
    pub size_matches: Option<bool>,
}

/// Result of [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// All checks passed
    pub is_valid: bool,
    /// Per-check results
    pub details: ValidationDetails,
}

/// Check `rtf` for the usual signs of a damaged or truncated body.
///
/// `expected_raw_size` is the `raw_size` from the compressed header. `rtf` is
/// expected to be the Windows-1252 decoding of the decompressed bytes, in which
/// every byte is exactly one `char`, so its `char` count is the byte length.
///
/// # Examples
///
/// ```
/// use compressed_rtf::rtf::validate;
///
/// let rtf = r"{\rtf1\ansi{\fonttbl{\f0 Arial;}}Hello}";
/// assert!(validate(rtf, None).is_valid);
/// assert!(!validate(rtf, Some(200)).is_valid);
/// ```
pub fn validate(rtf: &str, expected_raw_size: Option<u32>) -> ValidationReport {
    validate_size(rtf, rtf.chars().count(), expected_raw_size)
}

/// [`validate`] with the decompressed byte length supplied by the caller.
pub fn validate_size(rtf: &str, actual_len: usize, expected_raw_size: Option<u32>) -> ValidationReport {
    let details = ValidationDetails {
        header: has_rtf_header(rtf),
        balanced: has_balanced_braces(rtf),
        font_table: has_font_table(rtf),
        null_bytes: contains_null_bytes(rtf),
        size_matches: expected_raw_size.map(|expected| expected as usize == actual_len),
    };

    let is_valid = details.header
        && details.balanced
        && details.font_table
        && !details.null_bytes
        && details.size_matches.unwrap_or(true);

    if !is_valid {
        tracing::debug!(?details, actual_len, "RTF failed structural checks");
    }

    ValidationReport { is_valid, details }
}

/// True if `rtf` starts with `{\rtf` after leading whitespace.
#[inline]
pub fn has_rtf_header(rtf: &str) -> bool {
    rtf.trim_start().starts_with("{\\rtf")
}

/// True if `rtf` contains a `\fonttbl` control word.
#[inline]
pub fn has_font_table(rtf: &str) -> bool {
    memmem::find(rtf.as_bytes(), b"\\fonttbl").is_some()
}

/// True if `rtf` contains a NUL character.
#[inline]
pub fn contains_null_bytes(rtf: &str) -> bool {
    memchr(0, rtf.as_bytes()).is_some()
}

/// Check that group braces balance.
///
/// A closing brace with no open group fails immediately. Escaped braces
/// (`\{`, `\}`), the character after `\\`, and the two digits of a `\'hh`
/// escape never count. A `\'` not followed by two hex digits escapes nothing
/// beyond the quote, matching how the lexer reads it.
///
/// # Examples
///
/// ```
/// use compressed_rtf::rtf::has_balanced_braces;
///
/// assert!(has_balanced_braces(r"{\rtf1{a}}"));
/// assert!(!has_balanced_braces(r"{\rtf1{a}"));
/// assert!(has_balanced_braces(r"{\rtf1 \{ literal}"));
/// ```
pub fn has_balanced_braces(rtf: &str) -> bool {
    let bytes = rtf.as_bytes();
    let mut depth: usize = 0;
    // Positions before this belong to an escape sequence.
    let mut escaped_until = 0;

    for pos in memchr3_iter(b'{', b'}', b'\\', bytes) {
        if pos < escaped_until {
            continue;
        }
        match bytes[pos] {
            b'\\' => {
                let hex_escape = bytes.get(pos + 1) == Some(&b'\'')
                    && bytes
                        .get(pos + 2..pos + 4)
                        .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
                escaped_until = if hex_escape {
                    pos + 4
                } else {
                    pos + 2
                };
            },
            b'{' => depth += 1,
            _ => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            },
        }
    }

    depth == 0
}
