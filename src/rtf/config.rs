//! Configuration types for decompression and de-encapsulation.
//!
//! Both option structs are plain values: build one, hand it to
//! [`Decompressor`](super::Decompressor) or [`DeEncapsulator`](super::DeEncapsulator),
//! and reuse the resulting instance for any number of independent calls.
use serde::{Deserialize, Serialize};

/// Options controlling [`Decompressor`](super::Decompressor).
///
/// # Examples
///
/// ```rust
/// use compressed_rtf::rtf::DecompressOptions;
///
/// let options = DecompressOptions::new().with_crc_check(true);
/// assert!(options.verify_crc);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompressOptions {
    /// Verify the header CRC32 against the LZFu payload before decoding.
    ///
    /// Outlook writes correct checksums, but many third-party producers do not,
    /// so the check is off by default.
    pub verify_crc: bool,
}

impl DecompressOptions {
    /// Create a new `DecompressOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the payload CRC32 is verified.
    #[inline]
    pub fn with_crc_check(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }
}

/// Policy for text found outside `{\*\htmltag ...}` destinations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutsideText {
    /// Never copy text outside HTML tag destinations. `\htmlrtf` is ignored.
    #[default]
    Discard,
    /// Copy outside text while `\htmlrtf0` is in effect; `\htmlrtf` turns it
    /// back off.
    HonorHtmlRtf,
    /// Copy outside text from the start of the document until an `\htmlrtf`
    /// control suppresses it. Font, color and other table destinations and
    /// `\*` groups are skipped. This recovers plain-text bodies and reports
    /// [`EncapsulationMode::Text`](super::EncapsulationMode::Text).
    Keep,
}

/// Options controlling [`DeEncapsulator`](super::DeEncapsulator).
///
/// # Examples
///
/// ```rust
/// use compressed_rtf::rtf::{DeEncapsulationOptions, OutsideText};
///
/// // Create with defaults
/// let options = DeEncapsulationOptions::default();
///
/// // Or customize
/// let options = DeEncapsulationOptions::new()
///     .with_unescaped_entities(true)
///     .with_outside_text(OutsideText::HonorHtmlRtf);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeEncapsulationOptions {
    /// Replace `&lt; &gt; &amp; &quot; &#39; &apos;` in the recovered output.
    pub unescape_html_entities: bool,
    /// What to do with text outside HTML tag destinations.
    pub outside_text: OutsideText,
}

impl DeEncapsulationOptions {
    /// Create a new `DeEncapsulationOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether basic HTML entities are unescaped after extraction.
    #[inline]
    pub fn with_unescaped_entities(mut self, unescape: bool) -> Self {
        self.unescape_html_entities = unescape;
        self
    }

    /// Set the policy for text outside HTML tag destinations.
    #[inline]
    pub fn with_outside_text(mut self, policy: OutsideText) -> Self {
        self.outside_text = policy;
        self
    }
}
