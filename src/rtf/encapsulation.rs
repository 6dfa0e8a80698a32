//! De-encapsulation of HTML and plain text wrapped in RTF.
//!
//! Outlook keeps HTML bodies as RTF for older readers: every piece of original
//! markup is placed in an ignorable `{\*\htmltag ...}` destination, and the
//! RTF-only rendering around it is fenced off with `\htmlrtf`. Recovering the
//! HTML means copying the text of those destinations and dropping the rest
//! (MS-OXRTFEX, "Extracting Encapsulated HTML from RTF").
//!
//! The walk is a small state machine over the lexer's tokens. RTF groups
//! scope state, so the machine keeps a stack of `GroupState` snapshots:
//! one is pushed on `{` and the saved copy restored on `}`.

use super::config::{DeEncapsulationOptions, OutsideText};
use super::lexer::{Lexer, Token};
use crate::common::encoding::{REPLACEMENT_CHAR, decode_utf8_input};
use crate::common::html::unescape_html_entities;
use bumpalo::Bump;
use memchr::memmem;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Kind of content recovered from the RTF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncapsulationMode {
    /// HTML recovered from `\htmltag` destinations.
    Html,
    /// Plain text recovered from the document body.
    Text,
}

/// Output of a de-encapsulation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encapsulated {
    /// What `content` holds.
    pub mode: EncapsulationMode,
    /// Recovered content; empty if nothing was encapsulated.
    pub content: String,
}

impl Encapsulated {
    /// True if no content was recovered.
    ///
    /// This is not an error: the RTF simply carried no encapsulated body, and
    /// the caller has to fall back to rendering the RTF itself.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Scoped state of one RTF group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GroupState {
    /// Fallback units to skip after `\uN` (`\ucN`)
    uc_skip: usize,
    /// Group started with `\*`
    ignorable: bool,
    /// Group is a `{\*\htmltag ...}` destination
    html_tag: bool,
    /// Text outside HTML tag destinations is copied (`\htmlrtf0`)
    copy_outside: bool,
    /// Inside an ignorable or table destination; inherited by nested groups
    hidden: bool,
}

impl GroupState {
    fn root(policy: OutsideText) -> Self {
        Self {
            uc_skip: 1,
            ignorable: false,
            html_tag: false,
            copy_outside: policy == OutsideText::Keep,
            hidden: false,
        }
    }

    /// State a nested group starts with: destination status is per group.
    #[inline]
    fn child(self) -> Self {
        Self {
            ignorable: false,
            html_tag: false,
            ..self
        }
    }

    #[inline]
    fn in_scope(self) -> bool {
        self.html_tag || (self.copy_outside && !self.hidden)
    }
}

/// HTML/text de-encapsulator.
///
/// Holds only options. Each call runs on its own state stack and arena, so
/// one instance can serve any number of calls, including concurrent ones.
///
/// # Example
///
/// ```rust
/// use compressed_rtf::rtf::{DeEncapsulator, EncapsulationMode};
///
/// let rtf = r"{\rtf1\ansi\fromhtml1{\*\htmltag64 <p>}\htmlrtf Hi\htmlrtf0{\*\htmltag72 </p>}}";
/// let out = DeEncapsulator::default().deencapsulate(rtf);
/// assert_eq!(out.mode, EncapsulationMode::Html);
/// assert_eq!(out.content, "<p></p>");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DeEncapsulator {
    options: DeEncapsulationOptions,
}

impl DeEncapsulator {
    /// Create a de-encapsulator with the given options.
    #[inline]
    pub fn new(options: DeEncapsulationOptions) -> Self {
        Self { options }
    }

    /// The options this instance was built with.
    #[inline]
    pub fn options(&self) -> &DeEncapsulationOptions {
        &self.options
    }

    /// Recover the encapsulated content of `rtf`.
    pub fn deencapsulate(&self, rtf: &str) -> Encapsulated {
        let arena = Bump::new();
        let mut walker = Walker::new(&arena, self.options.outside_text);
        for token in Lexer::new(rtf, &arena) {
            walker.feed(token);
        }
        let (fragments, found_html_tag) = walker.finish();

        let mut content = fragments.concat();
        if self.options.unescape_html_entities {
            content = unescape_html_entities(&content);
        }

        if !found_html_tag {
            tracing::debug!(len = rtf.len(), "no htmltag destination found");
        }

        Encapsulated {
            mode: match self.options.outside_text {
                OutsideText::Keep => EncapsulationMode::Text,
                OutsideText::Discard | OutsideText::HonorHtmlRtf => EncapsulationMode::Html,
            },
            content,
        }
    }

    /// Recover the encapsulated content of a raw RTF buffer.
    ///
    /// The buffer is decoded as UTF-8 (lossy, BOM stripped). Decompressed
    /// streams should go through [`DecompressedRtf::text`](super::DecompressedRtf::text)
    /// instead, which decodes Windows-1252.
    pub fn deencapsulate_bytes(&self, bytes: &[u8]) -> Encapsulated {
        self.deencapsulate(&decode_utf8_input(bytes))
    }
}

/// Token-driven state machine for one call.
struct Walker<'a> {
    arena: &'a Bump,
    policy: OutsideText,
    state: GroupState,
    stack: SmallVec<[GroupState; 16]>,
    /// No token has been seen yet in the current group
    group_start: bool,
    /// Fallback units still to drop after `\uN`
    pending_skip: usize,
    /// High half of a UTF-16 pair waiting for its low half
    high_surrogate: Option<u32>,
    fragments: Vec<&'a str>,
    found_html_tag: bool,
}

impl<'a> Walker<'a> {
    fn new(arena: &'a Bump, policy: OutsideText) -> Self {
        Self {
            arena,
            policy,
            state: GroupState::root(policy),
            stack: SmallVec::new(),
            group_start: false,
            pending_skip: 0,
            high_surrogate: None,
            fragments: Vec::new(),
            found_html_tag: false,
        }
    }

    fn feed(&mut self, token: Token<'a>) {
        match token {
            Token::GroupOpen => {
                self.end_of_run();
                self.stack.push(self.state);
                self.state = self.state.child();
                self.group_start = true;
                return;
            },
            Token::GroupClose => {
                self.end_of_run();
                self.state = match self.stack.pop() {
                    Some(saved) => saved,
                    None => {
                        tracing::warn!("unmatched closing brace in RTF");
                        self.state.child()
                    },
                };
                self.group_start = false;
                return;
            },
            _ => {},
        }

        let at_group_start = std::mem::replace(&mut self.group_start, false);

        let token = match self.skip_fallback(token) {
            Some(token) => token,
            None => return,
        };

        if self.high_surrogate.is_some() && !token.is_control_word("u") {
            self.flush_lone_surrogate();
        }

        match token {
            Token::ControlSymbol('*') if at_group_start => {
                self.state.ignorable = true;
                self.state.hidden = true;
            },
            Token::ControlWord { name, param } => self.control_word(name, param),
            Token::EscapedLiteral(ch) => self.emit(escaped_str(ch)),
            Token::Text(text) => self.emit(text),
            Token::ControlSymbol(_) | Token::GroupOpen | Token::GroupClose => {},
        }
    }

    /// Drop fallback characters owed to a preceding `\uN`.
    ///
    /// Returns the part of `token` that survives, if any.
    fn skip_fallback(&mut self, token: Token<'a>) -> Option<Token<'a>> {
        if self.pending_skip == 0 {
            return Some(token);
        }

        match token {
            Token::Text(text) => {
                let mut chars = text.char_indices().skip(self.pending_skip);
                match chars.next() {
                    Some((at, _)) => {
                        self.pending_skip = 0;
                        Some(Token::Text(&text[at..]))
                    },
                    None => {
                        self.pending_skip -= text.chars().count();
                        None
                    },
                }
            },
            // Escapes and control words count as one fallback unit each.
            _ => {
                self.pending_skip -= 1;
                None
            },
        }
    }

    fn control_word(&mut self, name: &str, param: Option<i32>) {
        match (name, param) {
            ("htmltag", _) if self.state.ignorable => {
                self.state.html_tag = true;
                self.found_html_tag = true;
                tracing::trace!(depth = self.stack.len(), "entered htmltag destination");
            },
            ("htmlrtf", _) if self.policy != OutsideText::Discard => {
                self.state.copy_outside = param == Some(0);
            },
            ("uc", Some(count)) if count >= 0 => {
                self.state.uc_skip = count as usize;
            },
            ("u", Some(value)) => {
                self.unicode(value);
                self.pending_skip = self.state.uc_skip;
            },
            (name, _) if is_non_text_destination(name) => {
                self.state.hidden = true;
            },
            ("par" | "line", _) => self.emit("\n"),
            ("tab", _) => self.emit("\t"),
            _ => {},
        }
    }

    /// Handle `\uN`: N is a signed 16-bit UTF-16 code unit.
    ///
    /// A zero unit, which a bare `\u-` also produces, becomes U+FFFD.
    fn unicode(&mut self, value: i32) {
        let unit = if value < 0 { value + 0x1_0000 } else { value };
        let lone_high = self.high_surrogate.take();

        match (u32::try_from(unit), lone_high) {
            (Ok(high @ 0xD800..=0xDBFF), lone) => {
                if lone.is_some() {
                    self.emit_char(REPLACEMENT_CHAR);
                }
                self.high_surrogate = Some(high);
            },
            (Ok(low @ 0xDC00..=0xDFFF), Some(high)) => {
                let code = 0x1_0000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                self.emit_char(char::from_u32(code).unwrap_or(REPLACEMENT_CHAR));
            },
            (unit, lone) => {
                if lone.is_some() {
                    self.emit_char(REPLACEMENT_CHAR);
                }
                let ch = unit
                    .ok()
                    .filter(|&code| code != 0)
                    .and_then(char::from_u32)
                    .unwrap_or(REPLACEMENT_CHAR);
                self.emit_char(ch);
            },
        }
    }

    /// Group boundaries end fallback skipping and any pending surrogate pair.
    fn end_of_run(&mut self) {
        self.pending_skip = 0;
        self.flush_lone_surrogate();
    }

    fn flush_lone_surrogate(&mut self) {
        if self.high_surrogate.take().is_some() {
            self.emit_char(REPLACEMENT_CHAR);
        }
    }

    fn emit_char(&mut self, ch: char) {
        if self.state.in_scope() {
            let mut buf = [0u8; 4];
            let text: &'a str = self.arena.alloc_str(ch.encode_utf8(&mut buf));
            self.fragments.push(text);
        }
    }

    #[inline]
    fn emit(&mut self, text: &'a str) {
        if self.state.in_scope() && !text.is_empty() {
            self.fragments.push(text);
        }
    }

    fn finish(mut self) -> (Vec<&'a str>, bool) {
        self.flush_lone_surrogate();
        if !self.stack.is_empty() {
            tracing::debug!(open_groups = self.stack.len(), "RTF ended inside open groups");
        }
        (self.fragments, self.found_html_tag)
    }
}

/// Destinations whose text is document metadata rather than body content.
#[inline]
fn is_non_text_destination(name: &str) -> bool {
    matches!(
        name,
        "fonttbl"
            | "colortbl"
            | "stylesheet"
            | "info"
            | "pict"
            | "object"
            | "listtable"
            | "listoverridetable"
            | "filetbl"
            | "revtbl"
            | "rsidtbl"
            | "generator"
            | "themedata"
            | "colorschememapping"
            | "datastore"
            | "latentstyles"
    )
}

#[inline]
fn escaped_str(ch: char) -> &'static str {
    match ch {
        '\\' => "\\",
        '{' => "{",
        '}' => "}",
        _ => "",
    }
}

/// True if `rtf` looks like an HTML body wrapped by Outlook.
///
/// Checks for the `\fromhtml` header word or an `{\*\htmltag` destination.
/// A `false` result means [`deencapsulate_html`] would return an empty string.
pub fn has_html_encapsulation(rtf: &str) -> bool {
    let bytes = rtf.as_bytes();
    memmem::find(bytes, b"\\fromhtml").is_some() || memmem::find(bytes, b"{\\*\\htmltag").is_some()
}

/// Recover encapsulated HTML from `rtf` with default options.
pub fn deencapsulate_html(rtf: &str) -> String {
    DeEncapsulator::default().deencapsulate(rtf).content
}
