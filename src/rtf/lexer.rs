//! RTF lexer/tokenizer.
//!
//! The lexer turns RTF source into a flat stream of structural tokens. It never
//! fails: truncated or malformed escapes degrade to harmless tokens so that the
//! consumer can keep going on damaged input. Text that has to be synthesized
//! (hex escapes, symbol mappings) is allocated in a caller-supplied arena, so
//! every token borrows for the same lifetime as the input.

use crate::common::encoding::decode_cp1252_byte;
use bumpalo::Bump;

/// Token types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Opening brace
    GroupOpen,
    /// Closing brace
    GroupClose,
    /// Control word with optional signed parameter, e.g. `\uc1`, `\par`
    ControlWord {
        /// Letters of the control word, without the backslash
        name: &'a str,
        /// Numeric parameter, if present
        param: Option<i32>,
    },
    /// Control symbol without a text mapping, e.g. `\*`
    ControlSymbol(char),
    /// Escaped `\`, `{` or `}`
    EscapedLiteral(char),
    /// Text run, hex escape or mapped control symbol
    Text(&'a str),
}

impl<'a> Token<'a> {
    /// True if this is `\name` with any (or no) parameter.
    #[inline]
    pub fn is_control_word(&self, word: &str) -> bool {
        matches!(self, Token::ControlWord { name, .. } if *name == word)
    }
}

/// RTF Lexer using arena allocation.
pub struct Lexer<'a> {
    /// Source input
    input: &'a str,
    /// Current position in bytes
    pos: usize,
    /// Arena allocator for synthesized text
    arena: &'a Bump,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    #[inline]
    pub fn new(input: &'a str, arena: &'a Bump) -> Self {
        Self {
            input,
            pos: 0,
            arena,
        }
    }

    /// Tokenize the entire input.
    pub fn tokenize(self) -> Vec<Token<'a>> {
        self.collect()
    }

    #[inline]
    fn rest(&self) -> &'a [u8] {
        &self.input.as_bytes()[self.pos..]
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Parse a control word or control symbol. `self.pos` is just past the `\`.
    fn parse_control(&mut self) -> Option<Token<'a>> {
        let Some(ch) = self.input[self.pos..].chars().next() else {
            // Lone backslash at end of input
            return None;
        };

        if ch.is_ascii_alphabetic() {
            return Some(self.parse_control_word());
        }

        self.pos += ch.len_utf8();
        let token = match ch {
            '\\' | '{' | '}' => Token::EscapedLiteral(ch),
            '\'' => self.parse_hex_char(),
            '~' => Token::Text("\u{00A0}"), // Non-breaking space
            '-' => Token::Text("\u{00AD}"), // Optional hyphen
            '_' => Token::Text("\u{2011}"), // Non-breaking hyphen
            other => Token::ControlSymbol(other),
        };
        Some(token)
    }

    /// Parse `name[-]digits[ ]`.
    fn parse_control_word(&mut self) -> Token<'a> {
        let start = self.pos;
        let name_len = self
            .rest()
            .iter()
            .take_while(|b| b.is_ascii_alphabetic())
            .count();
        self.pos += name_len;
        let name = &self.input[start..self.pos];

        let param = self.parse_numeric_parameter();

        // Skip optional space delimiter after control word
        if self.peek() == Some(b' ') {
            self.pos += 1;
        }

        Token::ControlWord { name, param }
    }

    /// Parse numeric parameter after control word.
    ///
    /// A `-` not followed by digits is consumed as an (empty) negative
    /// parameter of zero. Out-of-range values saturate.
    fn parse_numeric_parameter(&mut self) -> Option<i32> {
        let rest = self.rest();
        let negative = rest.first() == Some(&b'-');
        let digits_start = usize::from(negative);
        let digit_count = rest[digits_start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();

        if !negative && digit_count == 0 {
            return None;
        }
        self.pos += digits_start + digit_count;

        let magnitude = rest[digits_start..digits_start + digit_count]
            .iter()
            .fold(0i64, |acc, &d| {
                (acc * 10 + i64::from(d - b'0')).min(i64::from(i32::MAX) + 1)
            });
        let value = if negative { -magnitude } else { magnitude };
        Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }

    /// Parse hexadecimal character escape (\'hh). `self.pos` is just past `'`.
    fn parse_hex_char(&mut self) -> Token<'a> {
        let rest = self.rest();
        let byte = match rest {
            [hi, lo, ..] => match (hex_value(*hi), hex_value(*lo)) {
                (Some(hi), Some(lo)) => Some(hi << 4 | lo),
                _ => None,
            },
            _ => None,
        };

        match byte {
            Some(byte) => {
                self.pos += 2;
                let mut buf = [0u8; 4];
                let text = decode_cp1252_byte(byte).encode_utf8(&mut buf);
                Token::Text(self.arena.alloc_str(text))
            },
            // Leave whatever follows in the stream as ordinary text.
            None => Token::Text(REPLACEMENT_STR),
        }
    }

    /// Parse plain text until a special character or line break.
    fn parse_text(&mut self) -> Token<'a> {
        let start = self.pos;
        let len = self
            .rest()
            .iter()
            .take_while(|&&b| !matches!(b, b'\\' | b'{' | b'}' | b'\r' | b'\n'))
            .count();
        self.pos += len;
        Token::Text(&self.input[start..self.pos])
    }
}

const REPLACEMENT_STR: &str = "\u{FFFD}";

#[inline]
fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            let byte = self.peek()?;
            match byte {
                b'{' => {
                    self.pos += 1;
                    return Some(Token::GroupOpen);
                },
                b'}' => {
                    self.pos += 1;
                    return Some(Token::GroupClose);
                },
                b'\\' => {
                    self.pos += 1;
                    // `None` only happens for a trailing backslash.
                    return self.parse_control();
                },
                // Bare line breaks carry no meaning in RTF.
                b'\r' | b'\n' => self.pos += 1,
                _ => return Some(self.parse_text()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token<'_>> {
        // Leak the arena: tests only.
        let arena: &'static Bump = Box::leak(Box::new(Bump::new()));
        Lexer::new(input, arena).tokenize()
    }

    fn word(name: &str, param: Option<i32>) -> Token<'_> {
        Token::ControlWord { name, param }
    }

    #[test]
    fn test_simple_tokenization() {
        let tokens = lex(r"{\rtf1\ansi Hello}");

        assert_eq!(
            tokens,
            vec![
                Token::GroupOpen,
                word("rtf", Some(1)),
                word("ansi", None),
                Token::Text("Hello"),
                Token::GroupClose,
            ]
        );
    }

    #[test]
    fn test_escapes_and_symbols() {
        let tokens = lex(r"\\\{\}\~\-\_\*\|");
        assert_eq!(
            tokens,
            vec![
                Token::EscapedLiteral('\\'),
                Token::EscapedLiteral('{'),
                Token::EscapedLiteral('}'),
                Token::Text("\u{00A0}"),
                Token::Text("\u{00AD}"),
                Token::Text("\u{2011}"),
                Token::ControlSymbol('*'),
                Token::ControlSymbol('|'),
            ]
        );
    }

    #[test]
    fn test_hex_escape_uses_cp1252() {
        assert_eq!(lex(r"\'e9\'80\'41"), vec![
            Token::Text("é"),
            Token::Text("€"),
            Token::Text("A"),
        ]);
        assert_eq!(lex(r"\'81"), vec![Token::Text("\u{FFFD}")]);
    }

    #[test]
    fn test_malformed_hex_escape() {
        assert_eq!(lex(r"\'zz"), vec![Token::Text("\u{FFFD}"), Token::Text("zz")]);
        assert_eq!(lex(r"\'4"), vec![Token::Text("\u{FFFD}"), Token::Text("4")]);
        assert_eq!(lex(r"\'"), vec![Token::Text("\u{FFFD}")]);
    }

    #[test]
    fn test_parameters() {
        assert_eq!(lex(r"\u-3913?"), vec![word("u", Some(-3913)), Token::Text("?")]);
        assert_eq!(lex(r"\uc0 x"), vec![word("uc", Some(0)), Token::Text("x")]);
        assert_eq!(lex(r"\fs99999999999"), vec![word("fs", Some(i32::MAX))]);
        assert_eq!(lex(r"\li-"), vec![word("li", Some(0))]);
    }

    #[test]
    fn test_single_delimiter_space() {
        assert_eq!(lex(r"\par  two"), vec![word("par", None), Token::Text(" two")]);
        assert_eq!(lex(r"\b0;"), vec![word("b", Some(0)), Token::Text(";")]);
    }

    #[test]
    fn test_line_breaks_skipped() {
        assert_eq!(
            lex("ab\r\ncd\\\npar"),
            vec![
                Token::Text("ab"),
                Token::Text("cd"),
                Token::ControlSymbol('\n'),
                Token::Text("par"),
            ]
        );
    }

    #[test]
    fn test_truncated_input() {
        assert_eq!(lex("{\\"), vec![Token::GroupOpen]);
        assert!(lex("").is_empty());
        assert_eq!(lex("{\\b"), vec![Token::GroupOpen, word("b", None)]);
    }

    #[test]
    fn test_non_ascii_text_and_symbol() {
        assert_eq!(lex("héllo"), vec![Token::Text("héllo")]);
        assert_eq!(lex("\\é"), vec![Token::ControlSymbol('é')]);
    }

    #[test]
    fn test_is_control_word() {
        assert!(word("htmltag", Some(64)).is_control_word("htmltag"));
        assert!(!Token::Text("htmltag").is_control_word("htmltag"));
    }
}
