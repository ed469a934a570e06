use oxiri::Iri;
use rdfio_model::{NamedNode, ParserConfig, RdfParseError, TextPosition};

/// A byte cursor over one logical statement with position tracking.
///
/// Errors built through the cursor carry a [`TextPosition`] relative to the
/// whole input: the statement's first line number and byte offset are given
/// at construction.
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    format: &'static str,
    first_line: u64,
    base_offset: u64,
}

impl<'a> Cursor<'a> {
    pub fn new(
        input: &'a str,
        format: &'static str,
        first_line: u64,
        base_offset: u64,
    ) -> Self {
        Self {
            input,
            pos: 0,
            format,
            first_line,
            base_offset,
        }
    }

    pub fn position(&self) -> TextPosition {
        let consumed = &self.input[..self.pos];
        let line_jumps = consumed.matches('\n').count() as u64;
        let column = consumed
            .rsplit('\n')
            .next()
            .unwrap_or_default()
            .chars()
            .count() as u64;
        TextPosition::new(
            self.first_line + line_jumps,
            column + 1,
            self.base_offset + self.pos as u64,
        )
    }

    pub fn error(&self, message: impl Into<String>) -> RdfParseError {
        RdfParseError::syntax(self.format, message).with_position(self.position())
    }

    pub fn format(&self) -> &'static str {
        self.format
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + n).copied()
    }

    #[inline]
    pub fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    #[inline]
    pub fn bump(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    #[inline]
    pub fn bump_ascii(&mut self) {
        self.pos += 1;
    }

    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn eat_str(&mut self, s: &str) -> bool {
        if self.input[self.pos..].starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, byte: u8, what: &str) -> Result<(), RdfParseError> {
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    pub fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Skips whitespace and `#` comments.
    pub fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => self.pos += 1,
                Some(b'#') => {
                    while !matches!(self.peek(), None | Some(b'\n')) {
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    pub fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.pos >= self.input.len()
    }

    /// Reads an `<…>` IRI reference, decoding `\uXXXX`/`\UXXXXXXXX` escapes.
    ///
    /// Spaces, control characters and the other escape sequences are
    /// rejected inside the brackets.
    pub fn read_iriref(&mut self) -> Result<String, RdfParseError> {
        self.expect(b'<', "an IRI starting with '<'")?;
        let mut iri = String::new();
        loop {
            let Some(c) = self.peek_char() else {
                return Err(self.error("unclosed IRI: missing '>'"));
            };
            match c {
                '>' => {
                    self.bump_ascii();
                    return Ok(iri);
                }
                '\\' => {
                    self.bump_ascii();
                    let c = self.read_unicode_escape()?;
                    iri.push(c);
                }
                '\u{0}'..='\u{20}' | '<' | '"' | '{' | '}' | '|' | '^' | '`' => {
                    return Err(
                        self.error(format!("the character {c:?} is not allowed inside an IRI"))
                    );
                }
                _ => {
                    self.bump();
                    iri.push(c);
                }
            }
        }
    }

    /// Decodes a `\uXXXX` or `\UXXXXXXXX` escape, the backslash being already
    /// consumed.
    pub fn read_unicode_escape(&mut self) -> Result<char, RdfParseError> {
        let (len, intro) = match self.peek() {
            Some(b'u') => (4, 'u'),
            Some(b'U') => (8, 'U'),
            _ => return Err(self.error("expected a \\u or \\U escape sequence")),
        };
        self.bump_ascii();
        let start = self.pos;
        for _ in 0..len {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => self.bump_ascii(),
                _ => {
                    return Err(self.error(format!(
                        "a \\{intro} escape must be followed by {len} hexadecimal digits"
                    )));
                }
            }
        }
        let code = u32::from_str_radix(&self.input[start..self.pos], 16)
            .map_err(|e| self.error(format!("invalid escape value: {e}")))?;
        char::from_u32(code)
            .ok_or_else(|| self.error(format!("U+{code:04X} is not a valid Unicode code point")))
    }

    /// Reads a string body up to the given single-character delimiter,
    /// decoding string escapes. The opening delimiter is already consumed.
    pub fn read_string_body(&mut self, delimiter: u8) -> Result<String, RdfParseError> {
        let mut value = String::new();
        loop {
            let Some(c) = self.peek_char() else {
                return Err(self.error("unclosed string literal"));
            };
            match c {
                c if c as u32 == u32::from(delimiter) => {
                    self.bump_ascii();
                    return Ok(value);
                }
                '\\' => {
                    self.bump_ascii();
                    value.push(self.read_string_escape()?);
                }
                '\n' | '\r' => return Err(self.error("unclosed string literal")),
                _ => {
                    self.bump();
                    value.push(c);
                }
            }
        }
    }

    /// Reads a `'''…'''`/`"""…"""` long string body, the opening quotes being
    /// already consumed.
    pub fn read_long_string_body(&mut self, quote: u8) -> Result<String, RdfParseError> {
        let mut value = String::new();
        let closing = match quote {
            b'"' => "\"\"\"",
            _ => "'''",
        };
        loop {
            if self.starts_with(closing) {
                self.pos += 3;
                return Ok(value);
            }
            let Some(c) = self.peek_char() else {
                return Err(self.error("unclosed long string literal"));
            };
            if c == '\\' {
                self.bump_ascii();
                value.push(self.read_string_escape()?);
            } else {
                self.bump();
                value.push(c);
            }
        }
    }

    fn read_string_escape(&mut self) -> Result<char, RdfParseError> {
        match self.peek() {
            Some(b't') => {
                self.bump_ascii();
                Ok('\t')
            }
            Some(b'b') => {
                self.bump_ascii();
                Ok('\u{8}')
            }
            Some(b'n') => {
                self.bump_ascii();
                Ok('\n')
            }
            Some(b'r') => {
                self.bump_ascii();
                Ok('\r')
            }
            Some(b'f') => {
                self.bump_ascii();
                Ok('\u{C}')
            }
            Some(b'"') => {
                self.bump_ascii();
                Ok('"')
            }
            Some(b'\'') => {
                self.bump_ascii();
                Ok('\'')
            }
            Some(b'\\') => {
                self.bump_ascii();
                Ok('\\')
            }
            Some(b'u' | b'U') => self.read_unicode_escape(),
            Some(c) => Err(self.error(format!(
                "unexpected escape character {:?}",
                char::from(c)
            ))),
            None => Err(self.error("unfinished escape sequence")),
        }
    }

    /// Reads a `_:label` blank node label, `_:` being already consumed.
    pub fn read_blank_node_label(&mut self) -> Result<String, RdfParseError> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if is_pn_chars_u(c) || c.is_ascii_digit() => self.bump(),
            _ => return Err(self.error("a blank node label is missing or empty")),
        }
        let mut last_is_dot = false;
        while let Some(c) = self.peek_char() {
            if c == '.' {
                // A dot is allowed only in the middle of a label.
                match self.peek_char_at_next_of('.') {
                    Some(next) if is_pn_chars(next) || next == '.' => {
                        self.bump_ascii();
                        last_is_dot = true;
                    }
                    _ => break,
                }
            } else if is_pn_chars(c) {
                self.bump();
                last_is_dot = false;
            } else {
                break;
            }
        }
        let mut label = &self.input[start..self.pos];
        if last_is_dot {
            label = &label[..label.len() - 1];
            self.pos -= 1;
        }
        if label.contains(':') {
            return Err(self.error("a blank node label must not contain ':'"));
        }
        Ok(label.to_owned())
    }

    fn peek_char_at_next_of(&self, current: char) -> Option<char> {
        self.input[self.pos + current.len_utf8()..].chars().next()
    }

    /// Reads a `@lang` tag body after the `@`, including an optional
    /// `--ltr`/`--rtl` suffix, returning the raw tag.
    pub fn read_language_tag(&mut self) -> Result<&'a str, RdfParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'-') {
            self.bump_ascii();
        }
        if start == self.pos {
            return Err(self.error("a language tag is missing after '@'"));
        }
        Ok(&self.input[start..self.pos])
    }
}

/// Builds an absolute IRI from a reference, resolving against the base when
/// one is set.
///
/// Without strict validation, an absolute-looking reference is accepted as-is
/// when the RFC-3986 resolver rejects it, and resolution against a base falls
/// back to plain concatenation (a deliberate leniency for real-world data).
pub fn resolve_iri(
    base: Option<&Iri<String>>,
    reference: &str,
    config: &ParserConfig,
    cursor: &Cursor<'_>,
) -> Result<NamedNode, RdfParseError> {
    if let Some(base) = base {
        match base.resolve(reference) {
            Ok(iri) => Ok(NamedNode::new_unchecked(iri.into_inner())),
            Err(e) => {
                if config.strict_iris() {
                    Err(cursor.error(format!("invalid IRI {reference:?}: {e}")))
                } else if looks_absolute(reference) {
                    Ok(NamedNode::new_unchecked(reference))
                } else {
                    Ok(NamedNode::new_unchecked(format!("{}{reference}", base.as_str())))
                }
            }
        }
    } else {
        check_absolute_iri(reference, config, cursor)
    }
}

/// Builds an absolute IRI from a reference in a format without base IRIs,
/// with a dedicated error for relative references.
pub fn check_absolute_iri(
    iri: &str,
    config: &ParserConfig,
    cursor: &Cursor<'_>,
) -> Result<NamedNode, RdfParseError> {
    if !looks_absolute(iri) {
        return Err(cursor.error(format!("relative IRI {iri:?} is not allowed here")));
    }
    if config.strict_iris() {
        match Iri::parse(iri) {
            Ok(_) => Ok(NamedNode::new_unchecked(iri)),
            Err(e) => Err(cursor.error(format!("invalid IRI {iri:?}: {e}"))),
        }
    } else {
        Ok(NamedNode::new_unchecked(iri))
    }
}

/// Checks for a scheme followed by ':' before any '/', '?' or '#'.
pub fn looks_absolute(iri: &str) -> bool {
    let mut chars = iri.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => (),
        _ => return false,
    }
    for c in chars {
        match c {
            ':' => return true,
            c if c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.' => (),
            _ => return false,
        }
    }
    false
}

pub fn is_pn_chars_base(c: char) -> bool {
    matches!(c,
        'A'..='Z'
        | 'a'..='z'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

pub fn is_pn_chars_u(c: char) -> bool {
    c == '_' || is_pn_chars_base(c)
}

pub fn is_pn_chars(c: char) -> bool {
    matches!(c,
        '-' | '0'..='9' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}')
        || is_pn_chars_u(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(input: &str) -> Cursor<'_> {
        Cursor::new(input, "N-Triples", 1, 0)
    }

    #[test]
    fn iriref_with_escapes() {
        let mut c = cursor("<http://ex/\\u00E9>");
        assert_eq!(c.read_iriref().unwrap(), "http://ex/é");
    }

    #[test]
    fn iriref_rejects_spaces() {
        let mut c = cursor("<http://ex/a b>");
        assert!(c.read_iriref().is_err());
    }

    #[test]
    fn string_escapes() {
        let mut c = cursor(r#"a\tbA""#);
        assert_eq!(c.read_string_body(b'"').unwrap(), "a\tbA");
    }

    #[test]
    fn blank_node_label_stops_at_trailing_dot() {
        let mut c = cursor("abc.");
        assert_eq!(c.read_blank_node_label().unwrap(), "abc");
        assert_eq!(c.peek(), Some(b'.'));
    }

    #[test]
    fn error_positions_are_one_based() {
        let mut c = cursor("ab\ncd");
        c.bump_ascii();
        c.bump_ascii();
        c.bump_ascii();
        c.bump_ascii();
        let position = c.position();
        assert_eq!(position.line, 2);
        assert_eq!(position.column, 2);
        assert_eq!(position.offset, 4);
    }

    #[test]
    fn absolute_detection() {
        assert!(looks_absolute("http://ex/"));
        assert!(looks_absolute("urn:x"));
        assert!(!looks_absolute("/foo"));
        assert!(!looks_absolute("foo/bar"));
        assert!(!looks_absolute("foo#x:y"));
    }
}
