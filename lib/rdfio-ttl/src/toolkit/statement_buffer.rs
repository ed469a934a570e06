use rdfio_model::{RdfParseError, TextPosition};

/// Accumulates physical lines into one logical Turtle/TriG statement.
///
/// A statement is complete when every bracket, parenthesis, quoted triple,
/// annotation block and graph brace is balanced outside of strings and
/// comments and the last significant character is a `.` terminator or a
/// graph block close. The accumulated text is capped by the statement byte
/// limit.
pub struct StatementBuffer {
    text: String,
    first_line: u64,
    start_offset: u64,
    depth: usize,
    brace_depth: usize,
    long_string: Option<u8>,
    last_significant: Option<char>,
}

impl StatementBuffer {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            first_line: 0,
            start_offset: 0,
            depth: 0,
            brace_depth: 0,
            long_string: None,
            last_significant: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn first_line(&self) -> u64 {
        self.first_line
    }

    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Marks where the statement starts in the input. Called before the first
    /// line is pushed.
    pub fn start(&mut self, line_number: u64, offset: u64) {
        self.first_line = line_number;
        self.start_offset = offset;
    }

    /// Appends one physical line and reports whether the statement is
    /// complete.
    pub fn push_line(
        &mut self,
        line: &str,
        max_statement_bytes: usize,
        format: &'static str,
    ) -> Result<bool, RdfParseError> {
        if self.text.len() + line.len() + 1 > max_statement_bytes {
            return Err(
                RdfParseError::statement_too_long(format, max_statement_bytes).with_position(
                    TextPosition::new(self.first_line, 1, self.start_offset),
                ),
            );
        }
        self.text.push_str(line);
        self.text.push('\n');
        self.scan_line(line);
        Ok(self.is_balanced()
            && matches!(self.last_significant, Some('.') | Some('}')))
    }

    pub fn is_balanced(&self) -> bool {
        self.depth == 0 && self.brace_depth == 0 && self.long_string.is_none()
    }

    /// Checks whether the accumulated text is a complete SPARQL-style bare
    /// directive (those have no `.` terminator).
    pub fn is_complete_bare_directive(&self) -> bool {
        if !self.is_balanced() {
            return false;
        }
        let trimmed = self.text.trim_start();
        let keyword_len = ["prefix", "base", "version"]
            .iter()
            .find(|k| {
                trimmed.len() >= k.len()
                    && trimmed.as_bytes()[..k.len()].eq_ignore_ascii_case(k.as_bytes())
            })
            .map(|k| k.len());
        let Some(keyword_len) = keyword_len else {
            return false;
        };
        // `prefix:x` is a prefixed name, not a directive.
        match trimmed[keyword_len..].chars().next() {
            Some(c) if c == ':' || !c.is_whitespace() => return false,
            None => return false,
            _ => (),
        }
        matches!(
            self.last_significant,
            Some('>' | '"' | '\'') | Some('0'..='9')
        )
    }

    /// Returns the accumulated text and resets the buffer.
    pub fn take(&mut self) -> String {
        self.depth = 0;
        self.brace_depth = 0;
        self.long_string = None;
        self.last_significant = None;
        std::mem::take(&mut self.text)
    }

    fn scan_line(&mut self, line: &str) {
        let bytes = line.as_bytes();
        let mut i = 0;
        let mut short_string: Option<u8> = None;
        let mut in_iri = false;
        while i < bytes.len() {
            let b = bytes[i];
            if let Some(quote) = self.long_string {
                match b {
                    b'\\' => i += 1,
                    _ if b == quote
                        && bytes.get(i + 1) == Some(&quote)
                        && bytes.get(i + 2) == Some(&quote) =>
                    {
                        self.long_string = None;
                        i += 2;
                    }
                    _ => (),
                }
                i += 1;
                continue;
            }
            if let Some(quote) = short_string {
                match b {
                    b'\\' => i += 1,
                    _ if b == quote => short_string = None,
                    _ => (),
                }
                i += 1;
                continue;
            }
            if in_iri {
                match b {
                    b'\\' => i += 1,
                    b'>' => in_iri = false,
                    _ => (),
                }
                i += 1;
                continue;
            }
            match b {
                b'#' => return, // comment until end of line
                b' ' | b'\t' | b'\r' => (),
                b'"' | b'\'' => {
                    if bytes.get(i + 1) == Some(&b) && bytes.get(i + 2) == Some(&b) {
                        self.long_string = Some(b);
                        i += 2;
                    } else {
                        short_string = Some(b);
                    }
                    self.last_significant = Some(char::from(b));
                }
                b'<' => {
                    if bytes.get(i + 1) == Some(&b'<') {
                        self.depth += 1;
                        i += 1;
                    } else {
                        in_iri = true;
                    }
                    self.last_significant = Some('<');
                }
                b'>' => {
                    if bytes.get(i + 1) == Some(&b'>') {
                        self.depth = self.depth.saturating_sub(1);
                        i += 1;
                    }
                    self.last_significant = Some('>');
                }
                b'(' | b'[' => {
                    self.depth += 1;
                    self.last_significant = Some(char::from(b));
                }
                b')' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    self.last_significant = Some(char::from(b));
                }
                b'{' => {
                    if bytes.get(i + 1) == Some(&b'|') {
                        self.depth += 1;
                        i += 1;
                        self.last_significant = Some('|');
                    } else {
                        self.brace_depth += 1;
                        self.last_significant = Some('{');
                    }
                }
                b'|' => {
                    if bytes.get(i + 1) == Some(&b'}') {
                        self.depth = self.depth.saturating_sub(1);
                        i += 1;
                    }
                    self.last_significant = Some('|');
                }
                b'}' => {
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    self.last_significant = Some('}');
                }
                _ => {
                    self.last_significant = Some(char::from(b));
                }
            }
            i += 1;
        }
        // Unterminated IRIs and short strings cannot span lines; the grammar
        // pass reports them.
    }
}

impl Default for StatementBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(buffer: &mut StatementBuffer, line: &str) -> bool {
        buffer.push_line(line, usize::MAX, "Turtle").unwrap()
    }

    #[test]
    fn simple_statement_completes_at_dot() {
        let mut buffer = StatementBuffer::new();
        assert!(push(&mut buffer, "<http://ex/s> <http://ex/p> <http://ex/o> ."));
    }

    #[test]
    fn multi_line_collection() {
        let mut buffer = StatementBuffer::new();
        assert!(!push(&mut buffer, "<http://ex/s> <http://ex/p> ("));
        assert!(!push(&mut buffer, "  <http://ex/a>"));
        assert!(push(&mut buffer, ") ."));
    }

    #[test]
    fn long_strings_span_lines() {
        let mut buffer = StatementBuffer::new();
        assert!(!push(&mut buffer, "<http://ex/s> <http://ex/p> \"\"\"a ."));
        assert!(!push(&mut buffer, "still text ) ] }"));
        assert!(push(&mut buffer, "end\"\"\" ."));
    }

    #[test]
    fn dots_in_iris_do_not_terminate() {
        let mut buffer = StatementBuffer::new();
        assert!(!push(&mut buffer, "<http://ex/s> <http://ex/p> <http://ex/o.>"));
        assert!(push(&mut buffer, "."));
    }

    #[test]
    fn graph_blocks_complete_at_closing_brace() {
        let mut buffer = StatementBuffer::new();
        assert!(!push(&mut buffer, "<http://ex/g> {"));
        assert!(!push(&mut buffer, "<http://ex/s> <http://ex/p> <http://ex/o> ."));
        assert!(push(&mut buffer, "}"));
    }

    #[test]
    fn annotation_blocks_are_not_graph_braces() {
        let mut buffer = StatementBuffer::new();
        assert!(!push(
            &mut buffer,
            "<http://ex/s> <http://ex/p> <http://ex/o> {|"
        ));
        assert!(push(&mut buffer, "<http://ex/q> <http://ex/r> |} ."));
    }

    #[test]
    fn bare_directives_complete_without_dot() {
        let mut buffer = StatementBuffer::new();
        assert!(!push(&mut buffer, "PREFIX ex: <http://ex/>"));
        assert!(buffer.is_complete_bare_directive());
        let mut buffer = StatementBuffer::new();
        assert!(!push(&mut buffer, "prefix:a <http://ex/p> <http://ex/o>"));
        assert!(!buffer.is_complete_bare_directive());
    }

    #[test]
    fn statement_cap_is_enforced() {
        let mut buffer = StatementBuffer::new();
        let error = buffer
            .push_line(&"a".repeat(100), 50, "Turtle")
            .unwrap_err();
        assert_eq!(error.kind(), rdfio_model::ErrorKind::StatementTooLong);
    }
}
