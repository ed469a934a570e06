use memchr::memchr;
use rdfio_model::{ParserConfig, RdfParseError, TextPosition};
use std::io::Read;
use std::str;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// A buffered physical-line reader enforcing the per-line byte cap.
///
/// Every physical line advances the line counter, including blank and
/// comment lines, and the cancellation token is polled before each read.
/// [`advance`](Self::advance) loads the next line, then [`line`](Self::line)
/// and the position accessors borrow it.
pub struct LineReader<R: Read> {
    reader: R,
    format: &'static str,
    max_line_bytes: usize,
    buffer: Vec<u8>,
    start: usize,
    end: usize,
    line: Vec<u8>,
    line_number: u64,
    line_offset: u64,
    next_offset: u64,
    eof: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R, format: &'static str, config: &ParserConfig) -> Self {
        Self {
            reader,
            format,
            max_line_bytes: config.max_line_bytes(),
            buffer: vec![0; READ_CHUNK_SIZE],
            start: 0,
            end: 0,
            line: Vec::new(),
            line_number: 0,
            line_offset: 0,
            next_offset: 0,
            eof: false,
        }
    }

    /// The 1-based number of the line last loaded by [`advance`](Self::advance).
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// The byte offset of the start of the line last loaded.
    pub fn line_offset(&self) -> u64 {
        self.line_offset
    }

    /// The line last loaded, without its terminator.
    pub fn line(&self) -> Result<&str, RdfParseError> {
        str::from_utf8(&self.line).map_err(|e| {
            RdfParseError::syntax(self.format, format!("invalid UTF-8: {e}")).with_position(
                TextPosition::new(self.line_number, 1, self.line_offset),
            )
        })
    }

    /// Loads the next physical line, returning `false` at end of input.
    pub fn advance(&mut self, config: &ParserConfig) -> Result<bool, RdfParseError> {
        config.check_cancelled(self.format)?;
        self.line.clear();
        self.line_offset = self.next_offset;
        let mut found_any = false;
        let mut terminated = false;
        loop {
            if self.start == self.end {
                if self.eof {
                    break;
                }
                let read = self
                    .reader
                    .read(&mut self.buffer)
                    .map_err(|e| RdfParseError::io(self.format, e))?;
                if read == 0 {
                    self.eof = true;
                    continue;
                }
                self.start = 0;
                self.end = read;
            }
            found_any = true;
            let window = &self.buffer[self.start..self.end];
            match memchr(b'\n', window) {
                Some(i) => {
                    self.line.extend_from_slice(&window[..i]);
                    self.start += i + 1;
                    self.next_offset += (i + 1) as u64;
                    terminated = true;
                    break;
                }
                None => {
                    self.line.extend_from_slice(window);
                    self.next_offset += window.len() as u64;
                    self.start = self.end;
                }
            }
            if self.line.len() > self.max_line_bytes {
                self.line_number += 1;
                return Err(self.line_too_long());
            }
        }
        if !found_any && self.line.is_empty() && !terminated {
            return Ok(false);
        }
        self.line_number += 1;
        if self.line.len() > self.max_line_bytes {
            return Err(self.line_too_long());
        }
        if self.line.last() == Some(&b'\r') {
            self.line.pop();
        }
        Ok(true)
    }

    fn line_too_long(&self) -> RdfParseError {
        RdfParseError::line_too_long(self.format, self.max_line_bytes).with_position(
            TextPosition::new(self.line_number, 1, self.line_offset),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_of(data: &str, config: &ParserConfig) -> Result<Vec<String>, RdfParseError> {
        let mut reader = LineReader::new(data.as_bytes(), "N-Triples", config);
        let mut lines = Vec::new();
        while reader.advance(config)? {
            lines.push(reader.line()?.to_owned());
        }
        Ok(lines)
    }

    #[test]
    fn splits_lines_and_strips_crlf() {
        let config = ParserConfig::new();
        assert_eq!(
            lines_of("a\r\nb\nc", &config).unwrap(),
            vec!["a".to_owned(), "b".to_owned(), "c".to_owned()]
        );
    }

    #[test]
    fn counts_every_physical_line() {
        let config = ParserConfig::new();
        let mut reader = LineReader::new("a\n\n# c\nb".as_bytes(), "N-Triples", &config);
        let mut count = 0;
        while reader.advance(&config).unwrap() {
            count += 1;
        }
        assert_eq!(count, 4);
        assert_eq!(reader.line_number(), 4);
    }

    #[test]
    fn line_cap_is_enforced() {
        let config = ParserConfig::new().with_max_line_bytes(4);
        let error = lines_of("abcdefgh\n", &config).unwrap_err();
        assert_eq!(error.kind(), rdfio_model::ErrorKind::LineTooLong);
    }

    #[test]
    fn cancellation_is_polled_before_reads() {
        let cancellation = rdfio_model::Cancellation::new();
        cancellation.cancel();
        let config = ParserConfig::new().with_cancellation(cancellation);
        let error = lines_of("a\n", &config).unwrap_err();
        assert_eq!(error.kind(), rdfio_model::ErrorKind::Canceled);
    }

    #[test]
    fn offsets_track_line_starts() {
        let config = ParserConfig::new();
        let mut reader = LineReader::new("ab\ncd\n".as_bytes(), "N-Triples", &config);
        assert!(reader.advance(&config).unwrap());
        assert_eq!(reader.line_offset(), 0);
        assert!(reader.advance(&config).unwrap());
        assert_eq!(reader.line_offset(), 3);
        assert_eq!(reader.line_number(), 2);
    }
}
