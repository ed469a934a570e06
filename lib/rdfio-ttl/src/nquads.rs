//! An [N-Quads](https://www.w3.org/TR/rdf12-n-quads/) streaming parser
//! implemented by [`NQuadsParser`] and a serializer implemented by
//! [`NQuadsSerializer`].

use crate::line_formats::LineFormatParserCore;
use rdfio_model::{
    ParserConfig, RdfParseError, SinkState, Statement, validate_statement,
};
use std::io::{self, Read, Write};

pub(crate) const FORMAT: &str = "N-Quads";

/// An [N-Quads](https://www.w3.org/TR/rdf12-n-quads/) streaming parser.
///
/// ```
/// use rdfio_ttl::NQuadsParser;
///
/// let file = r#"<http://ex/s> <http://ex/p> "v" <http://ex/g> .
/// <http://ex/s> <http://ex/p> "w" ."#;
///
/// let statements = NQuadsParser::new()
///     .for_slice(file)
///     .collect::<Result<Vec<_>, _>>()?;
/// assert!(statements[0].is_quad());
/// assert!(!statements[1].is_quad());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NQuadsParser {
    config: ParserConfig,
}

impl NQuadsParser {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a limits configuration, replacing the defaults.
    #[inline]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Parses from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderNQuadsParser<R> {
        ReaderNQuadsParser {
            inner: LineFormatParserCore::new(reader, self.config, FORMAT, true),
        }
    }

    /// Parses from a byte or string slice.
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderNQuadsParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Iterates over the statements of an N-Quads document.
///
/// Can be built using [`NQuadsParser::for_reader`] or
/// [`NQuadsParser::for_slice`].
#[must_use]
pub struct ReaderNQuadsParser<R: Read> {
    inner: LineFormatParserCore<R>,
}

impl<R: Read> Iterator for ReaderNQuadsParser<R> {
    type Item = Result<Statement, RdfParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.parse_next()
    }
}

/// An [N-Quads](https://www.w3.org/TR/rdf12-n-quads/) push encoder.
///
/// The graph name is written when the statement carries one.
#[derive(Default, Clone)]
#[must_use]
pub struct NQuadsSerializer {}

impl NQuadsSerializer {
    #[inline]
    pub fn new() -> Self {
        Self {}
    }

    /// Writes to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterNQuadsSerializer<W> {
        WriterNQuadsSerializer {
            writer,
            state: SinkState::new(),
        }
    }
}

/// Writes an N-Quads file to a [`Write`] implementation.
///
/// Can be built using [`NQuadsSerializer::for_writer`].
pub struct WriterNQuadsSerializer<W: Write> {
    writer: W,
    state: SinkState,
}

impl<W: Write> WriterNQuadsSerializer<W> {
    pub fn write_statement(&mut self, statement: &Statement) -> io::Result<()> {
        self.state.check_open()?;
        validate_statement(statement)?;
        let line = format!("{statement} .\n");
        let result = self.writer.write_all(line.as_bytes());
        self.state.record(result)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.state.check_open()?;
        let result = self.writer.flush();
        self.state.record(result)
    }

    /// Flushes and closes the encoder. Later `write_statement`/`flush` calls
    /// fail; calling `close` again returns the cached error without side
    /// effects.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(result) = self.state.enter_close() {
            return result;
        }
        let result = self.writer.flush();
        self.state.record(result)
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfio_model::{GraphName, NamedNode};

    #[test]
    fn round_trips_a_quad() {
        let input = "<http://ex/s> <http://ex/p> \"a\\nb\" <http://ex/g> .\n";
        let statements = NQuadsParser::new()
            .for_slice(input)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let mut serializer = NQuadsSerializer::new().for_writer(Vec::new());
        for statement in &statements {
            serializer.write_statement(statement).unwrap();
        }
        assert_eq!(String::from_utf8(serializer.into_inner()).unwrap(), input);
    }

    #[test]
    fn default_graph_has_three_terms() {
        let mut serializer = NQuadsSerializer::new().for_writer(Vec::new());
        serializer
            .write_statement(&Statement::new(
                NamedNode::new_unchecked("http://ex/s"),
                NamedNode::new_unchecked("http://ex/p"),
                NamedNode::new_unchecked("http://ex/o"),
                GraphName::DefaultGraph,
            ))
            .unwrap();
        assert_eq!(
            String::from_utf8(serializer.into_inner()).unwrap(),
            "<http://ex/s> <http://ex/p> <http://ex/o> .\n"
        );
    }
}
