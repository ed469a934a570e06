//! An [N-Triples](https://www.w3.org/TR/rdf12-n-triples/) streaming parser
//! implemented by [`NTriplesParser`] and a serializer implemented by
//! [`NTriplesSerializer`].

use crate::line_formats::LineFormatParserCore;
use rdfio_model::{
    ParserConfig, RdfParseError, SinkState, Statement, Triple, validate_statement,
};
use std::io::{self, Read, Write};

pub(crate) const FORMAT: &str = "N-Triples";

/// An [N-Triples](https://www.w3.org/TR/rdf12-n-triples/) streaming parser.
///
/// Count the number of people:
/// ```
/// use rdfio_model::{NamedNode, Term, vocab::rdf};
/// use rdfio_ttl::NTriplesParser;
///
/// let file = r#"<http://example.com/foo> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
/// <http://example.com/foo> <http://schema.org/name> "Foo" .
/// <http://example.com/bar> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .
/// <http://example.com/bar> <http://schema.org/name> "Bar" ."#;
///
/// let schema_person: Term = NamedNode::new("http://schema.org/Person")?.into();
/// let mut count = 0;
/// for triple in NTriplesParser::new().for_slice(file) {
///     let triple = triple?;
///     if triple.predicate == rdf::TYPE && triple.object == schema_person {
///         count += 1;
///     }
/// }
/// assert_eq!(2, count);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NTriplesParser {
    config: ParserConfig,
}

impl NTriplesParser {
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
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderNTriplesParser<R> {
        ReaderNTriplesParser {
            inner: LineFormatParserCore::new(reader, self.config, FORMAT, false),
        }
    }

    /// Parses from a byte or string slice.
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderNTriplesParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Iterates over the triples of an N-Triples document.
///
/// Can be built using [`NTriplesParser::for_reader`] or
/// [`NTriplesParser::for_slice`].
#[must_use]
pub struct ReaderNTriplesParser<R: Read> {
    inner: LineFormatParserCore<R>,
}

impl<R: Read> Iterator for ReaderNTriplesParser<R> {
    type Item = Result<Triple, RdfParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.parse_next()?.map(Statement::into_triple))
    }
}

/// An [N-Triples](https://www.w3.org/TR/rdf12-n-triples/) push encoder.
///
/// Graph names are ignored: N-Triples carries plain triples.
///
/// ```
/// use rdfio_model::{NamedNode, Statement, vocab::rdf};
/// use rdfio_ttl::NTriplesSerializer;
///
/// let mut serializer = NTriplesSerializer::new().for_writer(Vec::new());
/// serializer.write_statement(&Statement::new_triple(
///     NamedNode::new("http://example.com#me")?,
///     rdf::TYPE,
///     NamedNode::new("http://schema.org/Person")?,
/// ))?;
/// serializer.close()?;
/// assert_eq!(
///     b"<http://example.com#me> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://schema.org/Person> .\n",
///     serializer.into_inner().as_slice()
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct NTriplesSerializer {}

impl NTriplesSerializer {
    #[inline]
    pub fn new() -> Self {
        Self {}
    }

    /// Writes to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterNTriplesSerializer<W> {
        WriterNTriplesSerializer {
            writer,
            state: SinkState::new(),
        }
    }
}

/// Writes an N-Triples file to a [`Write`] implementation.
///
/// Can be built using [`NTriplesSerializer::for_writer`].
pub struct WriterNTriplesSerializer<W: Write> {
    writer: W,
    state: SinkState,
}

impl<W: Write> WriterNTriplesSerializer<W> {
    /// Writes one statement, dropping its graph name.
    pub fn write_statement(&mut self, statement: &Statement) -> io::Result<()> {
        self.state.check_open()?;
        validate_statement(statement)?;
        let line = format!(
            "{} {} {} .\n",
            statement.subject, statement.predicate, statement.object
        );
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
    use rdfio_model::{BlankNode, Literal, NamedNode};

    #[test]
    fn graph_names_are_dropped() {
        let mut serializer = NTriplesSerializer::new().for_writer(Vec::new());
        serializer
            .write_statement(&Statement::new(
                NamedNode::new_unchecked("http://ex/s"),
                NamedNode::new_unchecked("http://ex/p"),
                Literal::new_simple_literal("v"),
                NamedNode::new_unchecked("http://ex/g"),
            ))
            .unwrap();
        assert_eq!(
            String::from_utf8(serializer.into_inner()).unwrap(),
            "<http://ex/s> <http://ex/p> \"v\" .\n"
        );
    }

    #[test]
    fn zero_statement_is_rejected() {
        let mut serializer = NTriplesSerializer::new().for_writer(Vec::new());
        let statement = Statement::new_triple(
            NamedNode::new_unchecked(""),
            NamedNode::new_unchecked(""),
            BlankNode::new_unchecked(""),
        );
        let error = serializer.write_statement(&statement).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn writes_fail_after_close() {
        let mut serializer = NTriplesSerializer::new().for_writer(Vec::new());
        serializer.close().unwrap();
        assert!(serializer.close().is_ok());
        let statement = Statement::new_triple(
            NamedNode::new_unchecked("http://ex/s"),
            NamedNode::new_unchecked("http://ex/p"),
            NamedNode::new_unchecked("http://ex/o"),
        );
        assert!(serializer.write_statement(&statement).is_err());
        assert!(serializer.flush().is_err());
    }
}
