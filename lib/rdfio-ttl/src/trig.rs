//! A [TriG](https://www.w3.org/TR/rdf12-trig/) streaming parser implemented
//! by [`TriGParser`] and a serializer implemented by [`TriGSerializer`].

use crate::terse::TerseParserCore;
use crate::turtle::TerseSerializerOptions;
use oxiri::Iri;
use rdfio_model::{
    GraphName, IriParseError, ParserConfig, RdfParseError, SinkState, Statement,
    validate_statement,
};
use std::collections::HashMap;
use std::io::{self, Read, Write};

pub(crate) const FORMAT: &str = "TriG";

/// A [TriG](https://www.w3.org/TR/rdf12-trig/) streaming parser.
///
/// ```
/// use rdfio_model::{GraphName, NamedNode};
/// use rdfio_ttl::TriGParser;
///
/// let file = r#"@prefix ex: <http://ex/> .
/// ex:g { ex:s ex:p ex:o . }
/// ex:s ex:p ex:o2 ."#;
///
/// let statements = TriGParser::new()
///     .for_slice(file)
///     .collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(
///     statements[0].graph_name,
///     NamedNode::new("http://ex/g")?.into()
/// );
/// assert_eq!(statements[1].graph_name, GraphName::DefaultGraph);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct TriGParser {
    config: ParserConfig,
    base: Option<Iri<String>>,
    prefixes: HashMap<String, String>,
}

impl TriGParser {
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

    /// Sets the base IRI relative IRIs resolve against until a `@base`
    /// directive replaces it.
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Declares a prefix ahead of the document's own directives.
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.prefixes.insert(
            prefix_name.into(),
            Iri::parse(prefix_iri.into())?.into_inner(),
        );
        Ok(self)
    }

    /// Parses from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderTriGParser<R> {
        ReaderTriGParser {
            inner: TerseParserCore::new(reader, self.config, FORMAT, true, self.base, self.prefixes),
        }
    }

    /// Parses from a byte or string slice.
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderTriGParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Iterates over the statements of a TriG document.
///
/// Can be built using [`TriGParser::for_reader`] or [`TriGParser::for_slice`].
#[must_use]
pub struct ReaderTriGParser<R: Read> {
    inner: TerseParserCore<R>,
}

impl<R: Read> ReaderTriGParser<R> {
    /// The prefixes declared so far.
    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.inner.prefixes()
    }

    /// The base IRI currently in use.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner.base_iri()
    }
}

impl<R: Read> Iterator for ReaderTriGParser<R> {
    type Item = Result<Statement, RdfParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.parse_next()
    }
}

/// A [TriG](https://www.w3.org/TR/rdf12-trig/) push encoder.
///
/// By default every named-graph statement is written as a one-line
/// `g { s p o . }` block; [`TriGSerializer::pretty`] groups consecutive
/// statements of the same graph into one multi-line block instead.
#[derive(Default, Clone)]
#[must_use]
pub struct TriGSerializer {
    inner: TerseSerializerOptions,
    pretty: bool,
}

impl TriGSerializer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        self.inner = self.inner.with_prefix(prefix_name, prefix_iri)?;
        Ok(self)
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.inner = self.inner.with_base_iri(base_iri)?;
        Ok(self)
    }

    /// Groups consecutive statements of one graph into a shared block.
    #[inline]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Writes to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterTriGSerializer<W> {
        WriterTriGSerializer {
            writer,
            options: self.inner,
            pretty: self.pretty,
            state: SinkState::new(),
            header_written: false,
            open_graph: None,
        }
    }
}

/// Writes a TriG file to a [`Write`] implementation.
///
/// Can be built using [`TriGSerializer::for_writer`].
pub struct WriterTriGSerializer<W: Write> {
    writer: W,
    options: TerseSerializerOptions,
    pretty: bool,
    state: SinkState,
    header_written: bool,
    open_graph: Option<GraphName>,
}

impl<W: Write> WriterTriGSerializer<W> {
    pub fn write_statement(&mut self, statement: &Statement) -> io::Result<()> {
        self.state.check_open()?;
        validate_statement(statement)?;
        let mut text = String::new();
        if !self.header_written {
            self.header_written = true;
            self.options.write_header(&mut text);
        }
        if self.pretty {
            self.write_pretty(&mut text, statement);
        } else {
            self.write_one_line(&mut text, statement);
        }
        let result = self.writer.write_all(text.as_bytes());
        self.state.record(result)
    }

    fn write_one_line(&mut self, text: &mut String, statement: &Statement) {
        if let Some(name) = graph_label(&self.options, &statement.graph_name) {
            text.push_str(&name);
            text.push_str(" { ");
            self.options.write_triple_parts(text, statement);
            text.push_str(" . }\n");
        } else {
            self.options.write_triple_parts(text, statement);
            text.push_str(" .\n");
        }
    }

    fn write_pretty(&mut self, text: &mut String, statement: &Statement) {
        if self.open_graph.as_ref() != Some(&statement.graph_name) {
            if self.open_graph.take().is_some() {
                text.push_str("}\n");
            }
            if let Some(name) = graph_label(&self.options, &statement.graph_name) {
                text.push_str(&name);
                text.push_str(" {\n");
                self.open_graph = Some(statement.graph_name.clone());
            }
        }
        if self.open_graph.is_some() {
            text.push('\t');
        }
        self.options.write_triple_parts(text, statement);
        text.push_str(" .\n");
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.state.check_open()?;
        let result = self.writer.flush();
        self.state.record(result)
    }

    /// Flushes and closes the encoder, closing any open graph block. Later
    /// `write_statement`/`flush` calls fail; calling `close` again returns
    /// the cached error without side effects.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(result) = self.state.enter_close() {
            return result;
        }
        let mut text = String::new();
        if !self.header_written {
            self.header_written = true;
            self.options.write_header(&mut text);
        }
        if self.open_graph.take().is_some() {
            text.push_str("}\n");
        }
        let result = if text.is_empty() {
            Ok(())
        } else {
            self.writer.write_all(text.as_bytes())
        };
        let result = result.and_then(|()| self.writer.flush());
        self.state.record(result)
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn graph_label(options: &TerseSerializerOptions, graph_name: &GraphName) -> Option<String> {
    match graph_name {
        GraphName::NamedNode(node) => {
            let mut out = String::new();
            options.write_term(&mut out, &node.clone().into());
            Some(out)
        }
        GraphName::BlankNode(node) => Some(node.to_string()),
        GraphName::DefaultGraph => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfio_model::{Literal, NamedNode};

    fn statement(graph: Option<&str>, object: &str) -> Statement {
        Statement::new(
            NamedNode::new_unchecked("http://ex/s"),
            NamedNode::new_unchecked("http://ex/p"),
            Literal::new_simple_literal(object),
            match graph {
                Some(graph) => GraphName::NamedNode(NamedNode::new_unchecked(graph)),
                None => GraphName::DefaultGraph,
            },
        )
    }

    #[test]
    fn one_line_blocks_by_default() {
        let mut serializer = TriGSerializer::new().for_writer(Vec::new());
        serializer
            .write_statement(&statement(Some("http://ex/g"), "a"))
            .unwrap();
        serializer.write_statement(&statement(None, "b")).unwrap();
        serializer.close().unwrap();
        assert_eq!(
            String::from_utf8(serializer.into_inner()).unwrap(),
            "<http://ex/g> { <http://ex/s> <http://ex/p> \"a\" . }\n<http://ex/s> <http://ex/p> \"b\" .\n"
        );
    }

    #[test]
    fn pretty_groups_consecutive_statements() {
        let mut serializer = TriGSerializer::new().pretty().for_writer(Vec::new());
        serializer
            .write_statement(&statement(Some("http://ex/g"), "a"))
            .unwrap();
        serializer
            .write_statement(&statement(Some("http://ex/g"), "b"))
            .unwrap();
        serializer.write_statement(&statement(None, "c")).unwrap();
        serializer.close().unwrap();
        assert_eq!(
            String::from_utf8(serializer.into_inner()).unwrap(),
            "<http://ex/g> {\n\t<http://ex/s> <http://ex/p> \"a\" .\n\t<http://ex/s> <http://ex/p> \"b\" .\n}\n<http://ex/s> <http://ex/p> \"c\" .\n"
        );
    }

    #[test]
    fn pretty_round_trips_through_the_parser() {
        let mut serializer = TriGSerializer::new().pretty().for_writer(Vec::new());
        let statements = vec![
            statement(Some("http://ex/g"), "a"),
            statement(None, "b"),
            statement(Some("http://ex/h"), "c"),
        ];
        for s in &statements {
            serializer.write_statement(s).unwrap();
        }
        serializer.close().unwrap();
        let text = String::from_utf8(serializer.into_inner()).unwrap();
        let reparsed = TriGParser::new()
            .for_slice(&text)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(statements, reparsed);
    }
}
