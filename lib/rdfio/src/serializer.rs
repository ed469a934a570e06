use crate::format::RdfFormat;
use rdfio_jsonld::{JsonLdSerializer, WriterJsonLdSerializer};
use rdfio_model::{IriParseError, RdfParseError, Statement};
use rdfio_ttl::{
    NQuadsSerializer, NTriplesSerializer, TriGSerializer, TurtleSerializer,
    WriterNQuadsSerializer, WriterNTriplesSerializer, WriterTriGSerializer,
    WriterTurtleSerializer,
};
use rdfio_xml::{RdfXmlSerializer, WriterRdfXmlSerializer};
use std::io::{self, Write};

/// A unified push encoder writing [`Statement`]s in any supported format.
///
/// Formats without named-graph support ignore the statement graph name.
///
/// ```
/// use rdfio::{RdfFormat, RdfSerializer};
/// use rdfio::model::{NamedNode, Statement};
///
/// let mut writer = RdfSerializer::from_format(RdfFormat::NQuads).for_writer(Vec::new());
/// writer.write_statement(&Statement::new(
///     NamedNode::new("http://ex/s")?,
///     NamedNode::new("http://ex/p")?,
///     NamedNode::new("http://ex/o")?,
///     NamedNode::new("http://ex/g")?,
/// ))?;
/// writer.close()?;
/// assert_eq!(
///     String::from_utf8(writer.into_inner())?,
///     "<http://ex/s> <http://ex/p> <http://ex/o> <http://ex/g> .\n"
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone)]
#[must_use]
pub struct RdfSerializer {
    format: RdfFormat,
    prefixes: Vec<(String, String)>,
    base: Option<String>,
    pretty: bool,
}

impl RdfSerializer {
    /// Builds an encoder for a format.
    pub fn from_format(format: RdfFormat) -> Self {
        Self {
            format,
            prefixes: Vec::new(),
            base: None,
            pretty: false,
        }
    }

    /// Builds an encoder from a format identifier. Auto-detection does not
    /// apply to output: `auto` and unknown names are rejected.
    pub fn from_name(name: &str) -> Result<Self, RdfParseError> {
        match RdfFormat::from_name(name) {
            Some(format) => Ok(Self::from_format(format)),
            None => Err(RdfParseError::unsupported_format(name)),
        }
    }

    /// The format this encoder writes.
    pub fn format(&self) -> RdfFormat {
        self.format
    }

    /// Declares a prefix for the formats that can abbreviate or announce
    /// namespaces (Turtle, TriG, RDF/XML, JSON-LD).
    pub fn with_prefix(
        mut self,
        prefix_name: impl Into<String>,
        prefix_iri: impl Into<String>,
    ) -> Result<Self, IriParseError> {
        let prefix_iri = prefix_iri.into();
        rdfio_model::NamedNode::new(prefix_iri.as_str())?;
        self.prefixes.push((prefix_name.into(), prefix_iri));
        Ok(self)
    }

    /// Sets the base IRI announced by the formats that carry one.
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        let base_iri = base_iri.into();
        rdfio_model::NamedNode::new(base_iri.as_str())?;
        self.base = Some(base_iri);
        Ok(self)
    }

    /// TriG: group consecutive statements of one graph into a shared block.
    #[inline]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Opens the encoder over a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> StatementWriter<W> {
        // The IRIs were validated by the with_* setters.
        let kind = match self.format {
            RdfFormat::NTriples => {
                StatementWriterKind::NTriples(NTriplesSerializer::new().for_writer(writer))
            }
            RdfFormat::NQuads => {
                StatementWriterKind::NQuads(NQuadsSerializer::new().for_writer(writer))
            }
            RdfFormat::Turtle => {
                let mut serializer = TurtleSerializer::new();
                if let Some(base) = &self.base {
                    if let Ok(with_base) = serializer.clone().with_base_iri(base.clone()) {
                        serializer = with_base;
                    }
                }
                for (name, iri) in &self.prefixes {
                    if let Ok(with_prefix) =
                        serializer.clone().with_prefix(name.clone(), iri.clone())
                    {
                        serializer = with_prefix;
                    }
                }
                StatementWriterKind::Turtle(serializer.for_writer(writer))
            }
            RdfFormat::TriG => {
                let mut serializer = TriGSerializer::new();
                if self.pretty {
                    serializer = serializer.pretty();
                }
                if let Some(base) = &self.base {
                    if let Ok(with_base) = serializer.clone().with_base_iri(base.clone()) {
                        serializer = with_base;
                    }
                }
                for (name, iri) in &self.prefixes {
                    if let Ok(with_prefix) =
                        serializer.clone().with_prefix(name.clone(), iri.clone())
                    {
                        serializer = with_prefix;
                    }
                }
                StatementWriterKind::TriG(serializer.for_writer(writer))
            }
            RdfFormat::RdfXml => {
                let mut serializer = RdfXmlSerializer::new();
                for (name, iri) in &self.prefixes {
                    if let Ok(with_prefix) =
                        serializer.clone().with_prefix(name.clone(), iri.clone())
                    {
                        serializer = with_prefix;
                    }
                }
                StatementWriterKind::RdfXml(serializer.for_writer(writer))
            }
            RdfFormat::JsonLd => {
                let mut serializer = JsonLdSerializer::new();
                if let Some(base) = &self.base {
                    if let Ok(with_base) = serializer.clone().with_base_iri(base.clone()) {
                        serializer = with_base;
                    }
                }
                for (name, iri) in &self.prefixes {
                    if let Ok(with_prefix) =
                        serializer.clone().with_prefix(name.clone(), iri.clone())
                    {
                        serializer = with_prefix;
                    }
                }
                StatementWriterKind::JsonLd(serializer.for_writer(writer))
            }
        };
        StatementWriter { kind }
    }
}

impl From<RdfFormat> for RdfSerializer {
    fn from(format: RdfFormat) -> Self {
        Self::from_format(format)
    }
}

/// A push encoder over statements, wrapping the per-format writers.
///
/// Can be built using [`RdfSerializer::for_writer`]. The shared contract
/// applies: the first write error is cached and replayed, `close` is
/// idempotent, and `write_statement`/`flush` fail after `close`.
#[must_use]
pub struct StatementWriter<W: Write> {
    kind: StatementWriterKind<W>,
}

enum StatementWriterKind<W: Write> {
    NTriples(WriterNTriplesSerializer<W>),
    NQuads(WriterNQuadsSerializer<W>),
    Turtle(WriterTurtleSerializer<W>),
    TriG(WriterTriGSerializer<W>),
    RdfXml(WriterRdfXmlSerializer<W>),
    JsonLd(WriterJsonLdSerializer<W>),
}

impl<W: Write> StatementWriter<W> {
    /// Writes one statement.
    pub fn write_statement(&mut self, statement: &Statement) -> io::Result<()> {
        match &mut self.kind {
            StatementWriterKind::NTriples(writer) => writer.write_statement(statement),
            StatementWriterKind::NQuads(writer) => writer.write_statement(statement),
            StatementWriterKind::Turtle(writer) => writer.write_statement(statement),
            StatementWriterKind::TriG(writer) => writer.write_statement(statement),
            StatementWriterKind::RdfXml(writer) => writer.write_statement(statement),
            StatementWriterKind::JsonLd(writer) => writer.write_statement(statement),
        }
    }

    /// Flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.kind {
            StatementWriterKind::NTriples(writer) => writer.flush(),
            StatementWriterKind::NQuads(writer) => writer.flush(),
            StatementWriterKind::Turtle(writer) => writer.flush(),
            StatementWriterKind::TriG(writer) => writer.flush(),
            StatementWriterKind::RdfXml(writer) => writer.flush(),
            StatementWriterKind::JsonLd(writer) => writer.flush(),
        }
    }

    /// Writes any pending trailer, flushes and closes the encoder.
    pub fn close(&mut self) -> io::Result<()> {
        match &mut self.kind {
            StatementWriterKind::NTriples(writer) => writer.close(),
            StatementWriterKind::NQuads(writer) => writer.close(),
            StatementWriterKind::Turtle(writer) => writer.close(),
            StatementWriterKind::TriG(writer) => writer.close(),
            StatementWriterKind::RdfXml(writer) => writer.close(),
            StatementWriterKind::JsonLd(writer) => writer.close(),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        match self.kind {
            StatementWriterKind::NTriples(writer) => writer.into_inner(),
            StatementWriterKind::NQuads(writer) => writer.into_inner(),
            StatementWriterKind::Turtle(writer) => writer.into_inner(),
            StatementWriterKind::TriG(writer) => writer.into_inner(),
            StatementWriterKind::RdfXml(writer) => writer.into_inner(),
            StatementWriterKind::JsonLd(writer) => writer.into_inner(),
        }
    }
}
