use crate::format::{RdfFormat, detect_format};
use rdfio_jsonld::{DocumentLoader, JsonLdParser, ReaderJsonLdParser};
use rdfio_model::{
    IriParseError, ParserConfig, RdfParseError, Statement,
};
use rdfio_ttl::{
    NQuadsParser, NTriplesParser, ReaderNQuadsParser, ReaderNTriplesParser, ReaderTriGParser,
    ReaderTurtleParser, TriGParser, TurtleParser,
};
use rdfio_xml::{RdfXmlParser, ReaderRdfXmlParser};
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, sync_channel};
use std::thread;

/// The auto-detection byte window: sampling stops at the first statement
/// line or at this many bytes.
const DETECTION_WINDOW: usize = 8 * 1024;

/// The underlying reader once the detection window has been re-chained in
/// front of it.
type SourceReader<R> = std::io::Chain<Cursor<Vec<u8>>, R>;

/// A unified pull decoder yielding [`Statement`]s for any supported format.
///
/// Triple-only formats place their triples in the default graph.
///
/// ```
/// use rdfio::{RdfFormat, RdfParser};
///
/// let file = "<http://ex/s> <http://ex/p> <http://ex/o> .";
/// let statements = RdfParser::from_format(RdfFormat::NTriples)
///     .for_slice(file)?
///     .collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(statements.len(), 1);
/// assert!(!statements[0].is_quad());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
///
/// Auto-detection samples the head of the input:
///
/// ```
/// use rdfio::RdfParser;
///
/// let file = r#"{"@context": {"ex": "http://ex/"}, "@id": "http://ex/s", "ex:p": "v"}"#;
/// let reader = RdfParser::from_auto().for_slice(file)?;
/// assert_eq!(reader.format(), rdfio::RdfFormat::JsonLd);
/// # Result::<_, rdfio::RdfParseError>::Ok(())
/// ```
#[derive(Clone)]
#[must_use]
pub struct RdfParser {
    format: Option<RdfFormat>,
    config: ParserConfig,
    base: Option<String>,
    prefixes: Vec<(String, String)>,
    loader: Option<Arc<dyn DocumentLoader + Send + Sync>>,
}

impl std::fmt::Debug for RdfParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RdfParser")
            .field("format", &self.format)
            .field("config", &self.config)
            .field("base", &self.base)
            .field("prefixes", &self.prefixes)
            .field("loader", &self.loader.as_ref().map(|_| "<DocumentLoader>"))
            .finish()
    }
}

impl RdfParser {
    /// Builds a parser for a fixed format.
    pub fn from_format(format: RdfFormat) -> Self {
        Self {
            format: Some(format),
            config: ParserConfig::new(),
            base: None,
            prefixes: Vec::new(),
            loader: None,
        }
    }

    /// Builds a parser that auto-detects the format from the input head.
    pub fn from_auto() -> Self {
        Self {
            format: None,
            config: ParserConfig::new(),
            base: None,
            prefixes: Vec::new(),
            loader: None,
        }
    }

    /// Builds a parser from a format identifier (`nt`, `turtle`, `json-ld`,
    /// …); the empty string and `auto` select auto-detection.
    pub fn from_name(name: &str) -> Result<Self, RdfParseError> {
        if RdfFormat::is_auto_name(name) {
            return Ok(Self::from_auto());
        }
        match RdfFormat::from_name(name) {
            Some(format) => Ok(Self::from_format(format)),
            None => Err(RdfParseError::unsupported_format(name)),
        }
    }

    /// Applies a limits configuration, replacing the defaults.
    #[inline]
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the base IRI for the formats that resolve relative IRIs.
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        let base_iri = base_iri.into();
        rdfio_model::NamedNode::new(base_iri.as_str())?;
        self.base = Some(base_iri);
        Ok(self)
    }

    /// Pre-declares a prefix for the terse formats.
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

    /// Injects the JSON-LD remote context loader capability.
    pub fn with_document_loader(
        mut self,
        loader: impl DocumentLoader + Send + Sync + 'static,
    ) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Opens the decoder over a [`Read`] implementation.
    ///
    /// Auto-detection reads the sampling window eagerly, which is the only
    /// reason this constructor can fail.
    pub fn for_reader<R: Read>(self, mut reader: R) -> Result<StatementReader<R>, RdfParseError> {
        let (format, window) = match self.format {
            Some(format) => (format, Vec::new()),
            None => {
                let window = read_detection_window(&mut reader)?;
                (detect_format(&window), window)
            }
        };
        let source = Cursor::new(window).chain(reader);
        let kind = match format {
            RdfFormat::NTriples => StatementReaderKind::NTriples(
                NTriplesParser::new()
                    .with_config(self.config)
                    .for_reader(source),
            ),
            RdfFormat::NQuads => StatementReaderKind::NQuads(
                NQuadsParser::new()
                    .with_config(self.config)
                    .for_reader(source),
            ),
            RdfFormat::Turtle => {
                let mut parser = TurtleParser::new().with_config(self.config);
                if let Some(base) = &self.base {
                    parser = parser
                        .with_base_iri(base.clone())
                        .map_err(invalid_base(RdfFormat::Turtle))?;
                }
                for (name, iri) in &self.prefixes {
                    parser = parser
                        .with_prefix(name.clone(), iri.clone())
                        .map_err(invalid_base(RdfFormat::Turtle))?;
                }
                StatementReaderKind::Turtle(parser.for_reader(source))
            }
            RdfFormat::TriG => {
                let mut parser = TriGParser::new().with_config(self.config);
                if let Some(base) = &self.base {
                    parser = parser
                        .with_base_iri(base.clone())
                        .map_err(invalid_base(RdfFormat::TriG))?;
                }
                for (name, iri) in &self.prefixes {
                    parser = parser
                        .with_prefix(name.clone(), iri.clone())
                        .map_err(invalid_base(RdfFormat::TriG))?;
                }
                StatementReaderKind::TriG(parser.for_reader(source))
            }
            RdfFormat::RdfXml => {
                let mut parser = RdfXmlParser::new().with_config(self.config);
                if let Some(base) = &self.base {
                    parser = parser
                        .with_base_iri(base.clone())
                        .map_err(invalid_base(RdfFormat::RdfXml))?;
                }
                StatementReaderKind::RdfXml(parser.for_reader(source))
            }
            RdfFormat::JsonLd => {
                let mut parser = JsonLdParser::new().with_config(self.config);
                if let Some(base) = &self.base {
                    parser = parser
                        .with_base_iri(base.clone())
                        .map_err(invalid_base(RdfFormat::JsonLd))?;
                }
                if let Some(loader) = self.loader {
                    parser = parser.with_document_loader(loader);
                }
                StatementReaderKind::JsonLd(parser.for_reader(source))
            }
        };
        Ok(StatementReader { format, kind })
    }

    /// Opens the decoder over a byte or string slice.
    pub fn for_slice<'a>(
        self,
        slice: &'a (impl AsRef<[u8]> + ?Sized),
    ) -> Result<StatementReader<&'a [u8]>, RdfParseError> {
        self.for_reader(slice.as_ref())
    }
}

impl From<RdfFormat> for RdfParser {
    fn from(format: RdfFormat) -> Self {
        Self::from_format(format)
    }
}

fn invalid_base(format: RdfFormat) -> impl Fn(IriParseError) -> RdfParseError {
    move |e| RdfParseError::syntax(format.name(), format!("invalid IRI option: {e}"))
}

/// Samples the input head for format detection: reads until a complete
/// statement-looking line is buffered, the window is full, or the input
/// ends.
fn read_detection_window(reader: &mut impl Read) -> Result<Vec<u8>, RdfParseError> {
    let mut window = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        if window.len() >= DETECTION_WINDOW || window_is_sufficient(&window) {
            return Ok(window);
        }
        let read = reader
            .read(&mut chunk)
            .map_err(|e| RdfParseError::io("", e))?;
        if read == 0 {
            return Ok(window);
        }
        window.extend_from_slice(&chunk[..read]);
    }
}

/// The window suffices once it holds a complete line that is not blank, a
/// comment or a directive (directives alone cannot split Turtle from TriG).
fn window_is_sufficient(window: &[u8]) -> bool {
    let text = String::from_utf8_lossy(window);
    // Only complete lines count; the tail may still be growing.
    let Some(complete) = text.rfind('\n').map(|i| &text[..i]) else {
        return false;
    };
    for line in complete.split('\n') {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let body = line.strip_prefix('@').unwrap_or(line);
        if ["prefix", "base", "version"].iter().any(|k| {
            body.len() >= k.len()
                && body.as_bytes()[..k.len()].eq_ignore_ascii_case(k.as_bytes())
        }) {
            continue;
        }
        return true;
    }
    false
}

/// A pull decoder over statements, wrapping the per-format drivers.
///
/// Can be built using [`RdfParser::for_reader`] or [`RdfParser::for_slice`].
#[must_use]
pub struct StatementReader<R: Read> {
    format: RdfFormat,
    kind: StatementReaderKind<R>,
}

enum StatementReaderKind<R: Read> {
    NTriples(ReaderNTriplesParser<SourceReader<R>>),
    NQuads(ReaderNQuadsParser<SourceReader<R>>),
    Turtle(ReaderTurtleParser<SourceReader<R>>),
    TriG(ReaderTriGParser<SourceReader<R>>),
    RdfXml(ReaderRdfXmlParser<SourceReader<R>>),
    JsonLd(ReaderJsonLdParser<SourceReader<R>>),
}

impl<R: Read> StatementReader<R> {
    /// The format this reader parses (the detected one under auto).
    pub fn format(&self) -> RdfFormat {
        self.format
    }

    /// Push shape: feeds every statement to `handler`; a handler error stops
    /// iteration and surfaces.
    ///
    /// ```
    /// use rdfio::{RdfFormat, RdfParser, RdfParseError};
    ///
    /// let mut count = 0;
    /// RdfParser::from_format(RdfFormat::NTriples)
    ///     .for_slice("<http://ex/s> <http://ex/p> <http://ex/o> .")?
    ///     .process(|_statement| -> Result<(), RdfParseError> {
    ///         count += 1;
    ///         Ok(())
    ///     })?;
    /// assert_eq!(count, 1);
    /// # Result::<_, rdfio::RdfParseError>::Ok(())
    /// ```
    pub fn process<E: From<RdfParseError>>(
        mut self,
        mut handler: impl FnMut(Statement) -> Result<(), E>,
    ) -> Result<(), E> {
        while let Some(result) = self.next() {
            handler(result.map_err(E::from)?)?;
        }
        Ok(())
    }

    /// Channel shape: one producer thread drives the pull loop.
    ///
    /// The statement channel is a rendezvous channel, so back-pressure is
    /// the consumer's read pace; the error channel holds at most one error.
    /// Both close when parsing ends, errors out, is cancelled or the
    /// statement receiver is dropped.
    pub fn into_channel(self) -> StatementChannel
    where
        R: Send + 'static,
    {
        let (statement_sender, statements) = sync_channel(0);
        let (error_sender, errors) = sync_channel(1);
        thread::spawn(move || {
            for result in self {
                match result {
                    Ok(statement) => {
                        if statement_sender.send(statement).is_err() {
                            return; // the consumer went away
                        }
                    }
                    Err(e) => {
                        let _ = error_sender.send(e);
                        return;
                    }
                }
            }
        });
        StatementChannel { statements, errors }
    }
}

impl<R: Read> Iterator for StatementReader<R> {
    type Item = Result<Statement, RdfParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.kind {
            StatementReaderKind::NTriples(parser) => {
                Some(parser.next()?.map(Statement::from))
            }
            StatementReaderKind::NQuads(parser) => parser.next(),
            StatementReaderKind::Turtle(parser) => Some(parser.next()?.map(Statement::from)),
            StatementReaderKind::TriG(parser) => parser.next(),
            StatementReaderKind::RdfXml(parser) => Some(parser.next()?.map(Statement::from)),
            StatementReaderKind::JsonLd(parser) => parser.next(),
        }
    }
}

/// The two receivers of the channel shape: statements and at most one error.
pub struct StatementChannel {
    pub statements: Receiver<Statement>,
    pub errors: Receiver<RdfParseError>,
}
