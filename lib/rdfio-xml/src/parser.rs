use oxilangtag::LanguageTag;
use oxiri::Iri;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::name::{LocalName, QName, ResolveResult};
use quick_xml::{NsReader, Writer};
use rdfio_model::vocab::rdf;
use rdfio_model::{
    BlankNode, BlankNodeGenerator, Literal, NamedNode, ParserConfig, RdfParseError, Subject,
    Term, Triple,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{BufReader, Read};

pub(crate) const FORMAT: &str = "RDF/XML";

const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

const RDF_ABOUT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#about";
const RDF_ABOUT_EACH: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEach";
const RDF_ABOUT_EACH_PREFIX: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEachPrefix";
const RDF_ANNOTATION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#annotation";
const RDF_ANNOTATION_NODE_ID: &str =
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#annotationNodeID";
const RDF_BAG_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#bagID";
const RDF_DATATYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#datatype";
const RDF_DESCRIPTION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Description";
const RDF_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#ID";
const RDF_LI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#li";
const RDF_NODE_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nodeID";
const RDF_OBJECT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#object";
const RDF_PARSE_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#parseType";
const RDF_PREDICATE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#predicate";
const RDF_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#RDF";
const RDF_RESOURCE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#resource";
const RDF_SUBJECT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#subject";

const RESERVED_RDF_ELEMENTS: [&str; 10] = [
    RDF_ABOUT,
    RDF_ABOUT_EACH,
    RDF_ABOUT_EACH_PREFIX,
    RDF_BAG_ID,
    RDF_DATATYPE,
    RDF_ID,
    RDF_LI,
    RDF_NODE_ID,
    RDF_PARSE_TYPE,
    RDF_RESOURCE,
];

/// An [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/) streaming parser.
///
/// ```
/// use rdfio_model::{NamedNode, Term, vocab::rdf};
/// use rdfio_xml::RdfXmlParser;
///
/// let file = br#"<?xml version="1.0"?>
/// <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:schema="http://schema.org/">
///  <schema:Person rdf:about="http://example.com/bar" schema:name="Bar" />
/// </rdf:RDF>"#;
///
/// let schema_person: Term = NamedNode::new("http://schema.org/Person")?.into();
/// let mut count = 0;
/// for triple in RdfXmlParser::new().for_reader(file.as_ref()) {
///     let triple = triple?;
///     if triple.predicate == rdf::TYPE && triple.object == schema_person {
///         count += 1;
///     }
/// }
/// assert_eq!(1, count);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct RdfXmlParser {
    config: ParserConfig,
    base: Option<Iri<String>>,
}

impl RdfXmlParser {
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

    /// Sets the base IRI used until an `xml:base` attribute replaces it.
    pub fn with_base_iri(
        mut self,
        base_iri: impl Into<String>,
    ) -> Result<Self, rdfio_model::IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Parses from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderRdfXmlParser<R> {
        let config = self.config.normalized();
        let mut xml_reader = NsReader::from_reader(BufReader::new(reader));
        xml_reader.config_mut().expand_empty_elements = true;
        ReaderRdfXmlParser {
            queue: VecDeque::new(),
            pending_error: None,
            emitted: 0,
            buffer: Vec::new(),
            reader: RdfXmlReader {
                reader: xml_reader,
                state: vec![RdfXmlState::Doc {
                    base_iri: self.base,
                }],
                custom_entities: HashMap::new(),
                in_literal_depth: 0,
                known_ids: HashSet::new(),
                generator: BlankNodeGenerator::new(),
                config,
                is_end: false,
            },
        }
    }

    /// Parses from a byte slice.
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderRdfXmlParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Iterates over the triples of an RDF/XML document.
///
/// Triples already produced by a finished property element are delivered
/// before a following error surfaces.
///
/// Can be built using [`RdfXmlParser::for_reader`] or
/// [`RdfXmlParser::for_slice`].
#[must_use]
pub struct ReaderRdfXmlParser<R: Read> {
    queue: VecDeque<Triple>,
    pending_error: Option<RdfParseError>,
    emitted: u64,
    reader: RdfXmlReader<BufReader<R>>,
    buffer: Vec<u8>,
}

impl<R: Read> Iterator for ReaderRdfXmlParser<R> {
    type Item = Result<Triple, RdfParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.queue.is_empty() || self.pending_error.is_some() {
                if let Err(e) = self.reader.config.check_cancelled(FORMAT) {
                    return Some(Err(e));
                }
            }
            if let Some(triple) = self.queue.pop_front() {
                if self.emitted >= self.reader.config.max_statements() {
                    self.queue.clear();
                    self.reader.is_end = true;
                    self.pending_error = None;
                    return Some(Err(RdfParseError::statement_limit_exceeded(
                        FORMAT,
                        self.reader.config.max_statements(),
                    )));
                }
                self.emitted += 1;
                return Some(Ok(triple));
            }
            if let Some(e) = self.pending_error.take() {
                self.reader.is_end = true;
                return Some(Err(e));
            }
            if self.reader.is_end {
                return None;
            }
            if let Err(e) = self.parse_step() {
                // Deliver the triples queued before the failure first.
                self.pending_error = Some(e);
            }
        }
    }
}

impl<R: Read> ReaderRdfXmlParser<R> {
    fn parse_step(&mut self) -> Result<(), RdfParseError> {
        self.reader.config.check_cancelled(FORMAT)?;
        self.buffer.clear();
        let event = self
            .reader
            .reader
            .read_event_into(&mut self.buffer)
            .map_err(|e| self.reader.map_xml_error(e))?;
        let mut results = Vec::new();
        let outcome = self.reader.parse_event(event, &mut results);
        self.queue.extend(results);
        outcome
    }
}

enum RdfXmlState {
    Doc {
        base_iri: Option<Iri<String>>,
    },
    Rdf {
        base_iri: Option<Iri<String>>,
        language: Option<String>,
    },
    NodeElt {
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        li_counter: u64,
    },
    PropertyElt {
        iri: NamedNode,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        object: Option<NodeOrText>,
        id_attr: Option<NamedNode>,
        datatype_attr: Option<NamedNode>,
        annotation: Option<Subject>,
        property_attrs: Vec<(NamedNode, String)>,
    },
    ParseTypeCollectionPropertyElt {
        iri: NamedNode,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        objects: Vec<Subject>,
        id_attr: Option<NamedNode>,
        annotation: Option<Subject>,
    },
    ParseTypeLiteralPropertyElt {
        iri: NamedNode,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        writer: Writer<Vec<u8>>,
        id_attr: Option<NamedNode>,
        annotation: Option<Subject>,
    },
    ParseTypeTriplePropertyElt {
        iri: NamedNode,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        parts: Option<TripleParts>,
        id_attr: Option<NamedNode>,
        annotation: Option<Subject>,
    },
    /// The nested `rdf:Description` inside a `parseType="Triple"` property.
    TripleDescription {
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        parts: TripleParts,
    },
}

#[derive(Clone)]
struct TripleParts {
    description_subject: Subject,
    subject: Option<NamedNode>,
    predicate: Option<NamedNode>,
    object: Option<NamedNode>,
}

#[derive(Clone)]
enum NodeOrText {
    Node(Subject),
    Text(String),
}

impl RdfXmlState {
    fn base_iri(&self) -> Option<&Iri<String>> {
        match self {
            Self::Doc { base_iri }
            | Self::Rdf { base_iri, .. }
            | Self::NodeElt { base_iri, .. }
            | Self::PropertyElt { base_iri, .. }
            | Self::ParseTypeCollectionPropertyElt { base_iri, .. }
            | Self::ParseTypeLiteralPropertyElt { base_iri, .. }
            | Self::ParseTypeTriplePropertyElt { base_iri, .. }
            | Self::TripleDescription { base_iri, .. } => base_iri.as_ref(),
        }
    }

    fn language(&self) -> Option<&String> {
        match self {
            Self::Doc { .. } => None,
            Self::Rdf { language, .. }
            | Self::NodeElt { language, .. }
            | Self::PropertyElt { language, .. }
            | Self::ParseTypeCollectionPropertyElt { language, .. }
            | Self::ParseTypeLiteralPropertyElt { language, .. }
            | Self::ParseTypeTriplePropertyElt { language, .. }
            | Self::TripleDescription { language, .. } => language.as_ref(),
        }
    }
}

struct RdfXmlReader<R> {
    reader: NsReader<R>,
    state: Vec<RdfXmlState>,
    custom_entities: HashMap<String, String>,
    in_literal_depth: usize,
    known_ids: HashSet<String>,
    generator: BlankNodeGenerator,
    config: ParserConfig,
    is_end: bool,
}

impl<R: std::io::BufRead> RdfXmlReader<R> {
    fn parse_event(
        &mut self,
        event: Event<'_>,
        results: &mut Vec<Triple>,
    ) -> Result<(), RdfParseError> {
        match event {
            Event::Start(event) => self.parse_start_event(&event, results),
            Event::End(event) => self.parse_end_event(&event.name(), results),
            Event::Empty(_) => Err(self.error("unexpanded empty element event")),
            Event::Text(event) => self.parse_text_event(&event),
            Event::CData(event) => {
                let event = event.escape().map_err(|e| self.map_xml_error(e))?;
                self.parse_text_event(&event)
            }
            Event::Comment(_) | Event::PI(_) => Ok(()),
            Event::Decl(decl) => {
                if let Some(encoding) = decl.encoding() {
                    let encoding = encoding.map_err(|e| self.map_xml_error(e))?;
                    let name = String::from_utf8_lossy(&encoding).to_ascii_lowercase();
                    if name != "utf-8" && name != "utf8" && name != "ascii" {
                        return Err(self.error("only UTF-8 RDF/XML documents are supported"));
                    }
                }
                Ok(())
            }
            Event::DocType(dt) => self.parse_doctype(&dt),
            Event::Eof => {
                if self.state.len() > 1 {
                    return Err(self.error("unexpected end of file inside an element"));
                }
                self.is_end = true;
                Ok(())
            }
        }
    }

    /// Extracts `<!ENTITY name "value">` declarations so entity references in
    /// attributes and names can be resolved.
    fn parse_doctype(&mut self, dt: &BytesText<'_>) -> Result<(), RdfParseError> {
        let text = self
            .reader
            .decoder()
            .decode(dt.as_ref())
            .map_err(|e| self.error(format!("invalid DOCTYPE: {e}")))?
            .into_owned();
        for input in text.split('<').skip(1) {
            let Some(input) = input.strip_prefix("!ENTITY") else {
                continue;
            };
            let input = input.trim_start().strip_prefix('%').unwrap_or(input);
            let Some((name, input)) = input
                .trim_start()
                .split_once(|c: char| c.is_ascii_whitespace())
            else {
                return Err(self.error("<!ENTITY declarations need a name and a value"));
            };
            let Some(input) = input.trim_start().strip_prefix('"') else {
                return Err(self.error("<!ENTITY values must be enclosed in double quotes"));
            };
            let Some((value, _)) = input.split_once('"') else {
                return Err(self.error("<!ENTITY values must be enclosed in double quotes"));
            };
            let value = self.unescape(value)?;
            self.custom_entities.insert(name.to_owned(), value);
        }
        Ok(())
    }

    fn parse_start_event(
        &mut self,
        event: &BytesStart<'_>,
        results: &mut Vec<Triple>,
    ) -> Result<(), RdfParseError> {
        if self.state.len() >= self.config.max_depth() {
            return Err(RdfParseError::depth_exceeded(FORMAT, self.config.max_depth()));
        }

        // parseType="Literal" captures the XML verbatim
        if self.in_xml_literal() {
            let writer = self.literal_writer()?;
            writer
                .write_event(Event::Start(event.clone()))
                .map_err(|e| {
                    RdfParseError::syntax(FORMAT, format!("cannot buffer XML literal: {e}"))
                })?;
            self.in_literal_depth += 1;
            // A placeholder so the End event pops symmetrically.
            self.state.push(RdfXmlState::Doc { base_iri: None });
            return Ok(());
        }

        let tag_name = self.resolve_tag_name(event.name())?;
        let attributes = self.collect_attributes(event)?;

        let base_iri = match &attributes.base {
            Some(base) => Some(self.resolve_base(base)?),
            None => self.current_base().cloned(),
        };
        let language = if attributes.language_cleared {
            None
        } else {
            match &attributes.language {
                Some(language) => Some(language.clone()),
                None => self.current_language().cloned(),
            }
        };

        enum Context {
            Doc,
            NodeContainer,
            Property(Subject),
            InsideProperty,
            TripleProperty,
            TripleDescription,
        }
        let context = match self.state.last().ok_or_else(|| {
            RdfParseError::syntax(FORMAT, "event received after the document ended")
        })? {
            RdfXmlState::Doc { .. } => Context::Doc,
            RdfXmlState::Rdf { .. } | RdfXmlState::ParseTypeCollectionPropertyElt { .. } => {
                Context::NodeContainer
            }
            RdfXmlState::NodeElt { subject, .. } => Context::Property(subject.clone()),
            RdfXmlState::PropertyElt { .. } => Context::InsideProperty,
            RdfXmlState::ParseTypeTriplePropertyElt { .. } => Context::TripleProperty,
            RdfXmlState::TripleDescription { .. } => Context::TripleDescription,
            RdfXmlState::ParseTypeLiteralPropertyElt { .. } => {
                unreachable!("handled before tag resolution")
            }
        };
        let state = match context {
            Context::Doc => {
                if tag_name == RDF_RDF {
                    RdfXmlState::Rdf { base_iri, language }
                } else {
                    self.build_node_element(tag_name, base_iri, language, attributes, results)?
                }
            }
            Context::NodeContainer => {
                self.build_node_element(tag_name, base_iri, language, attributes, results)?
            }
            Context::Property(subject) => self.build_property_element(
                tag_name, base_iri, language, subject, attributes, results,
            )?,
            Context::InsideProperty => {
                return Err(self.error(
                    "nested elements inside a property element require an rdf:parseType",
                ));
            }
            Context::TripleProperty => {
                if tag_name != RDF_DESCRIPTION {
                    return Err(self.error(
                        "rdf:parseType=\"Triple\" requires a nested rdf:Description element",
                    ));
                }
                self.build_triple_description(base_iri, language, attributes)?
            }
            Context::TripleDescription => {
                return Err(self.error(
                    "nested elements are not allowed inside an rdf:parseType=\"Triple\" description",
                ));
            }
        };
        self.state.push(state);
        Ok(())
    }

    fn in_xml_literal(&self) -> bool {
        self.in_literal_depth > 0
            || matches!(
                self.state.last(),
                Some(RdfXmlState::ParseTypeLiteralPropertyElt { .. })
            )
    }

    fn literal_writer(&mut self) -> Result<&mut Writer<Vec<u8>>, RdfParseError> {
        self.state
            .iter_mut()
            .rev()
            .find_map(|state| match state {
                RdfXmlState::ParseTypeLiteralPropertyElt { writer, .. } => Some(writer),
                _ => None,
            })
            .ok_or_else(|| {
                RdfParseError::syntax(FORMAT, "lost track of the XML literal being captured")
            })
    }

    fn parse_end_event(
        &mut self,
        name: &QName<'_>,
        results: &mut Vec<Triple>,
    ) -> Result<(), RdfParseError> {
        // Closing an element captured inside parseType="Literal"
        if self.in_literal_depth > 0 {
            self.in_literal_depth -= 1;
            self.state.pop();
            let owned_name = String::from_utf8_lossy(name.as_ref()).into_owned();
            let writer = self.literal_writer()?;
            writer
                .write_event(Event::End(quick_xml::events::BytesEnd::new(owned_name)))
                .map_err(|e| {
                    RdfParseError::syntax(FORMAT, format!("cannot buffer XML literal: {e}"))
                })?;
            return Ok(());
        }
        let Some(state) = self.state.pop() else {
            return Err(self.error("unexpected closing tag"));
        };
        self.end_state(state, results)
    }

    fn parse_text_event(&mut self, event: &BytesText<'_>) -> Result<(), RdfParseError> {
        let text = self
            .reader
            .decoder()
            .decode(event.as_ref())
            .map_err(|e| self.error(format!("invalid text: {e}")))?
            .into_owned();
        let text = self.unescape(&text)?;
        if self.in_literal_depth > 0 {
            let writer = self.literal_writer()?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(|e| {
                    RdfParseError::syntax(FORMAT, format!("cannot buffer XML literal: {e}"))
                })?;
            return Ok(());
        }
        match self.state.last_mut() {
            Some(RdfXmlState::PropertyElt { object, .. }) => {
                match object {
                    Some(NodeOrText::Text(existing)) => existing.push_str(&text),
                    Some(NodeOrText::Node(_)) => {
                        if !text.trim().is_empty() {
                            return Err(self.error(
                                "character content is not allowed next to a resource object",
                            ));
                        }
                    }
                    None => *object = Some(NodeOrText::Text(text)),
                }
                Ok(())
            }
            Some(RdfXmlState::ParseTypeLiteralPropertyElt { writer, .. }) => {
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(|e| {
                        RdfParseError::syntax(FORMAT, format!("cannot buffer XML literal: {e}"))
                    })?;
                Ok(())
            }
            _ => {
                if text.trim().is_empty() {
                    Ok(())
                } else {
                    Err(self.error(format!("unexpected text content {:?}", text.trim())))
                }
            }
        }
    }

    fn build_node_element(
        &mut self,
        tag_name: String,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        attributes: CollectedAttributes,
        results: &mut Vec<Triple>,
    ) -> Result<RdfXmlState, RdfParseError> {
        if RESERVED_RDF_ELEMENTS.contains(&tag_name.as_str()) || tag_name == RDF_RDF {
            return Err(self.error(format!("{tag_name} is not allowed as a node element name")));
        }
        let subject: Subject = match (
            attributes.id,
            attributes.node_id,
            attributes.about,
        ) {
            (Some(id), None, None) => self.resolve_rdf_id(&id, base_iri.as_ref())?.into(),
            (None, Some(node_id), None) => BlankNode::new_unchecked(node_id).into(),
            (None, None, Some(about)) => {
                self.resolve_iri_against(&about, base_iri.as_ref())?.into()
            }
            (None, None, None) => self.generator.next_node().into(),
            _ => {
                return Err(self.error(
                    "rdf:ID, rdf:nodeID and rdf:about are mutually exclusive on a node element",
                ));
            }
        };
        if attributes.resource.is_some() || attributes.parse_type.is_some() {
            return Err(self.error(
                "rdf:resource and rdf:parseType are not allowed on node elements",
            ));
        }
        for (property, value) in &attributes.property_attrs {
            results.push(Triple {
                subject: subject.clone(),
                predicate: property.clone(),
                object: literal_with_language(value.clone(), language.as_deref()).into(),
            });
        }
        if let Some(type_attr) = attributes.type_attr {
            let object = self.resolve_iri_against(&type_attr, base_iri.as_ref())?;
            results.push(Triple {
                subject: subject.clone(),
                predicate: rdf::TYPE.into(),
                object: object.into(),
            });
        }
        if tag_name != RDF_DESCRIPTION {
            results.push(Triple {
                subject: subject.clone(),
                predicate: rdf::TYPE.into(),
                object: NamedNode::new_unchecked(tag_name).into(),
            });
        }
        Ok(RdfXmlState::NodeElt {
            base_iri,
            language,
            subject,
            li_counter: 0,
        })
    }

    fn build_property_element(
        &mut self,
        tag_name: String,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        attributes: CollectedAttributes,
        results: &mut Vec<Triple>,
    ) -> Result<RdfXmlState, RdfParseError> {
        let iri = self.property_iri(tag_name)?;
        if attributes.about.is_some() {
            return Err(self.error("rdf:about is not allowed on property elements"));
        }
        let id_attr = match attributes.id {
            Some(id) => Some(self.resolve_rdf_id(&id, base_iri.as_ref())?),
            None => None,
        };
        let annotation = match (attributes.annotation, attributes.annotation_node_id) {
            (Some(annotation), None) => Some(
                self.resolve_iri_against(&annotation, base_iri.as_ref())?
                    .into(),
            ),
            (None, Some(node_id)) => Some(BlankNode::new_unchecked(node_id).into()),
            (None, None) => None,
            (Some(_), Some(_)) => {
                return Err(self.error(
                    "rdf:annotation and rdf:annotationNodeID are mutually exclusive",
                ));
            }
        };
        if let Some(parse_type) = attributes.parse_type {
            if attributes.resource.is_some() || attributes.node_id.is_some() {
                return Err(self.error(
                    "rdf:parseType is mutually exclusive with rdf:resource and rdf:nodeID",
                ));
            }
            return match parse_type.as_str() {
                "Resource" => {
                    if !attributes.property_attrs.is_empty() {
                        return Err(self.error(
                            "property attributes are not allowed with rdf:parseType=\"Resource\"",
                        ));
                    }
                    let object = self.generator.next_node();
                    let triple = Triple {
                        subject,
                        predicate: iri,
                        object: object.clone().into(),
                    };
                    results.push(triple.clone());
                    if let Some(id_attr) = id_attr {
                        reify(&triple, id_attr, results);
                    }
                    if let Some(annotation) = annotation {
                        annotate(&triple, annotation, results);
                    }
                    Ok(RdfXmlState::NodeElt {
                        base_iri,
                        language,
                        subject: object.into(),
                        li_counter: 0,
                    })
                }
                "Literal" => {
                    if !attributes.property_attrs.is_empty()
                        || attributes.datatype.is_some()
                        || attributes.about.is_some()
                    {
                        return Err(self.error(
                            "rdf:parseType=\"Literal\" only allows xml:lang, xml:base, rdf:ID, rdf:annotation and rdf:annotationNodeID",
                        ));
                    }
                    Ok(RdfXmlState::ParseTypeLiteralPropertyElt {
                        iri,
                        base_iri,
                        language,
                        subject,
                        writer: Writer::new(Vec::new()),
                        id_attr,
                        annotation,
                    })
                }
                "Collection" => Ok(RdfXmlState::ParseTypeCollectionPropertyElt {
                    iri,
                    base_iri,
                    language,
                    subject,
                    objects: Vec::new(),
                    id_attr,
                    annotation,
                }),
                "Triple" => Ok(RdfXmlState::ParseTypeTriplePropertyElt {
                    iri,
                    base_iri,
                    language,
                    subject,
                    parts: None,
                    id_attr,
                    annotation,
                }),
                other => Err(self.error(format!("unsupported rdf:parseType {other:?}"))),
            };
        }
        let object = match (attributes.resource, attributes.node_id) {
            (Some(resource), None) => Some(NodeOrText::Node(
                self.resolve_iri_against(&resource, base_iri.as_ref())?.into(),
            )),
            (None, Some(node_id)) => {
                Some(NodeOrText::Node(BlankNode::new_unchecked(node_id).into()))
            }
            (None, None) => None,
            (Some(_), Some(_)) => {
                return Err(
                    self.error("rdf:resource and rdf:nodeID are mutually exclusive")
                );
            }
        };
        let datatype_attr = match attributes.datatype {
            Some(datatype) => Some(self.resolve_iri_against(&datatype, base_iri.as_ref())?),
            None => None,
        };
        Ok(RdfXmlState::PropertyElt {
            iri,
            base_iri,
            language,
            subject,
            object,
            id_attr,
            datatype_attr,
            annotation,
            property_attrs: attributes.property_attrs,
        })
    }

    fn build_triple_description(
        &mut self,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        attributes: CollectedAttributes,
    ) -> Result<RdfXmlState, RdfParseError> {
        let description_subject: Subject = match (&attributes.about, &attributes.node_id) {
            (Some(about), None) => self.resolve_iri_against(about, base_iri.as_ref())?.into(),
            (None, Some(node_id)) => BlankNode::new_unchecked(node_id.clone()).into(),
            (None, None) => self.generator.next_node().into(),
            (Some(_), Some(_)) => {
                return Err(self.error("rdf:about and rdf:nodeID are mutually exclusive"));
            }
        };
        let mut parts = TripleParts {
            description_subject,
            subject: None,
            predicate: None,
            object: None,
        };
        for (property, value) in &attributes.property_attrs {
            let target = match property.as_str() {
                RDF_SUBJECT => &mut parts.subject,
                RDF_PREDICATE => &mut parts.predicate,
                RDF_OBJECT => &mut parts.object,
                _ => {
                    return Err(self.error(
                        "only rdf:subject, rdf:predicate and rdf:object are allowed here",
                    ));
                }
            };
            *target = Some(self.resolve_iri_against(value, base_iri.as_ref())?);
        }
        Ok(RdfXmlState::TripleDescription {
            base_iri,
            language,
            parts,
        })
    }

    fn end_state(
        &mut self,
        state: RdfXmlState,
        results: &mut Vec<Triple>,
    ) -> Result<(), RdfParseError> {
        match state {
            RdfXmlState::Doc { .. } | RdfXmlState::Rdf { .. } => Ok(()),
            RdfXmlState::NodeElt { subject, .. } => {
                // A node element closing inside parseType="Collection" adds
                // itself to the parent's item list.
                if let Some(RdfXmlState::ParseTypeCollectionPropertyElt { objects, .. }) =
                    self.state.last_mut()
                {
                    objects.push(subject);
                }
                Ok(())
            }
            RdfXmlState::PropertyElt {
                iri,
                language,
                subject,
                object,
                id_attr,
                datatype_attr,
                annotation,
                property_attrs,
                ..
            } => {
                let object: Term = match object {
                    Some(NodeOrText::Node(node)) => {
                        for (property, value) in &property_attrs {
                            results.push(Triple {
                                subject: node.clone(),
                                predicate: property.clone(),
                                object: literal_with_language(
                                    value.clone(),
                                    language.as_deref(),
                                )
                                .into(),
                            });
                        }
                        Term::from(node)
                    }
                    None if !property_attrs.is_empty() => {
                        let node: Subject = self.generator.next_node().into();
                        for (property, value) in &property_attrs {
                            results.push(Triple {
                                subject: node.clone(),
                                predicate: property.clone(),
                                object: literal_with_language(
                                    value.clone(),
                                    language.as_deref(),
                                )
                                .into(),
                            });
                        }
                        Term::from(node)
                    }
                    Some(NodeOrText::Text(text)) => {
                        self.make_literal(text, datatype_attr, language)?.into()
                    }
                    None => self
                        .make_literal(String::new(), datatype_attr, language)?
                        .into(),
                };
                let triple = Triple {
                    subject,
                    predicate: iri,
                    object,
                };
                results.push(triple.clone());
                if let Some(id_attr) = id_attr {
                    reify(&triple, id_attr, results);
                }
                if let Some(annotation) = annotation {
                    annotate(&triple, annotation, results);
                }
                Ok(())
            }
            RdfXmlState::ParseTypeLiteralPropertyElt {
                iri,
                subject,
                writer,
                id_attr,
                annotation,
                ..
            } => {
                let content = String::from_utf8(writer.into_inner())
                    .map_err(|e| self.error(format!("invalid XML literal: {e}")))?;
                let triple = Triple {
                    subject,
                    predicate: iri,
                    object: Literal::new_typed_literal(content, rdf::XML_LITERAL).into(),
                };
                results.push(triple.clone());
                if let Some(id_attr) = id_attr {
                    reify(&triple, id_attr, results);
                }
                if let Some(annotation) = annotation {
                    annotate(&triple, annotation, results);
                }
                Ok(())
            }
            RdfXmlState::ParseTypeCollectionPropertyElt {
                iri,
                subject,
                objects,
                id_attr,
                annotation,
                ..
            } => {
                let mut nodes = Vec::with_capacity(objects.len());
                for _ in 0..objects.len() {
                    nodes.push(self.generator.next_node());
                }
                let head: Term = match nodes.first() {
                    Some(first) => first.clone().into(),
                    None => rdf::NIL.into(),
                };
                let triple = Triple {
                    subject,
                    predicate: iri,
                    object: head,
                };
                results.push(triple.clone());
                if let Some(id_attr) = id_attr {
                    reify(&triple, id_attr, results);
                }
                if let Some(annotation) = annotation {
                    annotate(&triple, annotation, results);
                }
                for (i, (node, object)) in nodes.iter().zip(objects).enumerate() {
                    results.push(Triple {
                        subject: node.clone().into(),
                        predicate: rdf::FIRST.into(),
                        object: object.into(),
                    });
                    let rest: Term = match nodes.get(i + 1) {
                        Some(next) => next.clone().into(),
                        None => rdf::NIL.into(),
                    };
                    results.push(Triple {
                        subject: node.clone().into(),
                        predicate: rdf::REST.into(),
                        object: rest,
                    });
                }
                Ok(())
            }
            RdfXmlState::ParseTypeTriplePropertyElt {
                iri,
                subject,
                parts,
                id_attr,
                annotation,
                ..
            } => {
                let Some(parts) = parts else {
                    return Err(self.error(
                        "rdf:parseType=\"Triple\" requires a nested rdf:Description element",
                    ));
                };
                let object: Term = match (&parts.subject, &parts.predicate, &parts.object) {
                    (Some(s), Some(p), Some(o)) => Triple {
                        subject: s.clone().into(),
                        predicate: p.clone(),
                        object: o.clone().into(),
                    }
                    .into(),
                    _ => {
                        // Incomplete: fall back to a reification placeholder
                        // instead of dropping the input.
                        let node = parts.description_subject.clone();
                        results.push(Triple {
                            subject: node.clone(),
                            predicate: rdf::TYPE.into(),
                            object: Term::from(rdf::STATEMENT),
                        });
                        for (predicate, value) in [
                            (rdf::SUBJECT, &parts.subject),
                            (rdf::PREDICATE, &parts.predicate),
                            (rdf::OBJECT, &parts.object),
                        ] {
                            if let Some(value) = value {
                                results.push(Triple {
                                    subject: node.clone(),
                                    predicate: predicate.into(),
                                    object: value.clone().into(),
                                });
                            }
                        }
                        node.into()
                    }
                };
                let triple = Triple {
                    subject,
                    predicate: iri,
                    object,
                };
                results.push(triple.clone());
                if let Some(id_attr) = id_attr {
                    reify(&triple, id_attr, results);
                }
                if let Some(annotation) = annotation {
                    annotate(&triple, annotation, results);
                }
                Ok(())
            }
            RdfXmlState::TripleDescription { parts, .. } => {
                if let Some(RdfXmlState::ParseTypeTriplePropertyElt {
                    parts: slot, ..
                }) = self.state.last_mut()
                {
                    if slot.is_some() {
                        return Err(self.error(
                            "rdf:parseType=\"Triple\" allows a single rdf:Description",
                        ));
                    }
                    *slot = Some(parts);
                }
                Ok(())
            }
        }
    }

    /// The property IRI for a property element, expanding `rdf:li` into the
    /// container membership properties.
    fn property_iri(&mut self, tag_name: String) -> Result<NamedNode, RdfParseError> {
        if tag_name == RDF_LI {
            if !self.config.expand_containers() {
                return Ok(NamedNode::new_unchecked(tag_name));
            }
            let Some(RdfXmlState::NodeElt { li_counter, .. }) = self.state.last_mut() else {
                return Err(RdfParseError::syntax(
                    FORMAT,
                    "rdf:li is only allowed inside a node element",
                ));
            };
            *li_counter += 1;
            return Ok(rdf::member(*li_counter));
        }
        if let Some(index) = tag_name
            .strip_prefix(RDF_NAMESPACE)
            .and_then(|local| local.strip_prefix('_'))
            .and_then(|digits| digits.parse::<u64>().ok())
        {
            // An explicit rdf:_n bumps the counter so later rdf:li continue
            // past it.
            if let Some(RdfXmlState::NodeElt { li_counter, .. }) = self.state.last_mut() {
                *li_counter = (*li_counter).max(index);
            }
            return Ok(NamedNode::new_unchecked(tag_name));
        }
        if RESERVED_RDF_ELEMENTS.contains(&tag_name.as_str())
            || tag_name == RDF_RDF
            || tag_name == RDF_DESCRIPTION
        {
            return Err(RdfParseError::syntax(
                FORMAT,
                format!("{tag_name} is not allowed as a property element name"),
            ));
        }
        Ok(NamedNode::new_unchecked(tag_name))
    }

    fn collect_attributes(
        &mut self,
        event: &BytesStart<'_>,
    ) -> Result<CollectedAttributes, RdfParseError> {
        let mut collected = CollectedAttributes::default();
        for attribute in event.attributes() {
            let attribute = attribute.map_err(|e| self.map_xml_error(e.into()))?;
            if attribute.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = attribute.key;
            if key.as_ref().starts_with(b"xml:") || key.as_ref() == b"xml" {
                match key.as_ref() {
                    b"xml:lang" => {
                        let value = self.attribute_value(&attribute)?;
                        if value.is_empty() {
                            // xml:lang="" clears the inherited language
                            collected.language_cleared = true;
                        } else {
                            let value = value.to_ascii_lowercase();
                            LanguageTag::parse(value.as_str()).map_err(|e| {
                                self.error(format!("invalid xml:lang value: {e}"))
                            })?;
                            collected.language = Some(value);
                        }
                    }
                    b"xml:base" => {
                        collected.base = Some(self.attribute_value(&attribute)?);
                    }
                    _ => (), // other xml:* attributes are ignored
                }
                continue;
            }
            let name = self.resolve_attribute_name(key)?;
            let value = self.attribute_value(&attribute)?;
            match name.as_str() {
                RDF_ABOUT => collected.about = Some(value),
                RDF_ID => {
                    if !is_valid_xml_name(&value) {
                        return Err(
                            self.error(format!("rdf:ID {value:?} is not a valid XML name"))
                        );
                    }
                    collected.id = Some(value);
                }
                RDF_NODE_ID => {
                    if !is_valid_xml_name(&value) {
                        return Err(self
                            .error(format!("rdf:nodeID {value:?} is not a valid XML name")));
                    }
                    collected.node_id = Some(value);
                }
                RDF_RESOURCE => collected.resource = Some(value),
                RDF_DATATYPE => collected.datatype = Some(value),
                RDF_PARSE_TYPE => collected.parse_type = Some(value),
                RDF_ANNOTATION => collected.annotation = Some(value),
                RDF_ANNOTATION_NODE_ID => {
                    if !is_valid_xml_name(&value) {
                        return Err(self.error(format!(
                            "rdf:annotationNodeID {value:?} is not a valid XML name"
                        )));
                    }
                    collected.annotation_node_id = Some(value);
                }
                RDF_BAG_ID => {
                    if !is_valid_xml_name(&value) {
                        return Err(self
                            .error(format!("rdf:bagID {value:?} is not a valid XML name")));
                    }
                    return Err(self.error("rdf:bagID is not supported"));
                }
                RDF_LI => {
                    return Err(self.error("rdf:li is not allowed as an attribute"));
                }
                RDF_ABOUT_EACH | RDF_ABOUT_EACH_PREFIX => {
                    return Err(self.error(format!(
                        "{name} was removed from the RDF/XML language"
                    )));
                }
                RDF_RDF => {
                    return Err(self.error("rdf:RDF is not allowed as an attribute"));
                }
                "http://www.w3.org/1999/02/22-rdf-syntax-ns#type" => {
                    collected.type_attr = Some(value);
                }
                _ => {
                    collected
                        .property_attrs
                        .push((NamedNode::new_unchecked(name), value));
                }
            }
        }
        Ok(collected)
    }

    fn attribute_value(
        &self,
        attribute: &quick_xml::events::attributes::Attribute<'_>,
    ) -> Result<String, RdfParseError> {
        let value = self
            .reader
            .decoder()
            .decode(&attribute.value)
            .map_err(|e| self.error(format!("invalid attribute value: {e}")))?
            .into_owned();
        self.unescape(&value)
    }

    fn unescape(&self, value: &str) -> Result<String, RdfParseError> {
        quick_xml::escape::unescape_with(value, |entity| {
            self.custom_entities.get(entity).map(String::as_str)
        })
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| self.error(format!("invalid XML escape: {e}")))
    }

    fn resolve_tag_name(&self, qname: QName<'_>) -> Result<String, RdfParseError> {
        let (namespace, local_name) = self.reader.resolve_element(qname);
        self.resolve_ns_name(namespace, local_name)
    }

    fn resolve_attribute_name(&self, qname: QName<'_>) -> Result<String, RdfParseError> {
        let (namespace, local_name) = self.reader.resolve_attribute(qname);
        self.resolve_ns_name(namespace, local_name)
    }

    fn resolve_ns_name(
        &self,
        namespace: ResolveResult<'_>,
        local_name: LocalName<'_>,
    ) -> Result<String, RdfParseError> {
        match namespace {
            ResolveResult::Bound(ns) => {
                let mut name = Vec::with_capacity(ns.as_ref().len() + local_name.as_ref().len());
                name.extend_from_slice(ns.as_ref());
                name.extend_from_slice(local_name.as_ref());
                let name = self
                    .reader
                    .decoder()
                    .decode(&name)
                    .map_err(|e| self.error(format!("invalid element name: {e}")))?
                    .into_owned();
                self.unescape(&name)
            }
            ResolveResult::Unbound => {
                Err(self.error("XML namespaces are required in RDF/XML"))
            }
            ResolveResult::Unknown(prefix) => Err(self.error(format!(
                "unknown namespace prefix {:?}",
                String::from_utf8_lossy(&prefix)
            ))),
        }
    }

    fn current_base(&self) -> Option<&Iri<String>> {
        self.state.iter().rev().find_map(RdfXmlState::base_iri)
    }

    fn current_language(&self) -> Option<&String> {
        self.state.iter().rev().find_map(RdfXmlState::language)
    }

    fn resolve_base(&self, base: &str) -> Result<Iri<String>, RdfParseError> {
        let resolved = match self.current_base() {
            Some(current) => current
                .resolve(base)
                .map_err(|e| self.error(format!("invalid xml:base {base:?}: {e}")))?,
            None => Iri::parse(base.to_owned())
                .map_err(|e| self.error(format!("invalid xml:base {base:?}: {e}")))?,
        };
        Ok(resolved)
    }

    fn resolve_iri_against(
        &self,
        iri: &str,
        base: Option<&Iri<String>>,
    ) -> Result<NamedNode, RdfParseError> {
        if let Some(base) = base {
            return match base.resolve(iri) {
                Ok(resolved) => Ok(NamedNode::new_unchecked(resolved.into_inner())),
                Err(e) => {
                    if self.config.strict_iris() {
                        Err(self.error(format!("invalid IRI {iri:?}: {e}")))
                    } else {
                        Ok(NamedNode::new_unchecked(format!("{}{iri}", base.as_str())))
                    }
                }
            };
        }
        match Iri::parse(iri.to_owned()) {
            Ok(parsed) => Ok(NamedNode::new_unchecked(parsed.into_inner())),
            Err(e) => Err(self.error(format!(
                "invalid IRI {iri:?} (no base IRI is in scope): {e}"
            ))),
        }
    }

    /// `rdf:ID` expands to `base#id` and every expansion may be used once.
    fn resolve_rdf_id(
        &mut self,
        id: &str,
        base: Option<&Iri<String>>,
    ) -> Result<NamedNode, RdfParseError> {
        let expanded = self.resolve_iri_against(&format!("#{id}"), base)?;
        if !self.known_ids.insert(expanded.as_str().to_owned()) {
            return Err(self.error(format!("duplicate rdf:ID {id:?}")));
        }
        Ok(expanded)
    }

    fn make_literal(
        &self,
        text: String,
        datatype: Option<NamedNode>,
        language: Option<String>,
    ) -> Result<Literal, RdfParseError> {
        if let Some(datatype) = datatype {
            if datatype == rdf::LANG_STRING || datatype == rdf::DIR_LANG_STRING {
                return Err(self.error(format!(
                    "{} must not be used as an explicit literal datatype",
                    datatype.as_str()
                )));
            }
            return Ok(Literal::new_typed_literal(text, datatype));
        }
        Ok(literal_with_language(text, language.as_deref()))
    }

    fn error(&self, message: impl Into<String>) -> RdfParseError {
        RdfParseError::syntax(FORMAT, message)
    }

    fn map_xml_error(&self, error: quick_xml::Error) -> RdfParseError {
        match error {
            quick_xml::Error::Io(error) => {
                let error = std::sync::Arc::try_unwrap(error)
                    .unwrap_or_else(|e| std::io::Error::new(e.kind(), e.to_string()));
                RdfParseError::io(FORMAT, error)
            }
            error => RdfParseError::syntax(FORMAT, format!("invalid XML: {error}")),
        }
    }
}

#[derive(Default)]
struct CollectedAttributes {
    about: Option<String>,
    language_cleared: bool,
    id: Option<String>,
    node_id: Option<String>,
    resource: Option<String>,
    datatype: Option<String>,
    parse_type: Option<String>,
    annotation: Option<String>,
    annotation_node_id: Option<String>,
    type_attr: Option<String>,
    language: Option<String>,
    base: Option<String>,
    property_attrs: Vec<(NamedNode, String)>,
}

fn literal_with_language(value: String, language: Option<&str>) -> Literal {
    match language {
        Some(language) => Literal::new_language_tagged_literal_unchecked(value, language),
        None => Literal::new_simple_literal(value),
    }
}

/// Classic `rdf:ID` reification of a property element's triple.
fn reify(triple: &Triple, id: NamedNode, results: &mut Vec<Triple>) {
    let subject: Subject = id.into();
    results.push(Triple {
        subject: subject.clone(),
        predicate: rdf::TYPE.into(),
        object: Term::from(rdf::STATEMENT),
    });
    results.push(Triple {
        subject: subject.clone(),
        predicate: rdf::SUBJECT.into(),
        object: Term::from(triple.subject.clone()),
    });
    results.push(Triple {
        subject: subject.clone(),
        predicate: rdf::PREDICATE.into(),
        object: triple.predicate.clone().into(),
    });
    results.push(Triple {
        subject,
        predicate: rdf::OBJECT.into(),
        object: triple.object.clone(),
    });
}

/// `rdf:annotation`/`rdf:annotationNodeID`: the annotation subject reifies
/// the asserted triple as a triple term.
fn annotate(triple: &Triple, annotation: Subject, results: &mut Vec<Triple>) {
    results.push(Triple {
        subject: annotation,
        predicate: rdf::REIFIES.into(),
        object: triple.clone().into(),
    });
}

pub(crate) fn is_valid_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !is_name_start_char(first) {
        return false;
    }
    chars.all(is_name_char)
}

pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | '_' | 'A'..='Z' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c, '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}
