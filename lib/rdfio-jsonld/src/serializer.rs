use crate::json::JsonNode;
use json_event_parser::{JsonEvent, WriterJsonSerializer};
use oxiri::Iri;
use rdfio_model::vocab::xsd;
use rdfio_model::{
    GraphName, IriParseError, SinkState, Statement, Subject, Term, validate_statement,
};
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

/// A [JSON-LD](https://www.w3.org/TR/json-ld11/) push encoder.
///
/// Statements are buffered into an in-memory document (an `@graph` array
/// with one node object per subject, named graphs nested) and serialized
/// once on [`close`](WriterJsonLdSerializer::close).
///
/// ```
/// use rdfio_model::{NamedNode, Statement, vocab::rdf};
/// use rdfio_jsonld::JsonLdSerializer;
///
/// let mut serializer = JsonLdSerializer::new().for_writer(Vec::new());
/// serializer.write_statement(&Statement::new_triple(
///     NamedNode::new("http://example.com#me")?,
///     rdf::TYPE,
///     NamedNode::new("http://schema.org/Person")?,
/// ))?;
/// serializer.close()?;
/// let text = String::from_utf8(serializer.into_inner())?;
/// assert!(text.contains("\"@id\":\"http://example.com#me\""));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct JsonLdSerializer {
    prefixes: BTreeMap<String, String>,
    base: Option<Iri<String>>,
}

impl JsonLdSerializer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prefix to the written `@context`. Keys are not compacted; the
    /// context is informative for consumers.
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

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Writes to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterJsonLdSerializer<W> {
        WriterJsonLdSerializer {
            writer,
            prefixes: self.prefixes,
            base: self.base,
            buffer: Vec::new(),
            state: SinkState::new(),
        }
    }
}

/// Writes a JSON-LD file to a [`Write`] implementation.
///
/// Can be built using [`JsonLdSerializer::for_writer`].
pub struct WriterJsonLdSerializer<W: Write> {
    writer: W,
    prefixes: BTreeMap<String, String>,
    base: Option<Iri<String>>,
    buffer: Vec<Statement>,
    state: SinkState,
}

impl<W: Write> WriterJsonLdSerializer<W> {
    /// Buffers one statement for the document written at close.
    pub fn write_statement(&mut self, statement: &Statement) -> io::Result<()> {
        self.state.check_open()?;
        validate_statement(statement)?;
        if matches!(statement.subject, Subject::Triple(_))
            || matches!(statement.object, Term::Triple(_))
        {
            let error = io::Error::new(
                io::ErrorKind::InvalidInput,
                "quoted triples cannot be written in JSON-LD",
            );
            // Also cached: a lost statement must not go unnoticed.
            let result = self.state.record(Err(error));
            return result;
        }
        self.buffer.push(statement.clone());
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.state.check_open()?;
        let result = self.writer.flush();
        self.state.record(result)
    }

    /// Serializes the buffered document, flushes and closes the encoder.
    /// Later `write_statement`/`flush` calls fail; calling `close` again
    /// returns the cached error without side effects.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(result) = self.state.enter_close() {
            return result;
        }
        let result = self.write_document();
        self.state.record(result)
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_document(&mut self) -> io::Result<()> {
        let document = self.build_document();
        {
            let mut serializer = WriterJsonSerializer::new(&mut self.writer);
            write_json(&document, &mut serializer)?;
        }
        self.writer.flush()
    }

    fn build_document(&mut self) -> JsonNode {
        // Group by graph, then by subject, in first-appearance order.
        let mut graph_order: Vec<GraphName> = Vec::new();
        let mut graphs: HashMap<String, Vec<(String, Vec<(String, Vec<JsonNode>)>)>> =
            HashMap::new();
        for statement in self.buffer.drain(..) {
            let graph_key = graph_id(&statement.graph_name);
            if !graphs.contains_key(&graph_key) {
                graph_order.push(statement.graph_name.clone());
                graphs.insert(graph_key.clone(), Vec::new());
            }
            let nodes = graphs
                .get_mut(&graph_key)
                .unwrap_or_else(|| unreachable!("inserted above"));
            let subject_id = subject_id(&statement.subject);
            let node = match nodes.iter_mut().find(|(id, _)| *id == subject_id) {
                Some((_, node)) => node,
                None => {
                    nodes.push((subject_id, Vec::new()));
                    &mut nodes
                        .last_mut()
                        .unwrap_or_else(|| unreachable!("pushed above"))
                        .1
                }
            };
            let predicate = statement.predicate.as_str().to_owned();
            let value = term_value(&statement.object);
            match node.iter_mut().find(|(p, _)| *p == predicate) {
                Some((_, values)) => values.push(value),
                None => node.push((predicate, vec![value])),
            }
        }

        let mut top_level = Vec::new();
        for graph_name in graph_order {
            let graph_key = graph_id(&graph_name);
            let nodes = graphs
                .remove(&graph_key)
                .unwrap_or_else(|| unreachable!("grouped above"));
            let rendered: Vec<JsonNode> = nodes.into_iter().map(render_node).collect();
            match graph_name {
                GraphName::DefaultGraph => top_level.extend(rendered),
                _ => top_level.push(JsonNode::Object(vec![
                    ("@id".to_owned(), JsonNode::String(graph_key)),
                    ("@graph".to_owned(), JsonNode::Array(rendered)),
                ])),
            }
        }

        let mut document = Vec::new();
        if !self.prefixes.is_empty() || self.base.is_some() {
            let mut context = Vec::new();
            if let Some(base) = &self.base {
                context.push(("@base".to_owned(), JsonNode::String(base.as_str().to_owned())));
            }
            for (name, iri) in &self.prefixes {
                context.push((name.clone(), JsonNode::String(iri.clone())));
            }
            document.push(("@context".to_owned(), JsonNode::Object(context)));
        }
        document.push(("@graph".to_owned(), JsonNode::Array(top_level)));
        JsonNode::Object(document)
    }
}

fn render_node(node: (String, Vec<(String, Vec<JsonNode>)>)) -> JsonNode {
    let (id, properties) = node;
    let mut entries = vec![("@id".to_owned(), JsonNode::String(id))];
    for (predicate, values) in properties {
        entries.push((predicate, JsonNode::Array(values)));
    }
    JsonNode::Object(entries)
}

fn graph_id(graph_name: &GraphName) -> String {
    match graph_name {
        GraphName::NamedNode(node) => node.as_str().to_owned(),
        GraphName::BlankNode(node) => format!("_:{}", node.as_str()),
        GraphName::DefaultGraph => String::new(),
    }
}

fn subject_id(subject: &Subject) -> String {
    match subject {
        Subject::NamedNode(node) => node.as_str().to_owned(),
        Subject::BlankNode(node) => format!("_:{}", node.as_str()),
        Subject::Triple(_) => unreachable!("rejected by write_statement"),
    }
}

fn term_value(term: &Term) -> JsonNode {
    match term {
        Term::NamedNode(node) => JsonNode::Object(vec![(
            "@id".to_owned(),
            JsonNode::String(node.as_str().to_owned()),
        )]),
        Term::BlankNode(node) => JsonNode::Object(vec![(
            "@id".to_owned(),
            JsonNode::String(format!("_:{}", node.as_str())),
        )]),
        Term::Literal(literal) => {
            let mut entries = vec![(
                "@value".to_owned(),
                JsonNode::String(literal.value().to_owned()),
            )];
            if let Some(language) = literal.language() {
                let tag = match literal.direction() {
                    Some(direction) => format!("{language}--{direction}"),
                    None => language.to_owned(),
                };
                entries.push(("@language".to_owned(), JsonNode::String(tag)));
            } else if literal.datatype() != xsd::STRING {
                entries.push((
                    "@type".to_owned(),
                    JsonNode::String(literal.datatype().as_str().to_owned()),
                ));
            }
            JsonNode::Object(entries)
        }
        Term::Triple(_) => unreachable!("rejected by write_statement"),
    }
}

fn write_json<W: Write>(
    node: &JsonNode,
    serializer: &mut WriterJsonSerializer<W>,
) -> io::Result<()> {
    match node {
        JsonNode::Null => serializer.serialize_event(JsonEvent::Null),
        JsonNode::Boolean(value) => serializer.serialize_event(JsonEvent::Boolean(*value)),
        JsonNode::Number(value) => {
            serializer.serialize_event(JsonEvent::Number(value.as_str().into()))
        }
        JsonNode::String(value) => {
            serializer.serialize_event(JsonEvent::String(value.as_str().into()))
        }
        JsonNode::Array(values) => {
            serializer.serialize_event(JsonEvent::StartArray)?;
            for value in values {
                write_json(value, serializer)?;
            }
            serializer.serialize_event(JsonEvent::EndArray)
        }
        JsonNode::Object(entries) => {
            serializer.serialize_event(JsonEvent::StartObject)?;
            for (key, value) in entries {
                serializer.serialize_event(JsonEvent::ObjectKey(key.as_str().into()))?;
                write_json(value, serializer)?;
            }
            serializer.serialize_event(JsonEvent::EndObject)
        }
    }
}
