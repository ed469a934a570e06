use crate::FORMAT;
use crate::context::{ContextProcessor, JsonLdContext, TermDefinition, expand_iri};
use crate::document::DocumentLoader;
use crate::json::{JsonNode, read_json_tree};
use oxiri::Iri;
use rdfio_model::{
    BlankNode, BlankNodeGenerator, GraphName, Literal, NamedNode, ParserConfig, RdfParseError,
    Statement, Subject, Term, parse_language_tag,
    vocab::{rdf, xsd},
};
use std::collections::VecDeque;
use std::io::Read;
use std::sync::Arc;

/// A [JSON-LD](https://www.w3.org/TR/json-ld11/) parser covering a usable,
/// limit-checked subset: `@context` (inline, array and remote through an
/// injected [`DocumentLoader`]), `@id`, `@type`, `@graph`, `@list`, `@set`,
/// `@value`, `@language` and `@index`.
///
/// The whole document is buffered before triples are emitted; the buffered
/// size is bounded by the statement byte cap and nesting by the depth cap.
///
/// ```
/// use rdfio_model::vocab::rdf;
/// use rdfio_jsonld::JsonLdParser;
///
/// let file = br#"{
///     "@context": {"schema": "http://schema.org/"},
///     "@id": "http://example.com/foo",
///     "@type": "schema:Person",
///     "schema:name": "Foo"
/// }"#;
///
/// let statements = JsonLdParser::new()
///     .for_slice(file)
///     .collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(statements.len(), 2);
/// assert_eq!(statements[0].predicate, rdf::TYPE);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct JsonLdParser {
    config: ParserConfig,
    base: Option<Iri<String>>,
    loader: Option<Arc<dyn DocumentLoader + Send + Sync>>,
}

impl JsonLdParser {
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

    /// Sets the base IRI used until a `@base` context entry replaces it.
    pub fn with_base_iri(
        mut self,
        base_iri: impl Into<String>,
    ) -> Result<Self, rdfio_model::IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Injects the capability used to fetch remote `@context` documents.
    /// Without it, documents using remote contexts fail on first use.
    pub fn with_document_loader(
        mut self,
        loader: impl DocumentLoader + Send + Sync + 'static,
    ) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Parses from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderJsonLdParser<R> {
        ReaderJsonLdParser {
            source: Some(reader),
            config: self.config.normalized(),
            base: self.base,
            loader: self.loader,
            queue: VecDeque::new(),
            pending_error: None,
            emitted: 0,
        }
    }

    /// Parses from a byte slice.
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderJsonLdParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Iterates over the statements of a JSON-LD document.
///
/// Can be built using [`JsonLdParser::for_reader`] or
/// [`JsonLdParser::for_slice`].
#[must_use]
pub struct ReaderJsonLdParser<R: Read> {
    source: Option<R>,
    config: ParserConfig,
    base: Option<Iri<String>>,
    loader: Option<Arc<dyn DocumentLoader + Send + Sync>>,
    queue: VecDeque<Statement>,
    pending_error: Option<RdfParseError>,
    emitted: u64,
}

impl<R: Read> Iterator for ReaderJsonLdParser<R> {
    type Item = Result<Statement, RdfParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if !self.queue.is_empty() || self.pending_error.is_some() {
                if let Err(e) = self.config.check_cancelled(FORMAT) {
                    return Some(Err(e));
                }
            }
            if let Some(statement) = self.queue.pop_front() {
                if self.emitted >= self.config.max_statements() {
                    self.queue.clear();
                    self.pending_error = None;
                    return Some(Err(RdfParseError::statement_limit_exceeded(
                        FORMAT,
                        self.config.max_statements(),
                    )));
                }
                self.emitted += 1;
                return Some(Ok(statement));
            }
            if let Some(e) = self.pending_error.take() {
                return Some(Err(e));
            }
            let source = self.source.take()?;
            if let Err(e) = self.parse_document(source) {
                // Statements produced before the failure are delivered first.
                self.pending_error = Some(e);
            }
        }
    }
}

impl<R: Read> ReaderJsonLdParser<R> {
    fn parse_document(&mut self, source: R) -> Result<(), RdfParseError> {
        self.config.check_cancelled(FORMAT)?;
        let root = read_json_tree(source, &self.config)?;
        let mut context = JsonLdContext {
            base: self.base.clone(),
            ..JsonLdContext::default()
        };
        let mut walker = Walker {
            config: &self.config,
            loader: self.loader.as_ref(),
            generator: BlankNodeGenerator::new(),
            queue: &mut self.queue,
        };
        match &root {
            JsonNode::Array(nodes) => {
                for node in nodes {
                    walker.walk_node_value(node, &context, &GraphName::DefaultGraph, false)?;
                }
                Ok(())
            }
            JsonNode::Object(_) => {
                if let Some(value) = root.get("@context") {
                    walker.processor().process(&mut context, value)?;
                }
                walker.walk_node(&root, &context, &GraphName::DefaultGraph, None, true)?;
                Ok(())
            }
            _ => Err(RdfParseError::syntax(
                FORMAT,
                format!("a JSON-LD document must be an object or an array, found a {}", root.kind()),
            )),
        }
    }
}

struct Walker<'a> {
    config: &'a ParserConfig,
    loader: Option<&'a Arc<dyn DocumentLoader + Send + Sync>>,
    generator: BlankNodeGenerator,
    queue: &'a mut VecDeque<Statement>,
}

impl Walker<'_> {
    fn processor(&self) -> ContextProcessor<'_> {
        ContextProcessor {
            config: self.config,
            loader: self.loader,
        }
    }

    fn walk_node_value(
        &mut self,
        value: &JsonNode,
        context: &JsonLdContext,
        graph: &GraphName,
        at_root: bool,
    ) -> Result<(), RdfParseError> {
        match value {
            JsonNode::Object(_) => {
                self.walk_node(value, context, graph, None, at_root)?;
                Ok(())
            }
            JsonNode::Array(values) => {
                for value in values {
                    self.walk_node_value(value, context, graph, at_root)?;
                }
                Ok(())
            }
            _ => Err(RdfParseError::syntax(
                FORMAT,
                format!("expected a node object, found a {}", value.kind()),
            )),
        }
    }

    /// Emits the triples of one node object and returns its identifier.
    fn walk_node(
        &mut self,
        node: &JsonNode,
        parent_context: &JsonLdContext,
        graph: &GraphName,
        known_id: Option<Subject>,
        at_root: bool,
    ) -> Result<Subject, RdfParseError> {
        let JsonNode::Object(entries) = node else {
            return Err(RdfParseError::syntax(
                FORMAT,
                format!("expected a node object, found a {}", node.kind()),
            ));
        };
        let mut context = parent_context.clone();
        if !at_root {
            // At the document root the caller already applied the context.
            if let Some(value) = node.get("@context") {
                self.processor().process(&mut context, value)?;
            }
        }
        let id = match known_id {
            Some(id) => id,
            None => self.node_id(node, &context)?,
        };
        for (key, value) in entries {
            match key.as_str() {
                "@context" | "@id" | "@index" => (),
                "@type" => {
                    for value in as_array(value) {
                        let JsonNode::String(name) = value else {
                            // Non-string @type values are skipped.
                            continue;
                        };
                        let Some(iri) = self.expand_term(&context, name, false)? else {
                            continue;
                        };
                        self.queue.push_back(Statement {
                            subject: id.clone(),
                            predicate: rdf::TYPE.into(),
                            object: self.check_iri(iri)?.into(),
                            graph_name: graph.clone(),
                        });
                    }
                }
                "@graph" => {
                    let graph_name = if at_root && node.get("@id").is_none() {
                        GraphName::DefaultGraph
                    } else {
                        match &id {
                            Subject::NamedNode(node) => GraphName::NamedNode(node.clone()),
                            Subject::BlankNode(node) => GraphName::BlankNode(node.clone()),
                            Subject::Triple(_) => {
                                return Err(RdfParseError::syntax(
                                    FORMAT,
                                    "a triple term cannot name a graph",
                                ));
                            }
                        }
                    };
                    self.walk_node_value(value, &context, &graph_name, false)?;
                }
                "@value" | "@list" | "@set" | "@language" => {
                    return Err(RdfParseError::syntax(
                        FORMAT,
                        format!("{key} is not allowed in a node object"),
                    ));
                }
                _ if key.starts_with('@') => (), // unknown keywords are skipped
                _ => {
                    let Some(iri) = self.expand_term(&context, key, false)? else {
                        // No term definition and no @vocab: the key expands
                        // to nothing and its values are dropped.
                        continue;
                    };
                    let predicate = self.check_iri(iri)?;
                    let definition = context.terms.get(key.as_str()).cloned();
                    self.emit_values(&id, &predicate, value, &context, definition.as_ref(), graph)?;
                }
            }
        }
        Ok(id)
    }

    fn emit_values(
        &mut self,
        subject: &Subject,
        predicate: &NamedNode,
        value: &JsonNode,
        context: &JsonLdContext,
        definition: Option<&TermDefinition>,
        graph: &GraphName,
    ) -> Result<(), RdfParseError> {
        if let Some(list) = value.get("@list") {
            return self.emit_list(subject, predicate, as_array(list), context, definition, graph);
        }
        if let Some(set) = value.get("@set") {
            return self.emit_values(subject, predicate, set, context, definition, graph);
        }
        if definition.is_some_and(|d| d.list_container) {
            return self.emit_list(subject, predicate, as_array(value), context, definition, graph);
        }
        if let JsonNode::Array(values) = value {
            for value in values {
                self.emit_values(subject, predicate, value, context, definition, graph)?;
            }
            return Ok(());
        }
        let Some((term, nested)) = self.object_term(value, context, definition, graph)? else {
            return Ok(());
        };
        self.queue.push_back(Statement {
            subject: subject.clone(),
            predicate: predicate.clone(),
            object: term,
            graph_name: graph.clone(),
        });
        if let Some((node, id)) = nested {
            self.walk_node(node, context, graph, Some(id), false)?;
        }
        Ok(())
    }

    /// An `rdf:first`/`rdf:rest` chain in element order, primary triple
    /// first.
    fn emit_list(
        &mut self,
        subject: &Subject,
        predicate: &NamedNode,
        elements: &[JsonNode],
        context: &JsonLdContext,
        definition: Option<&TermDefinition>,
        graph: &GraphName,
    ) -> Result<(), RdfParseError> {
        let mut terms = Vec::new();
        let mut nested_nodes = Vec::new();
        for element in elements {
            if element.get("@list").is_some() || matches!(element, JsonNode::Array(_)) {
                return Err(RdfParseError::syntax(
                    FORMAT,
                    "lists of lists are not supported",
                ));
            }
            if let Some((term, nested)) = self.object_term(element, context, definition, graph)? {
                terms.push((term, nested_nodes.len()));
                if let Some(nested) = nested {
                    nested_nodes.push(Some(nested));
                } else {
                    nested_nodes.push(None);
                }
            }
        }
        if terms.is_empty() {
            self.queue.push_back(Statement {
                subject: subject.clone(),
                predicate: predicate.clone(),
                object: rdf::NIL.into(),
                graph_name: graph.clone(),
            });
            return Ok(());
        }
        let nodes: Vec<BlankNode> = terms.iter().map(|_| self.generator.next_node()).collect();
        self.queue.push_back(Statement {
            subject: subject.clone(),
            predicate: predicate.clone(),
            object: nodes[0].clone().into(),
            graph_name: graph.clone(),
        });
        for (i, ((term, nested_index), node)) in terms.into_iter().zip(&nodes).enumerate() {
            self.queue.push_back(Statement {
                subject: node.clone().into(),
                predicate: rdf::FIRST.into(),
                object: term,
                graph_name: graph.clone(),
            });
            if let Some(Some((nested, id))) = nested_nodes.get_mut(nested_index).map(Option::take)
            {
                self.walk_node(nested, context, graph, Some(id), false)?;
            }
            let rest: Term = match nodes.get(i + 1) {
                Some(next) => next.clone().into(),
                None => rdf::NIL.into(),
            };
            self.queue.push_back(Statement {
                subject: node.clone().into(),
                predicate: rdf::REST.into(),
                object: rest,
                graph_name: graph.clone(),
            });
        }
        Ok(())
    }

    /// The RDF term for one JSON value, plus the node object still to walk
    /// when the value was a nested node.
    #[allow(clippy::type_complexity)]
    fn object_term<'v>(
        &mut self,
        value: &'v JsonNode,
        context: &JsonLdContext,
        definition: Option<&TermDefinition>,
        _graph: &GraphName,
    ) -> Result<Option<(Term, Option<(&'v JsonNode, Subject)>)>, RdfParseError> {
        match value {
            JsonNode::Null => Ok(None),
            JsonNode::Boolean(value) => Ok(Some((
                Literal::new_typed_literal(value.to_string(), xsd::BOOLEAN).into(),
                None,
            ))),
            JsonNode::Number(value) => Ok(Some((number_literal(value).into(), None))),
            JsonNode::String(value) => {
                let definition_type = definition.and_then(|d| d.type_coercion.as_deref());
                if definition_type == Some("@id") {
                    let Some(iri) = self.expand_term(context, value, true)? else {
                        return Ok(None);
                    };
                    return Ok(Some((self.id_term(&iri)?, None)));
                }
                if let Some(datatype) = definition_type {
                    return Ok(Some((
                        Literal::new_typed_literal(
                            value.clone(),
                            NamedNode::new_unchecked(datatype),
                        )
                        .into(),
                        None,
                    )));
                }
                if let Some(Some(language)) = definition.and_then(|d| d.language.clone()) {
                    return Ok(Some((
                        self.language_literal(value.clone(), &language)?.into(),
                        None,
                    )));
                }
                Ok(Some((Literal::new_simple_literal(value.clone()).into(), None)))
            }
            JsonNode::Object(_) => {
                if value.get("@value").is_some() {
                    return Ok(self
                        .value_object_literal(value, context)?
                        .map(|literal| (literal.into(), None)));
                }
                let mut context = context.clone();
                if let Some(local) = value.get("@context") {
                    self.processor().process(&mut context, local)?;
                }
                let id = self.node_id(value, &context)?;
                Ok(Some((Term::from(id.clone()), Some((value, id)))))
            }
            JsonNode::Array(_) => Err(RdfParseError::syntax(
                FORMAT,
                "nested arrays are not allowed in value position",
            )),
        }
    }

    /// `@value` objects: optional `@language` (with a `--ltr`/`--rtl`
    /// suffix), `@type` or `@index`; `@index` yields no triple.
    fn value_object_literal(
        &mut self,
        value: &JsonNode,
        context: &JsonLdContext,
    ) -> Result<Option<Literal>, RdfParseError> {
        let JsonNode::Object(entries) = value else {
            unreachable!("checked by the caller")
        };
        let mut lexical: Option<String> = None;
        let mut language: Option<String> = None;
        let mut datatype: Option<String> = None;
        for (key, entry) in entries {
            match key.as_str() {
                "@value" => {
                    lexical = match entry {
                        JsonNode::String(value) => Some(value.clone()),
                        JsonNode::Number(value) => Some(value.clone()),
                        JsonNode::Boolean(value) => Some(value.to_string()),
                        JsonNode::Null => None,
                        _ => {
                            return Err(RdfParseError::syntax(
                                FORMAT,
                                format!("@value cannot hold a {}", entry.kind()),
                            ));
                        }
                    };
                }
                "@language" => {
                    language = match entry {
                        JsonNode::String(language) => Some(language.clone()),
                        JsonNode::Null => None,
                        _ => {
                            return Err(RdfParseError::syntax(
                                FORMAT,
                                format!("@language cannot hold a {}", entry.kind()),
                            ));
                        }
                    };
                }
                "@type" => {
                    datatype = match entry {
                        JsonNode::String(datatype) => {
                            self.expand_term(context, datatype, false)?
                        }
                        JsonNode::Null => None,
                        _ => {
                            return Err(RdfParseError::syntax(
                                FORMAT,
                                format!("@type cannot hold a {}", entry.kind()),
                            ));
                        }
                    };
                }
                "@index" => (), // not reflected as a triple
                _ => {
                    return Err(RdfParseError::syntax(
                        FORMAT,
                        format!("{key} is not allowed in a value object"),
                    ));
                }
            }
        }
        let Some(lexical) = lexical else {
            return Ok(None);
        };
        match (language, datatype) {
            (Some(_), Some(_)) => Err(RdfParseError::syntax(
                FORMAT,
                "@language and @type are mutually exclusive in a value object",
            )),
            (Some(language), None) => Ok(Some(self.language_literal(lexical, &language)?)),
            (None, Some(datatype)) => Ok(Some(Literal::new_typed_literal(
                lexical,
                NamedNode::new_unchecked(datatype),
            ))),
            (None, None) => Ok(Some(Literal::new_simple_literal(lexical))),
        }
    }

    fn language_literal(
        &self,
        value: String,
        language: &str,
    ) -> Result<Literal, RdfParseError> {
        let (language, direction) = parse_language_tag(language).map_err(|e| {
            RdfParseError::syntax(FORMAT, format!("invalid language tag {language:?}: {e}"))
        })?;
        Ok(match direction {
            Some(direction) => Literal::new_directional_language_tagged_literal_unchecked(
                value, language, direction,
            ),
            None => Literal::new_language_tagged_literal_unchecked(value, language),
        })
    }

    /// The node identifier: `@id` resolved against the context, or a fresh
    /// blank node.
    fn node_id(
        &mut self,
        node: &JsonNode,
        context: &JsonLdContext,
    ) -> Result<Subject, RdfParseError> {
        match node.get("@id") {
            None => Ok(self.generator.next_node().into()),
            Some(JsonNode::String(id)) => {
                if let Some(label) = id.strip_prefix("_:") {
                    return Ok(BlankNode::new_unchecked(label).into());
                }
                let Some(iri) = self.expand_term(context, id, true)? else {
                    return Err(RdfParseError::syntax(
                        FORMAT,
                        format!("cannot resolve the node @id {id:?}"),
                    ));
                };
                Ok(self.check_iri(iri)?.into())
            }
            Some(other) => Err(RdfParseError::syntax(
                FORMAT,
                format!("@id must be a string, found a {}", other.kind()),
            )),
        }
    }

    fn id_term(&mut self, iri: &str) -> Result<Term, RdfParseError> {
        if let Some(label) = iri.strip_prefix("_:") {
            return Ok(BlankNode::new_unchecked(label).into());
        }
        Ok(self.check_iri(iri.to_owned())?.into())
    }

    /// Expands a term or IRI reference, surfacing an error when resolution
    /// failed because a remote context was left unloaded.
    fn expand_term(
        &self,
        context: &JsonLdContext,
        value: &str,
        document_relative: bool,
    ) -> Result<Option<String>, RdfParseError> {
        if value.starts_with("_:") {
            return Ok(Some(value.to_owned()));
        }
        match expand_iri(context, value, document_relative) {
            Some(iri) => Ok(Some(iri)),
            None => {
                if let Some(remote) = &context.unresolved_remote {
                    return Err(RdfParseError::syntax(
                        FORMAT,
                        format!(
                            "cannot expand {value:?}: the remote context {remote:?} was not loaded (no document loader)"
                        ),
                    ));
                }
                Ok(None)
            }
        }
    }

    fn check_iri(&self, iri: String) -> Result<NamedNode, RdfParseError> {
        if self.config.strict_iris() {
            if let Err(e) = Iri::parse(iri.as_str()) {
                return Err(RdfParseError::syntax(
                    FORMAT,
                    format!("invalid IRI {iri:?}: {e}"),
                ));
            }
        }
        Ok(NamedNode::new_unchecked(iri))
    }
}

fn as_array(value: &JsonNode) -> &[JsonNode] {
    match value {
        JsonNode::Array(values) => values,
        _ => std::slice::from_ref(value),
    }
}

fn number_literal(value: &str) -> Literal {
    if value.contains(['.', 'e', 'E']) {
        Literal::new_typed_literal(value, xsd::DOUBLE)
    } else {
        Literal::new_typed_literal(value, xsd::INTEGER)
    }
}
