use crate::FORMAT;
use crate::document::DocumentLoader;
use crate::json::{JsonNode, read_json_slice};
use oxiri::Iri;
use rdfio_model::{ParserConfig, RdfParseError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Remote contexts may reference further remote contexts; recursion is capped
/// to terminate adversarial chains.
const MAX_CONTEXT_RECURSION: usize = 8;

/// The active context: term definitions plus `@vocab` and `@base`.
#[derive(Debug, Clone, Default)]
pub(crate) struct JsonLdContext {
    pub base: Option<Iri<String>>,
    pub vocab: Option<String>,
    pub terms: HashMap<String, TermDefinition>,
    /// A remote context could not be fetched (no loader); term resolution
    /// failures report it instead of silently dropping keys.
    pub unresolved_remote: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct TermDefinition {
    pub iri: String,
    /// `@type` coercion: `"@id"` or a datatype IRI.
    pub type_coercion: Option<String>,
    /// `@container: "@list"` wraps values into an RDF list.
    pub list_container: bool,
    /// Term-scoped default language (`None` inside the option clears it).
    pub language: Option<Option<String>>,
}

pub(crate) struct ContextProcessor<'a> {
    pub config: &'a ParserConfig,
    pub loader: Option<&'a Arc<dyn DocumentLoader + Send + Sync>>,
}

impl ContextProcessor<'_> {
    /// Applies a `@context` value (inline object, array merged left to right,
    /// or remote IRI string) on top of `context`.
    pub fn process(
        &self,
        context: &mut JsonLdContext,
        value: &JsonNode,
    ) -> Result<(), RdfParseError> {
        let mut visited = HashSet::new();
        self.process_value(context, value, 0, &mut visited)
    }

    fn process_value(
        &self,
        context: &mut JsonLdContext,
        value: &JsonNode,
        depth: usize,
        visited: &mut HashSet<String>,
    ) -> Result<(), RdfParseError> {
        if depth > MAX_CONTEXT_RECURSION {
            return Err(RdfParseError::syntax(
                FORMAT,
                format!("remote @context recursion deeper than {MAX_CONTEXT_RECURSION}"),
            ));
        }
        match value {
            JsonNode::Null => {
                *context = JsonLdContext::default();
                Ok(())
            }
            JsonNode::Array(values) => {
                for value in values {
                    self.process_value(context, value, depth, visited)?;
                }
                Ok(())
            }
            JsonNode::String(iri) => self.process_remote(context, iri, depth, visited),
            JsonNode::Object(entries) => {
                for (key, value) in entries {
                    self.process_entry(context, key, value)?;
                }
                Ok(())
            }
            JsonNode::Number(_) | JsonNode::Boolean(_) => Err(RdfParseError::syntax(
                FORMAT,
                format!("a @context cannot be a {}", value.kind()),
            )),
        }
    }

    fn process_remote(
        &self,
        context: &mut JsonLdContext,
        iri: &str,
        depth: usize,
        visited: &mut HashSet<String>,
    ) -> Result<(), RdfParseError> {
        if !visited.insert(iri.to_owned()) {
            // Already merged on this resolution path.
            return Ok(());
        }
        let Some(loader) = self.loader else {
            context.unresolved_remote = Some(iri.to_owned());
            return Ok(());
        };
        let document = loader
            .load_document(iri, self.config.cancellation())
            .map_err(|e| {
                RdfParseError::syntax(FORMAT, format!("cannot load the remote context {iri:?}: {e}"))
            })?;
        let root = read_json_slice(&document.document, self.config)?;
        // Either a `{"@context": …}` wrapper or directly the context object.
        let remote_context = root.get("@context").unwrap_or(&root);
        self.process_value(context, remote_context, depth + 1, visited)
    }

    fn process_entry(
        &self,
        context: &mut JsonLdContext,
        key: &str,
        value: &JsonNode,
    ) -> Result<(), RdfParseError> {
        match key {
            "@vocab" => {
                context.vocab = match value {
                    JsonNode::Null => None,
                    JsonNode::String(vocab) => Some(vocab.clone()),
                    _ => {
                        return Err(RdfParseError::syntax(
                            FORMAT,
                            format!("@vocab must be a string, found a {}", value.kind()),
                        ));
                    }
                };
                Ok(())
            }
            "@base" => {
                context.base = match value {
                    JsonNode::Null => None,
                    JsonNode::String(base) => Some(Iri::parse(base.clone()).map_err(|e| {
                        RdfParseError::syntax(FORMAT, format!("invalid @base {base:?}: {e}"))
                    })?),
                    _ => {
                        return Err(RdfParseError::syntax(
                            FORMAT,
                            format!("@base must be a string, found a {}", value.kind()),
                        ));
                    }
                };
                Ok(())
            }
            "@language" | "@version" | "@direction" | "@propagate" | "@protected" => Ok(()),
            _ if key.starts_with('@') => Err(RdfParseError::syntax(
                FORMAT,
                format!("unsupported context keyword {key}"),
            )),
            _ => {
                match value {
                    JsonNode::Null => {
                        context.terms.remove(key);
                    }
                    JsonNode::String(iri) => {
                        let iri = self.expand_definition_iri(context, iri)?;
                        context.terms.insert(
                            key.to_owned(),
                            TermDefinition {
                                iri,
                                type_coercion: None,
                                list_container: false,
                                language: None,
                            },
                        );
                    }
                    JsonNode::Object(_) => {
                        let id = match value.get("@id") {
                            Some(JsonNode::String(id)) => id.clone(),
                            None => key.to_owned(),
                            Some(other) => {
                                return Err(RdfParseError::syntax(
                                    FORMAT,
                                    format!("@id must be a string, found a {}", other.kind()),
                                ));
                            }
                        };
                        let iri = self.expand_definition_iri(context, &id)?;
                        let type_coercion = match value.get("@type") {
                            Some(JsonNode::String(t)) => Some(if t == "@id" {
                                t.clone()
                            } else {
                                self.expand_definition_iri(context, t)?
                            }),
                            None => None,
                            Some(other) => {
                                return Err(RdfParseError::syntax(
                                    FORMAT,
                                    format!("@type must be a string, found a {}", other.kind()),
                                ));
                            }
                        };
                        let list_container = matches!(
                            value.get("@container").and_then(JsonNode::as_str),
                            Some("@list")
                        );
                        let language = match value.get("@language") {
                            Some(JsonNode::String(language)) => {
                                Some(Some(language.to_ascii_lowercase()))
                            }
                            Some(JsonNode::Null) => Some(None),
                            None => None,
                            Some(other) => {
                                return Err(RdfParseError::syntax(
                                    FORMAT,
                                    format!(
                                        "@language must be a string or null, found a {}",
                                        other.kind()
                                    ),
                                ));
                            }
                        };
                        context.terms.insert(
                            key.to_owned(),
                            TermDefinition {
                                iri,
                                type_coercion,
                                list_container,
                                language,
                            },
                        );
                    }
                    _ => {
                        return Err(RdfParseError::syntax(
                            FORMAT,
                            format!(
                                "a term definition must be a string or an object, found a {}",
                                value.kind()
                            ),
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    /// Expands the IRI of a term definition against already-known terms,
    /// compact IRIs and `@vocab`.
    fn expand_definition_iri(
        &self,
        context: &JsonLdContext,
        value: &str,
    ) -> Result<String, RdfParseError> {
        expand_iri(context, value, false).ok_or_else(|| {
            RdfParseError::syntax(FORMAT, format!("cannot expand the term definition {value:?}"))
        })
    }
}

/// Expands a term, compact IRI or IRI reference against the active context.
///
/// `document_relative` is set for `@id`-position values, which resolve
/// against `@base` instead of `@vocab`.
pub(crate) fn expand_iri(
    context: &JsonLdContext,
    value: &str,
    document_relative: bool,
) -> Option<String> {
    if value.starts_with('@') {
        return None;
    }
    if let Some(definition) = context.terms.get(value) {
        return Some(definition.iri.clone());
    }
    if let Some((prefix, suffix)) = value.split_once(':') {
        if !suffix.starts_with("//") {
            if let Some(definition) = context.terms.get(prefix) {
                return Some(format!("{}{suffix}", definition.iri));
            }
        }
        // A scheme-shaped name is used as-is.
        return Some(value.to_owned());
    }
    if document_relative {
        if let Some(base) = &context.base {
            if let Ok(resolved) = base.resolve(value) {
                return Some(resolved.into_inner());
            }
        }
        return None;
    }
    context
        .vocab
        .as_ref()
        .map(|vocab| format!("{vocab}{value}"))
}
