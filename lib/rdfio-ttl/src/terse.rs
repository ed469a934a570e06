//! Shared parser implementation for Turtle and TriG.
//!
//! Parsing runs in two stages: the [`StatementBuffer`] accumulates one
//! logical statement worth of physical lines, then a [`Cursor`] pass over
//! that text applies the grammar and enqueues the resulting statements. A
//! single input statement can expand to many emitted statements (collections,
//! blank node property lists, annotations); those drain from the queue one
//! per pull in document order, primary asserted statement first.

use crate::toolkit::{
    Cursor, LineReader, StatementBuffer, is_pn_chars, is_pn_chars_base, resolve_iri,
};
use oxiri::Iri;
use rdfio_model::{
    BlankNode, BlankNodeGenerator, GraphName, Literal, NamedNode, ParserConfig, RdfParseError,
    Statement, Subject, Term, Triple, parse_language_tag,
    vocab::{rdf, xsd},
};
use std::collections::{HashMap, VecDeque};
use std::io::Read;

pub struct TerseParserCore<R: Read> {
    reader: LineReader<R>,
    buffer: StatementBuffer,
    state: TerseState,
    queue: VecDeque<Statement>,
    pending_error: Option<RdfParseError>,
    emitted: u64,
    done: bool,
}

pub(crate) struct TerseState {
    config: ParserConfig,
    format: &'static str,
    trig: bool,
    base: Option<Iri<String>>,
    prefixes: HashMap<String, String>,
    generator: BlankNodeGenerator,
    quoted_triple_statements: bool,
}

impl<R: Read> TerseParserCore<R> {
    pub fn new(
        reader: R,
        config: ParserConfig,
        format: &'static str,
        trig: bool,
        base: Option<Iri<String>>,
        prefixes: HashMap<String, String>,
    ) -> Self {
        let config = config.normalized();
        Self {
            reader: LineReader::new(reader, format, &config),
            buffer: StatementBuffer::new(),
            queue: VecDeque::new(),
            pending_error: None,
            emitted: 0,
            done: false,
            state: TerseState {
                quoted_triple_statements: config.quoted_triple_statements(),
                config,
                format,
                trig,
                base,
                prefixes,
                generator: BlankNodeGenerator::new(),
            },
        }
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.state
            .prefixes
            .iter()
            .map(|(name, iri)| (name.as_str(), iri.as_str()))
    }

    pub fn base_iri(&self) -> Option<&str> {
        self.state.base.as_ref().map(Iri::as_str)
    }

    pub fn parse_next(&mut self) -> Option<Result<Statement, RdfParseError>> {
        loop {
            if !self.queue.is_empty() || self.pending_error.is_some() {
                if let Err(e) = self.state.config.check_cancelled(self.state.format) {
                    return Some(Err(e));
                }
            }
            if let Some(statement) = self.queue.pop_front() {
                if self.emitted >= self.state.config.max_statements() {
                    self.done = true;
                    self.queue.clear();
                    return Some(Err(RdfParseError::statement_limit_exceeded(
                        self.state.format,
                        self.state.config.max_statements(),
                    )));
                }
                self.emitted += 1;
                return Some(Ok(statement));
            }
            if let Some(e) = self.pending_error.take() {
                self.done = true;
                return Some(Err(e));
            }
            if self.done {
                return None;
            }
            match self.read_chunk() {
                Ok(Some(chunk)) => self.parse_chunk(&chunk.text, chunk.first_line, chunk.offset),
                Ok(None) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }

    fn read_chunk(&mut self) -> Result<Option<Chunk>, RdfParseError> {
        loop {
            if !self.reader.advance(&self.state.config)? {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_chunk()));
            }
            let line = self.reader.line()?;
            if self.buffer.is_empty() {
                let trimmed = line.trim_start();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                self.buffer
                    .start(self.reader.line_number(), self.reader.line_offset());
            }
            let complete = self.buffer.push_line(
                line,
                self.state.config.max_statement_bytes(),
                self.state.format,
            )?;
            if complete || self.buffer.is_complete_bare_directive() {
                return Ok(Some(self.take_chunk()));
            }
        }
    }

    fn take_chunk(&mut self) -> Chunk {
        Chunk {
            first_line: self.buffer.first_line(),
            offset: self.buffer.start_offset(),
            text: self.buffer.take(),
        }
    }

    fn parse_chunk(&mut self, text: &str, first_line: u64, offset: u64) {
        let debug_statements = self.state.config.debug_statements();
        let mut parser = ChunkParser {
            cursor: Cursor::new(text, self.state.format, first_line, offset),
            state: &mut self.state,
            queue: &mut self.queue,
            depth: 0,
        };
        loop {
            if parser.cursor.at_end() {
                return;
            }
            if let Err(e) = parser.parse_statement() {
                self.pending_error = Some(if debug_statements {
                    e.with_statement(text.trim())
                } else {
                    e
                });
                return;
            }
        }
    }
}

struct Chunk {
    text: String,
    first_line: u64,
    offset: u64,
}

enum SubjectForm {
    Plain,
    PropertyList,
    QuotedTriple,
}

struct ChunkParser<'a, 'b> {
    cursor: Cursor<'b>,
    state: &'a mut TerseState,
    queue: &'a mut VecDeque<Statement>,
    depth: usize,
}

impl ChunkParser<'_, '_> {
    fn parse_statement(&mut self) -> Result<(), RdfParseError> {
        self.cursor.skip_whitespace();
        if self.cursor.eat(b'@') {
            let keyword = self.read_word();
            return match keyword.to_ascii_lowercase().as_str() {
                "prefix" => self.parse_prefix_directive(true),
                "base" => self.parse_base_directive(true),
                "version" => self.parse_version_directive(true),
                _ => Err(self.cursor.error(format!("unknown directive @{keyword}"))),
            };
        }
        if let Some(keyword) = self.peek_bare_directive() {
            self.skip_word();
            return match keyword {
                "prefix" => self.parse_prefix_directive(false),
                "base" => self.parse_base_directive(false),
                "version" => self.parse_version_directive(false),
                _ => unreachable!("peek_bare_directive only returns directive keywords"),
            };
        }
        if self.cursor.peek() == Some(b'{') {
            if !self.state.trig {
                return Err(self
                    .cursor
                    .error("graph blocks are only allowed in TriG"));
            }
            return self.parse_graph_block(GraphName::DefaultGraph);
        }
        if self.state.trig && self.peek_graph_keyword() {
            self.skip_word();
            self.cursor.skip_whitespace();
            let graph_name = self.parse_graph_name()?;
            self.cursor.skip_whitespace();
            return self.parse_graph_block(graph_name);
        }
        let mut deferred = Vec::new();
        let (subject, form) = self.parse_subject(&mut deferred, &GraphName::DefaultGraph)?;
        self.cursor.skip_whitespace();
        if self.state.trig && self.cursor.peek() == Some(b'{') {
            if !deferred.is_empty() {
                return Err(self
                    .cursor
                    .error("a graph label must be an IRI or a plain blank node"));
            }
            let graph_name = match subject {
                Subject::NamedNode(node) => GraphName::NamedNode(node),
                Subject::BlankNode(node) => GraphName::BlankNode(node),
                Subject::Triple(_) => {
                    return Err(self
                        .cursor
                        .error("a quoted triple cannot name a graph"));
                }
            };
            return self.parse_graph_block(graph_name);
        }
        let mut out = Vec::new();
        self.parse_triples_tail(subject, form, deferred, &GraphName::DefaultGraph, &mut out)?;
        self.cursor.skip_whitespace();
        self.cursor.expect(b'.', "'.' at the end of the statement")?;
        self.queue.extend(out);
        Ok(())
    }

    /// The remainder of one `triples` production once the subject is known:
    /// the predicate-object list or the subject-standalone forms.
    fn parse_triples_tail(
        &mut self,
        subject: Subject,
        form: SubjectForm,
        deferred: Vec<Statement>,
        graph: &GraphName,
        out: &mut Vec<Statement>,
    ) -> Result<(), RdfParseError> {
        self.cursor.skip_whitespace();
        let at_statement_end = matches!(self.cursor.peek(), None | Some(b'.' | b'}'));
        if at_statement_end {
            return match form {
                SubjectForm::PropertyList => {
                    // `[ p o ] .` asserts only the expanded triples.
                    out.extend(deferred);
                    Ok(())
                }
                SubjectForm::QuotedTriple => {
                    if !self.quoted_triple_statements_allowed() {
                        return Err(self.cursor.error(
                            "a quoted triple is not allowed as a statement (requires version 1.2)",
                        ));
                    }
                    let Subject::Triple(triple) = subject else {
                        unreachable!("QuotedTriple form always carries a triple subject")
                    };
                    out.push((*triple).in_graph(graph.clone()));
                    out.extend(deferred);
                    Ok(())
                }
                SubjectForm::Plain => {
                    Err(self.cursor.error("expected a predicate after the subject"))
                }
            };
        }
        self.parse_predicate_object_list(&subject, graph, out, Some(deferred), ListEnd::Statement)
    }

    fn quoted_triple_statements_allowed(&self) -> bool {
        self.state.quoted_triple_statements
    }

    fn parse_graph_block(&mut self, graph: GraphName) -> Result<(), RdfParseError> {
        self.cursor.expect(b'{', "'{' to open the graph block")?;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.eat(b'}') {
                return Ok(());
            }
            if self.cursor.peek().is_none() {
                return Err(self.cursor.error("unclosed graph block: missing '}'"));
            }
            if self.cursor.peek() == Some(b'@') || self.peek_bare_directive().is_some() {
                return Err(self
                    .cursor
                    .error("directives are not allowed inside graph blocks"));
            }
            if self.cursor.peek() == Some(b'{') {
                return Err(self.cursor.error("graph blocks cannot be nested"));
            }
            let mut deferred = Vec::new();
            let (subject, form) = self.parse_subject(&mut deferred, &graph)?;
            let mut out = Vec::new();
            self.parse_triples_tail(subject, form, deferred, &graph, &mut out)?;
            self.queue.extend(out);
            self.cursor.skip_whitespace();
            if self.cursor.eat(b'.') {
                continue;
            }
            if self.cursor.peek() != Some(b'}') {
                return Err(self
                    .cursor
                    .error("expected '.' or '}' after a statement in a graph block"));
            }
        }
    }

    fn parse_predicate_object_list(
        &mut self,
        subject: &Subject,
        graph: &GraphName,
        out: &mut Vec<Statement>,
        mut pending_subject: Option<Vec<Statement>>,
        end: ListEnd,
    ) -> Result<(), RdfParseError> {
        loop {
            self.cursor.skip_whitespace();
            let predicate = self.parse_verb()?;
            loop {
                self.cursor.skip_whitespace();
                let mut sub = Vec::new();
                let object = self.parse_object(&mut sub, graph)?;
                let triple = Triple {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object,
                };
                out.push(triple.clone().in_graph(graph.clone()));
                if let Some(deferred) = pending_subject.take() {
                    out.extend(deferred);
                }
                out.extend(sub);
                self.parse_annotations(&triple, graph, out)?;
                self.cursor.skip_whitespace();
                if !self.cursor.eat(b',') {
                    break;
                }
            }
            self.cursor.skip_whitespace();
            if !self.cursor.eat(b';') {
                return Ok(());
            }
            // Trailing and repeated ';' are tolerated.
            loop {
                self.cursor.skip_whitespace();
                if !self.cursor.eat(b';') {
                    break;
                }
            }
            if end.at_end(&mut self.cursor) {
                return Ok(());
            }
        }
    }

    /// `~ reifier` and `{| … |}` annotations on the just-asserted triple.
    fn parse_annotations(
        &mut self,
        triple: &Triple,
        graph: &GraphName,
        out: &mut Vec<Statement>,
    ) -> Result<(), RdfParseError> {
        let mut reifier: Option<Subject> = None;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.eat(b'~') {
                self.cursor.skip_whitespace();
                let node: Subject = match self.cursor.peek() {
                    Some(b'<') if !self.cursor.starts_with("<<") => {
                        let iri = self.cursor.read_iriref()?;
                        resolve_iri(
                            self.state.base.as_ref(),
                            &iri,
                            &self.state.config,
                            &self.cursor,
                        )?
                        .into()
                    }
                    Some(b'_') => self.parse_blank_node_label()?.into(),
                    Some(c)
                        if c == b':'
                            || is_pn_chars_base(
                                self.cursor.peek_char().unwrap_or('\0'),
                            ) =>
                    {
                        self.parse_prefixed_name()?.into()
                    }
                    _ => self.state.generator.next_node().into(),
                };
                out.push(Statement {
                    subject: node.clone(),
                    predicate: rdf::REIFIES.into(),
                    object: triple.clone().into(),
                    graph_name: graph.clone(),
                });
                reifier = Some(node);
            } else if self.cursor.starts_with("{|") {
                self.cursor.eat_str("{|");
                let node = match reifier.take() {
                    Some(node) => node,
                    None => {
                        let node: Subject = self.state.generator.next_node().into();
                        out.push(Statement {
                            subject: node.clone(),
                            predicate: rdf::REIFIES.into(),
                            object: triple.clone().into(),
                            graph_name: graph.clone(),
                        });
                        node
                    }
                };
                self.parse_predicate_object_list(&node, graph, out, None, ListEnd::Annotation)?;
                self.cursor.skip_whitespace();
                if !self.cursor.eat_str("|}") {
                    return Err(self
                        .cursor
                        .error("expected '|}' to close the annotation block"));
                }
            } else {
                return Ok(());
            }
        }
    }

    fn parse_subject(
        &mut self,
        deferred: &mut Vec<Statement>,
        graph: &GraphName,
    ) -> Result<(Subject, SubjectForm), RdfParseError> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            Some(b'<') if self.cursor.starts_with("<<") => Ok((
                self.parse_quoted_triple(deferred, graph)?.into(),
                SubjectForm::QuotedTriple,
            )),
            Some(b'<') => {
                let iri = self.cursor.read_iriref()?;
                Ok((
                    resolve_iri(
                        self.state.base.as_ref(),
                        &iri,
                        &self.state.config,
                        &self.cursor,
                    )?
                    .into(),
                    SubjectForm::Plain,
                ))
            }
            Some(b'_') => Ok((self.parse_blank_node_label()?.into(), SubjectForm::Plain)),
            Some(b'[') => Ok((
                self.parse_blank_node_property_list(deferred, graph)?.into(),
                SubjectForm::PropertyList,
            )),
            Some(b'(') => {
                let term = self.parse_collection(deferred, graph)?;
                let subject = term
                    .try_into_subject()
                    .unwrap_or_else(|| unreachable!("collections never yield literals"));
                Ok((subject, SubjectForm::Plain))
            }
            Some(_) => Ok((self.parse_prefixed_name()?.into(), SubjectForm::Plain)),
            None => Err(self.cursor.error("expected a subject")),
        }
    }

    fn parse_verb(&mut self) -> Result<NamedNode, RdfParseError> {
        if self.cursor.peek() == Some(b'a') && !self.word_continues_at(1) {
            self.cursor.bump_ascii();
            return Ok(rdf::TYPE.into());
        }
        match self.cursor.peek() {
            Some(b'<') => {
                let iri = self.cursor.read_iriref()?;
                resolve_iri(
                    self.state.base.as_ref(),
                    &iri,
                    &self.state.config,
                    &self.cursor,
                )
            }
            Some(_) => self.parse_prefixed_name(),
            None => Err(self.cursor.error("expected a predicate")),
        }
    }

    fn parse_object(
        &mut self,
        deferred: &mut Vec<Statement>,
        graph: &GraphName,
    ) -> Result<Term, RdfParseError> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            Some(b'<') if self.cursor.starts_with("<<") => {
                Ok(self.parse_quoted_triple(deferred, graph)?.into())
            }
            Some(b'<') => {
                let iri = self.cursor.read_iriref()?;
                Ok(resolve_iri(
                    self.state.base.as_ref(),
                    &iri,
                    &self.state.config,
                    &self.cursor,
                )?
                .into())
            }
            Some(b'_') => Ok(self.parse_blank_node_label()?.into()),
            Some(b'[') => Ok(self
                .parse_blank_node_property_list(deferred, graph)?
                .into()),
            Some(b'(') => self.parse_collection(deferred, graph),
            Some(b'"' | b'\'') => Ok(self.parse_string_literal()?.into()),
            Some(b'+' | b'-' | b'0'..=b'9') => Ok(self.parse_numeric_literal()?.into()),
            Some(b'.') if matches!(self.cursor.peek_at(1), Some(b'0'..=b'9')) => {
                Ok(self.parse_numeric_literal()?.into())
            }
            Some(b't') if self.keyword_ahead("true") => {
                self.skip_word();
                Ok(Literal::new_typed_literal("true", xsd::BOOLEAN).into())
            }
            Some(b'f') if self.keyword_ahead("false") => {
                self.skip_word();
                Ok(Literal::new_typed_literal("false", xsd::BOOLEAN).into())
            }
            Some(_) => Ok(self.parse_prefixed_name()?.into()),
            None => Err(self.cursor.error("expected an object")),
        }
    }

    fn parse_quoted_triple(
        &mut self,
        deferred: &mut Vec<Statement>,
        graph: &GraphName,
    ) -> Result<Triple, RdfParseError> {
        self.enter_nesting()?;
        let term_form = self.cursor.eat_str("<<(");
        if !term_form && !self.cursor.eat_str("<<") {
            return Err(self.cursor.error("expected '<<' to start a quoted triple"));
        }
        let (subject, _) = self.parse_subject(deferred, graph)?;
        self.cursor.skip_whitespace();
        let predicate = self.parse_verb()?;
        let object = self.parse_object(deferred, graph)?;
        self.cursor.skip_whitespace();
        let closed = if term_form {
            self.cursor.eat_str(")>>")
        } else {
            self.cursor.eat_str(">>")
        };
        if !closed {
            return Err(self.cursor.error("expected '>>' to close the quoted triple"));
        }
        self.depth -= 1;
        Ok(Triple {
            subject,
            predicate,
            object,
        })
    }

    fn parse_blank_node_property_list(
        &mut self,
        deferred: &mut Vec<Statement>,
        graph: &GraphName,
    ) -> Result<BlankNode, RdfParseError> {
        self.enter_nesting()?;
        self.cursor.expect(b'[', "'['")?;
        let node = self.state.generator.next_node();
        self.cursor.skip_whitespace();
        if self.cursor.eat(b']') {
            self.depth -= 1;
            return Ok(node);
        }
        self.parse_predicate_object_list(
            &node.clone().into(),
            graph,
            deferred,
            None,
            ListEnd::PropertyList,
        )?;
        self.cursor.skip_whitespace();
        self.cursor
            .expect(b']', "']' to close the blank node property list")?;
        self.depth -= 1;
        Ok(node)
    }

    fn parse_collection(
        &mut self,
        deferred: &mut Vec<Statement>,
        graph: &GraphName,
    ) -> Result<Term, RdfParseError> {
        self.enter_nesting()?;
        self.cursor.expect(b'(', "'('")?;
        let mut root: Option<BlankNode> = None;
        let mut previous: Option<BlankNode> = None;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.eat(b')') {
                break;
            }
            if self.cursor.peek().is_none() {
                return Err(self.cursor.error("unclosed collection: missing ')'"));
            }
            let node = self.state.generator.next_node();
            if let Some(previous) = previous.take() {
                deferred.push(Statement {
                    subject: previous.into(),
                    predicate: rdf::REST.into(),
                    object: node.clone().into(),
                    graph_name: graph.clone(),
                });
            }
            if root.is_none() {
                root = Some(node.clone());
            }
            let mut sub = Vec::new();
            let item = self.parse_object(&mut sub, graph)?;
            deferred.push(Statement {
                subject: node.clone().into(),
                predicate: rdf::FIRST.into(),
                object: item,
                graph_name: graph.clone(),
            });
            deferred.extend(sub);
            previous = Some(node);
        }
        if let Some(previous) = previous {
            deferred.push(Statement {
                subject: previous.into(),
                predicate: rdf::REST.into(),
                object: rdf::NIL.into(),
                graph_name: graph.clone(),
            });
        }
        self.depth -= 1;
        Ok(match root {
            Some(node) => node.into(),
            None => rdf::NIL.into(),
        })
    }

    fn parse_graph_name(&mut self) -> Result<GraphName, RdfParseError> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            Some(b'<') => {
                let iri = self.cursor.read_iriref()?;
                Ok(resolve_iri(
                    self.state.base.as_ref(),
                    &iri,
                    &self.state.config,
                    &self.cursor,
                )?
                .into())
            }
            Some(b'_') => Ok(self.parse_blank_node_label()?.into()),
            Some(b'[') => {
                self.cursor.bump_ascii();
                self.cursor.skip_whitespace();
                self.cursor
                    .expect(b']', "']' (graph labels cannot carry properties)")?;
                Ok(self.state.generator.next_node().into())
            }
            Some(_) => Ok(self.parse_prefixed_name()?.into()),
            None => Err(self.cursor.error("expected a graph name")),
        }
    }

    fn parse_blank_node_label(&mut self) -> Result<BlankNode, RdfParseError> {
        if !self.cursor.eat_str("_:") {
            return Err(self.cursor.error("expected a '_:' blank node label"));
        }
        Ok(BlankNode::new_unchecked(
            self.cursor.read_blank_node_label()?,
        ))
    }

    fn parse_string_literal(&mut self) -> Result<Literal, RdfParseError> {
        let quote = match self.cursor.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(self.cursor.error("expected a string literal")),
        };
        let long_delimiter = if quote == b'"' { "\"\"\"" } else { "'''" };
        let value = if self.cursor.eat_str(long_delimiter) {
            self.cursor.read_long_string_body(quote)?
        } else {
            self.cursor.bump_ascii();
            self.cursor.read_string_body(quote)?
        };
        match self.cursor.peek() {
            Some(b'@') => {
                self.cursor.bump_ascii();
                let tag = self.cursor.read_language_tag()?;
                let (language, direction) = parse_language_tag(tag)
                    .map_err(|e| self.cursor.error(format!("invalid language tag {tag:?}: {e}")))?;
                Ok(match direction {
                    Some(direction) => Literal::new_directional_language_tagged_literal_unchecked(
                        value, language, direction,
                    ),
                    None => Literal::new_language_tagged_literal_unchecked(value, language),
                })
            }
            Some(b'^') => {
                if !self.cursor.eat_str("^^") {
                    return Err(self.cursor.error("expected '^^' before the literal datatype"));
                }
                self.cursor.skip_whitespace();
                let datatype = match self.cursor.peek() {
                    Some(b'<') => {
                        let iri = self.cursor.read_iriref()?;
                        resolve_iri(
                            self.state.base.as_ref(),
                            &iri,
                            &self.state.config,
                            &self.cursor,
                        )?
                    }
                    _ => self.parse_prefixed_name()?,
                };
                if datatype == rdf::LANG_STRING || datatype == rdf::DIR_LANG_STRING {
                    return Err(self.cursor.error(format!(
                        "{} must not be used as an explicit literal datatype",
                        datatype.as_str()
                    )));
                }
                Ok(Literal::new_typed_literal(value, datatype))
            }
            _ => Ok(Literal::new_simple_literal(value)),
        }
    }

    fn parse_numeric_literal(&mut self) -> Result<Literal, RdfParseError> {
        let start_remaining = self.cursor.remaining();
        let mut len = 0;
        let bytes = start_remaining.as_bytes();
        if matches!(bytes.first(), Some(b'+' | b'-')) {
            len += 1;
        }
        while matches!(bytes.get(len), Some(b'0'..=b'9')) {
            len += 1;
        }
        let mut decimal = false;
        if bytes.get(len) == Some(&b'.') && matches!(bytes.get(len + 1), Some(b'0'..=b'9')) {
            decimal = true;
            len += 1;
            while matches!(bytes.get(len), Some(b'0'..=b'9')) {
                len += 1;
            }
        }
        let mut double = false;
        if matches!(bytes.get(len), Some(b'e' | b'E')) {
            let mut exponent_len = len + 1;
            if matches!(bytes.get(exponent_len), Some(b'+' | b'-')) {
                exponent_len += 1;
            }
            if matches!(bytes.get(exponent_len), Some(b'0'..=b'9')) {
                double = true;
                len = exponent_len;
                while matches!(bytes.get(len), Some(b'0'..=b'9')) {
                    len += 1;
                }
            }
        }
        let lexical = &start_remaining[..len];
        if lexical.is_empty() || lexical == "+" || lexical == "-" {
            return Err(self.cursor.error("expected a numeric literal"));
        }
        for _ in 0..len {
            self.cursor.bump_ascii();
        }
        let datatype = if double {
            xsd::DOUBLE
        } else if decimal {
            xsd::DECIMAL
        } else {
            xsd::INTEGER
        };
        Ok(Literal::new_typed_literal(lexical, datatype))
    }

    fn parse_prefixed_name(&mut self) -> Result<NamedNode, RdfParseError> {
        let prefix = self.read_pn_prefix();
        if !self.cursor.eat(b':') {
            return Err(self
                .cursor
                .error("expected a ':' prefixed name or a keyword"));
        }
        let Some(namespace) = self.state.prefixes.get(&prefix).cloned() else {
            return Err(self.cursor.error(format!("unknown prefix {prefix:?}")));
        };
        let local = self.read_pn_local()?;
        let iri = format!("{namespace}{local}");
        if self.state.config.strict_iris() {
            if let Err(e) = Iri::parse(iri.as_str()) {
                return Err(self.cursor.error(format!("invalid IRI {iri:?}: {e}")));
            }
        }
        Ok(NamedNode::new_unchecked(iri))
    }

    fn read_pn_prefix(&mut self) -> String {
        let mut prefix = String::new();
        match self.cursor.peek_char() {
            Some(c) if is_pn_chars_base(c) => {
                self.cursor.bump();
                prefix.push(c);
            }
            _ => return prefix, // empty prefix
        }
        loop {
            match self.cursor.peek_char() {
                Some('.')
                    if self
                        .peek_char_after('.')
                        .is_some_and(|c| is_pn_chars(c) || c == '.') =>
                {
                    self.cursor.bump_ascii();
                    prefix.push('.');
                }
                Some(c) if is_pn_chars(c) => {
                    self.cursor.bump();
                    prefix.push(c);
                }
                _ => return prefix,
            }
        }
    }

    fn read_pn_local(&mut self) -> Result<String, RdfParseError> {
        let mut local = String::new();
        loop {
            match self.cursor.peek_char() {
                Some('\\') => {
                    self.cursor.bump_ascii();
                    match self.cursor.peek_char() {
                        Some(c) if "_~.-!$&'()*+,;=/?#@%".contains(c) => {
                            self.cursor.bump_ascii();
                            local.push(c);
                        }
                        _ => {
                            return Err(self
                                .cursor
                                .error("invalid local name escape sequence"));
                        }
                    }
                }
                Some('%') => {
                    self.cursor.bump_ascii();
                    local.push('%');
                    for _ in 0..2 {
                        match self.cursor.peek_char() {
                            Some(c) if c.is_ascii_hexdigit() => {
                                self.cursor.bump_ascii();
                                local.push(c);
                            }
                            _ => {
                                return Err(self.cursor.error(
                                    "'%' in a local name must be followed by two hex digits",
                                ));
                            }
                        }
                    }
                }
                Some('.')
                    if self
                        .peek_char_after('.')
                        .is_some_and(|c| is_pn_chars(c) || c == ':' || c == '.') =>
                {
                    self.cursor.bump_ascii();
                    local.push('.');
                }
                Some(c)
                    if is_pn_chars(c)
                        || c == ':'
                        || (local.is_empty() && c.is_ascii_digit()) =>
                {
                    self.cursor.bump();
                    local.push(c);
                }
                _ => return Ok(local),
            }
        }
    }

    fn parse_prefix_directive(&mut self, at_form: bool) -> Result<(), RdfParseError> {
        self.cursor.skip_whitespace();
        let prefix = self.read_pn_prefix();
        self.cursor
            .expect(b':', "':' after the prefix name")?;
        self.cursor.skip_whitespace();
        let iri = self.cursor.read_iriref()?;
        let namespace = resolve_iri(
            self.state.base.as_ref(),
            &iri,
            &self.state.config,
            &self.cursor,
        )?;
        self.state
            .prefixes
            .insert(prefix, namespace.into_string());
        if at_form {
            self.cursor.skip_whitespace();
            self.cursor.expect(b'.', "'.' after the @prefix directive")?;
        }
        Ok(())
    }

    fn parse_base_directive(&mut self, at_form: bool) -> Result<(), RdfParseError> {
        self.cursor.skip_whitespace();
        let iri = self.cursor.read_iriref()?;
        let resolved = resolve_iri(
            self.state.base.as_ref(),
            &iri,
            &self.state.config,
            &self.cursor,
        )?;
        self.state.base = Some(
            Iri::parse(resolved.into_string())
                .map_err(|e| self.cursor.error(format!("invalid base IRI: {e}")))?,
        );
        if at_form {
            self.cursor.skip_whitespace();
            self.cursor.expect(b'.', "'.' after the @base directive")?;
        }
        Ok(())
    }

    fn parse_version_directive(&mut self, at_form: bool) -> Result<(), RdfParseError> {
        self.cursor.skip_whitespace();
        let value = match self.cursor.peek() {
            Some(b'"' | b'\'') => self.parse_string_literal()?.into_value(),
            Some(b'0'..=b'9') => self.parse_numeric_literal()?.into_value(),
            _ => return Err(self.cursor.error("expected a version value")),
        };
        if value.starts_with("1.2") {
            self.state.quoted_triple_statements = true;
        }
        if at_form {
            self.cursor.skip_whitespace();
            self.cursor.expect(b'.', "'.' after the @version directive")?;
        }
        Ok(())
    }

    fn enter_nesting(&mut self) -> Result<(), RdfParseError> {
        self.depth += 1;
        if self.depth > self.state.config.max_depth() {
            return Err(RdfParseError::depth_exceeded(
                self.cursor.format(),
                self.state.config.max_depth(),
            )
            .with_position(self.cursor.position()));
        }
        Ok(())
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.cursor.peek_char() {
            if c.is_ascii_alphabetic() {
                self.cursor.bump_ascii();
                word.push(c);
            } else {
                break;
            }
        }
        word
    }

    fn skip_word(&mut self) {
        while matches!(self.cursor.peek(), Some(c) if c.is_ascii_alphabetic()) {
            self.cursor.bump_ascii();
        }
    }

    fn peek_bare_directive(&mut self) -> Option<&'static str> {
        for keyword in ["prefix", "base", "version"] {
            if self.keyword_ahead_ci(keyword) {
                return Some(keyword);
            }
        }
        None
    }

    fn peek_graph_keyword(&mut self) -> bool {
        self.keyword_ahead_ci("graph")
    }

    /// Checks for a case-insensitive keyword not continued by name characters
    /// (a `prefix:x` prefixed name is not the `prefix` keyword).
    fn keyword_ahead_ci(&mut self, keyword: &str) -> bool {
        let remaining = self.cursor.remaining();
        if remaining.len() < keyword.len()
            || !remaining.as_bytes()[..keyword.len()].eq_ignore_ascii_case(keyword.as_bytes())
        {
            return false;
        }
        match remaining[keyword.len()..].chars().next() {
            None => true,
            Some(c) => !(is_pn_chars(c) || c == ':'),
        }
    }

    /// Case-sensitive keyword check for `true`/`false`.
    fn keyword_ahead(&mut self, keyword: &str) -> bool {
        let remaining = self.cursor.remaining();
        if !remaining.starts_with(keyword) {
            return false;
        }
        match remaining[keyword.len()..].chars().next() {
            None => true,
            Some(c) => !(is_pn_chars(c) || c == ':'),
        }
    }

    fn word_continues_at(&self, offset: usize) -> bool {
        let remaining = self.cursor.remaining();
        match remaining[offset.min(remaining.len())..].chars().next() {
            None => false,
            Some(c) => is_pn_chars(c) || c == ':',
        }
    }

    fn peek_char_after(&self, current: char) -> Option<char> {
        self.cursor.remaining()[current.len_utf8()..].chars().next()
    }
}

enum ListEnd {
    /// `.`, `}` or end of chunk.
    Statement,
    /// `]`
    PropertyList,
    /// `|}`
    Annotation,
}

impl ListEnd {
    fn at_end(&self, cursor: &mut Cursor<'_>) -> bool {
        cursor.skip_whitespace();
        match self {
            Self::Statement => matches!(cursor.peek(), None | Some(b'.' | b'}')),
            Self::PropertyList => cursor.peek() == Some(b']'),
            Self::Annotation => cursor.starts_with("|}"),
        }
    }
}
