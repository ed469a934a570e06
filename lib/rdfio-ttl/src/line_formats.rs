//! Shared parser implementation for N-Triples and N-Quads.

use crate::toolkit::{Cursor, LineReader, check_absolute_iri};
use rdfio_model::{
    BlankNode, GraphName, Literal, NamedNode, ParserConfig, RdfParseError, Statement, Subject,
    Term, Triple, parse_language_tag, vocab::rdf,
};
use std::io::Read;

/// The line-oriented cursor parser shared by both formats: every non-empty,
/// non-comment line holds exactly one statement terminated by `.`.
pub struct LineFormatParserCore<R: Read> {
    reader: LineReader<R>,
    config: ParserConfig,
    format: &'static str,
    with_graph_name: bool,
    emitted: u64,
    done: bool,
}

impl<R: Read> LineFormatParserCore<R> {
    pub fn new(
        reader: R,
        config: ParserConfig,
        format: &'static str,
        with_graph_name: bool,
    ) -> Self {
        let config = config.normalized();
        Self {
            reader: LineReader::new(reader, format, &config),
            config,
            format,
            with_graph_name,
            emitted: 0,
            done: false,
        }
    }

    pub fn parse_next(&mut self) -> Option<Result<Statement, RdfParseError>> {
        if self.done {
            return None;
        }
        loop {
            match self.reader.advance(&self.config) {
                Ok(true) => (),
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
            let line = match self.reader.line() {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let trimmed = line.trim_start_matches([' ', '\t']);
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut cursor = Cursor::new(
                line,
                self.format,
                self.reader.line_number(),
                self.reader.line_offset(),
            );
            let result = parse_line(&self.config, self.with_graph_name, &mut cursor);
            return Some(match result {
                Ok(statement) => {
                    if self.emitted >= self.config.max_statements() {
                        self.done = true;
                        Err(RdfParseError::statement_limit_exceeded(
                            self.format,
                            self.config.max_statements(),
                        ))
                    } else {
                        self.emitted += 1;
                        Ok(statement)
                    }
                }
                Err(e) => {
                    self.done = true;
                    Err(if self.config.debug_statements() {
                        e.with_statement(line.trim())
                    } else {
                        e
                    })
                }
            });
        }
    }
}

fn parse_line(
    config: &ParserConfig,
    with_graph_name: bool,
    cursor: &mut Cursor<'_>,
) -> Result<Statement, RdfParseError> {
    cursor.skip_whitespace();
    let subject = parse_subject(config, cursor, 0)?;
    cursor.skip_whitespace();
    let predicate = parse_predicate(config, cursor)?;
    cursor.skip_whitespace();
    let object = parse_object(config, cursor, 0)?;
    cursor.skip_whitespace();
    let graph_name = if with_graph_name {
        parse_graph_name(config, cursor)?
    } else {
        if !matches!(cursor.peek(), None | Some(b'.')) {
            return Err(cursor.error("N-Triples does not allow a fourth term before '.'"));
        }
        GraphName::DefaultGraph
    };
    cursor.skip_whitespace();
    cursor.expect(b'.', "'.' at the end of the statement")?;
    if !cursor.at_end() {
        return Err(cursor.error("only one statement is allowed per line"));
    }
    Ok(Statement {
        subject,
        predicate,
        object,
        graph_name,
    })
}

fn parse_subject(
    config: &ParserConfig,
    cursor: &mut Cursor<'_>,
    depth: usize,
) -> Result<Subject, RdfParseError> {
    if cursor.starts_with("<<(") {
        return Ok(parse_triple_term(config, cursor, depth)?.into());
    }
    match cursor.peek() {
        Some(b'<') => Ok(parse_iri(config, cursor)?.into()),
        Some(b'_') => Ok(parse_blank_node(cursor)?.into()),
        _ => Err(cursor.error("the subject of a statement must be an IRI or a blank node")),
    }
}

fn parse_predicate(
    config: &ParserConfig,
    cursor: &mut Cursor<'_>,
) -> Result<NamedNode, RdfParseError> {
    if cursor.starts_with("<<(") {
        return Err(cursor.error("a triple term is not allowed as predicate"));
    }
    if cursor.peek() == Some(b'<') {
        parse_iri(config, cursor)
    } else {
        Err(cursor.error("the predicate of a statement must be an IRI"))
    }
}

fn parse_object(
    config: &ParserConfig,
    cursor: &mut Cursor<'_>,
    depth: usize,
) -> Result<Term, RdfParseError> {
    if cursor.starts_with("<<(") {
        return Ok(parse_triple_term(config, cursor, depth)?.into());
    }
    match cursor.peek() {
        Some(b'<') => Ok(parse_iri(config, cursor)?.into()),
        Some(b'_') => Ok(parse_blank_node(cursor)?.into()),
        Some(b'"') => Ok(parse_literal(config, cursor)?.into()),
        _ => Err(cursor.error(
            "the object of a statement must be an IRI, a blank node or a literal",
        )),
    }
}

fn parse_graph_name(
    config: &ParserConfig,
    cursor: &mut Cursor<'_>,
) -> Result<GraphName, RdfParseError> {
    if cursor.starts_with("<<(") {
        return Err(cursor.error("a triple term is not allowed as graph name"));
    }
    match cursor.peek() {
        Some(b'<') => Ok(parse_iri(config, cursor)?.into()),
        Some(b'_') => Ok(parse_blank_node(cursor)?.into()),
        Some(b'"') => Err(cursor.error("a literal is not allowed as graph name")),
        _ => Ok(GraphName::DefaultGraph),
    }
}

fn parse_triple_term(
    config: &ParserConfig,
    cursor: &mut Cursor<'_>,
    depth: usize,
) -> Result<Triple, RdfParseError> {
    if depth >= config.max_depth() {
        return Err(RdfParseError::depth_exceeded(
            cursor.format(),
            config.max_depth(),
        )
        .with_position(cursor.position()));
    }
    if !cursor.eat_str("<<(") {
        return Err(cursor.error("expected '<<(' to start a triple term"));
    }
    cursor.skip_whitespace();
    let subject = parse_subject(config, cursor, depth + 1)?;
    cursor.skip_whitespace();
    let predicate = parse_predicate(config, cursor)?;
    cursor.skip_whitespace();
    let object = parse_object(config, cursor, depth + 1)?;
    cursor.skip_whitespace();
    if !cursor.eat_str(")>>") {
        return Err(cursor.error("expected ')>>' to close the triple term"));
    }
    Ok(Triple {
        subject,
        predicate,
        object,
    })
}

fn parse_iri(config: &ParserConfig, cursor: &mut Cursor<'_>) -> Result<NamedNode, RdfParseError> {
    let iri = cursor.read_iriref()?;
    check_absolute_iri(&iri, config, cursor)
}

fn parse_blank_node(cursor: &mut Cursor<'_>) -> Result<BlankNode, RdfParseError> {
    if !cursor.eat_str("_:") {
        return Err(cursor.error("expected a '_:' blank node label"));
    }
    Ok(BlankNode::new_unchecked(cursor.read_blank_node_label()?))
}

fn parse_literal(
    config: &ParserConfig,
    cursor: &mut Cursor<'_>,
) -> Result<Literal, RdfParseError> {
    cursor.expect(b'"', "'\"' to start a literal")?;
    let value = cursor.read_string_body(b'"')?;
    match cursor.peek() {
        Some(b'@') => {
            cursor.bump_ascii();
            let tag = cursor.read_language_tag()?;
            let (language, direction) = parse_language_tag(tag)
                .map_err(|e| cursor.error(format!("invalid language tag {tag:?}: {e}")))?;
            Ok(match direction {
                Some(direction) => Literal::new_directional_language_tagged_literal_unchecked(
                    value, language, direction,
                ),
                None => Literal::new_language_tagged_literal_unchecked(value, language),
            })
        }
        Some(b'^') => {
            if !cursor.eat_str("^^") {
                return Err(cursor.error("expected '^^' before the literal datatype"));
            }
            cursor.skip_whitespace();
            let datatype = parse_iri(config, cursor)?;
            if datatype == rdf::LANG_STRING {
                return Err(cursor.error(
                    "rdf:langString must not be used as an explicit literal datatype",
                ));
            }
            if datatype == rdf::DIR_LANG_STRING {
                return Err(cursor.error(
                    "rdf:dirLangString must not be used as an explicit literal datatype",
                ));
            }
            Ok(Literal::new_typed_literal(value, datatype))
        }
        _ => Ok(Literal::new_simple_literal(value)),
    }
}
