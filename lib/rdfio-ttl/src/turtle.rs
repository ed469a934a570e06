//! A [Turtle](https://www.w3.org/TR/rdf12-turtle/) streaming parser
//! implemented by [`TurtleParser`] and a serializer implemented by
//! [`TurtleSerializer`].

use crate::terse::TerseParserCore;
use crate::toolkit::{is_pn_chars, is_pn_chars_u};
use oxiri::Iri;
use rdfio_model::{
    IriParseError, Literal, NamedNode, ParserConfig, RdfParseError, SinkState, Statement,
    Subject, Term, Triple, vocab::rdf, validate_statement,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::io::{self, Read, Write};

pub(crate) const FORMAT: &str = "Turtle";

/// A [Turtle](https://www.w3.org/TR/rdf12-turtle/) streaming parser.
///
/// ```
/// use rdfio_model::vocab::rdf;
/// use rdfio_ttl::TurtleParser;
///
/// let file = r#"@prefix schema: <http://schema.org/> .
/// <http://example.com/foo> a schema:Person ;
///     schema:name "Foo" ."#;
///
/// let mut count = 0;
/// for triple in TurtleParser::new().for_slice(file) {
///     let triple = triple?;
///     if triple.predicate == rdf::TYPE {
///         count += 1;
///     }
/// }
/// assert_eq!(1, count);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct TurtleParser {
    config: ParserConfig,
    base: Option<Iri<String>>,
    prefixes: HashMap<String, String>,
}

impl TurtleParser {
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
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderTurtleParser<R> {
        ReaderTurtleParser {
            inner: TerseParserCore::new(reader, self.config, FORMAT, false, self.base, self.prefixes),
        }
    }

    /// Parses from a byte or string slice.
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderTurtleParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Iterates over the triples of a Turtle document.
///
/// Can be built using [`TurtleParser::for_reader`] or
/// [`TurtleParser::for_slice`].
#[must_use]
pub struct ReaderTurtleParser<R: Read> {
    inner: TerseParserCore<R>,
}

impl<R: Read> ReaderTurtleParser<R> {
    /// The prefixes declared so far.
    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.inner.prefixes()
    }

    /// The base IRI currently in use.
    pub fn base_iri(&self) -> Option<&str> {
        self.inner.base_iri()
    }
}

impl<R: Read> Iterator for ReaderTurtleParser<R> {
    type Item = Result<Triple, RdfParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.parse_next()?.map(Statement::into_triple))
    }
}

/// A [Turtle](https://www.w3.org/TR/rdf12-turtle/) push encoder.
///
/// `@base` and the configured prefixes are written before the first
/// statement, prefixes sorted alphabetically so output is deterministic, and
/// IRIs matching a declared namespace are abbreviated.
///
/// ```
/// use rdfio_model::{NamedNode, Statement, vocab::rdf};
/// use rdfio_ttl::TurtleSerializer;
///
/// let mut serializer = TurtleSerializer::new()
///     .with_prefix("schema", "http://schema.org/")?
///     .for_writer(Vec::new());
/// serializer.write_statement(&Statement::new_triple(
///     NamedNode::new("http://example.com#me")?,
///     rdf::TYPE,
///     NamedNode::new("http://schema.org/Person")?,
/// ))?;
/// serializer.close()?;
/// assert_eq!(
///     "@prefix schema: <http://schema.org/> .\n\n<http://example.com#me> a schema:Person .\n",
///     String::from_utf8(serializer.into_inner())?
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct TurtleSerializer {
    inner: TerseSerializerOptions,
}

impl TurtleSerializer {
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

    /// Writes to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterTurtleSerializer<W> {
        WriterTurtleSerializer {
            writer,
            options: self.inner,
            state: SinkState::new(),
            header_written: false,
        }
    }
}

/// Writes a Turtle file to a [`Write`] implementation.
///
/// Can be built using [`TurtleSerializer::for_writer`].
pub struct WriterTurtleSerializer<W: Write> {
    writer: W,
    options: TerseSerializerOptions,
    state: SinkState,
    header_written: bool,
}

impl<W: Write> WriterTurtleSerializer<W> {
    /// Writes one statement, dropping its graph name.
    pub fn write_statement(&mut self, statement: &Statement) -> io::Result<()> {
        self.state.check_open()?;
        validate_statement(statement)?;
        let mut text = String::new();
        if !self.header_written {
            self.header_written = true;
            self.options.write_header(&mut text);
        }
        self.options.write_triple_parts(&mut text, statement);
        text.push_str(" .\n");
        let result = self.writer.write_all(text.as_bytes());
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
        let mut result = Ok(());
        if !self.header_written {
            self.header_written = true;
            let mut text = String::new();
            self.options.write_header(&mut text);
            result = self.writer.write_all(text.as_bytes());
        }
        let result = result.and_then(|()| self.writer.flush());
        self.state.record(result)
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// The prefix table, base IRI and term formatting shared by the Turtle and
/// TriG serializers.
#[derive(Default, Clone)]
pub(crate) struct TerseSerializerOptions {
    prefixes: BTreeMap<String, String>,
    base: Option<String>,
}

impl TerseSerializerOptions {
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
        self.base = Some(Iri::parse(base_iri.into())?.into_inner());
        Ok(self)
    }

    /// `@base` then the `@prefix` directives in alphabetical order.
    pub fn write_header(&self, out: &mut String) {
        let mut any = false;
        if let Some(base) = &self.base {
            let _ = writeln!(out, "@base <{base}> .");
            any = true;
        }
        for (name, iri) in &self.prefixes {
            let _ = writeln!(out, "@prefix {name}: <{iri}> .");
            any = true;
        }
        if any {
            out.push('\n');
        }
    }

    pub fn write_triple_parts(&self, out: &mut String, statement: &Statement) {
        self.write_subject(out, &statement.subject);
        out.push(' ');
        self.write_predicate(out, &statement.predicate);
        out.push(' ');
        self.write_term(out, &statement.object);
    }

    fn write_subject(&self, out: &mut String, subject: &Subject) {
        match subject {
            Subject::NamedNode(node) => self.write_iri(out, node.as_str()),
            Subject::BlankNode(node) => {
                let _ = write!(out, "{node}");
            }
            Subject::Triple(triple) => self.write_quoted_triple(out, triple),
        }
    }

    fn write_predicate(&self, out: &mut String, predicate: &NamedNode) {
        if *predicate == rdf::TYPE {
            out.push('a');
        } else {
            self.write_iri(out, predicate.as_str());
        }
    }

    pub fn write_term(&self, out: &mut String, term: &Term) {
        match term {
            Term::NamedNode(node) => self.write_iri(out, node.as_str()),
            Term::BlankNode(node) => {
                let _ = write!(out, "{node}");
            }
            Term::Literal(literal) => self.write_literal(out, literal),
            Term::Triple(triple) => self.write_quoted_triple(out, triple),
        }
    }

    fn write_quoted_triple(&self, out: &mut String, triple: &Triple) {
        out.push_str("<<( ");
        self.write_subject(out, &triple.subject);
        out.push(' ');
        // rdf:type is not abbreviated inside quoted triples
        self.write_iri(out, triple.predicate.as_str());
        out.push(' ');
        self.write_term(out, &triple.object);
        out.push_str(" )>>");
    }

    fn write_literal(&self, out: &mut String, literal: &Literal) {
        out.push('"');
        for c in literal.value().chars() {
            match c {
                '\u{8}' => out.push_str("\\b"),
                '\t' => out.push_str("\\t"),
                '\n' => out.push_str("\\n"),
                '\u{C}' => out.push_str("\\f"),
                '\r' => out.push_str("\\r"),
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                _ => out.push(c),
            }
        }
        out.push('"');
        if let Some(language) = literal.language() {
            let _ = write!(out, "@{language}");
            if let Some(direction) = literal.direction() {
                let _ = write!(out, "--{direction}");
            }
        } else if !literal.is_plain() {
            out.push_str("^^");
            self.write_iri(out, literal.datatype().as_str());
        }
    }

    fn write_iri(&self, out: &mut String, iri: &str) {
        if let Some((name, local)) = self.abbreviate(iri) {
            let _ = write!(out, "{name}:{local}");
        } else {
            let _ = write!(out, "<{iri}>");
        }
    }

    /// The longest declared namespace matching the IRI, when the remainder is
    /// a plain local name that needs no escaping.
    fn abbreviate<'a>(&'a self, iri: &'a str) -> Option<(&'a str, &'a str)> {
        let mut best: Option<(&str, &str)> = None;
        for (name, namespace) in &self.prefixes {
            if let Some(local) = iri.strip_prefix(namespace.as_str()) {
                if is_plain_local_name(local)
                    && best.map_or(true, |(_, l)| local.len() < l.len())
                {
                    best = Some((name, local));
                }
            }
        }
        best
    }
}

fn is_plain_local_name(local: &str) -> bool {
    let mut chars = local.chars().peekable();
    match chars.peek() {
        None => return true, // `ex:` is a valid prefixed name
        Some(&c) if is_pn_chars_u(c) || c.is_ascii_digit() => {
            chars.next();
        }
        _ => return false,
    }
    let mut last_was_dot = false;
    for c in chars {
        if c == '.' {
            last_was_dot = true;
        } else if is_pn_chars(c) {
            last_was_dot = false;
        } else {
            return false;
        }
    }
    !last_was_dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfio_model::vocab::xsd;

    #[test]
    fn prefixes_are_sorted_and_applied() {
        let mut serializer = TurtleSerializer::new()
            .with_prefix("z", "http://z.example/")
            .unwrap()
            .with_prefix("a", "http://a.example/")
            .unwrap()
            .for_writer(Vec::new());
        serializer
            .write_statement(&Statement::new_triple(
                NamedNode::new_unchecked("http://z.example/s"),
                NamedNode::new_unchecked("http://a.example/p"),
                Literal::new_typed_literal("5", xsd::INTEGER),
            ))
            .unwrap();
        serializer.close().unwrap();
        let text = String::from_utf8(serializer.into_inner()).unwrap();
        assert_eq!(
            text,
            "@prefix a: <http://a.example/> .\n@prefix z: <http://z.example/> .\n\nz:s a:p \"5\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n"
        );
    }

    #[test]
    fn unabbreviatable_locals_stay_verbose() {
        let options = TerseSerializerOptions::default()
            .with_prefix("ex", "http://ex/")
            .unwrap();
        let mut out = String::new();
        options.write_iri(&mut out, "http://ex/a b");
        assert_eq!(out, "<http://ex/a b>");
    }

    #[test]
    fn round_trip_through_parser() {
        let mut serializer = TurtleSerializer::new()
            .with_prefix("ex", "http://ex/")
            .unwrap()
            .for_writer(Vec::new());
        serializer
            .write_statement(&Statement::new_triple(
                NamedNode::new_unchecked("http://ex/s"),
                NamedNode::new_unchecked("http://ex/p"),
                Literal::new_language_tagged_literal_unchecked("hello", "en"),
            ))
            .unwrap();
        serializer.close().unwrap();
        let text = String::from_utf8(serializer.into_inner()).unwrap();
        let triples = TurtleParser::new()
            .for_slice(&text)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(triples.len(), 1);
        assert_eq!(
            triples[0].object,
            Literal::new_language_tagged_literal_unchecked("hello", "en").into()
        );
    }
}
