use oxiri::Iri;
use quick_xml::escape::escape;
use rdfio_model::{
    IriParseError, Literal, NamedNode, SinkState, Statement, Subject, Term, Triple,
    validate_statement,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::io::{self, Write};

const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// An [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/) push encoder.
///
/// One `rdf:Description` element is written per statement. Predicate
/// namespaces without a configured prefix get an auto-coined `ns0`, `ns1`, …
/// prefix declared on the property element.
///
/// ```
/// use rdfio_model::{NamedNode, Statement, vocab::rdf};
/// use rdfio_xml::RdfXmlSerializer;
///
/// let mut serializer = RdfXmlSerializer::new().for_writer(Vec::new());
/// serializer.write_statement(&Statement::new_triple(
///     NamedNode::new("http://example.com#me")?,
///     rdf::TYPE,
///     NamedNode::new("http://schema.org/Person")?,
/// ))?;
/// serializer.close()?;
/// let text = String::from_utf8(serializer.into_inner())?;
/// assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
/// assert!(text.contains("rdf:about=\"http://example.com#me\""));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct RdfXmlSerializer {
    prefixes: BTreeMap<String, String>,
}

impl RdfXmlSerializer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a namespace prefix on the `rdf:RDF` root element.
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

    /// Writes to a [`Write`] implementation.
    pub fn for_writer<W: Write>(self, writer: W) -> WriterRdfXmlSerializer<W> {
        WriterRdfXmlSerializer {
            writer,
            prefixes: self.prefixes,
            auto_prefixes: HashMap::new(),
            auto_counter: 0,
            state: SinkState::new(),
            header_written: false,
        }
    }
}

/// Writes an RDF/XML file to a [`Write`] implementation.
///
/// Can be built using [`RdfXmlSerializer::for_writer`].
pub struct WriterRdfXmlSerializer<W: Write> {
    writer: W,
    prefixes: BTreeMap<String, String>,
    auto_prefixes: HashMap<String, String>,
    auto_counter: u64,
    state: SinkState,
    header_written: bool,
}

impl<W: Write> WriterRdfXmlSerializer<W> {
    /// Writes one statement, dropping its graph name.
    pub fn write_statement(&mut self, statement: &Statement) -> io::Result<()> {
        self.state.check_open()?;
        validate_statement(statement)?;
        let mut text = String::new();
        if !self.header_written {
            self.header_written = true;
            self.render_header(&mut text);
        }
        self.render_statement(&mut text, statement)?;
        let result = self.writer.write_all(text.as_bytes());
        self.state.record(result)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.state.check_open()?;
        let result = self.writer.flush();
        self.state.record(result)
    }

    /// Writes the closing `</rdf:RDF>` tag, flushes and closes the encoder.
    /// Later `write_statement`/`flush` calls fail; calling `close` again
    /// returns the cached error without side effects.
    pub fn close(&mut self) -> io::Result<()> {
        if let Some(result) = self.state.enter_close() {
            return result;
        }
        let mut text = String::new();
        if !self.header_written {
            self.header_written = true;
            self.render_header(&mut text);
        }
        text.push_str("</rdf:RDF>\n");
        let result = self
            .writer
            .write_all(text.as_bytes())
            .and_then(|()| self.writer.flush());
        self.state.record(result)
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn render_header(&self, out: &mut String) {
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<rdf:RDF xmlns:rdf=\"");
        out.push_str(RDF_NAMESPACE);
        out.push('"');
        for (name, iri) in &self.prefixes {
            let _ = write!(out, " xmlns:{name}=\"{}\"", escape(iri.as_str()));
        }
        out.push_str(">\n");
    }

    fn render_statement(&mut self, out: &mut String, statement: &Statement) -> io::Result<()> {
        out.push_str("  <rdf:Description ");
        match &statement.subject {
            Subject::NamedNode(node) => {
                let _ = write!(out, "rdf:about=\"{}\"", escape(node.as_str()));
            }
            Subject::BlankNode(node) => {
                let _ = write!(out, "rdf:nodeID=\"{}\"", escape(node.as_str()));
            }
            Subject::Triple(_) => {
                return Err(unrepresentable("a quoted triple subject"));
            }
        }
        out.push('>');
        self.render_property(out, &statement.predicate, &statement.object)?;
        out.push_str("</rdf:Description>\n");
        Ok(())
    }

    fn render_property(
        &mut self,
        out: &mut String,
        predicate: &NamedNode,
        object: &Term,
    ) -> io::Result<()> {
        let (tag, declaration) = self.property_tag(predicate)?;
        out.push('<');
        out.push_str(&tag);
        if let Some(declaration) = &declaration {
            out.push_str(declaration);
        }
        match object {
            Term::NamedNode(node) => {
                let _ = write!(out, " rdf:resource=\"{}\"/>", escape(node.as_str()));
            }
            Term::BlankNode(node) => {
                let _ = write!(out, " rdf:nodeID=\"{}\"/>", escape(node.as_str()));
            }
            Term::Literal(literal) => {
                self.render_literal_attributes(out, literal)?;
                let _ = write!(out, ">{}</{tag}>", escape(literal.value()));
            }
            Term::Triple(triple) => {
                out.push_str(" rdf:parseType=\"Triple\">");
                self.render_triple_term(out, triple)?;
                let _ = write!(out, "</{tag}>");
            }
        }
        Ok(())
    }

    fn render_literal_attributes(
        &self,
        out: &mut String,
        literal: &Literal,
    ) -> io::Result<()> {
        if literal.direction().is_some() {
            return Err(unrepresentable("a directional language-tagged literal"));
        }
        if let Some(language) = literal.language() {
            let _ = write!(out, " xml:lang=\"{}\"", escape(language));
        } else if !literal.is_plain() {
            let _ = write!(
                out,
                " rdf:datatype=\"{}\"",
                escape(literal.datatype().as_str())
            );
        }
        Ok(())
    }

    fn render_triple_term(&self, out: &mut String, triple: &Triple) -> io::Result<()> {
        let subject = match &triple.subject {
            Subject::NamedNode(node) => node,
            Subject::BlankNode(_) | Subject::Triple(_) => {
                return Err(unrepresentable(
                    "a quoted triple with a non-IRI subject",
                ));
            }
        };
        let object = match &triple.object {
            Term::NamedNode(node) => node,
            Term::BlankNode(_) | Term::Literal(_) | Term::Triple(_) => {
                return Err(unrepresentable(
                    "a quoted triple with a non-IRI object",
                ));
            }
        };
        let _ = write!(
            out,
            "<rdf:Description rdf:subject=\"{}\" rdf:predicate=\"{}\" rdf:object=\"{}\"/>",
            escape(subject.as_str()),
            escape(triple.predicate.as_str()),
            escape(object.as_str())
        );
        Ok(())
    }

    /// Splits the predicate into a namespace and an XML-safe local name and
    /// returns the qualified tag, plus an `xmlns` declaration when the
    /// namespace has no prefix yet.
    fn property_tag(
        &mut self,
        predicate: &NamedNode,
    ) -> io::Result<(String, Option<String>)> {
        let iri = predicate.as_str();
        let Some((namespace, local)) = split_iri(iri) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("the IRI {iri:?} cannot be split into an XML qualified name"),
            ));
        };
        if namespace == RDF_NAMESPACE {
            return Ok((format!("rdf:{local}"), None));
        }
        for (name, declared) in &self.prefixes {
            if declared == namespace {
                return Ok((format!("{name}:{local}"), None));
            }
        }
        if let Some(name) = self.auto_prefixes.get(namespace) {
            // The auto-coined prefixes are re-declared on every use so a
            // streaming writer needs no second pass over the document.
            let declaration = format!(" xmlns:{name}=\"{}\"", escape(namespace));
            return Ok((format!("{name}:{local}"), Some(declaration)));
        }
        let name = format!("ns{}", self.auto_counter);
        self.auto_counter += 1;
        self.auto_prefixes
            .insert(namespace.to_owned(), name.clone());
        let declaration = format!(" xmlns:{name}=\"{}\"", escape(namespace));
        Ok((format!("{name}:{local}"), Some(declaration)))
    }
}

fn unrepresentable(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{what} cannot be written in RDF/XML"),
    )
}

/// Splits an IRI so that the local part is a non-empty XML NCName.
fn split_iri(iri: &str) -> Option<(&str, &str)> {
    let mut split = iri.len();
    for (i, c) in iri.char_indices().rev() {
        if is_ncname_char(c) {
            split = i;
        } else {
            break;
        }
    }
    loop {
        if split >= iri.len() {
            return None;
        }
        let local = &iri[split..];
        let first = local.chars().next()?;
        if is_ncname_start_char(first) {
            return Some((&iri[..split], local));
        }
        // Trim leading digits and other non-start characters.
        split += first.len_utf8();
    }
}

fn is_ncname_start_char(c: char) -> bool {
    c != ':' && crate::parser::is_name_start_char(c)
}

fn is_ncname_char(c: char) -> bool {
    c != ':' && crate::parser::is_name_char(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfio_model::vocab::xsd;

    fn statement(object: impl Into<Term>) -> Statement {
        Statement::new_triple(
            NamedNode::new_unchecked("http://ex/s"),
            NamedNode::new_unchecked("http://ex/ns#p"),
            object,
        )
    }

    fn write_one(statement: &Statement) -> String {
        let mut serializer = RdfXmlSerializer::new().for_writer(Vec::new());
        serializer.write_statement(statement).unwrap();
        serializer.close().unwrap();
        String::from_utf8(serializer.into_inner()).unwrap()
    }

    #[test]
    fn auto_prefixes_are_coined() {
        let text = write_one(&statement(NamedNode::new_unchecked("http://ex/o")));
        assert!(text.contains("<ns0:p xmlns:ns0=\"http://ex/ns#\" rdf:resource=\"http://ex/o\"/>"));
    }

    #[test]
    fn configured_prefixes_are_used() {
        let mut serializer = RdfXmlSerializer::new()
            .with_prefix("ex", "http://ex/ns#")
            .unwrap()
            .for_writer(Vec::new());
        serializer
            .write_statement(&statement(Literal::new_typed_literal("5", xsd::INTEGER)))
            .unwrap();
        serializer.close().unwrap();
        let text = String::from_utf8(serializer.into_inner()).unwrap();
        assert!(text.contains("xmlns:ex=\"http://ex/ns#\""));
        assert!(text.contains(
            "<ex:p rdf:datatype=\"http://www.w3.org/2001/XMLSchema#integer\">5</ex:p>"
        ));
    }

    #[test]
    fn language_literals_get_xml_lang() {
        let text = write_one(&statement(
            Literal::new_language_tagged_literal_unchecked("v", "en"),
        ));
        assert!(text.contains(" xml:lang=\"en\">v<"));
    }

    #[test]
    fn text_is_escaped() {
        let text = write_one(&statement(Literal::new_simple_literal("a<b&c")));
        assert!(text.contains("a&lt;b&amp;c"));
    }

    #[test]
    fn triple_terms_use_parse_type_triple() {
        let text = write_one(&statement(Triple::new(
            NamedNode::new_unchecked("http://ex/a"),
            NamedNode::new_unchecked("http://ex/b"),
            NamedNode::new_unchecked("http://ex/c"),
        )));
        assert!(text.contains("rdf:parseType=\"Triple\""));
        assert!(text.contains("rdf:subject=\"http://ex/a\""));
    }

    #[test]
    fn unsplittable_predicates_are_rejected() {
        let bad = Statement::new_triple(
            NamedNode::new_unchecked("http://ex/s"),
            NamedNode::new_unchecked("http://ex/ns#"),
            NamedNode::new_unchecked("http://ex/o"),
        );
        let mut serializer = RdfXmlSerializer::new().for_writer(Vec::new());
        let error = serializer.write_statement(&bad).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }
}
