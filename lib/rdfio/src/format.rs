use std::fmt;

/// RDF serialization formats.
///
/// This enumeration is non exhaustive. New formats might be added in the future.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
#[non_exhaustive]
pub enum RdfFormat {
    /// [JSON-LD](https://www.w3.org/TR/json-ld/)
    JsonLd,
    /// [N-Quads](https://www.w3.org/TR/n-quads/)
    NQuads,
    /// [N-Triples](https://www.w3.org/TR/n-triples/)
    NTriples,
    /// [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/)
    RdfXml,
    /// [TriG](https://www.w3.org/TR/trig/)
    TriG,
    /// [Turtle](https://www.w3.org/TR/turtle/)
    Turtle,
}

impl RdfFormat {
    /// The format name.
    ///
    /// ```
    /// use rdfio::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::NTriples.name(), "N-Triples")
    /// ```
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::JsonLd => "JSON-LD",
            Self::NQuads => "N-Quads",
            Self::NTriples => "N-Triples",
            Self::RdfXml => "RDF/XML",
            Self::TriG => "TriG",
            Self::Turtle => "Turtle",
        }
    }

    /// The format [IANA media type](https://tools.ietf.org/html/rfc2046).
    #[inline]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::JsonLd => "application/ld+json",
            Self::NQuads => "application/n-quads",
            Self::NTriples => "application/n-triples",
            Self::RdfXml => "application/rdf+xml",
            Self::TriG => "application/trig",
            Self::Turtle => "text/turtle",
        }
    }

    /// The format [IANA-registered](https://tools.ietf.org/html/rfc2046) file extension.
    #[inline]
    pub const fn file_extension(self) -> &'static str {
        match self {
            Self::JsonLd => "jsonld",
            Self::NQuads => "nq",
            Self::NTriples => "nt",
            Self::RdfXml => "rdf",
            Self::TriG => "trig",
            Self::Turtle => "ttl",
        }
    }

    /// Checks if the format can carry [RDF datasets](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset) and not only graphs.
    ///
    /// ```
    /// use rdfio::RdfFormat;
    ///
    /// assert!(!RdfFormat::NTriples.supports_datasets());
    /// assert!(RdfFormat::NQuads.supports_datasets());
    /// ```
    #[inline]
    pub const fn supports_datasets(self) -> bool {
        matches!(self, Self::JsonLd | Self::NQuads | Self::TriG)
    }

    /// Looks up a format from its stable identifier, case-insensitively.
    ///
    /// Recognized identifiers and aliases: `turtle`/`ttl`, `ntriples`/`nt`,
    /// `rdfxml`/`rdf`/`xml`, `jsonld`/`json-ld`/`json`, `trig`,
    /// `nquads`/`nq`. The empty string and `auto` return `None`, requesting
    /// auto-detection.
    ///
    /// ```
    /// use rdfio::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::from_name("TTL"), Some(RdfFormat::Turtle));
    /// assert_eq!(RdfFormat::from_name("json-ld"), Some(RdfFormat::JsonLd));
    /// assert_eq!(RdfFormat::from_name("auto"), None);
    /// assert_eq!(RdfFormat::from_name("csv"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, RdfFormat); 13] = [
            ("json", RdfFormat::JsonLd),
            ("json-ld", RdfFormat::JsonLd),
            ("jsonld", RdfFormat::JsonLd),
            ("nq", RdfFormat::NQuads),
            ("nquads", RdfFormat::NQuads),
            ("nt", RdfFormat::NTriples),
            ("ntriples", RdfFormat::NTriples),
            ("rdf", RdfFormat::RdfXml),
            ("rdfxml", RdfFormat::RdfXml),
            ("trig", RdfFormat::TriG),
            ("ttl", RdfFormat::Turtle),
            ("turtle", RdfFormat::Turtle),
            ("xml", RdfFormat::RdfXml),
        ];
        NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, format)| *format)
    }

    /// Checks whether the identifier requests auto-detection (`""`/`auto`).
    pub fn is_auto_name(name: &str) -> bool {
        name.is_empty() || name.eq_ignore_ascii_case("auto")
    }

    /// Looks up a format from a file extension alias.
    ///
    /// ```
    /// use rdfio::RdfFormat;
    ///
    /// assert_eq!(RdfFormat::from_extension("nt"), Some(RdfFormat::NTriples));
    /// ```
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::from_name(extension)
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Guesses the format from the first bytes of the document.
///
/// The guess is advisory: ambiguity resolves by trying the most common
/// syntactic signal first, and N-Triples is the fallback.
pub(crate) fn detect_format(window: &[u8]) -> RdfFormat {
    let text = String::from_utf8_lossy(window);
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return RdfFormat::JsonLd;
    }
    if trimmed.starts_with("<?xml") || trimmed.starts_with("<rdf:") || trimmed.starts_with("<!")
    {
        return RdfFormat::RdfXml;
    }
    if has_terse_directive(&text) {
        return if brace_outside_iris(&text) {
            RdfFormat::TriG
        } else {
            RdfFormat::Turtle
        };
    }
    if let Some(line) = first_meaningful_line(&text) {
        if brace_outside_iris(line) {
            return RdfFormat::TriG;
        }
        if count_top_level_terms(line) == 4 {
            return RdfFormat::NQuads;
        }
    }
    RdfFormat::NTriples
}

fn has_terse_directive(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("@prefix")
            || line.starts_with("@base")
            || line.starts_with("@version")
            || starts_with_keyword(line, "prefix")
            || starts_with_keyword(line, "base")
    })
}

fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.len() > keyword.len()
        && line.as_bytes()[..keyword.len()].eq_ignore_ascii_case(keyword.as_bytes())
        && line[keyword.len()..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace)
}

fn first_meaningful_line(text: &str) -> Option<&str> {
    text.lines().find(|line| {
        let line = line.trim_start();
        !line.is_empty() && !line.starts_with('#')
    })
}

/// `{` outside `<…>` and string quotes hints at TriG graph blocks.
fn brace_outside_iris(text: &str) -> bool {
    let mut in_iri = false;
    let mut in_string = false;
    for byte in text.bytes() {
        match byte {
            b'<' if !in_string => in_iri = true,
            b'>' if !in_string => in_iri = false,
            b'"' if !in_iri => in_string = !in_string,
            b'{' if !in_iri && !in_string => return true,
            _ => (),
        }
    }
    false
}

/// Counts the terms of the first statement of a line-oriented document.
fn count_top_level_terms(line: &str) -> usize {
    let mut terms = 0;
    let mut bytes = line.bytes().peekable();
    while let Some(byte) = bytes.next() {
        match byte {
            b' ' | b'\t' => (),
            b'.' => break,
            b'<' => {
                // may be an IRI or a quoted triple; both count as one term
                let mut depth = 0;
                if bytes.peek() == Some(&b'<') {
                    depth = 1;
                    while let Some(b) = bytes.next() {
                        match b {
                            b'<' if bytes.peek() == Some(&b'<') => {
                                depth += 1;
                                bytes.next();
                            }
                            b'>' if bytes.peek() == Some(&b'>') => {
                                bytes.next();
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            _ => (),
                        }
                    }
                } else {
                    for b in bytes.by_ref() {
                        if b == b'>' {
                            break;
                        }
                    }
                }
                terms += 1;
            }
            b'"' => {
                let mut escaped = false;
                for b in bytes.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == b'"' {
                        break;
                    }
                }
                // skip a datatype or language suffix
                while let Some(&b) = bytes.peek() {
                    if b == b' ' || b == b'\t' || b == b'.' {
                        break;
                    }
                    bytes.next();
                }
                terms += 1;
            }
            b'#' => break,
            _ => {
                while let Some(&b) = bytes.peek() {
                    if b == b' ' || b == b'\t' {
                        break;
                    }
                    bytes.next();
                }
                terms += 1;
            }
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(RdfFormat::from_name("NTriples"), Some(RdfFormat::NTriples));
        assert_eq!(RdfFormat::from_name("NQ"), Some(RdfFormat::NQuads));
        assert_eq!(RdfFormat::from_name("XML"), Some(RdfFormat::RdfXml));
        assert!(RdfFormat::is_auto_name(""));
        assert!(RdfFormat::is_auto_name("Auto"));
        assert!(!RdfFormat::is_auto_name("nt"));
    }

    #[test]
    fn detection_rules() {
        assert_eq!(detect_format(b"  {\"@id\": \"x\"}"), RdfFormat::JsonLd);
        assert_eq!(detect_format(b"[{}]"), RdfFormat::JsonLd);
        assert_eq!(detect_format(b"<?xml version=\"1.0\"?>"), RdfFormat::RdfXml);
        assert_eq!(detect_format(b"<rdf:RDF xmlns:rdf=\"x\">"), RdfFormat::RdfXml);
        assert_eq!(
            detect_format(b"@prefix ex: <http://ex/> .\nex:s ex:p ex:o ."),
            RdfFormat::Turtle
        );
        assert_eq!(
            detect_format(b"PREFIX ex: <http://ex/>\nex:g { ex:s ex:p ex:o . }"),
            RdfFormat::TriG
        );
        assert_eq!(
            detect_format(b"<http://ex/s> <http://ex/p> <http://ex/o> <http://ex/g> ."),
            RdfFormat::NQuads
        );
        assert_eq!(
            detect_format(b"<http://ex/s> <http://ex/p> \"v\"@en ."),
            RdfFormat::NTriples
        );
        assert_eq!(detect_format(b""), RdfFormat::NTriples);
    }
}
