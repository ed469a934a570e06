use crate::named_node::{NamedNode, NamedNodeRef};
use crate::vocab::{rdf, xsd};
use oxilangtag::LanguageTag;
pub use oxilangtag::LanguageTagParseError;
use std::fmt;
use std::fmt::Write;

/// An owned RDF [literal](https://www.w3.org/TR/rdf11-concepts/#dfn-literal).
///
/// The default string formatter returns the N-Triples representation:
/// ```
/// use rdfio_model::Literal;
/// use rdfio_model::vocab::xsd;
///
/// assert_eq!(
///     "\"foo\\nbar\"",
///     Literal::new_simple_literal("foo\nbar").to_string()
/// );
/// assert_eq!(
///     r#""1999-01-01"^^<http://www.w3.org/2001/XMLSchema#date>"#,
///     Literal::new_typed_literal("1999-01-01", xsd::DATE).to_string()
/// );
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Literal(LiteralContent);

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
enum LiteralContent {
    String(String),
    LanguageTaggedString {
        value: String,
        language: String,
    },
    DirectionalLanguageTaggedString {
        value: String,
        language: String,
        direction: BaseDirection,
    },
    TypedLiteral {
        value: String,
        datatype: NamedNode,
    },
}

impl Literal {
    /// Builds an RDF [simple literal](https://www.w3.org/TR/rdf11-concepts/#dfn-simple-literal).
    #[inline]
    pub fn new_simple_literal(value: impl Into<String>) -> Self {
        Self(LiteralContent::String(value.into()))
    }

    /// Builds an RDF [literal](https://www.w3.org/TR/rdf11-concepts/#dfn-literal) with a [datatype](https://www.w3.org/TR/rdf11-concepts/#dfn-datatype-iri).
    ///
    /// `xsd:string` is normalized to a simple literal. The implied datatypes
    /// `rdf:langString` and `rdf:dirLangString` must not be passed here;
    /// parsers reject them before reaching this constructor.
    #[inline]
    pub fn new_typed_literal(value: impl Into<String>, datatype: impl Into<NamedNode>) -> Self {
        let value = value.into();
        let datatype = datatype.into();
        Self(if datatype == xsd::STRING {
            LiteralContent::String(value)
        } else {
            LiteralContent::TypedLiteral { value, datatype }
        })
    }

    /// Builds an RDF [language-tagged string](https://www.w3.org/TR/rdf11-concepts/#dfn-language-tagged-string).
    ///
    /// The language tag is validated and converted to lowercase.
    #[inline]
    pub fn new_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, LanguageTagParseError> {
        let mut language = language.into();
        language.make_ascii_lowercase();
        LanguageTag::parse(language.as_str())?;
        Ok(Self::new_language_tagged_literal_unchecked(value, language))
    }

    /// Builds an RDF [language-tagged string](https://www.w3.org/TR/rdf11-concepts/#dfn-language-tagged-string) without checking the language tag.
    ///
    /// It is the caller's responsibility to check that `language` is valid
    /// and lowercase.
    #[inline]
    pub fn new_language_tagged_literal_unchecked(
        value: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self(LiteralContent::LanguageTaggedString {
            value: value.into(),
            language: language.into(),
        })
    }

    /// Builds an RDF [directional language-tagged string](https://www.w3.org/TR/rdf12-concepts/#dfn-dir-lang-string).
    #[inline]
    pub fn new_directional_language_tagged_literal(
        value: impl Into<String>,
        language: impl Into<String>,
        direction: BaseDirection,
    ) -> Result<Self, LanguageTagParseError> {
        let mut language = language.into();
        language.make_ascii_lowercase();
        LanguageTag::parse(language.as_str())?;
        Ok(Self::new_directional_language_tagged_literal_unchecked(
            value, language, direction,
        ))
    }

    /// Builds an RDF [directional language-tagged string](https://www.w3.org/TR/rdf12-concepts/#dfn-dir-lang-string) without checking the language tag.
    #[inline]
    pub fn new_directional_language_tagged_literal_unchecked(
        value: impl Into<String>,
        language: impl Into<String>,
        direction: BaseDirection,
    ) -> Self {
        Self(LiteralContent::DirectionalLanguageTaggedString {
            value: value.into(),
            language: language.into(),
            direction,
        })
    }

    /// The literal [lexical form](https://www.w3.org/TR/rdf11-concepts/#dfn-lexical-form).
    #[inline]
    pub fn value(&self) -> &str {
        match &self.0 {
            LiteralContent::String(value)
            | LiteralContent::LanguageTaggedString { value, .. }
            | LiteralContent::DirectionalLanguageTaggedString { value, .. }
            | LiteralContent::TypedLiteral { value, .. } => value,
        }
    }

    /// The literal [language tag](https://www.w3.org/TR/rdf11-concepts/#dfn-language-tag) if it is a language-tagged string.
    #[inline]
    pub fn language(&self) -> Option<&str> {
        match &self.0 {
            LiteralContent::LanguageTaggedString { language, .. }
            | LiteralContent::DirectionalLanguageTaggedString { language, .. } => Some(language),
            LiteralContent::String(_) | LiteralContent::TypedLiteral { .. } => None,
        }
    }

    /// The literal [base direction](https://www.w3.org/TR/rdf12-concepts/#dfn-base-direction) if it is a directional language-tagged string.
    #[inline]
    pub fn direction(&self) -> Option<BaseDirection> {
        match &self.0 {
            LiteralContent::DirectionalLanguageTaggedString { direction, .. } => Some(*direction),
            LiteralContent::String(_)
            | LiteralContent::LanguageTaggedString { .. }
            | LiteralContent::TypedLiteral { .. } => None,
        }
    }

    /// The literal [datatype](https://www.w3.org/TR/rdf11-concepts/#dfn-datatype-iri).
    ///
    /// Language-tagged strings implicitly carry `rdf:langString`, directional
    /// ones `rdf:dirLangString` and simple literals `xsd:string`.
    #[inline]
    pub fn datatype(&self) -> NamedNodeRef<'_> {
        match &self.0 {
            LiteralContent::String(_) => xsd::STRING,
            LiteralContent::LanguageTaggedString { .. } => rdf::LANG_STRING,
            LiteralContent::DirectionalLanguageTaggedString { .. } => rdf::DIR_LANG_STRING,
            LiteralContent::TypedLiteral { datatype, .. } => datatype.as_ref(),
        }
    }

    /// Checks if it is a plain `xsd:string` literal.
    #[inline]
    pub fn is_plain(&self) -> bool {
        matches!(self.0, LiteralContent::String(_))
    }

    #[inline]
    pub fn into_value(self) -> String {
        match self.0 {
            LiteralContent::String(value)
            | LiteralContent::LanguageTaggedString { value, .. }
            | LiteralContent::DirectionalLanguageTaggedString { value, .. }
            | LiteralContent::TypedLiteral { value, .. } => value,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_quoted_str(self.value(), f)?;
        match &self.0 {
            LiteralContent::String(_) => Ok(()),
            LiteralContent::LanguageTaggedString { language, .. } => write!(f, "@{language}"),
            LiteralContent::DirectionalLanguageTaggedString {
                language,
                direction,
                ..
            } => write!(f, "@{language}--{direction}"),
            LiteralContent::TypedLiteral { datatype, .. } => write!(f, "^^{datatype}"),
        }
    }
}

impl From<&str> for Literal {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new_simple_literal(value)
    }
}

impl From<String> for Literal {
    #[inline]
    fn from(value: String) -> Self {
        Self::new_simple_literal(value)
    }
}

impl From<bool> for Literal {
    #[inline]
    fn from(value: bool) -> Self {
        Self::new_typed_literal(value.to_string(), xsd::BOOLEAN)
    }
}

impl From<i64> for Literal {
    #[inline]
    fn from(value: i64) -> Self {
        Self::new_typed_literal(value.to_string(), xsd::INTEGER)
    }
}

/// The initial [base direction](https://www.w3.org/TR/rdf12-concepts/#dfn-base-direction) of a directional language-tagged string.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum BaseDirection {
    /// Left to right.
    Ltr,
    /// Right to left.
    Rtl,
}

impl BaseDirection {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }

    /// Parses `"ltr"` or `"rtl"`.
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "ltr" => Some(Self::Ltr),
            "rtl" => Some(Self::Rtl),
            _ => None,
        }
    }
}

impl fmt::Display for BaseDirection {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Splits an optional `--ltr`/`--rtl` suffix off a language tag and validates
/// the remainder, returning the lowercase tag and the direction.
///
/// ```
/// use rdfio_model::{parse_language_tag, BaseDirection};
///
/// let (tag, direction) = parse_language_tag("en-Latn--rtl")?;
/// assert_eq!(tag, "en-latn");
/// assert_eq!(direction, Some(BaseDirection::Rtl));
/// # Result::<_, rdfio_model::LanguageTagParseError>::Ok(())
/// ```
pub fn parse_language_tag(
    tag: &str,
) -> Result<(String, Option<BaseDirection>), LanguageTagParseError> {
    let (tag, direction) = match tag.rsplit_once("--") {
        Some((prefix, suffix)) => match BaseDirection::from_str_opt(suffix) {
            Some(direction) => (prefix, Some(direction)),
            // Not a direction suffix: let the validator see the full tag.
            None => (tag, None),
        },
        None => (tag, None),
    };
    let mut tag = tag.to_owned();
    tag.make_ascii_lowercase();
    LanguageTag::parse(tag.as_str())?;
    Ok((tag, direction))
}

#[inline]
pub(crate) fn print_quoted_str(string: &str, f: &mut impl Write) -> fmt::Result {
    f.write_char('"')?;
    for c in string.chars() {
        match c {
            '\u{08}' => f.write_str("\\b"),
            '\t' => f.write_str("\\t"),
            '\n' => f.write_str("\\n"),
            '\u{0C}' => f.write_str("\\f"),
            '\r' => f.write_str("\\r"),
            '"' => f.write_str("\\\""),
            '\\' => f.write_str("\\\\"),
            '\0'..='\u{1F}' | '\u{7F}' => write!(f, "\\u{:04X}", u32::from(c)),
            _ => f.write_char(c),
        }?;
    }
    f.write_char('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_literal_display() {
        assert_eq!(r#""fo\"o""#, Literal::new_simple_literal("fo\"o").to_string());
    }

    #[test]
    fn language_tag_is_lowercased() {
        let literal = Literal::new_language_tagged_literal("v", "EN-us").unwrap();
        assert_eq!(literal.language(), Some("en-us"));
        assert_eq!(r#""v"@en-us"#, literal.to_string());
    }

    #[test]
    fn directional_literal_display() {
        let literal =
            Literal::new_directional_language_tagged_literal("v", "en", BaseDirection::Ltr)
                .unwrap();
        assert_eq!(r#""v"@en--ltr"#, literal.to_string());
        assert_eq!(literal.datatype(), rdf::DIR_LANG_STRING);
    }

    #[test]
    fn xsd_string_is_normalized_to_simple() {
        let literal = Literal::new_typed_literal("v", xsd::STRING);
        assert!(literal.is_plain());
        assert_eq!("\"v\"", literal.to_string());
    }

    #[test]
    fn direction_suffix_splitting() {
        assert_eq!(
            parse_language_tag("en--ltr").unwrap(),
            ("en".to_owned(), Some(BaseDirection::Ltr))
        );
        assert_eq!(parse_language_tag("en").unwrap(), ("en".to_owned(), None));
        assert!(parse_language_tag("en--").is_err());
        assert!(parse_language_tag("--ltr").is_err());
    }
}
