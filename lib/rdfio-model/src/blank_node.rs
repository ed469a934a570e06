use rand::random;
use std::fmt;

/// An owned RDF [blank node](https://www.w3.org/TR/rdf11-concepts/#dfn-blank-node).
///
/// The common way to create a new blank node is to use the
/// [`BlankNode::default()`] function. Parsers that need a stream of fresh
/// nodes scoped to one document should use a [`BlankNodeGenerator`] instead.
///
/// The default string formatter returns the N-Triples representation:
/// ```
/// use rdfio_model::BlankNode;
///
/// assert_eq!("_:a122", BlankNode::new("a122")?.to_string());
/// # Result::<_, rdfio_model::BlankNodeIdParseError>::Ok(())
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Clone, Hash)]
pub struct BlankNode {
    id: String,
}

impl BlankNode {
    /// Creates a blank node from an identifier.
    ///
    /// The identifier must be valid according to the N-Triples, Turtle and
    /// SPARQL `BLANK_NODE_LABEL` grammars.
    pub fn new(id: impl Into<String>) -> Result<Self, BlankNodeIdParseError> {
        let id = id.into();
        validate_blank_node_identifier(&id)?;
        Ok(Self::new_unchecked(id))
    }

    /// Creates a blank node from an identifier without validation.
    ///
    /// [`BlankNode::new()`] is a safe version of this constructor and should
    /// be used on untrusted data.
    #[inline]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.id
    }
}

impl fmt::Display for BlankNode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.id)
    }
}

impl Default for BlankNode {
    /// Builds a new blank node with a unique id.
    fn default() -> Self {
        // The id must not start with a digit to also be a valid XML name.
        loop {
            let id = format!("{:x}", random::<u128>());
            if matches!(id.as_bytes().first(), Some(b'a'..=b'f')) {
                return Self { id };
            }
        }
    }
}

/// Mints fresh blank nodes scoped to a single decoder instance.
///
/// Identifiers are a random per-generator prefix followed by a monotonic
/// counter, so two generators never produce the same id and generated ids do
/// not collide with labels read from the input.
///
/// ```
/// use rdfio_model::BlankNodeGenerator;
///
/// let mut generator = BlankNodeGenerator::new();
/// assert_ne!(generator.next_node(), generator.next_node());
/// ```
#[derive(Debug, Clone)]
pub struct BlankNodeGenerator {
    prefix: String,
    counter: u64,
}

impl BlankNodeGenerator {
    pub fn new() -> Self {
        // Same leading-letter constraint as BlankNode::default.
        loop {
            let prefix = format!("{:x}", random::<u64>());
            if matches!(prefix.as_bytes().first(), Some(b'a'..=b'f')) {
                return Self { prefix, counter: 0 };
            }
        }
    }

    /// Mints a new blank node, distinct from all earlier ones.
    pub fn next_node(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("{}n{}", self.prefix, self.counter));
        self.counter += 1;
        node
    }
}

impl Default for BlankNodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// An error raised when a [`BlankNode`] identifier is invalid.
#[derive(Debug, thiserror::Error)]
#[error("the blank node identifier {0:?} is invalid")]
pub struct BlankNodeIdParseError(String);

fn validate_blank_node_identifier(id: &str) -> Result<(), BlankNodeIdParseError> {
    let mut chars = id.chars();
    let front = chars
        .next()
        .ok_or_else(|| BlankNodeIdParseError(id.to_owned()))?;
    match front {
        '0'..='9'
        | '_'
        | ':'
        | 'A'..='Z'
        | 'a'..='z'
        | '\u{00C0}'..='\u{00D6}'
        | '\u{00D8}'..='\u{00F6}'
        | '\u{00F8}'..='\u{02FF}'
        | '\u{0370}'..='\u{037D}'
        | '\u{037F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}' => (),
        _ => return Err(BlankNodeIdParseError(id.to_owned())),
    }
    if id.ends_with('.') {
        return Err(BlankNodeIdParseError(id.to_owned()));
    }
    for c in chars {
        match c {
            '.' // not allowed in last position, checked above
            | '-' | '0'..='9' | '\u{00B7}' | '\u{0300}'..='\u{036F}' | '\u{203F}'..='\u{2040}' => (),
            '_'
            | ':'
            | 'A'..='Z'
            | 'a'..='z'
            | '\u{00C0}'..='\u{00D6}'
            | '\u{00D8}'..='\u{00F6}'
            | '\u{00F8}'..='\u{02FF}'
            | '\u{0370}'..='\u{037D}'
            | '\u{037F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}'
            | '\u{10000}'..='\u{EFFFF}' => (),
            _ => return Err(BlankNodeIdParseError(id.to_owned())),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identifiers() {
        assert!(BlankNode::new("a").is_ok());
        assert!(BlankNode::new("a122").is_ok());
        assert!(BlankNode::new("0a").is_ok());
        assert!(BlankNode::new("a.b").is_ok());
    }

    #[test]
    fn invalid_identifiers() {
        assert!(BlankNode::new("").is_err());
        assert!(BlankNode::new("a ").is_err());
        assert!(BlankNode::new("-a").is_err());
        assert!(BlankNode::new("a.").is_err());
    }

    #[test]
    fn generated_ids_are_distinct_and_valid() {
        let mut generator = BlankNodeGenerator::new();
        let a = generator.next_node();
        let b = generator.next_node();
        assert_ne!(a, b);
        assert!(BlankNode::new(a.as_str()).is_ok());
    }
}
