use json_event_parser::{JsonEvent, ReaderJsonParser};
use rdfio_model::{ParserConfig, RdfParseError};
use std::io::{self, Read};

use crate::FORMAT;

/// A JSON value tree preserving object key order, so emission can follow
/// document order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JsonNode {
    String(String),
    Number(String),
    Boolean(bool),
    Null,
    Array(Vec<JsonNode>),
    Object(Vec<(String, JsonNode)>),
}

impl JsonNode {
    pub fn get(&self, key: &str) -> Option<&JsonNode> {
        match self {
            Self::Object(entries) => entries
                .iter()
                .find_map(|(k, v)| (k == key).then_some(v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Null => "null",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

/// Reads a whole JSON document into a [`JsonNode`], applying the document
/// byte cap and the nesting depth cap.
pub(crate) fn read_json_tree(
    reader: impl Read,
    config: &ParserConfig,
) -> Result<JsonNode, RdfParseError> {
    let mut parser = ReaderJsonParser::new(LimitedReader {
        inner: reader,
        remaining: config.max_statement_bytes(),
    });
    let mut stack: Vec<JsonNode> = Vec::new();
    let mut pending_key: Vec<Option<String>> = Vec::new();
    loop {
        let event = parser.parse_next().map_err(map_json_error)?;
        let completed = match event {
            JsonEvent::Eof => {
                return Err(RdfParseError::syntax(FORMAT, "empty JSON document"));
            }
            JsonEvent::Null => Some(JsonNode::Null),
            JsonEvent::Boolean(value) => Some(JsonNode::Boolean(value)),
            JsonEvent::Number(value) => Some(JsonNode::Number(value.into_owned())),
            JsonEvent::String(value) => Some(JsonNode::String(value.into_owned())),
            JsonEvent::StartArray => {
                stack.push(JsonNode::Array(Vec::new()));
                pending_key.push(None);
                check_depth(stack.len(), config)?;
                None
            }
            JsonEvent::StartObject => {
                stack.push(JsonNode::Object(Vec::new()));
                pending_key.push(None);
                check_depth(stack.len(), config)?;
                None
            }
            JsonEvent::ObjectKey(key) => {
                if let Some(slot) = pending_key.last_mut() {
                    *slot = Some(key.into_owned());
                }
                None
            }
            JsonEvent::EndArray | JsonEvent::EndObject => {
                pending_key.pop();
                match stack.pop() {
                    Some(node) => Some(node),
                    None => {
                        return Err(RdfParseError::syntax(FORMAT, "unbalanced JSON document"));
                    }
                }
            }
        };
        let Some(completed) = completed else {
            continue;
        };
        let Some(parent) = stack.last_mut() else {
            // Completed the root value: the parser validates trailing input.
            match parser.parse_next().map_err(map_json_error)? {
                JsonEvent::Eof => return Ok(completed),
                _ => {
                    return Err(RdfParseError::syntax(
                        FORMAT,
                        "unexpected content after the JSON document",
                    ));
                }
            }
        };
        match parent {
            JsonNode::Array(values) => values.push(completed),
            JsonNode::Object(entries) => {
                let Some(key) = pending_key.last_mut().and_then(Option::take) else {
                    return Err(RdfParseError::syntax(FORMAT, "JSON object value without key"));
                };
                entries.push((key, completed));
            }
            _ => {
                return Err(RdfParseError::syntax(FORMAT, "malformed JSON event stream"));
            }
        }
    }
}

/// Parses a standalone JSON slice (remote context documents).
pub(crate) fn read_json_slice(
    data: &[u8],
    config: &ParserConfig,
) -> Result<JsonNode, RdfParseError> {
    read_json_tree(data, config)
}

fn check_depth(depth: usize, config: &ParserConfig) -> Result<(), RdfParseError> {
    if depth > config.max_depth() {
        Err(RdfParseError::depth_exceeded(FORMAT, config.max_depth()))
    } else {
        Ok(())
    }
}

fn map_json_error(error: json_event_parser::JsonParseError) -> RdfParseError {
    match error {
        // io() unwraps a wrapped RdfParseError, keeping the limit kinds.
        json_event_parser::JsonParseError::Io(e) => RdfParseError::io(FORMAT, e),
        json_event_parser::JsonParseError::Syntax(e) => {
            RdfParseError::syntax(FORMAT, e.to_string())
        }
    }
}

/// Fails once more than the configured number of bytes was read, which bounds
/// the buffered document size.
struct LimitedReader<R: Read> {
    inner: R,
    remaining: usize,
}

impl<R: Read> Read for LimitedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(RdfParseError::statement_too_long(FORMAT, 0).into());
        }
        let window = self.remaining.min(buf.len());
        let read = self.inner.read(&mut buf[..window])?;
        self.remaining -= read;
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdfio_model::ErrorKind;

    #[test]
    fn builds_a_tree_preserving_key_order() {
        let node =
            read_json_tree(br#"{"b": 1, "a": [true, null, "x"]}"#.as_slice(), &ParserConfig::new())
                .unwrap();
        let JsonNode::Object(entries) = &node else {
            panic!("expected an object");
        };
        assert_eq!(entries[0].0, "b");
        assert_eq!(entries[1].0, "a");
        assert_eq!(
            node.get("a"),
            Some(&JsonNode::Array(vec![
                JsonNode::Boolean(true),
                JsonNode::Null,
                JsonNode::String("x".to_owned())
            ]))
        );
    }

    #[test]
    fn depth_cap_applies() {
        let error = read_json_tree(
            br#"[[[[[1]]]]]"#.as_slice(),
            &ParserConfig::new().with_max_depth(3),
        )
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DepthExceeded);
    }

    #[test]
    fn byte_cap_applies() {
        let data = format!(r#"{{"k": "{}"}}"#, "x".repeat(1000));
        let error = read_json_tree(
            data.as_bytes(),
            &ParserConfig::new().with_max_statement_bytes(100),
        )
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::StatementTooLong);
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(read_json_tree(br#"{} {}"#.as_slice(), &ParserConfig::new()).is_err());
    }
}
