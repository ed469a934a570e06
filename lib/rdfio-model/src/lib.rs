#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod blank_node;
mod config;
mod error;
mod literal;
mod named_node;
mod sink;
mod triple;
pub mod vocab;

pub use crate::blank_node::{BlankNode, BlankNodeGenerator, BlankNodeIdParseError};
pub use crate::config::{
    Cancellation, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LINE_BYTES, DEFAULT_MAX_STATEMENT_BYTES,
    DEFAULT_MAX_STATEMENTS, ParserConfig,
};
pub use crate::error::{ErrorKind, RdfParseError, TextPosition};
pub use crate::literal::{BaseDirection, Literal, parse_language_tag};
pub use crate::named_node::{NamedNode, NamedNodeRef};
pub use crate::sink::{SinkState, missing_fields_error, validate_statement};
pub use crate::triple::{GraphName, Statement, Subject, Term, Triple};
pub use oxilangtag::LanguageTagParseError;
pub use oxiri::IriParseError;
