#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod format;
mod parser;
mod serializer;

pub use crate::format::RdfFormat;
pub use crate::parser::{RdfParser, StatementChannel, StatementReader};
pub use crate::serializer::{RdfSerializer, StatementWriter};
pub use rdfio_jsonld::{DocumentLoader, RemoteDocument};
pub use rdfio_model::{
    Cancellation, ErrorKind, ParserConfig, RdfParseError, Statement, TextPosition,
};

/// The RDF data model types re-exported for convenience.
pub mod model {
    pub use rdfio_model::*;
}
