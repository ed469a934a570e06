#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod context;
mod document;
mod json;
mod parser;
mod serializer;

pub use crate::document::{DocumentLoader, RemoteDocument};
pub use crate::parser::{JsonLdParser, ReaderJsonLdParser};
pub use crate::serializer::{JsonLdSerializer, WriterJsonLdSerializer};

pub(crate) const FORMAT: &str = "JSON-LD";
