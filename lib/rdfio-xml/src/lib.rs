#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod parser;
mod serializer;

pub use crate::parser::{RdfXmlParser, ReaderRdfXmlParser};
pub use crate::serializer::{RdfXmlSerializer, WriterRdfXmlSerializer};
