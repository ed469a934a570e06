#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod line_formats;
mod nquads;
mod ntriples;
mod terse;
pub mod toolkit;
mod trig;
mod turtle;

pub use crate::nquads::{NQuadsParser, NQuadsSerializer, ReaderNQuadsParser, WriterNQuadsSerializer};
pub use crate::ntriples::{
    NTriplesParser, NTriplesSerializer, ReaderNTriplesParser, WriterNTriplesSerializer,
};
pub use crate::trig::{ReaderTriGParser, TriGParser, TriGSerializer, WriterTriGSerializer};
pub use crate::turtle::{
    ReaderTurtleParser, TurtleParser, TurtleSerializer, WriterTurtleSerializer,
};
