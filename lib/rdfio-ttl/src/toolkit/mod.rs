//! Shared plumbing for the line-oriented and terse RDF syntaxes: the capped
//! physical-line reader, the logical-statement accumulator and the byte
//! cursor with escape decoding and name character tables.

mod cursor;
mod line_reader;
mod statement_buffer;

pub use cursor::{
    Cursor, check_absolute_iri, is_pn_chars, is_pn_chars_base, is_pn_chars_u, looks_absolute,
    resolve_iri,
};
pub use line_reader::LineReader;
pub use statement_buffer::StatementBuffer;
