//! Streaming codec for JSON dataset bodies.
//!
//! A JSON body is a single top-level object or array whose members are the
//! entries. [`DocumentReader`] pulls one entry at a time out of an
//! arbitrarily large body and [`DocumentWriter`] emits one entry at a time,
//! so neither side ever holds the whole container in memory.
//!
//! The wire text is compact JSON with no insignificant whitespace. Reading
//! accepts any whitespace between tokens.

mod lookahead;
mod reader;
mod writer;

pub use reader::DocumentReader;
pub use writer::{write_value, DocumentWriter};

use crate::{Error, Result, Value};
use lookahead::DEFAULT_BLOCK_SIZE;
use reader::Tokenizer;

/// Decodes one complete JSON value from `bytes`.
///
/// Only whitespace may follow the value. Used to coerce CSV fields declared
/// as objects or arrays.
pub(crate) fn parse_value(bytes: &[u8]) -> Result<Value> {
    let mut tokens = Tokenizer::new(bytes, DEFAULT_BLOCK_SIZE);
    let value = tokens.read_value()?;
    if !tokens.at_end()? {
        return Err(Error::malformed(tokens.offset(), "trailing characters after value"));
    }
    Ok(value)
}
