//! Streaming codec for CSV dataset bodies.
//!
//! Every record is an ordered entry whose value is an array of fields.
//! [`TabularReader`] coerces fields to the column types declared at
//! `schema.items.items`; [`TabularWriter`] renders values back to text.
//! Quoting, escaping and delimiter handling come from the `csv` crate, with
//! options taken from the structure's [`CsvOptions`](crate::CsvOptions).
//! Unless `lazy_quotes` is set, a quote inside an unquoted field or an
//! undoubled quote inside a quoted field fails the read.

mod reader;
mod replace_cr;
mod strict_quotes;
mod writer;

pub use reader::TabularReader;
pub use replace_cr::ReplaceCr;
pub use writer::TabularWriter;

pub(crate) use strict_quotes::QuoteError;
