//! # dsio
//!
//! Streaming, schema-driven readers and writers for dataset bodies.
//!
//! A dataset body is a sequence of **entries** stored in some wire format.
//! A [`Structure`] names the format and carries a JSON-schema-like
//! description of the body; from it, [`new_reader`] and [`new_writer`] build
//! an [`EntryReader`] or [`EntryWriter`] that moves one [`Entry`] at a time,
//! so bodies of any size stream through in bounded memory.
//!
//! ## Formats
//!
//! - **CSV** ([`TabularReader`], [`TabularWriter`]): each record is an entry
//!   with an `index` and an array value. Fields are coerced to the column
//!   types declared at `schema.items.items`.
//! - **JSON** ([`DocumentReader`], [`DocumentWriter`]): the body is a single
//!   object or array chosen by the schema's top-level `"type"`. Object
//!   members become keyed entries; array elements become indexed entries.
//!
//! XLSX may be named in a structure but has no codec; asking for one
//! returns [`Error::UnsupportedFormat`].
//!
//! ## Quick Start
//!
//! ```rust
//! use dsio::{new_reader, new_writer, read_all, value, DataFormat, Entry, EntryWriter, Structure};
//!
//! let schema = value!({
//!     "type": "array",
//!     "items": {
//!         "type": "array",
//!         "items": [
//!             { "title": "n", "type": "integer" },
//!             { "title": "s", "type": "string" }
//!         ]
//!     }
//! });
//!
//! // Read CSV.
//! let csv = Structure::new(DataFormat::Csv).with_schema(schema.clone());
//! let mut reader = new_reader(&csv, &b"n,s\n1,foo\n"[..]).unwrap();
//! let entries = read_all(&mut reader).unwrap();
//! assert_eq!(entries[1], Entry::indexed(1, value!([1, "foo"])));
//!
//! // Write the same entries as JSON.
//! let json = Structure::new(DataFormat::Json).with_schema(schema);
//! let mut out = Vec::new();
//! let mut writer = new_writer(&json, &mut out).unwrap();
//! for entry in &entries {
//!     writer.write_entry(entry).unwrap();
//! }
//! writer.close().unwrap();
//! drop(writer);
//! assert_eq!(out, br#"[["n","s"],[1,"foo"]]"#);
//! ```
//!
//! ## Logging
//!
//! Codecs emit [`tracing`] events at `debug` (construction, rejected entries,
//! decode failures) and `trace` (CSV coercion fallbacks). The crate never
//! installs a subscriber.

pub mod document;
pub mod entry;
pub mod error;
pub mod macros;
pub mod map;
pub mod options;
pub mod structure;
pub mod tabular;
pub mod value;

pub use document::{write_value, DocumentReader, DocumentWriter};
pub use entry::{copy_entries, entries, read_all, Entries, Entry, EntryReader, EntryWriter};
pub use error::{Error, Result};
pub use map::Map;
pub use options::{CsvOptions, FormatConfig, JsonOptions, XlsxOptions};
pub use structure::{Column, ColumnType, ContainerKind, DataFormat, Structure};
pub use tabular::{ReplaceCr, TabularReader, TabularWriter};
pub use value::{Number, Value};

use std::io::{Read, Write};
use tracing::debug;

/// Builds an entry reader for `structure` over `source`.
///
/// # Errors
///
/// - [`Error::MissingFormat`] when the structure names no format
/// - [`Error::UnsupportedFormat`] for XLSX
/// - [`Error::SchemaRequired`] for JSON without a schema, and
///   [`Error::InvalidSchema`] when its top-level type is not object or array
/// - [`Error::InvalidConfig`] when the CSV options do not parse
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn new_reader<'a, R>(structure: &Structure, source: R) -> Result<Box<dyn EntryReader + 'a>>
where
    R: Read + 'a,
{
    let format = structure.data_format()?;
    debug!(%format, "building entry reader");
    match format {
        DataFormat::Csv => Ok(Box::new(TabularReader::new(structure, source)?)),
        DataFormat::Json => Ok(Box::new(DocumentReader::new(structure, source)?)),
        DataFormat::Xlsx => Err(Error::UnsupportedFormat(format)),
    }
}

/// Builds an entry writer for `structure` over `sink`.
///
/// Fails under the same conditions as [`new_reader`]. A CSV writer whose
/// options ask for a header row writes it before returning.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn new_writer<'a, W>(structure: &Structure, sink: W) -> Result<Box<dyn EntryWriter + 'a>>
where
    W: Write + 'a,
{
    let format = structure.data_format()?;
    debug!(%format, "building entry writer");
    match format {
        DataFormat::Csv => Ok(Box::new(TabularWriter::new(structure, sink)?)),
        DataFormat::Json => Ok(Box::new(DocumentWriter::new(structure, sink)?)),
        DataFormat::Xlsx => Err(Error::UnsupportedFormat(format)),
    }
}
