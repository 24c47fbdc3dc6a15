//! Error types for entry readers and writers.
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! side is the single [`Error`] enum below.
//!
//! ## Error Categories
//!
//! - **Construction errors**: the structure descriptor cannot produce a codec
//!   ([`Error::MissingFormat`], [`Error::SchemaRequired`], [`Error::InvalidSchema`],
//!   [`Error::InvalidConfig`], [`Error::UnsupportedFormat`])
//! - **Decode errors**: a JSON token is malformed ([`Error::MalformedToken`]) or a CSV
//!   record cannot be split ([`Error::Tabular`])
//! - **Encode errors**: an entry does not fit the container ([`Error::ShapeMismatch`],
//!   [`Error::KeyViolation`])
//! - **Conversion errors**: a value is not of the requested kind ([`Error::TypeMismatch`])
//! - **I/O errors**: propagated verbatim from the caller's stream ([`Error::Io`])
//!
//! End of stream is not an error: readers return `Ok(None)`.
//!
//! ## Examples
//!
//! ```rust
//! use dsio::{new_reader, Error, Structure};
//!
//! let err = new_reader(&Structure::default(), &b""[..]).err().unwrap();
//! assert!(matches!(err, Error::MissingFormat));
//! assert_eq!(err.to_string(), "structure must have a data format");
//! ```

use crate::DataFormat;
use std::fmt;
use std::io;
use thiserror::Error;

/// Represents all possible errors raised while building, reading or writing
/// entry streams.
#[derive(Debug, Error)]
pub enum Error {
    /// The structure descriptor carries no format identifier.
    #[error("structure must have a data format")]
    MissingFormat,

    /// The format identifier is not one this crate knows.
    #[error("unknown data format: {0:?}")]
    UnknownFormat(String),

    /// The format is known but has no codec here.
    #[error("data format {0} is not supported by entry readers and writers")]
    UnsupportedFormat(DataFormat),

    /// JSON codecs need a schema to choose their top-level container.
    #[error("schema required for {0} data")]
    SchemaRequired(DataFormat),

    /// The schema does not declare a usable top-level type.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A format configuration value has the wrong type or shape.
    #[error("invalid format config: {0}")]
    InvalidConfig(String),

    /// JSON input did not match the expected token.
    #[error("malformed token at byte {offset}: {msg}")]
    MalformedToken { offset: u64, msg: String },

    /// A CSV row was requested from a value that is not an array.
    #[error("expected array value to write row, got {0}")]
    ShapeMismatch(String),

    /// A [`Value`](crate::Value) could not be converted to the requested
    /// Rust type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// An object entry key was empty or already written.
    #[error("{0}")]
    KeyViolation(String),

    /// The CSV layer rejected a record.
    #[error("csv record error at line {line}: {msg}")]
    Tabular { line: u64, msg: String },

    /// The writer was already closed.
    #[error("writer is closed")]
    Closed,

    /// I/O error from the underlying stream.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Creates a malformed token error at the given input offset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dsio::Error;
    ///
    /// let err = Error::malformed(7, "expected separator ','");
    /// assert!(err.to_string().contains("byte 7"));
    /// ```
    pub fn malformed<T: fmt::Display>(offset: u64, msg: T) -> Self {
        Error::MalformedToken {
            offset,
            msg: msg.to_string(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidConfig(msg.to_string())
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidSchema(msg.to_string())
    }

    /// Creates a key violation error.
    pub fn key_violation<T: fmt::Display>(msg: T) -> Self {
        Error::KeyViolation(msg.to_string())
    }

    /// Returns `true` if this error came from the caller's stream.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map_or(0, csv::Position::line);
        let msg = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => match quote_error(&e).map(|q| (q.line, q.msg)) {
                Some((line, msg)) => Error::Tabular {
                    line,
                    msg: msg.to_string(),
                },
                None => Error::Io(e),
            },
            _ => Error::Tabular { line, msg },
        }
    }
}

/// A quote refused by strict CSV parsing travels through the csv layer as an
/// I/O error.
fn quote_error(err: &io::Error) -> Option<&crate::tabular::QuoteError> {
    err.get_ref()?.downcast_ref()
}

pub type Result<T> = std::result::Result<T, Error>;
