//! Quote validation for CSV input read without lazy quotes.
//!
//! The CSV layer always accepts a `"` inside an unquoted field and a lone
//! `"` inside a quoted one, folding both into the field text. [`StrictQuotes`]
//! sits in front of it and fails the stream at the first such quote instead.
//!
//! Bytes before the offending quote are still handed out, so every complete
//! record ahead of it decodes normally; the error surfaces on the read that
//! would have returned the quote.

use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Read};

/// A quote the strict reader refuses, with the 1-based line it sits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuoteError {
    pub(crate) line: u64,
    pub(crate) msg: &'static str,
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.msg)
    }
}

impl StdError for QuoteError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// Inside a quoted field, just after a `"`.
    QuoteInQuoted,
}

pub(crate) struct StrictQuotes<R> {
    inner: R,
    enabled: bool,
    delimiter: u8,
    state: State,
    line: u64,
    failed: Option<QuoteError>,
}

impl<R: Read> StrictQuotes<R> {
    /// With `enabled` false the filter passes bytes through untouched.
    pub(crate) fn new(inner: R, delimiter: u8, enabled: bool) -> Self {
        StrictQuotes {
            inner,
            enabled,
            delimiter,
            state: State::FieldStart,
            line: 1,
            failed: None,
        }
    }

    /// Advances over `bytes`, returning the index of the first refused quote.
    fn scan(&mut self, bytes: &[u8]) -> Option<(usize, QuoteError)> {
        for (i, &b) in bytes.iter().enumerate() {
            let terminator = b == self.delimiter || b == b'\n' || b == b'\r';
            self.state = match (self.state, b) {
                (State::FieldStart, b'"') => State::Quoted,
                (State::FieldStart, _) if terminator => State::FieldStart,
                (State::FieldStart, _) => State::Unquoted,
                (State::Unquoted, b'"') => {
                    return Some((i, self.error("bare \" in non-quoted field")));
                }
                (State::Unquoted, _) if terminator => State::FieldStart,
                (State::Unquoted, _) => State::Unquoted,
                (State::Quoted, b'"') => State::QuoteInQuoted,
                (State::Quoted, _) => State::Quoted,
                (State::QuoteInQuoted, b'"') => State::Quoted,
                (State::QuoteInQuoted, _) if terminator => State::FieldStart,
                (State::QuoteInQuoted, _) => {
                    return Some((i, self.error("extraneous or missing \" in quoted field")));
                }
            };
            if b == b'\n' {
                self.line += 1;
            }
        }
        None
    }

    fn error(&self, msg: &'static str) -> QuoteError {
        QuoteError {
            line: self.line,
            msg,
        }
    }
}

impl<R: Read> Read for StrictQuotes<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.enabled {
            return self.inner.read(buf);
        }
        if let Some(err) = &self.failed {
            return Err(io::Error::new(io::ErrorKind::InvalidData, err.clone()));
        }

        let n = self.inner.read(buf)?;
        if n == 0 {
            if matches!(self.state, State::Quoted) {
                let err = self.error("extraneous or missing \" in quoted field");
                self.failed = Some(err.clone());
                return Err(io::Error::new(io::ErrorKind::InvalidData, err));
            }
            return Ok(0);
        }

        match self.scan(&buf[..n]) {
            None => Ok(n),
            Some((at, err)) => {
                self.failed = Some(err.clone());
                if at > 0 {
                    Ok(at)
                } else {
                    Err(io::Error::new(io::ErrorKind::InvalidData, err))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> (String, Option<QuoteError>) {
        let mut filter = StrictQuotes::new(input.as_bytes(), b',', true);
        let mut out = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            match filter.read(&mut buf) {
                Ok(0) => return (String::from_utf8(out).unwrap(), None),
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) => {
                    let quote = e
                        .get_ref()
                        .and_then(|inner| inner.downcast_ref::<QuoteError>())
                        .cloned();
                    return (String::from_utf8(out).unwrap(), quote);
                }
            }
        }
    }

    #[test]
    fn test_well_formed_quotes_pass() {
        let input = "a,\"b,c\",\"d\"\"e\"\n\"multi\nline\",f\r\n";
        assert_eq!(read_all(input), (input.to_string(), None));
    }

    #[test]
    fn test_bare_quote_stops_before_quote() {
        let (out, err) = read_all("x,y\nab\"c,d\n");
        assert_eq!(out, "x,y\nab");
        let err = err.unwrap();
        assert_eq!(err.line, 2);
        assert!(err.msg.contains("non-quoted"));
    }

    #[test]
    fn test_stray_quote_in_quoted_field() {
        let (out, err) = read_all("\"x\"y\",z\n");
        assert_eq!(out, "\"x\"");
        assert_eq!(err.unwrap().line, 1);
    }

    #[test]
    fn test_unterminated_quote_at_end() {
        let (out, err) = read_all("a,\"open");
        assert_eq!(out, "a,\"open");
        assert!(err.unwrap().msg.contains("quoted field"));
    }

    #[test]
    fn test_error_repeats() {
        let mut filter = StrictQuotes::new(&b"a\"b"[..], b',', true);
        let mut buf = [0u8; 8];
        assert_eq!(filter.read(&mut buf).unwrap(), 1);
        assert!(filter.read(&mut buf).is_err());
        assert!(filter.read(&mut buf).is_err());
    }

    #[test]
    fn test_disabled_passes_through() {
        let mut filter = StrictQuotes::new(&b"a\"b,\"x\"y\"\n"[..], b',', false);
        let mut out = String::new();
        filter.read_to_string(&mut out).unwrap();
        assert_eq!(out, "a\"b,\"x\"y\"\n");
    }

    #[test]
    fn test_custom_delimiter_ends_field() {
        let mut filter = StrictQuotes::new(&b"\"a\";\"b\"\n"[..], b';', true);
        let mut out = String::new();
        filter.read_to_string(&mut out).unwrap();
        assert_eq!(out, "\"a\";\"b\"\n");
    }
}
