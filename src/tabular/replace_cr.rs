//! Line-ending filter for CSV input.
//!
//! Files saved by some spreadsheet tools end records with a bare `\r`. The
//! CSV layer only splits on `\n` and `\r\n`, so [`ReplaceCr`] inserts a `\n`
//! after every `\r` that is not already followed by one.
//!
//! Inserted bytes mean the filtered stream can be longer than the source.
//! Byte counts and checksums taken downstream of the filter do not describe
//! the original input.

use std::io::{self, BufRead, BufReader, Read};

/// Wraps a reader, rewriting lone `\r` as `\r\n`.
///
/// # Examples
///
/// ```rust
/// use dsio::ReplaceCr;
/// use std::io::Read;
///
/// let mut out = String::new();
/// ReplaceCr::new(&b"a,b\rc,d\r\ne,f\r"[..])
///     .read_to_string(&mut out)
///     .unwrap();
/// assert_eq!(out, "a,b\r\nc,d\r\ne,f\r\n");
/// ```
pub struct ReplaceCr<R> {
    inner: BufReader<R>,
    /// The last byte handed out was a `\r` whose successor is not yet known.
    after_cr: bool,
}

impl<R: Read> ReplaceCr<R> {
    pub fn new(inner: R) -> Self {
        ReplaceCr {
            inner: BufReader::new(inner),
            after_cr: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }

    /// Peeks past a pending `\r`: true when no `\n` follows it.
    fn lone_cr(&mut self) -> io::Result<bool> {
        let next = self.inner.fill_buf()?;
        Ok(next.first() != Some(&b'\n'))
    }
}

impl<R: Read> Read for ReplaceCr<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.after_cr {
            // On a peek error the flag stays set and the next call retries.
            let lone = self.lone_cr()?;
            self.after_cr = false;
            if lone {
                buf[0] = b'\n';
                return Ok(1);
            }
        }

        let avail = self.inner.fill_buf()?;
        if avail.is_empty() {
            return Ok(0);
        }
        let window = &avail[..avail.len().min(buf.len())];
        let take = window
            .iter()
            .position(|&b| b == b'\r')
            .map_or(window.len(), |p| p + 1);
        buf[..take].copy_from_slice(&window[..take]);
        self.after_cr = window[take - 1] == b'\r';
        self.inner.consume(take);
        Ok(take)
    }
}
