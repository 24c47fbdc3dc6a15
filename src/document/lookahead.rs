//! Refillable look-ahead window over a byte stream.
//!
//! The JSON tokenizer never owns more input than it needs to recognise one
//! token. [`LookAhead`] keeps a single `Vec<u8>` split at `pos`:
//!
//! ```text
//!   buf: [ committed ... | inspected, not committed ... ]
//!                         ^ pos                         ^ buf.len()
//! ```
//!
//! Invariant: `buf[pos..]` is exactly the set of bytes that have been read
//! from the source and inspected but not yet committed. Extending appends to
//! the tail and never drops or re-reads those bytes; [`LookAhead::consume`]
//! commits a prefix of them and advances `offset` by the same count. A token
//! that straddles any number of refills is therefore committed once, by its
//! full length, and nothing else moves the commit point.
//!
//! Committed bytes are compacted away only when they outnumber the pending
//! ones, which bounds the buffer to roughly the longest token plus one block.

use std::io::{self, Read};

pub(crate) const DEFAULT_BLOCK_SIZE: usize = 4096;

pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t')
}

pub(crate) struct LookAhead<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    offset: u64,
    block_size: usize,
    eof: bool,
}

impl<R: Read> LookAhead<R> {
    pub(crate) fn new(inner: R, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        LookAhead {
            inner,
            buf: Vec::with_capacity(block_size),
            pos: 0,
            offset: 0,
            block_size,
            eof: false,
        }
    }

    /// Bytes inspected but not yet committed.
    pub(crate) fn pending(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    /// Total number of bytes committed so far.
    pub(crate) fn offset(&self) -> u64 {
        self.offset
    }

    /// Appends at most one block from the source. Returns the number of new
    /// bytes, zero once the source is exhausted.
    pub(crate) fn extend(&mut self) -> io::Result<usize> {
        if self.eof {
            return Ok(0);
        }
        if self.pos > 0 && self.pos >= self.buf.len() - self.pos {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }

        let start = self.buf.len();
        self.buf.resize(start + self.block_size, 0);
        loop {
            match self.inner.read(&mut self.buf[start..]) {
                Ok(n) => {
                    self.buf.truncate(start + n);
                    if n == 0 {
                        self.eof = true;
                    }
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.truncate(start);
                    return Err(e);
                }
            }
        }
    }

    /// The byte `i` positions past the commit point, extending the window as
    /// needed. `None` means the source ended first.
    pub(crate) fn peek_at(&mut self, i: usize) -> io::Result<Option<u8>> {
        while self.pos + i >= self.buf.len() {
            if self.extend()? == 0 {
                return Ok(None);
            }
        }
        Ok(Some(self.buf[self.pos + i]))
    }

    /// Commits the first `n` pending bytes.
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(n <= self.buf.len() - self.pos, "consume past inspected bytes");
        let n = n.min(self.buf.len() - self.pos);
        self.pos += n;
        self.offset += n as u64;
    }

    /// Commits any run of whitespace and returns the first byte after it,
    /// left uncommitted.
    pub(crate) fn skip_whitespace(&mut self) -> io::Result<Option<u8>> {
        let mut skip = 0;
        loop {
            match self.peek_at(skip)? {
                Some(b) if is_whitespace(b) => skip += 1,
                next => {
                    self.consume(skip);
                    return Ok(next);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most `chunk` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_peek_extends_without_committing() {
        let mut la = LookAhead::new(&b"abcdef"[..], 2);
        assert_eq!(la.peek_at(0).unwrap(), Some(b'a'));
        assert_eq!(la.pending(), b"ab");
        assert_eq!(la.peek_at(4).unwrap(), Some(b'e'));
        assert_eq!(la.pending(), b"abcdef");
        assert_eq!(la.offset(), 0);
        assert_eq!(la.peek_at(6).unwrap(), None);
    }

    #[test]
    fn test_consume_counts_each_byte_once() {
        for block in 1..8 {
            let mut la = LookAhead::new(&b"0123456789"[..], block);
            assert_eq!(la.peek_at(3).unwrap(), Some(b'3'));
            la.consume(4);
            assert_eq!(la.offset(), 4);
            assert_eq!(la.peek_at(0).unwrap(), Some(b'4'));
            assert_eq!(la.peek_at(5).unwrap(), Some(b'9'));
            la.consume(6);
            assert_eq!(la.offset(), 10);
            assert_eq!(la.peek_at(0).unwrap(), None);
            assert!(la.pending().is_empty());
        }
    }

    #[test]
    fn test_skip_whitespace_across_refills() {
        let input = b"  \n\t  \r\n   x";
        for chunk in 1..=input.len() {
            let mut la = LookAhead::new(
                Trickle {
                    data: input,
                    chunk,
                },
                chunk,
            );
            assert_eq!(la.skip_whitespace().unwrap(), Some(b'x'));
            assert_eq!(la.offset(), (input.len() - 1) as u64);
            assert_eq!(la.pending()[0], b'x');
        }
    }

    #[test]
    fn test_skip_whitespace_to_eof() {
        let mut la = LookAhead::new(&b"   "[..], 2);
        assert_eq!(la.skip_whitespace().unwrap(), None);
        assert_eq!(la.offset(), 3);
    }

    #[test]
    fn test_buffer_stays_bounded() {
        let input = vec![b'a'; 10_000];
        let mut la = LookAhead::new(&input[..], 16);
        for _ in 0..input.len() {
            assert_eq!(la.peek_at(0).unwrap(), Some(b'a'));
            la.consume(1);
            assert!(la.buf.len() <= 32);
        }
        assert_eq!(la.peek_at(0).unwrap(), None);
        assert_eq!(la.offset(), 10_000);
    }

    #[test]
    fn test_read_error_keeps_pending_bytes() {
        struct FailSecond(u8);
        impl Read for FailSecond {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.0 += 1;
                if self.0 == 1 {
                    buf[0] = b'q';
                    Ok(1)
                } else {
                    Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
                }
            }
        }

        let mut la = LookAhead::new(FailSecond(0), 4);
        assert_eq!(la.peek_at(0).unwrap(), Some(b'q'));
        let err = la.peek_at(1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
        assert_eq!(la.pending(), b"q");
    }
}
