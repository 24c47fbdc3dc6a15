use super::lookahead::{LookAhead, DEFAULT_BLOCK_SIZE};
use crate::entry::{Entry, EntryReader};
use crate::{ContainerKind, Error, Map, Number, Result, Structure, Value};
use std::collections::HashSet;
use std::io::Read;
use tracing::debug;

const MAX_DEPTH: usize = 128;

/// Pull tokenizer for one JSON value at a time.
///
/// Every method starts at the commit point of the look-ahead window and
/// commits exactly the bytes of the token it returns. Errors report the
/// offset of the commit point, which is the start of the offending token.
pub(crate) struct Tokenizer<R> {
    src: LookAhead<R>,
    depth: usize,
}

impl<R: Read> Tokenizer<R> {
    pub(crate) fn new(inner: R, block_size: usize) -> Self {
        Tokenizer {
            src: LookAhead::new(inner, block_size),
            depth: 0,
        }
    }

    pub(crate) fn offset(&self) -> u64 {
        self.src.offset()
    }

    fn malformed(&self, msg: impl std::fmt::Display) -> Error {
        let err = Error::malformed(self.src.offset(), msg);
        debug!(error = %err, "malformed document");
        err
    }

    /// Skips whitespace and commits `ch` if it comes next.
    pub(crate) fn accept(&mut self, ch: u8) -> Result<bool> {
        if self.src.skip_whitespace()? == Some(ch) {
            self.src.consume(1);
            return Ok(true);
        }
        Ok(false)
    }

    /// Like [`Tokenizer::accept`], but a missing `ch` is an error.
    pub(crate) fn expect(&mut self, ch: u8, what: &str) -> Result<()> {
        if self.accept(ch)? {
            return Ok(());
        }
        Err(self.expected(what))
    }

    fn expected(&mut self, what: &str) -> Error {
        match self.src.skip_whitespace() {
            Ok(Some(_)) => self.malformed(format_args!("expected {what}")),
            Ok(None) => self.malformed(format_args!("unexpected end of input, expected {what}")),
            Err(e) => e.into(),
        }
    }

    /// Skips whitespace and reports whether any input remains.
    pub(crate) fn at_end(&mut self) -> Result<bool> {
        Ok(self.src.skip_whitespace()?.is_none())
    }

    pub(crate) fn read_value(&mut self) -> Result<Value> {
        match self.src.skip_whitespace()? {
            None => Err(self.malformed("unexpected end of input")),
            Some(b'n') => self.read_literal(b"null").map(|_| Value::Null),
            Some(b't') => self.read_literal(b"true").map(|_| Value::Bool(true)),
            Some(b'f') => self.read_literal(b"false").map(|_| Value::Bool(false)),
            Some(b'"') => self.read_string().map(Value::String),
            Some(b'-' | b'0'..=b'9') => self.read_number().map(Value::Number),
            Some(b'{') => self.nested(Self::read_object),
            Some(b'[') => self.nested(Self::read_array),
            // Unrecognised lead bytes decode as null and are left in place
            // for the caller's next structural check.
            Some(_) => Ok(Value::Null),
        }
    }

    fn nested(&mut self, read: fn(&mut Self) -> Result<Value>) -> Result<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(self.malformed("nesting too deep"));
        }
        self.depth += 1;
        let value = read(self);
        self.depth -= 1;
        value
    }

    fn read_literal(&mut self, literal: &'static [u8]) -> Result<()> {
        for (i, &want) in literal.iter().enumerate() {
            if self.src.peek_at(i)? != Some(want) {
                let name = String::from_utf8_lossy(literal);
                return Err(self.malformed(format_args!("expected '{name}'")));
            }
        }
        self.src.consume(literal.len());
        Ok(())
    }

    /// Reads a quoted string; the next byte must be `"`.
    pub(crate) fn read_string(&mut self) -> Result<String> {
        let mut end = 1;
        loop {
            match self.src.peek_at(end)? {
                None => return Err(self.malformed("unterminated string")),
                Some(b'\\') => end += 2,
                Some(b'"') => break,
                Some(_) => end += 1,
            }
        }
        let text = unescape(&self.src.pending()[1..end]).map_err(|msg| self.malformed(msg))?;
        self.src.consume(end + 1);
        Ok(text)
    }

    fn read_number(&mut self) -> Result<Number> {
        let mut len = 0;
        let mut is_float = false;
        while let Some(b) = self.src.peek_at(len)? {
            match b {
                b'0'..=b'9' | b'-' | b'+' => {}
                b'.' | b'e' | b'E' => is_float = true,
                _ => break,
            }
            len += 1;
        }

        let raw = &self.src.pending()[..len];
        let text = std::str::from_utf8(raw).unwrap_or_default();
        let number = if is_float {
            text.parse::<f64>().ok().map(Number::Float)
        } else {
            text.parse::<i64>().ok().map(Number::Integer)
        };
        match number {
            Some(number) => {
                self.src.consume(len);
                Ok(number)
            }
            None => Err(self.malformed(format_args!("invalid number {text:?}"))),
        }
    }

    fn read_member(&mut self) -> Result<(String, Value)> {
        if self.src.skip_whitespace()? != Some(b'"') {
            return Err(self.expected("string key"));
        }
        let key = self.read_string()?;
        self.expect(b':', "':' after key")?;
        let value = self.read_value()?;
        Ok((key, value))
    }

    fn read_object(&mut self) -> Result<Value> {
        self.expect(b'{', "'{'")?;
        let mut map = Map::new();
        if self.accept(b'}')? {
            return Ok(Value::Object(map));
        }
        loop {
            let (key, value) = self.read_member()?;
            map.insert(key, value);
            if self.accept(b'}')? {
                return Ok(Value::Object(map));
            }
            self.expect(b',', "',' or '}' in object")?;
        }
    }

    fn read_array(&mut self) -> Result<Value> {
        self.expect(b'[', "'['")?;
        let mut items = Vec::new();
        if self.accept(b']')? {
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.read_value()?);
            if self.accept(b']')? {
                return Ok(Value::Array(items));
            }
            self.expect(b',', "',' or ']' in array")?;
        }
    }
}

/// Decodes the body of a quoted string.
fn unescape(raw: &[u8]) -> std::result::Result<String, &'static str> {
    if !raw.contains(&b'\\') {
        return String::from_utf8(raw.to_vec()).map_err(|_| "invalid UTF-8 in string");
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        i += 1;
        if b != b'\\' {
            out.push(b);
            continue;
        }
        let esc = *raw.get(i).ok_or("unterminated escape")?;
        i += 1;
        let decoded = match esc {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                let hi = hex4(raw, i)?;
                i += 4;
                let ch = if (0xD800..0xDC00).contains(&hi) {
                    let lo = match raw.get(i..i + 2) {
                        Some(b"\\u") => hex4(raw, i + 2)?,
                        _ => return Err("unpaired surrogate in unicode escape"),
                    };
                    if !(0xDC00..0xE000).contains(&lo) {
                        return Err("unpaired surrogate in unicode escape");
                    }
                    i += 6;
                    char::from_u32(0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00))
                } else {
                    char::from_u32(hi)
                };
                let ch = ch.ok_or("invalid unicode escape")?;
                let mut utf8 = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                continue;
            }
            _ => return Err("invalid escape sequence"),
        };
        out.push(decoded);
    }
    String::from_utf8(out).map_err(|_| "invalid UTF-8 in string")
}

fn hex4(raw: &[u8], at: usize) -> std::result::Result<u32, &'static str> {
    let digits = raw.get(at..at + 4).ok_or("truncated unicode escape")?;
    let text = std::str::from_utf8(digits).map_err(|_| "invalid unicode escape")?;
    u32::from_str_radix(text, 16).map_err(|_| "invalid unicode escape")
}

/// Reads the entries of a single JSON object or array.
///
/// The reader holds only the bytes of the token it is looking at, so a body
/// of any size streams through in roughly one block of memory plus the
/// largest entry. Objects yield keyed entries and arrays yield indexed
/// entries; the top-level keys of an object must be non-empty and unique.
///
/// # Examples
///
/// ```rust
/// use dsio::{value, DataFormat, DocumentReader, Entry, EntryReader, Structure};
///
/// let st = Structure::new(DataFormat::Json).with_schema(value!({ "type": "array" }));
/// let mut reader = DocumentReader::new(&st, &b"[1, \"two\", {\"x\": null}]"[..]).unwrap();
///
/// assert_eq!(reader.read_entry().unwrap(), Some(Entry::indexed(0, value!(1))));
/// assert_eq!(reader.read_entry().unwrap(), Some(Entry::indexed(1, value!("two"))));
/// assert_eq!(
///     reader.read_entry().unwrap(),
///     Some(Entry::indexed(2, value!({ "x": null })))
/// );
/// assert_eq!(reader.read_entry().unwrap(), None);
/// ```
pub struct DocumentReader<R: Read> {
    structure: Structure,
    kind: ContainerKind,
    tokens: Tokenizer<R>,
    opened: bool,
    finished: bool,
    entries_read: usize,
    keys_seen: HashSet<String>,
}

impl<R: Read> DocumentReader<R> {
    pub fn new(structure: &Structure, inner: R) -> Result<Self> {
        Self::with_block_size(structure, inner, DEFAULT_BLOCK_SIZE)
    }

    /// Like [`DocumentReader::new`], reading the source `block_size` bytes
    /// at a time.
    pub fn with_block_size(structure: &Structure, inner: R, block_size: usize) -> Result<Self> {
        let kind = structure.container_kind()?;
        debug!(container = kind.name(), block_size, "opening document reader");
        Ok(DocumentReader {
            structure: structure.clone(),
            kind,
            tokens: Tokenizer::new(inner, block_size),
            opened: false,
            finished: false,
            entries_read: 0,
            keys_seen: HashSet::new(),
        })
    }

    /// Number of entries decoded so far.
    #[must_use]
    pub fn entries_read(&self) -> usize {
        self.entries_read
    }

    /// Bytes of input consumed so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.tokens.offset()
    }

    fn read_keyed(&mut self) -> Result<Entry> {
        let offset = self.tokens.offset();
        let (key, value) = self.tokens.read_member()?;
        if key.is_empty() {
            return Err(Error::key_violation(format!(
                "empty key at byte {offset}"
            )));
        }
        if !self.keys_seen.insert(key.clone()) {
            return Err(Error::key_violation(format!(
                "duplicate key {key:?} at byte {offset}"
            )));
        }
        Ok(Entry::keyed(key, value))
    }
}

impl<R: Read> EntryReader for DocumentReader<R> {
    fn structure(&self) -> &Structure {
        &self.structure
    }

    fn read_entry(&mut self) -> Result<Option<Entry>> {
        if self.finished {
            return Ok(None);
        }
        if !self.opened {
            let what = match self.kind {
                ContainerKind::Keyed => "opening object '{'",
                ContainerKind::Ordered => "opening array '['",
            };
            self.tokens.expect(self.kind.open(), what)?;
            self.opened = true;
        }

        if self.tokens.accept(self.kind.close())? {
            self.finished = true;
            debug!(entries = self.entries_read, "document fully read");
            return Ok(None);
        }
        if self.entries_read > 0 {
            let what = match self.kind {
                ContainerKind::Keyed => "',' or '}' after object entry",
                ContainerKind::Ordered => "',' or ']' after array entry",
            };
            self.tokens.expect(b',', what)?;
        }

        let entry = match self.kind {
            ContainerKind::Keyed => self.read_keyed()?,
            ContainerKind::Ordered => Entry::indexed(self.entries_read, self.tokens.read_value()?),
        };
        self.entries_read += 1;
        Ok(Some(entry))
    }

    fn close(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
