use crate::entry::{Entry, EntryWriter};
use crate::{ContainerKind, Error, Number, Result, Structure, Value};
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::io::{self, Write};
use tracing::debug;

/// Writes the compact JSON text of `value`.
///
/// Floats always carry a fraction or exponent so they read back as floats;
/// NaN and the infinities have no JSON form and are written as `null`.
pub fn write_value<W: fmt::Write>(out: &mut W, value: &Value) -> fmt::Result {
    match value {
        Value::Null => out.write_str("null"),
        Value::Bool(true) => out.write_str("true"),
        Value::Bool(false) => out.write_str("false"),
        Value::Number(Number::Integer(i)) => write!(out, "{}", i),
        Value::Number(Number::Float(f)) => write_float(out, *f),
        Value::String(s) => write_str(out, s),
        Value::Array(items) => {
            out.write_char('[')?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write_value(out, item)?;
            }
            out.write_char(']')
        }
        Value::Object(map) => {
            out.write_char('{')?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.write_char(',')?;
                }
                write_str(out, key)?;
                out.write_char(':')?;
                write_value(out, item)?;
            }
            out.write_char('}')
        }
    }
}

fn write_float<W: fmt::Write>(out: &mut W, f: f64) -> fmt::Result {
    if !f.is_finite() {
        return out.write_str("null");
    }
    // Debug is the shortest round-trip form and switches to exponent
    // notation for very large or small magnitudes.
    let text = format!("{:?}", f);
    out.write_str(&text)?;
    if !text.contains(['.', 'e', 'E']) {
        out.write_str(".0")?;
    }
    Ok(())
}

pub(crate) fn write_str<W: fmt::Write>(out: &mut W, s: &str) -> fmt::Result {
    out.write_char('"')?;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        let escape: Option<&str> = match ch {
            '"' => Some("\\\""),
            '\\' => Some("\\\\"),
            '\n' => Some("\\n"),
            '\r' => Some("\\r"),
            '\t' => Some("\\t"),
            '\u{8}' => Some("\\b"),
            '\u{c}' => Some("\\f"),
            c if (c as u32) < 0x20 => None,
            _ => continue,
        };
        out.write_str(&s[start..i])?;
        match escape {
            Some(e) => out.write_str(e)?,
            None => write!(out, "\\u{:04x}", ch as u32)?,
        }
        start = i + ch.len_utf8();
    }
    out.write_str(&s[start..])?;
    out.write_char('"')
}

/// Writes entries into a single JSON object or array.
///
/// The opening bracket is deferred to the first entry so that a writer that
/// is closed without entries still produces a valid empty container. Each
/// entry is rendered in full before anything reaches the underlying writer,
/// so a rejected entry leaves the output untouched.
///
/// # Examples
///
/// ```rust
/// use dsio::{value, DataFormat, DocumentWriter, Entry, EntryWriter, Structure};
///
/// let st = Structure::new(DataFormat::Json).with_schema(value!({ "type": "object" }));
/// let mut out = Vec::new();
/// let mut writer = DocumentWriter::new(&st, &mut out).unwrap();
/// writer.write_entry(&Entry::keyed("a", value!(1))).unwrap();
/// writer.write_entry(&Entry::keyed("b", value!([true, null]))).unwrap();
/// writer.close().unwrap();
/// assert_eq!(out, br#"{"a":1,"b":[true,null]}"#);
/// ```
pub struct DocumentWriter<W: Write> {
    structure: Structure,
    kind: ContainerKind,
    inner: W,
    entries_written: usize,
    keys_written: HashSet<String>,
    closed: bool,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(structure: &Structure, inner: W) -> Result<Self> {
        let kind = structure.container_kind()?;
        debug!(container = kind.name(), "opening document writer");
        Ok(DocumentWriter {
            structure: structure.clone(),
            kind,
            inner,
            entries_written: 0,
            keys_written: HashSet::new(),
            closed: false,
        })
    }

    /// Number of entries successfully written so far.
    #[must_use]
    pub fn entries_written(&self) -> usize {
        self.entries_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn encode(&self, entry: &Entry) -> Result<String> {
        let mut chunk = String::new();
        let sep = if self.entries_written == 0 {
            self.kind.open()
        } else {
            b','
        };
        chunk.push(char::from(sep));

        let rendered = match self.kind {
            ContainerKind::Ordered => write_value(&mut chunk, &entry.value),
            ContainerKind::Keyed => {
                let key = entry.key.as_deref().unwrap_or_default();
                if key.is_empty() {
                    return Err(Error::key_violation("entry key cannot be empty"));
                }
                if self.keys_written.contains(key) {
                    return Err(Error::key_violation(format!(
                        "key {key:?} already written"
                    )));
                }
                write_str(&mut chunk, key)
                    .and_then(|_| chunk.write_char(':'))
                    .and_then(|_| write_value(&mut chunk, &entry.value))
            }
        };
        rendered.map_err(|_| io::Error::new(io::ErrorKind::Other, "failed to render entry"))?;
        Ok(chunk)
    }
}

impl<W: Write> EntryWriter for DocumentWriter<W> {
    fn structure(&self) -> &Structure {
        &self.structure
    }

    fn write_entry(&mut self, entry: &Entry) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        let chunk = self.encode(entry).map_err(|e| {
            debug!(error = %e, "rejected document entry");
            e
        })?;
        self.inner.write_all(chunk.as_bytes())?;

        if self.kind == ContainerKind::Keyed {
            if let Some(key) = &entry.key {
                self.keys_written.insert(key.clone());
            }
        }
        self.entries_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if self.entries_written == 0 {
            self.inner.write_all(&[self.kind.open(), self.kind.close()])?;
        } else {
            self.inner.write_all(&[self.kind.close()])?;
        }
        self.inner.flush()?;
        self.closed = true;
        debug!(entries = self.entries_written, "closed document writer");
        Ok(())
    }
}
