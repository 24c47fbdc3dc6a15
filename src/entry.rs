//! Entries and the reader/writer traits every codec implements.
//!
//! An [`Entry`] is one unit of a dataset body: a CSV record, or one member
//! of the top-level JSON object or array. Readers produce entries in source
//! order; writers consume them in the order given.

use crate::{Result, Structure, Value};

/// One unit of a dataset body.
///
/// Entries read from an object carry a `key`; entries read from an array or
/// a CSV body carry an `index`. Writers look only at the field their
/// container needs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entry {
    pub key: Option<String>,
    pub index: Option<usize>,
    pub value: Value,
}

impl Entry {
    #[must_use]
    pub fn keyed(key: impl Into<String>, value: Value) -> Self {
        Entry {
            key: Some(key.into()),
            index: None,
            value,
        }
    }

    #[must_use]
    pub fn indexed(index: usize, value: Value) -> Self {
        Entry {
            key: None,
            index: Some(index),
            value,
        }
    }
}

/// A source of entries.
pub trait EntryReader {
    /// The structure this reader was built for.
    fn structure(&self) -> &Structure;

    /// Reads the next entry. `Ok(None)` marks the end of the body and is
    /// returned again on every later call.
    fn read_entry(&mut self) -> Result<Option<Entry>>;

    /// Releases the reader. The underlying source stays with the caller.
    fn close(&mut self) -> Result<()>;
}

/// A sink for entries.
pub trait EntryWriter {
    /// The structure this writer was built for.
    fn structure(&self) -> &Structure;

    /// Writes one entry. Fails with [`Error::Closed`](crate::Error::Closed)
    /// once the writer is closed.
    fn write_entry(&mut self, entry: &Entry) -> Result<()>;

    /// Finishes the body and flushes. Closing twice is a no-op.
    fn close(&mut self) -> Result<()>;
}

impl<R: EntryReader + ?Sized> EntryReader for Box<R> {
    fn structure(&self) -> &Structure {
        (**self).structure()
    }

    fn read_entry(&mut self) -> Result<Option<Entry>> {
        (**self).read_entry()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<R: EntryReader + ?Sized> EntryReader for &mut R {
    fn structure(&self) -> &Structure {
        (**self).structure()
    }

    fn read_entry(&mut self) -> Result<Option<Entry>> {
        (**self).read_entry()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<W: EntryWriter + ?Sized> EntryWriter for Box<W> {
    fn structure(&self) -> &Structure {
        (**self).structure()
    }

    fn write_entry(&mut self, entry: &Entry) -> Result<()> {
        (**self).write_entry(entry)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<W: EntryWriter + ?Sized> EntryWriter for &mut W {
    fn structure(&self) -> &Structure {
        (**self).structure()
    }

    fn write_entry(&mut self, entry: &Entry) -> Result<()> {
        (**self).write_entry(entry)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Iterator over the entries of a reader. Stops after the first error.
///
/// # Examples
///
/// ```rust
/// use dsio::{entries, value, DataFormat, DocumentReader, Structure};
///
/// let st = Structure::new(DataFormat::Json).with_schema(value!({ "type": "array" }));
/// let reader = DocumentReader::new(&st, &b"[1, 2, 3]"[..]).unwrap();
/// let sum: i64 = entries(reader)
///     .map(|e| e.unwrap().value.as_i64().unwrap())
///     .sum();
/// assert_eq!(sum, 6);
/// ```
pub struct Entries<R> {
    reader: R,
    done: bool,
}

impl<R> Entries<R> {
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: EntryReader> Iterator for Entries<R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

pub fn entries<R: EntryReader>(reader: R) -> Entries<R> {
    Entries {
        reader,
        done: false,
    }
}

/// Reads every remaining entry into memory.
pub fn read_all<R: EntryReader + ?Sized>(reader: &mut R) -> Result<Vec<Entry>> {
    let mut out = Vec::new();
    while let Some(entry) = reader.read_entry()? {
        out.push(entry);
    }
    Ok(out)
}

/// Streams every entry from `reader` into `writer`, then closes both.
/// Returns the number of entries copied.
///
/// Converting between formats is a matter of pairing a reader for one
/// structure with a writer for another.
pub fn copy_entries<R, W>(reader: &mut R, writer: &mut W) -> Result<usize>
where
    R: EntryReader + ?Sized,
    W: EntryWriter + ?Sized,
{
    let mut copied = 0;
    while let Some(entry) = reader.read_entry()? {
        writer.write_entry(&entry)?;
        copied += 1;
    }
    reader.close()?;
    writer.close()?;
    Ok(copied)
}
