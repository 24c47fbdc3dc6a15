use crate::entry::{Entry, EntryWriter};
use crate::{CsvOptions, Error, Number, Result, Structure, Value};
use std::borrow::Cow;
use std::io::Write;
use tracing::debug;

/// Writes array entries as CSV records.
///
/// When the structure's options ask for a header row, the column titles
/// from the schema are written as the first record during construction.
///
/// # Examples
///
/// ```rust
/// use dsio::{value, DataFormat, Entry, EntryWriter, Structure, TabularWriter};
///
/// let st = Structure::new(DataFormat::Csv);
/// let mut out = Vec::new();
/// let mut writer = TabularWriter::new(&st, &mut out).unwrap();
/// writer.write_entry(&Entry::indexed(0, value!([1, "a,b", 2.5, null]))).unwrap();
/// writer.close().unwrap();
/// drop(writer);
/// assert_eq!(out, b"1,\"a,b\",2.5,\n");
/// ```
pub struct TabularWriter<W: Write> {
    structure: Structure,
    inner: csv::Writer<W>,
    records_written: usize,
    closed: bool,
}

impl<W: Write> TabularWriter<W> {
    /// Builds a writer from the structure's schema and `formatConfig`. The
    /// structure's declared format is not consulted.
    pub fn new(structure: &Structure, inner: W) -> Result<Self> {
        let options = CsvOptions::from_map(structure.format_config.as_ref())?;
        let mut inner = csv::WriterBuilder::new()
            .delimiter(options.delimiter())
            .flexible(true)
            .from_writer(inner);

        if options.header_row {
            match structure.columns() {
                Some(columns) => {
                    inner.write_record(columns.iter().map(|c| c.title.as_str()))?;
                }
                None => debug!("header row requested but schema declares no columns"),
            }
        }

        debug!(header_row = options.header_row, "opening tabular writer");
        Ok(TabularWriter {
            structure: structure.clone(),
            inner,
            records_written: 0,
            closed: false,
        })
    }

    /// Number of data records written so far, not counting a header row.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }
}

impl<W: Write> EntryWriter for TabularWriter<W> {
    fn structure(&self) -> &Structure {
        &self.structure
    }

    fn write_entry(&mut self, entry: &Entry) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        let Value::Array(fields) = &entry.value else {
            debug!(kind = entry.value.kind(), "rejected non-array csv entry");
            return Err(Error::ShapeMismatch(entry.value.kind().to_string()));
        };
        let record: Vec<Cow<'_, str>> = fields.iter().map(encode_field).collect();
        self.inner.write_record(record.iter().map(|f| f.as_bytes()))?;
        self.records_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.inner.flush()?;
        self.closed = true;
        debug!(records = self.records_written, "closed tabular writer");
        Ok(())
    }
}

/// Renders one value as CSV field text.
fn encode_field(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::Number(Number::Integer(i)) => Cow::Owned(i.to_string()),
        Value::Number(Number::Float(f)) => Cow::Owned(f.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}
