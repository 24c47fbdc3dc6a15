use super::replace_cr::ReplaceCr;
use super::strict_quotes::StrictQuotes;
use crate::document::parse_value;
use crate::entry::{Entry, EntryReader};
use crate::{Column, ColumnType, CsvOptions, Result, Structure, Value};
use csv::StringRecord;
use std::io::Read;
use tracing::{debug, trace};

/// Reads CSV records as array entries.
///
/// Each record becomes an [`Entry`] whose `index` is the record's position
/// among data records (a header row is skipped and not counted) and whose
/// value is an array with one element per field. Fields are coerced to the
/// column types the schema declares; a field that does not parse as its
/// declared type is kept as text.
///
/// Input passes through [`ReplaceCr`] so records ending in a bare `\r` split
/// correctly. Without `lazy_quotes`, a misplaced quote ends the stream with
/// [`Error::Tabular`](crate::Error::Tabular) once the records before it have
/// been read.
///
/// # Examples
///
/// ```rust
/// use dsio::{value, DataFormat, Entry, EntryReader, Structure, TabularReader};
///
/// let st = Structure::new(DataFormat::Csv).with_schema(value!({
///     "type": "array",
///     "items": { "type": "array", "items": [
///         { "title": "n", "type": "integer" },
///         { "title": "ok", "type": "boolean" }
///     ]}
/// }));
/// let mut reader = TabularReader::new(&st, &b"1,true\nx,F\n"[..]).unwrap();
///
/// assert_eq!(reader.read_entry().unwrap(), Some(Entry::indexed(0, value!([1, true]))));
/// assert_eq!(reader.read_entry().unwrap(), Some(Entry::indexed(1, value!(["x", false]))));
/// assert_eq!(reader.read_entry().unwrap(), None);
/// ```
pub struct TabularReader<R: Read> {
    structure: Structure,
    inner: csv::Reader<StrictQuotes<ReplaceCr<R>>>,
    types: Vec<ColumnType>,
    record: StringRecord,
    records_read: usize,
}

impl<R: Read> TabularReader<R> {
    /// Builds a reader from the structure's schema and `formatConfig`. The
    /// structure's declared format is not consulted.
    pub fn new(structure: &Structure, inner: R) -> Result<Self> {
        let options = CsvOptions::from_map(structure.format_config.as_ref())?;
        let types: Vec<ColumnType> = structure
            .columns()
            .unwrap_or_default()
            .iter()
            .map(|c: &Column| c.column_type)
            .collect();

        let source = StrictQuotes::new(
            ReplaceCr::new(inner),
            options.delimiter(),
            !options.lazy_quotes,
        );
        let inner = csv::ReaderBuilder::new()
            .has_headers(options.header_row)
            .delimiter(options.delimiter())
            .flexible(options.variadic_fields)
            .from_reader(source);

        debug!(
            header_row = options.header_row,
            lazy_quotes = options.lazy_quotes,
            variadic_fields = options.variadic_fields,
            columns = types.len(),
            "opening tabular reader"
        );
        Ok(TabularReader {
            structure: structure.clone(),
            inner,
            types,
            record: StringRecord::new(),
            records_read: 0,
        })
    }

    /// Number of data records read so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    fn decode(&self) -> Value {
        let fields = &self.record;
        let typed = self.types.len() >= fields.len();
        let values = fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let ty = if typed { self.types[i] } else { ColumnType::String };
                coerce(field, ty)
            })
            .collect();
        Value::Array(values)
    }
}

impl<R: Read> EntryReader for TabularReader<R> {
    fn structure(&self) -> &Structure {
        &self.structure
    }

    fn read_entry(&mut self) -> Result<Option<Entry>> {
        let more = self.inner.read_record(&mut self.record).map_err(|e| {
            debug!(error = %e, "failed to read csv record");
            e
        })?;
        if !more {
            return Ok(None);
        }
        let entry = Entry::indexed(self.records_read, self.decode());
        self.records_read += 1;
        Ok(Some(entry))
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Converts one field to its declared type, keeping the text on failure.
pub(crate) fn coerce(field: &str, ty: ColumnType) -> Value {
    let coerced = match ty {
        ColumnType::String => None,
        ColumnType::Number => field.parse::<f64>().ok().map(Value::from),
        ColumnType::Integer => field.parse::<i64>().ok().map(Value::from),
        ColumnType::Boolean => parse_bool(field).map(Value::Bool),
        ColumnType::Object => parse_value(field.as_bytes()).ok().filter(Value::is_object),
        ColumnType::Array => parse_value(field.as_bytes()).ok().filter(Value::is_array),
        ColumnType::Null => Some(Value::Null),
    };
    coerced.unwrap_or_else(|| {
        if ty != ColumnType::String {
            trace!(?ty, field, "field does not parse as declared type, keeping text");
        }
        Value::String(field.to_string())
    })
}

fn parse_bool(field: &str) -> Option<bool> {
    match field {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{value, CsvOptions, DataFormat, Error, FormatConfig};

    fn structure(types: &[&str]) -> Structure {
        let columns: Vec<Value> = types
            .iter()
            .enumerate()
            .map(|(i, ty)| value!({ "title": (format!("c{i}")), "type": (*ty) }))
            .collect();
        Structure::new(DataFormat::Csv).with_schema(value!({
            "type": "array",
            "items": { "type": "array", "items": (Value::Array(columns)) }
        }))
    }

    fn read(st: &Structure, input: &str) -> Result<Vec<Value>> {
        let mut r = TabularReader::new(st, input.as_bytes())?;
        let mut out = Vec::new();
        while let Some(e) = r.read_entry()? {
            assert_eq!(e.index, Some(out.len()));
            out.push(e.value);
        }
        Ok(out)
    }

    #[test]
    fn test_coerces_declared_types() {
        let st = structure(&["integer", "boolean", "string"]);
        assert_eq!(
            read(&st, "1,true,hello\n").unwrap(),
            vec![value!([1, true, "hello"])]
        );
    }

    #[test]
    fn test_failed_coercion_keeps_text() {
        let st = structure(&["integer", "boolean", "string"]);
        assert_eq!(
            read(&st, "notanumber,maybe,x\n").unwrap(),
            vec![value!(["notanumber", "maybe", "x"])]
        );
    }

    #[test]
    fn test_number_column_keeps_text() {
        let st = structure(&["number", "boolean", "string"]);
        assert_eq!(
            read(&st, "notanumber,true,x\n").unwrap(),
            vec![value!(["notanumber", true, "x"])]
        );
    }

    #[test]
    fn test_every_column_type() {
        let st = structure(&["number", "integer", "boolean", "object", "array", "null", "string"]);
        let rows = read(
            &st,
            "2.5,-3,F,\"{\"\"a\"\":1}\",\"[1,2]\",anything,7\n1e2,4.0,yes,[1],{},,\n",
        )
        .unwrap();
        assert_eq!(
            rows,
            vec![
                value!([2.5, (-3), false, { "a": 1 }, [1, 2], null, "7"]),
                value!([100.0, "4.0", "yes", "[1]", "{}", null, ""]),
            ]
        );
    }

    #[test]
    fn test_boolean_spellings() {
        for (text, want) in [
            ("1", true),
            ("t", true),
            ("T", true),
            ("TRUE", true),
            ("true", true),
            ("True", true),
            ("0", false),
            ("f", false),
            ("F", false),
            ("FALSE", false),
            ("false", false),
            ("False", false),
        ] {
            assert_eq!(coerce(text, ColumnType::Boolean), Value::Bool(want), "{text}");
        }
        assert_eq!(coerce("tRuE", ColumnType::Boolean), value!("tRuE"));
    }

    #[test]
    fn test_short_type_list_reads_text() {
        let st = structure(&["integer"]);
        assert_eq!(read(&st, "1,2\n").unwrap(), vec![value!(["1", "2"])]);

        let untyped = Structure::new(DataFormat::Csv);
        assert_eq!(read(&untyped, "1,2\n").unwrap(), vec![value!(["1", "2"])]);
    }

    #[test]
    fn test_header_row_skipped() {
        let st = structure(&["string", "integer"])
            .with_format_config(&FormatConfig::Csv(CsvOptions::new().with_header_row(true)));
        assert_eq!(
            read(&st, "name,n\na,1\nb,2\n").unwrap(),
            vec![value!(["a", 1]), value!(["b", 2])]
        );
        assert!(read(&st, "name,n\n").unwrap().is_empty());
    }

    #[test]
    fn test_separator_and_bare_cr() {
        let st = structure(&["integer", "string"])
            .with_format_config(&FormatConfig::Csv(CsvOptions::new().with_separator(';')));
        assert_eq!(
            read(&st, "1;a\r2;b\r").unwrap(),
            vec![value!([1, "a"]), value!([2, "b"])]
        );
    }

    #[test]
    fn test_field_count_mismatch() {
        let st = structure(&["string", "string"]);
        let err = read(&st, "a,b\nc\n").unwrap_err();
        assert!(matches!(err, Error::Tabular { line: 2, .. }), "{err:?}");

        let variadic = st.with_format_config(&FormatConfig::Csv(
            CsvOptions::new().with_variadic_fields(true),
        ));
        assert_eq!(
            read(&variadic, "a,b\nc\n").unwrap(),
            vec![value!(["a", "b"]), value!(["c"])]
        );
    }

    #[test]
    fn test_quoted_fields() {
        let st = structure(&["string", "string"]);
        assert_eq!(
            read(&st, "\"a,b\",\"line\nbreak\"\n").unwrap(),
            vec![value!(["a,b", "line\nbreak"])]
        );
    }

    #[test]
    fn test_strict_quotes_reject_misplaced_quotes() {
        let st = structure(&["string", "string"]);
        let err = read(&st, "a\"b,c\n").unwrap_err();
        assert!(matches!(err, Error::Tabular { line: 1, .. }), "{err:?}");

        let err = read(&st, "\"x\"y\",z\n").unwrap_err();
        assert!(matches!(err, Error::Tabular { line: 1, .. }), "{err:?}");

        assert_eq!(
            read(&st, "\"x\"\"y\",z\n").unwrap(),
            vec![value!(["x\"y", "z"])]
        );
    }

    #[test]
    fn test_strict_quotes_keep_earlier_records() {
        let st = structure(&["string", "string"]);
        let mut r = TabularReader::new(&st, &b"a,b\nc\"d,e\n"[..]).unwrap();
        assert_eq!(
            r.read_entry().unwrap(),
            Some(Entry::indexed(0, value!(["a", "b"])))
        );
        let err = r.read_entry().unwrap_err();
        assert!(matches!(err, Error::Tabular { line: 2, .. }), "{err:?}");
        assert!(err.to_string().contains("non-quoted"), "{err}");
    }

    #[test]
    fn test_lazy_quotes_tolerate_misplaced_quotes() {
        let st = structure(&["string", "string"])
            .with_format_config(&FormatConfig::Csv(CsvOptions::new().with_lazy_quotes(true)));
        let rows = read(&st, "a\"b,c\n").unwrap();
        assert_eq!(rows, vec![value!(["a\"b", "c"])]);
    }

    #[test]
    fn test_no_declared_format_needed() {
        let st = Structure {
            format: None,
            ..structure(&["integer"])
        };
        assert_eq!(read(&st, "5\n").unwrap(), vec![value!([5])]);
    }

    #[test]
    fn test_invalid_config_fails_construction() {
        let mut st = Structure::new(DataFormat::Csv);
        st.format_config = value!({ "separator": ",," }).as_object().cloned();
        assert!(matches!(
            TabularReader::new(&st, &b""[..]),
            Err(Error::InvalidConfig(_))
        ));
    }
}
