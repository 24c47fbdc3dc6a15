//! Structure descriptors and the parts of a schema the codecs read.
//!
//! A [`Structure`] is supplied by the caller, fully parsed, and is never
//! mutated by a codec. Only two things are read from its schema:
//!
//! - the top-level `"type"`, which picks the JSON container ([`ContainerKind`])
//! - for CSV, the column list at `items.items`, giving each column a title
//!   and a declared [`ColumnType`]
//!
//! ## Examples
//!
//! ```rust
//! use dsio::{value, ColumnType, ContainerKind, DataFormat, Structure};
//!
//! let st = Structure::new(DataFormat::Csv).with_schema(value!({
//!     "type": "array",
//!     "items": {
//!         "type": "array",
//!         "items": [
//!             { "title": "n", "type": "integer" },
//!             { "title": "s", "type": "string" }
//!         ]
//!     }
//! }));
//!
//! assert_eq!(st.container_kind().unwrap(), ContainerKind::Ordered);
//! let columns = st.columns().unwrap();
//! assert_eq!(columns[0].title, "n");
//! assert_eq!(columns[0].column_type, ColumnType::Integer);
//! ```

use crate::options::{CsvOptions, FormatConfig};
use crate::{Error, Map, Result, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Wire formats a structure can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// Comma-separated records.
    Csv,
    /// A single JSON object or array.
    Json,
    /// Spreadsheet workbooks. Declared so descriptors can name it; no codec.
    Xlsx,
}

impl DataFormat {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
            DataFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(DataFormat::Csv),
            "json" => Ok(DataFormat::Json),
            "xlsx" => Ok(DataFormat::Xlsx),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

/// The kind of the outermost JSON value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerKind {
    /// A JSON object; entries carry keys.
    Keyed,
    /// A JSON array; entries carry indices.
    Ordered,
}

impl ContainerKind {
    pub(crate) const fn open(self) -> u8 {
        match self {
            ContainerKind::Keyed => b'{',
            ContainerKind::Ordered => b'[',
        }
    }

    pub(crate) const fn close(self) -> u8 {
        match self {
            ContainerKind::Keyed => b'}',
            ContainerKind::Ordered => b']',
        }
    }

    pub(crate) const fn name(self) -> &'static str {
        match self {
            ContainerKind::Keyed => "object",
            ContainerKind::Ordered => "array",
        }
    }
}

/// Declared element type of a CSV column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl ColumnType {
    /// Maps a JSON-schema type name; unknown names read as text.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "number" => ColumnType::Number,
            "integer" => ColumnType::Integer,
            "boolean" => ColumnType::Boolean,
            "object" => ColumnType::Object,
            "array" => ColumnType::Array,
            "null" => ColumnType::Null,
            _ => ColumnType::String,
        }
    }
}

/// One CSV column as declared by the schema.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Column {
    pub title: String,
    pub column_type: ColumnType,
}

/// Describes the wire format and shape of a dataset body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<DataFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_config: Option<Map>,
}

impl Structure {
    #[must_use]
    pub fn new(format: DataFormat) -> Self {
        Structure {
            format: Some(format),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_format_config(mut self, config: &FormatConfig) -> Self {
        self.format_config = Some(config.to_map());
        self
    }

    /// The declared format, or [`Error::MissingFormat`].
    pub fn data_format(&self) -> Result<DataFormat> {
        self.format.ok_or(Error::MissingFormat)
    }

    /// Parses `format_config` for the declared format.
    pub fn config(&self) -> Result<FormatConfig> {
        FormatConfig::parse(self.data_format()?, self.format_config.as_ref())
    }

    /// True when this is CSV data whose configuration declares a header row.
    ///
    /// A configuration that fails to parse counts as "no header".
    #[must_use]
    pub fn has_header_row(&self) -> bool {
        self.format == Some(DataFormat::Csv)
            && CsvOptions::from_map(self.format_config.as_ref()).is_ok_and(|o| o.header_row)
    }

    /// Reads the top-level container kind from the schema's `"type"`.
    pub fn container_kind(&self) -> Result<ContainerKind> {
        let schema = match &self.schema {
            Some(schema) => schema,
            None => return Err(Error::SchemaRequired(self.data_format()?)),
        };
        let type_name = schema
            .as_object()
            .and_then(|obj| obj.get("type"))
            .and_then(Value::as_str);
        match type_name {
            Some("object") => Ok(ContainerKind::Keyed),
            Some("array") => Ok(ContainerKind::Ordered),
            Some(other) => Err(Error::invalid_schema(format!(
                "top-level type must be \"object\" or \"array\", got {other:?}"
            ))),
            None => Err(Error::invalid_schema("schema has no top-level type")),
        }
    }

    /// Recovers column titles and types from `schema.items.items`.
    ///
    /// Returns `None` when the schema does not have that nested shape. Column
    /// entries that are not objects come back as untitled text columns, and a
    /// `type` given as an array uses its first element.
    #[must_use]
    pub fn columns(&self) -> Option<Vec<Column>> {
        let items = self
            .schema
            .as_ref()
            .and_then(Value::as_object)
            .and_then(|s| s.get("items"))
            .and_then(Value::as_object)
            .and_then(|i| i.get("items"))
            .and_then(Value::as_array);
        let Some(items) = items else {
            debug!("schema has no items.items column list, treating columns as text");
            return None;
        };

        let columns = items
            .iter()
            .map(|field| {
                let Some(field) = field.as_object() else {
                    return Column::default();
                };
                let title = field
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let column_type = match field.get("type") {
                    Some(Value::String(name)) => ColumnType::from_name(name),
                    Some(Value::Array(names)) => names
                        .first()
                        .and_then(Value::as_str)
                        .map_or(ColumnType::String, ColumnType::from_name),
                    _ => ColumnType::String,
                };
                Column { title, column_type }
            })
            .collect();
        Some(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    fn tabular_schema() -> Value {
        value!({
            "type": "array",
            "items": {
                "type": "array",
                "items": [
                    { "title": "a", "type": "integer" },
                    { "title": "b", "type": ["boolean", "null"] },
                    { "title": "c" },
                    "not an object"
                ]
            }
        })
    }

    #[test]
    fn test_data_format_names() {
        for f in [DataFormat::Csv, DataFormat::Json, DataFormat::Xlsx] {
            assert_eq!(f.as_str().parse::<DataFormat>().unwrap(), f);
        }
        assert!(matches!(
            "cbor".parse::<DataFormat>(),
            Err(Error::UnknownFormat(name)) if name == "cbor"
        ));
    }

    #[test]
    fn test_container_kind() {
        let st = Structure::new(DataFormat::Json).with_schema(value!({ "type": "object" }));
        assert_eq!(st.container_kind().unwrap(), ContainerKind::Keyed);

        let st = Structure::new(DataFormat::Json).with_schema(value!({ "type": "array" }));
        assert_eq!(st.container_kind().unwrap(), ContainerKind::Ordered);

        let st = Structure::new(DataFormat::Json);
        assert!(matches!(
            st.container_kind(),
            Err(Error::SchemaRequired(DataFormat::Json))
        ));

        let st = Structure::new(DataFormat::Json).with_schema(value!({ "type": "string" }));
        assert!(matches!(st.container_kind(), Err(Error::InvalidSchema(_))));

        let st = Structure::new(DataFormat::Json).with_schema(value!([]));
        assert!(matches!(st.container_kind(), Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_columns() {
        let st = Structure::new(DataFormat::Csv).with_schema(tabular_schema());
        let columns = st.columns().unwrap();
        let types: Vec<_> = columns.iter().map(|c| c.column_type).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::Integer,
                ColumnType::Boolean,
                ColumnType::String,
                ColumnType::String
            ]
        );
        let titles: Vec<_> = columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c", ""]);
    }

    #[test]
    fn test_columns_missing_shape() {
        let st = Structure::new(DataFormat::Csv).with_schema(value!({ "type": "array" }));
        assert!(st.columns().is_none());
        assert!(Structure::new(DataFormat::Csv).columns().is_none());
    }

    #[test]
    fn test_has_header_row() {
        let cfg = FormatConfig::Csv(CsvOptions::new().with_header_row(true));
        assert!(Structure::new(DataFormat::Csv)
            .with_format_config(&cfg)
            .has_header_row());

        assert!(!Structure::new(DataFormat::Csv).has_header_row());

        let mut st = Structure::new(DataFormat::Json);
        st.format_config = Some(cfg.to_map());
        assert!(!st.has_header_row());

        let mut st = Structure::new(DataFormat::Csv);
        st.format_config = value!({ "headerRow": "yes" }).as_object().cloned();
        assert!(!st.has_header_row());
    }

    #[test]
    fn test_structure_from_json() {
        let st: Structure = serde_json::from_str(
            r#"{"format":"csv","formatConfig":{"headerRow":true},"schema":{"type":"array"}}"#,
        )
        .unwrap();
        assert_eq!(st.format, Some(DataFormat::Csv));
        assert!(st.has_header_row());
        assert_eq!(st.container_kind().unwrap(), ContainerKind::Ordered);

        let empty: Structure = serde_json::from_str("{}").unwrap();
        assert!(matches!(empty.data_format(), Err(Error::MissingFormat)));
    }
}
