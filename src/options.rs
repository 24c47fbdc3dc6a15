//! Per-format configuration.
//!
//! A [`Structure`](crate::Structure) may carry a `formatConfig` map. This
//! module turns that map into typed options:
//!
//! - [`CsvOptions`]: header row, lazy quotes, separator, variadic fields
//! - [`JsonOptions`]: no options yet
//! - [`XlsxOptions`]: sheet name
//!
//! [`FormatConfig`] ties an option set to its [`DataFormat`].
//!
//! ## Examples
//!
//! ```rust
//! use dsio::{value, CsvOptions, DataFormat, FormatConfig};
//!
//! let map = value!({ "headerRow": true, "separator": ";" });
//! let config = FormatConfig::parse(DataFormat::Csv, map.as_object()).unwrap();
//! assert_eq!(
//!     config,
//!     FormatConfig::Csv(CsvOptions::new().with_header_row(true).with_separator(';'))
//! );
//! ```

use crate::{DataFormat, Error, Map, Result, Value};

/// Configuration for CSV data.
///
/// # Examples
///
/// ```rust
/// use dsio::CsvOptions;
///
/// let options = CsvOptions::new()
///     .with_header_row(true)
///     .with_separator('\t')
///     .with_variadic_fields(true);
/// assert_eq!(options.delimiter(), b'\t');
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CsvOptions {
    /// The first record holds column titles rather than data.
    pub header_row: bool,
    /// A quote may appear in an unquoted field and a non-doubled quote may
    /// appear in a quoted field.
    pub lazy_quotes: bool,
    /// Field delimiter; `None` means `,`.
    pub separator: Option<char>,
    /// Records may have differing numbers of fields.
    pub variadic_fields: bool,
}

impl CsvOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_header_row(mut self, header_row: bool) -> Self {
        self.header_row = header_row;
        self
    }

    #[must_use]
    pub fn with_lazy_quotes(mut self, lazy_quotes: bool) -> Self {
        self.lazy_quotes = lazy_quotes;
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = Some(separator);
        self
    }

    #[must_use]
    pub fn with_variadic_fields(mut self, variadic_fields: bool) -> Self {
        self.variadic_fields = variadic_fields;
        self
    }

    /// The separator as the single byte the CSV layer expects.
    ///
    /// Options built through [`CsvOptions::from_map`] always hold an ASCII
    /// separator; a non-ASCII one set by hand falls back to `,`.
    #[must_use]
    pub fn delimiter(&self) -> u8 {
        match self.separator {
            Some(c) if c.is_ascii() => c as u8,
            _ => b',',
        }
    }

    /// Parses options from a `formatConfig` map.
    ///
    /// Absent keys keep their defaults. A present key with the wrong value
    /// type is an error, as is a separator that is not exactly one ASCII
    /// character.
    pub fn from_map(map: Option<&Map>) -> Result<Self> {
        let mut o = CsvOptions::default();
        let Some(map) = map else {
            return Ok(o);
        };

        o.header_row = bool_option(map, "headerRow")?.unwrap_or(false);
        o.lazy_quotes = bool_option(map, "lazyQuotes")?.unwrap_or(false);
        o.variadic_fields = bool_option(map, "variadicFields")?.unwrap_or(false);

        match map.get("separator") {
            None | Some(Value::Null) => {}
            Some(Value::String(sep)) => {
                let mut chars = sep.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii() && c != '\r' && c != '\n' => {
                        o.separator = Some(c)
                    }
                    (Some(_), None) => {
                        return Err(Error::invalid_config(format!(
                            "separator {sep:?} is not usable as a field delimiter"
                        )))
                    }
                    _ => {
                        return Err(Error::invalid_config(
                            "separator must be a single character",
                        ))
                    }
                }
            }
            Some(other) => {
                return Err(Error::invalid_config(format!(
                    "invalid separator value: {other}"
                )))
            }
        }

        Ok(o)
    }

    /// Renders the non-default options as a `formatConfig` map.
    #[must_use]
    pub fn to_map(&self) -> Map {
        let mut map = Map::new();
        if self.header_row {
            map.insert("headerRow".into(), Value::Bool(true));
        }
        if self.lazy_quotes {
            map.insert("lazyQuotes".into(), Value::Bool(true));
        }
        if self.variadic_fields {
            map.insert("variadicFields".into(), Value::Bool(true));
        }
        if let Some(sep) = self.separator {
            map.insert("separator".into(), Value::String(sep.to_string()));
        }
        map
    }
}

/// Configuration for JSON data. JSON currently takes no options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JsonOptions {}

/// Configuration for XLSX data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XlsxOptions {
    pub sheet_name: Option<String>,
}

impl XlsxOptions {
    #[must_use]
    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    pub fn from_map(map: Option<&Map>) -> Result<Self> {
        let mut o = XlsxOptions::default();
        if let Some(map) = map {
            match map.get("sheetName") {
                None | Some(Value::Null) => {}
                Some(Value::String(name)) => o.sheet_name = Some(name.clone()),
                Some(other) => {
                    return Err(Error::invalid_config(format!(
                        "invalid sheetName value: {other}"
                    )))
                }
            }
        }
        Ok(o)
    }
}

/// A typed format configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatConfig {
    Csv(CsvOptions),
    Json(JsonOptions),
    Xlsx(XlsxOptions),
}

impl FormatConfig {
    /// Parses the configuration map for `format`.
    pub fn parse(format: DataFormat, map: Option<&Map>) -> Result<Self> {
        match format {
            DataFormat::Csv => CsvOptions::from_map(map).map(FormatConfig::Csv),
            DataFormat::Json => Ok(FormatConfig::Json(JsonOptions::default())),
            DataFormat::Xlsx => XlsxOptions::from_map(map).map(FormatConfig::Xlsx),
        }
    }

    /// The data format this configuration applies to.
    #[must_use]
    pub fn format(&self) -> DataFormat {
        match self {
            FormatConfig::Csv(_) => DataFormat::Csv,
            FormatConfig::Json(_) => DataFormat::Json,
            FormatConfig::Xlsx(_) => DataFormat::Xlsx,
        }
    }

    /// Renders the configuration back into map form.
    #[must_use]
    pub fn to_map(&self) -> Map {
        match self {
            FormatConfig::Csv(o) => o.to_map(),
            FormatConfig::Json(_) => Map::new(),
            FormatConfig::Xlsx(o) => {
                let mut map = Map::new();
                if let Some(name) = &o.sheet_name {
                    map.insert("sheetName".into(), Value::String(name.clone()));
                }
                map
            }
        }
    }
}

fn bool_option(map: &Map, key: &str) -> Result<Option<bool>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(Error::invalid_config(format!(
            "invalid {key} value: {other}"
        ))),
    }
}
