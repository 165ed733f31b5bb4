use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, DisplayFromStr, PickFirst, serde_as};
use utoipa::ToSchema;

/// Parse a numeric string the way form-encoded clients expect.
///
/// Surrounding whitespace is ignored. Empty strings and non-finite values
/// (`NaN`, `inf`) are not numbers.
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A scalar request parameter that may arrive as a JSON number or as a string.
///
/// DataTables posts `draw`, `start`, `length` and `order[].column` as strings
/// when it form-encodes a request, and as numbers when it sends JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Param {
    Number(f64),
    Text(String),
}

impl Param {
    /// Numeric value, if the parameter holds a finite number or a numeric string.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Self::Text(text) => parse_number(text),
        }
    }

    /// Integer value, if the parameter is numeric with no fractional part.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_integer(&self) -> Option<i64> {
        self.as_number()
            .filter(|n| n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64)
            .map(|n| n as i64)
    }

    /// Non-negative integer value, used for offsets and column indexes.
    #[must_use]
    pub fn as_index(&self) -> Option<u64> {
        self.as_integer().and_then(|n| u64::try_from(n).ok())
    }
}

impl From<i64> for Param {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Declared type of a column, read from the column's `name` field.
///
/// `"number"` and `"date"` select the matching kind (case-insensitive); every
/// other value, including the empty string, is treated as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Date,
}

impl ColumnType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
        }
    }
}

impl From<&str> for ColumnType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "number" => Self::Number,
            "date" => Self::Date,
            _ => Self::Text,
        }
    }
}

impl From<String> for ColumnType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.as_str().to_string()
    }
}

/// Search descriptor, used both for the global search box and per column.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Search {
    /// Search text. An absent value makes the request unusable for filtering.
    #[serde(default)]
    pub value: Option<String>,
    /// Sent by DataTables but ignored: search text is always pattern-matched.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub regex: bool,
}

impl Search {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            regex: false,
        }
    }
}

const fn default_orderable() -> bool {
    true
}

/// A column descriptor from the `columns` array of a request.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Column {
    /// Field name in the data store.
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub data: String,
    /// Column type hint: `"text"`, `"number"` or `"date"`.
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    #[schema(value_type = String, example = "number")]
    pub name: ColumnType,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub searchable: bool,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default = "default_orderable")]
    pub orderable: bool,
    /// Per-column filter.
    #[serde(default)]
    pub search: Option<Search>,
}

impl Column {
    /// A text column that is orderable but not searchable, mirroring the
    /// defaults applied when a client omits the flags.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            name: ColumnType::Text,
            searchable: false,
            orderable: true,
            search: None,
        }
    }

    #[must_use]
    pub const fn with_type(mut self, column_type: ColumnType) -> Self {
        self.name = column_type;
        self
    }

    #[must_use]
    pub const fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    #[must_use]
    pub const fn orderable(mut self, orderable: bool) -> Self {
        self.orderable = orderable;
        self
    }

    #[must_use]
    pub fn with_search(mut self, value: impl Into<String>) -> Self {
        self.search = Some(Search::new(value));
        self
    }

    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.name
    }

    /// Non-empty per-column filter text, if any.
    #[must_use]
    pub fn search_value(&self) -> Option<&str> {
        self.search
            .as_ref()
            .and_then(|search| search.value.as_deref())
            .filter(|value| !value.is_empty())
    }
}

/// One entry of the `order` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderSpec {
    /// Index into `columns`.
    #[serde(default)]
    pub column: Option<Param>,
    /// `"asc"` or `"desc"`.
    #[serde(default)]
    pub dir: Option<String>,
}

impl OrderSpec {
    #[must_use]
    pub fn new(column: i64, dir: &str) -> Self {
        Self {
            column: Some(Param::from(column)),
            dir: Some(dir.to_string()),
        }
    }
}

/// A DataTables server-side processing request.
///
/// ```json
/// {
///   "draw": 1, "start": 0, "length": 10,
///   "search": {"value": "42", "regex": false},
///   "order": [{"column": 0, "dir": "asc"}],
///   "columns": [{"data": "age", "name": "number", "searchable": true,
///                "orderable": "true", "search": {"value": ""}}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DataTablesRequest {
    /// Echo token returned unchanged in the response.
    #[serde(default)]
    pub draw: Option<Param>,
    /// Offset of the first row.
    #[serde(default)]
    pub start: Option<Param>,
    /// Page size. `0` or `-1` return every matching row.
    #[serde(default)]
    pub length: Option<Param>,
    #[serde(default)]
    pub search: Option<Search>,
    #[serde(default)]
    pub order: Option<Vec<OrderSpec>>,
    #[serde(default)]
    pub columns: Option<Vec<Column>>,
    /// Relation names to expand in the returned rows.
    #[serde(default)]
    pub populate: Vec<String>,
}

/// Response envelope expected by DataTables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataTablesResponse {
    pub draw: u64,
    /// Number of rows in the collection before filtering.
    pub records_total: u64,
    /// Number of rows matching the filter, before pagination.
    pub records_filtered: u64,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<serde_json::Value>,
}
