use std::fmt;

use crate::models::{DataTablesRequest, Param};

const ASCENDING: &str = "asc";
const DESCENDING_MARKER: char = '-';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `"asc"` sorts ascending; any other value, or none, sorts descending.
    fn from_dir(dir: Option<&str>) -> Self {
        if dir == Some(ASCENDING) {
            Self::Asc
        } else {
            Self::Desc
        }
    }
}

/// A single-field sort directive.
///
/// Displays as the field name for ascending order and as `-field` for
/// descending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parse `field` / `-field` notation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.strip_prefix(DESCENDING_MARKER) {
            Some("") => None,
            Some(field) => Some(Self::desc(field)),
            None if value.is_empty() => None,
            None => Some(Self::asc(value)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Asc => write!(f, "{}", self.field),
            SortDirection::Desc => write!(f, "{DESCENDING_MARKER}{}", self.field),
        }
    }
}

/// Resolve the first `order` directive against the request's columns.
///
/// Only the first directive is honoured. Returns `None` when `order` is
/// missing or empty, when the column index is not a non-negative integer or is
/// out of range, or when the referenced column is not orderable or has no
/// field name.
#[must_use]
pub fn build_sort_parameters(request: &DataTablesRequest) -> Option<SortKey> {
    let order = request.order.as_deref()?.first()?;
    let index = usize::try_from(order.column.as_ref().and_then(Param::as_index)?).ok()?;
    let column = request.columns.as_deref()?.get(index)?;

    if !column.orderable || column.data.is_empty() {
        return None;
    }

    Some(SortKey {
        field: column.data.clone(),
        direction: SortDirection::from_dir(order.dir.as_deref()),
    })
}
