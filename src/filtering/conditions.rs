use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::classify::{TermKind, classify_term, searchable_fields};
use super::expression::{FieldPredicate, Filter, Predicate};
use crate::config::PatternMode;
use crate::models::{Column, ColumnType, DataTablesRequest, parse_number};

/// Predicate for the global search term.
fn search_predicate(term: &str, mode: PatternMode) -> Predicate {
    match classify_term(term) {
        TermKind::Number(n) => Predicate::Number(n),
        TermKind::Text => Predicate::pattern(term, mode),
    }
}

/// Strip the `^...$` anchors DataTables adds for exact column searches.
fn strip_anchors(value: &str) -> &str {
    value
        .strip_prefix('^')
        .and_then(|inner| inner.strip_suffix('$'))
        .unwrap_or(value)
}

/// A whole UTC day for `YYYY-MM-DD`, or a ±1ms window around an RFC 3339 instant.
fn date_range(value: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let from = date.and_hms_opt(0, 0, 0)?.and_utc();
        return Some((from, from + Duration::days(1)));
    }
    let instant = DateTime::parse_from_rfc3339(value).ok()?.with_timezone(&Utc);
    Some((
        instant - Duration::milliseconds(1),
        instant + Duration::milliseconds(1),
    ))
}

/// Predicate for a per-column filter value.
///
/// Values that do not parse as the column's declared type are matched as
/// patterns instead of being rejected.
fn column_predicate(column_type: ColumnType, value: &str, mode: PatternMode) -> Predicate {
    if let Some(n) = parse_number(value) {
        return Predicate::Number(n);
    }
    if column_type == ColumnType::Date
        && let Some((from, to)) = date_range(value.trim())
    {
        return Predicate::Range { from, to };
    }
    Predicate::pattern(value, mode)
}

fn column_filters(columns: &[Column], mode: PatternMode) -> Vec<FieldPredicate> {
    columns
        .iter()
        .filter(|column| !column.data.is_empty())
        .filter_map(|column| {
            let value = strip_anchors(column.search_value()?);
            if value.is_empty() {
                return None;
            }
            Some(FieldPredicate::new(
                column.data.clone(),
                column_predicate(column.column_type(), value, mode),
            ))
        })
        .collect()
}

/// Build the filter for a request.
///
/// - An empty global search term adds no `$or` clause.
/// - A search term matching exactly one column yields `{field: predicate}` and
///   nothing else.
/// - A search term matching several columns yields an `$or` with one entry per
///   column.
/// - Every column with a non-empty per-column search value adds an entry to
///   `$and`.
///
/// Returns `None` when the request has no columns, no search descriptor, or a
/// search descriptor without a value.
#[must_use]
pub fn build_find_parameters(request: &DataTablesRequest, mode: PatternMode) -> Option<Filter> {
    let columns = request.columns.as_deref()?;
    let term = request.search.as_ref()?.value.as_deref()?;

    let mut filter = Filter::new();

    if !term.is_empty() {
        let predicate = search_predicate(term, mode);
        let fields = searchable_fields(columns, term);

        match fields.as_slice() {
            [] => {
                tracing::debug!(term = %term, "No column can be searched for the search term");
            }
            [field] => return Some(filter.field(*field, predicate)),
            fields => {
                filter = filter.any_of(
                    fields
                        .iter()
                        .map(|field| FieldPredicate::new(*field, predicate.clone()))
                        .collect(),
                );
            }
        }
    }

    let per_column = column_filters(columns, mode);
    if !per_column.is_empty() {
        filter = filter.all_of(per_column);
    }

    Some(filter)
}
