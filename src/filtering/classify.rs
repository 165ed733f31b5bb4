use crate::models::{Column, ColumnType, parse_number};

/// Kind of a global search term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TermKind {
    Number(f64),
    Text,
}

#[must_use]
pub fn classify_term(term: &str) -> TermKind {
    parse_number(term).map_or(TermKind::Text, TermKind::Number)
}

/// A column annotated with its effective searchability for one search term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedColumn<'a> {
    pub column: &'a Column,
    pub column_type: ColumnType,
    pub searchable: bool,
}

/// Annotate every column with whether it takes part in a global search for `term`.
///
/// A column is searchable when the client marked it searchable and its type
/// matches the term: numeric terms search number columns, anything else
/// searches text columns. Date columns never take part in global search.
/// The input columns are left untouched.
#[must_use]
pub fn classify_columns<'a>(columns: &'a [Column], term: &str) -> Vec<ClassifiedColumn<'a>> {
    let kind = classify_term(term);
    columns
        .iter()
        .map(|column| {
            let column_type = column.column_type();
            let type_matches = matches!(
                (kind, column_type),
                (TermKind::Number(_), ColumnType::Number) | (TermKind::Text, ColumnType::Text)
            );
            ClassifiedColumn {
                column,
                column_type,
                searchable: column.searchable && type_matches && !column.data.is_empty(),
            }
        })
        .collect()
}

/// Field names of the columns a global search for `term` should look at, in column order.
#[must_use]
pub fn searchable_fields<'a>(columns: &'a [Column], term: &str) -> Vec<&'a str> {
    classify_columns(columns, term)
        .into_iter()
        .filter(|classified| classified.searchable)
        .map(|classified| classified.column.data.as_str())
        .collect()
}
