//! Filter expression types.
//!
//! A [`Filter`] is a conjunction of three optional parts:
//! - direct field predicates (`{field: predicate}`),
//! - an `$or` list where at least one predicate must hold,
//! - an `$and` list where every predicate must hold.
//!
//! The empty filter matches every document. Filters render to MongoDB-style
//! documents with [`Filter::to_document`], which is also their `Serialize`
//! representation.

use chrono::{DateTime, NaiveDate, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::config::PatternMode;

/// Parse a stored or submitted timestamp.
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

/// Case-insensitive, unanchored match pattern built from search text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    text: String,
    source: String,
    literal: bool,
}

impl Pattern {
    /// Build a pattern from user text.
    ///
    /// In [`PatternMode::Regex`] the text is used as a regular expression
    /// unless it fails to parse, in which case it is escaped.
    #[must_use]
    pub fn new(text: &str, mode: PatternMode) -> Self {
        let literal = match mode {
            PatternMode::Literal => true,
            PatternMode::Regex => {
                if let Err(err) = Regex::new(text) {
                    tracing::debug!(
                        pattern = %text,
                        error = %err,
                        "Search text is not a valid regular expression, matching it literally"
                    );
                    true
                } else {
                    false
                }
            }
        };
        let source = if literal {
            regex::escape(text)
        } else {
            text.to_string()
        };

        Self {
            text: text.to_string(),
            source,
            literal,
        }
    }

    /// The search text as submitted.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The regular expression source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the text is matched as a plain substring.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        self.literal
    }

    /// Compile the pattern.
    ///
    /// # Errors
    ///
    /// Returns the regex error if the compiled program exceeds the size limit.
    pub fn to_regex(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.source)
            .case_insensitive(true)
            .build()
    }
}

/// A condition on a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring or regex match on the field's text.
    Pattern(Pattern),
    /// Exact numeric match.
    Number(f64),
    /// Exact match on a JSON value.
    Value(Value),
    /// Timestamp in `[from, to)`.
    Range {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl Predicate {
    #[must_use]
    pub fn pattern(text: &str, mode: PatternMode) -> Self {
        Self::Pattern(Pattern::new(text, mode))
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_document(&self) -> Value {
        match self {
            Self::Pattern(pattern) => json!({"$regex": pattern.source(), "$options": "i"}),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
                    json!(*n as i64)
                } else {
                    json!(n)
                }
            }
            Self::Value(value) => value.clone(),
            Self::Range { from, to } => json!({
                "$gte": from.to_rfc3339(),
                "$lt": to.to_rfc3339(),
            }),
        }
    }
}

/// A predicate bound to a field name.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPredicate {
    pub field: String,
    pub predicate: Predicate,
}

impl FieldPredicate {
    #[must_use]
    pub fn new(field: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            field: field.into(),
            predicate,
        }
    }

    fn to_document(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.field.clone(), self.predicate.to_document());
        Value::Object(map)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Vec<FieldPredicate>,
    any: Option<Vec<FieldPredicate>>,
    all: Option<Vec<FieldPredicate>>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a direct predicate, replacing any existing predicate on the same field.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>, predicate: Predicate) -> Self {
        self.insert(field, predicate);
        self
    }

    /// Set the `$or` clause.
    #[must_use]
    pub fn any_of(mut self, predicates: Vec<FieldPredicate>) -> Self {
        self.any = Some(predicates);
        self
    }

    /// Set the `$and` clause.
    #[must_use]
    pub fn all_of(mut self, predicates: Vec<FieldPredicate>) -> Self {
        self.all = Some(predicates);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, predicate: Predicate) {
        let field = field.into();
        if let Some(existing) = self.fields.iter_mut().find(|p| p.field == field) {
            existing.predicate = predicate;
        } else {
            self.fields.push(FieldPredicate { field, predicate });
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldPredicate] {
        &self.fields
    }

    #[must_use]
    pub fn any(&self) -> Option<&[FieldPredicate]> {
        self.any.as_deref()
    }

    #[must_use]
    pub fn all(&self) -> Option<&[FieldPredicate]> {
        self.all.as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.any.is_none() && self.all.is_none()
    }

    /// Merge `extra` into this filter. Keys present in `extra` win: direct
    /// field predicates replace same-named ones, and an `$or`/`$and` clause in
    /// `extra` replaces this filter's clause wholesale.
    pub fn merge(&mut self, extra: Self) {
        for FieldPredicate { field, predicate } in extra.fields {
            self.insert(field, predicate);
        }
        if extra.any.is_some() {
            self.any = extra.any;
        }
        if extra.all.is_some() {
            self.all = extra.all;
        }
    }

    /// MongoDB-style rendering, e.g. `{"$or": [{"name": {"$regex": "al", "$options": "i"}}]}`.
    #[must_use]
    pub fn to_document(&self) -> Value {
        let mut map = Map::new();
        for FieldPredicate { field, predicate } in &self.fields {
            map.insert(field.clone(), predicate.to_document());
        }
        if let Some(any) = &self.any {
            map.insert(
                "$or".to_string(),
                Value::Array(any.iter().map(FieldPredicate::to_document).collect()),
            );
        }
        if let Some(all) = &self.all {
            map.insert(
                "$and".to_string(),
                Value::Array(all.iter().map(FieldPredicate::to_document).collect()),
            );
        }
        Value::Object(map)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pattern_regex_mode_keeps_metacharacters() {
        let pattern = Pattern::new("^al.*e$", PatternMode::Regex);
        assert_eq!(pattern.source(), "^al.*e$");
        assert!(!pattern.is_literal());
        assert!(pattern.to_regex().unwrap().is_match("ALICE"));
    }

    #[test]
    fn test_pattern_literal_mode_escapes() {
        let pattern = Pattern::new("a.c", PatternMode::Literal);
        assert!(pattern.is_literal());
        let regex = pattern.to_regex().unwrap();
        assert!(regex.is_match("xA.Cx"));
        assert!(!regex.is_match("abc"));
    }

    #[test]
    fn test_invalid_regex_falls_back_to_literal() {
        let pattern = Pattern::new("(unclosed", PatternMode::Regex);
        assert!(pattern.is_literal());
        assert_eq!(pattern.text(), "(unclosed");
        assert!(pattern.to_regex().unwrap().is_match("an (UNCLOSED paren"));
    }

    #[test]
    fn test_number_document_is_integer_when_integral() {
        assert_eq!(Predicate::Number(42.0).to_document(), json!(42));
        assert_eq!(Predicate::Number(4.5).to_document(), json!(4.5));
    }

    #[test]
    fn test_filter_document_shape() {
        let filter = Filter::new()
            .field("status", Predicate::Value(json!("active")))
            .any_of(vec![
                FieldPredicate::new("name", Predicate::pattern("al", PatternMode::Regex)),
                FieldPredicate::new("city", Predicate::pattern("al", PatternMode::Regex)),
            ])
            .all_of(vec![FieldPredicate::new("age", Predicate::Number(30.0))]);

        assert_eq!(
            filter.to_document(),
            json!({
                "status": "active",
                "$or": [
                    {"name": {"$regex": "al", "$options": "i"}},
                    {"city": {"$regex": "al", "$options": "i"}}
                ],
                "$and": [{"age": 30}]
            })
        );
        assert_eq!(serde_json::to_value(&filter).unwrap(), filter.to_document());
    }

    #[test]
    fn test_empty_filter() {
        let filter = Filter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.to_document(), json!({}));
    }

    #[test]
    fn test_merge_extra_keys_win() {
        let mut filter = Filter::new()
            .field("owner", Predicate::Value(json!("alice")))
            .field("age", Predicate::Number(3.0))
            .any_of(vec![FieldPredicate::new("name", Predicate::Number(1.0))]);

        let extra = Filter::new()
            .field("owner", Predicate::Value(json!("bob")))
            .field("tenant", Predicate::Value(json!(7)));
        filter.merge(extra);

        assert_eq!(
            filter.to_document(),
            json!({
                "owner": "bob",
                "age": 3,
                "tenant": 7,
                "$or": [{"name": 1}]
            })
        );
    }

    #[test]
    fn test_merge_replaces_clauses() {
        let mut filter =
            Filter::new().any_of(vec![FieldPredicate::new("a", Predicate::Number(1.0))]);
        filter.merge(Filter::new().any_of(vec![FieldPredicate::new("b", Predicate::Number(2.0))]));
        assert_eq!(filter.to_document(), json!({"$or": [{"b": 2}]}));
    }

    #[test]
    fn test_parse_timestamp() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T01:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
