use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use sea_orm::DbErr;
use serde_json::{Map, Value};

use super::{Collection, FindQuery};
use crate::filtering::{FieldPredicate, Filter, Predicate, Projection, SortDirection, parse_timestamp};

const ID_FIELD: &str = "_id";

/// JSON documents held in memory.
///
/// Field paths may be dotted (`address.city`). A field holding an array
/// matches when the array itself or any of its elements matches.
///
/// Relations used for population are registered by name; populating relation
/// `author` replaces each document's `author` id (or array of ids) with the
/// related document(s) whose `_id` matches.
#[derive(Debug, Clone, Default)]
pub struct MemoryCollection {
    documents: Vec<Value>,
    relations: HashMap<String, Vec<Value>>,
}

impl MemoryCollection {
    #[must_use]
    pub fn new(documents: Vec<Value>) -> Self {
        Self {
            documents,
            relations: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_relation(mut self, name: impl Into<String>, documents: Vec<Value>) -> Self {
        self.relations.insert(name.into(), documents);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn matching<'a>(&'a self, filter: &Filter) -> Result<Vec<&'a Value>, DbErr> {
        let compiled = CompiledFilter::compile(filter)?;
        Ok(self
            .documents
            .iter()
            .filter(|document| compiled.matches(document))
            .collect())
    }

    fn populate(&self, document: &mut Value, relation: &str) -> Result<(), DbErr> {
        let related = self
            .relations
            .get(relation)
            .ok_or_else(|| DbErr::Custom(format!("Unknown relation '{relation}'")))?;

        let find = |id: &Value| {
            related
                .iter()
                .find(|candidate| candidate.get(ID_FIELD).is_some_and(|rid| values_equal(rid, id)))
                .cloned()
        };

        if let Some(slot) = document.get_mut(relation) {
            let expanded = match &*slot {
                Value::Array(ids) => Value::Array(ids.iter().filter_map(find).collect()),
                id => find(id).unwrap_or(Value::Null),
            };
            *slot = expanded;
        }
        Ok(())
    }
}

enum Matcher {
    Regex(Regex),
    Number(f64),
    Value(Value),
    Range {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

impl Matcher {
    fn compile(predicate: &Predicate) -> Result<Self, DbErr> {
        Ok(match predicate {
            Predicate::Pattern(pattern) => Self::Regex(
                pattern
                    .to_regex()
                    .map_err(|err| DbErr::Custom(format!("Invalid search pattern: {err}")))?,
            ),
            Predicate::Number(n) => Self::Number(*n),
            Predicate::Value(value) => Self::Value(value.clone()),
            Predicate::Range { from, to } => Self::Range {
                from: *from,
                to: *to,
            },
        })
    }

    #[allow(clippy::float_cmp)]
    fn test(&self, value: &Value) -> bool {
        match self {
            Self::Regex(regex) => value.as_str().is_some_and(|text| regex.is_match(text)),
            Self::Number(n) => value.as_f64().is_some_and(|x| x == *n),
            Self::Value(expected) => values_equal(value, expected),
            Self::Range { from, to } => value
                .as_str()
                .and_then(parse_timestamp)
                .is_some_and(|timestamp| *from <= timestamp && timestamp < *to),
        }
    }

    fn matches_field(&self, value: Option<&Value>) -> bool {
        match value {
            None => matches!(self, Self::Value(Value::Null)),
            Some(array @ Value::Array(items)) => {
                self.test(array) || items.iter().any(|item| self.test(item))
            }
            Some(value) => self.test(value),
        }
    }
}

struct CompiledFilter {
    fields: Vec<(String, Matcher)>,
    any: Option<Vec<(String, Matcher)>>,
    all: Option<Vec<(String, Matcher)>>,
}

impl CompiledFilter {
    fn compile_list(predicates: &[FieldPredicate]) -> Result<Vec<(String, Matcher)>, DbErr> {
        predicates
            .iter()
            .map(|p| Ok((p.field.clone(), Matcher::compile(&p.predicate)?)))
            .collect()
    }

    fn compile(filter: &Filter) -> Result<Self, DbErr> {
        Ok(Self {
            fields: Self::compile_list(filter.fields())?,
            any: filter.any().map(Self::compile_list).transpose()?,
            all: filter.all().map(Self::compile_list).transpose()?,
        })
    }

    fn matches(&self, document: &Value) -> bool {
        let holds = |(field, matcher): &(String, Matcher)| matcher.matches_field(lookup(document, field));

        self.fields.iter().all(holds)
            && self.any.as_ref().is_none_or(|any| any.iter().any(holds))
            && self.all.as_ref().is_none_or(|all| all.iter().all(holds))
    }
}

/// Follow a dotted path through nested objects.
fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.as_object()?.get(segment))
}

fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = child {
                insert_path(child, rest, value);
            }
        }
    }
}

#[allow(clippy::float_cmp)]
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

const fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Missing and null sort first, then booleans, numbers, strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    type_rank(a).cmp(&type_rank(b)).then_with(|| match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    })
}

fn project(document: &Value, projection: &Projection) -> Value {
    if projection.is_empty() {
        return document.clone();
    }
    let mut projected = Map::new();
    if let Some(id) = document.get(ID_FIELD) {
        projected.insert(ID_FIELD.to_string(), id.clone());
    }
    for field in projection.fields() {
        if let Some(value) = lookup(document, field) {
            insert_path(&mut projected, field, value.clone());
        }
    }
    Value::Object(projected)
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn count_documents(&self, filter: &Filter) -> Result<u64, DbErr> {
        let count = self.matching(filter)?.len();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Value>, DbErr> {
        let mut rows = self.matching(&query.filter)?;

        if let Some(key) = &query.sort {
            rows.sort_by(|a, b| {
                let ordering = compare_values(lookup(a, &key.field), lookup(b, &key.field));
                match key.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = match query.limit {
            0 => usize::MAX,
            limit => usize::try_from(limit).unwrap_or(usize::MAX),
        };

        rows.into_iter()
            .skip(skip)
            .take(limit)
            .map(|document| {
                let mut row = project(document, &query.projection);
                for relation in &query.populate {
                    self.populate(&mut row, relation)?;
                }
                Ok(row)
            })
            .collect()
    }
}
