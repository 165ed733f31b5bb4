use std::marker::PhantomData;

use async_trait::async_trait;
use sea_orm::{
    Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Alias, BinOper, Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr},
};
use serde_json::Value;

use super::{Collection, FindQuery};
use crate::filtering::{FieldPredicate, Filter, Pattern, Predicate, SortDirection};

/// Row limit used when only an offset is requested; SQLite and MySQL reject
/// `OFFSET` without `LIMIT`.
const UNLIMITED: u64 = i64::MAX.unsigned_abs();

/// Escape LIKE wildcards so search text matches literally.
/// Escapes: % (match any) and _ (match single char)
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn column(field: &str) -> Expr {
    Expr::col(Alias::new(field))
}

fn column_ref(field: &str) -> SimpleExpr {
    SimpleExpr::Column(Alias::new(field).into_column_ref())
}

/// The column's value as text. MySQL compares any column with LIKE directly
/// and has no `TEXT` cast target.
fn column_text(field: &str, backend: DatabaseBackend) -> SimpleExpr {
    match backend {
        DatabaseBackend::MySql => column_ref(field),
        _ => column(field).cast_as(Alias::new("TEXT")),
    }
}

/// Regex patterns use Postgres' case-insensitive `~*` operator and MySQL's
/// `REGEXP_LIKE(col, pattern, 'i')`. SQLite has no built-in regex function, so
/// there regex patterns are matched like literal ones: `UPPER(col) LIKE
/// UPPER('%text%')` with wildcards escaped.
fn pattern_expr(field: &str, pattern: &Pattern, backend: DatabaseBackend) -> SimpleExpr {
    let text = column_text(field, backend);

    if !pattern.is_literal() {
        match backend {
            DatabaseBackend::Postgres => {
                return Expr::expr(text).binary(BinOper::Custom("~*"), Expr::val(pattern.source()));
            }
            DatabaseBackend::MySql => {
                return SimpleExpr::FunctionCall(
                    Func::cust(Alias::new("REGEXP_LIKE"))
                        .arg(text)
                        .arg(Expr::val(pattern.source()))
                        .arg(Expr::val("i")),
                );
            }
            _ => {
                tracing::warn!(
                    field = %field,
                    pattern = %pattern.source(),
                    "SQLite cannot evaluate regular expressions, matching the search text literally"
                );
            }
        }
    }

    let like = format!("%{}%", escape_like_wildcards(pattern.text()).to_uppercase());
    Expr::expr(SimpleExpr::FunctionCall(Func::upper(text))).like(LikeExpr::new(like).escape('\\'))
}

#[allow(clippy::cast_possible_truncation)]
fn number_expr(field: &str, n: f64) -> SimpleExpr {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        column(field).eq(n as i64)
    } else {
        column(field).eq(n)
    }
}

fn value_expr(field: &str, value: &Value) -> Result<SimpleExpr, DbErr> {
    Ok(match value {
        Value::Null => column(field).is_null(),
        Value::Bool(b) => column(field).eq(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => column(field).eq(i),
            None => column(field).eq(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => column(field).eq(s.as_str()),
        Value::Array(_) | Value::Object(_) => {
            return Err(DbErr::Custom(format!(
                "Cannot compare column '{field}' with a JSON array or object"
            )));
        }
    })
}

fn predicate_expr(
    FieldPredicate { field, predicate }: &FieldPredicate,
    backend: DatabaseBackend,
) -> Result<SimpleExpr, DbErr> {
    Ok(match predicate {
        Predicate::Pattern(pattern) => pattern_expr(field, pattern, backend),
        Predicate::Number(n) => number_expr(field, *n),
        Predicate::Value(value) => value_expr(field, value)?,
        Predicate::Range { from, to } => column(field).gte(*from).and(column(field).lt(*to)),
    })
}

/// Render a [`Filter`] as a Sea-ORM condition for `backend`.
///
/// # Errors
///
/// Returns `DbErr::Custom` when the filter compares a column with a JSON
/// array or object.
pub fn filter_condition(filter: &Filter, backend: DatabaseBackend) -> Result<Condition, DbErr> {
    let mut condition = Condition::all();

    for predicate in filter.fields() {
        condition = condition.add(predicate_expr(predicate, backend)?);
    }

    if let Some(any) = filter.any() {
        if any.is_empty() {
            condition = condition.add(Expr::val(1).eq(0));
        } else {
            let mut or_conditions = Condition::any();
            for predicate in any {
                or_conditions = or_conditions.add(predicate_expr(predicate, backend)?);
            }
            condition = condition.add(or_conditions);
        }
    }

    if let Some(all) = filter.all() {
        for predicate in all {
            condition = condition.add(predicate_expr(predicate, backend)?);
        }
    }

    Ok(condition)
}

/// `SELECT` over `E` restricted to `filter`. The empty filter adds no `WHERE`.
fn filtered_select<E: EntityTrait>(
    filter: &Filter,
    backend: DatabaseBackend,
) -> Result<Select<E>, DbErr> {
    let select = E::find();
    if filter.is_empty() {
        return Ok(select);
    }
    Ok(select.filter(filter_condition(filter, backend)?))
}

/// A Sea-ORM entity exposed as a [`Collection`].
///
/// Rows are returned as JSON objects keyed by the projected column names.
/// Relation expansion is not supported: a query with `populate` fails.
#[derive(Debug, Clone)]
pub struct EntityCollection<E> {
    db: DatabaseConnection,
    entity: PhantomData<E>,
}

impl<E: EntityTrait> EntityCollection<E> {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            entity: PhantomData,
        }
    }

    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl<E> Collection for EntityCollection<E>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    async fn count_documents(&self, filter: &Filter) -> Result<u64, DbErr> {
        filtered_select::<E>(filter, self.db.get_database_backend())?
            .count(&self.db)
            .await
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<Value>, DbErr> {
        if !query.populate.is_empty() {
            return Err(DbErr::Custom(format!(
                "Relation expansion is not supported for table '{}': {}",
                E::default().table_name(),
                query.populate.join(", ")
            )));
        }

        let mut select = filtered_select::<E>(&query.filter, self.db.get_database_backend())?;

        if !query.projection.is_empty() {
            select = select.select_only();
            for field in query.projection.fields() {
                select = select.column_as(column_ref(field), field.as_str());
            }
        }

        if let Some(key) = &query.sort {
            let order = match key.direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            select = select.order_by(column_ref(&key.field), order);
        }

        if query.skip > 0 || query.limit > 0 {
            let limit = if query.limit == 0 { UNLIMITED } else { query.limit };
            select = select.offset(query.skip).limit(limit);
        }

        select.into_json().all(&self.db).await
    }
}
