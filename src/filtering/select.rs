use serde_json::{Map, Value};

use crate::models::DataTablesRequest;

/// Inclusion projection: the fields to return for every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Build a projection, dropping empty and repeated field names.
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut projection = Self::default();
        for field in fields {
            let field = field.into();
            if !field.is_empty() && !projection.fields.contains(&field) {
                projection.fields.push(field);
            }
        }
        projection
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `{field: 1, ...}`
    #[must_use]
    pub fn to_document(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.clone(), Value::from(1)))
            .collect();
        Value::Object(map)
    }
}

/// Include every declared column's field, whether or not the client shows it.
///
/// Returns `None` when the request has no `columns`.
#[must_use]
pub fn build_select_parameters(request: &DataTablesRequest) -> Option<Projection> {
    let columns = request.columns.as_deref()?;
    Some(Projection::new(columns.iter().map(|column| column.data.as_str())))
}
