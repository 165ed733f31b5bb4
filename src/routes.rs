use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use crate::errors::QueryError;
use crate::filtering::Filter;
use crate::models::{DataTablesRequest, DataTablesResponse};
use crate::operations::DataTablesQuery;
use crate::store::Collection;

/// Answer a DataTables request posted as JSON.
///
/// # Errors
///
/// A body that is not a valid request is rejected with
/// [`QueryError::InvalidParameters`]. Otherwise returns the [`QueryError`]
/// from [`DataTablesQuery::run`]. Both render as 400 or 500 JSON responses.
pub async fn datatables_handler<C>(
    State(query): State<Arc<DataTablesQuery<C>>>,
    payload: Result<Json<DataTablesRequest>, JsonRejection>,
) -> Result<Json<DataTablesResponse>, QueryError>
where
    C: Collection + 'static,
{
    let Json(request) =
        payload.map_err(|rejection| QueryError::invalid_parameters(rejection.body_text()))?;
    let response = query.run(&request, Filter::new()).await?;
    Ok(Json(response))
}

/// A router serving `POST {path}` for `query`.
///
/// ```rust,ignore
/// let people = DataTablesQuery::new(EntityCollection::<person::Entity>::new(db));
/// let app = Router::new().nest("/api/v1", datatables_router("/people", people));
/// ```
pub fn datatables_router<C>(path: &str, query: DataTablesQuery<C>) -> Router
where
    C: Collection + 'static,
{
    Router::new()
        .route(path, post(datatables_handler::<C>))
        .with_state(Arc::new(query))
}
