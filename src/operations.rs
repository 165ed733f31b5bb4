//! # Query Runner
//!
//! [`DataTablesQuery`] binds a [`Collection`] to a set of [`QueryOptions`] and
//! answers DataTables requests against it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use datatables_query::{DataTablesQuery, Filter, MemoryCollection};
//!
//! let query = DataTablesQuery::new(MemoryCollection::new(documents));
//!
//! // Every row the user sees must belong to the current tenant
//! let tenant = Filter::new().field("tenant", Predicate::Value(json!("acme")));
//! let response = query.run(&request, tenant).await?;
//! ```
//!
//! A request is answered in three store calls made one after the other:
//! the unfiltered count, the filtered count and the page fetch. Nothing is
//! sent to the store until the whole request has been validated.

use crate::config::QueryOptions;
use crate::errors::QueryError;
use crate::filtering::{
    Filter, build_find_parameters, build_select_parameters, build_sort_parameters,
};
use crate::models::{DataTablesRequest, DataTablesResponse};
use crate::pagination::resolve_page_window;
use crate::store::{Collection, FindQuery};

/// A collection that answers DataTables requests.
#[derive(Debug, Clone)]
pub struct DataTablesQuery<C> {
    collection: C,
    options: QueryOptions,
}

impl<C: Collection> DataTablesQuery<C> {
    #[must_use]
    pub fn new(collection: C) -> Self {
        Self {
            collection,
            options: QueryOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn options(&self) -> &QueryOptions {
        &self.options
    }

    #[must_use]
    pub const fn collection(&self) -> &C {
        &self.collection
    }

    /// Answer one request.
    ///
    /// `extra_filter` is merged into the filter derived from the request, its
    /// entries replacing derived entries on the same field. Pass
    /// `Filter::new()` when there is nothing to add.
    ///
    /// # Errors
    ///
    /// - [`QueryError::InvalidParameters`] when `draw`, `start` or `length`
    ///   cannot be resolved.
    /// - [`QueryError::InvalidQuery`] when the request has no columns, no
    ///   search value, or no usable order directive.
    /// - [`QueryError::DataAccess`] when a store call fails.
    pub async fn run(
        &self,
        request: &DataTablesRequest,
        extra_filter: Filter,
    ) -> Result<DataTablesResponse, QueryError> {
        let window = resolve_page_window(request, self.options.paging)?;

        let mut filter =
            build_find_parameters(request, self.options.pattern_mode).ok_or_else(|| {
                QueryError::invalid_query("Cannot build filter: columns or search value missing")
            })?;
        let sort = build_sort_parameters(request).ok_or_else(|| {
            QueryError::invalid_query("Cannot sort: order must reference an orderable column")
        })?;
        let projection = build_select_parameters(request)
            .ok_or_else(|| QueryError::invalid_query("Cannot select fields: columns missing"))?;

        filter.merge(extra_filter);

        tracing::debug!(
            draw = window.draw,
            filter = %filter.to_document(),
            sort = %sort,
            "Running table query"
        );

        let records_total = self
            .collection
            .count_documents(&Filter::new())
            .await
            .map_err(QueryError::data_access)?;

        let records_filtered = self
            .collection
            .count_documents(&filter)
            .await
            .map_err(QueryError::data_access)?;

        let query = FindQuery::new(filter)
            .populate(request.populate.clone())
            .select(projection)
            .sort(sort)
            .skip(window.start)
            .limit(window.length);

        let data = self
            .collection
            .find(&query)
            .await
            .map_err(QueryError::data_access)?;

        Ok(DataTablesResponse {
            draw: window.draw,
            records_total,
            records_filtered,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PagingPolicy;
    use crate::filtering::{Predicate, SortKey};
    use crate::models::{Column, ColumnType, OrderSpec, Param, Search};
    use async_trait::async_trait;
    use sea_orm::DbErr;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Records every call and answers with fixed values.
    #[derive(Default)]
    struct RecordingCollection {
        counts: Mutex<Vec<Filter>>,
        finds: Mutex<Vec<FindQuery>>,
        fail_on_count: bool,
        fail_on_find: bool,
    }

    impl RecordingCollection {
        fn failing() -> Self {
            Self {
                fail_on_find: true,
                ..Default::default()
            }
        }

        fn failing_count() -> Self {
            Self {
                fail_on_count: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.counts.lock().unwrap().len() + self.finds.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Collection for RecordingCollection {
        async fn count_documents(&self, filter: &Filter) -> Result<u64, DbErr> {
            let mut counts = self.counts.lock().unwrap();
            counts.push(filter.clone());
            if self.fail_on_count {
                return Err(DbErr::Custom("count timed out".to_string()));
            }
            Ok(if filter.is_empty() { 10 } else { 4 })
        }

        async fn find(&self, query: &FindQuery) -> Result<Vec<Value>, DbErr> {
            self.finds.lock().unwrap().push(query.clone());
            if self.fail_on_find {
                return Err(DbErr::Custom("connection reset".to_string()));
            }
            Ok(vec![json!({"name": "Ada"})])
        }
    }

    fn request() -> DataTablesRequest {
        DataTablesRequest {
            draw: Some(Param::from(3)),
            start: Some(Param::from(20)),
            length: Some(Param::from(10)),
            search: Some(Search::new("ada")),
            order: Some(vec![OrderSpec::new(0, "asc")]),
            columns: Some(vec![
                Column::new("name").searchable(true),
                Column::new("age").with_type(ColumnType::Number),
            ]),
            populate: vec!["team".to_string()],
        }
    }

    #[tokio::test]
    async fn test_run_sequences_store_calls() {
        let query = DataTablesQuery::new(RecordingCollection::default());
        let response = query.run(&request(), Filter::new()).await.unwrap();

        assert_eq!(response.draw, 3);
        assert_eq!(response.records_total, 10);
        assert_eq!(response.records_filtered, 4);
        assert_eq!(response.data, vec![json!({"name": "Ada"})]);

        let collection = query.collection();
        let counts = collection.counts.lock().unwrap();
        assert_eq!(counts.len(), 2);
        assert!(counts[0].is_empty(), "first count must be unfiltered");
        assert_eq!(counts[1].fields()[0].field, "name");

        let finds = collection.finds.lock().unwrap();
        let find = &finds[0];
        assert_eq!(find.skip, 20);
        assert_eq!(find.limit, 10);
        assert_eq!(find.sort, Some(SortKey::asc("name")));
        assert_eq!(find.populate, vec!["team".to_string()]);
        assert_eq!(find.projection.to_document(), json!({"name": 1, "age": 1}));
    }

    #[tokio::test]
    async fn test_extra_filter_is_merged() {
        let query = DataTablesQuery::new(RecordingCollection::default());
        let extra = Filter::new().field("tenant", Predicate::Value(json!("acme")));
        query.run(&request(), extra).await.unwrap();

        let finds = query.collection().finds.lock().unwrap();
        let document = finds[0].filter.to_document();
        assert_eq!(document["tenant"], json!("acme"));
        assert!(document.get("name").is_some());
    }

    #[tokio::test]
    async fn test_missing_draw_makes_no_store_calls() {
        let query = DataTablesQuery::new(RecordingCollection::default());
        let mut request = request();
        request.draw = None;

        let err = query.run(&request, Filter::new()).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidParameters { .. }));
        assert!(err.to_string().contains("draw"));
        assert_eq!(query.collection().calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_columns_makes_no_store_calls() {
        let query = DataTablesQuery::new(RecordingCollection::default());
        let mut request = request();
        request.columns = None;

        let err = query.run(&request, Filter::new()).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery { .. }));
        assert_eq!(query.collection().calls(), 0);
    }

    #[tokio::test]
    async fn test_unorderable_column_is_rejected() {
        let query = DataTablesQuery::new(RecordingCollection::default());
        let mut request = request();
        request.order = Some(vec![OrderSpec::new(5, "asc")]);

        let err = query.run(&request, Filter::new()).await.unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery { .. }));
        assert_eq!(query.collection().calls(), 0);
    }

    #[tokio::test]
    async fn test_lenient_paging_defaults() {
        let query = DataTablesQuery::new(RecordingCollection::default())
            .with_options(QueryOptions::default().with_paging(PagingPolicy::Lenient));
        let mut request = request();
        request.draw = None;
        request.start = Some(Param::from("abc"));
        request.length = None;

        let response = query.run(&request, Filter::new()).await.unwrap();
        assert_eq!(response.draw, 1);

        let finds = query.collection().finds.lock().unwrap();
        assert_eq!(finds[0].skip, 0);
        assert_eq!(finds[0].limit, 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_data_access_error() {
        let query = DataTablesQuery::new(RecordingCollection::failing());
        let err = query.run(&request(), Filter::new()).await.unwrap_err();

        assert!(matches!(err, QueryError::DataAccess { .. }));
        assert!(!err.is_validation());
        let message = err.db_error().map(ToString::to_string).unwrap_or_default();
        assert!(message.contains("connection reset"), "got: {message}");
    }

    #[tokio::test]
    async fn test_count_failure_aborts_before_fetch() {
        let query = DataTablesQuery::new(RecordingCollection::failing_count());
        let err = query.run(&request(), Filter::new()).await.unwrap_err();

        assert!(matches!(err, QueryError::DataAccess { .. }));
        let message = err.db_error().map(ToString::to_string).unwrap_or_default();
        assert!(message.contains("count timed out"), "got: {message}");

        let collection = query.collection();
        assert_eq!(collection.counts.lock().unwrap().len(), 1);
        assert!(collection.finds.lock().unwrap().is_empty());
    }
}
