//! # datatables-query
//!
//! Server-side processing for [DataTables](https://datatables.net) grids.
//!
//! A DataTables client posts the state of its grid (paging window, global
//! search box, per-column search boxes, sort order, visible columns) and
//! expects one page of rows back together with the total and filtered row
//! counts. This crate translates that request into a filter, a sort key and a
//! projection, runs them against a [`Collection`], and builds the response
//! envelope.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use datatables_query::{DataTablesQuery, EntityCollection, datatables_router};
//!
//! let people = DataTablesQuery::new(EntityCollection::<person::Entity>::new(db));
//! let app = axum::Router::new().nest("/api", datatables_router("/people", people));
//! ```
//!
//! ## Modules
//!
//! - [`models`]: request and response shapes of the DataTables protocol
//! - [`filtering`]: request → filter / sort key / projection translation
//! - [`pagination`]: `draw`, `start` and `length` resolution
//! - [`store`]: the [`Collection`] contract, an in-memory store and a Sea-ORM adapter
//! - [`operations`]: the query runner
//! - [`routes`]: axum handler and router
//! - [`config`]: pattern and paging options
//! - [`errors`]: [`QueryError`]

pub mod config;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod operations;
pub mod pagination;
pub mod routes;
pub mod store;

pub use config::{PagingPolicy, PatternMode, QueryOptions};
pub use errors::QueryError;
pub use filtering::{
    FieldPredicate, Filter, Pattern, Predicate, Projection, SortDirection, SortKey,
    build_find_parameters, build_select_parameters, build_sort_parameters, searchable_fields,
};
pub use models::{Column, ColumnType, DataTablesRequest, DataTablesResponse, OrderSpec, Param, Search};
pub use operations::DataTablesQuery;
pub use pagination::{PageWindow, resolve_page_window};
pub use routes::{datatables_handler, datatables_router};
pub use store::{Collection, EntityCollection, FindQuery, MemoryCollection};
