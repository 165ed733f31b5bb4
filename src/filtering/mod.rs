//! # Request Translation
//!
//! Turns a [`DataTablesRequest`](crate::models::DataTablesRequest) into the
//! three parameters a data store needs: a filter, a sort key and a projection.
//!
//! ## Main Components
//!
//! - **[`searchable_fields`]**: which columns a global search term applies to
//! - **[`build_find_parameters`]**: global search and per-column filters as a [`Filter`]
//! - **[`build_sort_parameters`]**: the first `order` directive as a [`SortKey`]
//! - **[`build_select_parameters`]**: every declared column as a [`Projection`]
//!
//! ## Example
//!
//! ```rust,ignore
//! // {"search": {"value": "ali"}, "columns": [
//! //     {"data": "name", "searchable": true},
//! //     {"data": "city", "searchable": true}]}
//! let filter = build_find_parameters(&request, PatternMode::Regex).unwrap();
//! assert_eq!(filter.to_document(), json!({"$or": [
//!     {"name": {"$regex": "ali", "$options": "i"}},
//!     {"city": {"$regex": "ali", "$options": "i"}}
//! ]}));
//! ```
//!
//! All builders are pure: they borrow the request and never modify it, so
//! calling them repeatedly on the same request gives the same result.

pub mod classify;
pub mod conditions;
pub mod expression;
pub mod select;
pub mod sort;

pub use classify::{ClassifiedColumn, TermKind, classify_columns, classify_term, searchable_fields};
pub use conditions::build_find_parameters;
pub use expression::{FieldPredicate, Filter, Pattern, Predicate, parse_timestamp};
pub use select::{Projection, build_select_parameters};
pub use sort::{SortDirection, SortKey, build_sort_parameters};
