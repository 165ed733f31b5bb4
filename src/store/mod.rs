//! # Data Store Contract
//!
//! The query runner talks to its data store through the [`Collection`] trait.
//! A collection counts documents matching a [`Filter`] and fetches a page of
//! documents described by a [`FindQuery`].
//!
//! Two implementations are provided:
//! - [`MemoryCollection`]: JSON documents held in memory, with relation
//!   expansion.
//! - [`EntityCollection`]: any Sea-ORM entity, with the filter rendered as a
//!   SQL condition.
//!
//! ## Implementing a store
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use datatables_query::store::{Collection, FindQuery};
//!
//! struct MongoStore { collection: mongodb::Collection<Document> }
//!
//! #[async_trait]
//! impl Collection for MongoStore {
//!     async fn count_documents(&self, filter: &Filter) -> Result<u64, DbErr> {
//!         let document = bson::to_document(&filter.to_document())?;
//!         // ...
//!     }
//!
//!     async fn find(&self, query: &FindQuery) -> Result<Vec<serde_json::Value>, DbErr> {
//!         // query.projection.to_document(), query.sort, query.skip, query.limit ...
//!     }
//! }
//! ```

pub mod entity;
pub mod memory;

use async_trait::async_trait;
use sea_orm::DbErr;

use crate::filtering::{Filter, Projection, SortKey};

pub use entity::EntityCollection;
pub use memory::MemoryCollection;

/// Description of a fetch: filter, relation expansion, projection, sort and window.
///
/// Built the way a document-store cursor is chained:
///
/// ```rust,ignore
/// let query = FindQuery::new(filter)
///     .populate(vec!["author".into()])
///     .select(projection)
///     .sort(SortKey::desc("age"))
///     .skip(20)
///     .limit(10);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub populate: Vec<String>,
    /// Fields to return. An empty projection returns whole documents.
    pub projection: Projection,
    pub sort: Option<SortKey>,
    pub skip: u64,
    /// Maximum rows to return; `0` means no limit.
    pub limit: u64,
}

impl FindQuery {
    #[must_use]
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn populate(mut self, relations: Vec<String>) -> Self {
        self.populate = relations;
        self
    }

    #[must_use]
    pub fn select(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    #[must_use]
    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    #[must_use]
    pub const fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

/// A queryable set of documents.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Number of documents matching `filter`. The empty filter counts everything.
    async fn count_documents(&self, filter: &Filter) -> Result<u64, DbErr>;

    /// Documents matching `query.filter`, expanded, projected, sorted and windowed.
    async fn find(&self, query: &FindQuery) -> Result<Vec<serde_json::Value>, DbErr>;
}

#[async_trait]
impl<C: Collection + ?Sized> Collection for std::sync::Arc<C> {
    async fn count_documents(&self, filter: &Filter) -> Result<u64, DbErr> {
        (**self).count_documents(filter).await
    }

    async fn find(&self, query: &FindQuery) -> Result<Vec<serde_json::Value>, DbErr> {
        (**self).find(query).await
    }
}
