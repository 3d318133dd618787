//! Storage trait definitions

use std::path::Path;

use thiserror::Error;

use crate::query::ResourceQuery;
use crate::tag::{Relation, RelationKey, Resource, ResourceId};

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid table identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("timestamp parsing error: {0}")]
    TimestampParse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Conjunctive exact-match filter over resource columns.
///
/// Fields left unset are not filtered on; the lookup is an AND of the set
/// fields, not a full-row equality. A filter with nothing set matches
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub id: Option<ResourceId>,
    pub uri: Option<String>,
    pub class: Option<ResourceId>,
    pub value: Option<String>,
    pub content: Option<String>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: ResourceId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_class(mut self, class: ResourceId) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// True when no field is set.
    pub fn is_unset(&self) -> bool {
        self.id.is_none()
            && self.uri.is_none()
            && self.class.is_none()
            && self.value.is_none()
            && self.content.is_none()
    }
}

/// Insertable attributes of a resource row. The class is already resolved
/// to an id at this layer; name resolution happens in the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewResource {
    pub uri: Option<String>,
    pub class: Option<ResourceId>,
    pub value: Option<String>,
    pub content: Option<String>,
}

impl NewResource {
    /// True when no attribute is set (nothing to insert or update).
    pub fn is_unset(&self) -> bool {
        self.uri.is_none() && self.class.is_none() && self.value.is_none() && self.content.is_none()
    }
}

/// Contract between the tagging engine and a relational backend.
///
/// Implementations must be thread-safe (Send + Sync). Each method is a
/// single blocking statement against the store, atomic exactly as far as
/// the store natively guarantees; the engine performs no multi-statement
/// transaction wrapping on top.
pub trait TagStore: Send + Sync {
    // === Resource operations ===

    /// Find the resource matching all set fields of the filter. Under the
    /// id/uri uniqueness invariants at most one row can match; the first
    /// match is returned.
    fn find_resource(&self, filter: &ResourceFilter) -> StorageResult<Option<Resource>>;

    /// Insert a resource row, ignoring a duplicate uri. Returns the fresh
    /// surrogate id, or `None` when the insert was ignored or there was
    /// nothing to insert.
    fn insert_resource(&self, attrs: &NewResource) -> StorageResult<Option<ResourceId>>;

    /// Update the set attributes of the resource with the given id.
    /// Returns the number of rows affected.
    fn update_resource(&self, id: ResourceId, attrs: &NewResource) -> StorageResult<usize>;

    /// Delete a resource row by id. Returns the number of rows affected.
    fn delete_resource(&self, id: ResourceId) -> StorageResult<usize>;

    /// Run a reporting query over the resource table.
    fn find_resources(&self, query: &ResourceQuery) -> StorageResult<Vec<Resource>>;

    // === Relation operations ===

    /// Exact-tuple lookup of a relation. Empty roles are matched
    /// literally, never wildcarded.
    fn fetch_relation(&self, key: &RelationKey) -> StorageResult<Option<Relation>>;

    /// Insert a relation row, ignoring an existing tuple. Returns the
    /// number of rows affected; 0 for an already-existing tuple is
    /// success, not an error.
    fn create_relation(&self, key: &RelationKey) -> StorageResult<usize>;

    /// Delete the exact relation tuple. Returns the number of rows
    /// affected; 0 for a missing tuple is success, not an error.
    fn delete_relation(&self, key: &RelationKey) -> StorageResult<usize>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: TagStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
