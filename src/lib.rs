//! Taggg: a multiuser metadata tagging engine over a relational store.
//!
//! Tagging means creating a relation among four resources: subject,
//! predicate, object and creator. Every resource is identified by an
//! integer surrogate id and may carry a globally unique URI, a class
//! (a reference to another resource), a value and free-form content.
//! Relations are keyed on the full 4-tuple, with the reserved empty
//! resource (id 0) standing in for any unset role.
//!
//! # Core Concepts
//!
//! - **Resources**: taggable entities, lazily created on first use and
//!   deduplicated by content
//! - **Relations**: 4-ary tuples of resource ids, idempotent to write and
//!   to erase
//! - **Specifiers**: loosely-typed resource references (id, `uri:...`,
//!   `class:value`, attribute record) resolved to stable ids per call
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use taggg::{OpenStore, SqliteStore, TagEngine};
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let engine = TagEngine::new(Arc::new(store));
//!
//! engine.write(1, "dc:title", "Hello", 1).unwrap();
//! assert!(engine.exists(1, "dc:title", "Hello", 1).unwrap());
//!
//! engine.erase(1, "dc:title", "Hello", 1).unwrap();
//! assert!(!engine.exists(1, "dc:title", "Hello", 1).unwrap());
//! ```

mod tag;
pub mod query;
pub mod storage;

pub use query::{ResourceField, ResourceQuery, SortKey, SortOrder};
pub use storage::{
    NewResource, OpenStore, ResourceFilter, SqliteStore, StorageError, StorageResult, TagStore,
    Tables,
};
pub use tag::{
    ClassSpec, Relation, RelationKey, Resolved, Resolver, Resource, ResourceFields, ResourceId,
    ResourceSpec, Role, TagEngine, TagError, TagResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
