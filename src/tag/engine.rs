//! TagEngine: the tagging facade over a relational store

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::query::ResourceQuery;
use crate::storage::{StorageError, TagStore};

use super::relation::{RelationKey, Role};
use super::resolver::Resolver;
use super::resource::{Resource, ResourceId};
use super::spec::ResourceSpec;

/// Errors that can occur in tagging operations
#[derive(Debug, Error)]
pub enum TagError {
    /// An id-specified role names a resource that does not exist, or the
    /// id is not a positive integer.
    #[error("invalid resource id: {0}")]
    InvalidId(ResourceId),

    /// A class reference that is not a positive resource id.
    #[error("invalid class id: {0}")]
    InvalidClass(ResourceId),

    /// A relation role id outside the contract: neither a positive id nor
    /// the empty sentinel.
    #[error("{role} role requires a positive resource id or the empty sentinel, got {id}")]
    InvalidRoleId { role: Role, id: ResourceId },

    /// A resource insert was attempted and failed.
    #[error("resource creation failed")]
    CreationFailed,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type for tagging operations
pub type TagResult<T> = Result<T, TagError>;

/// The tagging facade.
///
/// Composes the [`Resolver`] with the relation operations of a
/// [`TagStore`]: each of the four roles of a tag is independently resolved
/// from its specifier to a resource id, then the relation tuple is
/// written, erased or probed. The engine owns no storage state; beyond the
/// store handle it only carries the reporting query settings, and every
/// call is a fresh sequence of blocking storage round trips.
///
/// There is no multi-statement transaction around a call: a `write` that
/// fails resolving a later role leaves resources created for earlier roles
/// persisted. They are harmless, deduplicated by content on the next
/// resolution.
pub struct TagEngine {
    store: Arc<dyn TagStore>,
    fetch_query: ResourceQuery,
}

impl std::fmt::Debug for TagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagEngine")
            .field("fetch_query", &self.fetch_query)
            .finish_non_exhaustive()
    }
}

impl TagEngine {
    /// Create an engine over a store.
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self {
            store,
            fetch_query: ResourceQuery::new(),
        }
    }

    /// Replace the reporting query settings used by [`fetch`](Self::fetch).
    pub fn with_fetch_query(mut self, query: ResourceQuery) -> Self {
        self.fetch_query = query;
        self
    }

    /// A resolver bound to this engine's store.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self.store.as_ref())
    }

    /// Create a tag.
    ///
    /// Each role accepts any specifier shape (see [`ResourceSpec`]).
    /// Id-specified roles must name an existing resource;
    /// attribute-specified roles are reused when a matching resource
    /// exists and created otherwise. The relation row is only written when
    /// the subject is non-empty and at least one of predicate and object
    /// is non-empty; otherwise the write is silently skipped. Writing an
    /// existing tuple again affects nothing.
    ///
    /// Returns the engine for chaining.
    pub fn write(
        &self,
        subject: impl Into<ResourceSpec>,
        predicate: impl Into<ResourceSpec>,
        object: impl Into<ResourceSpec>,
        creator: impl Into<ResourceSpec>,
    ) -> TagResult<&Self> {
        let subject = self.resolve_for_write(&subject.into())?;
        let predicate = self.resolve_for_write(&predicate.into())?;
        let object = self.resolve_for_write(&object.into())?;
        let creator = self.resolve_for_write(&creator.into())?;

        if !subject.is_empty() && (!predicate.is_empty() || !object.is_empty()) {
            let key = RelationKey::new(subject, predicate, object, creator)?;
            let rows = self.store.create_relation(&key)?;
            debug!(%subject, %predicate, %object, %creator, rows, "wrote tag");
        } else {
            debug!(%subject, %predicate, %object, "tag skipped, subject or predicate/object empty");
        }
        Ok(self)
    }

    /// Remove a tag.
    ///
    /// Arguments are as in [`write`](Self::write), but attribute-specified
    /// roles are resolved by lookup only: if any of them names a resource
    /// that does not exist, the erase deletes nothing and returns
    /// successfully. Erasing a tuple that was never written is likewise a
    /// no-op.
    ///
    /// Returns the engine for chaining.
    pub fn erase(
        &self,
        subject: impl Into<ResourceSpec>,
        predicate: impl Into<ResourceSpec>,
        object: impl Into<ResourceSpec>,
        creator: impl Into<ResourceSpec>,
    ) -> TagResult<&Self> {
        let Some(subject) = self.resolve_for_read(&subject.into())? else {
            return Ok(self);
        };
        let Some(predicate) = self.resolve_for_read(&predicate.into())? else {
            return Ok(self);
        };
        let Some(object) = self.resolve_for_read(&object.into())? else {
            return Ok(self);
        };
        let Some(creator) = self.resolve_for_read(&creator.into())? else {
            return Ok(self);
        };

        let key = RelationKey::new(subject, predicate, object, creator)?;
        let rows = self.store.delete_relation(&key)?;
        debug!(%subject, %predicate, %object, %creator, rows, "erased tag");
        Ok(self)
    }

    /// Check whether a tag exists.
    ///
    /// Arguments are as in [`write`](Self::write). Any role whose
    /// attribute specifier does not resolve makes the result `false`.
    pub fn exists(
        &self,
        subject: impl Into<ResourceSpec>,
        predicate: impl Into<ResourceSpec>,
        object: impl Into<ResourceSpec>,
        creator: impl Into<ResourceSpec>,
    ) -> TagResult<bool> {
        let Some(subject) = self.resolve_for_read(&subject.into())? else {
            return Ok(false);
        };
        let Some(predicate) = self.resolve_for_read(&predicate.into())? else {
            return Ok(false);
        };
        let Some(object) = self.resolve_for_read(&object.into())? else {
            return Ok(false);
        };
        let Some(creator) = self.resolve_for_read(&creator.into())? else {
            return Ok(false);
        };

        let key = RelationKey::new(subject, predicate, object, creator)?;
        Ok(self.store.fetch_relation(&key)?.is_some())
    }

    /// Fetch resources matching the configured reporting query.
    pub fn fetch(&self) -> TagResult<Vec<Resource>> {
        Ok(self.store.find_resources(&self.fetch_query)?)
    }

    /// Resolve one role for the write path: empty stays empty, ids must
    /// exist, attribute specifiers are resolved or created.
    fn resolve_for_write(&self, spec: &ResourceSpec) -> TagResult<ResourceId> {
        if let ResourceSpec::ById(id) = spec {
            return match self.resolver().fetch_by_id(*id)? {
                Some(resource) => Ok(resource.id),
                None => Err(TagError::InvalidId(*id)),
            };
        }
        match spec.to_fields() {
            Some(fields) => {
                let resolved = self.resolver().resolve_or_create(&fields)?;
                Ok(resolved.into_resource().id)
            }
            None => Ok(ResourceId::EMPTY),
        }
    }

    /// Resolve one role for the read path (erase/exists): ids pass through
    /// unverified, attribute specifiers resolve by lookup only. `None`
    /// means the role names a resource that does not exist.
    fn resolve_for_read(&self, spec: &ResourceSpec) -> TagResult<Option<ResourceId>> {
        if let ResourceSpec::ById(id) = spec {
            return Ok(Some(*id));
        }
        match spec.to_fields() {
            Some(fields) => Ok(self
                .resolver()
                .fetch_fields(&fields)?
                .map(|resource| resource.id)),
            None => Ok(Some(ResourceId::EMPTY)),
        }
    }
}
