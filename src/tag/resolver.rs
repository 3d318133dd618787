//! Resource resolution: pure lookup and lookup-or-create

use tracing::debug;

use crate::storage::{NewResource, ResourceFilter, TagStore};

use super::engine::{TagError, TagResult};
use super::resource::{Resource, ResourceId};
use super::spec::{ClassSpec, ResourceFields, ResourceSpec};

/// Outcome of [`Resolver::resolve_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// An existing resource matched the attributes and was reused.
    Found(Resource),
    /// No resource matched; a new row was inserted.
    Created(Resource),
}

impl Resolved {
    /// The resolved resource.
    pub fn resource(&self) -> &Resource {
        match self {
            Resolved::Found(resource) | Resolved::Created(resource) => resource,
        }
    }

    /// Consume into the resolved resource.
    pub fn into_resource(self) -> Resource {
        match self {
            Resolved::Found(resource) | Resolved::Created(resource) => resource,
        }
    }

    /// Whether the resolution inserted a new row.
    pub fn was_created(&self) -> bool {
        matches!(self, Resolved::Created(_))
    }
}

/// Resolves resource specifiers against a store.
///
/// The two entry points are deliberately distinct capabilities:
/// [`fetch`](Resolver::fetch) never writes, while
/// [`resolve_or_create`](Resolver::resolve_or_create) lazily materializes
/// missing resources, including class resources referenced by name. No
/// resolved id is cached; every call resolves against the store.
pub struct Resolver<'a> {
    store: &'a dyn TagStore,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a store.
    pub fn new(store: &'a dyn TagStore) -> Self {
        Self { store }
    }

    /// Look up the resource a specifier describes, without creating
    /// anything. `Ok(None)` means no such resource exists, including the
    /// case of a class name that never got a class resource.
    pub fn fetch(&self, spec: &ResourceSpec) -> TagResult<Option<Resource>> {
        if let ResourceSpec::ById(id) = spec {
            return self.fetch_by_id(*id);
        }
        match spec.to_fields() {
            Some(fields) => self.fetch_fields(&fields),
            None => Ok(None),
        }
    }

    /// Look up a resource by id. Non-positive ids match nothing; the
    /// reserved ids resolve from constants without a storage round trip.
    pub fn fetch_by_id(&self, id: ResourceId) -> TagResult<Option<Resource>> {
        if !id.is_valid() {
            return Ok(None);
        }
        if let Some(reserved) = Resource::reserved(id) {
            return Ok(Some(reserved));
        }
        Ok(self
            .store
            .find_resource(&ResourceFilter::new().with_id(id))?)
    }

    /// Look up a resource by an exact match on the set attributes of the
    /// record. Unset attributes are not filtered on.
    pub fn fetch_fields(&self, fields: &ResourceFields) -> TagResult<Option<Resource>> {
        let Some(filter) = self.lookup_filter(fields)? else {
            return Ok(None);
        };
        if filter.is_unset() {
            return Ok(None);
        }
        Ok(self.store.find_resource(&filter)?)
    }

    /// Look up the class resource registered under `name`.
    pub fn fetch_class(&self, name: &str) -> TagResult<Option<Resource>> {
        Ok(self.store.find_resource(
            &ResourceFilter::new()
                .with_class(ResourceId::CLASS)
                .with_value(name),
        )?)
    }

    /// Resolve an attribute record to an existing resource, inserting a
    /// new row when nothing matches. A class referenced by name is itself
    /// resolved or created first, filed under the class meta-resource.
    ///
    /// When a concurrent writer wins the insert race on a unique uri, the
    /// ignored insert is followed by one re-fetch of the winner's row;
    /// only if that also misses does the call fail.
    pub fn resolve_or_create(&self, fields: &ResourceFields) -> TagResult<Resolved> {
        let class = match &fields.class {
            Some(ClassSpec::Name(name)) => Some(self.resolve_class(name)?),
            Some(ClassSpec::Id(id)) if !id.is_valid() => return Err(TagError::InvalidClass(*id)),
            Some(ClassSpec::Id(id)) => Some(*id),
            None => None,
        };
        let attrs = NewResource {
            uri: fields.uri.clone(),
            class,
            value: fields.value.clone(),
            content: fields.content.clone(),
        };
        if let Some(existing) = self.fetch_attrs(&attrs)? {
            return Ok(Resolved::Found(existing));
        }
        match self.store.insert_resource(&attrs)? {
            Some(id) => {
                debug!(%id, "created resource");
                Ok(Resolved::Created(Resource {
                    id,
                    uri: attrs.uri,
                    class: attrs.class,
                    value: attrs.value,
                    content: attrs.content,
                }))
            }
            None => match self.fetch_attrs(&attrs)? {
                Some(existing) => Ok(Resolved::Found(existing)),
                None => Err(TagError::CreationFailed),
            },
        }
    }

    /// Resolve a class name to a class resource id, creating the class
    /// resource when it does not exist yet.
    fn resolve_class(&self, name: &str) -> TagResult<ResourceId> {
        let fields = ResourceFields::new()
            .with_class(ClassSpec::Id(ResourceId::CLASS))
            .with_value(name);
        Ok(self.resolve_or_create(&fields)?.resource().id)
    }

    /// Exact-match lookup over already-normalized attributes.
    fn fetch_attrs(&self, attrs: &NewResource) -> TagResult<Option<Resource>> {
        let mut filter = ResourceFilter::new();
        if let Some(uri) = &attrs.uri {
            filter = filter.with_uri(uri.clone());
        }
        if let Some(class) = attrs.class {
            filter = filter.with_class(class);
        }
        if let Some(value) = &attrs.value {
            filter = filter.with_value(value.clone());
        }
        if let Some(content) = &attrs.content {
            filter = filter.with_content(content.clone());
        }
        if filter.is_unset() {
            return Ok(None);
        }
        Ok(self.store.find_resource(&filter)?)
    }

    /// Build the lookup filter for an attribute record, resolving a class
    /// name fetch-only. `None` means the named class does not exist, so
    /// the lookup as a whole cannot match.
    fn lookup_filter(&self, fields: &ResourceFields) -> TagResult<Option<ResourceFilter>> {
        let mut filter = ResourceFilter::new();
        match &fields.class {
            Some(ClassSpec::Name(name)) => match self.fetch_class(name)? {
                Some(class) => filter = filter.with_class(class.id),
                None => return Ok(None),
            },
            Some(ClassSpec::Id(id)) if !id.is_valid() => return Err(TagError::InvalidClass(*id)),
            Some(ClassSpec::Id(id)) => filter = filter.with_class(*id),
            None => {}
        }
        if let Some(uri) = &fields.uri {
            filter = filter.with_uri(uri.clone());
        }
        if let Some(value) = &fields.value {
            filter = filter.with_value(value.clone());
        }
        if let Some(content) = &fields.content {
            filter = filter.with_content(content.clone());
        }
        Ok(Some(filter))
    }
}
