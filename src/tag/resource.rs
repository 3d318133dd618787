//! Resource identity and the resource record

use serde::{Deserialize, Serialize};

/// Integer surrogate id of a resource.
///
/// Ids are assigned by the store on creation and never change. Three ids
/// are reserved: [`ResourceId::EMPTY`] stands in for an unset relation role,
/// [`ResourceId::ROOT`] is the root resource and [`ResourceId::CLASS`] is
/// the meta-class under which all class resources are filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(i64);

impl ResourceId {
    /// The empty resource: the canonical "no resource in this role" id.
    pub const EMPTY: ResourceId = ResourceId(0);
    /// The root resource ("taggg").
    pub const ROOT: ResourceId = ResourceId(1);
    /// The meta-class resource ("class").
    pub const CLASS: ResourceId = ResourceId(2);

    /// Wrap a raw id.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw integer id.
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whether this is the empty sentinel.
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    /// Whether this is a valid surrogate id (positive).
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl From<i64> for ResourceId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A taggable resource.
///
/// `uri`, when present, is globally unique. `class` references another
/// resource, so resources form a self-referential typing relation. Rows are
/// created lazily on first use and never mutated by the tagging operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Surrogate id, immutable once assigned
    pub id: ResourceId,
    /// Globally unique URI
    pub uri: Option<String>,
    /// Classifying resource
    pub class: Option<ResourceId>,
    /// Short value
    pub value: Option<String>,
    /// Free-form content
    pub content: Option<String>,
}

impl Resource {
    /// The fixed row for a reserved id, if `id` is one of the three
    /// reserved ids. Lets id-only lookups of reserved resources skip the
    /// storage round trip.
    pub fn reserved(id: ResourceId) -> Option<Resource> {
        let value = match id {
            ResourceId::EMPTY => "empty",
            ResourceId::ROOT => "taggg",
            ResourceId::CLASS => "class",
            _ => return None,
        };
        Some(Resource {
            id,
            uri: None,
            class: Some(ResourceId::ROOT),
            value: Some(value.to_string()),
            content: None,
        })
    }
}
