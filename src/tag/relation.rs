//! Relation tuples and their role contract

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::engine::{TagError, TagResult};
use super::resource::ResourceId;

/// The four roles of a relation, in tuple order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Subject,
    Predicate,
    Object,
    Creator,
}

impl Role {
    /// All roles, in tuple order.
    pub const ALL: [Role; 4] = [Role::Subject, Role::Predicate, Role::Object, Role::Creator];

    /// The role's column name.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Subject => "subject",
            Role::Predicate => "predicate",
            Role::Object => "object",
            Role::Creator => "creator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated key of a relation: one id per role, each either a positive
/// resource id or the empty sentinel.
///
/// There is no null at the relation layer; an unset role *is* the empty
/// resource, matched literally on lookup and delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationKey {
    subject: ResourceId,
    predicate: ResourceId,
    object: ResourceId,
    creator: ResourceId,
}

impl RelationKey {
    /// Build a key, rejecting any role id that is neither positive nor the
    /// empty sentinel.
    pub fn new(
        subject: ResourceId,
        predicate: ResourceId,
        object: ResourceId,
        creator: ResourceId,
    ) -> TagResult<Self> {
        let key = RelationKey {
            subject,
            predicate,
            object,
            creator,
        };
        for (role, id) in key.roles() {
            if !id.is_valid() && !id.is_empty() {
                return Err(TagError::InvalidRoleId { role, id });
            }
        }
        Ok(key)
    }

    /// Role/id pairs in tuple order.
    pub fn roles(&self) -> [(Role, ResourceId); 4] {
        [
            (Role::Subject, self.subject),
            (Role::Predicate, self.predicate),
            (Role::Object, self.object),
            (Role::Creator, self.creator),
        ]
    }

    pub fn subject(&self) -> ResourceId {
        self.subject
    }

    pub fn predicate(&self) -> ResourceId {
        self.predicate
    }

    pub fn object(&self) -> ResourceId {
        self.object
    }

    pub fn creator(&self) -> ResourceId {
        self.creator
    }
}

/// A stored relation: the 4-tuple plus the store-assigned creation time.
///
/// The tuple is the full primary key; relations are never updated in
/// place (erase and rewrite is the update path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub subject: ResourceId,
    pub predicate: ResourceId,
    pub object: ResourceId,
    pub creator: ResourceId,
    /// Assigned by the store on insert
    pub created: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roles_are_accepted() {
        let key = RelationKey::new(
            ResourceId::new(3),
            ResourceId::EMPTY,
            ResourceId::EMPTY,
            ResourceId::EMPTY,
        )
        .unwrap();
        assert_eq!(key.subject().raw(), 3);
        assert!(key.predicate().is_empty());
    }

    #[test]
    fn roles_follow_tuple_order() {
        let key = RelationKey::new(
            ResourceId::new(1),
            ResourceId::new(2),
            ResourceId::new(3),
            ResourceId::new(4),
        )
        .unwrap();
        let order: Vec<Role> = key.roles().iter().map(|(role, _)| *role).collect();
        assert_eq!(order.as_slice(), &Role::ALL);
    }

    #[test]
    fn negative_role_id_is_rejected() {
        let err = RelationKey::new(
            ResourceId::new(1),
            ResourceId::new(-2),
            ResourceId::EMPTY,
            ResourceId::EMPTY,
        )
        .unwrap_err();
        match err {
            TagError::InvalidRoleId { role, id } => {
                assert_eq!(role, Role::Predicate);
                assert_eq!(id.raw(), -2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
