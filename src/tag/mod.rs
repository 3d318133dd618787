//! Core tagging data structures and the resolution engine

mod engine;
mod relation;
mod resolver;
mod resource;
mod spec;

#[cfg(test)]
mod tests;

pub use engine::{TagEngine, TagError, TagResult};
pub use relation::{Relation, RelationKey, Role};
pub use resolver::{Resolved, Resolver};
pub use resource::{Resource, ResourceId};
pub use spec::{ClassSpec, ResourceFields, ResourceSpec};
