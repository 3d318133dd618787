//! Reporting queries over the resource table
//!
//! The tagging operations never need these; they back the `fetch`
//! reporting surface of the engine and the CLI.

mod fetch;

pub use fetch::{ResourceField, ResourceQuery, SortKey, SortOrder};
