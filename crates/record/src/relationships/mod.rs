//! Relationships - Definitions, queued updates and materialized graphs
//!
//! - `definition`: `has<Type>` / `belongsTo<Type>` tokens
//! - `pending`: the per-record queue of relationship mutations
//! - `merge`: serialized snapshots and the diff-merge applied on save
//! - `graph`: related records materialized through the type registry

pub mod definition;
pub mod graph;
pub mod merge;
pub mod pending;

pub use definition::{parse_definitions, Direction, RelationshipDefinition};
pub use graph::RelationshipGraph;
pub use merge::{MergeOutcome, RelationshipSnapshot};
pub use pending::{PendingUpdate, PendingUpdates, RelationshipItem, UpdateAction};
