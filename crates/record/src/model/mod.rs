//! Record System - Immutable records and the types that build them
//!
//! - `schema`: declared keys, defaults and relationship definitions
//! - `record_type`: a registered type; constructs records
//! - `record`: the immutable record value
//! - `mutation`: clone-on-write attribute and relationship changes
//! - `lifecycle`: optional before-hooks per type
//! - `crud_operations`: save / fetch / remove orchestration
//! - `id`: opaque id generation

pub mod crud_operations;
pub mod id;
pub mod lifecycle;
pub mod mutation;
pub mod record;
pub mod record_type;
pub mod schema;

/// Flat attribute mapping handed to hooks and adapters
pub type Attributes = serde_json::Map<String, serde_json::Value>;

pub use crud_operations::FetchOptions;
pub use id::{IdGenerator, SequentialIds, UuidIds};
pub use lifecycle::{LifecycleHook, LifecycleHooks};
pub use record::Record;
pub use record_type::RecordType;
pub use schema::{RecordSchema, RecordSchemaBuilder, RESERVED_KEYS};
