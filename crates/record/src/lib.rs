//! # relic-record: Immutable records with adapter-driven persistence
//!
//! Records are frozen attribute snapshots of a registered type. Every
//! change returns a new record; relationship changes are queued and only
//! reach storage on the next save. Storage itself is delegated to a
//! `PersistenceAdapter` per type, and optional lifecycle hooks run before
//! each adapter call.
//!
//! ```rust
//! use relic_record::{RecordSchema, TypeRegistry};
//! use serde_json::json;
//!
//! let registry = TypeRegistry::new();
//! registry.register(
//!     RecordSchema::builder("Comic")
//!         .defaults(json!({"title": null}))
//!         .build()?,
//! )?;
//! let comic = registry.create("Comic", json!({"id": 13722}))?;
//! let titled = comic.set("title", "Amazing Fantasy")?;
//!
//! assert_eq!(comic.get("title"), Some(&json!(null)));
//! assert_eq!(titled.id(), Some("13722"));
//! # Ok::<(), relic_record::RecordError>(())
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod hook_error;
pub mod logging;
pub mod model;
pub mod registry;
pub mod relationships;

// Re-export core types
pub use adapter::{
    DetachedAdapter, FetchedRecord, GetRecordOptions, PersistenceAdapter, RelationshipBlock,
    RemoveRecordOptions, WriteOptions,
};
pub use config::{ConfigError, ConfigSource, IdStrategy, RecordConfig, RecordConfigTrait};
pub use error::{AdapterError, RecordError, RecordResult};
pub use hook_error::HookError;
pub use logging::{init_logging, try_init_logging, LoggingConfig};
pub use model::*;
pub use registry::{TypeRegistration, TypeRegistry, TypeResolver};
pub use relationships::{
    Direction, MergeOutcome, PendingUpdate, PendingUpdates, RelationshipDefinition,
    RelationshipGraph, RelationshipItem, RelationshipSnapshot, UpdateAction,
};
