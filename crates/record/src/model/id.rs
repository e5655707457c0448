//! Record ids - Opaque id generation for first saves
//!
//! Ids are opaque strings. The sequential strategy draws from one
//! process-wide counter so ids stay unique across registries.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::config::{IdStrategy, RecordConfig};

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Produces a fresh, unique, opaque id
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// `<prefix><n>` ids from a process-wide counter
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}

/// `<prefix><uuid v4>` ids
#[derive(Debug, Clone)]
pub struct UuidIds {
    prefix: String,
}

impl UuidIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl IdGenerator for UuidIds {
    fn generate(&self) -> String {
        format!("{}{}", self.prefix, Uuid::new_v4())
    }
}

/// Build the generator a configuration asks for
pub fn id_generator_for(config: &RecordConfig) -> Arc<dyn IdGenerator> {
    match config.id_strategy {
        IdStrategy::Sequential => Arc::new(SequentialIds::new(config.id_prefix.clone())),
        IdStrategy::Uuid => Arc::new(UuidIds::new(config.id_prefix.clone())),
    }
}

/// Normalize an id value: non-empty strings as-is, numbers as their decimal form
pub fn normalize_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
