//! Records - Frozen attribute snapshots with a typed relationship graph
//!
//! A `Record` never changes after construction. Mutating operations return a
//! new record that shares unchanged parts with the original.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::record_type::RecordType;
use super::Attributes;
use crate::error::{RecordError, RecordResult};
use crate::relationships::{
    PendingUpdates, RelationshipDefinition, RelationshipGraph, RelationshipItem,
};

/// An immutable record instance
#[derive(Clone)]
pub struct Record {
    kind: Arc<RecordType>,
    id: Option<String>,
    attributes: Arc<Attributes>,
    relationships: Arc<RelationshipGraph>,
    pending: PendingUpdates,
}

impl Record {
    pub(crate) fn from_parts(
        kind: Arc<RecordType>,
        id: Option<String>,
        attributes: Attributes,
        relationships: RelationshipGraph,
    ) -> Self {
        Self {
            kind,
            id,
            attributes: Arc::new(attributes),
            relationships: Arc::new(relationships),
            pending: PendingUpdates::new(),
        }
    }

    /// Same record with a different pending queue
    pub(crate) fn with_pending(&self, pending: PendingUpdates) -> Self {
        Self {
            kind: Arc::clone(&self.kind),
            id: self.id.clone(),
            attributes: Arc::clone(&self.attributes),
            relationships: Arc::clone(&self.relationships),
            pending,
        }
    }

    /// Same relationships and queue with new attributes and id
    pub(crate) fn with_attributes(&self, id: Option<String>, attributes: Attributes) -> Self {
        Self {
            kind: Arc::clone(&self.kind),
            id,
            attributes: Arc::new(attributes),
            relationships: Arc::clone(&self.relationships),
            pending: self.pending.clone(),
        }
    }

    pub fn kind(&self) -> &Arc<RecordType> {
        &self.kind
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// A record is new until it has an id
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// True for `type`, `relationships`, `id` once assigned, and declared
    /// attributes present on the record
    pub fn has(&self, key: &str) -> bool {
        match key {
            "type" | "relationships" => true,
            "id" => self.id.is_some(),
            _ => self.attributes.contains_key(key),
        }
    }

    /// Declared attributes, without `type`, `id` or `relationships`
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn relationships(&self) -> &RelationshipGraph {
        &self.relationships
    }

    pub fn definitions(&self) -> &[RelationshipDefinition] {
        self.kind.definitions()
    }

    pub fn pending_updates(&self) -> &PendingUpdates {
        &self.pending
    }

    pub(crate) fn require_id(&self, operation: &'static str) -> RecordResult<&str> {
        self.id().ok_or_else(|| RecordError::MissingId {
            type_name: self.type_name().to_string(),
            operation,
        })
    }

    /// `{type, id?, ...attributes}`
    pub fn to_attributes(&self) -> Attributes {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.type_name().to_string()));
        if let Some(id) = &self.id {
            map.insert("id".to_string(), Value::String(id.clone()));
        }
        for (key, value) in self.attributes.iter() {
            map.insert(key.clone(), value.clone());
        }
        map
    }

    /// `{type, id?, ...attributes, relationships}`, recursively serialized
    pub fn to_flat_attributes(&self) -> Attributes {
        let mut map = self.to_attributes();
        map.insert("relationships".to_string(), self.relationships.to_value());
        map
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "[{} {}]", self.type_name(), id),
            None => write!(f, "[{} (new)]", self.type_name()),
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("type", &self.type_name())
            .field("id", &self.id)
            .field("attributes", &self.attributes)
            .field("related", &self.relationships.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name()
            && self.id == other.id
            && self.attributes == other.attributes
            && self.relationships == other.relationships
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_flat_attributes().serialize(serializer)
    }
}

impl From<&Record> for RelationshipItem {
    fn from(record: &Record) -> Self {
        RelationshipItem::from(Value::Object(record.to_attributes()))
    }
}

impl From<Record> for RelationshipItem {
    fn from(record: Record) -> Self {
        RelationshipItem::from(&record)
    }
}
