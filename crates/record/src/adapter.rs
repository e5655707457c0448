//! Persistence Adapter - The I/O boundary records delegate storage to
//!
//! Records never talk to storage themselves. Save, fetch and remove hand the
//! record's flat attributes to an adapter and build a new record from the
//! result. Every method defaults to `AdapterError::Unsupported`, so an
//! adapter only implements what its types use.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AdapterError, RecordResult};
use crate::model::Attributes;
use crate::relationships::{Direction, PendingUpdate, RelationshipDefinition, RelationshipSnapshot};

/// Options passed to `create_record` / `update_record`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOptions {
    /// Relationship mutations to persist alongside the record, `None` when there are none
    pub relationship_updates: Option<Vec<PendingUpdate>>,
}

/// Options passed to `get_record`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetRecordOptions {
    /// Relationships to materialize; `None` leaves the choice to the adapter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<RelationshipDefinition>>,
}

/// Options passed to `remove_record`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoveRecordOptions {
    /// Every relationship the type declares
    pub include: Vec<RelationshipDefinition>,
}

/// One block of related items in a fetch payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipBlock {
    pub direction: Direction,
    #[serde(rename = "type")]
    pub related_type: String,
    #[serde(default)]
    pub items: Vec<Value>,
}

impl RelationshipBlock {
    pub fn new(direction: Direction, related_type: impl Into<String>, items: Vec<Value>) -> Self {
        Self {
            direction,
            related_type: related_type.into(),
            items,
        }
    }
}

/// What `get_record` returns: raw attributes plus optional relationship blocks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedRecord {
    pub attributes: Attributes,
    pub relationships: Option<Vec<RelationshipBlock>>,
}

impl FetchedRecord {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            relationships: None,
        }
    }

    pub fn with_relationships(mut self, blocks: Vec<RelationshipBlock>) -> Self {
        self.relationships = Some(blocks);
        self
    }

    /// Parse `{...attributes, relationships?: [{direction, type, items}]}`
    pub fn from_value(value: Value) -> RecordResult<Self> {
        let mut attributes: Map<String, Value> = match value {
            Value::Object(map) => map,
            other => {
                return Err(crate::error::RecordError::construction(format!(
                    "fetched record must be a mapping, got {}",
                    other
                )))
            }
        };

        let relationships = match attributes.remove("relationships") {
            None | Some(Value::Null) => None,
            Some(blocks) => Some(serde_json::from_value(blocks)?),
        };

        Ok(Self {
            attributes,
            relationships,
        })
    }

    /// Fold the blocks into a snapshot; later blocks for the same
    /// (direction, type) replace earlier ones.
    pub fn relationship_snapshot(&self) -> RelationshipSnapshot {
        let mut snapshot = RelationshipSnapshot::new();
        for block in self.relationships.iter().flatten() {
            snapshot.set_list(block.direction, block.related_type.clone(), block.items.clone());
        }
        snapshot
    }
}

/// Storage backend for one or more record types
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn create_record(
        &self,
        _attributes: &Attributes,
        _options: &WriteOptions,
    ) -> Result<(), AdapterError> {
        Err(AdapterError::unsupported("create_record"))
    }

    async fn update_record(
        &self,
        _attributes: &Attributes,
        _options: &WriteOptions,
    ) -> Result<(), AdapterError> {
        Err(AdapterError::unsupported("update_record"))
    }

    async fn get_record(
        &self,
        _attributes: &Attributes,
        _options: &GetRecordOptions,
    ) -> Result<FetchedRecord, AdapterError> {
        Err(AdapterError::unsupported("get_record"))
    }

    async fn remove_record(
        &self,
        _attributes: &Attributes,
        _options: &RemoveRecordOptions,
    ) -> Result<(), AdapterError> {
        Err(AdapterError::unsupported("remove_record"))
    }
}

/// Adapter for types registered without storage; supports nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedAdapter;

impl PersistenceAdapter for DetachedAdapter {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fetched_record_from_value() {
        let fetched = FetchedRecord::from_value(json!({
            "id": "13722",
            "title": "Amazing Fantasy",
            "relationships": [
                {"direction": "has", "type": "Character", "items": [{"id": "1"}, {"id": "2"}]},
                {"direction": "belongsTo", "type": "Creator", "items": ["44"]}
            ]
        }))
        .unwrap();

        assert_eq!(fetched.attributes.get("title"), Some(&json!("Amazing Fantasy")));
        assert!(!fetched.attributes.contains_key("relationships"));

        let snapshot = fetched.relationship_snapshot();
        assert_eq!(snapshot.list(Direction::Has, "Character").len(), 2);
        assert_eq!(snapshot.list(Direction::BelongsTo, "Creator"), &[json!("44")]);
    }

    #[test]
    fn test_later_blocks_replace_earlier_ones() {
        let fetched = FetchedRecord::new(Map::new()).with_relationships(vec![
            RelationshipBlock::new(Direction::Has, "Character", vec![json!("1")]),
            RelationshipBlock::new(Direction::Has, "Character", vec![json!("2"), json!("3")]),
        ]);
        let snapshot = fetched.relationship_snapshot();
        assert_eq!(
            snapshot.list(Direction::Has, "Character"),
            &[json!("2"), json!("3")]
        );
    }

    #[test]
    fn test_fetched_record_rejects_non_mapping() {
        assert!(FetchedRecord::from_value(json!([1, 2])).is_err());
        assert!(FetchedRecord::from_value(json!({"relationships": "nope"})).is_err());
    }

    #[test]
    fn test_get_options_omit_absent_include() {
        let value = serde_json::to_value(GetRecordOptions::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn test_detached_adapter_supports_nothing() {
        let adapter = DetachedAdapter;
        let result = adapter
            .create_record(&Map::new(), &WriteOptions::default())
            .await;
        assert!(matches!(
            result,
            Err(AdapterError::Unsupported {
                operation: "create_record"
            })
        ));
    }
}
