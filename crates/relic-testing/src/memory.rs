//! In-memory persistence adapter for development and testing

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use relic_record::{
    AdapterError, Attributes, FetchedRecord, GetRecordOptions, PersistenceAdapter,
    RelationshipBlock, RelationshipSnapshot, RemoveRecordOptions, WriteOptions,
};

/// `(type, id)` storage key
type RecordKey = (String, String);

/// One recorded adapter invocation
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    Create {
        attributes: Attributes,
        options: WriteOptions,
    },
    Update {
        attributes: Attributes,
        options: WriteOptions,
    },
    Get {
        attributes: Attributes,
        options: GetRecordOptions,
    },
    Remove {
        attributes: Attributes,
        options: RemoveRecordOptions,
    },
}

impl AdapterCall {
    /// Adapter method name, e.g. `"create_record"`
    pub fn operation(&self) -> &'static str {
        match self {
            AdapterCall::Create { .. } => "create_record",
            AdapterCall::Update { .. } => "update_record",
            AdapterCall::Get { .. } => "get_record",
            AdapterCall::Remove { .. } => "remove_record",
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            AdapterCall::Create { attributes, .. }
            | AdapterCall::Update { attributes, .. }
            | AdapterCall::Get { attributes, .. }
            | AdapterCall::Remove { attributes, .. } => attributes,
        }
    }

    /// Write options of a create or update call
    pub fn write_options(&self) -> Option<&WriteOptions> {
        match self {
            AdapterCall::Create { options, .. } | AdapterCall::Update { options, .. } => {
                Some(options)
            }
            _ => None,
        }
    }
}

#[derive(Default)]
struct MemoryStore {
    records: DashMap<RecordKey, Attributes>,
    links: DashMap<RecordKey, RelationshipSnapshot>,
    calls: RwLock<Vec<AdapterCall>>,
    failures: DashMap<&'static str, String>,
}

/// Adapter keeping records and relationship links in memory.
///
/// Clones share storage, so a test can keep a handle while a registry owns
/// another.
#[derive(Clone, Default)]
pub struct MemoryAdapter {
    store: Arc<MemoryStore>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record directly, bypassing the call log
    pub fn seed(&self, type_name: &str, id: &str, mut attributes: Attributes) {
        attributes.insert("type".to_string(), type_name.into());
        attributes.insert("id".to_string(), id.into());
        self.store
            .records
            .insert((type_name.to_string(), id.to_string()), attributes);
    }

    /// Replace the stored relationship links of a record
    pub fn seed_links(&self, type_name: &str, id: &str, links: RelationshipSnapshot) {
        self.store
            .links
            .insert((type_name.to_string(), id.to_string()), links);
    }

    /// Make the next call of `operation` fail with a storage error
    pub fn fail_next(&self, operation: &'static str, message: impl Into<String>) {
        self.store.failures.insert(operation, message.into());
    }

    pub fn stored(&self, type_name: &str, id: &str) -> Option<Attributes> {
        self.store
            .records
            .get(&(type_name.to_string(), id.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn links(&self, type_name: &str, id: &str) -> RelationshipSnapshot {
        self.store
            .links
            .get(&(type_name.to_string(), id.to_string()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn record_count(&self) -> usize {
        self.store.records.len()
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.store.calls.read().clone()
    }

    pub fn calls_for(&self, operation: &str) -> Vec<AdapterCall> {
        self.store
            .calls
            .read()
            .iter()
            .filter(|call| call.operation() == operation)
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.store.calls.read().len()
    }

    pub fn last_call(&self) -> Option<AdapterCall> {
        self.store.calls.read().last().cloned()
    }

    pub fn clear_calls(&self) {
        self.store.calls.write().clear();
    }

    fn record_call(&self, call: AdapterCall) -> Result<(), AdapterError> {
        let operation = call.operation();
        self.store.calls.write().push(call);

        match self.store.failures.remove(operation) {
            Some((_, message)) => {
                tracing::debug!("MemoryAdapter failing {} as requested", operation);
                Err(AdapterError::storage(message))
            }
            None => Ok(()),
        }
    }

    fn write(&self, attributes: &Attributes, options: &WriteOptions) -> Result<(), AdapterError> {
        let key = record_key(attributes)?;

        let mut links = self
            .store
            .links
            .get(&key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        if let Some(updates) = &options.relationship_updates {
            links.apply_all(updates);
        }

        tracing::debug!("MemoryAdapter storing {} {}", key.0, key.1);
        self.store.links.insert(key.clone(), links);
        self.store.records.insert(key, attributes.clone());
        Ok(())
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryAdapter {
    async fn create_record(
        &self,
        attributes: &Attributes,
        options: &WriteOptions,
    ) -> Result<(), AdapterError> {
        self.record_call(AdapterCall::Create {
            attributes: attributes.clone(),
            options: options.clone(),
        })?;
        self.write(attributes, options)
    }

    async fn update_record(
        &self,
        attributes: &Attributes,
        options: &WriteOptions,
    ) -> Result<(), AdapterError> {
        self.record_call(AdapterCall::Update {
            attributes: attributes.clone(),
            options: options.clone(),
        })?;
        self.write(attributes, options)
    }

    async fn get_record(
        &self,
        attributes: &Attributes,
        options: &GetRecordOptions,
    ) -> Result<FetchedRecord, AdapterError> {
        self.record_call(AdapterCall::Get {
            attributes: attributes.clone(),
            options: options.clone(),
        })?;

        let key = record_key(attributes)?;
        let stored = self
            .store
            .records
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AdapterError::not_found(&key.0, &key.1))?;

        let fetched = FetchedRecord::new(stored);
        let Some(include) = &options.include else {
            return Ok(fetched);
        };

        let links = self.links(&key.0, &key.1);
        let blocks = include
            .iter()
            .map(|definition| {
                RelationshipBlock::new(
                    definition.direction,
                    definition.related_type.clone(),
                    links
                        .list(definition.direction, &definition.related_type)
                        .to_vec(),
                )
            })
            .collect();
        Ok(fetched.with_relationships(blocks))
    }

    async fn remove_record(
        &self,
        attributes: &Attributes,
        options: &RemoveRecordOptions,
    ) -> Result<(), AdapterError> {
        self.record_call(AdapterCall::Remove {
            attributes: attributes.clone(),
            options: options.clone(),
        })?;

        let key = record_key(attributes)?;
        if self.store.records.remove(&key).is_none() {
            return Err(AdapterError::not_found(&key.0, &key.1));
        }

        if let Some(mut links) = self.store.links.get_mut(&key) {
            for definition in &options.include {
                links.set_list(definition.direction, definition.related_type.clone(), Vec::new());
            }
        }
        tracing::debug!("MemoryAdapter removed {} {}", key.0, key.1);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAdapter")
            .field("records", &self.store.records.len())
            .field("calls", &self.store.calls.read().len())
            .finish()
    }
}

fn record_key(attributes: &Attributes) -> Result<RecordKey, AdapterError> {
    let field = |name: &str| {
        attributes
            .get(name)
            .and_then(|value| value.as_str())
            .map(str::to_string)
            .ok_or_else(|| AdapterError::storage(format!("record attributes have no {}", name)))
    };
    Ok((field("type")?, field("id")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_record::{Direction, PendingUpdate, RelationshipItem, UpdateAction};
    use serde_json::{json, Map, Value};

    fn attributes(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn has_character(action: UpdateAction, id: &str) -> PendingUpdate {
        PendingUpdate::new(action, Direction::Has, RelationshipItem::new("Character", id)).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let adapter = MemoryAdapter::new();
        let comic = attributes(json!({"type": "Comic", "id": "13722", "title": "Amazing Fantasy"}));

        adapter
            .create_record(&comic, &WriteOptions::default())
            .await
            .unwrap();
        let fetched = adapter
            .get_record(&comic, &GetRecordOptions::default())
            .await
            .unwrap();

        assert_eq!(fetched.attributes.get("title"), Some(&json!("Amazing Fantasy")));
        assert!(fetched.relationships.is_none());
        assert_eq!(adapter.call_count(), 2);
    }

    #[tokio::test]
    async fn test_relationship_updates_are_merged() {
        let adapter = MemoryAdapter::new();
        let comic = attributes(json!({"type": "Comic", "id": "13722"}));

        let options = WriteOptions {
            relationship_updates: Some(vec![
                has_character(UpdateAction::Create, "1"),
                has_character(UpdateAction::Create, "2"),
            ]),
        };
        adapter.create_record(&comic, &options).await.unwrap();

        let options = WriteOptions {
            relationship_updates: Some(vec![has_character(UpdateAction::Remove, "1")]),
        };
        adapter.update_record(&comic, &options).await.unwrap();

        let links = adapter.links("Comic", "13722");
        assert_eq!(links.list(Direction::Has, "Character").len(), 1);
        assert_eq!(links.list(Direction::Has, "Character")[0]["id"], json!("2"));
    }

    #[tokio::test]
    async fn test_get_unknown_record() {
        let adapter = MemoryAdapter::new();
        let result = adapter
            .get_record(
                &attributes(json!({"type": "Comic", "id": "nope"})),
                &GetRecordOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(AdapterError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_fail_next_applies_once() {
        let adapter = MemoryAdapter::new();
        let comic = attributes(json!({"type": "Comic", "id": "13722"}));
        adapter.fail_next("create_record", "disk full");

        let first = adapter.create_record(&comic, &WriteOptions::default()).await;
        assert!(matches!(first, Err(AdapterError::Storage { .. })));
        assert!(adapter.stored("Comic", "13722").is_none());

        let second = adapter.create_record(&comic, &WriteOptions::default()).await;
        assert!(second.is_ok());
        assert_eq!(adapter.calls_for("create_record").len(), 2);
    }

    #[tokio::test]
    async fn test_writes_require_type_and_id() {
        let adapter = MemoryAdapter::new();
        let result = adapter
            .create_record(&attributes(json!({"type": "Comic"})), &WriteOptions::default())
            .await;
        assert!(matches!(result, Err(AdapterError::Storage { .. })));
    }
}
