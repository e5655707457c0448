//! Pending Updates - Relationship mutations queued on a record until the next save

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::definition::Direction;
use crate::error::{RecordError, RecordResult};
use crate::model::id::normalize_id;
use crate::model::Attributes;

/// The related side of a relationship mutation: `{type, id, ...}`
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipItem {
    type_name: String,
    id: Option<String>,
    attributes: Attributes,
}

impl RelationshipItem {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: Some(id.into()),
            attributes: Map::new(),
        }
    }

    /// Attach the item's remaining attributes (`type` and `id` are ignored)
    pub fn with_attributes(mut self, mut attributes: Attributes) -> Self {
        attributes.remove("type");
        attributes.remove("id");
        self.attributes = attributes;
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Flat form used in relationship snapshots
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(self.type_name.clone()));
        if let Some(id) = &self.id {
            map.insert("id".to_string(), Value::String(id.clone()));
        }
        for (key, value) in &self.attributes {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    fn validate(&self) -> RecordResult<()> {
        if self.type_name.is_empty() {
            return Err(RecordError::invalid_item(
                "The type property must be present on an item",
            ));
        }
        if self.id.is_none() {
            return Err(RecordError::invalid_item(format!(
                "The id property must be present on a {} item",
                self.type_name
            )));
        }
        Ok(())
    }
}

impl From<Value> for RelationshipItem {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(mut map) => {
                let type_name = match map.remove("type") {
                    Some(Value::String(s)) => s,
                    _ => String::new(),
                };
                let id = map.remove("id").as_ref().and_then(normalize_id);
                Self {
                    type_name,
                    id,
                    attributes: map,
                }
            }
            _ => Self {
                type_name: String::new(),
                id: None,
                attributes: Map::new(),
            },
        }
    }
}

impl Serialize for RelationshipItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Whether a pending update adds or drops an association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAction {
    Create,
    Remove,
}

/// A queued relationship mutation awaiting the next save
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingUpdate {
    pub action: UpdateAction,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub related_type: String,
    pub item: RelationshipItem,
}

impl PendingUpdate {
    /// Build an update for a validated item; the related type is the item's type
    pub fn new(
        action: UpdateAction,
        direction: Direction,
        item: RelationshipItem,
    ) -> RecordResult<Self> {
        item.validate()?;
        Ok(Self {
            action,
            direction,
            related_type: item.type_name.clone(),
            item,
        })
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item.id()
    }

    /// Same (action, direction, related type, item id)
    pub fn same_target(&self, other: &PendingUpdate) -> bool {
        self.action == other.action
            && self.direction == other.direction
            && self.related_type == other.related_type
            && self.item_id() == other.item_id()
    }
}

/// Ordered, de-duplicated queue of pending updates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingUpdates {
    updates: Vec<PendingUpdate>,
}

impl PendingUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append unless an update with the same target is already queued.
    /// Returns whether the update was appended.
    pub fn push(&mut self, update: PendingUpdate) -> bool {
        if self.updates.iter().any(|queued| queued.same_target(&update)) {
            tracing::debug!(
                "Skipping duplicate {:?} {} {} update for item {:?}",
                update.action,
                update.direction,
                update.related_type,
                update.item_id()
            );
            return false;
        }
        self.updates.push(update);
        true
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PendingUpdate> {
        self.updates.iter()
    }

    pub fn as_slice(&self) -> &[PendingUpdate] {
        &self.updates
    }

    pub fn into_vec(self) -> Vec<PendingUpdate> {
        self.updates
    }
}

impl<'a> IntoIterator for &'a PendingUpdates {
    type Item = &'a PendingUpdate;
    type IntoIter = std::slice::Iter<'a, PendingUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.updates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn comic(id: &str) -> RelationshipItem {
        RelationshipItem::new("Comic", id)
    }

    #[test]
    fn test_item_from_value_normalizes_numeric_id() {
        let item = RelationshipItem::from(json!({"type": "Comic", "id": 13722, "title": "X"}));
        assert_eq!(item.type_name(), "Comic");
        assert_eq!(item.id(), Some("13722"));
        assert_eq!(item.attributes().get("title"), Some(&json!("X")));
        assert_eq!(
            item.to_value(),
            json!({"type": "Comic", "id": "13722", "title": "X"})
        );
    }

    #[test]
    fn test_update_rejects_item_without_type() {
        let item = RelationshipItem::from(json!({"id": "1"}));
        let result = PendingUpdate::new(UpdateAction::Create, Direction::Has, item);
        assert!(matches!(
            result,
            Err(RecordError::InvalidRelationshipItem { .. })
        ));
    }

    #[test]
    fn test_update_rejects_item_without_id() {
        for value in [json!({"type": "Comic"}), json!({"type": "Comic", "id": ""}), json!("Comic")] {
            let result = PendingUpdate::new(
                UpdateAction::Create,
                Direction::BelongsTo,
                RelationshipItem::from(value),
            );
            assert!(matches!(
                result,
                Err(RecordError::InvalidRelationshipItem { .. })
            ));
        }
    }

    #[test]
    fn test_push_is_idempotent_per_target() {
        let mut queue = PendingUpdates::new();
        let create = PendingUpdate::new(UpdateAction::Create, Direction::Has, comic("1")).unwrap();

        assert!(queue.push(create.clone()));
        assert!(!queue.push(create));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_push_distinguishes_action_direction_and_id() {
        let mut queue = PendingUpdates::new();
        queue.push(PendingUpdate::new(UpdateAction::Create, Direction::Has, comic("1")).unwrap());
        queue.push(PendingUpdate::new(UpdateAction::Remove, Direction::Has, comic("1")).unwrap());
        queue.push(PendingUpdate::new(UpdateAction::Create, Direction::BelongsTo, comic("1")).unwrap());
        queue.push(PendingUpdate::new(UpdateAction::Create, Direction::Has, comic("2")).unwrap());

        assert_eq!(queue.len(), 4);
        let ids: Vec<_> = queue.iter().map(|u| u.item_id().unwrap()).collect();
        assert_eq!(ids, vec!["1", "1", "1", "2"]);
    }

    #[test]
    fn test_update_serializes_for_adapters() {
        let update =
            PendingUpdate::new(UpdateAction::Remove, Direction::BelongsTo, comic("foobar")).unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({
                "action": "remove",
                "direction": "belongsTo",
                "type": "Comic",
                "item": {"type": "Comic", "id": "foobar"}
            })
        );
    }
}
