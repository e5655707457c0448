//! Relationship Snapshots - Raw `{direction -> {type -> [items]}}` data and the
//! diff-merge that folds pending updates into it.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::definition::Direction;
use super::pending::{PendingUpdate, UpdateAction};
use crate::model::id::normalize_id;

/// Result of applying one pending update to a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Appended,
    Removed,
    Unchanged,
}

/// Serialized relationship data, keyed by direction and related type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipSnapshot {
    has: BTreeMap<String, Vec<Value>>,
    belongs_to: BTreeMap<String, Vec<Value>>,
}

impl RelationshipSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lists(&self, direction: Direction) -> &BTreeMap<String, Vec<Value>> {
        match direction {
            Direction::Has => &self.has,
            Direction::BelongsTo => &self.belongs_to,
        }
    }

    fn lists_mut(&mut self, direction: Direction) -> &mut BTreeMap<String, Vec<Value>> {
        match direction {
            Direction::Has => &mut self.has,
            Direction::BelongsTo => &mut self.belongs_to,
        }
    }

    pub fn list(&self, direction: Direction, related_type: &str) -> &[Value] {
        self.lists(direction)
            .get(related_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replace the list for one (direction, type)
    pub fn set_list(&mut self, direction: Direction, related_type: impl Into<String>, items: Vec<Value>) {
        self.lists_mut(direction).insert(related_type.into(), items);
    }

    /// Apply a single update: creates append unless the id is present,
    /// removes drop the matching entry, everything else is a no-op.
    pub fn apply(&mut self, update: &PendingUpdate) -> MergeOutcome {
        let Some(id) = update.item_id() else {
            return MergeOutcome::Unchanged;
        };

        match update.action {
            UpdateAction::Create => {
                let list = self
                    .lists_mut(update.direction)
                    .entry(update.related_type.clone())
                    .or_default();
                if position_of(list, id).is_some() {
                    MergeOutcome::Unchanged
                } else {
                    list.push(update.item.to_value());
                    MergeOutcome::Appended
                }
            }
            UpdateAction::Remove => {
                let Some(list) = self.lists_mut(update.direction).get_mut(&update.related_type) else {
                    return MergeOutcome::Unchanged;
                };
                match position_of(list, id) {
                    Some(index) => {
                        list.remove(index);
                        MergeOutcome::Removed
                    }
                    None => MergeOutcome::Unchanged,
                }
            }
        }
    }

    /// Apply updates in queue order
    pub fn apply_all<'a, I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = &'a PendingUpdate>,
    {
        for update in updates {
            let outcome = self.apply(update);
            tracing::trace!(
                "Merged {:?} {} {} ({:?}): {:?}",
                update.action,
                update.direction,
                update.related_type,
                update.item_id(),
                outcome
            );
        }
    }

    /// `{"has": {...}, "belongsTo": {...}}`
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        for direction in Direction::ALL {
            let lists: Map<String, Value> = self
                .lists(direction)
                .iter()
                .map(|(related_type, items)| (related_type.clone(), Value::Array(items.clone())))
                .collect();
            root.insert(direction.prefix().to_string(), Value::Object(lists));
        }
        Value::Object(root)
    }
}

/// Id of a raw relationship item: the `id` of a mapping, or a bare scalar
pub(crate) fn item_id(item: &Value) -> Option<String> {
    match item {
        Value::Object(map) => map.get("id").and_then(normalize_id),
        other => normalize_id(other),
    }
}

fn position_of(list: &[Value], id: &str) -> Option<usize> {
    list.iter()
        .position(|entry| item_id(entry).as_deref() == Some(id))
}
