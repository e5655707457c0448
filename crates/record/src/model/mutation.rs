//! Record Mutation - Clone-on-write attribute changes and queued relationship updates
//!
//! Nothing here touches storage. Relationship changes are queued on the
//! returned record and only reach an adapter on the next save.

use serde_json::Value;

use super::id::normalize_id;
use super::record::Record;
use crate::error::{RecordError, RecordResult};
use crate::relationships::{Direction, PendingUpdate, RelationshipItem, UpdateAction};

impl Record {
    /// Queue a `has` association with `item`
    pub fn add_item(&self, item: impl Into<RelationshipItem>) -> RecordResult<Record> {
        self.enqueue(UpdateAction::Create, Direction::Has, item.into())
    }

    /// Queue removal of a `has` association with `item`
    pub fn remove_item(&self, item: impl Into<RelationshipItem>) -> RecordResult<Record> {
        self.enqueue(UpdateAction::Remove, Direction::Has, item.into())
    }

    /// Queue a `belongsTo` association with `item`
    pub fn connect_to(&self, item: impl Into<RelationshipItem>) -> RecordResult<Record> {
        self.enqueue(UpdateAction::Create, Direction::BelongsTo, item.into())
    }

    /// Queue removal of a `belongsTo` association with `item`
    pub fn remove_from(&self, item: impl Into<RelationshipItem>) -> RecordResult<Record> {
        self.enqueue(UpdateAction::Remove, Direction::BelongsTo, item.into())
    }

    fn enqueue(
        &self,
        action: UpdateAction,
        direction: Direction,
        item: RelationshipItem,
    ) -> RecordResult<Record> {
        let update = PendingUpdate::new(action, direction, item)?;

        // The merge after a save rebuilds the item as a record of its type,
        // so anything that would fail there fails here instead.
        if let Some(related) = self.kind().resolve(&update.related_type) {
            related.construct(update.item.to_value())?;
        }

        let mut pending = self.pending_updates().clone();
        if pending.push(update) {
            tracing::debug!(
                "Queued {:?} {} on {} ({} pending)",
                action,
                direction,
                self,
                pending.len()
            );
        }

        Ok(self.with_pending(pending))
    }

    /// New record with one attribute replaced
    pub fn set(&self, key: &str, value: impl Into<Value>) -> RecordResult<Record> {
        self.set_all([(key.to_string(), value.into())])
    }

    /// New record with several attributes replaced. Either every key is
    /// accepted or none is applied.
    ///
    /// `type` and `relationships` cannot be set. `id` can, and setting it to
    /// null makes the record new again.
    pub fn set_all<I>(&self, values: I) -> RecordResult<Record>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut id = self.id().map(str::to_string);
        let mut attributes = self.attributes().clone();

        for (key, value) in values {
            match key.as_str() {
                "type" | "relationships" => {
                    return Err(RecordError::Immutable {
                        type_name: self.type_name().to_string(),
                        key,
                    })
                }
                "id" => {
                    id = match &value {
                        Value::Null => None,
                        Value::String(s) if s.is_empty() => None,
                        other => Some(normalize_id(other).ok_or_else(|| {
                            RecordError::construction(format!(
                                "The id of a {} record must be a string or number, got {}",
                                self.type_name(),
                                other
                            ))
                        })?),
                    };
                }
                _ if self.kind().schema().allows(&key) => {
                    attributes.insert(key, value);
                }
                _ => {
                    return Err(RecordError::UnknownKey {
                        type_name: self.type_name().to_string(),
                        key,
                    })
                }
            }
        }

        Ok(self.with_attributes(id, attributes))
    }
}
