//! Relationship Graph - Materialized related records of one record instance

use std::collections::BTreeMap;

use serde_json::{json, Value};

use super::definition::{Direction, RelationshipDefinition};
use super::merge::RelationshipSnapshot;
use crate::error::{RecordError, RecordResult};
use crate::model::id::normalize_id;
use crate::model::{Record, RecordType};

/// `{has: {type -> [Record]}, belongsTo: {type -> [Record]}}` for one record.
///
/// Every declared definition has a list, possibly empty. Lists only hold
/// records of the type they are keyed by.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipGraph {
    has: BTreeMap<String, Vec<Record>>,
    belongs_to: BTreeMap<String, Vec<Record>>,
}

impl RelationshipGraph {
    /// All lists for one direction
    pub fn direction(&self, direction: Direction) -> &BTreeMap<String, Vec<Record>> {
        match direction {
            Direction::Has => &self.has,
            Direction::BelongsTo => &self.belongs_to,
        }
    }

    pub fn has(&self) -> &BTreeMap<String, Vec<Record>> {
        &self.has
    }

    pub fn belongs_to(&self) -> &BTreeMap<String, Vec<Record>> {
        &self.belongs_to
    }

    /// Related records for one (direction, type); empty when undeclared
    pub fn get(&self, direction: Direction, related_type: &str) -> &[Record] {
        self.direction(direction)
            .get(related_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Related records for a definition
    pub fn related(&self, definition: &RelationshipDefinition) -> &[Record] {
        self.get(definition.direction, &definition.related_type)
    }

    /// Total number of related records across all lists
    pub fn len(&self) -> usize {
        Direction::ALL
            .iter()
            .flat_map(|d| self.direction(*d).values())
            .map(Vec::len)
            .sum()
    }

    /// True when every list is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialized form of the graph, suitable for re-construction and merging
    pub fn snapshot(&self) -> RelationshipSnapshot {
        let mut snapshot = RelationshipSnapshot::new();
        for direction in Direction::ALL {
            for (related_type, records) in self.direction(direction) {
                let items = records
                    .iter()
                    .map(|record| Value::Object(record.to_flat_attributes()))
                    .collect();
                snapshot.set_list(direction, related_type.clone(), items);
            }
        }
        snapshot
    }

    pub fn to_value(&self) -> Value {
        self.snapshot().to_value()
    }

    /// Build the graph for `kind` from raw relationship data.
    ///
    /// Only declared definitions are materialized; raw lists for other types
    /// are dropped.
    pub(crate) fn materialize(kind: &RecordType, raw: Option<&Value>) -> RecordResult<Self> {
        let empty = json!({});
        let raw = match raw {
            None | Some(Value::Null) => &empty,
            Some(value @ Value::Object(_)) => value,
            Some(_) => {
                return Err(RecordError::construction(format!(
                    "relationships of {} must be a mapping",
                    kind.type_name()
                )))
            }
        };

        let mut graph = Self::default();
        for definition in kind.definitions() {
            let items = match raw
                .get(definition.direction.prefix())
                .and_then(|lists| lists.get(&definition.related_type))
            {
                None | Some(Value::Null) => &[][..],
                Some(Value::Array(items)) => items.as_slice(),
                Some(_) => {
                    return Err(RecordError::construction(format!(
                        "{} relationship data on {} must be a list",
                        definition,
                        kind.type_name()
                    )))
                }
            };

            let related = kind
                .resolve(&definition.related_type)
                .ok_or_else(|| RecordError::unknown_type(&definition.related_type))?;

            let records = items
                .iter()
                .map(|item| materialize_item(&related, definition, item))
                .collect::<RecordResult<Vec<_>>>()?;

            let lists = match definition.direction {
                Direction::Has => &mut graph.has,
                Direction::BelongsTo => &mut graph.belongs_to,
            };
            lists.insert(definition.related_type.clone(), records);
        }

        Ok(graph)
    }
}

fn materialize_item(
    related: &std::sync::Arc<RecordType>,
    definition: &RelationshipDefinition,
    item: &Value,
) -> RecordResult<Record> {
    let missing_id = || RecordError::MissingRelationshipId {
        direction: definition.direction,
        related_type: definition.related_type.clone(),
    };

    match item {
        Value::Object(map) => {
            if map.get("id").and_then(normalize_id).is_none() {
                return Err(missing_id());
            }
            related.construct(item.clone())
        }
        Value::String(_) | Value::Number(_) => {
            let id = normalize_id(item).ok_or_else(missing_id)?;
            related.construct(json!({ "id": id }))
        }
        _ => Err(missing_id()),
    }
}
