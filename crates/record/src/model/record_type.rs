//! Record Types - A schema composed with its adapter, hooks and id source

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::id::{normalize_id, IdGenerator};
use super::lifecycle::LifecycleHooks;
use super::record::Record;
use super::schema::RecordSchema;
use crate::adapter::PersistenceAdapter;
use crate::error::{RecordError, RecordResult};
use crate::registry::TypeResolver;
use crate::relationships::{RelationshipDefinition, RelationshipGraph};

/// A registered record type. Shared read-only by every record of the type.
pub struct RecordType {
    schema: RecordSchema,
    adapter: Arc<dyn PersistenceAdapter>,
    hooks: LifecycleHooks,
    ids: Arc<dyn IdGenerator>,
    resolver: Arc<dyn TypeResolver>,
}

impl RecordType {
    pub(crate) fn new(
        schema: RecordSchema,
        adapter: Arc<dyn PersistenceAdapter>,
        hooks: LifecycleHooks,
        ids: Arc<dyn IdGenerator>,
        resolver: Arc<dyn TypeResolver>,
    ) -> Self {
        Self {
            schema,
            adapter,
            hooks,
            ids,
            resolver,
        }
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn definitions(&self) -> &[RelationshipDefinition] {
        self.schema.definitions()
    }

    pub fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }

    pub(crate) fn adapter(&self) -> &dyn PersistenceAdapter {
        self.adapter.as_ref()
    }

    pub(crate) fn generate_id(&self) -> String {
        self.ids.generate()
    }

    /// Constructor for a related type, if one is registered
    pub fn resolve(&self, type_name: &str) -> Option<Arc<RecordType>> {
        self.resolver.resolve(type_name)
    }

    /// Build a frozen record of this type from a plain mapping.
    ///
    /// `type` in the input is ignored, `id` is optional, `relationships` is
    /// materialized through the resolver, and every other key must be
    /// declared. Missing declared keys take their defaults.
    pub fn construct(self: &Arc<Self>, spec: Value) -> RecordResult<Record> {
        let Value::Object(mut attributes) = spec else {
            return Err(RecordError::construction(format!(
                "A {} record must be built from a mapping",
                self.type_name()
            )));
        };

        attributes.remove("type");

        let id = match attributes.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(value) => Some(normalize_id(&value).ok_or_else(|| {
                RecordError::construction(format!(
                    "The id of a {} record must be a string or number, got {}",
                    self.type_name(),
                    value
                ))
            })?),
        };

        let relationships = attributes.remove("relationships");

        if let Some(key) = attributes.keys().find(|key| !self.schema.allows(key)) {
            return Err(RecordError::UnknownKey {
                type_name: self.type_name().to_string(),
                key: key.clone(),
            });
        }

        for (key, default) in self.schema.defaults() {
            if !attributes.contains_key(key) {
                attributes.insert(key.clone(), default.clone());
            }
        }

        let graph = RelationshipGraph::materialize(self, relationships.as_ref())?;

        tracing::debug!(
            "Constructed {} record {:?} with {} related records",
            self.type_name(),
            id,
            graph.len()
        );

        Ok(Record::from_parts(Arc::clone(self), id, attributes, graph))
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("schema", &self.schema)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}
