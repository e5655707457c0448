//! Type Registry - Name -> record type lookup used to resolve related types
//!
//! Record types resolve relationship definitions by name through the
//! registry that created them. Types hold a weak handle, so dropping the
//! last registry clone releases every type.

use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

use crate::adapter::{DetachedAdapter, PersistenceAdapter};
use crate::config::{ConfigError, RecordConfig, RecordConfigTrait};
use crate::error::{RecordError, RecordResult};
use crate::model::id::{id_generator_for, IdGenerator};
use crate::model::{LifecycleHooks, Record, RecordSchema, RecordType};

/// Looks up registered record types by name
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, type_name: &str) -> Option<Arc<RecordType>>;
}

type TypeMap = DashMap<String, Arc<RecordType>>;

/// A schema plus optional per-type overrides of the registry defaults
pub struct TypeRegistration {
    schema: RecordSchema,
    adapter: Option<Arc<dyn PersistenceAdapter>>,
    hooks: Option<LifecycleHooks>,
}

impl TypeRegistration {
    pub fn new(schema: RecordSchema) -> Self {
        Self {
            schema,
            adapter: None,
            hooks: None,
        }
    }

    pub fn adapter(mut self, adapter: impl PersistenceAdapter + 'static) -> Self {
        self.adapter = Some(Arc::new(adapter));
        self
    }

    pub fn shared_adapter(mut self, adapter: Arc<dyn PersistenceAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }
}

impl From<RecordSchema> for TypeRegistration {
    fn from(schema: RecordSchema) -> Self {
        Self::new(schema)
    }
}

/// Thread-safe registry of record types
#[derive(Clone)]
pub struct TypeRegistry {
    types: Arc<TypeMap>,
    config: RecordConfig,
    adapter: Arc<dyn PersistenceAdapter>,
    hooks: LifecycleHooks,
    ids: Arc<dyn IdGenerator>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Empty registry with the default configuration and no storage
    pub fn new() -> Self {
        Self::with_config(RecordConfig::default())
    }

    pub fn with_config(config: RecordConfig) -> Self {
        Self {
            types: Arc::new(DashMap::new()),
            ids: id_generator_for(&config),
            config,
            adapter: Arc::new(DetachedAdapter),
            hooks: LifecycleHooks::default(),
        }
    }

    /// Registry configured from `RELIC_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::with_config(RecordConfig::from_env()?))
    }

    /// Adapter for types registered without their own
    pub fn with_adapter(mut self, adapter: impl PersistenceAdapter + 'static) -> Self {
        self.adapter = Arc::new(adapter);
        self
    }

    pub fn with_shared_adapter(mut self, adapter: Arc<dyn PersistenceAdapter>) -> Self {
        self.adapter = adapter;
        self
    }

    /// Hooks for types registered without their own
    pub fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// Register a record type. Type names are unique per registry.
    pub fn register(&self, registration: impl Into<TypeRegistration>) -> RecordResult<Arc<RecordType>> {
        let registration = registration.into();
        let type_name = registration.schema.type_name().to_string();

        let resolver = Arc::new(RegistryResolver {
            types: Arc::downgrade(&self.types),
        });
        let kind = Arc::new(RecordType::new(
            registration.schema,
            registration.adapter.unwrap_or_else(|| Arc::clone(&self.adapter)),
            registration.hooks.unwrap_or_else(|| self.hooks.clone()),
            Arc::clone(&self.ids),
            resolver,
        ));

        match self.types.entry(type_name.clone()) {
            Entry::Occupied(_) => Err(RecordError::construction(format!(
                "Record type '{}' is already registered",
                type_name
            ))),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&kind));
                tracing::debug!(
                    "Registered record type {} ({} relationships)",
                    type_name,
                    kind.definitions().len()
                );
                Ok(kind)
            }
        }
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<RecordType>> {
        self.types.get(type_name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Construct a record of a registered type
    pub fn create(&self, type_name: &str, spec: Value) -> RecordResult<Record> {
        let kind = self
            .get(type_name)
            .ok_or_else(|| RecordError::unknown_type(type_name))?;
        kind.construct(spec)
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, type_name: &str) -> Option<Arc<RecordType>> {
        self.get(type_name)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

struct RegistryResolver {
    types: Weak<TypeMap>,
}

impl TypeResolver for RegistryResolver {
    fn resolve(&self, type_name: &str) -> Option<Arc<RecordType>> {
        let types = self.types.upgrade()?;
        let kind = types.get(type_name).map(|entry| Arc::clone(entry.value()));
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdStrategy;
    use crate::model::SequentialIds;
    use serde_json::json;

    fn schema(name: &str) -> RecordSchema {
        RecordSchema::builder(name).build().unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = TypeRegistry::new();
        registry.register(schema("Comic")).unwrap();
        registry.register(schema("Creator")).unwrap();

        assert!(registry.contains("Comic"));
        assert_eq!(registry.type_names(), vec!["Comic", "Creator"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("Series").is_none());
    }

    #[test]
    fn test_duplicate_type_names_are_rejected() {
        let registry = TypeRegistry::new();
        registry.register(schema("Comic")).unwrap();
        assert!(matches!(
            registry.register(schema("Comic")),
            Err(RecordError::Construction { .. })
        ));
    }

    #[test]
    fn test_create_unknown_type() {
        let registry = TypeRegistry::new();
        match registry.create("Series", json!({})) {
            Err(RecordError::UnknownRelatedType { type_name }) => assert_eq!(type_name, "Series"),
            other => panic!("Expected unknown type error, got {:?}", other),
        }
    }

    #[test]
    fn test_types_resolve_each_other_through_registry() {
        let registry = TypeRegistry::new();
        let comic = registry
            .register(
                RecordSchema::builder("Comic")
                    .relationships("hasCharacter")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert!(comic.resolve("Character").is_none());

        registry.register(schema("Character")).unwrap();
        assert!(comic.resolve("Character").is_some());
    }

    #[test]
    fn test_types_stop_resolving_once_registry_is_dropped() {
        let registry = TypeRegistry::new();
        let comic = registry.register(schema("Comic")).unwrap();
        drop(registry);
        assert!(comic.resolve("Comic").is_none());
    }

    #[test]
    fn test_config_selects_id_generator() {
        let registry = TypeRegistry::with_config(
            RecordConfig::new()
                .with_id_strategy(IdStrategy::Uuid)
                .with_id_prefix("comic-"),
        );
        assert_eq!(registry.config().id_strategy, IdStrategy::Uuid);

        let kind = registry.register(schema("Comic")).unwrap();
        let id = kind.generate_id();
        assert!(id.starts_with("comic-"));
        assert_eq!(id.len(), "comic-".len() + 36);

        let registry = TypeRegistry::new().with_id_generator(SequentialIds::new("seq-"));
        let kind = registry.register(schema("Comic")).unwrap();
        assert!(kind.generate_id().starts_with("seq-"));
    }
}
