//! Record Schema - Type name, allowed keys, defaults and relationship definitions
//!
//! A schema is validated once when it is built; every record of the type
//! shares it read-only afterwards.

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::Attributes;
use crate::error::{RecordError, RecordResult};
use crate::relationships::definition::is_type_name;
use crate::relationships::{parse_definitions, RelationshipDefinition};

/// Keys every record carries besides its declared attributes
pub const RESERVED_KEYS: [&str; 3] = ["type", "id", "relationships"];

/// Declared shape of a record type
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    type_name: String,
    allowed_keys: Vec<String>,
    defaults: Attributes,
    definitions: Vec<RelationshipDefinition>,
}

impl RecordSchema {
    pub fn builder(type_name: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder::new(type_name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared attribute keys: default keys first, then the remaining allowed keys
    pub fn allowed_keys(&self) -> &[String] {
        &self.allowed_keys
    }

    pub fn defaults(&self) -> &Attributes {
        &self.defaults
    }

    pub fn definitions(&self) -> &[RelationshipDefinition] {
        &self.definitions
    }

    /// True for declared attribute keys (not the reserved ones)
    pub fn allows(&self, key: &str) -> bool {
        self.allowed_keys.iter().any(|k| k == key)
    }

    /// Look up a declared definition by its token
    pub fn definition(&self, token: &str) -> RecordResult<&RelationshipDefinition> {
        self.definitions
            .iter()
            .find(|def| def.token() == token)
            .ok_or_else(|| RecordError::UndeclaredRelationship {
                type_name: self.type_name.clone(),
                definition: token.to_string(),
            })
    }

    /// Expand a space-separated include string into declared definitions
    pub fn expand_include(&self, include: &str) -> RecordResult<Vec<RelationshipDefinition>> {
        include
            .split_whitespace()
            .map(|token| self.definition(token).cloned())
            .collect()
    }

    fn validate(&self) -> RecordResult<()> {
        if !is_type_name(&self.type_name) {
            return Err(RecordError::construction(format!(
                "The type must be a non-empty name without separators, got '{}'",
                self.type_name
            )));
        }

        if let Some(key) = self
            .allowed_keys
            .iter()
            .find(|key| RESERVED_KEYS.contains(&key.as_str()))
        {
            return Err(RecordError::construction(format!(
                "'{}' is reserved and cannot be declared on {}",
                key, self.type_name
            )));
        }

        let mut seen = HashSet::new();
        for def in &self.definitions {
            if !seen.insert(def) {
                return Err(RecordError::construction(format!(
                    "Relationship {} is declared twice on {}",
                    def, self.type_name
                )));
            }
        }

        Ok(())
    }
}

/// Builder for `RecordSchema`
#[derive(Debug, Clone)]
pub struct RecordSchemaBuilder {
    type_name: String,
    allowed_keys: Vec<String>,
    defaults: Attributes,
    definition_tokens: Vec<String>,
    invalid_defaults: bool,
}

impl RecordSchemaBuilder {
    fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            allowed_keys: Vec::new(),
            defaults: Map::new(),
            definition_tokens: Vec::new(),
            invalid_defaults: false,
        }
    }

    /// Declare attribute keys without default values
    pub fn allowed_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Declare attribute keys with default values; must be a JSON object
    pub fn defaults(mut self, defaults: Value) -> Self {
        match defaults {
            Value::Object(map) => self.defaults.extend(map),
            _ => self.invalid_defaults = true,
        }
        self
    }

    pub fn default_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    /// Declare relationships as a space-separated token list, e.g. `"hasCharacter belongsToCreator"`
    pub fn relationships(mut self, tokens: &str) -> Self {
        self.definition_tokens
            .extend(tokens.split_whitespace().map(str::to_string));
        self
    }

    pub fn relationship(mut self, definition: RelationshipDefinition) -> Self {
        self.definition_tokens.push(definition.token());
        self
    }

    pub fn build(self) -> RecordResult<RecordSchema> {
        if self.invalid_defaults {
            return Err(RecordError::construction(format!(
                "defaults of {} must be a mapping",
                self.type_name
            )));
        }

        let definitions = parse_definitions(&self.definition_tokens.join(" "))?;

        let mut allowed_keys: Vec<String> = Vec::new();
        for key in self.defaults.keys().chain(self.allowed_keys.iter()) {
            if !allowed_keys.contains(key) {
                allowed_keys.push(key.clone());
            }
        }

        let schema = RecordSchema {
            type_name: self.type_name,
            allowed_keys,
            defaults: self.defaults,
            definitions,
        };
        schema.validate()?;
        Ok(schema)
    }
}
