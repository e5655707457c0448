//! CRUD Operations - Save, fetch and remove through the type's adapter
//!
//! Each operation runs the type's hooks, hands flat attributes to the
//! adapter and builds a fresh record from the outcome. The receiver is
//! never changed.

use serde_json::Value;

use super::record::Record;
use super::schema::RESERVED_KEYS;
use super::Attributes;
use crate::adapter::{GetRecordOptions, RemoveRecordOptions, WriteOptions};
use crate::error::{AdapterError, RecordError, RecordResult};
use crate::relationships::{
    PendingUpdate, PendingUpdates, RelationshipItem, RelationshipSnapshot, UpdateAction,
};

/// Options for `Record::fetch`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    /// Space-separated relationship tokens, e.g. `"hasCharacter belongsToCreator"`
    pub include: Option<String>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(tokens: impl Into<String>) -> Self {
        Self {
            include: Some(tokens.into()),
        }
    }
}

impl Record {
    /// Persist the record. New records get an id and go through
    /// `create_record`; persisted ones go through `update_record`.
    pub async fn save(&self) -> RecordResult<Record> {
        if self.is_new() {
            self.create().await
        } else {
            self.update().await
        }
    }

    async fn create(&self) -> RecordResult<Record> {
        let kind = self.kind();
        let mut attributes = self.to_attributes();

        kind.hooks().run_create_flow(&attributes).await?;

        let id = kind.generate_id();
        attributes.insert("id".to_string(), Value::String(id));

        let updates = self.create_updates()?;
        let mut snapshot = self.relationships().snapshot();
        snapshot.apply_all(&updates);

        let record = self.merged(&attributes, &snapshot)?;

        let options = write_options(&updates);
        tracing::debug!(
            "Creating {} with {} relationship updates",
            record,
            updates.len()
        );

        kind.adapter()
            .create_record(&attributes, &options)
            .await
            .map_err(|e| self.adapter_failure("save", e))?;

        tracing::info!("Created {}", record);
        Ok(record)
    }

    async fn update(&self) -> RecordResult<Record> {
        let kind = self.kind();
        let attributes = self.to_attributes();

        kind.hooks().run_update_flow(&attributes).await?;

        let updates = self.pending_updates();
        let mut snapshot = self.relationships().snapshot();
        snapshot.apply_all(updates);
        let record = self.merged(&attributes, &snapshot)?;

        let options = write_options(updates);
        tracing::debug!(
            "Updating {} with {} relationship updates",
            self,
            updates.len()
        );

        kind.adapter()
            .update_record(&attributes, &options)
            .await
            .map_err(|e| self.adapter_failure("save", e))?;

        tracing::info!("Updated {}", record);
        Ok(record)
    }

    /// The record a save returns. Built before the adapter call.
    fn merged(
        &self,
        attributes: &Attributes,
        snapshot: &RelationshipSnapshot,
    ) -> RecordResult<Record> {
        let mut data = attributes.clone();
        data.insert("relationships".to_string(), snapshot.to_value());
        self.kind().construct(Value::Object(data))
    }

    /// The explicit queue followed by every relationship the record was
    /// constructed with, as creates
    fn create_updates(&self) -> RecordResult<PendingUpdates> {
        let mut updates = self.pending_updates().clone();
        for definition in self.kind().definitions() {
            for related in self.relationships().related(definition) {
                updates.push(PendingUpdate::new(
                    UpdateAction::Create,
                    definition.direction,
                    RelationshipItem::from(related),
                )?);
            }
        }
        Ok(updates)
    }

    /// Load the record's current state through the adapter.
    ///
    /// `include` names declared relationships to load; without it the
    /// adapter decides. The result carries exactly the relationship blocks
    /// the adapter returned. Attributes the type does not declare are dropped.
    pub async fn fetch(&self, options: FetchOptions) -> RecordResult<Record> {
        let id = self.require_id("fetch")?.to_string();
        let kind = self.kind();

        let include = match options.include.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(tokens) => Some(kind.schema().expand_include(tokens)?),
        };

        let attributes = self.to_flat_attributes();
        kind.hooks().run_fetch_flow(&attributes).await?;

        tracing::debug!("Fetching {} (include: {:?})", self, include);
        let fetched = kind
            .adapter()
            .get_record(&attributes, &GetRecordOptions { include })
            .await
            .map_err(|e| self.adapter_failure("fetch", e))?;

        let snapshot = fetched.relationship_snapshot();
        let mut data: Attributes = fetched.attributes;
        data.retain(|key, _| {
            let keep = kind.schema().allows(key) || RESERVED_KEYS.contains(&key.as_str());
            if !keep {
                tracing::debug!(
                    "Dropping undeclared {} attribute {:?} from fetch",
                    kind.type_name(),
                    key
                );
            }
            keep
        });
        if !data.contains_key("id") {
            data.insert("id".to_string(), Value::String(id));
        }
        data.insert("relationships".to_string(), snapshot.to_value());

        let record = kind.construct(Value::Object(data))?;
        tracing::debug!("Fetched {} with {} related records", record, record.relationships().len());
        Ok(record)
    }

    /// Remove the record through the adapter. The returned record keeps the
    /// attributes but has every relationship list empty.
    pub async fn remove(&self) -> RecordResult<Record> {
        self.require_id("remove")?;
        let kind = self.kind();

        let attributes = self.to_attributes();
        kind.hooks().run_remove_flow(&attributes).await?;

        let options = RemoveRecordOptions {
            include: kind.definitions().to_vec(),
        };
        kind.adapter()
            .remove_record(&attributes, &options)
            .await
            .map_err(|e| self.adapter_failure("remove", e))?;

        let record = kind.construct(Value::Object(attributes))?;
        tracing::info!("Removed {}", record);
        Ok(record)
    }

    fn adapter_failure(&self, operation: &str, error: AdapterError) -> RecordError {
        tracing::warn!("Adapter failed to {} {}: {}", operation, self, error);
        RecordError::Adapter(error)
    }
}

fn write_options(updates: &PendingUpdates) -> WriteOptions {
    WriteOptions {
        relationship_updates: (!updates.is_empty()).then(|| updates.as_slice().to_vec()),
    }
}
