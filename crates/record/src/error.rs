//! Error types for the record model
//!
//! Construction, mutation and lifecycle failures are reported through
//! `RecordError`. Adapters report I/O failures with `AdapterError`, which the
//! lifecycle operations propagate unchanged.

use thiserror::Error;

use crate::hook_error::HookError;
use crate::relationships::Direction;

/// Result type alias for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Error types for record construction, mutation and lifecycle operations
#[derive(Debug, Error)]
pub enum RecordError {
    /// Bad or missing type schema, or record input that is not a mapping
    #[error("Construction error: {message}")]
    Construction { message: String },

    /// Attempt to assign a property that is fixed for the record's lifetime
    #[error("Cannot set '{key}' on an immutable {type_name} record")]
    Immutable { type_name: String, key: String },

    /// fetch/remove called on a record without an id
    #[error("The id must be present for {operation}() on {type_name}")]
    MissingId {
        type_name: String,
        operation: &'static str,
    },

    /// Attribute key outside the type's allowed keys
    #[error("Cannot set un-allowed key '{key}' on {type_name}")]
    UnknownKey { type_name: String, key: String },

    /// Relationship item given as a mapping without an id
    #[error("An id attribute is required in {direction} {related_type} relationship data")]
    MissingRelationshipId {
        direction: Direction,
        related_type: String,
    },

    /// Item handed to add_item/remove_item/connect_to/remove_from is malformed
    #[error("Invalid relationship item: {message}")]
    InvalidRelationshipItem { message: String },

    /// No constructor is registered for a related type
    #[error("No constructor available for type '{type_name}'")]
    UnknownRelatedType { type_name: String },

    /// Include token that the type does not declare
    #[error("Relationship {definition} not defined on {type_name}")]
    UndeclaredRelationship {
        type_name: String,
        definition: String,
    },

    /// Malformed relationship definition token
    #[error("Invalid relationship definition: '{token}'")]
    InvalidRelationshipDefinition { token: String },

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecordError {
    /// Create a new construction error
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction {
            message: message.into(),
        }
    }

    /// Create a new invalid relationship item error
    pub fn invalid_item(message: impl Into<String>) -> Self {
        Self::InvalidRelationshipItem {
            message: message.into(),
        }
    }

    /// Create a new unknown related type error
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownRelatedType {
            type_name: type_name.into(),
        }
    }

    /// True when the failure came from the persistence adapter
    pub fn is_adapter_error(&self) -> bool {
        matches!(self, Self::Adapter(_))
    }

    /// True when a lifecycle hook aborted the operation
    pub fn is_hook_error(&self) -> bool {
        matches!(self, Self::Hook(_))
    }
}

/// Errors returned by persistence adapters
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The adapter does not implement this operation
    #[error("{operation} is not supported by this adapter")]
    Unsupported { operation: &'static str },

    /// The record does not exist in storage
    #[error("Record not found: {type_name}({id})")]
    NotFound { type_name: String, id: String },

    /// Storage or transport failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl AdapterError {
    /// Create a new unsupported operation error
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Create a new storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new not found error
    pub fn not_found(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            type_name: type_name.into(),
            id: id.into(),
        }
    }
}
