use std::borrow::Cow;

use thiserror::Error;

use crate::types::FieldKind;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, MappingError>;

/// Top-level error type returned by globdoc operations.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A field's kind has no write accessor. Fatal for the whole type being processed.
    #[error("unsupported field kind {kind:?} for field '{field}' of type '{entity_type}'")]
    UnsupportedFieldKind {
        entity_type: String,
        field: String,
        kind: FieldKind,
    },

    /// Underlying Redis command failed.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Store-side failure reported by a backend that is not Redis, or a malformed store reply.
    #[error("store error: {message}")]
    Store { message: Cow<'static, str> },

    /// No entity type is registered under the requested name.
    #[error("no entity type named '{name}'")]
    MissingType { name: String },

    /// Type metadata or entity construction violated a schema rule.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Document or catalog entry could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl MappingError {
    pub fn store(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Store { message: message.into() }
    }

    /// True for failures raised by the store itself (Redis or another backend).
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Redis(_) | Self::Store { .. })
    }
}

/// Violations of the metadata model, raised while building types and entities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("field '{field}' declared twice on type '{entity_type}'")]
    DuplicateField { entity_type: String, field: String },

    #[error("index '{index}' declared twice on type '{entity_type}'")]
    DuplicateIndex { entity_type: String, index: String },

    #[error("index '{index}' on type '{entity_type}' references unknown field '{field}'")]
    UnknownIndexField {
        entity_type: String,
        index: String,
        field: String,
    },

    #[error("index '{index}' on type '{entity_type}' lists field '{field}' more than once")]
    DuplicateIndexField {
        entity_type: String,
        index: String,
        field: String,
    },

    #[error("type '{entity_type}' maps more than one field to store attribute '{attribute}'")]
    DuplicateStoreName { entity_type: String, attribute: String },

    #[error("index '{index}' on type '{entity_type}' has no fields")]
    EmptyIndex { entity_type: String, index: String },

    #[error("reference field '{field}' on type '{entity_type}' has no target type")]
    MissingReferenceTarget { entity_type: String, field: String },

    #[error("type '{entity_type}' has no field named '{field}'")]
    UnknownField { entity_type: String, field: String },

    #[error("field '{field}' expects {expected:?}, got {actual:?}")]
    KindMismatch {
        field: String,
        expected: FieldKind,
        actual: FieldKind,
    },

    #[error("field '{field}' holds a NaN or infinite double, which documents cannot represent")]
    NonFiniteDouble { field: String },

    #[error("field '{field}' references type '{expected}', got an entity of type '{actual}'")]
    ReferenceTargetMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("entity of type '{actual}' passed to a write group of type '{expected}'")]
    EntityTypeMismatch { expected: String, actual: String },

    #[error("entity of type '{entity_type}' has no key value to reference it by")]
    MissingReferenceKey { entity_type: String },
}
