//! Core error types.

use crate::catalog::FieldType;
use thiserror::Error;

/// Errors raised by the mapping engine.
///
/// Definition-time variants (`DuplicateShape` through `KeyConflict`) describe a
/// faulty schema declaration and are not meant to be retried.
#[derive(Debug, Error)]
pub enum Error {
    /// A shape with this name is already registered.
    #[error("shape `{0}` is already defined")]
    DuplicateShape(String),

    /// Two fields of one shape share a name.
    #[error("field `{field}` is declared twice on shape `{shape}`")]
    DuplicateField {
        /// Shape being defined.
        shape: String,
        /// Repeated field name.
        field: String,
    },

    /// A shape was defined without fields.
    #[error("shape `{0}` must declare at least one field")]
    EmptyShape(String),

    /// A shape or field name is empty or contains a NUL byte.
    #[error("invalid name {0:?}: names must be non-empty and free of NUL bytes")]
    InvalidName(String),

    /// No shape with this name is registered.
    #[error("unknown shape `{0}`")]
    UnknownShape(String),

    /// The field does not exist on the shape.
    #[error("shape `{shape}` has no field `{field}`")]
    UnknownField {
        /// Shape that was searched.
        shape: String,
        /// Missing field name.
        field: String,
    },

    /// A stored row lacks a field of its shape.
    #[error("stored `{shape}` row lacks field `{field}`")]
    MissingField {
        /// Shape being restored.
        shape: String,
        /// Absent field name.
        field: String,
    },

    /// A value or a related field does not match the declared field type.
    #[error("field `{shape}.{field}` is {expected}, got {found}")]
    TypeMismatch {
        /// Shape owning the field.
        shape: String,
        /// Field name.
        field: String,
        /// Declared type.
        expected: FieldType,
        /// Offending type.
        found: FieldType,
    },

    /// A relation between the two shapes was already declared.
    #[error("relation `{parent}` -> `{child}` is already declared")]
    DuplicateRelation {
        /// Parent (one side) shape.
        parent: String,
        /// Child (many side) shape.
        child: String,
    },

    /// A field cannot be both the physical key and a relationship key.
    #[error("field `{shape}.{field}` cannot be both physical key and relationship key")]
    KeyConflict {
        /// Shape owning the field.
        shape: String,
        /// Field name.
        field: String,
    },

    /// No relation joins the two shapes.
    #[error("no relation declared from `{parent}` to `{child}`")]
    UnknownRelation {
        /// Parent (one side) shape.
        parent: String,
        /// Child (many side) shape.
        child: String,
    },

    /// The record was already persisted and can no longer be written.
    #[error("record of shape `{0}` is already persisted")]
    RecordPersisted(String),

    /// Error reported by the storage collaborator.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors reported by a storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying sled error.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Invalid data format.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// The shape was never registered with the store.
    #[error("shape `{0}` is not registered with the store")]
    UnregisteredShape(String),

    /// A different definition is already registered under the same name.
    #[error("shape `{0}` is registered with a different definition")]
    SchemaConflict(String),

    /// A business key value is already taken.
    #[error("duplicate value for unique key `{shape}.{field}`")]
    UniqueViolation {
        /// Parent shape.
        shape: String,
        /// Business key field.
        field: String,
    },

    /// A foreign key references no parent business key.
    #[error("`{shape}.{field}` references no `{parent}` row")]
    ForeignKeyViolation {
        /// Child shape.
        shape: String,
        /// Foreign key field.
        field: String,
        /// Referenced parent shape.
        parent: String,
    },

    /// The store returned a different number of keys than records written.
    #[error("store assigned {assigned} keys for {expected} records")]
    KeyCount {
        /// Number of records in the batch.
        expected: usize,
        /// Number of keys returned.
        assigned: usize,
    },
}
