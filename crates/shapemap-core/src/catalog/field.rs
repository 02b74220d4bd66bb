//! Field definitions for shapes.

use super::types::FieldType;
use rkyv::Archive;

/// A field definition within a shape.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Field data type.
    pub field_type: FieldType,
}

impl FieldDef {
    /// Create a new field definition.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

impl<N: Into<String>> From<(N, FieldType)> for FieldDef {
    fn from((name, field_type): (N, FieldType)) -> Self {
        Self::new(name, field_type)
    }
}
