//! Primitive field types.

use crate::value::Value;
use rkyv::Archive;
use std::fmt;

/// Primitive data types a shape field may declare.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    rkyv::Serialize,
    rkyv::Deserialize,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum FieldType {
    /// 64-bit signed integer.
    Int,
    /// UUID (128-bit identifier).
    Uuid,
    /// UTF-8 string.
    String,
    /// Boolean value.
    Bool,
}

impl FieldType {
    /// The value a field of this type holds before it is assigned.
    pub fn zero_value(&self) -> Value {
        match self {
            FieldType::Int => Value::Int(0),
            FieldType::Uuid => Value::Uuid([0u8; 16]),
            FieldType::String => Value::String(String::new()),
            FieldType::Bool => Value::Bool(false),
        }
    }

    /// Lowercase type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Uuid => "uuid",
            FieldType::String => "string",
            FieldType::Bool => "bool",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
