//! Runtime field values.

use crate::catalog::FieldType;
use std::fmt;
use uuid::Uuid;

/// A runtime value held by a record field.
///
/// Each variant maps to exactly one [`FieldType`]; no implicit conversion
/// between variants ever happens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// UUID as 16 bytes.
    Uuid([u8; 16]),
    /// UTF-8 string.
    String(String),
    /// Boolean value.
    Bool(bool),
}

impl Value {
    /// The field type this value conforms to.
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Int(_) => FieldType::Int,
            Value::Uuid(_) => FieldType::Uuid,
            Value::String(_) => FieldType::String,
            Value::Bool(_) => FieldType::Bool,
        }
    }

    /// Try to get as i64.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as UUID.
    pub fn as_uuid(&self) -> Option<&[u8; 16]> {
        match self {
            Value::Uuid(u) => Some(u),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Uuid(u) => f.write_str(&format_uuid(u)),
            Value::String(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<[u8; 16]> for Value {
    fn from(v: [u8; 16]) -> Self {
        Value::Uuid(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Generate a fresh business key (random UUID v4).
pub fn generate_uuid() -> [u8; 16] {
    *Uuid::new_v4().as_bytes()
}

/// Format a UUID as lowercase hyphenated hex.
pub fn format_uuid(uuid: &[u8; 16]) -> String {
    Uuid::from_bytes(*uuid).hyphenated().to_string()
}

/// Parse a hyphenated or plain hex UUID.
pub fn parse_uuid(s: &str) -> Option<[u8; 16]> {
    Uuid::parse_str(s).ok().map(Uuid::into_bytes)
}
