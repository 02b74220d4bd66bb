//! Record instances: mutable field-value bags bound to one shape.

use crate::catalog::{FieldType, ShapeHandle};
use crate::error::Error;
use crate::value::Value;

/// Lifecycle state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Instantiated, fields mutable, no physical key yet.
    Unbound,
    /// Written by a store; holds its physical key.
    Persisted,
}

/// A record of a runtime-defined shape.
///
/// Values are stored in field order and checked against the shape's field-type
/// table on every read and write.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    shape: ShapeHandle,
    values: Vec<Value>,
    physical_key: Option<u64>,
}

impl Record {
    /// Create a record with every field at its type's zero value.
    pub fn new(shape: &ShapeHandle) -> Self {
        Self {
            shape: shape.clone(),
            values: shape
                .fields
                .iter()
                .map(|f| f.field_type.zero_value())
                .collect(),
            physical_key: None,
        }
    }

    /// Rebuild a persisted record from stored field values.
    ///
    /// Every field of the shape must be present exactly once. When `key_field`
    /// is given it receives `physical_key`, overriding the stored value.
    pub fn restore(
        shape: &ShapeHandle,
        fields: impl IntoIterator<Item = (String, Value)>,
        physical_key: u64,
        key_field: Option<&str>,
    ) -> Result<Self, Error> {
        let mut slots: Vec<Option<Value>> = vec![None; shape.fields.len()];
        for (name, value) in fields {
            let index = shape.field_index(&name)?;
            check_type(shape, &name, shape.fields[index].field_type, &value)?;
            slots[index] = Some(value);
        }

        let mut values = Vec::with_capacity(slots.len());
        for (slot, def) in slots.into_iter().zip(&shape.fields) {
            match slot {
                Some(value) => values.push(value),
                None => {
                    return Err(Error::MissingField {
                        shape: shape.name().to_string(),
                        field: def.name.clone(),
                    })
                }
            }
        }

        let mut record = Self {
            shape: shape.clone(),
            values,
            physical_key: None,
        };
        record.mark_persisted(physical_key, key_field)?;
        Ok(record)
    }

    /// Shape this record conforms to.
    pub fn shape(&self) -> &ShapeHandle {
        &self.shape
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecordState {
        if self.physical_key.is_some() {
            RecordState::Persisted
        } else {
            RecordState::Unbound
        }
    }

    /// Whether the record has been written by a store.
    pub fn is_persisted(&self) -> bool {
        self.physical_key.is_some()
    }

    /// Storage-assigned surrogate key, once persisted.
    pub fn physical_key(&self) -> Option<u64> {
        self.physical_key
    }

    /// Read a field.
    pub fn get_field(&self, field: &str) -> Result<&Value, Error> {
        let index = self.shape.field_index(field)?;
        Ok(&self.values[index])
    }

    /// Write a field. The value must match the declared type exactly.
    ///
    /// A failed write leaves the record untouched.
    pub fn set_field(&mut self, field: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        let index = self.shape.field_index(field)?;
        let expected = self.shape.fields[index].field_type;
        check_type(&self.shape, field, expected, &value)?;
        if self.is_persisted() {
            return Err(Error::RecordPersisted(self.shape.name().to_string()));
        }
        self.values[index] = value;
        Ok(())
    }

    /// Read an `Int` field.
    pub fn get_int(&self, field: &str) -> Result<i64, Error> {
        let value = self.typed(field, FieldType::Int)?;
        Ok(value.as_int().unwrap_or_default())
    }

    /// Read a `Uuid` field.
    pub fn get_uuid(&self, field: &str) -> Result<[u8; 16], Error> {
        let value = self.typed(field, FieldType::Uuid)?;
        Ok(value.as_uuid().copied().unwrap_or_default())
    }

    /// Read a `String` field.
    pub fn get_str(&self, field: &str) -> Result<&str, Error> {
        let value = self.typed(field, FieldType::String)?;
        Ok(value.as_str().unwrap_or_default())
    }

    /// Read a `Bool` field.
    pub fn get_bool(&self, field: &str) -> Result<bool, Error> {
        let value = self.typed(field, FieldType::Bool)?;
        Ok(value.as_bool().unwrap_or_default())
    }

    /// Field names and values in shape order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.shape
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .zip(self.values.iter())
    }

    /// Field values in shape order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Record the storage-assigned key and move to `Persisted`.
    pub(crate) fn mark_persisted(
        &mut self,
        physical_key: u64,
        key_field: Option<&str>,
    ) -> Result<(), Error> {
        if let Some(field) = key_field {
            let index = self.shape.field_index(field)?;
            let key = Value::Int(physical_key as i64);
            let expected = self.shape.fields[index].field_type;
            check_type(&self.shape, field, expected, &key)?;
            self.values[index] = key;
        }
        self.physical_key = Some(physical_key);
        Ok(())
    }

    fn typed(&self, field: &str, requested: FieldType) -> Result<&Value, Error> {
        let value = self.get_field(field)?;
        if value.field_type() != requested {
            return Err(Error::TypeMismatch {
                shape: self.shape.name().to_string(),
                field: field.to_string(),
                expected: value.field_type(),
                found: requested,
            });
        }
        Ok(value)
    }
}

fn check_type(
    shape: &ShapeHandle,
    field: &str,
    expected: FieldType,
    value: &Value,
) -> Result<(), Error> {
    let found = value.field_type();
    if found != expected {
        return Err(Error::TypeMismatch {
            shape: shape.name().to_string(),
            field: field.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
