//! Shape definitions and the handles that address them.

use super::field::FieldDef;
use super::types::FieldType;
use crate::error::Error;
use rkyv::Archive;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A shape definition: a named, ordered list of typed fields.
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
pub struct ShapeDef {
    /// Shape name (unique within a registry).
    pub name: String,
    /// Field definitions in declaration order.
    pub fields: Vec<FieldDef>,
}

impl ShapeDef {
    /// Create a shape definition with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the shape.
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDef::new(name, field_type));
        self
    }

    /// Add multiple fields.
    pub fn with_fields<F: Into<FieldDef>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Check the definition is non-empty and free of repeated field names.
    ///
    /// Shape and field names become storage key segments separated by NUL,
    /// so they must be non-empty and contain no NUL byte.
    pub fn validate(&self) -> Result<(), Error> {
        check_name(&self.name)?;
        if self.fields.is_empty() {
            return Err(Error::EmptyShape(self.name.clone()));
        }
        for (i, field) in self.fields.iter().enumerate() {
            check_name(&field.name)?;
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(Error::DuplicateField {
                    shape: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn check_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.contains('\0') {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

struct ShapeInner {
    def: ShapeDef,
    index: HashMap<String, usize>,
}

/// Cheap, shareable handle to a registered shape.
///
/// Carries the field-type table used to check every field read and write.
#[derive(Clone)]
pub struct ShapeHandle(Arc<ShapeInner>);

impl ShapeHandle {
    /// Wrap a validated definition.
    pub(crate) fn new(def: ShapeDef) -> Self {
        let index = def
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self(Arc::new(ShapeInner { def, index }))
    }

    /// The underlying definition.
    pub fn def(&self) -> &ShapeDef {
        &self.0.def
    }

    /// Shape name.
    pub fn name(&self) -> &str {
        &self.0.def.name
    }

    /// Position of a field in the shape.
    pub fn field_index(&self, field: &str) -> Result<usize, Error> {
        self.0
            .index
            .get(field)
            .copied()
            .ok_or_else(|| Error::UnknownField {
                shape: self.name().to_string(),
                field: field.to_string(),
            })
    }

    /// Declared type of a field.
    pub fn field_type(&self, field: &str) -> Result<FieldType, Error> {
        let index = self.field_index(field)?;
        Ok(self.0.def.fields[index].field_type)
    }

    /// Whether both handles point at the same registration.
    pub fn ptr_eq(&self, other: &ShapeHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ShapeHandle {
    type Target = ShapeDef;

    fn deref(&self) -> &Self::Target {
        &self.0.def
    }
}

impl PartialEq for ShapeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.def == other.0.def
    }
}

impl Eq for ShapeHandle {}

impl fmt::Debug for ShapeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShapeHandle").field(&self.0.def).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_builder() {
        let shape = ShapeDef::new("Maker")
            .with_field("id", FieldType::Uuid)
            .with_field("name", FieldType::String);

        assert_eq!(shape.name, "Maker");
        assert_eq!(shape.fields.len(), 2);
        assert!(shape.get_field("id").is_some());
        assert!(shape.get_field("nonexistent").is_none());
        assert!(shape.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_and_duplicates() {
        assert!(matches!(
            ShapeDef::new("Empty").validate(),
            Err(Error::EmptyShape(name)) if name == "Empty"
        ));

        let dup = ShapeDef::new("Dup")
            .with_field("a", FieldType::Int)
            .with_field("a", FieldType::Bool);
        assert!(matches!(
            dup.validate(),
            Err(Error::DuplicateField { field, .. }) if field == "a"
        ));
    }

    #[test]
    fn test_validate_rejects_key_separator_in_names() {
        let shape_name = ShapeDef::new("Car\0Maker").with_field("id", FieldType::Int);
        assert!(matches!(
            shape_name.validate(),
            Err(Error::InvalidName(name)) if name == "Car\0Maker"
        ));

        let field_name = ShapeDef::new("Car")
            .with_field("id", FieldType::Int)
            .with_field("maker\0id", FieldType::Uuid);
        assert!(matches!(
            field_name.validate(),
            Err(Error::InvalidName(name)) if name == "maker\0id"
        ));

        let unnamed = ShapeDef::new("").with_field("id", FieldType::Int);
        assert!(matches!(unnamed.validate(), Err(Error::InvalidName(_))));
        let unnamed_field = ShapeDef::new("Car").with_field("", FieldType::Int);
        assert!(matches!(unnamed_field.validate(), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_handle_lookup() {
        let def = ShapeDef::new("Model")
            .with_field("maker_fk", FieldType::Uuid)
            .with_field("name", FieldType::String);
        let handle = ShapeHandle::new(def);

        assert_eq!(handle.field_index("name").unwrap(), 1);
        assert_eq!(handle.field_type("maker_fk").unwrap(), FieldType::Uuid);
        assert!(matches!(
            handle.field_type("missing"),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_handle_equality() {
        let def = ShapeDef::new("A").with_field("x", FieldType::Int);
        let a = ShapeHandle::new(def.clone());
        let b = ShapeHandle::new(def);
        let c = a.clone();

        assert!(a.ptr_eq(&c));
        assert!(!a.ptr_eq(&b));
        assert_eq!(a, b);
    }
}
