//! Shape registry: the owner of every shape defined at run time.

use super::field::FieldDef;
use super::shape::{ShapeDef, ShapeHandle};
use crate::error::Error;
use std::collections::HashMap;
use tracing::debug;

/// Registry of runtime-defined shapes.
///
/// Shapes are added during start-up and never removed. Handles returned by the
/// registry stay valid for as long as any clone of them lives.
#[derive(Debug, Default)]
pub struct ShapeRegistry {
    /// Shapes in definition order.
    shapes: Vec<ShapeHandle>,
    /// Shape name -> position in `shapes`.
    by_name: HashMap<String, usize>,
}

impl ShapeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a shape from `(field name, field type)` pairs.
    ///
    /// ```
    /// use shapemap_core::{FieldType, ShapeRegistry};
    ///
    /// let mut registry = ShapeRegistry::new();
    /// let maker = registry
    ///     .define_shape("Maker", [("id", FieldType::Uuid), ("name", FieldType::String)])
    ///     .unwrap();
    /// assert_eq!(maker.fields.len(), 2);
    /// ```
    pub fn define_shape<F: Into<FieldDef>>(
        &mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = F>,
    ) -> Result<ShapeHandle, Error> {
        self.register(ShapeDef::new(name).with_fields(fields))
    }

    /// Register a shape built with [`ShapeDef`]'s builder.
    ///
    /// The registry is left untouched if validation fails.
    pub fn register(&mut self, def: ShapeDef) -> Result<ShapeHandle, Error> {
        if self.by_name.contains_key(&def.name) {
            return Err(Error::DuplicateShape(def.name));
        }
        def.validate()?;

        debug!(shape = %def.name, fields = def.fields.len(), "shape defined");

        let handle = ShapeHandle::new(def);
        self.by_name
            .insert(handle.name().to_string(), self.shapes.len());
        self.shapes.push(handle.clone());
        Ok(handle)
    }

    /// Look up a shape by name.
    pub fn resolve(&self, name: &str) -> Result<ShapeHandle, Error> {
        self.by_name
            .get(name)
            .map(|&i| self.shapes[i].clone())
            .ok_or_else(|| Error::UnknownShape(name.to_string()))
    }

    /// Check that a handle was issued by this registry.
    pub(crate) fn owns(&self, handle: &ShapeHandle) -> Result<(), Error> {
        match self.by_name.get(handle.name()) {
            Some(&i) if self.shapes[i].ptr_eq(handle) => Ok(()),
            _ => Err(Error::UnknownShape(handle.name().to_string())),
        }
    }

    /// All shapes in definition order.
    pub fn shapes(&self) -> &[ShapeHandle] {
        &self.shapes
    }

    /// Check whether a shape name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of registered shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Whether no shape is registered.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FieldType;

    #[test]
    fn test_define_and_resolve_preserves_fields() {
        let mut registry = ShapeRegistry::new();
        let fields = [
            ("id_auto", FieldType::Int),
            ("maker_id", FieldType::Uuid),
            ("maker_name", FieldType::String),
            ("active", FieldType::Bool),
        ];
        registry.define_shape("Maker", fields).unwrap();

        let resolved = registry.resolve("Maker").unwrap();
        let got: Vec<_> = resolved
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.field_type))
            .collect();
        assert_eq!(got, fields.to_vec());
    }

    #[test]
    fn test_duplicate_shape_leaves_registry_unchanged() {
        let mut registry = ShapeRegistry::new();
        registry
            .define_shape("Maker", [("name", FieldType::String)])
            .unwrap();

        let err = registry
            .define_shape("Maker", [("other", FieldType::Int)])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateShape(name) if name == "Maker"));

        assert_eq!(registry.len(), 1);
        let maker = registry.resolve("Maker").unwrap();
        assert_eq!(maker.fields.len(), 1);
        assert_eq!(maker.fields[0].name, "name");
    }

    #[test]
    fn test_invalid_definitions_are_not_registered() {
        let mut registry = ShapeRegistry::new();

        let err = registry
            .define_shape("Dup", [("a", FieldType::Int), ("a", FieldType::Int)])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateField { .. }));

        let err = registry
            .define_shape("Empty", Vec::<FieldDef>::new())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyShape(_)));

        // "A\0B" rows would share the "A\0" key prefix with shape "A"
        registry
            .define_shape("A", [("id", FieldType::Int)])
            .unwrap();
        let err = registry
            .define_shape("A\0B", [("x", FieldType::Int)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
        let err = registry
            .define_shape("B", [("fk\0x", FieldType::Uuid)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));

        assert_eq!(registry.len(), 1);
        assert!(!registry.contains("B"));
        assert!(!registry.contains("Dup"));
    }

    #[test]
    fn test_resolve_unknown() {
        let registry = ShapeRegistry::new();
        assert!(matches!(
            registry.resolve("Ghost"),
            Err(Error::UnknownShape(name)) if name == "Ghost"
        ));
    }

    #[test]
    fn test_owns_rejects_foreign_handles() {
        let mut a = ShapeRegistry::new();
        let mut b = ShapeRegistry::new();
        let ha = a.define_shape("S", [("x", FieldType::Int)]).unwrap();
        let hb = b.define_shape("S", [("x", FieldType::Int)]).unwrap();

        assert!(a.owns(&ha).is_ok());
        assert!(a.owns(&hb).is_err());
    }

    #[test]
    fn test_shapes_in_definition_order() {
        let mut registry = ShapeRegistry::new();
        for name in ["C", "A", "B"] {
            registry
                .define_shape(name, [("x", FieldType::Int)])
                .unwrap();
        }
        let names: Vec<_> = registry.shapes().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }
}
