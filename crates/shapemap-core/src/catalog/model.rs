//! Bound model - immutable snapshot of shapes, keys, and relations.

use super::relation::RelationDef;
use super::shape::ShapeHandle;
use crate::error::Error;
use std::collections::HashMap;

/// The aggregate handed to the access layer and to storage collaborators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundModel {
    /// Shapes in definition order.
    shapes: Vec<ShapeHandle>,
    /// Shape name -> physical key field.
    physical_keys: HashMap<String, String>,
    /// Relations in declaration order.
    relations: Vec<RelationDef>,
}

impl BoundModel {
    pub(crate) fn new(
        shapes: Vec<ShapeHandle>,
        physical_keys: HashMap<String, String>,
        relations: Vec<RelationDef>,
    ) -> Self {
        Self {
            shapes,
            physical_keys,
            relations,
        }
    }

    /// All shapes in definition order.
    pub fn shapes(&self) -> &[ShapeHandle] {
        &self.shapes
    }

    /// Get a shape by name.
    pub fn shape(&self, name: &str) -> Option<&ShapeHandle> {
        self.shapes.iter().find(|s| s.name() == name)
    }

    /// Get a shape by name, failing if it is not part of the model.
    pub fn resolve(&self, name: &str) -> Result<&ShapeHandle, Error> {
        self.shape(name)
            .ok_or_else(|| Error::UnknownShape(name.to_string()))
    }

    /// Check that `shape` belongs to this model.
    pub fn require(&self, shape: &ShapeHandle) -> Result<(), Error> {
        match self.shape(shape.name()) {
            Some(known) if known == shape => Ok(()),
            _ => Err(Error::UnknownShape(shape.name().to_string())),
        }
    }

    /// Physical key field declared for a shape, if any.
    pub fn physical_key(&self, shape: &str) -> Option<&str> {
        self.physical_keys.get(shape).map(String::as_str)
    }

    /// All relations in declaration order.
    pub fn relations(&self) -> &[RelationDef] {
        &self.relations
    }

    /// Get the relation between a parent and a child shape.
    pub fn relation(&self, parent: &str, child: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.joins(parent, child))
    }

    /// Relations where the shape is the parent (one side).
    pub fn relations_from(&self, parent: &str) -> Vec<&RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.parent_shape == parent)
            .collect()
    }

    /// Relations where the shape is the child (many side).
    pub fn relations_to(&self, child: &str) -> Vec<&RelationDef> {
        self.relations
            .iter()
            .filter(|r| r.child_shape == child)
            .collect()
    }
}
