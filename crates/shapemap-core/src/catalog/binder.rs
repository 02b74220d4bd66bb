//! Relational binder: physical keys and business-key relations.

use super::model::BoundModel;
use super::registry::ShapeRegistry;
use super::relation::RelationDef;
use super::shape::ShapeHandle;
use super::types::FieldType;
use crate::error::Error;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Declares physical keys and relations over the shapes of one registry.
pub struct RelationalBinder<'r> {
    registry: &'r ShapeRegistry,
    /// Shape name -> physical key field.
    physical_keys: HashMap<String, String>,
    /// Relations in declaration order.
    relations: Vec<RelationDef>,
}

impl<'r> RelationalBinder<'r> {
    /// Create a binder over the given registry.
    pub fn new(registry: &'r ShapeRegistry) -> Self {
        Self {
            registry,
            physical_keys: HashMap::new(),
            relations: Vec::new(),
        }
    }

    /// Designate the field receiving the storage-assigned surrogate key.
    ///
    /// A second call for the same shape replaces the first declaration.
    pub fn set_physical_key(&mut self, shape: &ShapeHandle, field: &str) -> Result<(), Error> {
        self.registry.owns(shape)?;
        let field_type = shape.field_type(field)?;
        if field_type != FieldType::Int {
            return Err(Error::TypeMismatch {
                shape: shape.name().to_string(),
                field: field.to_string(),
                expected: FieldType::Int,
                found: field_type,
            });
        }
        if self
            .relations
            .iter()
            .any(|r| r.uses_field(shape.name(), field))
        {
            return Err(Error::KeyConflict {
                shape: shape.name().to_string(),
                field: field.to_string(),
            });
        }

        let previous = self
            .physical_keys
            .insert(shape.name().to_string(), field.to_string());
        match previous {
            Some(previous) if previous != field => {
                warn!(shape = shape.name(), %previous, field, "physical key redeclared");
            }
            _ => debug!(shape = shape.name(), field, "physical key set"),
        }
        Ok(())
    }

    /// Declare a one-to-many relation from `parent.parent_key` to `child.child_fk`.
    pub fn declare_one_to_many(
        &mut self,
        parent: &ShapeHandle,
        child: &ShapeHandle,
        parent_key: &str,
        child_fk: &str,
    ) -> Result<&RelationDef, Error> {
        self.registry.owns(parent)?;
        self.registry.owns(child)?;

        let key_type = parent.field_type(parent_key)?;
        let fk_type = child.field_type(child_fk)?;
        if key_type != fk_type {
            return Err(Error::TypeMismatch {
                shape: child.name().to_string(),
                field: child_fk.to_string(),
                expected: key_type,
                found: fk_type,
            });
        }

        for (shape, field) in [(parent, parent_key), (child, child_fk)] {
            if self.physical_key(shape.name()) == Some(field) {
                return Err(Error::KeyConflict {
                    shape: shape.name().to_string(),
                    field: field.to_string(),
                });
            }
        }

        if self
            .relations
            .iter()
            .any(|r| r.joins(parent.name(), child.name()))
        {
            return Err(Error::DuplicateRelation {
                parent: parent.name().to_string(),
                child: child.name().to_string(),
            });
        }

        debug!(
            parent = parent.name(),
            parent_key,
            child = child.name(),
            child_fk,
            "relation declared"
        );

        self.relations.push(RelationDef::one_to_many(
            parent.name(),
            parent_key,
            child.name(),
            child_fk,
        ));
        Ok(&self.relations[self.relations.len() - 1])
    }

    /// Physical key declared so far for a shape.
    pub fn physical_key(&self, shape: &str) -> Option<&str> {
        self.physical_keys.get(shape).map(String::as_str)
    }

    /// Snapshot every shape and declaration made so far.
    pub fn build(&self) -> BoundModel {
        BoundModel::new(
            self.registry.shapes().to_vec(),
            self.physical_keys.clone(),
            self.relations.clone(),
        )
    }
}
