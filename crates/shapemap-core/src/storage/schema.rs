//! Schema bookkeeping shared by the storage collaborators.

use super::key::unique_key;
use crate::catalog::{FieldType, RelationDef, ShapeHandle};
use crate::error::StorageError;
use crate::record::Record;
use crate::value::Value;
use std::collections::{HashMap, HashSet};

/// A shape as registered with a store.
#[derive(Debug, Clone)]
pub(crate) struct Registration {
    pub shape: ShapeHandle,
    pub physical_key: Option<String>,
}

impl Registration {
    fn same_as(&self, shape: &ShapeHandle, physical_key: Option<&str>) -> bool {
        self.shape == *shape && self.physical_key.as_deref() == physical_key
    }
}

/// Unique-index entry to insert for one record of a batch.
#[derive(Debug)]
pub(crate) struct UniqueEntry {
    /// Encoded index key.
    pub key: Vec<u8>,
    pub shape: String,
    pub field: String,
    /// Position of the record in the batch.
    pub position: usize,
}

/// Foreign key value that must match a parent business key.
#[derive(Debug)]
pub(crate) struct Reference {
    /// Encoded index key of the referenced parent value.
    pub key: Vec<u8>,
    pub shape: String,
    pub field: String,
    pub parent: String,
}

/// Everything a store needs to apply a batch.
#[derive(Debug, Default)]
pub(crate) struct WritePlan {
    /// Physical key field for each record, in batch order.
    pub key_fields: Vec<Option<String>>,
    pub uniques: Vec<UniqueEntry>,
    pub references: Vec<Reference>,
}

/// Registered shapes and relations.
#[derive(Debug, Default)]
pub(crate) struct SchemaState {
    shapes: HashMap<String, Registration>,
    relations: Vec<RelationDef>,
}

impl SchemaState {
    /// Validate a shape registration.
    ///
    /// Returns `false` when the exact same registration already exists.
    pub fn check_shape(
        &self,
        shape: &ShapeHandle,
        physical_key: Option<&str>,
    ) -> Result<bool, StorageError> {
        shape
            .validate()
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        if let Some(field) = physical_key {
            match shape.get_field(field) {
                Some(def) if def.field_type == FieldType::Int => {}
                _ => {
                    return Err(StorageError::InvalidData(format!(
                        "physical key `{}.{}` must be an existing Int field",
                        shape.name(),
                        field
                    )))
                }
            }
        }

        match self.shapes.get(shape.name()) {
            None => Ok(true),
            Some(existing) if existing.same_as(shape, physical_key) => Ok(false),
            Some(_) => Err(StorageError::SchemaConflict(shape.name().to_string())),
        }
    }

    /// Record a shape that passed [`check_shape`](Self::check_shape).
    pub fn insert_shape(&mut self, shape: &ShapeHandle, physical_key: Option<&str>) {
        self.shapes.insert(
            shape.name().to_string(),
            Registration {
                shape: shape.clone(),
                physical_key: physical_key.map(str::to_string),
            },
        );
    }

    /// Check and record a shape in one step.
    pub fn register_shape(
        &mut self,
        shape: &ShapeHandle,
        physical_key: Option<&str>,
    ) -> Result<bool, StorageError> {
        let added = self.check_shape(shape, physical_key)?;
        if added {
            self.insert_shape(shape, physical_key);
        }
        Ok(added)
    }

    /// Validate a relation between two registered shapes.
    ///
    /// Returns `false` when the same relation is already registered.
    pub fn check_relationship(&self, relation: &RelationDef) -> Result<bool, StorageError> {
        let parent = self.registration(&relation.parent_shape)?;
        let child = self.registration(&relation.child_shape)?;

        let key_type = field_type(&parent.shape, &relation.parent_key_field)?;
        let fk_type = field_type(&child.shape, &relation.child_fk_field)?;
        if key_type != fk_type {
            return Err(StorageError::InvalidData(format!(
                "`{}.{}` is {}, `{}.{}` is {}",
                relation.parent_shape,
                relation.parent_key_field,
                key_type,
                relation.child_shape,
                relation.child_fk_field,
                fk_type
            )));
        }

        match self
            .relations
            .iter()
            .find(|r| r.joins(&relation.parent_shape, &relation.child_shape))
        {
            None => Ok(true),
            Some(existing) if existing == relation => Ok(false),
            Some(_) => Err(StorageError::SchemaConflict(format!(
                "{} -> {}",
                relation.parent_shape, relation.child_shape
            ))),
        }
    }

    /// Record a relation that passed [`check_relationship`](Self::check_relationship).
    pub fn insert_relationship(&mut self, relation: &RelationDef) {
        self.relations.push(relation.clone());
    }

    /// Check and record a relation in one step.
    pub fn register_relationship(&mut self, relation: &RelationDef) -> Result<bool, StorageError> {
        let added = self.check_relationship(relation)?;
        if added {
            self.insert_relationship(relation);
        }
        Ok(added)
    }

    /// Registration for a shape, which must match the registered definition.
    pub fn check(&self, shape: &ShapeHandle) -> Result<&Registration, StorageError> {
        let registration = self.registration(shape.name())?;
        if registration.shape != *shape {
            return Err(StorageError::SchemaConflict(shape.name().to_string()));
        }
        Ok(registration)
    }

    /// Number of registered shapes.
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Number of registered relations.
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Build the write plan for a batch.
    ///
    /// Fails on unregistered shapes and on business keys repeated inside the
    /// batch. Clashes with stored rows are left to the store.
    pub fn plan(&self, records: &[Record]) -> Result<WritePlan, StorageError> {
        let mut plan = WritePlan {
            key_fields: Vec::with_capacity(records.len()),
            ..Default::default()
        };
        let mut seen = HashSet::new();

        for (position, record) in records.iter().enumerate() {
            let shape = record.shape();
            let registration = self.check(shape)?;
            plan.key_fields.push(registration.physical_key.clone());

            let mut unique_fields: Vec<&str> = Vec::new();
            for relation in &self.relations {
                if relation.parent_shape == shape.name()
                    && !unique_fields.contains(&relation.parent_key_field.as_str())
                {
                    unique_fields.push(&relation.parent_key_field);
                }

                if relation.child_shape == shape.name() {
                    let value = field_value(record, &relation.child_fk_field)?;
                    let parent = &relation.parent_shape;
                    plan.references.push(Reference {
                        key: unique_key(parent, &relation.parent_key_field, value)?,
                        shape: shape.name().to_string(),
                        field: relation.child_fk_field.clone(),
                        parent: parent.clone(),
                    });
                }
            }

            for field in unique_fields {
                let value = field_value(record, field)?;
                let key = unique_key(shape.name(), field, value)?;
                if !seen.insert(key.clone()) {
                    return Err(StorageError::UniqueViolation {
                        shape: shape.name().to_string(),
                        field: field.to_string(),
                    });
                }
                plan.uniques.push(UniqueEntry {
                    key,
                    shape: shape.name().to_string(),
                    field: field.to_string(),
                    position,
                });
            }
        }

        Ok(plan)
    }

    fn registration(&self, name: &str) -> Result<&Registration, StorageError> {
        self.shapes
            .get(name)
            .ok_or_else(|| StorageError::UnregisteredShape(name.to_string()))
    }
}

impl UniqueEntry {
    pub fn violation(&self) -> StorageError {
        StorageError::UniqueViolation {
            shape: self.shape.clone(),
            field: self.field.clone(),
        }
    }
}

impl Reference {
    pub fn violation(&self) -> StorageError {
        StorageError::ForeignKeyViolation {
            shape: self.shape.clone(),
            field: self.field.clone(),
            parent: self.parent.clone(),
        }
    }
}

/// Field values of a record with the physical key field replaced by `key`.
pub(crate) fn row_values(
    record: &Record,
    key_field: Option<&str>,
    key: u64,
) -> Vec<(String, Value)> {
    record
        .fields()
        .map(|(name, value)| {
            let value = if Some(name) == key_field {
                Value::Int(key as i64)
            } else {
                value.clone()
            };
            (name.to_string(), value)
        })
        .collect()
}

fn field_type(shape: &ShapeHandle, field: &str) -> Result<FieldType, StorageError> {
    shape
        .field_type(field)
        .map_err(|e| StorageError::InvalidData(e.to_string()))
}

fn field_value<'r>(record: &'r Record, field: &str) -> Result<&'r Value, StorageError> {
    record
        .get_field(field)
        .map_err(|e| StorageError::InvalidData(e.to_string()))
}
