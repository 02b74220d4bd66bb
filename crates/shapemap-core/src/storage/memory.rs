//! In-memory storage collaborator.

use super::schema::{row_values, SchemaState};
use super::{RecordIter, ShapeStore};
use crate::catalog::{RelationDef, ShapeHandle};
use crate::error::StorageError;
use crate::record::Record;
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Default)]
struct Table {
    last_key: u64,
    rows: BTreeMap<u64, Vec<Value>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    schema: SchemaState,
    tables: HashMap<String, Table>,
    /// Encoded business key -> surrogate key of the owning row.
    unique: HashMap<Vec<u8>, u64>,
}

/// A [`ShapeStore`] that keeps every row in process memory.
///
/// Batches are validated in full before any row is applied, so a failed
/// write leaves the store unchanged.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    enforce_foreign_keys: bool,
}

impl MemoryStore {
    /// Create an empty store without foreign key enforcement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable foreign key enforcement.
    pub fn with_foreign_keys(mut self, enforce: bool) -> Self {
        self.enforce_foreign_keys = enforce;
        self
    }

    /// Number of rows stored for a shape.
    pub fn row_count(&self, shape: &str) -> usize {
        self.state
            .read()
            .tables
            .get(shape)
            .map_or(0, |t| t.rows.len())
    }

    /// Drop every row and registration.
    ///
    /// Same contract as [`StorageEngine::clear`](super::StorageEngine::clear):
    /// shapes and relationships must be registered again before the next
    /// write, and key sequences restart at 1.
    pub fn clear(&self) {
        *self.state.write() = MemoryState::default();
        debug!("store cleared");
    }
}

impl ShapeStore for MemoryStore {
    fn register_shape(
        &self,
        shape: &ShapeHandle,
        physical_key: Option<&str>,
    ) -> Result<(), StorageError> {
        let mut state = self.state.write();
        if state.schema.register_shape(shape, physical_key)? {
            state
                .tables
                .insert(shape.name().to_string(), Table::default());
            debug!(shape = shape.name(), "shape registered");
        }
        Ok(())
    }

    fn register_relationship(&self, relation: &RelationDef) -> Result<(), StorageError> {
        let mut state = self.state.write();
        if state.schema.register_relationship(relation)? {
            debug!(
                parent = %relation.parent_shape,
                child = %relation.child_shape,
                "relationship registered"
            );
        }
        Ok(())
    }

    fn write(&self, records: &[Record]) -> Result<Vec<u64>, StorageError> {
        let mut state = self.state.write();
        let plan = state.schema.plan(records)?;

        let taken = plan
            .uniques
            .iter()
            .find(|p| state.unique.contains_key(&p.key));
        if let Some(unique) = taken {
            return Err(unique.violation());
        }
        if self.enforce_foreign_keys {
            let staged: HashSet<&[u8]> = plan.uniques.iter().map(|p| p.key.as_slice()).collect();
            let dangling = plan.references.iter().find(|r| {
                !state.unique.contains_key(&r.key) && !staged.contains(r.key.as_slice())
            });
            if let Some(reference) = dangling {
                return Err(reference.violation());
            }
        }

        let mut keys = Vec::with_capacity(records.len());
        for (record, key_field) in records.iter().zip(&plan.key_fields) {
            let table = state
                .tables
                .entry(record.shape().name().to_string())
                .or_default();
            table.last_key += 1;
            let key = table.last_key;
            let values = row_values(record, key_field.as_deref(), key)
                .into_iter()
                .map(|(_, v)| v)
                .collect();
            table.rows.insert(key, values);
            keys.push(key);
        }
        for unique in plan.uniques {
            state.unique.insert(unique.key, keys[unique.position]);
        }

        debug!(count = keys.len(), "batch written");
        Ok(keys)
    }

    fn scan<'a>(&'a self, shape: &ShapeHandle) -> Result<RecordIter<'a>, StorageError> {
        let state = self.state.read();
        let registration = state.schema.check(shape)?;
        let key_field = registration.physical_key.as_deref();

        let records: Vec<Result<Record, StorageError>> = state
            .tables
            .get(shape.name())
            .map(|table| {
                table
                    .rows
                    .iter()
                    .map(|(&key, values)| {
                        let fields = shape
                            .field_names()
                            .map(str::to_string)
                            .zip(values.iter().cloned());
                        Record::restore(shape, fields, key, key_field)
                            .map_err(|e| StorageError::InvalidData(e.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Box::new(records.into_iter()))
    }
}
