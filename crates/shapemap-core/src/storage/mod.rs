//! Storage collaborators for shapemap.
//!
//! The mapping engine talks to storage only through [`ShapeStore`]. Two
//! implementations ship with the crate: a sled-backed [`StorageEngine`] and an
//! in-memory [`MemoryStore`].

mod codec;
mod config;
mod engine;
mod memory;
mod row;
mod schema;

pub mod key;

pub use codec::{decode_fields, encode_fields, encode_value};
pub use config::StorageConfig;
pub use engine::StorageEngine;
pub use memory::MemoryStore;
pub use row::StoredRow;

use crate::catalog::{RelationDef, ShapeHandle};
use crate::error::StorageError;
use crate::record::Record;

/// Records produced by a scan.
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<Record, StorageError>> + 'a>;

/// The storage collaborator interface.
///
/// Implementations own durability, key assignment, and any constraint
/// enforcement. The mapping engine never retries a failed call.
pub trait ShapeStore {
    /// Materialize storage for a shape.
    ///
    /// `physical_key` names the field mirroring the surrogate key, if any.
    fn register_shape(
        &self,
        shape: &ShapeHandle,
        physical_key: Option<&str>,
    ) -> Result<(), StorageError>;

    /// Record a business-key relation between two registered shapes.
    fn register_relationship(&self, relation: &RelationDef) -> Result<(), StorageError>;

    /// Write a batch of records and return their surrogate keys in batch order.
    ///
    /// Keys are unique and monotonically increasing per shape.
    fn write(&self, records: &[Record]) -> Result<Vec<u64>, StorageError>;

    /// Every stored record of a shape.
    fn scan<'a>(&'a self, shape: &ShapeHandle) -> Result<RecordIter<'a>, StorageError>;
}
