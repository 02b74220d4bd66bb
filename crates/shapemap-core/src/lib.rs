//! shapemap core - runtime shape registry, relational binder, and generic
//! record access over pluggable storage.
//!
//! Shapes are defined at run time in a [`ShapeRegistry`], wired together by a
//! [`RelationalBinder`] into a [`BoundModel`], and read or written through a
//! [`Mapper`] backed by any [`ShapeStore`].

pub mod access;
pub mod catalog;
pub mod error;
pub mod record;
pub mod storage;
pub mod value;

pub use access::Mapper;
pub use catalog::{
    BoundModel, FieldDef, FieldType, RelationDef, RelationalBinder, ShapeDef, ShapeHandle,
    ShapeRegistry,
};
pub use error::{Error, StorageError};
pub use record::{Record, RecordState};
pub use storage::{MemoryStore, ShapeStore, StorageConfig, StorageEngine};
pub use value::{format_uuid, generate_uuid, parse_uuid, Value};
