//! Runtime catalog for shapemap.
//!
//! The catalog holds shapes defined at run time, the physical key declared for
//! each of them, and the business-key relations between them.

mod binder;
mod field;
mod model;
mod registry;
mod relation;
mod shape;
mod types;

pub use binder::RelationalBinder;
pub use field::FieldDef;
pub use model::BoundModel;
pub use registry::ShapeRegistry;
pub use relation::RelationDef;
pub use shape::{ShapeDef, ShapeHandle};
pub use types::FieldType;
