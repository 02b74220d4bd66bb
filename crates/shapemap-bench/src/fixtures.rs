//! Test data generation for benchmarks.
//!
//! Business keys are derived from the row index so runs are reproducible.

use shapemap_core::{BoundModel, FieldType, Record, RelationalBinder, ShapeHandle, ShapeRegistry};

/// Scale factor for benchmark data generation.
#[derive(Clone, Copy, Debug, Default)]
pub enum Scale {
    /// 10 makers
    Tiny,
    /// 100 makers
    Small,
    /// 2,000 makers
    #[default]
    Medium,
}

impl Scale {
    /// Number of makers for this scale.
    pub fn count(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 2_000,
        }
    }

    /// Models generated per maker.
    pub fn models_per_maker(&self) -> usize {
        match self {
            Scale::Tiny => 2,
            Scale::Small | Scale::Medium => 5,
        }
    }
}

/// Maker/Model shapes bound with surrogate keys and a business-key relation.
pub struct CarFixture {
    pub maker: ShapeHandle,
    pub model: ShapeHandle,
    pub bound: BoundModel,
}

impl CarFixture {
    pub fn new() -> Self {
        let mut registry = ShapeRegistry::new();
        let maker = registry
            .define_shape(
                "Maker",
                [
                    ("id_auto", FieldType::Int),
                    ("maker_id", FieldType::Uuid),
                    ("name", FieldType::String),
                    ("active", FieldType::Bool),
                ],
            )
            .unwrap();
        let model = registry
            .define_shape(
                "Model",
                [
                    ("id_auto", FieldType::Int),
                    ("model_id", FieldType::Int),
                    ("maker_fk", FieldType::Uuid),
                    ("name", FieldType::String),
                ],
            )
            .unwrap();

        let mut binder = RelationalBinder::new(&registry);
        binder.set_physical_key(&maker, "id_auto").unwrap();
        binder.set_physical_key(&model, "id_auto").unwrap();
        binder
            .declare_one_to_many(&maker, &model, "maker_id", "maker_fk")
            .unwrap();

        Self {
            maker,
            model,
            bound: binder.build(),
        }
    }
}

impl Default for CarFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic business key for row `index` of a batch starting at `seed`.
pub fn business_key(seed: u64, index: usize) -> [u8; 16] {
    let mut id = [0u8; 16];
    id[..8].copy_from_slice(&seed.to_be_bytes());
    id[8..].copy_from_slice(&(index as u64).to_be_bytes());
    id
}

/// Generate unbound maker records.
pub fn maker_batch(fixture: &CarFixture, seed: u64, count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let mut r = Record::new(&fixture.maker);
            r.set_field("maker_id", business_key(seed, i)).unwrap();
            r.set_field("name", format!("Maker {}", i)).unwrap();
            r.set_field("active", i % 2 == 0).unwrap();
            r
        })
        .collect()
}

/// Generate unbound model records pointing at the makers of `maker_batch(seed, makers)`.
pub fn model_batch(
    fixture: &CarFixture,
    seed: u64,
    makers: usize,
    per_maker: usize,
) -> Vec<Record> {
    (0..makers * per_maker)
        .map(|i| {
            let mut r = Record::new(&fixture.model);
            r.set_field("model_id", i as i64).unwrap();
            let maker_fk = business_key(seed, i / per_maker);
            r.set_field("maker_fk", maker_fk).unwrap();
            r.set_field("name", format!("Model {}", i)).unwrap();
            r
        })
        .collect()
}
