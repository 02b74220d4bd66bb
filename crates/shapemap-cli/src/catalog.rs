//! The car catalog: makers, propulsion types, and models.

use shapemap_core::{
    generate_uuid, BoundModel, Error, FieldType, Mapper, Record, RelationalBinder, ShapeHandle,
    ShapeRegistry, ShapeStore,
};

pub const CAR_MAKER: &str = "CarMaker";
pub const PROPULSION_TYPE: &str = "PropulsionType";
pub const CAR_MODEL: &str = "CarModel";

/// Field receiving the surrogate key on every shape.
pub const ID_AUTO: &str = "id_auto";

/// Shapes and bound model of the car catalog.
pub struct CarCatalog {
    pub maker: ShapeHandle,
    pub propulsion: ShapeHandle,
    pub model: ShapeHandle,
    pub bound: BoundModel,
}

impl CarCatalog {
    /// Define the three shapes and bind keys and relations.
    pub fn define() -> Result<Self, Error> {
        let mut registry = ShapeRegistry::new();

        let maker = registry.define_shape(
            CAR_MAKER,
            [
                (ID_AUTO, FieldType::Int),
                ("maker_id", FieldType::Uuid),
                ("maker_name", FieldType::String),
            ],
        )?;
        let propulsion = registry.define_shape(
            PROPULSION_TYPE,
            [
                (ID_AUTO, FieldType::Int),
                ("propulsion_id", FieldType::Uuid),
                ("description", FieldType::String),
                ("is_petrol", FieldType::Bool),
                ("is_diesel", FieldType::Bool),
                ("is_hybrid", FieldType::Bool),
                ("is_rechargeable", FieldType::Bool),
            ],
        )?;
        let model = registry.define_shape(
            CAR_MODEL,
            [
                (ID_AUTO, FieldType::Int),
                ("model_id", FieldType::Int),
                ("maker_fk", FieldType::Uuid),
                ("model_name", FieldType::String),
                ("propulsion_fk", FieldType::Uuid),
            ],
        )?;

        let mut binder = RelationalBinder::new(&registry);
        for shape in [&maker, &propulsion, &model] {
            binder.set_physical_key(shape, ID_AUTO)?;
        }
        binder.declare_one_to_many(&maker, &model, "maker_id", "maker_fk")?;
        binder.declare_one_to_many(&propulsion, &model, "propulsion_id", "propulsion_fk")?;
        let bound = binder.build();

        Ok(Self {
            maker,
            propulsion,
            model,
            bound,
        })
    }

    /// Shapes in display order.
    pub fn shapes(&self) -> [&ShapeHandle; 3] {
        [&self.maker, &self.propulsion, &self.model]
    }

    /// Insert one maker, one propulsion type, and one model in a single batch.
    pub fn seed<S: ShapeStore + ?Sized>(
        &self,
        mapper: &Mapper<'_, S>,
    ) -> Result<Vec<Record>, Error> {
        let maker_id = generate_uuid();
        let propulsion_id = generate_uuid();

        let mut maker = mapper.instantiate(&self.maker)?;
        maker.set_field("maker_id", maker_id)?;
        maker.set_field("maker_name", "Renault")?;

        let mut propulsion = mapper.instantiate(&self.propulsion)?;
        propulsion.set_field("propulsion_id", propulsion_id)?;
        propulsion.set_field("description", "Électrique")?;
        propulsion.set_field("is_rechargeable", true)?;

        let mut model = mapper.instantiate(&self.model)?;
        model.set_field("model_id", 200i64)?;
        model.set_field("maker_fk", maker_id)?;
        model.set_field("model_name", "Zoé")?;
        model.set_field("propulsion_fk", propulsion_id)?;

        let mut batch = vec![maker, propulsion, model];
        mapper.persist(&mut batch)?;
        Ok(batch)
    }
}
