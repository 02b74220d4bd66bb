//! Generic access layer over a bound model and a storage collaborator.

use crate::catalog::{BoundModel, ShapeHandle};
use crate::error::{Error, StorageError};
use crate::record::Record;
use crate::storage::ShapeStore;
use tracing::{debug, info, instrument};

/// Instantiates, persists, and fetches records of any shape in a model.
pub struct Mapper<'a, S: ShapeStore + ?Sized> {
    model: &'a BoundModel,
    store: &'a S,
}

impl<'a, S: ShapeStore + ?Sized> Mapper<'a, S> {
    /// Bind a model to a storage collaborator.
    pub fn new(model: &'a BoundModel, store: &'a S) -> Self {
        Self { model, store }
    }

    /// The bound model.
    pub fn model(&self) -> &'a BoundModel {
        self.model
    }

    /// Register every shape and relation of the model with the store.
    pub fn materialize(&self) -> Result<(), Error> {
        for shape in self.model.shapes() {
            self.store
                .register_shape(shape, self.model.physical_key(shape.name()))?;
        }
        for relation in self.model.relations() {
            self.store.register_relationship(relation)?;
        }

        info!(
            shapes = self.model.shapes().len(),
            relations = self.model.relations().len(),
            "model materialized"
        );
        Ok(())
    }

    /// Create a record with every field at its zero value.
    pub fn instantiate(&self, shape: &ShapeHandle) -> Result<Record, Error> {
        self.model.require(shape)?;
        Ok(Record::new(shape))
    }

    /// Create a record of the shape with the given name.
    pub fn instantiate_named(&self, name: &str) -> Result<Record, Error> {
        let shape = self.model.resolve(name)?;
        Ok(Record::new(shape))
    }

    /// Write a batch of records.
    ///
    /// On success every record is persisted and holds its physical key. On
    /// failure no record is modified.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub fn persist(&self, records: &mut [Record]) -> Result<(), Error> {
        for record in records.iter() {
            self.model.require(record.shape())?;
            if record.is_persisted() {
                return Err(Error::RecordPersisted(record.shape().name().to_string()));
            }
        }

        let keys = self.store.write(records)?;
        if keys.len() != records.len() {
            return Err(StorageError::KeyCount {
                expected: records.len(),
                assigned: keys.len(),
            }
            .into());
        }

        for (record, key) in records.iter_mut().zip(keys) {
            let key_field = self.model.physical_key(record.shape().name());
            record.mark_persisted(key, key_field)?;
        }

        debug!("batch persisted");
        Ok(())
    }

    /// Write a single record.
    pub fn persist_one(&self, record: &mut Record) -> Result<(), Error> {
        self.persist(std::slice::from_mut(record))
    }

    /// Every stored record of a shape.
    pub fn fetch_all(
        &self,
        shape: &ShapeHandle,
    ) -> Result<impl Iterator<Item = Result<Record, Error>> + 'a, Error> {
        self.model.require(shape)?;
        let records = self.store.scan(shape)?;
        Ok(records.map(|r| r.map_err(Error::from)))
    }

    /// Children of `parent` along the declared relation to `child`.
    pub fn fetch_related(
        &self,
        parent: &Record,
        child: &ShapeHandle,
    ) -> Result<Vec<Record>, Error> {
        self.model.require(parent.shape())?;
        let relation = self
            .model
            .relation(parent.shape().name(), child.name())
            .ok_or_else(|| Error::UnknownRelation {
                parent: parent.shape().name().to_string(),
                child: child.name().to_string(),
            })?;
        let key = parent.get_field(&relation.parent_key_field)?;

        let mut related = Vec::new();
        for record in self.fetch_all(child)? {
            let record = record?;
            if record.get_field(&relation.child_fk_field)? == key {
                related.push(record);
            }
        }
        Ok(related)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldType, RelationDef, RelationalBinder, ShapeRegistry};
    use crate::storage::{MemoryStore, RecordIter};
    use crate::value::Value;

    struct TestModel {
        maker: ShapeHandle,
        model: ShapeHandle,
        bound: BoundModel,
    }

    fn car_model() -> TestModel {
        let mut registry = ShapeRegistry::new();
        let maker = registry
            .define_shape(
                "Maker",
                [
                    ("id_auto", FieldType::Int),
                    ("maker_id", FieldType::Uuid),
                    ("name", FieldType::String),
                ],
            )
            .unwrap();
        let model = registry
            .define_shape(
                "Model",
                [
                    ("id_auto", FieldType::Int),
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

        TestModel {
            maker,
            model,
            bound: binder.build(),
        }
    }

    /// A store that fails every write.
    struct BrokenStore;

    impl ShapeStore for BrokenStore {
        fn register_shape(&self, _: &ShapeHandle, _: Option<&str>) -> Result<(), StorageError> {
            Ok(())
        }

        fn register_relationship(&self, _: &RelationDef) -> Result<(), StorageError> {
            Ok(())
        }

        fn write(&self, _: &[Record]) -> Result<Vec<u64>, StorageError> {
            Err(StorageError::InvalidData("disk on fire".into()))
        }

        fn scan<'a>(&'a self, _: &ShapeHandle) -> Result<RecordIter<'a>, StorageError> {
            Ok(Box::new(std::iter::empty()))
        }
    }

    #[test]
    fn test_persist_assigns_keys() {
        let t = car_model();
        let store = MemoryStore::new();
        let mapper = Mapper::new(&t.bound, &store);
        mapper.materialize().unwrap();

        let mut maker = mapper.instantiate(&t.maker).unwrap();
        maker.set_field("name", "Renault").unwrap();
        let mut other = mapper.instantiate_named("Maker").unwrap();
        other.set_field("maker_id", [1u8; 16]).unwrap();

        let mut batch = [maker, other];
        mapper.persist(&mut batch).unwrap();

        assert_eq!(batch[0].physical_key(), Some(1));
        assert_eq!(batch[1].get_int("id_auto").unwrap(), 2);
        assert!(matches!(
            batch[0].set_field("name", "Dacia"),
            Err(Error::RecordPersisted(_))
        ));
    }

    #[test]
    fn test_persisted_records_are_rejected() {
        let t = car_model();
        let store = MemoryStore::new();
        let mapper = Mapper::new(&t.bound, &store);
        mapper.materialize().unwrap();

        let mut record = mapper.instantiate(&t.maker).unwrap();
        mapper.persist_one(&mut record).unwrap();
        assert!(matches!(
            mapper.persist_one(&mut record),
            Err(Error::RecordPersisted(_))
        ));
        assert_eq!(store.row_count("Maker"), 1);
    }

    #[test]
    fn test_foreign_shape_is_rejected() {
        let t = car_model();
        let store = MemoryStore::new();
        let mapper = Mapper::new(&t.bound, &store);

        let mut other = ShapeRegistry::new();
        let ghost = other
            .define_shape("Ghost", [("x", FieldType::Int)])
            .unwrap();

        assert!(matches!(mapper.instantiate(&ghost), Err(Error::UnknownShape(_))));
        assert!(matches!(
            mapper.instantiate_named("Ghost"),
            Err(Error::UnknownShape(_))
        ));
        let mut batch = [Record::new(&ghost)];
        assert!(matches!(mapper.persist(&mut batch), Err(Error::UnknownShape(_))));
    }

    #[test]
    fn test_failed_write_leaves_records_untouched() {
        let t = car_model();
        let mapper = Mapper::new(&t.bound, &BrokenStore);

        let mut record = mapper.instantiate(&t.maker).unwrap();
        record.set_field("name", "Renault").unwrap();
        let before = record.clone();

        let err = mapper.persist_one(&mut record).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::InvalidData(_))));
        assert_eq!(record, before);
        assert!(!record.is_persisted());
    }

    #[test]
    fn test_fetch_related() {
        let t = car_model();
        let store = MemoryStore::new();
        let mapper = Mapper::new(&t.bound, &store);
        mapper.materialize().unwrap();

        let mut renault = mapper.instantiate(&t.maker).unwrap();
        renault.set_field("maker_id", [1u8; 16]).unwrap();
        let mut dacia = mapper.instantiate(&t.maker).unwrap();
        dacia.set_field("maker_id", [2u8; 16]).unwrap();

        let mut batch = vec![renault, dacia];
        for (maker, name) in [
            ([1u8; 16], "Zoe"),
            ([1u8; 16], "Clio"),
            ([2u8; 16], "Sandero"),
        ] {
            let mut m = mapper.instantiate(&t.model).unwrap();
            m.set_field("maker_fk", maker).unwrap();
            m.set_field("name", name).unwrap();
            batch.push(m);
        }
        mapper.persist(&mut batch).unwrap();

        let models = mapper.fetch_related(&batch[0], &t.model).unwrap();
        let names: Vec<_> = models.iter().map(|m| m.get_str("name").unwrap()).collect();
        assert_eq!(names, vec!["Zoe", "Clio"]);

        assert!(matches!(
            mapper.fetch_related(&batch[2], &t.maker),
            Err(Error::UnknownRelation { .. })
        ));
    }

    #[test]
    fn test_fetch_all_in_key_order() {
        let t = car_model();
        let store = MemoryStore::new();
        let mapper = Mapper::new(&t.bound, &store);
        mapper.materialize().unwrap();

        let mut batch: Vec<Record> = (0..3u8)
            .map(|i| {
                let mut r = mapper.instantiate(&t.maker).unwrap();
                r.set_field("maker_id", [i; 16]).unwrap();
                r
            })
            .collect();
        mapper.persist(&mut batch).unwrap();

        let keys: Vec<Value> = mapper
            .fetch_all(&t.maker)
            .unwrap()
            .map(|r| r.unwrap().get_field("id_auto").unwrap().clone())
            .collect();
        assert_eq!(keys, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }
}
