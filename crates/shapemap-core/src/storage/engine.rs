//! Sled-backed storage collaborator.

use super::codec::{decode_fields, encode_fields};
use super::key::{decode_row_key, decode_u64, relation_key, row_key, row_prefix, seq_key};
use super::row::StoredRow;
use super::schema::{row_values, SchemaState};
use super::{RecordIter, ShapeStore, StorageConfig};
use crate::catalog::{RelationDef, ShapeDef, ShapeHandle};
use crate::error::StorageError;
use crate::record::Record;
use parking_lot::RwLock;
use rkyv::{Archive, Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};
use tracing::{debug, info, instrument};

/// Tree name for registered shapes.
const SHAPES_TREE: &str = "catalog:shapes";

/// Tree name for registered relations.
const RELATIONS_TREE: &str = "catalog:relations";

/// Tree name for metadata (key sequences).
const META_TREE: &str = "meta";

/// Tree name for row data.
const ROWS_TREE: &str = "rows";

/// Tree name for the business key index.
const UNIQUE_TREE: &str = "index:unique";

/// Persisted shape registration.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
struct ShapeEntry {
    shape: ShapeDef,
    physical_key: Option<String>,
}

/// The sled-backed [`ShapeStore`].
///
/// Registrations are persisted next to the rows, so reopening a database
/// restores its schema. Each batch is applied in a single sled transaction.
pub struct StorageEngine {
    db: Db,
    shapes_tree: Tree,
    relations_tree: Tree,
    meta_tree: Tree,
    rows_tree: Tree,
    unique_tree: Tree,
    schema: RwLock<SchemaState>,
    enforce_foreign_keys: bool,
}

impl StorageEngine {
    /// Open or create a storage engine with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, StorageError> {
        let db = config.to_sled_config().open()?;
        let engine = Self {
            shapes_tree: db.open_tree(SHAPES_TREE)?,
            relations_tree: db.open_tree(RELATIONS_TREE)?,
            meta_tree: db.open_tree(META_TREE)?,
            rows_tree: db.open_tree(ROWS_TREE)?,
            unique_tree: db.open_tree(UNIQUE_TREE)?,
            db,
            schema: RwLock::new(SchemaState::default()),
            enforce_foreign_keys: config.enforce_foreign_keys,
        };
        engine.load_schema()?;

        info!(
            path = %config.path.display(),
            recovered = engine.was_recovered(),
            "storage engine opened"
        );
        Ok(engine)
    }

    /// Check if the database was recovered from a previous run.
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }

    /// Whether writes check foreign keys.
    pub fn enforces_foreign_keys(&self) -> bool {
        self.enforce_foreign_keys
    }

    /// Number of stored rows of a shape.
    pub fn row_count(&self, shape: &str) -> usize {
        self.rows_tree.scan_prefix(row_prefix(shape)).count()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    /// Drop every row and registration.
    ///
    /// Shapes and relationships must be registered again before the next
    /// write, and key sequences restart at 1. [`MemoryStore::clear`] behaves
    /// the same way.
    ///
    /// [`MemoryStore::clear`]: super::MemoryStore::clear
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut schema = self.schema.write();
        for tree in [
            &self.shapes_tree,
            &self.relations_tree,
            &self.meta_tree,
            &self.rows_tree,
            &self.unique_tree,
        ] {
            tree.clear()?;
        }
        *schema = SchemaState::default();
        info!("storage cleared");
        Ok(())
    }

    fn load_schema(&self) -> Result<(), StorageError> {
        let mut schema = self.schema.write();

        for item in self.shapes_tree.iter() {
            let (_, bytes) = item?;
            let entry = rkyv::from_bytes::<ShapeEntry, rkyv::rancor::Error>(&bytes)
                .map_err(|e| StorageError::Deserialization(e.to_string()))?;
            let handle = ShapeHandle::new(entry.shape);
            schema.register_shape(&handle, entry.physical_key.as_deref())?;
        }

        // relations after shapes, so both ends are known
        for item in self.relations_tree.iter() {
            let (_, bytes) = item?;
            let relation = rkyv::from_bytes::<RelationDef, rkyv::rancor::Error>(&bytes)
                .map_err(|e| StorageError::Deserialization(e.to_string()))?;
            schema.register_relationship(&relation)?;
        }

        debug!(
            shapes = schema.shape_count(),
            relations = schema.relation_count(),
            "schema loaded"
        );
        Ok(())
    }
}

impl ShapeStore for StorageEngine {
    fn register_shape(
        &self,
        shape: &ShapeHandle,
        physical_key: Option<&str>,
    ) -> Result<(), StorageError> {
        let mut schema = self.schema.write();
        if !schema.check_shape(shape, physical_key)? {
            return Ok(());
        }

        let entry = ShapeEntry {
            shape: shape.def().clone(),
            physical_key: physical_key.map(str::to_string),
        };
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&entry)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.shapes_tree
            .insert(shape.name().as_bytes(), bytes.to_vec())?;

        schema.insert_shape(shape, physical_key);
        debug!(shape = shape.name(), "shape registered");
        Ok(())
    }

    fn register_relationship(&self, relation: &RelationDef) -> Result<(), StorageError> {
        let mut schema = self.schema.write();
        if !schema.check_relationship(relation)? {
            return Ok(());
        }

        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(relation)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.relations_tree.insert(
            relation_key(&relation.parent_shape, &relation.child_shape),
            bytes.to_vec(),
        )?;

        schema.insert_relationship(relation);
        debug!(
            parent = %relation.parent_shape,
            child = %relation.child_shape,
            "relationship registered"
        );
        Ok(())
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    fn write(&self, records: &[Record]) -> Result<Vec<u64>, StorageError> {
        // Read lock keeps registrations stable for the whole batch.
        let schema = self.schema.read();
        let plan = schema.plan(records)?;
        let enforce = self.enforce_foreign_keys;

        let trees = (&self.meta_tree, &self.rows_tree, &self.unique_tree);
        let result: Result<Vec<u64>, TransactionError<StorageError>> =
            trees.transaction(|(meta_tx, rows_tx, unique_tx)| {
                let mut keys = Vec::with_capacity(records.len());

                for (record, key_field) in records.iter().zip(&plan.key_fields) {
                    let shape = record.shape().name();
                    let seq = seq_key(shape);
                    let last = meta_tx
                        .get(&seq)?
                        .map(|bytes| decode_u64(&bytes))
                        .transpose()
                        .map_err(ConflictableTransactionError::Abort)?
                        .unwrap_or(0);
                    let key = last + 1;
                    meta_tx.insert(seq, &key.to_be_bytes())?;

                    let values = row_values(record, key_field.as_deref(), key);
                    let data = encode_fields(values.iter().map(|(n, v)| (n.as_str(), v)))
                        .map_err(ConflictableTransactionError::Abort)?;
                    let row = StoredRow::new(data)
                        .to_bytes()
                        .map_err(ConflictableTransactionError::Abort)?;
                    rows_tx.insert(row_key(shape, key), row)?;

                    keys.push(key);
                }

                for unique in &plan.uniques {
                    if unique_tx.get(&unique.key)?.is_some() {
                        return Err(ConflictableTransactionError::Abort(unique.violation()));
                    }
                    let key = keys[unique.position];
                    unique_tx.insert(unique.key.as_slice(), &key.to_be_bytes())?;
                }

                // after every unique entry, so batch order does not matter
                if enforce {
                    for reference in &plan.references {
                        if unique_tx.get(&reference.key)?.is_none() {
                            let violation = reference.violation();
                            return Err(ConflictableTransactionError::Abort(violation));
                        }
                    }
                }

                Ok(keys)
            });

        match result {
            Ok(keys) => {
                debug!(count = keys.len(), "batch written");
                Ok(keys)
            }
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(StorageError::Sled(e)),
        }
    }

    fn scan<'a>(&'a self, shape: &ShapeHandle) -> Result<RecordIter<'a>, StorageError> {
        let key_field = {
            let schema = self.schema.read();
            schema.check(shape)?.physical_key.clone()
        };
        let prefix = row_prefix(shape.name());
        let prefix_len = prefix.len();
        let shape = shape.clone();

        let iter = self.rows_tree.scan_prefix(prefix).map(move |item| {
            let (key, bytes) = item?;
            let surrogate = decode_row_key(&key, prefix_len)?;
            let row = StoredRow::from_bytes(&bytes)?;
            let fields = decode_fields(&row.data)?;
            Record::restore(&shape, fields, surrogate, key_field.as_deref())
                .map_err(|e| StorageError::InvalidData(e.to_string()))
        });

        Ok(Box::new(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FieldType, ShapeRegistry};
    use tempfile::TempDir;

    struct TestEngine {
        engine: StorageEngine,
        _dir: TempDir,
    }

    fn shapes() -> (ShapeHandle, ShapeHandle) {
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
        (maker, model)
    }

    fn open(dir: &TempDir, enforce: bool) -> StorageEngine {
        let config = StorageConfig::new(dir.path()).with_foreign_keys(enforce);
        StorageEngine::open(config).unwrap()
    }

    fn setup(enforce: bool) -> (TestEngine, ShapeHandle, ShapeHandle) {
        let dir = TempDir::new().unwrap();
        let engine = open(&dir, enforce);
        let (maker, model) = shapes();
        engine.register_shape(&maker, Some("id_auto")).unwrap();
        engine.register_shape(&model, Some("id_auto")).unwrap();
        let relation = RelationDef::one_to_many("Maker", "maker_id", "Model", "maker_fk");
        engine.register_relationship(&relation).unwrap();
        (TestEngine { engine, _dir: dir }, maker, model)
    }

    fn record(shape: &ShapeHandle, key_field: &str, id: u8, name: &str) -> Record {
        let mut r = Record::new(shape);
        r.set_field(key_field, [id; 16]).unwrap();
        r.set_field("name", name).unwrap();
        r
    }

    fn scan_all(engine: &StorageEngine, shape: &ShapeHandle) -> Vec<Record> {
        engine
            .scan(shape)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_write_and_scan() {
        let (t, maker, model) = setup(false);

        let keys = t
            .engine
            .write(&[
                record(&maker, "maker_id", 1, "Renault"),
                record(&model, "maker_fk", 1, "Zoe"),
                record(&maker, "maker_id", 2, "Dacia"),
            ])
            .unwrap();
        assert_eq!(keys, vec![1, 1, 2]);

        let makers = scan_all(&t.engine, &maker);
        assert_eq!(makers.len(), 2);
        assert_eq!(makers[0].get_str("name").unwrap(), "Renault");
        assert_eq!(makers[1].get_int("id_auto").unwrap(), 2);
        assert_eq!(makers[1].physical_key(), Some(2));

        let models = scan_all(&t.engine, &model);
        assert_eq!(models[0].get_uuid("maker_fk").unwrap(), [1; 16]);
        assert_eq!(t.engine.row_count("Model"), 1);
    }

    #[test]
    fn test_failed_batch_writes_nothing() {
        let (t, maker, model) = setup(false);
        t.engine
            .write(&[record(&maker, "maker_id", 1, "Renault")])
            .unwrap();

        let err = t
            .engine
            .write(&[
                record(&model, "maker_fk", 1, "Zoe"),
                record(&maker, "maker_id", 1, "Again"),
            ])
            .unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation { .. }));
        assert_eq!(t.engine.row_count("Maker"), 1);
        assert_eq!(t.engine.row_count("Model"), 0);

        let keys = t
            .engine
            .write(&[record(&model, "maker_fk", 1, "Zoe")])
            .unwrap();
        assert_eq!(keys, vec![1]);
    }

    #[test]
    fn test_foreign_key_enforcement() {
        let (t, maker, model) = setup(true);

        assert!(matches!(
            t.engine.write(&[record(&model, "maker_fk", 7, "Orphan")]),
            Err(StorageError::ForeignKeyViolation { .. })
        ));

        t.engine
            .write(&[
                record(&model, "maker_fk", 7, "Zoe"),
                record(&maker, "maker_id", 7, "Renault"),
            ])
            .unwrap();
        assert_eq!(t.engine.row_count("Model"), 1);
    }

    #[test]
    fn test_reopen_restores_schema_and_rows() {
        let dir = TempDir::new().unwrap();
        let (maker, model) = shapes();
        {
            let engine = open(&dir, false);
            engine.register_shape(&maker, Some("id_auto")).unwrap();
            engine.register_shape(&model, None).unwrap();
            let relation = RelationDef::one_to_many("Maker", "maker_id", "Model", "maker_fk");
            engine.register_relationship(&relation).unwrap();
            engine
                .write(&[record(&maker, "maker_id", 1, "Renault")])
                .unwrap();
            engine.flush().unwrap();
        }

        let engine = open(&dir, false);
        let makers = scan_all(&engine, &maker);
        assert_eq!(makers.len(), 1);
        assert_eq!(makers[0].get_str("name").unwrap(), "Renault");

        // sequence and unique index survive the reopen
        assert!(matches!(
            engine.write(&[record(&maker, "maker_id", 1, "Clone")]),
            Err(StorageError::UniqueViolation { .. })
        ));
        let keys = engine
            .write(&[record(&maker, "maker_id", 2, "Dacia")])
            .unwrap();
        assert_eq!(keys, vec![2]);

        // re-registering the same schema is a no-op
        engine.register_shape(&model, None).unwrap();
        assert!(matches!(
            engine.register_shape(&model, Some("id_auto")),
            Err(StorageError::SchemaConflict(_))
        ));
    }

    #[test]
    fn test_clear() {
        let (t, maker, _) = setup(false);
        t.engine
            .write(&[record(&maker, "maker_id", 1, "Renault")])
            .unwrap();

        t.engine.clear().unwrap();
        assert_eq!(t.engine.row_count("Maker"), 0);
        assert!(matches!(
            t.engine.scan(&maker).map(|_| ()),
            Err(StorageError::UnregisteredShape(_))
        ));
        assert!(matches!(
            t.engine.write(&[record(&maker, "maker_id", 1, "Renault")]),
            Err(StorageError::UnregisteredShape(_))
        ));

        // re-registering with a different physical key no longer conflicts
        t.engine.register_shape(&maker, None).unwrap();
        let keys = t
            .engine
            .write(&[record(&maker, "maker_id", 1, "Renault")])
            .unwrap();
        assert_eq!(keys, vec![1]);
    }

    #[test]
    fn test_temporary_engine() {
        let engine = StorageEngine::open(StorageConfig::temporary()).unwrap();
        let (maker, _) = shapes();
        engine.register_shape(&maker, None).unwrap();

        let keys = engine.write(&[Record::new(&maker)]).unwrap();
        assert_eq!(keys, vec![1]);
        // no physical key field: the stored id_auto keeps its value
        assert_eq!(scan_all(&engine, &maker)[0].get_int("id_auto").unwrap(), 0);
    }
}
