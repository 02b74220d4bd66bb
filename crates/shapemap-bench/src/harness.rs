//! Benchmark harness helpers.

use shapemap_core::{Mapper, MemoryStore, StorageConfig, StorageEngine};

use crate::fixtures::{maker_batch, model_batch, CarFixture, Scale};

/// Test context for benchmarks.
///
/// Owns the fixture, a memory store, and a sled store in a temporary directory.
pub struct TestContext {
    pub fixture: CarFixture,
    pub memory: MemoryStore,
    pub sled: StorageEngine,
    _storage_dir: tempfile::TempDir,
}

impl TestContext {
    /// Create a context with the model materialized in both stores.
    pub fn new() -> Self {
        let storage_dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(storage_dir.path());
        let sled = StorageEngine::open(config).unwrap();
        let ctx = Self {
            fixture: CarFixture::new(),
            memory: MemoryStore::new(),
            sled,
            _storage_dir: storage_dir,
        };
        ctx.memory_mapper().materialize().unwrap();
        ctx.sled_mapper().materialize().unwrap();
        ctx
    }

    /// Create a context with both stores populated.
    pub fn with_scale(scale: Scale) -> Self {
        let ctx = Self::new();
        let makers = maker_batch(&ctx.fixture, 0, scale.count());
        let models = model_batch(&ctx.fixture, 0, scale.count(), scale.models_per_maker());

        ctx.memory_mapper().persist(&mut makers.clone()).unwrap();
        ctx.memory_mapper().persist(&mut models.clone()).unwrap();
        ctx.sled_mapper().persist(&mut makers.clone()).unwrap();
        ctx.sled_mapper().persist(&mut models.clone()).unwrap();
        ctx.sled.flush().unwrap();
        ctx
    }

    pub fn memory_mapper(&self) -> Mapper<'_, MemoryStore> {
        Mapper::new(&self.fixture.bound, &self.memory)
    }

    pub fn sled_mapper(&self) -> Mapper<'_, StorageEngine> {
        Mapper::new(&self.fixture.bound, &self.sled)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
