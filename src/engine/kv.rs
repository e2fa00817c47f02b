// src/engine/kv.rs

use sled::{Batch, Db, IVec, Tree};

use crate::error::{DsError, Result};

/// The ordered key-value engine the data-structure layer is written against.
///
/// Durability, compaction and crash recovery are the engine's business. All
/// the layer needs is point reads/writes, an atomic multi-row commit and an
/// ordered scan over every row sharing a byte prefix.
pub trait KvEngine: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<IVec>>;
    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()>;
    fn remove(&self, key: &[u8]) -> Result<()>;

    /// Commit every operation in `batch` atomically.
    fn apply_batch(&self, batch: WriteBatch) -> Result<()>;

    /// Rows whose key starts with `prefix`, in ascending key order.
    fn scan_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = Result<(IVec, IVec)>> + 'a>;

    fn flush(&self) -> Result<()>;
}

/// A group of puts and deletes applied as one unit by [`KvEngine::apply_batch`].
#[derive(Default)]
pub struct WriteBatch {
    inner: Batch,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.inner.insert(key, value);
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.inner.remove(key);
    }
}

impl KvEngine for Tree {
    fn get(&self, key: &[u8]) -> Result<Option<IVec>> {
        Ok(Tree::get(self, key)?)
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Tree::insert(self, key, value)?;
        Ok(())
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        Tree::remove(self, key)?;
        Ok(())
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<()> {
        Ok(Tree::apply_batch(self, batch.inner)?)
    }

    fn scan_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = Result<(IVec, IVec)>> + 'a> {
        Box::new(Tree::scan_prefix(self, prefix).map(|item| item.map_err(DsError::from)))
    }

    fn flush(&self) -> Result<()> {
        Tree::flush(self)?;
        Ok(())
    }
}

// `Db` is the default tree of an opened database.
impl KvEngine for Db {
    fn get(&self, key: &[u8]) -> Result<Option<IVec>> {
        KvEngine::get(&**self, key)
    }

    fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        KvEngine::insert(&**self, key, value)
    }

    fn remove(&self, key: &[u8]) -> Result<()> {
        KvEngine::remove(&**self, key)
    }

    fn apply_batch(&self, batch: WriteBatch) -> Result<()> {
        KvEngine::apply_batch(&**self, batch)
    }

    fn scan_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = Result<(IVec, IVec)>> + 'a> {
        KvEngine::scan_prefix(&**self, prefix)
    }

    fn flush(&self) -> Result<()> {
        KvEngine::flush(&**self)
    }
}
