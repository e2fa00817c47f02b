// src/types/hash.rs

//! Hashes reuse the set layout: one row per field at
//! `MemberKey::encode(key, version, field)`, carrying the field value.

use super::codec::MemberKey;
use super::{DataType, Ds};
use crate::engine::{KvEngine, WriteBatch};
use crate::error::Result;

impl<E: KvEngine> Ds<E> {
    /// HSET key field value
    /// Returns `true` when the field was created, `false` when overwritten.
    pub fn hset(&self, key: &[u8], field: &[u8], value: &[u8]) -> Result<bool> {
        let _guard = self.lock(key);
        let mut md = self.get_or_create(key, DataType::Hash)?;
        let field_key = MemberKey::encode(key, md.version, field);
        if self.engine.get(&field_key)?.is_some() {
            self.engine.insert(&field_key, value)?;
            return Ok(false);
        }

        md.size += 1;
        let mut wb = WriteBatch::new();
        wb.put(key, &md.encode());
        wb.put(&field_key, value);
        self.engine.apply_batch(wb)?;
        Ok(true)
    }

    /// HGET key field
    pub fn hget(&self, key: &[u8], field: &[u8]) -> Result<Option<Vec<u8>>> {
        let md = self.get_or_create(key, DataType::Hash)?;
        if md.size == 0 {
            return Ok(None);
        }
        let field_key = MemberKey::encode(key, md.version, field);
        Ok(self.engine.get(&field_key)?.map(|v| v.to_vec()))
    }

    /// HDEL key field
    pub fn hdel(&self, key: &[u8], field: &[u8]) -> Result<bool> {
        let _guard = self.lock(key);
        let mut md = self.get_or_create(key, DataType::Hash)?;
        if md.size == 0 {
            return Ok(false);
        }
        let field_key = MemberKey::encode(key, md.version, field);
        if self.engine.get(&field_key)?.is_none() {
            return Ok(false);
        }

        md.size -= 1;
        let mut wb = WriteBatch::new();
        wb.put(key, &md.encode());
        wb.delete(&field_key);
        self.engine.apply_batch(wb)?;
        Ok(true)
    }

    /// HLEN key, 0 on any failure.
    pub fn hlen(&self, key: &[u8]) -> u64 {
        self.get_or_create(key, DataType::Hash)
            .map(|md| md.size)
            .unwrap_or(0)
    }

    /// HGETALL key as `(field, value)` pairs in engine key order.
    pub fn hgetall(&self, key: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let md = self.get_or_create(key, DataType::Hash)?;
        if md.size == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .scan_members(key, &md)?
            .into_iter()
            .map(|(mk, value)| (mk.member, value))
            .collect())
    }
}
