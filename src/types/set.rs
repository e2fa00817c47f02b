// src/types/set.rs

//! # Set Type Support
//!
//! A set keeps a metadata record at its raw key and one empty-valued row per
//! member at `MemberKey::encode(key, version, member)`. Cardinality lives in
//! the metadata and is changed in the same batch as the member row.
//!
//! Supported commands:
//! - `SADD`
//! - `SREM`
//! - `SMEMBERS`
//! - `SISMEMBER`
//! - `SCARD`

use super::codec::MemberKey;
use super::metadata::Metadata;
use super::{DataType, Ds};
use crate::engine::{KvEngine, WriteBatch};
use crate::error::Result;

impl<E: KvEngine> Ds<E> {
    /// SADD. Returns `true` if `member` was not already in the set.
    pub fn sadd(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        let _guard = self.lock(key);
        let mut md = self.get_or_create(key, DataType::Set)?;
        let member_key = MemberKey::encode(key, md.version, member);
        if self.engine.get(&member_key)?.is_some() {
            return Ok(false);
        }

        md.size += 1;
        let mut wb = WriteBatch::new();
        wb.put(key, &md.encode());
        wb.put(&member_key, &[]);
        self.engine.apply_batch(wb)?;
        Ok(true)
    }

    /// SISMEMBER.
    pub fn sismember(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        let md = self.get_or_create(key, DataType::Set)?;
        if md.size == 0 {
            return Ok(false);
        }
        let member_key = MemberKey::encode(key, md.version, member);
        Ok(self.engine.get(&member_key)?.is_some())
    }

    /// SREM. Returns `true` if `member` was present and has been removed.
    pub fn srem(&self, key: &[u8], member: &[u8]) -> Result<bool> {
        let _guard = self.lock(key);
        let mut md = self.get_or_create(key, DataType::Set)?;
        if md.size == 0 {
            return Ok(false);
        }
        let member_key = MemberKey::encode(key, md.version, member);
        if self.engine.get(&member_key)?.is_none() {
            return Ok(false);
        }

        md.size -= 1;
        let mut wb = WriteBatch::new();
        wb.put(key, &md.encode());
        wb.delete(&member_key);
        self.engine.apply_batch(wb)?;
        Ok(true)
    }

    /// SMEMBERS, in engine key order.
    pub fn smembers(&self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        let md = self.get_or_create(key, DataType::Set)?;
        if md.size == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .scan_members(key, &md)?
            .into_iter()
            .map(|(mk, _)| mk.member)
            .collect())
    }

    /// SCARD. Never fails: any error reads as an empty set.
    pub fn scard(&self, key: &[u8]) -> u64 {
        self.get_or_create(key, DataType::Set)
            .map(|md| md.size)
            .unwrap_or(0)
    }

    /// Every member row of the live generation of `key`, with its payload.
    ///
    /// The prefix scan also visits the metadata row, rows of other raw keys
    /// that merely start with `key`, and member rows left behind by earlier
    /// generations; only rows that decode to this exact key and version count.
    pub(crate) fn scan_members(
        &self,
        key: &[u8],
        md: &Metadata,
    ) -> Result<Vec<(MemberKey, Vec<u8>)>> {
        let mut out = Vec::with_capacity(md.size as usize);
        for item in self.engine.scan_prefix(key) {
            let (raw_key, value) = item?;
            if raw_key.len() == key.len() {
                continue;
            }
            let Some(mk) = MemberKey::decode(&raw_key) else {
                continue;
            };
            if mk.key == key && mk.version == md.version {
                out.push((mk, value.to_vec()));
            }
        }
        Ok(out)
    }
}
