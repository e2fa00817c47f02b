// src/types/generic.rs

//! Commands that work on a key regardless of its type.

use super::{DataType, Ds};
use crate::engine::KvEngine;
use crate::error::{DsError, Result};

impl<E: KvEngine> Ds<E> {
    /// DEL. Removes only the row at `key`; for containers that is the
    /// metadata record, and member rows of that generation become unreachable.
    pub fn del(&self, key: &[u8]) -> Result<()> {
        let _guard = self.lock(key);
        self.engine.remove(key)
    }

    /// TYPE. `KeyNotFound` when the key is absent, `NilValue` for an empty row.
    pub fn type_of(&self, key: &[u8]) -> Result<DataType> {
        let raw = self.engine.get(key)?.ok_or(DsError::KeyNotFound)?;
        let tag = *raw.first().ok_or(DsError::NilValue)?;
        DataType::from_tag(tag).ok_or(DsError::CorruptedValue("type tag"))
    }

    /// EXISTS. True iff TYPE succeeds.
    pub fn exists(&self, key: &[u8]) -> bool {
        self.type_of(key).is_ok()
    }
}
