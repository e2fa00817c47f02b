// src/types/mod.rs

//! Redis data types mapped onto flat engine rows.
//!
//! Strings live at their raw key as a self-describing envelope. Every other
//! type keeps a metadata record at the raw key and one row per element under
//! a composite key tagged with the container's current version.

pub mod codec;
pub mod generic;
pub mod hash;
pub mod list;
pub mod metadata;
pub mod set;
pub mod string;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::KvEngine;

pub const DEFAULT_LOCK_STRIPES: usize = 64;

/// Type tag stored as the first byte of every row living at a raw key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    String = 0,
    Hash = 1,
    Set = 2,
    List = 3,
    ZSet = 4,
}

impl DataType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(DataType::String),
            1 => Some(DataType::Hash),
            2 => Some(DataType::Set),
            3 => Some(DataType::List),
            4 => Some(DataType::ZSet),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Name as reported by TYPE.
    pub fn name(self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Hash => "hash",
            DataType::Set => "set",
            DataType::List => "list",
            DataType::ZSet => "zset",
        }
    }
}

/// The data-structure service. One instance is shared by every connection.
///
/// Read-modify-write commands serialize on a striped per-key mutex held from
/// the first read to the final commit, so two connections cannot both pass a
/// membership probe and then both bump the cardinality.
pub struct Ds<E: KvEngine = sled::Db> {
    engine: E,
    stripes: Vec<Mutex<()>>,
}

impl<E: KvEngine> Ds<E> {
    pub fn new(engine: E) -> Self {
        Self::with_lock_stripes(engine, DEFAULT_LOCK_STRIPES)
    }

    pub fn with_lock_stripes(engine: E, stripes: usize) -> Self {
        let stripes = (0..stripes.max(1)).map(|_| Mutex::new(())).collect();
        Ds { engine, stripes }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Flush the engine; called on shutdown.
    pub fn close(&self) -> crate::error::Result<()> {
        self.engine.flush()
    }

    pub(crate) fn lock(&self, key: &[u8]) -> MutexGuard<'_, ()> {
        let mut h = DefaultHasher::new();
        key.hash(&mut h);
        let idx = (h.finish() as usize) % self.stripes.len();
        // the guarded value is `()`, a poisoned stripe carries no broken state
        self.stripes[idx]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Nanoseconds since the Unix epoch.
pub(crate) fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}
