// src/types/list.rs

//! # List Type Support
//!
//! Elements live at `list_element_key(key, version, index)` where `index`
//! runs over `[head, tail)` from the metadata record. LPUSH writes at
//! `head - 1` and moves head down, RPUSH writes at `tail` and moves tail up,
//! so big-endian index bytes keep the rows in list order.
//!
//! Supported commands:
//! - `LPUSH`
//! - `RPUSH`
//! - `LPOP`
//! - `RPOP`
//! - `LLEN`
//! - `LRANGE`

use super::codec::list_element_key;
use super::{DataType, Ds};
use crate::engine::{KvEngine, WriteBatch};
use crate::error::{DsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Left,
    Right,
}

impl<E: KvEngine> Ds<E> {
    /// LPUSH. Elements are pushed one after another, so the last one given
    /// ends up at the head. Returns the new length.
    pub fn lpush(&self, key: &[u8], elements: &[Vec<u8>]) -> Result<u64> {
        self.push(key, elements, End::Left)
    }

    /// RPUSH. Returns the new length.
    pub fn rpush(&self, key: &[u8], elements: &[Vec<u8>]) -> Result<u64> {
        self.push(key, elements, End::Right)
    }

    pub fn lpop(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.pop(key, End::Left)
    }

    pub fn rpop(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.pop(key, End::Right)
    }

    /// LLEN. 0 for a missing key, `WrongTypeOperation` for a non-list.
    pub fn llen(&self, key: &[u8]) -> Result<u64> {
        Ok(self.get_or_create(key, DataType::List)?.size)
    }

    /// LRANGE with Redis index rules: negative indexes count from the tail,
    /// out-of-range bounds are clamped, an inverted range is empty.
    pub fn lrange(&self, key: &[u8], start: i64, stop: i64) -> Result<Vec<Vec<u8>>> {
        let md = self.get_or_create(key, DataType::List)?;
        let len = md.size as i64;
        if len == 0 {
            return Ok(Vec::new());
        }

        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start > stop || start >= len {
            return Ok(Vec::new());
        }

        let mut out = Vec::with_capacity((stop - start + 1) as usize);
        for offset in start..=stop {
            let element_key = list_element_key(key, md.version, md.head + offset as u64);
            let value = self
                .engine
                .get(&element_key)?
                .ok_or(DsError::CorruptedValue("list element missing"))?;
            out.push(value.to_vec());
        }
        Ok(out)
    }

    fn push(&self, key: &[u8], elements: &[Vec<u8>], end: End) -> Result<u64> {
        let _guard = self.lock(key);
        let mut md = self.get_or_create(key, DataType::List)?;

        let mut wb = WriteBatch::new();
        for element in elements {
            let index = match end {
                End::Left => {
                    md.head -= 1;
                    md.head
                }
                End::Right => {
                    md.tail += 1;
                    md.tail - 1
                }
            };
            wb.put(&list_element_key(key, md.version, index), element);
        }
        md.size += elements.len() as u64;
        wb.put(key, &md.encode());
        self.engine.apply_batch(wb)?;
        Ok(md.size)
    }

    fn pop(&self, key: &[u8], end: End) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock(key);
        let mut md = self.get_or_create(key, DataType::List)?;
        if md.size == 0 {
            return Ok(None);
        }

        let index = match end {
            End::Left => md.head,
            End::Right => md.tail - 1,
        };
        let element_key = list_element_key(key, md.version, index);
        let value = self
            .engine
            .get(&element_key)?
            .ok_or(DsError::CorruptedValue("list element missing"))?;

        match end {
            End::Left => md.head += 1,
            End::Right => md.tail -= 1,
        }
        md.size -= 1;
        let mut wb = WriteBatch::new();
        wb.put(key, &md.encode());
        wb.delete(&element_key);
        self.engine.apply_batch(wb)?;
        Ok(Some(value.to_vec()))
    }
}
