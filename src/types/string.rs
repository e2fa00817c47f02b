// src/types/string.rs

//! String values.
//!
//! A string is stored at its raw key as an envelope:
//! `type tag ‖ varint expire_at ‖ payload`. There is no metadata row. Expiry
//! is enforced only when the value is read; nothing sweeps expired rows.
//!
//! Integer counters are written back as decimal text and float counters as
//! the 8-byte little-endian IEEE-754 encoding. INCRBYFLOAT reads either form,
//! the integer commands only read text, so an integer command on a key last
//! written by INCRBYFLOAT fails with `InvalidInteger`.
//!
//! Text is tried first, so an 8-byte binary float whose bytes are all ASCII
//! digits (e.g. `f64::from_le_bytes(*b"00000000")`) reads back as the
//! decimal number those digits spell.

use std::time::Duration;

use super::codec::{put_varint, read_varint, MAX_VARINT_LEN};
use super::{now_nanos, DataType, Ds};
use crate::engine::KvEngine;
use crate::error::{DsError, Result};

pub fn encode_envelope(expire_at: i64, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + MAX_VARINT_LEN + payload.len());
    buf.push(DataType::String.tag());
    put_varint(&mut buf, expire_at);
    buf.extend_from_slice(payload);
    buf
}

/// Split an envelope into `(expire_at, payload)`.
pub fn decode_envelope(buf: &[u8]) -> Result<(i64, &[u8])> {
    let (&tag, rest) = buf.split_first().ok_or(DsError::NilValue)?;
    if tag != DataType::String.tag() {
        return Err(DsError::WrongTypeOperation);
    }
    let (expire_at, n) = read_varint(rest).ok_or(DsError::CorruptedValue("string envelope"))?;
    Ok((expire_at, &rest[n..]))
}

fn parse_i64(raw: &[u8]) -> Result<i64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(DsError::InvalidInteger)
}

fn parse_f64(raw: &[u8]) -> Result<f64> {
    let n = std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or(DsError::InvalidFloat)?;
    if n.is_finite() {
        Ok(n)
    } else {
        Err(DsError::InvalidFloat)
    }
}

/// A stored float counter: decimal text, or the binary form INCRBYFLOAT writes.
fn stored_f64(raw: &[u8]) -> Result<f64> {
    parse_f64(raw).or_else(|_| {
        let bytes: [u8; 8] = raw.try_into().map_err(|_| DsError::InvalidFloat)?;
        let n = f64::from_le_bytes(bytes);
        if n.is_finite() {
            Ok(n)
        } else {
            Err(DsError::InvalidFloat)
        }
    })
}

impl<E: KvEngine> Ds<E> {
    /// SET. A zero `ttl` never expires. An empty value is accepted and ignored.
    pub fn set(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<()> {
        let _guard = self.lock(key);
        self.put_string(key, value, ttl)
    }

    pub(crate) fn put_string(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        let expire_at = if ttl.is_zero() {
            0
        } else {
            now_nanos().saturating_add(i64::try_from(ttl.as_nanos()).unwrap_or(i64::MAX))
        };
        self.engine.insert(key, &encode_envelope(expire_at, value))
    }

    /// GET. Missing keys fail `KeyNotFound`, expired ones `ExpiredValue`.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let raw = self.engine.get(key)?.ok_or(DsError::KeyNotFound)?;
        let (expire_at, payload) = decode_envelope(&raw)?;
        if expire_at > 0 && expire_at <= now_nanos() {
            return Err(DsError::ExpiredValue);
        }
        Ok(payload.to_vec())
    }

    /// Like `get`, but an expired value reads as absent.
    fn get_live(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.get(key) {
            Ok(v) => Ok(Some(v)),
            Err(DsError::KeyNotFound | DsError::ExpiredValue) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// SETNX. True when the value was written.
    pub fn setnx(&self, key: &[u8], value: &[u8]) -> bool {
        let _guard = self.lock(key);
        match self.get_live(key) {
            Ok(None) => self.put_string(key, value, Duration::ZERO).is_ok(),
            _ => false,
        }
    }

    pub fn getdel(&self, key: &[u8]) -> Result<Vec<u8>> {
        let _guard = self.lock(key);
        let value = self.get(key)?;
        self.engine.remove(key)?;
        Ok(value)
    }

    /// GETSET. The previous value, if any could be read, is returned.
    pub fn getset(&self, key: &[u8], value: &[u8]) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock(key);
        let old = self.get(key).ok();
        self.put_string(key, value, Duration::ZERO)?;
        Ok(old)
    }

    pub fn strlen(&self, key: &[u8]) -> usize {
        self.get(key).map(|v| v.len()).unwrap_or(0)
    }

    /// APPEND. Returns the length of the string after the append.
    pub fn append(&self, key: &[u8], value: &[u8]) -> Result<usize> {
        let _guard = self.lock(key);
        let Some(mut current) = self.get_live(key)? else {
            self.put_string(key, value, Duration::ZERO)?;
            return Ok(value.len());
        };
        current.extend_from_slice(value);
        self.put_string(key, &current, Duration::ZERO)?;
        Ok(current.len())
    }

    pub fn incr(&self, key: &[u8]) -> Result<i64> {
        self.add_integer(key, 1)
    }

    pub fn decr(&self, key: &[u8]) -> Result<i64> {
        self.add_integer(key, -1)
    }

    pub fn incr_by(&self, key: &[u8], increment: &[u8]) -> Result<i64> {
        self.add_integer(key, parse_i64(increment)?)
    }

    pub fn decr_by(&self, key: &[u8], decrement: &[u8]) -> Result<i64> {
        let n = parse_i64(decrement)?
            .checked_neg()
            .ok_or(DsError::InvalidInteger)?;
        self.add_integer(key, n)
    }

    pub fn incr_by_float(&self, key: &[u8], increment: &[u8]) -> Result<f64> {
        self.add_float(key, parse_f64(increment)?)
    }

    fn add_integer(&self, key: &[u8], n: i64) -> Result<i64> {
        let _guard = self.lock(key);
        let current = match self.get_live(key)? {
            Some(raw) => parse_i64(&raw)?,
            None => 0,
        };
        let next = current.checked_add(n).ok_or(DsError::InvalidInteger)?;
        self.put_string(key, next.to_string().as_bytes(), Duration::ZERO)?;
        Ok(next)
    }

    fn add_float(&self, key: &[u8], n: f64) -> Result<f64> {
        let _guard = self.lock(key);
        let current = match self.get_live(key)? {
            Some(raw) => stored_f64(&raw)?,
            None => 0.0,
        };
        let next = current + n;
        if !next.is_finite() {
            return Err(DsError::InvalidFloat);
        }
        self.put_string(key, &next.to_le_bytes(), Duration::ZERO)?;
        Ok(next)
    }
}
