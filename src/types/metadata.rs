// src/types/metadata.rs

//! Per-container header stored at the raw key.
//!
//! Layout: `type tag ‖ varint expire_at ‖ uvarint version ‖ uvarint size`,
//! followed by `uvarint head ‖ uvarint tail` for lists only.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use super::codec::{put_uvarint, put_varint, read_uvarint, read_varint};
use super::{now_nanos, DataType, Ds};
use crate::engine::KvEngine;
use crate::error::{DsError, Result};

/// Starting head/tail of a fresh list, leaving room to grow in both directions.
pub const INITIAL_LIST_MARK: u64 = u64::MAX / 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub data_type: DataType,
    /// Absolute expiry in Unix nanoseconds; 0 never expires.
    pub expire_at: i64,
    pub version: u64,
    pub size: u64,
    pub head: u64,
    pub tail: u64,
}

impl Metadata {
    /// A not-yet-persisted empty container with a freshly minted version.
    pub fn fresh(data_type: DataType) -> Self {
        Metadata {
            data_type,
            expire_at: 0,
            version: next_version(),
            size: 0,
            head: INITIAL_LIST_MARK,
            tail: INITIAL_LIST_MARK,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expire_at > 0 && self.expire_at <= now
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 5 * super::codec::MAX_VARINT_LEN);
        buf.push(self.data_type.tag());
        put_varint(&mut buf, self.expire_at);
        put_uvarint(&mut buf, self.version);
        put_uvarint(&mut buf, self.size);
        if self.data_type == DataType::List {
            put_uvarint(&mut buf, self.head);
            put_uvarint(&mut buf, self.tail);
        }
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        const BAD: DsError = DsError::CorruptedValue("metadata");

        let (&tag, mut rest) = buf.split_first().ok_or(DsError::NilValue)?;
        let data_type = DataType::from_tag(tag).ok_or(BAD)?;
        if data_type == DataType::String {
            return Err(BAD);
        }

        let (expire_at, n) = read_varint(rest).ok_or(BAD)?;
        rest = &rest[n..];
        let (version, n) = read_uvarint(rest).ok_or(BAD)?;
        rest = &rest[n..];
        let (size, n) = read_uvarint(rest).ok_or(BAD)?;
        rest = &rest[n..];

        let (mut head, mut tail) = (INITIAL_LIST_MARK, INITIAL_LIST_MARK);
        if data_type == DataType::List {
            let (h, n) = read_uvarint(rest).ok_or(BAD)?;
            rest = &rest[n..];
            let (t, n) = read_uvarint(rest).ok_or(BAD)?;
            rest = &rest[n..];
            head = h;
            tail = t;
        }
        if !rest.is_empty() {
            return Err(BAD);
        }

        Ok(Metadata {
            data_type,
            expire_at,
            version,
            size,
            head,
            tail,
        })
    }
}

static LAST_VERSION: AtomicU64 = AtomicU64::new(0);

/// Mint a generation tag: wall-clock nanoseconds, strictly increasing within
/// the process.
pub(crate) fn next_version() -> u64 {
    let now = now_nanos().max(0) as u64;
    let mut last = LAST_VERSION.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_VERSION.compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(seen) => last = seen,
        }
    }
}

/// What sits at a raw key, before expiry is applied.
#[derive(Debug)]
pub(crate) enum Lookup {
    Absent,
    Live(Metadata),
    Expired(Metadata),
}

impl<E: KvEngine> Ds<E> {
    /// Read and classify the metadata row at `key`.
    ///
    /// Fails with `WrongTypeOperation` when the row belongs to another type.
    pub(crate) fn lookup_metadata(&self, key: &[u8], expected: DataType) -> Result<Lookup> {
        let Some(raw) = self.engine.get(key)? else {
            return Ok(Lookup::Absent);
        };
        let tag = *raw.first().ok_or(DsError::NilValue)?;
        if tag != expected.tag() {
            return Err(DsError::WrongTypeOperation);
        }
        let md = Metadata::decode(&raw).inspect_err(|e| {
            warn!(key = %String::from_utf8_lossy(key), "undecodable metadata: {e}");
        })?;
        if md.is_expired(now_nanos()) {
            Ok(Lookup::Expired(md))
        } else {
            Ok(Lookup::Live(md))
        }
    }

    /// The effective live record for `key`.
    ///
    /// Absent and expired containers both resolve to a fresh, unpersisted
    /// record with a new version; rows written under the old version can no
    /// longer be reached. Callers persist the record with their own mutation.
    pub(crate) fn get_or_create(&self, key: &[u8], expected: DataType) -> Result<Metadata> {
        Ok(match self.lookup_metadata(key, expected)? {
            Lookup::Live(md) => md,
            Lookup::Absent | Lookup::Expired(_) => Metadata::fresh(expected),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_util::make_ds;
    use std::time::Duration;

    #[test]
    fn encode_decode_is_exact_inverse() {
        let set = Metadata {
            data_type: DataType::Set,
            expire_at: 1_700_000_000_000_000_000,
            version: 42,
            size: 3,
            head: INITIAL_LIST_MARK,
            tail: INITIAL_LIST_MARK,
        };
        assert_eq!(Metadata::decode(&set.encode()).unwrap(), set);

        let list = Metadata {
            data_type: DataType::List,
            expire_at: 0,
            version: u64::MAX,
            size: 2,
            head: INITIAL_LIST_MARK - 1,
            tail: INITIAL_LIST_MARK + 1,
        };
        assert_eq!(Metadata::decode(&list.encode()).unwrap(), list);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(Metadata::decode(b""), Err(DsError::NilValue)));
        assert!(matches!(
            Metadata::decode(&[DataType::Set.tag(), 0x80]),
            Err(DsError::CorruptedValue(_))
        ));
        let mut trailing = Metadata::fresh(DataType::Hash).encode();
        trailing.push(0);
        assert!(Metadata::decode(&trailing).is_err());
    }

    #[test]
    fn versions_strictly_increase() {
        let a = next_version();
        let b = next_version();
        let c = Metadata::fresh(DataType::Set).version;
        assert!(a < b && b < c);
    }

    #[test]
    fn get_or_create_synthesizes_without_writing() {
        let ds = make_ds();
        let md = ds.get_or_create(b"k", DataType::Set).unwrap();
        assert_eq!(md.size, 0);
        assert_eq!(md.data_type, DataType::Set);
        assert!(ds.engine().get(b"k").unwrap().is_none());
    }

    #[test]
    fn get_or_create_checks_type() {
        let ds = make_ds();
        ds.sadd(b"s", b"a").unwrap();
        assert!(matches!(
            ds.get_or_create(b"s", DataType::Hash),
            Err(DsError::WrongTypeOperation)
        ));
        ds.set(b"str", b"v", Duration::ZERO).unwrap();
        assert!(matches!(
            ds.get_or_create(b"str", DataType::Set),
            Err(DsError::WrongTypeOperation)
        ));
    }

    #[test]
    fn expired_container_gets_new_version() {
        let ds = make_ds();
        let mut md = Metadata::fresh(DataType::Set);
        md.size = 5;
        md.expire_at = now_nanos() - 1;
        ds.engine().insert(b"old", &md.encode()).unwrap();

        assert!(matches!(
            ds.lookup_metadata(b"old", DataType::Set).unwrap(),
            Lookup::Expired(_)
        ));
        let fresh = ds.get_or_create(b"old", DataType::Set).unwrap();
        assert_eq!(fresh.size, 0);
        assert_eq!(fresh.expire_at, 0);
        assert_ne!(fresh.version, md.version);
    }

    #[test]
    fn live_container_keeps_version() {
        let ds = make_ds();
        let mut md = Metadata::fresh(DataType::Set);
        md.size = 1;
        md.expire_at = now_nanos() + Duration::from_secs(60).as_nanos() as i64;
        ds.engine().insert(b"live", &md.encode()).unwrap();
        assert_eq!(ds.get_or_create(b"live", DataType::Set).unwrap(), md);
    }
}
