// src/types/codec.rs

//! Byte-level encodings shared by every container type.
//!
//! * zig-zag / LEB128 varints used by metadata records and string envelopes
//! * member keys: `raw key ‖ version (8, BE) ‖ member ‖ member length (4, BE)`
//! * list element keys: `raw key ‖ version (8, BE) ‖ index (8, BE)`
//!
//! Every key built here begins with the raw key and the container version, so
//! all rows of one container generation sort contiguously and a prefix scan on
//! the raw key visits them in engine order.

pub const VERSION_LEN: usize = 8;
pub const MEMBER_LEN_LEN: usize = 4;
pub const INDEX_LEN: usize = 8;

/// Longest encoding of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

pub fn put_uvarint(buf: &mut Vec<u8>, mut v: u64) {
    while v >= 0x80 {
        buf.push((v as u8) | 0x80);
        v >>= 7;
    }
    buf.push(v as u8);
}

pub fn put_varint(buf: &mut Vec<u8>, v: i64) {
    put_uvarint(buf, ((v << 1) ^ (v >> 63)) as u64);
}

/// Decode an unsigned varint, returning the value and how many bytes it used.
/// `None` on truncated input or a value wider than 64 bits.
pub fn read_uvarint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut v: u64 = 0;
    let mut shift = 0u32;
    for (i, &b) in buf.iter().enumerate().take(MAX_VARINT_LEN) {
        if i == MAX_VARINT_LEN - 1 && b > 1 {
            return None;
        }
        v |= u64::from(b & 0x7f) << shift;
        if b < 0x80 {
            return Some((v, i + 1));
        }
        shift += 7;
    }
    None
}

pub fn read_varint(buf: &[u8]) -> Option<(i64, usize)> {
    let (u, n) = read_uvarint(buf)?;
    Some((((u >> 1) as i64) ^ -((u & 1) as i64), n))
}

/// Decoded form of a set/hash member key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberKey {
    pub key: Vec<u8>,
    pub version: u64,
    pub member: Vec<u8>,
}

impl MemberKey {
    pub fn encode(key: &[u8], version: u64, member: &[u8]) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(key.len() + VERSION_LEN + member.len() + MEMBER_LEN_LEN);
        buf.extend_from_slice(key);
        buf.extend_from_slice(&version.to_be_bytes());
        buf.extend_from_slice(member);
        buf.extend_from_slice(&(member.len() as u32).to_be_bytes());
        buf
    }

    /// Parse from the tail backwards: member length, member, version, and the
    /// remaining prefix is the raw key.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let mut p = buf.len().checked_sub(MEMBER_LEN_LEN)?;
        let mut len = [0u8; MEMBER_LEN_LEN];
        len.copy_from_slice(&buf[p..p + MEMBER_LEN_LEN]);
        let member_len = u32::from_be_bytes(len) as usize;

        let member_start = p.checked_sub(member_len)?;
        let member = buf[member_start..p].to_vec();
        p = member_start.checked_sub(VERSION_LEN)?;

        let mut version = [0u8; VERSION_LEN];
        version.copy_from_slice(&buf[p..p + VERSION_LEN]);

        Some(MemberKey {
            key: buf[..p].to_vec(),
            version: u64::from_be_bytes(version),
            member,
        })
    }
}

/// Key of the list element at logical position `index`.
pub fn list_element_key(key: &[u8], version: u64, index: u64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(key.len() + VERSION_LEN + INDEX_LEN);
    buf.extend_from_slice(key);
    buf.extend_from_slice(&version.to_be_bytes());
    buf.extend_from_slice(&index.to_be_bytes());
    buf
}
