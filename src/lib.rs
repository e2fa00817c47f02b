// src/lib.rs
//! crabds: Redis-style strings, sets, lists and hashes on top of an ordered
//! key-value engine (sled).
//!
//! protocol / server / engine / types / config / error

pub mod config; // JSON config file
pub mod engine; // KV trait, command table & dispatch
pub mod error; // DsError
pub mod protocol; // RESP framing
pub mod server; // TCP accept loop
pub mod types; // metadata, codecs and the data types

pub use error::{DsError, Result};
pub use types::{DataType, Ds};
