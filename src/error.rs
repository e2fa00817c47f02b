// src/error.rs

//! Error taxonomy shared by the data-structure service and the dispatcher.
//!
//! Handlers return the first error they hit unmodified. The dispatcher turns
//! `KeyNotFound` into a null reply and renders everything else as `-<message>`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DsError {
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),

    #[error("ERR unknown command '{0}'")]
    UnsupportedCommand(String),

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongTypeOperation,

    #[error("ERR key not found")]
    KeyNotFound,

    #[error("ERR the value is expired")]
    ExpiredValue,

    #[error("ERR the value is nil")]
    NilValue,

    #[error("ERR value is not an integer or out of range")]
    InvalidInteger,

    #[error("ERR value is not a valid float")]
    InvalidFloat,

    #[error("ERR unsupported operation")]
    UnsupportedOperation,

    /// A stored row could not be decoded.
    #[error("ERR corrupted value: {0}")]
    CorruptedValue(&'static str),

    /// Engine failures keep the engine's own message.
    #[error("ERR {0}")]
    Engine(#[from] sled::Error),
}

pub type Result<T> = std::result::Result<T, DsError>;
