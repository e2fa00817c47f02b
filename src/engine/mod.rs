// src/engine/mod.rs

//! # Engine module
//!
//! Receives an already-framed request (command name plus raw arguments),
//! resolves the handler from a static table and turns its outcome into a
//! [`Reply`]:
//! - `KeyNotFound` renders as a null reply,
//! - every other error renders as an error reply carrying its message.
//!
//! PING and QUIT never reach the data layer. QUIT answers `OK`; closing the
//! connection is left to the server loop.
pub mod commands;
pub mod kv;

pub use kv::{KvEngine, WriteBatch};

use tracing::debug;

use crate::error::DsError;
use crate::protocol::Reply;
use crate::types::Ds;
use commands::Handler;

/// Look up the handler for a lowercased command name.
pub fn lookup<E: KvEngine>(name: &str) -> Option<Handler<E>> {
    let handler: Handler<E> = match name {
        // generic
        "del" => commands::del::<E>,
        "type" => commands::type_of::<E>,
        "exists" => commands::exists::<E>,

        // string
        "append" => commands::append::<E>,
        "decr" => commands::decr::<E>,
        "decrby" => commands::decrby::<E>,
        "get" => commands::get::<E>,
        "getdel" => commands::getdel::<E>,
        "getset" => commands::getset::<E>,
        "incr" => commands::incr::<E>,
        "incrby" => commands::incrby::<E>,
        "incrbyfloat" => commands::incrbyfloat::<E>,
        "set" => commands::set::<E>,
        "setex" => commands::setex::<E>,
        "setnx" => commands::setnx::<E>,
        "strlen" => commands::strlen::<E>,

        // list
        "llen" => commands::llen::<E>,
        "lpop" => commands::lpop::<E>,
        "lpush" => commands::lpush::<E>,
        "lrange" => commands::lrange::<E>,
        "rpop" => commands::rpop::<E>,
        "rpush" => commands::rpush::<E>,

        // set
        "sadd" => commands::sadd::<E>,
        "scard" => commands::scard::<E>,
        "sismember" => commands::sismember::<E>,
        "smembers" => commands::smembers::<E>,
        "srem" => commands::srem::<E>,

        // hash
        "hdel" => commands::hdel::<E>,
        "hget" => commands::hget::<E>,
        "hgetall" => commands::hgetall::<E>,
        "hlen" => commands::hlen::<E>,
        "hset" => commands::hset::<E>,

        _ => return None,
    };
    Some(handler)
}

/// Lowercased command name of a request, if it has one.
pub fn command_name(parts: &[Vec<u8>]) -> Option<String> {
    parts
        .first()
        .map(|name| String::from_utf8_lossy(name).to_lowercase())
}

/// Execute one client request against the shared service.
///
/// `parts[0]` is the command name, the rest are its arguments.
pub fn execute<E: KvEngine>(ds: &Ds<E>, parts: &[Vec<u8>]) -> Reply {
    let Some(name) = command_name(parts) else {
        return Reply::Error("ERR empty command".into());
    };
    debug!(command = %name, args = parts.len() - 1, "dispatch");

    match name.as_str() {
        "ping" => return Reply::Status("PONG".into()),
        "quit" => return Reply::ok(),
        _ => {}
    }

    let Some(handler) = lookup::<E>(&name) else {
        return Reply::Error(DsError::UnsupportedCommand(name).to_string());
    };
    match handler(ds, &parts[1..]) {
        Ok(reply) => reply,
        Err(DsError::KeyNotFound) => Reply::Null,
        Err(e) => Reply::Error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_util::make_ds;

    fn cmd(parts: &[&str]) -> Vec<Vec<u8>> {
        parts.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    fn bulk(s: &str) -> Reply {
        Reply::Bulk(s.as_bytes().to_vec())
    }

    #[test]
    fn test_string_commands() {
        let ds = make_ds();

        assert_eq!(execute(&ds, &cmd(&["SET", "k", "v1"])), Reply::ok());
        assert_eq!(execute(&ds, &cmd(&["GET", "k"])), bulk("v1"));
        assert_eq!(execute(&ds, &cmd(&["APPEND", "k", "v2"])), Reply::Integer(4));
        assert_eq!(execute(&ds, &cmd(&["GET", "k"])), bulk("v1v2"));
        assert_eq!(execute(&ds, &cmd(&["STRLEN", "k"])), Reply::Integer(4));
        assert_eq!(execute(&ds, &cmd(&["GET", "nonexistence"])), Reply::Null);

        assert_eq!(execute(&ds, &cmd(&["SETNX", "k", "x"])), Reply::Integer(0));
        assert_eq!(execute(&ds, &cmd(&["SETNX", "n", "x"])), Reply::Integer(1));
        assert_eq!(execute(&ds, &cmd(&["GETSET", "n", "y"])), bulk("x"));
        assert_eq!(execute(&ds, &cmd(&["GETSET", "fresh", "y"])), Reply::Null);
        assert_eq!(execute(&ds, &cmd(&["GETDEL", "n"])), bulk("y"));
        assert_eq!(execute(&ds, &cmd(&["GETDEL", "n"])), Reply::Null);
    }

    #[test]
    fn test_counter_commands() {
        let ds = make_ds();
        assert_eq!(execute(&ds, &cmd(&["INCR", "c"])), Reply::Integer(1));
        assert_eq!(execute(&ds, &cmd(&["DECR", "c"])), Reply::Integer(0));
        assert_eq!(execute(&ds, &cmd(&["INCRBY", "n", "5"])), Reply::Integer(5));
        assert_eq!(execute(&ds, &cmd(&["INCRBY", "n", "-20"])), Reply::Integer(-15));
        assert_eq!(execute(&ds, &cmd(&["DECRBY", "n", "5"])), Reply::Integer(-20));
        assert_eq!(execute(&ds, &cmd(&["INCRBYFLOAT", "f", "2.5"])), bulk("2.5"));

        assert_eq!(
            execute(&ds, &cmd(&["INCRBY", "n", "lots"])),
            Reply::Error("ERR value is not an integer or out of range".into())
        );
        assert_eq!(
            execute(&ds, &cmd(&["INCRBYFLOAT", "f", "x"])),
            Reply::Error("ERR value is not a valid float".into())
        );

        execute(&ds, &cmd(&["SET", "max", "9223372036854775807"]));
        assert!(execute(&ds, &cmd(&["INCR", "max"])).is_error());
        assert_eq!(execute(&ds, &cmd(&["GET", "max"])), bulk("9223372036854775807"));
    }

    #[test]
    fn test_set_commands() {
        let ds = make_ds();
        assert_eq!(execute(&ds, &cmd(&["SADD", "s", "a"])), Reply::Integer(1));
        assert_eq!(execute(&ds, &cmd(&["SADD", "s", "a"])), Reply::Integer(0));
        assert_eq!(execute(&ds, &cmd(&["SCARD", "s"])), Reply::Integer(1));
        assert_eq!(execute(&ds, &cmd(&["SISMEMBER", "s", "a"])), Reply::Integer(1));
        assert_eq!(
            execute(&ds, &cmd(&["SMEMBERS", "s"])),
            Reply::Array(vec![bulk("a")])
        );
        assert_eq!(execute(&ds, &cmd(&["SREM", "s", "a"])), Reply::Integer(1));
        assert_eq!(execute(&ds, &cmd(&["SCARD", "s"])), Reply::Integer(0));
        assert_eq!(execute(&ds, &cmd(&["SMEMBERS", "s"])), Reply::Array(vec![]));
    }

    #[test]
    fn test_list_and_hash_commands() {
        let ds = make_ds();
        assert_eq!(execute(&ds, &cmd(&["LPUSH", "l", "a", "b"])), Reply::Integer(2));
        assert_eq!(execute(&ds, &cmd(&["RPUSH", "l", "c"])), Reply::Integer(3));
        assert_eq!(execute(&ds, &cmd(&["LLEN", "l"])), Reply::Integer(3));
        assert_eq!(
            execute(&ds, &cmd(&["LRANGE", "l", "0", "-1"])),
            Reply::Array(vec![bulk("b"), bulk("a"), bulk("c")])
        );
        assert_eq!(execute(&ds, &cmd(&["LPOP", "l"])), bulk("b"));
        assert_eq!(execute(&ds, &cmd(&["RPOP", "l"])), bulk("c"));
        assert_eq!(execute(&ds, &cmd(&["LPOP", "empty"])), Reply::Null);

        assert_eq!(execute(&ds, &cmd(&["HSET", "h", "f", "v"])), Reply::Integer(1));
        assert_eq!(execute(&ds, &cmd(&["HGET", "h", "f"])), bulk("v"));
        assert_eq!(execute(&ds, &cmd(&["HGET", "h", "nope"])), Reply::Null);
        assert_eq!(execute(&ds, &cmd(&["HLEN", "h"])), Reply::Integer(1));
        assert_eq!(
            execute(&ds, &cmd(&["HGETALL", "h"])),
            Reply::Array(vec![bulk("f"), bulk("v")])
        );
        assert_eq!(execute(&ds, &cmd(&["HDEL", "h", "f"])), Reply::Integer(1));
    }

    #[test]
    fn test_generic_commands() {
        let ds = make_ds();
        assert_eq!(execute(&ds, &cmd(&["DEL", "missing"])), Reply::Null);
        assert_eq!(execute(&ds, &cmd(&["EXISTS", "missing"])), Reply::Integer(0));
        assert_eq!(execute(&ds, &cmd(&["TYPE", "missing"])), Reply::Null);

        execute(&ds, &cmd(&["SADD", "s", "m"]));
        execute(&ds, &cmd(&["SET", "k", "v"]));
        assert_eq!(execute(&ds, &cmd(&["TYPE", "s"])), Reply::Status("set".into()));
        assert_eq!(execute(&ds, &cmd(&["TYPE", "k"])), Reply::Status("string".into()));
        assert_eq!(execute(&ds, &cmd(&["EXISTS", "s"])), Reply::Integer(1));
    }

    #[test]
    fn test_wrong_type_reply() {
        let ds = make_ds();
        execute(&ds, &cmd(&["SET", "k", "v"]));
        assert_eq!(
            execute(&ds, &cmd(&["SADD", "k", "m"])),
            Reply::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".into()
            )
        );
        assert_eq!(execute(&ds, &cmd(&["SCARD", "k"])), Reply::Integer(0));
    }

    #[test]
    fn test_control_commands() {
        let ds = make_ds();
        assert_eq!(execute(&ds, &cmd(&["PING"])), Reply::Status("PONG".into()));
        assert_eq!(execute(&ds, &cmd(&["quit"])), Reply::ok());
        assert_eq!(
            execute(&ds, &cmd(&[])),
            Reply::Error("ERR empty command".into())
        );
        assert_eq!(
            execute(&ds, &cmd(&["FLUSHALL"])),
            Reply::Error("ERR unknown command 'flushall'".into())
        );
    }

    #[test]
    fn test_argument_errors() {
        let ds = make_ds();
        assert_eq!(
            execute(&ds, &cmd(&["SET", "Key"])),
            Reply::Error("ERR wrong number of arguments for 'set' command".into())
        );
        assert_eq!(
            execute(&ds, &cmd(&["GET", "key", "extra"])),
            Reply::Error("ERR wrong number of arguments for 'get' command".into())
        );
        assert_eq!(
            execute(&ds, &cmd(&["LPUSH", "l"])),
            Reply::Error("ERR wrong number of arguments for 'lpush' command".into())
        );
        // arity is checked before storage: nothing was written
        assert_eq!(execute(&ds, &cmd(&["EXISTS", "l"])), Reply::Integer(0));
    }

    #[test]
    fn test_setex_seconds() {
        let ds = make_ds();
        let invalid = Reply::Error("ERR value is not an integer or out of range".into());
        assert_eq!(execute(&ds, &cmd(&["SETEX", "k", "0", "v"])), invalid);
        assert_eq!(execute(&ds, &cmd(&["SETEX", "k", "-1", "v"])), invalid);
        assert_eq!(execute(&ds, &cmd(&["SETEX", "k", "abc", "v"])), invalid);
        assert_eq!(execute(&ds, &cmd(&["EXISTS", "k"])), Reply::Integer(0));

        assert_eq!(execute(&ds, &cmd(&["SETEX", "k", "1", "v"])), Reply::ok());
        assert_eq!(execute(&ds, &cmd(&["GET", "k"])), bulk("v"));
    }

    #[test]
    fn every_table_entry_validates_arity() {
        let ds = make_ds();
        let names = [
            "del", "type", "exists", "append", "decr", "decrby", "get", "getdel", "getset",
            "incr", "incrby", "incrbyfloat", "set", "setex", "setnx", "strlen", "llen", "lpop",
            "lpush", "lrange", "rpop", "rpush", "sadd", "scard", "sismember", "smembers", "srem",
            "hdel", "hget", "hgetall", "hlen", "hset",
        ];
        for name in names {
            let handler = lookup::<sled::Db>(name).expect(name);
            let too_many = vec![b"x".to_vec(); 5];
            let args: &[Vec<u8>] = if name.ends_with("push") { &[] } else { &too_many };
            assert!(
                matches!(handler(&ds, args), Err(DsError::WrongNumberOfArguments(n)) if n == name),
                "{name}"
            );
        }
    }
}
