// src/engine/commands.rs

//! One handler per command. Each checks its argument count before touching
//! storage, calls into [`Ds`] and shapes the result into a [`Reply`].
//! `args` never includes the command name.

use std::time::Duration;

use super::KvEngine;
use crate::error::{DsError, Result};
use crate::protocol::Reply;
use crate::types::Ds;

pub type Handler<E> = fn(&Ds<E>, &[Vec<u8>]) -> Result<Reply>;

fn exact(name: &str, args: &[Vec<u8>], n: usize) -> Result<()> {
    if args.len() == n {
        Ok(())
    } else {
        Err(DsError::WrongNumberOfArguments(name.to_string()))
    }
}

fn at_least(name: &str, args: &[Vec<u8>], n: usize) -> Result<()> {
    if args.len() >= n {
        Ok(())
    } else {
        Err(DsError::WrongNumberOfArguments(name.to_string()))
    }
}

fn parse_i64(raw: &[u8]) -> Result<i64> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(DsError::InvalidInteger)
}

fn count(n: u64) -> Reply {
    Reply::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

fn bulk_or_null(v: Option<Vec<u8>>) -> Reply {
    v.map(Reply::Bulk).unwrap_or(Reply::Null)
}

// --- generic ---

pub fn del<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("del", args, 1)?;
    ds.del(&args[0])?;
    Ok(Reply::Null)
}

pub fn type_of<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("type", args, 1)?;
    let dt = ds.type_of(&args[0])?;
    Ok(Reply::Status(dt.name().to_string()))
}

pub fn exists<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("exists", args, 1)?;
    Ok(Reply::from_bool(ds.exists(&args[0])))
}

// --- string ---

pub fn set<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("set", args, 2)?;
    ds.set(&args[0], &args[1], Duration::ZERO)?;
    Ok(Reply::ok())
}

pub fn setex<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("setex", args, 3)?;
    let secs = parse_i64(&args[1])?;
    if secs <= 0 {
        return Err(DsError::InvalidInteger);
    }
    ds.set(&args[0], &args[2], Duration::from_secs(secs as u64))?;
    Ok(Reply::ok())
}

pub fn get<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("get", args, 1)?;
    Ok(Reply::Bulk(ds.get(&args[0])?))
}

pub fn setnx<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("setnx", args, 2)?;
    Ok(Reply::from_bool(ds.setnx(&args[0], &args[1])))
}

pub fn strlen<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("strlen", args, 1)?;
    Ok(count(ds.strlen(&args[0]) as u64))
}

pub fn append<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("append", args, 2)?;
    Ok(count(ds.append(&args[0], &args[1])? as u64))
}

pub fn getdel<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("getdel", args, 1)?;
    Ok(Reply::Bulk(ds.getdel(&args[0])?))
}

pub fn getset<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("getset", args, 2)?;
    Ok(bulk_or_null(ds.getset(&args[0], &args[1])?))
}

pub fn incr<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("incr", args, 1)?;
    Ok(Reply::Integer(ds.incr(&args[0])?))
}

pub fn decr<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("decr", args, 1)?;
    Ok(Reply::Integer(ds.decr(&args[0])?))
}

pub fn incrby<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("incrby", args, 2)?;
    Ok(Reply::Integer(ds.incr_by(&args[0], &args[1])?))
}

pub fn decrby<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("decrby", args, 2)?;
    Ok(Reply::Integer(ds.decr_by(&args[0], &args[1])?))
}

pub fn incrbyfloat<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("incrbyfloat", args, 2)?;
    Ok(Reply::from_f64(ds.incr_by_float(&args[0], &args[1])?))
}

// --- set ---

pub fn sadd<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("sadd", args, 2)?;
    Ok(Reply::from_bool(ds.sadd(&args[0], &args[1])?))
}

pub fn sismember<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("sismember", args, 2)?;
    Ok(Reply::from_bool(ds.sismember(&args[0], &args[1])?))
}

pub fn srem<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("srem", args, 2)?;
    Ok(Reply::from_bool(ds.srem(&args[0], &args[1])?))
}

pub fn smembers<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("smembers", args, 1)?;
    Ok(Reply::from_bytes_list(ds.smembers(&args[0])?))
}

pub fn scard<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("scard", args, 1)?;
    Ok(count(ds.scard(&args[0])))
}

// --- list ---

pub fn lpush<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    at_least("lpush", args, 2)?;
    Ok(count(ds.lpush(&args[0], &args[1..])?))
}

pub fn rpush<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    at_least("rpush", args, 2)?;
    Ok(count(ds.rpush(&args[0], &args[1..])?))
}

pub fn lpop<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("lpop", args, 1)?;
    Ok(bulk_or_null(ds.lpop(&args[0])?))
}

pub fn rpop<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("rpop", args, 1)?;
    Ok(bulk_or_null(ds.rpop(&args[0])?))
}

pub fn llen<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("llen", args, 1)?;
    Ok(count(ds.llen(&args[0])?))
}

pub fn lrange<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("lrange", args, 3)?;
    let start = parse_i64(&args[1])?;
    let stop = parse_i64(&args[2])?;
    Ok(Reply::from_bytes_list(ds.lrange(&args[0], start, stop)?))
}

// --- hash ---

pub fn hset<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("hset", args, 3)?;
    Ok(Reply::from_bool(ds.hset(&args[0], &args[1], &args[2])?))
}

pub fn hget<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("hget", args, 2)?;
    Ok(bulk_or_null(ds.hget(&args[0], &args[1])?))
}

pub fn hdel<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("hdel", args, 2)?;
    Ok(Reply::from_bool(ds.hdel(&args[0], &args[1])?))
}

pub fn hlen<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("hlen", args, 1)?;
    Ok(count(ds.hlen(&args[0])))
}

pub fn hgetall<E: KvEngine>(ds: &Ds<E>, args: &[Vec<u8>]) -> Result<Reply> {
    exact("hgetall", args, 1)?;
    let flat = ds
        .hgetall(&args[0])?
        .into_iter()
        .flat_map(|(field, value)| [field, value])
        .collect();
    Ok(Reply::from_bytes_list(flat))
}
