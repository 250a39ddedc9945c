//! Command definitions
//!
//! The closed set of commands the facade and batches can issue. Keys,
//! fields and values are raw bytes; text arguments are encoded as UTF-8
//! by the caller.

/// A command addressed to one shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ping (health check), not routed by key
    Ping,

    // -------------------------------------------------------------------------
    // Strings
    // -------------------------------------------------------------------------
    Get { key: Vec<u8> },
    Set { key: Vec<u8>, value: Vec<u8> },
    SetEx { key: Vec<u8>, seconds: i64, value: Vec<u8> },
    Del { key: Vec<u8> },
    Exists { key: Vec<u8> },
    Incr { key: Vec<u8> },
    IncrBy { key: Vec<u8>, delta: i64 },
    Decr { key: Vec<u8> },
    Expire { key: Vec<u8>, seconds: i64 },

    // -------------------------------------------------------------------------
    // Hashes
    // -------------------------------------------------------------------------
    HGet { key: Vec<u8>, field: Vec<u8> },
    HSet { key: Vec<u8>, field: Vec<u8>, value: Vec<u8> },
    HDel { key: Vec<u8>, field: Vec<u8> },
    HGetAll { key: Vec<u8> },
    HMGet { key: Vec<u8>, fields: Vec<Vec<u8>> },
    HKeys { key: Vec<u8> },
    HVals { key: Vec<u8> },
    HLen { key: Vec<u8> },
    HIncrBy { key: Vec<u8>, field: Vec<u8>, delta: i64 },
    HExists { key: Vec<u8>, field: Vec<u8> },

    // -------------------------------------------------------------------------
    // Sets
    // -------------------------------------------------------------------------
    SAdd { key: Vec<u8>, member: Vec<u8> },
    SRem { key: Vec<u8>, member: Vec<u8> },
    SIsMember { key: Vec<u8>, member: Vec<u8> },
    SMembers { key: Vec<u8> },
    SCard { key: Vec<u8> },

    // -------------------------------------------------------------------------
    // Sorted sets
    // -------------------------------------------------------------------------
    ZRevRank { key: Vec<u8>, member: Vec<u8> },
    ZCard { key: Vec<u8> },
    ZRem { key: Vec<u8>, member: Vec<u8> },

    // -------------------------------------------------------------------------
    // Lists
    // -------------------------------------------------------------------------
    RPush { key: Vec<u8>, value: Vec<u8> },
    LPush { key: Vec<u8>, value: Vec<u8> },
    LRange { key: Vec<u8>, start: i64, stop: i64 },
    LIndex { key: Vec<u8>, index: i64 },
    LPop { key: Vec<u8> },
    RPop { key: Vec<u8> },
    LTrim { key: Vec<u8>, start: i64, stop: i64 },
    LSet { key: Vec<u8>, index: i64, value: Vec<u8> },
    LRem { key: Vec<u8>, count: i64, value: Vec<u8> },
    LLen { key: Vec<u8> },
}

impl Command {
    /// Redis command name
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::SetEx { .. } => "SETEX",
            Command::Del { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::Incr { .. } => "INCR",
            Command::IncrBy { .. } => "INCRBY",
            Command::Decr { .. } => "DECR",
            Command::Expire { .. } => "EXPIRE",
            Command::HGet { .. } => "HGET",
            Command::HSet { .. } => "HSET",
            Command::HDel { .. } => "HDEL",
            Command::HGetAll { .. } => "HGETALL",
            Command::HMGet { .. } => "HMGET",
            Command::HKeys { .. } => "HKEYS",
            Command::HVals { .. } => "HVALS",
            Command::HLen { .. } => "HLEN",
            Command::HIncrBy { .. } => "HINCRBY",
            Command::HExists { .. } => "HEXISTS",
            Command::SAdd { .. } => "SADD",
            Command::SRem { .. } => "SREM",
            Command::SIsMember { .. } => "SISMEMBER",
            Command::SMembers { .. } => "SMEMBERS",
            Command::SCard { .. } => "SCARD",
            Command::ZRevRank { .. } => "ZREVRANK",
            Command::ZCard { .. } => "ZCARD",
            Command::ZRem { .. } => "ZREM",
            Command::RPush { .. } => "RPUSH",
            Command::LPush { .. } => "LPUSH",
            Command::LRange { .. } => "LRANGE",
            Command::LIndex { .. } => "LINDEX",
            Command::LPop { .. } => "LPOP",
            Command::RPop { .. } => "RPOP",
            Command::LTrim { .. } => "LTRIM",
            Command::LSet { .. } => "LSET",
            Command::LRem { .. } => "LREM",
            Command::LLen { .. } => "LLEN",
        }
    }

    /// The key used for shard routing (`None` for unrouted commands)
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Command::Ping => None,
            Command::Get { key }
            | Command::Set { key, .. }
            | Command::SetEx { key, .. }
            | Command::Del { key }
            | Command::Exists { key }
            | Command::Incr { key }
            | Command::IncrBy { key, .. }
            | Command::Decr { key }
            | Command::Expire { key, .. }
            | Command::HGet { key, .. }
            | Command::HSet { key, .. }
            | Command::HDel { key, .. }
            | Command::HGetAll { key }
            | Command::HMGet { key, .. }
            | Command::HKeys { key }
            | Command::HVals { key }
            | Command::HLen { key }
            | Command::HIncrBy { key, .. }
            | Command::HExists { key, .. }
            | Command::SAdd { key, .. }
            | Command::SRem { key, .. }
            | Command::SIsMember { key, .. }
            | Command::SMembers { key }
            | Command::SCard { key }
            | Command::ZRevRank { key, .. }
            | Command::ZCard { key }
            | Command::ZRem { key, .. }
            | Command::RPush { key, .. }
            | Command::LPush { key, .. }
            | Command::LRange { key, .. }
            | Command::LIndex { key, .. }
            | Command::LPop { key }
            | Command::RPop { key }
            | Command::LTrim { key, .. }
            | Command::LSet { key, .. }
            | Command::LRem { key, .. }
            | Command::LLen { key } => Some(key),
        }
    }

    /// Arguments following the command name, in wire order
    pub fn arguments(&self) -> Vec<Vec<u8>> {
        fn num(n: i64) -> Vec<u8> {
            n.to_string().into_bytes()
        }

        match self {
            Command::Ping => Vec::new(),
            Command::Get { key }
            | Command::Del { key }
            | Command::Exists { key }
            | Command::Incr { key }
            | Command::Decr { key }
            | Command::HGetAll { key }
            | Command::HKeys { key }
            | Command::HVals { key }
            | Command::HLen { key }
            | Command::SMembers { key }
            | Command::SCard { key }
            | Command::ZCard { key }
            | Command::LPop { key }
            | Command::RPop { key }
            | Command::LLen { key } => vec![key.clone()],
            Command::Set { key, value }
            | Command::RPush { key, value }
            | Command::LPush { key, value } => vec![key.clone(), value.clone()],
            Command::SetEx { key, seconds, value } => {
                vec![key.clone(), num(*seconds), value.clone()]
            }
            Command::IncrBy { key, delta } => vec![key.clone(), num(*delta)],
            Command::Expire { key, seconds } => vec![key.clone(), num(*seconds)],
            Command::HGet { key, field }
            | Command::HDel { key, field }
            | Command::HExists { key, field } => vec![key.clone(), field.clone()],
            Command::HSet { key, field, value } => {
                vec![key.clone(), field.clone(), value.clone()]
            }
            Command::HMGet { key, fields } => {
                let mut args = Vec::with_capacity(1 + fields.len());
                args.push(key.clone());
                args.extend(fields.iter().cloned());
                args
            }
            Command::HIncrBy { key, field, delta } => {
                vec![key.clone(), field.clone(), num(*delta)]
            }
            Command::SAdd { key, member }
            | Command::SRem { key, member }
            | Command::SIsMember { key, member }
            | Command::ZRevRank { key, member }
            | Command::ZRem { key, member } => vec![key.clone(), member.clone()],
            Command::LRange { key, start, stop } | Command::LTrim { key, start, stop } => {
                vec![key.clone(), num(*start), num(*stop)]
            }
            Command::LIndex { key, index } => vec![key.clone(), num(*index)],
            Command::LSet { key, index, value } => {
                vec![key.clone(), num(*index), value.clone()]
            }
            Command::LRem { key, count, value } => {
                vec![key.clone(), num(*count), value.clone()]
            }
        }
    }
}
