//! Protocol Module
//!
//! Commands sent to shards and replies read back from them.
//!
//! ## Command set
//! The facade exposes a closed set of commands:
//! - strings:      GET SET SETEX DEL EXISTS INCR INCRBY DECR EXPIRE
//! - hashes:       HGET HSET HDEL HGETALL HMGET HKEYS HVALS HLEN HINCRBY HEXISTS
//! - sets:         SADD SREM SISMEMBER SMEMBERS SCARD
//! - sorted sets:  ZREVRANK ZCARD ZREM
//! - lists:        RPUSH LPUSH LRANGE LINDEX LPOP RPOP LTRIM LSET LREM LLEN
//! - health:       PING
//!
//! ## Replies
//! ```text
//! Nil | Int(i64) | Bytes(Vec<u8>) | Status(String) | Array(Vec<Reply>)
//! ```
//! Error replies from a shard never become a `Reply`; they surface as
//! `BackendError::Server`.

mod command;
mod reply;
mod codec;

pub use command::Command;
pub use reply::{FromReply, Reply};
pub use codec::{decode_value, encode_command, to_redis_cmd};
