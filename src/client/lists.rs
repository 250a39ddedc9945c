//! List commands

use super::{bytes, ShardedClient};
use crate::error::Result;
use crate::protocol::Command;

impl ShardedClient {
    /// RPUSH; returns the new length
    pub fn rpush(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<i64> {
        self.run(
            "rpush",
            Command::RPush {
                key: bytes(key),
                value: bytes(value),
            },
        )
    }

    /// LPUSH; returns the new length
    pub fn lpush(&self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Result<i64> {
        self.run(
            "lpush",
            Command::LPush {
                key: bytes(key),
                value: bytes(value),
            },
        )
    }

    /// LRANGE with inclusive, possibly negative, bounds
    pub fn lrange(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Result<Vec<String>> {
        self.run(
            "lrange",
            Command::LRange {
                key: bytes(key),
                start,
                stop,
            },
        )
    }

    pub fn lindex(&self, key: impl AsRef<[u8]>, index: i64) -> Result<Option<String>> {
        self.run(
            "lindex",
            Command::LIndex {
                key: bytes(key),
                index,
            },
        )
    }

    /// LPOP; `None` on an empty or missing list
    pub fn lpop(&self, key: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.run("lpop", Command::LPop { key: bytes(key) })
    }

    pub fn rpop(&self, key: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.run("rpop", Command::RPop { key: bytes(key) })
    }

    pub fn ltrim(&self, key: impl AsRef<[u8]>, start: i64, stop: i64) -> Result<()> {
        self.run(
            "ltrim",
            Command::LTrim {
                key: bytes(key),
                start,
                stop,
            },
        )
    }

    /// LSET; fails with a server error when the index is out of range
    pub fn lset(&self, key: impl AsRef<[u8]>, index: i64, value: impl AsRef<[u8]>) -> Result<()> {
        self.run(
            "lset",
            Command::LSet {
                key: bytes(key),
                index,
                value: bytes(value),
            },
        )
    }

    /// LREM; returns the number of elements removed
    pub fn lrem(&self, key: impl AsRef<[u8]>, count: i64, value: impl AsRef<[u8]>) -> Result<i64> {
        self.run(
            "lrem",
            Command::LRem {
                key: bytes(key),
                count,
                value: bytes(value),
            },
        )
    }

    pub fn llen(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.run("llen", Command::LLen { key: bytes(key) })
    }
}
