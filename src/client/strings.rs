//! String commands

use super::{bytes, ShardedClient};
use crate::error::Result;
use crate::protocol::Command;

impl ShardedClient {
    /// GET as UTF-8 text; `None` when the key is missing
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.run("get", Command::Get { key: bytes(key) })
    }

    /// GET as raw bytes
    pub fn get_bytes(&self, key: impl AsRef<[u8]>) -> Result<Option<Vec<u8>>> {
        self.run("get_bytes", Command::Get { key: bytes(key) })
    }

    /// SET, or SETEX when `expire_seconds` is positive
    pub fn set(&self, key: impl AsRef<[u8]>, value: &str, expire_seconds: i64) -> Result<()> {
        self.set_bytes(key, value.as_bytes(), expire_seconds)
    }

    /// SET / SETEX with a binary value
    pub fn set_bytes(
        &self,
        key: impl AsRef<[u8]>,
        value: &[u8],
        expire_seconds: i64,
    ) -> Result<()> {
        let key = bytes(key);
        let value = value.to_vec();
        if expire_seconds > 0 {
            self.run(
                "setex",
                Command::SetEx {
                    key,
                    seconds: expire_seconds,
                    value,
                },
            )
        } else {
            self.run("set", Command::Set { key, value })
        }
    }

    /// DEL; returns the number of keys removed
    pub fn del(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.run("del", Command::Del { key: bytes(key) })
    }

    pub fn exists(&self, key: impl AsRef<[u8]>) -> Result<bool> {
        self.run("exists", Command::Exists { key: bytes(key) })
    }

    /// INCR; a missing key counts from 0
    pub fn incr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.run("incr", Command::Incr { key: bytes(key) })
    }

    /// INCRBY `delta`, then EXPIRE when `expire_seconds` is positive
    pub fn incr_ex(&self, key: impl AsRef<[u8]>, delta: i64, expire_seconds: i64) -> Result<i64> {
        let key = bytes(key);
        self.run_with_expiry(
            "incr_expire",
            Command::IncrBy {
                key: key.clone(),
                delta,
            },
            &key,
            expire_seconds,
        )
    }

    pub fn decr(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.run("decr", Command::Decr { key: bytes(key) })
    }

    /// EXPIRE; `false` when the key does not exist
    pub fn expire(&self, key: impl AsRef<[u8]>, seconds: i64) -> Result<bool> {
        self.run(
            "expire",
            Command::Expire {
                key: bytes(key),
                seconds,
            },
        )
    }

    /// EXPIRE on a binary key
    pub fn expire_bytes(&self, key: &[u8], seconds: i64) -> Result<bool> {
        self.expire(key, seconds)
    }
}
