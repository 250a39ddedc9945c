//! Hash commands

use std::collections::HashMap;

use super::{bytes, ShardedClient};
use crate::error::{CacheError, Result};
use crate::protocol::Command;

impl ShardedClient {
    pub fn hget(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<Option<String>> {
        self.run(
            "hget",
            Command::HGet {
                key: bytes(key),
                field: bytes(field),
            },
        )
    }

    pub fn hget_bytes(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
    ) -> Result<Option<Vec<u8>>> {
        self.run(
            "hget_bytes",
            Command::HGet {
                key: bytes(key),
                field: bytes(field),
            },
        )
    }

    /// HSET; `true` when the field is new
    pub fn hset(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>, value: &str) -> Result<bool> {
        self.hset_bytes(key, field, value.as_bytes())
    }

    pub fn hset_bytes(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: &[u8],
    ) -> Result<bool> {
        self.run(
            "hset",
            Command::HSet {
                key: bytes(key),
                field: bytes(field),
                value: value.to_vec(),
            },
        )
    }

    /// HSET, then EXPIRE on the whole hash when `expire_seconds` is positive
    pub fn hset_ex(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: &str,
        expire_seconds: i64,
    ) -> Result<bool> {
        let key = bytes(key);
        self.run_with_expiry(
            "hset_expire",
            Command::HSet {
                key: key.clone(),
                field: bytes(field),
                value: value.as_bytes().to_vec(),
            },
            &key,
            expire_seconds,
        )
    }

    /// HDEL; returns the number of fields removed
    pub fn hdel(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<i64> {
        self.run(
            "hdel",
            Command::HDel {
                key: bytes(key),
                field: bytes(field),
            },
        )
    }

    pub fn hdel_bytes(&self, key: &[u8], field: &[u8]) -> Result<i64> {
        self.hdel(key, field)
    }

    /// HGETALL; empty when the key is missing
    pub fn hgetall(&self, key: impl AsRef<[u8]>) -> Result<HashMap<String, String>> {
        self.run("hgetall", Command::HGetAll { key: bytes(key) })
    }

    /// HMGET; one entry per requested field, `None` for missing fields
    pub fn hmget<F: AsRef<[u8]>>(
        &self,
        key: impl AsRef<[u8]>,
        fields: &[F],
    ) -> Result<Vec<Option<String>>> {
        if fields.is_empty() {
            return Err(CacheError::InvalidArgument(
                "hmget needs at least one field".to_string(),
            ));
        }
        self.run(
            "hmget",
            Command::HMGet {
                key: bytes(key),
                fields: fields.iter().map(bytes).collect(),
            },
        )
    }

    pub fn hkeys(&self, key: impl AsRef<[u8]>) -> Result<Vec<String>> {
        self.run("hkeys", Command::HKeys { key: bytes(key) })
    }

    pub fn hvals(&self, key: impl AsRef<[u8]>) -> Result<Vec<String>> {
        self.run("hvals", Command::HVals { key: bytes(key) })
    }

    pub fn hlen(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.run("hlen", Command::HLen { key: bytes(key) })
    }

    /// HINCRBY; returns the new value
    pub fn hincr(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>, delta: i64) -> Result<i64> {
        self.run(
            "hincr",
            Command::HIncrBy {
                key: bytes(key),
                field: bytes(field),
                delta,
            },
        )
    }

    /// HINCRBY, then EXPIRE on the whole hash when `expire_seconds` is positive
    pub fn hincr_ex(
        &self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: i64,
        expire_seconds: i64,
    ) -> Result<i64> {
        let key = bytes(key);
        self.run_with_expiry(
            "hincr_expire",
            Command::HIncrBy {
                key: key.clone(),
                field: bytes(field),
                delta,
            },
            &key,
            expire_seconds,
        )
    }

    pub fn hexists(&self, key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Result<bool> {
        self.run(
            "hexists",
            Command::HExists {
                key: bytes(key),
                field: bytes(field),
            },
        )
    }
}
