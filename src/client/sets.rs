//! Set and sorted-set commands

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{bytes, ShardedClient};
use crate::codec::{decode_object, encode_object};
use crate::error::Result;
use crate::protocol::Command;

impl ShardedClient {
    // -------------------------------------------------------------------------
    // Sets
    // -------------------------------------------------------------------------

    /// SADD; `true` when the member is new
    pub fn sadd(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<bool> {
        self.run(
            "sadd",
            Command::SAdd {
                key: bytes(key),
                member: bytes(member),
            },
        )
    }

    /// SREM; `true` when the member was present
    pub fn srem(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<bool> {
        self.run(
            "srem",
            Command::SRem {
                key: bytes(key),
                member: bytes(member),
            },
        )
    }

    pub fn sismember(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<bool> {
        self.run(
            "sismember",
            Command::SIsMember {
                key: bytes(key),
                member: bytes(member),
            },
        )
    }

    pub fn smembers(&self, key: impl AsRef<[u8]>) -> Result<HashSet<String>> {
        self.run("smembers", Command::SMembers { key: bytes(key) })
    }

    pub fn scard(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.run("scard", Command::SCard { key: bytes(key) })
    }

    /// SADD with an encoded object as the member
    pub fn sadd_object<T: Serialize>(&self, key: impl AsRef<[u8]>, member: &T) -> Result<bool> {
        let member = encode_object(member)?;
        self.run(
            "sadd_object",
            Command::SAdd {
                key: bytes(key),
                member,
            },
        )
    }

    pub fn sismember_object<T: Serialize>(
        &self,
        key: impl AsRef<[u8]>,
        member: &T,
    ) -> Result<bool> {
        let member = encode_object(member)?;
        self.run(
            "sismember_object",
            Command::SIsMember {
                key: bytes(key),
                member,
            },
        )
    }

    /// SMEMBERS, decoding every member
    pub fn smembers_object<T: DeserializeOwned>(&self, key: impl AsRef<[u8]>) -> Result<Vec<T>> {
        let members: Vec<Vec<u8>> =
            self.run("smembers_object", Command::SMembers { key: bytes(key) })?;
        members.iter().map(|m| decode_object(m)).collect()
    }

    // -------------------------------------------------------------------------
    // Sorted sets
    // -------------------------------------------------------------------------

    /// ZREVRANK; 0 is the highest score, `None` when absent
    pub fn zrevrank(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<Option<i64>> {
        self.run(
            "zrevrank",
            Command::ZRevRank {
                key: bytes(key),
                member: bytes(member),
            },
        )
    }

    pub fn zcard(&self, key: impl AsRef<[u8]>) -> Result<i64> {
        self.run("zcard", Command::ZCard { key: bytes(key) })
    }

    /// ZREM; `true` when the member was present
    pub fn zrem(&self, key: impl AsRef<[u8]>, member: impl AsRef<[u8]>) -> Result<bool> {
        self.run(
            "zrem",
            Command::ZRem {
                key: bytes(key),
                member: bytes(member),
            },
        )
    }
}
