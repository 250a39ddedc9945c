//! Object commands
//!
//! Values are encoded before the write and decoded after the read. Codec
//! failures are reported as `Codec` and never touch the connection.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{bytes, ShardedClient};
use crate::codec::{decode_optional, encode_object};
use crate::error::Result;
use crate::protocol::Command;

impl ShardedClient {
    /// Store an encoded object, with EXPIRE in the same batch when
    /// `expire_seconds` is positive
    pub fn set_object<T: Serialize>(
        &self,
        key: impl AsRef<[u8]>,
        value: &T,
        expire_seconds: i64,
    ) -> Result<()> {
        let value = encode_object(value)?;
        let key = bytes(key);
        self.run_with_expiry(
            "set_object",
            Command::Set {
                key: key.clone(),
                value,
            },
            &key,
            expire_seconds,
        )
    }

    /// Read and decode an object
    ///
    /// A positive `expire_seconds` refreshes the key's TTL in the same batch
    /// (sliding expiry).
    pub fn get_object<T: DeserializeOwned>(
        &self,
        key: impl AsRef<[u8]>,
        expire_seconds: i64,
    ) -> Result<Option<T>> {
        let key = bytes(key);
        let raw: Option<Vec<u8>> = self.run_with_expiry(
            "get_object",
            Command::Get { key: key.clone() },
            &key,
            expire_seconds,
        )?;
        decode_optional(raw)
    }
}
