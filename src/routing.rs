//! Shard routing
//!
//! Maps every key to exactly one shard. The default router is a
//! consistent-hash ring: each shard owns `160 * weight` virtual nodes and a
//! key belongs to the first virtual node at or after its hash, wrapping
//! around at the end of the ring.

use std::collections::BTreeMap;

use crate::config::ShardInfo;
use crate::error::{CacheError, Result};

/// Index of a shard in the client's topology
pub type ShardId = usize;

/// Key to shard mapping
///
/// Must be deterministic: the same key always routes to the same shard for
/// a given topology.
pub trait ShardRouter: Send + Sync {
    fn route(&self, key: &[u8]) -> ShardId;

    fn shard_count(&self) -> usize;
}

/// Consistent-hash ring keyed by CRC32
pub struct HashRing {
    /// Virtual node hash -> owning shard
    ring: BTreeMap<u32, ShardId>,

    shard_count: usize,
}

impl HashRing {
    /// Virtual nodes per unit of weight
    pub const VIRTUAL_NODES: u32 = 160;

    /// Build the ring for `shards` (indices become shard ids)
    pub fn new(shards: &[ShardInfo]) -> Result<Self> {
        if shards.is_empty() {
            return Err(CacheError::Configuration(
                "cannot build a hash ring without shards".to_string(),
            ));
        }

        let mut ring = BTreeMap::new();
        for (id, shard) in shards.iter().enumerate() {
            let nodes = Self::VIRTUAL_NODES * shard.weight.max(1);
            for n in 0..nodes {
                // Node names depend only on name and weight; list order never moves keys
                let node = format!("{}*{}{}", shard.name, shard.weight, n);
                ring.insert(Self::hash(node.as_bytes()), id);
            }
        }

        Ok(Self {
            ring,
            shard_count: shards.len(),
        })
    }

    fn hash(bytes: &[u8]) -> u32 {
        crc32fast::hash(bytes)
    }

    /// Number of virtual nodes on the ring
    pub fn node_count(&self) -> usize {
        self.ring.len()
    }
}

impl ShardRouter for HashRing {
    fn route(&self, key: &[u8]) -> ShardId {
        let hash = Self::hash(key);
        self.ring
            .range(hash..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, id)| *id)
            .unwrap_or(0)
    }

    fn shard_count(&self) -> usize {
        self.shard_count
    }
}
