//! # shardcache
//!
//! A typed client facade over a sharded Redis deployment with:
//! - Consistent-hash routing of every key to one shard
//! - Bounded per-shard connection pools that evict broken connections
//! - String, hash, set, sorted-set, list and object commands
//! - Pipelined batches whose replies resolve in submission order
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ShardedClient                           │
//! │          (typed commands, batches, object codec)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Shard Router                             │
//! │                 (CRC32 hash ring)                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼────────────┐
//!          ▼            ▼            ▼
//!   ┌───────────┐ ┌───────────┐ ┌───────────┐
//!   │ ShardPool │ │ ShardPool │ │ ShardPool │
//!   └─────┬─────┘ └─────┬─────┘ └─────┬─────┘
//!         ▼             ▼             ▼
//!   ┌───────────┐ ┌───────────┐ ┌───────────┐
//!   │   Redis   │ │   Redis   │ │   Redis   │
//!   └───────────┘ └───────────┘ └───────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use shardcache::{Config, ShardInfo, ShardedClient};
//!
//! let config = Config::builder()
//!     .shard(ShardInfo::new("cache-a", "10.0.0.1", 6379))
//!     .shard(ShardInfo::new("cache-b", "10.0.0.2", 6379))
//!     .build();
//! let client = ShardedClient::connect(config)?;
//!
//! client.set("greeting", "hello", 60)?;
//! let replies = client.pipelined("warmup", |batch| {
//!     batch.incr_by("hits", 1).expire("hits", 300);
//! })?;
//! assert_eq!(replies.len(), 2);
//! # Ok::<(), shardcache::CacheError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod backend;
pub mod routing;
pub mod pool;
pub mod probe;
pub mod codec;
pub mod batch;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BackendError, CacheError, Result};
pub use config::{Config, PoolConfig, ShardInfo, TopologyFile};
pub use batch::Batch;
pub use client::ShardedClient;
pub use pool::PoolStats;
pub use protocol::{Command, Reply};
pub use routing::{HashRing, ShardId, ShardRouter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of shardcache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
