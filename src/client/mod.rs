//! Command Facade
//!
//! `ShardedClient` is the entry point of the crate: one typed method per
//! supported command, each routed to the shard owning its key.
//!
//! ## Call discipline
//! ```text
//! route(key) -> acquire(pool[shard]) -> send -> recv -> release
//! ```
//! Exactly one connection is borrowed per call and returned exactly once by
//! its drop guard. A backend failure marks the connection broken so it is
//! evicted instead of reused, and surfaces as `BackendOperationFailed`
//! naming the shard. Nothing is retried.
//!
//! Operations that also set an expiry (`incr_ex`, `hset_ex`, `set_object`
//! ...) run as a two-command batch when the expiry is positive and as the
//! primary command alone otherwise.
//!
//! The commands themselves are grouped by data type in the submodules.

mod hash;
mod lists;
mod objects;
mod sets;
mod strings;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{Connector, RedisConnector};
use crate::batch::Batch;
use crate::config::{Config, ShardInfo};
use crate::error::{BackendError, CacheError, Result};
use crate::pool::{PoolStats, ShardPool};
use crate::probe::{self, Probe};
use crate::protocol::{Command, FromReply, Reply};
use crate::routing::{HashRing, ShardId, ShardRouter};

/// Sharded cache client
///
/// Cheap to share: wrap it in an `Arc` and call it from any thread.
pub struct ShardedClient {
    /// One pool per shard, indexed by `ShardId`
    pools: Vec<Arc<ShardPool>>,

    router: Arc<dyn ShardRouter>,
}

impl ShardedClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Connect to the Redis shards described by `config`
    pub fn connect(config: Config) -> Result<Self> {
        let connector = Arc::new(RedisConnector::new(config.socket_timeout_ms));
        Self::with_connector(config, connector)
    }

    /// Build a client whose pools open connections through `connector`
    pub fn with_connector(config: Config, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;
        let router = Arc::new(HashRing::new(&config.shards)?);
        Self::with_router(config, connector, router)
    }

    /// Build a client with a custom key-to-shard mapping
    pub fn with_router(
        config: Config,
        connector: Arc<dyn Connector>,
        router: Arc<dyn ShardRouter>,
    ) -> Result<Self> {
        config.validate()?;
        if router.shard_count() != config.shards.len() {
            return Err(CacheError::Configuration(format!(
                "router knows {} shards but the topology has {}",
                router.shard_count(),
                config.shards.len()
            )));
        }

        let pools = config
            .shards
            .iter()
            .map(|shard| {
                Arc::new(ShardPool::new(
                    shard.clone(),
                    Arc::clone(&connector),
                    config.pool.clone(),
                ))
            })
            .collect::<Vec<_>>();

        info!(
            "Sharded client ready: {} shards, max {} connections each",
            pools.len(),
            config.pool.max_active
        );

        Ok(Self { pools, router })
    }

    // -------------------------------------------------------------------------
    // Topology
    // -------------------------------------------------------------------------

    pub fn shard_count(&self) -> usize {
        self.pools.len()
    }

    /// Shard with id `id`
    pub fn shard(&self, id: ShardId) -> Option<&ShardInfo> {
        self.pools.get(id).map(|pool| pool.shard())
    }

    /// Shard owning `key`
    ///
    /// Fails with `Configuration` if a custom router answers with an id
    /// outside the topology.
    pub fn shard_for(&self, key: impl AsRef<[u8]>) -> Result<&ShardInfo> {
        Ok(self.pool(self.route(key.as_ref()))?.shard())
    }

    /// Pool counters, in shard order
    pub fn pool_stats(&self) -> Vec<PoolStats> {
        self.pools.iter().map(|pool| pool.stats()).collect()
    }

    /// PING every shard
    pub fn ping_all(&self) -> Vec<(String, Result<()>)> {
        (0..self.pools.len())
            .map(|id| {
                let outcome = self.run_on::<()>(id, "ping", Command::Ping);
                if let Err(e) = &outcome {
                    warn!("Ping failed: {}", e);
                }
                (self.pools[id].shard().name.clone(), outcome)
            })
            .collect()
    }

    pub(crate) fn route(&self, key: &[u8]) -> ShardId {
        self.router.route(key)
    }

    pub(crate) fn pool(&self, id: ShardId) -> Result<&Arc<ShardPool>> {
        self.pools.get(id).ok_or_else(|| {
            CacheError::Configuration(format!("router returned unknown shard {}", id))
        })
    }

    // -------------------------------------------------------------------------
    // Batching
    // -------------------------------------------------------------------------

    /// Start a batch labelled `label`
    pub fn batch(&self, label: &str) -> Result<Batch<'_>> {
        Batch::new(self, label)
    }

    /// Run `body` against a fresh batch and resolve it
    pub fn pipelined<F>(&self, label: &str, body: F) -> Result<Vec<Reply>>
    where
        F: FnOnce(&mut Batch<'_>),
    {
        let mut batch = self.batch(label)?;
        body(&mut batch);
        batch.resolve()
    }

    // -------------------------------------------------------------------------
    // Execution
    // -------------------------------------------------------------------------

    /// Route `command` by its key and run it
    fn run<T: FromReply>(&self, operation: &str, command: Command) -> Result<T> {
        let shard = match command.key() {
            Some(key) => self.route(key),
            None => {
                return Err(CacheError::InvalidArgument(format!(
                    "{} has no key to route by",
                    command.name()
                )))
            }
        };
        self.run_on(shard, operation, command)
    }

    /// Run one command on shard `id`, evicting the connection on failure
    fn run_on<T: FromReply>(&self, id: ShardId, operation: &str, command: Command) -> Result<T> {
        let pool = self.pool(id)?;
        let shard_name = &pool.shard().name;
        let probe = Probe::start(probe::item_name(
            shard_name,
            &probe::operation_name(operation),
        ));

        let mut conn = match pool.acquire() {
            Ok(conn) => conn,
            Err(e) => {
                probe.finish(false);
                return Err(e);
            }
        };

        let outcome = conn
            .execute(&command)
            .and_then(|reply| reply.into_value::<T>());

        match outcome {
            Ok(value) => {
                probe.finish(true);
                Ok(value)
            }
            Err(cause) => {
                conn.mark_broken();
                probe.finish(false);
                debug!("{} failed on shard {}: {}", command.name(), shard_name, cause);
                Err(CacheError::backend(shard_name.clone(), cause))
            }
        }
    }

    /// Run `primary`, followed by EXPIRE on `key` when `expire_seconds` is positive
    fn run_with_expiry<T: FromReply>(
        &self,
        operation: &str,
        primary: Command,
        key: &[u8],
        expire_seconds: i64,
    ) -> Result<T> {
        if expire_seconds <= 0 {
            return self.run(operation, primary);
        }

        let replies = self
            .pipelined(operation, |batch| {
                batch.enqueue(primary).expire(key, expire_seconds);
            })
            .map_err(CacheError::into_cause)?;

        let shard_name = self.shard_for(key)?.name.clone();
        let first = replies
            .into_iter()
            .next()
            .ok_or_else(|| CacheError::backend(shard_name.clone(), BackendError::NoPendingReply))?;
        first
            .into_value::<T>()
            .map_err(|e| CacheError::backend(shard_name, e))
    }
}

/// Owned copy of a key or value argument
fn bytes(value: impl AsRef<[u8]>) -> Vec<u8> {
    value.as_ref().to_vec()
}

