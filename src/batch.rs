//! Batch Pipeline
//!
//! A `Batch` queues commands for any number of shards and sends each one
//! as soon as it is enqueued, without waiting for replies. Replies are read
//! back only when the batch is resolved, in the exact order the commands
//! were enqueued.
//!
//! ## Lifecycle
//! ```text
//! client.batch(label) -> enqueue* -> resolve()   (consumes the batch)
//! ```
//!
//! ## Failure handling
//! - A failed enqueue poisons the batch: later enqueues are ignored and
//!   `resolve` reports the recorded failure
//! - A failed read fails the whole batch; the connection it happened on is
//!   marked broken
//! - Connections still owing replies when the batch ends are evicted by
//!   their drop guard
//! - Commands already applied on other shards are not rolled back
//!
//! ## Pool contention
//! A batch never blocks on a pool while it holds connections. When the
//! next shard's pool is exhausted, the batch first reads every reply it is
//! owed, returns its connections, and only then waits. The cached replies
//! still resolve in enqueue order, so two batches touching the same shards
//! in opposite order cannot wait on each other.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::client::ShardedClient;
use crate::error::{CacheError, Result};
use crate::pool::PooledConnection;
use crate::probe::{self, Probe};
use crate::protocol::{Command, Reply};
use crate::routing::ShardId;

/// The outcome of one enqueued command, read on first access
struct DeferredReply {
    shard: ShardId,

    /// Cached once read
    value: Option<Reply>,

    probe: Option<Probe>,
}

impl DeferredReply {
    fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// Read the reply from `conn`, or return the cached one
    fn get(&mut self, conn: &mut PooledConnection) -> Result<&Reply> {
        if self.value.is_none() {
            let outcome = conn.recv();
            if let Some(probe) = self.probe.take() {
                probe.finish(outcome.is_ok());
            }
            let reply = outcome.map_err(|e| CacheError::backend(conn.shard().name.clone(), e))?;
            self.value = Some(reply);
        }

        self.value
            .as_ref()
            .ok_or_else(|| CacheError::InvalidArgument("reply was not cached".to_string()))
    }

    fn take(&mut self) -> Option<Reply> {
        self.value.take()
    }
}

/// An ordered, single-use pipeline of commands
pub struct Batch<'a> {
    client: &'a ShardedClient,

    /// Diagnostic label, always carries the pipeline prefix
    label: String,

    /// One borrowed connection per shard touched, acquired lazily
    connections: HashMap<ShardId, PooledConnection>,

    replies: Vec<DeferredReply>,

    /// First enqueue failure; poisons the batch
    failure: Option<CacheError>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(client: &'a ShardedClient, label: &str) -> Result<Self> {
        if label.is_empty() {
            return Err(CacheError::InvalidArgument(
                "batch label must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client,
            label: probe::pipeline_label(label),
            connections: HashMap::new(),
            replies: Vec::new(),
            failure: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Commands sent so far
    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    /// Whether an enqueue has failed
    pub fn is_poisoned(&self) -> bool {
        self.failure.is_some()
    }

    /// Route `command` by its key and send it on that shard's connection
    pub fn enqueue(&mut self, command: Command) -> &mut Self {
        if self.failure.is_none() {
            if let Err(e) = self.dispatch(command) {
                warn!("Batch {} failed to enqueue: {}", self.label, e);
                self.failure = Some(e);
            }
        }
        self
    }

    fn dispatch(&mut self, command: Command) -> Result<()> {
        let key = command.key().ok_or_else(|| {
            CacheError::InvalidArgument(format!("{} has no key to route by", command.name()))
        })?;
        let client = self.client;
        let shard = client.route(key);

        if !self.connections.contains_key(&shard) {
            let pool = client.pool(shard)?;
            let conn = match pool.try_acquire()? {
                Some(conn) => conn,
                None => {
                    self.release_all()?;
                    pool.acquire()?
                }
            };
            self.connections.insert(shard, conn);
        }
        let conn = self.connections.get_mut(&shard).ok_or_else(|| {
            CacheError::InvalidArgument(format!("no connection held for shard {}", shard))
        })?;

        let shard_name = conn.shard().name.clone();
        let probe = Probe::start(probe::item_name(
            &shard_name,
            &probe::pipeline_command(command.name()),
        ));
        if let Err(e) = conn.send(&command) {
            probe.finish(false);
            return Err(CacheError::backend(shard_name, e));
        }

        self.replies.push(DeferredReply {
            shard,
            value: None,
            probe: Some(probe),
        });
        Ok(())
    }

    /// Read every outstanding reply and give all held connections back
    ///
    /// Called before blocking on an exhausted pool so the batch never waits
    /// while holding connections other batches may need.
    fn release_all(&mut self) -> Result<()> {
        for deferred in self.replies.iter_mut().filter(|d| !d.is_resolved()) {
            let conn = self.connections.get_mut(&deferred.shard).ok_or_else(|| {
                CacheError::InvalidArgument(format!(
                    "no connection held for shard {}",
                    deferred.shard
                ))
            })?;
            deferred.get(conn)?;
        }

        debug!(
            "Batch {} released {} connections before waiting",
            self.label,
            self.connections.len()
        );
        self.connections.clear();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Typed helpers
    // -------------------------------------------------------------------------

    pub fn set(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> &mut Self {
        self.enqueue(Command::Set {
            key: key.as_ref().to_vec(),
            value: value.as_ref().to_vec(),
        })
    }

    pub fn get(&mut self, key: impl AsRef<[u8]>) -> &mut Self {
        self.enqueue(Command::Get {
            key: key.as_ref().to_vec(),
        })
    }

    pub fn del(&mut self, key: impl AsRef<[u8]>) -> &mut Self {
        self.enqueue(Command::Del {
            key: key.as_ref().to_vec(),
        })
    }

    pub fn expire(&mut self, key: impl AsRef<[u8]>, seconds: i64) -> &mut Self {
        self.enqueue(Command::Expire {
            key: key.as_ref().to_vec(),
            seconds,
        })
    }

    pub fn incr_by(&mut self, key: impl AsRef<[u8]>, delta: i64) -> &mut Self {
        self.enqueue(Command::IncrBy {
            key: key.as_ref().to_vec(),
            delta,
        })
    }

    pub fn hincr_by(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        delta: i64,
    ) -> &mut Self {
        self.enqueue(Command::HIncrBy {
            key: key.as_ref().to_vec(),
            field: field.as_ref().to_vec(),
            delta,
        })
    }

    pub fn hset(
        &mut self,
        key: impl AsRef<[u8]>,
        field: impl AsRef<[u8]>,
        value: impl AsRef<[u8]>,
    ) -> &mut Self {
        self.enqueue(Command::HSet {
            key: key.as_ref().to_vec(),
            field: field.as_ref().to_vec(),
            value: value.as_ref().to_vec(),
        })
    }

    // -------------------------------------------------------------------------
    // Resolution
    // -------------------------------------------------------------------------

    /// Read every reply in enqueue order
    ///
    /// Fails with `BatchFailed` if any enqueue or read failed.
    pub fn resolve(mut self) -> Result<Vec<Reply>> {
        let dispatched = self.replies.len();

        if let Some(cause) = self.failure.take() {
            return Err(self.fail(dispatched, cause));
        }

        for i in 0..self.replies.len() {
            if self.replies[i].is_resolved() {
                continue;
            }
            let shard = self.replies[i].shard;
            let outcome = match self.connections.get_mut(&shard) {
                Some(conn) => self.replies[i].get(conn).map(|_| ()),
                None => Err(CacheError::InvalidArgument(format!(
                    "no connection held for shard {}",
                    shard
                ))),
            };

            if let Err(cause) = outcome {
                return Err(self.fail(dispatched, cause));
            }
        }

        let values = self
            .replies
            .iter_mut()
            .map(|deferred| deferred.take().unwrap_or(Reply::Nil))
            .collect();
        Ok(values)
    }

    fn fail(&self, dispatched: usize, cause: CacheError) -> CacheError {
        warn!(
            "Batch {} failed after {} dispatched commands: {}",
            self.label, dispatched, cause
        );
        CacheError::BatchFailed {
            label: self.label.clone(),
            dispatched,
            cause: Box::new(cause),
        }
    }
}
