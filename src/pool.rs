//! Connection Pool
//!
//! One bounded pool per shard.
//!
//! ## Responsibilities
//! - Hand out at most `max_active` connections at a time, blocking callers
//!   up to `max_wait` when all are borrowed
//! - Keep up to `max_idle` healthy connections for reuse
//! - Close and forget connections returned as broken
//! - `try_acquire` borrows without waiting, for callers that already hold
//!   connections from other pools
//!
//! ## Checkout discipline
//! `acquire` returns a `PooledConnection` guard. The guard goes back to the
//! pool exactly once, when it is dropped, and is classified as broken if
//! the borrower marked it so, if replies are still unread on it, or if the
//! thread is unwinding.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::backend::{Connection, Connector};
use crate::config::{PoolConfig, ShardInfo};
use crate::error::{BackendError, CacheError, Result};
use crate::protocol::{Command, Reply};

/// Snapshot of one pool's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections currently borrowed
    pub active: usize,

    /// Connections waiting for reuse
    pub idle: usize,

    /// Connections opened since the pool was created
    pub created: u64,

    /// Connections closed because they were returned broken
    pub evicted: u64,
}

/// Mutable pool state (guarded by `ShardPool::state`)
struct PoolState {
    idle: VecDeque<Box<dyn Connection>>,
    active: usize,
}

/// Connection pool for one shard
///
/// ## Concurrency:
/// - `state`: Mutex over idle connections and the borrowed count
/// - `available`: Condvar signalled whenever a borrow slot frees up
/// - Counters are atomics read without the lock
pub struct ShardPool {
    shard: ShardInfo,

    connector: Arc<dyn Connector>,

    config: PoolConfig,

    state: Mutex<PoolState>,

    available: Condvar,

    created: AtomicU64,

    evicted: AtomicU64,
}

impl ShardPool {
    /// Create a pool and open `min_idle` connections up front
    ///
    /// Warm-up failures are logged, not fatal: the shard may come up later.
    pub fn new(shard: ShardInfo, connector: Arc<dyn Connector>, config: PoolConfig) -> Self {
        let pool = Self {
            shard,
            connector,
            config,
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                active: 0,
            }),
            available: Condvar::new(),
            created: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        };

        pool.warm_up();
        pool
    }

    fn warm_up(&self) {
        let mut opened = Vec::with_capacity(self.config.min_idle);
        for _ in 0..self.config.min_idle {
            match self.open() {
                Ok(conn) => opened.push(conn),
                Err(e) => {
                    warn!("Failed to open initial connection to {}: {}", self.shard, e);
                    break;
                }
            }
        }

        if !opened.is_empty() {
            info!("Opened {} idle connections to {}", opened.len(), self.shard);
        }
        self.state.lock().idle.extend(opened);
    }

    fn open(&self) -> std::result::Result<Box<dyn Connection>, BackendError> {
        let conn = self.connector.connect(&self.shard)?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(conn)
    }

    /// Borrow a connection, blocking while the pool is exhausted
    ///
    /// Returns `PoolExhausted` once `max_wait` elapses and
    /// `BackendOperationFailed` if a new connection cannot be opened.
    pub fn acquire(self: &Arc<Self>) -> Result<PooledConnection> {
        let started = Instant::now();
        let deadline = self.config.max_wait_ms.map(|ms| started + Duration::from_millis(ms));

        let mut state = self.state.lock();
        loop {
            if let Some(conn) = self.checkout(&mut state)? {
                return Ok(conn);
            }

            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut state, deadline).timed_out() {
                        // A slot may have freed up right at the deadline
                        return self.checkout(&mut state)?.ok_or_else(|| {
                            CacheError::PoolExhausted {
                                shard: self.shard.name.clone(),
                                waited_ms: started.elapsed().as_millis() as u64,
                            }
                        });
                    }
                }
                None => self.available.wait(&mut state),
            }
        }
    }

    /// Borrow a connection without waiting
    ///
    /// Returns `Ok(None)` when every connection is borrowed.
    pub fn try_acquire(self: &Arc<Self>) -> Result<Option<PooledConnection>> {
        let mut state = self.state.lock();
        self.checkout(&mut state)
    }

    /// Hand out an idle connection or open a new one if a slot is free
    fn checkout(
        self: &Arc<Self>,
        state: &mut MutexGuard<'_, PoolState>,
    ) -> Result<Option<PooledConnection>> {
        // Reuse an idle connection, skipping any that died while parked
        while let Some(conn) = state.idle.pop_front() {
            if conn.is_open() {
                state.active += 1;
                return Ok(Some(PooledConnection::new(Arc::clone(self), conn)));
            }
            self.evicted.fetch_add(1, Ordering::SeqCst);
            debug!("Discarding closed idle connection to {}", self.shard);
        }

        if state.active >= self.config.max_active {
            return Ok(None);
        }

        // Reserve the slot, then connect without holding the lock
        state.active += 1;
        match MutexGuard::unlocked(state, || self.open()) {
            Ok(conn) => Ok(Some(PooledConnection::new(Arc::clone(self), conn))),
            Err(cause) => {
                state.active -= 1;
                self.available.notify_one();
                Err(CacheError::backend(self.shard.name.clone(), cause))
            }
        }
    }

    /// Take back a borrowed connection
    fn release(&self, conn: Box<dyn Connection>, healthy: bool) {
        let mut state = self.state.lock();
        state.active = state.active.saturating_sub(1);

        if healthy && conn.is_open() {
            if state.idle.len() < self.config.max_idle {
                state.idle.push_back(conn);
            }
            // Surplus healthy connections are simply closed
        } else {
            self.evicted.fetch_add(1, Ordering::SeqCst);
            debug!("Evicted broken connection to {}", self.shard);
        }

        drop(state);
        self.available.notify_one();
    }

    /// The shard this pool connects to
    pub fn shard(&self) -> &ShardInfo {
        &self.shard
    }

    /// Current counters
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            active: state.active,
            idle: state.idle.len(),
            created: self.created.load(Ordering::SeqCst),
            evicted: self.evicted.load(Ordering::SeqCst),
        }
    }
}

/// A borrowed connection, returned to its pool on drop
pub struct PooledConnection {
    pool: Arc<ShardPool>,

    /// Always `Some` until drop
    conn: Option<Box<dyn Connection>>,

    broken: bool,

    /// Commands sent whose replies have not been read
    pending: usize,
}

impl PooledConnection {
    fn new(pool: Arc<ShardPool>, conn: Box<dyn Connection>) -> Self {
        Self {
            pool,
            conn: Some(conn),
            broken: false,
            pending: 0,
        }
    }

    /// Shard this connection belongs to
    pub fn shard(&self) -> &ShardInfo {
        self.pool.shard()
    }

    /// Flag the connection so it is evicted instead of reused
    pub fn mark_broken(&mut self) {
        self.broken = true;
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Replies still owed by the server
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Send without waiting for the reply; marks the connection broken on failure
    pub fn send(&mut self, command: &Command) -> std::result::Result<(), BackendError> {
        let conn = self.conn.as_mut().ok_or(BackendError::NoPendingReply)?;
        match conn.send(command) {
            Ok(()) => {
                self.pending += 1;
                Ok(())
            }
            Err(e) => {
                self.broken = true;
                Err(e)
            }
        }
    }

    /// Read the next reply; marks the connection broken on failure
    pub fn recv(&mut self) -> std::result::Result<Reply, BackendError> {
        if self.pending == 0 {
            return Err(BackendError::NoPendingReply);
        }
        let conn = self.conn.as_mut().ok_or(BackendError::NoPendingReply)?;
        let result = conn.recv();
        self.pending -= 1;
        if result.is_err() {
            self.broken = true;
        }
        result
    }

    /// Send one command and wait for its reply
    pub fn execute(&mut self, command: &Command) -> std::result::Result<Reply, BackendError> {
        self.send(command)?;
        self.recv()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let healthy = !self.broken && self.pending == 0 && !std::thread::panicking();
            self.pool.release(conn, healthy);
        }
    }
}
