//! In-process backend
//!
//! A `MemoryCluster` holds one `MemoryNode` per shard address. Nodes
//! execute commands at send time (the moment a real server would apply
//! them) and queue the reply on the connection until it is read, so
//! pipelining and partial batch application behave as they do against
//! Redis.
//!
//! Nodes can be taken down to simulate transport failures: connects are
//! refused and every send or receive on an existing connection fails with
//! a reset.

mod store;

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::ShardInfo;
use crate::error::BackendError;
use crate::protocol::{Command, Reply};

use super::{Connection, Connector};
use store::Keyspace;

/// One in-memory shard
#[derive(Debug, Default)]
pub struct MemoryNode {
    keyspace: Mutex<Keyspace>,

    /// Names of every command applied, in arrival order
    log: Mutex<Vec<&'static str>>,

    down: AtomicBool,

    connects: AtomicUsize,
}

impl MemoryNode {
    /// Apply one command
    fn apply(&self, command: &Command) -> Result<Reply, BackendError> {
        self.log.lock().push(command.name());
        self.keyspace.lock().execute(command)
    }

    /// Command names applied so far
    pub fn command_log(&self) -> Vec<&'static str> {
        self.log.lock().clone()
    }

    pub fn clear_command_log(&self) {
        self.log.lock().clear();
    }

    /// Number of live keys
    pub fn key_count(&self) -> usize {
        self.keyspace.lock().key_count()
    }

    /// Remaining time to live of `key`
    pub fn ttl(&self, key: &[u8]) -> Option<Duration> {
        self.keyspace.lock().ttl(key)
    }

    /// Add a sorted-set member directly (the facade has no ZADD)
    pub fn zadd(&self, key: &[u8], score: f64, member: &[u8]) -> Result<bool, BackendError> {
        self.keyspace.lock().zadd(key, score, member)
    }

    /// Connections opened to this node so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn is_down(&self) -> bool {
        self.down.load(Ordering::SeqCst)
    }

    fn reset_error() -> BackendError {
        BackendError::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by memory node",
        ))
    }
}

/// Set of in-memory nodes addressed by `host:port`
#[derive(Debug, Clone, Default)]
pub struct MemoryCluster {
    nodes: Arc<Mutex<HashMap<String, Arc<MemoryNode>>>>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node for `address`, created on first use
    pub fn node(&self, address: &str) -> Arc<MemoryNode> {
        Arc::clone(
            self.nodes
                .lock()
                .entry(address.to_string())
                .or_insert_with(|| Arc::new(MemoryNode::default())),
        )
    }

    /// Node backing `shard`
    pub fn node_for(&self, shard: &ShardInfo) -> Arc<MemoryNode> {
        self.node(&shard.address())
    }

    /// Take a node down (or bring it back)
    pub fn set_down(&self, address: &str, down: bool) {
        tracing::debug!("Memory node {} down={}", address, down);
        self.node(address).down.store(down, Ordering::SeqCst);
    }

    /// Connector handing out connections to this cluster
    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            cluster: self.clone(),
        }
    }
}

/// Connector for a `MemoryCluster`
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    cluster: MemoryCluster,
}

impl Connector for MemoryConnector {
    fn connect(&self, shard: &ShardInfo) -> Result<Box<dyn Connection>, BackendError> {
        let node = self.cluster.node_for(shard);
        if node.is_down() {
            return Err(BackendError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("memory node {} is down", shard),
            )));
        }
        node.connects.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryConnection {
            node,
            replies: VecDeque::new(),
            open: true,
        }))
    }
}

/// Connection to one memory node
struct MemoryConnection {
    node: Arc<MemoryNode>,

    /// Replies applied but not yet read
    replies: VecDeque<Result<Reply, BackendError>>,

    open: bool,
}

impl Connection for MemoryConnection {
    fn send(&mut self, command: &Command) -> Result<(), BackendError> {
        if !self.open || self.node.is_down() {
            self.open = false;
            return Err(MemoryNode::reset_error());
        }
        let reply = self.node.apply(command);
        self.replies.push_back(reply);
        Ok(())
    }

    fn recv(&mut self) -> Result<Reply, BackendError> {
        if !self.open || self.node.is_down() {
            self.open = false;
            return Err(MemoryNode::reset_error());
        }
        self.replies
            .pop_front()
            .unwrap_or(Err(BackendError::NoPendingReply))
    }

    /// Like a socket, a connection only notices the node is gone on its next I/O
    fn is_open(&self) -> bool {
        self.open
    }
}
