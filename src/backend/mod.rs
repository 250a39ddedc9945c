//! Backend Module
//!
//! The connection-level seam between the facade and a shard.
//!
//! ## Architecture
//! - `Connector` opens connections to one shard (used by the pools)
//! - `Connection` sends commands and reads replies in FIFO order; `send`
//!   never waits for the reply, which is what makes pipelining possible
//! - `remote` talks to real Redis servers through the `redis` crate
//! - `memory` is an in-process stand-in used by tests and local runs,
//!   compiled only with the `memory` feature

mod remote;
#[cfg(feature = "memory")]
pub mod memory;

pub use remote::RedisConnector;
#[cfg(feature = "memory")]
pub use memory::{MemoryCluster, MemoryConnector, MemoryNode};

use crate::config::ShardInfo;
use crate::error::BackendError;
use crate::protocol::{Command, Reply};

/// One open connection to one shard
///
/// Replies come back in the order commands were sent. A connection with
/// sent-but-unread replies must not be handed to another borrower.
pub trait Connection: Send {
    /// Write a command without waiting for its reply
    fn send(&mut self, command: &Command) -> Result<(), BackendError>;

    /// Block until the reply to the oldest unanswered command arrives
    fn recv(&mut self) -> Result<Reply, BackendError>;

    /// Whether the transport still looks usable
    fn is_open(&self) -> bool;
}

/// Opens connections to shards
pub trait Connector: Send + Sync {
    fn connect(&self, shard: &ShardInfo) -> Result<Box<dyn Connection>, BackendError>;
}
