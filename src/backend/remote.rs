//! Redis-backed connections
//!
//! Thin adapter over `redis::Connection`. Commands are packed with
//! `redis::Cmd` and written with `send_packed_command`; replies are read
//! one at a time with `recv_response`, so several commands can be in flight
//! on one socket.

use std::time::Duration;

use ::redis::ConnectionLike;
use tracing::debug;

use crate::config::ShardInfo;
use crate::error::BackendError;
use crate::protocol::{decode_value, encode_command, Command, Reply};

use super::{Connection, Connector};

/// Opens plain TCP connections to Redis shards
#[derive(Debug, Clone)]
pub struct RedisConnector {
    /// Connect/read/write timeout (None = block indefinitely)
    timeout: Option<Duration>,
}

impl RedisConnector {
    /// Create a connector; `socket_timeout_ms == 0` disables timeouts
    pub fn new(socket_timeout_ms: u64) -> Self {
        let timeout = if socket_timeout_ms > 0 {
            Some(Duration::from_millis(socket_timeout_ms))
        } else {
            None
        };
        Self { timeout }
    }
}

impl Connector for RedisConnector {
    fn connect(&self, shard: &ShardInfo) -> Result<Box<dyn Connection>, BackendError> {
        debug!("Opening connection to shard {} ({})", shard.name, shard);

        let client = ::redis::Client::open(shard.redis_url().as_str())?;
        let conn = match self.timeout {
            Some(timeout) => client.get_connection_with_timeout(timeout)?,
            None => client.get_connection()?,
        };
        conn.set_read_timeout(self.timeout)?;
        conn.set_write_timeout(self.timeout)?;

        Ok(Box::new(RedisConnection { conn }))
    }
}

/// One socket to a Redis server
struct RedisConnection {
    conn: ::redis::Connection,
}

impl Connection for RedisConnection {
    fn send(&mut self, command: &Command) -> Result<(), BackendError> {
        let packed = encode_command(command);
        self.conn.send_packed_command(&packed)?;
        Ok(())
    }

    fn recv(&mut self) -> Result<Reply, BackendError> {
        // Error replies arrive as `Ok(Value::ServerError)`; decode_value maps them
        let value = self.conn.recv_response()?;
        decode_value(value)
    }

    fn is_open(&self) -> bool {
        self.conn.is_open()
    }
}
