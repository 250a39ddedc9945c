//! Error types for shardcache
//!
//! Provides a unified error type for all operations. Every error that came
//! from a backend carries the shard it happened on so operators can tell
//! which instance misbehaved.

use thiserror::Error;

/// Result type alias using CacheError
pub type Result<T> = std::result::Result<T, CacheError>;

/// Unified error type for shardcache operations
#[derive(Debug, Error)]
pub enum CacheError {
    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    #[error("backend operation failed on shard {shard}: {cause}")]
    BackendOperationFailed {
        shard: String,
        #[source]
        cause: BackendError,
    },

    #[error("batch {label} failed after {dispatched} dispatched commands: {cause}")]
    BatchFailed {
        label: String,
        dispatched: usize,
        #[source]
        cause: Box<CacheError>,
    },

    // -------------------------------------------------------------------------
    // Pool Errors
    // -------------------------------------------------------------------------
    #[error("connection pool for shard {shard} exhausted after waiting {waited_ms} ms")]
    PoolExhausted { shard: String, waited_ms: u64 },

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Tag a backend failure with the shard it happened on
    pub fn backend(shard: impl Into<String>, cause: impl Into<BackendError>) -> Self {
        CacheError::BackendOperationFailed {
            shard: shard.into(),
            cause: cause.into(),
        }
    }

    /// The shard this error is attributed to, looking through batch failures
    pub fn shard(&self) -> Option<&str> {
        match self {
            CacheError::BackendOperationFailed { shard, .. } => Some(shard),
            CacheError::PoolExhausted { shard, .. } => Some(shard),
            CacheError::BatchFailed { cause, .. } => cause.shard(),
            _ => None,
        }
    }

    /// Strip the batch wrapper, leaving the failure that broke the batch
    pub fn into_cause(self) -> CacheError {
        match self {
            CacheError::BatchFailed { cause, .. } => cause.into_cause(),
            other => other,
        }
    }

    /// Whether the failure was raised by a backend (and therefore evicted
    /// the connection involved)
    pub fn is_backend(&self) -> bool {
        match self {
            CacheError::BackendOperationFailed { .. } => true,
            CacheError::BatchFailed { cause, .. } => cause.is_backend(),
            _ => false,
        }
    }
}

/// Cause of a single-command failure on one connection
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with an error reply (e.g. WRONGTYPE)
    #[error("server error: {0}")]
    Server(String),

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error("no reply pending on connection")]
    NoPendingReply,
}
