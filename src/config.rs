//! Configuration for shardcache
//!
//! Centralized configuration with sensible defaults. A `Config` describes
//! one client: the shards it spreads keys over, the socket timeout and the
//! per-shard pool limits. Larger deployments describe many named servers
//! and groups in a YAML `TopologyFile` and resolve one group at a time.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Default socket read/write/connect timeout (milliseconds)
pub const DEFAULT_SOCKET_TIMEOUT_MS: u64 = 2000;

/// Default wait for a free connection (milliseconds)
pub const DEFAULT_MAX_WAIT_MS: u64 = 2000;

/// One backend shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInfo {
    /// Logical name, also used to place the shard on the hash ring
    pub name: String,

    pub host: String,

    pub port: u16,

    /// Relative share of the keyspace
    #[serde(default = "default_weight")]
    pub weight: u32,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub db: Option<i64>,
}

fn default_weight() -> u32 {
    1
}

impl ShardInfo {
    /// Create a shard with weight 1 and no authentication
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            weight: default_weight(),
            password: None,
            db: None,
        }
    }

    /// Set the ring weight
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection URL understood by `redis::Client::open`
    pub fn redis_url(&self) -> String {
        let auth = match &self.password {
            Some(password) => format!(":{}@", password),
            None => String::new(),
        };
        let db = self.db.unwrap_or(0);
        format!("redis://{}{}:{}/{}", auth, self.host, self.port, db)
    }
}

impl fmt::Display for ShardInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Per-shard connection pool limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Max connections borrowed at once
    pub max_active: usize,

    /// Max idle connections kept for reuse
    pub max_idle: usize,

    /// Idle connections opened up front
    pub min_idle: usize,

    /// How long `acquire` waits for a free connection (None = forever)
    pub max_wait_ms: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_active: 8,
            max_idle: 8,
            min_idle: 0,
            max_wait_ms: Some(DEFAULT_MAX_WAIT_MS),
        }
    }
}

/// Main configuration for one sharded client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Topology
    // -------------------------------------------------------------------------
    /// Shards in ring order
    pub shards: Vec<ShardInfo>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Socket connect/read/write timeout (milliseconds, 0 = none)
    pub socket_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Pool Configuration
    // -------------------------------------------------------------------------
    pub pool: PoolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shards: Vec::new(),
            socket_timeout_ms: DEFAULT_SOCKET_TIMEOUT_MS,
            pool: PoolConfig::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check topology and pool parameters
    ///
    /// Runs once at bootstrap; a client never starts from an invalid config.
    pub fn validate(&self) -> Result<()> {
        if self.shards.is_empty() {
            return Err(CacheError::Configuration(
                "at least one shard is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        let mut addresses = HashSet::new();
        for shard in &self.shards {
            if shard.name.is_empty() {
                return Err(CacheError::Configuration(format!(
                    "shard {} has an empty name",
                    shard
                )));
            }
            if shard.host.is_empty() || shard.port == 0 {
                return Err(CacheError::Configuration(format!(
                    "shard {} has an invalid address {}",
                    shard.name, shard
                )));
            }
            if shard.weight == 0 {
                return Err(CacheError::Configuration(format!(
                    "shard {} has zero weight",
                    shard.name
                )));
            }
            if !names.insert(shard.name.as_str()) {
                return Err(CacheError::Configuration(format!(
                    "duplicate shard name {}",
                    shard.name
                )));
            }
            if !addresses.insert(shard.address()) {
                return Err(CacheError::Configuration(format!(
                    "duplicate shard address {}",
                    shard
                )));
            }
        }

        if self.pool.max_active == 0 {
            return Err(CacheError::Configuration(
                "pool max_active must be positive".to_string(),
            ));
        }
        if self.pool.min_idle > self.pool.max_idle {
            return Err(CacheError::Configuration(format!(
                "pool min_idle ({}) exceeds max_idle ({})",
                self.pool.min_idle, self.pool.max_idle
            )));
        }
        if self.pool.min_idle > self.pool.max_active {
            return Err(CacheError::Configuration(format!(
                "pool min_idle ({}) exceeds max_active ({})",
                self.pool.min_idle, self.pool.max_active
            )));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Add a shard
    pub fn shard(mut self, shard: ShardInfo) -> Self {
        self.config.shards.push(shard);
        self
    }

    /// Replace all shards
    pub fn shards(mut self, shards: Vec<ShardInfo>) -> Self {
        self.config.shards = shards;
        self
    }

    /// Set the socket timeout (in milliseconds)
    pub fn socket_timeout_ms(mut self, ms: u64) -> Self {
        self.config.socket_timeout_ms = ms;
        self
    }

    /// Set the whole pool configuration
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.config.pool = pool;
        self
    }

    /// Set the max borrowed connections per shard
    pub fn pool_max_active(mut self, count: usize) -> Self {
        self.config.pool.max_active = count;
        self
    }

    /// Set the max idle connections per shard
    pub fn pool_max_idle(mut self, count: usize) -> Self {
        self.config.pool.max_idle = count;
        self
    }

    /// Set the idle connections opened at startup per shard
    pub fn pool_min_idle(mut self, count: usize) -> Self {
        self.config.pool.min_idle = count;
        self
    }

    /// Set the acquire wait (None waits forever)
    pub fn pool_max_wait_ms(mut self, ms: Option<u64>) -> Self {
        self.config.pool.max_wait_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Topology files
// =============================================================================

/// Settings shared by every group in a topology file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisSettings {
    pub socket_timeout_ms: u64,
    pub pool: PoolConfig,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            socket_timeout_ms: DEFAULT_SOCKET_TIMEOUT_MS,
            pool: PoolConfig::default(),
        }
    }
}

/// A server declared once and referenced by name from groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub db: Option<i64>,
}

/// Deployment description: named servers and the groups built from them
///
/// ```yaml
/// redis:
///   socket_timeout_ms: 1500
///   pool: { max_active: 16, max_idle: 8, min_idle: 1, max_wait_ms: 500 }
/// servers:
///   cache-a: { host: 10.0.0.1, port: 6379 }
///   cache-b: { host: 10.0.0.2, port: 6379, weight: 2 }
/// groups:
///   sessions: [cache-a, cache-b]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyFile {
    #[serde(default)]
    pub redis: RedisSettings,

    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,

    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl TopologyFile {
    /// Read and parse a YAML topology file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text).map_err(|e| match e {
            CacheError::Configuration(msg) => {
                CacheError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse a YAML topology document
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| CacheError::Configuration(e.to_string()))
    }

    /// Resolve one group into a validated client config
    pub fn group(&self, name: &str) -> Result<Config> {
        let members = self
            .groups
            .get(name)
            .ok_or_else(|| CacheError::Configuration(format!("unknown group {}", name)))?;

        if members.is_empty() {
            return Err(CacheError::Configuration(format!(
                "group {} has no servers",
                name
            )));
        }

        let mut shards = Vec::with_capacity(members.len());
        for member in members {
            let server = self.servers.get(member).ok_or_else(|| {
                CacheError::Configuration(format!(
                    "group {} references unknown server {}",
                    name, member
                ))
            })?;
            shards.push(ShardInfo {
                name: member.clone(),
                host: server.host.clone(),
                port: server.port,
                weight: server.weight,
                password: server.password.clone(),
                db: server.db,
            });
        }

        let config = Config::builder()
            .shards(shards)
            .socket_timeout_ms(self.redis.socket_timeout_ms)
            .pool(self.redis.pool.clone())
            .build();
        config.validate()?;
        Ok(config)
    }
}
