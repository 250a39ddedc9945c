//! Tests for Config and TopologyFile
//!
//! These tests verify:
//! - Builder defaults and overrides
//! - Validation of shards and pool limits
//! - Loading YAML topology files and resolving groups

use std::io::Write;

use shardcache::config::{DEFAULT_MAX_WAIT_MS, DEFAULT_SOCKET_TIMEOUT_MS};
use shardcache::{CacheError, Config, PoolConfig, ShardInfo, TopologyFile};
use tempfile::NamedTempFile;

// =============================================================================
// Helper Functions
// =============================================================================

const TOPOLOGY: &str = r#"
redis:
  socket_timeout_ms: 1500
  pool:
    max_active: 16
    max_idle: 4
    min_idle: 1
    max_wait_ms: 500
servers:
  cache-a:
    host: 10.0.0.1
    port: 6379
  cache-b:
    host: 10.0.0.2
    port: 6380
    weight: 2
    password: secret
    db: 3
groups:
  sessions: [cache-a, cache-b]
  solo: [cache-b]
  empty: []
  broken: [cache-a, cache-z]
"#;

fn write_topology(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn assert_configuration_error<T: std::fmt::Debug>(result: shardcache::Result<T>) {
    match result {
        Err(CacheError::Configuration(_)) => {}
        other => panic!("Expected Configuration error, got {:?}", other),
    }
}

fn one_shard() -> Config {
    Config::builder()
        .shard(ShardInfo::new("a", "127.0.0.1", 6379))
        .build()
}

// =============================================================================
// Builder Tests
// =============================================================================

#[test]
fn test_builder_defaults() {
    let config = one_shard();

    assert_eq!(config.socket_timeout_ms, DEFAULT_SOCKET_TIMEOUT_MS);
    assert_eq!(config.pool, PoolConfig::default());
    assert_eq!(config.pool.max_active, 8);
    assert_eq!(config.pool.max_idle, 8);
    assert_eq!(config.pool.min_idle, 0);
    assert_eq!(config.pool.max_wait_ms, Some(DEFAULT_MAX_WAIT_MS));
    assert!(config.validate().is_ok());
}

#[test]
fn test_builder_overrides() {
    let config = Config::builder()
        .shard(ShardInfo::new("a", "127.0.0.1", 6379))
        .shard(ShardInfo::new("b", "127.0.0.1", 6380).with_weight(3))
        .socket_timeout_ms(250)
        .pool_max_active(2)
        .pool_max_idle(1)
        .pool_min_idle(1)
        .pool_max_wait_ms(None)
        .build();

    assert_eq!(config.shards.len(), 2);
    assert_eq!(config.shards[1].weight, 3);
    assert_eq!(config.socket_timeout_ms, 250);
    assert_eq!(config.pool.max_active, 2);
    assert_eq!(config.pool.max_idle, 1);
    assert_eq!(config.pool.min_idle, 1);
    assert_eq!(config.pool.max_wait_ms, None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_shard_urls() {
    let mut shard = ShardInfo::new("a", "cache.local", 6379);
    assert_eq!(shard.address(), "cache.local:6379");
    assert_eq!(shard.to_string(), "cache.local:6379");
    assert_eq!(shard.redis_url(), "redis://cache.local:6379/0");

    shard.password = Some("pw".to_string());
    shard.db = Some(2);
    assert_eq!(shard.redis_url(), "redis://:pw@cache.local:6379/2");
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_validate_requires_shards() {
    assert_configuration_error(Config::builder().build().validate());
}

#[test]
fn test_validate_rejects_bad_shards() {
    let empty_name = Config::builder()
        .shard(ShardInfo::new("", "127.0.0.1", 6379))
        .build();
    assert_configuration_error(empty_name.validate());

    let zero_port = Config::builder()
        .shard(ShardInfo::new("a", "127.0.0.1", 0))
        .build();
    assert_configuration_error(zero_port.validate());

    let zero_weight = Config::builder()
        .shard(ShardInfo::new("a", "127.0.0.1", 6379).with_weight(0))
        .build();
    assert_configuration_error(zero_weight.validate());
}

#[test]
fn test_validate_rejects_duplicates() {
    let same_name = Config::builder()
        .shard(ShardInfo::new("a", "127.0.0.1", 6379))
        .shard(ShardInfo::new("a", "127.0.0.1", 6380))
        .build();
    assert_configuration_error(same_name.validate());

    let same_address = Config::builder()
        .shard(ShardInfo::new("a", "127.0.0.1", 6379))
        .shard(ShardInfo::new("b", "127.0.0.1", 6379))
        .build();
    assert_configuration_error(same_address.validate());
}

#[test]
fn test_validate_rejects_bad_pool_limits() {
    let mut config = one_shard();
    config.pool.max_active = 0;
    assert_configuration_error(config.validate());

    let mut config = one_shard();
    config.pool.min_idle = 9;
    assert_configuration_error(config.validate());

    let mut config = one_shard();
    config.pool.max_active = 2;
    config.pool.min_idle = 3;
    config.pool.max_idle = 4;
    assert_configuration_error(config.validate());
}

// =============================================================================
// Topology File Tests
// =============================================================================

#[test]
fn test_load_topology_file() {
    let file = write_topology(TOPOLOGY);
    let topology = TopologyFile::load(file.path()).unwrap();

    assert_eq!(topology.servers.len(), 2);
    assert_eq!(topology.groups.len(), 4);
    assert_eq!(topology.redis.socket_timeout_ms, 1500);
    assert_eq!(topology.redis.pool.max_active, 16);
}

#[test]
fn test_group_resolves_to_config() {
    let topology = TopologyFile::from_yaml(TOPOLOGY).unwrap();
    let config = topology.group("sessions").unwrap();

    assert_eq!(config.shards.len(), 2);
    assert_eq!(config.shards[0].name, "cache-a");
    assert_eq!(config.shards[0].weight, 1);
    assert_eq!(config.shards[1].name, "cache-b");
    assert_eq!(config.shards[1].port, 6380);
    assert_eq!(config.shards[1].weight, 2);
    assert_eq!(config.shards[1].password.as_deref(), Some("secret"));
    assert_eq!(config.shards[1].db, Some(3));

    assert_eq!(config.socket_timeout_ms, 1500);
    assert_eq!(
        config.pool,
        PoolConfig {
            max_active: 16,
            max_idle: 4,
            min_idle: 1,
            max_wait_ms: Some(500),
        }
    );
}

#[test]
fn test_group_errors() {
    let topology = TopologyFile::from_yaml(TOPOLOGY).unwrap();

    assert_configuration_error(topology.group("missing"));
    assert_configuration_error(topology.group("empty"));
    assert_configuration_error(topology.group("broken"));
    assert!(topology.group("solo").is_ok());
}

#[test]
fn test_missing_sections_use_defaults() {
    let topology = TopologyFile::from_yaml(
        "servers:\n  only: { host: 127.0.0.1, port: 6379 }\ngroups:\n  default: [only]\n",
    )
    .unwrap();
    let config = topology.group("default").unwrap();

    assert_eq!(config.socket_timeout_ms, DEFAULT_SOCKET_TIMEOUT_MS);
    assert_eq!(config.pool, PoolConfig::default());
}

#[test]
fn test_invalid_yaml_is_configuration_error() {
    let file = write_topology("servers: [not, a, map");
    let err = TopologyFile::load(file.path()).unwrap_err();

    match err {
        CacheError::Configuration(msg) => {
            assert!(msg.contains(&file.path().display().to_string()))
        }
        other => panic!("Expected Configuration error, got {:?}", other),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = TopologyFile::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, CacheError::Io(_)));
}
