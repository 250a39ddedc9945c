//! Tests for the in-process memory backend
//!
//! These tests verify:
//! - Reply semantics of the supported commands
//! - Expiry and type checking
//! - Failure injection and the per-node command log

use std::time::Duration;

use shardcache::backend::{Connection, Connector, MemoryCluster};
use shardcache::protocol::{Command, Reply};
use shardcache::{BackendError, ShardInfo};

// =============================================================================
// Helper Functions
// =============================================================================

fn shard() -> ShardInfo {
    ShardInfo::new("mem", "127.0.0.1", 7300)
}

fn connect(cluster: &MemoryCluster) -> Box<dyn Connection> {
    cluster.connector().connect(&shard()).unwrap()
}

fn run(conn: &mut Box<dyn Connection>, command: Command) -> Result<Reply, BackendError> {
    conn.send(&command)?;
    conn.recv()
}

fn k(key: &str) -> Vec<u8> {
    key.as_bytes().to_vec()
}

fn bulk(values: &[&str]) -> Reply {
    Reply::Array(values.iter().map(|v| Reply::Bytes(k(v))).collect())
}

// =============================================================================
// String Tests
// =============================================================================

#[test]
fn test_set_clears_ttl_and_incr_keeps_it() {
    let cluster = MemoryCluster::new();
    let node = cluster.node_for(&shard());
    let mut conn = connect(&cluster);

    run(&mut conn, Command::SetEx { key: k("a"), seconds: 100, value: k("1") }).unwrap();
    assert!(node.ttl(b"a").is_some());

    run(&mut conn, Command::Incr { key: k("a") }).unwrap();
    assert!(node.ttl(b"a").is_some());

    run(&mut conn, Command::Set { key: k("a"), value: k("5") }).unwrap();
    assert_eq!(node.ttl(b"a"), None);
}

#[test]
fn test_incr_non_integer_is_server_error() {
    let cluster = MemoryCluster::new();
    let mut conn = connect(&cluster);

    run(&mut conn, Command::Set { key: k("a"), value: k("abc") }).unwrap();
    let err = run(&mut conn, Command::Incr { key: k("a") }).unwrap_err();
    assert!(matches!(err, BackendError::Server(msg) if msg.contains("not an integer")));

    // Error replies leave the connection usable
    assert!(conn.is_open());
    assert_eq!(run(&mut conn, Command::Ping).unwrap(), Reply::Status("PONG".to_string()));
}

#[test]
fn test_expire_non_positive_deletes() {
    let cluster = MemoryCluster::new();
    let mut conn = connect(&cluster);

    run(&mut conn, Command::Set { key: k("a"), value: k("1") }).unwrap();
    assert_eq!(run(&mut conn, Command::Expire { key: k("a"), seconds: 0 }).unwrap(), Reply::Int(1));
    assert_eq!(run(&mut conn, Command::Exists { key: k("a") }).unwrap(), Reply::Int(0));
    assert_eq!(run(&mut conn, Command::Expire { key: k("a"), seconds: 10 }).unwrap(), Reply::Int(0));
}

#[test]
fn test_setex_rejects_non_positive_ttl() {
    let cluster = MemoryCluster::new();
    let mut conn = connect(&cluster);

    let err = run(&mut conn, Command::SetEx { key: k("a"), seconds: 0, value: k("1") }).unwrap_err();
    assert!(matches!(err, BackendError::Server(_)));
}

#[test]
fn test_out_of_range_ttl_is_rejected() {
    let cluster = MemoryCluster::new();
    let node = cluster.node_for(&shard());
    let mut conn = connect(&cluster);

    let err = run(&mut conn, Command::SetEx { key: k("a"), seconds: i64::MAX, value: k("1") }).unwrap_err();
    assert!(matches!(err, BackendError::Server(msg) if msg.contains("invalid expire time")));
    assert_eq!(run(&mut conn, Command::Exists { key: k("a") }).unwrap(), Reply::Int(0));

    run(&mut conn, Command::Set { key: k("b"), value: k("1") }).unwrap();
    let err = run(&mut conn, Command::Expire { key: k("b"), seconds: i64::MAX }).unwrap_err();
    assert!(matches!(err, BackendError::Server(msg) if msg.contains("'expire'")));

    // The key keeps its value and stays persistent
    assert_eq!(run(&mut conn, Command::Get { key: k("b") }).unwrap(), Reply::Bytes(k("1")));
    assert_eq!(node.ttl(b"b"), None);
}

#[test]
fn test_wrong_type_is_rejected() {
    let cluster = MemoryCluster::new();
    let mut conn = connect(&cluster);

    run(&mut conn, Command::RPush { key: k("l"), value: k("x") }).unwrap();
    for command in [
        Command::Get { key: k("l") },
        Command::HSet { key: k("l"), field: k("f"), value: k("v") },
        Command::SAdd { key: k("l"), member: k("m") },
        Command::ZCard { key: k("l") },
    ] {
        let err = run(&mut conn, command).unwrap_err();
        assert!(matches!(err, BackendError::Server(msg) if msg.starts_with("WRONGTYPE")));
    }

    // The list itself is untouched
    assert_eq!(run(&mut conn, Command::LLen { key: k("l") }).unwrap(), Reply::Int(1));
}

// =============================================================================
// Collection Tests
// =============================================================================

#[test]
fn test_empty_collections_disappear() {
    let cluster = MemoryCluster::new();
    let node = cluster.node_for(&shard());
    let mut conn = connect(&cluster);

    run(&mut conn, Command::HSet { key: k("h"), field: k("f"), value: k("v") }).unwrap();
    run(&mut conn, Command::SAdd { key: k("s"), member: k("m") }).unwrap();
    run(&mut conn, Command::LPush { key: k("l"), value: k("x") }).unwrap();
    assert_eq!(node.key_count(), 3);

    run(&mut conn, Command::HDel { key: k("h"), field: k("f") }).unwrap();
    run(&mut conn, Command::SRem { key: k("s"), member: k("m") }).unwrap();
    run(&mut conn, Command::LPop { key: k("l") }).unwrap();
    assert_eq!(node.key_count(), 0);
}

#[test]
fn test_lrange_bounds() {
    let cluster = MemoryCluster::new();
    let mut conn = connect(&cluster);

    for v in ["a", "b", "c", "d"] {
        run(&mut conn, Command::RPush { key: k("l"), value: k(v) }).unwrap();
    }

    let range = |conn: &mut Box<dyn Connection>, start, stop| {
        run(conn, Command::LRange { key: k("l"), start, stop }).unwrap()
    };
    assert_eq!(range(&mut conn, 0, -1), bulk(&["a", "b", "c", "d"]));
    assert_eq!(range(&mut conn, 1, 2), bulk(&["b", "c"]));
    assert_eq!(range(&mut conn, -2, 100), bulk(&["c", "d"]));
    assert_eq!(range(&mut conn, 3, 1), bulk(&[]));
    assert_eq!(range(&mut conn, 10, 20), bulk(&[]));
}

#[test]
fn test_ltrim_and_lrem_from_tail() {
    let cluster = MemoryCluster::new();
    let mut conn = connect(&cluster);

    for v in ["x", "a", "x", "b", "x"] {
        run(&mut conn, Command::RPush { key: k("l"), value: k(v) }).unwrap();
    }

    assert_eq!(
        run(&mut conn, Command::LRem { key: k("l"), count: -2, value: k("x") }).unwrap(),
        Reply::Int(2)
    );
    assert_eq!(
        run(&mut conn, Command::LRange { key: k("l"), start: 0, stop: -1 }).unwrap(),
        bulk(&["x", "a", "b"])
    );

    run(&mut conn, Command::LTrim { key: k("l"), start: 5, stop: 10 }).unwrap();
    assert_eq!(run(&mut conn, Command::LLen { key: k("l") }).unwrap(), Reply::Int(0));
}

#[test]
fn test_zrevrank_breaks_ties_by_member() {
    let cluster = MemoryCluster::new();
    let node = cluster.node_for(&shard());
    let mut conn = connect(&cluster);

    node.zadd(b"z", 5.0, b"alpha").unwrap();
    node.zadd(b"z", 5.0, b"beta").unwrap();
    node.zadd(b"z", 1.0, b"gamma").unwrap();

    let rank = |conn: &mut Box<dyn Connection>, member: &str| {
        run(conn, Command::ZRevRank { key: k("z"), member: k(member) }).unwrap()
    };
    assert_eq!(rank(&mut conn, "beta"), Reply::Int(0));
    assert_eq!(rank(&mut conn, "alpha"), Reply::Int(1));
    assert_eq!(rank(&mut conn, "gamma"), Reply::Int(2));
    assert_eq!(rank(&mut conn, "delta"), Reply::Nil);
}

// =============================================================================
// Pipelining and Failure Tests
// =============================================================================

#[test]
fn test_replies_queue_in_send_order() {
    let cluster = MemoryCluster::new();
    let mut conn = connect(&cluster);

    conn.send(&Command::Incr { key: k("c") }).unwrap();
    conn.send(&Command::Get { key: k("missing") }).unwrap();
    conn.send(&Command::Incr { key: k("c") }).unwrap();

    assert_eq!(conn.recv().unwrap(), Reply::Int(1));
    assert_eq!(conn.recv().unwrap(), Reply::Nil);
    assert_eq!(conn.recv().unwrap(), Reply::Int(2));
    assert!(matches!(conn.recv(), Err(BackendError::NoPendingReply)));
}

#[test]
fn test_down_node_refuses_and_resets() {
    let cluster = MemoryCluster::new();
    let address = shard().address();
    let mut conn = connect(&cluster);

    cluster.set_down(&address, true);
    assert!(cluster.connector().connect(&shard()).is_err());
    assert!(conn.is_open());

    let err = run(&mut conn, Command::Ping).unwrap_err();
    assert!(matches!(err, BackendError::Io(_)));
    assert!(!conn.is_open());

    // A reset connection stays dead after the node recovers
    cluster.set_down(&address, false);
    assert!(run(&mut conn, Command::Ping).is_err());
    assert!(run(&mut connect(&cluster), Command::Ping).is_ok());
}

#[test]
fn test_command_log_and_connect_count() {
    let cluster = MemoryCluster::new();
    let node = cluster.node_for(&shard());

    let mut a = connect(&cluster);
    let mut b = connect(&cluster);
    run(&mut a, Command::Set { key: k("x"), value: k("1") }).unwrap();
    run(&mut b, Command::Get { key: k("x") }).unwrap();

    assert_eq!(node.connect_count(), 2);
    assert_eq!(node.command_log(), vec!["SET", "GET"]);

    node.clear_command_log();
    assert!(node.command_log().is_empty());
}

#[test]
fn test_nodes_are_independent() {
    let cluster = MemoryCluster::new();
    let other = ShardInfo::new("other", "127.0.0.1", 7301);

    let mut a = connect(&cluster);
    let mut b = cluster.connector().connect(&other).unwrap();
    run(&mut a, Command::Set { key: k("x"), value: k("1") }).unwrap();

    assert_eq!(run(&mut b, Command::Get { key: k("x") }).unwrap(), Reply::Nil);
    assert_eq!(cluster.node_for(&other).key_count(), 0);
}

#[test]
fn test_expired_key_is_gone() {
    let cluster = MemoryCluster::new();
    let node = cluster.node_for(&shard());
    let mut conn = connect(&cluster);

    run(&mut conn, Command::SetEx { key: k("t"), seconds: 1, value: k("v") }).unwrap();
    std::thread::sleep(Duration::from_millis(1100));

    assert_eq!(run(&mut conn, Command::Get { key: k("t") }).unwrap(), Reply::Nil);
    assert_eq!(node.key_count(), 0);
}
