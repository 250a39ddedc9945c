//! Protocol Tests
//!
//! Tests for command packing, reply decoding and typed reply conversion.

use std::collections::{HashMap, HashSet};

use shardcache::protocol::{decode_value, encode_command, Command, FromReply, Reply};
use shardcache::BackendError;

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_encode_get() {
    let cmd = Command::Get {
        key: b"hello".to_vec(),
    };
    assert_eq!(encode_command(&cmd), b"*2\r\n$3\r\nGET\r\n$5\r\nhello\r\n".to_vec());
}

#[test]
fn test_encode_setex_orders_arguments() {
    let cmd = Command::SetEx {
        key: b"k".to_vec(),
        seconds: 30,
        value: b"v".to_vec(),
    };
    assert_eq!(
        encode_command(&cmd),
        b"*4\r\n$5\r\nSETEX\r\n$1\r\nk\r\n$2\r\n30\r\n$1\r\nv\r\n".to_vec()
    );
}

#[test]
fn test_encode_binary_value() {
    let cmd = Command::Set {
        key: b"bin".to_vec(),
        value: vec![0, 13, 10, 255],
    };
    let mut expected = b"*3\r\n$3\r\nSET\r\n$3\r\nbin\r\n$4\r\n".to_vec();
    expected.extend_from_slice(&[0, 13, 10, 255]);
    expected.extend_from_slice(b"\r\n");
    assert_eq!(encode_command(&cmd), expected);
}

#[test]
fn test_encode_ping() {
    assert_eq!(encode_command(&Command::Ping), b"*1\r\n$4\r\nPING\r\n".to_vec());
}

#[test]
fn test_hmget_arguments() {
    let cmd = Command::HMGet {
        key: b"h".to_vec(),
        fields: vec![b"a".to_vec(), b"b".to_vec()],
    };
    assert_eq!(cmd.name(), "HMGET");
    assert_eq!(
        cmd.arguments(),
        vec![b"h".to_vec(), b"a".to_vec(), b"b".to_vec()]
    );
}

#[test]
fn test_routing_key() {
    let cmd = Command::LRange {
        key: b"list".to_vec(),
        start: 0,
        stop: -1,
    };
    assert_eq!(cmd.key(), Some(&b"list"[..]));
    assert_eq!(cmd.arguments()[2], b"-1".to_vec());
    assert_eq!(Command::Ping.key(), None);
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_scalars() {
    assert_eq!(decode_value(redis::Value::Nil).unwrap(), Reply::Nil);
    assert_eq!(decode_value(redis::Value::Int(7)).unwrap(), Reply::Int(7));
    assert_eq!(
        decode_value(redis::Value::BulkString(b"x".to_vec())).unwrap(),
        Reply::Bytes(b"x".to_vec())
    );
    assert_eq!(
        decode_value(redis::Value::Okay).unwrap(),
        Reply::Status("OK".to_string())
    );
    assert_eq!(
        decode_value(redis::Value::SimpleString("PONG".to_string())).unwrap(),
        Reply::Status("PONG".to_string())
    );
}

#[test]
fn test_decode_nested_array() {
    let value = redis::Value::Array(vec![
        redis::Value::BulkString(b"a".to_vec()),
        redis::Value::Nil,
        redis::Value::Array(vec![redis::Value::Int(1)]),
    ]);
    assert_eq!(
        decode_value(value).unwrap(),
        Reply::Array(vec![
            Reply::Bytes(b"a".to_vec()),
            Reply::Nil,
            Reply::Array(vec![Reply::Int(1)]),
        ])
    );
}

#[test]
fn test_decode_unsupported_shape() {
    let err = decode_value(redis::Value::Double(1.5)).unwrap_err();
    assert!(matches!(err, BackendError::UnexpectedReply(_)));
}

#[test]
fn test_decode_wrongtype_error_reply() {
    let value = redis::parse_redis_value(
        b"-WRONGTYPE Operation against a key holding the wrong kind of value\r\n",
    )
    .unwrap();

    let err = decode_value(value).unwrap_err();
    assert!(matches!(err, BackendError::Server(msg) if msg.contains("WRONGTYPE")));
}

#[test]
fn test_decode_generic_error_reply() {
    let value =
        redis::parse_redis_value(b"-ERR value is not an integer or out of range\r\n").unwrap();

    let err = decode_value(value).unwrap_err();
    assert!(matches!(err, BackendError::Server(msg) if msg.contains("not an integer")));
}

#[test]
fn test_decode_error_inside_array() {
    let value = redis::parse_redis_value(b"*2\r\n:1\r\n-ERR boom\r\n").unwrap();

    let err = decode_value(value).unwrap_err();
    assert!(matches!(err, BackendError::Server(msg) if msg.contains("boom")));
}

// =============================================================================
// Conversion Tests
// =============================================================================

#[test]
fn test_nil_converts_to_none() {
    assert_eq!(Option::<String>::from_reply(Reply::Nil).unwrap(), None);
    assert_eq!(Option::<i64>::from_reply(Reply::Nil).unwrap(), None);
    assert_eq!(Option::<Vec<u8>>::from_reply(Reply::Nil).unwrap(), None);
}

#[test]
fn test_nil_is_error_for_required_values() {
    assert!(i64::from_reply(Reply::Nil).is_err());
    assert!(String::from_reply(Reply::Nil).is_err());
}

#[test]
fn test_integer_conversions() {
    assert_eq!(Reply::Int(3).into_value::<i64>().unwrap(), 3);
    assert!(Reply::Int(1).into_value::<bool>().unwrap());
    assert!(!Reply::Int(0).into_value::<bool>().unwrap());

    let err = Reply::Bytes(b"3".to_vec()).into_value::<i64>().unwrap_err();
    assert!(matches!(err, BackendError::UnexpectedReply(_)));
}

#[test]
fn test_text_conversions() {
    assert_eq!(
        Reply::Bytes(b"hi".to_vec()).into_value::<String>().unwrap(),
        "hi"
    );
    assert_eq!(
        Reply::Status("OK".to_string()).into_value::<String>().unwrap(),
        "OK"
    );
    assert!(Reply::Bytes(vec![0xff, 0xfe]).into_value::<String>().is_err());
    assert!(Reply::Status("OK".to_string()).into_value::<()>().is_ok());
}

#[test]
fn test_collection_conversions() {
    let array = Reply::Array(vec![
        Reply::Bytes(b"a".to_vec()),
        Reply::Bytes(b"1".to_vec()),
        Reply::Bytes(b"b".to_vec()),
        Reply::Bytes(b"2".to_vec()),
    ]);

    let list: Vec<String> = array.clone().into_value().unwrap();
    assert_eq!(list, vec!["a", "1", "b", "2"]);

    let set: HashSet<String> = array.clone().into_value().unwrap();
    assert_eq!(set.len(), 4);

    let map: HashMap<String, String> = array.into_value().unwrap();
    assert_eq!(map.get("a").map(String::as_str), Some("1"));
    assert_eq!(map.get("b").map(String::as_str), Some("2"));
}

#[test]
fn test_optional_elements() {
    let array = Reply::Array(vec![Reply::Bytes(b"x".to_vec()), Reply::Nil]);
    let values: Vec<Option<String>> = array.into_value().unwrap();
    assert_eq!(values, vec![Some("x".to_string()), None]);
}

#[test]
fn test_nil_array_is_empty() {
    let list: Vec<String> = Reply::Nil.into_value().unwrap();
    assert!(list.is_empty());
}

#[test]
fn test_odd_pair_array_is_rejected() {
    let array = Reply::Array(vec![Reply::Bytes(b"a".to_vec())]);
    assert!(array.into_value::<HashMap<String, String>>().is_err());
}
