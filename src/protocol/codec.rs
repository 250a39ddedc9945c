//! Protocol codec
//!
//! Bridges commands and replies to the RESP encoding provided by the
//! `redis` crate. Nothing here speaks the wire format by hand.

use crate::error::BackendError;

use super::{Command, Reply};

/// Build the `redis::Cmd` for a command
pub fn to_redis_cmd(command: &Command) -> redis::Cmd {
    let mut cmd = redis::cmd(command.name());
    for arg in command.arguments() {
        cmd.arg(&arg[..]);
    }
    cmd
}

/// Encode a command into packed RESP bytes ready for the socket
pub fn encode_command(command: &Command) -> Vec<u8> {
    to_redis_cmd(command).get_packed_command()
}

/// Decode a value read off a connection into a raw reply
///
/// Error replies (`-ERR ...`, `-WRONGTYPE ...`), including ones nested in
/// arrays, become `BackendError::Server`.
pub fn decode_value(value: redis::Value) -> Result<Reply, BackendError> {
    let value = value
        .extract_error()
        .map_err(|e| BackendError::Server(e.to_string()))?;

    match value {
        redis::Value::Nil => Ok(Reply::Nil),
        redis::Value::Int(n) => Ok(Reply::Int(n)),
        redis::Value::BulkString(bytes) => Ok(Reply::Bytes(bytes)),
        redis::Value::SimpleString(status) => Ok(Reply::Status(status)),
        redis::Value::Okay => Ok(Reply::Status("OK".to_string())),
        redis::Value::Array(items) | redis::Value::Set(items) => items
            .into_iter()
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Reply::Array),
        redis::Value::Boolean(b) => Ok(Reply::Int(b as i64)),
        // Maps, doubles, verbatim strings and pushes are RESP3 replies
        other => Err(BackendError::UnexpectedReply(format!("{:?}", other))),
    }
}
