//! Reply definitions
//!
//! Raw replies as they come back from a shard, plus conversions into the
//! typed results the facade returns. Conversions never turn `Nil` into an
//! error unless the target type cannot express absence.

use std::collections::{HashMap, HashSet};

use crate::error::BackendError;

/// A raw reply to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Missing value (nil bulk string / nil array)
    Nil,

    /// Integer reply
    Int(i64),

    /// Bulk string reply
    Bytes(Vec<u8>),

    /// Simple status reply (e.g. "OK", "PONG")
    Status(String),

    /// Multi-bulk reply
    Array(Vec<Reply>),
}

impl Reply {
    /// Whether this is a nil reply
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Integer payload, if this is an integer reply
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Byte payload of a bulk or status reply
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bytes(b) => Some(b),
            Reply::Status(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Convert into a typed value
    pub fn into_value<T: FromReply>(self) -> Result<T, BackendError> {
        T::from_reply(self)
    }

    /// Short description used in conversion errors
    fn kind(&self) -> &'static str {
        match self {
            Reply::Nil => "nil",
            Reply::Int(_) => "integer",
            Reply::Bytes(_) => "bulk string",
            Reply::Status(_) => "status",
            Reply::Array(_) => "array",
        }
    }
}

/// Types that can be built from a raw reply
pub trait FromReply: Sized {
    fn from_reply(reply: Reply) -> Result<Self, BackendError>;
}

fn unexpected(expected: &str, got: &Reply) -> BackendError {
    BackendError::UnexpectedReply(format!("expected {}, got {}", expected, got.kind()))
}

fn utf8(bytes: Vec<u8>) -> Result<String, BackendError> {
    String::from_utf8(bytes)
        .map_err(|e| BackendError::UnexpectedReply(format!("invalid UTF-8 in reply: {}", e)))
}

impl FromReply for Reply {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        Ok(reply)
    }
}

/// Status replies ("OK")
impl FromReply for () {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        match reply {
            Reply::Status(_) => Ok(()),
            other => Err(unexpected("status", &other)),
        }
    }
}

impl FromReply for i64 {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        match reply {
            Reply::Int(n) => Ok(n),
            other => Err(unexpected("integer", &other)),
        }
    }
}

impl FromReply for bool {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        match reply {
            Reply::Int(n) => Ok(n != 0),
            other => Err(unexpected("integer", &other)),
        }
    }
}

impl FromReply for Vec<u8> {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        match reply {
            Reply::Bytes(b) => Ok(b),
            Reply::Status(s) => Ok(s.into_bytes()),
            other => Err(unexpected("bulk string", &other)),
        }
    }
}

impl FromReply for String {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        match reply {
            Reply::Bytes(b) => utf8(b),
            Reply::Status(s) => Ok(s),
            other => Err(unexpected("bulk string", &other)),
        }
    }
}

impl<T: FromReply> FromReply for Option<T> {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        match reply {
            Reply::Nil => Ok(None),
            other => T::from_reply(other).map(Some),
        }
    }
}

fn array(reply: Reply) -> Result<Vec<Reply>, BackendError> {
    match reply {
        Reply::Array(items) => Ok(items),
        // Redis answers nil arrays for some missing keys
        Reply::Nil => Ok(Vec::new()),
        other => Err(unexpected("array", &other)),
    }
}

impl FromReply for Vec<String> {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        array(reply)?.into_iter().map(String::from_reply).collect()
    }
}

impl FromReply for Vec<Option<String>> {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        array(reply)?
            .into_iter()
            .map(Option::<String>::from_reply)
            .collect()
    }
}

impl FromReply for Vec<Vec<u8>> {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        array(reply)?.into_iter().map(Vec::<u8>::from_reply).collect()
    }
}

impl FromReply for HashSet<String> {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        array(reply)?.into_iter().map(String::from_reply).collect()
    }
}

/// Flat field/value arrays (HGETALL)
impl FromReply for HashMap<String, String> {
    fn from_reply(reply: Reply) -> Result<Self, BackendError> {
        let items = array(reply)?;
        if items.len() % 2 != 0 {
            return Err(BackendError::UnexpectedReply(format!(
                "odd number of elements ({}) in field/value reply",
                items.len()
            )));
        }

        let mut map = HashMap::with_capacity(items.len() / 2);
        let mut iter = items.into_iter();
        while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
            map.insert(String::from_reply(field)?, String::from_reply(value)?);
        }
        Ok(map)
    }
}
