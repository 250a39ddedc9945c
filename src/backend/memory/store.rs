//! In-memory keyspace
//!
//! Executes the facade's command set with Redis reply semantics: typed
//! values, lazy expiry, empty collections removed, error replies for type
//! mismatches.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::error::BackendError;
use crate::protocol::{Command, Reply};

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
const NOT_INTEGER: &str = "ERR value is not an integer or out of range";
const HASH_NOT_INTEGER: &str = "ERR hash value is not an integer";

/// Typed value stored under a key
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Value {
    Str(Vec<u8>),
    Hash(BTreeMap<Vec<u8>, Vec<u8>>),
    Set(BTreeSet<Vec<u8>>),
    ZSet(BTreeMap<Vec<u8>, f64>),
    List(VecDeque<Vec<u8>>),
}

impl Value {
    fn is_empty(&self) -> bool {
        match self {
            Value::Str(_) => false,
            Value::Hash(h) => h.is_empty(),
            Value::Set(s) => s.is_empty(),
            Value::ZSet(z) => z.is_empty(),
            Value::List(l) => l.is_empty(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

fn server(msg: &str) -> BackendError {
    BackendError::Server(msg.to_string())
}

fn parse_int(bytes: &[u8], msg: &str) -> Result<i64, BackendError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| server(msg))
}

/// Absolute expiry `seconds` from now; out-of-range values are rejected like Redis does
fn deadline(seconds: i64, command: &str) -> Result<Instant, BackendError> {
    u64::try_from(seconds)
        .ok()
        .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)))
        .ok_or_else(|| {
            BackendError::Server(format!(
                "ERR invalid expire time in '{}' command",
                command
            ))
        })
}

fn ok() -> Reply {
    Reply::Status("OK".to_string())
}

fn bulk_array<'a>(items: impl Iterator<Item = &'a Vec<u8>>) -> Reply {
    Reply::Array(items.map(|b| Reply::Bytes(b.clone())).collect())
}

/// Normalize a Redis `start..=stop` range against `len`
fn range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}

/// Keys and values of one node
#[derive(Debug, Default)]
pub(super) struct Keyspace {
    entries: HashMap<Vec<u8>, Entry>,
}

impl Keyspace {
    /// Drop `key` if its TTL has passed
    fn purge(&mut self, key: &[u8]) {
        let now = Instant::now();
        if self.entries.get(key).map(|e| e.is_expired(now)).unwrap_or(false) {
            self.entries.remove(key);
        }
    }

    fn get(&mut self, key: &[u8]) -> Option<&mut Entry> {
        self.purge(key);
        self.entries.get_mut(key)
    }

    /// Existing entry, or a fresh one holding `empty`; type-checked
    fn entry_or(&mut self, key: &[u8], empty: Value) -> Result<&mut Entry, BackendError> {
        self.purge(key);
        let entry = self
            .entries
            .entry(key.to_vec())
            .or_insert_with(|| Entry::new(empty.clone()));
        if std::mem::discriminant(&entry.value) != std::mem::discriminant(&empty) {
            return Err(server(WRONGTYPE));
        }
        Ok(entry)
    }

    /// Remove `key` if its collection became empty
    fn drop_if_empty(&mut self, key: &[u8]) {
        if self.entries.get(key).map(|e| e.value.is_empty()).unwrap_or(false) {
            self.entries.remove(key);
        }
    }

    fn str_value(&mut self, key: &[u8]) -> Result<Option<&Vec<u8>>, BackendError> {
        match self.get(key) {
            None => Ok(None),
            Some(Entry { value: Value::Str(v), .. }) => Ok(Some(&*v)),
            Some(_) => Err(server(WRONGTYPE)),
        }
    }

    fn hash(&mut self, key: &[u8]) -> Result<Option<&mut BTreeMap<Vec<u8>, Vec<u8>>>, BackendError> {
        match self.get(key) {
            None => Ok(None),
            Some(Entry { value: Value::Hash(h), .. }) => Ok(Some(h)),
            Some(_) => Err(server(WRONGTYPE)),
        }
    }

    fn set(&mut self, key: &[u8]) -> Result<Option<&mut BTreeSet<Vec<u8>>>, BackendError> {
        match self.get(key) {
            None => Ok(None),
            Some(Entry { value: Value::Set(s), .. }) => Ok(Some(s)),
            Some(_) => Err(server(WRONGTYPE)),
        }
    }

    fn zset(&mut self, key: &[u8]) -> Result<Option<&mut BTreeMap<Vec<u8>, f64>>, BackendError> {
        match self.get(key) {
            None => Ok(None),
            Some(Entry { value: Value::ZSet(z), .. }) => Ok(Some(z)),
            Some(_) => Err(server(WRONGTYPE)),
        }
    }

    fn list(&mut self, key: &[u8]) -> Result<Option<&mut VecDeque<Vec<u8>>>, BackendError> {
        match self.get(key) {
            None => Ok(None),
            Some(Entry { value: Value::List(l), .. }) => Ok(Some(l)),
            Some(_) => Err(server(WRONGTYPE)),
        }
    }

    /// Add `delta` to the integer stored at `key`, keeping its TTL
    fn incr_by(&mut self, key: &[u8], delta: i64) -> Result<Reply, BackendError> {
        let entry = self.entry_or(key, Value::Str(b"0".to_vec()))?;
        let current = match &entry.value {
            Value::Str(v) => parse_int(v, NOT_INTEGER)?,
            _ => return Err(server(WRONGTYPE)),
        };
        let next = current.checked_add(delta).ok_or_else(|| server(NOT_INTEGER))?;
        entry.value = Value::Str(next.to_string().into_bytes());
        Ok(Reply::Int(next))
    }

    fn expire(&mut self, key: &[u8], seconds: i64) -> Result<Reply, BackendError> {
        if self.get(key).is_none() {
            return Ok(Reply::Int(0));
        }
        if seconds <= 0 {
            self.entries.remove(key);
        } else {
            let at = deadline(seconds, "expire")?;
            if let Some(entry) = self.entries.get_mut(key) {
                entry.expires_at = Some(at);
            }
        }
        Ok(Reply::Int(1))
    }

    /// Remaining TTL of `key`, if it has one
    pub(super) fn ttl(&mut self, key: &[u8]) -> Option<Duration> {
        let now = Instant::now();
        self.get(key)
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    pub(super) fn zadd(&mut self, key: &[u8], score: f64, member: &[u8]) -> Result<bool, BackendError> {
        let entry = self.entry_or(key, Value::ZSet(BTreeMap::new()))?;
        match &mut entry.value {
            Value::ZSet(z) => Ok(z.insert(member.to_vec(), score).is_none()),
            _ => Err(server(WRONGTYPE)),
        }
    }

    pub(super) fn key_count(&mut self) -> usize {
        let now = Instant::now();
        self.entries.retain(|_, e| !e.is_expired(now));
        self.entries.len()
    }

    /// Execute one command
    pub(super) fn execute(&mut self, command: &Command) -> Result<Reply, BackendError> {
        match command {
            Command::Ping => Ok(Reply::Status("PONG".to_string())),

            // -----------------------------------------------------------------
            // Strings
            // -----------------------------------------------------------------
            Command::Get { key } => Ok(self
                .str_value(key)?
                .map(|v| Reply::Bytes(v.clone()))
                .unwrap_or(Reply::Nil)),
            Command::Set { key, value } => {
                self.entries
                    .insert(key.clone(), Entry::new(Value::Str(value.clone())));
                Ok(ok())
            }
            Command::SetEx { key, seconds, value } => {
                if *seconds <= 0 {
                    return Err(server("ERR invalid expire time in 'setex' command"));
                }
                let mut entry = Entry::new(Value::Str(value.clone()));
                entry.expires_at = Some(deadline(*seconds, "setex")?);
                self.entries.insert(key.clone(), entry);
                Ok(ok())
            }
            Command::Del { key } => {
                self.purge(key);
                Ok(Reply::Int(self.entries.remove(key.as_slice()).is_some() as i64))
            }
            Command::Exists { key } => Ok(Reply::Int(self.get(key).is_some() as i64)),
            Command::Incr { key } => self.incr_by(key, 1),
            Command::IncrBy { key, delta } => self.incr_by(key, *delta),
            Command::Decr { key } => self.incr_by(key, -1),
            Command::Expire { key, seconds } => self.expire(key, *seconds),

            // -----------------------------------------------------------------
            // Hashes
            // -----------------------------------------------------------------
            Command::HGet { key, field } => Ok(self
                .hash(key)?
                .and_then(|h| h.get(field))
                .map(|v| Reply::Bytes(v.clone()))
                .unwrap_or(Reply::Nil)),
            Command::HSet { key, field, value } => {
                let entry = self.entry_or(key, Value::Hash(BTreeMap::new()))?;
                match &mut entry.value {
                    Value::Hash(h) => {
                        let added = h.insert(field.clone(), value.clone()).is_none();
                        Ok(Reply::Int(added as i64))
                    }
                    _ => Err(server(WRONGTYPE)),
                }
            }
            Command::HDel { key, field } => {
                let removed = match self.hash(key)? {
                    Some(h) => h.remove(field.as_slice()).is_some() as i64,
                    None => 0,
                };
                self.drop_if_empty(key);
                Ok(Reply::Int(removed))
            }
            Command::HGetAll { key } => Ok(Reply::Array(
                self.hash(key)?
                    .map(|h| {
                        h.iter()
                            .flat_map(|(f, v)| [Reply::Bytes(f.clone()), Reply::Bytes(v.clone())])
                            .collect()
                    })
                    .unwrap_or_default(),
            )),
            Command::HMGet { key, fields } => {
                let hash = self.hash(key)?;
                Ok(Reply::Array(
                    fields
                        .iter()
                        .map(|f| {
                            hash.as_ref()
                                .and_then(|h| h.get(f))
                                .map(|v| Reply::Bytes(v.clone()))
                                .unwrap_or(Reply::Nil)
                        })
                        .collect(),
                ))
            }
            Command::HKeys { key } => Ok(self
                .hash(key)?
                .map(|h| bulk_array(h.keys()))
                .unwrap_or(Reply::Array(Vec::new()))),
            Command::HVals { key } => Ok(self
                .hash(key)?
                .map(|h| bulk_array(h.values()))
                .unwrap_or(Reply::Array(Vec::new()))),
            Command::HLen { key } => Ok(Reply::Int(
                self.hash(key)?.map(|h| h.len() as i64).unwrap_or(0),
            )),
            Command::HIncrBy { key, field, delta } => {
                let entry = self.entry_or(key, Value::Hash(BTreeMap::new()))?;
                match &mut entry.value {
                    Value::Hash(h) => {
                        let current = match h.get(field) {
                            Some(v) => parse_int(v, HASH_NOT_INTEGER)?,
                            None => 0,
                        };
                        let next = current
                            .checked_add(*delta)
                            .ok_or_else(|| server(NOT_INTEGER))?;
                        h.insert(field.clone(), next.to_string().into_bytes());
                        Ok(Reply::Int(next))
                    }
                    _ => Err(server(WRONGTYPE)),
                }
            }
            Command::HExists { key, field } => Ok(Reply::Int(
                self.hash(key)?
                    .map(|h| h.contains_key(field.as_slice()) as i64)
                    .unwrap_or(0),
            )),

            // -----------------------------------------------------------------
            // Sets
            // -----------------------------------------------------------------
            Command::SAdd { key, member } => {
                let entry = self.entry_or(key, Value::Set(BTreeSet::new()))?;
                match &mut entry.value {
                    Value::Set(s) => Ok(Reply::Int(s.insert(member.clone()) as i64)),
                    _ => Err(server(WRONGTYPE)),
                }
            }
            Command::SRem { key, member } => {
                let removed = match self.set(key)? {
                    Some(s) => s.remove(member.as_slice()) as i64,
                    None => 0,
                };
                self.drop_if_empty(key);
                Ok(Reply::Int(removed))
            }
            Command::SIsMember { key, member } => Ok(Reply::Int(
                self.set(key)?
                    .map(|s| s.contains(member.as_slice()) as i64)
                    .unwrap_or(0),
            )),
            Command::SMembers { key } => Ok(self
                .set(key)?
                .map(|s| bulk_array(s.iter()))
                .unwrap_or(Reply::Array(Vec::new()))),
            Command::SCard { key } => Ok(Reply::Int(
                self.set(key)?.map(|s| s.len() as i64).unwrap_or(0),
            )),

            // -----------------------------------------------------------------
            // Sorted sets
            // -----------------------------------------------------------------
            Command::ZRevRank { key, member } => {
                let Some(zset) = self.zset(key)? else {
                    return Ok(Reply::Nil);
                };
                let mut ranked: Vec<(&Vec<u8>, f64)> = zset.iter().map(|(m, s)| (m, *s)).collect();
                // Highest score first, ties broken by reverse lexicographic member
                ranked.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| b.0.cmp(a.0))
                });
                Ok(ranked
                    .iter()
                    .position(|(m, _)| m.as_slice() == member.as_slice())
                    .map(|rank| Reply::Int(rank as i64))
                    .unwrap_or(Reply::Nil))
            }
            Command::ZCard { key } => Ok(Reply::Int(
                self.zset(key)?.map(|z| z.len() as i64).unwrap_or(0),
            )),
            Command::ZRem { key, member } => {
                let removed = match self.zset(key)? {
                    Some(z) => z.remove(member.as_slice()).is_some() as i64,
                    None => 0,
                };
                self.drop_if_empty(key);
                Ok(Reply::Int(removed))
            }

            // -----------------------------------------------------------------
            // Lists
            // -----------------------------------------------------------------
            Command::RPush { key, value } | Command::LPush { key, value } => {
                let head = matches!(command, Command::LPush { .. });
                let entry = self.entry_or(key, Value::List(VecDeque::new()))?;
                match &mut entry.value {
                    Value::List(l) => {
                        if head {
                            l.push_front(value.clone());
                        } else {
                            l.push_back(value.clone());
                        }
                        Ok(Reply::Int(l.len() as i64))
                    }
                    _ => Err(server(WRONGTYPE)),
                }
            }
            Command::LRange { key, start, stop } => Ok(Reply::Array(
                self.list(key)?
                    .and_then(|l| {
                        range(*start, *stop, l.len()).map(|(from, to)| {
                            l.range(from..=to).map(|v| Reply::Bytes(v.clone())).collect()
                        })
                    })
                    .unwrap_or_default(),
            )),
            Command::LIndex { key, index } => Ok(self
                .list(key)?
                .and_then(|l| {
                    let idx = if *index < 0 { l.len() as i64 + index } else { *index };
                    if idx < 0 {
                        None
                    } else {
                        l.get(idx as usize).cloned()
                    }
                })
                .map(Reply::Bytes)
                .unwrap_or(Reply::Nil)),
            Command::LPop { key } | Command::RPop { key } => {
                let head = matches!(command, Command::LPop { .. });
                let popped = match self.list(key)? {
                    Some(l) if head => l.pop_front(),
                    Some(l) => l.pop_back(),
                    None => None,
                };
                self.drop_if_empty(key);
                Ok(popped.map(Reply::Bytes).unwrap_or(Reply::Nil))
            }
            Command::LTrim { key, start, stop } => {
                if let Some(l) = self.list(key)? {
                    match range(*start, *stop, l.len()) {
                        Some((from, to)) => {
                            l.truncate(to + 1);
                            l.drain(..from);
                        }
                        None => l.clear(),
                    }
                }
                self.drop_if_empty(key);
                Ok(ok())
            }
            Command::LSet { key, index, value } => {
                let l = self.list(key)?.ok_or_else(|| server("ERR no such key"))?;
                let idx = if *index < 0 { l.len() as i64 + index } else { *index };
                if idx < 0 || idx as usize >= l.len() {
                    return Err(server("ERR index out of range"));
                }
                l[idx as usize] = value.clone();
                Ok(ok())
            }
            Command::LRem { key, count, value } => {
                let removed = match self.list(key)? {
                    Some(l) => {
                        let limit = if *count == 0 { usize::MAX } else { count.unsigned_abs() as usize };
                        let positions: Vec<usize> = if *count >= 0 {
                            (0..l.len()).filter(|&i| &l[i] == value).take(limit).collect()
                        } else {
                            (0..l.len()).rev().filter(|&i| &l[i] == value).take(limit).collect()
                        };
                        let mut sorted = positions;
                        sorted.sort_unstable_by(|a, b| b.cmp(a));
                        for i in &sorted {
                            l.remove(*i);
                        }
                        sorted.len() as i64
                    }
                    None => 0,
                };
                self.drop_if_empty(key);
                Ok(Reply::Int(removed))
            }
            Command::LLen { key } => Ok(Reply::Int(
                self.list(key)?.map(|l| l.len() as i64).unwrap_or(0),
            )),
        }
    }
}
