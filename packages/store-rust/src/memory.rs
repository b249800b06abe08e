//! In-memory [`BatchExecutor`] backed by [`DashMap`].
//!
//! [`MemoryStore`] interprets a small string command set. Each batch is
//! applied under a gate so concurrent batches never interleave: one call is
//! one atomic, ordered round trip. Commands after a failed command in the
//! same batch still run, the way a store pipeline does; the batch as a whole
//! then fails with the first error.

use async_trait::async_trait;
use dashmap::DashMap;
use keyseg_core::BatchExecutor;
use parking_lot::Mutex;
use tracing::debug;

use crate::command::{Command, ReplyEncoding};
use crate::error::{try_pipeline, CommandError};
use crate::reply::Reply;

/// Arity and side effects of a supported command.
#[derive(Debug, Clone, Copy)]
struct CommandSpec {
    min_args: usize,
    max_args: Option<usize>,
    writes: bool,
}

impl CommandSpec {
    const fn exact(n: usize, writes: bool) -> Self {
        Self {
            min_args: n,
            max_args: Some(n),
            writes,
        }
    }

    const fn at_least(n: usize, writes: bool) -> Self {
        Self {
            min_args: n,
            max_args: None,
            writes,
        }
    }

    fn lookup(name: &str) -> Option<Self> {
        let spec = match name {
            "GET" | "STRLEN" => Self::exact(1, false),
            "SET" | "INCRBY" | "APPEND" => Self::exact(2, true),
            "INCR" => Self::exact(1, true),
            "DEL" => Self::at_least(1, true),
            "EXISTS" | "MGET" => Self::at_least(1, false),
            "PING" => Self {
                min_args: 0,
                max_args: Some(1),
                writes: false,
            },
            _ => return None,
        };
        Some(spec)
    }

    fn accepts(self, args: usize) -> bool {
        args >= self.min_args && self.max_args.map_or(true, |max| args <= max)
    }
}

/// In-memory string key-value store that executes command batches.
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
    batch_gate: Mutex<()>,
}

impl MemoryStore {
    /// Creates a new, empty `MemoryStore`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            batch_gate: Mutex::new(()),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current value of `key`, bypassing the command layer.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).map(|v| v.clone())
    }

    /// Apply one command and return its reply.
    fn apply(&self, command: &Command) -> Result<Reply, CommandError> {
        let name = command.name().to_ascii_uppercase();
        let spec = CommandSpec::lookup(&name).ok_or_else(|| CommandError::UnknownCommand {
            name: command.name().to_string(),
        })?;

        let args = command.arguments();
        if !spec.accepts(args.len()) {
            return Err(CommandError::WrongArity { name });
        }
        if spec.writes && command.options().read_only {
            return Err(CommandError::ReadOnly { name });
        }

        let prefix = command.options().key_prefix.as_deref().unwrap_or("");
        let key = |arg: &str| format!("{prefix}{arg}");

        let reply = match name.as_str() {
            "GET" => self.get(&key(&args[0])),
            "SET" => {
                self.entries.insert(key(&args[0]), args[1].as_bytes().to_vec());
                Reply::Status("OK".to_string())
            }
            "DEL" => {
                let removed = args.iter().filter(|k| self.entries.remove(&key(k)).is_some());
                Reply::Int(count(removed))
            }
            "EXISTS" => {
                let present = args.iter().filter(|k| self.entries.contains_key(&key(k)));
                Reply::Int(count(present))
            }
            "INCR" => Reply::Int(self.incr_by(key(&args[0]), 1)?),
            "INCRBY" => {
                let delta = args[1].parse().map_err(|_| CommandError::NotAnInteger)?;
                Reply::Int(self.incr_by(key(&args[0]), delta)?)
            }
            "APPEND" => {
                let mut value = self.entries.entry(key(&args[0])).or_default();
                value.extend_from_slice(args[1].as_bytes());
                Reply::Int(length(&value))
            }
            "STRLEN" => Reply::Int(self.entries.get(&key(&args[0])).map_or(0, |v| length(&v))),
            "MGET" => Reply::Array(args.iter().map(|k| self.get(&key(k))).collect()),
            "PING" => match args.first() {
                Some(message) => Reply::Bulk(message.as_bytes().to_vec()),
                None => Reply::Status("PONG".to_string()),
            },
            _ => return Err(CommandError::UnknownCommand { name }),
        };

        encode(reply, command.options().reply_encoding)
    }

    fn get(&self, key: &str) -> Reply {
        self.entries
            .get(key)
            .map_or(Reply::Nil, |v| Reply::Bulk(v.clone()))
    }

    fn incr_by(&self, key: String, delta: i64) -> Result<i64, CommandError> {
        let mut value = self.entries.entry(key).or_insert_with(|| b"0".to_vec());
        let current: i64 = std::str::from_utf8(&value)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(CommandError::NotAnInteger)?;
        let next = current.checked_add(delta).ok_or(CommandError::Overflow)?;
        *value = next.to_string().into_bytes();
        Ok(next)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BatchExecutor<Command, Reply> for MemoryStore {
    async fn execute(&self, operations: &[Command]) -> anyhow::Result<Vec<Reply>> {
        debug!(operations = operations.len(), "applying batch");
        let outcomes: Vec<Result<Reply, CommandError>> = {
            let _batch = self.batch_gate.lock();
            operations.iter().map(|command| self.apply(command)).collect()
        };
        Ok(try_pipeline(operations, outcomes)?)
    }
}

/// Convert bulk replies to text when the command asked for UTF-8 replies.
fn encode(reply: Reply, encoding: ReplyEncoding) -> Result<Reply, CommandError> {
    match (reply, encoding) {
        (Reply::Bulk(bytes), ReplyEncoding::Utf8) => String::from_utf8(bytes)
            .map(Reply::Text)
            .map_err(|_| CommandError::InvalidUtf8),
        (Reply::Array(items), encoding) => items
            .into_iter()
            .map(|item| encode(item, encoding))
            .collect::<Result<_, _>>()
            .map(Reply::Array),
        (reply, _) => Ok(reply),
    }
}

// Key counts and value lengths are bounded by memory, far below i64::MAX.
#[allow(clippy::cast_possible_wrap)]
fn count<I: Iterator>(items: I) -> i64 {
    items.count() as i64
}

#[allow(clippy::cast_possible_wrap)]
fn length(value: &[u8]) -> i64 {
    value.len() as i64
}
