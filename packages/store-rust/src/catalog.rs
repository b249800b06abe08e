//! Typed command catalog.
//!
//! Each function builds a [`TypedCommand`] whose type parameter is what the
//! command's reply decodes to, so [`single`](crate::single) and
//! [`all`](crate::all) can produce typed segments without a hand-written
//! decode.

use crate::command::{Command, TypedCommand};

/// `GET key`: the value, or `None` if the key is missing.
#[must_use]
pub fn get(key: &str) -> TypedCommand<Option<String>> {
    TypedCommand::new(Command::new("GET").arg(key))
}

/// `SET key value`: always `OK`.
#[must_use]
pub fn set(key: &str, value: impl ToString) -> TypedCommand<String> {
    TypedCommand::new(Command::new("SET").arg(key).arg(value))
}

/// `DEL key...`: number of keys removed.
#[must_use]
pub fn del<I>(keys: I) -> TypedCommand<i64>
where
    I: IntoIterator,
    I::Item: ToString,
{
    TypedCommand::new(Command::new("DEL").args(keys))
}

/// `EXISTS key...`: number of the given keys that exist.
#[must_use]
pub fn exists<I>(keys: I) -> TypedCommand<i64>
where
    I: IntoIterator,
    I::Item: ToString,
{
    TypedCommand::new(Command::new("EXISTS").args(keys))
}

/// `INCR key`: the value after incrementing.
#[must_use]
pub fn incr(key: &str) -> TypedCommand<i64> {
    TypedCommand::new(Command::new("INCR").arg(key))
}

/// `INCRBY key delta`: the value after incrementing.
#[must_use]
pub fn incr_by(key: &str, delta: i64) -> TypedCommand<i64> {
    TypedCommand::new(Command::new("INCRBY").arg(key).arg(delta))
}

/// `APPEND key value`: length of the value after appending.
#[must_use]
pub fn append(key: &str, value: impl ToString) -> TypedCommand<i64> {
    TypedCommand::new(Command::new("APPEND").arg(key).arg(value))
}

/// `STRLEN key`: length of the value, 0 if missing.
#[must_use]
pub fn strlen(key: &str) -> TypedCommand<i64> {
    TypedCommand::new(Command::new("STRLEN").arg(key))
}

/// `MGET key...`: one optional value per key.
#[must_use]
pub fn mget<I>(keys: I) -> TypedCommand<Vec<Option<String>>>
where
    I: IntoIterator,
    I::Item: ToString,
{
    TypedCommand::new(Command::new("MGET").args(keys))
}

/// `PING`: `PONG`.
#[must_use]
pub fn ping() -> TypedCommand<String> {
    TypedCommand::new(Command::new("PING"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_builds_expected_commands() {
        assert_eq!(get("k").command().to_string(), "GET k");
        assert_eq!(set("k", 5).command().to_string(), "SET k 5");
        assert_eq!(del(["a", "b"]).command().to_string(), "DEL a b");
        assert_eq!(incr_by("n", -3).command().to_string(), "INCRBY n -3");
        assert_eq!(mget(vec!["x"]).command().to_string(), "MGET x");
        assert_eq!(ping().command().arguments().len(), 0);
    }
}
