//! Raw replies and their typed decoding.
//!
//! [`Reply`] is the raw result a store answers with for each command in a
//! batch. [`FromReply`] turns one reply into a typed value and backs the
//! typed command catalog.

use serde::{Deserialize, Serialize};

/// Raw result of a single command, before decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Missing value.
    Nil,
    /// Simple status line such as `OK` or `PONG`.
    Status(String),
    /// Signed 64-bit integer.
    Int(i64),
    /// Binary payload, returned when replies are not text-encoded.
    Bulk(Vec<u8>),
    /// Text payload, returned for UTF-8 encoded replies.
    Text(String),
    /// Ordered list of nested replies.
    Array(Vec<Reply>),
}

impl Reply {
    /// Short name of the reply variant, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Status(_) => "status",
            Self::Int(_) => "integer",
            Self::Bulk(_) => "bulk",
            Self::Text(_) => "text",
            Self::Array(_) => "array",
        }
    }
}

/// Errors from decoding a [`Reply`] into a typed value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplyError {
    #[error("expected {expected} reply, got {found}")]
    Unexpected {
        expected: &'static str,
        found: &'static str,
    },
    #[error("reply is not valid UTF-8")]
    InvalidUtf8,
    #[error("reply is not an integer: {0:?}")]
    InvalidInteger(String),
}

/// Conversion from a raw [`Reply`] into a typed value.
pub trait FromReply: Sized {
    /// Decode `reply`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError`] when the reply has the wrong shape.
    fn from_reply(reply: Reply) -> Result<Self, ReplyError>;
}

impl FromReply for Reply {
    fn from_reply(reply: Reply) -> Result<Self, ReplyError> {
        Ok(reply)
    }
}

impl FromReply for String {
    fn from_reply(reply: Reply) -> Result<Self, ReplyError> {
        match reply {
            Reply::Status(s) | Reply::Text(s) => Ok(s),
            Reply::Bulk(bytes) => String::from_utf8(bytes).map_err(|_| ReplyError::InvalidUtf8),
            other => Err(ReplyError::Unexpected {
                expected: "string",
                found: other.kind(),
            }),
        }
    }
}

impl FromReply for i64 {
    fn from_reply(reply: Reply) -> Result<Self, ReplyError> {
        match reply {
            Reply::Int(n) => Ok(n),
            Reply::Text(_) | Reply::Bulk(_) => {
                let text = String::from_reply(reply)?;
                text.parse().map_err(|_| ReplyError::InvalidInteger(text))
            }
            other => Err(ReplyError::Unexpected {
                expected: "integer",
                found: other.kind(),
            }),
        }
    }
}

impl FromReply for bool {
    fn from_reply(reply: Reply) -> Result<Self, ReplyError> {
        Ok(i64::from_reply(reply)? != 0)
    }
}

impl<T: FromReply> FromReply for Option<T> {
    fn from_reply(reply: Reply) -> Result<Self, ReplyError> {
        match reply {
            Reply::Nil => Ok(None),
            other => T::from_reply(other).map(Some),
        }
    }
}

impl<T: FromReply> FromReply for Vec<T> {
    fn from_reply(reply: Reply) -> Result<Self, ReplyError> {
        match reply {
            Reply::Array(items) => items.into_iter().map(T::from_reply).collect(),
            Reply::Nil => Ok(Vec::new()),
            other => Err(ReplyError::Unexpected {
                expected: "array",
                found: other.kind(),
            }),
        }
    }
}
