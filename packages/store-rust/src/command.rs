//! Commands: the opaque operations sent to a store in batches.
//!
//! A [`Command`] is built from a name, a flat argument list and per-call
//! [`CommandOptions`]. The segment core never looks inside a command; only
//! executors interpret it.

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

/// How bulk replies of a command are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyEncoding {
    /// Bulk replies become [`Reply::Text`](crate::Reply::Text).
    #[default]
    Utf8,
    /// Bulk replies stay binary as [`Reply::Bulk`](crate::Reply::Bulk).
    Binary,
}

/// Per-call command options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOptions {
    /// Encoding of bulk replies. Text by default.
    pub reply_encoding: ReplyEncoding,
    /// Prefix applied to every key argument.
    pub key_prefix: Option<String>,
    /// Reject the command if it would write.
    pub read_only: bool,
}

/// A single store command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    name: String,
    args: Vec<String>,
    options: CommandOptions,
}

impl Command {
    /// Create a command with no arguments and default options.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            options: CommandOptions::default(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Append every argument of `args`, flattened into the argument list.
    #[must_use]
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.args.extend(args.into_iter().map(|arg| arg.to_string()));
        self
    }

    /// Replace the per-call options.
    #[must_use]
    pub fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    /// Prefix every key argument with `prefix`.
    #[must_use]
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.key_prefix = Some(prefix.into());
        self
    }

    /// Mark the command read-only; executors reject it if it writes.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.options.read_only = true;
        self
    }

    /// Keep bulk replies binary instead of decoding them as UTF-8 text.
    #[must_use]
    pub fn binary_replies(mut self) -> Self {
        self.options.reply_encoding = ReplyEncoding::Binary;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn options(&self) -> &CommandOptions {
        &self.options
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Build a command from a name and an argument list.
///
/// Replies are text-encoded unless the options say otherwise.
#[must_use]
pub fn cmd<I>(name: &str, args: I) -> Command
where
    I: IntoIterator,
    I::Item: ToString,
{
    Command::new(name).args(args)
}

/// A [`Command`] tagged with the type its reply decodes to.
///
/// Produced by the [`catalog`](crate::catalog) functions.
pub struct TypedCommand<T> {
    command: Command,
    reply: PhantomData<fn() -> T>,
}

impl<T> TypedCommand<T> {
    /// Tag `command` with reply type `T`.
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            command,
            reply: PhantomData,
        }
    }

    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    #[must_use]
    pub fn into_command(self) -> Command {
        self.command
    }

    /// Apply `f` to the underlying command, keeping the reply type.
    #[must_use]
    pub fn configure(self, f: impl FnOnce(Command) -> Command) -> Self {
        Self::new(f(self.command))
    }
}

impl<T> Clone for TypedCommand<T> {
    fn clone(&self) -> Self {
        Self::new(self.command.clone())
    }
}

impl<T> fmt::Debug for TypedCommand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedCommand")
            .field("command", &self.command)
            .field("reply", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> From<TypedCommand<T>> for Command {
    fn from(typed: TypedCommand<T>) -> Self {
        typed.command
    }
}
