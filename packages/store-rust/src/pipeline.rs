//! Segment constructors for store commands.

use anyhow::Context;
use keyseg_core::Segment;

use crate::command::{Command, TypedCommand};
use crate::reply::{FromReply, Reply};

/// A segment of store commands.
pub type Pipeline<R> = Segment<Command, Reply, R>;

/// One typed command, decoded with its catalog reply type.
#[must_use]
pub fn single<T>(command: TypedCommand<T>) -> Pipeline<T>
where
    T: FromReply + Send + 'static,
{
    let name = command.command().name().to_string();
    Segment::from_operations(vec![command.into_command()], move |raw: Vec<Reply>| {
        let reply = raw.into_iter().next().context("missing reply")?;
        T::from_reply(reply).with_context(|| format!("decoding {name} reply"))
    })
}

/// Several commands with the same reply type, decoded in order.
#[must_use]
pub fn all<T>(commands: Vec<TypedCommand<T>>) -> Pipeline<Vec<T>>
where
    T: FromReply + Send + 'static,
{
    let operations = commands.into_iter().map(TypedCommand::into_command).collect();
    Segment::from_operations(operations, |raw: Vec<Reply>| {
        raw.into_iter()
            .map(|reply| T::from_reply(reply).map_err(anyhow::Error::from))
            .collect()
    })
}

/// Untyped commands; the segment decodes to the raw replies.
#[must_use]
pub fn replies(commands: Vec<Command>) -> Pipeline<Vec<Reply>> {
    Segment::from_operations(commands, Ok)
}
