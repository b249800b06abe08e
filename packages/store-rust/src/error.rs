//! Error types for commands and batch execution.

use crate::command::Command;
use crate::reply::Reply;

/// Failure of a single command inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("ERR unknown command '{name}'")]
    UnknownCommand { name: String },
    #[error("ERR wrong number of arguments for '{name}' command")]
    WrongArity { name: String },
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR increment or decrement would overflow")]
    Overflow,
    #[error("READONLY write command '{name}' sent as read-only")]
    ReadOnly { name: String },
    #[error("ERR reply is not valid UTF-8")]
    InvalidUtf8,
}

/// Failure of a whole batch, as reported by an executor.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// A command in the batch failed. The first failure in operation order
    /// is reported.
    #[error("command #{index} ({name}) failed: {source}")]
    Command {
        index: usize,
        name: String,
        #[source]
        source: CommandError,
    },
    #[error("batch timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("batch of {operations} operations exceeds the limit of {max}")]
    BatchTooLarge { operations: usize, max: usize },
}

/// Collapse per-command outcomes of an executed batch into one result.
///
/// All commands of a batch have already run; if any failed, the first
/// failure in operation order is returned and the successful replies are
/// discarded.
///
/// # Errors
///
/// Returns [`ExecutorError::Command`] for the first failed command.
pub fn try_pipeline(
    commands: &[Command],
    outcomes: Vec<Result<Reply, CommandError>>,
) -> Result<Vec<Reply>, ExecutorError> {
    outcomes
        .into_iter()
        .enumerate()
        .map(|(index, outcome)| {
            outcome.map_err(|source| ExecutorError::Command {
                index,
                name: commands
                    .get(index)
                    .map_or_else(String::new, |c| c.name().to_string()),
                source,
            })
        })
        .collect()
}
