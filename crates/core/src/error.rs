//! Errors reported by command execution
//!
//! Only malformed invocations are errors. "Nothing to do" outcomes such as an
//! empty selection, a missing page or an empty undo stack are silent and show
//! up as a `false` result instead.

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// No factory is registered under this name
    #[error("command does not exist: <{0}>")]
    UnknownCommand(String),

    #[error("<{command}> expected {expected} arguments but received {received}")]
    ArgumentArity { command: &'static str, expected: &'static str, received: usize },

    #[error("<{command}> argument {index} is not a number: {value:?}")]
    ArgumentParse { command: &'static str, index: usize, value: String },
}
