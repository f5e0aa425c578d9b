//! Error types for ggs-types.

use thiserror::Error;

/// Errors that can occur when parsing console input.
///
/// These are reported to the operator and never end a session.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Nothing but whitespace was entered.
    #[error("Empty input")]
    Empty,

    /// The first word is not a known command.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A command that needs a level was given none.
    #[error("Missing value for '{command}' (usage: {command} <level>)")]
    MissingValue { command: String },

    /// The level is not an integer.
    #[error("Invalid value for '{command}': {value}")]
    InvalidValue { command: String, value: String },

    /// Extra words after a complete command.
    #[error("Unexpected argument for '{command}': {argument}")]
    UnexpectedArgument { command: String, argument: String },
}

/// Result type alias using ggs-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
