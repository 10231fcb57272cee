//! Error taxonomy for command definition and invocation
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use thiserror::Error;

/// Raised while building or registering the command tree.
///
/// These are fatal: a bot must not start with a malformed tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("parameter `{param}` of command `{command}` has no option descriptor")]
    MissingOption { command: String, param: String },

    #[error("maximum group depth exceeded by `{0}`")]
    MaxDepthExceeded(String),

    #[error("invalid name `{0}` (1-32 chars of lowercase letters, digits, `_` or `-`)")]
    InvalidName(String),

    #[error("description of `{0}` is longer than 100 characters")]
    DescriptionTooLong(String),

    #[error("option `{option}` has {count} choices (max 25)")]
    TooManyChoices { option: String, count: usize },

    #[error("command `{command}` declares option `{option}` twice")]
    DuplicateOption { command: String, option: String },

    #[error("a command named `{0}` is already registered")]
    DuplicateCommand(String),
}

/// Raised during a single invocation.
///
/// Resolution errors are recoverable: the framework hands them to the
/// error reporter instead of letting them escape the invocation task.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing required argument `{0}`")]
    MissingRequiredArgument(String),

    #[error("could not convert argument `{param}`: {reason}")]
    BadArgument { param: String, reason: String },

    #[error("argument `{param}` references {id}, which is not in the resolved data")]
    UnresolvedEntity { param: String, id: String },

    #[error("command `{0}` not found")]
    CommandNotFound(String),

    #[error("group `{0}` was invoked without a subcommand")]
    MissingSubcommand(String),

    #[error("{0} is not supported by this context")]
    Unsupported(&'static str),

    #[error("failed to deliver response: {0}")]
    Transport(#[source] anyhow::Error),

    #[error(transparent)]
    Handler(anyhow::Error),
}

impl CommandError {
    /// Recover a typed error a callback propagated with `?`, wrapping
    /// anything else as a handler failure
    pub fn from_handler(err: anyhow::Error) -> Self {
        err.downcast::<CommandError>()
            .unwrap_or_else(CommandError::Handler)
    }

    /// Whether this error came from argument resolution or command lookup
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            CommandError::MissingRequiredArgument(_)
                | CommandError::BadArgument { .. }
                | CommandError::UnresolvedEntity { .. }
                | CommandError::CommandNotFound(_)
                | CommandError::MissingSubcommand(_)
        )
    }
}
