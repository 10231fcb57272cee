// Core layer - configuration, errors and outbound response types
pub mod core;

// Command layer - definitions, argument resolution, invocation context
pub mod commands;

// Dispatch and command synchronisation
pub mod framework;

// Live transport on top of serenity
pub mod serenity_adapter;

// Re-export core config for convenience
pub use core::{CommandError, Config, DefinitionError};

pub use commands::{
    CommandNode, CommandOption, CommandRegistry, Context, ContextBase, Parameter, ParamType,
    SlashCommand, SlashGroup,
};
pub use framework::{Framework, FrameworkOptions};
