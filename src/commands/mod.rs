//! # Command System
//!
//! Slash command definitions, argument resolution and the invocation
//! context shared by slash (/) and prefix text commands.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 3.0.0: One definition serves both interactions and prefix messages
//! - 2.1.0: Modular handler infrastructure (callback trait, context, registry)
//! - 1.0.0: Initial command structure

pub mod args;
pub mod autocomplete;
pub mod command;
pub mod context;
pub mod group;
pub mod handler;
pub mod node;
pub mod option;
pub mod payload;
pub mod registry;
pub mod resolver;
pub mod text;
pub mod transport;
pub mod types;

pub use args::{ArgValue, Arguments};
pub use autocomplete::{Converter, SuggestionProvider};
pub use command::{Parameter, SlashCommand};
pub use context::{
    Context, ContextBase, InteractionContext, InteractionEvent, MessageContext, MessageEvent,
    ResponseState,
};
pub use group::SlashGroup;
pub use handler::{from_fn, BoxFuture, CommandCallback};
pub use node::CommandNode;
pub use option::{Choice, CommandOption, DefaultValue};
pub use payload::{InteractionData, InteractionKind, OptionData, ResolvedData, UserRecord};
pub use registry::CommandRegistry;
pub use transport::{ChannelMessenger, CommandRegistrar, InteractionResponder, TypingIndicator};
pub use types::{OptionType, ParamType};
