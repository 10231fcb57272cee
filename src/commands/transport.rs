//! Transport seams between the command core and the live client
//!
//! The context layer and the framework only talk to the network through
//! these traits; `serenity_adapter` provides the live implementations.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use serenity::model::id::GuildId;

use super::option::Choice;
use crate::core::{Reply, SentMessage};

/// Response endpoints of a single interaction
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    /// Send the initial response and return the delivered message
    async fn respond(&self, reply: &Reply) -> Result<SentMessage>;

    /// Acknowledge without content
    async fn defer(&self, ephemeral: bool) -> Result<()>;

    /// Send a followup message
    async fn followup(&self, reply: &Reply) -> Result<SentMessage>;

    /// Answer an autocomplete request
    async fn autocomplete(&self, choices: &[Choice]) -> Result<()>;
}

/// A running typing indicator
pub trait TypingIndicator: Send {
    fn stop(self: Box<Self>);
}

/// The channel a text command was sent in
#[async_trait]
pub trait ChannelMessenger: Send + Sync {
    async fn send_message(&self, reply: &Reply) -> Result<SentMessage>;

    fn start_typing(&self) -> Result<Box<dyn TypingIndicator>>;
}

/// Bulk-overwrite endpoints for command registration
#[async_trait]
pub trait CommandRegistrar: Send + Sync {
    async fn overwrite_global(&self, commands: &Value) -> Result<()>;

    async fn overwrite_guild(&self, guild_id: GuildId, commands: &Value) -> Result<()>;
}
