//! # Framework
//!
//! Owns the command registry and routes inbound events to it: slash
//! interactions, autocomplete requests and prefix text messages. Also keeps
//! the platform's registered commands in sync with the registry.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Interaction, autocomplete and text dispatch; startup sync

use anyhow::Result;
use log::{debug, error, info, warn};
use serde_json::Value;
use serenity::model::id::GuildId;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::commands::autocomplete;
use crate::commands::context::{Context, ContextBase};
use crate::commands::payload::InteractionKind;
use crate::commands::text::parse_text_command;
use crate::commands::transport::CommandRegistrar;
use crate::commands::CommandRegistry;
use crate::core::{CommandError, Config, DefinitionError, Reply};

/// Generic reply for failures the invoker cannot fix
pub const GENERIC_ERROR_MESSAGE: &str =
    "❌ Sorry, I encountered an error processing your command. Please try again.";

/// Dispatch settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkOptions {
    /// Prefix for text commands
    pub prefix: String,
    /// Guilds to register commands in; empty registers them globally
    pub guild_ids: Vec<GuildId>,
    pub sync_commands_on_startup: bool,
}

impl Default for FrameworkOptions {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            guild_ids: Vec::new(),
            sync_commands_on_startup: true,
        }
    }
}

impl From<&Config> for FrameworkOptions {
    fn from(config: &Config) -> Self {
        Self {
            prefix: config.command_prefix.clone(),
            guild_ids: config.guild_ids.clone(),
            sync_commands_on_startup: config.sync_commands_on_startup,
        }
    }
}

pub struct Framework {
    registry: CommandRegistry,
    options: FrameworkOptions,
    synced: AtomicBool,
}

impl Framework {
    pub fn new(registry: CommandRegistry, options: FrameworkOptions) -> Self {
        Self {
            registry,
            options,
            synced: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn options(&self) -> &FrameworkOptions {
        &self.options
    }

    /// Route an interaction. Autocomplete requests go to the suggestion
    /// bridge; everything else runs the targeted command.
    pub async fn dispatch_interaction(&self, ctx: &mut Context) -> Result<(), CommandError> {
        let (kind, name) = match ctx.interaction() {
            Some(interaction) => (interaction.event().kind, interaction.data().name.clone()),
            None => return Err(CommandError::Unsupported("interaction dispatch")),
        };
        if kind == InteractionKind::Autocomplete {
            self.dispatch_autocomplete(ctx).await?;
            return Ok(());
        }

        let id = ctx.invocation_id;
        info!(
            "[{}] 📥 Slash command /{} | User: {} | Channel: {} | Guild: {:?}",
            id,
            name,
            ctx.author().id,
            ctx.channel(),
            ctx.guild()
        );

        let node = self
            .registry
            .get(&name)
            .ok_or_else(|| CommandError::CommandNotFound(name.clone()))?;
        node.invoke(ctx).await?;

        info!("[{}] ✅ /{} completed", id, ctx.command.as_deref().unwrap_or(&name));
        Ok(())
    }

    /// Answer an autocomplete request. Returns whether choices were sent.
    pub async fn dispatch_autocomplete(&self, ctx: &mut Context) -> Result<bool, CommandError> {
        let name = ctx
            .interaction()
            .map(|i| i.data().name.clone())
            .ok_or(CommandError::Unsupported("autocomplete"))?;
        let node = self
            .registry
            .get(&name)
            .ok_or_else(|| CommandError::CommandNotFound(name.clone()))?;

        let leaf = node.find_leaf(ctx)?;
        let sent = autocomplete::respond(leaf, ctx).await?;
        if !sent {
            debug!("[{}] No suggestions sent for /{}", ctx.invocation_id, leaf.qualified_name());
        }
        Ok(sent)
    }

    /// Run a prefix text command. Returns `Ok(false)` when the message is not
    /// a command this framework knows.
    pub async fn dispatch_message(&self, ctx: &mut Context) -> Result<bool, CommandError> {
        let Some(message) = ctx.message() else {
            return Err(CommandError::Unsupported("message dispatch"));
        };
        if message.event().author.bot {
            return Ok(false);
        }
        let Some(command) = parse_text_command(&message.event().content, &self.options.prefix) else {
            return Ok(false);
        };

        let id = ctx.invocation_id;
        let Some(node) = self.registry.get(&command.name) else {
            debug!("[{}] Ignoring unknown text command `{}`", id, command.name);
            return Ok(false);
        };

        info!(
            "[{}] 🎯 Processing text command: {} | User: {} | Channel: {}",
            id,
            command.name,
            ctx.author().id,
            ctx.channel()
        );
        ctx.set_tokens(command.args);
        node.invoke(ctx).await?;

        info!("[{}] ✅ Text command {} completed", id, command.name);
        Ok(true)
    }

    /// Send the invoker an ephemeral account of a failed invocation
    pub async fn report_error(&self, ctx: &Context, err: &CommandError) {
        let id = ctx.invocation_id;
        let content = if err.is_resolution_error() {
            warn!("[{id}] ⚠️ {err}");
            format!("❌ {err}")
        } else {
            error!("[{id}] ❌ Command failed: {err}");
            GENERIC_ERROR_MESSAGE.to_string()
        };

        if let Err(why) = ctx.send(Reply::new(content).ephemeral(true)).await {
            error!("[{id}] Failed to send error message: {why}");
        }
    }

    /// Payload for a bulk overwrite of every registered command
    pub fn registration_payload(&self) -> Result<Value, DefinitionError> {
        self.registry.to_json()
    }

    /// Overwrite the platform's commands with the registry: in every
    /// configured guild, or globally when none are configured.
    pub async fn sync_commands(&self, registrar: &dyn CommandRegistrar) -> Result<()> {
        let payload = self.registration_payload()?;
        let count = payload.as_array().map_or(0, Vec::len);

        if self.options.guild_ids.is_empty() {
            registrar.overwrite_global(&payload).await?;
            info!("✅ Registered {count} global commands");
        } else {
            for guild_id in &self.options.guild_ids {
                registrar.overwrite_guild(*guild_id, &payload).await?;
                info!("✅ Registered {count} commands in guild {guild_id}");
            }
        }
        Ok(())
    }

    /// Sync once per process, when enabled. Later ready events (reconnects)
    /// are no-ops. Returns whether a sync ran.
    pub async fn sync_on_ready(&self, registrar: &dyn CommandRegistrar) -> Result<bool> {
        if !self.options.sync_commands_on_startup {
            debug!("Command sync on startup disabled");
            return Ok(false);
        }
        if self.synced.swap(true, Ordering::SeqCst) {
            debug!("Commands already synced, skipping");
            return Ok(false);
        }

        if let Err(e) = self.sync_commands(registrar).await {
            self.synced.store(false, Ordering::SeqCst);
            return Err(e);
        }
        Ok(true)
    }
}
