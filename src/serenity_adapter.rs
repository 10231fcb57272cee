//! # Serenity Adapter
//!
//! Live implementations of the transport traits on top of serenity, and
//! the conversions that turn gateway events into invocation contexts.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Interaction responder, channel messenger, command registrar

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;
use serenity::http::{Http, Typing};
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandData,
};
use serenity::model::application::interaction::autocomplete::AutocompleteInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, GuildId};
use serenity::model::timestamp::Timestamp;
use serenity::model::user::User;
use serenity::prelude::Context as SerenityContext;
use std::sync::Arc;

use crate::commands::context::{
    Context, InteractionContext, InteractionEvent, MessageContext, MessageEvent,
};
use crate::commands::option::Choice;
use crate::commands::payload::{
    ChannelRecord, InteractionData, InteractionKind, MemberRecord, ResolvedData, RoleRecord,
    UserRecord,
};
use crate::commands::text::{parse_mention, tokenize, MentionKind};
use crate::commands::transport::{
    ChannelMessenger, CommandRegistrar, InteractionResponder, TypingIndicator,
};
use crate::core::{MessageOrigin, Reply, SentMessage};

fn to_chrono(timestamp: &Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0)
}

/// Copy the public state of a delivered message
pub fn sent_message(message: &Message, origin: MessageOrigin, ephemeral: bool) -> SentMessage {
    SentMessage {
        id: message.id,
        channel_id: message.channel_id,
        guild_id: message.guild_id,
        author_id: message.author.id,
        content: message.content.clone(),
        timestamp: to_chrono(&message.timestamp),
        ephemeral,
        origin,
    }
}

pub fn user_record(user: &User) -> UserRecord {
    UserRecord {
        id: user.id,
        name: user.name.clone(),
        bot: user.bot,
        avatar: user.avatar.clone(),
    }
}

/// Re-read serenity's command data in the crate's own payload shape
pub fn interaction_data(data: &CommandData) -> Result<InteractionData> {
    let value = serde_json::to_value(data)?;
    Ok(serde_json::from_value(value)?)
}

/// The serenity interaction a responder answers
#[derive(Clone)]
pub enum SerenityInteraction {
    Command(ApplicationCommandInteraction),
    Autocomplete(AutocompleteInteraction),
}

pub struct SerenityResponder {
    http: Arc<Http>,
    interaction: SerenityInteraction,
}

impl SerenityResponder {
    pub fn new(http: Arc<Http>, interaction: SerenityInteraction) -> Self {
        Self { http, interaction }
    }

    fn command(&self) -> Result<&ApplicationCommandInteraction> {
        match &self.interaction {
            SerenityInteraction::Command(command) => Ok(command),
            SerenityInteraction::Autocomplete(_) => {
                Err(anyhow!("autocomplete interactions only accept choices"))
            }
        }
    }
}

#[async_trait]
impl InteractionResponder for SerenityResponder {
    async fn respond(&self, reply: &Reply) -> Result<SentMessage> {
        let command = self.command()?;
        command
            .create_interaction_response(&self.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|data| {
                        data.content(&reply.content).ephemeral(reply.ephemeral)
                    })
            })
            .await?;

        // the response endpoint returns no message, fetch the one it created
        let message = command.get_interaction_response(&self.http).await?;
        Ok(sent_message(
            &message,
            MessageOrigin::InteractionResponse,
            reply.ephemeral,
        ))
    }

    async fn defer(&self, ephemeral: bool) -> Result<()> {
        self.command()?
            .create_interaction_response(&self.http, |response| {
                response
                    .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|data| data.ephemeral(ephemeral))
            })
            .await?;
        Ok(())
    }

    async fn followup(&self, reply: &Reply) -> Result<SentMessage> {
        let message = self
            .command()?
            .create_followup_message(&self.http, |followup| {
                followup.content(&reply.content).ephemeral(reply.ephemeral)
            })
            .await?;
        Ok(sent_message(&message, MessageOrigin::Followup, reply.ephemeral))
    }

    async fn autocomplete(&self, choices: &[Choice]) -> Result<()> {
        let SerenityInteraction::Autocomplete(interaction) = &self.interaction else {
            return Err(anyhow!("only autocomplete interactions accept choices"));
        };

        interaction
            .create_autocomplete_response(&self.http, |response| {
                for choice in choices {
                    match &choice.value {
                        Value::Number(n) if n.is_i64() => {
                            response.add_int_choice(&choice.name, n.as_i64().unwrap_or_default());
                        }
                        Value::Number(n) => {
                            response.add_number_choice(&choice.name, n.as_f64().unwrap_or_default());
                        }
                        Value::String(s) => {
                            response.add_string_choice(&choice.name, s);
                        }
                        other => {
                            response.add_string_choice(&choice.name, other.to_string());
                        }
                    }
                }
                response
            })
            .await?;
        Ok(())
    }
}

impl TypingIndicator for Typing {
    fn stop(self: Box<Self>) {
        if Typing::stop(*self).is_none() {
            debug!("Typing indicator had already stopped");
        }
    }
}

/// Channel a text command arrived in
pub struct SerenityMessenger {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl SerenityMessenger {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl ChannelMessenger for SerenityMessenger {
    async fn send_message(&self, reply: &Reply) -> Result<SentMessage> {
        let message = self.channel_id.say(&self.http, &reply.content).await?;
        Ok(sent_message(&message, MessageOrigin::Channel, false))
    }

    fn start_typing(&self) -> Result<Box<dyn TypingIndicator>> {
        let typing = self.channel_id.start_typing(&self.http)?;
        Ok(Box::new(typing))
    }
}

/// Bulk-overwrites commands through the HTTP client
pub struct SerenityRegistrar {
    http: Arc<Http>,
}

impl SerenityRegistrar {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CommandRegistrar for SerenityRegistrar {
    async fn overwrite_global(&self, commands: &Value) -> Result<()> {
        self.http.create_global_application_commands(commands).await?;
        Ok(())
    }

    async fn overwrite_guild(&self, guild_id: GuildId, commands: &Value) -> Result<()> {
        self.http
            .create_guild_application_commands(guild_id.0, commands)
            .await?;
        Ok(())
    }
}

/// Context for an application command interaction
pub fn command_context(ctx: &SerenityContext, command: &ApplicationCommandInteraction) -> Result<Context> {
    let event = InteractionEvent {
        kind: InteractionKind::ApplicationCommand,
        guild_id: command.guild_id,
        channel_id: command.channel_id,
        user: user_record(&command.user),
        data: interaction_data(&command.data)?,
    };
    let responder = SerenityResponder::new(
        ctx.http.clone(),
        SerenityInteraction::Command(command.clone()),
    );
    Ok(Context::from_interaction(InteractionContext::new(
        event,
        ctx.cache.current_user_id(),
        Arc::new(responder),
    )))
}

/// Context for an autocomplete request
pub fn autocomplete_context(ctx: &SerenityContext, interaction: &AutocompleteInteraction) -> Result<Context> {
    let event = InteractionEvent {
        kind: InteractionKind::Autocomplete,
        guild_id: interaction.guild_id,
        channel_id: interaction.channel_id,
        user: user_record(&interaction.user),
        data: interaction_data(&interaction.data)?,
    };
    let responder = SerenityResponder::new(
        ctx.http.clone(),
        SerenityInteraction::Autocomplete(interaction.clone()),
    );
    Ok(Context::from_interaction(InteractionContext::new(
        event,
        ctx.cache.current_user_id(),
        Arc::new(responder),
    )))
}

/// Side table for a text command: mentioned users, plus members, roles and
/// channels found in the cache
fn message_mentions(ctx: &SerenityContext, msg: &Message) -> ResolvedData {
    let mut resolved = ResolvedData::default();

    for user in &msg.mentions {
        let key = user.id.0.to_string();
        if let Some(guild_id) = msg.guild_id {
            if let Some(member) = ctx.cache.member(guild_id, user.id) {
                resolved.members.insert(
                    key.clone(),
                    MemberRecord {
                        user: Some(user_record(&member.user)),
                        nick: member.nick.clone(),
                        roles: member.roles.clone(),
                        joined_at: member.joined_at.as_ref().and_then(to_chrono),
                    },
                );
            }
        }
        resolved.users.insert(key, user_record(user));
    }

    let Some(guild_id) = msg.guild_id else {
        return resolved;
    };

    for role_id in &msg.mention_roles {
        if let Some(role) = ctx.cache.role(guild_id, *role_id) {
            resolved.roles.insert(
                role_id.0.to_string(),
                RoleRecord {
                    id: role.id,
                    name: role.name.clone(),
                    color: role.colour.0,
                    position: role.position,
                    mentionable: role.mentionable,
                },
            );
        }
    }

    for token in tokenize(&msg.content) {
        let Some((MentionKind::Channel, id)) = parse_mention(&token) else {
            continue;
        };
        if let Some(channel) = ctx.cache.guild_channel(ChannelId(id)) {
            resolved.channels.insert(
                id.to_string(),
                ChannelRecord {
                    id: channel.id,
                    name: Some(channel.name.clone()),
                    kind: channel.kind.num() as u8,
                    parent_id: channel.parent_id,
                },
            );
        }
    }

    resolved
}

/// Context for a text message
pub fn message_context(ctx: &SerenityContext, msg: &Message) -> Context {
    let event = MessageEvent {
        id: msg.id,
        guild_id: msg.guild_id,
        channel_id: msg.channel_id,
        author: user_record(&msg.author),
        content: msg.content.clone(),
        mentions: message_mentions(ctx, msg),
    };
    let messenger = SerenityMessenger::new(ctx.http.clone(), msg.channel_id);
    Context::from_message(MessageContext::new(
        event,
        ctx.cache.current_user_id(),
        Arc::new(messenger),
    ))
}
