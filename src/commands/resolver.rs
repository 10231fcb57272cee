//! # Argument Resolution
//!
//! Turns an invocation's raw input into the [`Arguments`] a callback
//! receives. Interactions carry a typed option tree plus a resolved side
//! table; text commands carry tokens that are converted one parameter at a
//! time. Both paths end with the same default-filling rules.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Lenient mode for autocomplete, optional-type backtracking
//! - 1.0.0: Interaction and text strategies

use async_trait::async_trait;
use log::debug;
use serenity::model::id::GuildId;

use super::args::{ArgValue, Arguments};
use super::command::{Parameter, SlashCommand};
use super::context::{Context, ContextBase};
use super::payload::{OptionData, ResolvedData};
use super::text::{parse_bool, parse_entity_id, parse_mention, MentionKind};
use super::types::{OptionType, ParamType};
use crate::core::CommandError;

/// Strategy producing the arguments for one command invocation
#[async_trait]
pub trait ArgumentResolver: Send + Sync {
    async fn resolve(&self, command: &SlashCommand, ctx: &mut Context) -> Result<Arguments, CommandError>;
}

/// Pick the strategy matching the context's origin
pub fn resolver_for(ctx: &Context) -> &'static dyn ArgumentResolver {
    static INTERACTION: InteractionResolver = InteractionResolver { lenient: false };
    static TEXT: TextResolver = TextResolver;

    if ctx.is_interaction() {
        &INTERACTION
    } else {
        &TEXT
    }
}

/// Fill every declared parameter missing from `args`, in declaration order
fn fill_defaults(command: &SlashCommand, args: &mut Arguments, lenient: bool) -> Result<(), CommandError> {
    for param in command.params() {
        if args.contains(param.name()) {
            continue;
        }
        match param.descriptor().default.fill() {
            Some(value) => args.insert(param.name(), value),
            None if lenient => {}
            None => return Err(CommandError::MissingRequiredArgument(param.name().to_string())),
        }
    }
    Ok(())
}

/// Resolves the option tree of an interaction
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionResolver {
    /// Leave missing required parameters out and keep unresolved entity
    /// ids as raw strings instead of failing
    lenient: bool,
}

impl InteractionResolver {
    pub fn strict() -> Self {
        Self { lenient: false }
    }

    /// Used for autocomplete, where the invoker has not filled every option yet
    pub fn lenient() -> Self {
        Self { lenient: true }
    }

    /// Resolve `options` against `command`, in payload order, then fill
    /// defaults in declaration order.
    pub fn resolve_options(
        &self,
        command: &SlashCommand,
        options: &[OptionData],
        resolved: &ResolvedData,
        guild_id: Option<GuildId>,
    ) -> Result<Arguments, CommandError> {
        let mut args = Arguments::new();

        for option in options {
            let param = command
                .alias_for(&option.name)
                .unwrap_or(&option.name)
                .to_string();
            match resolve_option(&param, option, resolved, guild_id) {
                Ok(Some(value)) => args.insert(param, value),
                Ok(None) => {}
                // autocomplete payloads carry raw ids without a side table
                Err(CommandError::UnresolvedEntity { id, .. }) if self.lenient => {
                    args.insert(param, ArgValue::String(id));
                }
                Err(e) => return Err(e),
            }
        }

        fill_defaults(command, &mut args, self.lenient)?;
        Ok(args)
    }
}

fn unresolved(param: &str, id: String) -> CommandError {
    CommandError::UnresolvedEntity {
        param: param.to_string(),
        id,
    }
}

/// Value of one option; `None` for nested subcommand nodes
fn resolve_option(
    param: &str,
    option: &OptionData,
    resolved: &ResolvedData,
    guild_id: Option<GuildId>,
) -> Result<Option<ArgValue>, CommandError> {
    let literal = || {
        option
            .value
            .as_ref()
            .map(ArgValue::from_literal)
            .unwrap_or(ArgValue::Null)
    };

    let kind = match option.option_type() {
        Some(kind) => kind,
        None => return Ok(Some(literal())),
    };
    if kind.is_primitive() {
        return Ok(Some(literal()));
    }

    let id = option.entity_id().unwrap_or_default();
    let value = match kind {
        OptionType::SubCommand | OptionType::SubCommandGroup => return Ok(None),
        OptionType::User => resolve_user(resolved, &id, guild_id),
        OptionType::Role => resolved.role(&id, guild_id).map(ArgValue::Role),
        OptionType::Channel => resolved.channel(&id, guild_id).map(ArgValue::Channel),
        OptionType::Mentionable => resolve_user(resolved, &id, guild_id)
            .or_else(|| resolved.role(&id, guild_id).map(ArgValue::Role)),
        _ => Some(literal()),
    };
    value.map(Some).ok_or_else(|| unresolved(param, id))
}

/// Member when the side table has one, else the bare user (DMs)
fn resolve_user(resolved: &ResolvedData, id: &str, guild_id: Option<GuildId>) -> Option<ArgValue> {
    resolved
        .member(id, guild_id)
        .map(ArgValue::Member)
        .or_else(|| resolved.user(id).map(ArgValue::User))
}

#[async_trait]
impl ArgumentResolver for InteractionResolver {
    async fn resolve(&self, command: &SlashCommand, ctx: &mut Context) -> Result<Arguments, CommandError> {
        let guild_id = ctx.guild();
        self.resolve_options(command, ctx.current_options(), ctx.resolved(), guild_id)
    }
}

/// Converts text tokens parameter by parameter
#[derive(Debug, Clone, Copy, Default)]
pub struct TextResolver;

impl TextResolver {
    async fn convert(&self, param: &Parameter, ctx: &Context, token: &str) -> Result<ArgValue, CommandError> {
        if let Some(converter) = param.converter_ref() {
            return converter.convert(ctx, token).await;
        }
        convert_token(param.name(), param.kind().display_type(), token, ctx.resolved(), ctx.guild())
    }
}

fn bad_argument(param: &str, reason: impl Into<String>) -> CommandError {
    CommandError::BadArgument {
        param: param.to_string(),
        reason: reason.into(),
    }
}

/// Convert one text token to the declared type
pub fn convert_token(
    param: &str,
    kind: &ParamType,
    token: &str,
    mentions: &ResolvedData,
    guild_id: Option<GuildId>,
) -> Result<ArgValue, CommandError> {
    let entity_id = |mention: MentionKind| {
        parse_entity_id(token, mention)
            .map(|id| id.to_string())
            .ok_or_else(|| bad_argument(param, format!("`{token}` is not a valid mention or id")))
    };

    match kind {
        ParamType::String | ParamType::Other(_) => Ok(ArgValue::from(token)),
        ParamType::Integer => token
            .parse::<i64>()
            .map(ArgValue::Integer)
            .map_err(|_| bad_argument(param, format!("`{token}` is not an integer"))),
        ParamType::Number => token
            .parse::<f64>()
            .map(ArgValue::Number)
            .map_err(|_| bad_argument(param, format!("`{token}` is not a number"))),
        ParamType::Boolean => parse_bool(token)
            .map(ArgValue::Boolean)
            .ok_or_else(|| bad_argument(param, format!("`{token}` is not a boolean"))),
        ParamType::Member | ParamType::User => {
            let id = entity_id(MentionKind::User)?;
            resolve_user(mentions, &id, guild_id).ok_or_else(|| unresolved(param, id))
        }
        ParamType::Role => {
            let id = entity_id(MentionKind::Role)?;
            mentions
                .role(&id, guild_id)
                .map(ArgValue::Role)
                .ok_or_else(|| unresolved(param, id))
        }
        ParamType::TextChannel
        | ParamType::VoiceChannel
        | ParamType::CategoryChannel
        | ParamType::Channel => {
            let id = entity_id(MentionKind::Channel)?;
            mentions
                .channel(&id, guild_id)
                .map(ArgValue::Channel)
                .ok_or_else(|| unresolved(param, id))
        }
        ParamType::Mentionable => {
            let (mention, id) = parse_mention(token)
                .ok_or_else(|| bad_argument(param, format!("`{token}` is not a mention")))?;
            let id = id.to_string();
            let value = match mention {
                MentionKind::User => resolve_user(mentions, &id, guild_id),
                MentionKind::Role => mentions.role(&id, guild_id).map(ArgValue::Role),
                MentionKind::Channel => None,
            };
            value.ok_or_else(|| unresolved(param, id))
        }
        ParamType::Optional(inner) => convert_token(param, inner, token, mentions, guild_id),
    }
}

#[async_trait]
impl ArgumentResolver for TextResolver {
    async fn resolve(&self, command: &SlashCommand, ctx: &mut Context) -> Result<Arguments, CommandError> {
        let mut tokens = std::mem::take(&mut ctx.tokens);
        let ctx = &*ctx;
        let mut args = Arguments::new();

        for param in command.params() {
            let token = if param.is_rest() {
                let rest = tokens.drain(..).collect::<Vec<_>>().join(" ");
                (!rest.is_empty()).then_some(rest)
            } else {
                tokens.pop_front()
            };
            let Some(token) = token else {
                continue;
            };

            match self.convert(param, ctx, &token).await {
                Ok(value) => args.insert(param.name(), value),
                // an optional type that does not match leaves the token for the next parameter
                Err(e) if param.kind().is_optional() && e.is_resolution_error() && !param.is_rest() => {
                    debug!(
                        "[{}] `{}` does not fit optional `{}`: {}",
                        ctx.invocation_id,
                        token,
                        param.name(),
                        e
                    );
                    tokens.push_front(token);
                }
                Err(e) => return Err(e),
            }
        }

        if !tokens.is_empty() {
            debug!(
                "[{}] Ignoring {} extra token(s) for {}",
                ctx.invocation_id,
                tokens.len(),
                command.qualified_name()
            );
        }

        fill_defaults(command, &mut args, false)?;
        Ok(args)
    }
}
