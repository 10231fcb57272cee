//! # Converters and Autocomplete
//!
//! A parameter can carry a [`Converter`] that turns raw text into a value.
//! Converters that also expose a [`SuggestionProvider`] are advertised with
//! `autocomplete: true` and answer the platform's autocomplete requests.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Converter capability check and the focused-option bridge

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use super::args::ArgValue;
use super::command::SlashCommand;
use super::context::Context;
use super::option::Choice;
use super::payload::OptionData;
use super::resolver::InteractionResolver;
use crate::core::CommandError;

/// Turns a raw text argument into a value
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, _ctx: &Context, argument: &str) -> Result<ArgValue, CommandError> {
        Ok(ArgValue::from(argument))
    }

    /// The suggestion capability, if this converter has one
    fn suggestions(&self) -> Option<&dyn SuggestionProvider> {
        None
    }
}

/// Produces completion choices for a partially typed value
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn get_suggestions(&self, ctx: &Context, partial: &str) -> anyhow::Result<Vec<Choice>>;
}

/// First option flagged `focused`, searched depth-first
pub fn focused_option(options: &[OptionData]) -> Option<&OptionData> {
    options.iter().find_map(|opt| {
        if opt.focused {
            Some(opt)
        } else {
            focused_option(&opt.options)
        }
    })
}

fn partial_value(option: &OptionData) -> String {
    match &option.value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Answer an autocomplete request for `command`.
///
/// Known values are resolved leniently into `ctx.args` first so providers can
/// look at sibling options. Returns `Ok(false)` when nothing was sent: no
/// option is focused, or the focused parameter has no suggestion provider.
pub async fn respond(command: &SlashCommand, ctx: &mut Context) -> Result<bool, CommandError> {
    let id = ctx.invocation_id;
    let interaction = ctx.interaction().ok_or(CommandError::Unsupported("autocomplete"))?;

    let args = InteractionResolver::lenient().resolve_options(
        command,
        ctx.current_options(),
        ctx.resolved(),
        interaction.event().guild_id,
    )?;
    ctx.args = args;

    let Some(focused) = focused_option(ctx.current_options()) else {
        debug!("[{}] Autocomplete for {} has no focused option", id, command.qualified_name());
        return Ok(false);
    };
    let partial = partial_value(focused);

    let Some(param) = command.param_for_wire_name(&focused.name) else {
        debug!("[{}] Focused option `{}` is not declared by {}", id, focused.name, command.qualified_name());
        return Ok(false);
    };
    let Some(provider) = param.converter_ref().and_then(|c| c.suggestions()) else {
        debug!("[{}] Parameter `{}` has no suggestion provider", id, param.name());
        return Ok(false);
    };

    let choices = provider
        .get_suggestions(ctx, &partial)
        .await
        .map_err(CommandError::Handler)?;
    debug!("[{}] Sending {} suggestions for `{}`", id, choices.len(), param.name());

    let interaction = ctx.interaction().ok_or(CommandError::Unsupported("autocomplete"))?;
    interaction.send_autocomplete(&choices).await?;
    Ok(true)
}
