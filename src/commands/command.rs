//! # Slash Command Definitions
//!
//! A [`SlashCommand`] is a leaf of the command tree: its declared parameters,
//! the wire JSON they serialise to, and the callback that runs once the
//! arguments are resolved.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Usage signature and definition validation
//! - 1.0.0: Parameters, option aliases, depth-derived JSON type

use log::debug;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::args::Arguments;
use super::autocomplete::Converter;
use super::context::{Context, ContextBase};
use super::handler::{from_fn, BoxFuture, CommandCallback};
use super::option::{CommandOption, DefaultValue, NO_DESCRIPTION};
use super::resolver::resolver_for;
use super::types::{ApplicationCommandType, OptionType, ParamType};
use crate::core::{CommandError, DefinitionError};

/// Deepest nesting level a node may sit at (0 is top level)
pub const MAX_DEPTH: usize = 2;

const MAX_NAME_LEN: usize = 32;
const MAX_DESCRIPTION_LEN: usize = 100;
const MAX_CHOICES: usize = 25;

/// Check a command, group or option name against the platform rules
pub(crate) fn validate_name(name: &str) -> Result<(), DefinitionError> {
    let valid = !name.is_empty()
        && name.chars().count() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DefinitionError::InvalidName(name.to_string()))
    }
}

pub(crate) fn validate_description(owner: &str, description: &str) -> Result<(), DefinitionError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(DefinitionError::DescriptionTooLong(owner.to_string()));
    }
    Ok(())
}

/// First line of a description, or the platform-safe fallback
pub(crate) fn first_line(description: Option<&str>) -> &str {
    description
        .and_then(|d| d.lines().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or(NO_DESCRIPTION)
}

/// Descriptor used when a parameter was declared without one
static UNDESCRIBED: CommandOption = CommandOption {
    display_name: None,
    description: None,
    default: DefaultValue::Required,
    choices: Vec::new(),
};

/// One declared parameter of a command callback
#[derive(Clone)]
pub struct Parameter {
    name: String,
    kind: ParamType,
    option: Option<CommandOption>,
    converter: Option<Arc<dyn Converter>>,
    rest: bool,
}

impl Parameter {
    /// A parameter still lacking its option descriptor; registration fails
    /// until [`Parameter::option`] supplies one.
    pub fn new(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            option: None,
            converter: None,
            rest: false,
        }
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.option = Some(option);
        self
    }

    pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Take the rest of a text command as this argument
    pub fn consume_rest(mut self) -> Self {
        self.rest = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ParamType {
        &self.kind
    }

    pub fn descriptor(&self) -> &CommandOption {
        self.option.as_ref().unwrap_or(&UNDESCRIBED)
    }

    pub fn has_descriptor(&self) -> bool {
        self.option.is_some()
    }

    pub fn converter_ref(&self) -> Option<&dyn Converter> {
        self.converter.as_deref()
    }

    pub fn is_rest(&self) -> bool {
        self.rest
    }

    pub fn is_required(&self) -> bool {
        self.descriptor().is_required()
    }

    /// Name the platform sees
    pub fn wire_name(&self) -> &str {
        self.descriptor().display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn has_suggestions(&self) -> bool {
        self.converter
            .as_ref()
            .map_or(false, |c| c.suggestions().is_some())
    }

    fn to_json(&self) -> Value {
        let option = self.descriptor();
        let mut obj = Map::new();
        obj.insert("name".into(), json!(self.wire_name()));
        obj.insert("type".into(), json!(self.kind.option_type()));
        obj.insert("description".into(), json!(option.description_or_default()));
        obj.insert("required".into(), json!(option.is_required()));
        obj.insert("choices".into(), json!(option.choices));
        if self.has_suggestions() {
            obj.insert("autocomplete".into(), json!(true));
        }
        Value::Object(obj)
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("option", &self.option)
            .field("converter", &self.converter.is_some())
            .field("rest", &self.rest)
            .finish()
    }
}

/// A leaf command
#[derive(Clone)]
pub struct SlashCommand {
    name: String,
    description: Option<String>,
    usage: Option<String>,
    params: Vec<Parameter>,
    /// Wire option name to internal parameter name
    option_aliases: HashMap<String, String>,
    parents: Vec<String>,
    callback: Arc<dyn CommandCallback>,
    auto_defer: Option<bool>,
}

impl SlashCommand {
    pub fn new(name: impl Into<String>, callback: impl CommandCallback + 'static) -> Self {
        Self::with_callback(name, Arc::new(callback))
    }

    pub fn with_callback(name: impl Into<String>, callback: Arc<dyn CommandCallback>) -> Self {
        Self {
            name: name.into(),
            description: None,
            usage: None,
            params: Vec::new(),
            option_aliases: HashMap::new(),
            parents: Vec::new(),
            callback,
            auto_defer: None,
        }
    }

    /// Build from a plain function returning a boxed future
    pub fn from_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a Context, Arguments) -> BoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        Self::with_callback(name, from_fn(f))
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the generated usage signature
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.option_aliases
            .insert(param.wire_name().to_string(), param.name.clone());
        self.params.push(param);
        self
    }

    /// Defer before running the callback, so slow callbacks answer through
    /// the followup path
    pub fn auto_defer(mut self, ephemeral: bool) -> Self {
        self.auto_defer = Some(ephemeral);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    /// Parents and name, space separated
    pub fn qualified_name(&self) -> String {
        let mut parts = self.parents.clone();
        parts.push(self.name.clone());
        parts.join(" ")
    }

    pub fn short_description(&self) -> &str {
        first_line(self.description.as_deref())
    }

    /// Internal parameter name behind a wire option name
    pub fn alias_for(&self, wire_name: &str) -> Option<&str> {
        self.option_aliases.get(wire_name).map(String::as_str)
    }

    pub fn param_for_wire_name(&self, wire_name: &str) -> Option<&Parameter> {
        let name = self.alias_for(wire_name)?;
        self.params.iter().find(|p| p.name == name)
    }

    pub(crate) fn set_parents(&mut self, parents: Vec<String>) -> Result<(), DefinitionError> {
        if parents.len() > MAX_DEPTH {
            return Err(DefinitionError::MaxDepthExceeded(self.name.clone()));
        }
        self.parents = parents;
        Ok(())
    }

    /// Check names, descriptions, descriptors and choices
    pub fn validate(&self) -> Result<(), DefinitionError> {
        validate_name(&self.name)?;
        validate_description(&self.name, self.short_description())?;

        let mut seen = HashSet::new();
        for param in &self.params {
            if !param.has_descriptor() {
                return Err(DefinitionError::MissingOption {
                    command: self.qualified_name(),
                    param: param.name.clone(),
                });
            }
            let wire = param.wire_name();
            validate_name(wire)?;
            validate_description(wire, param.descriptor().description_or_default())?;

            let count = param.descriptor().choices.len();
            if count > MAX_CHOICES {
                return Err(DefinitionError::TooManyChoices {
                    option: wire.to_string(),
                    count,
                });
            }
            if !seen.insert(wire) {
                return Err(DefinitionError::DuplicateOption {
                    command: self.qualified_name(),
                    option: wire.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Wire JSON for registration. The type follows the nesting depth:
    /// a chat-input command at the top level, a subcommand below it.
    pub fn to_json(&self) -> Result<Value, DefinitionError> {
        let kind = match self.depth() {
            0 => ApplicationCommandType::ChatInput.value(),
            1..=MAX_DEPTH => OptionType::SubCommand.value(),
            _ => return Err(DefinitionError::MaxDepthExceeded(self.qualified_name())),
        };
        let options: Vec<Value> = self.params.iter().map(Parameter::to_json).collect();

        Ok(json!({
            "name": self.name,
            "description": self.short_description(),
            "type": kind,
            "options": options,
        }))
    }

    /// Human-readable usage string
    pub fn signature(&self) -> String {
        if let Some(usage) = &self.usage {
            return usage.clone();
        }

        let mut result = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let name = &param.name;
            let option = param.descriptor();
            match &option.default {
                DefaultValue::Value(default) if default.is_printable_default() => {
                    if param.rest {
                        result.push(format!("[{name}={default}]..."));
                    } else {
                        result.push(format!("[{name}={default}]"));
                    }
                }
                DefaultValue::Value(_) | DefaultValue::Unset => {
                    if param.rest {
                        result.push(format!("[{name}...]"));
                    } else {
                        result.push(format!("[{name}]"));
                    }
                }
                DefaultValue::Required if param.rest => result.push(format!("<{name}...>")),
                DefaultValue::Required if param.kind.is_optional() => {
                    result.push(format!("[{name}]"))
                }
                DefaultValue::Required => result.push(format!("<{name}>")),
            }
        }
        result.join(" ")
    }

    /// Resolve arguments for this command and run its callback
    pub async fn invoke(&self, ctx: &mut Context) -> Result<(), CommandError> {
        ctx.command = Some(self.qualified_name());

        let args = resolver_for(ctx).resolve(self, ctx).await?;
        ctx.args = args.clone();
        debug!(
            "[{}] Resolved {} argument(s) for {}",
            ctx.invocation_id,
            args.len(),
            self.qualified_name()
        );

        if let Some(ephemeral) = self.auto_defer {
            ctx.defer(ephemeral).await?;
        }

        self.callback
            .call(ctx, args)
            .await
            .map_err(CommandError::from_handler)
    }
}

impl fmt::Debug for SlashCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashCommand")
            .field("name", &self.name)
            .field("parents", &self.parents)
            .field("params", &self.params)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::args::ArgValue;
    use crate::commands::autocomplete::tests::Colors;
    use crate::commands::context::tests::{interaction_context, message_context};
    use crate::commands::handler::tests::Recorder;
    use crate::commands::payload::ResolvedData;
    use crate::commands::transport::mock::{Call, CallLog};
    use crate::core::Reply;

    fn echo(recorder: Recorder) -> SlashCommand {
        SlashCommand::new("echo", recorder)
            .description("Repeat a message\n\nLonger help text.")
            .param(
                Parameter::new("text", ParamType::String)
                    .option(CommandOption::required("What to say"))
                    .consume_rest(),
            )
            .param(
                Parameter::new("times", ParamType::Integer)
                    .option(CommandOption::with_default("How often", 1i64).display_name("count")),
            )
    }

    #[test]
    fn test_to_json_shape() {
        let cmd = echo(Recorder::default());
        let json = cmd.to_json().unwrap();
        assert_eq!(
            json,
            json!({
                "name": "echo",
                "description": "Repeat a message",
                "type": 1,
                "options": [
                    { "name": "text", "type": 3, "description": "What to say", "required": true, "choices": [] },
                    { "name": "count", "type": 4, "description": "How often", "required": false, "choices": [] }
                ]
            })
        );
    }

    #[test]
    fn test_to_json_is_pure() {
        let cmd = echo(Recorder::default());
        assert_eq!(cmd.to_json().unwrap(), cmd.to_json().unwrap());
    }

    #[test]
    fn test_to_json_autocomplete_flag() {
        let cmd = SlashCommand::new("paint", Recorder::default())
            .param(
                Parameter::new("color", ParamType::String)
                    .option(CommandOption::required("Color"))
                    .converter(Arc::new(Colors)),
            )
            .param(Parameter::new("size", ParamType::Integer).option(CommandOption::optional("Size")));
        let json = cmd.to_json().unwrap();
        assert_eq!(json["options"][0]["autocomplete"], json!(true));
        assert!(json["options"][1].get("autocomplete").is_none());
        assert_eq!(json["description"], json!(NO_DESCRIPTION));
    }

    #[test]
    fn test_to_json_subcommand_depths() {
        let mut cmd = echo(Recorder::default());
        cmd.set_parents(vec!["tools".into()]).unwrap();
        assert_eq!(cmd.to_json().unwrap()["type"], json!(1));
        cmd.set_parents(vec!["tools".into(), "text".into()]).unwrap();
        assert_eq!(cmd.qualified_name(), "tools text echo");

        let err = cmd
            .set_parents(vec!["a".into(), "b".into(), "c".into()])
            .unwrap_err();
        assert_eq!(err, DefinitionError::MaxDepthExceeded("echo".into()));
    }

    #[test]
    fn test_optional_type_maps_to_inner() {
        let cmd = SlashCommand::new("limit", Recorder::default()).param(
            Parameter::new("n", ParamType::optional(ParamType::Integer))
                .option(CommandOption::required("N")),
        );
        assert_eq!(cmd.to_json().unwrap()["options"][0]["type"], json!(4));
        assert_eq!(cmd.signature(), "[n]");
    }

    #[test]
    fn test_signature() {
        let cmd = SlashCommand::new("ban", Recorder::default())
            .param(Parameter::new("user", ParamType::Member).option(CommandOption::required("Who")))
            .param(Parameter::new("days", ParamType::Integer).option(CommandOption::with_default("Days", 7i64)))
            .param(Parameter::new("note", ParamType::String).option(CommandOption::with_default("Note", "")))
            .param(
                Parameter::new("reason", ParamType::String)
                    .option(CommandOption::optional("Why"))
                    .consume_rest(),
            );
        assert_eq!(cmd.signature(), "<user> [days=7] [note] [reason...]");
        assert_eq!(echo(Recorder::default()).signature(), "<text...> [times=1]");
        assert_eq!(cmd.clone().usage("<user> [why]").signature(), "<user> [why]");
    }

    #[test]
    fn test_validate_missing_option() {
        let cmd = SlashCommand::new("kick", Recorder::default())
            .param(Parameter::new("user", ParamType::Member));
        assert_eq!(
            cmd.validate().unwrap_err(),
            DefinitionError::MissingOption {
                command: "kick".into(),
                param: "user".into()
            }
        );
    }

    #[test]
    fn test_validate_names_and_limits() {
        assert!(echo(Recorder::default()).validate().is_ok());
        assert!(matches!(
            SlashCommand::new("Echo", Recorder::default()).validate(),
            Err(DefinitionError::InvalidName(_))
        ));
        assert!(matches!(
            SlashCommand::new("x", Recorder::default())
                .description("d".repeat(101))
                .validate(),
            Err(DefinitionError::DescriptionTooLong(_))
        ));

        let mut option = CommandOption::required("Pick");
        for i in 0..26 {
            option = option.choice(format!("c{i}"), i);
        }
        let cmd = SlashCommand::new("pick", Recorder::default())
            .param(Parameter::new("v", ParamType::Integer).option(option));
        assert_eq!(
            cmd.validate().unwrap_err(),
            DefinitionError::TooManyChoices {
                option: "v".into(),
                count: 26
            }
        );
    }

    #[test]
    fn test_validate_duplicate_wire_name() {
        let cmd = SlashCommand::new("dup", Recorder::default())
            .param(Parameter::new("a", ParamType::String).option(CommandOption::required("A")))
            .param(
                Parameter::new("b", ParamType::String)
                    .option(CommandOption::required("B").display_name("a")),
            );
        assert!(matches!(
            cmd.validate(),
            Err(DefinitionError::DuplicateOption { .. })
        ));
    }

    #[tokio::test]
    async fn test_invoke_from_interaction_uses_aliases_and_defaults() {
        let recorder = Recorder::replying("ok");
        let cmd = echo(recorder.clone());
        let log = CallLog::default();
        let mut ctx = interaction_context(
            json!({ "name": "echo", "options": [{ "name": "text", "type": 3, "value": "hi" }] }),
            &log,
        );

        cmd.invoke(&mut ctx).await.unwrap();

        let args = &recorder.calls()[0];
        assert_eq!(args.get_str("text"), Some("hi"));
        assert_eq!(args.get("times"), Some(&ArgValue::Integer(1)));
        assert_eq!(ctx.command.as_deref(), Some("echo"));
        assert_eq!(log.calls(), vec![Call::Respond(Reply::new("ok"))]);
    }

    #[tokio::test]
    async fn test_invoke_from_text() {
        let recorder = Recorder::default();
        let cmd = echo(recorder.clone());
        let log = CallLog::default();
        let mut ctx = message_context("!echo hello there", ResolvedData::default(), &log);
        ctx.set_tokens(["hello".to_string(), "there".to_string()]);

        cmd.invoke(&mut ctx).await.unwrap();
        assert_eq!(recorder.calls()[0].get_str("text"), Some("hello there"));
    }

    #[tokio::test]
    async fn test_invoke_missing_required() {
        let recorder = Recorder::default();
        let cmd = echo(recorder.clone());
        let log = CallLog::default();
        let mut ctx = interaction_context(json!({ "name": "echo" }), &log);

        let err = cmd.invoke(&mut ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::MissingRequiredArgument(ref p) if p == "text"));
        assert!(recorder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_auto_defer() {
        let recorder = Recorder::replying("slow answer");
        let cmd = SlashCommand::new("slow", recorder).auto_defer(true);
        let log = CallLog::default();
        let mut ctx = interaction_context(json!({ "name": "slow" }), &log);

        cmd.invoke(&mut ctx).await.unwrap();
        assert_eq!(
            log.calls(),
            vec![Call::Defer(true), Call::Followup(Reply::new("slow answer"))]
        );
    }

    #[tokio::test]
    async fn test_handler_error_is_wrapped() {
        let cmd = SlashCommand::from_fn("fail", |_ctx, _args| {
            Box::pin(async { Err::<(), _>(anyhow::anyhow!("database unavailable")) })
        });
        let log = CallLog::default();
        let mut ctx = interaction_context(json!({ "name": "fail" }), &log);

        let err = cmd.invoke(&mut ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::Handler(_)));
        assert_eq!(err.to_string(), "database unavailable");
    }
}
