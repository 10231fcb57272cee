//! # Command Groups
//!
//! A [`SlashGroup`] holds child commands and subgroups. On the wire a group
//! is a chat-input command at the top level and a subcommand group one
//! level down; nesting stops there.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Child registry, depth cap, dispatch recursion

use log::debug;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use super::args::Arguments;
use super::command::{first_line, validate_description, validate_name, MAX_DEPTH};
use super::context::Context;
use super::handler::CommandCallback;
use super::node::CommandNode;
use super::types::{ApplicationCommandType, OptionType};
use crate::core::{CommandError, DefinitionError};

/// A named collection of child commands
#[derive(Clone)]
pub struct SlashGroup {
    name: String,
    description: Option<String>,
    parents: Vec<String>,
    commands: Vec<CommandNode>,
    callback: Option<Arc<dyn CommandCallback>>,
    invoke_without_command: bool,
}

impl SlashGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parents: Vec::new(),
            commands: Vec::new(),
            callback: None,
            invoke_without_command: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Callback of the group itself
    pub fn callback(mut self, callback: impl CommandCallback + 'static) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Run the group callback, with no arguments, before every subcommand.
    /// A text invocation naming no subcommand then counts as handled.
    /// Autocomplete walks the tree with `CommandNode::find_leaf` and never
    /// runs this callback.
    pub fn invoke_without_command(mut self, enabled: bool) -> Self {
        self.invoke_without_command = enabled;
        self
    }

    /// Builder form of [`SlashGroup::add_command`]
    pub fn command(mut self, node: impl Into<CommandNode>) -> Result<Self, DefinitionError> {
        self.add_command(node)?;
        Ok(self)
    }

    /// Attach a child below this group. Fails when a child with the same
    /// name exists or the child would sit deeper than the nesting limit.
    pub fn add_command(&mut self, node: impl Into<CommandNode>) -> Result<(), DefinitionError> {
        let mut node = node.into();
        if self.get_command(node.name()).is_some() {
            return Err(DefinitionError::DuplicateCommand(format!(
                "{} {}",
                self.qualified_name(),
                node.name()
            )));
        }
        node.set_parents(self.child_parents())?;
        self.commands.push(node);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn commands(&self) -> &[CommandNode] {
        &self.commands
    }

    pub fn get_command(&self, name: &str) -> Option<&CommandNode> {
        self.commands.iter().find(|c| c.name() == name)
    }

    pub fn depth(&self) -> usize {
        self.parents.len()
    }

    pub fn qualified_name(&self) -> String {
        let mut parts = self.parents.clone();
        parts.push(self.name.clone());
        parts.join(" ")
    }

    pub fn short_description(&self) -> &str {
        first_line(self.description.as_deref())
    }

    fn child_parents(&self) -> Vec<String> {
        let mut parents = self.parents.clone();
        parents.push(self.name.clone());
        parents
    }

    /// Re-root this group, re-checking the depth of every descendant
    pub(crate) fn set_parents(&mut self, parents: Vec<String>) -> Result<(), DefinitionError> {
        if parents.len() >= MAX_DEPTH {
            return Err(DefinitionError::MaxDepthExceeded(self.name.clone()));
        }
        self.parents = parents;
        let child_parents = self.child_parents();
        for child in &mut self.commands {
            child.set_parents(child_parents.clone())?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        validate_name(&self.name)?;
        validate_description(&self.name, self.short_description())?;
        self.commands.iter().try_for_each(CommandNode::validate)
    }

    /// Wire JSON: a chat-input command at depth 0, a subcommand group at depth 1
    pub fn to_json(&self) -> Result<Value, DefinitionError> {
        let kind = match self.depth() {
            0 => ApplicationCommandType::ChatInput.value(),
            1 => OptionType::SubCommandGroup.value(),
            _ => return Err(DefinitionError::MaxDepthExceeded(self.qualified_name())),
        };
        let options = self
            .commands
            .iter()
            .map(CommandNode::to_json)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(json!({
            "name": self.name,
            "description": self.short_description(),
            "type": kind,
            "options": options,
        }))
    }

    /// Pick the child the invocation targets
    pub(crate) fn select_child(&self, ctx: &Context) -> Result<&CommandNode, CommandError> {
        let requested = if ctx.is_interaction() {
            ctx.current_options().first().map(|o| o.name.as_str())
        } else {
            ctx.tokens.front().map(String::as_str)
        };

        let Some(requested) = requested else {
            return Err(CommandError::MissingSubcommand(self.qualified_name()));
        };
        self.get_command(requested)
            .ok_or_else(|| CommandError::CommandNotFound(format!("{} {}", self.qualified_name(), requested)))
    }

    /// Consume this level's subcommand name and move `ctx` one level down
    pub(crate) fn descend(&self, ctx: &mut Context, child: &str) {
        ctx.invoked_parents.push(self.name.clone());
        ctx.invoked_subcommand = Some(child.to_string());
        if ctx.is_interaction() {
            let nested = ctx
                .current_options()
                .first()
                .map(|o| o.options.clone())
                .unwrap_or_default();
            ctx.options = Some(nested);
        } else {
            ctx.tokens.pop_front();
        }
    }

    async fn run_callback(&self, ctx: &mut Context) -> Result<bool, CommandError> {
        let Some(callback) = &self.callback else {
            return Ok(false);
        };
        ctx.command = Some(self.qualified_name());
        ctx.args = Arguments::new();
        debug!("[{}] Invoking group callback of {}", ctx.invocation_id, self.qualified_name());
        callback
            .call(ctx, Arguments::new())
            .await
            .map_err(CommandError::from_handler)?;
        Ok(true)
    }

    /// Dispatch to the targeted child, recursing through nested groups
    pub async fn invoke(&self, ctx: &mut Context) -> Result<(), CommandError> {
        let ran_callback = if self.invoke_without_command {
            self.run_callback(ctx).await?
        } else {
            false
        };

        let child = match self.select_child(ctx) {
            Ok(child) => child,
            Err(CommandError::MissingSubcommand(_)) if ran_callback && !ctx.is_interaction() => {
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        debug!(
            "[{}] {} dispatching to {}",
            ctx.invocation_id,
            self.qualified_name(),
            child.name()
        );
        self.descend(ctx, child.name());
        child.invoke(ctx).await
    }
}

impl fmt::Debug for SlashGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashGroup")
            .field("name", &self.name)
            .field("parents", &self.parents)
            .field("commands", &self.commands)
            .field("invoke_without_command", &self.invoke_without_command)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command::{Parameter, SlashCommand};
    use crate::commands::context::tests::{interaction_context, message_context};
    use crate::commands::handler::tests::Recorder;
    use crate::commands::option::CommandOption;
    use crate::commands::payload::ResolvedData;
    use crate::commands::transport::mock::CallLog;
    use crate::commands::types::ParamType;

    fn child(recorder: &Recorder) -> SlashCommand {
        SlashCommand::new("child", recorder.clone())
            .description("A child")
            .param(Parameter::new("x", ParamType::Integer).option(CommandOption::required("X")))
    }

    fn parent(recorder: &Recorder) -> SlashGroup {
        SlashGroup::new("parent")
            .description("A parent")
            .command(child(recorder))
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_records_parent() {
        let recorder = Recorder::default();
        let group = parent(&recorder);
        let log = CallLog::default();
        let mut ctx = interaction_context(
            json!({
                "name": "parent",
                "options": [{ "name": "child", "type": 1, "options": [
                    { "name": "x", "type": 4, "value": 1 }
                ]}]
            }),
            &log,
        );

        group.invoke(&mut ctx).await.unwrap();

        assert_eq!(ctx.invoked_parents, vec!["parent".to_string()]);
        assert_eq!(ctx.invoked_subcommand.as_deref(), Some("child"));
        assert_eq!(ctx.command.as_deref(), Some("parent child"));
        assert_eq!(recorder.calls()[0].get_i64("x"), Some(1));
    }

    #[tokio::test]
    async fn test_nested_group_dispatch() {
        let recorder = Recorder::default();
        let inner = SlashGroup::new("inner").command(child(&recorder)).unwrap();
        let outer = SlashGroup::new("outer").command(inner).unwrap();
        let log = CallLog::default();
        let mut ctx = interaction_context(
            json!({
                "name": "outer",
                "options": [{ "name": "inner", "type": 2, "options": [
                    { "name": "child", "type": 1, "options": [{ "name": "x", "type": 4, "value": 7 }] }
                ]}]
            }),
            &log,
        );

        outer.invoke(&mut ctx).await.unwrap();
        assert_eq!(ctx.invoked_parents, vec!["outer".to_string(), "inner".to_string()]);
        assert_eq!(recorder.calls()[0].get_i64("x"), Some(7));
    }

    #[tokio::test]
    async fn test_unknown_subcommand() {
        let group = parent(&Recorder::default());
        let log = CallLog::default();
        let mut ctx = interaction_context(
            json!({ "name": "parent", "options": [{ "name": "nope", "type": 1 }] }),
            &log,
        );

        let err = group.invoke(&mut ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::CommandNotFound(ref n) if n == "parent nope"));
    }

    #[tokio::test]
    async fn test_text_dispatch() {
        let recorder = Recorder::default();
        let group = parent(&recorder);
        let log = CallLog::default();
        let mut ctx = message_context("!parent child 5", ResolvedData::default(), &log);
        ctx.set_tokens(["child".to_string(), "5".to_string()]);

        group.invoke(&mut ctx).await.unwrap();
        assert_eq!(recorder.calls()[0].get_i64("x"), Some(5));
        assert_eq!(ctx.invoked_parents, vec!["parent".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_subcommand() {
        let group = parent(&Recorder::default());
        let log = CallLog::default();
        let mut ctx = message_context("!parent", ResolvedData::default(), &log);

        let err = group.invoke(&mut ctx).await.unwrap_err();
        assert!(matches!(err, CommandError::MissingSubcommand(ref n) if n == "parent"));
    }

    #[tokio::test]
    async fn test_group_callback_runs_first() {
        let own = Recorder::default();
        let sub = Recorder::default();
        let group = SlashGroup::new("parent")
            .callback(own.clone())
            .invoke_without_command(true)
            .command(child(&sub))
            .unwrap();
        let log = CallLog::default();

        let mut ctx = message_context("!parent child 2", ResolvedData::default(), &log);
        ctx.set_tokens(["child".to_string(), "2".to_string()]);
        group.invoke(&mut ctx).await.unwrap();
        assert_eq!(own.calls(), vec![Arguments::new()]);
        assert_eq!(sub.calls().len(), 1);

        let mut ctx = message_context("!parent", ResolvedData::default(), &log);
        group.invoke(&mut ctx).await.unwrap();
        assert_eq!(own.calls().len(), 2);
        assert_eq!(sub.calls().len(), 1);
    }

    #[test]
    fn test_find_leaf_skips_group_callback() {
        let own = Recorder::default();
        let sub = Recorder::default();
        let node = CommandNode::from(
            SlashGroup::new("parent")
                .callback(own.clone())
                .invoke_without_command(true)
                .command(child(&sub))
                .unwrap(),
        );
        let log = CallLog::default();
        let mut ctx = interaction_context(
            json!({
                "name": "parent",
                "options": [{ "name": "child", "type": 1, "options": [
                    { "name": "x", "type": 4, "value": 1, "focused": true }
                ]}]
            }),
            &log,
        );

        let leaf = node.find_leaf(&mut ctx).unwrap();
        assert_eq!(leaf.name(), "child");
        assert_eq!(ctx.current_options()[0].name, "x");
        assert!(own.calls().is_empty());
        assert!(sub.calls().is_empty());
    }

    #[test]
    fn test_to_json_types_by_depth() {
        let recorder = Recorder::default();
        let inner = SlashGroup::new("inner").command(child(&recorder)).unwrap();
        let outer = SlashGroup::new("outer")
            .command(inner)
            .unwrap()
            .command(child(&recorder))
            .unwrap();

        let json = outer.to_json().unwrap();
        assert_eq!(json["type"], json!(1));
        assert_eq!(json["description"], json!("No description provided"));
        assert_eq!(json["options"][0]["name"], json!("inner"));
        assert_eq!(json["options"][0]["type"], json!(2));
        assert_eq!(json["options"][0]["options"][0]["type"], json!(1));
        assert_eq!(json["options"][1]["type"], json!(1));
        assert_eq!(json["options"][1]["options"][0]["name"], json!("x"));
        assert_eq!(outer.to_json().unwrap(), json);
    }

    #[test]
    fn test_third_level_group_is_rejected() {
        let innermost = SlashGroup::new("c").command(child(&Recorder::default())).unwrap();
        let middle = SlashGroup::new("b").command(innermost).unwrap();

        let err = SlashGroup::new("a").command(middle).unwrap_err();
        assert_eq!(err, DefinitionError::MaxDepthExceeded("c".into()));
    }

    #[test]
    fn test_duplicate_child() {
        let recorder = Recorder::default();
        let err = parent(&recorder).command(child(&recorder)).unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateCommand("parent child".into()));
    }

    #[test]
    fn test_validate_recurses() {
        let group = SlashGroup::new("tools")
            .command(SlashCommand::new("Bad Name", Recorder::default()))
            .unwrap();
        assert_eq!(
            group.validate().unwrap_err(),
            DefinitionError::InvalidName("Bad Name".into())
        );
    }
}
