//! A node of the command tree: a leaf command or a group of nodes

use serde_json::Value;

use super::command::SlashCommand;
use super::context::Context;
use super::group::SlashGroup;
use super::handler::BoxFuture;
use crate::core::{CommandError, DefinitionError};

#[derive(Debug, Clone)]
pub enum CommandNode {
    Command(SlashCommand),
    Group(SlashGroup),
}

impl CommandNode {
    pub fn name(&self) -> &str {
        match self {
            CommandNode::Command(cmd) => cmd.name(),
            CommandNode::Group(group) => group.name(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, CommandNode::Group(_))
    }

    pub(crate) fn set_parents(&mut self, parents: Vec<String>) -> Result<(), DefinitionError> {
        match self {
            CommandNode::Command(cmd) => cmd.set_parents(parents),
            CommandNode::Group(group) => group.set_parents(parents),
        }
    }

    pub fn validate(&self) -> Result<(), DefinitionError> {
        match self {
            CommandNode::Command(cmd) => cmd.validate(),
            CommandNode::Group(group) => group.validate(),
        }
    }

    pub fn to_json(&self) -> Result<Value, DefinitionError> {
        match self {
            CommandNode::Command(cmd) => cmd.to_json(),
            CommandNode::Group(group) => group.to_json(),
        }
    }

    /// Dispatch into this node. Boxed because groups recurse through it.
    pub fn invoke<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Result<(), CommandError>> {
        match self {
            CommandNode::Command(cmd) => Box::pin(cmd.invoke(ctx)),
            CommandNode::Group(group) => Box::pin(group.invoke(ctx)),
        }
    }

    /// Walk an interaction's option tree down to the targeted command
    /// without running any callback, leaving `ctx` positioned on the
    /// command's own options. Autocomplete goes through here, so group
    /// `invoke_without_command` callbacks never run for it.
    pub fn find_leaf<'a>(&'a self, ctx: &mut Context) -> Result<&'a SlashCommand, CommandError> {
        let mut node = self;
        loop {
            match node {
                CommandNode::Command(cmd) => {
                    ctx.command = Some(cmd.qualified_name());
                    return Ok(cmd);
                }
                CommandNode::Group(group) => {
                    let child = group.select_child(ctx)?;
                    group.descend(ctx, child.name());
                    node = child;
                }
            }
        }
    }
}

impl From<SlashCommand> for CommandNode {
    fn from(cmd: SlashCommand) -> Self {
        CommandNode::Command(cmd)
    }
}

impl From<SlashGroup> for CommandNode {
    fn from(group: SlashGroup) -> Self {
        CommandNode::Group(group)
    }
}
