//! Command registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Own the top-level command tree, produce the registration payload
//! - 1.0.0: Initial implementation for handler dispatch

use serde_json::Value;
use std::collections::BTreeMap;

use super::node::CommandNode;
use crate::core::DefinitionError;

/// Registry of top-level commands and groups, keyed by name
///
/// Definitions are read-only once registered, so one registry can serve
/// any number of concurrent invocations.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register(SlashCommand::new("ping", Ping))?;
/// registry.register(settings_group)?;
///
/// if let Some(node) = registry.get("ping") {
///     node.invoke(&mut ctx).await?;
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandNode>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level command or group
    ///
    /// The definition is validated and rooted at depth 0; a malformed tree
    /// or a name clash is rejected.
    pub fn register(&mut self, node: impl Into<CommandNode>) -> Result<(), DefinitionError> {
        let mut node = node.into();
        if self.commands.contains_key(node.name()) {
            return Err(DefinitionError::DuplicateCommand(node.name().to_string()));
        }
        node.set_parents(Vec::new())?;
        node.validate()?;
        self.commands.insert(node.name().to_string(), node);
        Ok(())
    }

    /// Get a top-level node by name
    pub fn get(&self, name: &str) -> Option<&CommandNode> {
        self.commands.get(name)
    }

    /// Check if a command is registered
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Number of top-level commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All registered top-level names, sorted
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Bulk-overwrite payload: every top-level node's JSON, as an array
    pub fn to_json(&self) -> Result<Value, DefinitionError> {
        self.commands
            .values()
            .map(CommandNode::to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command::{Parameter, SlashCommand};
    use crate::commands::group::SlashGroup;
    use crate::commands::handler::tests::Recorder;
    use crate::commands::types::ParamType;

    fn ping() -> SlashCommand {
        SlashCommand::new("ping", Recorder::default()).description("Check latency")
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register_single() {
        let mut registry = CommandRegistry::new();
        registry.register(ping()).unwrap();

        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("ping"));
        assert!(!registry.contains("pong"));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = CommandRegistry::new();
        registry.register(ping()).unwrap();

        let err = registry.register(ping()).unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateCommand("ping".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_rejects_missing_descriptor() {
        let mut registry = CommandRegistry::new();
        let cmd = SlashCommand::new("kick", Recorder::default())
            .param(Parameter::new("user", ParamType::Member));

        assert!(matches!(
            registry.register(cmd),
            Err(DefinitionError::MissingOption { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_get_and_names() {
        let mut registry = CommandRegistry::new();
        registry.register(ping()).unwrap();
        registry
            .register(SlashGroup::new("admin").command(ping()).unwrap())
            .unwrap();

        assert!(registry.get("admin").map_or(false, CommandNode::is_group));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.command_names().collect::<Vec<_>>(), vec!["admin", "ping"]);
    }

    #[test]
    fn test_registry_payload() {
        let mut registry = CommandRegistry::new();
        registry.register(ping()).unwrap();
        registry
            .register(SlashGroup::new("admin").command(ping()).unwrap())
            .unwrap();

        let payload = registry.to_json().unwrap();
        let names: Vec<&str> = payload
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|c| c["name"].as_str())
            .collect();
        assert_eq!(names, vec!["admin", "ping"]);
        assert_eq!(payload[0]["options"][0]["type"], serde_json::json!(1));
    }

    #[test]
    fn test_registry_default() {
        let registry = CommandRegistry::default();
        assert!(registry.is_empty());
    }
}
