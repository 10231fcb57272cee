//! Option descriptors: per-parameter metadata for slash commands

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::args::ArgValue;

/// Fallback description, the platform rejects empty ones
pub const NO_DESCRIPTION: &str = "No description provided";

/// A predefined choice for an option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Display name
    pub name: String,
    /// Value sent back when picked
    pub value: Value,
}

impl Choice {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// What happens when the invoker leaves the parameter out
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// The parameter must be supplied
    Required,
    /// Optional, filled with [`ArgValue::Null`]
    Unset,
    /// Optional, filled with the given value
    Value(ArgValue),
}

impl DefaultValue {
    /// Value injected for an omitted parameter, `None` when it is required
    pub fn fill(&self) -> Option<ArgValue> {
        match self {
            DefaultValue::Required => None,
            DefaultValue::Unset => Some(ArgValue::Null),
            DefaultValue::Value(v) => Some(v.clone()),
        }
    }
}

/// Declared metadata of one command parameter
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    /// Wire-visible name; the parameter name is used when absent
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub default: DefaultValue,
    pub choices: Vec<Choice>,
}

impl CommandOption {
    /// A parameter that must be supplied
    pub fn required(description: impl Into<String>) -> Self {
        Self::with(description, DefaultValue::Required)
    }

    /// An optional parameter that defaults to nothing
    pub fn optional(description: impl Into<String>) -> Self {
        Self::with(description, DefaultValue::Unset)
    }

    /// An optional parameter with a concrete default
    pub fn with_default(description: impl Into<String>, default: impl Into<ArgValue>) -> Self {
        Self::with(description, DefaultValue::Value(default.into()))
    }

    fn with(description: impl Into<String>, default: DefaultValue) -> Self {
        Self {
            display_name: None,
            description: Some(description.into()),
            default,
            choices: Vec::new(),
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn choice(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.choices.push(Choice::new(name, value));
        self
    }

    pub fn is_required(&self) -> bool {
        self.default == DefaultValue::Required
    }

    pub fn description_or_default(&self) -> &str {
        self.description.as_deref().unwrap_or(NO_DESCRIPTION)
    }
}

impl Default for CommandOption {
    fn default() -> Self {
        Self {
            display_name: None,
            description: None,
            default: DefaultValue::Required,
            choices: Vec::new(),
        }
    }
}
