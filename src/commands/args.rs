//! Resolved argument values handed to command callbacks

use serde_json::Value;
use std::fmt;

use super::payload::{Channel, Member, Role, UserRecord};

/// A single resolved argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Optional parameter left unfilled
    Null,
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Member(Member),
    /// User outside a guild (DMs) or not a member
    User(UserRecord),
    Role(Role),
    Channel(Channel),
}

impl ArgValue {
    /// Convert a literal wire value
    pub fn from_literal(value: &Value) -> Self {
        match value {
            Value::String(s) => ArgValue::String(s.clone()),
            Value::Bool(b) => ArgValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ArgValue::Integer(i),
                None => n.as_f64().map(ArgValue::Number).unwrap_or(ArgValue::Null),
            },
            Value::Null => ArgValue::Null,
            other => ArgValue::String(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Number(n) => Some(*n),
            ArgValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether a usage string should show this as a default
    pub fn is_printable_default(&self) -> bool {
        match self {
            ArgValue::Null => false,
            ArgValue::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Wire form, used for choices
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::Null => Value::Null,
            ArgValue::String(s) => Value::from(s.as_str()),
            ArgValue::Integer(i) => Value::from(*i),
            ArgValue::Number(n) => Value::from(*n),
            ArgValue::Boolean(b) => Value::from(*b),
            ArgValue::Member(m) => Value::from(m.user.id.0.to_string()),
            ArgValue::User(u) => Value::from(u.id.0.to_string()),
            ArgValue::Role(r) => Value::from(r.id.0.to_string()),
            ArgValue::Channel(c) => Value::from(c.id.0.to_string()),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Null => write!(f, "None"),
            ArgValue::String(s) => write!(f, "{s}"),
            ArgValue::Integer(i) => write!(f, "{i}"),
            ArgValue::Number(n) => write!(f, "{n}"),
            ArgValue::Boolean(b) => write!(f, "{b}"),
            ArgValue::Member(m) => write!(f, "{}", m.display_name()),
            ArgValue::User(u) => write!(f, "{}", u.name),
            ArgValue::Role(r) => write!(f, "{}", r.name),
            ArgValue::Channel(c) => write!(f, "{}", c.name.as_deref().unwrap_or("channel")),
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::String(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::String(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Integer(value)
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Number(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Boolean(value)
    }
}

/// Keyword arguments for one callback invocation, keyed by internal
/// parameter name. Insertion order is preserved; re-inserting a name
/// overwrites the earlier value in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    entries: Vec<(String, ArgValue)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ArgValue::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ArgValue::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ArgValue::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ArgValue::as_bool)
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        match self.get(name)? {
            ArgValue::Member(m) => Some(m),
            _ => None,
        }
    }

    /// User behind either a member or a bare user argument
    pub fn user(&self, name: &str) -> Option<&UserRecord> {
        match self.get(name)? {
            ArgValue::Member(m) => Some(&m.user),
            ArgValue::User(u) => Some(u),
            _ => None,
        }
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        match self.get(name)? {
            ArgValue::Role(r) => Some(r),
            _ => None,
        }
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        match self.get(name)? {
            ArgValue::Channel(c) => Some(c),
            _ => None,
        }
    }
}
