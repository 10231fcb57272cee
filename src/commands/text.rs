//! # Text Commands
//!
//! Prefix-based parsing for commands invoked from ordinary messages.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Quote-aware tokenizer, mention parsing, boolean words

use regex::Regex;
use std::sync::OnceLock;

/// A parsed text command
#[derive(Debug, Clone, PartialEq)]
pub struct TextCommand {
    /// The command name (without the prefix)
    pub name: String,
    /// Remaining tokens, subcommand names included
    pub args: Vec<String>,
    /// The full original input (without the prefix)
    pub raw: String,
}

impl TextCommand {
    /// Check if the command matches a given name (case-insensitive)
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Parse a text command if `content` starts with `prefix`
///
/// # Example
/// ```
/// use slashkit::commands::text::parse_text_command;
///
/// let cmd = parse_text_command("!echo \"hello world\" 2", "!").unwrap();
/// assert_eq!(cmd.name, "echo");
/// assert_eq!(cmd.args, vec!["hello world", "2"]);
/// ```
pub fn parse_text_command(content: &str, prefix: &str) -> Option<TextCommand> {
    let input = content.trim_start().strip_prefix(prefix)?.trim();
    let mut tokens = tokenize(input).into_iter();
    let name = tokens.next()?;
    if name.is_empty() {
        return None;
    }

    Some(TextCommand {
        name,
        args: tokens.collect(),
        raw: input.to_string(),
    })
}

/// Split on whitespace; double quotes group words, `\"` escapes a quote.
/// An unterminated quote runs to the end of the input.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        tokens.push(current);
    }
    tokens
}

/// Entity a mention token points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionKind {
    User,
    Role,
    Channel,
}

fn mention_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<(@!?|@&|#)(\d{15,21})>$").ok())
        .as_ref()
}

/// Parse `<@id>`, `<@!id>`, `<@&id>` or `<#id>`
pub fn parse_mention(token: &str) -> Option<(MentionKind, u64)> {
    let caps = mention_regex()?.captures(token)?;
    let kind = match &caps[1] {
        "@&" => MentionKind::Role,
        "#" => MentionKind::Channel,
        _ => MentionKind::User,
    };
    let id = caps[2].parse().ok()?;
    Some((kind, id))
}

/// Extract an id from a mention of the given kind or a bare snowflake
pub fn parse_entity_id(token: &str, kind: MentionKind) -> Option<u64> {
    match parse_mention(token) {
        Some((found, id)) if found == kind => Some(id),
        Some(_) => None,
        None => token.parse().ok(),
    }
}

/// Boolean words accepted in text arguments
pub fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "on" | "enable" | "1" => Some(true),
        "no" | "n" | "false" | "f" | "off" | "disable" | "0" => Some(false),
        _ => None,
    }
}
