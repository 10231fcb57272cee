//! Outbound replies and the messages they produce
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Reply builder with content truncation, uniform SentMessage

use chrono::{DateTime, Utc};
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Truncate text to fit message limit, adding ellipsis if needed
pub fn truncate_for_message(text: &str) -> String {
    if text.len() <= MESSAGE_LIMIT {
        text.to_string()
    } else {
        // Find a safe UTF-8 boundary
        let mut end = MESSAGE_LIMIT - 3; // Room for "..."
        while !text.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}...", &text[..end])
    }
}

/// Content of one outbound response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub content: String,
    /// Only honoured by interaction contexts
    pub ephemeral: bool,
}

impl Reply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: truncate_for_message(&content.into()),
            ephemeral: false,
        }
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
}

impl From<&str> for Reply {
    fn from(content: &str) -> Self {
        Reply::new(content)
    }
}

impl From<String> for Reply {
    fn from(content: String) -> Self {
        Reply::new(content)
    }
}

/// How a [`SentMessage`] was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Plain channel message (text-command context)
    Channel,
    /// The initial response to an interaction
    InteractionResponse,
    /// Any response after the first one
    Followup,
}

/// Uniform return value of `send`, whatever the context variant.
///
/// The interaction response endpoint does not hand back a normal message, so
/// the adapter copies the public state of the delivered message into this.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author_id: UserId,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub ephemeral: bool,
    pub origin: MessageOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short() {
        let text = "short text";
        assert_eq!(truncate_for_message(text), text);
    }

    #[test]
    fn test_truncate_long() {
        let result = truncate_for_message(&"a".repeat(3000));
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_utf8_boundary() {
        let text = "世".repeat(1000);
        let result = truncate_for_message(&text);
        assert!(result.len() <= MESSAGE_LIMIT);
        assert!(result.trim_end_matches("...").chars().all(|c| c == '世'));
    }

    #[test]
    fn test_reply_builders() {
        let reply: Reply = "hello".into();
        assert_eq!(reply.content, "hello");
        assert!(!reply.ephemeral);

        let reply = Reply::new(String::from("secret")).ephemeral(true);
        assert!(reply.ephemeral);
    }
}
