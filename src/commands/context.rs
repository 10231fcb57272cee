//! Invocation context for command callbacks
//!
//! One callback body serves both text messages and interactions. The
//! dispatcher picks the [`Origin`] once per invocation; everything after
//! that is written against [`ContextBase`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Message and interaction variants, response state machine

use async_trait::async_trait;
use log::{debug, warn};
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as SyncMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::args::Arguments;
use super::option::Choice;
use super::payload::{InteractionData, InteractionKind, OptionData, ResolvedData, UserRecord};
use super::transport::{ChannelMessenger, InteractionResponder, TypingIndicator};
use crate::core::{CommandError, Reply, SentMessage};

/// Window the platform allows for the initial interaction response
pub const RESPONSE_DEADLINE: Duration = Duration::from_secs(3);

/// Capabilities every context variant offers
#[async_trait]
pub trait ContextBase: Send + Sync {
    fn guild(&self) -> Option<GuildId>;
    fn channel(&self) -> ChannelId;
    fn author(&self) -> &UserRecord;
    /// The bot's own user
    fn me(&self) -> UserId;

    async fn send(&self, reply: Reply) -> Result<SentMessage, CommandError>;
    async fn defer(&self, ephemeral: bool) -> Result<(), CommandError>;
}

/// A text message that looked like a command
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub id: MessageId,
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author: UserRecord,
    pub content: String,
    /// Entities mentioned in the message, used to convert mention tokens
    pub mentions: ResolvedData,
}

/// An inbound application command or autocomplete interaction
#[derive(Debug, Clone)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub user: UserRecord,
    pub data: InteractionData,
}

/// Context backed by a plain channel message.
///
/// There is no response deadline here: `defer` starts a typing indicator
/// that runs until the first `send`. At most one indicator runs at a time.
pub struct MessageContext {
    event: MessageEvent,
    me: UserId,
    messenger: Arc<dyn ChannelMessenger>,
    typing: SyncMutex<Option<Box<dyn TypingIndicator>>>,
    responded: AtomicBool,
}

impl MessageContext {
    pub fn new(event: MessageEvent, me: UserId, messenger: Arc<dyn ChannelMessenger>) -> Self {
        Self {
            event,
            me,
            messenger,
            typing: SyncMutex::new(None),
            responded: AtomicBool::new(false),
        }
    }

    pub fn event(&self) -> &MessageEvent {
        &self.event
    }

    pub fn is_typing(&self) -> bool {
        self.typing.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    fn stop_typing(&self) {
        let indicator = match self.typing.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(indicator) = indicator {
            indicator.stop();
        }
    }
}

impl Drop for MessageContext {
    fn drop(&mut self) {
        // a pending typing indicator must not outlive the invocation
        self.stop_typing();
    }
}

#[async_trait]
impl ContextBase for MessageContext {
    fn guild(&self) -> Option<GuildId> {
        self.event.guild_id
    }

    fn channel(&self) -> ChannelId {
        self.event.channel_id
    }

    fn author(&self) -> &UserRecord {
        &self.event.author
    }

    fn me(&self) -> UserId {
        self.me
    }

    async fn send(&self, reply: Reply) -> Result<SentMessage, CommandError> {
        self.responded.store(true, Ordering::SeqCst);
        self.stop_typing();
        self.messenger
            .send_message(&reply)
            .await
            .map_err(CommandError::Transport)
    }

    async fn defer(&self, _ephemeral: bool) -> Result<(), CommandError> {
        if self.responded.load(Ordering::SeqCst) {
            debug!("Ignoring defer after a reply in channel {}", self.event.channel_id);
            return Ok(());
        }

        let mut slot = match self.typing.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_some() {
            debug!("Already typing in channel {}", self.event.channel_id);
            return Ok(());
        }

        match self.messenger.start_typing() {
            Ok(indicator) => *slot = Some(indicator),
            Err(e) => warn!("Failed to start typing in channel {}: {}", self.event.channel_id, e),
        }
        Ok(())
    }
}

/// Where an interaction stands in the response handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    Fresh,
    Deferred,
    Responded,
    FollowedUp,
}

/// Context backed by an interaction.
///
/// At most one initial response is sent; every later `send` is a followup.
pub struct InteractionContext {
    event: InteractionEvent,
    me: UserId,
    responder: Arc<dyn InteractionResponder>,
    state: Mutex<ResponseState>,
    received_at: Instant,
}

impl InteractionContext {
    pub fn new(event: InteractionEvent, me: UserId, responder: Arc<dyn InteractionResponder>) -> Self {
        Self {
            event,
            me,
            responder,
            state: Mutex::new(ResponseState::Fresh),
            received_at: Instant::now(),
        }
    }

    /// Override when the interaction was received
    pub fn received_at(mut self, instant: Instant) -> Self {
        self.received_at = instant;
        self
    }

    pub fn event(&self) -> &InteractionEvent {
        &self.event
    }

    pub fn data(&self) -> &InteractionData {
        &self.event.data
    }

    pub async fn state(&self) -> ResponseState {
        *self.state.lock().await
    }

    /// Time left to send the initial response
    pub fn time_remaining(&self) -> Duration {
        RESPONSE_DEADLINE.saturating_sub(self.received_at.elapsed())
    }

    pub async fn send_autocomplete(&self, choices: &[Choice]) -> Result<(), CommandError> {
        self.responder
            .autocomplete(choices)
            .await
            .map_err(CommandError::Transport)
    }
}

#[async_trait]
impl ContextBase for InteractionContext {
    fn guild(&self) -> Option<GuildId> {
        self.event.guild_id
    }

    fn channel(&self) -> ChannelId {
        self.event.channel_id
    }

    fn author(&self) -> &UserRecord {
        &self.event.user
    }

    fn me(&self) -> UserId {
        self.me
    }

    async fn send(&self, reply: Reply) -> Result<SentMessage, CommandError> {
        let mut state = self.state.lock().await;
        match *state {
            ResponseState::Fresh => {
                if self.time_remaining().is_zero() {
                    warn!(
                        "Initial response for /{} sent after the {}s deadline",
                        self.event.data.name,
                        RESPONSE_DEADLINE.as_secs()
                    );
                }
                let message = self
                    .responder
                    .respond(&reply)
                    .await
                    .map_err(CommandError::Transport)?;
                *state = ResponseState::Responded;
                Ok(message)
            }
            ResponseState::Deferred | ResponseState::Responded | ResponseState::FollowedUp => {
                let message = self
                    .responder
                    .followup(&reply)
                    .await
                    .map_err(CommandError::Transport)?;
                *state = ResponseState::FollowedUp;
                Ok(message)
            }
        }
    }

    async fn defer(&self, ephemeral: bool) -> Result<(), CommandError> {
        let mut state = self.state.lock().await;
        if *state != ResponseState::Fresh {
            debug!("Ignoring defer for /{} in state {:?}", self.event.data.name, *state);
            return Ok(());
        }
        self.responder
            .defer(ephemeral)
            .await
            .map_err(CommandError::Transport)?;
        *state = ResponseState::Deferred;
        Ok(())
    }
}

/// The source an invocation came from
pub enum Origin {
    Message(MessageContext),
    Interaction(InteractionContext),
}

/// Everything one invocation carries: its origin plus the dispatch trail
pub struct Context {
    /// Prefix for log lines about this invocation
    pub invocation_id: Uuid,
    origin: Origin,
    /// Qualified name of the command currently running
    pub command: Option<String>,
    /// Names of the groups traversed on the way to the command
    pub invoked_parents: Vec<String>,
    pub invoked_subcommand: Option<String>,
    /// Arguments resolved for the running command
    pub args: Arguments,
    /// Option subtree for the current depth; `None` means the top level
    pub(crate) options: Option<Vec<OptionData>>,
    /// Unconsumed text tokens
    pub(crate) tokens: VecDeque<String>,
}

impl Context {
    fn with_origin(origin: Origin) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            origin,
            command: None,
            invoked_parents: Vec::new(),
            invoked_subcommand: None,
            args: Arguments::new(),
            options: None,
            tokens: VecDeque::new(),
        }
    }

    pub fn from_message(ctx: MessageContext) -> Self {
        Self::with_origin(Origin::Message(ctx))
    }

    pub fn from_interaction(ctx: InteractionContext) -> Self {
        Self::with_origin(Origin::Interaction(ctx))
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn is_interaction(&self) -> bool {
        matches!(self.origin, Origin::Interaction(_))
    }

    pub fn interaction(&self) -> Option<&InteractionContext> {
        match &self.origin {
            Origin::Interaction(ctx) => Some(ctx),
            Origin::Message(_) => None,
        }
    }

    pub fn message(&self) -> Option<&MessageContext> {
        match &self.origin {
            Origin::Message(ctx) => Some(ctx),
            Origin::Interaction(_) => None,
        }
    }

    fn base(&self) -> &dyn ContextBase {
        match &self.origin {
            Origin::Message(ctx) => ctx,
            Origin::Interaction(ctx) => ctx,
        }
    }

    /// Options at the current dispatch depth
    pub fn current_options(&self) -> &[OptionData] {
        match (&self.options, &self.origin) {
            (Some(options), _) => options,
            (None, Origin::Interaction(ctx)) => &ctx.data().options,
            (None, Origin::Message(_)) => &[],
        }
    }

    /// Entity side table for the invocation
    pub fn resolved(&self) -> &ResolvedData {
        match &self.origin {
            Origin::Interaction(ctx) => &ctx.data().resolved,
            Origin::Message(ctx) => &ctx.event().mentions,
        }
    }

    /// Queue text tokens for the argument parser
    pub fn set_tokens(&mut self, tokens: impl IntoIterator<Item = String>) {
        self.tokens = tokens.into_iter().collect();
    }

    pub async fn say(&self, content: impl Into<String> + Send) -> Result<SentMessage, CommandError> {
        self.send(Reply::new(content)).await
    }
}

#[async_trait]
impl ContextBase for Context {
    fn guild(&self) -> Option<GuildId> {
        self.base().guild()
    }

    fn channel(&self) -> ChannelId {
        self.base().channel()
    }

    fn author(&self) -> &UserRecord {
        self.base().author()
    }

    fn me(&self) -> UserId {
        self.base().me()
    }

    async fn send(&self, reply: Reply) -> Result<SentMessage, CommandError> {
        self.base().send(reply).await
    }

    async fn defer(&self, ephemeral: bool) -> Result<(), CommandError> {
        self.base().defer(ephemeral).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::commands::transport::mock::{Call, CallLog, MockMessenger, MockResponder};
    use crate::core::MessageOrigin;
    use serde_json::json;
    use std::sync::atomic::Ordering;

    pub fn user(id: u64, name: &str) -> UserRecord {
        UserRecord {
            id: UserId(id),
            name: name.to_string(),
            bot: false,
            avatar: None,
        }
    }

    pub fn interaction_event(data: serde_json::Value) -> InteractionEvent {
        InteractionEvent {
            kind: InteractionKind::ApplicationCommand,
            guild_id: Some(GuildId(1)),
            channel_id: ChannelId(10),
            user: user(5, "invoker"),
            data: serde_json::from_value(data).unwrap(),
        }
    }

    pub fn interaction_context(data: serde_json::Value, log: &CallLog) -> Context {
        let responder = Arc::new(MockResponder::new(log.clone()));
        Context::from_interaction(InteractionContext::new(
            interaction_event(data),
            UserId(99),
            responder,
        ))
    }

    pub fn message_context(content: &str, mentions: ResolvedData, log: &CallLog) -> Context {
        let event = MessageEvent {
            id: MessageId(3),
            guild_id: Some(GuildId(1)),
            channel_id: ChannelId(10),
            author: user(5, "invoker"),
            content: content.to_string(),
            mentions,
        };
        let messenger = Arc::new(MockMessenger { log: log.clone() });
        Context::from_message(MessageContext::new(event, UserId(99), messenger))
    }

    #[tokio::test]
    async fn test_first_send_is_initial_response() {
        let log = CallLog::default();
        let ctx = interaction_context(json!({ "name": "ping" }), &log);

        let sent = ctx.say("one").await.unwrap();
        assert_eq!(sent.origin, MessageOrigin::InteractionResponse);
        assert_eq!(
            ctx.interaction().unwrap().state().await,
            ResponseState::Responded
        );

        let sent = ctx.say("two").await.unwrap();
        assert_eq!(sent.origin, MessageOrigin::Followup);
        assert_eq!(
            ctx.interaction().unwrap().state().await,
            ResponseState::FollowedUp
        );

        assert_eq!(
            log.calls(),
            vec![
                Call::Respond(Reply::new("one")),
                Call::Followup(Reply::new("two"))
            ]
        );
    }

    #[tokio::test]
    async fn test_defer_then_send_is_followup() {
        let log = CallLog::default();
        let ctx = interaction_context(json!({ "name": "slow" }), &log);

        ctx.defer(true).await.unwrap();
        assert_eq!(ctx.interaction().unwrap().state().await, ResponseState::Deferred);

        ctx.send(Reply::new("done").ephemeral(true)).await.unwrap();
        assert_eq!(
            log.calls(),
            vec![
                Call::Defer(true),
                Call::Followup(Reply::new("done").ephemeral(true))
            ]
        );
    }

    #[tokio::test]
    async fn test_defer_after_response_is_noop() {
        let log = CallLog::default();
        let ctx = interaction_context(json!({ "name": "ping" }), &log);

        ctx.say("hi").await.unwrap();
        ctx.defer(false).await.unwrap();
        assert_eq!(log.calls(), vec![Call::Respond(Reply::new("hi"))]);
    }

    #[tokio::test]
    async fn test_failed_initial_response_keeps_fresh() {
        let log = CallLog::default();
        let responder = Arc::new(MockResponder::new(log.clone()));
        responder.fail.store(true, Ordering::SeqCst);
        let ctx = InteractionContext::new(
            interaction_event(json!({ "name": "ping" })),
            UserId(99),
            responder.clone(),
        );

        let err = ctx.send(Reply::new("hi")).await.unwrap_err();
        assert!(matches!(err, CommandError::Transport(_)));
        assert_eq!(ctx.state().await, ResponseState::Fresh);

        responder.fail.store(false, Ordering::SeqCst);
        ctx.send(Reply::new("again")).await.unwrap();
        assert_eq!(log.calls(), vec![Call::Respond(Reply::new("again"))]);
    }

    #[tokio::test]
    async fn test_time_remaining() {
        let log = CallLog::default();
        let responder = Arc::new(MockResponder::new(log));
        let fresh = InteractionContext::new(
            interaction_event(json!({ "name": "ping" })),
            UserId(99),
            responder.clone(),
        );
        assert!(fresh.time_remaining() > Duration::from_secs(2));

        let stale = InteractionContext::new(
            interaction_event(json!({ "name": "ping" })),
            UserId(99),
            responder,
        )
        .received_at(Instant::now() - Duration::from_secs(5));
        assert!(stale.time_remaining().is_zero());
    }

    #[tokio::test]
    async fn test_message_context_accessors() {
        let log = CallLog::default();
        let ctx = message_context("!ping", ResolvedData::default(), &log);

        assert!(!ctx.is_interaction());
        assert_eq!(ctx.guild(), Some(GuildId(1)));
        assert_eq!(ctx.channel(), ChannelId(10));
        assert_eq!(ctx.author().name, "invoker");
        assert_eq!(ctx.me(), UserId(99));
        assert!(ctx.current_options().is_empty());
    }

    #[tokio::test]
    async fn test_message_defer_types_until_send() {
        let log = CallLog::default();
        let ctx = message_context("!slow", ResolvedData::default(), &log);

        ctx.defer(false).await.unwrap();
        assert!(ctx.message().unwrap().is_typing());
        let sent = ctx.say("finished").await.unwrap();
        assert_eq!(sent.origin, MessageOrigin::Channel);
        assert!(!ctx.message().unwrap().is_typing());

        assert_eq!(
            log.calls(),
            vec![
                Call::TypingStarted,
                Call::TypingStopped,
                Call::Message(Reply::new("finished")),
            ]
        );
    }

    #[tokio::test]
    async fn test_message_defer_twice_keeps_one_indicator() {
        let log = CallLog::default();
        let ctx = message_context("!slow", ResolvedData::default(), &log);

        ctx.defer(false).await.unwrap();
        ctx.defer(false).await.unwrap();
        ctx.say("done").await.unwrap();
        // typing does not restart once a reply went out
        ctx.defer(false).await.unwrap();
        drop(ctx);

        let calls = log.calls();
        let started = calls.iter().filter(|c| **c == Call::TypingStarted).count();
        let stopped = calls.iter().filter(|c| **c == Call::TypingStopped).count();
        assert_eq!((started, stopped), (1, 1));
    }

    #[tokio::test]
    async fn test_message_drop_stops_typing() {
        let log = CallLog::default();
        let ctx = message_context("!slow", ResolvedData::default(), &log);

        ctx.defer(false).await.unwrap();
        drop(ctx);
        assert_eq!(log.calls(), vec![Call::TypingStarted, Call::TypingStopped]);
    }

    #[tokio::test]
    async fn test_interaction_accessors() {
        let log = CallLog::default();
        let ctx = interaction_context(
            json!({ "name": "x", "options": [{ "name": "a", "type": 3, "value": "b" }] }),
            &log,
        );
        assert!(ctx.is_interaction());
        assert_eq!(ctx.author().id, UserId(5));
        assert_eq!(ctx.current_options().len(), 1);
        assert!(ctx.message().is_none());
    }
}
