//! # Platform Interface
//!
//! The narrow slice of the chat platform the dispatch core depends on: inbound
//! events, their options, and the reply capabilities attached to them.
//! `discord` adapts serenity types onto these.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod discord;
#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Platform-level occurrences an event handler can bind to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    MessageCreate,
    GuildCreate,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ready => "ready",
            EventKind::MessageCreate => "messageCreate",
            EventKind::GuildCreate => "guildCreate",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value carried by a command option
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(String),
    Channel(String),
    Role(String),
    SubCommand(Vec<CommandOption>),
    SubCommandGroup(Vec<CommandOption>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    pub name: String,
    pub value: OptionValue,
    /// Set on the option the user is typing into during autocomplete
    pub focused: bool,
}

impl CommandOption {
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        Self {
            name: name.into(),
            value,
            focused: false,
        }
    }

    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }
}

/// Rendered reply content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    /// Only visible to the invoking user
    pub ephemeral: bool,
}

impl Reply {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }

    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }
}

/// Reply capabilities of a command interaction
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn reply(&self, reply: &Reply) -> Result<()>;
    async fn defer_reply(&self, ephemeral: bool) -> Result<()>;
    async fn edit_reply(&self, content: &str) -> Result<()>;
    async fn follow_up(&self, reply: &Reply) -> Result<()>;
}

const PENDING: u8 = 0;
const DEFERRED: u8 = 1;
const REPLIED: u8 = 2;

/// Interaction responder plus its acknowledgement state
///
/// The state is tracked here rather than asked of the SDK so the dispatcher
/// can decide between a fresh reply and a follow-up.
#[derive(Clone)]
pub struct InteractionReplies {
    responder: Arc<dyn InteractionResponder>,
    state: Arc<AtomicU8>,
}

impl InteractionReplies {
    pub fn new(responder: Arc<dyn InteractionResponder>) -> Self {
        Self {
            responder,
            state: Arc::new(AtomicU8::new(PENDING)),
        }
    }

    pub async fn reply(&self, reply: Reply) -> Result<()> {
        self.responder.reply(&reply).await?;
        self.state.store(REPLIED, Ordering::SeqCst);
        Ok(())
    }

    pub async fn defer_reply(&self, ephemeral: bool) -> Result<()> {
        self.responder.defer_reply(ephemeral).await?;
        self.state.store(DEFERRED, Ordering::SeqCst);
        Ok(())
    }

    pub async fn edit_reply(&self, content: impl Into<String>) -> Result<()> {
        let content = content.into();
        self.responder.edit_reply(&content).await?;
        self.state.store(REPLIED, Ordering::SeqCst);
        Ok(())
    }

    pub async fn follow_up(&self, reply: Reply) -> Result<()> {
        self.responder.follow_up(&reply).await
    }

    /// Whether an initial acknowledgement (reply or defer) was already sent
    pub fn is_acknowledged(&self) -> bool {
        self.state.load(Ordering::SeqCst) != PENDING
    }
}

/// A slash command invocation
#[derive(Clone)]
pub struct CommandInvocation {
    pub name: String,
    pub user_id: String,
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub options: Vec<CommandOption>,
    pub replies: InteractionReplies,
}

impl CommandInvocation {
    pub fn in_guild(&self) -> bool {
        self.guild_id.is_some()
    }
}

/// A single autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

impl Choice {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[async_trait]
pub trait AutocompleteResponder: Send + Sync {
    async fn respond(&self, choices: &[Choice]) -> Result<()>;
}

/// A request for option suggestions while the user types
#[derive(Clone)]
pub struct AutocompleteRequest {
    pub command_name: String,
    pub user_id: String,
    pub guild_id: Option<String>,
    pub options: Vec<CommandOption>,
    pub responder: Arc<dyn AutocompleteResponder>,
}

impl AutocompleteRequest {
    /// The option currently being typed, searching into subcommands
    pub fn focused_option(&self) -> Option<&CommandOption> {
        fn find(options: &[CommandOption]) -> Option<&CommandOption> {
            options.iter().find_map(|opt| match &opt.value {
                OptionValue::SubCommand(inner) | OptionValue::SubCommandGroup(inner) => {
                    find(inner)
                }
                _ if opt.focused => Some(opt),
                _ => None,
            })
        }
        find(&self.options)
    }

    pub async fn respond(&self, choices: &[Choice]) -> Result<()> {
        self.responder.respond(choices).await
    }
}

/// Message operations in the channel a message arrived in
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Reply to a message, returning the id of the sent message
    async fn reply_to(&self, message_id: &str, content: &str) -> Result<String>;
    async fn delete_message(&self, message_id: &str) -> Result<()>;
}

/// A message posted in a channel the bot can see
#[derive(Clone)]
pub struct IncomingMessage {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub author_id: String,
    pub author_is_bot: bool,
    pub content: String,
    pub channel: Arc<dyn MessageChannel>,
}

impl IncomingMessage {
    pub async fn reply(&self, content: &str) -> Result<String> {
        self.channel.reply_to(&self.id, content).await
    }

    pub async fn delete(&self) -> Result<()> {
        self.channel.delete_message(&self.id).await
    }
}

/// Payload of a platform event delivered to event handlers
#[derive(Clone)]
pub enum EventPayload {
    Ready { bot_name: String, guild_count: usize },
    MessageCreate(IncomingMessage),
    GuildCreate {
        guild_id: String,
        name: String,
        is_new: bool,
    },
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Ready { .. } => EventKind::Ready,
            EventPayload::MessageCreate(_) => EventKind::MessageCreate,
            EventPayload::GuildCreate { .. } => EventKind::GuildCreate,
        }
    }
}

/// Everything the dispatcher can be asked to route
#[derive(Clone)]
pub enum InboundEvent {
    Command(CommandInvocation),
    Autocomplete(AutocompleteRequest),
    Event(EventPayload),
}

impl InboundEvent {
    /// Short description used in log lines
    pub fn label(&self) -> String {
        match self {
            InboundEvent::Command(invocation) => format!("command /{}", invocation.name),
            InboundEvent::Autocomplete(request) => {
                format!("autocomplete /{}", request.command_name)
            }
            InboundEvent::Event(payload) => format!("event {}", payload.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordedReply, RecordingAutocomplete, RecordingResponder};
    use super::*;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::Ready.to_string(), "ready");
        assert_eq!(EventKind::MessageCreate.to_string(), "messageCreate");
        assert_eq!(EventKind::GuildCreate.to_string(), "guildCreate");
    }

    #[tokio::test]
    async fn test_replies_track_acknowledgement() {
        let responder = Arc::new(RecordingResponder::default());
        let replies = InteractionReplies::new(responder.clone());
        assert!(!replies.is_acknowledged());

        replies.defer_reply(true).await.unwrap();
        assert_eq!(replies.state.load(Ordering::SeqCst), DEFERRED);
        assert!(replies.is_acknowledged());

        replies.edit_reply("done").await.unwrap();
        assert_eq!(replies.state.load(Ordering::SeqCst), REPLIED);
        assert_eq!(
            responder.recorded(),
            vec![
                RecordedReply::Defer { ephemeral: true },
                RecordedReply::Edit("done".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_reply_leaves_state_pending() {
        let responder = Arc::new(RecordingResponder::failing());
        let replies = InteractionReplies::new(responder);
        assert!(replies.reply(Reply::ephemeral("hi")).await.is_err());
        assert!(!replies.is_acknowledged());
    }

    #[test]
    fn test_focused_option_found_inside_subcommand() {
        let request = AutocompleteRequest {
            command_name: "birthday".to_string(),
            user_id: "1".to_string(),
            guild_id: None,
            options: vec![CommandOption::new(
                "setup",
                OptionValue::SubCommand(vec![
                    CommandOption::new("date", OptionValue::String("2000-01-01".into())),
                    CommandOption::new("timezone", OptionValue::String("euro".into())).focused(),
                ]),
            )],
            responder: Arc::new(RecordingAutocomplete::default()),
        };

        let focused = request.focused_option().unwrap();
        assert_eq!(focused.name, "timezone");
    }
}
