//! Recording fakes for the platform capabilities

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    AutocompleteRequest, AutocompleteResponder, Choice, CommandInvocation, CommandOption,
    IncomingMessage, InteractionReplies, InteractionResponder, MessageChannel, Reply,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedReply {
    Reply(Reply),
    Defer { ephemeral: bool },
    Edit(String),
    FollowUp(Reply),
}

#[derive(Default)]
pub struct RecordingResponder {
    calls: Mutex<Vec<RecordedReply>>,
    fail: bool,
}

impl RecordingResponder {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn recorded(&self) -> Vec<RecordedReply> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedReply) -> Result<()> {
        if self.fail {
            return Err(anyhow::anyhow!("platform unavailable"));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl InteractionResponder for RecordingResponder {
    async fn reply(&self, reply: &Reply) -> Result<()> {
        self.record(RecordedReply::Reply(reply.clone()))
    }

    async fn defer_reply(&self, ephemeral: bool) -> Result<()> {
        self.record(RecordedReply::Defer { ephemeral })
    }

    async fn edit_reply(&self, content: &str) -> Result<()> {
        self.record(RecordedReply::Edit(content.to_string()))
    }

    async fn follow_up(&self, reply: &Reply) -> Result<()> {
        self.record(RecordedReply::FollowUp(reply.clone()))
    }
}

#[derive(Default)]
pub struct RecordingAutocomplete {
    responses: Mutex<Vec<Vec<Choice>>>,
}

impl RecordingAutocomplete {
    pub fn responses(&self) -> Vec<Vec<Choice>> {
        self.responses.lock().unwrap().clone()
    }
}

#[async_trait]
impl AutocompleteResponder for RecordingAutocomplete {
    async fn respond(&self, choices: &[Choice]) -> Result<()> {
        self.responses.lock().unwrap().push(choices.to_vec());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAction {
    Reply { to: String, content: String },
    Delete(String),
}

#[derive(Default)]
pub struct RecordingChannel {
    actions: Mutex<Vec<ChannelAction>>,
    next_id: AtomicU64,
}

impl RecordingChannel {
    pub fn actions(&self) -> Vec<ChannelAction> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    async fn reply_to(&self, message_id: &str, content: &str) -> Result<String> {
        self.actions.lock().unwrap().push(ChannelAction::Reply {
            to: message_id.to_string(),
            content: content.to_string(),
        });
        Ok(format!("sent-{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.actions
            .lock()
            .unwrap()
            .push(ChannelAction::Delete(message_id.to_string()));
        Ok(())
    }
}

pub fn invocation(
    name: &str,
    user_id: &str,
    guild_id: Option<&str>,
    options: Vec<CommandOption>,
) -> (CommandInvocation, Arc<RecordingResponder>) {
    let responder = Arc::new(RecordingResponder::default());
    let invocation = CommandInvocation {
        name: name.to_string(),
        user_id: user_id.to_string(),
        guild_id: guild_id.map(str::to_string),
        channel_id: "100".to_string(),
        options,
        replies: InteractionReplies::new(responder.clone()),
    };
    (invocation, responder)
}

pub fn autocomplete(
    command_name: &str,
    options: Vec<CommandOption>,
) -> (AutocompleteRequest, Arc<RecordingAutocomplete>) {
    let responder = Arc::new(RecordingAutocomplete::default());
    let request = AutocompleteRequest {
        command_name: command_name.to_string(),
        user_id: "1".to_string(),
        guild_id: None,
        options,
        responder: responder.clone(),
    };
    (request, responder)
}

pub fn message(
    id: &str,
    guild_id: Option<&str>,
    channel_id: &str,
    author_id: &str,
    content: &str,
    channel: Arc<RecordingChannel>,
) -> IncomingMessage {
    IncomingMessage {
        id: id.to_string(),
        channel_id: channel_id.to_string(),
        guild_id: guild_id.map(str::to_string),
        author_id: author_id.to_string(),
        author_is_bot: false,
        content: content.to_string(),
        channel,
    }
}
