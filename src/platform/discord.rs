//! Serenity adapter
//!
//! Classifies gateway deliveries into [`InboundEvent`]s and implements the
//! reply capabilities over serenity's HTTP client.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use serenity::http::Http;
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::{
    ApplicationCommandInteraction, CommandDataOption,
};
use serenity::model::application::interaction::autocomplete::AutocompleteInteraction;
use serenity::model::application::interaction::{Interaction, InteractionResponseType};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::Guild;
use serenity::model::id::{ChannelId, MessageId};
use std::sync::Arc;

use super::{
    AutocompleteRequest, AutocompleteResponder, Choice, CommandInvocation, CommandOption,
    EventPayload, InboundEvent, IncomingMessage, InteractionReplies, InteractionResponder,
    MessageChannel, OptionValue, Reply,
};

/// Classify an interaction; kinds the core does not handle yield `None`
pub fn classify_interaction(http: Arc<Http>, interaction: Interaction) -> Option<InboundEvent> {
    match interaction {
        Interaction::ApplicationCommand(command) => {
            Some(InboundEvent::Command(command_invocation(http, command)))
        }
        Interaction::Autocomplete(autocomplete) => Some(InboundEvent::Autocomplete(
            autocomplete_request(http, autocomplete),
        )),
        _ => None,
    }
}

pub fn message_event(http: Arc<Http>, msg: &Message) -> InboundEvent {
    InboundEvent::Event(EventPayload::MessageCreate(IncomingMessage {
        id: msg.id.0.to_string(),
        channel_id: msg.channel_id.0.to_string(),
        guild_id: msg.guild_id.map(|id| id.0.to_string()),
        author_id: msg.author.id.0.to_string(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        channel: Arc::new(SerenityChannel {
            http,
            channel_id: msg.channel_id,
        }),
    }))
}

pub fn ready_event(ready: &Ready) -> InboundEvent {
    InboundEvent::Event(EventPayload::Ready {
        bot_name: ready.user.name.clone(),
        guild_count: ready.guilds.len(),
    })
}

pub fn guild_create_event(guild: &Guild, is_new: bool) -> InboundEvent {
    InboundEvent::Event(EventPayload::GuildCreate {
        guild_id: guild.id.0.to_string(),
        name: guild.name.clone(),
        is_new,
    })
}

fn command_invocation(http: Arc<Http>, command: ApplicationCommandInteraction) -> CommandInvocation {
    let name = command.data.name.clone();
    let user_id = command.user.id.0.to_string();
    let guild_id = command.guild_id.map(|id| id.0.to_string());
    let channel_id = command.channel_id.0.to_string();
    let options = convert_options(&command.data.options);

    CommandInvocation {
        name,
        user_id,
        guild_id,
        channel_id,
        options,
        replies: InteractionReplies::new(Arc::new(CommandResponder {
            http,
            interaction: command,
        })),
    }
}

fn autocomplete_request(http: Arc<Http>, autocomplete: AutocompleteInteraction) -> AutocompleteRequest {
    AutocompleteRequest {
        command_name: autocomplete.data.name.clone(),
        user_id: autocomplete.user.id.0.to_string(),
        guild_id: autocomplete.guild_id.map(|id| id.0.to_string()),
        options: convert_options(&autocomplete.data.options),
        responder: Arc::new(SerenityAutocomplete {
            http,
            interaction: autocomplete,
        }),
    }
}

/// Snowflake options arrive as strings, occasionally as numbers
fn snowflake(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::to_string)
        .or_else(|| value.as_u64().map(|id| id.to_string()))
}

pub(crate) fn convert_options(options: &[CommandDataOption]) -> Vec<CommandOption> {
    options
        .iter()
        .filter_map(|opt| {
            let value = match opt.kind {
                CommandOptionType::SubCommand => OptionValue::SubCommand(convert_options(&opt.options)),
                CommandOptionType::SubCommandGroup => {
                    OptionValue::SubCommandGroup(convert_options(&opt.options))
                }
                CommandOptionType::String => {
                    OptionValue::String(opt.value.as_ref()?.as_str()?.to_string())
                }
                CommandOptionType::Integer => OptionValue::Integer(opt.value.as_ref()?.as_i64()?),
                CommandOptionType::Number => OptionValue::Number(opt.value.as_ref()?.as_f64()?),
                CommandOptionType::Boolean => OptionValue::Boolean(opt.value.as_ref()?.as_bool()?),
                CommandOptionType::User => OptionValue::User(snowflake(opt.value.as_ref()?)?),
                CommandOptionType::Channel => OptionValue::Channel(snowflake(opt.value.as_ref()?)?),
                CommandOptionType::Role | CommandOptionType::Mentionable => {
                    OptionValue::Role(snowflake(opt.value.as_ref()?)?)
                }
                _ => return None,
            };
            Some(CommandOption {
                name: opt.name.clone(),
                value,
                focused: opt.focused,
            })
        })
        .collect()
}

struct CommandResponder {
    http: Arc<Http>,
    interaction: ApplicationCommandInteraction,
}

#[async_trait]
impl InteractionResponder for CommandResponder {
    async fn reply(&self, reply: &Reply) -> Result<()> {
        self.interaction
            .create_interaction_response(&self.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message.content(&reply.content).ephemeral(reply.ephemeral)
                    })
            })
            .await?;
        Ok(())
    }

    async fn defer_reply(&self, ephemeral: bool) -> Result<()> {
        self.interaction
            .create_interaction_response(&self.http, |response| {
                response
                    .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|message| message.ephemeral(ephemeral))
            })
            .await?;
        Ok(())
    }

    async fn edit_reply(&self, content: &str) -> Result<()> {
        self.interaction
            .edit_original_interaction_response(&self.http, |response| response.content(content))
            .await?;
        Ok(())
    }

    async fn follow_up(&self, reply: &Reply) -> Result<()> {
        self.interaction
            .create_followup_message(&self.http, |followup| {
                followup.content(&reply.content).ephemeral(reply.ephemeral)
            })
            .await?;
        Ok(())
    }
}

struct SerenityAutocomplete {
    http: Arc<Http>,
    interaction: AutocompleteInteraction,
}

#[async_trait]
impl AutocompleteResponder for SerenityAutocomplete {
    async fn respond(&self, choices: &[Choice]) -> Result<()> {
        self.interaction
            .create_autocomplete_response(&self.http, |response| {
                for choice in choices {
                    response.add_string_choice(&choice.name, &choice.value);
                }
                response
            })
            .await?;
        Ok(())
    }
}

struct SerenityChannel {
    http: Arc<Http>,
    channel_id: ChannelId,
}

#[async_trait]
impl MessageChannel for SerenityChannel {
    async fn reply_to(&self, message_id: &str, content: &str) -> Result<String> {
        let reference = (self.channel_id, MessageId(message_id.parse()?));
        let sent = self
            .channel_id
            .send_message(&self.http, |message| {
                message.content(content).reference_message(reference)
            })
            .await?;
        Ok(sent.id.0.to_string())
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.channel_id
            .delete_message(&self.http, MessageId(message_id.parse()?))
            .await?;
        Ok(())
    }
}
