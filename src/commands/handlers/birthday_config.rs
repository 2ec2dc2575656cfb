//! Birthday configuration command handler
//!
//! Handles: birthday-configuration setup, edit, info, reset
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use super::{GUILD_ONLY_MESSAGE, UNKNOWN_SUBCOMMAND_MESSAGE};
use crate::commands::context::DispatchContext;
use crate::commands::definition::{
    CommandDefinition, CommandSchema, DefinitionError, MemberPermission, OptionKind, OptionSchema,
};
use crate::commands::handler::CommandExecutor;
use crate::commands::slash::{get_channel_option, get_subcommand};
use crate::core::channel_mention;
use crate::database::Database;
use crate::platform::{CommandInvocation, CommandOption, Reply};

const ALREADY_SET_UP: &str = "A birthday configuration is already set up in this server.\nPlease use the edit command to change the settings. Or reset the settings if you want to start over.";
const NOT_SET_UP: &str = "No birthday configuration is set up in this server yet.\nPlease use the setup command to create a configuration first.";
const NOTHING_TO_RESET: &str = "No birthday configuration is set up in this server yet.\nThere is nothing to reset.\nPlease use the setup command to create a configuration first.";
const SAME_CHANNEL: &str = "The provided channel is already set as the birthday announcement channel. Please provide a different channel.";

/// Handler for /birthday-configuration
pub struct BirthdayConfigCommand;

#[async_trait]
impl CommandExecutor for BirthdayConfigCommand {
    async fn execute(&self, ctx: Arc<DispatchContext>, invocation: CommandInvocation) -> Result<()> {
        let Some(guild_id) = invocation.guild_id.as_deref() else {
            return invocation.replies.reply(Reply::ephemeral(GUILD_ONLY_MESSAGE)).await;
        };

        invocation.replies.defer_reply(true).await?;

        let db = &ctx.database;
        let message = match get_subcommand(&invocation.options) {
            Some(("setup", options)) => setup(db, guild_id, options).await?,
            Some(("edit", options)) => edit(db, guild_id, options).await?,
            Some(("info", _)) => info(db, guild_id).await?,
            Some(("reset", _)) => reset(db, guild_id).await?,
            _ => UNKNOWN_SUBCOMMAND_MESSAGE.to_string(),
        };

        invocation.replies.edit_reply(message).await
    }
}

async fn setup(db: &Database, guild_id: &str, options: &[CommandOption]) -> Result<String> {
    if db.get_guild_birthday(guild_id).await?.is_some() {
        return Ok(ALREADY_SET_UP.to_string());
    }

    let channel_id = get_channel_option(options, "channel").context("Missing channel option")?;
    db.create_guild_birthday(guild_id, &channel_id).await?;

    Ok(format!(
        "Successfully set up the birthday configuration!\nBirthday announcements will be made in {}.\n\nYou can change this later using the edit command.",
        channel_mention(&channel_id)
    ))
}

async fn edit(db: &Database, guild_id: &str, options: &[CommandOption]) -> Result<String> {
    let Some(config) = db.get_guild_birthday(guild_id).await? else {
        return Ok(NOT_SET_UP.to_string());
    };

    let channel_id = get_channel_option(options, "channel").context("Missing channel option")?;
    if config.channel_id == channel_id {
        return Ok(SAME_CHANNEL.to_string());
    }
    db.update_guild_birthday(guild_id, &channel_id).await?;

    Ok(format!(
        "Successfully updated the birthday configuration!\nBirthday announcements will now be made in {}.",
        channel_mention(&channel_id)
    ))
}

async fn info(db: &Database, guild_id: &str) -> Result<String> {
    let Some(config) = db.get_guild_birthday(guild_id).await? else {
        return Ok(NOT_SET_UP.to_string());
    };

    Ok(format!(
        "### Birthday Configuration Info\n\n**Announcement Channel:** {}\n\nYou can change this using the edit command, or reset the configuration using the reset command.",
        channel_mention(&config.channel_id)
    ))
}

async fn reset(db: &Database, guild_id: &str) -> Result<String> {
    if db.get_guild_birthday(guild_id).await?.is_none() {
        return Ok(NOTHING_TO_RESET.to_string());
    }
    db.delete_guild_birthday(guild_id).await?;
    Ok("Successfully reset the birthday configuration!\nYou can set it up again using the setup command.".to_string())
}

fn channel_option(description: &str) -> OptionSchema {
    OptionSchema::new(OptionKind::Channel, "channel", description)
        .required(true)
        .text_channels_only()
}

pub fn definition() -> Result<CommandDefinition, DefinitionError> {
    let schema = CommandSchema::new(
        "birthday-configuration",
        "Configure birthday announcements for this server.",
    )
    .guild_only()
    .default_member_permission(MemberPermission::ManageGuild)
    .option(
        OptionSchema::subcommand("setup", "Set up birthday announcements.")
            .option(channel_option("The channel where birthday announcements will be made.")),
    )
    .option(
        OptionSchema::subcommand("edit", "Edit the birthday configuration.")
            .option(channel_option("The new channel for birthday announcements.")),
    )
    .option(OptionSchema::subcommand("info", "Show the birthday configuration."))
    .option(OptionSchema::subcommand("reset", "Reset the birthday configuration."));

    CommandDefinition::builder(schema)
        .execute(Arc::new(BirthdayConfigCommand))
        .build()
}
