//! Counting game command handler
//!
//! Handles: counting setup, counting edit, counting info, counting reset
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
use crate::commands::slash::{get_bool_option, get_channel_option, get_subcommand};
use crate::core::{channel_mention, discord_timestamp, user_mention, TimestampStyle};
use crate::database::{CountingUpdate, Database};
use crate::platform::{CommandInvocation, CommandOption, Reply};

const ALREADY_SET_UP: &str = "A counting game is already set up in this server. Please use the edit command to change the settings. Or reset the counting game if you want to start over.";
const NOT_SET_UP: &str =
    "No counting game is set up in this server. Please use the setup command to create one.";
const NOTHING_TO_EDIT: &str = "You must provide at least one option to edit the counting game. Either a new channel or reset on fail option.";

/// Handler for /counting
pub struct CountingCommand;

#[async_trait]
impl CommandExecutor for CountingCommand {
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
    if db.get_counting(guild_id).await?.is_some() {
        return Ok(ALREADY_SET_UP.to_string());
    }

    let channel_id = get_channel_option(options, "channel").context("Missing channel option")?;
    let reset_on_fail = get_bool_option(options, "reset").unwrap_or(false);
    db.create_counting(guild_id, &channel_id, reset_on_fail).await?;

    Ok(format!(
        "Counting game has been set up in {}!\nTo start counting, simply send the number `1` in the channel.",
        channel_mention(&channel_id)
    ))
}

async fn edit(db: &Database, guild_id: &str, options: &[CommandOption]) -> Result<String> {
    if db.get_counting(guild_id).await?.is_none() {
        return Ok(NOT_SET_UP.to_string());
    }

    let update = CountingUpdate {
        channel_id: get_channel_option(options, "channel"),
        reset_on_fail: get_bool_option(options, "reset"),
    };
    if update == CountingUpdate::default() {
        return Ok(NOTHING_TO_EDIT.to_string());
    }
    db.update_counting(guild_id, update).await?;

    Ok("Counting game has been updated. Use the info command to see the current settings.".to_string())
}

fn optional_user(user_id: Option<&str>) -> String {
    user_id.map(user_mention).unwrap_or_else(|| "N/A".to_string())
}

fn optional_time(millis: Option<i64>) -> String {
    millis
        .map(|ms| discord_timestamp(ms.div_euclid(1000), TimestampStyle::ShortDateTime))
        .unwrap_or_else(|| "N/A".to_string())
}

async fn info(db: &Database, guild_id: &str) -> Result<String> {
    let Some(counting) = db.get_counting(guild_id).await? else {
        return Ok(NOT_SET_UP.to_string());
    };

    let lines = [
        format!("Counting game is set up in {}", channel_mention(&counting.channel_id)),
        format!(
            "Reset on fail: {}",
            if counting.reset_on_fail { "enabled" } else { "disabled" }
        ),
        String::new(),
        format!("Current number: {}", counting.current_number),
        format!(
            "Current number by: {}",
            optional_user(counting.current_number_by.as_deref())
        ),
        format!("Current number at: {}", optional_time(counting.current_number_at)),
        String::new(),
        format!("Highest number: {}", counting.highest_number),
        format!(
            "Highest number by: {}",
            optional_user(counting.highest_number_by.as_deref())
        ),
        format!("Highest number at: {}", optional_time(counting.highest_number_at)),
    ];
    Ok(format!("### Counting Game Information\n{}", lines.join("\n")))
}

async fn reset(db: &Database, guild_id: &str) -> Result<String> {
    if db.get_counting(guild_id).await?.is_none() {
        return Ok(NOT_SET_UP.to_string());
    }
    db.delete_counting(guild_id).await?;
    Ok("The counting game has been reset. You can set it up again using the setup command.".to_string())
}

fn channel_option() -> OptionSchema {
    OptionSchema::new(
        OptionKind::Channel,
        "channel",
        "The channel that should be used for counting",
    )
    .text_channels_only()
}

fn reset_option() -> OptionSchema {
    OptionSchema::new(
        OptionKind::Boolean,
        "reset",
        "Reset the current number if a wrong number was sent",
    )
}

pub fn definition() -> Result<CommandDefinition, DefinitionError> {
    let schema = CommandSchema::new("counting", "A fun counting game for your community!")
        .guild_only()
        .default_member_permission(MemberPermission::ManageChannels)
        .option(
            OptionSchema::subcommand("setup", "Set up the counting game")
                .option(channel_option().required(true))
                .option(reset_option()),
        )
        .option(
            OptionSchema::subcommand("edit", "Edit the counting game configuration")
                .option(channel_option())
                .option(reset_option()),
        )
        .option(OptionSchema::subcommand("info", "Get information about the counting game"))
        .option(OptionSchema::subcommand("reset", "Reset the counting game"));

    CommandDefinition::builder(schema)
        .execute(Arc::new(CountingCommand))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::test_context;
    use crate::platform::testing::{self, RecordedReply};
    use crate::platform::OptionValue;

    fn subcommand(name: &str, options: Vec<CommandOption>) -> Vec<CommandOption> {
        vec![CommandOption::new(name, OptionValue::SubCommand(options))]
    }

    fn channel(id: &str) -> CommandOption {
        CommandOption::new("channel", OptionValue::Channel(id.to_string()))
    }

    async fn run(ctx: &Arc<DispatchContext>, options: Vec<CommandOption>) -> Vec<RecordedReply> {
        let (invocation, responder) = testing::invocation("counting", "9", Some("1"), options);
        CountingCommand
            .execute(Arc::clone(ctx), invocation)
            .await
            .unwrap();
        responder.recorded()
    }

    fn edited(replies: &[RecordedReply]) -> &str {
        match replies.last() {
            Some(RecordedReply::Edit(content)) => content,
            other => panic!("expected an edited reply, got {other:?}"),
        }
    }

    #[test]
    fn test_definition_is_valid() {
        let definition = definition().unwrap();
        assert!(definition.schema().guild_only);
        assert_eq!(definition.schema().options.len(), 4);
    }

    #[tokio::test]
    async fn test_setup_then_info() {
        let ctx = test_context().await;

        let replies = run(&ctx, subcommand("setup", vec![channel("10")])).await;
        assert_eq!(replies[0], RecordedReply::Defer { ephemeral: true });
        assert!(edited(&replies).starts_with("Counting game has been set up in <#10>!"));

        let replies = run(&ctx, subcommand("setup", vec![channel("11")])).await;
        assert_eq!(edited(&replies), ALREADY_SET_UP);

        let replies = run(&ctx, subcommand("info", vec![])).await;
        let info = edited(&replies);
        assert!(info.contains("Counting game is set up in <#10>"));
        assert!(info.contains("Reset on fail: disabled"));
        assert!(info.contains("Current number by: N/A"));
    }

    #[tokio::test]
    async fn test_edit_requires_an_option() {
        let ctx = test_context().await;
        run(&ctx, subcommand("setup", vec![channel("10")])).await;

        let replies = run(&ctx, subcommand("edit", vec![])).await;
        assert_eq!(edited(&replies), NOTHING_TO_EDIT);

        let reset = CommandOption::new("reset", OptionValue::Boolean(true));
        run(&ctx, subcommand("edit", vec![reset])).await;
        let counting = ctx.database.get_counting("1").await.unwrap().unwrap();
        assert!(counting.reset_on_fail);
        assert_eq!(counting.channel_id, "10");
    }

    #[tokio::test]
    async fn test_reset_removes_configuration() {
        let ctx = test_context().await;
        let replies = run(&ctx, subcommand("reset", vec![])).await;
        assert_eq!(edited(&replies), NOT_SET_UP);

        run(&ctx, subcommand("setup", vec![channel("10")])).await;
        run(&ctx, subcommand("reset", vec![])).await;
        assert!(ctx.database.get_counting("1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_outside_guild() {
        let (invocation, responder) = testing::invocation("counting", "9", None, vec![]);
        CountingCommand
            .execute(test_context().await, invocation)
            .await
            .unwrap();
        assert_eq!(
            responder.recorded(),
            vec![RecordedReply::Reply(Reply::ephemeral(GUILD_ONLY_MESSAGE))]
        );
    }
}
