//! Birthday command handler
//!
//! Handles: birthday setup, birthday edit, birthday info, birthday reset, and
//! timezone autocomplete
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use log::error;
use std::sync::Arc;

use super::UNKNOWN_SUBCOMMAND_MESSAGE;
use crate::commands::context::DispatchContext;
use crate::commands::definition::{
    CommandDefinition, CommandSchema, DefinitionError, OptionKind, OptionSchema,
};
use crate::commands::handler::{AutocompleteExecutor, CommandExecutor};
use crate::commands::slash::{get_bool_option, get_string_option, get_subcommand};
use crate::database::{Database, UserBirthday, UserBirthdayUpdate};
use crate::features::birthdays::dates::MAX_TIMEZONE_SUGGESTIONS;
use crate::features::birthdays::{
    format_birthday_info, parse_birthday_date, resolve_timezone, search_timezones,
};
use crate::platform::{AutocompleteRequest, Choice, CommandInvocation, CommandOption, OptionValue};

const ALREADY_SET: &str = "A birthday is already set\nUse edit to change it or reset to delete it.";
const NOT_SET: &str = "No birthday is set\nUse setup to create one.";
const NO_CHANGES: &str = "No changes provided\nPlease provide at least one option to change.";
const INVALID_TIMEZONE: &str = "Invalid timezone\nPlease use a valid timezone (e.g. Europe/Berlin).";
const INVALID_DATE: &str = "Invalid date format\nPlease use YYYY-MM-DD.";

/// Handler for /birthday
pub struct BirthdayCommand;

#[async_trait]
impl CommandExecutor for BirthdayCommand {
    async fn execute(&self, ctx: Arc<DispatchContext>, invocation: CommandInvocation) -> Result<()> {
        invocation.replies.defer_reply(true).await?;

        let db = &ctx.database;
        let user_id = invocation.user_id.as_str();
        let message = match get_subcommand(&invocation.options) {
            Some(("setup", options)) => setup(db, user_id, options).await?,
            Some(("edit", options)) => edit(db, user_id, options).await?,
            Some(("info", _)) => info(db, user_id).await?,
            Some(("reset", _)) => reset(db, user_id).await?,
            _ => UNKNOWN_SUBCOMMAND_MESSAGE.to_string(),
        };

        invocation.replies.edit_reply(message).await
    }
}

#[async_trait]
impl AutocompleteExecutor for BirthdayCommand {
    async fn autocomplete(&self, _ctx: Arc<DispatchContext>, request: AutocompleteRequest) -> Result<()> {
        let Some(focused) = request.focused_option() else {
            return Ok(());
        };
        let OptionValue::String(typed) = &focused.value else {
            return Ok(());
        };
        if focused.name != "timezone" {
            return Ok(());
        }

        let choices: Vec<Choice> = search_timezones(typed, MAX_TIMEZONE_SUGGESTIONS)
            .into_iter()
            .map(|tz| Choice::new(tz, tz))
            .collect();
        request.respond(&choices).await
    }
}

/// Optional option input, rejected with the user-facing message when invalid
fn validate_timezone(input: Option<String>) -> Result<Option<String>, &'static str> {
    input
        .map(|raw| resolve_timezone(&raw).map(str::to_string).ok_or(INVALID_TIMEZONE))
        .transpose()
}

fn validate_date(input: Option<String>) -> Result<Option<NaiveDate>, &'static str> {
    input
        .map(|raw| parse_birthday_date(&raw).ok_or(INVALID_DATE))
        .transpose()
}

async fn setup(db: &Database, user_id: &str, options: &[CommandOption]) -> Result<String> {
    if db.get_user_birthday(user_id).await?.is_some() {
        return Ok(ALREADY_SET.to_string());
    }

    let date = get_string_option(options, "date").context("Missing date option")?;
    let timezone = get_string_option(options, "timezone").context("Missing timezone option")?;
    let show_age = get_bool_option(options, "show-age").context("Missing show-age option")?;
    let by_default = get_bool_option(options, "announce-in-guilds-by-default").unwrap_or(true);

    let Some(timezone) = resolve_timezone(&timezone) else {
        return Ok(INVALID_TIMEZONE.to_string());
    };
    let Some(date) = parse_birthday_date(&date) else {
        return Ok(INVALID_DATE.to_string());
    };

    let mut birthday = UserBirthday::new(user_id, date, timezone);
    birthday.show_age = show_age;
    birthday.announce_in_guilds_by_default = by_default;

    let created = match db.get_or_create_user(user_id).await {
        Ok(_) => db.create_user_birthday(birthday).await,
        Err(e) => Err(e),
    };
    if let Err(e) = created {
        error!("Error creating birthday for user {}: {}", user_id, e);
        return Ok("There was an error setting your birthday. Please try again later.".to_string());
    }

    Ok("Your birthday has been set successfully! 🎉".to_string())
}

async fn edit(db: &Database, user_id: &str, options: &[CommandOption]) -> Result<String> {
    if db.get_user_birthday(user_id).await?.is_none() {
        return Ok(NOT_SET.to_string());
    }

    let timezone = match validate_timezone(get_string_option(options, "timezone")) {
        Ok(timezone) => timezone,
        Err(message) => return Ok(message.to_string()),
    };
    let date = match validate_date(get_string_option(options, "date")) {
        Ok(date) => date,
        Err(message) => return Ok(message.to_string()),
    };
    let update = UserBirthdayUpdate {
        date,
        timezone,
        show_age: get_bool_option(options, "show-age"),
        announce_in_guilds_by_default: get_bool_option(options, "announce-in-guilds-by-default"),
        announce_in_guild_ids: None,
    };
    if update.is_empty() {
        return Ok(NO_CHANGES.to_string());
    }

    if let Err(e) = db.update_user_birthday(user_id, update).await {
        error!("Error updating birthday for user {}: {}", user_id, e);
        return Ok("There was an error updating your birthday. Please try again later.".to_string());
    }
    Ok("Your birthday has been updated successfully! 🎉".to_string())
}

async fn info(db: &Database, user_id: &str) -> Result<String> {
    match db.get_user_birthday(user_id).await? {
        Some(birthday) => Ok(format_birthday_info(&birthday, chrono::Utc::now().year())),
        None => Ok(NOT_SET.to_string()),
    }
}

async fn reset(db: &Database, user_id: &str) -> Result<String> {
    if db.get_user_birthday(user_id).await?.is_none() {
        return Ok(NOT_SET.to_string());
    }
    db.delete_user_birthday(user_id).await?;
    Ok("Your birthday has been deleted successfully.".to_string())
}

fn date_option() -> OptionSchema {
    OptionSchema::new(OptionKind::String, "date", "Your birthday (YYYY-MM-DD)")
}

fn timezone_option() -> OptionSchema {
    OptionSchema::new(
        OptionKind::String,
        "timezone",
        "Your timezone (e.g. Europe/Berlin)",
    )
    .autocomplete()
}

fn show_age_option() -> OptionSchema {
    OptionSchema::new(
        OptionKind::Boolean,
        "show-age",
        "Whether to show your age when announcing your birthday.",
    )
}

fn by_default_option() -> OptionSchema {
    OptionSchema::new(
        OptionKind::Boolean,
        "announce-in-guilds-by-default",
        "Whether to announce your birthday in guilds by default.",
    )
}

pub fn definition() -> Result<CommandDefinition, DefinitionError> {
    let schema = CommandSchema::new(
        "birthday",
        "Manage your birthday and get birthday announcements.",
    )
    .option(
        OptionSchema::subcommand("setup", "Set your birthday.")
            .option(date_option().required(true))
            .option(timezone_option().required(true))
            .option(show_age_option().required(true))
            .option(by_default_option()),
    )
    .option(
        OptionSchema::subcommand("edit", "Edit your birthday configuration.")
            .option(date_option())
            .option(timezone_option())
            .option(show_age_option())
            .option(by_default_option()),
    )
    .option(OptionSchema::subcommand("info", "Get information about your birthday."))
    .option(OptionSchema::subcommand("reset", "Delete your birthday from the configuration."));

    let handler = Arc::new(BirthdayCommand);
    CommandDefinition::builder(schema)
        .autocomplete(handler.clone())
        .execute(handler)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::test_context;
    use crate::platform::testing::{self, RecordedReply};

    fn subcommand(name: &str, options: Vec<CommandOption>) -> Vec<CommandOption> {
        vec![CommandOption::new(name, OptionValue::SubCommand(options))]
    }

    fn string(name: &str, value: &str) -> CommandOption {
        CommandOption::new(name, OptionValue::String(value.to_string()))
    }

    fn boolean(name: &str, value: bool) -> CommandOption {
        CommandOption::new(name, OptionValue::Boolean(value))
    }

    fn setup_options(date: &str, timezone: &str) -> Vec<CommandOption> {
        subcommand(
            "setup",
            vec![string("date", date), string("timezone", timezone), boolean("show-age", true)],
        )
    }

    async fn run(ctx: &Arc<DispatchContext>, options: Vec<CommandOption>) -> String {
        let (invocation, responder) = testing::invocation("birthday", "7", None, options);
        BirthdayCommand
            .execute(Arc::clone(ctx), invocation)
            .await
            .unwrap();
        match responder.recorded().last() {
            Some(RecordedReply::Edit(content)) => content.clone(),
            other => panic!("expected an edited reply, got {other:?}"),
        }
    }

    #[test]
    fn test_definition_is_valid() {
        let definition = definition().unwrap();
        assert!(definition.autocomplete_handler().is_some());
        assert!(!definition.schema().guild_only);
    }

    #[tokio::test]
    async fn test_setup_stores_canonical_timezone() {
        let ctx = test_context().await;
        let message = run(&ctx, setup_options("1990-02-14", "europe/berlin")).await;
        assert_eq!(message, "Your birthday has been set successfully! 🎉");

        let stored = ctx.database.get_user_birthday("7").await.unwrap().unwrap();
        assert_eq!(stored.timezone, "Europe/Berlin");
        assert!(stored.show_age);
        assert!(stored.announce_in_guilds_by_default);

        assert_eq!(run(&ctx, setup_options("1990-02-14", "UTC")).await, ALREADY_SET);
    }

    #[tokio::test]
    async fn test_setup_rejects_bad_input() {
        let ctx = test_context().await;
        assert_eq!(run(&ctx, setup_options("1990-02-14", "Nowhere/Land")).await, INVALID_TIMEZONE);
        assert_eq!(run(&ctx, setup_options("14/02/1990", "UTC")).await, INVALID_DATE);
        assert!(ctx.database.get_user_birthday("7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_edit_flow() {
        let ctx = test_context().await;
        assert_eq!(run(&ctx, subcommand("edit", vec![])).await, NOT_SET);

        run(&ctx, setup_options("1990-02-14", "UTC")).await;
        assert_eq!(run(&ctx, subcommand("edit", vec![])).await, NO_CHANGES);

        let message = run(&ctx, subcommand("edit", vec![boolean("show-age", false)])).await;
        assert_eq!(message, "Your birthday has been updated successfully! 🎉");
        let stored = ctx.database.get_user_birthday("7").await.unwrap().unwrap();
        assert!(!stored.show_age);
        assert_eq!(stored.timezone, "UTC");
    }

    #[tokio::test]
    async fn test_info_and_reset() {
        let ctx = test_context().await;
        run(&ctx, setup_options("1990-02-14", "UTC")).await;

        let info = run(&ctx, subcommand("info", vec![])).await;
        assert!(info.contains("February 14, 1990"));

        let message = run(&ctx, subcommand("reset", vec![])).await;
        assert_eq!(message, "Your birthday has been deleted successfully.");
        assert_eq!(run(&ctx, subcommand("reset", vec![])).await, NOT_SET);
    }

    #[tokio::test]
    async fn test_timezone_autocomplete() {
        let options = subcommand(
            "setup",
            vec![string("date", "1990-02-14"), string("timezone", "BERL").focused()],
        );
        let (request, responder) = testing::autocomplete("birthday", options);
        BirthdayCommand
            .autocomplete(test_context().await, request)
            .await
            .unwrap();

        let responses = responder.responses();
        assert_eq!(responses.len(), 1);
        assert!(responses[0].contains(&Choice::new("Europe/Berlin", "Europe/Berlin")));
        assert!(responses[0].len() <= MAX_TIMEZONE_SUGGESTIONS);
    }

    #[tokio::test]
    async fn test_autocomplete_ignores_other_options() {
        let options = subcommand("setup", vec![string("date", "1990").focused()]);
        let (request, responder) = testing::autocomplete("birthday", options);
        BirthdayCommand
            .autocomplete(test_context().await, request)
            .await
            .unwrap();
        assert!(responder.responses().is_empty());
    }
}
