//! # Slash Commands (/)
//!
//! Turns registered command schemas into Discord application commands and
//! reads option values back out of invocations.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Build application commands from registry schemas
//! - 2.0.0: Consolidate plugins into single /plugins command with subcommands
//! - 1.0.0: Reorganized from monolithic slash_commands.rs

use anyhow::Result;
use log::info;
use serenity::builder::{CreateApplicationCommand, CreateApplicationCommandOption};
use serenity::model::application::command::{Command, CommandOptionType};
use serenity::model::channel::ChannelType;
use serenity::model::id::GuildId;
use serenity::model::permissions::Permissions;
use serenity::prelude::Context;

use super::definition::{CommandSchema, MemberPermission, OptionKind, OptionSchema};
use super::registry::CommandRegistry;
use crate::platform::{CommandOption, OptionValue};

/// Creates the application command for a schema
pub fn create_application_command(schema: &CommandSchema) -> CreateApplicationCommand {
    let mut command = CreateApplicationCommand::default();
    command.name(&schema.name).description(&schema.description);

    if schema.guild_only {
        command.dm_permission(false);
    }
    if let Some(permission) = schema.default_member_permission {
        command.default_member_permissions(permissions(permission));
    }
    for option in &schema.options {
        command.add_option(create_option(option));
    }
    command
}

fn create_option(schema: &OptionSchema) -> CreateApplicationCommandOption {
    let mut option = CreateApplicationCommandOption::default();
    option
        .kind(option_type(schema.kind))
        .name(&schema.name)
        .description(&schema.description)
        .required(schema.required);

    if schema.autocomplete {
        option.set_autocomplete(true);
    }
    if schema.text_channels_only {
        option.channel_types(&[ChannelType::Text, ChannelType::News]);
    }
    for sub_option in &schema.options {
        option.add_sub_option(create_option(sub_option));
    }
    option
}

fn option_type(kind: OptionKind) -> CommandOptionType {
    match kind {
        OptionKind::SubCommand => CommandOptionType::SubCommand,
        OptionKind::SubCommandGroup => CommandOptionType::SubCommandGroup,
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
        OptionKind::Number => CommandOptionType::Number,
        OptionKind::Boolean => CommandOptionType::Boolean,
        OptionKind::User => CommandOptionType::User,
        OptionKind::Channel => CommandOptionType::Channel,
        OptionKind::Role => CommandOptionType::Role,
    }
}

fn permissions(permission: MemberPermission) -> Permissions {
    match permission {
        MemberPermission::ManageChannels => Permissions::MANAGE_CHANNELS,
        MemberPermission::ManageGuild => Permissions::MANAGE_GUILD,
    }
}

/// Creates application commands for every command in the registry
pub fn create_slash_commands(registry: &CommandRegistry) -> Vec<CreateApplicationCommand> {
    registry
        .command_schemas()
        .into_iter()
        .map(create_application_command)
        .collect()
}

/// Registers all slash commands globally (may take up to an hour to propagate)
pub async fn register_global_commands(ctx: &Context, registry: &CommandRegistry) -> Result<()> {
    let slash_commands = create_slash_commands(registry);
    let count = slash_commands.len();

    Command::set_global_application_commands(&ctx.http, |commands| {
        for command in slash_commands {
            commands.add_application_command(command);
        }
        commands
    })
    .await?;

    info!("Global slash commands registered successfully ({} commands)", count);
    Ok(())
}

/// Registers all slash commands for a specific guild (instant, for development)
pub async fn register_guild_commands(
    ctx: &Context,
    guild_id: GuildId,
    registry: &CommandRegistry,
) -> Result<()> {
    let slash_commands = create_slash_commands(registry);
    let count = slash_commands.len();

    guild_id
        .set_application_commands(&ctx.http, |commands| {
            for command in slash_commands {
                commands.add_application_command(command);
            }
            commands
        })
        .await?;

    info!("Guild slash commands registered for guild {} ({} commands)", guild_id, count);
    Ok(())
}

/// The invoked subcommand and its options
pub fn get_subcommand(options: &[CommandOption]) -> Option<(&str, &[CommandOption])> {
    options.iter().find_map(|opt| match &opt.value {
        OptionValue::SubCommand(inner) => Some((opt.name.as_str(), inner.as_slice())),
        _ => None,
    })
}

fn find<'a>(options: &'a [CommandOption], name: &str) -> Option<&'a OptionValue> {
    options.iter().find(|opt| opt.name == name).map(|opt| &opt.value)
}

/// Utility function to get string option from slash command
pub fn get_string_option(options: &[CommandOption], name: &str) -> Option<String> {
    match find(options, name)? {
        OptionValue::String(value) => Some(value.clone()),
        _ => None,
    }
}

/// Utility function to get channel option from slash command
pub fn get_channel_option(options: &[CommandOption], name: &str) -> Option<String> {
    match find(options, name)? {
        OptionValue::Channel(id) => Some(id.clone()),
        _ => None,
    }
}

/// Utility function to get integer option from slash command
pub fn get_integer_option(options: &[CommandOption], name: &str) -> Option<i64> {
    match find(options, name)? {
        OptionValue::Integer(value) => Some(*value),
        _ => None,
    }
}

/// Utility function to get boolean option from slash command
pub fn get_bool_option(options: &[CommandOption], name: &str) -> Option<bool> {
    match find(options, name)? {
        OptionValue::Boolean(value) => Some(*value),
        _ => None,
    }
}
