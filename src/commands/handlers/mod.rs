//! Per-command handler implementations
//!
//! - **Version**: 3.1.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 3.1.0: Add guild join bootstrap
//! - 3.0.0: Replace the assistant handlers with counting and birthday commands
//! - 1.0.0: Initial extraction from monolithic command_handler.rs

pub mod birthday;
pub mod birthday_config;
pub mod counting;
pub mod counting_game;
pub mod guild_join;
pub mod ready;
pub mod utility;

use super::registry::DefinitionCandidate;

pub const GUILD_ONLY_MESSAGE: &str = "This command can only be used in a server.";

pub const UNKNOWN_SUBCOMMAND_MESSAGE: &str =
    "### Unknown subcommand\nPlease use one of the following: `setup`, `edit`, `info`, `reset`.";

/// Every built-in command and event handler, tagged with where it came from
///
/// Pass the result to `load_definitions`; definitions that fail validation are
/// reported there instead of aborting startup.
pub fn builtin_definitions() -> Vec<DefinitionCandidate> {
    vec![
        DefinitionCandidate::new("commands/test", utility::definition()),
        DefinitionCandidate::new("commands/counting", counting::definition()),
        DefinitionCandidate::new("commands/birthday", birthday::definition()),
        DefinitionCandidate::new(
            "commands/birthday-configuration",
            birthday_config::definition(),
        ),
        DefinitionCandidate::new("events/ready", ready::definition()),
        DefinitionCandidate::new("events/counting-game", counting_game::definition()),
        DefinitionCandidate::new("events/guild-join", guild_join::definition()),
    ]
}
