//! User-facing message text and Discord markup helpers
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Add cooldown message and timestamp markup; drop message truncation
//! - 1.0.0: Message truncation helpers

/// Generic acknowledgement sent when a command handler fails
pub const COMMAND_FAILED_MESSAGE: &str = "There was an error while executing this command.";

/// Display style for Discord `<t:...>` timestamp markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// "in 5 seconds", "2 hours ago"
    Relative,
    /// "20 April 2021 16:20"
    ShortDateTime,
    /// "20/04/2021"
    ShortDate,
}

impl TimestampStyle {
    fn flag(self) -> char {
        match self {
            TimestampStyle::Relative => 'R',
            TimestampStyle::ShortDateTime => 'f',
            TimestampStyle::ShortDate => 'd',
        }
    }
}

/// Format a unix timestamp (seconds) as Discord timestamp markup
pub fn discord_timestamp(unix_seconds: i64, style: TimestampStyle) -> String {
    format!("<t:{}:{}>", unix_seconds, style.flag())
}

/// Round epoch milliseconds to the nearest whole second
pub fn millis_to_rounded_seconds(millis: i64) -> i64 {
    (millis + 500).div_euclid(1000)
}

/// Message shown to a user who invoked a command while on cooldown
pub fn cooldown_message(retry_at_millis: i64) -> String {
    format!(
        "Please wait, you are on cooldown for this command. Try again {}.",
        discord_timestamp(
            millis_to_rounded_seconds(retry_at_millis),
            TimestampStyle::Relative
        )
    )
}

pub fn channel_mention(channel_id: &str) -> String {
    format!("<#{channel_id}>")
}

pub fn user_mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}
