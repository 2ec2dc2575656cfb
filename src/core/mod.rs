//! # Core Module
//!
//! Configuration, time source and shared response text for the bot.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add clock abstraction for cooldown timing
//! - 1.0.0: Initial creation with config and response modules

pub mod clock;
pub mod config;
pub mod response;

// Re-export commonly used items
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, DEFAULT_COOLDOWN_SECONDS};
pub use response::{
    channel_mention, cooldown_message, discord_timestamp, user_mention, TimestampStyle,
    COMMAND_FAILED_MESSAGE,
};
