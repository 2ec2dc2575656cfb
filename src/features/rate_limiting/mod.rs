//! # Rate Limiting Feature
//!
//! Per-command, per-user cooldowns for slash commands.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Replace sliding-window limiter with per-command cooldown ledger
//! - 1.0.0: Initial release with per-user sliding window rate limiting

pub mod cooldown;

pub use cooldown::{CooldownOutcome, CooldownTracker};
