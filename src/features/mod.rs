//! # Features
//!
//! Domain logic behind the built-in commands, kept free of platform types.

pub mod birthdays;
pub mod counting;
pub mod rate_limiting;

pub use rate_limiting::{CooldownOutcome, CooldownTracker};
