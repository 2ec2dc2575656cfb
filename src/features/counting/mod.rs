//! # Counting Feature
//!
//! Collaborative counting game: members post consecutive numbers in a
//! configured channel, one user at a time.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true

pub mod rules;

pub use rules::{evaluate, parse_count, CountVerdict, WARNING_LIFETIME};
