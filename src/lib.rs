// Core layer - shared types and configuration
pub mod core;

// Platform layer - chat platform abstraction and the serenity adapter
pub mod platform;

// Features layer - game rules and cooldowns
pub mod features;

// Infrastructure
pub mod database;

// Application layer
pub mod commands;
pub mod dispatch;

pub use crate::core::Config;
pub use crate::database::Database;
pub use crate::dispatch::{DispatchOutcome, Dispatcher};
pub use crate::features::{CooldownOutcome, CooldownTracker};
