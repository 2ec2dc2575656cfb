//! Handler callback traits
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Split into execute, autocomplete and event callbacks
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::context::DispatchContext;
use crate::platform::{AutocompleteRequest, CommandInvocation, EventPayload};

/// Execute callback of a slash command
///
/// # Example
///
/// ```ignore
/// pub struct PingCommand;
///
/// #[async_trait]
/// impl CommandExecutor for PingCommand {
///     async fn execute(
///         &self,
///         _ctx: Arc<DispatchContext>,
///         invocation: CommandInvocation,
///     ) -> Result<()> {
///         invocation.replies.reply(Reply::ephemeral("Pong!")).await
///     }
/// }
/// ```
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, ctx: Arc<DispatchContext>, invocation: CommandInvocation)
        -> Result<()>;
}

/// Autocomplete callback of a slash command
///
/// Failures are logged by the dispatcher and never shown to the user.
#[async_trait]
pub trait AutocompleteExecutor: Send + Sync {
    async fn autocomplete(&self, ctx: Arc<DispatchContext>, request: AutocompleteRequest)
        -> Result<()>;
}

/// Callback bound to a platform event
#[async_trait]
pub trait EventExecutor: Send + Sync {
    async fn execute(&self, ctx: Arc<DispatchContext>, payload: EventPayload) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // The traits must stay object-safe to live behind Arc<dyn ...>
    fn _assert_object_safe(
        _: &dyn CommandExecutor,
        _: &dyn AutocompleteExecutor,
        _: &dyn EventExecutor,
    ) {
    }
}
