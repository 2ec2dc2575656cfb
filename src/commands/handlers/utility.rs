//! Utility command handlers
//!
//! Handles: test
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Reduce to the /test liveness check
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::context::DispatchContext;
use crate::commands::definition::{CommandDefinition, CommandSchema, DefinitionError};
use crate::commands::handler::CommandExecutor;
use crate::platform::{CommandInvocation, Reply};

pub const TEST_REPLY: &str = "This is a test command. If you see this, the bot is working!";

/// Handler for /test
pub struct TestCommand;

#[async_trait]
impl CommandExecutor for TestCommand {
    async fn execute(&self, _ctx: Arc<DispatchContext>, invocation: CommandInvocation) -> Result<()> {
        invocation.replies.reply(Reply::ephemeral(TEST_REPLY)).await?;
        info!("Test command completed for user {}", invocation.user_id);
        Ok(())
    }
}

pub fn definition() -> Result<CommandDefinition, DefinitionError> {
    CommandDefinition::builder(CommandSchema::new(
        "test",
        "A test command to check if the bot is working",
    ))
    .execute(Arc::new(TestCommand))
    .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::test_context;
    use crate::platform::testing::{self, RecordedReply};

    #[tokio::test]
    async fn test_replies_ephemerally() {
        let (invocation, responder) = testing::invocation("test", "1", None, vec![]);
        TestCommand.execute(test_context().await, invocation).await.unwrap();
        assert_eq!(
            responder.recorded(),
            vec![RecordedReply::Reply(Reply::ephemeral(TEST_REPLY))]
        );
    }
}
