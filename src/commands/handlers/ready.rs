//! Ready event handler
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::context::DispatchContext;
use crate::commands::definition::{DefinitionError, EventDefinition};
use crate::commands::handler::EventExecutor;
use crate::platform::{EventKind, EventPayload};

/// Announces the gateway session once the bot is connected
pub struct ReadyHandler;

#[async_trait]
impl EventExecutor for ReadyHandler {
    async fn execute(&self, _ctx: Arc<DispatchContext>, payload: EventPayload) -> Result<()> {
        if let EventPayload::Ready {
            bot_name,
            guild_count,
        } = payload
        {
            info!("🤖 Logged in as {} ({} guilds)", bot_name, guild_count);
        }
        Ok(())
    }
}

pub fn definition() -> Result<EventDefinition, DefinitionError> {
    EventDefinition::builder(EventKind::Ready)
        .once(true)
        .execute(Arc::new(ReadyHandler))
        .build()
}
