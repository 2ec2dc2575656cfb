//! Counting game message handler
//!
//! Watches the configured counting channel of each guild and advances, resets
//! or rejects counts.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

use crate::commands::context::DispatchContext;
use crate::commands::definition::{DefinitionError, EventDefinition};
use crate::commands::handler::EventExecutor;
use crate::features::counting::rules::{TWICE_IN_A_ROW_MESSAGE, WRONG_NUMBER_MESSAGE};
use crate::features::counting::{evaluate, CountVerdict, WARNING_LIFETIME};
use crate::platform::{EventKind, EventPayload, IncomingMessage};

pub struct CountingGameHandler;

#[async_trait]
impl EventExecutor for CountingGameHandler {
    async fn execute(&self, ctx: Arc<DispatchContext>, payload: EventPayload) -> Result<()> {
        let EventPayload::MessageCreate(message) = payload else {
            return Ok(());
        };
        if message.author_is_bot {
            return Ok(());
        }
        let Some(guild_id) = message.guild_id.as_deref() else {
            return Ok(());
        };

        let db = &ctx.database;
        let Some(counting) = db.get_counting(guild_id).await? else {
            return Ok(());
        };
        if counting.channel_id != message.channel_id {
            return Ok(());
        }

        match evaluate(&counting, &message.author_id, &message.content) {
            CountVerdict::SameUserTwice => {
                let warning_id = message.reply(TWICE_IN_A_ROW_MESSAGE).await?;
                tokio::spawn(remove_after_warning(message, warning_id));
            }
            CountVerdict::Wrong if counting.reset_on_fail => {
                db.reset_counting_count(guild_id).await?;
                message.reply(WRONG_NUMBER_MESSAGE).await?;
            }
            CountVerdict::Wrong => {
                message.delete().await?;
            }
            CountVerdict::Correct(number) => {
                db.increment_counting_count(guild_id, &message.author_id).await?;
                debug!("Guild {} counted to {}", guild_id, number);
            }
        }
        Ok(())
    }
}

async fn remove_after_warning(message: IncomingMessage, warning_id: String) {
    tokio::time::sleep(WARNING_LIFETIME).await;
    if let Err(e) = message.delete().await {
        warn!("Failed to delete repeated count {}: {}", message.id, e);
    }
    if let Err(e) = message.channel.delete_message(&warning_id).await {
        warn!("Failed to delete counting warning {}: {}", warning_id, e);
    }
}

pub fn definition() -> Result<EventDefinition, DefinitionError> {
    EventDefinition::builder(EventKind::MessageCreate)
        .execute(Arc::new(CountingGameHandler))
        .build()
}
