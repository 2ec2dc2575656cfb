//! Guild join handler
//!
//! Creates the guild record as soon as the bot sees a guild, so commands
//! invoked there later find it in place.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.2.0

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::context::DispatchContext;
use crate::commands::definition::{DefinitionError, EventDefinition};
use crate::commands::handler::EventExecutor;
use crate::platform::{EventKind, EventPayload};

pub struct GuildJoinHandler;

#[async_trait]
impl EventExecutor for GuildJoinHandler {
    async fn execute(&self, ctx: Arc<DispatchContext>, payload: EventPayload) -> Result<()> {
        let EventPayload::GuildCreate {
            guild_id,
            name,
            is_new,
        } = payload
        else {
            return Ok(());
        };

        ctx.database.get_or_create_guild(&guild_id).await?;
        if is_new {
            info!("🏠 Joined guild {} ({})", name, guild_id);
        }
        Ok(())
    }
}

pub fn definition() -> Result<EventDefinition, DefinitionError> {
    EventDefinition::builder(EventKind::GuildCreate)
        .execute(Arc::new(GuildJoinHandler))
        .build()
}
