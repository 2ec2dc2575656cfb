use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::Guild;
use serenity::model::id::GuildId;
use serenity::prelude::*;
use std::sync::Arc;

use partybot::commands::{
    builtin_definitions, load_definitions, register_global_commands, register_guild_commands,
    DispatchContext,
};
use partybot::core::Config;
use partybot::database::Database;
use partybot::dispatch::Dispatcher;
use partybot::platform::discord::{
    classify_interaction, guild_create_event, message_event, ready_event,
};

struct Handler {
    dispatcher: Arc<Dispatcher>,
    guild_id: Option<GuildId>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        self.dispatcher.spawn(message_event(ctx.http.clone(), &msg));
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🔗 Gateway session ID: {:?}", ready.session_id);

        let registry = self.dispatcher.registry();
        let registered = match self.guild_id {
            Some(guild_id) => {
                info!("🔧 Development mode: registering commands for guild {guild_id}");
                register_guild_commands(&ctx, guild_id, &registry).await
            }
            None => {
                info!("🌍 Production mode: registering commands globally");
                register_global_commands(&ctx, &registry).await
            }
        };
        if let Err(e) = registered {
            error!("Failed to register slash commands: {e:#}");
        }

        self.dispatcher.spawn(ready_event(&ready));
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: bool) {
        self.dispatcher.spawn(guild_create_event(&guild, is_new));
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match classify_interaction(ctx.http.clone(), interaction) {
            Some(event) => {
                self.dispatcher.spawn(event);
            }
            None => warn!("Ignoring unsupported interaction type"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting partybot...");

    let database = Database::new(&config.database_path).await?;
    let context = Arc::new(DispatchContext::new(database));

    let (registry, report) = load_definitions(builtin_definitions());
    if !report.failed.is_empty() {
        warn!(
            "⚠️ {} handler definitions failed to load and will be unavailable",
            report.failed.len()
        );
    }

    let dispatcher = Arc::new(
        Dispatcher::new(registry, context).with_default_cooldown(config.default_cooldown_seconds),
    );

    // Parse guild ID if provided for development mode
    let guild_id = config
        .discord_guild_id
        .as_ref()
        .and_then(|id| id.parse::<u64>().ok())
        .map(GuildId);

    let handler = Handler {
        dispatcher,
        guild_id,
    };

    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
