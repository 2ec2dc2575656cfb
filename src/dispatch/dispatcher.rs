//! Event dispatcher
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! Every inbound event is routed here. Handlers run on their own tokio task so
//! an error or a panic in one of them ends at this boundary: it is logged, the
//! user gets a generic acknowledgement, and nothing else is affected.

use anyhow::{anyhow, Result};
use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::commands::context::DispatchContext;
use crate::commands::registry::{CommandRegistry, RegistryHandle};
use crate::core::{
    cooldown_message, Clock, SystemClock, COMMAND_FAILED_MESSAGE, DEFAULT_COOLDOWN_SECONDS,
};
use crate::features::rate_limiting::{CooldownOutcome, CooldownTracker};
use crate::platform::{AutocompleteRequest, CommandInvocation, EventPayload, InboundEvent, Reply};

/// What the dispatcher did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every handler that ran succeeded
    Completed,
    /// Nothing is registered to handle this kind of event
    Dropped,
    /// A command or autocomplete request named an unregistered command
    HandlerNotFound,
    /// The user was told to retry at `retry_at` (epoch millis)
    CoolingDown { retry_at: i64 },
    /// A handler failed; the failure was contained and logged
    Failed,
}

pub struct Dispatcher {
    registry: RegistryHandle,
    context: Arc<DispatchContext>,
    cooldowns: CooldownTracker,
    clock: Arc<dyn Clock>,
    default_cooldown_seconds: u64,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, context: Arc<DispatchContext>) -> Self {
        Self {
            registry: RegistryHandle::new(registry),
            context,
            cooldowns: CooldownTracker::new(),
            clock: Arc::new(SystemClock),
            default_cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Cooldown for commands that do not declare one
    pub fn with_default_cooldown(mut self, seconds: u64) -> Self {
        self.default_cooldown_seconds = seconds;
        self
    }

    /// Snapshot of the active registry
    pub fn registry(&self) -> Arc<CommandRegistry> {
        self.registry.snapshot()
    }

    /// Swap in a new registry; events already in flight finish on the old one
    pub fn reload(&self, registry: CommandRegistry) {
        let commands = registry.len();
        let events = registry.event_handler_count();
        self.registry.swap(registry);
        info!("🔄 Registry reloaded ({} commands, {} event handlers)", commands, events);
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Dispatch on a new task, one per inbound event
    pub fn spawn(self: &Arc<Self>, event: InboundEvent) -> JoinHandle<DispatchOutcome> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(event).await })
    }

    /// Route one event to its handlers. Never fails.
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        let request_id = Uuid::new_v4();
        debug!("[{}] 📨 Received {}", request_id, event.label());

        match event {
            InboundEvent::Command(invocation) => self.dispatch_command(request_id, invocation).await,
            InboundEvent::Autocomplete(request) => {
                self.dispatch_autocomplete(request_id, request).await
            }
            InboundEvent::Event(payload) => self.dispatch_event(request_id, payload).await,
        }
    }

    async fn dispatch_command(&self, request_id: Uuid, invocation: CommandInvocation) -> DispatchOutcome {
        let registry = self.registry.snapshot();
        let Some(command) = registry.get_command(&invocation.name) else {
            warn!("[{}] ⚠️ Command not found: /{}", request_id, invocation.name);
            return DispatchOutcome::HandlerNotFound;
        };

        let location = invocation.guild_id.as_deref().unwrap_or("DM");
        info!(
            "[{}] 📥 /{} from user {} in {}",
            request_id, invocation.name, invocation.user_id, location
        );

        if let Some(guild_id) = &invocation.guild_id {
            if let Err(e) = self.context.database.get_or_create_guild(guild_id).await {
                error!(
                    "[{}] ❌ Guild bootstrap failed for /{} in {}: {:#}",
                    request_id,
                    invocation.name,
                    guild_id,
                    anyhow::Error::from(e)
                );
                report_failure(request_id, &invocation).await;
                return DispatchOutcome::Failed;
            }
        }

        let cooldown = command
            .cooldown_seconds()
            .unwrap_or(self.default_cooldown_seconds);
        let outcome = self.cooldowns.check_and_record(
            &invocation.name,
            &invocation.user_id,
            cooldown,
            self.clock.now_millis(),
        );
        if let CooldownOutcome::Blocked { retry_at } = outcome {
            info!(
                "[{}] ⏳ User {} on cooldown for /{} until {}",
                request_id, invocation.user_id, invocation.name, retry_at
            );
            let notice = Reply::ephemeral(cooldown_message(retry_at));
            if let Err(e) = invocation.replies.reply(notice).await {
                warn!("[{}] Failed to send cooldown notice: {:#}", request_id, e);
            }
            return DispatchOutcome::CoolingDown { retry_at };
        }

        let handler = command.execute_handler();
        let ctx = Arc::clone(&self.context);
        let task_invocation = invocation.clone();
        let result = run_contained(async move { handler.execute(ctx, task_invocation).await }).await;

        match result {
            Ok(()) => {
                info!("[{}] ✅ /{} completed", request_id, invocation.name);
                DispatchOutcome::Completed
            }
            Err(e) => {
                error!(
                    "[{}] ❌ Error executing /{} for user {} in {}: {:#}",
                    request_id, invocation.name, invocation.user_id, location, e
                );
                report_failure(request_id, &invocation).await;
                DispatchOutcome::Failed
            }
        }
    }

    async fn dispatch_autocomplete(&self, request_id: Uuid, request: AutocompleteRequest) -> DispatchOutcome {
        let registry = self.registry.snapshot();
        let Some(command) = registry.get_command(&request.command_name) else {
            warn!(
                "[{}] ⚠️ Autocomplete for unknown command /{}",
                request_id, request.command_name
            );
            return DispatchOutcome::HandlerNotFound;
        };
        let Some(handler) = command.autocomplete_handler() else {
            debug!("[{}] /{} has no autocomplete", request_id, request.command_name);
            return DispatchOutcome::Dropped;
        };

        let command_name = request.command_name.clone();
        let ctx = Arc::clone(&self.context);
        match run_contained(async move { handler.autocomplete(ctx, request).await }).await {
            Ok(()) => DispatchOutcome::Completed,
            Err(e) => {
                error!(
                    "[{}] ❌ Error handling autocomplete for /{}: {:#}",
                    request_id, command_name, e
                );
                DispatchOutcome::Failed
            }
        }
    }

    /// Run the handlers bound to the event in registration order
    async fn dispatch_event(&self, request_id: Uuid, payload: EventPayload) -> DispatchOutcome {
        let kind = payload.kind();
        let registry = self.registry.snapshot();
        let handlers = registry.event_handlers(kind);
        if handlers.is_empty() {
            debug!("[{}] No handlers for event {}", request_id, kind);
            return DispatchOutcome::Dropped;
        }

        let mut failed = false;
        for (position, registration) in handlers.iter().enumerate() {
            if !registration.claim() {
                continue;
            }
            let handler = registration.definition().execute_handler();
            let ctx = Arc::clone(&self.context);
            let event_payload = payload.clone();
            if let Err(e) = run_contained(async move { handler.execute(ctx, event_payload).await }).await
            {
                error!(
                    "[{}] ❌ Error in {} handler #{}: {:#}",
                    request_id, kind, position, e
                );
                failed = true;
            }
        }

        if failed {
            DispatchOutcome::Failed
        } else {
            DispatchOutcome::Completed
        }
    }
}

/// Run a handler future on its own task, turning a panic into an error
async fn run_contained<F>(future: F) -> Result<()>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    match tokio::spawn(future).await {
        Ok(result) => result,
        Err(join_error) => Err(anyhow!("handler task aborted: {}", join_error)),
    }
}

/// Tell the user a command failed, as a follow-up if it was already acknowledged
async fn report_failure(request_id: Uuid, invocation: &CommandInvocation) {
    let notice = Reply::ephemeral(COMMAND_FAILED_MESSAGE);
    let sent = if invocation.replies.is_acknowledged() {
        invocation.replies.follow_up(notice).await
    } else {
        invocation.replies.reply(notice).await
    };
    if let Err(e) = sent {
        warn!("[{}] Failed to report error to user: {:#}", request_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::test_context;
    use crate::commands::definition::{CommandDefinition, CommandSchema, EventDefinition};
    use crate::commands::handler::{AutocompleteExecutor, CommandExecutor, EventExecutor};
    use crate::commands::registry::{load_definitions, DefinitionCandidate};
    use crate::core::ManualClock;
    use crate::platform::testing::{self, RecordedReply};
    use crate::platform::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const START: i64 = 1_700_000_000_000;

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    impl Counter {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CommandExecutor for Counter {
        async fn execute(&self, _ctx: Arc<DispatchContext>, inv: CommandInvocation) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            inv.replies.reply(Reply::ephemeral("Pong!")).await
        }
    }

    #[async_trait]
    impl EventExecutor for Counter {
        async fn execute(&self, _ctx: Arc<DispatchContext>, _payload: EventPayload) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl CommandExecutor for Failing {
        async fn execute(&self, _ctx: Arc<DispatchContext>, _inv: CommandInvocation) -> Result<()> {
            Err(anyhow!("database exploded"))
        }
    }

    #[async_trait]
    impl AutocompleteExecutor for Failing {
        async fn autocomplete(&self, _ctx: Arc<DispatchContext>, _req: AutocompleteRequest) -> Result<()> {
            Err(anyhow!("lookup failed"))
        }
    }

    #[async_trait]
    impl EventExecutor for Failing {
        async fn execute(&self, _ctx: Arc<DispatchContext>, _payload: EventPayload) -> Result<()> {
            Err(anyhow!("event failed"))
        }
    }

    struct DeferThenFail;

    #[async_trait]
    impl CommandExecutor for DeferThenFail {
        async fn execute(&self, _ctx: Arc<DispatchContext>, inv: CommandInvocation) -> Result<()> {
            inv.replies.defer_reply(true).await?;
            Err(anyhow!("failed after defer"))
        }
    }

    struct Panicking;

    #[async_trait]
    impl CommandExecutor for Panicking {
        async fn execute(&self, _ctx: Arc<DispatchContext>, _inv: CommandInvocation) -> Result<()> {
            panic!("handler bug");
        }
    }

    fn command(
        name: &str,
        cooldown: Option<u64>,
        handler: Arc<dyn CommandExecutor>,
    ) -> DefinitionCandidate {
        let mut builder =
            CommandDefinition::builder(CommandSchema::new(name, "Test command")).execute(handler);
        if let Some(seconds) = cooldown {
            builder = builder.cooldown(seconds);
        }
        DefinitionCandidate::new(name, builder.build())
    }

    async fn dispatcher(
        candidates: Vec<DefinitionCandidate>,
        clock: Arc<ManualClock>,
    ) -> Dispatcher {
        let (registry, report) = load_definitions(candidates);
        assert!(report.failed.is_empty());
        Dispatcher::new(registry, test_context().await).with_clock(clock)
    }

    fn ready() -> InboundEvent {
        InboundEvent::Event(EventPayload::Ready {
            bot_name: "partybot".to_string(),
            guild_count: 1,
        })
    }

    #[tokio::test]
    async fn test_ping_cooldown_scenario() {
        let clock = Arc::new(ManualClock::new(START));
        let ping = Arc::new(Counter::default());
        let dispatcher = dispatcher(vec![command("ping", Some(3), ping.clone())], clock.clone()).await;

        let (inv, _) = testing::invocation("ping", "U1", Some("1"), vec![]);
        assert_eq!(dispatcher.dispatch(InboundEvent::Command(inv)).await, DispatchOutcome::Completed);

        clock.set(START + 1_000);
        let (inv, responder) = testing::invocation("ping", "U1", Some("1"), vec![]);
        assert_eq!(
            dispatcher.dispatch(InboundEvent::Command(inv)).await,
            DispatchOutcome::CoolingDown {
                retry_at: START + 3_000
            }
        );
        assert_eq!(
            responder.recorded(),
            vec![RecordedReply::Reply(Reply::ephemeral(cooldown_message(START + 3_000)))]
        );

        let (inv, _) = testing::invocation("ping", "U2", Some("1"), vec![]);
        assert_eq!(dispatcher.dispatch(InboundEvent::Command(inv)).await, DispatchOutcome::Completed);

        clock.set(START + 3_100);
        let (inv, _) = testing::invocation("ping", "U1", Some("1"), vec![]);
        assert_eq!(dispatcher.dispatch(InboundEvent::Command(inv)).await, DispatchOutcome::Completed);

        assert_eq!(ping.calls(), 3);
    }

    #[tokio::test]
    async fn test_guild_bootstrap_failure_is_reported_once() {
        let ping = Arc::new(Counter::default());
        let (registry, _) = load_definitions(vec![command("ping", Some(3), ping.clone())]);
        let database = crate::database::test_database_without("guilds").await;
        let dispatcher = Dispatcher::new(registry, Arc::new(DispatchContext::new(database)))
            .with_clock(Arc::new(ManualClock::new(START)));

        let (inv, responder) = testing::invocation("ping", "U1", Some("1"), vec![]);
        assert_eq!(dispatcher.dispatch(InboundEvent::Command(inv)).await, DispatchOutcome::Failed);

        assert_eq!(
            responder.recorded(),
            vec![RecordedReply::Reply(Reply::ephemeral(COMMAND_FAILED_MESSAGE))]
        );
        assert_eq!(ping.calls(), 0);
        assert!(!dispatcher.cooldowns().is_tracking("ping", "U1"));
    }

    #[tokio::test]
    async fn test_unset_cooldown_uses_default() {
        let clock = Arc::new(ManualClock::new(START));
        let ping = Arc::new(Counter::default());
        let dispatcher = dispatcher(vec![command("ping", None, ping.clone())], clock.clone())
            .await
            .with_default_cooldown(5);

        let (inv, _) = testing::invocation("ping", "U1", None, vec![]);
        dispatcher.dispatch(InboundEvent::Command(inv)).await;
        clock.advance(4_000);
        let (inv, _) = testing::invocation("ping", "U1", None, vec![]);
        assert_eq!(
            dispatcher.dispatch(InboundEvent::Command(inv)).await,
            DispatchOutcome::CoolingDown {
                retry_at: START + 5_000
            }
        );
        assert_eq!(ping.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_cooldown_never_blocks() {
        let clock = Arc::new(ManualClock::new(START));
        let ping = Arc::new(Counter::default());
        let dispatcher = dispatcher(vec![command("ping", Some(0), ping.clone())], clock).await;

        for _ in 0..3 {
            let (inv, _) = testing::invocation("ping", "U1", None, vec![]);
            assert_eq!(dispatcher.dispatch(InboundEvent::Command(inv)).await, DispatchOutcome::Completed);
        }
        assert_eq!(ping.calls(), 3);
        assert!(dispatcher.cooldowns().is_empty());
    }

    #[tokio::test]
    async fn test_guild_is_bootstrapped() {
        let clock = Arc::new(ManualClock::new(START));
        let dispatcher =
            dispatcher(vec![command("ping", Some(0), Arc::new(Counter::default()))], clock).await;

        let (inv, _) = testing::invocation("ping", "U1", Some("555"), vec![]);
        dispatcher.dispatch(InboundEvent::Command(inv)).await;

        let guild = dispatcher.context.database.get_guild("555").await.unwrap();
        assert!(guild.is_some());
    }

    #[tokio::test]
    async fn test_unknown_command_is_silent() {
        let clock = Arc::new(ManualClock::new(START));
        let dispatcher = dispatcher(vec![], clock).await;

        let (inv, responder) = testing::invocation("nope", "U1", None, vec![]);
        assert_eq!(
            dispatcher.dispatch(InboundEvent::Command(inv)).await,
            DispatchOutcome::HandlerNotFound
        );
        assert!(responder.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_failing_handler_gets_one_generic_reply() {
        let clock = Arc::new(ManualClock::new(START));
        let dispatcher = dispatcher(vec![command("boom", None, Arc::new(Failing))], clock).await;

        let (inv, responder) = testing::invocation("boom", "U1", None, vec![]);
        assert_eq!(dispatcher.dispatch(InboundEvent::Command(inv)).await, DispatchOutcome::Failed);
        assert_eq!(
            responder.recorded(),
            vec![RecordedReply::Reply(Reply::ephemeral(COMMAND_FAILED_MESSAGE))]
        );
    }

    #[tokio::test]
    async fn test_failure_after_defer_uses_follow_up() {
        let clock = Arc::new(ManualClock::new(START));
        let dispatcher = dispatcher(vec![command("slow", None, Arc::new(DeferThenFail))], clock).await;

        let (inv, responder) = testing::invocation("slow", "U1", None, vec![]);
        assert_eq!(dispatcher.dispatch(InboundEvent::Command(inv)).await, DispatchOutcome::Failed);
        assert_eq!(
            responder.recorded(),
            vec![
                RecordedReply::Defer { ephemeral: true },
                RecordedReply::FollowUp(Reply::ephemeral(COMMAND_FAILED_MESSAGE)),
            ]
        );
    }

    #[tokio::test]
    async fn test_panicking_handler_is_contained() {
        let clock = Arc::new(ManualClock::new(START));
        let ping = Arc::new(Counter::default());
        let dispatcher = Arc::new(
            dispatcher(
                vec![
                    command("panic", None, Arc::new(Panicking)),
                    command("ping", None, ping.clone()),
                ],
                clock,
            )
            .await,
        );

        let (panic_inv, panic_responder) = testing::invocation("panic", "U1", None, vec![]);
        let (ping_inv, ping_responder) = testing::invocation("ping", "U2", None, vec![]);
        let panicked = dispatcher.spawn(InboundEvent::Command(panic_inv));
        let pinged = dispatcher.spawn(InboundEvent::Command(ping_inv));

        assert_eq!(panicked.await.unwrap(), DispatchOutcome::Failed);
        assert_eq!(pinged.await.unwrap(), DispatchOutcome::Completed);
        assert_eq!(
            panic_responder.recorded(),
            vec![RecordedReply::Reply(Reply::ephemeral(COMMAND_FAILED_MESSAGE))]
        );
        assert_eq!(
            ping_responder.recorded(),
            vec![RecordedReply::Reply(Reply::ephemeral("Pong!"))]
        );
    }

    #[tokio::test]
    async fn test_autocomplete_failure_is_silent() {
        let clock = Arc::new(ManualClock::new(START));
        let definition = CommandDefinition::builder(CommandSchema::new("birthday", "Birthdays"))
            .execute(Arc::new(Counter::default()))
            .autocomplete(Arc::new(Failing))
            .build();
        let dispatcher = dispatcher(vec![DefinitionCandidate::new("birthday", definition)], clock).await;

        let (request, responder) = testing::autocomplete("birthday", vec![]);
        assert_eq!(
            dispatcher.dispatch(InboundEvent::Autocomplete(request)).await,
            DispatchOutcome::Failed
        );
        assert!(responder.responses().is_empty());
        assert!(dispatcher.cooldowns().is_empty());
    }

    #[tokio::test]
    async fn test_autocomplete_without_callback_is_dropped() {
        let clock = Arc::new(ManualClock::new(START));
        let dispatcher =
            dispatcher(vec![command("ping", None, Arc::new(Counter::default()))], clock).await;

        let (request, _) = testing::autocomplete("ping", vec![]);
        assert_eq!(
            dispatcher.dispatch(InboundEvent::Autocomplete(request)).await,
            DispatchOutcome::Dropped
        );
    }

    #[tokio::test]
    async fn test_once_event_handler_fires_once() {
        let clock = Arc::new(ManualClock::new(START));
        let once = Arc::new(Counter::default());
        let always = Arc::new(Counter::default());
        let candidates = vec![
            DefinitionCandidate::new(
                "ready-once",
                EventDefinition::builder(EventKind::Ready)
                    .once(true)
                    .execute(once.clone())
                    .build(),
            ),
            DefinitionCandidate::new(
                "ready",
                EventDefinition::builder(EventKind::Ready)
                    .execute(always.clone())
                    .build(),
            ),
        ];
        let dispatcher = dispatcher(candidates, clock).await;

        assert_eq!(dispatcher.dispatch(ready()).await, DispatchOutcome::Completed);
        assert_eq!(dispatcher.dispatch(ready()).await, DispatchOutcome::Completed);

        assert_eq!(once.calls(), 1);
        assert_eq!(always.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_event_handler_does_not_stop_later_ones() {
        let clock = Arc::new(ManualClock::new(START));
        let after = Arc::new(Counter::default());
        let candidates = vec![
            DefinitionCandidate::new(
                "failing",
                EventDefinition::builder(EventKind::Ready)
                    .execute(Arc::new(Failing))
                    .build(),
            ),
            DefinitionCandidate::new(
                "after",
                EventDefinition::builder(EventKind::Ready)
                    .execute(after.clone())
                    .build(),
            ),
        ];
        let dispatcher = dispatcher(candidates, clock).await;

        assert_eq!(dispatcher.dispatch(ready()).await, DispatchOutcome::Failed);
        assert_eq!(after.calls(), 1);
    }

    #[tokio::test]
    async fn test_event_without_handlers_is_dropped() {
        let clock = Arc::new(ManualClock::new(START));
        let dispatcher = dispatcher(vec![], clock).await;
        assert_eq!(dispatcher.dispatch(ready()).await, DispatchOutcome::Dropped);
    }

    #[tokio::test]
    async fn test_reload_swaps_registry() {
        let clock = Arc::new(ManualClock::new(START));
        let dispatcher =
            dispatcher(vec![command("ping", Some(0), Arc::new(Counter::default()))], clock).await;

        let (replacement, _) =
            load_definitions(vec![command("pong", Some(0), Arc::new(Counter::default()))]);
        dispatcher.reload(replacement);

        let (inv, _) = testing::invocation("ping", "U1", None, vec![]);
        assert_eq!(
            dispatcher.dispatch(InboundEvent::Command(inv)).await,
            DispatchOutcome::HandlerNotFound
        );
        let (inv, _) = testing::invocation("pong", "U1", None, vec![]);
        assert_eq!(dispatcher.dispatch(InboundEvent::Command(inv)).await, DispatchOutcome::Completed);
    }
}
