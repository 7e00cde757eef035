/// Interaction dispatch engine.
///
/// Resolves an incoming interaction to a wired subcommand and runs it under
/// cooldown and deferred-reply policy. Handler failures (errors and panics)
/// stop here: they are logged and turned into a generic reply.
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use botforge_core::{GatewayEvent, Interaction, InteractionKind, Transport};
use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::context::{AutocompleteContext, EventContext, InteractionContext};
use crate::cooldown::{CooldownCheck, CooldownTracker};
use crate::registry::CommandRegistry;

/// Edit applied by the watchdog when a handler has not replied in time.
pub const EXPIRED_NOTICE: &str = "This interaction has expired.";

/// Edit applied when a handler fails.
pub const FAILURE_NOTICE: &str = "There was an error while executing this command!";

/// Default deferred-reply watchdog delay.
pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(10);

/// Terminal state of one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No wired subcommand matched.
    Ignored,
    /// The user was told to wait; the cooldown clock was not reset.
    RateLimited { remaining_secs: u64 },
    /// The handler ran to completion or its failure was contained.
    Completed { failed: bool },
}

pub fn cooldown_notice(remaining_secs: u64, command: &str) -> String {
    format!(
        "Please wait {:.1} more second(s) before reusing the `{}` command.",
        remaining_secs as f64, command
    )
}

pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    transport: Arc<dyn Transport>,
    cooldowns: CooldownTracker,
    watchdog: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
            cooldowns: CooldownTracker::new(),
            watchdog: DEFAULT_WATCHDOG,
        }
    }

    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Run a command interaction through resolve → cooldown → defer → execute.
    pub async fn dispatch(&self, interaction: Interaction) -> DispatchOutcome {
        if interaction.kind != InteractionKind::Command {
            return DispatchOutcome::Ignored;
        }
        let Some(command) = interaction
            .subcommand
            .as_deref()
            .and_then(|name| self.registry.subcommand(name))
        else {
            debug!(
                command = %interaction.command,
                subcommand = ?interaction.subcommand,
                "No wired subcommand; ignoring interaction"
            );
            return DispatchOutcome::Ignored;
        };

        let cooldown = Duration::from_secs(command.cooldown_secs);
        let check = self
            .cooldowns
            .check_and_commit(&command.member_name, &interaction.user_id, cooldown)
            .await;
        if let CooldownCheck::Cooling { .. } = check {
            let remaining_secs = check.remaining_secs();
            let notice = cooldown_notice(remaining_secs, &command.member_name);
            if let Err(e) = self.transport.reply_ephemeral(&interaction, &notice).await {
                warn!(command = %command.member_name, "Failed to send cooldown notice: {e:#}");
            }
            return DispatchOutcome::RateLimited { remaining_secs };
        }

        info!(
            command = %command.member_name,
            group = %command.group_key,
            user = %interaction.user_id,
            "Dispatching command"
        );
        let ctx = InteractionContext::new(interaction, self.transport.clone());

        if let Err(e) = self.transport.defer_reply(ctx.interaction(), command.ephemeral).await {
            error!(command = %command.member_name, "Failed to defer reply: {e:#}");
            self.report_failure(&ctx, &command.member_name).await;
            return DispatchOutcome::Completed { failed: true };
        }

        let watchdog = self.arm_watchdog(ctx.clone());

        let result = AssertUnwindSafe((command.run)(ctx.clone()))
            .catch_unwind()
            .await;
        let failed = match result {
            Ok(Ok(())) => false,
            Ok(Err(e)) => {
                error!(command = %command.member_name, "Command failed: {e:#}");
                true
            }
            Err(_) => {
                error!(command = %command.member_name, "Command panicked");
                true
            }
        };
        if failed {
            self.report_failure(&ctx, &command.member_name).await;
        }

        // Once a reply exists the watchdog has nothing left to do.
        if ctx.has_replied() {
            watchdog.abort();
        }
        DispatchOutcome::Completed { failed }
    }

    /// One-shot timer: edit the deferred reply if nobody has replied yet.
    /// It never interrupts the handler.
    fn arm_watchdog(&self, ctx: InteractionContext) -> tokio::task::JoinHandle<()> {
        let delay = self.watchdog;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if ctx.has_replied() {
                return;
            }
            debug!(interaction = %ctx.interaction().id, "Watchdog expired deferred reply");
            if let Err(e) = ctx.edit_unmarked(EXPIRED_NOTICE).await {
                warn!(interaction = %ctx.interaction().id, "Watchdog edit failed: {e:#}");
            }
        })
    }

    async fn report_failure(&self, ctx: &InteractionContext, command: &str) {
        if let Err(e) = ctx.edit_reply(FAILURE_NOTICE).await {
            error!(command, "Failed to report command failure: {e:#}");
        }
    }

    /// Route an autocomplete interaction to its command's handler.
    /// No cooldown, no deferral. Returns whether a handler ran.
    pub async fn autocomplete(&self, interaction: Interaction) -> bool {
        if interaction.kind != InteractionKind::Autocomplete {
            return false;
        }
        let Some(command) = interaction
            .subcommand
            .as_deref()
            .and_then(|name| self.registry.subcommand(name))
        else {
            return false;
        };
        let Some(handler) = command.autocomplete.clone() else {
            debug!(command = %command.member_name, "No autocomplete handler");
            return false;
        };

        let ctx = AutocompleteContext::new(interaction, self.transport.clone());
        match AssertUnwindSafe(handler(ctx)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(command = %command.member_name, "Autocomplete failed: {e:#}"),
            Err(_) => error!(command = %command.member_name, "Autocomplete panicked"),
        }
        true
    }

    /// Invoke the event handler registered under `name`, if any.
    pub async fn emit(&self, name: &str, payload: serde_json::Value) -> bool {
        let Some(handler) = self.registry.event(name) else {
            return false;
        };
        let ctx = EventContext {
            name: name.to_string(),
            payload,
        };
        match AssertUnwindSafe(handler(ctx)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(event = name, "Event handler failed: {e:#}"),
            Err(_) => error!(event = name, "Event handler panicked"),
        }
        true
    }

    /// Route one gateway event.
    pub async fn handle_event(&self, event: GatewayEvent) {
        let name = event.name().to_string();
        let payload = event.payload();
        match event {
            GatewayEvent::Ready { user_name } => {
                info!("Logged in as {}", user_name);
            }
            GatewayEvent::Error { message } => {
                error!("Platform error: {}", message);
            }
            GatewayEvent::Interaction(interaction) => match interaction.kind {
                InteractionKind::Command => {
                    self.dispatch(interaction).await;
                }
                InteractionKind::Autocomplete => {
                    self.autocomplete(interaction).await;
                }
                InteractionKind::Other => {}
            },
            GatewayEvent::Other { .. } => {}
        }
        self.emit(&name, payload).await;
    }

    /// Single ingress loop. Each event runs in its own task so slow
    /// handlers do not block other interactions.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<GatewayEvent>) {
        info!(
            subcommands = self.registry.subcommand_count(),
            events = self.registry.event_count(),
            "Dispatcher started"
        );
        while let Some(event) = rx.recv().await {
            let this = self.clone();
            tokio::spawn(async move { this.handle_event(event).await });
        }
        info!("Gateway channel closed; dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{GroupBuilder, StringOptionMeta};
    use crate::group::GroupRegistry;
    use crate::testing::{autocomplete_interaction, command_interaction, RecordingTransport, TransportCall};
    use anyhow::{bail, Result};
    use botforge_core::Choice;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Tools {
        readies: AtomicUsize,
    }

    impl Tools {
        async fn ping(self: Arc<Self>, ctx: InteractionContext) -> Result<()> {
            ctx.edit_reply("pong").await
        }

        async fn slow(self: Arc<Self>, ctx: InteractionContext) -> Result<()> {
            tokio::time::sleep(Duration::from_secs(11)).await;
            ctx.edit_reply("finally").await
        }

        async fn silent(self: Arc<Self>, _ctx: InteractionContext) -> Result<()> {
            Ok(())
        }

        async fn broken(self: Arc<Self>, _ctx: InteractionContext) -> Result<()> {
            bail!("database unreachable")
        }

        async fn panics(self: Arc<Self>, _ctx: InteractionContext) -> Result<()> {
            panic!("handler bug")
        }

        async fn suggest(self: Arc<Self>, ctx: AutocompleteContext) -> Result<()> {
            let typed = ctx.focused_value().unwrap_or_default().to_string();
            ctx.respond(vec![Choice::string(typed.clone(), typed)]).await
        }

        async fn ready(self: Arc<Self>, _ctx: EventContext) -> Result<()> {
            self.readies.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn setup() -> (Dispatcher, Arc<RecordingTransport>) {
        let mut groups = GroupRegistry::new();
        let mut builder = GroupBuilder::<Tools>::new("Tools");
        builder.member("ping", Tools::ping).command("Ping", 5, false);
        builder.member("slow", Tools::slow).command("Slow", 0, true);
        builder.member("silent", Tools::silent).command("Silent", 0, false);
        builder.member("broken", Tools::broken).command("Broken", 0, false);
        builder.member("panics", Tools::panics).command("Panics", 0, false);
        builder
            .member("search", Tools::ping)
            .string_option("query", "Query", true, StringOptionMeta {
                autocomplete: true,
                ..Default::default()
            })
            .command("Search", 0, false)
            .autocomplete(Tools::suggest);
        builder.member("ban", Tools::ping).command("Ban", u64::MAX, false);
        builder.event("ready", Tools::ready);
        let id = builder.seal(&mut groups);

        let mut registry = CommandRegistry::new();
        registry.wire(&groups, id).unwrap();

        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = Dispatcher::new(Arc::new(registry), transport.clone());
        (dispatcher, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_command_defers_then_edits() {
        let (dispatcher, transport) = setup();
        let outcome = dispatcher.dispatch(command_interaction("i1", "tools", "ping", "u1")).await;

        assert_eq!(outcome, DispatchOutcome::Completed { failed: false });
        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::Defer { interaction_id: "i1".into(), ephemeral: false },
                TransportCall::Edit { interaction_id: "i1".into(), content: "pong".into() },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_rejects_then_recovers() {
        let (dispatcher, transport) = setup();

        let first = dispatcher.dispatch(command_interaction("i1", "tools", "ping", "u1")).await;
        assert_eq!(first, DispatchOutcome::Completed { failed: false });

        tokio::time::advance(Duration::from_secs(2)).await;
        let second = dispatcher.dispatch(command_interaction("i2", "tools", "ping", "u1")).await;
        assert_eq!(second, DispatchOutcome::RateLimited { remaining_secs: 3 });
        assert_eq!(
            transport.calls_for("i2"),
            vec![TransportCall::ReplyEphemeral {
                interaction_id: "i2".into(),
                content: "Please wait 3.0 more second(s) before reusing the `ping` command.".into(),
            }]
        );

        // Another user is unaffected.
        let other = dispatcher.dispatch(command_interaction("i3", "tools", "ping", "u2")).await;
        assert_eq!(other, DispatchOutcome::Completed { failed: false });

        tokio::time::advance(Duration::from_secs(4)).await;
        let third = dispatcher.dispatch(command_interaction("i4", "tools", "ping", "u1")).await;
        assert_eq!(third, DispatchOutcome::Completed { failed: false });

        // The clock restarted at t0+6s.
        tokio::time::advance(Duration::from_secs(1)).await;
        let fourth = dispatcher.dispatch(command_interaction("i5", "tools", "ping", "u1")).await;
        assert_eq!(fourth, DispatchOutcome::RateLimited { remaining_secs: 4 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_cooldown_still_sends_notice() {
        let (dispatcher, transport) = setup();

        let first = dispatcher.dispatch(command_interaction("i1", "tools", "ban", "u1")).await;
        assert_eq!(first, DispatchOutcome::Completed { failed: false });

        tokio::time::advance(Duration::from_secs(60)).await;
        let second = dispatcher.dispatch(command_interaction("i2", "tools", "ban", "u1")).await;
        assert!(matches!(second, DispatchOutcome::RateLimited { .. }));

        let calls = transport.calls_for("i2");
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], TransportCall::ReplyEphemeral { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_does_not_hide_late_reply() {
        let (dispatcher, transport) = setup();
        let outcome = dispatcher.dispatch(command_interaction("i1", "tools", "slow", "u1")).await;

        assert_eq!(outcome, DispatchOutcome::Completed { failed: false });
        assert_eq!(
            transport.edits_for("i1"),
            vec![EXPIRED_NOTICE.to_string(), "finally".to_string()]
        );
        assert_eq!(
            transport.calls_for("i1")[0],
            TransportCall::Defer { interaction_id: "i1".into(), ephemeral: true }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_expires_silent_handler() {
        let (dispatcher, transport) = setup();
        dispatcher.dispatch(command_interaction("i1", "tools", "silent", "u1")).await;
        assert!(transport.edits_for("i1").is_empty());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(transport.edits_for("i1"), vec![EXPIRED_NOTICE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_stays_quiet_after_reply() {
        let (dispatcher, transport) = setup();
        dispatcher.dispatch(command_interaction("i1", "tools", "ping", "u1")).await;

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(transport.edits_for("i1"), vec!["pong".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_error_is_contained() {
        let (dispatcher, transport) = setup();
        let outcome = dispatcher.dispatch(command_interaction("i1", "tools", "broken", "u1")).await;

        assert_eq!(outcome, DispatchOutcome::Completed { failed: true });
        assert_eq!(transport.edits_for("i1"), vec![FAILURE_NOTICE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_panic_is_contained() {
        let (dispatcher, transport) = setup();
        let outcome = dispatcher.dispatch(command_interaction("i1", "tools", "panics", "u1")).await;

        assert_eq!(outcome, DispatchOutcome::Completed { failed: true });
        assert_eq!(transport.edits_for("i1"), vec![FAILURE_NOTICE.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_defer_reports_failure() {
        let (dispatcher, transport) = setup();
        transport.fail_defers(true);
        let outcome = dispatcher.dispatch(command_interaction("i1", "tools", "ping", "u1")).await;

        assert_eq!(outcome, DispatchOutcome::Completed { failed: true });
        assert_eq!(transport.edits_for("i1"), vec![FAILURE_NOTICE.to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_subcommand_is_ignored() {
        let (dispatcher, transport) = setup();
        let outcome = dispatcher.dispatch(command_interaction("i1", "tools", "nope", "u1")).await;

        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert!(transport.calls().is_empty());
        assert!(dispatcher.cooldowns().is_empty().await);
    }

    #[tokio::test]
    async fn test_autocomplete_routes_without_deferring() {
        let (dispatcher, transport) = setup();
        let handled = dispatcher
            .autocomplete(autocomplete_interaction("i1", "tools", "search", "u1", "query", "rus"))
            .await;

        assert!(handled);
        assert_eq!(
            transport.calls(),
            vec![TransportCall::Autocomplete {
                interaction_id: "i1".into(),
                choices: vec![Choice::string("rus", "rus")],
            }]
        );
        assert!(dispatcher.cooldowns().is_empty().await);
    }

    #[tokio::test]
    async fn test_autocomplete_without_handler_is_skipped() {
        let (dispatcher, transport) = setup();
        let handled = dispatcher
            .autocomplete(autocomplete_interaction("i1", "tools", "ping", "u1", "query", "x"))
            .await;
        assert!(!handled);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_loop_routes_gateway_events() {
        let (dispatcher, transport) = setup();
        let dispatcher = Arc::new(dispatcher);
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(dispatcher.clone().run(rx));

        tx.send(GatewayEvent::Ready { user_name: "bot".into() }).await.unwrap();
        tx.send(GatewayEvent::Interaction(command_interaction("i1", "tools", "ping", "u1")))
            .await
            .unwrap();
        drop(tx);
        handle.await.unwrap();

        // Spawned per-event tasks finish shortly after the loop exits.
        for _ in 0..50 {
            if transport.edits_for("i1").len() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(transport.edits_for("i1"), vec!["pong".to_string()]);
        assert!(dispatcher.emit("ready", serde_json::json!({})).await);
        assert!(!dispatcher.emit("guildCreate", serde_json::json!({})).await);
    }
}
