//! Declare → seal → wire → dispatch, through the public API only.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use botforge_commands::testing::{command_interaction, RecordingTransport, TransportCall};
use botforge_commands::{
    publish, CommandGroup, CommandRegistry, DispatchOutcome, Dispatcher, EventContext, GroupBuilder,
    GroupRegistry, IntegerOptionMeta, InteractionContext,
};
use botforge_core::{GatewayEvent, IntegrationType};

#[derive(Default)]
struct Dice {
    rolls: AtomicUsize,
}

impl Dice {
    async fn roll(self: Arc<Self>, ctx: InteractionContext) -> Result<()> {
        let sides = ctx.interaction().option_i64("sides").unwrap_or(6);
        let n = self.rolls.fetch_add(1, Ordering::SeqCst) + 1;
        ctx.edit_reply(format!("roll #{n} on a d{sides}")).await
    }
}

impl CommandGroup for Dice {
    const NAME: &'static str = "Dice";

    fn declare(group: &mut GroupBuilder<Self>) {
        group.integration(&[IntegrationType::Guild]);
        group
            .member("roll", Dice::roll)
            .integer_option("sides", "Number of sides", false, IntegerOptionMeta {
                min_value: Some(2),
                ..Default::default()
            })
            .command("Roll a die", 5, false);
    }
}

#[derive(Default)]
struct Lifecycle {
    seen: AtomicUsize,
}

impl Lifecycle {
    async fn ready(self: Arc<Self>, _ctx: EventContext) -> Result<()> {
        self.seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl CommandGroup for Lifecycle {
    const NAME: &'static str = "Lifecycle";

    fn declare(group: &mut GroupBuilder<Self>) {
        group.event("ready", Lifecycle::ready);
        group.event("error", Lifecycle::ready);
    }
}

fn build() -> (Arc<Dispatcher>, Arc<RecordingTransport>, Arc<CommandRegistry>) {
    let mut groups = GroupRegistry::new();
    groups.declare::<Dice>();
    groups.declare::<Lifecycle>();

    let mut registry = CommandRegistry::new();
    registry.wire_all(&groups).expect("all groups sealed");
    let registry = Arc::new(registry);

    let transport = Arc::new(RecordingTransport::new());
    let dispatcher = Arc::new(Dispatcher::new(registry.clone(), transport.clone()));
    (dispatcher, transport, registry)
}

#[test]
fn event_groups_only_feed_the_event_map() {
    let (_, _, registry) = build();
    let published = registry.published_commands();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].group_key, "dice");
    assert!(registry.group("lifecycle").is_none());
    assert!(registry.event("ready").is_some());
    assert!(registry.event("error").is_some());
}

#[tokio::test(start_paused = true)]
async fn handlers_share_one_group_instance() {
    let (dispatcher, transport, _) = build();

    dispatcher.dispatch(command_interaction("a", "dice", "roll", "u1")).await;
    dispatcher.dispatch(command_interaction("b", "dice", "roll", "u2")).await;

    assert_eq!(transport.edits_for("a"), vec!["roll #1 on a d6".to_string()]);
    assert_eq!(transport.edits_for("b"), vec!["roll #2 on a d6".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn cooldown_spans_interactions_of_the_same_user() {
    let (dispatcher, _, _) = build();

    let first = dispatcher.dispatch(command_interaction("a", "dice", "roll", "u1")).await;
    tokio::time::advance(Duration::from_secs(2)).await;
    let second = dispatcher.dispatch(command_interaction("b", "dice", "roll", "u1")).await;
    tokio::time::advance(Duration::from_secs(4)).await;
    let third = dispatcher.dispatch(command_interaction("c", "dice", "roll", "u1")).await;

    assert_eq!(first, DispatchOutcome::Completed { failed: false });
    assert_eq!(second, DispatchOutcome::RateLimited { remaining_secs: 3 });
    assert_eq!(third, DispatchOutcome::Completed { failed: false });
}

#[tokio::test]
async fn unknown_subcommand_leaves_no_trace() {
    let (dispatcher, transport, _) = build();
    let outcome = dispatcher.dispatch(command_interaction("a", "dice", "flip", "u1")).await;

    assert_eq!(outcome, DispatchOutcome::Ignored);
    assert!(transport.calls().is_empty());
    assert!(!dispatcher.cooldowns().is_cooling("flip", "u1").await);
}

#[tokio::test]
async fn ready_event_reaches_event_group() {
    let (dispatcher, _, _) = build();
    dispatcher
        .handle_event(GatewayEvent::Ready { user_name: "forge".into() })
        .await;
    assert!(dispatcher.emit("error", serde_json::json!({ "message": "x" })).await);
}

#[tokio::test]
async fn published_payload_matches_wired_groups() {
    let (_, transport, registry) = build();
    publish(transport.as_ref(), &registry, "app", None).await.unwrap();

    let calls = transport.calls();
    let TransportCall::Publish { commands, .. } = &calls[0] else {
        panic!("expected a publish call, got {calls:?}");
    };
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].subcommands[0].name, "roll");
    assert_eq!(commands[0].integration_surfaces.len(), 1);
}
