//! Command groups shipped with the `botforge` binary.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use botforge_commands::{
    AutocompleteContext, CommandGroup, EventContext, GroupBuilder, GroupRegistry, IntegerOptionMeta,
    InteractionContext, StringOptionMeta,
};
use botforge_core::{Choice, ContextType, IntegrationType};
use rand::Rng;
use tracing::{info, warn};

const TOPICS: &[&str] = &[
    "rust", "tokio", "serde", "tracing", "async", "traits", "lifetimes", "macros",
];

/// Autocomplete answers are capped by the platform.
const MAX_SUGGESTIONS: usize = 25;

/// Declare and seal every built-in group.
pub fn declare_all(groups: &mut GroupRegistry) {
    groups.declare::<Utility>();
    groups.declare::<Lifecycle>();
}

// ---------------------------------------------------------------------------
// /utility
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Utility {
    pings: AtomicU64,
}

impl Utility {
    async fn ping(self: Arc<Self>, ctx: InteractionContext) -> Result<()> {
        let n = self.pings.fetch_add(1, Ordering::Relaxed) + 1;
        ctx.edit_reply(format!("Pong! ({n} since startup)")).await
    }

    async fn echo(self: Arc<Self>, ctx: InteractionContext) -> Result<()> {
        let text = ctx
            .interaction()
            .option_str("text")
            .context("missing required option `text`")?
            .to_string();
        ctx.edit_reply(text).await
    }

    async fn roll(self: Arc<Self>, ctx: InteractionContext) -> Result<()> {
        let sides = ctx.interaction().option_i64("sides").unwrap_or(6).max(2);
        let value = roll_die(sides);
        ctx.edit_reply(format!("🎲 You rolled a {value} on a d{sides}")).await
    }

    async fn topic(self: Arc<Self>, ctx: InteractionContext) -> Result<()> {
        let topic = ctx
            .interaction()
            .option_str("name")
            .context("missing required option `name`")?
            .to_string();
        ctx.edit_reply(format!("Today's topic: **{topic}**")).await
    }

    async fn suggest_topics(self: Arc<Self>, ctx: AutocompleteContext) -> Result<()> {
        let typed = ctx.focused_value().unwrap_or_default();
        ctx.respond(suggest(typed)).await
    }
}

fn roll_die(sides: i64) -> i64 {
    rand::thread_rng().gen_range(1..=sides.max(1))
}

fn suggest(typed: &str) -> Vec<Choice> {
    let typed = typed.to_lowercase();
    TOPICS
        .iter()
        .filter(|t| t.starts_with(&typed))
        .take(MAX_SUGGESTIONS)
        .map(|t| Choice::string(*t, *t))
        .collect()
}

impl CommandGroup for Utility {
    const NAME: &'static str = "Utility";

    fn declare(group: &mut GroupBuilder<Self>) {
        group
            .integration(&[IntegrationType::Guild, IntegrationType::User])
            .contexts(&[ContextType::Guild, ContextType::BotDm]);

        group
            .member("ping", Utility::ping)
            .command("Check that the bot is alive", 3, false);

        group
            .member("echo", Utility::echo)
            .string_option(
                "text",
                "Text to repeat",
                true,
                StringOptionMeta {
                    max_length: Some(2000),
                    ..Default::default()
                },
            )
            .command("Repeat a message back to you", 0, true);

        group
            .member("roll", Utility::roll)
            .integer_option(
                "sides",
                "Number of sides (default 6)",
                false,
                IntegerOptionMeta {
                    min_value: Some(2),
                    max_value: Some(1000),
                    ..Default::default()
                },
            )
            .command("Roll a die", 5, false);

        group
            .member("topic", Utility::topic)
            .string_option(
                "name",
                "Topic to announce",
                true,
                StringOptionMeta {
                    autocomplete: true,
                    ..Default::default()
                },
            )
            .command("Announce a discussion topic", 10, false)
            .autocomplete(Utility::suggest_topics);
    }
}

// ---------------------------------------------------------------------------
// Lifecycle events
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Lifecycle {
    guilds: AtomicUsize,
}

impl Lifecycle {
    async fn ready(self: Arc<Self>, ctx: EventContext) -> Result<()> {
        let user = ctx.payload["user"].as_str().unwrap_or("unknown");
        info!(user, "Serving slash commands");
        Ok(())
    }

    async fn error(self: Arc<Self>, ctx: EventContext) -> Result<()> {
        warn!(message = %ctx.payload["message"], "Gateway reported an error");
        Ok(())
    }

    async fn guild_create(self: Arc<Self>, ctx: EventContext) -> Result<()> {
        let n = self.guilds.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            guild = %ctx.payload["name"],
            guilds = n,
            "Guild available"
        );
        Ok(())
    }
}

impl CommandGroup for Lifecycle {
    const NAME: &'static str = "Lifecycle";

    fn declare(group: &mut GroupBuilder<Self>) {
        group
            .event("ready", Lifecycle::ready)
            .event("error", Lifecycle::error)
            .event("guildCreate", Lifecycle::guild_create);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botforge_commands::testing::{autocomplete_interaction, command_interaction, RecordingTransport, TransportCall};
    use botforge_commands::{CommandRegistry, DispatchOutcome, Dispatcher};
    use botforge_core::InteractionOption;

    fn dispatcher() -> (Arc<Dispatcher>, Arc<RecordingTransport>) {
        let mut groups = GroupRegistry::new();
        declare_all(&mut groups);
        let mut registry = CommandRegistry::new();
        registry.wire_all(&groups).unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let dispatcher = Dispatcher::new(Arc::new(registry), transport.clone());
        (Arc::new(dispatcher), transport)
    }

    #[test]
    fn test_only_utility_is_published() {
        let mut groups = GroupRegistry::new();
        declare_all(&mut groups);
        let mut registry = CommandRegistry::new();
        registry.wire_all(&groups).unwrap();

        let published = registry.published_commands();
        assert_eq!(published.len(), 1);
        let names: Vec<_> = published[0].subcommands.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ping", "echo", "roll", "topic"]);
        assert_eq!(registry.event_count(), 3);
    }

    #[tokio::test]
    async fn test_echo_repeats_text() {
        let (dispatcher, transport) = dispatcher();
        let mut interaction = command_interaction("1", "utility", "echo", "u1");
        interaction.options.push(InteractionOption {
            name: "text".into(),
            value: serde_json::json!("hello there"),
            focused: false,
        });
        dispatcher.dispatch(interaction).await;

        assert!(matches!(
            &transport.calls_for("1")[0],
            TransportCall::Defer { ephemeral: true, .. }
        ));
        assert_eq!(transport.edits_for("1"), vec!["hello there".to_string()]);
    }

    #[tokio::test]
    async fn test_echo_without_text_reports_failure() {
        let (dispatcher, transport) = dispatcher();
        let outcome = dispatcher.dispatch(command_interaction("1", "utility", "echo", "u1")).await;
        assert_eq!(outcome, DispatchOutcome::Completed { failed: true });
        assert_eq!(
            transport.edits_for("1"),
            vec![botforge_commands::FAILURE_NOTICE.to_string()]
        );
    }

    #[test]
    fn test_roll_stays_in_range() {
        for _ in 0..200 {
            let v = roll_die(6);
            assert!((1..=6).contains(&v));
        }
        // Degenerate dice never panic on an empty range.
        assert_eq!(roll_die(1), 1);
        assert_eq!(roll_die(-3), 1);
    }

    #[tokio::test]
    async fn test_topic_autocomplete_filters_by_prefix() {
        let (dispatcher, transport) = dispatcher();
        let handled = dispatcher
            .autocomplete(autocomplete_interaction("2", "utility", "topic", "u1", "name", "T"))
            .await;
        assert!(handled);

        let calls = transport.calls_for("2");
        let TransportCall::Autocomplete { choices, .. } = &calls[0] else {
            panic!("expected autocomplete response, got {calls:?}");
        };
        let names: Vec<_> = choices.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["tokio", "tracing", "traits"]);
    }
}
