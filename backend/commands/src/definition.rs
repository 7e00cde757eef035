/// Command and event definitions.
///
/// A definition is created while a group is being declared and is generic
/// over the declaring type `G`; wiring binds it to one instance of `G` and
/// erases the type (`BoundCommand`, `BoundEvent`).
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use botforge_core::{ContextType, IntegrationType, OptionKind, OptionSchema, PublishedSubcommand};
use futures::future::{BoxFuture, FutureExt};

use crate::context::{AutocompleteContext, EventContext, InteractionContext};

// ---------------------------------------------------------------------------
// Handler types
// ---------------------------------------------------------------------------

pub type CommandHandler<G> =
    Arc<dyn Fn(Arc<G>, InteractionContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub type AutocompleteHandler<G> =
    Arc<dyn Fn(Arc<G>, AutocompleteContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub type EventHandler<G> =
    Arc<dyn Fn(Arc<G>, EventContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub type BoundCommandFn =
    Arc<dyn Fn(InteractionContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub type BoundAutocompleteFn =
    Arc<dyn Fn(AutocompleteContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub type BoundEventFn = Arc<dyn Fn(EventContext) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub(crate) fn command_handler<G, F, Fut>(f: F) -> CommandHandler<G>
where
    G: Send + Sync + 'static,
    F: Fn(Arc<G>, InteractionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |group: Arc<G>, ctx: InteractionContext| f(group, ctx).boxed())
}

pub(crate) fn autocomplete_handler<G, F, Fut>(f: F) -> AutocompleteHandler<G>
where
    G: Send + Sync + 'static,
    F: Fn(Arc<G>, AutocompleteContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |group: Arc<G>, ctx: AutocompleteContext| f(group, ctx).boxed())
}

pub(crate) fn event_handler<G, F, Fut>(f: F) -> EventHandler<G>
where
    G: Send + Sync + 'static,
    F: Fn(Arc<G>, EventContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |group: Arc<G>, ctx: EventContext| f(group, ctx).boxed())
}

// ---------------------------------------------------------------------------
// Declared definitions
// ---------------------------------------------------------------------------

pub struct CommandDefinition<G> {
    /// Unique within the group; also the dispatch key once wired.
    pub member_name: String,
    pub description: String,
    pub options: Vec<OptionSchema>,
    pub cooldown_secs: u64,
    pub ephemeral: bool,
    pub integration_surfaces: BTreeSet<IntegrationType>,
    pub execution_contexts: BTreeSet<ContextType>,
    pub handler: CommandHandler<G>,
    pub autocomplete: Option<AutocompleteHandler<G>>,
}

impl<G> CommandDefinition<G> {
    /// Empty definition created by the first annotation on a member.
    pub(crate) fn stub(member_name: &str, handler: CommandHandler<G>) -> Self {
        Self {
            member_name: member_name.to_string(),
            description: String::new(),
            options: Vec::new(),
            cooldown_secs: 0,
            ephemeral: false,
            integration_surfaces: BTreeSet::new(),
            execution_contexts: BTreeSet::new(),
            handler,
            autocomplete: None,
        }
    }

    pub fn has_autocomplete_option(&self) -> bool {
        self.options.iter().any(OptionSchema::is_autocomplete)
    }
}

pub struct EventDefinition<G> {
    pub event_name: String,
    pub handler: EventHandler<G>,
}

pub enum Definition<G> {
    Command(CommandDefinition<G>),
    Event(EventDefinition<G>),
}

impl<G> Definition<G> {
    pub fn name(&self) -> &str {
        match self {
            Definition::Command(c) => &c.member_name,
            Definition::Event(e) => &e.event_name,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Definition::Command(_))
    }

    pub fn as_command(&self) -> Option<&CommandDefinition<G>> {
        match self {
            Definition::Command(c) => Some(c),
            Definition::Event(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Bound definitions
// ---------------------------------------------------------------------------

/// A command definition bound to its group instance.
#[derive(Clone)]
pub struct BoundCommand {
    pub member_name: String,
    pub group_key: String,
    pub description: String,
    pub options: Vec<OptionSchema>,
    pub cooldown_secs: u64,
    pub ephemeral: bool,
    pub integration_surfaces: BTreeSet<IntegrationType>,
    pub execution_contexts: BTreeSet<ContextType>,
    pub run: BoundCommandFn,
    pub autocomplete: Option<BoundAutocompleteFn>,
}

impl BoundCommand {
    pub fn to_published(&self) -> PublishedSubcommand {
        PublishedSubcommand {
            kind: OptionKind::SubCommand,
            name: self.member_name.clone(),
            description: self.description.clone(),
            options: self.options.clone(),
            integration_surfaces: self.integration_surfaces.clone(),
            execution_contexts: self.execution_contexts.clone(),
        }
    }
}

impl std::fmt::Debug for BoundCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundCommand")
            .field("member_name", &self.member_name)
            .field("group_key", &self.group_key)
            .field("cooldown_secs", &self.cooldown_secs)
            .field("ephemeral", &self.ephemeral)
            .field("options", &self.options.len())
            .field("autocomplete", &self.autocomplete.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct BoundEvent {
    pub event_name: String,
    pub group_key: String,
    pub run: BoundEventFn,
}

/// Everything one group instance contributes to the command registry.
#[derive(Default)]
pub struct BoundGroup {
    pub commands: Vec<BoundCommand>,
    pub events: Vec<BoundEvent>,
}

pub(crate) fn bind_definition<G>(
    definition: &Definition<G>,
    instance: &Arc<G>,
    group_key: &str,
    out: &mut BoundGroup,
) where
    G: Send + Sync + 'static,
{
    match definition {
        Definition::Command(def) => {
            let handler = def.handler.clone();
            let target = instance.clone();
            let run: BoundCommandFn =
                Arc::new(move |ctx: InteractionContext| handler(target.clone(), ctx));

            let autocomplete = def.autocomplete.clone().map(|handler| {
                let target = instance.clone();
                let bound: BoundAutocompleteFn =
                    Arc::new(move |ctx: AutocompleteContext| handler(target.clone(), ctx));
                bound
            });

            out.commands.push(BoundCommand {
                member_name: def.member_name.clone(),
                group_key: group_key.to_string(),
                description: def.description.clone(),
                options: def.options.clone(),
                cooldown_secs: def.cooldown_secs,
                ephemeral: def.ephemeral,
                integration_surfaces: def.integration_surfaces.clone(),
                execution_contexts: def.execution_contexts.clone(),
                run,
                autocomplete,
            });
        }
        Definition::Event(def) => {
            let handler = def.handler.clone();
            let target = instance.clone();
            out.events.push(BoundEvent {
                event_name: def.event_name.clone(),
                group_key: group_key.to_string(),
                run: Arc::new(move |ctx: EventContext| handler(target.clone(), ctx)),
            });
        }
    }
}
