/// Declaration builder for command groups.
///
/// Each call on a `MemberBuilder` plays the role of one member annotation:
/// it creates a stub `CommandDefinition` for the member if none exists yet,
/// then merges its own fields into that definition. Scalars are
/// last-write-wins; options are append-only.
///
/// `command(..)` also re-sorts the options so required ones come first.
/// The sort only sees options appended *before* that call. Options added
/// afterwards keep their append position.
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use botforge_core::{Choice, ContextType, IntegrationType, OptionKind, OptionSchema};
use tracing::{debug, warn};

use crate::context::{AutocompleteContext, EventContext, InteractionContext};
use crate::definition::{
    autocomplete_handler, command_handler, event_handler, CommandDefinition, CommandHandler,
    Definition, EventDefinition,
};
use crate::group::GroupId;

// ---------------------------------------------------------------------------
// Option metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct StringOptionMeta {
    pub choices: Option<Vec<Choice>>,
    pub autocomplete: bool,
    pub min_length: Option<u16>,
    pub max_length: Option<u16>,
}

#[derive(Debug, Clone, Default)]
pub struct IntegerOptionMeta {
    pub choices: Option<Vec<Choice>>,
    pub autocomplete: bool,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct NumberOptionMeta {
    pub choices: Option<Vec<Choice>>,
    pub autocomplete: bool,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

// ---------------------------------------------------------------------------
// Group builder
// ---------------------------------------------------------------------------

/// Accumulates the definitions of one declaring type until it is sealed.
pub struct GroupBuilder<G> {
    pub(crate) id: GroupId,
    pub(crate) class_name: String,
    pub(crate) definitions: Vec<Definition<G>>,
    pub(crate) integration: Option<Vec<IntegrationType>>,
    pub(crate) contexts: Option<Vec<ContextType>>,
}

impl<G: Send + Sync + 'static> GroupBuilder<G> {
    /// Start declaring a group. The id is assigned here, at declaration time.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            id: GroupId::new(),
            class_name: class_name.into(),
            definitions: Vec::new(),
            integration: None,
            contexts: None,
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn definitions(&self) -> &[Definition<G>] {
        &self.definitions
    }

    pub fn command_definition(&self, member_name: &str) -> Option<&CommandDefinition<G>> {
        self.definitions
            .iter()
            .find(|d| d.name() == member_name)
            .and_then(Definition::as_command)
    }

    /// Begin annotating the member `name`, implemented by `handler`.
    pub fn member<F, Fut>(&mut self, name: impl Into<String>, handler: F) -> MemberBuilder<'_, G>
    where
        F: Fn(Arc<G>, InteractionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        MemberBuilder {
            group: self,
            name: name.into(),
            handler: command_handler(handler),
        }
    }

    /// Declare `name` as an event handler.
    pub fn event<F, Fut>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(Arc<G>, EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let name = name.into();
        let handler = event_handler(handler);
        match self.definitions.iter_mut().find(|d| d.name() == name) {
            Some(Definition::Event(existing)) => existing.handler = handler,
            Some(Definition::Command(_)) => {
                warn!(
                    group = %self.class_name,
                    member = %name,
                    "Member is already declared as a command; event declaration ignored"
                );
                return self;
            }
            None => self.definitions.push(Definition::Event(EventDefinition {
                event_name: name.clone(),
                handler,
            })),
        }
        debug!("Event {} injected in group {}", name, self.class_name);
        self
    }

    /// Group-level integration surfaces, validated when the group is sealed.
    pub fn integration(&mut self, surfaces: &[IntegrationType]) -> &mut Self {
        self.integration = Some(surfaces.to_vec());
        self
    }

    /// Group-level execution contexts, validated when the group is sealed.
    pub fn contexts(&mut self, contexts: &[ContextType]) -> &mut Self {
        self.contexts = Some(contexts.to_vec());
        self
    }

    /// Find the command definition for `name`, creating a stub if absent.
    /// Returns `None` when the name is taken by an event.
    fn upsert_command(
        &mut self,
        name: &str,
        handler: &CommandHandler<G>,
    ) -> Option<&mut CommandDefinition<G>> {
        let index = match self.definitions.iter().position(|d| d.name() == name) {
            Some(index) => index,
            None => {
                self.definitions
                    .push(Definition::Command(CommandDefinition::stub(name, handler.clone())));
                self.definitions.len() - 1
            }
        };
        match &mut self.definitions[index] {
            Definition::Command(def) => Some(def),
            Definition::Event(_) => {
                warn!(
                    group = %self.class_name,
                    member = %name,
                    "Member is already declared as an event; command annotation ignored"
                );
                None
            }
        }
    }

    fn existing_command_mut(&mut self, name: &str) -> Option<&mut CommandDefinition<G>> {
        self.definitions.iter_mut().find_map(|d| match d {
            Definition::Command(def) if def.member_name == name => Some(def),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Member builder
// ---------------------------------------------------------------------------

/// Annotation calls for one member of a group.
pub struct MemberBuilder<'a, G> {
    group: &'a mut GroupBuilder<G>,
    name: String,
    handler: CommandHandler<G>,
}

impl<'a, G: Send + Sync + 'static> MemberBuilder<'a, G> {
    /// Declare the member a command.
    pub fn command(self, description: impl Into<String>, cooldown_secs: u64, ephemeral: bool) -> Self {
        let description = description.into();
        let class_name = self.group.class_name.clone();
        if let Some(def) = self.group.upsert_command(&self.name, &self.handler) {
            def.description = description;
            def.cooldown_secs = cooldown_secs;
            def.ephemeral = ephemeral;
            if def.options.len() > 1 {
                // Stable: relative order inside each partition is kept.
                def.options.sort_by_key(|o| !o.required);
            }
            debug!(
                "Command {} with {} options injected in group {}",
                def.member_name,
                def.options.len(),
                class_name
            );
        }
        self
    }

    /// Integration surfaces for this member.
    pub fn integration(self, guild: bool, user: bool) -> Self {
        let mut surfaces = Vec::new();
        if guild {
            surfaces.push(IntegrationType::Guild);
        }
        if user {
            surfaces.push(IntegrationType::User);
        }
        self.with_command(|def| def.integration_surfaces = surfaces.into_iter().collect())
    }

    /// Execution contexts for this member.
    pub fn context(self, guild: bool, bot_dm: bool, private_channel: bool) -> Self {
        let mut contexts = Vec::new();
        if guild {
            contexts.push(ContextType::Guild);
        }
        if bot_dm {
            contexts.push(ContextType::BotDm);
        }
        if private_channel {
            contexts.push(ContextType::PrivateChannel);
        }
        self.with_command(|def| def.execution_contexts = contexts.into_iter().collect())
    }

    pub fn string_option(
        self,
        name: &str,
        description: &str,
        required: bool,
        meta: StringOptionMeta,
    ) -> Self {
        let mut option = OptionSchema::new(OptionKind::String, name, description, required);
        option.choices = meta.choices;
        option.autocomplete = meta.autocomplete.then_some(true);
        option.min_length = meta.min_length;
        option.max_length = meta.max_length;
        self.push_option(option)
    }

    pub fn integer_option(
        self,
        name: &str,
        description: &str,
        required: bool,
        meta: IntegerOptionMeta,
    ) -> Self {
        let mut option = OptionSchema::new(OptionKind::Integer, name, description, required);
        option.choices = meta.choices;
        option.autocomplete = meta.autocomplete.then_some(true);
        option.min_value = meta.min_value.map(|v| v as f64);
        option.max_value = meta.max_value.map(|v| v as f64);
        self.push_option(option)
    }

    pub fn number_option(
        self,
        name: &str,
        description: &str,
        required: bool,
        meta: NumberOptionMeta,
    ) -> Self {
        let mut option = OptionSchema::new(OptionKind::Number, name, description, required);
        option.choices = meta.choices;
        option.autocomplete = meta.autocomplete.then_some(true);
        option.min_value = meta.min_value;
        option.max_value = meta.max_value;
        self.push_option(option)
    }

    pub fn boolean_option(self, name: &str, description: &str, required: bool) -> Self {
        self.push_option(OptionSchema::new(OptionKind::Boolean, name, description, required))
    }

    pub fn user_option(self, name: &str, description: &str, required: bool) -> Self {
        self.push_option(OptionSchema::new(OptionKind::User, name, description, required))
    }

    /// `channel_types` restricts which channel kinds the platform offers.
    pub fn channel_option(
        self,
        name: &str,
        description: &str,
        required: bool,
        channel_types: Option<Vec<u8>>,
    ) -> Self {
        let mut option = OptionSchema::new(OptionKind::Channel, name, description, required);
        option.channel_types = channel_types;
        self.push_option(option)
    }

    pub fn role_option(self, name: &str, description: &str, required: bool) -> Self {
        self.push_option(OptionSchema::new(OptionKind::Role, name, description, required))
    }

    pub fn mentionable_option(self, name: &str, description: &str, required: bool) -> Self {
        self.push_option(OptionSchema::new(OptionKind::Mentionable, name, description, required))
    }

    pub fn attachment_option(self, name: &str, description: &str, required: bool) -> Self {
        self.push_option(OptionSchema::new(OptionKind::Attachment, name, description, required))
    }

    /// Register the autocomplete handler. Accepted only when the member
    /// already has an autocomplete-enabled option; otherwise a no-op.
    pub fn autocomplete<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(Arc<G>, AutocompleteContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let class_name = self.group.class_name.clone();
        match self.group.existing_command_mut(&self.name) {
            Some(def) if def.has_autocomplete_option() => {
                def.autocomplete = Some(autocomplete_handler(handler));
                debug!("Autocomplete for {} injected in group {}", def.member_name, class_name);
            }
            _ => debug!(
                "Autocomplete for {} ignored in group {}: no autocomplete option",
                self.name, class_name
            ),
        }
        self
    }

    fn push_option(self, option: OptionSchema) -> Self {
        self.with_command(|def| def.options.push(option))
    }

    fn with_command(self, apply: impl FnOnce(&mut CommandDefinition<G>)) -> Self {
        if let Some(def) = self.group.upsert_command(&self.name, &self.handler) {
            apply(def);
        }
        self
    }
}
