/// Command registry: the wired, dispatchable view of every sealed group.
///
/// `wire` instantiates a group's declaring type once, binds each handler to
/// that instance, and flattens subcommands so dispatch can resolve them by
/// member name alone.
use std::collections::HashMap;
use std::sync::Arc;

use botforge_core::{BotError, PublishedCommand, Transport};
use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::definition::{BoundCommand, BoundEventFn};
use crate::group::{GroupId, GroupRegistry};

#[derive(Default)]
pub struct CommandRegistry {
    groups: IndexMap<String, PublishedCommand>,
    subcommands: HashMap<String, Arc<BoundCommand>>,
    events: HashMap<String, BoundEventFn>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate and wire one sealed group.
    ///
    /// Fails with `GroupNotSealed` if `id` was never sealed into `groups`.
    pub fn wire(&mut self, groups: &GroupRegistry, id: GroupId) -> Result<(), BotError> {
        let group = groups
            .get(id)
            .ok_or_else(|| BotError::GroupNotSealed(id.to_string()))?;
        let meta = group.meta();
        let bound = group.bind();

        for event in bound.events {
            if self.events.insert(event.event_name.clone(), event.run).is_some() {
                warn!(event = %event.event_name, group = %meta.key, "Event handler replaced");
            }
            debug!(event = %event.event_name, group = %meta.key, "Event wired");
        }

        if bound.commands.is_empty() {
            info!(group = %meta.key, "Event group wired; no command published");
            return Ok(());
        }

        let mut published = Vec::with_capacity(bound.commands.len());
        for command in bound.commands {
            published.push(command.to_published());
            let name = command.member_name.clone();
            if let Some(previous) = self.subcommands.insert(name.clone(), Arc::new(command)) {
                warn!(
                    subcommand = %name,
                    previous_group = %previous.group_key,
                    group = %meta.key,
                    "Subcommand name already wired; last registration wins"
                );
            }
        }

        info!(group = %meta.key, subcommands = published.len(), "Command group wired");
        self.groups.insert(
            meta.key.clone(),
            PublishedCommand {
                group_key: meta.key.clone(),
                description: meta.description.clone(),
                subcommands: published,
                integration_surfaces: meta.integration_surfaces.clone(),
                execution_contexts: meta.execution_contexts.clone(),
            },
        );
        Ok(())
    }

    /// Wire every sealed group in sealing order.
    pub fn wire_all(&mut self, groups: &GroupRegistry) -> Result<(), BotError> {
        for id in groups.ids() {
            self.wire(groups, id)?;
        }
        Ok(())
    }

    /// Group-level command records, in wiring order.
    pub fn published_commands(&self) -> Vec<PublishedCommand> {
        self.groups.values().cloned().collect()
    }

    pub fn group(&self, key: &str) -> Option<&PublishedCommand> {
        self.groups.get(key)
    }

    pub fn subcommand(&self, name: &str) -> Option<Arc<BoundCommand>> {
        self.subcommands.get(name).cloned()
    }

    pub fn event(&self, name: &str) -> Option<BoundEventFn> {
        self.events.get(name).cloned()
    }

    pub fn subcommand_count(&self) -> usize {
        self.subcommands.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

/// Send the registry's command list to the platform.
///
/// With `guild_id` the list is published to that guild only. Failures are
/// logged and returned; there is no retry.
pub async fn publish(
    transport: &dyn Transport,
    registry: &CommandRegistry,
    application_id: &str,
    guild_id: Option<&str>,
) -> Result<usize, BotError> {
    let commands = registry.published_commands();
    let result = match guild_id {
        Some(guild_id) => {
            transport
                .publish_guild_command_list(application_id, guild_id, &commands)
                .await
        }
        None => transport.publish_command_list(application_id, &commands).await,
    };

    match result {
        Ok(()) => {
            info!(
                transport = transport.name(),
                commands = commands.len(),
                guild = ?guild_id,
                "Commands refreshed"
            );
            Ok(commands.len())
        }
        Err(e) => {
            error!(transport = transport.name(), "Failed to refresh commands: {e:#}");
            Err(BotError::transport("publish command list", format!("{e:#}")))
        }
    }
}
