//! Test doubles for exercising the dispatch engine without a platform.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use anyhow::{bail, Result};
use async_trait::async_trait;
use botforge_core::{Choice, Interaction, InteractionKind, InteractionOption, PublishedCommand, Transport};

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Defer { interaction_id: String, ephemeral: bool },
    Edit { interaction_id: String, content: String },
    ReplyEphemeral { interaction_id: String, content: String },
    Autocomplete { interaction_id: String, choices: Vec<Choice> },
    Publish { application_id: String, commands: Vec<PublishedCommand> },
    PublishGuild { application_id: String, guild_id: String, commands: Vec<PublishedCommand> },
}

impl TransportCall {
    fn interaction_id(&self) -> Option<&str> {
        match self {
            TransportCall::Defer { interaction_id, .. }
            | TransportCall::Edit { interaction_id, .. }
            | TransportCall::ReplyEphemeral { interaction_id, .. }
            | TransportCall::Autocomplete { interaction_id, .. } => Some(interaction_id),
            TransportCall::Publish { .. } | TransportCall::PublishGuild { .. } => None,
        }
    }
}

/// Transport that records every call in order.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<TransportCall>>,
    fail_defers: AtomicBool,
    fail_publishes: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_defers(&self, fail: bool) {
        self.fail_defers.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn calls_for(&self, interaction_id: &str) -> Vec<TransportCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.interaction_id() == Some(interaction_id))
            .collect()
    }

    /// Contents of every reply edit for the interaction, in order.
    pub fn edits_for(&self, interaction_id: &str) -> Vec<String> {
        self.calls_for(interaction_id)
            .into_iter()
            .filter_map(|c| match c {
                TransportCall::Edit { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn name(&self) -> &str {
        "recording"
    }

    async fn defer_reply(&self, interaction: &Interaction, ephemeral: bool) -> Result<()> {
        if self.fail_defers.load(Ordering::SeqCst) {
            bail!("defer rejected");
        }
        self.record(TransportCall::Defer {
            interaction_id: interaction.id.clone(),
            ephemeral,
        });
        Ok(())
    }

    async fn edit_reply(&self, interaction: &Interaction, content: &str) -> Result<()> {
        self.record(TransportCall::Edit {
            interaction_id: interaction.id.clone(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn reply_ephemeral(&self, interaction: &Interaction, content: &str) -> Result<()> {
        self.record(TransportCall::ReplyEphemeral {
            interaction_id: interaction.id.clone(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn respond_autocomplete(&self, interaction: &Interaction, choices: &[Choice]) -> Result<()> {
        self.record(TransportCall::Autocomplete {
            interaction_id: interaction.id.clone(),
            choices: choices.to_vec(),
        });
        Ok(())
    }

    async fn publish_command_list(&self, application_id: &str, commands: &[PublishedCommand]) -> Result<()> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            bail!("publish rejected");
        }
        self.record(TransportCall::Publish {
            application_id: application_id.to_string(),
            commands: commands.to_vec(),
        });
        Ok(())
    }

    async fn publish_guild_command_list(
        &self,
        application_id: &str,
        guild_id: &str,
        commands: &[PublishedCommand],
    ) -> Result<()> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            bail!("publish rejected");
        }
        self.record(TransportCall::PublishGuild {
            application_id: application_id.to_string(),
            guild_id: guild_id.to_string(),
            commands: commands.to_vec(),
        });
        Ok(())
    }
}

/// A slash-command interaction for `/{command} {subcommand}`.
pub fn command_interaction(id: &str, command: &str, subcommand: &str, user_id: &str) -> Interaction {
    Interaction {
        id: id.to_string(),
        token: format!("token-{id}"),
        application_id: "app".to_string(),
        kind: InteractionKind::Command,
        command: command.to_string(),
        subcommand: Some(subcommand.to_string()),
        user_id: user_id.to_string(),
        guild_id: Some("guild".to_string()),
        channel_id: Some("channel".to_string()),
        options: Vec::new(),
    }
}

/// An autocomplete interaction with `option` focused and partially typed.
pub fn autocomplete_interaction(
    id: &str,
    command: &str,
    subcommand: &str,
    user_id: &str,
    option: &str,
    typed: &str,
) -> Interaction {
    let mut interaction = command_interaction(id, command, subcommand, user_id);
    interaction.kind = InteractionKind::Autocomplete;
    interaction.options.push(InteractionOption {
        name: option.to_string(),
        value: serde_json::Value::String(typed.to_string()),
        focused: true,
    });
    interaction
}
