/// Handler-facing contexts.
///
/// A command handler receives an `InteractionContext`; the context tracks
/// whether a reply has been produced so the deferred-reply watchdog can tell
/// a silent handler from one that already answered.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use botforge_core::{Choice, Interaction, Transport};

/// Context passed to every command handler.
#[derive(Clone)]
pub struct InteractionContext {
    interaction: Arc<Interaction>,
    transport: Arc<dyn Transport>,
    replied: Arc<AtomicBool>,
}

impl InteractionContext {
    pub fn new(interaction: Interaction, transport: Arc<dyn Transport>) -> Self {
        Self {
            interaction: Arc::new(interaction),
            transport,
            replied: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn user_id(&self) -> &str {
        &self.interaction.user_id
    }

    /// Replace the deferred reply with the handler's content.
    pub async fn edit_reply(&self, content: impl AsRef<str>) -> Result<()> {
        self.transport
            .edit_reply(&self.interaction, content.as_ref())
            .await?;
        self.replied.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Whether any reply content has been delivered for this interaction.
    pub fn has_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }

    /// Edit the reply without marking it as answered (watchdog path).
    pub(crate) async fn edit_unmarked(&self, content: &str) -> Result<()> {
        self.transport.edit_reply(&self.interaction, content).await
    }
}

impl std::fmt::Debug for InteractionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionContext")
            .field("interaction", &self.interaction.id)
            .field("transport", &self.transport.name())
            .field("replied", &self.has_replied())
            .finish()
    }
}

/// Context passed to autocomplete handlers.
#[derive(Clone)]
pub struct AutocompleteContext {
    interaction: Arc<Interaction>,
    transport: Arc<dyn Transport>,
}

impl AutocompleteContext {
    pub fn new(interaction: Interaction, transport: Arc<dyn Transport>) -> Self {
        Self {
            interaction: Arc::new(interaction),
            transport,
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    /// The partial value the user is typing, if any.
    pub fn focused_value(&self) -> Option<&str> {
        self.interaction
            .focused_option()
            .and_then(|o| o.value.as_str())
    }

    pub async fn respond(&self, choices: Vec<Choice>) -> Result<()> {
        self.transport
            .respond_autocomplete(&self.interaction, &choices)
            .await
    }
}

/// Payload handed to event handlers.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub name: String,
    pub payload: serde_json::Value,
}
