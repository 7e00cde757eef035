use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Choice, Interaction, PublishedCommand};

/// Outbound capabilities the dispatch engine needs from a chat platform.
///
/// Implementations own the network client; the core never talks to the
/// platform protocol directly.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name for logging.
    fn name(&self) -> &str;

    /// Acknowledge the interaction; the final content follows via `edit_reply`.
    async fn defer_reply(&self, interaction: &Interaction, ephemeral: bool) -> Result<()>;

    /// Replace the content of the (deferred) reply.
    async fn edit_reply(&self, interaction: &Interaction, content: &str) -> Result<()>;

    /// Reply immediately with a message only the invoker can see.
    async fn reply_ephemeral(&self, interaction: &Interaction, content: &str) -> Result<()>;

    /// Answer an autocomplete interaction with suggestions.
    async fn respond_autocomplete(&self, interaction: &Interaction, choices: &[Choice]) -> Result<()>;

    /// Overwrite the global command list of the application.
    async fn publish_command_list(
        &self,
        application_id: &str,
        commands: &[PublishedCommand],
    ) -> Result<()>;

    /// Overwrite the command list of the application in a single guild.
    async fn publish_guild_command_list(
        &self,
        application_id: &str,
        guild_id: &str,
        commands: &[PublishedCommand],
    ) -> Result<()>;
}
