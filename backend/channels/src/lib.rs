use async_trait::async_trait;
use botforge_core::GatewayEvent;
use tokio::sync::mpsc;

pub mod discord;
pub mod discord_rest;

pub use discord::{parse_intents, DiscordGateway};
pub use discord_rest::DiscordRest;

/// A long-lived connection that turns platform traffic into `GatewayEvent`s.
#[async_trait]
pub trait GatewayAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Connect and forward events to `events_tx` until the connection ends.
    async fn start(&self, events_tx: mpsc::Sender<GatewayEvent>) -> anyhow::Result<()>;
}
