use crate::GatewayAdapter;
use anyhow::Result;
use async_trait::async_trait;
use botforge_core::{GatewayEvent, Interaction, InteractionKind, InteractionOption, Presence, PresenceStatus};
use botforge_logging::redact_sensitive_data;
use serenity::all::{
    ActivityData, CommandDataOption, CommandDataOptionValue, CommandInteraction, Guild,
    Interaction as DiscordInteraction, OnlineStatus, Ready,
};
use serenity::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

struct Handler {
    events_tx: mpsc::Sender<GatewayEvent>,
    presence: Presence,
}

impl Handler {
    async fn forward(&self, event: GatewayEvent) {
        if self.events_tx.send(event).await.is_err() {
            warn!("[Discord] Event loop has shut down; dropping event");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        let activity = self.presence.activity.as_deref().map(ActivityData::playing);
        ctx.set_presence(activity, online_status(self.presence.status));

        self.forward(GatewayEvent::Ready {
            user_name: ready.user.name.clone(),
        })
        .await;
    }

    async fn interaction_create(&self, _ctx: Context, interaction: DiscordInteraction) {
        let converted = match &interaction {
            DiscordInteraction::Command(command) => to_interaction(command, InteractionKind::Command),
            DiscordInteraction::Autocomplete(command) => {
                to_interaction(command, InteractionKind::Autocomplete)
            }
            _ => {
                debug!("[Discord] Ignoring non-command interaction {}", interaction.id());
                return;
            }
        };
        self.forward(GatewayEvent::Interaction(converted)).await;
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, is_new: Option<bool>) {
        self.forward(GatewayEvent::Other {
            name: "guildCreate".into(),
            payload: serde_json::json!({
                "guild_id": guild.id.to_string(),
                "name": guild.name,
                "is_new": is_new,
            }),
        })
        .await;
    }
}

/// Convert a serenity command (or autocomplete) interaction into the
/// platform-neutral shape, flattening the subcommand layer.
fn to_interaction(command: &CommandInteraction, kind: InteractionKind) -> Interaction {
    let (subcommand, options) = flatten_options(&command.data.options);
    Interaction {
        id: command.id.to_string(),
        token: command.token.clone(),
        application_id: command.application_id.to_string(),
        kind,
        command: command.data.name.clone(),
        subcommand,
        user_id: command.user.id.to_string(),
        guild_id: command.guild_id.map(|g| g.to_string()),
        channel_id: Some(command.channel_id.to_string()),
        options,
    }
}

fn flatten_options(options: &[CommandDataOption]) -> (Option<String>, Vec<InteractionOption>) {
    for option in options {
        match &option.value {
            CommandDataOptionValue::SubCommand(inner) => {
                return (Some(option.name.clone()), leaf_options(inner));
            }
            CommandDataOptionValue::SubCommandGroup(inner) => return flatten_options(inner),
            _ => {}
        }
    }
    (None, leaf_options(options))
}

fn leaf_options(options: &[CommandDataOption]) -> Vec<InteractionOption> {
    options
        .iter()
        .filter_map(|o| {
            option_value(&o.value).map(|(value, focused)| InteractionOption {
                name: o.name.clone(),
                value,
                focused,
            })
        })
        .collect()
}

/// JSON value of a leaf option and whether it is the focused one.
fn option_value(value: &CommandDataOptionValue) -> Option<(serde_json::Value, bool)> {
    let json = match value {
        CommandDataOptionValue::Autocomplete { value, .. } => {
            return Some((serde_json::Value::String(value.clone()), true));
        }
        CommandDataOptionValue::Boolean(b) => serde_json::json!(b),
        CommandDataOptionValue::Integer(i) => serde_json::json!(i),
        CommandDataOptionValue::Number(n) => serde_json::json!(n),
        CommandDataOptionValue::String(s) => serde_json::json!(s),
        CommandDataOptionValue::Attachment(id) => serde_json::json!(id.to_string()),
        CommandDataOptionValue::Channel(id) => serde_json::json!(id.to_string()),
        CommandDataOptionValue::Mentionable(id) => serde_json::json!(id.to_string()),
        CommandDataOptionValue::Role(id) => serde_json::json!(id.to_string()),
        CommandDataOptionValue::User(id) => serde_json::json!(id.to_string()),
        _ => return None,
    };
    Some((json, false))
}

fn online_status(status: PresenceStatus) -> OnlineStatus {
    match status {
        PresenceStatus::Online => OnlineStatus::Online,
        PresenceStatus::Idle => OnlineStatus::Idle,
        PresenceStatus::Dnd => OnlineStatus::DoNotDisturb,
        PresenceStatus::Invisible => OnlineStatus::Invisible,
    }
}

/// Map configured intent names (snake_case) to gateway intent bits.
pub fn parse_intents(names: &[String]) -> Result<GatewayIntents> {
    let mut intents = GatewayIntents::empty();
    for name in names {
        intents |= match name.as_str() {
            "guilds" => GatewayIntents::GUILDS,
            "guild_members" => GatewayIntents::GUILD_MEMBERS,
            "guild_messages" => GatewayIntents::GUILD_MESSAGES,
            "guild_presences" => GatewayIntents::GUILD_PRESENCES,
            "guild_voice_states" => GatewayIntents::GUILD_VOICE_STATES,
            "direct_messages" => GatewayIntents::DIRECT_MESSAGES,
            "message_content" => GatewayIntents::MESSAGE_CONTENT,
            other => anyhow::bail!("unknown gateway intent '{}'", other),
        };
    }
    Ok(intents)
}

pub struct DiscordGateway {
    token: String,
    intents: GatewayIntents,
    presence: Presence,
}

impl DiscordGateway {
    pub fn new(token: String, intents: GatewayIntents, presence: Presence) -> Self {
        Self {
            token,
            intents,
            presence,
        }
    }
}

#[async_trait]
impl GatewayAdapter for DiscordGateway {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self, events_tx: mpsc::Sender<GatewayEvent>) -> Result<()> {
        info!("Starting Discord gateway");

        let handler = Handler {
            events_tx: events_tx.clone(),
            presence: self.presence.clone(),
        };
        let mut client = Client::builder(&self.token, self.intents)
            .event_handler(handler)
            .await?;

        if let Err(why) = client.start().await {
            let message = redact_sensitive_data(&why.to_string());
            error!("Client error: {}", message);
            let _ = events_tx
                .send(GatewayEvent::Error {
                    message: message.clone(),
                })
                .await;
            anyhow::bail!("Discord client error: {}", message);
        }

        Ok(())
    }
}
