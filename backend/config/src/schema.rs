//! BotForge configuration schema.
//!
//! Every field is optional on the wire; `defaults::apply_all_defaults`
//! fills the gaps and `validation::validate` rejects what cannot run.

use std::time::Duration;

use botforge_core::{Presence, PresenceStatus};
use serde::{Deserialize, Serialize};

use crate::defaults::DEFAULT_WATCHDOG_SECS;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration, as read from `botforge.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    /// Bot credentials and gateway settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discord: Option<DiscordConfig>,

    /// Presence applied once the gateway is ready
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence: Option<PresenceConfig>,

    /// Dispatch engine tuning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscordConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    /// Publish guild-scoped commands to this guild instead of globally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Gateway intent names, snake_case (`guilds`, `guild_messages`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intents: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watchdog_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_on_start: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolved accessors
// ---------------------------------------------------------------------------

impl BotConfig {
    pub fn token(&self) -> Option<&str> {
        self.discord.as_ref()?.token.as_deref()
    }

    pub fn application_id(&self) -> Option<&str> {
        self.discord.as_ref()?.application_id.as_deref()
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.discord.as_ref()?.guild_id.as_deref()
    }

    pub fn intents(&self) -> Vec<String> {
        self.discord
            .as_ref()
            .and_then(|d| d.intents.clone())
            .unwrap_or_default()
    }

    /// Presence to apply on ready. An unparseable status falls back to
    /// online; validation reports it separately.
    pub fn presence(&self) -> Presence {
        let Some(presence) = &self.presence else {
            return Presence::default();
        };
        Presence {
            status: presence
                .status
                .as_deref()
                .and_then(|s| s.parse::<PresenceStatus>().ok())
                .unwrap_or_default(),
            activity: presence.activity.clone(),
        }
    }

    pub fn watchdog(&self) -> Duration {
        let secs = self
            .dispatch
            .as_ref()
            .and_then(|d| d.watchdog_secs)
            .unwrap_or(DEFAULT_WATCHDOG_SECS);
        Duration::from_secs(secs)
    }

    pub fn publish_on_start(&self) -> bool {
        self.dispatch
            .as_ref()
            .and_then(|d| d.publish_on_start)
            .unwrap_or(false)
    }
}
