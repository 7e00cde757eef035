//! Config defaults: fills unset fields after parsing.

use crate::schema::{BotConfig, DiscordConfig, DispatchConfig, LoggingConfig, PresenceConfig};

/// Deferred-reply watchdog delay, in seconds.
pub const DEFAULT_WATCHDOG_SECS: u64 = 10;

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_DIR: &str = "logs";

pub const DEFAULT_PRESENCE_STATUS: &str = "online";

pub const DEFAULT_INTENTS: &[&str] = &["guilds"];

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: BotConfig) -> BotConfig {
    let config = apply_discord_defaults(config);
    let config = apply_presence_defaults(config);
    let config = apply_dispatch_defaults(config);
    apply_logging_defaults(config)
}

fn apply_discord_defaults(mut config: BotConfig) -> BotConfig {
    let discord = config.discord.get_or_insert_with(DiscordConfig::default);
    if discord.intents.as_ref().map_or(true, Vec::is_empty) {
        discord.intents = Some(DEFAULT_INTENTS.iter().map(|s| s.to_string()).collect());
    }
    config
}

fn apply_presence_defaults(mut config: BotConfig) -> BotConfig {
    let presence = config.presence.get_or_insert_with(PresenceConfig::default);
    if presence.status.is_none() {
        presence.status = Some(DEFAULT_PRESENCE_STATUS.to_string());
    }
    config
}

fn apply_dispatch_defaults(mut config: BotConfig) -> BotConfig {
    let dispatch = config.dispatch.get_or_insert_with(DispatchConfig::default);
    if dispatch.watchdog_secs.is_none() {
        dispatch.watchdog_secs = Some(DEFAULT_WATCHDOG_SECS);
    }
    if dispatch.publish_on_start.is_none() {
        dispatch.publish_on_start = Some(false);
    }
    config
}

fn apply_logging_defaults(mut config: BotConfig) -> BotConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.dir.is_none() {
        logging.dir = Some(DEFAULT_LOG_DIR.to_string());
    }
    config
}
