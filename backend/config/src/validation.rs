//! Config validation: collects every problem in one pass.

use std::path::Path;

use botforge_core::{BotError, PresenceStatus};
use thiserror::Error;

use crate::schema::BotConfig;

/// Gateway intent names understood by the Discord gateway adapter.
pub const KNOWN_INTENTS: &[&str] = &[
    "guilds",
    "guild_members",
    "guild_messages",
    "guild_presences",
    "guild_voice_states",
    "direct_messages",
    "message_content",
];

/// Interaction tokens stop accepting edits after this many seconds.
const INTERACTION_TOKEN_TTL_SECS: u64 = 15 * 60;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Emit every warning and error through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
        for error in &self.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
    }

    /// Fail with the first error, if any.
    pub fn into_result(self, source: &Path) -> Result<(), BotError> {
        match self.errors.first() {
            Some(first) => Err(BotError::Config(format!(
                "{} ({} error(s) in {})",
                first,
                self.errors.len(),
                source.display()
            ))),
            None => Ok(()),
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_discord(config, &mut report);
    validate_presence(config, &mut report);
    validate_dispatch(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn is_snowflake(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

fn validate_discord(config: &BotConfig, report: &mut ValidationReport) {
    let discord = config.discord.clone().unwrap_or_default();

    if discord.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
        report.error("discord.token", "Discord bot token is required");
    }

    match discord.application_id.as_deref() {
        None | Some("") => report.error("discord.applicationId", "Application id is required"),
        Some(id) if !is_snowflake(id) => report.error(
            "discord.applicationId",
            format!("Application id '{id}' is not a numeric snowflake"),
        ),
        Some(_) => {}
    }

    if let Some(guild) = discord.guild_id.as_deref() {
        if !is_snowflake(guild) {
            report.error(
                "discord.guildId",
                format!("Guild id '{guild}' is not a numeric snowflake"),
            );
        }
    }

    for (i, intent) in discord.intents.iter().flatten().enumerate() {
        if !KNOWN_INTENTS.contains(&intent.as_str()) {
            report.error(
                format!("discord.intents[{i}]"),
                format!("Unknown gateway intent '{intent}'. Use one of: {}", KNOWN_INTENTS.join(", ")),
            );
        }
    }
}

fn validate_presence(config: &BotConfig, report: &mut ValidationReport) {
    let Some(presence) = &config.presence else { return };
    if let Some(status) = &presence.status {
        if let Err(e) = status.parse::<PresenceStatus>() {
            report.error("presence.status", e);
        }
    }
    if presence.activity.as_deref().is_some_and(|a| a.trim().is_empty()) {
        report.warn("presence.activity", "Empty activity is ignored by the gateway");
    }
}

fn validate_dispatch(config: &BotConfig, report: &mut ValidationReport) {
    let Some(dispatch) = &config.dispatch else { return };
    match dispatch.watchdog_secs {
        Some(0) => report.error("dispatch.watchdogSecs", "watchdogSecs must be >= 1"),
        Some(secs) if secs >= INTERACTION_TOKEN_TTL_SECS => report.warn(
            "dispatch.watchdogSecs",
            format!("watchdogSecs {secs} outlives the interaction token; the expiry notice will never be delivered"),
        ),
        _ => {}
    }
}

fn validate_logging(config: &BotConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if logging.level.as_deref().is_some_and(|l| l.trim().is_empty()) {
        report.warn("logging.level", "Empty log level; RUST_LOG or 'info' will be used");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DiscordConfig, DispatchConfig, PresenceConfig};

    fn valid() -> BotConfig {
        BotConfig {
            discord: Some(DiscordConfig {
                token: Some("abc".into()),
                application_id: Some("1234".into()),
                intents: Some(vec!["guilds".into()]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        let report = validate(&valid());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn empty_config_requires_credentials() {
        let report = validate(&BotConfig::default());
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["discord.token", "discord.applicationId"]);
    }

    #[test]
    fn rejects_bad_snowflakes_and_intents() {
        let mut cfg = valid();
        if let Some(d) = cfg.discord.as_mut() {
            d.application_id = Some("my-app".into());
            d.guild_id = Some("12a".into());
            d.intents = Some(vec!["guilds".into(), "everything".into()]);
        }
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 3);
        assert!(report.errors.iter().any(|e| e.path == "discord.intents[1]"));
    }

    #[test]
    fn rejects_zero_watchdog_and_unknown_status() {
        let mut cfg = valid();
        cfg.dispatch = Some(DispatchConfig {
            watchdog_secs: Some(0),
            ..Default::default()
        });
        cfg.presence = Some(PresenceConfig {
            status: Some("busy".into()),
            activity: None,
        });
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert!(report.errors.iter().any(|e| e.path == "dispatch.watchdogSecs"));
        assert!(report.errors.iter().any(|e| e.path == "presence.status"));
    }

    #[test]
    fn long_watchdog_is_only_a_warning() {
        let mut cfg = valid();
        cfg.dispatch = Some(DispatchConfig {
            watchdog_secs: Some(3600),
            ..Default::default()
        });
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }
}
