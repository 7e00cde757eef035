//! `botforge-config`: bot configuration management.
//!
//! Provides:
//! - Typed config schema (credentials, presence, dispatch, logging)
//! - YAML loading with path resolution
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with error/warning report

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{load_config, resolve_config_path};
pub use schema::BotConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::path::Path;

use anyhow::{Context, Result};
use botforge_core::BotError;
use serde_json::Value;

/// Load, substitute env vars, apply defaults, and validate a config file.
///
/// Nothing is logged here: callers usually load the config before the
/// logger exists, so they call `ValidationReport::log` once it does.
pub async fn load_and_prepare(path: &Path) -> Result<(BotConfig, ValidationReport)> {
    let raw_config = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: BotConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);

    let report = validate(&config);
    Ok((config, report))
}

/// Like `load_and_prepare`, but the report is logged and any error is fatal.
pub async fn load_validated(path: &Path) -> Result<BotConfig, BotError> {
    let (config, report) = load_and_prepare(path).await?;
    report.log();
    report.into_result(path)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_fails_validation() {
        let err = load_validated(Path::new("/nonexistent/botforge.yaml")).await.unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
        assert!(err.to_string().contains("discord.token"));
    }

    #[tokio::test]
    async fn prepared_config_has_defaults() {
        let path = std::env::temp_dir().join(format!("botforge-ok-{}.yaml", std::process::id()));
        tokio::fs::write(&path, "discord:\n  token: abc\n  applicationId: \"42\"\n")
            .await
            .unwrap();
        let cfg = load_validated(&path).await;
        let _ = tokio::fs::remove_file(&path).await;
        let cfg = cfg.unwrap();
        assert_eq!(cfg.intents(), vec!["guilds"]);
        assert_eq!(cfg.watchdog().as_secs(), defaults::DEFAULT_WATCHDOG_SECS);
    }
}
