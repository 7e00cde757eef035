//! Config file location and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::schema::BotConfig;

pub const CONFIG_FILE_NAME: &str = "botforge.yaml";

/// Env var overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "BOTFORGE_CONFIG";

/// Resolve the config file path.
/// Priority: explicit path > `BOTFORGE_CONFIG` > `./botforge.yaml` > `~/.botforge/botforge.yaml`
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    match dirs::home_dir() {
        Some(home) => home.join(".botforge").join(CONFIG_FILE_NAME),
        None => local,
    }
}

/// Load and parse the config from disk.
///
/// A missing file yields the empty config; validation then reports the
/// missing credentials.
pub async fn load_config(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(BotConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: BotConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}
