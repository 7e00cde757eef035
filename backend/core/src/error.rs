use thiserror::Error;

/// Top-level error type for the BotForge runtime.
#[derive(Debug, Error)]
pub enum BotError {
    /// A group was wired before `seal` registered it.
    #[error("group {0} was never sealed; seal it before wiring")]
    GroupNotSealed(String),

    #[error("transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BotError {
    pub fn transport(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        BotError::Transport {
            operation: operation.into(),
            message: err.to_string(),
        }
    }
}
