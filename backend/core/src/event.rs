use serde::{Deserialize, Serialize};

use crate::types::Interaction;

/// Events delivered by the platform gateway to the single ingress loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// The gateway session is established.
    Ready { user_name: String },
    /// A slash command or autocomplete request.
    Interaction(Interaction),
    /// An uncaught platform/client error.
    Error { message: String },
    /// Any other platform event, forwarded by name.
    Other { name: String, payload: serde_json::Value },
}

impl GatewayEvent {
    /// Name used to look up registered event handlers.
    pub fn name(&self) -> &str {
        match self {
            GatewayEvent::Ready { .. } => "ready",
            GatewayEvent::Interaction(_) => "interactionCreate",
            GatewayEvent::Error { .. } => "error",
            GatewayEvent::Other { name, .. } => name,
        }
    }

    /// JSON payload handed to event handlers.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            GatewayEvent::Ready { user_name } => serde_json::json!({ "user": user_name }),
            GatewayEvent::Interaction(interaction) => {
                serde_json::to_value(interaction).unwrap_or(serde_json::Value::Null)
            }
            GatewayEvent::Error { message } => serde_json::json!({ "message": message }),
            GatewayEvent::Other { payload, .. } => payload.clone(),
        }
    }
}

impl std::fmt::Display for GatewayEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(GatewayEvent::Ready { user_name: "bot".into() }.name(), "ready");
        assert_eq!(GatewayEvent::Error { message: "x".into() }.name(), "error");
        let other = GatewayEvent::Other {
            name: "guildCreate".into(),
            payload: serde_json::json!({}),
        };
        assert_eq!(other.to_string(), "guildCreate");
    }

    #[test]
    fn test_event_payload() {
        let event = GatewayEvent::Error { message: "socket closed".into() };
        assert_eq!(event.payload()["message"], "socket closed");
    }
}
