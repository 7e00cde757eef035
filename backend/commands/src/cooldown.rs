//! Per-command, per-user cooldowns.
//!
//! An entry exists only while a user is cooling down: every commit schedules
//! its own removal once the cooldown elapses, so absence means "ready".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Result of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownCheck {
    /// The invocation may proceed; its timestamp has been recorded.
    Ready,
    /// The user must wait `remaining` before reusing the command.
    Cooling { remaining: Duration },
}

impl CooldownCheck {
    /// Remaining wait rounded to whole seconds.
    pub fn remaining_secs(&self) -> u64 {
        match self {
            CooldownCheck::Ready => 0,
            CooldownCheck::Cooling { remaining } => (remaining.as_millis() as f64 / 1000.0).round() as u64,
        }
    }
}

type Timestamps = HashMap<String, HashMap<String, Instant>>;

/// In-memory cooldown map: command name → user id → last invocation.
#[derive(Clone, Default)]
pub struct CooldownTracker {
    entries: Arc<Mutex<Timestamps>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the user's cooldown and, if clear, record this invocation.
    ///
    /// Check and commit happen under one lock acquisition with no await in
    /// between, so two interactions from the same user cannot both pass.
    pub async fn check_and_commit(&self, command: &str, user_id: &str, cooldown: Duration) -> CooldownCheck {
        if cooldown.is_zero() {
            return CooldownCheck::Ready;
        }

        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let timestamps = entries.entry(command.to_string()).or_default();

        if let Some(last) = timestamps.get(user_id) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < cooldown {
                let remaining = cooldown - elapsed;
                debug!(command, user = user_id, remaining_ms = remaining.as_millis() as u64, "Cooldown active");
                return CooldownCheck::Cooling { remaining };
            }
        }

        timestamps.insert(user_id.to_string(), now);
        drop(entries);

        self.schedule_expiry(command, user_id, now, cooldown);
        CooldownCheck::Ready
    }

    /// Remove the entry once the cooldown elapses, unless a newer
    /// invocation replaced it in the meantime.
    ///
    /// A cooldown too long to express as an instant never expires.
    fn schedule_expiry(&self, command: &str, user_id: &str, stamped: Instant, cooldown: Duration) {
        let Some(deadline) = stamped.checked_add(cooldown) else {
            debug!(command, user = user_id, "Cooldown exceeds the clock range; entry is kept");
            return;
        };
        let entries = self.entries.clone();
        let command = command.to_string();
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut entries = entries.lock().await;
            if let Some(timestamps) = entries.get_mut(&command) {
                if timestamps.get(&user_id) == Some(&stamped) {
                    timestamps.remove(&user_id);
                }
                if timestamps.is_empty() {
                    entries.remove(&command);
                }
            }
        });
    }

    /// Whether the user currently has an entry for the command.
    pub async fn is_cooling(&self, command: &str, user_id: &str) -> bool {
        self.entries
            .lock()
            .await
            .get(command)
            .is_some_and(|t| t.contains_key(user_id))
    }

    /// Total number of (command, user) entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.values().map(HashMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
