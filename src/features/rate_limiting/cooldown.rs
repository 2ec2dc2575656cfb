//! Cooldown ledger
//!
//! Tracks the last allowed invocation of each command per user. An entry
//! blocks while `now < recorded_at + window`, where the window is the cooldown
//! passed to the current check. Expired entries are ignored on read and
//! removed by a timer scheduled when they are recorded. The timer only removes
//! the entry it was scheduled for, so a newer invocation keeps its cooldown.

use dashmap::DashMap;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Result of a cooldown check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownOutcome {
    Allowed,
    /// Epoch millisecond at which the user may invoke the command again
    Blocked { retry_at: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CooldownEntry {
    recorded_at: i64,
}

/// command name -> user id -> entry
type Ledger = DashMap<String, HashMap<String, CooldownEntry>>;

#[derive(Clone, Default)]
pub struct CooldownTracker {
    ledger: Arc<Ledger>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `user_id` may run `command` at `now_millis`, recording the
    /// invocation when allowed
    ///
    /// The read and the write happen under the command bucket's lock without
    /// yielding, so concurrent invocations by the same user cannot both pass.
    pub fn check_and_record(
        &self,
        command: &str,
        user_id: &str,
        cooldown_seconds: u64,
        now_millis: i64,
    ) -> CooldownOutcome {
        if cooldown_seconds == 0 {
            return CooldownOutcome::Allowed;
        }
        let window = window_millis(cooldown_seconds);

        {
            let mut bucket = self.ledger.entry(command.to_string()).or_default();
            if let Some(entry) = bucket.get(user_id) {
                let retry_at = entry.recorded_at.saturating_add(window);
                if retry_at > now_millis {
                    return CooldownOutcome::Blocked { retry_at };
                }
            }
            bucket.insert(
                user_id.to_string(),
                CooldownEntry {
                    recorded_at: now_millis,
                },
            );
        }

        self.schedule_expiry(command, user_id, now_millis, window);
        CooldownOutcome::Allowed
    }

    /// Remove the entry for (command, user) if it is still the one recorded at
    /// `recorded_at`. Returns whether an entry was removed.
    pub fn expire(&self, command: &str, user_id: &str, recorded_at: i64) -> bool {
        let removed = match self.ledger.get_mut(command) {
            Some(mut bucket) => {
                let matches = bucket
                    .get(user_id)
                    .is_some_and(|entry| entry.recorded_at == recorded_at);
                if matches {
                    bucket.remove(user_id);
                }
                matches
            }
            None => false,
        };
        self.ledger.remove_if(command, |_, bucket| bucket.is_empty());
        removed
    }

    /// Whether a ledger entry exists for (command, user), expired or not
    pub fn is_tracking(&self, command: &str, user_id: &str) -> bool {
        self.ledger
            .get(command)
            .is_some_and(|bucket| bucket.contains_key(user_id))
    }

    /// Total number of ledger entries across all commands
    pub fn len(&self) -> usize {
        self.ledger.iter().map(|bucket| bucket.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn schedule_expiry(&self, command: &str, user_id: &str, recorded_at: i64, window: i64) {
        // Outside a runtime the entry is left to lazy expiry
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let tracker = self.clone();
        let command = command.to_string();
        let user_id = user_id.to_string();
        let delay = Duration::from_millis(u64::try_from(window).unwrap_or(u64::MAX));

        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if tracker.expire(&command, &user_id, recorded_at) {
                debug!("⏱️ Cooldown expired for /{} by {}", command, user_id);
            }
        });
    }
}

fn window_millis(cooldown_seconds: u64) -> i64 {
    i64::try_from(cooldown_seconds.saturating_mul(1000)).unwrap_or(i64::MAX)
}
