//! Typing indicators and user presence.
//!
//! Typing entries carry the logical time of their last signal and expire by
//! sweep. There is no explicit "stopped typing" event.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use murmur_shared::constants::TYPING_TTL_MS;
use murmur_shared::types::{ChannelId, UserId, UserStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypingEntry {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    /// Logical millis of the last typing signal.
    pub at_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresenceTracker {
    typing: Vec<TypingEntry>,
    statuses: HashMap<UserId, UserStatus>,
    ttl_ms: u64,
}

impl PresenceTracker {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            typing: Vec::new(),
            statuses: HashMap::new(),
            ttl_ms,
        }
    }

    /// Refresh the typing entry for (user, channel) to `now_ms`.
    pub fn add_typing(&mut self, user_id: UserId, channel_id: ChannelId, now_ms: u64) {
        self.typing
            .retain(|e| !(e.user_id == user_id && e.channel_id == channel_id));
        self.typing.push(TypingEntry {
            user_id,
            channel_id,
            at_ms: now_ms,
        });
    }

    /// Drop the entry for (user, channel), e.g. once the user's post lands.
    pub fn remove_typing(&mut self, user_id: &UserId, channel_id: &ChannelId) {
        self.typing
            .retain(|e| !(&e.user_id == user_id && &e.channel_id == channel_id));
    }

    /// Remove every entry older than the TTL. Returns how many were purged.
    pub fn clear_stale_typing(&mut self, now_ms: u64) -> usize {
        let before = self.typing.len();
        let ttl = self.ttl_ms;
        self.typing
            .retain(|e| now_ms.saturating_sub(e.at_ms) <= ttl);
        let purged = before - self.typing.len();
        if purged > 0 {
            debug!(purged, "Purged stale typing entries");
        }
        purged
    }

    /// Users currently typing in `channel_id`, in signal order.
    pub fn typing_users(&self, channel_id: &ChannelId) -> Vec<UserId> {
        self.typing
            .iter()
            .filter(|e| &e.channel_id == channel_id)
            .map(|e| e.user_id.clone())
            .collect()
    }

    pub fn typing_entries(&self) -> &[TypingEntry] {
        &self.typing
    }

    pub fn set_user_statuses(&mut self, statuses: HashMap<UserId, UserStatus>) {
        self.statuses = statuses;
    }

    pub fn update_user_status(&mut self, user_id: UserId, status: UserStatus) {
        self.statuses.insert(user_id, status);
    }

    /// Users never reported are treated as offline.
    pub fn status(&self, user_id: &UserId) -> UserStatus {
        self.statuses.get(user_id).copied().unwrap_or_default()
    }

    pub fn statuses(&self) -> &HashMap<UserId, UserStatus> {
        &self.statuses
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new(TYPING_TTL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(id: &str) -> UserId {
        UserId::from(id)
    }

    fn c(id: &str) -> ChannelId {
        ChannelId::from(id)
    }

    #[test]
    fn test_entry_expires_after_ttl() {
        let mut tracker = PresenceTracker::default();
        tracker.add_typing(u("U2"), c("C1"), 0);

        tracker.clear_stale_typing(5_000);
        assert_eq!(tracker.typing_users(&c("C1")), vec![u("U2")]);

        tracker.clear_stale_typing(6_000);
        assert!(tracker.typing_users(&c("C1")).is_empty());
    }

    #[test]
    fn test_refresh_resets_age() {
        let mut tracker = PresenceTracker::default();
        tracker.add_typing(u("U2"), c("C1"), 0);
        tracker.add_typing(u("U2"), c("C1"), 4_000);

        assert_eq!(tracker.typing_entries().len(), 1);
        assert_eq!(tracker.clear_stale_typing(8_000), 0);
        assert_eq!(tracker.clear_stale_typing(9_001), 1);
    }

    #[test]
    fn test_typing_is_per_channel() {
        let mut tracker = PresenceTracker::default();
        tracker.add_typing(u("U1"), c("C1"), 0);
        tracker.add_typing(u("U1"), c("C2"), 0);
        tracker.add_typing(u("U2"), c("C1"), 0);

        assert_eq!(tracker.typing_users(&c("C1")), vec![u("U1"), u("U2")]);
        tracker.remove_typing(&u("U1"), &c("C1"));
        assert_eq!(tracker.typing_users(&c("C1")), vec![u("U2")]);
        assert_eq!(tracker.typing_users(&c("C2")), vec![u("U1")]);
    }

    #[test]
    fn test_statuses() {
        let mut tracker = PresenceTracker::default();
        assert_eq!(tracker.status(&u("U1")), UserStatus::Offline);

        tracker.set_user_statuses(HashMap::from([(u("U1"), UserStatus::Online)]));
        tracker.update_user_status(u("U2"), UserStatus::Dnd);
        assert_eq!(tracker.status(&u("U1")), UserStatus::Online);
        assert_eq!(tracker.status(&u("U2")), UserStatus::Dnd);

        tracker.set_user_statuses(HashMap::new());
        assert_eq!(tracker.status(&u("U2")), UserStatus::Offline);
    }
}
