use std::collections::HashMap;

use serde::Serialize;

use murmur_shared::models::UnreadCounts;
use murmur_shared::types::ChannelId;

/// Per-channel unread counters.
///
/// Does not know which channel is selected; callers only increment for
/// channels the user is not looking at.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnreadTracker {
    counts: HashMap<ChannelId, UnreadCounts>,
}

impl UnreadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_unread(&mut self, channel_id: ChannelId) {
        let counts = self.counts.entry(channel_id).or_default();
        counts.msg_count = counts.msg_count.saturating_add(1);
    }

    pub fn increment_mentions(&mut self, channel_id: ChannelId) {
        let counts = self.counts.entry(channel_id).or_default();
        counts.mention_count = counts.mention_count.saturating_add(1);
    }

    pub fn mark_channel_read(&mut self, channel_id: ChannelId) {
        self.counts.insert(channel_id, UnreadCounts::default());
    }

    pub fn set_unread(&mut self, channel_id: ChannelId, counts: UnreadCounts) {
        self.counts.insert(channel_id, counts);
    }

    /// Replace every counter with a full listing from the host.
    pub fn set_bulk_unread(&mut self, counts: HashMap<ChannelId, UnreadCounts>) {
        self.counts = counts;
    }

    pub fn get(&self, channel_id: &ChannelId) -> UnreadCounts {
        self.counts.get(channel_id).copied().unwrap_or_default()
    }

    pub fn all(&self) -> &HashMap<ChannelId, UnreadCounts> {
        &self.counts
    }

    pub fn total_mentions(&self) -> u64 {
        self.counts.values().map(|c| c.mention_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_creates_counter() {
        let mut tracker = UnreadTracker::new();
        let channel = ChannelId::from("C2");
        for _ in 0..7 {
            tracker.increment_unread(channel.clone());
        }
        assert_eq!(tracker.get(&channel).msg_count, 7);
        assert_eq!(tracker.get(&channel).mention_count, 0);
    }

    #[test]
    fn test_mark_read_resets_both_counters() {
        let mut tracker = UnreadTracker::new();
        let channel = ChannelId::from("C2");
        tracker.increment_unread(channel.clone());
        tracker.increment_mentions(channel.clone());
        tracker.mark_channel_read(channel.clone());
        assert_eq!(tracker.get(&channel), UnreadCounts::default());
    }

    #[test]
    fn test_bulk_replaces() {
        let mut tracker = UnreadTracker::new();
        tracker.increment_unread(ChannelId::from("C1"));
        tracker.set_bulk_unread(HashMap::from([(
            ChannelId::from("C2"),
            UnreadCounts {
                msg_count: 3,
                mention_count: 1,
            },
        )]));

        assert_eq!(tracker.get(&ChannelId::from("C1")).msg_count, 0);
        assert_eq!(tracker.get(&ChannelId::from("C2")).msg_count, 3);
        assert_eq!(tracker.total_mentions(), 1);
    }
}
