use std::collections::HashMap;

use murmur_shared::types::{ChannelId, PostId};

/// A compose session: a channel, or a thread within it.
pub type ComposeKey = (ChannelId, Option<PostId>);

/// Allows at most one outbound typing signal per window per compose session.
#[derive(Debug, Clone)]
pub struct TypingThrottle {
    window_ms: u64,
    last_sent: HashMap<ComposeKey, u64>,
}

impl TypingThrottle {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_sent: HashMap::new(),
        }
    }

    /// Returns `true` and starts a new window if a signal may go out now.
    pub fn check(&mut self, key: ComposeKey, now_ms: u64) -> bool {
        match self.last_sent.get(&key) {
            Some(&last) if now_ms.saturating_sub(last) < self.window_ms => false,
            _ => {
                self.last_sent.insert(key, now_ms);
                true
            }
        }
    }

    /// Forget a session, e.g. after its message is sent.
    pub fn reset(&mut self, key: &ComposeKey) {
        self.last_sent.remove(key);
    }

    /// Drop sessions whose window has long closed.
    pub fn purge_stale(&mut self, now_ms: u64) {
        let window = self.window_ms;
        self.last_sent
            .retain(|_, last| now_ms.saturating_sub(*last) < window);
    }

    pub fn len(&self) -> usize {
        self.last_sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_sent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(channel: &str) -> ComposeKey {
        (ChannelId::from(channel), None)
    }

    #[test]
    fn test_one_signal_per_window() {
        let mut throttle = TypingThrottle::new(3_000);
        assert!(throttle.check(key("C1"), 0));
        assert!(!throttle.check(key("C1"), 1_000));
        assert!(!throttle.check(key("C1"), 2_999));
        assert!(throttle.check(key("C1"), 3_000));
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut throttle = TypingThrottle::new(3_000);
        assert!(throttle.check(key("C1"), 0));
        assert!(throttle.check(key("C2"), 0));
        assert!(throttle.check((ChannelId::from("C1"), Some(PostId::from("root"))), 0));
    }

    #[test]
    fn test_reset_and_purge() {
        let mut throttle = TypingThrottle::new(3_000);
        throttle.check(key("C1"), 0);
        throttle.reset(&key("C1"));
        assert!(throttle.check(key("C1"), 10));

        throttle.check(key("C2"), 10);
        throttle.purge_stale(3_010);
        assert!(throttle.is_empty());
    }
}
