//! The engine's state container.
//!
//! [`EngineState`] owns one instance of every store. It is exclusively owned
//! by a [`ChatEngine`](crate::engine::ChatEngine); nothing else holds a
//! mutable reference to it.

use serde::Serialize;

use murmur_shared::types::{ChannelId, TeamId};
use murmur_store::{
    ChannelStore, ConnectionSignal, Outbox, PostStore, PresenceTracker, ReactionStore,
    UnreadTracker,
};

/// Central engine state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineState {
    /// Teams, channel listings, favorites and the current selection.
    pub channels: ChannelStore,

    /// Timeline of the selected channel, the open thread, the reply target
    /// and search results.
    pub posts: PostStore,

    /// Outstanding optimistic sends keyed by correlation id.
    pub outbox: Outbox,

    /// Reactions of the posts currently loaded.
    pub reactions: ReactionStore,

    /// Typing indicators and user statuses.
    pub presence: PresenceTracker,

    /// Per-channel unread counters.
    pub unread: UnreadTracker,

    /// Transport status reported by the host.
    pub connection: ConnectionSignal,
}

impl EngineState {
    pub fn new(typing_ttl_ms: u64) -> Self {
        Self {
            presence: PresenceTracker::new(typing_ttl_ms),
            ..Self::default()
        }
    }

    /// Switch team. Every piece of timeline-dependent state is dropped.
    pub fn select_team(&mut self, team_id: TeamId) {
        self.channels.select_team(team_id);
        self.posts.clear();
        self.reactions.clear();
    }

    /// Switch channel. Timeline, thread, reply target and the reaction
    /// cache of the previous channel are dropped.
    pub fn select_channel(&mut self, channel_id: ChannelId) {
        self.channels.select_channel(channel_id.clone());
        self.posts.reset_for_channel(channel_id);
        self.reactions.clear();
    }
}
