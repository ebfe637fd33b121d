//! Read-only view of the engine state handed to the rendering layer.

use std::collections::HashMap;

use serde::Serialize;

use murmur_shared::models::{Channel, Post, Reaction, Team, UnreadCounts};
use murmur_shared::types::{ChannelId, ConnectionState, PostId, TeamId, UserId, UserStatus};
use murmur_store::{SearchState, ThreadView, Timeline, TypingEntry};

use crate::state::EngineState;

/// An owned copy of everything a consumer may render. Produced by
/// [`ChatEngine::snapshot`](crate::engine::ChatEngine::snapshot) and
/// published by the bridge after every change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub teams: Vec<Team>,
    pub channels: Vec<Channel>,
    pub direct_channels: Vec<Channel>,
    pub favorites: Vec<ChannelId>,
    pub selected_team: Option<TeamId>,
    pub selected_channel: Option<ChannelId>,
    pub timeline: Timeline,
    pub thread: Option<ThreadView>,
    pub reply_target: Option<PostId>,
    pub search: Option<SearchState>,
    pub reactions: HashMap<PostId, Vec<Reaction>>,
    pub unread: HashMap<ChannelId, UnreadCounts>,
    pub typing: Vec<TypingEntry>,
    pub statuses: HashMap<UserId, UserStatus>,
    pub connection: ConnectionState,
    /// Sends not yet confirmed, failed ones included.
    pub outstanding_sends: usize,
}

impl Snapshot {
    pub fn capture(state: &EngineState) -> Self {
        let mut favorites: Vec<ChannelId> = state.channels.favorites().iter().cloned().collect();
        favorites.sort();

        Self {
            teams: state.channels.teams().to_vec(),
            channels: state.channels.channels().to_vec(),
            direct_channels: state.channels.direct_channels().to_vec(),
            favorites,
            selected_team: state.channels.selected_team().cloned(),
            selected_channel: state.channels.selected_channel().cloned(),
            timeline: state.posts.timeline().clone(),
            thread: state.posts.thread().cloned(),
            reply_target: state.posts.reply_target().cloned(),
            search: state.posts.search().cloned(),
            reactions: state.reactions.all().clone(),
            unread: state.unread.all().clone(),
            typing: state.presence.typing_entries().to_vec(),
            statuses: state.presence.statuses().clone(),
            connection: state.connection.state(),
            outstanding_sends: state.outbox.len(),
        }
    }

    /// Posts of the selected channel, newest first.
    pub fn posts(&self) -> &[Post] {
        &self.timeline.posts
    }

    pub fn thread_posts(&self) -> &[Post] {
        self.thread.as_ref().map(|t| t.posts.as_slice()).unwrap_or(&[])
    }

    pub fn reactions_for(&self, post_id: &PostId) -> &[Reaction] {
        self.reactions.get(post_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unread(&self, channel_id: &ChannelId) -> UnreadCounts {
        self.unread.get(channel_id).copied().unwrap_or_default()
    }

    pub fn typing_users(&self, channel_id: &ChannelId) -> Vec<&UserId> {
        self.typing
            .iter()
            .filter(|e| &e.channel_id == channel_id)
            .map(|e| &e.user_id)
            .collect()
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }
}
