//! Team and channel listings plus the current selection.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use murmur_shared::models::{Channel, Team};
use murmur_shared::types::{ChannelId, TeamId};

/// Teams, team channels, direct channels and the favorite overlay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChannelStore {
    teams: Vec<Team>,
    channels: Vec<Channel>,
    direct_channels: Vec<Channel>,
    favorites: HashSet<ChannelId>,
    selected_team: Option<TeamId>,
    selected_channel: Option<ChannelId>,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Replace-on-refresh
    // ------------------------------------------------------------------

    pub fn set_teams(&mut self, teams: Vec<Team>) {
        self.teams = teams;
    }

    /// Replace the team channel listing. Direct channels that slip into the
    /// listing are routed to the direct collection.
    pub fn set_channels(&mut self, channels: Vec<Channel>) {
        let (direct, team): (Vec<_>, Vec<_>) =
            channels.into_iter().partition(|c| c.kind.is_direct());
        self.channels = team;
        if !direct.is_empty() {
            debug!(count = direct.len(), "Direct channels in team listing");
            for channel in direct {
                self.upsert_direct(channel);
            }
        }
    }

    pub fn set_direct_channels(&mut self, channels: Vec<Channel>) {
        self.direct_channels = channels;
    }

    pub fn set_favorites(&mut self, channel_ids: impl IntoIterator<Item = ChannelId>) {
        self.favorites = channel_ids.into_iter().collect();
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Replace a channel's metadata in place, or add it if unknown.
    pub fn update_channel(&mut self, channel: Channel) {
        if channel.kind.is_direct() {
            self.upsert_direct(channel);
            return;
        }
        match self.channels.iter_mut().find(|c| c.id == channel.id) {
            Some(existing) => *existing = channel,
            None => self.channels.push(channel),
        }
    }

    fn upsert_direct(&mut self, channel: Channel) {
        match self.direct_channels.iter_mut().find(|c| c.id == channel.id) {
            Some(existing) => *existing = channel,
            None => self.direct_channels.push(channel),
        }
    }

    /// Advance a channel's last-activity timestamp. Never moves it backwards.
    pub fn touch_channel(&mut self, channel_id: &ChannelId, at_ms: i64) {
        if let Some(channel) = self.channel_mut(channel_id) {
            channel.last_post_at = channel.last_post_at.max(at_ms);
        }
    }

    pub fn set_favorite(&mut self, channel_id: ChannelId, favorite: bool) {
        if favorite {
            self.favorites.insert(channel_id);
        } else {
            self.favorites.remove(&channel_id);
        }
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Select a team. Clears the channel selection and the team channel
    /// listing, which belongs to the previous team.
    pub fn select_team(&mut self, team_id: TeamId) {
        if self.selected_team.as_ref() != Some(&team_id) {
            self.channels.clear();
        }
        self.selected_team = Some(team_id);
        self.selected_channel = None;
    }

    pub fn select_channel(&mut self, channel_id: ChannelId) {
        self.selected_channel = Some(channel_id);
    }

    pub fn selected_team(&self) -> Option<&TeamId> {
        self.selected_team.as_ref()
    }

    pub fn selected_channel(&self) -> Option<&ChannelId> {
        self.selected_channel.as_ref()
    }

    pub fn is_selected(&self, channel_id: &ChannelId) -> bool {
        self.selected_channel.as_ref() == Some(channel_id)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn direct_channels(&self) -> &[Channel] {
        &self.direct_channels
    }

    pub fn is_favorite(&self, channel_id: &ChannelId) -> bool {
        self.favorites.contains(channel_id)
    }

    pub fn favorites(&self) -> &HashSet<ChannelId> {
        &self.favorites
    }

    pub fn channel(&self, channel_id: &ChannelId) -> Option<&Channel> {
        self.channels
            .iter()
            .chain(self.direct_channels.iter())
            .find(|c| &c.id == channel_id)
    }

    fn channel_mut(&mut self, channel_id: &ChannelId) -> Option<&mut Channel> {
        self.channels
            .iter_mut()
            .chain(self.direct_channels.iter_mut())
            .find(|c| &c.id == channel_id)
    }
}
