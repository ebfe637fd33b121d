use tracing::{debug, info};

use murmur_shared::protocol::OutboundRequest;
use murmur_shared::types::{ChannelId, PostId, TeamId};

use crate::engine::ChatEngine;
use crate::events::RequestSink;

impl<S: RequestSink> ChatEngine<S> {
    /// Switch team and request its channel listing.
    pub fn select_team(&mut self, team_id: TeamId) {
        info!(team = %team_id, "Selecting team");
        self.state.select_team(team_id.clone());
        self.issue(OutboundRequest::FetchChannels { team_id });
    }

    /// Switch channel and request its first page of posts. Everything tied
    /// to the previous channel is dropped first.
    pub fn select_channel(&mut self, channel_id: ChannelId) {
        info!(channel = %channel_id, "Selecting channel");
        self.state.select_channel(channel_id.clone());
        self.issue(OutboundRequest::FetchPosts {
            channel_id: channel_id.clone(),
            page: None,
        });
        if self.config.mark_read_on_select {
            self.mark_read(channel_id);
        }
    }

    pub fn mark_read(&mut self, channel_id: ChannelId) {
        self.state.unread.mark_channel_read(channel_id.clone());
        self.issue(OutboundRequest::MarkRead { channel_id });
    }

    /// Request the next page of older history. Returns `false` when there is
    /// nothing more to load or a load is already running.
    pub fn load_older_posts(&mut self) -> bool {
        let Some(channel_id) = self.state.posts.channel_id().cloned() else {
            return false;
        };
        match self.state.posts.begin_load_older() {
            Some(page) => {
                debug!(channel = %channel_id, page, "Loading older posts");
                self.issue(OutboundRequest::FetchPosts {
                    channel_id,
                    page: Some(page),
                });
                true
            }
            None => false,
        }
    }

    pub fn set_favorite(&mut self, channel_id: ChannelId, favorite: bool) {
        self.state.channels.set_favorite(channel_id, favorite);
    }

    /// Open the thread rooted at `root_id`. The root is shown right away if
    /// it is already loaded; the replies are fetched.
    pub fn open_thread(&mut self, root_id: PostId) {
        self.state.posts.open_thread(root_id.clone());
        let root = self
            .state
            .posts
            .posts()
            .iter()
            .find(|p| p.id == root_id)
            .cloned();
        if let Some(root) = root {
            self.state.posts.append_thread_post(root);
        }
        self.issue(OutboundRequest::FetchThread { root_id });
    }

    pub fn close_thread(&mut self) {
        self.state.posts.close_thread();
    }

    pub fn set_reply_target(&mut self, post_id: PostId) {
        self.state.posts.set_reply_target(post_id);
    }

    pub fn clear_reply_target(&mut self) {
        self.state.posts.clear_reply_target();
    }
}
