//! Inbound event dispatch.
//!
//! [`apply`] takes one decoded event and performs its whole effect as a
//! sequence of store mutations. It never fails: events that no longer match
//! the current view are dropped with a log line.

use tracing::{debug, info, warn};

use murmur_shared::models::{Post, UnreadCounts};
use murmur_shared::protocol::{InboundEvent, NewPostBody, PostsBody};
use murmur_shared::types::{ChannelId, CorrelationId, UserId};
use murmur_store::StoreError;

use crate::state::EngineState;

/// What the router needs to know about the caller.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    /// The signed-in user.
    pub me: &'a UserId,
    /// Logical millis at which the event is applied.
    pub now_ms: u64,
}

/// Apply one inbound event to `state`.
pub fn apply(state: &mut EngineState, ctx: &RouteContext<'_>, event: InboundEvent) {
    let tag = event.tag();
    match event {
        // --------------------------------------------------------------
        // Listings
        // --------------------------------------------------------------
        InboundEvent::Teams(body) => {
            debug!(count = body.teams.len(), "Teams loaded");
            state.channels.set_teams(body.teams);
        }
        InboundEvent::Channels(body) => {
            let selected = state.channels.selected_team();
            if let (Some(team), Some(selected)) = (body.team_id.as_ref(), selected) {
                if team != selected {
                    debug!(team = %team, "Dropping channel listing for another team");
                    return;
                }
            }
            state.channels.set_channels(body.channels);
        }
        InboundEvent::DirectChannels(body) => state.channels.set_direct_channels(body.channels),
        InboundEvent::FavoriteChannels(body) => state.channels.set_favorites(body.channel_ids),
        InboundEvent::ChannelUpdated(body) => state.channels.update_channel(body.channel),

        // --------------------------------------------------------------
        // Fetch responses
        // --------------------------------------------------------------
        InboundEvent::Posts(body) => {
            if let Some(body) = for_timeline(state, tag, body) {
                state.posts.set_posts(settled(body.posts), body.has_more);
            }
        }
        InboundEvent::OlderPosts(body) => {
            if let Some(body) = for_timeline(state, tag, body) {
                let added = state.posts.append_older_posts(settled(body.posts), body.has_more);
                debug!(added, has_more = body.has_more, "Older posts appended");
            }
        }
        InboundEvent::PostsFailed(body) => {
            if timeline_accepts(state, body.channel_id.as_ref()) {
                warn!(message = ?body.message, "Post fetch failed");
                state.posts.set_fetch_failed(body.message);
            } else {
                debug!(event = tag, "Dropping failure for a channel no longer selected");
            }
        }
        InboundEvent::Thread(body) => {
            if !state.posts.set_thread_posts(&body.root_id, settled(body.posts)) {
                debug!(root = %body.root_id, "Dropping thread for a closed thread");
            }
        }
        InboundEvent::ThreadFailed(body) => {
            if state.posts.set_thread_failed(&body.root_id, body.message) {
                warn!(root = %body.root_id, "Thread fetch failed");
            }
        }

        // --------------------------------------------------------------
        // Real-time posts
        // --------------------------------------------------------------
        InboundEvent::NewPost(body) => new_post(state, ctx, body),
        InboundEvent::PostEdited(body) => {
            if !state.posts.update_post(body.post.into_settled()) {
                debug!(event = tag, "Edited post is not loaded");
            }
        }
        InboundEvent::PostDeleted(body) => {
            state.posts.remove_post(&body.post_id);
            state.reactions.remove_post(&body.post_id);
        }

        // --------------------------------------------------------------
        // Send lifecycle
        // --------------------------------------------------------------
        InboundEvent::SendConfirmed(body) => {
            let channel_id = body.post.channel_id.clone();
            let created = body.post.create_at;
            match state.outbox.confirm(&mut state.posts, body.pending_id, body.post) {
                Ok(()) => state.channels.touch_channel(&channel_id, created),
                Err(e) => log_unsettled(body.pending_id, e),
            }
        }
        InboundEvent::SendFailed(body) => {
            if let Err(e) = state
                .outbox
                .fail(&mut state.posts, body.pending_id, body.message)
            {
                log_unsettled(body.pending_id, e);
            }
        }

        // --------------------------------------------------------------
        // Reactions
        // --------------------------------------------------------------
        // Reactions are kept only for loaded posts.
        InboundEvent::ReactionAdded(body) => {
            if state.posts.contains(&body.reaction.post_id) {
                state.reactions.add_reaction(body.reaction);
            } else {
                debug!(post = %body.reaction.post_id, "Dropping reaction for a post not loaded");
            }
        }
        InboundEvent::ReactionRemoved(body) => {
            state.reactions.remove_reaction(&body.reaction);
        }
        InboundEvent::Reactions(body) => {
            if state.posts.contains(&body.post_id) {
                state.reactions.set_reactions_for_post(body.post_id, body.reactions);
            } else {
                debug!(post = %body.post_id, "Dropping reactions for a post not loaded");
            }
        }
        InboundEvent::BulkReactions(body) => {
            let reactions: Vec<_> = body
                .reactions
                .into_iter()
                .filter(|r| state.posts.contains(&r.post_id))
                .collect();
            state.reactions.set_bulk_reactions(reactions);
        }

        // --------------------------------------------------------------
        // Presence
        // --------------------------------------------------------------
        InboundEvent::Typing(body) => {
            if &body.user_id != ctx.me {
                state
                    .presence
                    .add_typing(body.user_id, body.channel_id, ctx.now_ms);
            }
        }
        InboundEvent::UserStatuses(body) => state.presence.set_user_statuses(body.statuses),
        InboundEvent::StatusChanged(body) => {
            state.presence.update_user_status(body.user_id, body.status);
        }

        // --------------------------------------------------------------
        // Unread
        // --------------------------------------------------------------
        InboundEvent::Unread(body) => state.unread.set_unread(
            body.channel_id,
            UnreadCounts {
                msg_count: body.msg_count,
                mention_count: body.mention_count,
            },
        ),
        InboundEvent::BulkUnread(body) => state.unread.set_bulk_unread(body.counts),
        InboundEvent::UnreadIncrement(body) => {
            if state.channels.is_selected(&body.channel_id) {
                debug!(channel = %body.channel_id, "Skipping increment for the selected channel");
                return;
            }
            if body.mentioned {
                state.unread.increment_mentions(body.channel_id.clone());
            }
            state.unread.increment_unread(body.channel_id);
        }
        InboundEvent::ChannelRead(body) => state.unread.mark_channel_read(body.channel_id),

        // --------------------------------------------------------------
        // Connection and search
        // --------------------------------------------------------------
        InboundEvent::Connection(status) => {
            if status.connected != state.connection.is_connected() {
                info!(
                    connected = status.connected,
                    attempts = status.reconnect_attempts,
                    "Connection status changed"
                );
            }
            state.connection.set_status(status);
        }
        InboundEvent::SearchResults(body) => {
            if !state.posts.set_search_results(&body.query, settled(body.posts)) {
                debug!(query = %body.query, "Dropping results for an inactive search");
            }
        }
        InboundEvent::SearchFailed(body) => {
            if state.posts.set_search_failed(&body.query, body.message) {
                warn!(query = %body.query, "Search failed");
            }
        }
    }
}

/// A real-time post. Either settles one of our own sends or lands in the
/// timeline, the open thread and the unread counters.
fn new_post(state: &mut EngineState, ctx: &RouteContext<'_>, body: NewPostBody) {
    let NewPostBody { post, mentioned } = body;
    let channel_id = post.channel_id.clone();

    state.channels.touch_channel(&channel_id, post.create_at);
    state.presence.remove_typing(&post.user_id, &channel_id);

    if let Some(pending_id) = post.pending_id.filter(|id| state.outbox.contains(id)) {
        debug!(pending_id = %pending_id, "Real-time echo settles a pending send");
        if let Err(e) = state.outbox.confirm(&mut state.posts, pending_id, post) {
            log_unsettled(pending_id, e);
        }
        return;
    }

    let post = post.into_settled();
    if state.channels.is_selected(&channel_id) {
        state.posts.append_thread_post(post.clone());
        state.posts.prepend_new_post(post);
    } else if &post.user_id != ctx.me {
        if mentioned {
            state.unread.increment_mentions(channel_id.clone());
        }
        state.unread.increment_unread(channel_id);
    }
}

/// Server posts never carry local delivery state.
fn settled(posts: Vec<Post>) -> Vec<Post> {
    posts.into_iter().map(Post::into_settled).collect()
}

/// Keep a fetch response only if it answers the selected channel.
fn for_timeline(state: &EngineState, tag: &str, body: PostsBody) -> Option<PostsBody> {
    if timeline_accepts(state, body.channel_id.as_ref()) {
        Some(body)
    } else {
        debug!(
            event = tag,
            channel = ?body.channel_id.as_ref().map(|c| c.as_str()),
            "Dropping posts for a channel no longer selected"
        );
        None
    }
}

fn timeline_accepts(state: &EngineState, channel_id: Option<&ChannelId>) -> bool {
    state.posts.channel_id().is_some() && state.posts.accepts(channel_id)
}

fn log_unsettled(pending_id: CorrelationId, error: StoreError) {
    match error {
        StoreError::UnknownCorrelation(_) => {
            debug!(pending_id = %pending_id, "No outstanding send for correlation id");
        }
        other => warn!(pending_id = %pending_id, error = %other, "Could not settle send"),
    }
}
