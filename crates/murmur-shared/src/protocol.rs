use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::models::{Channel, Post, Reaction, SendParams, Team, UnreadCounts};
use crate::types::{ChannelId, ConnectionState, CorrelationId, PostId, TeamId, UserId, UserStatus};

/// All events the host delivers to the engine.
///
/// Serialized as `{"event": <tag>, "data": {...}}`. Decoding goes through
/// [`InboundEvent::decode`], which tolerates unknown tags and missing bodies.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Full team listing
    Teams(TeamsBody),
    /// Team channel listing
    Channels(ChannelsBody),
    /// Direct and group channel listing
    DirectChannels(DirectChannelsBody),
    /// Favorite membership overlay
    FavoriteChannels(FavoriteChannelsBody),
    /// Metadata change of a single channel
    ChannelUpdated(ChannelUpdatedBody),

    /// Fresh timeline fetch
    Posts(PostsBody),
    /// Next page of history
    OlderPosts(PostsBody),
    /// Timeline fetch failed
    PostsFailed(FetchFailedBody),
    /// Thread fetch
    Thread(ThreadBody),
    /// Thread fetch failed
    ThreadFailed(ThreadFailedBody),

    /// Real-time post arrival
    NewPost(NewPostBody),
    /// Real-time post edit
    PostEdited(PostBody),
    /// Real-time post deletion
    PostDeleted(PostDeletedBody),

    /// Host accepted a send
    SendConfirmed(SendConfirmedBody),
    /// Host rejected a send
    SendFailed(SendFailedBody),

    ReactionAdded(ReactionBody),
    ReactionRemoved(ReactionBody),
    /// Replace the reactions of one post
    Reactions(PostReactionsBody),
    /// Hydrate reactions across many posts
    BulkReactions(BulkReactionsBody),

    Typing(TypingBody),
    UserStatuses(UserStatusesBody),
    StatusChanged(StatusChangedBody),

    Unread(UnreadBody),
    BulkUnread(BulkUnreadBody),
    UnreadIncrement(UnreadIncrementBody),
    ChannelRead(ChannelReadBody),

    Connection(ConnectionState),

    SearchResults(SearchResultsBody),
    SearchFailed(SearchFailedBody),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TeamsBody {
    pub teams: Vec<Team>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelsBody {
    pub team_id: Option<TeamId>,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectChannelsBody {
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FavoriteChannelsBody {
    pub channel_ids: Vec<ChannelId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelUpdatedBody {
    pub channel: Channel,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostsBody {
    /// Channel the fetch was issued for.
    pub channel_id: Option<ChannelId>,
    /// Newest first.
    pub posts: Vec<Post>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchFailedBody {
    pub channel_id: Option<ChannelId>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadBody {
    pub root_id: PostId,
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadFailedBody {
    pub root_id: PostId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPostBody {
    pub post: Post,
    /// The current user is mentioned in the post.
    #[serde(default)]
    pub mentioned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostBody {
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostDeletedBody {
    pub post_id: PostId,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendConfirmedBody {
    pub pending_id: CorrelationId,
    pub post: Post,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SendFailedBody {
    pub pending_id: CorrelationId,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReactionBody {
    pub reaction: Reaction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostReactionsBody {
    pub post_id: PostId,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BulkReactionsBody {
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypingBody {
    pub user_id: UserId,
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserStatusesBody {
    pub statuses: HashMap<UserId, UserStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChangedBody {
    pub user_id: UserId,
    #[serde(default)]
    pub status: UserStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnreadBody {
    pub channel_id: ChannelId,
    #[serde(default)]
    pub msg_count: u64,
    #[serde(default)]
    pub mention_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BulkUnreadBody {
    pub counts: HashMap<ChannelId, UnreadCounts>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnreadIncrementBody {
    pub channel_id: ChannelId,
    #[serde(default)]
    pub mentioned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelReadBody {
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchResultsBody {
    pub query: String,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchFailedBody {
    pub query: String,
    pub message: Option<String>,
}

/// Untyped envelope as it crosses the host boundary.
#[derive(Debug, Deserialize)]
struct RawEvent {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

fn body<T: DeserializeOwned>(tag: &str, data: serde_json::Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::Malformed {
        tag: tag.to_string(),
        source,
    })
}

impl InboundEvent {
    /// Decode one event from its JSON envelope.
    ///
    /// Returns `Ok(None)` for tags this engine does not know, so hosts can
    /// add event families without breaking older engines.
    pub fn decode(json: &str) -> Result<Option<Self>, ProtocolError> {
        let raw: RawEvent = serde_json::from_str(json).map_err(ProtocolError::Envelope)?;
        Self::from_parts(&raw.event, raw.data)
    }

    /// Decode an event from an already split tag and body.
    pub fn from_parts(tag: &str, data: serde_json::Value) -> Result<Option<Self>, ProtocolError> {
        // A missing body decodes like an empty one so defaults apply.
        let data = match data {
            serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
            other => other,
        };

        let event = match tag {
            "teams" => Self::Teams(body(tag, data)?),
            "channels" => Self::Channels(body(tag, data)?),
            "direct_channels" => Self::DirectChannels(body(tag, data)?),
            "favorite_channels" => Self::FavoriteChannels(body(tag, data)?),
            "channel_updated" => Self::ChannelUpdated(body(tag, data)?),
            "posts" => Self::Posts(body(tag, data)?),
            "older_posts" => Self::OlderPosts(body(tag, data)?),
            "posts_failed" => Self::PostsFailed(body(tag, data)?),
            "thread" => Self::Thread(body(tag, data)?),
            "thread_failed" => Self::ThreadFailed(body(tag, data)?),
            "new_post" => Self::NewPost(body(tag, data)?),
            "post_edited" => Self::PostEdited(body(tag, data)?),
            "post_deleted" => Self::PostDeleted(body(tag, data)?),
            "send_confirmed" => Self::SendConfirmed(body(tag, data)?),
            "send_failed" => Self::SendFailed(body(tag, data)?),
            "reaction_added" => Self::ReactionAdded(body(tag, data)?),
            "reaction_removed" => Self::ReactionRemoved(body(tag, data)?),
            "reactions" => Self::Reactions(body(tag, data)?),
            "bulk_reactions" => Self::BulkReactions(body(tag, data)?),
            "typing" => Self::Typing(body(tag, data)?),
            "user_statuses" => Self::UserStatuses(body(tag, data)?),
            "status_changed" => Self::StatusChanged(body(tag, data)?),
            "unread" => Self::Unread(body(tag, data)?),
            "bulk_unread" => Self::BulkUnread(body(tag, data)?),
            "unread_increment" => Self::UnreadIncrement(body(tag, data)?),
            "channel_read" => Self::ChannelRead(body(tag, data)?),
            "connection" => Self::Connection(body(tag, data)?),
            "search_results" => Self::SearchResults(body(tag, data)?),
            "search_failed" => Self::SearchFailed(body(tag, data)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    /// Wire tag of this event.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Teams(_) => "teams",
            Self::Channels(_) => "channels",
            Self::DirectChannels(_) => "direct_channels",
            Self::FavoriteChannels(_) => "favorite_channels",
            Self::ChannelUpdated(_) => "channel_updated",
            Self::Posts(_) => "posts",
            Self::OlderPosts(_) => "older_posts",
            Self::PostsFailed(_) => "posts_failed",
            Self::Thread(_) => "thread",
            Self::ThreadFailed(_) => "thread_failed",
            Self::NewPost(_) => "new_post",
            Self::PostEdited(_) => "post_edited",
            Self::PostDeleted(_) => "post_deleted",
            Self::SendConfirmed(_) => "send_confirmed",
            Self::SendFailed(_) => "send_failed",
            Self::ReactionAdded(_) => "reaction_added",
            Self::ReactionRemoved(_) => "reaction_removed",
            Self::Reactions(_) => "reactions",
            Self::BulkReactions(_) => "bulk_reactions",
            Self::Typing(_) => "typing",
            Self::UserStatuses(_) => "user_statuses",
            Self::StatusChanged(_) => "status_changed",
            Self::Unread(_) => "unread",
            Self::BulkUnread(_) => "bulk_unread",
            Self::UnreadIncrement(_) => "unread_increment",
            Self::ChannelRead(_) => "channel_read",
            Self::Connection(_) => "connection",
            Self::SearchResults(_) => "search_results",
            Self::SearchFailed(_) => "search_failed",
        }
    }

    /// Serialize to the JSON envelope.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Requests the engine issues to the host. Fire-and-forget: outcomes come
/// back as later [`InboundEvent`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "request", content = "data", rename_all = "snake_case")]
pub enum OutboundRequest {
    SendPost {
        pending_id: CorrelationId,
        #[serde(flatten)]
        params: SendParams,
    },
    FetchPosts {
        channel_id: ChannelId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<u32>,
    },
    FetchThread {
        root_id: PostId,
    },
    FetchChannels {
        team_id: TeamId,
    },
    MarkRead {
        channel_id: ChannelId,
    },
    AddReaction {
        post_id: PostId,
        emoji_name: String,
    },
    RemoveReaction {
        post_id: PostId,
        emoji_name: String,
    },
    Typing {
        channel_id: ChannelId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        root_id: Option<PostId>,
    },
    Search {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        team_id: Option<TeamId>,
        terms: String,
    },
}

impl OutboundRequest {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::SendPost { .. } => "send_post",
            Self::FetchPosts { .. } => "fetch_posts",
            Self::FetchThread { .. } => "fetch_thread",
            Self::FetchChannels { .. } => "fetch_channels",
            Self::MarkRead { .. } => "mark_read",
            Self::AddReaction { .. } => "add_reaction",
            Self::RemoveReaction { .. } => "remove_reaction",
            Self::Typing { .. } => "typing",
            Self::Search { .. } => "search",
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
