//! Domain entities exchanged with the host and held by the engine.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be decoded
//! straight from inbound events and handed to the rendering layer as part of
//! a snapshot. Fields the host may omit carry `#[serde(default)]`.

use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, ChannelKind, CorrelationId, PostId, TeamId, TeamKind, UserId};

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A grouping of channels. Replaced wholesale on refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub kind: TeamKind,
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// An addressable conversation space, team-scoped or direct.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    /// Empty for direct and group channels.
    #[serde(default)]
    pub team_id: TeamId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub kind: ChannelKind,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub purpose: String,
    /// Unix epoch millis of the most recent post.
    #[serde(default)]
    pub last_post_at: i64,
    /// Counterpart of a one-to-one direct channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm_user_id: Option<UserId>,
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// Metadata of a file attached to a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
}

/// Open Graph style preview of the first link in a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkPreview {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Everything needed to (re)issue a send request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendParams {
    pub channel_id: ChannelId,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_id: Option<PostId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<String>,
}

impl SendParams {
    /// A send needs either non-blank text or at least one file.
    pub fn is_sendable(&self) -> bool {
        !self.message.trim().is_empty() || self.file_ids.iter().any(|f| !f.is_empty())
    }
}

/// Client-only delivery state of a post. Server data is always `Settled`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum Delivery {
    #[default]
    Settled,
    Pending,
    Failed(String),
}

/// A single message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    #[serde(default)]
    pub channel_id: ChannelId,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub user_display_name: String,
    #[serde(default)]
    pub message: String,
    /// Unix epoch millis.
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub update_at: i64,
    /// Empty when this post is a thread root.
    #[serde(default)]
    pub root_id: PostId,
    /// Empty for ordinary messages, set for system notices.
    #[serde(default, rename = "type")]
    pub post_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_preview: Option<LinkPreview>,
    #[serde(default)]
    pub is_pinned: bool,
    /// Echo of the correlation id the post was sent under, when the host
    /// forwards it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_id: Option<CorrelationId>,

    #[serde(default)]
    pub delivery: Delivery,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_params: Option<SendParams>,
}

impl Post {
    /// Build the optimistic local copy of an outgoing post.
    pub fn optimistic(
        pending_id: CorrelationId,
        author: UserId,
        author_display_name: String,
        params: SendParams,
        now_ms: i64,
    ) -> Self {
        Self {
            id: pending_id.to_local_post_id(),
            channel_id: params.channel_id.clone(),
            user_id: author,
            user_display_name: author_display_name,
            message: params.message.clone(),
            create_at: now_ms,
            update_at: now_ms,
            root_id: params.root_id.clone().unwrap_or_default(),
            file_ids: params.file_ids.clone(),
            pending_id: Some(pending_id),
            delivery: Delivery::Pending,
            send_params: Some(params),
            ..Self::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.root_id.is_empty()
    }

    pub fn is_system(&self) -> bool {
        !self.post_type.is_empty()
    }

    pub fn is_pending(&self) -> bool {
        self.delivery == Delivery::Pending
    }

    pub fn failed_error(&self) -> Option<&str> {
        match &self.delivery {
            Delivery::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.delivery == Delivery::Settled
    }

    /// Root id of the thread this post belongs to (its own id for roots).
    pub fn thread_root(&self) -> &PostId {
        if self.is_root() {
            &self.id
        } else {
            &self.root_id
        }
    }

    /// Strip client-only state so the post reads as settled server data.
    pub fn into_settled(mut self) -> Self {
        self.delivery = Delivery::Settled;
        self.send_params = None;
        self
    }
}

// ---------------------------------------------------------------------------
// Reaction
// ---------------------------------------------------------------------------

/// One user's emoji reaction on a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reaction {
    pub post_id: PostId,
    pub user_id: UserId,
    pub emoji_name: String,
    #[serde(default)]
    pub user_display_name: String,
}

impl Reaction {
    /// Identity is the (post, user, emoji) triple; the display name is ignored.
    pub fn same_triple(&self, other: &Reaction) -> bool {
        self.post_id == other.post_id
            && self.user_id == other.user_id
            && self.emoji_name == other.emoji_name
    }
}

// ---------------------------------------------------------------------------
// Unread
// ---------------------------------------------------------------------------

/// Per-channel unread counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnreadCounts {
    #[serde(default)]
    pub msg_count: u64,
    #[serde(default)]
    pub mention_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sendable_requires_text_or_files() {
        let mut params = SendParams {
            channel_id: ChannelId::from("C1"),
            message: "   ".into(),
            ..SendParams::default()
        };
        assert!(!params.is_sendable());

        params.file_ids = vec![String::new()];
        assert!(!params.is_sendable());

        params.file_ids = vec!["f1".into()];
        assert!(params.is_sendable());

        params.file_ids.clear();
        params.message = " hi ".into();
        assert!(params.is_sendable());
    }

    #[test]
    fn test_optimistic_post_is_pending() {
        let pending_id = CorrelationId::new();
        let post = Post::optimistic(
            pending_id,
            UserId::from("U1"),
            "alice".into(),
            SendParams {
                channel_id: ChannelId::from("C1"),
                message: "hello".into(),
                root_id: Some(PostId::from("root")),
                file_ids: vec![],
            },
            10,
        );

        assert!(post.is_pending());
        assert!(post.failed_error().is_none());
        assert_eq!(post.id, pending_id.to_local_post_id());
        assert_eq!(post.root_id, PostId::from("root"));
        assert_eq!(post.thread_root(), &PostId::from("root"));
        assert!(!post.into_settled().is_pending());
    }

    #[test]
    fn test_server_post_defaults_to_settled() {
        let post: Post = serde_json::from_str(
            r#"{"id":"srv_1","channel_id":"C1","message":"hi","type":"system_join"}"#,
        )
        .unwrap();
        assert!(post.is_settled());
        assert!(post.is_root());
        assert!(post.is_system());
        assert_eq!(post.create_at, 0);
    }
}
