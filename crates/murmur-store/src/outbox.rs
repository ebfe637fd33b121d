//! Optimistic send lifecycle.
//!
//! Every outgoing post is tracked in a pending table keyed by its
//! [`CorrelationId`] until it settles:
//!
//! ```text
//! pending ──confirm──▶ (released)
//!    │
//!    └─fail──▶ failed ──retry──▶ pending
//!                 │
//!                 └─discard──▶ (released, removed from the timeline)
//! ```
//!
//! The outbox owns the table; the visible posts live in the [`PostStore`]
//! and are updated through its optimistic-post primitives.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use murmur_shared::constants::{SEND_FAILED_ERROR, SEND_TIMEOUT_ERROR};
use murmur_shared::models::{Delivery, Post, SendParams};
use murmur_shared::protocol::OutboundRequest;
use murmur_shared::types::{CorrelationId, PostId, UserId};

use crate::error::{Result, StoreError};
use crate::posts::PostStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendState {
    InFlight,
    Failed,
}

/// One outstanding send.
#[derive(Debug, Clone, Serialize)]
pub struct PendingSend {
    pub params: SendParams,
    /// Id of the optimistic post in the timeline.
    pub local_id: PostId,
    /// Logical millis at which the request was last issued.
    pub issued_at_ms: u64,
    pub state: SendState,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Outbox {
    pending: HashMap<CorrelationId, PendingSend>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a send: insert the optimistic post and return the request to
    /// issue. Returns `None` without touching any state when the params
    /// carry neither text nor files.
    pub fn send(
        &mut self,
        posts: &mut PostStore,
        author: UserId,
        author_display_name: String,
        params: SendParams,
        now_ms: u64,
        created_at_ms: i64,
    ) -> Option<(CorrelationId, OutboundRequest)> {
        if !params.is_sendable() {
            debug!(channel = %params.channel_id, "Skipping empty send");
            return None;
        }

        let mut pending_id = CorrelationId::new();
        while self.pending.contains_key(&pending_id) {
            pending_id = CorrelationId::new();
        }

        let post = Post::optimistic(
            pending_id,
            author,
            author_display_name,
            params.clone(),
            created_at_ms,
        );
        let local_id = post.id.clone();
        posts.insert_optimistic(post);

        self.pending.insert(
            pending_id,
            PendingSend {
                params: params.clone(),
                local_id,
                issued_at_ms: now_ms,
                state: SendState::InFlight,
            },
        );

        info!(pending_id = %pending_id, channel = %params.channel_id, "Send started");
        Some((pending_id, OutboundRequest::SendPost { pending_id, params }))
    }

    /// Settle a send with the canonical server post, replacing the
    /// optimistic post in place and releasing the correlation id.
    pub fn confirm(
        &mut self,
        posts: &mut PostStore,
        pending_id: CorrelationId,
        server_post: Post,
    ) -> Result<()> {
        let entry = self
            .pending
            .remove(&pending_id)
            .ok_or(StoreError::UnknownCorrelation(pending_id))?;

        let mut settled = server_post.into_settled();
        settled.pending_id = Some(pending_id);
        let server_id = settled.id.clone();

        if !posts.replace_in_place(&entry.local_id, settled) {
            debug!(pending_id = %pending_id, "Confirmed post is not visible");
        }
        info!(pending_id = %pending_id, post = %server_id, "Send confirmed");
        Ok(())
    }

    /// Mark a send as failed. The post stays visible with the error attached.
    /// A send whose post is no longer visible is released instead, since
    /// nothing could retry it.
    pub fn fail(
        &mut self,
        posts: &mut PostStore,
        pending_id: CorrelationId,
        message: Option<String>,
    ) -> Result<()> {
        let entry = self
            .pending
            .get_mut(&pending_id)
            .ok_or(StoreError::UnknownCorrelation(pending_id))?;

        let error = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| SEND_FAILED_ERROR.to_string());

        if posts.set_delivery(&entry.local_id, Delivery::Failed(error.clone())) {
            entry.state = SendState::Failed;
            warn!(pending_id = %pending_id, error = %error, "Send failed");
        } else {
            self.pending.remove(&pending_id);
            debug!(pending_id = %pending_id, "Released failed send with no visible post");
        }
        Ok(())
    }

    /// Re-issue a failed send with its original params under the same
    /// correlation id.
    pub fn retry(
        &mut self,
        posts: &mut PostStore,
        pending_id: CorrelationId,
        now_ms: u64,
    ) -> Result<OutboundRequest> {
        let entry = self
            .pending
            .get_mut(&pending_id)
            .ok_or(StoreError::UnknownCorrelation(pending_id))?;
        if entry.state != SendState::Failed {
            return Err(StoreError::NotRetryable(pending_id));
        }

        entry.state = SendState::InFlight;
        entry.issued_at_ms = now_ms;
        posts.set_delivery(&entry.local_id, Delivery::Pending);

        info!(pending_id = %pending_id, "Retrying send");
        Ok(OutboundRequest::SendPost {
            pending_id,
            params: entry.params.clone(),
        })
    }

    /// Drop a failed send and its post. The correlation id is released.
    pub fn discard(&mut self, posts: &mut PostStore, pending_id: CorrelationId) -> Result<()> {
        let entry = self
            .pending
            .get(&pending_id)
            .ok_or(StoreError::UnknownCorrelation(pending_id))?;
        if entry.state != SendState::Failed {
            return Err(StoreError::NotDiscardable(pending_id));
        }

        let local_id = entry.local_id.clone();
        self.pending.remove(&pending_id);
        posts.remove_post(&local_id);
        info!(pending_id = %pending_id, "Discarded failed send");
        Ok(())
    }

    /// Fail every in-flight send issued more than `timeout_ms` ago.
    pub fn expire(&mut self, posts: &mut PostStore, now_ms: u64, timeout_ms: u64) -> Vec<CorrelationId> {
        let expired: Vec<CorrelationId> = self
            .pending
            .iter()
            .filter(|(_, p)| {
                p.state == SendState::InFlight && now_ms.saturating_sub(p.issued_at_ms) > timeout_ms
            })
            .map(|(id, _)| *id)
            .collect();

        for pending_id in &expired {
            // The id was just read from the table, so this cannot miss.
            let _ = self.fail(posts, *pending_id, Some(SEND_TIMEOUT_ERROR.to_string()));
        }
        expired
    }

    pub fn contains(&self, pending_id: &CorrelationId) -> bool {
        self.pending.contains_key(pending_id)
    }

    pub fn get(&self, pending_id: &CorrelationId) -> Option<&PendingSend> {
        self.pending.get(pending_id)
    }

    /// Correlation id of the optimistic post `post_id`, if it is still
    /// outstanding.
    pub fn correlation_for(&self, post_id: &PostId) -> Option<CorrelationId> {
        self.pending
            .iter()
            .find(|(_, p)| &p.local_id == post_id)
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use murmur_shared::types::ChannelId;

    use super::*;

    fn setup() -> (Outbox, PostStore) {
        let mut posts = PostStore::new();
        posts.reset_for_channel(ChannelId::from("C1"));
        posts.set_posts(vec![], false);
        (Outbox::new(), posts)
    }

    fn params(message: &str) -> SendParams {
        SendParams {
            channel_id: ChannelId::from("C1"),
            message: message.to_string(),
            ..SendParams::default()
        }
    }

    fn server_post(id: &str, message: &str) -> Post {
        Post {
            id: PostId::from(id),
            channel_id: ChannelId::from("C1"),
            user_id: UserId::from("U1"),
            message: message.to_string(),
            ..Post::default()
        }
    }

    fn send(outbox: &mut Outbox, posts: &mut PostStore, message: &str) -> CorrelationId {
        let (pending_id, _) = outbox
            .send(posts, UserId::from("U1"), "alice".into(), params(message), 0, 0)
            .expect("sendable");
        pending_id
    }

    #[test]
    fn test_send_inserts_pending_post() {
        let (mut outbox, mut posts) = setup();
        let (pending_id, request) = outbox
            .send(&mut posts, UserId::from("U1"), "alice".into(), params("hello"), 0, 0)
            .unwrap();

        assert_eq!(posts.posts().len(), 1);
        assert!(posts.posts()[0].is_pending());
        assert_eq!(posts.posts()[0].send_params, Some(params("hello")));
        assert_eq!(
            request,
            OutboundRequest::SendPost {
                pending_id,
                params: params("hello")
            }
        );
    }

    #[test]
    fn test_empty_send_is_noop() {
        let (mut outbox, mut posts) = setup();
        let result = outbox.send(&mut posts, UserId::from("U1"), "alice".into(), params("  "), 0, 0);
        assert!(result.is_none());
        assert!(posts.posts().is_empty());
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_confirm_replaces_in_place() {
        let (mut outbox, mut posts) = setup();
        posts.prepend_new_post(server_post("older", "first"));
        let pending_id = send(&mut outbox, &mut posts, "hello");
        posts.prepend_new_post(server_post("newer", "third"));

        outbox
            .confirm(&mut posts, pending_id, server_post("srv_42", "hello"))
            .unwrap();

        let ids: Vec<&str> = posts.posts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "srv_42", "older"]);
        assert!(posts.posts()[1].is_settled());
        assert!(posts.posts()[1].send_params.is_none());
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_fail_retry_confirm_leaves_no_residue() {
        let (mut outbox, mut posts) = setup();
        let pending_id = send(&mut outbox, &mut posts, "hello");

        outbox
            .fail(&mut posts, pending_id, Some("network down".into()))
            .unwrap();
        assert_eq!(posts.posts()[0].failed_error(), Some("network down"));
        assert!(!posts.posts()[0].is_pending());

        let request = outbox.retry(&mut posts, pending_id, 10).unwrap();
        assert!(matches!(request, OutboundRequest::SendPost { pending_id: id, .. } if id == pending_id));
        assert!(posts.posts()[0].is_pending());
        assert!(posts.posts()[0].failed_error().is_none());

        outbox
            .confirm(&mut posts, pending_id, server_post("srv_42", "hello"))
            .unwrap();
        assert_eq!(posts.posts().len(), 1);
        assert_eq!(posts.posts()[0].id, PostId::from("srv_42"));
        assert!(posts.posts()[0].is_settled());
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_retry_requires_failure() {
        let (mut outbox, mut posts) = setup();
        let pending_id = send(&mut outbox, &mut posts, "hello");
        assert_eq!(
            outbox.retry(&mut posts, pending_id, 0),
            Err(StoreError::NotRetryable(pending_id))
        );
        assert_eq!(
            outbox.discard(&mut posts, pending_id),
            Err(StoreError::NotDiscardable(pending_id))
        );
    }

    #[test]
    fn test_discard_removes_post_and_releases_id() {
        let (mut outbox, mut posts) = setup();
        let pending_id = send(&mut outbox, &mut posts, "hello");
        outbox.fail(&mut posts, pending_id, None).unwrap();
        assert_eq!(posts.posts()[0].failed_error(), Some(SEND_FAILED_ERROR));

        outbox.discard(&mut posts, pending_id).unwrap();
        assert!(posts.posts().is_empty());
        assert!(!outbox.contains(&pending_id));

        let next = send(&mut outbox, &mut posts, "again");
        assert_ne!(next, pending_id);
        assert_eq!(
            outbox.confirm(&mut posts, pending_id, server_post("srv_1", "hello")),
            Err(StoreError::UnknownCorrelation(pending_id))
        );
    }

    #[test]
    fn test_confirm_after_echo_keeps_single_copy() {
        let (mut outbox, mut posts) = setup();
        let pending_id = send(&mut outbox, &mut posts, "hello");
        posts.prepend_new_post(server_post("srv_42", "hello"));
        assert_eq!(posts.posts().len(), 2);

        outbox
            .confirm(&mut posts, pending_id, server_post("srv_42", "hello"))
            .unwrap();
        assert_eq!(posts.posts().len(), 1);
        assert_eq!(posts.posts()[0].id, PostId::from("srv_42"));
    }

    #[test]
    fn test_expire_fails_stale_sends() {
        let (mut outbox, mut posts) = setup();
        let pending_id = send(&mut outbox, &mut posts, "hello");

        assert!(outbox.expire(&mut posts, 1_000, 60_000).is_empty());
        assert_eq!(outbox.expire(&mut posts, 60_001, 60_000), vec![pending_id]);
        assert_eq!(posts.posts()[0].failed_error(), Some(SEND_TIMEOUT_ERROR));
        assert!(outbox.expire(&mut posts, 120_000, 60_000).is_empty());
    }

    #[test]
    fn test_failure_for_invisible_post_releases_entry() {
        let (mut outbox, mut posts) = setup();
        let pending_id = send(&mut outbox, &mut posts, "hello");
        posts.reset_for_channel(ChannelId::from("C2"));

        outbox.fail(&mut posts, pending_id, None).unwrap();
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_correlation_lookup_by_post() {
        let (mut outbox, mut posts) = setup();
        let pending_id = send(&mut outbox, &mut posts, "hello");
        let local_id = posts.posts()[0].id.clone();
        assert_eq!(outbox.correlation_for(&local_id), Some(pending_id));
        assert_eq!(outbox.correlation_for(&PostId::from("srv_1")), None);
    }
}
