use chrono::Utc;
use tracing::{debug, info};

use murmur_shared::constants::SEND_NOT_ISSUED_ERROR;
use murmur_shared::models::SendParams;
use murmur_shared::protocol::OutboundRequest;
use murmur_shared::types::{CorrelationId, PostId};
use murmur_store::StoreError;

use crate::engine::ChatEngine;
use crate::error::Result;
use crate::events::RequestSink;

impl<S: RequestSink> ChatEngine<S> {
    /// Send a post optimistically. The pending post is visible before this
    /// returns. Returns `None` and does nothing if `params` carry neither text
    /// nor files.
    pub fn send_post(&mut self, params: SendParams) -> Option<CorrelationId> {
        let compose = (params.channel_id.clone(), params.root_id.clone());
        let (pending_id, request) = self.state.outbox.send(
            &mut self.state.posts,
            self.me.clone(),
            self.display_name.clone(),
            params,
            self.scheduler.now_ms(),
            Utc::now().timestamp_millis(),
        )?;
        self.throttle.reset(&compose);
        self.issue_send(pending_id, request);
        Some(pending_id)
    }

    /// Reply in the open thread, or to the current reply target. A target
    /// that is itself a reply resolves to the root of its thread.
    pub fn send_reply(&mut self, message: impl Into<String>, file_ids: Vec<String>) -> Option<CorrelationId> {
        let posts = &self.state.posts;
        let root_id = match posts.reply_target() {
            Some(target) => posts
                .get(target)
                .map(|p| p.thread_root())
                .unwrap_or(target)
                .clone(),
            None => posts.thread_root().cloned()?,
        };
        let channel_id = self.state.posts.channel_id().cloned()?;
        let sent = self.send_post(SendParams {
            channel_id,
            message: message.into(),
            root_id: Some(root_id),
            file_ids,
        });
        if sent.is_some() {
            self.state.posts.clear_reply_target();
        }
        sent
    }

    /// Re-issue a failed post with its original parameters.
    pub fn retry_post(&mut self, post_id: &PostId) -> Result<()> {
        let pending_id = self
            .state
            .outbox
            .correlation_for(post_id)
            .ok_or_else(|| StoreError::PostNotFound(post_id.clone()))?;
        let request = self
            .state
            .outbox
            .retry(&mut self.state.posts, pending_id, self.scheduler.now_ms())?;
        self.issue_send(pending_id, request);
        Ok(())
    }

    /// Issue a send request. A request the sink refuses fails its post right
    /// away so it can be retried.
    fn issue_send(&mut self, pending_id: CorrelationId, request: OutboundRequest) {
        if !self.issue(request) {
            // The entry was created or re-armed just before this call.
            let _ = self.state.outbox.fail(
                &mut self.state.posts,
                pending_id,
                Some(SEND_NOT_ISSUED_ERROR.to_string()),
            );
        }
    }

    /// Drop a failed post from the timeline and thread.
    pub fn discard_post(&mut self, post_id: &PostId) -> Result<()> {
        let pending_id = self
            .state
            .outbox
            .correlation_for(post_id)
            .ok_or_else(|| StoreError::PostNotFound(post_id.clone()))?;
        self.state.outbox.discard(&mut self.state.posts, pending_id)?;
        Ok(())
    }

    /// Search posts in the selected team. Blank terms are ignored.
    pub fn search(&mut self, terms: &str) -> bool {
        let terms = terms.trim();
        if terms.is_empty() {
            debug!("Skipping blank search");
            return false;
        }
        info!(terms, "Searching");
        self.state.posts.begin_search(terms.to_string());
        self.issue(OutboundRequest::Search {
            team_id: self.state.channels.selected_team().cloned(),
            terms: terms.to_string(),
        });
        true
    }

    pub fn clear_search(&mut self) {
        self.state.posts.clear_search();
    }
}

#[cfg(test)]
mod tests {
    use murmur_shared::models::Post;
    use murmur_shared::protocol::{
        InboundEvent, PostsBody, SearchResultsBody, SendConfirmedBody, SendFailedBody, ThreadBody,
    };
    use murmur_shared::types::{ChannelId, TeamId, UserId};

    use crate::config::EngineConfig;
    use crate::error::EngineError;

    use super::*;

    fn engine_on_c1() -> ChatEngine<Vec<OutboundRequest>> {
        let mut engine =
            ChatEngine::new(UserId::from("me"), "Me", EngineConfig::default(), Vec::new());
        engine.select_channel(ChannelId::from("C1"));
        engine.handle_event(InboundEvent::Posts(PostsBody {
            channel_id: Some(ChannelId::from("C1")),
            posts: vec![Post {
                id: PostId::from("root"),
                channel_id: ChannelId::from("C1"),
                ..Post::default()
            }],
            has_more: false,
        }));
        engine.sink_mut().clear();
        engine
    }

    fn params(message: &str) -> SendParams {
        SendParams {
            channel_id: ChannelId::from("C1"),
            message: message.into(),
            ..SendParams::default()
        }
    }

    fn fail(engine: &mut ChatEngine<Vec<OutboundRequest>>, pending_id: CorrelationId) {
        engine.handle_event(InboundEvent::SendFailed(SendFailedBody {
            pending_id,
            message: None,
        }));
    }

    #[test]
    fn test_blank_send_is_noop() {
        let mut engine = engine_on_c1();
        assert!(engine.send_post(params("   ")).is_none());
        assert!(engine.sink().is_empty());
        assert_eq!(engine.state().posts.posts().len(), 1);
    }

    #[test]
    fn test_file_only_send_is_valid() {
        let mut engine = engine_on_c1();
        let sent = engine.send_post(SendParams {
            file_ids: vec!["f1".into()],
            ..params("")
        });
        assert!(sent.is_some());
        assert_eq!(engine.state().posts.posts()[0].file_ids, vec!["f1".to_string()]);
    }

    #[test]
    fn test_discard_removes_from_timeline_and_thread() {
        let mut engine = engine_on_c1();
        engine.open_thread(PostId::from("root"));
        let pending_id = engine
            .send_post(SendParams {
                root_id: Some(PostId::from("root")),
                ..params("a reply")
            })
            .unwrap();
        let local_id = pending_id.to_local_post_id();
        assert!(engine.state().posts.thread_posts().iter().any(|p| p.id == local_id));

        fail(&mut engine, pending_id);
        engine.discard_post(&local_id).unwrap();

        assert!(!engine.state().posts.contains(&local_id));
        assert!(engine.state().posts.thread_posts().iter().all(|p| p.id != local_id));

        let next = engine.send_post(params("again")).unwrap();
        assert_ne!(next, pending_id);

        // A late confirmation for the discarded send changes nothing.
        engine.handle_event(InboundEvent::SendConfirmed(SendConfirmedBody {
            pending_id,
            post: Post {
                id: PostId::from("srv_9"),
                channel_id: ChannelId::from("C1"),
                ..Post::default()
            },
        }));
        assert!(!engine.state().posts.contains(&PostId::from("srv_9")));
    }

    #[test]
    fn test_retry_and_discard_need_a_failed_post() {
        let mut engine = engine_on_c1();
        let pending_id = engine.send_post(params("hello")).unwrap();
        let local_id = pending_id.to_local_post_id();

        assert!(matches!(
            engine.retry_post(&local_id),
            Err(EngineError::Store(StoreError::NotRetryable(_)))
        ));
        assert!(matches!(
            engine.discard_post(&PostId::from("root")),
            Err(EngineError::Store(StoreError::PostNotFound(_)))
        ));

        fail(&mut engine, pending_id);
        engine.sink_mut().clear();
        engine.retry_post(&local_id).unwrap();
        assert!(engine.state().posts.posts()[0].is_pending());
        assert_eq!(
            engine.sink().as_slice(),
            &[OutboundRequest::SendPost {
                pending_id,
                params: params("hello")
            }]
        );
    }

    #[test]
    fn test_send_reply_uses_reply_target() {
        let mut engine = engine_on_c1();
        engine.set_reply_target(PostId::from("root"));
        engine.send_reply("on it", vec![]).unwrap();

        assert!(engine.state().posts.reply_target().is_none());
        assert!(matches!(
            engine.sink().last(),
            Some(OutboundRequest::SendPost { params, .. })
                if params.root_id == Some(PostId::from("root"))
        ));
        assert!(engine.send_reply("nowhere", vec![]).is_none());
    }

    #[test]
    fn test_search_round_trip() {
        let mut engine = engine_on_c1();
        engine.select_team(TeamId::from("T1"));
        assert!(!engine.search("  "));
        assert!(engine.search(" deploy "));
        assert!(matches!(
            engine.sink().last(),
            Some(OutboundRequest::Search { team_id: Some(team), terms })
                if team.as_str() == "T1" && terms == "deploy"
        ));

        engine.handle_event(InboundEvent::SearchResults(SearchResultsBody {
            query: "deploy".into(),
            posts: vec![Post {
                id: PostId::from("hit"),
                ..Post::default()
            }],
        }));
        assert_eq!(engine.snapshot().search.unwrap().results.len(), 1);

        engine.clear_search();
        assert!(engine.snapshot().search.is_none());
    }

    #[test]
    fn test_reply_to_a_reply_targets_thread_root() {
        let mut engine = engine_on_c1();
        engine.open_thread(PostId::from("root"));
        engine.handle_event(InboundEvent::Thread(ThreadBody {
            root_id: PostId::from("root"),
            posts: vec![
                Post {
                    id: PostId::from("root"),
                    channel_id: ChannelId::from("C1"),
                    ..Post::default()
                },
                Post {
                    id: PostId::from("r1"),
                    channel_id: ChannelId::from("C1"),
                    root_id: PostId::from("root"),
                    ..Post::default()
                },
            ],
        }));
        engine.set_reply_target(PostId::from("r1"));
        engine.sink_mut().clear();

        let pending_id = engine.send_reply("hi", vec![]).unwrap();

        assert!(matches!(
            engine.sink().as_slice(),
            [OutboundRequest::SendPost { params, .. }]
                if params.root_id == Some(PostId::from("root"))
        ));
        let local_id = pending_id.to_local_post_id();
        let thread: Vec<&str> = engine
            .state()
            .posts
            .thread_posts()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(thread, vec!["root", "r1", local_id.as_str()]);
    }

    #[test]
    fn test_refused_send_fails_immediately() {
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        drop(rx);
        let mut engine = ChatEngine::new(
            UserId::from("me"),
            "Me",
            EngineConfig::default(),
            crate::events::ChannelSink::new(tx),
        );
        engine.select_channel(ChannelId::from("C1"));

        let pending_id = engine.send_post(params("hello")).unwrap();
        let local_id = pending_id.to_local_post_id();
        let post = engine.state().posts.get(&local_id).unwrap();
        assert_eq!(post.failed_error(), Some(SEND_NOT_ISSUED_ERROR));

        // Retrying against the same closed sink fails again without panicking.
        engine.retry_post(&local_id).unwrap();
        assert_eq!(
            engine.state().posts.get(&local_id).unwrap().failed_error(),
            Some(SEND_NOT_ISSUED_ERROR)
        );
        assert_eq!(engine.snapshot().outstanding_sends, 1);
    }
}
