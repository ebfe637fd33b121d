use tracing::debug;

use murmur_shared::models::Reaction;
use murmur_shared::protocol::OutboundRequest;
use murmur_shared::types::PostId;

use crate::engine::ChatEngine;
use crate::events::RequestSink;

impl<S: RequestSink> ChatEngine<S> {
    /// Add the current user's `emoji_name` reaction to a post, or remove it
    /// if already present. Applied locally right away.
    ///
    /// Returns `Some(true)` when added, `Some(false)` when removed and `None`
    /// when the emoji name is blank.
    pub fn toggle_reaction(&mut self, post_id: PostId, emoji_name: &str) -> Option<bool> {
        let emoji_name = emoji_name.trim();
        if emoji_name.is_empty() || post_id.is_empty() {
            debug!("Skipping reaction without post or emoji");
            return None;
        }

        let reaction = Reaction {
            post_id: post_id.clone(),
            user_id: self.me.clone(),
            emoji_name: emoji_name.to_string(),
            user_display_name: self.display_name.clone(),
        };

        if self.state.reactions.has_reacted(&post_id, &self.me, emoji_name) {
            self.state.reactions.remove_reaction(&reaction);
            self.issue(OutboundRequest::RemoveReaction {
                post_id,
                emoji_name: reaction.emoji_name,
            });
            Some(false)
        } else {
            self.state.reactions.add_reaction(reaction.clone());
            self.issue(OutboundRequest::AddReaction {
                post_id,
                emoji_name: reaction.emoji_name,
            });
            Some(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use murmur_shared::models::Post;
    use murmur_shared::protocol::{InboundEvent, PostsBody, ReactionBody};
    use murmur_shared::types::{ChannelId, UserId};

    use crate::config::EngineConfig;

    use super::*;

    /// Engine on C1 with post p1 loaded.
    fn engine() -> ChatEngine<Vec<OutboundRequest>> {
        let mut engine =
            ChatEngine::new(UserId::from("me"), "Me", EngineConfig::default(), Vec::new());
        engine.select_channel(ChannelId::from("C1"));
        engine.handle_event(InboundEvent::Posts(PostsBody {
            channel_id: Some(ChannelId::from("C1")),
            posts: vec![Post {
                id: PostId::from("p1"),
                channel_id: ChannelId::from("C1"),
                ..Post::default()
            }],
            has_more: false,
        }));
        engine.sink_mut().clear();
        engine
    }

    #[test]
    fn test_toggle_twice_restores_previous_set() {
        let mut engine = engine();
        engine.handle_event(InboundEvent::ReactionAdded(ReactionBody {
            reaction: Reaction {
                post_id: PostId::from("p1"),
                user_id: UserId::from("U2"),
                emoji_name: "tada".into(),
                ..Reaction::default()
            },
        }));
        let before = engine.state().reactions.clone();

        assert_eq!(engine.toggle_reaction(PostId::from("p1"), "tada"), Some(true));
        assert_eq!(engine.state().reactions.counts_for(&PostId::from("p1")), vec![("tada".to_string(), 2)]);
        assert_eq!(engine.toggle_reaction(PostId::from("p1"), "tada"), Some(false));

        assert_eq!(engine.state().reactions, before);
        assert!(matches!(
            engine.sink().as_slice(),
            [OutboundRequest::AddReaction { .. }, OutboundRequest::RemoveReaction { .. }]
        ));
    }

    #[test]
    fn test_toggle_on_untouched_post_leaves_no_entry() {
        let mut engine = engine();
        engine.toggle_reaction(PostId::from("p1"), "eyes");
        engine.toggle_reaction(PostId::from("p1"), "eyes");
        assert!(engine.state().reactions.is_empty());
    }

    #[test]
    fn test_host_echo_is_idempotent() {
        let mut engine = engine();
        engine.toggle_reaction(PostId::from("p1"), "eyes");
        engine.handle_event(InboundEvent::ReactionAdded(ReactionBody {
            reaction: Reaction {
                post_id: PostId::from("p1"),
                user_id: UserId::from("me"),
                emoji_name: "eyes".into(),
                user_display_name: "Me".into(),
            },
        }));
        assert_eq!(engine.state().reactions.reactions_for(&PostId::from("p1")).len(), 1);
    }

    #[test]
    fn test_blank_emoji_is_skipped() {
        let mut engine = engine();
        assert_eq!(engine.toggle_reaction(PostId::from("p1"), " "), None);
        assert!(engine.sink().is_empty());
    }
}
