use murmur_shared::protocol::OutboundRequest;
use murmur_shared::types::{ChannelId, PostId};

use crate::engine::ChatEngine;
use crate::events::RequestSink;

impl<S: RequestSink> ChatEngine<S> {
    /// The user typed in a compose box. At most one typing signal goes out
    /// per throttle window for each (channel, thread) pair; returns whether
    /// this call issued one.
    pub fn user_typing(&mut self, channel_id: ChannelId, root_id: Option<PostId>) -> bool {
        let now = self.scheduler.now_ms();
        if !self.throttle.check((channel_id.clone(), root_id.clone()), now) {
            return false;
        }
        self.issue(OutboundRequest::Typing {
            channel_id,
            root_id,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use murmur_shared::models::SendParams;
    use murmur_shared::types::UserId;

    use crate::config::EngineConfig;

    use super::*;

    fn engine() -> ChatEngine<Vec<OutboundRequest>> {
        ChatEngine::new(UserId::from("me"), "Me", EngineConfig::default(), Vec::new())
    }

    #[test]
    fn test_typing_signals_are_throttled() {
        let mut engine = engine();
        let c1 = ChannelId::from("C1");

        assert!(engine.user_typing(c1.clone(), None));
        engine.advance_to(1_000);
        assert!(!engine.user_typing(c1.clone(), None));
        assert!(engine.user_typing(c1.clone(), Some(PostId::from("root"))));
        engine.advance_to(3_000);
        assert!(engine.user_typing(c1, None));

        let typing = engine
            .sink()
            .iter()
            .filter(|r| matches!(r, OutboundRequest::Typing { .. }))
            .count();
        assert_eq!(typing, 3);
    }

    #[test]
    fn test_sending_reopens_the_window() {
        let mut engine = engine();
        engine.select_channel(ChannelId::from("C1"));
        assert!(engine.user_typing(ChannelId::from("C1"), None));
        engine.send_post(SendParams {
            channel_id: ChannelId::from("C1"),
            message: "done".into(),
            ..SendParams::default()
        });
        assert!(engine.user_typing(ChannelId::from("C1"), None));
    }
}
