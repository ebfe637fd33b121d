//! Outbound side of the host boundary.
//!
//! The engine never awaits a request. It hands each one to a
//! [`RequestSink`] and moves on; the outcome arrives later as an inbound
//! event.

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use murmur_shared::protocol::OutboundRequest;

/// Function the host provides for issuing requests.
pub trait RequestSink {
    /// Hand `request` to the host. Returns `false` if it was not accepted.
    fn issue(&mut self, request: OutboundRequest) -> bool;
}

/// Collects requests in memory.
impl RequestSink for Vec<OutboundRequest> {
    fn issue(&mut self, request: OutboundRequest) -> bool {
        self.push(request);
        true
    }
}

/// Forwards requests to the host over a bounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<OutboundRequest>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<OutboundRequest>) -> Self {
        Self { tx }
    }
}

impl RequestSink for ChannelSink {
    fn issue(&mut self, request: OutboundRequest) -> bool {
        let tag = request.tag();
        match self.tx.try_send(request) {
            Ok(()) => {
                debug!(request = tag, "Issued request");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(request = tag, "Outbound queue full, dropping request");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(request = tag, "Host stopped accepting requests");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use murmur_shared::types::ChannelId;

    use super::*;

    fn mark_read(id: &str) -> OutboundRequest {
        OutboundRequest::MarkRead {
            channel_id: ChannelId::from(id),
        }
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx);
        assert!(sink.issue(mark_read("C1")));
        assert_eq!(rx.recv().await, Some(mark_read("C1")));
    }

    #[tokio::test]
    async fn test_channel_sink_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut sink = ChannelSink::new(tx);
        assert!(sink.issue(mark_read("C1")));
        assert!(!sink.issue(mark_read("C2")));
        assert_eq!(rx.recv().await, Some(mark_read("C1")));
        assert!(rx.try_recv().is_err());

        drop(rx);
        assert!(!sink.issue(mark_read("C3")));
    }
}
