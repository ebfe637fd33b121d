use thiserror::Error;

use murmur_shared::types::{CorrelationId, PostId};

/// Errors produced by the store layer.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// No outstanding send is registered under this correlation id.
    #[error("Unknown correlation id: {0}")]
    UnknownCorrelation(CorrelationId),

    /// Only failed sends can be retried.
    #[error("Send {0} is not in a failed state, cannot retry")]
    NotRetryable(CorrelationId),

    /// Only failed sends can be discarded.
    #[error("Send {0} is still in flight, cannot discard")]
    NotDiscardable(CorrelationId),

    /// The post is not part of the timeline or the open thread.
    #[error("Post not found: {0}")]
    PostNotFound(PostId),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
