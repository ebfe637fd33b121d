//! # murmur-store
//!
//! In-memory state components of the Murmur engine.
//!
//! Each component is a plain synchronous struct with its own mutators and
//! read accessors. None of them reaches into another's collections; the
//! engine composes them and decides which one an event touches.

pub mod channels;
pub mod connection;
pub mod outbox;
pub mod posts;
pub mod presence;
pub mod reactions;
pub mod unread;

mod error;

pub use channels::ChannelStore;
pub use connection::ConnectionSignal;
pub use error::{Result, StoreError};
pub use outbox::{Outbox, PendingSend, SendState};
pub use posts::{FetchFailure, PostStore, SearchState, ThreadView, Timeline};
pub use presence::{PresenceTracker, TypingEntry};
pub use reactions::ReactionStore;
pub use unread::UnreadTracker;
