//! User intents.
//!
//! Each sub-module adds an `impl` block to [`ChatEngine`](crate::engine::ChatEngine)
//! for one domain. A command mutates state synchronously and issues at most
//! a few outbound requests; it never waits for their outcome.

pub mod channels;
pub mod messaging;
pub mod presence;
pub mod reactions;
