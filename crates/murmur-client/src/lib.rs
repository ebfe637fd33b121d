//! # murmur-client
//!
//! Client-side state engine for a team chat service. The engine consumes
//! tagged events from a host transport, keeps the selected channel's
//! timeline, threads, reactions, presence and unread counters, and issues
//! fire-and-forget requests back to the host.

pub mod bridge;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod router;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod throttle;

use tracing_subscriber::{fmt, EnvFilter};

pub use bridge::{outbound_channel, spawn_engine, EngineCommand, EngineHandle};
pub use config::EngineConfig;
pub use engine::ChatEngine;
pub use error::{EngineError, Result};
pub use events::{ChannelSink, RequestSink};
pub use snapshot::Snapshot;
pub use state::EngineState;

/// Install a global `fmt` subscriber on stderr filtered by `RUST_LOG`, or by
/// `default_directives` when it is unset. Does nothing if a subscriber is
/// already set.
pub fn init_tracing(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_keeps_first_subscriber() {
        init_tracing("murmur_client=debug,warn");
        init_tracing("off");
        tracing::debug!("still logging");
    }
}
