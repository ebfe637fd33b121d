//! The chat state engine.
//!
//! A [`ChatEngine`] owns the state container, the logical clock and the
//! request sink. Inbound events go through [`ChatEngine::handle_event`] (or
//! [`ChatEngine::handle_json`] for raw host payloads); user intents are the
//! methods in [`crate::commands`]. Every call runs to completion before the
//! next one starts.

use tracing::{debug, info, trace, warn};

use murmur_shared::protocol::{InboundEvent, OutboundRequest};
use murmur_shared::types::UserId;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::RequestSink;
use crate::router::{self, RouteContext};
use crate::scheduler::{Fired, Scheduler, Task};
use crate::snapshot::Snapshot;
use crate::state::EngineState;
use crate::throttle::TypingThrottle;

pub struct ChatEngine<S: RequestSink> {
    pub(crate) state: EngineState,
    pub(crate) sink: S,
    pub(crate) scheduler: Scheduler,
    pub(crate) throttle: TypingThrottle,
    pub(crate) config: EngineConfig,
    pub(crate) me: UserId,
    pub(crate) display_name: String,
}

impl<S: RequestSink> ChatEngine<S> {
    /// Build an engine for the signed-in user `me`. The typing sweep and the
    /// send timeout check are scheduled immediately.
    pub fn new(me: UserId, display_name: impl Into<String>, config: EngineConfig, sink: S) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(config.sweep_interval_ms, Task::SweepTyping);
        if config.send_timeout_ms > 0 {
            scheduler.schedule_every(config.sweep_interval_ms, Task::ExpireSends);
        }

        info!(user = %me, "Chat engine created");
        Self {
            state: EngineState::new(config.typing_ttl_ms),
            sink,
            scheduler,
            throttle: TypingThrottle::new(config.typing_throttle_ms),
            config,
            me,
            display_name: display_name.into(),
        }
    }

    // ------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------

    /// Decode and apply a raw host payload. Returns `Ok(false)` for tags
    /// this engine does not know. A malformed payload leaves the state
    /// untouched and is reported as an error; later events are unaffected.
    pub fn handle_json(&mut self, json: &str) -> Result<bool> {
        match InboundEvent::decode(json) {
            Ok(Some(event)) => {
                self.handle_event(event);
                Ok(true)
            }
            Ok(None) => {
                debug!("Ignoring event with unknown tag");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed event");
                Err(e.into())
            }
        }
    }

    pub fn handle_event(&mut self, event: InboundEvent) {
        trace!(event = event.tag(), "Applying event");
        let ctx = RouteContext {
            me: &self.me,
            now_ms: self.scheduler.now_ms(),
        };
        router::apply(&mut self.state, &ctx, event);
    }

    // ------------------------------------------------------------------
    // Time
    // ------------------------------------------------------------------

    /// Move the logical clock to `now_ms`, running every timer that came
    /// due at the time it was due. Returns how many timers ran.
    pub fn advance_to(&mut self, now_ms: u64) -> usize {
        let fired = self.scheduler.advance_to(now_ms);
        let count = fired.len();
        for task in fired {
            self.run_task(task);
        }
        count
    }

    pub fn advance_by(&mut self, delta_ms: u64) -> usize {
        self.advance_to(self.scheduler.now_ms().saturating_add(delta_ms))
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    fn run_task(&mut self, fired: Fired) {
        match fired.task {
            Task::SweepTyping => {
                self.state.presence.clear_stale_typing(fired.at_ms);
                self.throttle.purge_stale(fired.at_ms);
            }
            Task::ExpireSends => {
                let expired =
                    self.state
                        .outbox
                        .expire(&mut self.state.posts, fired.at_ms, self.config.send_timeout_ms);
                if !expired.is_empty() {
                    warn!(count = expired.len(), "Sends timed out");
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    /// Returns `false` if the sink did not accept the request.
    pub(crate) fn issue(&mut self, request: OutboundRequest) -> bool {
        self.sink.issue(request)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn user_id(&self) -> &UserId {
        &self.me
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
