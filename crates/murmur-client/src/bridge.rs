//! Async host bridge.
//!
//! The engine runs in a dedicated tokio task. The host feeds it raw inbound
//! events and user commands through an [`EngineHandle`], receives outbound
//! requests on the receiver from [`outbound_channel`], and observes state
//! through a `watch` channel that carries a fresh [`Snapshot`] after every
//! change.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use murmur_shared::models::SendParams;
use murmur_shared::protocol::OutboundRequest;
use murmur_shared::types::{ChannelId, PostId, TeamId};

use crate::config::EngineConfig;
use crate::engine::ChatEngine;
use crate::error::{EngineError, Result};
use crate::events::{ChannelSink, RequestSink};
use crate::snapshot::Snapshot;

// ---------------------------------------------------------------------------
// Command types
// ---------------------------------------------------------------------------

/// User intents, as the host sends them into the engine task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EngineCommand {
    SelectTeam {
        team_id: TeamId,
    },
    SelectChannel {
        channel_id: ChannelId,
    },
    MarkRead {
        channel_id: ChannelId,
    },
    LoadOlderPosts,
    SetFavorite {
        channel_id: ChannelId,
        favorite: bool,
    },
    OpenThread {
        root_id: PostId,
    },
    CloseThread,
    SetReplyTarget {
        post_id: PostId,
    },
    ClearReplyTarget,
    SendPost(SendParams),
    SendReply {
        message: String,
        #[serde(default)]
        file_ids: Vec<String>,
    },
    RetryPost {
        post_id: PostId,
    },
    DiscardPost {
        post_id: PostId,
    },
    ToggleReaction {
        post_id: PostId,
        emoji_name: String,
    },
    UserTyping {
        channel_id: ChannelId,
        #[serde(default)]
        root_id: Option<PostId>,
    },
    Search {
        terms: String,
    },
    ClearSearch,
    /// Move the logical clock forward on top of wall-clock time.
    Advance {
        ms: u64,
    },
    /// Stop the engine task.
    Shutdown,
}

impl<S: RequestSink> ChatEngine<S> {
    /// Run one command. `Shutdown` is a no-op outside the bridge.
    pub fn execute(&mut self, command: EngineCommand) -> Result<()> {
        match command {
            EngineCommand::SelectTeam { team_id } => self.select_team(team_id),
            EngineCommand::SelectChannel { channel_id } => self.select_channel(channel_id),
            EngineCommand::MarkRead { channel_id } => self.mark_read(channel_id),
            EngineCommand::LoadOlderPosts => {
                self.load_older_posts();
            }
            EngineCommand::SetFavorite {
                channel_id,
                favorite,
            } => self.set_favorite(channel_id, favorite),
            EngineCommand::OpenThread { root_id } => self.open_thread(root_id),
            EngineCommand::CloseThread => self.close_thread(),
            EngineCommand::SetReplyTarget { post_id } => self.set_reply_target(post_id),
            EngineCommand::ClearReplyTarget => self.clear_reply_target(),
            EngineCommand::SendPost(params) => {
                self.send_post(params);
            }
            EngineCommand::SendReply { message, file_ids } => {
                self.send_reply(message, file_ids);
            }
            EngineCommand::RetryPost { post_id } => self.retry_post(&post_id)?,
            EngineCommand::DiscardPost { post_id } => self.discard_post(&post_id)?,
            EngineCommand::ToggleReaction {
                post_id,
                emoji_name,
            } => {
                self.toggle_reaction(post_id, &emoji_name);
            }
            EngineCommand::UserTyping {
                channel_id,
                root_id,
            } => {
                self.user_typing(channel_id, root_id);
            }
            EngineCommand::Search { terms } => {
                self.search(&terms);
            }
            EngineCommand::ClearSearch => self.clear_search(),
            EngineCommand::Advance { ms } => {
                self.advance_by(ms);
            }
            EngineCommand::Shutdown => {}
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

enum Input {
    Event(String),
    Command(EngineCommand),
    Snapshot(oneshot::Sender<Snapshot>),
}

/// Cloneable sender side of a running engine task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Input>,
}

impl EngineHandle {
    /// Queue a raw inbound event payload.
    pub async fn send_event(&self, json: impl Into<String>) -> Result<()> {
        self.send(Input::Event(json.into())).await
    }

    pub async fn command(&self, command: EngineCommand) -> Result<()> {
        self.send(Input::Command(command)).await
    }

    /// Snapshot taken after every input queued before this call.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Input::Snapshot(reply_tx)).await?;
        reply_rx.await.map_err(|_| EngineError::Closed)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.command(EngineCommand::Shutdown).await
    }

    async fn send(&self, input: Input) -> Result<()> {
        self.tx.send(input).await.map_err(|_| EngineError::Closed)
    }
}

/// Channel on which the engine issues its outbound requests.
pub fn outbound_channel(config: &EngineConfig) -> (ChannelSink, mpsc::Receiver<OutboundRequest>) {
    let (tx, rx) = mpsc::channel(config.event_buffer);
    (ChannelSink::new(tx), rx)
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Move `engine` into a tokio task. The task ends on `Shutdown` or once
/// every handle is dropped, and hands the engine back through the
/// `JoinHandle`.
pub fn spawn_engine<S>(
    engine: ChatEngine<S>,
) -> (EngineHandle, watch::Receiver<Snapshot>, JoinHandle<ChatEngine<S>>)
where
    S: RequestSink + Send + 'static,
{
    let buffer = engine.config().event_buffer;
    let (tx, rx) = mpsc::channel(buffer);
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());

    let task = tokio::spawn(run(engine, rx, snapshot_tx));
    (EngineHandle { tx }, snapshot_rx, task)
}

async fn run<S: RequestSink>(
    mut engine: ChatEngine<S>,
    mut rx: mpsc::Receiver<Input>,
    snapshot_tx: watch::Sender<Snapshot>,
) -> ChatEngine<S> {
    let started = Instant::now();
    let mut offset_ms: u64 = 0;
    let clock = |offset_ms: u64| {
        u64::try_from(started.elapsed().as_millis())
            .unwrap_or(u64::MAX)
            .saturating_add(offset_ms)
    };

    let mut tick = tokio::time::interval(Duration::from_millis(engine.config().sweep_interval_ms));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Engine task started");

    loop {
        let input = tokio::select! {
            input = rx.recv() => match input {
                Some(input) => Some(input),
                None => {
                    info!("All engine handles dropped, stopping");
                    break;
                }
            },
            _ = tick.tick() => None,
        };

        let mut changed = engine.advance_to(clock(offset_ms)) > 0;

        match input {
            None => {}
            Some(Input::Event(json)) => {
                // Malformed payloads are already logged by the engine.
                changed |= engine.handle_json(&json).unwrap_or(false);
            }
            Some(Input::Command(EngineCommand::Shutdown)) => {
                info!("Engine shutdown requested");
                break;
            }
            Some(Input::Command(EngineCommand::Advance { ms })) => {
                offset_ms = offset_ms.saturating_add(ms);
                engine.advance_to(clock(offset_ms));
                changed = true;
            }
            Some(Input::Command(command)) => {
                debug!(?command, "Running command");
                if let Err(e) = engine.execute(command) {
                    warn!(error = %e, "Command failed");
                }
                changed = true;
            }
            Some(Input::Snapshot(reply)) => {
                let _ = reply.send(engine.snapshot());
            }
        }

        if changed {
            snapshot_tx.send_replace(engine.snapshot());
        }
    }

    snapshot_tx.send_replace(engine.snapshot());
    info!("Engine task stopped");
    engine
}
