//! # murmur-replay
//!
//! Host harness for the Murmur chat engine.
//!
//! Replays a newline-delimited JSON script of inbound events and user
//! commands through the engine bridge, logs every outbound request the
//! engine issues, and prints a JSON report with the requests and the final
//! state snapshot.

mod config;
mod error;
mod script;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use murmur_client::{outbound_channel, spawn_engine, ChatEngine, Snapshot};
use murmur_shared::constants::APP_NAME;
use murmur_shared::protocol::OutboundRequest;
use murmur_shared::types::UserId;

use crate::config::ReplayConfig;
use crate::script::ScriptLine;

#[derive(Serialize)]
struct Report {
    requests: Vec<OutboundRequest>,
    snapshot: Snapshot,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    murmur_client::init_tracing("warn,murmur_replay=info,murmur_client=info");

    info!("Starting {} replay v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration and the script
    // -----------------------------------------------------------------------
    let config = ReplayConfig::from_env();
    info!(?config, "Loaded configuration");

    let lines = script::read_lines(config.script.as_deref())
        .await
        .context("Failed to read replay script")?;

    // -----------------------------------------------------------------------
    // 3. Start the engine and the outbound request collector
    // -----------------------------------------------------------------------
    let (sink, mut outbound) = outbound_channel(&config.engine);
    let engine = ChatEngine::new(
        UserId::new(config.user_id.clone()),
        config.display_name.clone(),
        config.engine.clone(),
        sink,
    );
    let (handle, _snapshots, task) = spawn_engine(engine);

    let collector = tokio::spawn(async move {
        let mut requests = Vec::new();
        while let Some(request) = outbound.recv().await {
            match request.to_json() {
                Ok(json) => info!(request = %json, "Outbound request"),
                Err(e) => warn!(error = %e, "Unserializable request"),
            }
            requests.push(request);
        }
        requests
    });

    // -----------------------------------------------------------------------
    // 4. Replay (stops early on Ctrl+C)
    // -----------------------------------------------------------------------
    let replay = async {
        let mut replayed = 0usize;
        for (index, text) in lines.iter().enumerate() {
            match script::parse_line(index + 1, text) {
                Ok(Some(ScriptLine::Event(json))) => handle.send_event(json).await?,
                Ok(Some(ScriptLine::Command(command))) => handle.command(command).await?,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "Skipping script line");
                    continue;
                }
            }
            replayed += 1;
        }
        Ok::<usize, murmur_client::EngineError>(replayed)
    };

    tokio::select! {
        result = replay => {
            let replayed = result.context("Engine stopped during replay")?;
            info!(replayed, "Script replayed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping replay");
        }
    }

    // -----------------------------------------------------------------------
    // 5. Shut down and report
    // -----------------------------------------------------------------------
    let snapshot = handle.snapshot().await.context("Engine stopped")?;
    handle.shutdown().await.context("Engine stopped")?;
    drop(handle);

    // Dropping the engine closes the outbound channel and ends the collector.
    drop(task.await.context("Engine task panicked")?);
    let requests = collector.await.context("Collector task panicked")?;

    let report = Report { requests, snapshot };
    let json = if config.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
