//! Replay scripts: newline-delimited JSON, one inbound event or one user
//! command per line. Blank lines and lines starting with `#` are skipped.
//!
//! ```text
//! {"command":"select_channel","channel_id":"C1"}
//! {"event":"posts","data":{"channel_id":"C1","posts":[],"has_more":false}}
//! {"command":"advance","ms":6000}
//! ```

use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use murmur_client::EngineCommand;

use crate::error::ReplayError;

#[derive(Debug, PartialEq)]
pub enum ScriptLine {
    /// Raw inbound payload, decoded by the engine itself.
    Event(String),
    Command(EngineCommand),
}

/// Classify one script line. `line` is 1-based and only used in errors.
pub fn parse_line(line: usize, text: &str) -> Result<Option<ScriptLine>, ReplayError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|source| ReplayError::Json { line, source })?;

    if value.get("event").is_some() {
        return Ok(Some(ScriptLine::Event(text.to_string())));
    }
    if value.get("command").is_some() {
        let command = serde_json::from_value(value)
            .map_err(|source| ReplayError::Command { line, source })?;
        return Ok(Some(ScriptLine::Command(command)));
    }
    Err(ReplayError::Unrecognized { line })
}

/// Read every line of the script at `path`, or of stdin.
pub async fn read_lines(path: Option<&Path>) -> std::io::Result<Vec<String>> {
    match path {
        Some(path) => collect(tokio::fs::File::open(path).await?).await,
        None => collect(tokio::io::stdin()).await,
    }
}

async fn collect(reader: impl AsyncRead + Unpin) -> std::io::Result<Vec<String>> {
    let mut lines = BufReader::new(reader).lines();
    let mut out = Vec::new();
    while let Some(line) = lines.next_line().await? {
        out.push(line);
    }
    Ok(out)
}
