use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Line {line}: not valid JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line}: bad command: {source}")]
    Command {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line}: expected an \"event\" or \"command\" field")]
    Unrecognized { line: usize },
}
