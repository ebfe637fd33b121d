use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("Malformed '{tag}' event: {source}")]
    Malformed {
        tag: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
