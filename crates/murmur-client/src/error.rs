use thiserror::Error;

use murmur_shared::ProtocolError;
use murmur_store::StoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Engine task has stopped")]
    Closed,
}

pub type Result<T> = std::result::Result<T, EngineError>;
