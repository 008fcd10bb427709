use thiserror::Error;

/// Failure talking to one of the external stores. A session loop never
/// propagates these: a failed tick is logged and the next scheduled tick
/// runs as usual.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
