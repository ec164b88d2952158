//! Error types shared by the provider client, the cache layer and the
//! channel aggregator.

use thiserror::Error;

/// Failures that can reach a caller of the video layer.
#[derive(Debug, Error)]
pub enum VideoError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unrecognized channel reference: {0}")]
    InvalidReference(String),

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("video not found: {0}")]
    VideoNotFound(String),

    #[error("no predefined channel named {0}")]
    UnknownCatalogueEntry(String),

    #[error("provider request failed: {0}")]
    Provider(String),
}

impl VideoError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            VideoError::ChannelNotFound(_)
                | VideoError::VideoNotFound(_)
                | VideoError::UnknownCatalogueEntry(_)
        )
    }
}

/// Failures of a snapshot backend. These are logged and downgraded by
/// [`crate::cache::SnapshotCache`]; they never reach a client.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("encoding cached videos: {0}")]
    Encoding(#[from] serde_json::Error),
}
