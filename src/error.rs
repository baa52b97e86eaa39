use std::path::PathBuf;

use thiserror::Error;

/// Failures at the I/O and parsing boundary. Layout passes themselves never fail.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("unknown layout direction `{0}` (expected TB, BT, LR or RL)")]
    UnknownDirection(String),
    #[error("invalid graph document: {0}")]
    InvalidDocument(#[source] serde_json::Error),
    #[error("failed to serialize layout: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
