/// Engine errors
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Controller rejected an operation
    #[error(transparent)]
    Playback(#[from] looper_playback::PlaybackError),

    /// Sidecar or recent-file write failed
    #[error(transparent)]
    Storage(#[from] looper_storage::StorageError),

    /// Video file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Load was superseded by a newer one
    #[error("Load cancelled")]
    Cancelled,

    /// Control thread is gone
    #[error("Engine is not running")]
    Disconnected,

    /// Control thread did not answer in time
    #[error("Engine did not respond")]
    Timeout,

    /// Worker thread could not be started
    #[error("Failed to spawn thread: {0}")]
    Spawn(#[source] std::io::Error),
}
