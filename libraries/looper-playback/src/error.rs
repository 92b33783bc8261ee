//! Error types for segment playback

use crate::types::SegmentId;
use std::time::Duration;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No video is currently loaded
    #[error("No video loaded")]
    NoVideoLoaded,

    /// Segment list is empty
    #[error("No segments defined")]
    NoSegments,

    /// Segment id is not in the store
    #[error("Segment not found: {0}")]
    SegmentNotFound(SegmentId),

    /// `mark_end` without a preceding `mark_start`
    #[error("No pending start marker")]
    NoPendingMarker,

    /// Boundary edit would produce a zero or negative duration
    #[error("Invalid segment boundary: {0}")]
    InvalidBoundary(String),

    /// Media could not be opened
    #[error("Failed to load video: {0}")]
    LoadFailed(String),

    /// Duration metadata never became available while priming
    #[error("Timed out after {0:?} waiting for media metadata")]
    LoadTimeout(Duration),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
