//! Playback Events
//!
//! Event-based communication for UI synchronization. The controller and the
//! segment store queue events as they mutate; callers drain them after each
//! operation. Publishing contract:
//! - `SegmentsChanged` after load/add/remove/rename/reorder/clear/boundary edits
//! - `CurrentSegmentChanged` only when the current pointer becomes non-empty
//! - `PositionChanged` on every poll tick while playing, and immediately after
//!   user-driven seeks
//! - `StateChanged` whenever the tagged playback state changes

use crate::types::{LoopMode, LoopScope, PlaybackState, SegmentId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Playback state changed (playing, paused, looping, etc.)
    StateChanged {
        /// The new playback state
        state: PlaybackStateEvent,
    },

    /// Position update
    PositionChanged {
        /// Current playback position
        position_ms: u64,
        /// Total video duration
        duration_ms: u64,
    },

    /// Segment collection changed structurally
    SegmentsChanged {
        /// New segment count
        count: usize,
    },

    /// A segment became current
    CurrentSegmentChanged {
        /// ID of the new current segment
        segment_id: SegmentId,
    },

    /// Loop mode changed
    LoopModeChanged { mode: LoopMode },

    /// Pending start marker placed or cleared
    PendingMarkerChanged { start_ms: Option<u64> },

    /// Boundary markers of the looping segment moved or toggled
    BoundaryMarkersChanged {
        start_percent: f64,
        end_percent: f64,
        visible: bool,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume level (0-100)
        level: u8,
        /// Whether audio is muted
        is_muted: bool,
    },

    /// Video finished loading and is primed
    VideoLoaded { path: PathBuf, duration_ms: u64 },

    /// Video could not be loaded; engine is idle
    LoadFailed { path: PathBuf, message: String },

    /// Media reached its natural end
    PlaybackEnded,

    /// Recent-file registry changed
    RecentFilesChanged { files: Vec<PathBuf> },

    /// Informational status line
    Status { message: String },

    /// Error that the user should see
    Error {
        /// Error message
        message: String,
    },
}

/// Playback state for events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStateEvent {
    /// No video loaded
    Idle,
    /// Video loaded, stopped
    Stopped,
    /// Paused mid-video
    Paused,
    /// Playing freely
    Playing,
    /// Playing a segment loop
    SegmentLooping { segment_id: SegmentId, single: bool },
    /// User is dragging the timeline
    Scrubbing,
}

impl From<PlaybackState> for PlaybackStateEvent {
    fn from(state: PlaybackState) -> Self {
        match state {
            PlaybackState::Idle => PlaybackStateEvent::Idle,
            PlaybackState::Stopped => PlaybackStateEvent::Stopped,
            PlaybackState::Paused { .. } => PlaybackStateEvent::Paused,
            PlaybackState::Playing { segment_loop: None } => PlaybackStateEvent::Playing,
            PlaybackState::Playing {
                segment_loop: Some(active),
            } => PlaybackStateEvent::SegmentLooping {
                segment_id: active.segment_id,
                single: active.scope == LoopScope::Single,
            },
            PlaybackState::Scrubbing { .. } => PlaybackStateEvent::Scrubbing,
        }
    }
}

impl PlaybackStateEvent {
    /// Short human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackStateEvent::Idle => "idle",
            PlaybackStateEvent::Stopped => "stopped",
            PlaybackStateEvent::Paused => "paused",
            PlaybackStateEvent::Playing => "playing",
            PlaybackStateEvent::SegmentLooping { single: true, .. } => "looping segment",
            PlaybackStateEvent::SegmentLooping { single: false, .. } => "looping list",
            PlaybackStateEvent::Scrubbing => "scrubbing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SegmentLoop;

    #[test]
    fn test_playback_state_event_conversion() {
        assert_eq!(
            PlaybackStateEvent::from(PlaybackState::Playing { segment_loop: None }),
            PlaybackStateEvent::Playing
        );
        assert_eq!(
            PlaybackStateEvent::from(PlaybackState::Paused { segment_loop: None }),
            PlaybackStateEvent::Paused
        );
        assert_eq!(
            PlaybackStateEvent::from(PlaybackState::Stopped),
            PlaybackStateEvent::Stopped
        );
    }

    #[test]
    fn test_segment_loop_state_carries_scope() {
        let segment_id = SegmentId::new();
        let state = PlaybackState::Playing {
            segment_loop: Some(SegmentLoop {
                segment_id,
                scope: LoopScope::Single,
            }),
        };

        assert_eq!(
            PlaybackStateEvent::from(state),
            PlaybackStateEvent::SegmentLooping {
                segment_id,
                single: true
            }
        );
    }
}
