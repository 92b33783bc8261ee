//! Core types for segment playback

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Unique segment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(Uuid);

impl SegmentId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SegmentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for SegmentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A named time range within the loaded video
///
/// Committed segments always satisfy `end_time > start_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Stable identifier (survives renames and reorders)
    pub id: SegmentId,

    /// Display name, "Segment N" by default
    pub name: String,

    /// Inclusive loop start
    pub start_time: Duration,

    /// Loop boundary; crossing it triggers the loop policy
    pub end_time: Duration,

    /// Dense 0..n-1 position in the collection
    pub order: usize,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Segment {
    /// Length of the segment
    pub fn duration(&self) -> Duration {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// Policy selecting which segment plays after the current one completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    /// Repeat the current segment
    #[default]
    Single,

    /// Play through the list once, then stop looping
    Sequential,

    /// Pick any other segment at random
    Random,

    /// Play through the list and wrap around
    SequentialLoop,
}

impl LoopMode {
    /// Next mode in the UI cycle: Single → SequentialLoop → Random → Single
    pub fn cycle(self) -> Self {
        match self {
            LoopMode::Single => LoopMode::SequentialLoop,
            LoopMode::SequentialLoop => LoopMode::Random,
            LoopMode::Random | LoopMode::Sequential => LoopMode::Single,
        }
    }

    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            LoopMode::Single => "Single (Loop current)",
            LoopMode::Sequential => "Sequential",
            LoopMode::Random => "Random",
            LoopMode::SequentialLoop => "Sequential Loop",
        }
    }
}

impl FromStr for LoopMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "single" => Ok(LoopMode::Single),
            "sequential" => Ok(LoopMode::Sequential),
            "random" => Ok(LoopMode::Random),
            "sequentialloop" | "loop" => Ok(LoopMode::SequentialLoop),
            other => Err(format!("unknown loop mode: {other}")),
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a segment loop repeats one segment or walks the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopScope {
    /// Repeat the looping segment regardless of loop mode
    Single,

    /// Ask the loop policy for the next segment at each boundary
    List,
}

/// Active segment loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentLoop {
    pub segment_id: SegmentId,
    pub scope: LoopScope,
}

/// Playback state
///
/// A segment loop survives pause/resume, but not scrubbing or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No video loaded
    #[default]
    Idle,

    /// Video loaded, backend stopped
    Stopped,

    /// Paused mid-video
    Paused { segment_loop: Option<SegmentLoop> },

    /// Playing, optionally looping a segment
    Playing { segment_loop: Option<SegmentLoop> },

    /// User is dragging the timeline
    Scrubbing { was_playing: bool },
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing { .. })
    }

    /// Segment loop carried by the state (playing or paused)
    pub fn segment_loop(&self) -> Option<SegmentLoop> {
        match self {
            PlaybackState::Playing { segment_loop } | PlaybackState::Paused { segment_loop } => {
                *segment_loop
            }
            _ => None,
        }
    }

    /// Same transport state with the segment loop removed
    fn without_loop(self) -> Self {
        match self {
            PlaybackState::Playing { .. } => PlaybackState::Playing { segment_loop: None },
            PlaybackState::Paused { .. } => PlaybackState::Paused { segment_loop: None },
            other => other,
        }
    }

    pub(crate) fn clear_loop(&mut self) {
        *self = self.without_loop();
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Initial volume (0-100, default: 100)
    pub volume: u8,

    /// Initial loop mode (default: Single)
    pub loop_mode: LoopMode,

    /// Minimum spacing of seeks issued while dragging (default: 50ms)
    pub seek_throttle: Duration,

    /// How long to wait for duration metadata when loading (default: 5s)
    pub priming_timeout: Duration,

    /// Minimum hold for hold-to-record to create a segment (default: 200ms)
    pub hold_record_min: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 100,
            loop_mode: LoopMode::Single,
            seek_throttle: Duration::from_millis(50),
            priming_timeout: Duration::from_secs(5),
            hold_record_min: Duration::from_millis(200),
        }
    }
}

/// Persistable view of the playback session
///
/// Produced by the controller before unload and after structural changes;
/// fed back in on the next load of the same video.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub segments: Vec<Segment>,
    pub loop_mode: LoopMode,
    pub last_position: Duration,
    pub was_playing_segments: bool,
    pub was_playing_single_segment: bool,
    pub last_segment_id: Option<SegmentId>,
}
