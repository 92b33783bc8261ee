//! Looper - Segment Loop Playback
//!
//! Platform-agnostic engine for looping named sub-segments of a video.
//!
//! This crate provides:
//! - Segment store (ordered, named time ranges with a "current" pointer)
//! - Loop mode policy (Single, Sequential, Random, SequentialLoop)
//! - Playback controller (tagged state machine, loop-boundary enforcement,
//!   deferred end-of-media restart, scrubbing)
//! - Marker/boundary editing (two-point marking, hold-to-record, live drag)
//! - Volume control (0-100, mute/unmute)
//! - Seek throttling for interactive drags
//!
//! # Architecture
//!
//! `looper-playback` is completely platform-agnostic:
//! - No dependency on a media engine (backends implement [`MediaPlayer`])
//! - No file I/O (persistence is requested via [`PersistRequest`])
//! - No threads (the caller drives [`PlaybackController::on_position_tick`]
//!   and marshals backend notifications)
//!
//! # Example: Marking a segment
//!
//! ```rust,no_run
//! use looper_playback::{MediaPlayer, PlaybackConfig, PlaybackController};
//! use std::path::Path;
//!
//! fn run(media: Box<dyn MediaPlayer>) -> looper_playback::Result<()> {
//!     let mut controller = PlaybackController::new(media, PlaybackConfig::default());
//!
//!     controller.load_video(Path::new("/videos/lesson.mp4"))?;
//!     controller.restore(None)?;
//!
//!     // Later, at 00:10 and then at 00:15
//!     controller.mark_start()?;
//!     let segment = controller.mark_end()?;
//!
//!     // The new segment is now looping
//!     assert!(controller.state().segment_loop().is_some());
//!     # let _ = segment;
//!     Ok(())
//! }
//! ```

mod controller;
mod error;
pub mod events;
pub mod loop_mode;
pub mod markers;
mod media;
mod segments;
mod throttle;
pub mod timeline;
pub mod types;
mod volume;

// Public exports
pub use controller::{PersistRequest, PlaybackController, RestartPlan};
pub use error::{PlaybackError, Result};
pub use events::{PlaybackEvent, PlaybackStateEvent};
pub use markers::{BoundaryDrag, HoldRecord, MIN_SEPARATION_PERCENT};
pub use media::{MediaNotification, MediaPlayer, NotificationSink};
pub use segments::SegmentStore;
pub use throttle::SeekThrottle;
pub use timeline::{format_time, format_time_precise, percent_to_time, time_to_percent};
pub use types::{
    LoopMode, LoopScope, PlaybackConfig, PlaybackState, Segment, SegmentId, SegmentLoop,
    SessionSnapshot,
};
pub use volume::Volume;
