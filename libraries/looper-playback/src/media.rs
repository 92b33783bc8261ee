//! Platform-agnostic media player trait
//!
//! Abstracts the video backend (libVLC, a headless clock, a test double).
//! The engine never decodes anything; it issues these commands and reacts to
//! the notifications the backend posts through its [`NotificationSink`].

use crate::error::Result;
use std::path::Path;
use std::time::Duration;

/// Notification delivered by the media backend
///
/// May be raised on any thread, including one the backend holds internal
/// locks on. Receivers must marshal these to the control thread and must not
/// call back into the backend from inside the sink.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaNotification {
    /// Playback started
    Playing,

    /// Playback paused
    Paused,

    /// Playback stopped
    Stopped,

    /// Backend-reported position
    PositionChanged(Duration),

    /// Media reached its natural end
    EndReached,

    /// Backend failure while playing
    Error(String),
}

/// Callback the backend invokes for every notification
pub type NotificationSink = Box<dyn Fn(MediaNotification) + Send + Sync>;

/// Media player collaborator
///
/// Implementors wrap a native playback engine. All commands are issued from
/// the control thread.
pub trait MediaPlayer: Send {
    /// Open media, replacing whatever was loaded
    ///
    /// Opening does not start playback. Duration may stay zero until the
    /// media has been played briefly.
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback, keeping position
    fn pause(&mut self);

    /// Stop playback and rewind
    fn stop(&mut self);

    /// Seek to an absolute position
    fn seek_absolute(&mut self, position: Duration);

    /// Seek to a fraction (0.0..=1.0) of the duration
    fn seek_by_fraction(&mut self, fraction: f64);

    /// Set output volume (0-100)
    fn set_volume(&mut self, level: u8);

    /// Current playback position
    fn current_time(&self) -> Duration;

    /// Total duration, zero while unknown
    fn duration(&self) -> Duration;

    /// Whether the backend is currently playing
    fn is_playing(&self) -> bool;

    /// Register the notification sink, replacing any previous one
    fn subscribe(&mut self, sink: NotificationSink);
}

/// In-memory media player for unit tests
///
/// Position only moves when a test sets it or seeks.
#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    pub(crate) struct FakeState {
        pub opened: Option<std::path::PathBuf>,
        pub position: Duration,
        pub duration: Duration,
        pub playing: bool,
        pub volume: u8,
        pub seeks: Vec<Duration>,
        pub fail_open: bool,
    }

    /// Fake backend sharing its state with the test
    #[derive(Clone, Default)]
    pub(crate) struct FakeMediaPlayer {
        pub state: Arc<Mutex<FakeState>>,
    }

    impl FakeMediaPlayer {
        pub fn with_duration(duration: Duration) -> Self {
            let player = Self::default();
            player.state.lock().unwrap().duration = duration;
            player
        }

        pub fn set_position(&self, position: Duration) {
            self.state.lock().unwrap().position = position;
        }
    }

    impl MediaPlayer for FakeMediaPlayer {
        fn open(&mut self, path: &Path) -> Result<()> {
            let mut state = self.state.lock().unwrap();
            if state.fail_open {
                return Err(crate::error::PlaybackError::LoadFailed(
                    "cannot open".to_string(),
                ));
            }
            state.opened = Some(path.to_path_buf());
            state.position = Duration::ZERO;
            state.playing = false;
            Ok(())
        }

        fn play(&mut self) {
            self.state.lock().unwrap().playing = true;
        }

        fn pause(&mut self) {
            self.state.lock().unwrap().playing = false;
        }

        fn stop(&mut self) {
            let mut state = self.state.lock().unwrap();
            state.playing = false;
            state.position = Duration::ZERO;
        }

        fn seek_absolute(&mut self, position: Duration) {
            let mut state = self.state.lock().unwrap();
            state.position = position;
            state.seeks.push(position);
        }

        fn seek_by_fraction(&mut self, fraction: f64) {
            let mut state = self.state.lock().unwrap();
            let position = state.duration.mul_f64(fraction.clamp(0.0, 1.0));
            state.position = position;
            state.seeks.push(position);
        }

        fn set_volume(&mut self, level: u8) {
            self.state.lock().unwrap().volume = level;
        }

        fn current_time(&self) -> Duration {
            self.state.lock().unwrap().position
        }

        fn duration(&self) -> Duration {
            self.state.lock().unwrap().duration
        }

        fn is_playing(&self) -> bool {
            self.state.lock().unwrap().playing
        }

        fn subscribe(&mut self, _sink: NotificationSink) {}
    }
}
