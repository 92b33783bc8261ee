//! Headless media backend
//!
//! A [`MediaPlayer`] that decodes nothing and models playback time with the
//! wall clock. Duration is estimated from the file size. Notifications are
//! raised from a watcher thread, like a native backend would, so the engine's
//! marshaling path is the same as with a real player.
//!
//! Duration stays unknown (zero) until the first `play`, which is what the
//! controller's priming step expects from real backends.

use looper_playback::{MediaNotification, MediaPlayer, NotificationSink, PlaybackError, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default duration estimate rate
pub const DEFAULT_BYTES_PER_SECOND: u64 = 1_000_000;

/// Shortest duration reported for any file
const MIN_DURATION: Duration = Duration::from_secs(1);

/// Watcher poll period
const WATCH_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct Clock {
    path: Option<PathBuf>,
    duration: Duration,

    /// Duration becomes visible once playback has started
    revealed: bool,

    /// Position at `started`, or the frozen position when not running
    base: Duration,
    started: Option<Instant>,

    volume: u8,
}

impl Clock {
    fn position(&self) -> Duration {
        match self.started {
            Some(started) => (self.base + started.elapsed()).min(self.duration),
            None => self.base,
        }
    }

    fn freeze(&mut self) {
        self.base = self.position();
        self.started = None;
    }

    fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

struct Shared {
    clock: Mutex<Clock>,
    sink: Mutex<Option<NotificationSink>>,
    running: AtomicBool,
}

impl Shared {
    fn notify(&self, notification: MediaNotification) {
        if let Some(sink) = self.sink.lock().as_ref() {
            sink(notification);
        }
    }
}

/// Wall-clock media player
pub struct HeadlessPlayer {
    shared: Arc<Shared>,
    bytes_per_second: u64,
    watcher: Option<JoinHandle<()>>,
}

impl HeadlessPlayer {
    /// Create a player estimating duration at `bytes_per_second`
    pub fn new(bytes_per_second: u64) -> Self {
        let shared = Arc::new(Shared {
            clock: Mutex::new(Clock::default()),
            sink: Mutex::new(None),
            running: AtomicBool::new(true),
        });

        let watcher_shared = Arc::clone(&shared);
        let watcher = thread::Builder::new()
            .name("looper-headless".to_string())
            .spawn(move || Self::watch(&watcher_shared));

        let watcher = match watcher {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("Failed to spawn headless watcher: {}", e);
                None
            }
        };

        Self {
            shared,
            bytes_per_second: bytes_per_second.max(1),
            watcher,
        }
    }

    /// Estimated duration of a file of `len` bytes
    pub fn estimate_duration(&self, len: u64) -> Duration {
        Duration::from_secs_f64(len as f64 / self.bytes_per_second as f64).max(MIN_DURATION)
    }

    fn watch(shared: &Shared) {
        while shared.running.load(Ordering::SeqCst) {
            thread::sleep(WATCH_INTERVAL);

            let ended = {
                let mut clock = shared.clock.lock();
                if clock.is_running() && clock.position() >= clock.duration {
                    clock.freeze();
                    true
                } else {
                    false
                }
            };

            if ended {
                shared.notify(MediaNotification::EndReached);
            }
        }
    }
}

impl Default for HeadlessPlayer {
    fn default() -> Self {
        Self::new(DEFAULT_BYTES_PER_SECOND)
    }
}

impl Drop for HeadlessPlayer {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.watcher.take() {
            let _ = handle.join();
        }
    }
}

impl MediaPlayer for HeadlessPlayer {
    fn open(&mut self, path: &Path) -> Result<()> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| PlaybackError::LoadFailed(format!("{}: {}", path.display(), e)))?;

        if !metadata.is_file() {
            return Err(PlaybackError::LoadFailed(format!(
                "{} is not a file",
                path.display()
            )));
        }

        let duration = self.estimate_duration(metadata.len());
        let mut clock = self.shared.clock.lock();
        let volume = clock.volume;
        *clock = Clock {
            path: Some(path.to_path_buf()),
            duration,
            volume,
            ..Clock::default()
        };

        tracing::debug!("Opened {} ({:?})", path.display(), duration);
        Ok(())
    }

    fn play(&mut self) {
        {
            let mut clock = self.shared.clock.lock();
            if clock.path.is_none() || clock.is_running() {
                return;
            }
            if clock.base >= clock.duration {
                clock.base = Duration::ZERO;
            }
            clock.revealed = true;
            clock.started = Some(Instant::now());
        }
        self.shared.notify(MediaNotification::Playing);
    }

    fn pause(&mut self) {
        {
            let mut clock = self.shared.clock.lock();
            if !clock.is_running() {
                return;
            }
            clock.freeze();
        }
        self.shared.notify(MediaNotification::Paused);
    }

    fn stop(&mut self) {
        {
            let mut clock = self.shared.clock.lock();
            if clock.path.is_none() {
                return;
            }
            clock.started = None;
            clock.base = Duration::ZERO;
        }
        self.shared.notify(MediaNotification::Stopped);
    }

    fn seek_absolute(&mut self, position: Duration) {
        let position = {
            let mut clock = self.shared.clock.lock();
            if clock.path.is_none() {
                return;
            }
            clock.base = position.min(clock.duration);
            if clock.is_running() {
                clock.started = Some(Instant::now());
            }
            clock.base
        };
        self.shared.notify(MediaNotification::PositionChanged(position));
    }

    fn seek_by_fraction(&mut self, fraction: f64) {
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let duration = self.shared.clock.lock().duration;
        self.seek_absolute(duration.mul_f64(fraction));
    }

    fn set_volume(&mut self, level: u8) {
        self.shared.clock.lock().volume = level.min(100);
    }

    fn current_time(&self) -> Duration {
        self.shared.clock.lock().position()
    }

    fn duration(&self) -> Duration {
        let clock = self.shared.clock.lock();
        if clock.revealed {
            clock.duration
        } else {
            Duration::ZERO
        }
    }

    fn is_playing(&self) -> bool {
        let clock = self.shared.clock.lock();
        clock.is_running() && clock.position() < clock.duration
    }

    fn subscribe(&mut self, sink: NotificationSink) {
        *self.shared.sink.lock() = Some(sink);
    }
}
