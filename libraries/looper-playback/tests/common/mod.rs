//! Shared test helpers

#![allow(dead_code)]

use looper_playback::{
    MediaPlayer, NotificationSink, PlaybackConfig, PlaybackController, PlaybackEvent,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Command issued to the mock backend
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCommand {
    Open(PathBuf),
    Play,
    Pause,
    Stop,
    SeekAbsolute(Duration),
    SeekByFraction(f64),
    SetVolume(u8),
}

#[derive(Debug, Default)]
pub struct MockState {
    pub commands: Vec<MediaCommand>,
    pub position: Duration,
    pub duration: Duration,
    pub playing: bool,
    pub volume: u8,
}

/// Mock media player recording every command
///
/// Clones share state, so a test keeps one handle while the controller owns
/// the other.
#[derive(Clone, Default)]
pub struct MockMediaPlayer {
    state: Arc<Mutex<MockState>>,
}

impl MockMediaPlayer {
    pub fn new(duration: Duration) -> Self {
        let player = Self::default();
        player.state.lock().unwrap().duration = duration;
        player
    }

    /// Simulate playback advancing to `position`
    pub fn set_position(&self, position: Duration) {
        self.state.lock().unwrap().position = position;
    }

    /// Simulate the backend pausing on its own (no command recorded)
    pub fn simulate_pause(&self) {
        self.state.lock().unwrap().playing = false;
    }

    pub fn position(&self) -> Duration {
        self.state.lock().unwrap().position
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().unwrap().playing
    }

    pub fn volume(&self) -> u8 {
        self.state.lock().unwrap().volume
    }

    /// Take recorded commands
    pub fn take_commands(&self) -> Vec<MediaCommand> {
        std::mem::take(&mut self.state.lock().unwrap().commands)
    }

    fn record(&self, command: MediaCommand) {
        self.state.lock().unwrap().commands.push(command);
    }
}

impl MediaPlayer for MockMediaPlayer {
    fn open(&mut self, path: &Path) -> looper_playback::Result<()> {
        self.record(MediaCommand::Open(path.to_path_buf()));
        let mut state = self.state.lock().unwrap();
        state.position = Duration::ZERO;
        state.playing = false;
        Ok(())
    }

    fn play(&mut self) {
        self.record(MediaCommand::Play);
        self.state.lock().unwrap().playing = true;
    }

    fn pause(&mut self) {
        self.record(MediaCommand::Pause);
        self.state.lock().unwrap().playing = false;
    }

    fn stop(&mut self) {
        self.record(MediaCommand::Stop);
        let mut state = self.state.lock().unwrap();
        state.playing = false;
        state.position = Duration::ZERO;
    }

    fn seek_absolute(&mut self, position: Duration) {
        self.record(MediaCommand::SeekAbsolute(position));
        self.state.lock().unwrap().position = position;
    }

    fn seek_by_fraction(&mut self, fraction: f64) {
        self.record(MediaCommand::SeekByFraction(fraction));
        let mut state = self.state.lock().unwrap();
        state.position = state.duration.mul_f64(fraction.clamp(0.0, 1.0));
    }

    fn set_volume(&mut self, level: u8) {
        self.record(MediaCommand::SetVolume(level));
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

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Controller with a 100 s video loaded, primed and restored without metadata
pub fn playing_controller() -> (PlaybackController, MockMediaPlayer) {
    let media = MockMediaPlayer::new(secs(100));
    let mut controller =
        PlaybackController::new(Box::new(media.clone()), PlaybackConfig::default());

    controller
        .load_video(Path::new("/videos/lesson.mp4"))
        .unwrap();
    controller.restore(None).unwrap();
    controller.drain_events();
    media.take_commands();

    (controller, media)
}

pub fn has_event(events: &[PlaybackEvent], predicate: impl Fn(&PlaybackEvent) -> bool) -> bool {
    events.iter().any(predicate)
}
