//! Playback controller - segment loop state machine
//!
//! Owns the media backend, the segment store and the tagged playback state.
//! Single-threaded: every method runs on the control thread, which also
//! forwards backend notifications and the 50 ms position tick.
//!
//! ```text
//!            load_video                play / pause
//!   Idle ───────────────▶ Paused ◀──────────────────▶ Playing
//!     ▲                      │  ▲                       │   ▲
//!     │ load failure         │  │ scrub end             │   │ play_segment /
//!     └──────────────────────┘  │                       │   │ create_segment
//!                             Scrubbing ◀─── scrub start┘   ▼
//!                                                    Playing{segment loop}
//! ```

use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::markers::{resolve_marks, BoundaryDrag, HoldRecord};
use crate::media::{MediaNotification, MediaPlayer};
use crate::segments::SegmentStore;
use crate::throttle::SeekThrottle;
use crate::timeline::{percent_to_time, time_to_percent};
use crate::types::{
    LoopMode, LoopScope, PlaybackConfig, PlaybackState, Segment, SegmentId, SegmentLoop,
    SessionSnapshot,
};
use crate::volume::Volume;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How often duration metadata is polled while priming
const PRIMING_POLL: Duration = Duration::from_millis(10);

/// Persistence work requested by the last operations
///
/// The controller performs no I/O; the session layer takes the request and
/// talks to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistRequest {
    /// Write the current snapshot
    Save,

    /// Last segment was removed, drop the sidecar
    DeleteSidecar,
}

/// Deferred restart after the media reached its end
///
/// Produced inside notification handling and executed later, from a
/// different context, after a grace delay. Plans from a previous load are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPlan {
    pub generation: u64,
    pub position: Duration,
    pub segment_loop: Option<SegmentLoop>,
}

/// Segment-loop playback controller
pub struct PlaybackController {
    media: Box<dyn MediaPlayer>,
    config: PlaybackConfig,

    state: PlaybackState,
    store: SegmentStore,
    volume: Volume,

    video_path: Option<PathBuf>,
    duration: Duration,

    /// Bumped on every load; stamps restart plans
    generation: u64,

    pending_start: Option<Duration>,
    hold_record: Option<HoldRecord>,
    boundary: BoundaryDrag,

    scrub_throttle: SeekThrottle,
    marker_throttle: SeekThrottle,

    persist: Option<PersistRequest>,
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackController {
    /// Create a controller around a media backend
    pub fn new(mut media: Box<dyn MediaPlayer>, config: PlaybackConfig) -> Self {
        let volume = Volume::new(config.volume);
        media.set_volume(volume.effective_level());

        Self {
            media,
            state: PlaybackState::Idle,
            store: SegmentStore::new(config.loop_mode),
            volume,
            video_path: None,
            duration: Duration::ZERO,
            generation: 0,
            pending_start: None,
            hold_record: None,
            boundary: BoundaryDrag::default(),
            scrub_throttle: SeekThrottle::new(config.seek_throttle),
            marker_throttle: SeekThrottle::new(config.seek_throttle),
            persist: None,
            pending_events: Vec::new(),
            config,
        }
    }

    // ===== Loading =====

    /// Open and prime a video
    ///
    /// Priming plays briefly until the backend reports a duration, then
    /// pauses. On failure nothing of the previous or new video is retained
    /// and the controller is `Idle`.
    pub fn load_video(&mut self, path: &Path) -> Result<Duration> {
        self.unload();
        self.generation += 1;

        tracing::debug!(path = %path.display(), generation = self.generation, "Loading video");

        let primed = self
            .media
            .open(path)
            .map_err(|e| match e {
                PlaybackError::LoadFailed(message) => PlaybackError::LoadFailed(message),
                other => PlaybackError::LoadFailed(other.to_string()),
            })
            .and_then(|()| self.prime());

        let duration = match primed {
            Ok(duration) => duration,
            Err(e) => {
                self.media.stop();
                self.emit(PlaybackEvent::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        self.media.set_volume(self.volume.effective_level());
        self.video_path = Some(path.to_path_buf());
        self.duration = duration;

        self.emit(PlaybackEvent::VideoLoaded {
            path: path.to_path_buf(),
            duration_ms: duration.as_millis() as u64,
        });
        self.set_state(PlaybackState::Paused { segment_loop: None });

        Ok(duration)
    }

    fn prime(&mut self) -> Result<Duration> {
        let deadline = Instant::now() + self.config.priming_timeout;
        self.media.play();

        loop {
            let duration = self.media.duration();
            if !duration.is_zero() {
                self.media.pause();
                return Ok(duration);
            }

            if Instant::now() >= deadline {
                return Err(PlaybackError::LoadTimeout(self.config.priming_timeout));
            }

            std::thread::sleep(PRIMING_POLL);
        }
    }

    /// Apply persisted session state to the freshly loaded video
    ///
    /// Resumes the segment loop that was running, or the last position, and
    /// starts playback. Without a snapshot, plays from the start.
    pub fn restore(&mut self, snapshot: Option<SessionSnapshot>) -> Result<()> {
        self.ensure_loaded()?;

        match snapshot {
            Some(snapshot) => {
                self.store.load(snapshot.segments);
                self.store.set_loop_mode(snapshot.loop_mode);
                self.emit(PlaybackEvent::LoopModeChanged {
                    mode: snapshot.loop_mode,
                });

                let resume_loop = snapshot.was_playing_segments && !self.store.is_empty();

                let single_id = snapshot
                    .last_segment_id
                    .filter(|_| resume_loop && snapshot.was_playing_single_segment);

                if let Some(id) = single_id {
                    // Unknown ids fall back to the first segment
                    let id = Some(id)
                        .filter(|id| self.store.get(*id).is_some())
                        .or_else(|| self.store.segments().first().map(|s| s.id));

                    if let Some(id) = id {
                        self.enter_segment_loop(id, LoopScope::Single)?;
                    }
                } else if resume_loop {
                    self.play_all_segments()?;
                } else {
                    let position = snapshot.last_position;
                    if !position.is_zero() && position < self.duration {
                        self.media.seek_absolute(position);
                    }
                    self.play()?;
                }
            }
            None => {
                self.store.clear();
                self.play()?;
            }
        }

        self.persist = None;
        Ok(())
    }

    /// Stop and forget the current video
    pub fn unload(&mut self) {
        if self.video_path.is_some() {
            self.media.stop();
        }

        self.video_path = None;
        self.duration = Duration::ZERO;
        self.store.clear();
        self.pending_start = None;
        self.hold_record = None;
        self.boundary.hide();
        self.persist = None;
        self.set_state(PlaybackState::Idle);
    }

    // ===== Transport =====

    /// Resume playback, keeping a paused segment loop
    pub fn play(&mut self) -> Result<()> {
        self.ensure_loaded()?;

        let segment_loop = self.state.segment_loop();
        self.media.play();
        self.set_state(PlaybackState::Playing { segment_loop });
        Ok(())
    }

    /// Pause in place, keeping the segment loop
    pub fn pause(&mut self) -> Result<()> {
        self.ensure_loaded()?;

        let segment_loop = self.state.segment_loop();
        self.media.pause();
        self.set_state(PlaybackState::Paused { segment_loop });
        Ok(())
    }

    /// Play/pause toggle; ignored while a hold-record is in progress
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        self.ensure_loaded()?;

        if self.hold_record.is_some() {
            return Ok(());
        }

        if self.state.is_playing() {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Stop the backend and drop any segment loop
    pub fn stop(&mut self) -> Result<()> {
        self.ensure_loaded()?;

        self.media.stop();
        self.hide_boundary();
        self.set_state(PlaybackState::Stopped);
        self.emit_position(Duration::ZERO);
        Ok(())
    }

    // ===== Segment loops =====

    /// Loop one segment, regardless of loop mode
    pub fn play_segment(&mut self, id: SegmentId) -> Result<()> {
        self.enter_segment_loop(id, LoopScope::Single)?;
        self.request_save();
        Ok(())
    }

    /// Toggle list looping
    ///
    /// Starts at the first segment; when a segment loop is already active,
    /// leaves it and pauses in place instead.
    pub fn play_all_segments(&mut self) -> Result<()> {
        self.ensure_loaded()?;

        if self.state.segment_loop().is_some() {
            self.media.pause();
            self.store.set_current(None);
            self.hide_boundary();
            self.set_state(PlaybackState::Paused { segment_loop: None });
            self.request_save();
            return Ok(());
        }

        let first = self
            .store
            .segments()
            .first()
            .map(|s| s.id)
            .ok_or(PlaybackError::NoSegments)?;

        self.enter_segment_loop(first, LoopScope::List)?;
        self.request_save();
        Ok(())
    }

    /// Select and loop the segment after the current one (wraps)
    pub fn select_next_segment(&mut self) -> Result<()> {
        let count = self.store.len();
        if count == 0 {
            return Err(PlaybackError::NoSegments);
        }

        let index = self
            .current_index()
            .map_or(0, |index| (index + 1) % count);
        self.play_segment(self.store.segments()[index].id)
    }

    /// Select and loop the segment before the current one (wraps)
    pub fn select_previous_segment(&mut self) -> Result<()> {
        let count = self.store.len();
        if count == 0 {
            return Err(PlaybackError::NoSegments);
        }

        let index = self
            .current_index()
            .map_or(count - 1, |index| (index + count - 1) % count);
        self.play_segment(self.store.segments()[index].id)
    }

    fn current_index(&self) -> Option<usize> {
        self.store
            .current_id()
            .and_then(|id| self.store.index_of(id))
    }

    fn enter_segment_loop(&mut self, id: SegmentId, scope: LoopScope) -> Result<()> {
        self.ensure_loaded()?;

        let segment = self
            .store
            .get(id)
            .cloned()
            .ok_or(PlaybackError::SegmentNotFound(id))?;

        tracing::debug!(segment = %segment.name, ?scope, "Entering segment loop");

        self.store.set_current(Some(id));
        self.media.seek_absolute(segment.start_time);
        self.media.play();
        self.set_state(PlaybackState::Playing {
            segment_loop: Some(SegmentLoop {
                segment_id: id,
                scope,
            }),
        });
        self.show_boundary(&segment);
        self.emit_position(segment.start_time);
        Ok(())
    }

    // ===== Position polling =====

    /// Poll tick: publish position and enforce the loop boundary
    ///
    /// Does nothing unless playing.
    pub fn on_position_tick(&mut self) {
        let PlaybackState::Playing { segment_loop } = self.state else {
            return;
        };

        let position = self.media.current_time();
        self.emit_position(position);

        let Some(active) = segment_loop else {
            return;
        };

        let Some(segment) = self.store.get(active.segment_id).cloned() else {
            self.leave_segment_loop();
            return;
        };

        if position < segment.end_time {
            return;
        }

        match active.scope {
            LoopScope::Single => self.media.seek_absolute(segment.start_time),
            LoopScope::List => match self.store.next_segment().map(|s| s.id) {
                Some(next) if next != segment.id => {
                    if let Err(e) = self.enter_segment_loop(next, LoopScope::List) {
                        tracing::warn!("Failed to advance segment loop: {}", e);
                    }
                }
                Some(_) => self.media.seek_absolute(segment.start_time),
                None => {
                    self.leave_segment_loop();
                    self.emit(PlaybackEvent::Status {
                        message: "Reached end of segment list".to_string(),
                    });
                }
            },
        }
    }

    /// Keep transport state, drop the segment loop
    fn leave_segment_loop(&mut self) {
        let mut state = self.state;
        state.clear_loop();
        self.hide_boundary();
        self.set_state(state);
    }

    // ===== Backend notifications =====

    /// React to a marshaled backend notification
    ///
    /// End of media never restarts inline: the returned plan must be run
    /// through [`restart`](Self::restart) from another context after a short
    /// grace delay.
    pub fn on_media_notification(
        &mut self,
        notification: MediaNotification,
    ) -> Option<RestartPlan> {
        match notification {
            MediaNotification::Playing | MediaNotification::Paused => {
                self.reconcile_transport(false);
                None
            }
            MediaNotification::Stopped => {
                self.reconcile_transport(true);
                None
            }
            // The poll tick drives position; backend positions are advisory
            MediaNotification::PositionChanged(_) => None,
            MediaNotification::EndReached => self.on_end_reached(),
            MediaNotification::Error(message) => {
                tracing::warn!("Media backend error: {}", message);
                if self.video_path.is_some() {
                    self.media.stop();
                    self.hide_boundary();
                    self.set_state(PlaybackState::Stopped);
                }
                self.emit(PlaybackEvent::Error { message });
                None
            }
        }
    }

    /// Align state with what the backend is actually doing
    ///
    /// Notifications lag behind our own play/stop sequences, so the live
    /// `is_playing` wins over the notification kind.
    fn reconcile_transport(&mut self, stopped: bool) {
        if matches!(
            self.state,
            PlaybackState::Idle | PlaybackState::Scrubbing { .. }
        ) {
            return;
        }

        let live = self.media.is_playing();
        let segment_loop = self.state.segment_loop();

        if live && !self.state.is_playing() {
            self.set_state(PlaybackState::Playing { segment_loop });
        } else if !live && self.state.is_playing() {
            if stopped {
                self.hide_boundary();
                self.set_state(PlaybackState::Stopped);
            } else {
                self.set_state(PlaybackState::Paused { segment_loop });
            }
        }
    }

    /// Plan the restart after natural end of media
    ///
    /// Resumes the looping segment at its start, otherwise the whole video
    /// from zero.
    pub fn on_end_reached(&mut self) -> Option<RestartPlan> {
        self.video_path.as_ref()?;

        self.emit(PlaybackEvent::PlaybackEnded);

        let segment_loop = self.state.segment_loop();
        let position = segment_loop
            .and_then(|active| self.store.get(active.segment_id))
            .map_or(Duration::ZERO, |segment| segment.start_time);

        Some(RestartPlan {
            generation: self.generation,
            position,
            segment_loop,
        })
    }

    /// Execute a deferred restart
    ///
    /// Returns false when the plan belongs to a previous load.
    pub fn restart(&mut self, plan: RestartPlan) -> bool {
        if plan.generation != self.generation || self.video_path.is_none() {
            tracing::debug!(
                plan = plan.generation,
                current = self.generation,
                "Ignoring stale restart"
            );
            return false;
        }

        let (position, segment_loop) = match plan.segment_loop {
            Some(active) if self.store.get(active.segment_id).is_none() => (Duration::ZERO, None),
            _ => (plan.position, plan.segment_loop),
        };

        self.media.stop();
        self.media.play();
        if !position.is_zero() {
            self.media.seek_absolute(position);
        }

        if segment_loop.is_none() {
            self.hide_boundary();
        }
        self.set_state(PlaybackState::Playing { segment_loop });
        self.emit_position(position);
        true
    }

    // ===== Scrubbing =====

    /// Begin timeline drag
    ///
    /// The backend keeps running; the segment loop is dropped so the user is
    /// not yanked back to the segment start mid-drag.
    pub fn on_scrub_start(&mut self) {
        if self.video_path.is_none() || matches!(self.state, PlaybackState::Scrubbing { .. }) {
            return;
        }

        let was_playing = self.state.is_playing();
        self.hide_boundary();
        self.scrub_throttle.reset();
        self.set_state(PlaybackState::Scrubbing { was_playing });
    }

    /// Timeline dragged to `percent`; seeks at most once per throttle window
    pub fn on_scrub_changed(&mut self, percent: f64) {
        if !matches!(self.state, PlaybackState::Scrubbing { .. }) {
            return;
        }

        if self.scrub_throttle.try_acquire() {
            self.media.seek_by_fraction(percent.clamp(0.0, 100.0) / 100.0);
        }
    }

    /// Release the timeline: final seek, then restore play/pause
    pub fn on_scrub_end(&mut self, percent: f64) {
        let PlaybackState::Scrubbing { was_playing } = self.state else {
            return;
        };

        self.media.seek_by_fraction(percent.clamp(0.0, 100.0) / 100.0);

        if was_playing {
            if !self.media.is_playing() {
                self.media.play();
            }
            self.set_state(PlaybackState::Playing { segment_loop: None });
        } else {
            if self.media.is_playing() {
                self.media.pause();
            }
            self.set_state(PlaybackState::Paused { segment_loop: None });
        }

        self.emit_position(percent_to_time(percent, self.duration));
    }

    // ===== Seeking =====

    /// Seek by a signed number of seconds, clamped to `[0, duration]`
    pub fn seek_relative(&mut self, delta_seconds: f64) -> Result<()> {
        self.ensure_loaded()?;

        if !delta_seconds.is_finite() {
            return Err(PlaybackError::InvalidOperation(format!(
                "invalid seek offset: {delta_seconds}"
            )));
        }

        let current = self.media.current_time().as_secs_f64();
        let target = (current + delta_seconds).clamp(0.0, self.duration.as_secs_f64());
        let target = Duration::from_secs_f64(target);

        self.media.seek_absolute(target);
        self.emit_position(target);
        Ok(())
    }

    /// Click-to-seek on the timeline
    pub fn seek_to_percent(&mut self, percent: f64) -> Result<()> {
        self.ensure_loaded()?;

        let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
        self.media.seek_by_fraction(percent / 100.0);
        self.emit_position(percent_to_time(percent, self.duration));
        Ok(())
    }

    // ===== Volume =====

    /// Set volume (0-100, clamped)
    pub fn set_volume(&mut self, level: i32) {
        self.volume.set_level(level);
        self.apply_volume();
    }

    /// Change volume by a signed delta (clamped)
    pub fn adjust_volume(&mut self, delta: i32) {
        self.volume.adjust(delta);
        self.apply_volume();
    }

    pub fn mute(&mut self) {
        self.volume.mute();
        self.apply_volume();
    }

    pub fn unmute(&mut self) {
        self.volume.unmute();
        self.apply_volume();
    }

    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.apply_volume();
    }

    fn apply_volume(&mut self) {
        self.media.set_volume(self.volume.effective_level());
        self.emit(PlaybackEvent::VolumeChanged {
            level: self.volume.level(),
            is_muted: self.volume.is_muted(),
        });
    }

    // ===== Loop mode =====

    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.store.set_loop_mode(mode);
        self.emit(PlaybackEvent::LoopModeChanged { mode });
        self.request_save();
    }

    /// Advance to the next loop mode in UI order
    pub fn cycle_loop_mode(&mut self) -> LoopMode {
        let mode = self.store.loop_mode().cycle();
        self.set_loop_mode(mode);
        mode
    }

    // ===== Marking =====

    /// Mark the current time as a segment start
    ///
    /// While a segment loops, moves that segment's start here and restarts
    /// it; otherwise places (or replaces) the pending start marker.
    pub fn mark_start(&mut self) -> Result<()> {
        self.ensure_loaded()?;
        let now = self.media.current_time();

        if let Some(active) = self.state.segment_loop() {
            let segment = self.looping_segment(active)?;
            if now >= segment.end_time {
                return Err(PlaybackError::InvalidBoundary(
                    "start must be before the segment end".to_string(),
                ));
            }

            return self.redefine_looping_segment(active, now, segment.end_time);
        }

        self.pending_start = Some(now);
        self.emit(PlaybackEvent::PendingMarkerChanged {
            start_ms: Some(now.as_millis() as u64),
        });
        Ok(())
    }

    /// Mark the current time as a segment end
    ///
    /// With a pending start, creates a segment (swapping reversed marks) and
    /// loops it. While a segment loops, moves that segment's end here
    /// instead and returns `None`.
    pub fn mark_end(&mut self) -> Result<Option<Segment>> {
        self.ensure_loaded()?;
        let now = self.media.current_time();

        if let Some(active) = self.state.segment_loop() {
            let segment = self.looping_segment(active)?;
            if now <= segment.start_time {
                return Err(PlaybackError::InvalidBoundary(
                    "end must be after the segment start".to_string(),
                ));
            }

            self.redefine_looping_segment(active, segment.start_time, now)?;
            return Ok(None);
        }

        let pending = self.pending_start.ok_or(PlaybackError::NoPendingMarker)?;
        let (start, end) = resolve_marks(pending, now)?;

        self.create_segment(start, end).map(Some)
    }

    /// Commit a new segment and loop it
    pub fn create_segment(&mut self, start: Duration, end: Duration) -> Result<Segment> {
        self.ensure_loaded()?;

        if end <= start {
            return Err(PlaybackError::InvalidBoundary(format!(
                "end {:?} is not after start {:?}",
                end, start
            )));
        }

        let segment = self.store.add_segment(start, end);
        tracing::debug!(segment = %segment.name, ?start, ?end, "Created segment");

        self.pending_start = None;
        self.emit(PlaybackEvent::PendingMarkerChanged { start_ms: None });
        self.enter_segment_loop(segment.id, LoopScope::Single)?;
        self.request_save();

        Ok(segment)
    }

    fn looping_segment(&self, active: SegmentLoop) -> Result<Segment> {
        self.store
            .get(active.segment_id)
            .cloned()
            .ok_or(PlaybackError::SegmentNotFound(active.segment_id))
    }

    fn redefine_looping_segment(
        &mut self,
        active: SegmentLoop,
        start: Duration,
        end: Duration,
    ) -> Result<()> {
        self.store.update_bounds(active.segment_id, start, end);
        self.enter_segment_loop(active.segment_id, active.scope)?;
        self.request_save();
        Ok(())
    }

    // ===== Hold-to-record =====

    /// Start recording a segment from the current time
    ///
    /// Only while playing; returns whether recording started.
    pub fn begin_hold_record(&mut self) -> bool {
        if !self.state.is_playing() || self.hold_record.is_some() {
            return false;
        }

        let now = self.media.current_time();
        self.hold_record = Some(HoldRecord::begin(now));
        self.emit(PlaybackEvent::PendingMarkerChanged {
            start_ms: Some(now.as_millis() as u64),
        });
        true
    }

    /// Finish recording; creates and loops the segment if held long enough
    pub fn end_hold_record(&mut self) -> Result<Option<Segment>> {
        let Some(hold) = self.hold_record.take() else {
            return Ok(None);
        };

        let range = hold.finish(self.media.current_time(), self.config.hold_record_min);

        match range {
            Ok(Some((start, end))) => self.create_segment(start, end).map(Some),
            other => {
                self.emit(PlaybackEvent::PendingMarkerChanged {
                    start_ms: self.pending_start.map(|t| t.as_millis() as u64),
                });
                other.map(|_| None)
            }
        }
    }

    pub fn is_hold_recording(&self) -> bool {
        self.hold_record.is_some()
    }

    // ===== Boundary drag =====

    /// Drag the start handle of the looping segment
    ///
    /// Returns the clamped position, or `None` when no segment is looping.
    pub fn update_start_position(&mut self, percent: f64) -> Option<f64> {
        if !self.can_drag_boundary() {
            return None;
        }

        let applied = self.boundary.set_start(percent);
        self.after_boundary_drag(applied);
        Some(applied)
    }

    /// Drag the end handle of the looping segment
    pub fn update_end_position(&mut self, percent: f64) -> Option<f64> {
        if !self.can_drag_boundary() {
            return None;
        }

        let applied = self.boundary.set_end(percent);
        self.after_boundary_drag(applied);
        Some(applied)
    }

    fn can_drag_boundary(&self) -> bool {
        self.boundary.is_visible() && self.state.segment_loop().is_some()
    }

    fn after_boundary_drag(&mut self, preview_percent: f64) {
        self.emit_boundary();

        if self.marker_throttle.try_acquire() {
            self.media
                .seek_absolute(percent_to_time(preview_percent, self.duration));
        }
    }

    /// Write the dragged handles back onto the looping segment
    pub fn commit_boundary_change(&mut self) -> Result<()> {
        let active = self.state.segment_loop().ok_or_else(|| {
            PlaybackError::InvalidOperation("no segment is looping".to_string())
        })?;

        let (start, end) = self.boundary.to_times(self.duration)?;

        if !self.store.update_bounds(active.segment_id, start, end) {
            return Err(PlaybackError::SegmentNotFound(active.segment_id));
        }

        self.media.seek_absolute(start);
        self.marker_throttle.reset();
        self.request_save();
        Ok(())
    }

    fn show_boundary(&mut self, segment: &Segment) {
        self.boundary.show(
            time_to_percent(segment.start_time, self.duration),
            time_to_percent(segment.end_time, self.duration),
        );
        self.emit_boundary();
    }

    fn hide_boundary(&mut self) {
        if self.boundary.is_visible() {
            self.boundary.hide();
            self.emit_boundary();
        }
    }

    fn emit_boundary(&mut self) {
        self.emit(PlaybackEvent::BoundaryMarkersChanged {
            start_percent: self.boundary.start_percent(),
            end_percent: self.boundary.end_percent(),
            visible: self.boundary.is_visible(),
        });
    }

    // ===== Segment editing =====

    pub fn rename_segment(&mut self, id: SegmentId, name: impl Into<String>) -> Result<()> {
        if !self.store.rename_segment(id, name) {
            return Err(PlaybackError::SegmentNotFound(id));
        }

        self.request_save();
        Ok(())
    }

    pub fn reorder_segments(&mut self, ids: &[SegmentId]) {
        self.store.reorder_segments(Some(ids));
        self.request_save();
    }

    /// Delete a segment
    ///
    /// Deleting the current or looping segment pauses in place. Removing the
    /// last segment requests sidecar deletion instead of a save.
    pub fn delete_segment(&mut self, id: SegmentId) -> Result<Segment> {
        let removed = self
            .store
            .remove_segment(id)
            .ok_or(PlaybackError::SegmentNotFound(id))?;

        let was_looping = self
            .state
            .segment_loop()
            .is_some_and(|active| active.segment_id == id);

        if was_looping || self.store.current_id() == Some(id) {
            self.store.set_current(None);
            self.hide_boundary();

            if self.video_path.is_some() && !matches!(self.state, PlaybackState::Stopped) {
                self.media.pause();
                self.set_state(PlaybackState::Paused { segment_loop: None });
            }
        }

        self.persist = Some(if self.store.is_empty() {
            PersistRequest::DeleteSidecar
        } else {
            PersistRequest::Save
        });

        Ok(removed)
    }

    // ===== Persistence =====

    /// Session state to persist, if a video is loaded
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.video_path.as_ref()?;

        let segment_loop = self.state.segment_loop();

        Some(SessionSnapshot {
            segments: self.store.segments().to_vec(),
            loop_mode: self.store.loop_mode(),
            last_position: self.media.current_time(),
            was_playing_segments: segment_loop.is_some(),
            was_playing_single_segment: segment_loop
                .is_some_and(|active| active.scope == LoopScope::Single),
            last_segment_id: self.store.current_id(),
        })
    }

    /// Take the pending persistence request
    pub fn take_persist_request(&mut self) -> Option<PersistRequest> {
        self.persist.take()
    }

    fn request_save(&mut self) {
        // A pending sidecar delete is never downgraded
        if self.persist != Some(PersistRequest::DeleteSidecar) || !self.store.is_empty() {
            self.persist = Some(PersistRequest::Save);
        }
    }

    // ===== Accessors =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn store(&self) -> &SegmentStore {
        &self.store
    }

    pub fn segments(&self) -> &[Segment] {
        self.store.segments()
    }

    pub fn current_segment(&self) -> Option<&Segment> {
        self.store.current()
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.store.loop_mode()
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn video_path(&self) -> Option<&Path> {
        self.video_path.as_deref()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn position(&self) -> Duration {
        self.media.current_time()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_start(&self) -> Option<Duration> {
        self.pending_start
    }

    pub fn boundary(&self) -> BoundaryDrag {
        self.boundary
    }

    pub fn is_loaded(&self) -> bool {
        self.video_path.is_some()
    }

    // ===== Events =====

    /// Take queued events in emission order
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.flush_store_events();
        std::mem::take(&mut self.pending_events)
    }

    fn flush_store_events(&mut self) {
        let store_events = self.store.drain_events();
        self.pending_events.extend(store_events);
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.flush_store_events();
        self.pending_events.push(event);
    }

    fn emit_position(&mut self, position: Duration) {
        self.emit(PlaybackEvent::PositionChanged {
            position_ms: position.as_millis() as u64,
            duration_ms: self.duration.as_millis() as u64,
        });
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }

        tracing::debug!(from = ?self.state, to = ?state, "Playback state changed");
        self.state = state;
        self.emit(PlaybackEvent::StateChanged {
            state: state.into(),
        });
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.video_path.is_none() {
            return Err(PlaybackError::NoVideoLoaded);
        }
        Ok(())
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state)
            .field("video_path", &self.video_path)
            .field("segments", &self.store.len())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
