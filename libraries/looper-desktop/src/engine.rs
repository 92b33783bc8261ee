//! Control thread
//!
//! Owns the [`PlaybackController`] and serializes everything that touches
//! it: user commands, backend notifications, the position poll, finished
//! load preparations and deferred restarts.
//!
//! ```text
//!  commands ──┐
//!  notifications ──┐          ┌──> events
//!  prepared loads ─┼─ select! ┤
//!  restart plans ──┤          └──> session (sidecar / recent files)
//!  poll tick ──────┘
//! ```

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::loader::{Loader, Prepared};
use crate::restart::RestartWorker;
use crate::session::Session;
use crossbeam_channel::{bounded, select, tick, unbounded, Receiver, Sender};
use looper_playback::{
    LoopMode, MediaNotification, MediaPlayer, PlaybackController, PlaybackError, PlaybackEvent,
    PlaybackState, RestartPlan, Segment, SegmentId, Volume,
};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long [`EngineHandle::status`] waits for the control thread
const STATUS_TIMEOUT: Duration = Duration::from_secs(2);

/// Commands accepted by the control thread
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Open a video, saving the current one first
    LoadVideo(PathBuf),

    /// Open a recent entry; missing files are dropped from the list
    OpenRecent(PathBuf),

    RemoveRecent(PathBuf),
    ClearRecent,

    Play,
    Pause,
    TogglePlayPause,
    Stop,

    /// Relative seek in seconds
    SeekRelative(f64),

    /// Click-to-seek on the timeline (0-100)
    SeekToPercent(f64),

    ScrubStart,
    ScrubChanged(f64),
    ScrubEnd(f64),

    PlaySegment(SegmentId),
    PlayAllSegments,
    NextSegment,
    PreviousSegment,

    SetLoopMode(LoopMode),
    CycleLoopMode,

    MarkStart,
    MarkEnd,
    BeginHoldRecord,
    EndHoldRecord,

    /// Boundary handle drags (0-100)
    UpdateStartPosition(f64),
    UpdateEndPosition(f64),
    CommitBoundary,

    RenameSegment { id: SegmentId, name: String },
    ReorderSegments(Vec<SegmentId>),
    DeleteSegment(SegmentId),

    SetVolume(i32),
    AdjustVolume(i32),
    Mute,
    Unmute,
    ToggleMute,

    /// Persist the current video's state now
    SaveState,

    /// Reply with a status snapshot
    Query(Sender<EngineStatus>),

    /// Persist and stop the control thread
    Shutdown,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub state: PlaybackState,
    pub video_path: Option<PathBuf>,
    pub position: Duration,
    pub duration: Duration,
    pub segments: Vec<Segment>,
    pub current_segment: Option<SegmentId>,
    pub loop_mode: LoopMode,
    pub volume: Volume,
    pub pending_start: Option<Duration>,
    pub recent_files: Vec<PathBuf>,
}

/// Handle to a running engine
pub struct EngineHandle {
    command_tx: Sender<EngineCommand>,
    event_rx: Receiver<PlaybackEvent>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Send a command to the control thread
    pub fn send(&self, command: EngineCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| EngineError::Disconnected)
    }

    /// Event stream
    pub fn events(&self) -> &Receiver<PlaybackEvent> {
        &self.event_rx
    }

    pub fn try_recv_event(&self) -> Option<PlaybackEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Round-trip a status query
    pub fn status(&self) -> Result<EngineStatus> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(EngineCommand::Query(reply_tx))?;

        reply_rx
            .recv_timeout(STATUS_TIMEOUT)
            .map_err(|_| EngineError::Timeout)
    }

    /// Persist, stop the control thread and wait for it
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        // Already-exited control threads are fine, join below
        let _ = self.command_tx.send(EngineCommand::Shutdown);

        thread.join().map_err(|_| EngineError::Disconnected)
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!("Engine did not shut down cleanly: {}", e);
        }
    }
}

/// Engine entry point
pub struct Engine;

impl Engine {
    /// Start the control thread around `media`
    pub fn spawn(
        mut media: Box<dyn MediaPlayer>,
        config: EngineConfig,
        session: Session,
    ) -> Result<EngineHandle> {
        let (command_tx, command_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let (notify_tx, notify_rx) = unbounded();
        let (prepared_tx, prepared_rx) = unbounded();
        let (restart_tx, restart_rx) = unbounded();

        // Backends call this from their own threads; only marshal here
        media.subscribe(Box::new(move |notification| {
            let _ = notify_tx.send(notification);
        }));

        let restart = RestartWorker::spawn(config.restart_grace, restart_tx)?;
        let loader = Loader::new(session.sidecars().clone(), prepared_tx);
        let controller = PlaybackController::new(media, config.playback.clone());

        let control = ControlLoop {
            controller,
            session,
            loader,
            restart,
            event_tx,
        };
        let channels = Inbound {
            commands: command_rx,
            notifications: notify_rx,
            prepared: prepared_rx,
            restarts: restart_rx,
        };
        let poll_interval = config.poll_interval;

        let thread = thread::Builder::new()
            .name("looper-control".to_string())
            .spawn(move || control.run(&channels, poll_interval))
            .map_err(EngineError::Spawn)?;

        tracing::info!("Engine started");

        Ok(EngineHandle {
            command_tx,
            event_rx,
            thread: Some(thread),
        })
    }
}

struct Inbound {
    commands: Receiver<EngineCommand>,
    notifications: Receiver<MediaNotification>,
    prepared: Receiver<Prepared>,
    restarts: Receiver<RestartPlan>,
}

struct ControlLoop {
    controller: PlaybackController,
    session: Session,
    loader: Loader,
    restart: RestartWorker,
    event_tx: Sender<PlaybackEvent>,
}

impl ControlLoop {
    fn run(mut self, inbound: &Inbound, poll_interval: Duration) {
        let ticker = tick(poll_interval);

        loop {
            select! {
                recv(inbound.commands) -> command => match command {
                    Ok(EngineCommand::Shutdown) | Err(_) => break,
                    Ok(command) => self.handle_command(command),
                },
                recv(inbound.notifications) -> notification => {
                    if let Ok(notification) = notification {
                        self.handle_notification(notification);
                    }
                },
                recv(inbound.prepared) -> prepared => {
                    if let Ok(prepared) = prepared {
                        self.finish_load(prepared);
                    }
                },
                recv(inbound.restarts) -> plan => {
                    if let Ok(plan) = plan {
                        self.controller.restart(plan);
                    }
                },
                recv(ticker) -> _ => self.controller.on_position_tick(),
            }

            self.flush();
        }

        self.shutdown();
    }

    fn handle_command(&mut self, command: EngineCommand) {
        let result = match command {
            EngineCommand::LoadVideo(path) => self.begin_load(path),
            EngineCommand::OpenRecent(path) => self.open_recent(path),
            EngineCommand::RemoveRecent(path) => self.remove_recent(&path),
            EngineCommand::ClearRecent => self.clear_recent(),

            EngineCommand::Play => self.controller.play().map_err(Into::into),
            EngineCommand::Pause => self.controller.pause().map_err(Into::into),
            EngineCommand::TogglePlayPause => self.controller.toggle_play_pause().map_err(Into::into),
            EngineCommand::Stop => self.controller.stop().map_err(Into::into),
            EngineCommand::SeekRelative(seconds) => {
                self.controller.seek_relative(seconds).map_err(Into::into)
            }
            EngineCommand::SeekToPercent(percent) => {
                self.controller.seek_to_percent(percent).map_err(Into::into)
            }

            EngineCommand::ScrubStart => {
                self.controller.on_scrub_start();
                Ok(())
            }
            EngineCommand::ScrubChanged(percent) => {
                self.controller.on_scrub_changed(percent);
                Ok(())
            }
            EngineCommand::ScrubEnd(percent) => {
                self.controller.on_scrub_end(percent);
                Ok(())
            }

            EngineCommand::PlaySegment(id) => self.controller.play_segment(id).map_err(Into::into),
            EngineCommand::PlayAllSegments => {
                self.controller.play_all_segments().map_err(Into::into)
            }
            EngineCommand::NextSegment => self.controller.select_next_segment().map_err(Into::into),
            EngineCommand::PreviousSegment => {
                self.controller.select_previous_segment().map_err(Into::into)
            }

            EngineCommand::SetLoopMode(mode) => {
                self.controller.set_loop_mode(mode);
                Ok(())
            }
            EngineCommand::CycleLoopMode => {
                self.controller.cycle_loop_mode();
                Ok(())
            }

            EngineCommand::MarkStart => self.controller.mark_start().map_err(Into::into),
            EngineCommand::MarkEnd => self.controller.mark_end().map(drop).map_err(Into::into),
            EngineCommand::BeginHoldRecord => {
                if !self.controller.begin_hold_record() {
                    tracing::debug!("Hold-record ignored, not playing");
                }
                Ok(())
            }
            EngineCommand::EndHoldRecord => {
                self.controller.end_hold_record().map(drop).map_err(Into::into)
            }

            EngineCommand::UpdateStartPosition(percent) => {
                self.controller.update_start_position(percent);
                Ok(())
            }
            EngineCommand::UpdateEndPosition(percent) => {
                self.controller.update_end_position(percent);
                Ok(())
            }
            EngineCommand::CommitBoundary => {
                self.controller.commit_boundary_change().map_err(Into::into)
            }

            EngineCommand::RenameSegment { id, name } => {
                self.controller.rename_segment(id, name).map_err(Into::into)
            }
            EngineCommand::ReorderSegments(ids) => {
                self.controller.reorder_segments(&ids);
                Ok(())
            }
            EngineCommand::DeleteSegment(id) => {
                self.controller.delete_segment(id).map(drop).map_err(Into::into)
            }

            EngineCommand::SetVolume(level) => {
                self.controller.set_volume(level);
                Ok(())
            }
            EngineCommand::AdjustVolume(delta) => {
                self.controller.adjust_volume(delta);
                Ok(())
            }
            EngineCommand::Mute => {
                self.controller.mute();
                Ok(())
            }
            EngineCommand::Unmute => {
                self.controller.unmute();
                Ok(())
            }
            EngineCommand::ToggleMute => {
                self.controller.toggle_mute();
                Ok(())
            }

            EngineCommand::SaveState => self.session.save_current(&self.controller),
            EngineCommand::Query(reply) => {
                let _ = reply.send(self.status());
                Ok(())
            }
            EngineCommand::Shutdown => Ok(()),
        };

        if let Err(e) = result {
            self.report(&e);
        }
    }

    fn handle_notification(&mut self, notification: MediaNotification) {
        if let Some(plan) = self.controller.on_media_notification(notification) {
            tracing::debug!(generation = plan.generation, "End of media, restart deferred");
            self.restart.schedule(plan);
        }
    }

    // ===== Loading =====

    fn begin_load(&mut self, path: PathBuf) -> Result<()> {
        // A failed save of the outgoing video never blocks the new one
        if let Err(e) = self.session.save_current(&self.controller) {
            self.report(&e);
        }

        tracing::info!("Opening {}", path.display());
        self.send(PlaybackEvent::Status {
            message: format!("Loading {}", display_name(&path)),
        });

        self.loader.request(path)?;
        Ok(())
    }

    fn open_recent(&mut self, path: PathBuf) -> Result<()> {
        if path.is_file() {
            return self.begin_load(path);
        }

        self.session.forget(&path)?;
        self.send_recent_files();
        Err(EngineError::FileNotFound(path))
    }

    fn finish_load(&mut self, prepared: Prepared) {
        if !self.loader.is_current(prepared.generation) {
            tracing::debug!(
                generation = prepared.generation,
                "Dropping stale load of {}",
                prepared.path.display()
            );
            return;
        }

        let path = prepared.path;
        let snapshot = match prepared.outcome {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Cannot open {}: {}", path.display(), e);
                self.send(PlaybackEvent::LoadFailed {
                    path,
                    message: e.to_string(),
                });
                return;
            }
        };

        if let Err(e) = self.controller.load_video(&path) {
            // Controller already emitted LoadFailed
            tracing::warn!("Failed to load {}: {}", path.display(), e);
            return;
        }

        let restored = snapshot.is_some();
        if let Err(e) = self.controller.restore(snapshot) {
            self.report(&EngineError::from(e));
        }

        tracing::info!(
            segments = self.controller.segments().len(),
            restored,
            "Loaded {}",
            path.display()
        );

        // VideoLoaded goes out ahead of the registry update
        self.flush();

        match self.session.remember(&path) {
            Ok(()) => self.send_recent_files(),
            Err(e) => self.report(&e),
        }
    }

    // ===== Recent files =====

    fn remove_recent(&mut self, path: &std::path::Path) -> Result<()> {
        if self.session.forget(path)? {
            self.send_recent_files();
        }
        Ok(())
    }

    fn clear_recent(&mut self) -> Result<()> {
        self.session.clear_recent()?;
        self.send_recent_files();
        Ok(())
    }

    fn send_recent_files(&self) {
        self.send(PlaybackEvent::RecentFilesChanged {
            files: self.session.recent_files().to_vec(),
        });
    }

    // ===== Output =====

    fn status(&self) -> EngineStatus {
        EngineStatus {
            state: self.controller.state(),
            video_path: self.controller.video_path().map(|p| p.to_path_buf()),
            position: self.controller.position(),
            duration: self.controller.duration(),
            segments: self.controller.segments().to_vec(),
            current_segment: self.controller.current_segment().map(|s| s.id),
            loop_mode: self.controller.loop_mode(),
            volume: self.controller.volume(),
            pending_start: self.controller.pending_start(),
            recent_files: self.session.recent_files().to_vec(),
        }
    }

    /// Forward queued controller events and carry out persistence requests
    fn flush(&mut self) {
        if let Err(e) = self.session.apply_persist_request(&mut self.controller) {
            self.report(&e);
        }

        for event in self.controller.drain_events() {
            self.send(event);
        }
    }

    /// User-correctable problems become status messages, the rest errors
    fn report(&self, error: &EngineError) {
        let event = match error {
            EngineError::Playback(
                PlaybackError::NoVideoLoaded
                | PlaybackError::NoSegments
                | PlaybackError::NoPendingMarker
                | PlaybackError::InvalidBoundary(_)
                | PlaybackError::InvalidOperation(_),
            ) => PlaybackEvent::Status {
                message: error.to_string(),
            },
            _ => {
                tracing::warn!("{}", error);
                PlaybackEvent::Error {
                    message: error.to_string(),
                }
            }
        };

        self.send(event);
    }

    fn send(&self, event: PlaybackEvent) {
        // Nobody listening is not an error for the engine
        let _ = self.event_tx.send(event);
    }

    fn shutdown(&mut self) {
        tracing::info!("Engine shutting down");

        self.loader.cancel();
        if let Err(e) = self.session.save_current(&self.controller) {
            self.report(&e);
        }

        self.controller.unload();
        self.flush();
        self.restart.shutdown();
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
