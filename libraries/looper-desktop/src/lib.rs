//! Desktop runtime for the segment looper
//!
//! Runs a [`looper_playback::PlaybackController`] on a dedicated control
//! thread and wires it to storage and a media backend.
//!
//! # Features
//!
//! - Command/event channels (`crossbeam-channel`)
//! - 50 ms position poll that enforces segment boundaries
//! - Backend notifications marshaled onto the control thread
//! - Deferred end-of-media restart on a worker thread
//! - Cancellable load preparation (file check, fingerprint, sidecar)
//! - Sidecar and recent-file persistence after every structural change
//! - Headless wall-clock backend for running without a video engine
//!
//! # Example
//!
//! ```no_run
//! use looper_desktop::{Engine, EngineCommand, EngineConfig, HeadlessPlayer, Session};
//! use looper_storage::{RecentFiles, SidecarStore};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(
//!     SidecarStore::default(),
//!     RecentFiles::open(&looper_storage::default_data_dir(), 10),
//! );
//! let engine = Engine::spawn(
//!     Box::new(HeadlessPlayer::default()),
//!     EngineConfig::default(),
//!     session,
//! )?;
//!
//! engine.send(EngineCommand::LoadVideo(PathBuf::from("/videos/lesson.mp4")))?;
//! engine.send(EngineCommand::MarkStart)?;
//! engine.send(EngineCommand::MarkEnd)?;
//!
//! while let Some(event) = engine.try_recv_event() {
//!     println!("{:?}", event);
//! }
//!
//! engine.shutdown()?;
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
pub mod headless;
pub mod loader;
mod restart;
mod session;

pub use config::EngineConfig;
pub use engine::{Engine, EngineCommand, EngineHandle, EngineStatus};
pub use error::{EngineError, Result};
pub use headless::HeadlessPlayer;
pub use loader::{LoadToken, Loader, Prepared};
pub use restart::RestartWorker;
pub use session::Session;
