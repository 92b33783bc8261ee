//! Background load preparation
//!
//! Opening a video starts with file checks and a sidecar read (which hashes
//! the head of the video). That work runs on a short-lived thread so the
//! control thread keeps serving commands.
//!
//! ```text
//! Control Thread                 Prep Thread
//!       │  request(path) -> token      │
//!       │─────────────────────────────>│ exists? / sidecar + fingerprint
//!       │                              │ (token checked between steps)
//!       │  Prepared { generation, .. } │
//!       │<─────────────────────────────│
//!       │ is_current(generation)?      │
//! ```
//!
//! Every request bumps a shared generation counter. A newer request makes
//! every older token stale, so superseded work stops early and results that
//! still arrive are dropped by the control thread.

use crate::error::{EngineError, Result};
use crossbeam_channel::Sender;
use looper_playback::SessionSnapshot;
use looper_storage::SidecarStore;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Cancellation handle for one load request
#[derive(Debug, Clone)]
pub struct LoadToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl LoadToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a newer request has superseded this one
    pub fn is_cancelled(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.generation
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Result of preparing a load
#[derive(Debug)]
pub struct Prepared {
    pub generation: u64,
    pub path: PathBuf,

    /// Restorable session, or why the video cannot be opened
    pub outcome: Result<Option<SessionSnapshot>>,
}

/// Spawns preparation threads and tracks the newest request
pub struct Loader {
    latest: Arc<AtomicU64>,
    sidecars: SidecarStore,
    result_tx: Sender<Prepared>,
}

impl Loader {
    pub fn new(sidecars: SidecarStore, result_tx: Sender<Prepared>) -> Self {
        Self {
            latest: Arc::new(AtomicU64::new(0)),
            sidecars,
            result_tx,
        }
    }

    /// Start preparing `path`, superseding any request in flight
    pub fn request(&self, path: PathBuf) -> Result<LoadToken> {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let token = LoadToken {
            generation,
            latest: Arc::clone(&self.latest),
        };

        let sidecars = self.sidecars.clone();
        let result_tx = self.result_tx.clone();
        let thread_token = token.clone();

        thread::Builder::new()
            .name("looper-loader".to_string())
            .spawn(move || {
                let outcome = Self::prepare(&sidecars, &path, &thread_token);

                if matches!(outcome, Err(EngineError::Cancelled)) {
                    tracing::debug!(generation, "Load of {} superseded", path.display());
                    return;
                }

                // Receiver gone means the engine is shutting down
                let _ = result_tx.send(Prepared {
                    generation,
                    path,
                    outcome,
                });
            })
            .map_err(EngineError::Spawn)?;

        Ok(token)
    }

    fn prepare(
        sidecars: &SidecarStore,
        path: &std::path::Path,
        token: &LoadToken,
    ) -> Result<Option<SessionSnapshot>> {
        token.check()?;

        if !path.is_file() {
            return Err(EngineError::FileNotFound(path.to_path_buf()));
        }

        token.check()?;
        let metadata = sidecars.load(path);

        token.check()?;
        Ok(metadata.map(|m| m.to_snapshot()))
    }

    /// Whether `generation` is the newest request
    pub fn is_current(&self, generation: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == generation
    }

    /// Invalidate every outstanding request
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    #[test]
    fn newer_request_supersedes_older() {
        let (tx, rx) = unbounded();
        let loader = Loader::new(SidecarStore::default(), tx);
        let dir = tempfile::tempdir().unwrap();

        let first = loader.request(dir.path().join("a.mp4")).unwrap();
        let second = loader.request(dir.path().join("b.mp4")).unwrap();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(loader.is_current(second.generation()));
        assert!(!loader.is_current(first.generation()));

        // Only results for the newest request are accepted, whichever arrive
        while let Ok(prepared) = rx.recv_timeout(Duration::from_millis(500)) {
            if loader.is_current(prepared.generation) {
                assert_eq!(prepared.path, dir.path().join("b.mp4"));
                assert!(matches!(
                    prepared.outcome,
                    Err(EngineError::FileNotFound(_))
                ));
                return;
            }
        }
        panic!("no result for the current request");
    }

    #[test]
    fn existing_file_without_sidecar_prepares_none() {
        let (tx, rx) = unbounded();
        let loader = Loader::new(SidecarStore::default(), tx);
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"frames").unwrap();

        let token = loader.request(video.clone()).unwrap();
        let prepared = rx.recv_timeout(Duration::from_secs(2)).unwrap();

        assert_eq!(prepared.generation, token.generation());
        assert_eq!(prepared.path, video);
        assert!(matches!(prepared.outcome, Ok(None)));
    }

    #[test]
    fn cancel_invalidates_outstanding_tokens() {
        let (tx, _rx) = unbounded();
        let loader = Loader::new(SidecarStore::default(), tx);

        let token = loader.request(PathBuf::from("/nonexistent.mp4")).unwrap();
        loader.cancel();

        assert!(token.is_cancelled());
        assert!(!loader.is_current(token.generation()));
    }
}
