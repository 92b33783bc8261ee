//! Session persistence glue
//!
//! Connects the controller's persistence requests to the sidecar store and
//! keeps the recent-file registry up to date. Runs on the control thread.

use crate::error::Result;
use looper_playback::{PersistRequest, PlaybackController, SessionSnapshot};
use looper_storage::{RecentFiles, SidecarStore};
use std::path::{Path, PathBuf};

/// Storage collaborators of a running engine
#[derive(Debug, Clone)]
pub struct Session {
    sidecars: SidecarStore,
    recent: RecentFiles,
}

impl Session {
    pub fn new(sidecars: SidecarStore, recent: RecentFiles) -> Self {
        Self { sidecars, recent }
    }

    pub fn sidecars(&self) -> &SidecarStore {
        &self.sidecars
    }

    pub fn recent_files(&self) -> &[PathBuf] {
        self.recent.files()
    }

    /// Carry out whatever the last controller operations asked for
    pub fn apply_persist_request(&mut self, controller: &mut PlaybackController) -> Result<()> {
        let Some(request) = controller.take_persist_request() else {
            return Ok(());
        };

        let Some(video) = controller.video_path().map(Path::to_path_buf) else {
            return Ok(());
        };

        match request {
            PersistRequest::Save => {
                if let Some(snapshot) = controller.snapshot() {
                    self.save(&video, &snapshot)?;
                }
            }
            PersistRequest::DeleteSidecar => {
                if self.sidecars.delete(&video)? {
                    tracing::info!("Removed metadata for {}", video.display());
                }
            }
        }

        Ok(())
    }

    /// Persist the loaded video's state; no-op when nothing is loaded
    pub fn save_current(&mut self, controller: &PlaybackController) -> Result<()> {
        let (Some(video), Some(snapshot)) = (controller.video_path(), controller.snapshot()) else {
            return Ok(());
        };

        self.save(video, &snapshot)
    }

    fn save(&self, video: &Path, snapshot: &SessionSnapshot) -> Result<()> {
        self.sidecars.save_snapshot(video, snapshot)?;
        Ok(())
    }

    /// Record a successfully opened video
    pub fn remember(&mut self, video: &Path) -> Result<()> {
        self.recent.add(video)?;
        Ok(())
    }

    /// Drop a recent entry; returns whether it was listed
    pub fn forget(&mut self, video: &Path) -> Result<bool> {
        Ok(self.recent.remove(video)?)
    }

    pub fn clear_recent(&mut self) -> Result<()> {
        self.recent.clear()?;
        Ok(())
    }
}
