//! Sidecar metadata files
//!
//! `<video path><suffix>` next to each video, pretty-printed JSON. Reads
//! never fail the caller: a missing, corrupt or stale sidecar is simply "no
//! prior state". Writes surface their errors.

use crate::error::{Result, StorageError};
use crate::fingerprint::{compute_fingerprint, fingerprints_match, DEFAULT_WINDOW};
use crate::metadata::VideoMetadata;
use chrono::Utc;
use looper_playback::SessionSnapshot;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Default sidecar suffix
pub const DEFAULT_SUFFIX: &str = ".cornieloop";

/// Reads and writes sidecar files
#[derive(Debug, Clone)]
pub struct SidecarStore {
    suffix: String,
    fingerprint_window: usize,
}

impl Default for SidecarStore {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX, DEFAULT_WINDOW)
    }
}

impl SidecarStore {
    pub fn new(suffix: impl Into<String>, fingerprint_window: usize) -> Self {
        Self {
            suffix: suffix.into(),
            fingerprint_window,
        }
    }

    /// Sidecar location for `video`: the video path with the suffix appended
    pub fn sidecar_path(&self, video: &Path) -> PathBuf {
        let mut path = OsString::from(video.as_os_str());
        path.push(&self.suffix);
        PathBuf::from(path)
    }

    /// Fingerprint of `video` with this store's window
    pub fn fingerprint(&self, video: &Path) -> String {
        compute_fingerprint(video, self.fingerprint_window)
    }

    /// Write metadata, stamping `last_modified` and the fingerprint
    pub fn save(&self, metadata: &mut VideoMetadata) -> Result<PathBuf> {
        if metadata.video_file_path.as_os_str().is_empty() {
            return Err(StorageError::InvalidPath(metadata.video_file_path.clone()));
        }

        metadata.last_modified = Utc::now();
        metadata.video_file_hash = self.fingerprint(&metadata.video_file_path);

        let path = self.sidecar_path(&metadata.video_file_path);
        let json = serde_json::to_string_pretty(metadata)?;
        fs::write(&path, json)?;

        tracing::debug!(
            "Saved {} segment(s) to {}",
            metadata.segments.len(),
            path.display()
        );
        Ok(path)
    }

    /// Persist a live session for `video`
    pub fn save_snapshot(&self, video: &Path, snapshot: &SessionSnapshot) -> Result<VideoMetadata> {
        let mut metadata = VideoMetadata::from_snapshot(video, snapshot);
        self.save(&mut metadata)?;
        Ok(metadata)
    }

    /// Load and validate the sidecar for `video`
    ///
    /// `None` when there is no sidecar, it cannot be parsed, or the video's
    /// fingerprint no longer matches.
    pub fn load(&self, video: &Path) -> Option<VideoMetadata> {
        let path = self.sidecar_path(video);
        if !path.exists() {
            return None;
        }

        let metadata = match Self::read(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Failed to load metadata from {}: {}", path.display(), e);
                return None;
            }
        };

        let actual = self.fingerprint(video);
        if !fingerprints_match(&actual, &metadata.video_file_hash) {
            tracing::info!(
                "Ignoring stale metadata for {} (fingerprint {} != {})",
                video.display(),
                actual,
                metadata.video_file_hash
            );
            return None;
        }

        Some(metadata)
    }

    fn read(path: &Path) -> Result<VideoMetadata> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Remove the sidecar for `video`; returns whether one existed
    pub fn delete(&self, video: &Path) -> Result<bool> {
        let path = self.sidecar_path(video);

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
