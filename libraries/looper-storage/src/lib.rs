//! Looper storage
//!
//! File-based persistence for the segment looper:
//! - Sidecar metadata next to each video, validated by a content fingerprint
//! - Recent-file registry in the per-user data directory
//!
//! Nothing here blocks opening a video: read failures degrade to "no prior
//! state" and are logged, write failures are returned to the caller.

pub mod error;
pub mod fingerprint;
pub mod metadata;
pub mod recent_files;
pub mod sidecar;
pub mod timespan;

pub use error::{Result, StorageError};
pub use fingerprint::{compute_fingerprint, fingerprints_match};
pub use metadata::{SegmentRecord, VideoMetadata};
pub use recent_files::RecentFiles;
pub use sidecar::SidecarStore;

use std::path::PathBuf;

/// Application folder name inside the platform data directory
pub const APP_DIR_NAME: &str = "looper";

/// Per-user data directory (`%LOCALAPPDATA%\looper`, `~/.local/share/looper`, ...)
///
/// Falls back to the working directory when the platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
