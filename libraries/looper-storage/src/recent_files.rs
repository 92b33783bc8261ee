//! Recent-file registry
//!
//! Most-recent-first list of opened videos, capped, persisted as a JSON
//! array of paths in the per-user data directory.

use crate::error::{Result, StorageError};
use std::fs;
use std::path::{Path, PathBuf};

/// Default capacity
pub const DEFAULT_MAX_RECENT: usize = 10;

/// Registry file name inside the data directory
pub const RECENT_FILES_NAME: &str = "recent_files.json";

/// Bounded MRU list of video paths
#[derive(Debug, Clone)]
pub struct RecentFiles {
    /// Backing JSON file
    path: PathBuf,

    /// Maximum number of entries
    capacity: usize,

    /// Entries, most recent first
    files: Vec<PathBuf>,
}

impl RecentFiles {
    /// Load the registry stored in `data_dir`
    pub fn open(data_dir: &Path, capacity: usize) -> Self {
        Self::load(data_dir.join(RECENT_FILES_NAME), capacity)
    }

    /// Load the registry at `path`
    ///
    /// Entries whose file no longer exists are dropped. An unreadable
    /// registry starts empty.
    pub fn load(path: PathBuf, capacity: usize) -> Self {
        let files = match Self::read(&path) {
            Ok(files) => files,
            Err(e) => {
                if path.exists() {
                    tracing::warn!("Failed to read recent files {}: {}", path.display(), e);
                }
                Vec::new()
            }
        };

        let mut files: Vec<PathBuf> = files.into_iter().filter(|f| f.exists()).collect();
        files.truncate(capacity);

        Self {
            path,
            capacity,
            files,
        }
    }

    fn read(path: &Path) -> Result<Vec<PathBuf>> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Move `file` to the front, dropping the oldest entry beyond capacity
    pub fn add(&mut self, file: &Path) -> Result<()> {
        if file.as_os_str().is_empty() {
            return Err(StorageError::InvalidPath(file.to_path_buf()));
        }

        self.files.retain(|f| f != file);
        self.files.insert(0, file.to_path_buf());
        self.files.truncate(self.capacity);

        self.save()
    }

    /// Remove `file`; returns whether it was listed
    pub fn remove(&mut self, file: &Path) -> Result<bool> {
        let before = self.files.len();
        self.files.retain(|f| f != file);

        if self.files.len() == before {
            return Ok(false);
        }

        self.save()?;
        Ok(true)
    }

    /// Remove every entry
    pub fn clear(&mut self) -> Result<()> {
        self.files.clear();
        self.save()
    }

    /// Entries, most recent first
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.files.iter().any(|f| f == file)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.files)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
