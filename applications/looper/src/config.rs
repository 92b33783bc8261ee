/// Application configuration
use config::ConfigError;
use looper_desktop::EngineConfig;
use looper_playback::PlaybackConfig;
use looper_storage::{RecentFiles, SidecarStore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "looper.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LooperConfig {
    #[serde(default = "default_engine")]
    pub engine: EngineSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_headless")]
    pub headless: HeadlessSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_seek_throttle_ms")]
    pub seek_throttle_ms: u64,

    #[serde(default = "default_restart_grace_ms")]
    pub restart_grace_ms: u64,

    #[serde(default = "default_priming_timeout_ms")]
    pub priming_timeout_ms: u64,

    #[serde(default = "default_initial_volume")]
    pub initial_volume: u8,

    #[serde(default = "default_hold_record_min_ms")]
    pub hold_record_min_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Recent-files location; platform data directory when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_sidecar_suffix")]
    pub sidecar_suffix: String,

    #[serde(default = "default_fingerprint_window")]
    pub fingerprint_window: usize,

    #[serde(default = "default_max_recent_files")]
    pub max_recent_files: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeadlessSettings {
    /// File bytes per second of estimated media
    #[serde(default = "default_bytes_per_second")]
    pub bytes_per_second: u64,
}

impl LooperConfig {
    /// Load configuration from file and environment
    ///
    /// `path` wins over `looper.toml` in the working directory. Environment
    /// variables (`LOOPER_ENGINE__POLL_INTERVAL_MS`, ...) override both.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("LOOPER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        settings.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("engine.poll_interval_ms", self.engine.poll_interval_ms),
            ("engine.seek_throttle_ms", self.engine.seek_throttle_ms),
            ("engine.priming_timeout_ms", self.engine.priming_timeout_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Message(format!("{name} must be greater than 0")));
        }

        if self.engine.initial_volume > 100 {
            return Err(ConfigError::Message(format!(
                "engine.initial_volume must be 0-100, got {}",
                self.engine.initial_volume
            )));
        }

        if self.storage.sidecar_suffix.is_empty() {
            return Err(ConfigError::Message(
                "storage.sidecar_suffix must not be empty".to_string(),
            ));
        }

        if self.storage.fingerprint_window == 0 {
            return Err(ConfigError::Message(
                "storage.fingerprint_window must be greater than 0".to_string(),
            ));
        }

        if self.storage.max_recent_files == 0 {
            return Err(ConfigError::Message(
                "storage.max_recent_files must be greater than 0".to_string(),
            ));
        }

        if self.headless.bytes_per_second == 0 {
            return Err(ConfigError::Message(
                "headless.bytes_per_second must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        let engine = &self.engine;

        EngineConfig {
            playback: PlaybackConfig {
                volume: engine.initial_volume,
                seek_throttle: Duration::from_millis(engine.seek_throttle_ms),
                priming_timeout: Duration::from_millis(engine.priming_timeout_ms),
                hold_record_min: Duration::from_millis(engine.hold_record_min_ms),
                ..PlaybackConfig::default()
            },
            poll_interval: Duration::from_millis(engine.poll_interval_ms),
            restart_grace: Duration::from_millis(engine.restart_grace_ms),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(looper_storage::default_data_dir)
    }

    pub fn sidecar_store(&self) -> SidecarStore {
        SidecarStore::new(
            self.storage.sidecar_suffix.clone(),
            self.storage.fingerprint_window,
        )
    }

    pub fn recent_files(&self) -> RecentFiles {
        RecentFiles::open(&self.data_dir(), self.storage.max_recent_files)
    }
}

// Default values
fn default_engine() -> EngineSettings {
    EngineSettings {
        poll_interval_ms: default_poll_interval_ms(),
        seek_throttle_ms: default_seek_throttle_ms(),
        restart_grace_ms: default_restart_grace_ms(),
        priming_timeout_ms: default_priming_timeout_ms(),
        initial_volume: default_initial_volume(),
        hold_record_min_ms: default_hold_record_min_ms(),
    }
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_seek_throttle_ms() -> u64 {
    50
}

fn default_restart_grace_ms() -> u64 {
    100
}

fn default_priming_timeout_ms() -> u64 {
    5_000
}

fn default_initial_volume() -> u8 {
    100
}

fn default_hold_record_min_ms() -> u64 {
    200
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        data_dir: None,
        sidecar_suffix: default_sidecar_suffix(),
        fingerprint_window: default_fingerprint_window(),
        max_recent_files: default_max_recent_files(),
    }
}

fn default_sidecar_suffix() -> String {
    looper_storage::sidecar::DEFAULT_SUFFIX.to_string()
}

fn default_fingerprint_window() -> usize {
    looper_storage::fingerprint::DEFAULT_WINDOW
}

fn default_max_recent_files() -> usize {
    looper_storage::recent_files::DEFAULT_MAX_RECENT
}

fn default_headless() -> HeadlessSettings {
    HeadlessSettings {
        bytes_per_second: default_bytes_per_second(),
    }
}

fn default_bytes_per_second() -> u64 {
    looper_desktop::headless::DEFAULT_BYTES_PER_SECOND
}

impl Default for LooperConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            storage: default_storage(),
            headless: default_headless(),
        }
    }
}
