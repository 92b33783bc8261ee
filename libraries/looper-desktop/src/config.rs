//! Engine timing configuration

use looper_playback::PlaybackConfig;
use std::time::Duration;

/// Control-thread configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Controller settings (volume, loop mode, throttles, priming)
    pub playback: PlaybackConfig,

    /// Position poll period while playing (default: 50ms)
    pub poll_interval: Duration,

    /// Delay before restarting after end of media (default: 100ms)
    pub restart_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            poll_interval: Duration::from_millis(50),
            restart_grace: Duration::from_millis(100),
        }
    }
}
