//! Volume control
//!
//! Integer level 0-100, clamped on every write. Mute is separate from the
//! level so unmuting restores what the user had.

/// Volume controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Maximum level
    pub const MAX: u8 = 100;

    /// Create new volume controller, clamping `level` to 0-100
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(Self::MAX),
            muted: false,
        }
    }

    /// Set volume level, clamped to 0-100
    ///
    /// Accepts any integer so callers can pass raw user input.
    pub fn set_level(&mut self, level: i32) {
        self.level = level.clamp(0, i32::from(Self::MAX)) as u8;
    }

    /// Change level by a signed delta, clamped to 0-100
    pub fn adjust(&mut self, delta: i32) {
        self.set_level(i32::from(self.level).saturating_add(delta));
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Mute audio (preserves volume level)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Unmute audio (restores previous volume)
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level to push to the backend (0 while muted)
    pub fn effective_level(&self) -> u8 {
        if self.muted {
            0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(Self::MAX)
    }
}
