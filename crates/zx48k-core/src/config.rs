//! Machine configuration.

use crate::error::ConfigError;

/// Spectrum 48K CPU clock.
pub const DEFAULT_CLOCK_HZ: u32 = 3_500_000;
/// PAL frame period.
pub const DEFAULT_FRAME_US: u32 = 20_000;
/// Host audio rate.
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 44_100;
/// Stereo frames per audio batch.
pub const DEFAULT_AUDIO_BATCH_FRAMES: usize = 128;
/// Default breakpoint and watchpoint capacity.
pub const DEFAULT_POINT_CAPACITY: usize = 256;

/// Joystick interface wired to the ULA port space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum JoystickType {
    /// No joystick; port `0x1F` reads as unmapped.
    None,
    /// Kempston interface on port `0x1F`.
    #[default]
    Kempston,
}

/// Immutable configuration for one machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MachineConfig {
    /// CPU clock in ticks per second.
    pub clock_hz: u32,
    /// Frame period in microseconds.
    pub frame_us: u32,
    /// Audio output rate in stereo frames per second.
    pub audio_sample_rate: u32,
    /// Stereo frames per delivered audio batch.
    pub audio_batch_frames: usize,
    /// Minimum frames a pressed key stays down.
    pub keyboard_sticky_frames: u32,
    /// Maximum simultaneously active breakpoints.
    pub max_break_points: usize,
    /// Maximum simultaneously active watchpoints.
    pub max_watch_points: usize,
    /// Joystick interface.
    pub joystick: JoystickType,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            frame_us: DEFAULT_FRAME_US,
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            audio_batch_frames: DEFAULT_AUDIO_BATCH_FRAMES,
            keyboard_sticky_frames: 1,
            max_break_points: DEFAULT_POINT_CAPACITY,
            max_watch_points: DEFAULT_POINT_CAPACITY,
            joystick: JoystickType::Kempston,
        }
    }
}

impl MachineConfig {
    /// Ticks per frame: `clock_hz * frame_us / 1_000_000`.
    #[must_use]
    pub const fn frame_quantum_wide(&self) -> u64 {
        self.clock_hz as u64 * self.frame_us as u64 / 1_000_000
    }

    /// Ticks per frame, saturated into a tick counter.
    ///
    /// Only meaningful after [`MachineConfig::validate`] succeeded.
    #[must_use]
    pub const fn frame_quantum(&self) -> u32 {
        let wide = self.frame_quantum_wide();
        if wide > u32::MAX as u64 {
            u32::MAX
        } else {
            wide as u32
        }
    }

    /// Checks that every rate and size is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first unusable field.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.clock_hz == 0 {
            return Err(ConfigError::Zero("clock_hz"));
        }
        if self.frame_us == 0 {
            return Err(ConfigError::Zero("frame_us"));
        }
        if self.audio_sample_rate == 0 {
            return Err(ConfigError::Zero("audio_sample_rate"));
        }
        if self.audio_batch_frames == 0 {
            return Err(ConfigError::Zero("audio_batch_frames"));
        }
        let quantum = self.frame_quantum_wide();
        if quantum == 0 || quantum > i32::MAX as u64 {
            return Err(ConfigError::QuantumOutOfRange(quantum));
        }
        Ok(())
    }
}
