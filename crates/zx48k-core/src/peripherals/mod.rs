//! Spectrum 48K peripherals behind the ULA.

pub mod beeper;
pub mod joystick;
pub mod keyboard;
pub mod ula;

pub use beeper::Beeper;
pub use joystick::JoystickState;
pub use keyboard::{KeyEdges, Keyboard, SpectrumKey, KEY_COUNT};
pub use ula::{Ula, VideoBuffers, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Kempston joystick port (low address byte).
pub const KEMPSTON_PORT: u8 = 0x1F;
