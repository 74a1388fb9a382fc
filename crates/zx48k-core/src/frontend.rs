//! Host-side callbacks a machine delivers output to and polls input from.

use crate::peripherals::{JoystickState, SpectrumKey};

/// Severity of a message sent to the host log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Informational.
    Info,
    /// Recoverable problem.
    Warn,
    /// Failed operation.
    Error,
}

/// Host integration: video and audio sinks, input source, and log sink.
///
/// Only [`Frontend::video_refresh`] is required.
pub trait Frontend {
    /// Receives the visible frame: `height` rows of `width` XRGB8888 pixels,
    /// `pitch_bytes` apart.
    fn video_refresh(&mut self, pixels: &[u32], width: usize, height: usize, pitch_bytes: usize);

    /// Receives one batch of interleaved stereo samples.
    fn audio_sample_batch(&mut self, _samples: &[i16]) {}

    /// Called once per [`run_frame`](crate::Spectrum48k::run_frame) before input is read.
    fn input_poll(&mut self) {}

    /// Whether the host currently holds `key`.
    fn key_pressed(&self, _key: SpectrumKey) -> bool {
        false
    }

    /// Current host joystick state.
    fn joystick(&self) -> JoystickState {
        JoystickState::default()
    }

    /// Host log sink.
    fn log(&mut self, _level: LogLevel, _message: &str) {}
}

/// Frontend that discards all output and reports no input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFrontend;

impl Frontend for NullFrontend {
    fn video_refresh(&mut self, _pixels: &[u32], _width: usize, _height: usize, _pitch: usize) {}
}
