//! Frontend that counts delivered output and forwards the core's log to `tracing`.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use zx48k_core::{Frontend, LogLevel};

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct OutputStats {
    pub video_frames: u64,
    pub audio_batches: u64,
    pub audio_samples: u64,
}

pub struct HeadlessFrontend {
    stats: Rc<RefCell<OutputStats>>,
}

impl HeadlessFrontend {
    pub fn new() -> (Self, Rc<RefCell<OutputStats>>) {
        let stats = Rc::new(RefCell::new(OutputStats::default()));
        (
            Self {
                stats: Rc::clone(&stats),
            },
            stats,
        )
    }
}

impl Frontend for HeadlessFrontend {
    fn video_refresh(&mut self, _pixels: &[u32], _width: usize, _height: usize, _pitch: usize) {
        self.stats.borrow_mut().video_frames += 1;
    }

    fn audio_sample_batch(&mut self, samples: &[i16]) {
        let mut stats = self.stats.borrow_mut();
        stats.audio_batches += 1;
        stats.audio_samples += samples.len() as u64;
    }

    fn log(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "zx48k::core", "{message}"),
            LogLevel::Info => tracing::info!(target: "zx48k::core", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "zx48k::core", "{message}"),
            LogLevel::Error => tracing::error!(target: "zx48k::core", "{message}"),
        }
    }
}
