//! Shared fixtures: a recording frontend and ROM builders.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use zx48k_core::{Frontend, LogLevel, MachineConfig, Spectrum48k, SpectrumKey, ROM_SIZE};

/// Everything a machine handed to its frontend.
#[derive(Debug, Default)]
pub struct Record {
    pub video_frames: usize,
    pub last_video: Option<(usize, usize, usize)>,
    pub first_pixel: u32,
    pub audio_batches: usize,
    pub audio_samples: usize,
    pub polls: usize,
    pub logs: Vec<(LogLevel, String)>,
    pub held: Vec<SpectrumKey>,
}

impl Record {
    pub fn logged(&self, level: LogLevel) -> bool {
        self.logs.iter().any(|(logged, _)| *logged == level)
    }
}

pub struct Recorder(pub Rc<RefCell<Record>>);

impl Frontend for Recorder {
    fn video_refresh(&mut self, pixels: &[u32], width: usize, height: usize, pitch_bytes: usize) {
        let mut record = self.0.borrow_mut();
        record.video_frames += 1;
        record.last_video = Some((width, height, pitch_bytes));
        record.first_pixel = pixels.first().copied().unwrap_or_default();
    }

    fn audio_sample_batch(&mut self, samples: &[i16]) {
        let mut record = self.0.borrow_mut();
        record.audio_batches += 1;
        record.audio_samples += samples.len();
    }

    fn input_poll(&mut self) {
        self.0.borrow_mut().polls += 1;
    }

    fn key_pressed(&self, key: SpectrumKey) -> bool {
        self.0.borrow().held.contains(&key)
    }

    fn log(&mut self, level: LogLevel, message: &str) {
        self.0.borrow_mut().logs.push((level, message.to_owned()));
    }
}

/// 16 KiB ROM holding `program` at address 0 and `NOP`s after it.
pub fn rom(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; ROM_SIZE];
    rom[..program.len()].copy_from_slice(program);
    rom
}

/// Machine over `program` with a recording frontend.
pub fn recorded_machine(
    config: MachineConfig,
    program: &[u8],
) -> (Spectrum48k, Rc<RefCell<Record>>) {
    let record = Rc::new(RefCell::new(Record::default()));
    let machine = Spectrum48k::new(&rom(program), config, Box::new(Recorder(Rc::clone(&record))))
        .expect("valid machine");
    (machine, record)
}

/// 280-tick frames: exactly seventy 4-tick `NOP`s per quantum.
pub fn seventy_nop_config() -> MachineConfig {
    MachineConfig {
        clock_hz: 14_000,
        frame_us: 20_000,
        ..MachineConfig::default()
    }
}
