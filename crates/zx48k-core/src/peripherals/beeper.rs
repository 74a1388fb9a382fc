//! Beeper sampling and stereo batching.

/// Amplitude of the beeper relative to full scale.
pub const BEEPER_VOLUME: f32 = 0.5;

/// Converts a sample in `-1.0..=1.0` to `i16`, clamping out-of-range input.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn sample_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32_767.0) as i16
}

/// Samples the EAR level at the audio rate and groups it into stereo batches.
#[derive(Debug, Clone, PartialEq)]
pub struct Beeper {
    clock_hz: u64,
    sample_rate: u64,
    batch_frames: usize,
    accumulator: u64,
    pending: Vec<i16>,
}

impl Beeper {
    /// Creates a beeper producing `sample_rate` stereo frames per `clock_hz` ticks.
    #[must_use]
    pub fn new(clock_hz: u32, sample_rate: u32, batch_frames: usize) -> Self {
        Self {
            clock_hz: u64::from(clock_hz),
            sample_rate: u64::from(sample_rate),
            batch_frames,
            accumulator: 0,
            pending: Vec::with_capacity(batch_frames * 2),
        }
    }

    /// Emits the samples falling in the next `ticks` ticks at the given EAR level.
    pub fn advance(&mut self, ticks: u32, ear: bool) {
        let value = sample_to_i16(if ear { BEEPER_VOLUME } else { -BEEPER_VOLUME });
        self.accumulator += u64::from(ticks) * self.sample_rate;
        while self.accumulator >= self.clock_hz {
            self.accumulator -= self.clock_hz;
            self.pending.extend_from_slice(&[value, value]);
        }
    }

    /// Stereo frames buffered and not yet delivered.
    #[must_use]
    pub const fn pending_frames(&self) -> usize {
        self.pending.len() / 2
    }

    /// Hands every complete batch to `sink` and keeps the remainder.
    pub fn drain_batches(&mut self, mut sink: impl FnMut(&[i16])) {
        let batch_len = self.batch_frames * 2;
        if batch_len == 0 {
            return;
        }
        let complete = self.pending.len() / batch_len * batch_len;
        for batch in self.pending[..complete].chunks_exact(batch_len) {
            sink(batch);
        }
        self.pending.drain(..complete);
    }

    /// Drops buffered samples and the phase accumulator.
    pub fn reset(&mut self) {
        self.accumulator = 0;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{sample_to_i16, Beeper};

    #[test]
    fn clamps_to_full_scale() {
        assert_eq!(sample_to_i16(2.0), 32_767);
        assert_eq!(sample_to_i16(-2.0), -32_767);
        assert_eq!(sample_to_i16(0.0), 0);
    }

    #[test]
    fn one_frame_yields_882_stereo_samples() {
        let mut beeper = Beeper::new(3_500_000, 44_100, 128);
        beeper.advance(70_000, true);
        assert_eq!(beeper.pending_frames(), 882);
    }

    #[test]
    fn drains_only_complete_batches() {
        let mut beeper = Beeper::new(3_500_000, 44_100, 128);
        beeper.advance(70_000, false);
        let mut batches = 0;
        beeper.drain_batches(|batch| {
            assert_eq!(batch.len(), 256);
            assert!(batch.iter().all(|&sample| sample < 0));
            batches += 1;
        });
        assert_eq!(batches, 6);
        assert_eq!(beeper.pending_frames(), 882 - 6 * 128);
    }
}
