//! ULA: border, beeper and tape latches, keyboard port, and the video renderer.

use super::keyboard::Keyboard;
use crate::memory::map::{ATTRIBUTES_START, SCREEN_BITMAP_BYTES, SCREEN_START};

/// Output width in pixels, border included.
pub const DISPLAY_WIDTH: usize = 320;
/// Output height in pixels, border included.
pub const DISPLAY_HEIGHT: usize = 256;
/// Border thickness on every side.
pub const BORDER_PIXELS: usize = 32;
/// Paper area width.
pub const PAPER_WIDTH: usize = 256;
/// Paper area height.
pub const PAPER_HEIGHT: usize = 192;
/// Frames per FLASH phase.
pub const FLASH_PERIOD_FRAMES: u64 = 16;
/// Ticks the ULA holds INT low at each frame start.
pub const INTERRUPT_TICKS: u32 = 32;

const NORMAL_INTENSITY: u32 = 0xD7;
const BRIGHT_INTENSITY: u32 = 0xFF;

/// XRGB8888 colour for a 3-bit Spectrum colour (`G R B`) at normal or bright intensity.
#[must_use]
pub const fn palette(colour: u8, bright: bool) -> u32 {
    let level = if bright {
        BRIGHT_INTENSITY
    } else {
        NORMAL_INTENSITY
    };
    let blue = if colour & 0b001 != 0 { level } else { 0 };
    let red = if colour & 0b010 != 0 { level } else { 0 };
    let green = if colour & 0b100 != 0 { level } else { 0 };
    (red << 16) | (green << 8) | blue
}

/// Offset of paper row `y` (0..192) byte column `x` (0..32) within the screen bitmap.
#[must_use]
pub const fn bitmap_offset(y: usize, x: usize) -> usize {
    ((y & 0xC0) << 5) | ((y & 0x07) << 8) | ((y & 0x38) << 2) | x
}

/// ULA latches and frame state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Ula {
    /// Border colour, 0..=7.
    pub border: u8,
    /// Beeper output level (port bit 4).
    pub ear: bool,
    /// Tape output level (port bit 3).
    pub mic: bool,
    /// Frames rendered since reset.
    pub frame_counter: u64,
    /// Current FLASH phase.
    pub flash_inverted: bool,
}

impl Ula {
    /// Whether `port` decodes to the ULA (A0 low).
    #[must_use]
    pub const fn owns_port(port: u16) -> bool {
        port & 1 == 0
    }

    /// Latches border, MIC, and EAR from an `OUT` value.
    pub const fn write_port(&mut self, value: u8) {
        self.border = value & 0x07;
        self.mic = value & 0x08 != 0;
        self.ear = value & 0x10 != 0;
    }

    /// Value of an `IN` from a ULA port: keyboard bits 0-4, EAR in bit 6, bits 5 and 7 high.
    #[must_use]
    pub fn read_port(&self, port: u16, keyboard: &Keyboard) -> u8 {
        let [high, _] = port.to_be_bytes();
        let ear = if self.ear { 0x40 } else { 0 };
        0xA0 | ear | keyboard.read_half_rows(high)
    }

    /// Counts a frame and advances the FLASH phase.
    pub const fn end_frame(&mut self) {
        self.frame_counter += 1;
        if self.frame_counter % FLASH_PERIOD_FRAMES == 0 {
            self.flash_inverted = !self.flash_inverted;
        }
    }

    /// Renders the screen memory (`0x4000..0x5B00`, 6912 bytes) plus border into `pixels`.
    ///
    /// `pixels` must hold [`DISPLAY_WIDTH`] × [`DISPLAY_HEIGHT`] values; shorter buffers are
    /// filled as far as they reach.
    pub fn render(&self, screen: &[u8], pixels: &mut [u32]) {
        let border = palette(self.border, false);
        let attributes_base = usize::from(ATTRIBUTES_START - SCREEN_START);
        for (row_index, row) in pixels.chunks_mut(DISPLAY_WIDTH).take(DISPLAY_HEIGHT).enumerate() {
            let Some(y) = row_index
                .checked_sub(BORDER_PIXELS)
                .filter(|&y| y < PAPER_HEIGHT)
            else {
                row.fill(border);
                continue;
            };
            row.fill(border);
            for x in 0..PAPER_WIDTH / 8 {
                let bitmap = screen.get(bitmap_offset(y, x)).copied().unwrap_or(0);
                let attribute = screen
                    .get(attributes_base + (y / 8) * 32 + x)
                    .copied()
                    .unwrap_or(0);
                let bright = attribute & 0x40 != 0;
                let mut ink = palette(attribute & 0x07, bright);
                let mut paper = palette((attribute >> 3) & 0x07, bright);
                if attribute & 0x80 != 0 && self.flash_inverted {
                    core::mem::swap(&mut ink, &mut paper);
                }
                let start = BORDER_PIXELS + x * 8;
                if let Some(cells) = row.get_mut(start..start + 8) {
                    for (bit, pixel) in cells.iter_mut().enumerate() {
                        *pixel = if bitmap & (0x80 >> bit) != 0 { ink } else { paper };
                    }
                }
            }
        }
    }
}

const _: () = assert!(SCREEN_BITMAP_BYTES == bitmap_offset(PAPER_HEIGHT - 1, 31) + 1);

/// Front and back XRGB8888 frame buffers; the front one is what the host sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoBuffers {
    front: Vec<u32>,
    back: Vec<u32>,
}

impl Default for VideoBuffers {
    fn default() -> Self {
        Self {
            front: vec![0; DISPLAY_WIDTH * DISPLAY_HEIGHT],
            back: vec![0; DISPLAY_WIDTH * DISPLAY_HEIGHT],
        }
    }
}

impl VideoBuffers {
    /// Buffer the next frame is rendered into.
    pub fn back_mut(&mut self) -> &mut [u32] {
        &mut self.back
    }

    /// Currently visible frame.
    #[must_use]
    pub fn front(&self) -> &[u32] {
        &self.front
    }

    /// Makes the back buffer visible.
    pub fn swap(&mut self) {
        core::mem::swap(&mut self.front, &mut self.back);
    }

    /// Clears both buffers to black.
    pub fn clear(&mut self) {
        self.front.fill(0);
        self.back.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        bitmap_offset, palette, Ula, VideoBuffers, BORDER_PIXELS, DISPLAY_HEIGHT, DISPLAY_WIDTH,
    };
    use crate::memory::map::SCREEN_BYTES;
    use crate::peripherals::keyboard::{Keyboard, SpectrumKey};

    #[test]
    fn palette_intensities() {
        assert_eq!(palette(0, false), 0);
        assert_eq!(palette(2, false), 0x00D7_0000);
        assert_eq!(palette(7, true), 0x00FF_FFFF);
        assert_eq!(palette(1, true), 0x0000_00FF);
    }

    #[test]
    fn bitmap_offsets_follow_thirds_layout() {
        assert_eq!(bitmap_offset(0, 0), 0x0000);
        assert_eq!(bitmap_offset(1, 0), 0x0100);
        assert_eq!(bitmap_offset(8, 0), 0x0020);
        assert_eq!(bitmap_offset(64, 0), 0x0800);
        assert_eq!(bitmap_offset(191, 31), 0x17FF);
    }

    #[test]
    fn port_write_splits_latches() {
        let mut ula = Ula::default();
        ula.write_port(0x1A);
        assert_eq!(ula.border, 2);
        assert!(ula.mic);
        assert!(ula.ear);
    }

    #[test]
    fn port_read_combines_keyboard_and_ear() {
        let mut keyboard = Keyboard::new(0);
        keyboard.key_down(SpectrumKey::CapsShift);
        let mut ula = Ula::default();
        assert_eq!(ula.read_port(0xFEFE, &keyboard), 0xBE);
        ula.ear = true;
        assert_eq!(ula.read_port(0x7FFE, &keyboard), 0xFF);
    }

    #[test]
    fn flash_toggles_every_sixteen_frames() {
        let mut ula = Ula::default();
        for _ in 0..15 {
            ula.end_frame();
        }
        assert!(!ula.flash_inverted);
        ula.end_frame();
        assert!(ula.flash_inverted);
    }

    #[test]
    fn render_draws_border_and_ink() {
        let mut screen = vec![0u8; SCREEN_BYTES];
        screen[0] = 0x80;
        screen[0x1800] = 0x07 | (1 << 3);
        let mut ula = Ula::default();
        ula.border = 4;
        let mut video = VideoBuffers::default();
        ula.render(&screen, video.back_mut());
        video.swap();

        let front = video.front();
        assert_eq!(front.len(), DISPLAY_WIDTH * DISPLAY_HEIGHT);
        assert_eq!(front[0], palette(4, false));
        let origin = BORDER_PIXELS * DISPLAY_WIDTH + BORDER_PIXELS;
        assert_eq!(front[origin], palette(7, false));
        assert_eq!(front[origin + 1], palette(1, false));
    }
}
