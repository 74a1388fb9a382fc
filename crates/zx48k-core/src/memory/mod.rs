//! Memory model: ROM/RAM backing store and the fixed 48K map.

/// Access direction records used for watchpoint matching.
pub mod access;
/// Fixed memory map and address decoder.
pub mod map;

pub use access::{AccessKind, MemoryAccess};
pub use map::{
    decode_address, MemoryBank, ATTRIBUTES_START, ATTRIBUTE_BYTES, BANK_SIZE, RAM_END, RAM_SIZE,
    RAM_START, ROM_END, ROM_SIZE, ROM_START, SCREEN_BITMAP_BYTES, SCREEN_BYTES, SCREEN_START,
};

/// Size in bytes of the CPU-visible address space (64 KiB).
pub const ADDRESS_SPACE_BYTES: usize = u16::MAX as usize + 1;

/// ROM and RAM storage for one machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    rom: Box<[u8]>,
    ram: [Box<[u8]>; 3],
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            rom: vec![0; ROM_SIZE].into_boxed_slice(),
            ram: [new_bank(), new_bank(), new_bank()],
        }
    }
}

fn new_bank() -> Box<[u8]> {
    vec![0; BANK_SIZE].into_boxed_slice()
}

impl Memory {
    /// Creates memory with the given ROM image and zeroed RAM.
    ///
    /// `rom` is truncated or zero-padded to [`ROM_SIZE`]; callers validate the size.
    #[must_use]
    pub fn with_rom(rom: &[u8]) -> Self {
        let mut memory = Self::default();
        let len = rom.len().min(ROM_SIZE);
        memory.rom[..len].copy_from_slice(&rom[..len]);
        memory
    }

    /// Reads a byte as the CPU sees it.
    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        let (bank, offset) = decode_address(addr);
        match bank.ram_index() {
            Some(index) => self.ram[index][offset],
            None => self.rom[offset],
        }
    }

    /// Writes a byte as the CPU does. Returns `false` when the write hit ROM and
    /// was discarded.
    pub fn write(&mut self, addr: u16, value: u8) -> bool {
        let (bank, offset) = decode_address(addr);
        match bank.ram_index() {
            Some(index) => {
                self.ram[index][offset] = value;
                true
            }
            None => false,
        }
    }

    /// Reads a ROM byte; out-of-range offsets read as `0`.
    #[must_use]
    pub fn rom_byte(&self, offset: usize) -> u8 {
        self.rom.get(offset).copied().unwrap_or(0)
    }

    /// Patches a ROM byte; out-of-range offsets are ignored.
    pub fn patch_rom(&mut self, offset: usize, value: u8) {
        if let Some(byte) = self.rom.get_mut(offset) {
            *byte = value;
        }
    }

    /// Reads a byte at an offset relative to `RAM_START`; out-of-range reads as `0`.
    #[must_use]
    pub fn ram_byte(&self, offset: usize) -> u8 {
        if offset >= RAM_SIZE {
            return 0;
        }
        self.ram[offset / BANK_SIZE][offset % BANK_SIZE]
    }

    /// Writes a byte at an offset relative to `RAM_START`; out-of-range is ignored.
    pub fn set_ram_byte(&mut self, offset: usize, value: u8) {
        if offset < RAM_SIZE {
            self.ram[offset / BANK_SIZE][offset % BANK_SIZE] = value;
        }
    }

    /// Returns the screen bank (bitmap and attributes live in its first 6912 bytes).
    #[must_use]
    pub fn screen(&self) -> &[u8] {
        &self.ram[0][..SCREEN_BYTES]
    }

    /// Replaces the full 48 KiB RAM image. `image` must be [`RAM_SIZE`] bytes long;
    /// shorter images leave the tail untouched.
    pub fn load_ram(&mut self, image: &[u8]) {
        for (index, chunk) in image.chunks(BANK_SIZE).take(3).enumerate() {
            self.ram[index][..chunk.len()].copy_from_slice(chunk);
        }
    }

    /// Zeroes all RAM, leaving the ROM untouched.
    pub fn clear_ram(&mut self) {
        for bank in &mut self.ram {
            bank.fill(0);
        }
    }
}
