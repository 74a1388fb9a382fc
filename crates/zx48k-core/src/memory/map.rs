//! Fixed 48K memory map and address decoder.

/// Size in bytes of one 16 KiB bank.
pub const BANK_SIZE: usize = 0x4000;
/// Size in bytes of the ROM image.
pub const ROM_SIZE: usize = BANK_SIZE;
/// Size in bytes of the RAM (three 16 KiB banks).
pub const RAM_SIZE: usize = 3 * BANK_SIZE;

/// Inclusive start address of the ROM bank.
pub const ROM_START: u16 = 0x0000;
/// Inclusive end address of the ROM bank.
pub const ROM_END: u16 = 0x3FFF;
/// Inclusive start address of RAM.
pub const RAM_START: u16 = 0x4000;
/// Inclusive end address of RAM.
pub const RAM_END: u16 = 0xFFFF;

/// Inclusive start address of the screen bitmap.
pub const SCREEN_START: u16 = 0x4000;
/// Length in bytes of the screen bitmap.
pub const SCREEN_BITMAP_BYTES: usize = 0x1800;
/// Inclusive start address of the attribute area.
pub const ATTRIBUTES_START: u16 = 0x5800;
/// Length in bytes of the attribute area.
pub const ATTRIBUTE_BYTES: usize = 0x300;
/// Length in bytes of bitmap plus attributes.
pub const SCREEN_BYTES: usize = SCREEN_BITMAP_BYTES + ATTRIBUTE_BYTES;

/// Physical bank backing a CPU address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryBank {
    /// ROM (`0x0000..=0x3FFF`).
    Rom,
    /// First RAM bank (`0x4000..=0x7FFF`), holds the screen.
    Ram0,
    /// Second RAM bank (`0x8000..=0xBFFF`).
    Ram1,
    /// Third RAM bank (`0xC000..=0xFFFF`).
    Ram2,
}

impl MemoryBank {
    /// Banks in ascending CPU address order.
    pub const ALL: [Self; 4] = [Self::Rom, Self::Ram0, Self::Ram1, Self::Ram2];

    /// Returns the CPU address at which this bank starts.
    #[must_use]
    pub const fn base(self) -> u16 {
        match self {
            Self::Rom => 0x0000,
            Self::Ram0 => 0x4000,
            Self::Ram1 => 0x8000,
            Self::Ram2 => 0xC000,
        }
    }

    /// Returns the RAM bank index (`0..=2`), or `None` for ROM.
    #[must_use]
    pub const fn ram_index(self) -> Option<usize> {
        match self {
            Self::Rom => None,
            Self::Ram0 => Some(0),
            Self::Ram1 => Some(1),
            Self::Ram2 => Some(2),
        }
    }

    /// Returns `true` when CPU writes to this bank are discarded.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::Rom)
    }
}

const _: () = assert_bank_layout();

const fn assert_bank_layout() {
    let mut index = 0;
    while index < MemoryBank::ALL.len() {
        let bank = MemoryBank::ALL[index];
        assert!(
            bank.base() as usize == index * BANK_SIZE,
            "banks must be contiguous 16 KiB slices"
        );
        index += 1;
    }
    assert!(ROM_END as usize + 1 == ROM_SIZE, "rom must fill the first bank");
    assert!(
        RAM_END as usize - RAM_START as usize + 1 == RAM_SIZE,
        "ram must fill the remaining banks"
    );
}

/// Decodes a CPU address into its backing bank and the offset inside that bank.
#[must_use]
pub const fn decode_address(addr: u16) -> (MemoryBank, usize) {
    let offset = (addr as usize) & (BANK_SIZE - 1);
    let bank = match addr >> 14 {
        0 => MemoryBank::Rom,
        1 => MemoryBank::Ram0,
        2 => MemoryBank::Ram1,
        _ => MemoryBank::Ram2,
    };
    (bank, offset)
}

#[cfg(test)]
mod tests {
    use super::{decode_address, MemoryBank, BANK_SIZE, RAM_START, ROM_END};

    #[test]
    fn decode_is_correct_at_bank_edges() {
        assert_eq!(decode_address(0x0000), (MemoryBank::Rom, 0));
        assert_eq!(decode_address(ROM_END), (MemoryBank::Rom, BANK_SIZE - 1));
        assert_eq!(decode_address(RAM_START), (MemoryBank::Ram0, 0));
        assert_eq!(decode_address(0x7FFF), (MemoryBank::Ram0, BANK_SIZE - 1));
        assert_eq!(decode_address(0x8000), (MemoryBank::Ram1, 0));
        assert_eq!(decode_address(0xC000), (MemoryBank::Ram2, 0));
        assert_eq!(decode_address(0xFFFF), (MemoryBank::Ram2, BANK_SIZE - 1));
    }

    #[test]
    fn every_address_decodes_back_to_itself() {
        for addr in 0_u16..=u16::MAX {
            let (bank, offset) = decode_address(addr);
            assert_eq!(usize::from(bank.base()) + offset, usize::from(addr));
        }
    }

    #[test]
    fn only_rom_is_read_only() {
        assert!(MemoryBank::Rom.is_read_only());
        assert!(MemoryBank::Ram0.ram_index().is_some());
        assert!(!MemoryBank::Ram2.is_read_only());
        assert_eq!(MemoryBank::Rom.ram_index(), None);
    }
}
