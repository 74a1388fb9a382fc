//! 48K `.sna` snapshots.
//!
//! Layout: a 27-byte register header followed by the 48 KiB RAM image. `PC` is
//! not stored in the header; it sits on the stack and is popped on load.

use crate::cpu::Z80;
use crate::error::LoadError;
use crate::memory::{Memory, RAM_SIZE, RAM_START};
use crate::peripherals::Ula;
use crate::state::Z80Registers;

/// Header length.
pub const SNA_HEADER_BYTES: usize = 27;
/// Total length of a 48K snapshot.
pub const SNA_48K_BYTES: usize = SNA_HEADER_BYTES + RAM_SIZE;

const IFF2_BIT: u8 = 0x04;

/// A decoded snapshot, ready to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Register file with `PC` still on the stack.
    pub regs: Z80Registers,
    /// Border colour.
    pub border: u8,
    /// 48 KiB RAM image starting at `0x4000`.
    pub ram: Vec<u8>,
}

fn word(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

impl Snapshot {
    /// Decodes a 48K snapshot without touching any machine state.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::UnsupportedSize`] for any length other than
    /// [`SNA_48K_BYTES`], [`LoadError::InvalidHeader`] for an interrupt mode above 2,
    /// and [`LoadError::OutOfMemory`] if the RAM copy cannot be allocated.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        if bytes.len() != SNA_48K_BYTES {
            return Err(LoadError::UnsupportedSize {
                size: bytes.len(),
                expected: SNA_48K_BYTES,
            });
        }
        let header = &bytes[..SNA_HEADER_BYTES];
        let im = header[25];
        if im > 2 {
            return Err(LoadError::InvalidHeader {
                field: "interrupt mode",
                value: im,
            });
        }

        let mut ram = Vec::new();
        ram.try_reserve_exact(RAM_SIZE)
            .map_err(|_| LoadError::OutOfMemory { size: RAM_SIZE })?;
        ram.extend_from_slice(&bytes[SNA_HEADER_BYTES..]);

        let mut regs = Z80Registers {
            i: header[0],
            hl_alt: word(header, 1),
            de_alt: word(header, 3),
            bc_alt: word(header, 5),
            af_alt: word(header, 7),
            iy: word(header, 15),
            ix: word(header, 17),
            iff1: header[19] & IFF2_BIT != 0,
            iff2: header[19] & IFF2_BIT != 0,
            r: header[20],
            sp: word(header, 23),
            im,
            ..Z80Registers::default()
        };
        regs.set_hl(word(header, 9));
        regs.set_de(word(header, 11));
        regs.set_bc(word(header, 13));
        regs.set_af(word(header, 21));

        Ok(Self {
            regs,
            border: header[26] & 0x07,
            ram,
        })
    }

    /// Loads the snapshot into a freshly reset machine and pops `PC`.
    pub fn apply(&self, cpu: &mut Z80, memory: &mut Memory, ula: &mut Ula) {
        memory.load_ram(&self.ram);
        cpu.reset();
        cpu.regs = self.regs.clone();
        let sp = cpu.regs.sp;
        cpu.regs.pc = u16::from_le_bytes([memory.read(sp), memory.read(sp.wrapping_add(1))]);
        cpu.regs.sp = sp.wrapping_add(2);
        ula.border = self.border;
    }

    /// Captures the machine as a snapshot, pushing `PC` onto the stored stack.
    ///
    /// The live machine is not modified; the push happens in the captured RAM copy.
    #[must_use]
    pub fn capture(cpu: &Z80, memory: &Memory, ula: &Ula) -> Self {
        let mut ram: Vec<u8> = (0..RAM_SIZE).map(|offset| memory.ram_byte(offset)).collect();
        let mut regs = cpu.regs.clone();
        regs.sp = regs.sp.wrapping_sub(2);
        let [lo, hi] = regs.pc.to_le_bytes();
        for (addr, value) in [(regs.sp, lo), (regs.sp.wrapping_add(1), hi)] {
            if let Some(offset) = addr.checked_sub(RAM_START) {
                ram[usize::from(offset)] = value;
            }
        }
        Self {
            regs,
            border: ula.border,
            ram,
        }
    }

    /// Encodes the snapshot in `.sna` layout.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let regs = &self.regs;
        let mut bytes = Vec::with_capacity(SNA_48K_BYTES);
        bytes.push(regs.i);
        let pairs = [
            regs.hl_alt,
            regs.de_alt,
            regs.bc_alt,
            regs.af_alt,
            regs.hl(),
            regs.de(),
            regs.bc(),
            regs.iy,
            regs.ix,
        ];
        for pair in pairs {
            bytes.extend_from_slice(&pair.to_le_bytes());
        }
        bytes.push(if regs.iff2 { IFF2_BIT } else { 0 });
        bytes.push(regs.r);
        bytes.extend_from_slice(&regs.af().to_le_bytes());
        bytes.extend_from_slice(&regs.sp.to_le_bytes());
        bytes.push(regs.im);
        bytes.push(self.border);
        bytes.extend_from_slice(&self.ram);
        bytes
    }
}
