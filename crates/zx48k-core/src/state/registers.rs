/// Number of debugger-visible Z80 registers.
pub const Z80_REGISTER_COUNT: usize = 18;

/// `F` bit for carry.
pub const FLAG_C: u8 = 1 << 0;
/// `F` bit for add/subtract.
pub const FLAG_N: u8 = 1 << 1;
/// `F` bit for parity/overflow.
pub const FLAG_PV: u8 = 1 << 2;
/// `F` undocumented copy of result bit 3.
pub const FLAG_X: u8 = 1 << 3;
/// `F` bit for half carry.
pub const FLAG_H: u8 = 1 << 4;
/// `F` undocumented copy of result bit 5.
pub const FLAG_Y: u8 = 1 << 5;
/// `F` bit for zero.
pub const FLAG_Z: u8 = 1 << 6;
/// `F` bit for sign.
pub const FLAG_S: u8 = 1 << 7;

/// Debugger-visible Z80 register identifier, in descriptor order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Z80Register {
    A = 0,
    F = 1,
    Bc = 2,
    De = 3,
    Hl = 4,
    Ix = 5,
    Iy = 6,
    AfAlt = 7,
    BcAlt = 8,
    DeAlt = 9,
    HlAlt = 10,
    I = 11,
    R = 12,
    Sp = 13,
    Pc = 14,
    /// Composite `IFF1 << 1 | IFF2`.
    Iff = 15,
    Im = 16,
    /// Hidden `MEMPTR` register.
    Wz = 17,
}

impl Z80Register {
    /// All registers in descriptor order.
    pub const ALL: [Self; Z80_REGISTER_COUNT] = [
        Self::A,
        Self::F,
        Self::Bc,
        Self::De,
        Self::Hl,
        Self::Ix,
        Self::Iy,
        Self::AfAlt,
        Self::BcAlt,
        Self::DeAlt,
        Self::HlAlt,
        Self::I,
        Self::R,
        Self::Sp,
        Self::Pc,
        Self::Iff,
        Self::Im,
        Self::Wz,
    ];

    /// Returns the descriptor index for this register.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks up a register by descriptor index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Z80_REGISTER_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }
}

/// Full Z80 register file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub struct Z80Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub af_alt: u16,
    pub bc_alt: u16,
    pub de_alt: u16,
    pub hl_alt: u16,
    pub ix: u16,
    pub iy: u16,
    pub i: u8,
    pub r: u8,
    pub sp: u16,
    pub pc: u16,
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub wz: u16,
}

impl Default for Z80Registers {
    /// Power-on values.
    fn default() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0xFF,
            c: 0xFF,
            d: 0xFF,
            e: 0xFF,
            h: 0xFF,
            l: 0xFF,
            af_alt: 0xFFFF,
            bc_alt: 0xFFFF,
            de_alt: 0xFFFF,
            hl_alt: 0xFFFF,
            ix: 0xFFFF,
            iy: 0xFFFF,
            i: 0,
            r: 0,
            sp: 0xFFFF,
            pc: 0,
            iff1: false,
            iff2: false,
            im: 0,
            wz: 0,
        }
    }
}

impl Z80Registers {
    /// Reads `AF`.
    #[must_use]
    pub const fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f])
    }

    /// Writes `AF`.
    pub const fn set_af(&mut self, value: u16) {
        [self.a, self.f] = value.to_be_bytes();
    }

    /// Reads `BC`.
    #[must_use]
    pub const fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    /// Writes `BC`.
    pub const fn set_bc(&mut self, value: u16) {
        [self.b, self.c] = value.to_be_bytes();
    }

    /// Reads `DE`.
    #[must_use]
    pub const fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    /// Writes `DE`.
    pub const fn set_de(&mut self, value: u16) {
        [self.d, self.e] = value.to_be_bytes();
    }

    /// Reads `HL`.
    #[must_use]
    pub const fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    /// Writes `HL`.
    pub const fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }

    /// Returns `true` when a specific `F` bit is set.
    #[must_use]
    pub const fn flag(&self, mask: u8) -> bool {
        self.f & mask != 0
    }

    /// Sets or clears a specific `F` bit.
    pub const fn set_flag(&mut self, mask: u8, enabled: bool) {
        if enabled {
            self.f |= mask;
        } else {
            self.f &= !mask;
        }
    }

    /// `EX AF,AF'`.
    pub const fn exchange_af(&mut self) {
        let af = self.af();
        self.set_af(self.af_alt);
        self.af_alt = af;
    }

    /// `EXX`.
    pub const fn exchange_pairs(&mut self) {
        let (bc, de, hl) = (self.bc(), self.de(), self.hl());
        self.set_bc(self.bc_alt);
        self.set_de(self.de_alt);
        self.set_hl(self.hl_alt);
        self.bc_alt = bc;
        self.de_alt = de;
        self.hl_alt = hl;
    }

    /// Increments the 7 refresh bits of `R`, preserving bit 7.
    pub const fn bump_refresh(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }

    /// Reads a register zero-extended to 64 bits.
    #[must_use]
    pub const fn get(&self, reg: Z80Register) -> u64 {
        let value = match reg {
            Z80Register::A => self.a as u16,
            Z80Register::F => self.f as u16,
            Z80Register::Bc => self.bc(),
            Z80Register::De => self.de(),
            Z80Register::Hl => self.hl(),
            Z80Register::Ix => self.ix,
            Z80Register::Iy => self.iy,
            Z80Register::AfAlt => self.af_alt,
            Z80Register::BcAlt => self.bc_alt,
            Z80Register::DeAlt => self.de_alt,
            Z80Register::HlAlt => self.hl_alt,
            Z80Register::I => self.i as u16,
            Z80Register::R => self.r as u16,
            Z80Register::Sp => self.sp,
            Z80Register::Pc => self.pc,
            Z80Register::Iff => ((self.iff1 as u16) << 1) | self.iff2 as u16,
            Z80Register::Im => self.im as u16,
            Z80Register::Wz => self.wz,
        };
        value as u64
    }

    /// Writes a register with the truncation the CPU applies when loading it.
    ///
    /// `IFF` updates exactly bits 1 (`IFF1`) and 0 (`IFF2`); `IM` saturates at mode 2;
    /// `WZ` is latched internally and ignores writes.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn set(&mut self, reg: Z80Register, value: u64) {
        let word = value as u16;
        let byte = value as u8;
        match reg {
            Z80Register::A => self.a = byte,
            Z80Register::F => self.f = byte,
            Z80Register::Bc => self.set_bc(word),
            Z80Register::De => self.set_de(word),
            Z80Register::Hl => self.set_hl(word),
            Z80Register::Ix => self.ix = word,
            Z80Register::Iy => self.iy = word,
            Z80Register::AfAlt => self.af_alt = word,
            Z80Register::BcAlt => self.bc_alt = word,
            Z80Register::DeAlt => self.de_alt = word,
            Z80Register::HlAlt => self.hl_alt = word,
            Z80Register::I => self.i = byte,
            Z80Register::R => self.r = byte,
            Z80Register::Sp => self.sp = word,
            Z80Register::Pc => self.pc = word,
            Z80Register::Iff => {
                self.iff1 = byte & 0b10 != 0;
                self.iff2 = byte & 0b01 != 0;
            }
            Z80Register::Im => {
                self.im = if byte & 0b11 > 2 { 2 } else { byte & 0b11 };
            }
            Z80Register::Wz => {}
        }
    }
}
