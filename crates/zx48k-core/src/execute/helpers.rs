//! Operand access helpers shared by the unprefixed and prefixed executors.

use crate::cpu::{Bus, Z80};

/// Which register stands in for `HL` under the current prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexMode {
    /// No prefix: `HL`, `H`, `L`, `(HL)`.
    Hl,
    /// `DD` prefix: `IX`, `IXH`, `IXL`, `(IX+d)`.
    Ix,
    /// `FD` prefix: `IY`, `IYH`, `IYL`, `(IY+d)`.
    Iy,
}

/// Fetches an opcode byte (M1 cycle): advances `PC` and the refresh counter.
pub fn fetch_opcode(cpu: &mut Z80, bus: &mut dyn Bus) -> u8 {
    let opcode = bus.read(cpu.regs.pc);
    cpu.regs.pc = cpu.regs.pc.wrapping_add(1);
    cpu.regs.bump_refresh();
    opcode
}

/// Fetches an operand byte.
pub fn fetch_byte(cpu: &mut Z80, bus: &mut dyn Bus) -> u8 {
    let value = bus.read(cpu.regs.pc);
    cpu.regs.pc = cpu.regs.pc.wrapping_add(1);
    value
}

/// Fetches a little-endian operand word.
pub fn fetch_word(cpu: &mut Z80, bus: &mut dyn Bus) -> u16 {
    let lo = fetch_byte(cpu, bus);
    let hi = fetch_byte(cpu, bus);
    u16::from_le_bytes([lo, hi])
}

/// Reads a little-endian word from memory.
pub fn read_word(bus: &mut dyn Bus, addr: u16) -> u16 {
    let lo = bus.read(addr);
    let hi = bus.read(addr.wrapping_add(1));
    u16::from_le_bytes([lo, hi])
}

/// Writes a little-endian word to memory.
pub fn write_word(bus: &mut dyn Bus, addr: u16, value: u16) {
    let [lo, hi] = value.to_le_bytes();
    bus.write(addr, lo);
    bus.write(addr.wrapping_add(1), hi);
}

/// Pushes a word onto the stack.
pub fn push_word(cpu: &mut Z80, bus: &mut dyn Bus, value: u16) {
    let [lo, hi] = value.to_le_bytes();
    cpu.regs.sp = cpu.regs.sp.wrapping_sub(1);
    bus.write(cpu.regs.sp, hi);
    cpu.regs.sp = cpu.regs.sp.wrapping_sub(1);
    bus.write(cpu.regs.sp, lo);
}

/// Pops a word from the stack.
pub fn pop_word(cpu: &mut Z80, bus: &mut dyn Bus) -> u16 {
    let value = read_word(bus, cpu.regs.sp);
    cpu.regs.sp = cpu.regs.sp.wrapping_add(2);
    value
}

/// Reads the `HL`-equivalent register for `mode`.
#[must_use]
pub const fn index_register(cpu: &Z80, mode: IndexMode) -> u16 {
    match mode {
        IndexMode::Hl => cpu.regs.hl(),
        IndexMode::Ix => cpu.regs.ix,
        IndexMode::Iy => cpu.regs.iy,
    }
}

/// Writes the `HL`-equivalent register for `mode`.
pub const fn set_index_register(cpu: &mut Z80, mode: IndexMode, value: u16) {
    match mode {
        IndexMode::Hl => cpu.regs.set_hl(value),
        IndexMode::Ix => cpu.regs.ix = value,
        IndexMode::Iy => cpu.regs.iy = value,
    }
}

/// Resolves the `(HL)` operand address, fetching the displacement for `(IX+d)`/`(IY+d)`.
pub fn memory_operand_address(cpu: &mut Z80, bus: &mut dyn Bus, mode: IndexMode) -> u16 {
    match mode {
        IndexMode::Hl => cpu.regs.hl(),
        IndexMode::Ix | IndexMode::Iy => {
            let displacement = fetch_byte(cpu, bus).cast_signed();
            let addr = index_register(cpu, mode).wrapping_add_signed(i16::from(displacement));
            cpu.regs.wz = addr;
            addr
        }
    }
}

/// Reads 8-bit register `r` (`0..=7`, excluding 6) with `H`/`L` remapped by `mode`.
#[must_use]
pub const fn get_r(cpu: &Z80, r: u8, mode: IndexMode) -> u8 {
    match r {
        0 => cpu.regs.b,
        1 => cpu.regs.c,
        2 => cpu.regs.d,
        3 => cpu.regs.e,
        4 => index_register(cpu, mode).to_be_bytes()[0],
        5 => index_register(cpu, mode).to_be_bytes()[1],
        _ => cpu.regs.a,
    }
}

/// Writes 8-bit register `r` (`0..=7`, excluding 6) with `H`/`L` remapped by `mode`.
pub const fn set_r(cpu: &mut Z80, r: u8, mode: IndexMode, value: u8) {
    match r {
        0 => cpu.regs.b = value,
        1 => cpu.regs.c = value,
        2 => cpu.regs.d = value,
        3 => cpu.regs.e = value,
        4 | 5 => {
            let [hi, lo] = index_register(cpu, mode).to_be_bytes();
            let pair = if r == 4 { [value, lo] } else { [hi, value] };
            set_index_register(cpu, mode, u16::from_be_bytes(pair));
        }
        _ => cpu.regs.a = value,
    }
}

/// Reads register pair `rp[p]` (`BC`, `DE`, `HL`/index, `SP`).
#[must_use]
pub const fn get_rp(cpu: &Z80, p: u8, mode: IndexMode) -> u16 {
    match p {
        0 => cpu.regs.bc(),
        1 => cpu.regs.de(),
        2 => index_register(cpu, mode),
        _ => cpu.regs.sp,
    }
}

/// Writes register pair `rp[p]` (`BC`, `DE`, `HL`/index, `SP`).
pub const fn set_rp(cpu: &mut Z80, p: u8, mode: IndexMode, value: u16) {
    match p {
        0 => cpu.regs.set_bc(value),
        1 => cpu.regs.set_de(value),
        2 => set_index_register(cpu, mode, value),
        _ => cpu.regs.sp = value,
    }
}

/// Reads register pair `rp2[p]` (`BC`, `DE`, `HL`/index, `AF`).
#[must_use]
pub const fn get_rp2(cpu: &Z80, p: u8, mode: IndexMode) -> u16 {
    if p == 3 {
        cpu.regs.af()
    } else {
        get_rp(cpu, p, mode)
    }
}

/// Writes register pair `rp2[p]` (`BC`, `DE`, `HL`/index, `AF`).
pub const fn set_rp2(cpu: &mut Z80, p: u8, mode: IndexMode, value: u16) {
    if p == 3 {
        cpu.regs.set_af(value);
    } else {
        set_rp(cpu, p, mode, value);
    }
}

#[cfg(test)]
mod tests {
    use super::{get_r, get_rp2, set_r, IndexMode};
    use crate::cpu::Z80;

    #[test]
    fn h_and_l_remap_to_index_halves() {
        let mut cpu = Z80::new();
        cpu.regs.ix = 0x1234;
        cpu.regs.set_hl(0xABCD);

        assert_eq!(get_r(&cpu, 4, IndexMode::Ix), 0x12);
        assert_eq!(get_r(&cpu, 5, IndexMode::Ix), 0x34);
        assert_eq!(get_r(&cpu, 4, IndexMode::Hl), 0xAB);

        set_r(&mut cpu, 5, IndexMode::Ix, 0x99);
        assert_eq!(cpu.regs.ix, 0x1299);
        assert_eq!(cpu.regs.hl(), 0xABCD);
    }

    #[test]
    fn rp2_selects_af_for_p3() {
        let mut cpu = Z80::new();
        cpu.regs.set_af(0x5AA5);
        assert_eq!(get_rp2(&cpu, 3, IndexMode::Hl), 0x5AA5);
    }
}
