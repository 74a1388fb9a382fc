//! `CB`, `ED`, and `DDCB`/`FDCB` prefixed instruction groups.

use super::flags;
use super::helpers::{
    fetch_byte, fetch_opcode, fetch_word, get_r, get_rp, index_register, pop_word, read_word,
    set_r, set_rp, write_word, IndexMode,
};
use crate::cpu::{Bus, Z80};
use crate::decoder::OpcodeFields;
use crate::state::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_PV, FLAG_S, FLAG_X, FLAG_Y, FLAG_Z};
use crate::timing::{tick_cost, TickCostKind};

/// `IM` value selected by the `y` field of `ED 46`-style opcodes.
const INTERRUPT_MODES: [u8; 8] = [0, 0, 1, 2, 0, 0, 1, 2];

/// Applies a `CB`-group operation (`x` = rotate, `BIT`, `RES`, `SET`) to `value`.
///
/// Returns the value to write back, or `None` for `BIT`.
fn bit_operation(cpu: &mut Z80, fields: OpcodeFields, value: u8) -> Option<u8> {
    match fields.x {
        0 => Some(flags::rotate_shift(&mut cpu.regs, fields.y, value)),
        1 => {
            flags::bit_test(&mut cpu.regs, fields.y, value);
            None
        }
        2 => Some(value & !(1 << fields.y)),
        _ => Some(value | (1 << fields.y)),
    }
}

/// Replaces the undocumented `X`/`Y` flags of a memory `BIT` with bits of `WZ`'s high byte.
const fn memptr_bit_flags(cpu: &mut Z80) {
    let high = cpu.regs.wz.to_be_bytes()[0];
    cpu.regs.f = (cpu.regs.f & !(FLAG_X | FLAG_Y)) | (high & (FLAG_X | FLAG_Y));
}

pub(super) fn execute_cb(cpu: &mut Z80, bus: &mut dyn Bus) -> u32 {
    let fields = OpcodeFields::decode(fetch_opcode(cpu, bus));
    if fields.z == 6 {
        let addr = cpu.regs.hl();
        let value = bus.read(addr);
        match bit_operation(cpu, fields, value) {
            Some(result) => {
                bus.write(addr, result);
                tick_cost(TickCostKind::BitMemory)
            }
            None => {
                memptr_bit_flags(cpu);
                tick_cost(TickCostKind::BitTestMemory)
            }
        }
    } else {
        let value = get_r(cpu, fields.z, IndexMode::Hl);
        if let Some(result) = bit_operation(cpu, fields, value) {
            set_r(cpu, fields.z, IndexMode::Hl, result);
        }
        tick_cost(TickCostKind::BitRegister)
    }
}

/// `DDCB d op` / `FDCB d op`: the displacement precedes the opcode, and the
/// opcode byte is not an M1 fetch.
pub(super) fn execute_indexed_cb(cpu: &mut Z80, bus: &mut dyn Bus, mode: IndexMode) -> u32 {
    let displacement = fetch_byte(cpu, bus).cast_signed();
    let fields = OpcodeFields::decode(fetch_byte(cpu, bus));
    let addr = index_register(cpu, mode).wrapping_add_signed(i16::from(displacement));
    cpu.regs.wz = addr;
    let value = bus.read(addr);
    match bit_operation(cpu, fields, value) {
        Some(result) => {
            bus.write(addr, result);
            // Undocumented: the result is also copied into r[z].
            if fields.z != 6 {
                set_r(cpu, fields.z, IndexMode::Hl, result);
            }
            tick_cost(TickCostKind::IndexedBitMemory)
        }
        None => {
            memptr_bit_flags(cpu);
            tick_cost(TickCostKind::IndexedBitTest)
        }
    }
}

#[allow(clippy::too_many_lines)]
pub(super) fn execute_ed(cpu: &mut Z80, bus: &mut dyn Bus) -> u32 {
    let fields = OpcodeFields::decode(fetch_opcode(cpu, bus));
    let OpcodeFields { x, y, z, p, q, .. } = fields;
    if x == 2 && z <= 3 && y >= 4 {
        return execute_block(cpu, bus, y, z);
    }
    if x != 1 {
        return tick_cost(TickCostKind::ExtendedSimple);
    }
    match z {
        0 => {
            let port = cpu.regs.bc();
            let value = bus.io_read(port);
            cpu.regs.f = (cpu.regs.f & FLAG_C) | flags::sz53p(value);
            if y != 6 {
                set_r(cpu, y, IndexMode::Hl, value);
            }
            cpu.regs.wz = port.wrapping_add(1);
            tick_cost(TickCostKind::ExtendedIo)
        }
        1 => {
            let port = cpu.regs.bc();
            let value = if y == 6 { 0 } else { get_r(cpu, y, IndexMode::Hl) };
            bus.io_write(port, value);
            cpu.regs.wz = port.wrapping_add(1);
            tick_cost(TickCostKind::ExtendedIo)
        }
        2 => {
            let rhs = get_rp(cpu, p, IndexMode::Hl);
            let result = flags::adc_sbc16(&mut cpu.regs, rhs, q == 0);
            cpu.regs.set_hl(result);
            tick_cost(TickCostKind::ExtendedArithmetic)
        }
        3 => {
            let addr = fetch_word(cpu, bus);
            if q == 0 {
                write_word(bus, addr, get_rp(cpu, p, IndexMode::Hl));
            } else {
                let value = read_word(bus, addr);
                set_rp(cpu, p, IndexMode::Hl, value);
            }
            cpu.regs.wz = addr.wrapping_add(1);
            tick_cost(TickCostKind::ExtendedAbsoluteWord)
        }
        4 => {
            flags::negate(&mut cpu.regs);
            tick_cost(TickCostKind::ExtendedSimple)
        }
        5 => {
            cpu.regs.pc = pop_word(cpu, bus);
            cpu.regs.wz = cpu.regs.pc;
            cpu.regs.iff1 = cpu.regs.iff2;
            tick_cost(TickCostKind::ExtendedReturn)
        }
        6 => {
            cpu.regs.im = INTERRUPT_MODES[usize::from(y)];
            tick_cost(TickCostKind::ExtendedSimple)
        }
        _ => match y {
            0 => {
                cpu.regs.i = cpu.regs.a;
                tick_cost(TickCostKind::ExtendedSpecial)
            }
            1 => {
                cpu.regs.r = cpu.regs.a;
                tick_cost(TickCostKind::ExtendedSpecial)
            }
            2 | 3 => {
                cpu.regs.a = if y == 2 { cpu.regs.i } else { cpu.regs.r };
                let parity = if cpu.regs.iff2 { FLAG_PV } else { 0 };
                cpu.regs.f = (cpu.regs.f & FLAG_C) | flags::sz53(cpu.regs.a) | parity;
                tick_cost(TickCostKind::ExtendedSpecial)
            }
            4 | 5 => {
                let addr = cpu.regs.hl();
                let memory = bus.read(addr);
                let a = cpu.regs.a;
                let (stored, digit) = if y == 4 {
                    ((a << 4) | (memory >> 4), memory & 0x0F)
                } else {
                    ((memory << 4) | (a & 0x0F), memory >> 4)
                };
                bus.write(addr, stored);
                cpu.regs.a = (a & 0xF0) | digit;
                cpu.regs.f = (cpu.regs.f & FLAG_C) | flags::sz53p(cpu.regs.a);
                cpu.regs.wz = addr.wrapping_add(1);
                tick_cost(TickCostKind::Digit)
            }
            _ => tick_cost(TickCostKind::ExtendedSimple),
        },
    }
}

/// Block transfer, compare, and I/O instructions (`LDI` .. `OTDR`).
fn execute_block(cpu: &mut Z80, bus: &mut dyn Bus, y: u8, z: u8) -> u32 {
    let decrement = y & 1 == 1;
    let repeating = y >= 6;
    let step = |value: u16| {
        if decrement {
            value.wrapping_sub(1)
        } else {
            value.wrapping_add(1)
        }
    };
    let hl = cpu.regs.hl();
    let repeat = match z {
        0 => {
            let value = bus.read(hl);
            let de = cpu.regs.de();
            bus.write(de, value);
            cpu.regs.set_hl(step(hl));
            cpu.regs.set_de(step(de));
            let bc = cpu.regs.bc().wrapping_sub(1);
            cpu.regs.set_bc(bc);
            let n = value.wrapping_add(cpu.regs.a);
            let mut f = (cpu.regs.f & (FLAG_S | FLAG_Z | FLAG_C)) | (n & FLAG_X);
            if n & 0x02 != 0 {
                f |= FLAG_Y;
            }
            if bc != 0 {
                f |= FLAG_PV;
            }
            cpu.regs.f = f;
            bc != 0
        }
        1 => {
            let value = bus.read(hl);
            let a = cpu.regs.a;
            let result = a.wrapping_sub(value);
            cpu.regs.set_hl(step(hl));
            let bc = cpu.regs.bc().wrapping_sub(1);
            cpu.regs.set_bc(bc);
            let half = (a ^ value ^ result) & 0x10 != 0;
            let n = result.wrapping_sub(u8::from(half));
            let mut f = (cpu.regs.f & FLAG_C) | FLAG_N | (result & FLAG_S) | (n & FLAG_X);
            if result == 0 {
                f |= FLAG_Z;
            }
            if half {
                f |= FLAG_H;
            }
            if n & 0x02 != 0 {
                f |= FLAG_Y;
            }
            if bc != 0 {
                f |= FLAG_PV;
            }
            cpu.regs.f = f;
            cpu.regs.wz = step(cpu.regs.wz);
            bc != 0 && result != 0
        }
        2 => {
            let value = bus.io_read(cpu.regs.bc());
            bus.write(hl, value);
            cpu.regs.set_hl(step(hl));
            cpu.regs.b = cpu.regs.b.wrapping_sub(1);
            cpu.regs.f = flags::sz53(cpu.regs.b) | FLAG_N;
            cpu.regs.b != 0
        }
        _ => {
            let value = bus.read(hl);
            cpu.regs.b = cpu.regs.b.wrapping_sub(1);
            bus.io_write(cpu.regs.bc(), value);
            cpu.regs.set_hl(step(hl));
            cpu.regs.f = flags::sz53(cpu.regs.b) | FLAG_N;
            cpu.regs.b != 0
        }
    };
    if repeating && repeat {
        cpu.regs.pc = cpu.regs.pc.wrapping_sub(2);
        cpu.regs.wz = cpu.regs.pc.wrapping_add(1);
        tick_cost(TickCostKind::BlockRepeat)
    } else {
        tick_cost(TickCostKind::BlockFinal)
    }
}
