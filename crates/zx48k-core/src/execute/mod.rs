//! Z80 instruction executor.
//!
//! [`execute_instruction`] fetches one opcode (plus any prefix bytes), applies
//! its effect to the CPU and bus, and returns the ticks consumed. Prefixed
//! groups (`CB`, `ED`, `DDCB`/`FDCB`) live in [`prefixed`].

pub(crate) mod flags;
pub(crate) mod helpers;
mod prefixed;

pub(crate) use helpers::push_word;

use crate::cpu::{Bus, Z80};
use crate::decoder::{Condition, OpcodeFields};
use crate::timing::{tick_cost, TickCostKind};
use flags::AluOp;
use helpers::{
    IndexMode, fetch_byte, fetch_opcode, fetch_word, get_r, get_rp, get_rp2, index_register,
    memory_operand_address, pop_word, read_word, set_index_register, set_r, set_rp, set_rp2,
    write_word,
};

/// Executes one instruction and returns its tick cost.
pub fn execute_instruction(cpu: &mut Z80, bus: &mut dyn Bus) -> u32 {
    let opcode = fetch_opcode(cpu, bus);
    match opcode {
        0xCB => prefixed::execute_cb(cpu, bus),
        0xED => prefixed::execute_ed(cpu, bus),
        0xDD => execute_indexed(cpu, bus, IndexMode::Ix),
        0xFD => execute_indexed(cpu, bus, IndexMode::Iy),
        _ => execute_main(cpu, bus, opcode, IndexMode::Hl),
    }
}

fn execute_indexed(cpu: &mut Z80, bus: &mut dyn Bus, mode: IndexMode) -> u32 {
    // A prefix followed by another prefix (or ED) is a lone 4-tick no-op;
    // the following prefix starts the next instruction.
    if matches!(bus.read(cpu.regs.pc), 0xDD | 0xFD | 0xED) {
        return tick_cost(TickCostKind::IndexPrefix);
    }
    let opcode = fetch_opcode(cpu, bus);
    if opcode == 0xCB {
        return prefixed::execute_indexed_cb(cpu, bus, mode);
    }
    tick_cost(TickCostKind::IndexPrefix) + execute_main(cpu, bus, opcode, mode)
}

/// Extra ticks for an `(IX+d)` operand over the `(HL)` form.
fn displacement_cost(mode: IndexMode) -> u32 {
    if mode == IndexMode::Hl {
        0
    } else {
        tick_cost(TickCostKind::Displacement)
    }
}

fn branch_relative(cpu: &mut Z80, offset: u8) {
    cpu.regs.pc = cpu.regs.pc.wrapping_add_signed(i16::from(offset.cast_signed()));
    cpu.regs.wz = cpu.regs.pc;
}

fn execute_main(cpu: &mut Z80, bus: &mut dyn Bus, opcode: u8, mode: IndexMode) -> u32 {
    let fields = OpcodeFields::decode(opcode);
    match fields.x {
        0 => execute_x0(cpu, bus, fields, mode),
        1 => execute_load(cpu, bus, fields, mode),
        2 => {
            if fields.z == 6 {
                let addr = memory_operand_address(cpu, bus, mode);
                let value = bus.read(addr);
                flags::alu(&mut cpu.regs, AluOp::from_u3(fields.y), value);
                tick_cost(TickCostKind::MemoryOperand) + displacement_cost(mode)
            } else {
                let value = get_r(cpu, fields.z, mode);
                flags::alu(&mut cpu.regs, AluOp::from_u3(fields.y), value);
                tick_cost(TickCostKind::Simple)
            }
        }
        _ => execute_x3(cpu, bus, fields, mode),
    }
}

fn execute_load(cpu: &mut Z80, bus: &mut dyn Bus, fields: OpcodeFields, mode: IndexMode) -> u32 {
    match (fields.y, fields.z) {
        (6, 6) => {
            cpu.halted = true;
            tick_cost(TickCostKind::Simple)
        }
        (6, source) => {
            // The register side keeps plain H/L when the other operand is (IX+d).
            let value = get_r(cpu, source, IndexMode::Hl);
            let addr = memory_operand_address(cpu, bus, mode);
            bus.write(addr, value);
            tick_cost(TickCostKind::MemoryOperand) + displacement_cost(mode)
        }
        (target, 6) => {
            let addr = memory_operand_address(cpu, bus, mode);
            let value = bus.read(addr);
            set_r(cpu, target, IndexMode::Hl, value);
            tick_cost(TickCostKind::MemoryOperand) + displacement_cost(mode)
        }
        (target, source) => {
            let value = get_r(cpu, source, mode);
            set_r(cpu, target, mode, value);
            tick_cost(TickCostKind::Simple)
        }
    }
}

#[allow(clippy::too_many_lines)]
fn execute_x0(cpu: &mut Z80, bus: &mut dyn Bus, fields: OpcodeFields, mode: IndexMode) -> u32 {
    let OpcodeFields { y, z, p, q, .. } = fields;
    match z {
        0 => match y {
            0 => tick_cost(TickCostKind::Simple),
            1 => {
                cpu.regs.exchange_af();
                tick_cost(TickCostKind::Simple)
            }
            2 => {
                let offset = fetch_byte(cpu, bus);
                cpu.regs.b = cpu.regs.b.wrapping_sub(1);
                if cpu.regs.b == 0 {
                    tick_cost(TickCostKind::DjnzNotTaken)
                } else {
                    branch_relative(cpu, offset);
                    tick_cost(TickCostKind::DjnzTaken)
                }
            }
            3 => {
                let offset = fetch_byte(cpu, bus);
                branch_relative(cpu, offset);
                tick_cost(TickCostKind::RelativeTaken)
            }
            _ => {
                let offset = fetch_byte(cpu, bus);
                if Condition::from_u3(y - 4).holds(cpu.regs.f) {
                    branch_relative(cpu, offset);
                    tick_cost(TickCostKind::RelativeTaken)
                } else {
                    tick_cost(TickCostKind::RelativeNotTaken)
                }
            }
        },
        1 => {
            if q == 0 {
                let value = fetch_word(cpu, bus);
                set_rp(cpu, p, mode, value);
                tick_cost(TickCostKind::LoadPair)
            } else {
                let lhs = index_register(cpu, mode);
                let rhs = get_rp(cpu, p, mode);
                let result = flags::add16(&mut cpu.regs, lhs, rhs);
                set_index_register(cpu, mode, result);
                tick_cost(TickCostKind::AddPair)
            }
        }
        2 => execute_indirect_load(cpu, bus, p, q, mode),
        3 => {
            let value = get_rp(cpu, p, mode);
            let value = if q == 0 {
                value.wrapping_add(1)
            } else {
                value.wrapping_sub(1)
            };
            set_rp(cpu, p, mode, value);
            tick_cost(TickCostKind::Pair)
        }
        4 | 5 => {
            let increment = z == 4;
            if y == 6 {
                let addr = memory_operand_address(cpu, bus, mode);
                let value = bus.read(addr);
                let result = if increment {
                    flags::inc8(&mut cpu.regs, value)
                } else {
                    flags::dec8(&mut cpu.regs, value)
                };
                bus.write(addr, result);
                tick_cost(TickCostKind::ReadModifyWrite) + displacement_cost(mode)
            } else {
                let value = get_r(cpu, y, mode);
                let result = if increment {
                    flags::inc8(&mut cpu.regs, value)
                } else {
                    flags::dec8(&mut cpu.regs, value)
                };
                set_r(cpu, y, mode, result);
                tick_cost(TickCostKind::Simple)
            }
        }
        6 => {
            if y == 6 {
                let addr = memory_operand_address(cpu, bus, mode);
                let value = fetch_byte(cpu, bus);
                bus.write(addr, value);
                // Displacement and immediate fetches overlap: 19 ticks in total for LD (IX+d),n.
                let overlap = if mode == IndexMode::Hl { 0 } else { 3 };
                tick_cost(TickCostKind::StoreImmediate) + displacement_cost(mode) - overlap
            } else {
                let value = fetch_byte(cpu, bus);
                set_r(cpu, y, mode, value);
                tick_cost(TickCostKind::MemoryOperand)
            }
        }
        _ => {
            match y {
                0..=3 => flags::rotate_accumulator(&mut cpu.regs, y),
                4 => flags::decimal_adjust(&mut cpu.regs),
                5 => flags::complement(&mut cpu.regs),
                6 => flags::carry_flag_op(&mut cpu.regs, false),
                _ => flags::carry_flag_op(&mut cpu.regs, true),
            }
            tick_cost(TickCostKind::Simple)
        }
    }
}

fn execute_indirect_load(cpu: &mut Z80, bus: &mut dyn Bus, p: u8, q: u8, mode: IndexMode) -> u32 {
    match (q, p) {
        (0, 0 | 1) => {
            let addr = if p == 0 { cpu.regs.bc() } else { cpu.regs.de() };
            bus.write(addr, cpu.regs.a);
            cpu.regs.wz = u16::from_be_bytes([cpu.regs.a, addr.wrapping_add(1).to_le_bytes()[0]]);
            tick_cost(TickCostKind::MemoryOperand)
        }
        (0, 2) => {
            let addr = fetch_word(cpu, bus);
            write_word(bus, addr, index_register(cpu, mode));
            cpu.regs.wz = addr.wrapping_add(1);
            tick_cost(TickCostKind::AbsoluteWord)
        }
        (0, _) => {
            let addr = fetch_word(cpu, bus);
            bus.write(addr, cpu.regs.a);
            cpu.regs.wz = u16::from_be_bytes([cpu.regs.a, addr.wrapping_add(1).to_le_bytes()[0]]);
            tick_cost(TickCostKind::AbsoluteByte)
        }
        (_, 0 | 1) => {
            let addr = if p == 0 { cpu.regs.bc() } else { cpu.regs.de() };
            cpu.regs.a = bus.read(addr);
            cpu.regs.wz = addr.wrapping_add(1);
            tick_cost(TickCostKind::MemoryOperand)
        }
        (_, 2) => {
            let addr = fetch_word(cpu, bus);
            let value = read_word(bus, addr);
            set_index_register(cpu, mode, value);
            cpu.regs.wz = addr.wrapping_add(1);
            tick_cost(TickCostKind::AbsoluteWord)
        }
        _ => {
            let addr = fetch_word(cpu, bus);
            cpu.regs.a = bus.read(addr);
            cpu.regs.wz = addr.wrapping_add(1);
            tick_cost(TickCostKind::AbsoluteByte)
        }
    }
}

fn call(cpu: &mut Z80, bus: &mut dyn Bus, target: u16) {
    let return_address = cpu.regs.pc;
    push_word(cpu, bus, return_address);
    cpu.regs.pc = target;
    cpu.regs.wz = target;
}

#[allow(clippy::too_many_lines)]
fn execute_x3(cpu: &mut Z80, bus: &mut dyn Bus, fields: OpcodeFields, mode: IndexMode) -> u32 {
    let OpcodeFields { y, z, p, q, .. } = fields;
    match z {
        0 => {
            if Condition::from_u3(y).holds(cpu.regs.f) {
                cpu.regs.pc = pop_word(cpu, bus);
                cpu.regs.wz = cpu.regs.pc;
                tick_cost(TickCostKind::Push)
            } else {
                tick_cost(TickCostKind::ReturnNotTaken)
            }
        }
        1 => {
            if q == 0 {
                let value = pop_word(cpu, bus);
                set_rp2(cpu, p, mode, value);
                return tick_cost(TickCostKind::LoadPair);
            }
            match p {
                0 => {
                    cpu.regs.pc = pop_word(cpu, bus);
                    cpu.regs.wz = cpu.regs.pc;
                    tick_cost(TickCostKind::LoadPair)
                }
                1 => {
                    cpu.regs.exchange_pairs();
                    tick_cost(TickCostKind::Simple)
                }
                2 => {
                    cpu.regs.pc = index_register(cpu, mode);
                    tick_cost(TickCostKind::Simple)
                }
                _ => {
                    cpu.regs.sp = index_register(cpu, mode);
                    tick_cost(TickCostKind::Pair)
                }
            }
        }
        2 => {
            let target = fetch_word(cpu, bus);
            cpu.regs.wz = target;
            if Condition::from_u3(y).holds(cpu.regs.f) {
                cpu.regs.pc = target;
            }
            tick_cost(TickCostKind::LoadPair)
        }
        3 => match y {
            0 => {
                let target = fetch_word(cpu, bus);
                cpu.regs.pc = target;
                cpu.regs.wz = target;
                tick_cost(TickCostKind::LoadPair)
            }
            2 => {
                let low = fetch_byte(cpu, bus);
                let port = u16::from_be_bytes([cpu.regs.a, low]);
                bus.io_write(port, cpu.regs.a);
                cpu.regs.wz = u16::from_be_bytes([cpu.regs.a, low.wrapping_add(1)]);
                tick_cost(TickCostKind::Push)
            }
            3 => {
                let low = fetch_byte(cpu, bus);
                let port = u16::from_be_bytes([cpu.regs.a, low]);
                cpu.regs.a = bus.io_read(port);
                cpu.regs.wz = port.wrapping_add(1);
                tick_cost(TickCostKind::Push)
            }
            4 => {
                let sp = cpu.regs.sp;
                let stacked = read_word(bus, sp);
                write_word(bus, sp, index_register(cpu, mode));
                set_index_register(cpu, mode, stacked);
                cpu.regs.wz = stacked;
                tick_cost(TickCostKind::ExchangeStack)
            }
            5 => {
                let de = cpu.regs.de();
                cpu.regs.set_de(cpu.regs.hl());
                cpu.regs.set_hl(de);
                tick_cost(TickCostKind::Simple)
            }
            6 => {
                cpu.regs.iff1 = false;
                cpu.regs.iff2 = false;
                tick_cost(TickCostKind::Simple)
            }
            7 => {
                cpu.regs.iff1 = true;
                cpu.regs.iff2 = true;
                cpu.ei_delay = true;
                tick_cost(TickCostKind::Simple)
            }
            // CB is dispatched before reaching here.
            _ => tick_cost(TickCostKind::Simple),
        },
        4 => {
            let target = fetch_word(cpu, bus);
            if Condition::from_u3(y).holds(cpu.regs.f) {
                call(cpu, bus, target);
                tick_cost(TickCostKind::Call)
            } else {
                cpu.regs.wz = target;
                tick_cost(TickCostKind::CallNotTaken)
            }
        }
        5 => {
            if q == 0 {
                let value = get_rp2(cpu, p, mode);
                push_word(cpu, bus, value);
                tick_cost(TickCostKind::Push)
            } else if p == 0 {
                let target = fetch_word(cpu, bus);
                call(cpu, bus, target);
                tick_cost(TickCostKind::Call)
            } else {
                // DD/ED/FD are dispatched before reaching here.
                tick_cost(TickCostKind::Simple)
            }
        }
        6 => {
            let value = fetch_byte(cpu, bus);
            flags::alu(&mut cpu.regs, AluOp::from_u3(y), value);
            tick_cost(TickCostKind::MemoryOperand)
        }
        _ => {
            call(cpu, bus, u16::from(y) * 8);
            tick_cost(TickCostKind::Push)
        }
    }
}
