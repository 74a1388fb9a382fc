//! Flag computation for 8- and 16-bit arithmetic, logic, rotates, and bit tests.

use crate::state::registers::{
    Z80Registers, FLAG_C, FLAG_H, FLAG_N, FLAG_PV, FLAG_S, FLAG_X, FLAG_Y, FLAG_Z,
};

/// `S`, `Z`, and undocumented `Y`/`X` bits for a result byte.
#[must_use]
pub const fn sz53(value: u8) -> u8 {
    let mut flags = value & (FLAG_S | FLAG_Y | FLAG_X);
    if value == 0 {
        flags |= FLAG_Z;
    }
    flags
}

/// [`sz53`] plus even parity in `P/V`.
#[must_use]
pub const fn sz53p(value: u8) -> u8 {
    let mut flags = sz53(value);
    if value.count_ones() % 2 == 0 {
        flags |= FLAG_PV;
    }
    flags
}

/// 8-bit ALU operation selected by the `y` field of `ALU r` opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    /// Decodes the 3-bit ALU selector.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Self::Add,
            1 => Self::Adc,
            2 => Self::Sub,
            3 => Self::Sbc,
            4 => Self::And,
            5 => Self::Xor,
            6 => Self::Or,
            _ => Self::Cp,
        }
    }
}

/// Applies an ALU operation to `A` and `operand`, updating `A` (except for `CP`) and `F`.
pub const fn alu(regs: &mut Z80Registers, op: AluOp, operand: u8) {
    let carry = regs.f & FLAG_C;
    match op {
        AluOp::Add => regs.a = add8(regs, operand, 0),
        AluOp::Adc => regs.a = add8(regs, operand, carry),
        AluOp::Sub => regs.a = sub8(regs, operand, 0),
        AluOp::Sbc => regs.a = sub8(regs, operand, carry),
        AluOp::And => {
            regs.a &= operand;
            regs.f = sz53p(regs.a) | FLAG_H;
        }
        AluOp::Xor => {
            regs.a ^= operand;
            regs.f = sz53p(regs.a);
        }
        AluOp::Or => {
            regs.a |= operand;
            regs.f = sz53p(regs.a);
        }
        AluOp::Cp => {
            sub8(regs, operand, 0);
            regs.f = (regs.f & !(FLAG_Y | FLAG_X)) | (operand & (FLAG_Y | FLAG_X));
        }
    }
}

const fn add8(regs: &mut Z80Registers, operand: u8, carry: u8) -> u8 {
    let a = regs.a;
    let wide = a as u16 + operand as u16 + carry as u16;
    let result = wide as u8;
    let mut flags = sz53(result);
    if (a ^ operand ^ result) & 0x10 != 0 {
        flags |= FLAG_H;
    }
    if (a ^ operand) & 0x80 == 0 && (a ^ result) & 0x80 != 0 {
        flags |= FLAG_PV;
    }
    if wide > 0xFF {
        flags |= FLAG_C;
    }
    regs.f = flags;
    result
}

const fn sub8(regs: &mut Z80Registers, operand: u8, carry: u8) -> u8 {
    let a = regs.a;
    let wide = (a as u16).wrapping_sub(operand as u16).wrapping_sub(carry as u16);
    let result = wide as u8;
    let mut flags = sz53(result) | FLAG_N;
    if (a ^ operand ^ result) & 0x10 != 0 {
        flags |= FLAG_H;
    }
    if (a ^ operand) & 0x80 != 0 && (a ^ result) & 0x80 != 0 {
        flags |= FLAG_PV;
    }
    if wide > 0xFF {
        flags |= FLAG_C;
    }
    regs.f = flags;
    result
}

/// `INC r`: carry preserved.
pub const fn inc8(regs: &mut Z80Registers, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    let mut flags = (regs.f & FLAG_C) | sz53(result);
    if value & 0x0F == 0x0F {
        flags |= FLAG_H;
    }
    if value == 0x7F {
        flags |= FLAG_PV;
    }
    regs.f = flags;
    result
}

/// `DEC r`: carry preserved.
pub const fn dec8(regs: &mut Z80Registers, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    let mut flags = (regs.f & FLAG_C) | sz53(result) | FLAG_N;
    if value & 0x0F == 0 {
        flags |= FLAG_H;
    }
    if value == 0x80 {
        flags |= FLAG_PV;
    }
    regs.f = flags;
    result
}

/// `ADD HL,rr`: `S`, `Z`, `P/V` preserved.
pub const fn add16(regs: &mut Z80Registers, lhs: u16, rhs: u16) -> u16 {
    let wide = lhs as u32 + rhs as u32;
    let result = wide as u16;
    let mut flags = (regs.f & (FLAG_S | FLAG_Z | FLAG_PV)) | ((result >> 8) as u8 & (FLAG_Y | FLAG_X));
    if (lhs ^ rhs ^ result) & 0x1000 != 0 {
        flags |= FLAG_H;
    }
    if wide > 0xFFFF {
        flags |= FLAG_C;
    }
    regs.f = flags;
    regs.wz = lhs.wrapping_add(1);
    result
}

/// `ADC HL,rr` (`subtract == false`) or `SBC HL,rr` (`subtract == true`).
pub const fn adc_sbc16(regs: &mut Z80Registers, rhs: u16, subtract: bool) -> u16 {
    let lhs = regs.hl();
    let carry = (regs.f & FLAG_C) as u32;
    let wide = if subtract {
        (lhs as u32).wrapping_sub(rhs as u32).wrapping_sub(carry)
    } else {
        lhs as u32 + rhs as u32 + carry
    };
    let result = wide as u16;
    let high = (result >> 8) as u8;
    let mut flags = high & (FLAG_S | FLAG_Y | FLAG_X);
    if result == 0 {
        flags |= FLAG_Z;
    }
    if (lhs ^ rhs ^ result) & 0x1000 != 0 {
        flags |= FLAG_H;
    }
    let overflow = if subtract {
        (lhs ^ rhs) & 0x8000 != 0 && (lhs ^ result) & 0x8000 != 0
    } else {
        (lhs ^ rhs) & 0x8000 == 0 && (lhs ^ result) & 0x8000 != 0
    };
    if overflow {
        flags |= FLAG_PV;
    }
    if subtract {
        flags |= FLAG_N;
    }
    if wide > 0xFFFF {
        flags |= FLAG_C;
    }
    regs.f = flags;
    regs.wz = lhs.wrapping_add(1);
    result
}

/// Accumulator rotates `RLCA`, `RRCA`, `RLA`, `RRA` selected by `y` (`0..=3`).
pub const fn rotate_accumulator(regs: &mut Z80Registers, y: u8) {
    let a = regs.a;
    let carry_in = regs.f & FLAG_C;
    let (result, carry_out) = match y {
        0 => (a.rotate_left(1), a >> 7),
        1 => (a.rotate_right(1), a & 1),
        2 => ((a << 1) | carry_in, a >> 7),
        _ => ((a >> 1) | (carry_in << 7), a & 1),
    };
    regs.a = result;
    regs.f = (regs.f & (FLAG_S | FLAG_Z | FLAG_PV)) | (result & (FLAG_Y | FLAG_X)) | carry_out;
}

/// `CB` rotate/shift selected by `y`: `RLC RRC RL RR SLA SRA SLL SRL`.
pub const fn rotate_shift(regs: &mut Z80Registers, y: u8, value: u8) -> u8 {
    let carry_in = regs.f & FLAG_C;
    let (result, carry_out) = match y {
        0 => (value.rotate_left(1), value >> 7),
        1 => (value.rotate_right(1), value & 1),
        2 => ((value << 1) | carry_in, value >> 7),
        3 => ((value >> 1) | (carry_in << 7), value & 1),
        4 => (value << 1, value >> 7),
        5 => ((value >> 1) | (value & 0x80), value & 1),
        6 => ((value << 1) | 1, value >> 7),
        _ => (value >> 1, value & 1),
    };
    regs.f = sz53p(result) | carry_out;
    result
}

/// `BIT n,value`: carry preserved.
pub const fn bit_test(regs: &mut Z80Registers, bit: u8, value: u8) {
    let masked = value & (1 << bit);
    let mut flags = (regs.f & FLAG_C) | FLAG_H | (value & (FLAG_Y | FLAG_X));
    if masked == 0 {
        flags |= FLAG_Z | FLAG_PV;
    }
    if bit == 7 && masked != 0 {
        flags |= FLAG_S;
    }
    regs.f = flags;
}

/// `DAA`.
pub const fn decimal_adjust(regs: &mut Z80Registers) {
    let a = regs.a;
    let mut correction = 0u8;
    let mut carry = regs.f & FLAG_C;
    if regs.f & FLAG_H != 0 || a & 0x0F > 9 {
        correction |= 0x06;
    }
    if carry != 0 || a > 0x99 {
        correction |= 0x60;
        carry = FLAG_C;
    }
    let subtract = regs.f & FLAG_N != 0;
    let result = if subtract {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };
    let half = if subtract {
        regs.f & FLAG_H != 0 && a & 0x0F < 6
    } else {
        a & 0x0F > 9
    };
    regs.a = result;
    regs.f = sz53p(result) | carry | (regs.f & FLAG_N) | if half { FLAG_H } else { 0 };
}

/// `CPL`.
pub const fn complement(regs: &mut Z80Registers) {
    regs.a = !regs.a;
    regs.f = (regs.f & (FLAG_S | FLAG_Z | FLAG_PV | FLAG_C))
        | FLAG_H
        | FLAG_N
        | (regs.a & (FLAG_Y | FLAG_X));
}

/// `SCF` (`invert == false`) or `CCF` (`invert == true`).
pub const fn carry_flag_op(regs: &mut Z80Registers, invert: bool) {
    let old_carry = regs.f & FLAG_C;
    let preserved = regs.f & (FLAG_S | FLAG_Z | FLAG_PV);
    let xy = regs.a & (FLAG_Y | FLAG_X);
    regs.f = if invert {
        preserved | xy | if old_carry != 0 { FLAG_H } else { FLAG_C }
    } else {
        preserved | xy | FLAG_C
    };
}

/// `NEG`.
pub const fn negate(regs: &mut Z80Registers) {
    let operand = regs.a;
    regs.a = 0;
    regs.a = sub8(regs, operand, 0);
}
