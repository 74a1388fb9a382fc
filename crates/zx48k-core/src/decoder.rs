//! Z80 opcode field decoder.
//!
//! Every opcode byte splits into `x` (bits 7-6), `y` (bits 5-3), `z` (bits 2-0),
//! with `y` further split into `p` (bits 5-4) and `q` (bit 3). The executor
//! dispatches on these fields instead of on raw opcode values.

use crate::state::registers::{FLAG_C, FLAG_PV, FLAG_S, FLAG_Z};

/// Field split of one opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpcodeFields {
    /// Raw opcode byte.
    pub opcode: u8,
    /// Bits 7-6.
    pub x: u8,
    /// Bits 5-3.
    pub y: u8,
    /// Bits 2-0.
    pub z: u8,
    /// Bits 5-4.
    pub p: u8,
    /// Bit 3.
    pub q: u8,
}

impl OpcodeFields {
    /// Splits an opcode byte into its fields.
    #[must_use]
    pub const fn decode(opcode: u8) -> Self {
        let y = (opcode >> 3) & 0b111;
        Self {
            opcode,
            x: opcode >> 6,
            y,
            z: opcode & 0b111,
            p: y >> 1,
            q: y & 1,
        }
    }
}

/// Branch condition encoded in the `y` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Condition {
    NonZero,
    Zero,
    NoCarry,
    Carry,
    ParityOdd,
    ParityEven,
    Positive,
    Minus,
}

impl Condition {
    /// Decodes a 3-bit condition field.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Self::NonZero,
            1 => Self::Zero,
            2 => Self::NoCarry,
            3 => Self::Carry,
            4 => Self::ParityOdd,
            5 => Self::ParityEven,
            6 => Self::Positive,
            _ => Self::Minus,
        }
    }

    /// Evaluates the condition against an `F` value.
    #[must_use]
    pub const fn holds(self, flags: u8) -> bool {
        match self {
            Self::NonZero => flags & FLAG_Z == 0,
            Self::Zero => flags & FLAG_Z != 0,
            Self::NoCarry => flags & FLAG_C == 0,
            Self::Carry => flags & FLAG_C != 0,
            Self::ParityOdd => flags & FLAG_PV == 0,
            Self::ParityEven => flags & FLAG_PV != 0,
            Self::Positive => flags & FLAG_S == 0,
            Self::Minus => flags & FLAG_S != 0,
        }
    }
}

/// Opcodes that call or repeat and therefore get stepped over as a unit.
///
/// Returns the instruction length in bytes when `opcode` (with `next` as the
/// following byte) is a `CALL`, `CALL cc`, `RST`, or repeating block instruction.
#[must_use]
pub const fn step_over_length(opcode: u8, next: u8) -> Option<u16> {
    let fields = OpcodeFields::decode(opcode);
    match opcode {
        0xCD => Some(3),
        0xED if matches!(next, 0xB0..=0xB3 | 0xB8..=0xBB) => Some(2),
        _ if fields.x == 3 && fields.z == 4 => Some(3),
        _ if fields.x == 3 && fields.z == 7 => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{step_over_length, Condition, OpcodeFields};
    use crate::state::registers::{FLAG_C, FLAG_Z};

    #[test]
    fn fields_split_ld_b_c() {
        let fields = OpcodeFields::decode(0x41);
        assert_eq!((fields.x, fields.y, fields.z), (1, 0, 1));
        assert_eq!((fields.p, fields.q), (0, 0));
    }

    #[test]
    fn fields_split_add_hl_sp() {
        let fields = OpcodeFields::decode(0x39);
        assert_eq!((fields.x, fields.z, fields.p, fields.q), (0, 1, 3, 1));
    }

    #[test]
    fn conditions_read_flags() {
        assert!(Condition::from_u3(0).holds(0));
        assert!(!Condition::from_u3(0).holds(FLAG_Z));
        assert!(Condition::from_u3(3).holds(FLAG_C));
        assert!(Condition::from_u3(4).holds(0));
    }

    #[test]
    fn step_over_recognises_calls_rst_and_repeats() {
        assert_eq!(step_over_length(0xCD, 0x00), Some(3));
        assert_eq!(step_over_length(0xC4, 0x00), Some(3));
        assert_eq!(step_over_length(0xFF, 0x00), Some(1));
        assert_eq!(step_over_length(0xED, 0xB0), Some(2));
        assert_eq!(step_over_length(0xED, 0x44), None);
        assert_eq!(step_over_length(0xC3, 0x00), None);
        assert_eq!(step_over_length(0x00, 0x00), None);
    }
}
