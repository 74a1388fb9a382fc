/// Instruction and dispatch forms with fixed Z80 tick costs.
///
/// Costs are for the unprefixed form; `DD`/`FD` index prefixes add
/// [`TickCostKind::IndexPrefix`] and `(IX+d)` operands add
/// [`TickCostKind::Displacement`] on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickCostKind {
    /// Register-only one-byte instruction (`NOP`, `LD r,r'`, ALU `r`, `EX`, `DI`, ...).
    Simple,
    /// `HALT` idle cycle, repeated until an interrupt is accepted.
    HaltCycle,
    /// 8-bit immediate or `(HL)`/`(BC)`/`(DE)` memory operand (`LD r,n`, ALU `(HL)`).
    MemoryOperand,
    /// `LD (HL),n`.
    StoreImmediate,
    /// `INC (HL)` / `DEC (HL)`.
    ReadModifyWrite,
    /// `INC rr` / `DEC rr` / `LD SP,HL`.
    Pair,
    /// `LD rr,nn` / `JP nn` / `JP cc,nn` / `POP rr` / unconditional `RET`.
    LoadPair,
    /// `ADD HL,rr`.
    AddPair,
    /// `PUSH rr` / `RST p` / `OUT (n),A` / `IN A,(n)` / taken `RET cc`.
    Push,
    /// Untaken `RET cc`.
    ReturnNotTaken,
    /// `LD (nn),A` / `LD A,(nn)`.
    AbsoluteByte,
    /// `LD (nn),HL` / `LD HL,(nn)`.
    AbsoluteWord,
    /// `JR d` and taken `JR cc,d`.
    RelativeTaken,
    /// Untaken `JR cc,d`.
    RelativeNotTaken,
    /// `DJNZ d` when looping.
    DjnzTaken,
    /// `DJNZ d` when falling through.
    DjnzNotTaken,
    /// `CALL nn` and taken `CALL cc,nn`.
    Call,
    /// Untaken `CALL cc,nn` (same as `JP nn`).
    CallNotTaken,
    /// `EX (SP),HL`.
    ExchangeStack,
    /// `CB` register form.
    BitRegister,
    /// `CB` `BIT n,(HL)`.
    BitTestMemory,
    /// `CB` rotate/`RES`/`SET` on `(HL)`.
    BitMemory,
    /// `DDCB`/`FDCB` `BIT n,(IX+d)`.
    IndexedBitTest,
    /// `DDCB`/`FDCB` rotate/`RES`/`SET` on `(IX+d)`.
    IndexedBitMemory,
    /// `DD`/`FD` prefix overhead.
    IndexPrefix,
    /// `(IX+d)` displacement overhead on top of the `(HL)` form.
    Displacement,
    /// `ED` two-byte no-op, `NEG`, `IM n`.
    ExtendedSimple,
    /// `LD I,A` / `LD R,A` / `LD A,I` / `LD A,R`.
    ExtendedSpecial,
    /// `IN r,(C)` / `OUT (C),r`.
    ExtendedIo,
    /// `ADC HL,rr` / `SBC HL,rr`.
    ExtendedArithmetic,
    /// `RETI` / `RETN`.
    ExtendedReturn,
    /// `RRD` / `RLD`.
    Digit,
    /// `LD (nn),rr` / `LD rr,(nn)` via `ED`.
    ExtendedAbsoluteWord,
    /// Block instruction that completes (`LDI`, or `LDIR` with `BC` reaching zero).
    BlockFinal,
    /// Block instruction that repeats.
    BlockRepeat,
    /// Interrupt acknowledge in mode 0 or 1.
    InterruptMode1,
    /// Interrupt acknowledge in mode 2.
    InterruptMode2,
}

/// Single source-of-truth tick table.
pub const TICK_COST_TABLE: &[(TickCostKind, u32)] = &[
    (TickCostKind::Simple, 4),
    (TickCostKind::HaltCycle, 4),
    (TickCostKind::MemoryOperand, 7),
    (TickCostKind::StoreImmediate, 10),
    (TickCostKind::ReadModifyWrite, 11),
    (TickCostKind::Pair, 6),
    (TickCostKind::LoadPair, 10),
    (TickCostKind::AddPair, 11),
    (TickCostKind::Push, 11),
    (TickCostKind::ReturnNotTaken, 5),
    (TickCostKind::AbsoluteByte, 13),
    (TickCostKind::AbsoluteWord, 16),
    (TickCostKind::RelativeTaken, 12),
    (TickCostKind::RelativeNotTaken, 7),
    (TickCostKind::DjnzTaken, 13),
    (TickCostKind::DjnzNotTaken, 8),
    (TickCostKind::Call, 17),
    (TickCostKind::CallNotTaken, 10),
    (TickCostKind::ExchangeStack, 19),
    (TickCostKind::BitRegister, 8),
    (TickCostKind::BitTestMemory, 12),
    (TickCostKind::BitMemory, 15),
    (TickCostKind::IndexedBitTest, 20),
    (TickCostKind::IndexedBitMemory, 23),
    (TickCostKind::IndexPrefix, 4),
    (TickCostKind::Displacement, 8),
    (TickCostKind::ExtendedSimple, 8),
    (TickCostKind::ExtendedSpecial, 9),
    (TickCostKind::ExtendedIo, 12),
    (TickCostKind::ExtendedArithmetic, 15),
    (TickCostKind::ExtendedReturn, 14),
    (TickCostKind::Digit, 18),
    (TickCostKind::ExtendedAbsoluteWord, 20),
    (TickCostKind::BlockFinal, 16),
    (TickCostKind::BlockRepeat, 21),
    (TickCostKind::InterruptMode1, 13),
    (TickCostKind::InterruptMode2, 19),
];

/// Looks up the tick cost for a cost kind.
#[must_use]
pub fn tick_cost(kind: TickCostKind) -> u32 {
    TICK_COST_TABLE
        .iter()
        .find_map(|(entry_kind, ticks)| (*entry_kind == kind).then_some(*ticks))
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{tick_cost, TickCostKind, TICK_COST_TABLE};

    #[test]
    fn table_contains_unique_kinds() {
        let kinds: HashSet<_> = TICK_COST_TABLE.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds.len(), TICK_COST_TABLE.len());
    }

    #[test]
    fn table_values_match_documented_timings() {
        assert_eq!(tick_cost(TickCostKind::Simple), 4);
        assert_eq!(tick_cost(TickCostKind::Call), 17);
        assert_eq!(tick_cost(TickCostKind::DjnzTaken), 13);
        assert_eq!(tick_cost(TickCostKind::BlockRepeat), 21);
        assert_eq!(tick_cost(TickCostKind::InterruptMode2), 19);
    }

    #[test]
    fn indexed_memory_forms_compose_from_overheads() {
        let load_indexed = tick_cost(TickCostKind::MemoryOperand)
            + tick_cost(TickCostKind::IndexPrefix)
            + tick_cost(TickCostKind::Displacement);
        assert_eq!(load_indexed, 19);

        let inc_indexed = tick_cost(TickCostKind::ReadModifyWrite)
            + tick_cost(TickCostKind::IndexPrefix)
            + tick_cost(TickCostKind::Displacement);
        assert_eq!(inc_indexed, 23);
    }
}
