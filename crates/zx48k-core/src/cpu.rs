//! Z80 CPU core: register file, interrupt line, and the one-instruction advance.
//!
//! The rest of the crate drives the CPU only through [`Z80::step_instruction`],
//! which executes one atomic instruction (or interrupt acknowledge) and reports
//! the ticks it consumed.

use crate::execute;
use crate::state::Z80Registers;
use crate::timing::{tick_cost, TickCostKind};

/// Memory and I/O bus seen by the CPU.
pub trait Bus {
    /// Reads a memory byte.
    fn read(&mut self, addr: u16) -> u8;
    /// Writes a memory byte.
    fn write(&mut self, addr: u16, value: u8);
    /// Reads from the I/O port space.
    fn io_read(&mut self, port: u16) -> u8;
    /// Writes to the I/O port space.
    fn io_write(&mut self, port: u16, value: u8);
}

/// Z80 CPU state beyond the register file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Z80 {
    /// Architectural registers.
    pub regs: Z80Registers,
    /// Set by `HALT`; cleared when an interrupt is accepted.
    pub halted: bool,
    /// Set by `EI`; blocks interrupt acceptance for one instruction.
    pub(crate) ei_delay: bool,
    /// Remaining ticks for which the maskable interrupt line stays asserted.
    pub(crate) int_ticks: u32,
}

impl Z80 {
    /// Creates a CPU with power-on register values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores power-on state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Asserts the maskable interrupt line for `ticks` ticks.
    pub const fn assert_interrupt(&mut self, ticks: u32) {
        self.int_ticks = ticks;
    }

    /// Returns `true` while the maskable interrupt line is asserted.
    #[must_use]
    pub const fn interrupt_pending(&self) -> bool {
        self.int_ticks > 0
    }

    /// Executes one instruction, one `HALT` idle cycle, or one interrupt
    /// acknowledge, and returns the ticks consumed.
    pub fn step_instruction(&mut self, bus: &mut dyn Bus) -> u32 {
        let ticks = if self.int_ticks > 0 && self.regs.iff1 && !self.ei_delay {
            self.accept_interrupt(bus)
        } else {
            self.ei_delay = false;
            if self.halted {
                self.regs.bump_refresh();
                tick_cost(TickCostKind::HaltCycle)
            } else {
                execute::execute_instruction(self, bus)
            }
        };
        self.int_ticks = self.int_ticks.saturating_sub(ticks);
        ticks
    }

    fn accept_interrupt(&mut self, bus: &mut dyn Bus) -> u32 {
        self.halted = false;
        self.int_ticks = 0;
        self.regs.iff1 = false;
        self.regs.iff2 = false;
        self.regs.bump_refresh();
        let return_address = self.regs.pc;
        execute::push_word(self, bus, return_address);

        if self.regs.im == 2 {
            let vector = u16::from_be_bytes([self.regs.i, 0xFF]);
            let lo = bus.read(vector);
            let hi = bus.read(vector.wrapping_add(1));
            self.regs.pc = u16::from_le_bytes([lo, hi]);
            self.regs.wz = self.regs.pc;
            tick_cost(TickCostKind::InterruptMode2)
        } else {
            self.regs.pc = 0x0038;
            self.regs.wz = 0x0038;
            tick_cost(TickCostKind::InterruptMode1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Bus, Z80};

    struct FlatBus {
        memory: Vec<u8>,
    }

    impl FlatBus {
        fn with_program(program: &[u8]) -> Self {
            let mut memory = vec![0; 0x10000];
            memory[..program.len()].copy_from_slice(program);
            Self { memory }
        }
    }

    impl Bus for FlatBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.memory[usize::from(addr)]
        }

        fn write(&mut self, addr: u16, value: u8) {
            self.memory[usize::from(addr)] = value;
        }

        fn io_read(&mut self, _port: u16) -> u8 {
            0xFF
        }

        fn io_write(&mut self, _port: u16, _value: u8) {}
    }

    #[test]
    fn halt_idles_until_interrupt_then_vectors_to_0038() {
        // EI; HALT
        let mut bus = FlatBus::with_program(&[0xFB, 0x76]);
        let mut cpu = Z80::new();
        cpu.regs.sp = 0x8000;
        cpu.regs.im = 1;

        assert_eq!(cpu.step_instruction(&mut bus), 4);
        assert_eq!(cpu.step_instruction(&mut bus), 4);
        assert!(cpu.halted);
        assert_eq!(cpu.step_instruction(&mut bus), 4);
        assert_eq!(cpu.regs.pc, 0x0002);

        cpu.assert_interrupt(32);
        assert_eq!(cpu.step_instruction(&mut bus), 13);
        assert!(!cpu.halted);
        assert_eq!(cpu.regs.pc, 0x0038);
        assert_eq!(cpu.regs.sp, 0x7FFE);
        assert_eq!(bus.memory[0x7FFE], 0x02);
        assert!(!cpu.regs.iff1);
    }

    #[test]
    fn interrupt_is_deferred_for_one_instruction_after_ei() {
        // EI; NOP
        let mut bus = FlatBus::with_program(&[0xFB, 0x00]);
        let mut cpu = Z80::new();
        cpu.regs.sp = 0x8000;
        cpu.assert_interrupt(32);

        assert_eq!(cpu.step_instruction(&mut bus), 4);
        assert_eq!(cpu.step_instruction(&mut bus), 4);
        assert_eq!(cpu.regs.pc, 0x0002);
        assert_eq!(cpu.step_instruction(&mut bus), 13);
        assert_eq!(cpu.regs.pc, 0x0038);
    }

    #[test]
    fn interrupt_line_drops_after_its_window() {
        let mut bus = FlatBus::with_program(&[0x00; 16]);
        let mut cpu = Z80::new();
        cpu.assert_interrupt(8);
        cpu.step_instruction(&mut bus);
        cpu.step_instruction(&mut bus);
        assert!(!cpu.interrupt_pending());
    }

    #[test]
    fn mode_two_reads_vector_table() {
        let mut bus = FlatBus::with_program(&[0x00]);
        bus.memory[0x80FF] = 0x34;
        bus.memory[0x8100] = 0x12;
        let mut cpu = Z80::new();
        cpu.regs.sp = 0xC000;
        cpu.regs.iff1 = true;
        cpu.regs.im = 2;
        cpu.regs.i = 0x80;
        cpu.assert_interrupt(32);

        assert_eq!(cpu.step_instruction(&mut bus), 19);
        assert_eq!(cpu.regs.pc, 0x1234);
    }
}
