//! Descriptor tables for the Spectrum 48K.
//!
//! The machine has one CPU and one ULA, so instance index `0` is the only
//! valid one; every accessor reads `0` or ignores writes for any other index
//! and for out-of-range addresses.

use super::descriptor::{
    Cpu, CpuType, MemoryRegion, Register, RegisterTag, RegisterWidth, System,
};
use crate::machine::Spectrum48k;
use crate::memory::{ADDRESS_SPACE_BYTES, RAM_SIZE, RAM_START, ROM_SIZE, SCREEN_BYTES, SCREEN_START};
use crate::state::Z80Register;

const INSTANCES: usize = 1;

const fn valid(index: usize) -> bool {
    index < INSTANCES
}

/// Converts a region-relative address to an offset below `size`.
fn offset(address: u64, size: usize) -> Option<usize> {
    usize::try_from(address).ok().filter(|&offset| offset < size)
}

fn z80_get(machine: &Spectrum48k, index: usize, reg: Z80Register) -> u64 {
    if valid(index) {
        machine.cpu().regs.get(reg)
    } else {
        0
    }
}

fn z80_set(machine: &mut Spectrum48k, index: usize, reg: Z80Register, value: u64) {
    if valid(index) {
        machine.cpu_mut().regs.set(reg, value);
    }
}

macro_rules! z80_register {
    ($name:literal, $reg:ident, $width:ident, $tag:expr, $labels:expr) => {
        Register {
            name: $name,
            width: RegisterWidth::$width,
            tag: $tag,
            bit_labels: $labels,
            get: |machine, index| z80_get(machine, index, Z80Register::$reg),
            set: Some(|machine, index, value| z80_set(machine, index, Z80Register::$reg, value)),
        }
    };
    ($name:literal, $reg:ident, $width:ident, read_only) => {
        Register {
            name: $name,
            width: RegisterWidth::$width,
            tag: None,
            bit_labels: None,
            get: |machine, index| z80_get(machine, index, Z80Register::$reg),
            set: None,
        }
    };
}

/// Bit names of `F`, most significant first.
pub const FLAG_LABELS: &[&str] = &["S", "Z", "Y", "H", "X", "P/V", "N", "C"];
/// Bit names of the `IFF` composite, most significant first.
pub const IFF_LABELS: &[&str] = &["IFF1", "IFF2"];

/// Z80 registers in [`Z80Register`] order.
pub static Z80_REGISTERS: [Register<Spectrum48k>; 18] = [
    z80_register!("A", A, Byte, None, None),
    z80_register!("F", F, Byte, None, Some(FLAG_LABELS)),
    z80_register!("BC", Bc, Word, None, None),
    z80_register!("DE", De, Word, None, None),
    z80_register!("HL", Hl, Word, Some(RegisterTag::MemoryPointer), None),
    z80_register!("IX", Ix, Word, Some(RegisterTag::MemoryPointer), None),
    z80_register!("IY", Iy, Word, Some(RegisterTag::MemoryPointer), None),
    z80_register!("AF'", AfAlt, Word, None, None),
    z80_register!("BC'", BcAlt, Word, None, None),
    z80_register!("DE'", DeAlt, Word, None, None),
    z80_register!("HL'", HlAlt, Word, None, None),
    z80_register!("I", I, Byte, None, None),
    z80_register!("R", R, Byte, None, None),
    z80_register!("SP", Sp, Word, Some(RegisterTag::StackPointer), None),
    z80_register!("PC", Pc, Word, Some(RegisterTag::ProgramCounter), None),
    z80_register!("IFF", Iff, Byte, None, Some(IFF_LABELS)),
    z80_register!("IM", Im, Byte, None, None),
    z80_register!("WZ", Wz, Word, read_only),
];

fn main_peek(machine: &Spectrum48k, index: usize, address: u64) -> u8 {
    match (valid(index), offset(address, ADDRESS_SPACE_BYTES)) {
        (true, Some(addr)) => u16::try_from(addr).map_or(0, |addr| machine.memory().read(addr)),
        _ => 0,
    }
}

fn main_poke(machine: &mut Spectrum48k, index: usize, address: u64, value: u8) {
    if let (true, Some(addr)) = (valid(index), offset(address, ADDRESS_SPACE_BYTES)) {
        if let Ok(addr) = u16::try_from(addr) {
            machine.memory_mut().write(addr, value);
        }
    }
}

fn main_set_watch_point(
    machine: &mut Spectrum48k,
    index: usize,
    address: u64,
    length: u64,
    read: bool,
    write: bool,
) -> u32 {
    if !valid(index) || offset(address, ADDRESS_SPACE_BYTES).is_none() {
        return 0;
    }
    machine.set_watch_point(address, length, read, write)
}

fn main_remove_watch_point(machine: &mut Spectrum48k, index: usize, handle: u32) {
    if valid(index) {
        machine.remove_watch_point(handle);
    }
}

/// Memory regions of the main CPU.
pub static Z80_REGIONS: [MemoryRegion<Spectrum48k>; 3] = [
    MemoryRegion {
        description: "Main",
        base_address: 0,
        size: ADDRESS_SPACE_BYTES as u64,
        is_main: true,
        cpu_addressable: true,
        peek: main_peek,
        poke: Some(main_poke),
        set_watch_point: Some(main_set_watch_point),
        remove_watch_point: Some(main_remove_watch_point),
    },
    MemoryRegion {
        description: "ROM",
        base_address: 0,
        size: ROM_SIZE as u64,
        is_main: false,
        cpu_addressable: true,
        peek: |machine, index, address| match (valid(index), offset(address, ROM_SIZE)) {
            (true, Some(at)) => machine.memory().rom_byte(at),
            _ => 0,
        },
        poke: Some(|machine, index, address, value| {
            if let (true, Some(at)) = (valid(index), offset(address, ROM_SIZE)) {
                machine.memory_mut().patch_rom(at, value);
            }
        }),
        set_watch_point: None,
        remove_watch_point: None,
    },
    MemoryRegion {
        description: "RAM",
        base_address: RAM_START as u64,
        size: RAM_SIZE as u64,
        is_main: false,
        cpu_addressable: true,
        peek: |machine, index, address| match (valid(index), offset(address, RAM_SIZE)) {
            (true, Some(at)) => machine.memory().ram_byte(at),
            _ => 0,
        },
        poke: Some(|machine, index, address, value| {
            if let (true, Some(at)) = (valid(index), offset(address, RAM_SIZE)) {
                machine.memory_mut().set_ram_byte(at, value);
            }
        }),
        set_watch_point: None,
        remove_watch_point: None,
    },
];

fn set_break_point(machine: &mut Spectrum48k, index: usize, address: u64) -> u32 {
    match (valid(index), u16::try_from(address)) {
        (true, Ok(addr)) => machine.set_break_point(addr),
        _ => 0,
    }
}

/// CPUs of the machine.
pub static CPUS: [Cpu<Spectrum48k>; 1] = [Cpu {
    cpu_type: CpuType::Z80,
    description: "Main CPU",
    is_main: true,
    registers: &Z80_REGISTERS,
    memory_regions: &Z80_REGIONS,
    pause: Some(|machine, index| {
        if valid(index) {
            machine.pause();
        }
    }),
    resume: Some(|machine, index| {
        if valid(index) {
            machine.resume();
        }
    }),
    step: Some(|machine, index| {
        if valid(index) {
            machine.step();
        }
    }),
    step_over: Some(|machine, index| {
        if valid(index) {
            machine.step_over();
        }
    }),
    step_out: Some(|machine, index| {
        if valid(index) {
            machine.step_out();
        }
    }),
    set_break_point: Some(set_break_point),
    remove_break_point: Some(|machine, index, handle| {
        if valid(index) {
            machine.remove_break_point(handle);
        }
    }),
}];

/// ULA latches shared by the whole machine.
pub static SYSTEM_REGISTERS: [Register<Spectrum48k>; 4] = [
    Register {
        name: "BORDER",
        width: RegisterWidth::Byte,
        tag: None,
        bit_labels: None,
        get: |machine, index| if valid(index) { u64::from(machine.ula().border) } else { 0 },
        set: Some(|machine, index, value| {
            if valid(index) {
                machine.ula_mut().border = value.to_le_bytes()[0] & 0x07;
            }
        }),
    },
    Register {
        name: "EAR",
        width: RegisterWidth::Byte,
        tag: None,
        bit_labels: None,
        get: |machine, index| u64::from(valid(index) && machine.ula().ear),
        set: Some(|machine, index, value| {
            if valid(index) {
                machine.ula_mut().ear = value & 1 != 0;
            }
        }),
    },
    Register {
        name: "MIC",
        width: RegisterWidth::Byte,
        tag: None,
        bit_labels: None,
        get: |machine, index| u64::from(valid(index) && machine.ula().mic),
        set: Some(|machine, index, value| {
            if valid(index) {
                machine.ula_mut().mic = value & 1 != 0;
            }
        }),
    },
    Register {
        name: "FRAME",
        width: RegisterWidth::QuadWord,
        tag: None,
        bit_labels: None,
        get: |machine, index| if valid(index) { machine.ula().frame_counter } else { 0 },
        set: None,
    },
];

/// Memory not owned by the CPU's own region list.
pub static SYSTEM_REGIONS: [MemoryRegion<Spectrum48k>; 1] = [MemoryRegion {
    description: "Screen",
    base_address: SCREEN_START as u64,
    size: SCREEN_BYTES as u64,
    is_main: false,
    cpu_addressable: true,
    peek: |machine, index, address| match (valid(index), offset(address, SCREEN_BYTES)) {
        (true, Some(at)) => machine.memory().screen()[at],
        _ => 0,
    },
    poke: Some(|machine, index, address, value| {
        if let (true, Some(at)) = (valid(index), offset(address, SCREEN_BYTES)) {
            machine.memory_mut().set_ram_byte(at, value);
        }
    }),
    set_watch_point: None,
    remove_watch_point: None,
}];

/// Root descriptor.
pub static SYSTEM: System<Spectrum48k> = System {
    description: "ZX Spectrum 48K",
    cpus: &CPUS,
    registers: &SYSTEM_REGISTERS,
    memory_regions: &SYSTEM_REGIONS,
};

/// System-wide peek: `region` indexes [`SYSTEM_REGIONS`]; unknown regions read `0`.
pub fn system_peek(machine: &Spectrum48k, region: usize, address: u64) -> u8 {
    SYSTEM
        .memory_regions
        .get(region)
        .map_or(0, |region| (region.peek)(machine, 0, address))
}

/// System-wide poke: unknown or read-only regions ignore the write.
pub fn system_poke(machine: &mut Spectrum48k, region: usize, address: u64, value: u8) {
    if let Some(poke) = SYSTEM.memory_regions.get(region).and_then(|region| region.poke) {
        poke(machine, 0, address, value);
    }
}

/// System-wide register read: `register` indexes [`SYSTEM_REGISTERS`]; unknown registers read `0`.
pub fn system_get_register(machine: &Spectrum48k, register: usize) -> u64 {
    SYSTEM
        .registers
        .get(register)
        .map_or(0, |register| (register.get)(machine, 0))
}

/// System-wide register write: unknown or read-only registers ignore the write.
pub fn system_set_register(machine: &mut Spectrum48k, register: usize, value: u64) {
    if let Some(set) = SYSTEM.registers.get(register).and_then(|register| register.set) {
        set(machine, 0, value);
    }
}

#[cfg(test)]
mod tests {
    use super::{SYSTEM, Z80_REGISTERS};
    use crate::debug::descriptor::RegisterTag;
    use crate::state::Z80Register;

    #[test]
    fn register_table_follows_register_enum() {
        assert_eq!(Z80_REGISTERS.len(), Z80Register::ALL.len());
        assert_eq!(Z80_REGISTERS[Z80Register::Pc.index()].tag, Some(RegisterTag::ProgramCounter));
        assert_eq!(Z80_REGISTERS[Z80Register::Sp.index()].tag, Some(RegisterTag::StackPointer));
        assert!(Z80_REGISTERS[Z80Register::Wz.index()].set.is_none());
        assert_eq!(Z80_REGISTERS[Z80Register::F.index()].bit_labels.map(<[_]>::len), Some(8));
    }

    #[test]
    fn exactly_one_main_cpu_with_one_main_region() {
        assert_eq!(SYSTEM.cpus.iter().filter(|cpu| cpu.is_main).count(), 1);
        let cpu = SYSTEM.main_cpu().expect("main cpu");
        assert_eq!(cpu.memory_regions.iter().filter(|region| region.is_main).count(), 1);
        assert!(cpu.pause.is_some() && cpu.resume.is_some() && cpu.step.is_some());
    }
}
