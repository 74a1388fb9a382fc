//! Self-describing debugger surface: systems, CPUs, registers, memory regions.
//!
//! Descriptors are immutable metadata plus plain function pointers, shared by
//! every instance of a component. Accessors receive the owning state `M` and an
//! instance index selecting which physical component of that kind is meant.
//! Optional capabilities are `None` slots; callers check before invoking.

use core::fmt;

/// Value width of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterWidth {
    /// 8 bits.
    Byte,
    /// 16 bits.
    Word,
    /// 32 bits.
    DoubleWord,
    /// 64 bits.
    QuadWord,
}

impl RegisterWidth {
    /// Width in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::DoubleWord => 4,
            Self::QuadWord => 8,
        }
    }

    /// Mask of the bits a value of this width can hold.
    #[must_use]
    pub const fn mask(self) -> u64 {
        match self {
            Self::Byte => 0xFF,
            Self::Word => 0xFFFF,
            Self::DoubleWord => 0xFFFF_FFFF,
            Self::QuadWord => u64::MAX,
        }
    }
}

/// Semantic role a generic debugger UI may attach to a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterTag {
    /// Program counter.
    ProgramCounter,
    /// Stack pointer.
    StackPointer,
    /// Register that usually holds a memory address.
    MemoryPointer,
}

/// Reads a register of instance `index`.
pub type RegisterGet<M> = fn(&M, usize) -> u64;
/// Writes a register of instance `index`.
pub type RegisterSet<M> = fn(&mut M, usize, u64);
/// Reads one byte at a region-relative address.
pub type MemoryPeek<M> = fn(&M, usize, u64) -> u8;
/// Writes one byte at a region-relative address.
pub type MemoryPoke<M> = fn(&mut M, usize, u64, u8);
/// Allocates a watchpoint over `address..address + length` for reads and/or writes.
pub type SetWatchPoint<M> = fn(&mut M, usize, u64, u64, bool, bool) -> u32;
/// Allocates a breakpoint at an address.
pub type SetBreakPoint<M> = fn(&mut M, usize, u64) -> u32;
/// Releases a breakpoint or watchpoint handle.
pub type RemovePoint<M> = fn(&mut M, usize, u32);
/// Execution control on one CPU instance.
pub type CpuControl<M> = fn(&mut M, usize);

/// One named register of a CPU or system.
pub struct Register<M: 'static> {
    /// Display name.
    pub name: &'static str,
    /// Value width.
    pub width: RegisterWidth,
    /// Optional semantic role.
    pub tag: Option<RegisterTag>,
    /// Names of the individual bits, most significant first.
    pub bit_labels: Option<&'static [&'static str]>,
    /// Side-effect-free read, zero-extended to 64 bits.
    pub get: RegisterGet<M>,
    /// Write; `None` for registers the debugger cannot change.
    pub set: Option<RegisterSet<M>>,
}

/// One addressable byte range.
pub struct MemoryRegion<M: 'static> {
    /// Display name.
    pub description: &'static str,
    /// Address of region offset 0 in the CPU's address space.
    pub base_address: u64,
    /// Size in bytes; valid offsets are `0..size`.
    pub size: u64,
    /// Default region for disassembly and hex dumps.
    pub is_main: bool,
    /// Whether the CPU can address this region directly.
    pub cpu_addressable: bool,
    /// Read; returns `0` for offsets outside the region.
    pub peek: MemoryPeek<M>,
    /// Write; `None` for read-only regions.
    pub poke: Option<MemoryPoke<M>>,
    /// Watchpoint allocation; `None` when unsupported.
    pub set_watch_point: Option<SetWatchPoint<M>>,
    /// Watchpoint release; present whenever `set_watch_point` is.
    pub remove_watch_point: Option<RemovePoint<M>>,
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CpuType {
    /// Zilog Z80.
    Z80,
}

/// One executable unit.
pub struct Cpu<M: 'static> {
    /// Architecture.
    pub cpu_type: CpuType,
    /// Display name.
    pub description: &'static str,
    /// The CPU a generic debugger attaches to by default.
    pub is_main: bool,
    /// Registers in display order.
    pub registers: &'static [Register<M>],
    /// Memory regions in display order.
    pub memory_regions: &'static [MemoryRegion<M>],
    /// Stops execution at the next re-entry into the pacing engine.
    pub pause: Option<CpuControl<M>>,
    /// Lets execution continue.
    pub resume: Option<CpuControl<M>>,
    /// Executes exactly one instruction.
    pub step: Option<CpuControl<M>>,
    /// Steps over a subroutine call.
    pub step_over: Option<CpuControl<M>>,
    /// Runs until the current subroutine returns.
    pub step_out: Option<CpuControl<M>>,
    /// Breakpoint allocation; `None` when unsupported.
    pub set_break_point: Option<SetBreakPoint<M>>,
    /// Breakpoint release.
    pub remove_break_point: Option<RemovePoint<M>>,
}

/// Root descriptor of one emulated machine.
pub struct System<M: 'static> {
    /// Display name.
    pub description: &'static str,
    /// CPUs; exactly one is flagged main.
    pub cpus: &'static [Cpu<M>],
    /// State shared by all CPUs (bus latches and the like).
    pub registers: &'static [Register<M>],
    /// Memory not owned by a single CPU.
    pub memory_regions: &'static [MemoryRegion<M>],
}

impl<M> System<M> {
    /// The CPU flagged main.
    #[must_use]
    pub fn main_cpu(&self) -> Option<&Cpu<M>> {
        self.cpus.iter().find(|cpu| cpu.is_main)
    }
}

impl<M> Cpu<M> {
    /// The memory region flagged main.
    #[must_use]
    pub fn main_region(&self) -> Option<&MemoryRegion<M>> {
        self.memory_regions.iter().find(|region| region.is_main)
    }

    /// Register with the given tag.
    #[must_use]
    pub fn tagged_register(&self, tag: RegisterTag) -> Option<&Register<M>> {
        self.registers.iter().find(|register| register.tag == Some(tag))
    }

    /// Register by name.
    #[must_use]
    pub fn register(&self, name: &str) -> Option<&Register<M>> {
        self.registers.iter().find(|register| register.name == name)
    }

    /// Calls `set_break_point` if present; `0` when the CPU does not support breakpoints.
    pub fn request_break_point(&self, state: &mut M, index: usize, address: u64) -> u32 {
        self.set_break_point
            .map_or(0, |set_break_point| set_break_point(state, index, address))
    }
}

impl<M> MemoryRegion<M> {
    /// Calls `set_watch_point` if present; `0` when the region does not support watchpoints.
    pub fn request_watch_point(
        &self,
        state: &mut M,
        index: usize,
        address: u64,
        length: u64,
        read: bool,
        write: bool,
    ) -> u32 {
        self.set_watch_point.map_or(0, |set_watch_point| {
            set_watch_point(state, index, address, length, read, write)
        })
    }
}

impl<M> fmt::Debug for Register<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Register")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("tag", &self.tag)
            .field("bit_labels", &self.bit_labels)
            .field("writable", &self.set.is_some())
            .finish()
    }
}

impl<M> fmt::Debug for MemoryRegion<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("description", &self.description)
            .field("base_address", &self.base_address)
            .field("size", &self.size)
            .field("is_main", &self.is_main)
            .field("writable", &self.poke.is_some())
            .field("watch_points", &self.set_watch_point.is_some())
            .finish()
    }
}

impl<M> fmt::Debug for Cpu<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("cpu_type", &self.cpu_type)
            .field("description", &self.description)
            .field("is_main", &self.is_main)
            .field("registers", &self.registers)
            .field("memory_regions", &self.memory_regions)
            .field("break_points", &self.set_break_point.is_some())
            .finish_non_exhaustive()
    }
}

impl<M> fmt::Debug for System<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("System")
            .field("description", &self.description)
            .field("cpus", &self.cpus)
            .field("registers", &self.registers)
            .field("memory_regions", &self.memory_regions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Cpu, CpuType, MemoryRegion, Register, RegisterTag, RegisterWidth, System};

    struct Latches {
        values: [u8; 2],
    }

    static LATCH_REGISTERS: [Register<Latches>; 1] = [Register {
        name: "LATCH",
        width: RegisterWidth::Byte,
        tag: Some(RegisterTag::MemoryPointer),
        bit_labels: None,
        get: |state, index| state.values.get(index).copied().map_or(0, u64::from),
        set: None,
    }];

    static LATCH_REGIONS: [MemoryRegion<Latches>; 1] = [MemoryRegion {
        description: "Latches",
        base_address: 0,
        size: 2,
        is_main: true,
        cpu_addressable: false,
        peek: |state, _, address| {
            usize::try_from(address)
                .ok()
                .and_then(|offset| state.values.get(offset).copied())
                .unwrap_or(0)
        },
        poke: None,
        set_watch_point: None,
        remove_watch_point: None,
    }];

    static LATCH_CPUS: [Cpu<Latches>; 1] = [Cpu {
        cpu_type: CpuType::Z80,
        description: "Latch CPU",
        is_main: true,
        registers: &LATCH_REGISTERS,
        memory_regions: &LATCH_REGIONS,
        pause: None,
        resume: None,
        step: None,
        step_over: None,
        step_out: None,
        set_break_point: None,
        remove_break_point: None,
    }];

    static LATCH_SYSTEM: System<Latches> = System {
        description: "Latches",
        cpus: &LATCH_CPUS,
        registers: &[],
        memory_regions: &[],
    };

    #[test]
    fn lookups_walk_static_tables() {
        let state = Latches { values: [7, 9] };
        let cpu = LATCH_SYSTEM.main_cpu().expect("main cpu");
        let register = cpu
            .tagged_register(RegisterTag::MemoryPointer)
            .expect("tagged register");
        assert_eq!((register.get)(&state, 1), 9);
        assert_eq!((register.get)(&state, 5), 0);
        let region = cpu.main_region().expect("main region");
        assert_eq!((region.peek)(&state, 0, 0), 7);
        assert_eq!((region.peek)(&state, 0, region.size), 0);
        assert!(cpu.register("NOPE").is_none());
    }

    #[test]
    fn missing_capabilities_request_null_handles() {
        let mut state = Latches { values: [0, 0] };
        assert_eq!(LATCH_CPUS[0].request_break_point(&mut state, 0, 0), 0);
        assert_eq!(LATCH_REGIONS[0].request_watch_point(&mut state, 0, 0, 1, true, true), 0);
    }

    #[test]
    fn widths_report_bytes_and_masks() {
        assert_eq!(RegisterWidth::Word.bytes(), 2);
        assert_eq!(RegisterWidth::Byte.mask(), 0xFF);
        assert_eq!(RegisterWidth::QuadWord.mask(), u64::MAX);
    }

    #[test]
    fn debug_output_names_capabilities() {
        let rendered = format!("{LATCH_SYSTEM:?}");
        assert!(rendered.contains("LATCH"));
        assert!(rendered.contains("writable: false"));
    }
}
