//! Serializable view of any machine, built by walking its descriptor tables.

use serde::Serialize;
use zx48k_core::debug::{Cpu, MemoryRegion, Register, RegisterTag, System};

/// Largest memory window a dump will copy.
pub const MAX_WINDOW: u64 = 0x1000;

/// Byte range of the main region to include in a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryWindow {
    pub start: u64,
    pub length: u64,
}

#[derive(Debug, Serialize)]
pub struct RegisterDump {
    pub name: &'static str,
    pub value: u64,
    pub width_bytes: usize,
    pub writable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RegionDump {
    pub description: &'static str,
    pub base_address: u64,
    pub size: u64,
    pub is_main: bool,
    pub watchable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct CpuDump {
    pub description: &'static str,
    pub cpu_type: String,
    pub is_main: bool,
    pub registers: Vec<RegisterDump>,
    pub regions: Vec<RegionDump>,
}

#[derive(Debug, Serialize)]
pub struct SystemDump {
    pub description: &'static str,
    pub registers: Vec<RegisterDump>,
    pub regions: Vec<RegionDump>,
    pub cpus: Vec<CpuDump>,
}

const fn tag_name(tag: RegisterTag) -> &'static str {
    match tag {
        RegisterTag::ProgramCounter => "pc",
        RegisterTag::StackPointer => "sp",
        RegisterTag::MemoryPointer => "memory_pointer",
    }
}

fn registers<M>(registers: &[Register<M>], state: &M) -> Vec<RegisterDump> {
    registers
        .iter()
        .map(|register| RegisterDump {
            name: register.name,
            value: (register.get)(state, 0),
            width_bytes: register.width.bytes(),
            writable: register.set.is_some(),
            tag: register.tag.map(tag_name),
        })
        .collect()
}

fn regions<M>(
    regions: &[MemoryRegion<M>],
    state: &M,
    window: Option<MemoryWindow>,
) -> Vec<RegionDump> {
    regions
        .iter()
        .map(|region| {
            let window = window.filter(|_| region.is_main);
            let bytes = window.map_or_else(Vec::new, |window| {
                let end = window
                    .start
                    .saturating_add(window.length.min(MAX_WINDOW))
                    .min(region.size);
                (window.start..end)
                    .map(|address| (region.peek)(state, 0, address))
                    .collect()
            });
            RegionDump {
                description: region.description,
                base_address: region.base_address,
                size: region.size,
                is_main: region.is_main,
                watchable: region.set_watch_point.is_some(),
                window_start: window.map(|window| window.start),
                bytes,
            }
        })
        .collect()
}

fn cpu<M>(cpu: &Cpu<M>, state: &M, window: Option<MemoryWindow>) -> CpuDump {
    CpuDump {
        description: cpu.description,
        cpu_type: format!("{:?}", cpu.cpu_type),
        is_main: cpu.is_main,
        registers: registers(cpu.registers, state),
        regions: regions(cpu.memory_regions, state, window.filter(|_| cpu.is_main)),
    }
}

/// Reads every register and the requested window through the descriptor accessors.
///
/// Only the instance at index `0` is dumped.
pub fn describe<M>(system: &System<M>, state: &M, window: Option<MemoryWindow>) -> SystemDump {
    SystemDump {
        description: system.description,
        registers: registers(system.registers, state),
        regions: regions(system.memory_regions, state, None),
        cpus: system
            .cpus
            .iter()
            .map(|entry| cpu(entry, state, window))
            .collect(),
    }
}
