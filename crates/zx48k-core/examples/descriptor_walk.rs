//! Prints every register and memory region a debugger sees on a freshly booted machine.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;
use zx48k_core::debug::{set_debugger, DebuggerIf, MemoryRegion, Register, DEBUGGER_IF_VERSION};
use zx48k_core::{MachineConfig, NullFrontend, Spectrum48k, ROM_SIZE};

fn print_registers(machine: &Spectrum48k, registers: &[Register<Spectrum48k>]) {
    for register in registers {
        let value = (register.get)(machine, 0);
        let digits = register.width.bytes() * 2;
        let access = if register.set.is_some() { "rw" } else { "ro" };
        print!("  {:<6} {access} {value:0digits$X}", register.name);
        if let Some(tag) = register.tag {
            print!("  {tag:?}");
        }
        if let Some(labels) = register.bit_labels {
            print!("  [{}]", labels.join(" "));
        }
        println!();
    }
}

fn print_regions(machine: &Spectrum48k, regions: &[MemoryRegion<Spectrum48k>]) {
    for region in regions {
        let head: Vec<String> = (0..8)
            .map(|offset| format!("{:02X}", (region.peek)(machine, 0, offset)))
            .collect();
        println!(
            "  {:<6} {:#06X}+{:#07X}  {}",
            region.description,
            region.base_address,
            region.size,
            head.join(" ")
        );
    }
}

fn main() {
    // LD SP,0x8000 ; LD A,0x07 ; OUT (0xFE),A
    let mut rom = vec![0u8; ROM_SIZE];
    rom[..7].copy_from_slice(&[0x31, 0x00, 0x80, 0x3E, 0x07, 0xD3, 0xFE]);
    let Ok(mut machine) = Spectrum48k::new(&rom, MachineConfig::default(), Box::new(NullFrontend))
    else {
        eprintln!("machine construction failed");
        return;
    };

    let mut record = DebuggerIf::new(DEBUGGER_IF_VERSION);
    let Some(handle) = set_debugger(&mut machine, &mut record) else {
        eprintln!("debugger handshake refused");
        return;
    };
    let Some(system) = record.system else {
        return;
    };
    machine.run_frame();

    println!("{} (instance {})", system.description, handle.get());
    print_registers(&machine, system.registers);
    print_regions(&machine, system.memory_regions);
    for cpu in system.cpus {
        let main = if cpu.is_main { " [main]" } else { "" };
        println!("{} {:?}{main}", cpu.description, cpu.cpu_type);
        print_registers(&machine, cpu.registers);
        print_regions(&machine, cpu.memory_regions);
    }
}
