#![no_main]

use libfuzzer_sys::fuzz_target;
use zx48k_core::debug::zx48k::SYSTEM;
use zx48k_core::{MachineConfig, NullFrontend, Spectrum48k, ROM_SIZE};

fuzz_target!(|data: &[u8]| {
    let mut rom = vec![0u8; ROM_SIZE];
    let program = data.len().min(ROM_SIZE);
    rom[..program].copy_from_slice(&data[..program]);

    let config = MachineConfig {
        clock_hz: 350_000,
        ..MachineConfig::default()
    };
    let Ok(mut machine) = Spectrum48k::new(&rom, config, Box::new(NullFrontend)) else {
        return;
    };
    let _ = machine.load_content(Some(data));

    if let Some(&first) = data.first() {
        machine.set_break_point(u16::from(first) << 8);
        machine.set_watch_point(u64::from(first) << 8, 16, true, true);
    }
    for _ in 0..2 {
        machine.run_frame();
        machine.step_over();
        machine.step();
    }

    for cpu in SYSTEM.cpus {
        for register in cpu.registers {
            assert!((register.get)(&machine, 0) <= register.width.mask());
        }
        for region in cpu.memory_regions {
            assert_eq!((region.peek)(&machine, 0, region.size), 0);
        }
    }
});
