//! Construction, content loading, and reset.

mod support;

use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use support::{recorded_machine, rom, seventy_nop_config};
use thiserror as _;
use tracing as _;
use zx48k_core::snapshot::{SNA_48K_BYTES, SNA_HEADER_BYTES};
use zx48k_core::{
    ConfigError, LoadError, LogLevel, MachineConfig, MachineError, NullFrontend, PauseReason,
    RomError, RunState, Spectrum48k, SpectrumKey,
};

const ENTRY: u16 = 0x8000;
const STACK: u16 = 0x7FF0;

/// 48K snapshot resuming at [`ENTRY`] with `PC` on the stack at [`STACK`].
fn snapshot_image(border: u8, im: u8) -> Vec<u8> {
    let mut bytes = vec![0u8; SNA_48K_BYTES];
    bytes[0] = 0x3F;
    bytes[9..11].copy_from_slice(&0x1234u16.to_le_bytes());
    bytes[19] = 0x04;
    bytes[21..23].copy_from_slice(&0x4200u16.to_le_bytes());
    bytes[23..25].copy_from_slice(&STACK.to_le_bytes());
    bytes[25] = im;
    bytes[26] = border;
    let stack = SNA_HEADER_BYTES + usize::from(STACK - 0x4000);
    bytes[stack..stack + 2].copy_from_slice(&ENTRY.to_le_bytes());
    bytes[SNA_HEADER_BYTES + 0x1800] = 0x38;
    bytes
}

#[test]
fn rejects_wrong_rom_size() {
    let error = Spectrum48k::new(&[0; 0x3FFF], MachineConfig::default(), Box::new(NullFrontend)).err();
    assert_eq!(error, Some(MachineError::Rom(RomError::InvalidSize { actual: 0x3FFF })));
}

#[rstest]
#[case(MachineConfig { clock_hz: 0, ..MachineConfig::default() }, ConfigError::Zero("clock_hz"))]
#[case(MachineConfig { frame_us: 0, ..MachineConfig::default() }, ConfigError::Zero("frame_us"))]
#[case(
    MachineConfig { clock_hz: 10, frame_us: 10, ..MachineConfig::default() },
    ConfigError::QuantumOutOfRange(0)
)]
fn rejects_unusable_config(#[case] config: MachineConfig, #[case] expected: ConfigError) {
    let error = Spectrum48k::new(&rom(&[]), config, Box::new(NullFrontend)).err();
    assert_eq!(error, Some(MachineError::Config(expected)));
}

#[test]
fn load_applies_registers_ram_and_border() {
    let (mut machine, _) = recorded_machine(MachineConfig::default(), &[]);

    machine
        .load_content(Some(&snapshot_image(3, 1)))
        .expect("valid snapshot");

    let regs = &machine.cpu().regs;
    assert_eq!(regs.pc, ENTRY);
    assert_eq!(regs.sp, STACK + 2);
    assert_eq!(regs.a, 0x42);
    assert_eq!(regs.hl(), 0x1234);
    assert_eq!(regs.i, 0x3F);
    assert_eq!(regs.im, 1);
    assert!(regs.iff1 && regs.iff2);
    assert_eq!(machine.ula().border, 3);
    assert_eq!(machine.memory().read(0x5800), 0x38);
}

#[rstest]
#[case(vec![0; 100], LoadError::UnsupportedSize { size: 100, expected: SNA_48K_BYTES })]
#[case(snapshot_image(0, 3), LoadError::InvalidHeader { field: "interrupt mode", value: 3 })]
fn failed_load_keeps_machine_untouched(#[case] content: Vec<u8>, #[case] expected: LoadError) {
    let (mut machine, record) = recorded_machine(seventy_nop_config(), &[0x3C]);
    machine.run_frame();
    machine.execute(40);
    let before = machine.snapshot();
    let pacer = *machine.pacer();

    assert_eq!(machine.load_content(Some(&content)), Err(expected));

    assert_eq!(machine.snapshot(), before);
    assert_eq!(*machine.pacer(), pacer);
    assert_eq!(machine.run_state(), RunState::Running);
    assert!(record.borrow().logged(LogLevel::Error));

    machine.run_frame();
    assert_eq!(machine.pacer().boundaries_crossed(), 2);
}

#[test]
fn reset_reapplies_loaded_content() {
    let (mut machine, _) = recorded_machine(seventy_nop_config(), &[]);
    machine
        .load_content(Some(&snapshot_image(3, 1)))
        .expect("valid snapshot");
    let loaded = machine.snapshot();

    machine.run_frame();
    machine.execute(12);
    machine.memory_mut().set_ram_byte(0x1800, 0);
    machine.ula_mut().border = 6;
    machine.pause();

    machine.reset();

    assert_eq!(machine.snapshot(), loaded);
    assert_eq!(machine.ula().frame_counter, 0);
    assert_eq!(machine.pacer().boundaries_crossed(), 0);
    assert_eq!(
        machine.pacer().ticks_until_boundary(),
        i64::from(machine.pacer().quantum())
    );
    assert_eq!(machine.run_state(), RunState::Running);
}

#[test]
fn unloading_content_returns_to_rom_boot() {
    let (mut machine, _) = recorded_machine(MachineConfig::default(), &[]);
    machine
        .load_content(Some(&snapshot_image(3, 1)))
        .expect("valid snapshot");

    machine.load_content(None).expect("unload");

    assert_eq!(machine.cpu().regs.pc, 0);
    assert_eq!(machine.cpu().regs.sp, 0xFFFF);
    assert_eq!(machine.ula().border, 0);
    assert_eq!(machine.memory().read(0x5800), 0);

    machine.reset();
    assert_eq!(machine.cpu().regs.pc, 0);
}

#[test]
fn points_survive_reset() {
    let (mut machine, _) = recorded_machine(seventy_nop_config(), &[]);
    let break_point = machine.set_break_point(0x0010);
    let watch_point = machine.set_watch_point(0x4000, 0x1B00, false, true);

    machine.reset();

    assert_eq!(machine.break_points().get(break_point), Some(&0x0010));
    assert!(machine.watch_points().get(watch_point).is_some());
    machine.run_frame();
    assert_eq!(
        machine.run_state(),
        RunState::Paused(PauseReason::BreakPoint(break_point))
    );
}

#[test]
fn reset_forgets_held_key_edges() {
    let (mut machine, record) = recorded_machine(seventy_nop_config(), &[]);
    record.borrow_mut().held.push(SpectrumKey::Q);
    machine.run_frame();
    assert!(machine.keyboard().is_down(SpectrumKey::Q));

    machine.reset();
    assert!(!machine.keyboard().is_down(SpectrumKey::Q));

    machine.run_frame();
    assert!(machine.keyboard().is_down(SpectrumKey::Q));
}

#[test]
fn captured_state_reloads_into_a_fresh_machine() {
    let (mut source, _) = recorded_machine(seventy_nop_config(), &[]);
    source
        .load_content(Some(&snapshot_image(5, 1)))
        .expect("valid snapshot");
    source.execute(40);
    let image = source.snapshot().to_bytes();

    let (mut target, _) = recorded_machine(seventy_nop_config(), &[]);
    target.load_content(Some(&image)).expect("captured snapshot");

    assert_eq!(target.cpu().regs.pc, source.cpu().regs.pc);
    assert_eq!(target.cpu().regs.sp, source.cpu().regs.sp);
    assert_eq!(target.ula().border, 5);
    assert_eq!(target.memory().read(0x5800), 0x38);
}
