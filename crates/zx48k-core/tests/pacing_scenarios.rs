//! Frame pacing: boundary effects follow cumulative ticks, not request shape.

mod support;

use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use support::{recorded_machine, seventy_nop_config};
use thiserror as _;
use tracing as _;
use zx48k_core::peripherals::ula::palette;
use zx48k_core::{MachineConfig, PauseReason, RunState, DISPLAY_HEIGHT, DISPLAY_WIDTH};

const NOP_TICKS: u32 = 4;
const QUANTUM: u32 = 280;

#[test]
fn full_quantum_in_one_request_crosses_one_boundary() {
    let (mut machine, record) = recorded_machine(seventy_nop_config(), &[]);
    assert_eq!(machine.pacer().quantum(), QUANTUM);
    machine.ula_mut().border = 2;

    machine.run_frame();

    let record = record.borrow();
    assert_eq!(record.video_frames, 1);
    assert_eq!(record.first_pixel, palette(2, false));
    assert_eq!(
        record.last_video,
        Some((DISPLAY_WIDTH, DISPLAY_HEIGHT, DISPLAY_WIDTH * 4))
    );
    assert_eq!(machine.pacer().boundaries_crossed(), 1);
    assert_eq!(machine.ula().frame_counter, 1);
    assert_eq!(machine.keyboard().clock_us(), 20_000);
    assert_eq!(machine.cpu().regs.pc, 70);
}

#[test]
fn seventy_single_steps_match_one_full_request() {
    let (mut whole, _) = recorded_machine(seventy_nop_config(), &[]);
    whole.ula_mut().border = 2;
    whole.run_frame();

    let (mut stepped, record) = recorded_machine(seventy_nop_config(), &[]);
    stepped.ula_mut().border = 2;
    for _ in 0..69 {
        let outcome = stepped.step();
        assert_eq!(outcome.executed, NOP_TICKS);
        assert!(!outcome.boundary_crossed);
    }
    assert_eq!(stepped.pacer().boundaries_crossed(), 0);
    assert_eq!(record.borrow().first_pixel, 0);

    assert!(stepped.step().boundary_crossed);

    assert_eq!(stepped.cpu().regs, whole.cpu().regs);
    assert_eq!(stepped.cpu().interrupt_pending(), whole.cpu().interrupt_pending());
    assert_eq!(stepped.snapshot(), whole.snapshot());
    assert_eq!(stepped.pacer().boundaries_crossed(), 1);
    assert_eq!(stepped.ula().frame_counter, 1);
    assert_eq!(stepped.keyboard().clock_us(), whole.keyboard().clock_us());
    assert_eq!(stepped.video_frame(), whole.video_frame());
    let record = record.borrow();
    assert_eq!(record.video_frames, 70);
    assert_eq!(record.first_pixel, palette(2, false));
}

#[rstest]
#[case(4)]
#[case(100)]
#[case(276)]
fn every_request_delivers_video(#[case] requested: u32) {
    let (mut machine, record) = recorded_machine(seventy_nop_config(), &[]);
    let outcome = machine.execute(requested);
    assert_eq!(outcome.executed, requested);
    assert!(!outcome.boundary_crossed);
    assert_eq!(record.borrow().video_frames, 1);
    assert_eq!(machine.pacer().ticks_until_boundary(), i64::from(QUANTUM - requested));
}

#[test]
fn paused_frame_delivers_output_without_ticks() {
    let (mut machine, record) = recorded_machine(seventy_nop_config(), &[]);
    machine.pause();
    machine.run_frame();
    machine.run_frame();

    assert_eq!(record.borrow().video_frames, 2);
    assert_eq!(record.borrow().polls, 2);
    assert_eq!(machine.cpu().regs.pc, 0);
    assert_eq!(machine.pacer().ticks_until_boundary(), i64::from(QUANTUM));
    assert_eq!(machine.run_state(), RunState::Paused(PauseReason::Requested));
}

#[test]
fn boundary_asserts_the_frame_interrupt() {
    // IM 1 ; EI ; then NOPs until the frame interrupt lands at 0x0038.
    let (mut machine, _) = recorded_machine(seventy_nop_config(), &[0xED, 0x56, 0xFB]);
    machine.run_frame();
    assert!(machine.cpu().interrupt_pending());
    machine.execute(NOP_TICKS);
    assert!(!machine.cpu().regs.iff1);
    assert_eq!(machine.cpu().regs.pc, 0x0038);
    assert_eq!(machine.cpu().regs.sp, 0xFFFD);
}

#[test]
fn default_frame_fills_audio_batches() {
    let (mut machine, record) = recorded_machine(MachineConfig::default(), &[]);
    machine.run_frame();
    let record = record.borrow();
    // 70 000 ticks at 44.1 kHz: 882 stereo frames, six full 128-frame batches.
    assert_eq!(record.audio_batches, 6);
    assert_eq!(record.audio_samples, 6 * 128 * 2);
}

fn nop_runs() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..=40, 1..48)
}

proptest! {
    #[test]
    fn boundaries_follow_cumulative_ticks(runs in nop_runs()) {
        let (mut split, _) = recorded_machine(seventy_nop_config(), &[]);
        let mut total: u32 = 0;
        for nops in &runs {
            let requested = nops * NOP_TICKS;
            let outcome = split.execute(requested);
            prop_assert_eq!(outcome.executed, requested);
            total += requested;
        }

        prop_assert_eq!(split.pacer().boundaries_crossed(), u64::from(total / QUANTUM));
        prop_assert_eq!(
            split.pacer().ticks_until_boundary(),
            i64::from(QUANTUM - total % QUANTUM)
        );

        let (mut framed, _) = recorded_machine(seventy_nop_config(), &[]);
        for _ in 0..total / QUANTUM {
            framed.run_frame();
        }
        if total % QUANTUM != 0 {
            framed.execute(total % QUANTUM);
        }
        prop_assert_eq!(&split.cpu().regs, &framed.cpu().regs);
        prop_assert_eq!(split.ula().frame_counter, framed.ula().frame_counter);
        prop_assert_eq!(split.keyboard().clock_us(), framed.keyboard().clock_us());
    }
}
