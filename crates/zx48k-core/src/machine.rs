//! The Spectrum 48K machine.
//!
//! [`Spectrum48k`] owns every piece of instance state (CPU, memory, ULA,
//! keyboard, beeper, video buffers, pacing counter, breakpoints and
//! watchpoints) and the host [`Frontend`]. The host calls
//! [`Spectrum48k::run_frame`] once per frame; a debugger instead drives the
//! same pacing engine in smaller requests through the step operations.

use tracing::{debug, error, info, warn};

use crate::config::{JoystickType, MachineConfig};
use crate::cpu::{Bus, Z80};
use crate::debug::handshake::InstanceHandle;
use crate::debug::registry::{HandleRegistry, NULL_HANDLE};
use crate::decoder::step_over_length;
use crate::error::{LoadError, MachineError, RomError};
use crate::frontend::{Frontend, LogLevel};
use crate::memory::{Memory, MemoryAccess, ROM_SIZE};
use crate::pacing::{execute_request, FramePacer, PacedTarget, RequestOutcome};
use crate::peripherals::keyboard::scan_host_keys;
use crate::peripherals::ula::INTERRUPT_TICKS;
use crate::peripherals::{
    Beeper, JoystickState, KeyEdges, Keyboard, Ula, VideoBuffers, DISPLAY_HEIGHT, DISPLAY_WIDTH,
    KEMPSTON_PORT,
};
use crate::snapshot::Snapshot;
use crate::state::{PauseReason, RunState};

/// An active watchpoint: a CPU address range and the access directions that trip it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchPoint {
    /// First watched address.
    pub start: u64,
    /// Number of watched bytes.
    pub length: u64,
    /// Trip on reads (opcode fetches included).
    pub read: bool,
    /// Trip on writes.
    pub write: bool,
}

impl WatchPoint {
    fn matches(&self, access: MemoryAccess) -> bool {
        access.matches(self.start, self.length, self.read, self.write)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopCondition {
    AtAddress(u16),
    StackAbove(u16),
}

/// CPU view of the machine for the duration of one instruction.
struct MachineBus<'a> {
    memory: &'a mut Memory,
    ula: &'a mut Ula,
    keyboard: &'a Keyboard,
    joystick: Option<JoystickState>,
    watch_points: &'a HandleRegistry<WatchPoint>,
    watch_hit: Option<u32>,
}

impl MachineBus<'_> {
    fn observe(&mut self, access: MemoryAccess) {
        if self.watch_hit.is_none() && !self.watch_points.is_empty() {
            self.watch_hit = self.watch_points.find(|point| point.matches(access));
        }
    }
}

impl Bus for MachineBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        self.observe(MemoryAccess::read(addr));
        self.memory.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.observe(MemoryAccess::write(addr));
        self.memory.write(addr, value);
    }

    fn io_read(&mut self, port: u16) -> u8 {
        if Ula::owns_port(port) {
            return self.ula.read_port(port, self.keyboard);
        }
        match self.joystick {
            Some(joystick) if port.to_le_bytes()[0] == KEMPSTON_PORT => joystick.kempston_bits(),
            _ => 0xFF,
        }
    }

    fn io_write(&mut self, port: u16, value: u8) {
        if Ula::owns_port(port) {
            self.ula.write_port(value);
        }
    }
}

/// One ZX Spectrum 48K instance.
pub struct Spectrum48k {
    config: MachineConfig,
    handle: InstanceHandle,
    cpu: Z80,
    memory: Memory,
    ula: Ula,
    keyboard: Keyboard,
    key_edges: KeyEdges,
    joystick: JoystickState,
    beeper: Beeper,
    video: VideoBuffers,
    pacer: FramePacer,
    run_state: RunState,
    stop: Option<StopCondition>,
    break_points: HandleRegistry<u16>,
    watch_points: HandleRegistry<WatchPoint>,
    content: Option<Snapshot>,
    debugger_attached: bool,
    frontend: Box<dyn Frontend>,
}

impl Spectrum48k {
    /// Builds a machine around a 16 KiB ROM image.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::Rom`] if `rom` is not [`ROM_SIZE`] bytes and
    /// [`MachineError::Config`] if `config` fails validation.
    pub fn new(
        rom: &[u8],
        config: MachineConfig,
        frontend: Box<dyn Frontend>,
    ) -> Result<Self, MachineError> {
        config.validate()?;
        if rom.len() != ROM_SIZE {
            return Err(RomError::InvalidSize { actual: rom.len() }.into());
        }
        let sticky_us = u64::from(config.keyboard_sticky_frames) * u64::from(config.frame_us);
        let handle = InstanceHandle::next();
        debug!(instance = handle.get(), quantum = config.frame_quantum(), "machine created");
        Ok(Self {
            handle,
            cpu: Z80::new(),
            memory: Memory::with_rom(rom),
            ula: Ula::default(),
            keyboard: Keyboard::new(sticky_us),
            key_edges: KeyEdges::default(),
            joystick: JoystickState::default(),
            beeper: Beeper::new(
                config.clock_hz,
                config.audio_sample_rate,
                config.audio_batch_frames,
            ),
            video: VideoBuffers::default(),
            pacer: FramePacer::new(config.frame_quantum()),
            run_state: RunState::Running,
            stop: None,
            break_points: HandleRegistry::new(config.max_break_points),
            watch_points: HandleRegistry::new(config.max_watch_points),
            content: None,
            debugger_attached: false,
            frontend,
            config,
        })
    }

    /// Configuration this machine was built with.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Process-unique identity of this instance.
    #[must_use]
    pub const fn handle(&self) -> InstanceHandle {
        self.handle
    }

    /// CPU state.
    #[must_use]
    pub const fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    /// Mutable CPU state.
    pub const fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    /// Memory.
    #[must_use]
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable memory.
    pub const fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// ULA latches.
    #[must_use]
    pub const fn ula(&self) -> &Ula {
        &self.ula
    }

    /// Mutable ULA latches.
    pub const fn ula_mut(&mut self) -> &mut Ula {
        &mut self.ula
    }

    /// Key matrix.
    #[must_use]
    pub const fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    /// Mutable key matrix, for injecting keys outside the host poll.
    pub const fn keyboard_mut(&mut self) -> &mut Keyboard {
        &mut self.keyboard
    }

    /// Pacing counter.
    #[must_use]
    pub const fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    /// Running or paused.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Visible frame, [`DISPLAY_WIDTH`] × [`DISPLAY_HEIGHT`] XRGB8888 pixels.
    #[must_use]
    pub fn video_frame(&self) -> &[u32] {
        self.video.front()
    }

    /// Whether a debugger completed the handshake with this instance.
    #[must_use]
    pub const fn debugger_attached(&self) -> bool {
        self.debugger_attached
    }

    pub(crate) fn host_log(&mut self, level: LogLevel, message: &str) {
        self.frontend.log(level, message);
    }

    pub(crate) fn attach_debugger(&mut self) {
        self.debugger_attached = true;
        debug!(instance = self.handle.get(), "debugger attached");
    }

    /// Host frame tick: polls input, advances one frame quantum unless paused,
    /// and delivers video and audio.
    pub fn run_frame(&mut self) {
        self.poll_input();
        if self.run_state.is_paused() {
            self.deliver_output();
            return;
        }
        let quantum = self.pacer.quantum();
        execute_request(self, quantum);
    }

    /// Runs one execution request of `requested` ticks through the pacing engine.
    ///
    /// Runs regardless of the pause state and stops early when a breakpoint or
    /// watchpoint trips.
    pub fn execute(&mut self, requested: u32) -> RequestOutcome {
        execute_request(self, requested)
    }

    fn poll_input(&mut self) {
        self.frontend.input_poll();
        let frontend = &self.frontend;
        let current = scan_host_keys(|key| frontend.key_pressed(key));
        for (key, down) in self.key_edges.update(current).events() {
            if down {
                self.keyboard.key_down(key);
            } else {
                self.keyboard.key_up(key);
            }
        }
        if self.config.joystick == JoystickType::Kempston {
            self.joystick = self.frontend.joystick();
        }
    }

    fn step_cpu(&mut self) -> (u32, Option<u32>) {
        let joystick = (self.config.joystick == JoystickType::Kempston).then_some(self.joystick);
        let mut bus = MachineBus {
            memory: &mut self.memory,
            ula: &mut self.ula,
            keyboard: &self.keyboard,
            joystick,
            watch_points: &self.watch_points,
            watch_hit: None,
        };
        let ticks = self.cpu.step_instruction(&mut bus);
        let watch_hit = bus.watch_hit;
        self.beeper.advance(ticks, self.ula.ear);
        (ticks, watch_hit)
    }

    fn break_point_at(&self, pc: u16) -> Option<u32> {
        if self.break_points.is_empty() || self.cpu.halted {
            return None;
        }
        self.break_points.find(|&addr| addr == pc)
    }

    const fn stop_reached(&self) -> bool {
        match self.stop {
            Some(StopCondition::AtAddress(addr)) => self.cpu.regs.pc == addr,
            Some(StopCondition::StackAbove(entry)) => {
                let rise = self.cpu.regs.sp.wrapping_sub(entry);
                rise != 0 && rise < 0x8000
            }
            None => false,
        }
    }

    fn trap(&mut self, reason: PauseReason) {
        debug!(
            instance = self.handle.get(),
            pc = self.cpu.regs.pc,
            ?reason,
            "execution trapped"
        );
        self.run_state = RunState::Paused(reason);
    }

    fn settle_paused(&mut self) {
        if !self.run_state.is_paused() {
            self.run_state = RunState::Paused(PauseReason::Requested);
        }
    }

    /// Requests a pause; honoured at the next [`Spectrum48k::run_frame`].
    pub fn pause(&mut self) {
        if !self.run_state.is_paused() {
            debug!(instance = self.handle.get(), "pause requested");
            self.run_state = RunState::Paused(PauseReason::Requested);
        }
    }

    /// Lets [`Spectrum48k::run_frame`] advance again.
    pub fn resume(&mut self) {
        if self.run_state.is_paused() {
            debug!(instance = self.handle.get(), "resumed");
        }
        self.run_state = RunState::Running;
    }

    /// Executes exactly one instruction as a 1-tick execution request; the machine
    /// is left paused.
    pub fn step(&mut self) -> RequestOutcome {
        let outcome = execute_request(self, 1);
        self.settle_paused();
        debug!(instance = self.handle.get(), pc = self.cpu.regs.pc, ticks = outcome.executed, "step");
        outcome
    }

    /// Steps over `CALL`, `RST`, and repeating block instructions; steps once otherwise.
    ///
    /// Runs at most one frame quantum, stopping early at breakpoints and watchpoints.
    pub fn step_over(&mut self) -> RequestOutcome {
        let pc = self.cpu.regs.pc;
        let opcode = self.memory.read(pc);
        let next = self.memory.read(pc.wrapping_add(1));
        match step_over_length(opcode, next) {
            Some(length) if !self.cpu.halted => {
                self.run_until(StopCondition::AtAddress(pc.wrapping_add(length)))
            }
            _ => self.step(),
        }
    }

    /// Runs until the current subroutine returns (`SP` rises above its value on entry,
    /// modulo the 64 KiB stack wrap).
    ///
    /// Runs at most one frame quantum, stopping early at breakpoints and watchpoints.
    pub fn step_out(&mut self) -> RequestOutcome {
        let sp = self.cpu.regs.sp;
        self.run_until(StopCondition::StackAbove(sp))
    }

    fn run_until(&mut self, condition: StopCondition) -> RequestOutcome {
        self.stop = Some(condition);
        let quantum = self.pacer.quantum();
        let outcome = execute_request(self, quantum);
        self.stop = None;
        self.settle_paused();
        debug!(
            instance = self.handle.get(),
            ?condition,
            pc = self.cpu.regs.pc,
            ticks = outcome.executed,
            "run until"
        );
        outcome
    }

    /// Allocates a breakpoint at `addr`; returns `0` when the registry is full.
    pub fn set_break_point(&mut self, addr: u16) -> u32 {
        let handle = self.break_points.allocate(addr);
        if handle == NULL_HANDLE {
            warn!(
                instance = self.handle.get(),
                addr,
                capacity = self.break_points.capacity(),
                "break point registry full"
            );
        } else {
            debug!(instance = self.handle.get(), addr, handle, "set break point");
        }
        handle
    }

    /// Releases a breakpoint; returns whether `handle` was active.
    pub fn remove_break_point(&mut self, handle: u32) -> bool {
        self.break_points.remove(handle).is_some()
    }

    /// Active breakpoints.
    #[must_use]
    pub const fn break_points(&self) -> &HandleRegistry<u16> {
        &self.break_points
    }

    /// Allocates a watchpoint; returns `0` when the registry is full or the range is
    /// empty or watches neither direction.
    pub fn set_watch_point(&mut self, start: u64, length: u64, read: bool, write: bool) -> u32 {
        if length == 0 || !(read || write) {
            return 0;
        }
        let handle = self.watch_points.allocate(WatchPoint {
            start,
            length,
            read,
            write,
        });
        if handle == NULL_HANDLE {
            warn!(
                instance = self.handle.get(),
                start,
                capacity = self.watch_points.capacity(),
                "watch point registry full"
            );
        } else {
            debug!(
                instance = self.handle.get(),
                start, length, read, write, handle, "set watch point"
            );
        }
        handle
    }

    /// Releases a watchpoint; returns whether `handle` was active.
    pub fn remove_watch_point(&mut self, handle: u32) -> bool {
        self.watch_points.remove(handle).is_some()
    }

    /// Active watchpoints.
    #[must_use]
    pub const fn watch_points(&self) -> &HandleRegistry<WatchPoint> {
        &self.watch_points
    }

    /// Loads a 48K snapshot, or with `None` forgets loaded content and resets.
    ///
    /// Decoding completes before any state changes; on failure the machine keeps
    /// running exactly as before and the error is sent to the host log.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] that rejected the content.
    pub fn load_content(&mut self, content: Option<&[u8]>) -> Result<(), LoadError> {
        let Some(bytes) = content else {
            self.content = None;
            self.reset();
            return Ok(());
        };
        match Snapshot::decode(bytes) {
            Ok(snapshot) => {
                self.content = Some(snapshot);
                self.reset();
                info!(instance = self.handle.get(), pc = self.cpu.regs.pc, "content loaded");
                Ok(())
            }
            Err(err) => {
                error!(instance = self.handle.get(), %err, "content load failed");
                self.frontend
                    .log(LogLevel::Error, &format!("content load failed: {err}"));
                Err(err)
            }
        }
    }

    /// Power-on reset, then re-applies loaded content. Breakpoints and watchpoints survive.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.memory.clear_ram();
        self.ula = Ula::default();
        self.keyboard.reset();
        self.key_edges.reset();
        self.joystick = JoystickState::default();
        self.beeper.reset();
        self.video.clear();
        self.pacer.reset();
        self.run_state = RunState::Running;
        self.stop = None;
        if let Some(snapshot) = &self.content {
            snapshot.apply(&mut self.cpu, &mut self.memory, &mut self.ula);
        }
        debug!(instance = self.handle.get(), "reset");
    }

    /// Captures the current state as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.cpu, &self.memory, &self.ula)
    }
}

impl PacedTarget for Spectrum48k {
    fn pacer(&mut self) -> &mut FramePacer {
        &mut self.pacer
    }

    fn advance(&mut self, requested: u32) -> u32 {
        let mut executed: u32 = 0;
        let mut first = true;
        while executed < requested {
            // The first instruction is never trapped so a paused machine can step off a breakpoint.
            if !first {
                if let Some(handle) = self.break_point_at(self.cpu.regs.pc) {
                    self.trap(PauseReason::BreakPoint(handle));
                    break;
                }
            }
            first = false;
            let (ticks, watch_hit) = self.step_cpu();
            executed = executed.saturating_add(ticks);
            if let Some(handle) = watch_hit {
                self.trap(PauseReason::WatchPoint(handle));
                break;
            }
            if self.stop_reached() {
                break;
            }
        }
        executed
    }

    fn frame_boundary(&mut self) {
        self.ula.render(self.memory.screen(), self.video.back_mut());
        self.video.swap();
        self.ula.end_frame();
        self.keyboard.advance(u64::from(self.config.frame_us));
        self.cpu.assert_interrupt(INTERRUPT_TICKS);
    }

    fn deliver_output(&mut self) {
        let pitch = DISPLAY_WIDTH * size_of::<u32>();
        self.frontend
            .video_refresh(self.video.front(), DISPLAY_WIDTH, DISPLAY_HEIGHT, pitch);
        let frontend = &mut self.frontend;
        self.beeper
            .drain_batches(|batch| frontend.audio_sample_batch(batch));
    }
}
