//! ZX Spectrum 48K emulation core with a generic debugger introspection surface.
//!
//! [`Spectrum48k`] is the machine; [`debug`] describes it to debuggers through
//! static descriptor tables; [`pacing`] keeps frame-boundary effects exact no
//! matter how execution is split between host frames and debugger steps.

/// Machine configuration.
pub mod config;
pub use config::{JoystickType, MachineConfig};

/// Error types for construction and content loading.
pub mod error;
pub use error::{ConfigError, LoadError, MachineError, RomError};

/// ROM/RAM storage and the fixed 48K memory map.
pub mod memory;
pub use memory::{Memory, ADDRESS_SPACE_BYTES, RAM_SIZE, ROM_SIZE};

/// CPU register file and run state.
pub mod state;
pub use state::{PauseReason, RunState, Z80Register, Z80Registers};

/// Fixed Z80 tick-cost table.
pub mod timing;
pub use timing::{tick_cost, TickCostKind, TICK_COST_TABLE};

/// Opcode field decoding.
pub mod decoder;

/// Z80 CPU.
pub mod cpu;
pub use cpu::{Bus, Z80};

mod execute;

/// ULA, keyboard, joystick, and beeper.
pub mod peripherals;
pub use peripherals::{JoystickState, SpectrumKey, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Host callbacks.
pub mod frontend;
pub use frontend::{Frontend, LogLevel, NullFrontend};

/// Execution-pacing engine.
pub mod pacing;
pub use pacing::{execute_request, FramePacer, PacedTarget, RequestOutcome};

/// 48K snapshot format.
pub mod snapshot;
pub use snapshot::Snapshot;

/// The machine.
pub mod machine;
pub use machine::{Spectrum48k, WatchPoint};

/// Debugger descriptors, handshake, and breakpoint registry.
pub mod debug;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
