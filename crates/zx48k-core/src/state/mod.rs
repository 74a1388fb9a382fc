//! Z80 register file and debugger-visible run state.

/// Z80 register file and debugger register identifiers.
pub mod registers;
/// Pause/run state driven by the debugger.
pub mod run_state;

pub use registers::{Z80Register, Z80Registers, Z80_REGISTER_COUNT};
pub use run_state::{PauseReason, RunState};
