//! Debugger introspection surface.

pub mod descriptor;
pub mod handshake;
pub mod registry;
pub mod zx48k;

pub use descriptor::{Cpu, CpuType, MemoryRegion, Register, RegisterTag, RegisterWidth, System};
pub use handshake::{
    get_proc_address, set_debugger, DebuggerIf, InstanceHandle, SetDebuggerFn,
    DEBUGGER_IF_VERSION, SET_DEBUGGER_SYMBOL,
};
pub use registry::{HandleRegistry, NULL_HANDLE};
