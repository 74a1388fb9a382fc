//! Debugger binding handshake.
//!
//! A host resolves [`SET_DEBUGGER_SYMBOL`] through [`get_proc_address`] and calls
//! the returned entry point with a [`DebuggerIf`] record whose `version` it has
//! set. On a supported version the core fills in the System Descriptor and the
//! system-wide accessors and returns the instance handle; otherwise every output
//! slot stays empty and emulation carries on without debugger support.

use core::fmt;
use core::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::descriptor::System;
use super::zx48k;
use crate::frontend::LogLevel;
use crate::machine::Spectrum48k;

/// Negotiation record version this core understands.
pub const DEBUGGER_IF_VERSION: u32 = 1;

/// Symbol name of the handshake entry point.
pub const SET_DEBUGGER_SYMBOL: &str = "hc_set_debugger";

/// Opaque, non-zero identity of one machine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceHandle(NonZeroU64);

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

impl InstanceHandle {
    pub(crate) fn next() -> Self {
        let id = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }

    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

/// Reads a byte of system-wide region `region` at a region-relative address.
pub type SystemPeek = fn(&Spectrum48k, usize, u64) -> u8;
/// Writes a byte of system-wide region `region`.
pub type SystemPoke = fn(&mut Spectrum48k, usize, u64, u8);
/// Reads system-wide register `register`.
pub type SystemGetRegister = fn(&Spectrum48k, usize) -> u64;
/// Writes system-wide register `register`.
pub type SystemSetRegister = fn(&mut Spectrum48k, usize, u64);
/// Handshake entry point.
pub type SetDebuggerFn = fn(&mut Spectrum48k, &mut DebuggerIf) -> Option<InstanceHandle>;

/// Negotiation record: `version` is supplied by the host, everything else is
/// filled in by the core.
#[derive(Default)]
pub struct DebuggerIf {
    /// Record version requested by the host.
    pub version: u32,
    /// Root descriptor of the machine.
    pub system: Option<&'static System<Spectrum48k>>,
    /// Peek into a system-wide memory region, by index into `system.memory_regions`.
    pub peek: Option<SystemPeek>,
    /// Poke into a system-wide memory region.
    pub poke: Option<SystemPoke>,
    /// Read a system-wide register, by index into `system.registers`.
    pub get_register: Option<SystemGetRegister>,
    /// Write a system-wide register.
    pub set_register: Option<SystemSetRegister>,
}

impl DebuggerIf {
    /// Empty record requesting `version`.
    #[must_use]
    pub fn new(version: u32) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Whether the core filled in the record.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.system.is_some()
    }

    fn clear_outputs(&mut self) {
        *self = Self::new(self.version);
    }
}

impl fmt::Debug for DebuggerIf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebuggerIf")
            .field("version", &self.version)
            .field("system", &self.system.map(|system| system.description))
            .field("peek", &self.peek.is_some())
            .field("poke", &self.poke.is_some())
            .field("get_register", &self.get_register.is_some())
            .field("set_register", &self.set_register.is_some())
            .finish()
    }
}

/// Handshake entry point: binds a debugger to `machine` through `record`.
///
/// Returns `None`, with every output slot empty, when `record.version` is not
/// [`DEBUGGER_IF_VERSION`].
pub fn set_debugger(machine: &mut Spectrum48k, record: &mut DebuggerIf) -> Option<InstanceHandle> {
    record.clear_outputs();
    if record.version != DEBUGGER_IF_VERSION {
        warn!(
            requested = record.version,
            supported = DEBUGGER_IF_VERSION,
            "debugger interface version mismatch; debugger support disabled"
        );
        machine.host_log(
            LogLevel::Warn,
            &format!(
                "debugger interface version {} unsupported (expected {DEBUGGER_IF_VERSION})",
                record.version
            ),
        );
        return None;
    }
    record.system = Some(&zx48k::SYSTEM);
    record.peek = Some(zx48k::system_peek);
    record.poke = Some(zx48k::system_poke);
    record.get_register = Some(zx48k::system_get_register);
    record.set_register = Some(zx48k::system_set_register);
    machine.attach_debugger();
    let handle = machine.handle();
    debug!(instance = handle.get(), "debugger handshake complete");
    Some(handle)
}

/// Resolves an exported entry point by name.
#[must_use]
pub fn get_proc_address(symbol: &str) -> Option<SetDebuggerFn> {
    (symbol == SET_DEBUGGER_SYMBOL).then_some(set_debugger as SetDebuggerFn)
}

#[cfg(test)]
mod tests {
    use super::{get_proc_address, InstanceHandle, SET_DEBUGGER_SYMBOL};

    #[test]
    fn handles_are_distinct() {
        let a = InstanceHandle::next();
        let b = InstanceHandle::next();
        assert_ne!(a, b);
        assert_ne!(a.get(), 0);
    }

    #[test]
    fn only_the_handshake_symbol_resolves() {
        assert!(get_proc_address(SET_DEBUGGER_SYMBOL).is_some());
        assert!(get_proc_address("retro_run").is_none());
    }
}
