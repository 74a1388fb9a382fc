//! Bus access records for watchpoint matching.

/// Direction of a memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Data read or opcode fetch.
    Read,
    /// Data write.
    Write,
}

/// One CPU memory access observed on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryAccess {
    /// CPU address accessed.
    pub addr: u16,
    /// Access direction.
    pub kind: AccessKind,
}

impl MemoryAccess {
    /// Creates a read access record.
    #[must_use]
    pub const fn read(addr: u16) -> Self {
        Self {
            addr,
            kind: AccessKind::Read,
        }
    }

    /// Creates a write access record.
    #[must_use]
    pub const fn write(addr: u16) -> Self {
        Self {
            addr,
            kind: AccessKind::Write,
        }
    }

    /// Returns `true` when this access falls inside `start..start + length` and
    /// matches one of the enabled directions.
    ///
    /// Ranges wrap past `0xFFFF` to `0x0000` the way the address bus does. A `start`
    /// outside the 64 KiB address space never matches.
    #[must_use]
    pub fn matches(self, start: u64, length: u64, read: bool, write: bool) -> bool {
        let direction = match self.kind {
            AccessKind::Read => read,
            AccessKind::Write => write,
        };
        let Ok(start) = u16::try_from(start) else {
            return false;
        };
        direction && u64::from(self.addr.wrapping_sub(start)) < length
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryAccess;

    #[test]
    fn matches_respects_range_and_direction() {
        assert!(MemoryAccess::write(0x8000).matches(0x8000, 1, false, true));
        assert!(!MemoryAccess::write(0x8000).matches(0x8000, 1, true, false));
        assert!(MemoryAccess::read(0x8003).matches(0x8000, 4, true, false));
        assert!(!MemoryAccess::read(0x8004).matches(0x8000, 4, true, true));
        assert!(!MemoryAccess::read(0x7FFF).matches(0x8000, 4, true, true));
    }

    #[test]
    fn range_wraps_past_top_of_memory() {
        assert!(MemoryAccess::write(0xFFFF).matches(0xFFFE, 4, false, true));
        assert!(MemoryAccess::write(0x0001).matches(0xFFFE, 4, false, true));
        assert!(!MemoryAccess::write(0x0002).matches(0xFFFE, 4, false, true));
        assert!(!MemoryAccess::write(0xFFFD).matches(0xFFFE, 4, false, true));
    }

    #[test]
    fn start_outside_address_space_never_matches() {
        assert!(!MemoryAccess::read(0x0000).matches(0x1_0000, 4, true, true));
    }

    #[test]
    fn zero_length_never_matches() {
        assert!(!MemoryAccess::read(0x8000).matches(0x8000, 0, true, true));
    }
}
