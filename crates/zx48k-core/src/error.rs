use thiserror::Error;

use crate::memory::map::ROM_SIZE;

/// Reasons a ROM image is rejected at machine construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RomError {
    /// The image is not exactly one 16 KiB bank.
    #[error("ROM image must be {} bytes, got {actual}", ROM_SIZE)]
    InvalidSize {
        /// Length of the rejected image.
        actual: usize,
    },
}

/// Reasons a content load is rejected. A rejected load leaves the machine untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The content length matches no supported format.
    #[error("unsupported content size {size} bytes (expected a 48K snapshot of {expected} bytes)")]
    UnsupportedSize {
        /// Length of the rejected content.
        size: usize,
        /// The only accepted length.
        expected: usize,
    },
    /// The snapshot header holds a value the machine cannot represent.
    #[error("invalid snapshot header field `{field}`: {value:#04x}")]
    InvalidHeader {
        /// Header field name.
        field: &'static str,
        /// Offending value.
        value: u8,
    },
    /// Retaining a copy of the content failed.
    #[error("out of memory retaining {size} bytes of content")]
    OutOfMemory {
        /// Requested allocation size.
        size: usize,
    },
}

/// Reasons a [`MachineConfig`](crate::MachineConfig) is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ConfigError {
    /// A field that must be positive was zero.
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
    /// The clock and frame period produce a frame quantum that does not fit a tick counter.
    #[error("frame quantum of {0} ticks is out of range")]
    QuantumOutOfRange(u64),
}

/// Reasons a machine cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MachineError {
    /// The ROM image was rejected.
    #[error(transparent)]
    Rom(#[from] RomError),
    /// The configuration was rejected.
    #[error("invalid machine configuration: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, LoadError, RomError};

    #[test]
    fn messages_name_the_offending_values() {
        assert_eq!(
            RomError::InvalidSize { actual: 10 }.to_string(),
            "ROM image must be 16384 bytes, got 10"
        );
        assert_eq!(
            LoadError::InvalidHeader {
                field: "interrupt mode",
                value: 3
            }
            .to_string(),
            "invalid snapshot header field `interrupt mode`: 0x03"
        );
        assert_eq!(
            ConfigError::Zero("clock_hz").to_string(),
            "`clock_hz` must be greater than zero"
        );
    }
}
