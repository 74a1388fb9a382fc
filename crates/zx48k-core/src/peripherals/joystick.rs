//! Kempston joystick latch.

/// Host joystick directions and fire button for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct JoystickState {
    /// Right.
    pub right: bool,
    /// Left.
    pub left: bool,
    /// Down.
    pub down: bool,
    /// Up.
    pub up: bool,
    /// Fire.
    pub fire: bool,
}

impl JoystickState {
    /// Kempston port value: bit 0 right, 1 left, 2 down, 3 up, 4 fire (active high).
    #[must_use]
    pub const fn kempston_bits(self) -> u8 {
        (self.right as u8)
            | ((self.left as u8) << 1)
            | ((self.down as u8) << 2)
            | ((self.up as u8) << 3)
            | ((self.fire as u8) << 4)
    }
}
