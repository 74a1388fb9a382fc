//! 40-key matrix with sticky debounce and host edge tracking.
//!
//! Keys are addressed as `column * 5 + row`, where the column is the half-row
//! selected by one of the address lines A8..A15 and the row is the data bit.

/// Half-rows in the matrix.
pub const KEYBOARD_COLUMNS: usize = 8;
/// Keys per half-row.
pub const KEYBOARD_ROWS: usize = 5;
/// Total keys.
pub const KEY_COUNT: usize = KEYBOARD_COLUMNS * KEYBOARD_ROWS;

/// One key of the Spectrum keyboard, in matrix order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum SpectrumKey {
    CapsShift,
    Z,
    X,
    C,
    V,
    A,
    S,
    D,
    F,
    G,
    Q,
    W,
    E,
    R,
    T,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num0,
    Num9,
    Num8,
    Num7,
    Num6,
    P,
    O,
    I,
    U,
    Y,
    Enter,
    L,
    K,
    J,
    H,
    Space,
    SymbolShift,
    M,
    N,
    B,
}

impl SpectrumKey {
    /// Every key, indexed by matrix code.
    pub const ALL: [Self; KEY_COUNT] = [
        Self::CapsShift,
        Self::Z,
        Self::X,
        Self::C,
        Self::V,
        Self::A,
        Self::S,
        Self::D,
        Self::F,
        Self::G,
        Self::Q,
        Self::W,
        Self::E,
        Self::R,
        Self::T,
        Self::Num1,
        Self::Num2,
        Self::Num3,
        Self::Num4,
        Self::Num5,
        Self::Num0,
        Self::Num9,
        Self::Num8,
        Self::Num7,
        Self::Num6,
        Self::P,
        Self::O,
        Self::I,
        Self::U,
        Self::Y,
        Self::Enter,
        Self::L,
        Self::K,
        Self::J,
        Self::H,
        Self::Space,
        Self::SymbolShift,
        Self::M,
        Self::N,
        Self::B,
    ];

    /// Matrix code `column * 5 + row`.
    #[must_use]
    pub const fn code(self) -> usize {
        self as usize
    }

    /// Half-row index (address line `A8 + column`).
    #[must_use]
    pub const fn column(self) -> usize {
        self.code() / KEYBOARD_ROWS
    }

    /// Data bit within the half-row.
    #[must_use]
    pub const fn row(self) -> usize {
        self.code() % KEYBOARD_ROWS
    }

    /// Key for a matrix code.
    #[must_use]
    pub const fn from_code(code: usize) -> Option<Self> {
        if code < KEY_COUNT {
            Some(Self::ALL[code])
        } else {
            None
        }
    }

    const fn mask(self) -> u64 {
        1 << self.code()
    }
}

/// Key matrix with sticky debounce.
///
/// A key released before it has been down for the sticky duration stays down
/// until the debounce clock has advanced past it, so a press shorter than one
/// frame is still seen by the ROM's once-per-frame scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    held: u64,
    down: u64,
    pressed_at: [u64; KEY_COUNT],
    clock_us: u64,
    sticky_us: u64,
}

impl Keyboard {
    /// Creates a matrix whose keys stay down for at least `sticky_us` microseconds.
    #[must_use]
    pub const fn new(sticky_us: u64) -> Self {
        Self {
            held: 0,
            down: 0,
            pressed_at: [0; KEY_COUNT],
            clock_us: 0,
            sticky_us,
        }
    }

    /// Releases every key and rewinds the debounce clock.
    pub const fn reset(&mut self) {
        *self = Self::new(self.sticky_us);
    }

    /// Presses `key`.
    pub const fn key_down(&mut self, key: SpectrumKey) {
        self.held |= key.mask();
        self.down |= key.mask();
        self.pressed_at[key.code()] = self.clock_us;
    }

    /// Releases `key`, or marks it for release once its sticky time has elapsed.
    pub const fn key_up(&mut self, key: SpectrumKey) {
        self.held &= !key.mask();
        if self.sticky_elapsed(key.code()) {
            self.down &= !key.mask();
        }
    }

    /// Advances the debounce clock and drops released keys whose sticky time has elapsed.
    pub fn advance(&mut self, elapsed_us: u64) {
        self.clock_us = self.clock_us.saturating_add(elapsed_us);
        for code in 0..KEY_COUNT {
            let mask = 1u64 << code;
            if self.down & !self.held & mask != 0 && self.sticky_elapsed(code) {
                self.down &= !mask;
            }
        }
    }

    const fn sticky_elapsed(&self, code: usize) -> bool {
        self.clock_us.saturating_sub(self.pressed_at[code]) >= self.sticky_us
    }

    /// Whether the matrix currently reports `key` as down.
    #[must_use]
    pub const fn is_down(&self, key: SpectrumKey) -> bool {
        self.down & key.mask() != 0
    }

    /// Microseconds the debounce clock has advanced.
    #[must_use]
    pub const fn clock_us(&self) -> u64 {
        self.clock_us
    }

    /// Active-low key bits (0-4) for the half-rows whose address line is low in `high_byte`.
    #[must_use]
    pub fn read_half_rows(&self, high_byte: u8) -> u8 {
        let mut bits = 0x1F;
        for key in SpectrumKey::ALL {
            if high_byte & (1 << key.column()) == 0 && self.is_down(key) {
                bits &= !(1 << key.row());
            }
        }
        bits
    }
}

/// Tracks host key state between polls and reports only changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyEdges {
    previous: u64,
}

/// Keys that changed since the previous poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeSet {
    /// Keys newly pressed.
    pub pressed: u64,
    /// Keys newly released.
    pub released: u64,
}

impl EdgeSet {
    /// Iterates `(key, is_down)` for every edge, in matrix order.
    pub fn events(self) -> impl Iterator<Item = (SpectrumKey, bool)> {
        SpectrumKey::ALL.into_iter().filter_map(move |key| {
            if self.pressed & key.mask() != 0 {
                Some((key, true))
            } else if self.released & key.mask() != 0 {
                Some((key, false))
            } else {
                None
            }
        })
    }
}

impl KeyEdges {
    /// Records the current host state and returns the edges against the last poll.
    pub const fn update(&mut self, current: u64) -> EdgeSet {
        let changed = current ^ self.previous;
        self.previous = current;
        EdgeSet {
            pressed: changed & current,
            released: changed & !current,
        }
    }

    /// Forgets the previous poll so held keys are reported again.
    pub const fn reset(&mut self) {
        self.previous = 0;
    }
}

/// Builds the host key bitmask from a per-key query.
pub fn scan_host_keys(mut pressed: impl FnMut(SpectrumKey) -> bool) -> u64 {
    SpectrumKey::ALL
        .into_iter()
        .filter(|&key| pressed(key))
        .fold(0, |mask, key| mask | key.mask())
}
