//! Keyboard and mouse input types
//!
//! Key codes use the conventional GLFW numbering so a key can double as an
//! index into a window's key-state table.

/// Number of slots in a window's key-state table.
pub const KEY_TABLE_SIZE: usize = 512;

/// Key codes
///
/// Discriminants match the GLFW key codes, so `key as i32` round-trips
/// through the backend unchanged.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Space bar
    Space = 32,
    /// A key
    A = 65,
    /// B key
    B = 66,
    /// C key
    C = 67,
    /// D key
    D = 68,
    /// E key
    E = 69,
    /// F key
    F = 70,
    /// G key
    G = 71,
    /// H key
    H = 72,
    /// I key
    I = 73,
    /// J key
    J = 74,
    /// K key
    K = 75,
    /// L key
    L = 76,
    /// M key
    M = 77,
    /// N key
    N = 78,
    /// O key
    O = 79,
    /// P key
    P = 80,
    /// Q key
    Q = 81,
    /// R key
    R = 82,
    /// S key
    S = 83,
    /// T key
    T = 84,
    /// U key
    U = 85,
    /// V key
    V = 86,
    /// W key
    W = 87,
    /// X key
    X = 88,
    /// Y key
    Y = 89,
    /// Z key
    Z = 90,
    /// Escape key
    Escape = 256,
    /// Enter key
    Enter = 257,
    /// Right arrow
    Right = 262,
    /// Left arrow
    Left = 263,
    /// Down arrow
    Down = 264,
    /// Up arrow
    Up = 265,
}

impl Key {
    /// The backend-level key code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map a backend key code back to a known key.
    pub fn from_code(code: i32) -> Option<Self> {
        let key = match code {
            32 => Self::Space,
            65 => Self::A,
            66 => Self::B,
            67 => Self::C,
            68 => Self::D,
            69 => Self::E,
            70 => Self::F,
            71 => Self::G,
            72 => Self::H,
            73 => Self::I,
            74 => Self::J,
            75 => Self::K,
            76 => Self::L,
            77 => Self::M,
            78 => Self::N,
            79 => Self::O,
            80 => Self::P,
            81 => Self::Q,
            82 => Self::R,
            83 => Self::S,
            84 => Self::T,
            85 => Self::U,
            86 => Self::V,
            87 => Self::W,
            88 => Self::X,
            89 => Self::Y,
            90 => Self::Z,
            256 => Self::Escape,
            257 => Self::Enter,
            262 => Self::Right,
            263 => Self::Left,
            264 => Self::Down,
            265 => Self::Up,
            _ => return None,
        };
        Some(key)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Key or button state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Went down this event.
    Press,
    /// Went up this event.
    Release,
    /// Held long enough for the OS to repeat it.
    Repeat,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// Per-window table of currently held keys, kept up to date by the window's
/// default key handler.
pub struct KeyState {
    pressed: [bool; KEY_TABLE_SIZE],
}

impl Default for KeyState {
    fn default() -> Self {
        Self {
            pressed: [false; KEY_TABLE_SIZE],
        }
    }
}

impl KeyState {
    /// Whether `key` is currently held.
    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed[key.index()]
    }

    pub(crate) fn set(&mut self, key: Key, pressed: bool) {
        self.pressed[key.index()] = pressed;
    }
}
