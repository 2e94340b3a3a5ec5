//! Input vocabulary
//!
//! Backend-neutral key, button, state and modifier types carried by
//! [`WindowEvent`](crate::events::WindowEvent)s.

pub mod keymap;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use keymap::{map_virtual_key, VirtualKey};

/// Transition reported for a key or button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputState {
    /// Went down
    Pressed,
    /// Went up
    Released,
    /// Held down long enough for auto-repeat
    Repeat,
}

bitflags! {
    /// Modifier keys and lock states sampled when an input event is delivered
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct InputModifiers: u32 {
        /// Either Shift key
        const SHIFT = 0x0001;
        /// Either Control key
        const CONTROL = 0x0002;
        /// Either Alt key
        const ALT = 0x0004;
        /// Either Super (Windows/Command) key
        const SUPER = 0x0008;
        /// Caps Lock is toggled on
        const CAPS_LOCK = 0x0010;
        /// Num Lock is toggled on
        const NUM_LOCK = 0x0020;
    }
}

/// Pointer buttons, numbered the way most platforms number them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CursorButton {
    /// Primary (usually left)
    One,
    /// Secondary (usually right)
    Two,
    /// Middle
    Three,
    /// First extended button (usually "back")
    Four,
    /// Second extended button (usually "forward")
    Five,
    /// Third extended button
    Six,
    /// Fourth extended button
    Seven,
}

/// Keyboard keys by physical role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum InputKey {
    /// A key with no mapping in this vocabulary
    Unknown,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    F13,
    F14,
    F15,
    F16,
    F17,
    F18,
    F19,
    F20,
    F21,
    F22,
    F23,
    F24,
    F25,
    Space,
    Apostrophe,
    Comma,
    Minus,
    Period,
    Slash,
    Semicolon,
    Equal,
    LeftBracket,
    Backslash,
    RightBracket,
    GraveAccent,
    Escape,
    Enter,
    Tab,
    Backspace,
    Insert,
    Delete,
    Right,
    Left,
    Down,
    Up,
    PageUp,
    PageDown,
    Home,
    End,
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,
    LeftShift,
    LeftControl,
    LeftAlt,
    LeftSuper,
    RightShift,
    RightControl,
    RightAlt,
    RightSuper,
    Menu,
}

impl InputKey {
    /// True for the eight left/right modifier keys
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::LeftShift
                | Self::RightShift
                | Self::LeftControl
                | Self::RightControl
                | Self::LeftAlt
                | Self::RightAlt
                | Self::LeftSuper
                | Self::RightSuper
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_bits_match_wire_values() {
        assert_eq!(InputModifiers::SHIFT.bits(), 0x01);
        assert_eq!(InputModifiers::NUM_LOCK.bits(), 0x20);
        let mods = InputModifiers::SHIFT | InputModifiers::CAPS_LOCK;
        assert!(mods.contains(InputModifiers::SHIFT));
        assert!(!mods.contains(InputModifiers::CONTROL));
    }

    #[test]
    fn test_modifiers_from_bare_string() {
        #[derive(serde::Deserialize)]
        struct Binding {
            modifiers: InputModifiers,
        }
        let binding: Binding = toml::from_str("modifiers = \"SHIFT | ALT\"").unwrap();
        assert_eq!(binding.modifiers, InputModifiers::SHIFT | InputModifiers::ALT);
        let none: InputModifiers = ron::from_str("\"\"").unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_is_modifier() {
        assert!(InputKey::RightAlt.is_modifier());
        assert!(!InputKey::CapsLock.is_modifier());
        assert!(!InputKey::Unknown.is_modifier());
    }
}
