//! Virtual-key translation
//!
//! Maps Windows-style virtual-key codes plus keystroke flags onto
//! [`InputKey`]. The codes are plain numbers so the table is usable (and
//! testable) on every platform.

use super::InputKey;

/// Scan code the right Shift key reports; left Shift reports 0x2A
const SCAN_CODE_RIGHT_SHIFT: u8 = 0x36;

/// A virtual-key code together with the keystroke flags needed to tell
/// left and right modifiers apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VirtualKey {
    /// Virtual-key code (`VK_*`)
    pub code: u16,
    /// Hardware scan code (bits 16..24 of the keystroke flags)
    pub scan_code: u8,
    /// Extended-key flag (bit 24)
    pub extended: bool,
    /// Key was already down before this message (bit 30)
    pub repeat: bool,
}

impl VirtualKey {
    /// Unpack the keystroke flags word delivered with key messages
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub const fn from_keystroke(code: u16, flags: isize) -> Self {
        let flags = flags as usize;
        Self {
            code,
            scan_code: ((flags >> 16) & 0xFF) as u8,
            extended: (flags >> 24) & 0x1 == 1,
            repeat: (flags >> 30) & 0x1 == 1,
        }
    }

    /// Key with no flags set
    pub const fn plain(code: u16) -> Self {
        Self {
            code,
            scan_code: 0,
            extended: false,
            repeat: false,
        }
    }

    /// Resolve to an [`InputKey`], falling back to [`InputKey::Unknown`]
    pub fn to_input_key(self) -> InputKey {
        map_virtual_key(self)
    }
}

/// Translate a virtual key into the abstract key vocabulary
pub fn map_virtual_key(key: VirtualKey) -> InputKey {
    const LETTERS: [InputKey; 26] = [
        InputKey::A,
        InputKey::B,
        InputKey::C,
        InputKey::D,
        InputKey::E,
        InputKey::F,
        InputKey::G,
        InputKey::H,
        InputKey::I,
        InputKey::J,
        InputKey::K,
        InputKey::L,
        InputKey::M,
        InputKey::N,
        InputKey::O,
        InputKey::P,
        InputKey::Q,
        InputKey::R,
        InputKey::S,
        InputKey::T,
        InputKey::U,
        InputKey::V,
        InputKey::W,
        InputKey::X,
        InputKey::Y,
        InputKey::Z,
    ];
    const DIGITS: [InputKey; 10] = [
        InputKey::Zero,
        InputKey::One,
        InputKey::Two,
        InputKey::Three,
        InputKey::Four,
        InputKey::Five,
        InputKey::Six,
        InputKey::Seven,
        InputKey::Eight,
        InputKey::Nine,
    ];
    const FUNCTION: [InputKey; 24] = [
        InputKey::F1,
        InputKey::F2,
        InputKey::F3,
        InputKey::F4,
        InputKey::F5,
        InputKey::F6,
        InputKey::F7,
        InputKey::F8,
        InputKey::F9,
        InputKey::F10,
        InputKey::F11,
        InputKey::F12,
        InputKey::F13,
        InputKey::F14,
        InputKey::F15,
        InputKey::F16,
        InputKey::F17,
        InputKey::F18,
        InputKey::F19,
        InputKey::F20,
        InputKey::F21,
        InputKey::F22,
        InputKey::F23,
        InputKey::F24,
    ];

    let code = key.code;
    match code {
        0x41..=0x5A => LETTERS[usize::from(code - 0x41)],
        0x30..=0x39 => DIGITS[usize::from(code - 0x30)],
        0x70..=0x87 => FUNCTION[usize::from(code - 0x70)],

        0x20 => InputKey::Space,
        0xDE => InputKey::Apostrophe,
        0xBC => InputKey::Comma,
        0xBD => InputKey::Minus,
        0xBE => InputKey::Period,
        0xBF => InputKey::Slash,
        0xBA => InputKey::Semicolon,
        0xBB => InputKey::Equal,
        0xDB => InputKey::LeftBracket,
        0xDC => InputKey::Backslash,
        0xDD => InputKey::RightBracket,
        0xC0 => InputKey::GraveAccent,

        0x1B => InputKey::Escape,
        0x0D => InputKey::Enter,
        0x09 => InputKey::Tab,
        0x08 => InputKey::Backspace,
        0x2D => InputKey::Insert,
        0x2E => InputKey::Delete,
        0x24 => InputKey::Home,
        0x23 => InputKey::End,
        0x21 => InputKey::PageUp,
        0x22 => InputKey::PageDown,

        0x25 => InputKey::Left,
        0x26 => InputKey::Up,
        0x27 => InputKey::Right,
        0x28 => InputKey::Down,

        0x14 => InputKey::CapsLock,
        0x91 => InputKey::ScrollLock,
        0x90 => InputKey::NumLock,
        0x2C => InputKey::PrintScreen,
        0x13 => InputKey::Pause,

        // Generic modifiers need the keystroke flags to pick a side
        0x10 if key.scan_code == SCAN_CODE_RIGHT_SHIFT => InputKey::RightShift,
        0x10 => InputKey::LeftShift,
        0x11 if key.extended => InputKey::RightControl,
        0x11 => InputKey::LeftControl,
        0x12 if key.extended => InputKey::RightAlt,
        0x12 => InputKey::LeftAlt,

        0xA0 => InputKey::LeftShift,
        0xA1 => InputKey::RightShift,
        0xA2 => InputKey::LeftControl,
        0xA3 => InputKey::RightControl,
        0xA4 => InputKey::LeftAlt,
        0xA5 => InputKey::RightAlt,
        0x5B => InputKey::LeftSuper,
        0x5C => InputKey::RightSuper,
        0x5D => InputKey::Menu,

        _ => InputKey::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_digits_function_keys() {
        assert_eq!(map_virtual_key(VirtualKey::plain(0x41)), InputKey::A);
        assert_eq!(map_virtual_key(VirtualKey::plain(0x5A)), InputKey::Z);
        assert_eq!(map_virtual_key(VirtualKey::plain(0x30)), InputKey::Zero);
        assert_eq!(map_virtual_key(VirtualKey::plain(0x39)), InputKey::Nine);
        assert_eq!(map_virtual_key(VirtualKey::plain(0x70)), InputKey::F1);
        assert_eq!(map_virtual_key(VirtualKey::plain(0x87)), InputKey::F24);
    }

    #[test]
    fn test_shift_side_from_scan_code() {
        let left = VirtualKey::from_keystroke(0x10, 0x2A << 16);
        let right = VirtualKey::from_keystroke(0x10, 0x36 << 16);
        assert_eq!(left.to_input_key(), InputKey::LeftShift);
        assert_eq!(right.to_input_key(), InputKey::RightShift);
    }

    #[test]
    fn test_control_and_alt_side_from_extended_flag() {
        let extended = 1 << 24;
        assert_eq!(VirtualKey::from_keystroke(0x11, 0).to_input_key(), InputKey::LeftControl);
        assert_eq!(VirtualKey::from_keystroke(0x11, extended).to_input_key(), InputKey::RightControl);
        assert_eq!(VirtualKey::from_keystroke(0x12, 0).to_input_key(), InputKey::LeftAlt);
        assert_eq!(VirtualKey::from_keystroke(0x12, extended).to_input_key(), InputKey::RightAlt);
    }

    #[test]
    fn test_repeat_flag() {
        let first = VirtualKey::from_keystroke(0x41, 0x001E_0001);
        let held = VirtualKey::from_keystroke(0x41, 0x401E_0001);
        assert!(!first.repeat);
        assert!(held.repeat);
        assert_eq!(held.scan_code, 0x1E);
    }

    #[test]
    fn test_unmapped_key_is_unknown() {
        // VK_VOLUME_MUTE has no entry
        assert_eq!(map_virtual_key(VirtualKey::plain(0xAD)), InputKey::Unknown);
        assert_eq!(map_virtual_key(VirtualKey::plain(0)), InputKey::Unknown);
    }
}
