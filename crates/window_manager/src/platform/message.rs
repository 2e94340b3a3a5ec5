//! Normalized native messages
//!
//! Backends convert whatever their OS delivers (window-procedure messages,
//! GLFW callbacks, scripted input) into [`NativeMessage`]s and hand them to
//! the [`Dispatcher`](crate::manager::Dispatcher). The reply tells the backend
//! whether to fall through to default OS handling.

use crate::foundation::{Extent2D, Vector2};
use crate::input::{InputKey, InputModifiers, VirtualKey};

/// OS region vocabulary for non-client hit testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeHitRegion {
    /// Client (drawable) area
    Client,
    /// Title bar; dragging moves the window
    Caption,
    /// Top sizing border
    Top,
    /// Left sizing border
    Left,
    /// Right sizing border
    Right,
    /// Bottom sizing border
    Bottom,
    /// Close button
    Close,
    /// Minimize button
    MinButton,
    /// Maximize button
    MaxButton,
    /// Any other OS-specific region, carried through untouched
    Other(i32),
}

/// Pointer button as the backend reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Middle button
    Middle,
    /// Extended button, numbered from 1
    Extended(u8),
}

/// How a key message identifies its key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKey {
    /// Virtual-key code with keystroke flags, mapped by the translator
    Virtual(VirtualKey),
    /// Already resolved by the backend
    Mapped(InputKey),
}

/// Window state reported together with a size change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeKind {
    /// Normal resize or restore
    Restored,
    /// Iconified
    Minimized,
    /// Maximized
    Maximized,
}

/// A native message, already reduced to what the translator needs
#[derive(Debug, Clone, PartialEq)]
pub enum NativeMessage {
    /// Pointer moved inside the client area
    MouseMove {
        /// Client-space position
        position: Vector2,
    },
    /// Pointer left the client area while leave tracking was armed
    MouseLeave,
    /// Pointer button transition
    MouseButton {
        /// Which button
        button: NativeButton,
        /// Down (true) or up (false)
        pressed: bool,
        /// Modifier state sampled at delivery
        modifiers: InputModifiers,
    },
    /// Wheel or trackpad scroll
    MouseWheel {
        /// Client-space pointer position
        position: Vector2,
        /// Scroll amount in notches
        delta: Vector2,
    },
    /// Key transition
    Key {
        /// Key identity
        key: RawKey,
        /// Down (true) or up (false)
        pressed: bool,
        /// Key was already down (auto-repeat)
        repeat: bool,
        /// Modifier state sampled at delivery
        modifiers: InputModifiers,
        /// System key message (Alt chords, F10); default handling still runs
        system: bool,
    },
    /// One UTF-16 code unit of composed text
    Char {
        /// The code unit
        code_unit: u16,
    },
    /// Client area changed size or the window changed state
    Resized {
        /// New client extent
        client: Extent2D,
        /// Minimized, maximized or restored
        kind: SizeKind,
    },
    /// Keyboard focus gained or lost
    FocusChanged {
        /// True when gained
        focused: bool,
    },
    /// User asked the window to close
    CloseRequested,
    /// Non-client hit-test query
    HitTest {
        /// Client-space point
        point: Vector2,
        /// The OS's own classification
        os_region: NativeHitRegion,
    },
}

/// Translator verdict returned to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Message consumed
    Handled,
    /// Let the OS run its default handling
    Default,
    /// Answer to a hit-test query
    HitRegion(NativeHitRegion),
}
