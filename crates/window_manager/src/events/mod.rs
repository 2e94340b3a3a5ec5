//! Normalized window events
//!
//! Every native message that matters to an application ends up as a
//! [`WindowEvent`] in the manager's FIFO queue. Each event names the window it
//! belongs to; the rest of the payload depends on the variant.

pub mod queue;
pub(crate) mod translator;

use crate::foundation::{Extent2D, Vector2};
use crate::input::{CursorButton, InputKey, InputModifiers, InputState};
use crate::window::WindowId;
use serde::{Deserialize, Serialize};

pub use queue::EventQueue;

/// Discriminant of a [`WindowEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowEventType {
    /// Keyboard key transition
    Key,
    /// Client area resized
    Resize,
    /// Window minimized
    Minimize,
    /// Window maximized
    Maximize,
    /// Wheel or trackpad scroll
    Scroll,
    /// Pointer moved
    CursorMove,
    /// Pointer button transition
    CursorButton,
    /// Close requested
    Close,
    /// Composed text
    Text,
    /// Pointer entered or left the client area
    CursorFocus,
    /// Keyboard focus gained or lost
    KeyboardFocus,
}

/// A translated window event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WindowEvent {
    /// Keyboard key transition
    Key {
        /// Source window
        window: WindowId,
        /// Key identity
        key: InputKey,
        /// Pressed, released or repeated
        state: InputState,
        /// Modifiers held at delivery
        modifiers: InputModifiers,
    },
    /// Client area resized
    Resize {
        /// Source window
        window: WindowId,
        /// New client extent
        size: Extent2D,
    },
    /// Window minimized
    Minimize {
        /// Source window
        window: WindowId,
    },
    /// Window maximized
    Maximize {
        /// Source window
        window: WindowId,
    },
    /// Wheel or trackpad scroll
    Scroll {
        /// Source window
        window: WindowId,
        /// Client-space pointer position
        position: Vector2,
        /// Scroll amount in notches
        delta: Vector2,
    },
    /// Pointer moved
    CursorMove {
        /// Source window
        window: WindowId,
        /// Client-space position
        position: Vector2,
    },
    /// Pointer button transition
    CursorButton {
        /// Source window
        window: WindowId,
        /// Which button
        button: CursorButton,
        /// Pressed or released
        state: InputState,
        /// Modifiers held at delivery
        modifiers: InputModifiers,
    },
    /// Close requested; the window stays alive until destroyed
    Close {
        /// Source window
        window: WindowId,
    },
    /// One UTF-16 code unit of composed text.
    ///
    /// Characters outside the basic multilingual plane arrive as two
    /// consecutive events carrying a surrogate pair.
    Text {
        /// Source window
        window: WindowId,
        /// The code unit
        code_unit: u16,
    },
    /// Pointer entered or left the client area
    CursorFocus {
        /// Source window
        window: WindowId,
        /// True on enter
        focused: bool,
    },
    /// Keyboard focus gained or lost
    KeyboardFocus {
        /// Source window
        window: WindowId,
        /// True when gained
        focused: bool,
    },
}

impl WindowEvent {
    /// The event discriminant
    pub const fn kind(&self) -> WindowEventType {
        match self {
            Self::Key { .. } => WindowEventType::Key,
            Self::Resize { .. } => WindowEventType::Resize,
            Self::Minimize { .. } => WindowEventType::Minimize,
            Self::Maximize { .. } => WindowEventType::Maximize,
            Self::Scroll { .. } => WindowEventType::Scroll,
            Self::CursorMove { .. } => WindowEventType::CursorMove,
            Self::CursorButton { .. } => WindowEventType::CursorButton,
            Self::Close { .. } => WindowEventType::Close,
            Self::Text { .. } => WindowEventType::Text,
            Self::CursorFocus { .. } => WindowEventType::CursorFocus,
            Self::KeyboardFocus { .. } => WindowEventType::KeyboardFocus,
        }
    }

    /// The window the event belongs to
    pub const fn window_id(&self) -> WindowId {
        match *self {
            Self::Key { window, .. }
            | Self::Resize { window, .. }
            | Self::Minimize { window }
            | Self::Maximize { window }
            | Self::Scroll { window, .. }
            | Self::CursorMove { window, .. }
            | Self::CursorButton { window, .. }
            | Self::Close { window }
            | Self::Text { window, .. }
            | Self::CursorFocus { window, .. }
            | Self::KeyboardFocus { window, .. } => window,
        }
    }
}

/// Recombine a run of [`WindowEvent::Text`] code units into a string.
///
/// Unpaired surrogates become U+FFFD.
pub fn decode_text<'a>(events: impl IntoIterator<Item = &'a WindowEvent>) -> String {
    let units = events.into_iter().filter_map(|event| match event {
        WindowEvent::Text { code_unit, .. } => Some(*code_unit),
        _ => None,
    });
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
