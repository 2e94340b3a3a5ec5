//! Window identity, creation flags and per-window bookkeeping

pub(crate) mod registry;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use hit_test::{HitTestCallback, HitTestResult};

/// Opaque, manager-issued window identity.
///
/// Stable for the lifetime of a window and independent of the native handle.
/// A value may be issued again after the window it named was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(u64);

impl WindowId {
    /// Wrap a raw id value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

bitflags! {
    /// Semantic window creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct WindowFlags: u32 {
        /// No title bar or border
        const FRAMELESS = 1 << 0;
        /// Stays above normal windows
        const FLOATING = 1 << 1;
        /// User can resize the window
        const RESIZABLE = 1 << 2;
        /// Shown immediately after creation
        const VISIBLE = 1 << 3;
        /// Framebuffer alpha is composited with the desktop
        const TRANSPARENT = 1 << 4;
        /// Takes keyboard focus after creation
        const FOCUSED = 1 << 5;
        /// Accepts OS drag-and-drop sessions
        const DRAG_AND_DROP = 1 << 6;
    }
}

/// Native decoration choices derived from [`WindowFlags`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowStyle {
    /// Title bar and border are drawn by the OS
    pub decorated: bool,
    /// Sizing border is active
    pub resizable: bool,
    /// Minimize and maximize buttons are present
    pub caption_buttons: bool,
    /// Popup-style window with no frame at all
    pub popup: bool,
    /// Kept above normal windows
    pub topmost: bool,
    /// Alpha-blended framebuffer
    pub transparent: bool,
}

impl WindowStyle {
    /// Derive the native style for a set of creation flags
    pub const fn from_flags(flags: WindowFlags) -> Self {
        let frameless = flags.contains(WindowFlags::FRAMELESS);
        Self {
            decorated: !frameless,
            resizable: flags.contains(WindowFlags::RESIZABLE),
            caption_buttons: !frameless,
            popup: frameless,
            topmost: flags.contains(WindowFlags::FLOATING),
            transparent: flags.contains(WindowFlags::TRANSPARENT),
        }
    }
}

/// Corner rounding requested from the desktop compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CornerPreference {
    /// Let the compositor decide
    Default,
    /// Square corners
    DoNotRound,
    /// Standard rounded corners
    #[default]
    Round,
    /// Small-radius rounded corners
    RoundSmall,
}
