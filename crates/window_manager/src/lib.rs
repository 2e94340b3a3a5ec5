//! # Window Manager
//!
//! Cross-platform native window management for Vulkan applications.
//!
//! ## Features
//!
//! - **Stable window ids**: applications never see native handles
//! - **Normalized events**: keyboard, pointer, text, resize and focus in one FIFO queue
//! - **Custom chrome**: hit-test callbacks turn client regions into drag areas and borders
//! - **Drag and drop**: file and text drops with lazy payload access
//! - **Vulkan handoff**: required instance extensions and per-window surfaces
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use window_manager::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     window_manager::foundation::logging::init();
//!
//!     let mut manager = WindowManager::native(ManagerConfig::default())?;
//!     let window = manager.create(
//!         "Viewer",
//!         Extent2D::new(1280, 720),
//!         WindowFlags::VISIBLE | WindowFlags::RESIZABLE | WindowFlags::DRAG_AND_DROP,
//!     )?;
//!     manager.set_drop_callbacks(
//!         window,
//!         DropCallbacks::new().on_drop(|_, context| {
//!             if let Ok(files) = context.files() {
//!                 println!("dropped {files:?}");
//!             }
//!         }),
//!     )?;
//!
//!     let mut events = Vec::new();
//!     while manager.is_alive(window) {
//!         manager.pump_events();
//!         events.clear();
//!         manager.get_events(&mut events, 64);
//!         for event in &events {
//!             if let WindowEvent::Close { window } = *event {
//!                 manager.destroy(window)?;
//!             }
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod dnd;
pub mod events;
pub mod foundation;
pub mod input;
pub mod manager;
pub mod platform;
pub mod window;

#[cfg(test)]
mod tests;

pub use manager::{WindowError, WindowManager, WindowResult};

/// Common imports for window manager users
pub mod prelude {
    pub use crate::{
        config::{Config, ManagerConfig, WindowDescriptor},
        dnd::{DataSource, DropCallbacks, DropContext, DropDataError, DropEffect, OwnedDataSource},
        events::{decode_text, WindowEvent, WindowEventType},
        foundation::{Extent2D, Point2D, Vector2},
        input::{CursorButton, InputKey, InputModifiers, InputState},
        manager::{WindowError, WindowManager, WindowResult, WindowSurface},
        platform::{HeadlessPlatform, Platform},
        window::{CornerPreference, HitTestResult, WindowFlags, WindowId},
    };
}
