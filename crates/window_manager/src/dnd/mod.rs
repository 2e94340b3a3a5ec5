//! Drag and drop
//!
//! A window created with [`WindowFlags::DRAG_AND_DROP`](crate::window::WindowFlags::DRAG_AND_DROP)
//! gets a [`DropTarget`] that turns the OS drag protocol into calls on the
//! window's [`DropCallbacks`]. Callbacks see the payload through a
//! [`DropContext`]: cheap format probes up front, files and text read only
//! when asked for.

pub mod context;
pub mod source;
pub mod target;

pub use context::{DataSource, DropContext, DropDataError, DropFormat, FormatProbe};
pub use source::OwnedDataSource;
pub use target::{DropCallbacks, DropEffect, DropTarget};
