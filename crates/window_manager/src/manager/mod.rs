//! The window manager
//!
//! [`WindowManager`] owns every window it creates and hands out
//! [`WindowId`]s in place of native handles. Native messages reach it through
//! the [`Dispatcher`] it gives its [`Platform`]; they are translated into
//! [`WindowEvent`]s and wait in a FIFO queue until [`WindowManager::get_events`]
//! drains them.
//!
//! ```no_run
//! use window_manager::prelude::*;
//!
//! let mut manager = WindowManager::native(ManagerConfig::default())?;
//! let main = manager.create("Main", Extent2D::new(1280, 720), WindowFlags::VISIBLE | WindowFlags::RESIZABLE)?;
//!
//! let mut events = Vec::with_capacity(64);
//! loop {
//!     manager.pump_events();
//!     events.clear();
//!     manager.get_events(&mut events, 64);
//!     if events.iter().any(|event| matches!(event, WindowEvent::Close { window } if *window == main)) {
//!         manager.destroy(main)?;
//!         break;
//!     }
//! }
//! # Ok::<(), WindowError>(())
//! ```

mod shared;
mod surface;

pub(crate) use shared::Shared;
pub use shared::Dispatcher;
pub use surface::WindowSurface;

use crate::config::{ManagerConfig, WindowDescriptor};
use crate::dnd::{DropCallbacks, DropTarget};
use crate::events::WindowEvent;
use crate::foundation::{Extent2D, Point2D, Vector2};
use crate::platform::{
    native_platform, NativeHandle, NativeWindowDesc, Platform, PlatformCapabilities, ShowCommand,
};
use crate::window::registry::WindowRecord;
use crate::window::{CornerPreference, HitTestResult, WindowFlags, WindowId, WindowStyle};
use ash::vk;
use std::ffi::CString;
use std::rc::Rc;
use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// The platform refused to create the native window
    #[error("Native window creation failed: {0}")]
    NativeCreationFailed(String),

    /// No Vulkan surface could be created for the window
    #[error("Surface creation failed: {0}")]
    SurfaceCreationFailed(String),

    /// The id names no live window
    #[error("Unknown window id: {0}")]
    UnknownWindowId(WindowId),

    /// Neither a Win32 nor a GLFW backend was compiled in
    #[error("No window platform available for this build")]
    NoPlatform,

    /// The backend failed to start
    #[error("Platform initialization failed: {0}")]
    PlatformInit(String),

    /// The window could not be registered as a drop target
    #[error("Drop target registration failed: {0}")]
    DropRegistration(String),

    /// The backend cannot provide Vulkan instance extensions
    #[error("Vulkan unavailable: {0}")]
    VulkanUnavailable(String),
}

/// Result alias for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Creates, tracks and destroys native windows on one thread
pub struct WindowManager<P: Platform> {
    shared: Rc<Shared>,
    platform: P,
    config: ManagerConfig,
}

impl WindowManager<Box<dyn Platform>> {
    /// Manager on the desktop backend compiled for this target
    pub fn native(config: ManagerConfig) -> WindowResult<Self> {
        let platform = native_platform(&config)?;
        Ok(Self::with_config(platform, config))
    }
}

impl<P: Platform> WindowManager<P> {
    /// Manager with default settings
    pub fn new(platform: P) -> Self {
        Self::with_config(platform, ManagerConfig::default())
    }

    /// Manager with explicit settings
    pub fn with_config(mut platform: P, config: ManagerConfig) -> Self {
        let shared = Rc::new(Shared::new(config.event_queue_capacity));
        platform.attach(Dispatcher::new(Rc::clone(&shared)));
        log::info!(
            "Window manager started on {} backend ({:?})",
            platform.name(),
            platform.capabilities()
        );
        Self {
            shared,
            platform,
            config,
        }
    }

    /// Active settings
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The backend
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The backend, mutably
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Create a window centered on the primary display
    pub fn create(&mut self, title: &str, size: Extent2D, flags: WindowFlags) -> WindowResult<WindowId> {
        self.create_window(title, size, flags, self.config.corner_preference)
    }

    /// Create a window from a configuration descriptor
    pub fn create_from(&mut self, descriptor: &WindowDescriptor) -> WindowResult<WindowId> {
        let corners = descriptor.corners.unwrap_or(self.config.corner_preference);
        self.create_window(&descriptor.title, descriptor.size(), descriptor.flags, corners)
    }

    fn create_window(
        &mut self,
        title: &str,
        size: Extent2D,
        flags: WindowFlags,
        corners: CornerPreference,
    ) -> WindowResult<WindowId> {
        let id = self.shared.registry.borrow_mut().allocate_id();
        let display = self.platform.primary_display_extent().unwrap_or(size);
        let desc = NativeWindowDesc {
            title: title.to_string(),
            size,
            position: Point2D::centered(display, size),
            flags,
            style: WindowStyle::from_flags(flags),
            corners,
        };

        let handle = match self.platform.create_window(&desc) {
            Ok(handle) => handle,
            Err(error) => {
                self.shared.registry.borrow_mut().release_id(id);
                log::warn!("Failed to create window '{}': {}", title, error);
                return Err(match error {
                    WindowError::NativeCreationFailed(reason) => WindowError::NativeCreationFailed(reason),
                    other => WindowError::NativeCreationFailed(other.to_string()),
                });
            }
        };

        // Registered before showing so the first size and focus messages are kept
        self.shared
            .registry
            .borrow_mut()
            .insert(WindowRecord::new(id, handle, flags));

        if flags.contains(WindowFlags::VISIBLE) {
            self.platform.show_window(handle, ShowCommand::Show);
            if flags.contains(WindowFlags::FOCUSED) {
                self.platform.focus_window(handle);
            }
        }

        if flags.contains(WindowFlags::DRAG_AND_DROP) {
            let target = Rc::new(DropTarget::new(id, &self.shared));
            if let Err(error) = self.platform.register_drop_target(handle, Rc::clone(&target)) {
                log::warn!("Failed to register drop target for {}: {}", id, error);
                self.platform.destroy_window(handle);
                self.shared.registry.borrow_mut().remove(id);
                self.shared.queue.borrow_mut().purge_window(id);
                return Err(error);
            }
            if let Some(record) = self.shared.registry.borrow_mut().get_mut(id) {
                record.drop_target = Some(target);
            }
            log::debug!("Drop target registered for {}", id);
        }

        log::info!(
            "Created {} '{}' {}x{} at ({}, {}) with {:?}",
            id,
            title,
            size.width,
            size.height,
            desc.position.x,
            desc.position.y,
            flags
        );
        Ok(id)
    }

    /// Destroy a window and release its id
    pub fn destroy(&mut self, id: WindowId) -> WindowResult<()> {
        let (handle, drop_target) = {
            let mut registry = self.shared.registry.borrow_mut();
            let record = registry.get_mut(id).ok_or(WindowError::UnknownWindowId(id))?;
            (record.handle, record.drop_target.take())
        };

        if let Some(target) = drop_target {
            self.platform.revoke_drop_target(handle);
            // The OS may still hold references for a while
            log::debug!("Drop target revoked for {} ({} references left)", id, Rc::strong_count(&target) - 1);
        }

        self.platform.destroy_window(handle);
        self.shared.registry.borrow_mut().remove(id);

        if self.config.purge_events_on_destroy {
            let purged = self.shared.queue.borrow_mut().purge_window(id);
            if purged > 0 {
                log::debug!("Discarded {} pending events of {}", purged, id);
            }
        }

        log::info!("Destroyed {}", id);
        Ok(())
    }

    fn handle(&self, id: WindowId) -> Option<NativeHandle> {
        self.shared.native_handle(id)
    }

    /// Native handle of a window
    pub fn native_handle(&self, id: WindowId) -> Option<NativeHandle> {
        self.handle(id)
    }

    /// Client extent, zero for unknown ids
    pub fn client_size(&self, id: WindowId) -> Extent2D {
        self.handle(id)
            .and_then(|handle| self.platform.client_size(handle))
            .unwrap_or(Extent2D::ZERO)
    }

    /// Client-area origin, zero for unknown ids
    pub fn client_position(&self, id: WindowId) -> Point2D {
        self.handle(id)
            .and_then(|handle| self.platform.client_position(handle))
            .unwrap_or_default()
    }

    /// Pointer position in client coordinates, zero for unknown ids
    pub fn cursor_position(&self, id: WindowId) -> Vector2 {
        self.handle(id)
            .and_then(|handle| self.platform.cursor_position(handle))
            .unwrap_or(Vector2::ZERO)
    }

    /// Make a window visible
    pub fn show(&mut self, id: WindowId) {
        self.show_command(id, ShowCommand::Show);
    }

    /// Make a window invisible
    pub fn hide(&mut self, id: WindowId) {
        self.show_command(id, ShowCommand::Hide);
    }

    /// Iconify a window
    pub fn minimize(&mut self, id: WindowId) {
        self.show_command(id, ShowCommand::Minimize);
    }

    /// Maximize a window
    pub fn maximize(&mut self, id: WindowId) {
        self.show_command(id, ShowCommand::Maximize);
    }

    fn show_command(&mut self, id: WindowId, command: ShowCommand) {
        let Some(handle) = self.handle(id) else {
            return;
        };
        self.platform.show_window(handle, command);
        if matches!(command, ShowCommand::Show) && self.take_focus_on_show(id) {
            log::debug!("Focusing {} on first show", id);
            self.platform.focus_window(handle);
        }
    }

    fn take_focus_on_show(&self, id: WindowId) -> bool {
        self.shared
            .registry
            .borrow_mut()
            .get_mut(id)
            .is_some_and(|record| std::mem::take(&mut record.focus_on_show))
    }

    /// DPI of the monitor a window is on
    pub fn dpi(&self, id: WindowId) -> f32 {
        self.handle(id)
            .and_then(|handle| self.platform.dpi(handle))
            .unwrap_or_else(|| self.default_dpi())
    }

    /// DPI at 100 % scale
    pub fn default_dpi(&self) -> f32 {
        self.config.default_dpi
    }

    /// Vulkan instance extensions needed for [`create_surface`](Self::create_surface)
    pub fn required_extensions(&self) -> WindowResult<Vec<CString>> {
        self.platform.required_extensions()
    }

    /// Create a presentation surface; the caller destroys it
    pub fn create_surface(
        &self,
        id: WindowId,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> WindowResult<vk::SurfaceKHR> {
        let handle = self.handle(id).ok_or(WindowError::UnknownWindowId(id))?;
        self.platform
            .create_surface(handle, entry, instance)
            .map_err(|error| match error {
                WindowError::SurfaceCreationFailed(reason) => WindowError::SurfaceCreationFailed(reason),
                other => WindowError::SurfaceCreationFailed(other.to_string()),
            })
    }

    /// Create a presentation surface destroyed on drop
    pub fn create_window_surface(
        &self,
        id: WindowId,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> WindowResult<WindowSurface> {
        let surface = self.create_surface(id, entry, instance)?;
        Ok(WindowSurface::new(id, entry, instance, surface))
    }

    /// Deliver every pending native message, then return
    pub fn pump_events(&mut self) {
        self.platform.pump();
    }

    /// Move up to `capacity` queued events into `out`, oldest first.
    ///
    /// Returns how many were moved; never blocks.
    pub fn get_events(&mut self, out: &mut Vec<WindowEvent>, capacity: usize) -> usize {
        self.shared.queue.borrow_mut().drain_into(out, capacity)
    }

    /// Number of queued events
    pub fn pending_event_count(&self) -> usize {
        self.shared.queue.borrow().len()
    }

    /// Classify client-area points for the OS (drag regions, custom borders)
    pub fn set_hit_test_callback(
        &mut self,
        id: WindowId,
        callback: impl Fn(Vector2) -> HitTestResult + 'static,
    ) -> WindowResult<()> {
        if !self.platform.capabilities().contains(PlatformCapabilities::HIT_TEST) {
            log::warn!(
                "{} backend does not support hit testing; callback for {} will not be called",
                self.platform.name(),
                id
            );
        }
        let mut registry = self.shared.registry.borrow_mut();
        let record = registry.get_mut(id).ok_or(WindowError::UnknownWindowId(id))?;
        record.hit_test = Some(Rc::new(callback));
        Ok(())
    }

    /// Remove the hit-test callback
    pub fn clear_hit_test_callback(&mut self, id: WindowId) {
        if let Some(record) = self.shared.registry.borrow_mut().get_mut(id) {
            record.hit_test = None;
        }
    }

    /// Install drag-and-drop callbacks
    pub fn set_drop_callbacks(&mut self, id: WindowId, callbacks: DropCallbacks) -> WindowResult<()> {
        let mut registry = self.shared.registry.borrow_mut();
        let record = registry.get_mut(id).ok_or(WindowError::UnknownWindowId(id))?;
        if !record.flags.contains(WindowFlags::DRAG_AND_DROP) {
            log::warn!("{} was created without DRAG_AND_DROP; drop callbacks will not be called", id);
        }
        record.drop_callbacks = Some(Rc::new(callbacks));
        Ok(())
    }

    /// Remove the drag-and-drop callbacks; the window then refuses drops
    pub fn clear_drop_callbacks(&mut self, id: WindowId) {
        if let Some(record) = self.shared.registry.borrow_mut().get_mut(id) {
            record.drop_callbacks = None;
        }
    }

    /// Live windows in ascending id order
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.shared.registry.borrow().ids()
    }

    /// The window exists
    pub fn is_alive(&self, id: WindowId) -> bool {
        self.shared.registry.borrow().get(id).is_some()
    }

    /// Flags a window was created with
    pub fn window_flags(&self, id: WindowId) -> Option<WindowFlags> {
        self.shared.registry.borrow().get(id).map(|record| record.flags)
    }
}

impl<P: Platform> Drop for WindowManager<P> {
    fn drop(&mut self) {
        for id in self.window_ids() {
            if let Err(error) = self.destroy(id) {
                log::warn!("Failed to destroy {} on shutdown: {}", id, error);
            }
        }
    }
}

impl<P: Platform> std::fmt::Debug for WindowManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowManager")
            .field("platform", &self.platform.name())
            .field("windows", &self.shared.registry.borrow().len())
            .field("pending_events", &self.pending_event_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_failure() {
        let unknown = WindowError::UnknownWindowId(WindowId::from_raw(3));
        assert_eq!(unknown.to_string(), "Unknown window id: window#3");
        assert_eq!(
            WindowError::DropRegistration("RegisterDragDrop: 0x80040101".to_string()).to_string(),
            "Drop target registration failed: RegisterDragDrop: 0x80040101"
        );
        assert_eq!(WindowError::NoPlatform.to_string(), "No window platform available for this build");
    }
}
