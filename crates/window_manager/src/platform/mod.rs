//! Native window facilities
//!
//! [`Platform`] is the seam between the manager and an operating system. A
//! backend creates and drives native windows and reports what happens to them
//! as [`NativeMessage`]s through the [`Dispatcher`] it receives in
//! [`Platform::attach`]. It never touches the manager's tables directly.
//!
//! Backends:
//! - [`HeadlessPlatform`]: in-process windows with scripted input; always built
//! - `GlfwPlatform`: desktop windows through GLFW (feature `glfw`)
//! - `Win32Platform`: the native Windows backend (`cfg(windows)`)

pub mod headless;
pub mod message;

#[cfg(feature = "glfw")]
pub mod glfw;

#[cfg(windows)]
#[allow(unsafe_code)]
pub mod win32;

use crate::config::ManagerConfig;
use crate::dnd::DropTarget;
use crate::foundation::{Extent2D, Point2D, Vector2};
use crate::manager::{Dispatcher, WindowError, WindowResult};
use crate::window::{CornerPreference, WindowFlags, WindowStyle};
use ash::vk;
use bitflags::bitflags;
use std::ffi::CString;
use std::rc::Rc;

pub use headless::HeadlessPlatform;
pub use message::{NativeButton, NativeHitRegion, NativeMessage, RawKey, Reply, SizeKind};

#[cfg(feature = "glfw")]
pub use self::glfw::GlfwPlatform;

#[cfg(windows)]
pub use win32::Win32Platform;

/// Backend-specific window handle.
///
/// Only meaningful to the backend that issued it. The OS may reuse handle
/// values once a window is destroyed, which is why applications see
/// [`WindowId`](crate::window::WindowId)s instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// Wrap a raw handle value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Everything a backend needs to create one native window
#[derive(Debug, Clone, PartialEq)]
pub struct NativeWindowDesc {
    /// Title bar text
    pub title: String,
    /// Requested outer size
    pub size: Extent2D,
    /// Top-left position in screen coordinates
    pub position: Point2D,
    /// Semantic creation flags
    pub flags: WindowFlags,
    /// Native style derived from the flags
    pub style: WindowStyle,
    /// Compositor corner rounding
    pub corners: CornerPreference,
}

/// Show-state changes requested by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowCommand {
    /// Make visible
    Show,
    /// Make invisible
    Hide,
    /// Iconify
    Minimize,
    /// Maximize
    Maximize,
}

bitflags! {
    /// Optional features a backend supports
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PlatformCapabilities: u32 {
        /// Non-client hit testing reaches the application callback
        const HIT_TEST = 1 << 0;
        /// Drag sessions report enter, over and leave, not just the drop
        const DRAG_SESSIONS = 1 << 1;
        /// Dropped files are delivered
        const FILE_DROP = 1 << 2;
        /// Dropped text is delivered
        const TEXT_DROP = 1 << 3;
        /// Windows can present through a Vulkan surface
        const VULKAN_SURFACE = 1 << 4;
    }
}

/// OS services the translator needs while handling a message
pub trait NativeHost {
    /// Ask the OS to report when the pointer leaves `handle`.
    ///
    /// Returns false when tracking could not be armed.
    fn track_mouse_leave(&self, handle: NativeHandle) -> bool;
}

/// A native window facility.
///
/// All methods run on the thread that owns the
/// [`WindowManager`](crate::manager::WindowManager). Queries on handles the
/// backend does not know return `None`.
pub trait Platform {
    /// Human-readable backend name for logs
    fn name(&self) -> &'static str;

    /// Features this backend supports
    fn capabilities(&self) -> PlatformCapabilities;

    /// Receive the dispatcher used to deliver native messages.
    ///
    /// Called once by the manager before any window is created.
    fn attach(&mut self, dispatcher: Dispatcher);

    /// Size of the primary display, used to center new windows
    fn primary_display_extent(&self) -> Option<Extent2D>;

    /// Create a native window
    fn create_window(&mut self, desc: &NativeWindowDesc) -> WindowResult<NativeHandle>;

    /// Destroy a native window. May deliver messages synchronously.
    fn destroy_window(&mut self, handle: NativeHandle);

    /// Change a window's show state
    fn show_window(&mut self, handle: NativeHandle, command: ShowCommand);

    /// Give a window keyboard focus
    fn focus_window(&mut self, handle: NativeHandle);

    /// Current client extent
    fn client_size(&self, handle: NativeHandle) -> Option<Extent2D>;

    /// Client-area origin in client coordinates
    fn client_position(&self, handle: NativeHandle) -> Option<Point2D>;

    /// Pointer position in client coordinates
    fn cursor_position(&self, handle: NativeHandle) -> Option<Vector2>;

    /// Dots per inch of the monitor the window is on
    fn dpi(&self, handle: NativeHandle) -> Option<f32>;

    /// Start delivering drag sessions for `handle` to `target`
    fn register_drop_target(&mut self, handle: NativeHandle, target: Rc<DropTarget>) -> WindowResult<()>;

    /// Stop delivering drag sessions and release the backend's references
    fn revoke_drop_target(&mut self, handle: NativeHandle);

    /// Process every pending native message, then return
    fn pump(&mut self);

    /// Vulkan instance extensions this backend's surfaces need
    fn required_extensions(&self) -> WindowResult<Vec<CString>>;

    /// Create a presentable surface for `handle`
    fn create_surface(
        &self,
        handle: NativeHandle,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> WindowResult<vk::SurfaceKHR>;
}

impl<P: Platform + ?Sized> Platform for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn capabilities(&self) -> PlatformCapabilities {
        (**self).capabilities()
    }

    fn attach(&mut self, dispatcher: Dispatcher) {
        (**self).attach(dispatcher);
    }

    fn primary_display_extent(&self) -> Option<Extent2D> {
        (**self).primary_display_extent()
    }

    fn create_window(&mut self, desc: &NativeWindowDesc) -> WindowResult<NativeHandle> {
        (**self).create_window(desc)
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        (**self).destroy_window(handle);
    }

    fn show_window(&mut self, handle: NativeHandle, command: ShowCommand) {
        (**self).show_window(handle, command);
    }

    fn focus_window(&mut self, handle: NativeHandle) {
        (**self).focus_window(handle);
    }

    fn client_size(&self, handle: NativeHandle) -> Option<Extent2D> {
        (**self).client_size(handle)
    }

    fn client_position(&self, handle: NativeHandle) -> Option<Point2D> {
        (**self).client_position(handle)
    }

    fn cursor_position(&self, handle: NativeHandle) -> Option<Vector2> {
        (**self).cursor_position(handle)
    }

    fn dpi(&self, handle: NativeHandle) -> Option<f32> {
        (**self).dpi(handle)
    }

    fn register_drop_target(&mut self, handle: NativeHandle, target: Rc<DropTarget>) -> WindowResult<()> {
        (**self).register_drop_target(handle, target)
    }

    fn revoke_drop_target(&mut self, handle: NativeHandle) {
        (**self).revoke_drop_target(handle);
    }

    fn pump(&mut self) {
        (**self).pump();
    }

    fn required_extensions(&self) -> WindowResult<Vec<CString>> {
        (**self).required_extensions()
    }

    fn create_surface(
        &self,
        handle: NativeHandle,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> WindowResult<vk::SurfaceKHR> {
        (**self).create_surface(handle, entry, instance)
    }
}

/// The desktop backend compiled for this target.
///
/// Windows builds get the Win32 backend, other targets the GLFW backend when
/// the `glfw` feature is enabled. Without either there is nothing to run on
/// and [`WindowError::NoPlatform`] is returned.
pub fn native_platform(config: &ManagerConfig) -> WindowResult<Box<dyn Platform>> {
    #[cfg(windows)]
    {
        return Ok(Box::new(Win32Platform::new(&config.window_class_name)?));
    }

    #[cfg(all(not(windows), feature = "glfw"))]
    {
        return Ok(Box::new(GlfwPlatform::new()?));
    }

    #[allow(unreachable_code)]
    {
        let _ = config;
        Err(WindowError::NoPlatform)
    }
}
