//! Vulkan surface handoff
//!
//! [`WindowManager::create_surface`](super::WindowManager::create_surface)
//! returns a raw `vk::SurfaceKHR` the caller owns. [`WindowSurface`] is the
//! owning alternative: it destroys the surface when dropped. Swapchain
//! queries go through [`WindowSurface::loader`].

use crate::window::WindowId;
use ash::{extensions::khr, vk};

/// Owned presentation surface of one window
pub struct WindowSurface {
    window: WindowId,
    surface_loader: khr::Surface,
    surface: vk::SurfaceKHR,
}

impl WindowSurface {
    pub(crate) fn new(window: WindowId, entry: &ash::Entry, instance: &ash::Instance, surface: vk::SurfaceKHR) -> Self {
        Self {
            window,
            surface_loader: khr::Surface::new(entry, instance),
            surface,
        }
    }

    /// Window the surface presents to
    pub fn window_id(&self) -> WindowId {
        self.window
    }

    /// Get the underlying surface handle
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the surface loader
    pub fn loader(&self) -> &khr::Surface {
        &self.surface_loader
    }
}

impl Drop for WindowSurface {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        log::debug!("destroying surface of {}", self.window);
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

impl std::fmt::Debug for WindowSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowSurface")
            .field("window", &self.window)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}
