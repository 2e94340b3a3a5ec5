//! In-process backend without a display
//!
//! Windows exist only as records. Input is scripted: [`HeadlessPlatform::post`]
//! queues a native message and [`Platform::pump`] delivers it, exactly the way
//! an OS pump would. Drag sessions are driven through the registered
//! [`DropTarget`] returned by [`HeadlessPlatform::drop_target`]. Surfaces use
//! `VK_EXT_headless_surface`.

use super::{
    NativeHandle, NativeHitRegion, NativeHost, NativeMessage, NativeWindowDesc, Platform,
    PlatformCapabilities, Reply, ShowCommand, SizeKind,
};
use crate::dnd::DropTarget;
use crate::foundation::{Extent2D, Point2D, Vector2};
use crate::manager::{Dispatcher, WindowError, WindowResult};
use crate::window::WindowFlags;
use ash::extensions::{ext, khr};
use ash::vk;
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::ffi::CString;
use std::rc::Rc;

/// Height of the simulated title bar above a decorated window's client area
pub const TITLE_BAR_HEIGHT: f32 = 30.0;

/// Display extent used unless one is configured
pub const DEFAULT_DISPLAY: Extent2D = Extent2D::new(1920, 1080);

/// Leave-tracking stand-in
#[derive(Debug)]
pub struct HeadlessHost {
    allow_tracking: Cell<bool>,
    requests: Cell<u32>,
}

impl HeadlessHost {
    fn new() -> Self {
        Self {
            allow_tracking: Cell::new(true),
            requests: Cell::new(0),
        }
    }

    /// Number of leave-tracking requests seen so far
    pub fn tracking_requests(&self) -> u32 {
        self.requests.get()
    }
}

impl NativeHost for HeadlessHost {
    fn track_mouse_leave(&self, _handle: NativeHandle) -> bool {
        self.requests.set(self.requests.get() + 1);
        self.allow_tracking.get()
    }
}

/// A simulated native window
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    /// Creation parameters
    pub desc: NativeWindowDesc,
    /// Current client extent
    pub client: Extent2D,
    /// Client extent to return to after minimize or maximize
    pub restored: Extent2D,
    /// Last known pointer position in client coordinates
    pub cursor: Vector2,
    /// Shown
    pub visible: bool,
    /// Keyboard focus
    pub focused: bool,
    /// Show state
    pub state: SizeKind,
    /// Monitor DPI, if the window reports one
    pub dpi: Option<f32>,
    drop_target: Option<Rc<DropTarget>>,
}

impl HeadlessWindow {
    fn new(desc: &NativeWindowDesc) -> Self {
        Self {
            desc: desc.clone(),
            client: desc.size,
            restored: desc.size,
            cursor: Vector2::ZERO,
            visible: desc.flags.contains(WindowFlags::VISIBLE),
            focused: false,
            state: SizeKind::Restored,
            dpi: None,
            drop_target: None,
        }
    }

    /// Region the OS itself would report for a client-space point
    pub fn os_region(&self, point: Vector2) -> NativeHitRegion {
        let inside_x = point.x >= 0.0 && point.x < self.client.width as f32;
        let below_top = point.y < self.client.height as f32;
        if inside_x && point.y >= 0.0 && below_top {
            NativeHitRegion::Client
        } else if inside_x && self.desc.style.decorated && point.y >= -TITLE_BAR_HEIGHT && point.y < 0.0 {
            NativeHitRegion::Caption
        } else {
            NativeHitRegion::Other(0)
        }
    }

    /// A drop target is registered
    pub fn accepts_drops(&self) -> bool {
        self.drop_target.is_some()
    }
}

/// Display-less [`Platform`] for tests and tooling
#[derive(Debug)]
pub struct HeadlessPlatform {
    dispatcher: Option<Dispatcher>,
    host: HeadlessHost,
    windows: HashMap<NativeHandle, HeadlessWindow>,
    pending: VecDeque<(NativeHandle, NativeMessage)>,
    next_handle: u64,
    display: Extent2D,
    window_limit: Option<usize>,
    replies: Vec<(NativeHandle, Reply)>,
}

impl HeadlessPlatform {
    /// Backend with a 1920×1080 display
    pub fn new() -> Self {
        Self {
            dispatcher: None,
            host: HeadlessHost::new(),
            windows: HashMap::new(),
            pending: VecDeque::new(),
            // Never hand out a null handle
            next_handle: 1,
            display: DEFAULT_DISPLAY,
            window_limit: None,
            replies: Vec::new(),
        }
    }

    /// Use a different primary display extent
    #[must_use]
    pub fn with_display(mut self, display: Extent2D) -> Self {
        self.display = display;
        self
    }

    /// Fail window creation once `limit` windows are alive
    #[must_use]
    pub fn with_window_limit(mut self, limit: usize) -> Self {
        self.window_limit = Some(limit);
        self
    }

    /// Make leave-tracking requests succeed or fail
    pub fn set_leave_tracking(&self, allow: bool) {
        self.host.allow_tracking.set(allow);
    }

    /// Leave-tracking stand-in
    pub fn host(&self) -> &HeadlessHost {
        &self.host
    }

    /// Queue a message for delivery on the next pump
    pub fn post(&mut self, handle: NativeHandle, message: NativeMessage) {
        self.pending.push_back((handle, message));
    }

    /// Move the pointer and queue the motion message
    pub fn move_cursor(&mut self, handle: NativeHandle, position: Vector2) {
        if let Some(window) = self.windows.get_mut(&handle) {
            window.cursor = position;
        }
        self.post(handle, NativeMessage::MouseMove { position });
    }

    /// Resize the client area and queue the size notification
    pub fn resize(&mut self, handle: NativeHandle, client: Extent2D) {
        if let Some(window) = self.windows.get_mut(&handle) {
            window.client = client;
            window.restored = client;
            window.state = SizeKind::Restored;
        }
        self.post(
            handle,
            NativeMessage::Resized {
                client,
                kind: SizeKind::Restored,
            },
        );
    }

    /// Report a DPI for one window
    pub fn set_dpi(&mut self, handle: NativeHandle, dpi: Option<f32>) {
        if let Some(window) = self.windows.get_mut(&handle) {
            window.dpi = dpi;
        }
    }

    /// Run a non-client hit test synchronously, like the OS does while the
    /// pointer moves over a window
    pub fn hit_test(&self, handle: NativeHandle, point: Vector2) -> NativeHitRegion {
        let Some(window) = self.windows.get(&handle) else {
            return NativeHitRegion::Other(0);
        };
        let os_region = window.os_region(point);
        match self.deliver(handle, &NativeMessage::HitTest { point, os_region }) {
            Reply::HitRegion(region) => region,
            Reply::Handled | Reply::Default => os_region,
        }
    }

    /// The drop target the OS would call into for `handle`
    pub fn drop_target(&self, handle: NativeHandle) -> Option<Rc<DropTarget>> {
        self.windows.get(&handle)?.drop_target.clone()
    }

    /// Simulated window behind `handle`
    pub fn window(&self, handle: NativeHandle) -> Option<&HeadlessWindow> {
        self.windows.get(&handle)
    }

    /// Number of live native windows
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Messages waiting for the next pump
    pub fn pending_messages(&self) -> usize {
        self.pending.len()
    }

    /// Replies of every message delivered so far, oldest first
    pub fn replies(&self) -> &[(NativeHandle, Reply)] {
        &self.replies
    }

    fn deliver(&self, handle: NativeHandle, message: &NativeMessage) -> Reply {
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.dispatch(handle, message, &self.host),
            None => Reply::Default,
        }
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for HeadlessPlatform {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities::all()
    }

    fn attach(&mut self, dispatcher: Dispatcher) {
        self.dispatcher = Some(dispatcher);
    }

    fn primary_display_extent(&self) -> Option<Extent2D> {
        Some(self.display)
    }

    fn create_window(&mut self, desc: &NativeWindowDesc) -> WindowResult<NativeHandle> {
        if self.window_limit.is_some_and(|limit| self.windows.len() >= limit) {
            return Err(WindowError::NativeCreationFailed(format!(
                "headless window limit reached creating '{}'",
                desc.title
            )));
        }

        let handle = NativeHandle::from_raw(self.next_handle);
        self.next_handle += 1;

        self.windows.insert(handle, HeadlessWindow::new(desc));
        Ok(handle)
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        if self.windows.remove(&handle).is_some() {
            self.pending.retain(|(target, _)| *target != handle);
        }
    }

    fn show_window(&mut self, handle: NativeHandle, command: ShowCommand) {
        let display = self.display;
        let Some(window) = self.windows.get_mut(&handle) else {
            return;
        };
        let message = match command {
            ShowCommand::Show => {
                window.visible = true;
                None
            }
            ShowCommand::Hide => {
                window.visible = false;
                None
            }
            ShowCommand::Minimize => {
                if window.state == SizeKind::Restored {
                    window.restored = window.client;
                }
                window.state = SizeKind::Minimized;
                window.client = Extent2D::ZERO;
                Some(NativeMessage::Resized {
                    client: Extent2D::ZERO,
                    kind: SizeKind::Minimized,
                })
            }
            ShowCommand::Maximize => {
                if window.state == SizeKind::Restored {
                    window.restored = window.client;
                }
                window.visible = true;
                window.state = SizeKind::Maximized;
                window.client = display;
                Some(NativeMessage::Resized {
                    client: display,
                    kind: SizeKind::Maximized,
                })
            }
        };
        if let Some(message) = message {
            self.pending.push_back((handle, message));
        }
    }

    fn focus_window(&mut self, handle: NativeHandle) {
        let mut lost = Vec::new();
        for (other, window) in &mut self.windows {
            if *other != handle && window.focused {
                window.focused = false;
                lost.push(*other);
            }
        }
        let Some(window) = self.windows.get_mut(&handle) else {
            return;
        };
        if window.focused {
            return;
        }
        window.focused = true;
        for other in lost {
            self.pending.push_back((other, NativeMessage::FocusChanged { focused: false }));
        }
        self.pending.push_back((handle, NativeMessage::FocusChanged { focused: true }));
    }

    fn client_size(&self, handle: NativeHandle) -> Option<Extent2D> {
        self.windows.get(&handle).map(|window| window.client)
    }

    fn client_position(&self, handle: NativeHandle) -> Option<Point2D> {
        // The client rectangle always starts at its own origin
        self.windows.get(&handle).map(|_| Point2D::new(0, 0))
    }

    fn cursor_position(&self, handle: NativeHandle) -> Option<Vector2> {
        self.windows.get(&handle).map(|window| window.cursor)
    }

    fn dpi(&self, handle: NativeHandle) -> Option<f32> {
        self.windows.get(&handle)?.dpi
    }

    fn register_drop_target(&mut self, handle: NativeHandle, target: Rc<DropTarget>) -> WindowResult<()> {
        let window = self.windows.get_mut(&handle).ok_or_else(|| {
            WindowError::DropRegistration(format!("no headless window {:?}", handle))
        })?;
        window.drop_target = Some(target);
        Ok(())
    }

    fn revoke_drop_target(&mut self, handle: NativeHandle) {
        if let Some(window) = self.windows.get_mut(&handle) {
            window.drop_target = None;
        }
    }

    fn pump(&mut self) {
        // Messages posted while pumping wait for the next pump
        let batch = std::mem::take(&mut self.pending);
        for (handle, message) in batch {
            let reply = self.deliver(handle, &message);
            self.replies.push((handle, reply));
        }
    }

    fn required_extensions(&self) -> WindowResult<Vec<CString>> {
        Ok(vec![khr::Surface::name().to_owned(), ext::HeadlessSurface::name().to_owned()])
    }

    #[allow(unsafe_code)]
    fn create_surface(
        &self,
        handle: NativeHandle,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> WindowResult<vk::SurfaceKHR> {
        if !self.windows.contains_key(&handle) {
            return Err(WindowError::SurfaceCreationFailed(format!("no headless window {:?}", handle)));
        }
        let loader = ext::HeadlessSurface::new(entry, instance);
        let create_info = vk::HeadlessSurfaceCreateInfoEXT::builder();
        // SAFETY: the instance was created by the caller with the extensions
        // from `required_extensions` and outlives this call
        unsafe { loader.create_headless_surface(&create_info, None) }
            .map_err(|result| WindowError::SurfaceCreationFailed(format!("vkCreateHeadlessSurfaceEXT: {result}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{CornerPreference, WindowStyle};

    fn desc(flags: WindowFlags) -> NativeWindowDesc {
        NativeWindowDesc {
            title: "test".to_string(),
            size: Extent2D::new(640, 480),
            position: Point2D::new(0, 0),
            flags,
            style: WindowStyle::from_flags(flags),
            corners: CornerPreference::Round,
        }
    }

    #[test]
    fn test_handles_are_unique_and_non_null() {
        let mut platform = HeadlessPlatform::new();
        let a = platform.create_window(&desc(WindowFlags::VISIBLE)).unwrap();
        let b = platform.create_window(&desc(WindowFlags::VISIBLE)).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.raw(), 0);
        assert_eq!(platform.window_count(), 2);
    }

    #[test]
    fn test_window_limit() {
        let mut platform = HeadlessPlatform::new().with_window_limit(1);
        assert!(platform.create_window(&desc(WindowFlags::empty())).is_ok());
        assert!(matches!(
            platform.create_window(&desc(WindowFlags::empty())),
            Err(WindowError::NativeCreationFailed(_))
        ));
    }

    #[test]
    fn test_os_regions() {
        let mut platform = HeadlessPlatform::new();
        let framed = platform.create_window(&desc(WindowFlags::RESIZABLE)).unwrap();
        let frameless = platform.create_window(&desc(WindowFlags::FRAMELESS)).unwrap();

        let window = platform.window(framed).unwrap();
        assert_eq!(window.os_region(Vector2::new(10.0, 10.0)), NativeHitRegion::Client);
        assert_eq!(window.os_region(Vector2::new(10.0, -10.0)), NativeHitRegion::Caption);
        assert_eq!(window.os_region(Vector2::new(-5.0, 10.0)), NativeHitRegion::Other(0));

        let window = platform.window(frameless).unwrap();
        assert_eq!(window.os_region(Vector2::new(10.0, -10.0)), NativeHitRegion::Other(0));
    }

    #[test]
    fn test_maximize_and_minimize_post_size_messages() {
        let mut platform = HeadlessPlatform::new().with_display(Extent2D::new(800, 600));
        let handle = platform.create_window(&desc(WindowFlags::VISIBLE)).unwrap();

        platform.show_window(handle, ShowCommand::Maximize);
        assert_eq!(platform.client_size(handle), Some(Extent2D::new(800, 600)));
        platform.show_window(handle, ShowCommand::Minimize);
        assert_eq!(platform.client_size(handle), Some(Extent2D::ZERO));
        assert_eq!(platform.window(handle).unwrap().restored, Extent2D::new(640, 480));
        assert_eq!(platform.pending_messages(), 2);
    }

    #[test]
    fn test_destroy_drops_pending_messages() {
        let mut platform = HeadlessPlatform::new();
        let handle = platform.create_window(&desc(WindowFlags::VISIBLE)).unwrap();
        platform.post(handle, NativeMessage::CloseRequested);
        platform.destroy_window(handle);
        assert_eq!(platform.pending_messages(), 0);
        assert_eq!(platform.client_size(handle), None);
    }

    #[test]
    fn test_pump_without_dispatcher_defaults() {
        let mut platform = HeadlessPlatform::new();
        let handle = platform.create_window(&desc(WindowFlags::VISIBLE)).unwrap();
        platform.post(handle, NativeMessage::CloseRequested);
        platform.pump();
        assert_eq!(platform.replies(), &[(handle, Reply::Default)]);
    }

    #[test]
    fn test_required_extensions() {
        let platform = HeadlessPlatform::new();
        let extensions = platform.required_extensions().unwrap();
        let names: Vec<_> = extensions.iter().map(|name| name.to_str().unwrap()).collect();
        assert_eq!(names, vec!["VK_KHR_surface", "VK_EXT_headless_surface"]);
    }
}
