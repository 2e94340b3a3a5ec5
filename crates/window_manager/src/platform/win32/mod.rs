//! Native Windows backend
//!
//! One window class is registered per platform. Every window it creates runs
//! through [`window_proc`], which finds the platform's [`Dispatcher`] in the
//! window's user data, reduces the message to a [`NativeMessage`] and turns
//! the translator's [`Reply`] back into an `LRESULT`.

mod drop_target;

use super::{
    NativeButton, NativeHandle, NativeHitRegion, NativeHost, NativeMessage, NativeWindowDesc, Platform,
    PlatformCapabilities, RawKey, Reply, ShowCommand, SizeKind,
};
use crate::dnd::DropTarget;
use crate::foundation::{Extent2D, Point2D, Vector2};
use crate::input::{InputModifiers, VirtualKey};
use crate::manager::{Dispatcher, WindowError, WindowResult};
use crate::window::CornerPreference;
use ash::vk;
use drop_target::OleDropTarget;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, Win32WindowHandle, WindowsDisplayHandle};
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_void, CStr, CString};
use std::rc::Rc;
use windows::core::{HSTRING, PCWSTR};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Dwm::{
    DwmSetWindowAttribute, DWMWA_WINDOW_CORNER_PREFERENCE, DWMWCP_DEFAULT, DWMWCP_DONOTROUND, DWMWCP_ROUND,
    DWMWCP_ROUNDSMALL, DWM_WINDOW_CORNER_PREFERENCE,
};
use windows::Win32::Graphics::Gdi::ScreenToClient;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Ole::{IDropTarget, OleInitialize, OleUninitialize, RegisterDragDrop, RevokeDragDrop};
use windows::Win32::UI::HiDpi::GetDpiForWindow;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetKeyState, SetFocus, TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT, VK_CAPITAL, VK_CONTROL, VK_LWIN, VK_MENU,
    VK_NUMLOCK, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetClientRect, GetCursorPos,
    GetSystemMetrics, GetWindowLongPtrW, LoadCursorW, PeekMessageW, RegisterClassW, SetWindowLongPtrW,
    ShowWindow, TranslateMessage, UnregisterClassW, CREATESTRUCTW, GWLP_USERDATA, HTBOTTOM, HTCAPTION, HTCLIENT,
    HTCLOSE, HTLEFT, HTMAXBUTTON, HTMINBUTTON, HTRIGHT, HTTOP, IDC_ARROW, MSG, PM_REMOVE, SHOW_WINDOW_CMD,
    SIZE_MAXIMIZED, SIZE_MINIMIZED, SM_CXSCREEN, SM_CYSCREEN, SW_HIDE, SW_MAXIMIZE, SW_MINIMIZE, SW_SHOW,
    WINDOW_EX_STYLE, WINDOW_STYLE, WM_CHAR, WM_CLOSE, WM_KEYDOWN, WM_KEYUP, WM_KILLFOCUS, WM_LBUTTONDOWN,
    WM_LBUTTONUP, WM_MBUTTONDOWN, WM_MBUTTONUP, WM_MOUSEHOVER, WM_MOUSELEAVE, WM_MOUSEMOVE, WM_MOUSEWHEEL,
    WM_NCCREATE, WM_NCDESTROY, WM_NCHITTEST, WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SETFOCUS, WM_SIZE, WM_SYSKEYDOWN,
    WM_SYSKEYUP, WM_XBUTTONDOWN, WM_XBUTTONUP, WNDCLASSW, WS_CAPTION, WS_EX_NOREDIRECTIONBITMAP, WS_EX_TOPMOST,
    WS_MAXIMIZEBOX, WS_MINIMIZEBOX, WS_OVERLAPPED, WS_POPUP, WS_SIZEBOX, WS_SYSMENU,
};

const WHEEL_DELTA: f32 = 120.0;
const KF_REPEAT: u32 = 0x4000;

/// State every window procedure call reads through `GWLP_USERDATA`.
///
/// Boxed by the platform so its address stays fixed while windows exist.
#[derive(Default)]
struct WndContext {
    dispatcher: RefCell<Option<Dispatcher>>,
}

/// Arms `WM_MOUSELEAVE` delivery
struct Win32Host;

impl NativeHost for Win32Host {
    fn track_mouse_leave(&self, handle: NativeHandle) -> bool {
        let mut event = TRACKMOUSEEVENT {
            cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
            dwFlags: TME_LEAVE,
            hwndTrack: to_hwnd(handle),
            dwHoverTime: 0,
        };
        unsafe { TrackMouseEvent(&mut event) }.is_ok()
    }
}

struct Win32Window {
    hwnd: HWND,
    ole_target: Option<IDropTarget>,
}

/// Win32 window backend
pub struct Win32Platform {
    instance: HINSTANCE,
    class_name: HSTRING,
    windows: HashMap<NativeHandle, Win32Window>,
    context: Box<WndContext>,
    ole_initialized: bool,
}

impl Win32Platform {
    /// Register the window class and initialize OLE for drag and drop
    pub fn new(class_name: &str) -> WindowResult<Self> {
        let module = unsafe { GetModuleHandleW(None) }
            .map_err(|e| WindowError::PlatformInit(format!("GetModuleHandleW failed: {e}")))?;
        let instance = HINSTANCE(module.0);
        let class_name = HSTRING::from(class_name);

        let ole_initialized = match unsafe { OleInitialize(None) } {
            Ok(()) => true,
            Err(e) => {
                log::warn!("OleInitialize failed, drag and drop disabled: {e}");
                false
            }
        };

        let class = WNDCLASSW {
            lpfnWndProc: Some(window_proc),
            hInstance: instance,
            lpszClassName: PCWSTR(class_name.as_ptr()),
            hCursor: unsafe { LoadCursorW(None, IDC_ARROW) }.unwrap_or_default(),
            ..Default::default()
        };
        if unsafe { RegisterClassW(&class) } == 0 {
            if ole_initialized {
                unsafe { OleUninitialize() };
            }
            return Err(WindowError::PlatformInit(format!(
                "RegisterClassW failed for '{class_name}'"
            )));
        }

        log::info!("Win32 window class '{}' registered", class_name);
        Ok(Self {
            instance,
            class_name,
            windows: HashMap::new(),
            context: Box::default(),
            ole_initialized,
        })
    }

    fn hwnd(&self, handle: NativeHandle) -> Option<HWND> {
        self.windows.get(&handle).map(|window| window.hwnd)
    }
}

fn to_handle(hwnd: HWND) -> NativeHandle {
    NativeHandle::from_raw(hwnd.0 as usize as u64)
}

fn to_hwnd(handle: NativeHandle) -> HWND {
    HWND(handle.raw() as usize as *mut c_void)
}

fn window_style(desc: &NativeWindowDesc) -> (WINDOW_EX_STYLE, WINDOW_STYLE) {
    let mut style = WS_SYSMENU;
    if desc.style.resizable {
        style |= WS_SIZEBOX;
    }
    if desc.style.popup {
        style |= WS_POPUP;
    } else {
        style |= WS_OVERLAPPED | WS_CAPTION;
    }
    if desc.style.caption_buttons {
        style |= WS_MINIMIZEBOX | WS_MAXIMIZEBOX;
    }

    let mut ex_style = WINDOW_EX_STYLE::default();
    if desc.style.topmost {
        ex_style |= WS_EX_TOPMOST;
    }
    if desc.style.transparent {
        ex_style |= WS_EX_NOREDIRECTIONBITMAP;
    }
    (ex_style, style)
}

fn apply_corners(hwnd: HWND, corners: CornerPreference) {
    let preference: DWM_WINDOW_CORNER_PREFERENCE = match corners {
        CornerPreference::Default => DWMWCP_DEFAULT,
        CornerPreference::DoNotRound => DWMWCP_DONOTROUND,
        CornerPreference::Round => DWMWCP_ROUND,
        CornerPreference::RoundSmall => DWMWCP_ROUNDSMALL,
    };
    let result = unsafe {
        DwmSetWindowAttribute(
            hwnd,
            DWMWA_WINDOW_CORNER_PREFERENCE,
            std::ptr::from_ref(&preference).cast(),
            std::mem::size_of::<DWM_WINDOW_CORNER_PREFERENCE>() as u32,
        )
    };
    if let Err(e) = result {
        // Not supported before Windows 11
        log::debug!("corner preference not applied: {e}");
    }
}

impl Platform for Win32Platform {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn capabilities(&self) -> PlatformCapabilities {
        let mut capabilities = PlatformCapabilities::HIT_TEST | PlatformCapabilities::VULKAN_SURFACE;
        if self.ole_initialized {
            capabilities |=
                PlatformCapabilities::DRAG_SESSIONS | PlatformCapabilities::FILE_DROP | PlatformCapabilities::TEXT_DROP;
        }
        capabilities
    }

    fn attach(&mut self, dispatcher: Dispatcher) {
        *self.context.dispatcher.borrow_mut() = Some(dispatcher);
    }

    fn primary_display_extent(&self) -> Option<Extent2D> {
        let width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
        let height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
        (width > 0 && height > 0).then(|| Extent2D::new(width as u32, height as u32))
    }

    fn create_window(&mut self, desc: &NativeWindowDesc) -> WindowResult<NativeHandle> {
        let (ex_style, style) = window_style(desc);
        let title = HSTRING::from(desc.title.as_str());
        let context: *const WndContext = &*self.context;

        let hwnd = unsafe {
            CreateWindowExW(
                ex_style,
                &self.class_name,
                &title,
                style,
                desc.position.x,
                desc.position.y,
                desc.size.width as i32,
                desc.size.height as i32,
                None,
                None,
                Some(self.instance),
                Some(context.cast()),
            )
        }
        .map_err(|e| WindowError::NativeCreationFailed(format!("CreateWindowExW failed: {e}")))?;

        apply_corners(hwnd, desc.corners);

        let handle = to_handle(hwnd);
        self.windows.insert(handle, Win32Window { hwnd, ole_target: None });
        Ok(handle)
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        let Some(window) = self.windows.remove(&handle) else {
            return;
        };
        if window.ole_target.is_some() {
            let _ = unsafe { RevokeDragDrop(window.hwnd) };
        }
        if let Err(e) = unsafe { DestroyWindow(window.hwnd) } {
            log::warn!("DestroyWindow failed for {:?}: {e}", handle);
        }
    }

    fn show_window(&mut self, handle: NativeHandle, command: ShowCommand) {
        let Some(hwnd) = self.hwnd(handle) else {
            return;
        };
        let command: SHOW_WINDOW_CMD = match command {
            ShowCommand::Show => SW_SHOW,
            ShowCommand::Hide => SW_HIDE,
            ShowCommand::Minimize => SW_MINIMIZE,
            ShowCommand::Maximize => SW_MAXIMIZE,
        };
        // Returns the previous visibility, not an error
        let _ = unsafe { ShowWindow(hwnd, command) };
    }

    fn focus_window(&mut self, handle: NativeHandle) {
        if let Some(hwnd) = self.hwnd(handle) {
            if let Err(e) = unsafe { SetFocus(Some(hwnd)) } {
                log::debug!("SetFocus failed for {:?}: {e}", handle);
            }
        }
    }

    fn client_size(&self, handle: NativeHandle) -> Option<Extent2D> {
        let hwnd = self.hwnd(handle)?;
        let mut rect = RECT::default();
        unsafe { GetClientRect(hwnd, &mut rect) }.ok()?;
        Some(Extent2D::new(
            (rect.right - rect.left).max(0) as u32,
            (rect.bottom - rect.top).max(0) as u32,
        ))
    }

    fn client_position(&self, handle: NativeHandle) -> Option<Point2D> {
        let hwnd = self.hwnd(handle)?;
        let mut rect = RECT::default();
        unsafe { GetClientRect(hwnd, &mut rect) }.ok()?;
        Some(Point2D::new(rect.left, rect.top))
    }

    fn cursor_position(&self, handle: NativeHandle) -> Option<Vector2> {
        let hwnd = self.hwnd(handle)?;
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }.ok()?;
        unsafe { ScreenToClient(hwnd, &mut point) }
            .as_bool()
            .then(|| Vector2::new(point.x as f32, point.y as f32))
    }

    fn dpi(&self, handle: NativeHandle) -> Option<f32> {
        let dpi = unsafe { GetDpiForWindow(self.hwnd(handle)?) };
        (dpi > 0).then(|| dpi as f32)
    }

    fn register_drop_target(&mut self, handle: NativeHandle, target: Rc<DropTarget>) -> WindowResult<()> {
        if !self.ole_initialized {
            return Err(WindowError::DropRegistration("OLE is not initialized".to_string()));
        }
        let window = self
            .windows
            .get_mut(&handle)
            .ok_or_else(|| WindowError::DropRegistration(format!("no Win32 window {handle:?}")))?;

        let ole_target = OleDropTarget::create(window.hwnd, target);
        unsafe { RegisterDragDrop(window.hwnd, &ole_target) }
            .map_err(|e| WindowError::DropRegistration(format!("RegisterDragDrop failed: {e}")))?;
        window.ole_target = Some(ole_target);
        Ok(())
    }

    fn revoke_drop_target(&mut self, handle: NativeHandle) {
        if let Some(window) = self.windows.get_mut(&handle) {
            if window.ole_target.take().is_some() {
                let _ = unsafe { RevokeDragDrop(window.hwnd) };
            }
        }
    }

    fn pump(&mut self) {
        let mut message = MSG::default();
        while unsafe { PeekMessageW(&mut message, None, 0, 0, PM_REMOVE) }.as_bool() {
            unsafe {
                let _ = TranslateMessage(&message);
                DispatchMessageW(&message);
            }
        }
    }

    fn required_extensions(&self) -> WindowResult<Vec<CString>> {
        let display = RawDisplayHandle::Windows(WindowsDisplayHandle::empty());
        let names = ash_window::enumerate_required_extensions(display)
            .map_err(|e| WindowError::VulkanUnavailable(format!("{e:?}")))?;
        Ok(names
            .iter()
            .map(|&name| unsafe { CStr::from_ptr(name) }.to_owned())
            .collect())
    }

    fn create_surface(
        &self,
        handle: NativeHandle,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> WindowResult<vk::SurfaceKHR> {
        let hwnd = self
            .hwnd(handle)
            .ok_or_else(|| WindowError::SurfaceCreationFailed(format!("no Win32 window {handle:?}")))?;

        let mut window_handle = Win32WindowHandle::empty();
        window_handle.hwnd = hwnd.0;
        window_handle.hinstance = self.instance.0;

        unsafe {
            ash_window::create_surface(
                entry,
                instance,
                RawDisplayHandle::Windows(WindowsDisplayHandle::empty()),
                RawWindowHandle::Win32(window_handle),
                None,
            )
        }
        .map_err(|e| WindowError::SurfaceCreationFailed(format!("vkCreateWin32SurfaceKHR: {e:?}")))
    }
}

impl Drop for Win32Platform {
    fn drop(&mut self) {
        let handles: Vec<_> = self.windows.keys().copied().collect();
        for handle in handles {
            self.destroy_window(handle);
        }
        let _ = unsafe { UnregisterClassW(&self.class_name, Some(self.instance)) };
        if self.ole_initialized {
            unsafe { OleUninitialize() };
        }
    }
}

impl std::fmt::Debug for Win32Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Win32Platform")
            .field("class_name", &self.class_name)
            .field("windows", &self.windows.len())
            .field("ole", &self.ole_initialized)
            .finish_non_exhaustive()
    }
}

const fn loword(value: usize) -> u16 {
    (value & 0xFFFF) as u16
}

const fn hiword(value: usize) -> u16 {
    ((value >> 16) & 0xFFFF) as u16
}

/// Signed client coordinates packed into an `LPARAM`
fn lparam_point(lparam: LPARAM) -> POINT {
    let raw = lparam.0 as usize;
    POINT {
        x: i32::from(loword(raw) as i16),
        y: i32::from(hiword(raw) as i16),
    }
}

fn key_down(key: u16) -> bool {
    unsafe { GetKeyState(i32::from(key)) } < 0
}

fn key_toggled(key: u16) -> bool {
    unsafe { GetKeyState(i32::from(key)) } & 0x0001 != 0
}

fn sample_modifiers() -> InputModifiers {
    let mut modifiers = InputModifiers::empty();
    modifiers.set(InputModifiers::SHIFT, key_down(VK_SHIFT.0));
    modifiers.set(InputModifiers::CONTROL, key_down(VK_CONTROL.0));
    modifiers.set(InputModifiers::ALT, key_down(VK_MENU.0));
    modifiers.set(InputModifiers::SUPER, key_down(VK_LWIN.0) || key_down(VK_RWIN.0));
    modifiers.set(InputModifiers::CAPS_LOCK, key_toggled(VK_CAPITAL.0));
    modifiers.set(InputModifiers::NUM_LOCK, key_toggled(VK_NUMLOCK.0));
    modifiers
}

fn region_from_ht(hit: isize) -> NativeHitRegion {
    match hit as u32 {
        HTCLIENT => NativeHitRegion::Client,
        HTCAPTION => NativeHitRegion::Caption,
        HTTOP => NativeHitRegion::Top,
        HTLEFT => NativeHitRegion::Left,
        HTRIGHT => NativeHitRegion::Right,
        HTBOTTOM => NativeHitRegion::Bottom,
        HTCLOSE => NativeHitRegion::Close,
        HTMINBUTTON => NativeHitRegion::MinButton,
        HTMAXBUTTON => NativeHitRegion::MaxButton,
        _ => NativeHitRegion::Other(hit as i32),
    }
}

fn ht_from_region(region: NativeHitRegion) -> isize {
    let code = match region {
        NativeHitRegion::Client => HTCLIENT,
        NativeHitRegion::Caption => HTCAPTION,
        NativeHitRegion::Top => HTTOP,
        NativeHitRegion::Left => HTLEFT,
        NativeHitRegion::Right => HTRIGHT,
        NativeHitRegion::Bottom => HTBOTTOM,
        NativeHitRegion::Close => HTCLOSE,
        NativeHitRegion::MinButton => HTMINBUTTON,
        NativeHitRegion::MaxButton => HTMAXBUTTON,
        NativeHitRegion::Other(code) => return code as isize,
    };
    code as isize
}

/// Reduce a window message to what the translator understands
fn native_message(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> Option<NativeMessage> {
    let button = |button, pressed| NativeMessage::MouseButton {
        button,
        pressed,
        modifiers: sample_modifiers(),
    };
    let message = match msg {
        WM_MOUSEMOVE => {
            let point = lparam_point(lparam);
            NativeMessage::MouseMove {
                position: Vector2::new(point.x as f32, point.y as f32),
            }
        }
        WM_MOUSELEAVE => NativeMessage::MouseLeave,
        WM_LBUTTONDOWN | WM_LBUTTONUP => button(NativeButton::Left, msg == WM_LBUTTONDOWN),
        WM_RBUTTONDOWN | WM_RBUTTONUP => button(NativeButton::Right, msg == WM_RBUTTONDOWN),
        WM_MBUTTONDOWN | WM_MBUTTONUP => button(NativeButton::Middle, msg == WM_MBUTTONDOWN),
        WM_XBUTTONDOWN | WM_XBUTTONUP => {
            let which = hiword(wparam.0) as u8;
            button(NativeButton::Extended(which), msg == WM_XBUTTONDOWN)
        }
        WM_MOUSEWHEEL => {
            // Wheel positions arrive in screen coordinates
            let mut point = lparam_point(lparam);
            let _ = unsafe { ScreenToClient(hwnd, &mut point) };
            let delta = f32::from(hiword(wparam.0) as i16) / WHEEL_DELTA;
            NativeMessage::MouseWheel {
                position: Vector2::new(point.x as f32, point.y as f32),
                delta: Vector2::new(0.0, delta),
            }
        }
        WM_KEYDOWN | WM_KEYUP | WM_SYSKEYDOWN | WM_SYSKEYUP => {
            let flags = u32::from(hiword(lparam.0 as usize));
            NativeMessage::Key {
                key: RawKey::Virtual(VirtualKey::from_keystroke(loword(wparam.0), lparam.0)),
                pressed: msg == WM_KEYDOWN || msg == WM_SYSKEYDOWN,
                repeat: flags & KF_REPEAT == KF_REPEAT,
                modifiers: sample_modifiers(),
                system: msg == WM_SYSKEYDOWN || msg == WM_SYSKEYUP,
            }
        }
        WM_CHAR => NativeMessage::Char {
            code_unit: loword(wparam.0),
        },
        WM_SIZE => {
            let kind = match wparam.0 as u32 {
                SIZE_MINIMIZED => SizeKind::Minimized,
                SIZE_MAXIMIZED => SizeKind::Maximized,
                _ => SizeKind::Restored,
            };
            let raw = lparam.0 as usize;
            NativeMessage::Resized {
                client: Extent2D::new(u32::from(loword(raw)), u32::from(hiword(raw))),
                kind,
            }
        }
        WM_SETFOCUS => NativeMessage::FocusChanged { focused: true },
        WM_KILLFOCUS => NativeMessage::FocusChanged { focused: false },
        WM_CLOSE => NativeMessage::CloseRequested,
        _ => return None,
    };
    Some(message)
}

unsafe extern "system" fn window_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if msg == WM_NCCREATE {
        let create = lparam.0 as *const CREATESTRUCTW;
        if !create.is_null() {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, (*create).lpCreateParams as isize);
        }
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }
    if msg == WM_NCDESTROY {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    let context = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const WndContext;
    // Clone out so no borrow is held while the translator runs
    let dispatcher = context.as_ref().and_then(|context| context.dispatcher.borrow().clone());
    let Some(dispatcher) = dispatcher else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };
    let handle = to_handle(hwnd);

    match msg {
        WM_NCHITTEST => {
            let hit = DefWindowProcW(hwnd, msg, wparam, lparam);
            let mut point = lparam_point(lparam);
            let _ = ScreenToClient(hwnd, &mut point);
            let query = NativeMessage::HitTest {
                point: Vector2::new(point.x as f32, point.y as f32),
                os_region: region_from_ht(hit.0),
            };
            match dispatcher.dispatch(handle, &query, &Win32Host) {
                Reply::HitRegion(region) => LRESULT(ht_from_region(region)),
                Reply::Handled | Reply::Default => hit,
            }
        }
        WM_MOUSEHOVER => LRESULT(0),
        _ => match native_message(hwnd, msg, wparam, lparam) {
            Some(message) => match dispatcher.dispatch(handle, &message, &Win32Host) {
                // Size and focus changes still need default processing
                Reply::Handled if !matches!(msg, WM_SIZE | WM_SETFOCUS | WM_KILLFOCUS) => LRESULT(0),
                _ => DefWindowProcW(hwnd, msg, wparam, lparam),
            },
            None => DefWindowProcW(hwnd, msg, wparam, lparam),
        },
    }
}
