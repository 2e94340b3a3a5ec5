//! GLFW-based desktop backend
//!
//! Windows are created without a client API so they can present through
//! Vulkan. GLFW has no non-client hit testing and only reports completed file
//! drops, so a dropped file list is replayed to the window's drop target as a
//! drag enter immediately followed by a drop at the pointer position.

use super::{
    NativeButton, NativeHandle, NativeHost, NativeMessage, NativeWindowDesc, Platform, PlatformCapabilities,
    RawKey, ShowCommand, SizeKind,
};
use crate::dnd::{DropTarget, OwnedDataSource};
use crate::foundation::{Extent2D, Point2D, Vector2};
use crate::input::{InputKey, InputModifiers};
use crate::manager::{Dispatcher, WindowError, WindowResult};
use ash::vk;
use std::collections::HashMap;
use std::ffi::CString;
use std::path::PathBuf;
use std::rc::Rc;

/// GLFW reports pointer leave on its own, so tracking is always armed
#[derive(Debug, Clone, Copy, Default)]
struct GlfwHost;

impl NativeHost for GlfwHost {
    fn track_mouse_leave(&self, _handle: NativeHandle) -> bool {
        true
    }
}

struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    drop_target: Option<Rc<DropTarget>>,
}

/// Work collected from GLFW before anything is delivered
enum Pending {
    Message(NativeMessage),
    FileDrop { paths: Vec<PathBuf>, position: Vector2 },
}

/// GLFW window backend
pub struct GlfwPlatform {
    glfw: glfw::Glfw,
    windows: HashMap<NativeHandle, GlfwWindow>,
    dispatcher: Option<Dispatcher>,
    next_handle: u64,
    display: Option<Extent2D>,
}

impl GlfwPlatform {
    /// Initialize GLFW
    pub fn new() -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::PlatformInit(format!("GLFW initialization failed: {e:?}")))?;

        let display = glfw.with_primary_monitor(|_, monitor| {
            monitor
                .and_then(|monitor| monitor.get_video_mode())
                .map(|mode| Extent2D::new(mode.width, mode.height))
        });

        if !glfw.vulkan_supported() {
            log::warn!("GLFW reports no Vulkan loader; surface creation will fail");
        }

        log::info!("GLFW {} initialized", glfw::get_version_string());
        Ok(Self {
            glfw,
            windows: HashMap::new(),
            dispatcher: None,
            next_handle: 1,
            display,
        })
    }

    fn window(&self, handle: NativeHandle) -> Option<&glfw::PWindow> {
        self.windows.get(&handle).map(|entry| &entry.window)
    }

    fn deliver(&self, handle: NativeHandle, pending: Pending) {
        let Some(dispatcher) = &self.dispatcher else {
            return;
        };
        match pending {
            Pending::Message(message) => {
                dispatcher.dispatch(handle, &message, &GlfwHost);
            }
            Pending::FileDrop { paths, position } => {
                let Some(target) = self.windows.get(&handle).and_then(|entry| entry.drop_target.clone()) else {
                    log::trace!("file drop on {:?} without a drop target", handle);
                    return;
                };
                let source = OwnedDataSource::new().with_files(paths);
                if target.drag_enter(position, &source) != crate::dnd::DropEffect::None {
                    target.drag_drop(position, Some(&source));
                }
            }
        }
    }
}

impl Platform for GlfwPlatform {
    fn name(&self) -> &'static str {
        "glfw"
    }

    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities::FILE_DROP | PlatformCapabilities::VULKAN_SURFACE
    }

    fn attach(&mut self, dispatcher: Dispatcher) {
        self.dispatcher = Some(dispatcher);
    }

    fn primary_display_extent(&self) -> Option<Extent2D> {
        self.display
    }

    fn create_window(&mut self, desc: &NativeWindowDesc) -> WindowResult<NativeHandle> {
        use glfw::WindowHint;

        self.glfw.default_window_hints();
        // Configure for Vulkan (no OpenGL context)
        self.glfw.window_hint(WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        self.glfw.window_hint(WindowHint::Decorated(desc.style.decorated));
        self.glfw.window_hint(WindowHint::Resizable(desc.style.resizable));
        self.glfw.window_hint(WindowHint::Floating(desc.style.topmost));
        self.glfw.window_hint(WindowHint::TransparentFramebuffer(desc.style.transparent));
        // Shown by the manager once registered
        self.glfw.window_hint(WindowHint::Visible(false));

        let (mut window, events) = self
            .glfw
            .create_window(desc.size.width, desc.size.height, &desc.title, glfw::WindowMode::Windowed)
            .ok_or_else(|| WindowError::NativeCreationFailed(format!("glfwCreateWindow failed for '{}'", desc.title)))?;

        window.set_pos(desc.position.x, desc.position.y);
        window.set_all_polling(true);

        let handle = NativeHandle::from_raw(self.next_handle);
        self.next_handle += 1;
        self.windows.insert(
            handle,
            GlfwWindow {
                window,
                events,
                drop_target: None,
            },
        );
        Ok(handle)
    }

    fn destroy_window(&mut self, handle: NativeHandle) {
        if let Some(mut entry) = self.windows.remove(&handle) {
            entry.window.set_should_close(true);
            // PWindow destroys the native window on drop
        }
    }

    fn show_window(&mut self, handle: NativeHandle, command: ShowCommand) {
        let Some(entry) = self.windows.get_mut(&handle) else {
            return;
        };
        match command {
            ShowCommand::Show => entry.window.show(),
            ShowCommand::Hide => entry.window.hide(),
            ShowCommand::Minimize => entry.window.iconify(),
            ShowCommand::Maximize => entry.window.maximize(),
        }
    }

    fn focus_window(&mut self, handle: NativeHandle) {
        if let Some(entry) = self.windows.get_mut(&handle) {
            entry.window.focus();
        }
    }

    fn client_size(&self, handle: NativeHandle) -> Option<Extent2D> {
        let (width, height) = self.window(handle)?.get_size();
        Some(Extent2D::new(width.max(0) as u32, height.max(0) as u32))
    }

    fn client_position(&self, handle: NativeHandle) -> Option<Point2D> {
        self.window(handle).map(|_| Point2D::new(0, 0))
    }

    fn cursor_position(&self, handle: NativeHandle) -> Option<Vector2> {
        let (x, y) = self.window(handle)?.get_cursor_pos();
        Some(Vector2::new(x as f32, y as f32))
    }

    fn dpi(&self, handle: NativeHandle) -> Option<f32> {
        let (scale, _) = self.window(handle)?.get_content_scale();
        (scale > 0.0).then(|| scale * 96.0)
    }

    fn register_drop_target(&mut self, handle: NativeHandle, target: Rc<DropTarget>) -> WindowResult<()> {
        let entry = self
            .windows
            .get_mut(&handle)
            .ok_or_else(|| WindowError::DropRegistration(format!("no GLFW window {handle:?}")))?;
        entry.drop_target = Some(target);
        Ok(())
    }

    fn revoke_drop_target(&mut self, handle: NativeHandle) {
        if let Some(entry) = self.windows.get_mut(&handle) {
            entry.drop_target = None;
        }
    }

    fn pump(&mut self) {
        self.glfw.poll_events();

        let mut pending = Vec::new();
        for (&handle, entry) in &mut self.windows {
            for (_, event) in glfw::flush_messages(&entry.events) {
                if matches!(event, glfw::WindowEvent::Close) {
                    // Closing is advisory; the application decides
                    entry.window.set_should_close(false);
                }
                let size = entry.window.get_size();
                let cursor = entry.window.get_cursor_pos();
                translate_event(event, size, cursor, |item| pending.push((handle, item)));
            }
        }

        for (handle, item) in pending {
            self.deliver(handle, item);
        }
    }

    fn required_extensions(&self) -> WindowResult<Vec<CString>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::VulkanUnavailable("GLFW found no Vulkan surface support".to_string()))?
            .into_iter()
            .map(|name| CString::new(name).map_err(|e| WindowError::VulkanUnavailable(e.to_string())))
            .collect()
    }

    fn create_surface(
        &self,
        handle: NativeHandle,
        _entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> WindowResult<vk::SurfaceKHR> {
        let window = self
            .window(handle)
            .ok_or_else(|| WindowError::SurfaceCreationFailed(format!("no GLFW window {handle:?}")))?;
        let mut surface = vk::SurfaceKHR::null();
        let result = window.create_window_surface(instance.handle(), std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::SurfaceCreationFailed(format!("glfwCreateWindowSurface: {result:?}")))
        }
    }
}

impl std::fmt::Debug for GlfwPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlfwPlatform")
            .field("windows", &self.windows.len())
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

fn translate_event(
    event: glfw::WindowEvent,
    (width, height): (i32, i32),
    (cursor_x, cursor_y): (f64, f64),
    mut emit: impl FnMut(Pending),
) {
    let client = Extent2D::new(width.max(0) as u32, height.max(0) as u32);
    let cursor = Vector2::new(cursor_x as f32, cursor_y as f32);
    let message = match event {
        glfw::WindowEvent::CursorPos(x, y) => NativeMessage::MouseMove {
            position: Vector2::new(x as f32, y as f32),
        },
        glfw::WindowEvent::CursorEnter(false) => NativeMessage::MouseLeave,
        glfw::WindowEvent::MouseButton(button, action, modifiers) => NativeMessage::MouseButton {
            button: map_button(button),
            pressed: action != glfw::Action::Release,
            modifiers: map_modifiers(modifiers),
        },
        glfw::WindowEvent::Scroll(x, y) => NativeMessage::MouseWheel {
            position: cursor,
            delta: Vector2::new(x as f32, y as f32),
        },
        glfw::WindowEvent::Key(key, _, action, modifiers) => NativeMessage::Key {
            key: RawKey::Mapped(map_key(key)),
            pressed: action != glfw::Action::Release,
            repeat: action == glfw::Action::Repeat,
            modifiers: map_modifiers(modifiers),
            system: false,
        },
        glfw::WindowEvent::Char(character) => {
            let mut units = [0u16; 2];
            for &code_unit in character.encode_utf16(&mut units).iter() {
                emit(Pending::Message(NativeMessage::Char { code_unit }));
            }
            return;
        }
        glfw::WindowEvent::Size(_, _) => NativeMessage::Resized {
            client,
            kind: SizeKind::Restored,
        },
        glfw::WindowEvent::Iconify(true) => NativeMessage::Resized {
            client: Extent2D::ZERO,
            kind: SizeKind::Minimized,
        },
        glfw::WindowEvent::Maximize(true) => NativeMessage::Resized {
            client,
            kind: SizeKind::Maximized,
        },
        glfw::WindowEvent::Focus(focused) => NativeMessage::FocusChanged { focused },
        glfw::WindowEvent::Close => NativeMessage::CloseRequested,
        glfw::WindowEvent::FileDrop(paths) => {
            emit(Pending::FileDrop { paths, position: cursor });
            return;
        }
        other => {
            log::trace!("ignored GLFW event {:?}", other);
            return;
        }
    };
    emit(Pending::Message(message));
}

fn map_button(button: glfw::MouseButton) -> NativeButton {
    match button {
        glfw::MouseButton::Button1 => NativeButton::Left,
        glfw::MouseButton::Button2 => NativeButton::Right,
        glfw::MouseButton::Button3 => NativeButton::Middle,
        glfw::MouseButton::Button4 => NativeButton::Extended(1),
        glfw::MouseButton::Button5 => NativeButton::Extended(2),
        glfw::MouseButton::Button6 => NativeButton::Extended(3),
        glfw::MouseButton::Button7 => NativeButton::Extended(4),
        glfw::MouseButton::Button8 => NativeButton::Extended(5),
    }
}

fn map_modifiers(modifiers: glfw::Modifiers) -> InputModifiers {
    let mut mapped = InputModifiers::empty();
    mapped.set(InputModifiers::SHIFT, modifiers.contains(glfw::Modifiers::Shift));
    mapped.set(InputModifiers::CONTROL, modifiers.contains(glfw::Modifiers::Control));
    mapped.set(InputModifiers::ALT, modifiers.contains(glfw::Modifiers::Alt));
    mapped.set(InputModifiers::SUPER, modifiers.contains(glfw::Modifiers::Super));
    mapped.set(InputModifiers::CAPS_LOCK, modifiers.contains(glfw::Modifiers::CapsLock));
    mapped.set(InputModifiers::NUM_LOCK, modifiers.contains(glfw::Modifiers::NumLock));
    mapped
}

#[allow(clippy::too_many_lines)]
fn map_key(key: glfw::Key) -> InputKey {
    use glfw::Key as G;
    match key {
        G::A => InputKey::A,
        G::B => InputKey::B,
        G::C => InputKey::C,
        G::D => InputKey::D,
        G::E => InputKey::E,
        G::F => InputKey::F,
        G::G => InputKey::G,
        G::H => InputKey::H,
        G::I => InputKey::I,
        G::J => InputKey::J,
        G::K => InputKey::K,
        G::L => InputKey::L,
        G::M => InputKey::M,
        G::N => InputKey::N,
        G::O => InputKey::O,
        G::P => InputKey::P,
        G::Q => InputKey::Q,
        G::R => InputKey::R,
        G::S => InputKey::S,
        G::T => InputKey::T,
        G::U => InputKey::U,
        G::V => InputKey::V,
        G::W => InputKey::W,
        G::X => InputKey::X,
        G::Y => InputKey::Y,
        G::Z => InputKey::Z,
        G::Num0 => InputKey::Zero,
        G::Num1 => InputKey::One,
        G::Num2 => InputKey::Two,
        G::Num3 => InputKey::Three,
        G::Num4 => InputKey::Four,
        G::Num5 => InputKey::Five,
        G::Num6 => InputKey::Six,
        G::Num7 => InputKey::Seven,
        G::Num8 => InputKey::Eight,
        G::Num9 => InputKey::Nine,
        G::F1 => InputKey::F1,
        G::F2 => InputKey::F2,
        G::F3 => InputKey::F3,
        G::F4 => InputKey::F4,
        G::F5 => InputKey::F5,
        G::F6 => InputKey::F6,
        G::F7 => InputKey::F7,
        G::F8 => InputKey::F8,
        G::F9 => InputKey::F9,
        G::F10 => InputKey::F10,
        G::F11 => InputKey::F11,
        G::F12 => InputKey::F12,
        G::F13 => InputKey::F13,
        G::F14 => InputKey::F14,
        G::F15 => InputKey::F15,
        G::F16 => InputKey::F16,
        G::F17 => InputKey::F17,
        G::F18 => InputKey::F18,
        G::F19 => InputKey::F19,
        G::F20 => InputKey::F20,
        G::F21 => InputKey::F21,
        G::F22 => InputKey::F22,
        G::F23 => InputKey::F23,
        G::F24 => InputKey::F24,
        G::F25 => InputKey::F25,
        G::Space => InputKey::Space,
        G::Apostrophe => InputKey::Apostrophe,
        G::Comma => InputKey::Comma,
        G::Minus => InputKey::Minus,
        G::Period => InputKey::Period,
        G::Slash => InputKey::Slash,
        G::Semicolon => InputKey::Semicolon,
        G::Equal => InputKey::Equal,
        G::LeftBracket => InputKey::LeftBracket,
        G::Backslash => InputKey::Backslash,
        G::RightBracket => InputKey::RightBracket,
        G::GraveAccent => InputKey::GraveAccent,
        G::Escape => InputKey::Escape,
        G::Enter => InputKey::Enter,
        G::Tab => InputKey::Tab,
        G::Backspace => InputKey::Backspace,
        G::Insert => InputKey::Insert,
        G::Delete => InputKey::Delete,
        G::Right => InputKey::Right,
        G::Left => InputKey::Left,
        G::Down => InputKey::Down,
        G::Up => InputKey::Up,
        G::PageUp => InputKey::PageUp,
        G::PageDown => InputKey::PageDown,
        G::Home => InputKey::Home,
        G::End => InputKey::End,
        G::CapsLock => InputKey::CapsLock,
        G::ScrollLock => InputKey::ScrollLock,
        G::NumLock => InputKey::NumLock,
        G::PrintScreen => InputKey::PrintScreen,
        G::Pause => InputKey::Pause,
        G::LeftShift => InputKey::LeftShift,
        G::LeftControl => InputKey::LeftControl,
        G::LeftAlt => InputKey::LeftAlt,
        G::LeftSuper => InputKey::LeftSuper,
        G::RightShift => InputKey::RightShift,
        G::RightControl => InputKey::RightControl,
        G::RightAlt => InputKey::RightAlt,
        G::RightSuper => InputKey::RightSuper,
        G::Menu => InputKey::Menu,
        other => {
            log::trace!("unmapped GLFW key {:?}", other);
            InputKey::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(event: glfw::WindowEvent) -> Vec<NativeMessage> {
        let mut out = Vec::new();
        translate_event(event, (640, 480), (3.0, 4.0), |pending| {
            if let Pending::Message(message) = pending {
                out.push(message);
            }
        });
        out
    }

    #[test]
    fn test_char_outside_bmp_becomes_surrogate_pair() {
        let messages = collect(glfw::WindowEvent::Char('😀'));
        assert_eq!(
            messages,
            vec![
                NativeMessage::Char { code_unit: 0xD83D },
                NativeMessage::Char { code_unit: 0xDE00 },
            ]
        );
    }

    #[test]
    fn test_cursor_leave() {
        assert_eq!(collect(glfw::WindowEvent::CursorEnter(false)), vec![NativeMessage::MouseLeave]);
        assert!(collect(glfw::WindowEvent::CursorEnter(true)).is_empty());
    }

    #[test]
    fn test_iconify_reports_minimized() {
        assert_eq!(
            collect(glfw::WindowEvent::Iconify(true)),
            vec![NativeMessage::Resized {
                client: Extent2D::ZERO,
                kind: SizeKind::Minimized
            }]
        );
    }

    #[test]
    fn test_file_drop_uses_cursor() {
        let mut drops = Vec::new();
        translate_event(
            glfw::WindowEvent::FileDrop(vec![PathBuf::from("/a")]),
            (1, 1),
            (3.0, 4.0),
            |pending| {
                if let Pending::FileDrop { paths, position } = pending {
                    drops.push((paths, position));
                }
            },
        );
        assert_eq!(drops, vec![(vec![PathBuf::from("/a")], Vector2::new(3.0, 4.0))]);
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(map_key(glfw::Key::Num7), InputKey::Seven);
        assert_eq!(map_key(glfw::Key::RightAlt), InputKey::RightAlt);
        assert_eq!(map_key(glfw::Key::Kp5), InputKey::Unknown);
        assert_eq!(
            map_modifiers(glfw::Modifiers::Shift | glfw::Modifiers::Super),
            InputModifiers::SHIFT | InputModifiers::SUPER
        );
    }
}
