//! Native message → [`WindowEvent`] translation

use super::WindowEvent;
use crate::input::{map_virtual_key, CursorButton, InputKey, InputState};
use crate::manager::Shared;
use crate::platform::{NativeButton, NativeHandle, NativeHost, NativeMessage, RawKey, Reply, SizeKind};
use crate::window::{hit_test, WindowId};

/// Handle one message for the window behind `handle`
pub(crate) fn translate(
    shared: &Shared,
    handle: NativeHandle,
    message: &NativeMessage,
    host: &dyn NativeHost,
) -> Reply {
    let Some(window) = shared.window_id(handle) else {
        log::trace!("{:?} not managed, default handling for {:?}", handle, message);
        return match *message {
            NativeMessage::HitTest { os_region, .. } => Reply::HitRegion(os_region),
            _ => Reply::Default,
        };
    };

    match *message {
        NativeMessage::MouseMove { position } => pointer_moved(shared, window, handle, position, host),
        NativeMessage::MouseLeave => {
            let was_tracking = shared
                .registry
                .borrow_mut()
                .get_mut(window)
                .map_or(false, |record| std::mem::replace(&mut record.tracking_mouse, false));
            if was_tracking {
                push(shared, WindowEvent::CursorFocus { window, focused: false });
            }
            Reply::Handled
        }
        NativeMessage::MouseButton {
            button,
            pressed,
            modifiers,
        } => {
            push(
                shared,
                WindowEvent::CursorButton {
                    window,
                    button: map_button(button),
                    state: if pressed { InputState::Pressed } else { InputState::Released },
                    modifiers,
                },
            );
            Reply::Handled
        }
        NativeMessage::MouseWheel { position, delta } => {
            push(shared, WindowEvent::Scroll { window, position, delta });
            Reply::Handled
        }
        NativeMessage::Key {
            key,
            pressed,
            repeat,
            modifiers,
            system,
        } => {
            let key = resolve_key(key);
            let state = match (pressed, repeat) {
                (false, _) => InputState::Released,
                (true, true) => InputState::Repeat,
                (true, false) => InputState::Pressed,
            };
            push(shared, WindowEvent::Key { window, key, state, modifiers });
            // System keys still drive OS shortcuts
            if system {
                Reply::Default
            } else {
                Reply::Handled
            }
        }
        NativeMessage::Char { code_unit } => {
            push(shared, WindowEvent::Text { window, code_unit });
            Reply::Handled
        }
        NativeMessage::Resized { client, kind } => {
            match kind {
                SizeKind::Minimized => push(shared, WindowEvent::Minimize { window }),
                SizeKind::Maximized => {
                    push(shared, WindowEvent::Maximize { window });
                    push(shared, WindowEvent::Resize { window, size: client });
                }
                SizeKind::Restored => push(shared, WindowEvent::Resize { window, size: client }),
            }
            Reply::Handled
        }
        NativeMessage::FocusChanged { focused } => {
            push(shared, WindowEvent::KeyboardFocus { window, focused });
            Reply::Handled
        }
        NativeMessage::CloseRequested => {
            push(shared, WindowEvent::Close { window });
            Reply::Handled
        }
        NativeMessage::HitTest { point, os_region } => {
            let callback = shared.hit_test_callback(window);
            Reply::HitRegion(hit_test::resolve(os_region, point, callback.as_ref()))
        }
    }
}

fn push(shared: &Shared, event: WindowEvent) {
    shared.queue.borrow_mut().push(event);
}

fn pointer_moved(
    shared: &Shared,
    window: WindowId,
    handle: NativeHandle,
    position: crate::foundation::Vector2,
    host: &dyn NativeHost,
) -> Reply {
    let tracking = shared
        .registry
        .borrow()
        .get(window)
        .map_or(false, |record| record.tracking_mouse);

    if !tracking {
        if !host.track_mouse_leave(handle) {
            return Reply::Default;
        }
        if let Some(record) = shared.registry.borrow_mut().get_mut(window) {
            record.tracking_mouse = true;
        }
        push(shared, WindowEvent::CursorFocus { window, focused: true });
    }

    push(shared, WindowEvent::CursorMove { window, position });
    Reply::Handled
}

fn map_button(button: NativeButton) -> CursorButton {
    match button {
        NativeButton::Left => CursorButton::One,
        NativeButton::Right => CursorButton::Two,
        NativeButton::Middle => CursorButton::Three,
        NativeButton::Extended(1) => CursorButton::Four,
        NativeButton::Extended(2) => CursorButton::Five,
        NativeButton::Extended(4) => CursorButton::Seven,
        NativeButton::Extended(_) => CursorButton::Six,
    }
}

fn resolve_key(key: RawKey) -> InputKey {
    match key {
        RawKey::Mapped(key) => key,
        RawKey::Virtual(virtual_key) => {
            let key = map_virtual_key(virtual_key);
            if key == InputKey::Unknown {
                log::trace!("unmapped virtual key {:#04x}", virtual_key.code);
            }
            key
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::{Extent2D, Vector2};
    use crate::input::{InputModifiers, VirtualKey};
    use crate::platform::NativeHitRegion;
    use crate::window::registry::WindowRecord;
    use crate::window::{HitTestResult, WindowFlags};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Host {
        allow: Cell<bool>,
        calls: Cell<u32>,
    }

    impl Host {
        fn new(allow: bool) -> Self {
            Self {
                allow: Cell::new(allow),
                calls: Cell::new(0),
            }
        }
    }

    impl NativeHost for Host {
        fn track_mouse_leave(&self, _handle: NativeHandle) -> bool {
            self.calls.set(self.calls.get() + 1);
            self.allow.get()
        }
    }

    const HANDLE: NativeHandle = NativeHandle::from_raw(0x10);

    fn shared_with_window() -> (Shared, WindowId) {
        let shared = Shared::new(16);
        let id = {
            let mut registry = shared.registry.borrow_mut();
            let id = registry.allocate_id();
            registry.insert(WindowRecord::new(id, HANDLE, WindowFlags::VISIBLE));
            id
        };
        (shared, id)
    }

    fn drain(shared: &Shared) -> Vec<WindowEvent> {
        let mut out = Vec::new();
        shared.queue.borrow_mut().drain_into(&mut out, usize::MAX);
        out
    }

    fn key_message(code: u16, pressed: bool, repeat: bool) -> NativeMessage {
        NativeMessage::Key {
            key: RawKey::Virtual(VirtualKey::plain(code)),
            pressed,
            repeat,
            modifiers: InputModifiers::empty(),
            system: false,
        }
    }

    #[test]
    fn test_first_motion_announces_entry_once() {
        let (shared, window) = shared_with_window();
        let host = Host::new(true);
        let position = Vector2::new(4.0, 2.0);

        translate(&shared, HANDLE, &NativeMessage::MouseMove { position }, &host);
        translate(&shared, HANDLE, &NativeMessage::MouseMove { position }, &host);

        assert_eq!(host.calls.get(), 1);
        assert_eq!(
            drain(&shared),
            vec![
                WindowEvent::CursorFocus { window, focused: true },
                WindowEvent::CursorMove { window, position },
                WindowEvent::CursorMove { window, position },
            ]
        );
    }

    #[test]
    fn test_leave_rearms_tracking() {
        let (shared, _) = shared_with_window();
        let host = Host::new(true);
        let position = Vector2::ZERO;

        translate(&shared, HANDLE, &NativeMessage::MouseMove { position }, &host);
        translate(&shared, HANDLE, &NativeMessage::MouseLeave, &host);
        // A second leave without motion in between is not reported
        translate(&shared, HANDLE, &NativeMessage::MouseLeave, &host);
        translate(&shared, HANDLE, &NativeMessage::MouseMove { position }, &host);

        let focus: Vec<_> = drain(&shared)
            .into_iter()
            .filter_map(|event| match event {
                WindowEvent::CursorFocus { focused, .. } => Some(focused),
                _ => None,
            })
            .collect();
        assert_eq!(focus, vec![true, false, true]);
        assert_eq!(host.calls.get(), 2);
    }

    #[test]
    fn test_failed_tracking_falls_through() {
        let (shared, _) = shared_with_window();
        let host = Host::new(false);
        let reply = translate(
            &shared,
            HANDLE,
            &NativeMessage::MouseMove {
                position: Vector2::ZERO,
            },
            &host,
        );
        assert_eq!(reply, Reply::Default);
        assert!(drain(&shared).is_empty());
    }

    #[test]
    fn test_key_states() {
        let (shared, window) = shared_with_window();
        let host = Host::new(true);

        translate(&shared, HANDLE, &key_message(0x41, true, false), &host);
        translate(&shared, HANDLE, &key_message(0x41, true, true), &host);
        translate(&shared, HANDLE, &key_message(0x41, false, true), &host);

        let states: Vec<_> = drain(&shared)
            .into_iter()
            .map(|event| match event {
                WindowEvent::Key { key, state, .. } => {
                    assert_eq!(key, InputKey::A);
                    state
                }
                other => panic!("unexpected {other:?} for {window}"),
            })
            .collect();
        assert_eq!(states, vec![InputState::Pressed, InputState::Repeat, InputState::Released]);
    }

    #[test]
    fn test_unmapped_key_is_unknown() {
        let (shared, window) = shared_with_window();
        let host = Host::new(true);
        translate(&shared, HANDLE, &key_message(0xFF, true, false), &host);
        assert_eq!(
            drain(&shared),
            vec![WindowEvent::Key {
                window,
                key: InputKey::Unknown,
                state: InputState::Pressed,
                modifiers: InputModifiers::empty(),
            }]
        );
    }

    #[test]
    fn test_system_key_keeps_default_handling() {
        let (shared, _) = shared_with_window();
        let host = Host::new(true);
        let reply = translate(
            &shared,
            HANDLE,
            &NativeMessage::Key {
                key: RawKey::Mapped(InputKey::F10),
                pressed: true,
                repeat: false,
                modifiers: InputModifiers::ALT,
                system: true,
            },
            &host,
        );
        assert_eq!(reply, Reply::Default);
        assert_eq!(drain(&shared).len(), 1);
    }

    #[test]
    fn test_buttons() {
        assert_eq!(map_button(NativeButton::Left), CursorButton::One);
        assert_eq!(map_button(NativeButton::Right), CursorButton::Two);
        assert_eq!(map_button(NativeButton::Middle), CursorButton::Three);
        assert_eq!(map_button(NativeButton::Extended(1)), CursorButton::Four);
        assert_eq!(map_button(NativeButton::Extended(2)), CursorButton::Five);
        assert_eq!(map_button(NativeButton::Extended(9)), CursorButton::Six);
    }

    #[test]
    fn test_size_kinds() {
        let (shared, window) = shared_with_window();
        let host = Host::new(true);
        let size = Extent2D::new(1920, 1080);

        translate(
            &shared,
            HANDLE,
            &NativeMessage::Resized {
                client: Extent2D::ZERO,
                kind: SizeKind::Minimized,
            },
            &host,
        );
        translate(
            &shared,
            HANDLE,
            &NativeMessage::Resized {
                client: size,
                kind: SizeKind::Maximized,
            },
            &host,
        );

        assert_eq!(
            drain(&shared),
            vec![
                WindowEvent::Minimize { window },
                WindowEvent::Maximize { window },
                WindowEvent::Resize { window, size },
            ]
        );
    }

    #[test]
    fn test_drag_resize_coalesces() {
        let (shared, window) = shared_with_window();
        let host = Host::new(true);
        for side in [100, 200, 300] {
            translate(
                &shared,
                HANDLE,
                &NativeMessage::Resized {
                    client: Extent2D::new(side, side),
                    kind: SizeKind::Restored,
                },
                &host,
            );
        }
        assert_eq!(
            drain(&shared),
            vec![WindowEvent::Resize {
                window,
                size: Extent2D::new(300, 300)
            }]
        );
    }

    #[test]
    fn test_hit_test_is_not_queued() {
        let (shared, window) = shared_with_window();
        let host = Host::new(true);
        let callback: crate::window::HitTestCallback = Rc::new(|_| HitTestResult::DragArea);
        shared.registry.borrow_mut().get_mut(window).unwrap().hit_test = Some(callback);

        let reply = translate(
            &shared,
            HANDLE,
            &NativeMessage::HitTest {
                point: Vector2::new(50.0, 5.0),
                os_region: NativeHitRegion::Client,
            },
            &host,
        );
        assert_eq!(reply, Reply::HitRegion(NativeHitRegion::Caption));
        assert!(shared.queue.borrow().is_empty());
    }

    #[test]
    fn test_unmanaged_handle() {
        let (shared, _) = shared_with_window();
        let host = Host::new(true);
        let stranger = NativeHandle::from_raw(0x99);

        assert_eq!(
            translate(&shared, stranger, &NativeMessage::CloseRequested, &host),
            Reply::Default
        );
        assert_eq!(
            translate(
                &shared,
                stranger,
                &NativeMessage::HitTest {
                    point: Vector2::ZERO,
                    os_region: NativeHitRegion::Top,
                },
                &host
            ),
            Reply::HitRegion(NativeHitRegion::Top)
        );
        assert!(shared.queue.borrow().is_empty());
    }

    #[test]
    fn test_close_is_advisory() {
        let (shared, window) = shared_with_window();
        let host = Host::new(true);
        translate(&shared, HANDLE, &NativeMessage::CloseRequested, &host);
        assert_eq!(drain(&shared), vec![WindowEvent::Close { window }]);
        assert!(shared.registry.borrow().get(window).is_some());
    }
}
