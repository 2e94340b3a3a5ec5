//! Drop target adapter
//!
//! One [`DropTarget`] exists per drag-and-drop enabled window. The manager
//! keeps one `Rc` to it while the window is registered; the platform keeps
//! others for as long as the OS does. Because the OS may call in after the
//! window is gone, the adapter only remembers the window id and looks the
//! record up on every call.

use super::context::{DataSource, DropContext, FormatProbe};
use crate::foundation::Vector2;
use crate::manager::Shared;
use crate::platform::NativeHandle;
use crate::window::registry::WindowRecord;
use crate::window::WindowId;
use std::cell::Cell;
use std::rc::{Rc, Weak};

type ProbeCallback = dyn Fn(Vector2, &DropContext<'_>) -> bool;
type DropCallback = dyn Fn(Vector2, &DropContext<'_>);

/// Application callbacks for the four phases of a drag session
pub struct DropCallbacks {
    enter: Box<ProbeCallback>,
    over: Box<ProbeCallback>,
    drop: Box<DropCallback>,
    leave: Box<dyn Fn()>,
}

impl DropCallbacks {
    /// Callbacks that accept any payload with files or text and ignore the drop
    pub fn new() -> Self {
        Self {
            enter: Box::new(|_: Vector2, context: &DropContext<'_>| {
                context.has_files() || context.has_text()
            }),
            over: Box::new(|_: Vector2, _: &DropContext<'_>| true),
            drop: Box::new(|_: Vector2, _: &DropContext<'_>| {}),
            leave: Box::new(|| {}),
        }
    }

    /// Decide whether to take part in a session; `false` ends it right away
    #[must_use]
    pub fn on_enter(mut self, enter: impl Fn(Vector2, &DropContext<'_>) -> bool + 'static) -> Self {
        self.enter = Box::new(enter);
        self
    }

    /// Re-evaluate acceptance at every pointer update
    #[must_use]
    pub fn on_over(mut self, over: impl Fn(Vector2, &DropContext<'_>) -> bool + 'static) -> Self {
        self.over = Box::new(over);
        self
    }

    /// Receive the payload
    #[must_use]
    pub fn on_drop(mut self, drop: impl Fn(Vector2, &DropContext<'_>) + 'static) -> Self {
        self.drop = Box::new(drop);
        self
    }

    /// The pointer left or the drag was cancelled
    #[must_use]
    pub fn on_leave(mut self, leave: impl Fn() + 'static) -> Self {
        self.leave = Box::new(leave);
        self
    }
}

impl Default for DropCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DropCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropCallbacks").finish_non_exhaustive()
    }
}

/// Feedback for the OS drag cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropEffect {
    /// Drop refused here
    None,
    /// Drop accepted as a copy
    Copy,
}

impl DropEffect {
    const fn from_accept(accept: bool) -> Self {
        if accept {
            Self::Copy
        } else {
            Self::None
        }
    }

    /// The target takes part in the session
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Copy)
    }
}

/// Shared adapter between the OS drag protocol and a window's callbacks
#[derive(Debug)]
pub struct DropTarget {
    window: WindowId,
    shared: Weak<Shared>,
    session: Cell<Option<FormatProbe>>,
}

impl DropTarget {
    pub(crate) fn new(window: WindowId, shared: &Rc<Shared>) -> Self {
        Self {
            window,
            shared: Rc::downgrade(shared),
            session: Cell::new(None),
        }
    }

    /// Window this adapter was created for
    pub const fn window_id(&self) -> WindowId {
        self.window
    }

    /// Native handle of the window while this adapter is registered on it
    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.with_record(|record| Some(record.handle))
    }

    /// A session was accepted and has not ended yet
    pub fn is_active(&self) -> bool {
        self.session.get().is_some()
    }

    /// Run `f` on the window record, provided this adapter is still the one
    /// registered there. Ids are reused, so matching the id alone is not enough.
    fn with_record<T>(&self, f: impl FnOnce(&WindowRecord) -> Option<T>) -> Option<T> {
        let shared = self.shared.upgrade()?;
        let registry = shared.registry.borrow();
        let record = registry.get(self.window)?;
        let registered = record.drop_target.as_ref()?;
        if !std::ptr::eq(Rc::as_ptr(registered), self) {
            return None;
        }
        f(record)
    }

    fn callbacks(&self) -> Option<Rc<DropCallbacks>> {
        self.with_record(|record| record.drop_callbacks.clone())
    }

    /// Drag entered the window
    pub fn drag_enter(&self, point: Vector2, source: &dyn DataSource) -> DropEffect {
        // A new enter always starts a fresh session
        self.session.set(None);
        let Some(callbacks) = self.callbacks() else {
            return DropEffect::None;
        };

        let probe = FormatProbe::from_source(source);
        let context = DropContext::new(probe, Some(source));
        let accept = (callbacks.enter)(point, &context);
        if accept {
            self.session.set(Some(probe));
        }
        log::debug!(
            "{} drag enter at ({}, {}) files={} text={} accepted={}",
            self.window,
            point.x,
            point.y,
            probe.has_files,
            probe.has_text,
            accept
        );
        DropEffect::from_accept(accept)
    }

    /// Drag moved over the window
    pub fn drag_over(&self, point: Vector2, source: Option<&dyn DataSource>) -> DropEffect {
        let Some(probe) = self.session.get() else {
            return DropEffect::None;
        };
        let Some(callbacks) = self.callbacks() else {
            return DropEffect::None;
        };
        let context = DropContext::new(probe, source);
        DropEffect::from_accept((callbacks.over)(point, &context))
    }

    /// Payload released over the window
    pub fn drag_drop(&self, point: Vector2, source: Option<&dyn DataSource>) -> DropEffect {
        let Some(probe) = self.session.take() else {
            return DropEffect::None;
        };
        let Some(callbacks) = self.callbacks() else {
            return DropEffect::None;
        };
        log::debug!("{} drop at ({}, {})", self.window, point.x, point.y);
        let context = DropContext::new(probe, source);
        (callbacks.drop)(point, &context);
        DropEffect::Copy
    }

    /// Drag left the window or was cancelled
    pub fn drag_leave(&self) {
        if self.session.take().is_none() {
            return;
        }
        if let Some(callbacks) = self.callbacks() {
            log::debug!("{} drag leave", self.window);
            (callbacks.leave)();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnd::OwnedDataSource;
    use crate::window::WindowFlags;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct Log {
        calls: RefCell<Vec<String>>,
    }

    impl Log {
        fn push(&self, call: impl Into<String>) {
            self.calls.borrow_mut().push(call.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.calls.borrow_mut())
        }
    }

    fn setup(callbacks: Option<DropCallbacks>) -> (Rc<Shared>, Rc<DropTarget>) {
        let shared = Rc::new(Shared::new(4));
        let mut registry = shared.registry.borrow_mut();
        let id = registry.allocate_id();
        let target = Rc::new(DropTarget::new(id, &shared));
        let mut record = WindowRecord::new(id, NativeHandle::from_raw(7), WindowFlags::DRAG_AND_DROP);
        record.drop_callbacks = callbacks.map(Rc::new);
        record.drop_target = Some(Rc::clone(&target));
        registry.insert(record);
        drop(registry);
        (shared, target)
    }

    fn logging_callbacks(log: &Rc<Log>, accept: bool) -> DropCallbacks {
        let (enter, over, drop, leave) = (Rc::clone(log), Rc::clone(log), Rc::clone(log), Rc::clone(log));
        DropCallbacks::new()
            .on_enter(move |_, context| {
                enter.push(format!("enter files={} text={}", context.has_files(), context.has_text()));
                accept
            })
            .on_over(move |point, _| {
                over.push(format!("over {}", point.x));
                point.x < 100.0
            })
            .on_drop(move |_, context| {
                drop.push(format!("drop files={} text={}", context.has_files(), context.has_text()));
            })
            .on_leave(move || leave.push("leave"))
    }

    #[test]
    fn test_rejected_enter_ends_session() {
        let log = Rc::new(Log::default());
        let (_shared, target) = setup(Some(logging_callbacks(&log, false)));
        let source = OwnedDataSource::new().with_text("hello");

        assert_eq!(target.drag_enter(Vector2::ZERO, &source), DropEffect::None);
        assert!(!target.is_active());
        assert_eq!(target.drag_over(Vector2::ZERO, Some(&source)), DropEffect::None);
        assert_eq!(target.drag_drop(Vector2::ZERO, Some(&source)), DropEffect::None);
        target.drag_leave();

        assert_eq!(log.take(), vec!["enter files=false text=true".to_string()]);
    }

    #[test]
    fn test_refused_enter_releases_source() {
        let log = Rc::new(Log::default());
        let (_shared, target) = setup(Some(logging_callbacks(&log, false)));
        let source = Rc::new(OwnedDataSource::new().with_files(["/tmp/a.png"]));

        // Backends keep the payload only for an accepted session
        let effect = target.drag_enter(Vector2::ZERO, source.as_ref());
        let retained = effect.is_accepted().then(|| Rc::clone(&source));
        assert!(retained.is_none());
        assert_eq!(Rc::strong_count(&source), 1);

        let log = Rc::new(Log::default());
        let (_shared, target) = setup(Some(logging_callbacks(&log, true)));
        let effect = target.drag_enter(Vector2::ZERO, source.as_ref());
        assert!(effect.is_accepted());
        assert!(!DropEffect::None.is_accepted());
    }

    #[test]
    fn test_accepted_session_keeps_probe() {
        let log = Rc::new(Log::default());
        let (_shared, target) = setup(Some(logging_callbacks(&log, true)));
        let source = OwnedDataSource::new().with_files(["/tmp/a.png"]);

        assert_eq!(target.drag_enter(Vector2::ZERO, &source), DropEffect::Copy);
        assert!(target.is_active());
        assert_eq!(target.drag_over(Vector2::new(10.0, 0.0), None), DropEffect::Copy);
        assert_eq!(target.drag_over(Vector2::new(150.0, 0.0), None), DropEffect::None);
        assert_eq!(target.drag_drop(Vector2::new(10.0, 0.0), None), DropEffect::Copy);
        assert!(!target.is_active());

        assert_eq!(
            log.take(),
            vec![
                "enter files=true text=false".to_string(),
                "over 10".to_string(),
                "over 150".to_string(),
                "drop files=true text=false".to_string(),
            ]
        );
    }

    #[test]
    fn test_leave_only_after_accepted_enter() {
        let log = Rc::new(Log::default());
        let (_shared, target) = setup(Some(logging_callbacks(&log, true)));
        target.drag_leave();
        assert!(log.take().is_empty());

        target.drag_enter(Vector2::ZERO, &OwnedDataSource::new().with_text("x"));
        target.drag_leave();
        target.drag_leave();
        assert_eq!(log.take(), vec!["enter files=false text=true".to_string(), "leave".to_string()]);
    }

    #[test]
    fn test_default_callbacks_need_files_or_text() {
        let (_shared, target) = setup(Some(DropCallbacks::default()));
        assert_eq!(target.drag_enter(Vector2::ZERO, &OwnedDataSource::new()), DropEffect::None);
        assert_eq!(
            target.drag_enter(Vector2::ZERO, &OwnedDataSource::new().with_text("x")),
            DropEffect::Copy
        );
    }

    #[test]
    fn test_no_callbacks_refuses() {
        let (_shared, target) = setup(None);
        let source = OwnedDataSource::new().with_text("x");
        assert_eq!(target.drag_enter(Vector2::ZERO, &source), DropEffect::None);
        assert!(!target.is_active());
    }

    #[test]
    fn test_removed_window_is_a_no_op() {
        let log = Rc::new(Log::default());
        let (shared, target) = setup(Some(logging_callbacks(&log, true)));
        let source = OwnedDataSource::new().with_text("x");
        target.drag_enter(Vector2::ZERO, &source);
        log.take();

        shared.registry.borrow_mut().remove(target.window_id());
        assert_eq!(target.native_handle(), None);
        assert_eq!(target.drag_over(Vector2::ZERO, None), DropEffect::None);
        assert_eq!(target.drag_drop(Vector2::ZERO, None), DropEffect::None);
        target.drag_leave();
        assert!(log.take().is_empty());
    }

    #[test]
    fn test_unregistered_adapter_is_a_no_op() {
        let (shared, registered) = setup(Some(DropCallbacks::new()));
        let impostor = DropTarget::new(registered.window_id(), &shared);
        let source = OwnedDataSource::new().with_text("x");
        assert_eq!(impostor.drag_enter(Vector2::ZERO, &source), DropEffect::None);
        assert_eq!(impostor.native_handle(), None);
        assert_eq!(registered.drag_enter(Vector2::ZERO, &source), DropEffect::Copy);
    }

    #[test]
    fn test_dropped_manager_state_is_a_no_op() {
        let (shared, target) = setup(Some(DropCallbacks::new()));
        drop(shared);
        let source = OwnedDataSource::new().with_text("x");
        assert_eq!(target.drag_enter(Vector2::ZERO, &source), DropEffect::None);
        assert_eq!(target.native_handle(), None);
        target.drag_leave();
    }
}
