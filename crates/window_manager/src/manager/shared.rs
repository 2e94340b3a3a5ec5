//! State shared between the manager, the platform and drop adapters

use crate::events::{translator, EventQueue};
use crate::platform::{NativeHandle, NativeHost, NativeMessage, Reply};
use crate::window::registry::Registry;
use crate::window::{HitTestCallback, WindowId};
use std::cell::RefCell;
use std::rc::Rc;

/// Registry and event queue behind one `Rc`.
///
/// Borrows are short and never held across user callbacks or platform calls,
/// so a callback may call back into the manager.
#[derive(Debug)]
pub(crate) struct Shared {
    pub registry: RefCell<Registry>,
    pub queue: RefCell<EventQueue>,
}

impl Shared {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            registry: RefCell::new(Registry::new()),
            queue: RefCell::new(EventQueue::with_capacity(queue_capacity)),
        }
    }

    pub fn window_id(&self, handle: NativeHandle) -> Option<WindowId> {
        self.registry.borrow().id_for(handle)
    }

    pub fn native_handle(&self, id: WindowId) -> Option<NativeHandle> {
        self.registry.borrow().get(id).map(|record| record.handle)
    }

    pub fn hit_test_callback(&self, id: WindowId) -> Option<HitTestCallback> {
        self.registry
            .borrow()
            .get(id)
            .and_then(|record| record.hit_test.clone())
    }
}

/// Entry point backends use to deliver native messages.
///
/// Cheap to clone; every clone feeds the same manager. Holding a dispatcher
/// keeps the manager's tables alive but not the manager itself.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Rc<Shared>,
}

impl Dispatcher {
    pub(crate) fn new(shared: Rc<Shared>) -> Self {
        Self { shared }
    }

    /// Translate one message for the window behind `handle`.
    ///
    /// Messages for handles the manager does not know (yet) get
    /// [`Reply::Default`], or the OS's own region for hit tests.
    pub fn dispatch(&self, handle: NativeHandle, message: &NativeMessage, host: &dyn NativeHost) -> Reply {
        translator::translate(&self.shared, handle, message, host)
    }

    /// Manager id of a native window
    pub fn window_id(&self, handle: NativeHandle) -> Option<WindowId> {
        self.shared.window_id(handle)
    }

    /// The handle belongs to a live managed window
    pub fn is_managed(&self, handle: NativeHandle) -> bool {
        self.window_id(handle).is_some()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("windows", &self.shared.registry.borrow().len())
            .finish()
    }
}
