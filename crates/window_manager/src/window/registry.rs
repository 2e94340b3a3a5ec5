//! Window records keyed by id and by native handle

use super::{HitTestCallback, WindowFlags, WindowId};
use crate::dnd::{DropCallbacks, DropTarget};
use crate::foundation::IdFactory;
use crate::platform::NativeHandle;
use std::collections::HashMap;
use std::rc::Rc;

/// Everything the manager tracks for one live window
pub(crate) struct WindowRecord {
    pub id: WindowId,
    pub handle: NativeHandle,
    pub flags: WindowFlags,
    /// Leave tracking is armed; the next motion will not re-announce entry
    pub tracking_mouse: bool,
    /// Created hidden with `FOCUSED`; focus is taken on the first show
    pub focus_on_show: bool,
    pub hit_test: Option<HitTestCallback>,
    pub drop_callbacks: Option<Rc<DropCallbacks>>,
    pub drop_target: Option<Rc<DropTarget>>,
}

impl WindowRecord {
    pub fn new(id: WindowId, handle: NativeHandle, flags: WindowFlags) -> Self {
        Self {
            id,
            handle,
            flags,
            tracking_mouse: false,
            focus_on_show: flags.contains(WindowFlags::FOCUSED) && !flags.contains(WindowFlags::VISIBLE),
            hit_test: None,
            drop_callbacks: None,
            drop_target: None,
        }
    }
}

impl std::fmt::Debug for WindowRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRecord")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("flags", &self.flags)
            .field("tracking_mouse", &self.tracking_mouse)
            .field("focus_on_show", &self.focus_on_show)
            .field("hit_test", &self.hit_test.is_some())
            .field("drop_callbacks", &self.drop_callbacks.is_some())
            .field("drop_target", &self.drop_target.is_some())
            .finish()
    }
}

/// Id ↔ record ↔ native handle maps plus the id allocator
#[derive(Debug, Default)]
pub(crate) struct Registry {
    ids: IdFactory,
    windows: HashMap<WindowId, WindowRecord>,
    handles: HashMap<NativeHandle, WindowId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate_id(&mut self) -> WindowId {
        WindowId::from_raw(self.ids.new_id())
    }

    /// Give back an id that never made it into the registry
    pub fn release_id(&mut self, id: WindowId) {
        self.ids.free(id.raw());
    }

    pub fn insert(&mut self, record: WindowRecord) {
        debug_assert!(
            !self.handles.contains_key(&record.handle),
            "native handle registered twice"
        );
        self.handles.insert(record.handle, record.id);
        self.windows.insert(record.id, record);
    }

    /// Remove a record and release its id
    pub fn remove(&mut self, id: WindowId) -> Option<WindowRecord> {
        let record = self.windows.remove(&id)?;
        self.handles.remove(&record.handle);
        self.ids.free(id.raw());
        Some(record)
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowRecord> {
        self.windows.get(&id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut WindowRecord> {
        self.windows.get_mut(&id)
    }

    pub fn id_for(&self, handle: NativeHandle) -> Option<WindowId> {
        self.handles.get(&handle).copied()
    }

    /// Live ids in ascending order
    pub fn ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<_> = self.windows.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }
}
