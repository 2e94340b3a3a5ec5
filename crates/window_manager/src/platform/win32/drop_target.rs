//! OLE drag and drop bridge
//!
//! [`OleDropTarget`] is the COM object handed to `RegisterDragDrop`. OLE
//! refcounts it, so it may outlive the window; it only forwards to the shared
//! [`DropTarget`], which ignores calls once its window is gone.

use crate::dnd::context::{text_from_narrow, text_from_wide};
use crate::dnd::{DataSource, DropDataError, DropEffect, DropFormat, DropTarget};
use crate::foundation::Vector2;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use windows::core::{implement, Ref, Result as ComResult};
use windows::Win32::Foundation::{HWND, POINT, POINTL, S_OK};
use windows::Win32::Graphics::Gdi::ScreenToClient;
use windows::Win32::System::Com::{IDataObject, DVASPECT_CONTENT, FORMATETC, STGMEDIUM, TYMED_HGLOBAL};
use windows::Win32::System::Memory::{GlobalLock, GlobalSize, GlobalUnlock};
use windows::Win32::System::Ole::{
    IDropTarget, IDropTarget_Impl, ReleaseStgMedium, DROPEFFECT, DROPEFFECT_COPY, DROPEFFECT_NONE,
};
use windows::Win32::System::SystemServices::MODIFIERKEYS_FLAGS;
use windows::Win32::UI::Shell::{DragQueryFileW, HDROP};

const CF_TEXT: u16 = 1;
const CF_UNICODETEXT: u16 = 13;
const CF_HDROP: u16 = 15;

fn hglobal_format(format: u16) -> FORMATETC {
    FORMATETC {
        cfFormat: format,
        ptd: std::ptr::null_mut(),
        dwAspect: DVASPECT_CONTENT.0 as u32,
        lindex: -1,
        tymed: TYMED_HGLOBAL.0 as u32,
    }
}

/// [`DataSource`] over an OLE data object
pub struct OleDataSource {
    object: IDataObject,
}

impl OleDataSource {
    fn offers(&self, format: u16) -> bool {
        unsafe { self.object.QueryGetData(&hglobal_format(format)) == S_OK }
    }

    fn medium(&self, format: u16, kind: DropFormat) -> Result<Medium, DropDataError> {
        unsafe { self.object.GetData(&hglobal_format(format)) }
            .map(Medium)
            .map_err(|_| DropDataError::FormatUnavailable(kind))
    }
}

/// Storage medium released when dropped
struct Medium(STGMEDIUM);

impl Medium {
    /// Run `read` over the locked global memory
    fn with_bytes<T>(&self, read: impl FnOnce(&[u8]) -> T) -> Result<T, DropDataError> {
        let hglobal = unsafe { self.0.u.hGlobal };
        let data = unsafe { GlobalLock(hglobal) }.cast::<u8>();
        if data.is_null() {
            return Err(DropDataError::LockFailed);
        }
        let size = unsafe { GlobalSize(hglobal) };
        let value = read(unsafe { std::slice::from_raw_parts(data, size) });
        // Returns FALSE once the lock count reaches zero
        let _ = unsafe { GlobalUnlock(hglobal) };
        Ok(value)
    }
}

impl Drop for Medium {
    fn drop(&mut self) {
        unsafe { ReleaseStgMedium(&mut self.0) };
    }
}

impl DataSource for OleDataSource {
    fn formats(&self) -> Vec<DropFormat> {
        let mut formats = Vec::new();
        if self.offers(CF_HDROP) {
            formats.push(DropFormat::Files);
        }
        if self.offers(CF_UNICODETEXT) || self.offers(CF_TEXT) {
            formats.push(DropFormat::Text);
        }
        formats
    }

    fn read_files(&self) -> Result<Vec<PathBuf>, DropDataError> {
        let medium = self.medium(CF_HDROP, DropFormat::Files)?;
        let hglobal = unsafe { medium.0.u.hGlobal };
        if hglobal.is_invalid() {
            return Err(DropDataError::LockFailed);
        }

        let hdrop = HDROP(hglobal.0);
        let count = unsafe { DragQueryFileW(hdrop, u32::MAX, None) };
        let mut files = Vec::with_capacity(count as usize);
        for index in 0..count {
            let len = unsafe { DragQueryFileW(hdrop, index, None) } as usize;
            if len == 0 {
                continue;
            }
            let mut buffer = vec![0u16; len + 1];
            unsafe { DragQueryFileW(hdrop, index, Some(&mut buffer)) };
            files.push(PathBuf::from(String::from_utf16_lossy(&buffer[..len])));
        }

        if files.is_empty() {
            Err(DropDataError::Empty)
        } else {
            Ok(files)
        }
    }

    fn read_text(&self) -> Result<String, DropDataError> {
        let text = match self.medium(CF_UNICODETEXT, DropFormat::Text) {
            Ok(medium) => medium.with_bytes(|bytes| {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                    .collect();
                text_from_wide(&units)
            })?,
            // Older sources only offer the narrow format
            Err(_) => self.medium(CF_TEXT, DropFormat::Text)?.with_bytes(text_from_narrow)?,
        };

        if text.is_empty() {
            Err(DropDataError::Empty)
        } else {
            Ok(text)
        }
    }
}

/// COM drop target registered on one window
#[implement(IDropTarget)]
pub struct OleDropTarget {
    hwnd: HWND,
    target: Rc<DropTarget>,
    // OLE hands the data object to DragEnter and Drop only
    source: RefCell<Option<OleDataSource>>,
}

impl OleDropTarget {
    pub fn create(hwnd: HWND, target: Rc<DropTarget>) -> IDropTarget {
        Self {
            hwnd,
            target,
            source: RefCell::new(None),
        }
        .into()
    }

    fn client_point(&self, pt: &POINTL) -> Vector2 {
        let mut point = POINT { x: pt.x, y: pt.y };
        let _ = unsafe { ScreenToClient(self.hwnd, &mut point) };
        Vector2::new(point.x as f32, point.y as f32)
    }
}

fn write_effect(out: *mut DROPEFFECT, effect: DropEffect) {
    if out.is_null() {
        return;
    }
    let effect = match effect {
        DropEffect::Copy => DROPEFFECT_COPY,
        DropEffect::None => DROPEFFECT_NONE,
    };
    unsafe { *out = effect };
}

impl IDropTarget_Impl for OleDropTarget_Impl {
    fn DragEnter(
        &self,
        pdataobj: Ref<'_, IDataObject>,
        _grfkeystate: MODIFIERKEYS_FLAGS,
        pt: &POINTL,
        pdweffect: *mut DROPEFFECT,
    ) -> ComResult<()> {
        let point = self.client_point(pt);
        let effect = match pdataobj.as_ref() {
            Some(object) => {
                let source = OleDataSource { object: object.clone() };
                let effect = self.target.drag_enter(point, &source);
                // A refused session gets no DragOver data, so release the object now
                *self.source.borrow_mut() = effect.is_accepted().then_some(source);
                effect
            }
            None => DropEffect::None,
        };
        write_effect(pdweffect, effect);
        Ok(())
    }

    fn DragOver(&self, _grfkeystate: MODIFIERKEYS_FLAGS, pt: &POINTL, pdweffect: *mut DROPEFFECT) -> ComResult<()> {
        let point = self.client_point(pt);
        let source = self.source.borrow();
        let effect = self
            .target
            .drag_over(point, source.as_ref().map(|source| source as &dyn DataSource));
        write_effect(pdweffect, effect);
        Ok(())
    }

    fn DragLeave(&self) -> ComResult<()> {
        self.source.borrow_mut().take();
        self.target.drag_leave();
        Ok(())
    }

    fn Drop(
        &self,
        pdataobj: Ref<'_, IDataObject>,
        _grfkeystate: MODIFIERKEYS_FLAGS,
        pt: &POINTL,
        pdweffect: *mut DROPEFFECT,
    ) -> ComResult<()> {
        let point = self.client_point(pt);
        let cached = self.source.borrow_mut().take();
        let source = pdataobj
            .as_ref()
            .map(|object| OleDataSource { object: object.clone() })
            .or(cached);
        let effect = self
            .target
            .drag_drop(point, source.as_ref().map(|source| source as &dyn DataSource));
        write_effect(pdweffect, effect);
        Ok(())
    }
}
