use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces repaint requests into at most one `requestAnimationFrame`
/// callback per frame.
///
/// The map only changes on input, data or image arrival, so a frame is
/// painted once per burst of `mark_dirty()` calls and nothing runs while idle.
pub struct RenderScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    dirty: Cell<bool>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl RenderScheduler {
    pub fn new(render_fn: impl Fn() + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            dirty: Cell::new(false),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });

        let inner_cb = inner.clone();
        let cb = Closure::<dyn FnMut()>::new(move || {
            inner_cb.raf_id.set(None);
            if inner_cb.dirty.replace(false) {
                render_fn();
            }
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    /// Request a repaint on the next frame.
    pub fn mark_dirty(&self) {
        self.inner.dirty.set(true);
        if self.inner.raf_id.get().is_some() {
            return;
        }
        let Some(window) = self.inner.window.as_ref() else {
            return;
        };
        let cb_ref = self.inner.callback.borrow();
        if let Some(cb) = cb_ref.as_ref()
            && let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref())
        {
            self.inner.raf_id.set(Some(id));
        }
    }
}

impl Drop for RenderScheduler {
    fn drop(&mut self) {
        if let Some(raf_id) = self.inner.raf_id.replace(None)
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
        self.inner.dirty.set(false);
        // Break the callback->inner reference cycle on teardown.
        self.inner.callback.borrow_mut().take();
    }
}
