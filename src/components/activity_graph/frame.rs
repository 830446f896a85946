use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use log::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

/// The one outstanding animation-frame request, if any.
#[derive(Debug, Default)]
pub struct RedrawSlot {
	pending: Option<i32>,
}

impl RedrawSlot {
	/// Records a new request and hands back the one it supersedes, which the caller cancels.
	pub fn replace(&mut self, handle: i32) -> Option<i32> {
		self.pending.replace(handle)
	}

	/// The pending frame fired.
	pub fn complete(&mut self) {
		self.pending = None;
	}

	pub fn take(&mut self) -> Option<i32> {
		self.pending.take()
	}

	pub fn is_pending(&self) -> bool {
		self.pending.is_some()
	}
}

struct FrameInner {
	window: Window,
	slot: RefCell<RedrawSlot>,
	handler: RefCell<Option<Box<dyn FnMut(f64)>>>,
	callback: OnceCell<Closure<dyn FnMut(f64)>>,
}

impl Drop for FrameInner {
	fn drop(&mut self) {
		if let Some(handle) = self.slot.get_mut().take() {
			let _ = self.window.cancel_animation_frame(handle);
		}
	}
}

/// Coalesces redraw requests into at most one `requestAnimationFrame` at a time.
#[derive(Clone)]
pub struct FrameScheduler {
	inner: Rc<FrameInner>,
}

impl FrameScheduler {
	pub fn new(window: Window) -> Self {
		let inner = Rc::new(FrameInner {
			window,
			slot: RefCell::new(RedrawSlot::default()),
			handler: RefCell::new(None),
			callback: OnceCell::new(),
		});
		let weak = Rc::downgrade(&inner);
		let callback = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
			let Some(inner) = weak.upgrade() else {
				return;
			};
			inner.slot.borrow_mut().complete();
			if let Some(handler) = inner.handler.borrow_mut().as_mut() {
				handler(timestamp);
			}
		});
		let _ = inner.callback.set(callback);
		Self { inner }
	}

	/// Sets what runs on each frame. The handler may call [`FrameScheduler::request`].
	pub fn set_handler(&self, handler: impl FnMut(f64) + 'static) {
		*self.inner.handler.borrow_mut() = Some(Box::new(handler));
	}

	/// Asks for a frame, replacing any request still pending.
	pub fn request(&self) {
		let Some(callback) = self.inner.callback.get() else {
			return;
		};
		match self
			.inner
			.window
			.request_animation_frame(callback.as_ref().unchecked_ref())
		{
			Ok(handle) => {
				if let Some(previous) = self.inner.slot.borrow_mut().replace(handle) {
					let _ = self.inner.window.cancel_animation_frame(previous);
				}
			}
			Err(err) => warn!("requestAnimationFrame failed: {err:?}"),
		}
	}

	pub fn is_pending(&self) -> bool {
		self.inner.slot.borrow().is_pending()
	}

	/// Cancels the pending frame and drops the handler.
	pub fn shutdown(&self) {
		if let Some(handle) = self.inner.slot.borrow_mut().take() {
			let _ = self.inner.window.cancel_animation_frame(handle);
		}
		self.inner.handler.borrow_mut().take();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn newer_request_supersedes_pending_one() {
		let mut slot = RedrawSlot::default();
		assert_eq!(slot.replace(1), None);
		assert_eq!(slot.replace(2), Some(1));
		assert!(slot.is_pending());
		slot.complete();
		assert!(!slot.is_pending());
		assert_eq!(slot.replace(3), None);
		assert_eq!(slot.take(), Some(3));
		assert_eq!(slot.take(), None);
	}
}
