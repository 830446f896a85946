//! Canvas helpers shared by the graph and globe views.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

/// Sizes the backing store to the parent element and returns the new size.
pub fn fit_to_parent(canvas: &HtmlCanvasElement) -> (f64, f64) {
	let (w, h) = canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.unwrap_or((0.0, 0.0));
	if canvas.width() != w as u32 || canvas.height() != h as u32 {
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
	}
	(w, h)
}
