use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use leptos::callback::{Callable, UnsyncCallback};
use leptos::prelude::*;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, MouseEvent, ResizeObserver, WheelEvent};

use super::frame::FrameScheduler;
use super::render;
use super::simulation::SimulationParameters;
use super::state::ActivityGraphState;
use crate::activity::{ActivityEvent, ActivityType};
use crate::components::canvas::{context_2d, fit_to_parent};
use crate::config::AppConfig;

/// Watches the canvas container so layout starts as soon as it gets a real size.
struct ContainerWatch {
	observer: ResizeObserver,
	_callback: Closure<dyn FnMut()>,
}

impl ContainerWatch {
	fn disconnect(&self) {
		self.observer.disconnect();
	}
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Live force-directed network of actors and stores.
///
/// Clicking a store calls `on_store_click` with its id; the component never navigates
/// on its own.
#[component]
pub fn ActivityGraphCanvas(
	/// Latest activity batch; each change rebuilds the graph.
	#[prop(into)]
	activities: Signal<Vec<ActivityEvent>>,
	/// Activity types whose edges are shown.
	#[prop(into)]
	enabled_types: Signal<BTreeSet<ActivityType>>,
	/// Receives the id of a clicked store.
	#[prop(into)]
	on_store_click: UnsyncCallback<String>,
) -> impl IntoView {
	let Some(window) = web_sys::window() else {
		warn!("no window, activity graph not mounted");
		return view! { <div class="activity-graph" /> }.into_any();
	};
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let config = use_context::<AppConfig>().unwrap_or_default();
	let state = Rc::new(RefCell::new(ActivityGraphState::new(
		SimulationParameters::default(),
		config.fresh_edge_ms,
	)));
	let frames = FrameScheduler::new(window);
	let resize: Rc<RefCell<Option<ContainerWatch>>> = Rc::new(RefCell::new(None));

	let (state_init, frames_init, resize_init) = (state.clone(), frames.clone(), resize.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if resize_init.borrow().is_some() {
			return;
		}
		let Some(ctx) = context_2d(&canvas) else {
			warn!("2d canvas context unavailable, activity graph will not draw");
			return;
		};
		let Some(container) = canvas.parent_element() else {
			warn!("activity graph canvas has no container");
			return;
		};

		let (w, h) = fit_to_parent(&canvas);
		{
			let mut s = state_init.borrow_mut();
			let ticker = frames_init.clone();
			s.engine.on_tick(move || ticker.request());
			s.resize(w, h);
		}

		let (state_frame, frames_frame) = (state_init.clone(), frames_init.clone());
		frames_init.set_handler(move |_| {
			let now = js_sys::Date::now();
			let mut s = state_frame.borrow_mut();
			s.tick(now);
			render::render(&s, &ctx, now);
			if s.is_animating() && !frames_frame.is_pending() {
				frames_frame.request();
			}
		});

		let (state_resize, frames_resize) = (state_init.clone(), frames_init.clone());
		let callback = Closure::<dyn FnMut()>::new(move || {
			let (w, h) = fit_to_parent(&canvas);
			let mut s = state_resize.borrow_mut();
			if (s.width, s.height) != (w, h) {
				s.resize(w, h);
				frames_resize.request();
			}
		});
		match ResizeObserver::new(callback.as_ref().unchecked_ref()) {
			Ok(observer) => {
				observer.observe(&container);
				*resize_init.borrow_mut() = Some(ContainerWatch {
					observer,
					_callback: callback,
				});
			}
			Err(err) => warn!("could not watch container size: {err:?}"),
		}
		info!("activity graph mounted at {w}x{h}");
		frames_init.request();
	});

	let (state_data, frames_data) = (state.clone(), frames.clone());
	Effect::new(move |_| {
		activities.with(|batch| {
			state_data
				.borrow_mut()
				.apply_activities(batch, js_sys::Date::now())
		});
		frames_data.request();
	});

	let (state_filter, frames_filter) = (state.clone(), frames.clone());
	Effect::new(move |_| {
		let enabled = enabled_types.get();
		state_filter.borrow_mut().set_enabled_types(enabled);
		frames_filter.request();
	});

	let (state_md, frames_md) = (state.clone(), frames.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		state_md.borrow_mut().pointer_down(x, y);
		frames_md.request();
	};

	let (state_mm, frames_mm) = (state.clone(), frames.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if state_mm.borrow_mut().pointer_move(x, y) {
			frames_mm.request();
		}
	};

	let (state_mu, frames_mu) = (state.clone(), frames.clone());
	let on_mouseup = move |_: MouseEvent| {
		let clicked = state_mu.borrow_mut().pointer_up();
		frames_mu.request();
		if let Some(store_id) = clicked {
			on_store_click.run(store_id);
		}
	};

	let (state_ml, frames_ml) = (state.clone(), frames.clone());
	let on_mouseleave = move |_: MouseEvent| {
		state_ml.borrow_mut().pointer_leave();
		frames_ml.request();
	};

	let (state_wh, frames_wh) = (state.clone(), frames.clone());
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		state_wh.borrow_mut().wheel(x, y, ev.delta_y());
		frames_wh.request();
	};

	let view_action = |action: fn(&mut ActivityGraphState)| {
		let (state, frames) = (state.clone(), frames.clone());
		move |_: MouseEvent| {
			action(&mut state.borrow_mut());
			frames.request();
		}
	};
	let on_zoom_in = view_action(ActivityGraphState::zoom_in);
	let on_zoom_out = view_action(ActivityGraphState::zoom_out);
	let on_reset = view_action(ActivityGraphState::reset_view);

	let teardown = StoredValue::new_local((state, frames, resize));
	on_cleanup(move || {
		teardown.try_with_value(|(state, frames, resize)| {
			state.borrow_mut().stop();
			frames.shutdown();
			if let Some(watch) = resize.borrow_mut().take() {
				watch.disconnect();
			}
		});
	});

	view! {
		<div class="activity-graph" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="activity-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<div class="zoom-controls" style="position: absolute; right: 1rem; bottom: 1rem;">
				<button title="Zoom in" on:click=on_zoom_in>"+"</button>
				<button title="Zoom out" on:click=on_zoom_out>"−"</button>
				<button title="Reset view" on:click=on_reset>"Reset"</button>
			</div>
		</div>
	}
	.into_any()
}
