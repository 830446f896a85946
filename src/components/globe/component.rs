use std::cell::RefCell;
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use web_sys::{CanvasRenderingContext2d, MouseEvent};

use super::projection::{GlobeCamera, great_circle};
use super::transform::build_globe;
use super::types::{GeoDirectory, GlobeData};
use crate::activity::{ActivityClient, ActivityEvent, ActivityType, ApiError, FeedState, spawn_into};
use crate::components::activity_graph::frame::FrameScheduler;
use crate::components::canvas::{context_2d, fit_to_parent};
use crate::config::AppConfig;

const ARC_SEGMENTS: usize = 32;
/// Screen pixels per unit of point size.
const POINT_PX: f64 = 6.0;
/// Longest frame gap fed into auto-rotation, so a background tab does not jump.
const MAX_FRAME_MS: f64 = 100.0;

/// Agent locations and store owners, loaded once per view.
#[derive(Clone, Copy)]
pub struct GeoDirectoryFeed {
	client: StoredValue<ActivityClient>,
	/// Current directory state.
	pub state: RwSignal<FeedState<GeoDirectory>>,
}

impl GeoDirectoryFeed {
	/// Loads agents and stores again; a failure keeps the previous directory.
	pub fn refetch(&self) {
		let client = self.client.get_value();
		spawn_into(self.state, "geo directory", async move {
			let agents = client.fetch_agents().await?;
			let stores = client.fetch_stores().await?;
			Ok::<_, ApiError>(GeoDirectory::from_records(&agents, &stores))
		});
	}
}

/// Starts loading the geo directory for the current view.
pub fn use_geo_directory() -> GeoDirectoryFeed {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let feed = GeoDirectoryFeed {
		client: StoredValue::new(ActivityClient::new(&config)),
		state: RwSignal::new(FeedState::default()),
	};
	feed.refetch();
	feed
}

struct GlobeState {
	camera: GlobeCamera,
	data: GlobeData,
	width: f64,
	height: f64,
	last_frame: Option<f64>,
}

fn draw(state: &GlobeState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#0b1020");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	let projection = state.camera.projection(state.width, state.height);

	ctx.begin_path();
	let _ = ctx.arc(projection.cx, projection.cy, projection.radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str("#16213e");
	ctx.fill();
	ctx.set_stroke_style_str("#334155");
	ctx.set_line_width(1.0);
	ctx.stroke();

	ctx.set_global_alpha(0.8);
	for arc in &state.data.arcs {
		ctx.set_stroke_style_str(arc.color);
		ctx.set_line_width(arc.stroke);
		ctx.begin_path();
		let mut pen_down = false;
		for coord in great_circle(arc.start, arc.end, ARC_SEGMENTS) {
			match projection.project(coord) {
				Some((x, y)) if pen_down => ctx.line_to(x, y),
				Some((x, y)) => {
					ctx.move_to(x, y);
					pen_down = true;
				}
				None => pen_down = false,
			}
		}
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);

	for point in &state.data.points {
		let Some((x, y)) = projection.project(point.coord) else {
			continue;
		};
		ctx.begin_path();
		let _ = ctx.arc(x, y, point.size * POINT_PX, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(point.color);
		ctx.fill();
	}
}

/// Agents on a slowly spinning globe, with arcs for who trades with whom.
#[component]
pub fn GlobeCanvas(
	/// Activity batch drawn as arcs.
	#[prop(into)]
	activities: Signal<Vec<ActivityEvent>>,
	/// Agent locations and store owners.
	#[prop(into)]
	directory: Signal<GeoDirectory>,
	/// Activity types that count toward points and arcs.
	#[prop(into)]
	enabled_types: Signal<BTreeSet<ActivityType>>,
) -> impl IntoView {
	let Some(window) = web_sys::window() else {
		warn!("no window, globe not mounted");
		return view! { <div class="globe" /> }.into_any();
	};
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state = Rc::new(RefCell::new(GlobeState {
		camera: GlobeCamera::default(),
		data: GlobeData::default(),
		width: 0.0,
		height: 0.0,
		last_frame: None,
	}));
	let frames = FrameScheduler::new(window);

	let (state_init, frames_init) = (state.clone(), frames.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(ctx) = context_2d(&canvas) else {
			warn!("2d canvas context unavailable, globe will not draw");
			return;
		};

		let (state_frame, frames_frame) = (state_init.clone(), frames_init.clone());
		frames_init.set_handler(move |timestamp| {
			let mut s = state_frame.borrow_mut();
			let (w, h) = fit_to_parent(&canvas);
			s.width = w;
			s.height = h;
			let elapsed = s.last_frame.map_or(0.0, |last| (timestamp - last).clamp(0.0, MAX_FRAME_MS));
			s.last_frame = Some(timestamp);
			s.camera.advance(elapsed);
			draw(&s, &ctx);
			frames_frame.request();
		});
		frames_init.request();
	});

	let (state_data, frames_data) = (state.clone(), frames.clone());
	Effect::new(move |_| {
		let enabled = enabled_types.get();
		let data = activities.with(|batch| directory.with(|geo| build_globe(batch, geo, &enabled)));
		state_data.borrow_mut().data = data;
		frames_data.request();
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		state_md
			.borrow_mut()
			.camera
			.drag_start(ev.client_x() as f64, ev.client_y() as f64);
	};
	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		state_mm
			.borrow_mut()
			.camera
			.drag_move(ev.client_x() as f64, ev.client_y() as f64);
	};
	let state_release = state.clone();
	let release = move |_: MouseEvent| state_release.borrow_mut().camera.drag_end();
	let on_mouseleave = release.clone();

	let teardown = StoredValue::new_local(frames);
	on_cleanup(move || {
		teardown.try_with_value(FrameScheduler::shutdown);
	});

	view! {
		<div class="globe" style="width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="globe-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=release
				on:mouseleave=on_mouseleave
				style="display: block; cursor: grab;"
			/>
		</div>
	}
	.into_any()
}
