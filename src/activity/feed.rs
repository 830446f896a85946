use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, VisibilityState, Window};

use super::client::ActivityClient;
use super::error::ApiError;
use super::types::ActivityEvent;
use crate::config::{AppConfig, FeedOptions};

/// Last-known-good data plus the outcome of the latest request.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedState<T> {
	data: Option<T>,
	error: Option<String>,
	loading: bool,
}

impl<T> Default for FeedState<T> {
	fn default() -> Self {
		Self {
			data: None,
			error: None,
			loading: false,
		}
	}
}

/// What a view should show for a feed.
#[derive(Debug, PartialEq)]
pub enum FeedView<'a, T> {
	/// Nothing loaded yet and no failure reported.
	Loading,
	/// Nothing ever loaded and the last request failed.
	Failed(&'a str),
	/// Data is available; `stale_error` is set when the latest refresh failed.
	Ready {
		/// Latest good data.
		data: &'a T,
		/// Message of the refresh that failed after `data` was loaded.
		stale_error: Option<&'a str>,
	},
}

impl<T> FeedState<T> {
	/// Marks a request as in flight.
	pub fn begin(&mut self) {
		self.loading = true;
	}

	/// Records a finished request. Failures never discard earlier data.
	pub fn apply(&mut self, result: Result<T, ApiError>) {
		self.loading = false;
		match result {
			Ok(data) => {
				self.data = Some(data);
				self.error = None;
			}
			Err(err) => self.error = Some(err.to_string()),
		}
	}

	/// Whether a request is in flight.
	pub fn is_loading(&self) -> bool {
		self.loading
	}

	/// Latest good data.
	pub fn data(&self) -> Option<&T> {
		self.data.as_ref()
	}

	/// Message of the latest failed request, cleared by the next success.
	pub fn error(&self) -> Option<&str> {
		self.error.as_deref()
	}

	/// Stale data wins over an error overlay.
	pub fn view(&self) -> FeedView<'_, T> {
		match (&self.data, &self.error) {
			(Some(data), error) => FeedView::Ready {
				data,
				stale_error: error.as_deref(),
			},
			(None, Some(error)) => FeedView::Failed(error),
			(None, None) => FeedView::Loading,
		}
	}
}

/// Side effect the poller must perform after a state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollAction {
	/// Start the interval.
	Arm,
	/// Fetch right away, then start the interval.
	FetchAndArm,
	/// Stop the interval.
	Disarm,
	/// Nothing to do.
	Nothing,
}

/// Decides when polling runs: only while the document is visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollGate {
	visible: bool,
	armed: bool,
}

impl PollGate {
	/// Gate for a document that is currently `visible` or not.
	pub fn new(visible: bool) -> Self {
		Self {
			visible,
			armed: false,
		}
	}

	/// Called once at mount, after the initial fetch was issued.
	pub fn start(&mut self) -> PollAction {
		if self.visible && !self.armed {
			self.armed = true;
			PollAction::Arm
		} else {
			PollAction::Nothing
		}
	}

	/// Called on every `visibilitychange`.
	pub fn visibility_changed(&mut self, visible: bool) -> PollAction {
		self.visible = visible;
		match (visible, self.armed) {
			(true, false) => {
				self.armed = true;
				PollAction::FetchAndArm
			}
			(false, true) => {
				self.armed = false;
				PollAction::Disarm
			}
			_ => PollAction::Nothing,
		}
	}

	/// Whether the interval should currently be running.
	pub fn is_armed(&self) -> bool {
		self.armed
	}
}

/// Runs `fetch` and stores its result in `state`, keeping stale data on failure.
pub fn spawn_into<T, F>(state: RwSignal<FeedState<T>>, what: &'static str, fetch: F)
where
	T: Send + Sync + 'static,
	F: Future<Output = Result<T, ApiError>> + 'static,
{
	state.update(FeedState::begin);
	spawn_local(async move {
		let result = fetch.await;
		match &result {
			Ok(_) => debug!("{what} fetch succeeded"),
			Err(err) => warn!("{what} fetch failed: {err}"),
		}
		state.try_update(|s| s.apply(result));
	});
}

/// Handle to the activity feed of one view.
#[derive(Clone, Copy)]
pub struct ActivityFeed {
	client: StoredValue<ActivityClient>,
	limit: u32,
	/// Current feed state.
	pub state: RwSignal<FeedState<Vec<ActivityEvent>>>,
}

impl ActivityFeed {
	/// Issues a new fetch. Overlapping fetches are allowed; the last to finish wins.
	pub fn refetch(&self) {
		let (client, limit) = (self.client.get_value(), self.limit);
		spawn_into(self.state, "activity", async move {
			client.fetch_activity(limit).await
		});
	}
}

/// Loads activities for a view, polling while the tab is visible if enabled.
pub fn use_activity_feed(options: FeedOptions) -> ActivityFeed {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let feed = ActivityFeed {
		client: StoredValue::new(ActivityClient::new(&config)),
		limit: options.limit,
		state: RwSignal::new(FeedState::default()),
	};
	feed.refetch();

	if options.enable_polling {
		match Poller::install(feed, config.poll_interval_ms) {
			Some(poller) => {
				let poller = StoredValue::new_local(poller);
				on_cleanup(move || {
					poller.try_with_value(|p| p.teardown());
				});
			}
			None => warn!("polling unavailable: no browser document"),
		}
	}
	feed
}

struct Poller {
	document: Document,
	shared: Rc<PollerShared>,
	on_visibility: Closure<dyn FnMut()>,
}

struct PollerShared {
	window: Window,
	feed: ActivityFeed,
	gate: RefCell<PollGate>,
	handle: Cell<Option<i32>>,
	interval_ms: i32,
	tick: Closure<dyn FnMut()>,
}

impl PollerShared {
	fn apply(&self, action: PollAction) {
		match action {
			PollAction::Arm => self.arm(),
			PollAction::FetchAndArm => {
				self.feed.refetch();
				self.arm();
			}
			PollAction::Disarm => self.disarm(),
			PollAction::Nothing => {}
		}
	}

	fn arm(&self) {
		if self.handle.get().is_some() {
			return;
		}
		match self
			.window
			.set_interval_with_callback_and_timeout_and_arguments_0(
				self.tick.as_ref().unchecked_ref(),
				self.interval_ms,
			) {
			Ok(handle) => self.handle.set(Some(handle)),
			Err(err) => warn!("could not arm poll interval: {err:?}"),
		}
	}

	fn disarm(&self) {
		if let Some(handle) = self.handle.take() {
			self.window.clear_interval_with_handle(handle);
		}
	}
}

impl Poller {
	fn install(feed: ActivityFeed, interval_ms: u32) -> Option<Self> {
		let window = web_sys::window()?;
		let document = window.document()?;
		let visible = document.visibility_state() == VisibilityState::Visible;

		let shared = Rc::new(PollerShared {
			window,
			feed,
			gate: RefCell::new(PollGate::new(visible)),
			handle: Cell::new(None),
			interval_ms: interval_ms as i32,
			tick: Closure::new(move || feed.refetch()),
		});
		let start = shared.gate.borrow_mut().start();
		shared.apply(start);

		let (shared_vis, document_vis) = (shared.clone(), document.clone());
		let on_visibility = Closure::<dyn FnMut()>::new(move || {
			let visible = document_vis.visibility_state() == VisibilityState::Visible;
			let action = shared_vis.gate.borrow_mut().visibility_changed(visible);
			debug!("visibility changed (visible: {visible}), poll action {action:?}");
			shared_vis.apply(action);
		});
		if let Err(err) = document.add_event_listener_with_callback(
			"visibilitychange",
			on_visibility.as_ref().unchecked_ref(),
		) {
			warn!("could not watch visibility: {err:?}");
		}

		Some(Self {
			document,
			shared,
			on_visibility,
		})
	}

	fn teardown(&self) {
		self.shared.disarm();
		let _ = self.document.remove_event_listener_with_callback(
			"visibilitychange",
			self.on_visibility.as_ref().unchecked_ref(),
		);
		debug!("poller stopped");
	}
}
