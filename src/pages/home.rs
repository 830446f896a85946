use std::collections::BTreeSet;

use leptos::callback::{Callback, UnsyncCallback};
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

use super::feed_status;
use crate::activity::{ActivityType, use_activity_feed};
use crate::components::FilterBar;
use crate::components::activity_graph::ActivityGraphCanvas;
use crate::config::AppConfig;

/// Live activity network
#[component]
pub fn Home() -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let feed = use_activity_feed(config.polling_feed());
	let enabled = RwSignal::new(ActivityType::ALL.into_iter().collect::<BTreeSet<_>>());
	let activities = Memo::new(move |_| feed.state.with(|s| s.data().cloned().unwrap_or_default()));

	let navigate = use_navigate();
	let on_store_click = UnsyncCallback::new(move |id: String| {
		navigate(&format!("/stores/{id}"), Default::default());
	});
	let retry = Callback::new(move |_| feed.refetch());

	view! {
		<div class="fullscreen-graph">
			<ActivityGraphCanvas
				activities=activities
				enabled_types=enabled
				on_store_click=on_store_click
			/>
			<div class="graph-overlay">
				<h1>"Marketplace Activity"</h1>
				<p class="subtitle">
					"Drag nodes to reposition. Scroll to zoom. Drag background to pan. Click a store to open it."
				</p>
				<FilterBar enabled=enabled />
			</div>
			{move || feed.state.with(|s| feed_status(s, "activity", retry))}
		</div>
	}
}
