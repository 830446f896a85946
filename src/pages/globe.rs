use std::collections::BTreeSet;

use leptos::callback::Callback;
use leptos::prelude::*;

use super::feed_status;
use crate::activity::{ActivityType, use_activity_feed};
use crate::components::FilterBar;
use crate::components::globe::{GlobeCanvas, use_geo_directory};
use crate::config::AppConfig;

/// Activity between agents plotted on a globe. Loads once; no polling.
#[component]
pub fn Globe() -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let feed = use_activity_feed(config.static_feed());
	let geo = use_geo_directory();
	let enabled = RwSignal::new(ActivityType::ALL.into_iter().collect::<BTreeSet<_>>());

	let activities = Memo::new(move |_| feed.state.with(|s| s.data().cloned().unwrap_or_default()));
	let directory = Memo::new(move |_| geo.state.with(|s| s.data().cloned().unwrap_or_default()));
	let retry = Callback::new(move |_| {
		feed.refetch();
		geo.refetch();
	});

	view! {
		<div class="fullscreen-graph">
			<GlobeCanvas activities=activities directory=directory enabled_types=enabled />
			<div class="graph-overlay">
				<h1>"Activity Globe"</h1>
				<p class="subtitle">"Drag to rotate."</p>
				<FilterBar enabled=enabled />
			</div>
			{move || feed.state.with(|s| feed_status(s, "activity", retry))}
			{move || geo.state.with(|s| feed_status(s, "agent locations", retry))}
		</div>
	}
}
