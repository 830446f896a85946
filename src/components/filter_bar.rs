use std::collections::BTreeSet;

use leptos::prelude::*;

use crate::activity::ActivityType;

/// Flips `kind` in `enabled`.
pub fn toggle_type(enabled: &mut BTreeSet<ActivityType>, kind: ActivityType) {
	if !enabled.remove(&kind) {
		enabled.insert(kind);
	}
}

/// One toggle chip per activity type.
#[component]
pub fn FilterBar(
	/// Types currently shown; chips toggle membership.
	enabled: RwSignal<BTreeSet<ActivityType>>,
) -> impl IntoView {
	let chips = ActivityType::ALL
		.into_iter()
		.map(|kind| {
			let active = move || enabled.with(|set| set.contains(&kind));
			view! {
				<button
					class="filter-chip"
					class:active=active
					style:border-color=kind.color()
					style:opacity=move || if active() { "1" } else { "0.4" }
					on:click=move |_| enabled.update(|set| toggle_type(set, kind))
				>
					<span class="swatch" style:background=kind.color()></span>
					{kind.label()}
				</button>
			}
		})
		.collect_view();

	view! { <div class="filter-bar">{chips}</div> }
}
