use leptos::callback::{Callable, Callback};
use leptos::prelude::*;

/// Shown in place of a view that has never loaded.
#[component]
pub fn ErrorOverlay(
	/// What went wrong, as shown to the user.
	#[prop(into)]
	message: String,
	/// Runs when the retry button is pressed.
	on_retry: Callback<()>,
) -> impl IntoView {
	view! {
		<div class="error-overlay" role="alert">
			<h2>"Could not load activity"</h2>
			<p class="error-message">{message}</p>
			<button on:click=move |_| on_retry.run(())>"Retry"</button>
		</div>
	}
}

/// Thin notice over a view whose latest refresh failed while older data is still shown.
#[component]
pub fn StaleBanner(
	/// Error of the failed refresh.
	#[prop(into)]
	message: String,
	/// Runs when the retry button is pressed.
	on_retry: Callback<()>,
) -> impl IntoView {
	view! {
		<div class="stale-banner" role="status">
			<span>"Showing earlier data: " {message}</span>
			<button on:click=move |_| on_retry.run(())>"Retry"</button>
		</div>
	}
}
