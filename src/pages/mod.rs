use leptos::callback::Callback;
use leptos::prelude::*;

use crate::activity::{FeedState, FeedView};
use crate::components::{ErrorOverlay, StaleBanner};

pub mod globe;
pub mod home;
pub mod not_found;
pub mod store;

/// Status layer over a view: loading note, error overlay, or a stale-data banner.
fn feed_status<T>(state: &FeedState<T>, what: &'static str, retry: Callback<()>) -> AnyView {
	match state.view() {
		FeedView::Loading => view! { <div class="status">"Loading " {what} "…"</div> }.into_any(),
		FeedView::Failed(message) => {
			view! { <ErrorOverlay message=message.to_string() on_retry=retry /> }.into_any()
		}
		FeedView::Ready {
			stale_error: Some(message),
			..
		} => view! { <StaleBanner message=message.to_string() on_retry=retry /> }.into_any(),
		FeedView::Ready { .. } => ().into_any(),
	}
}
