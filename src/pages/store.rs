use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;

/// Landing spot for store clicks. The storefront pages themselves live elsewhere.
#[component]
pub fn StorePage() -> impl IntoView {
	let params = use_params_map();
	let store_id = move || params.read().get("id").unwrap_or_default();

	view! {
		<div class="store-page">
			<h1>"Store " {store_id}</h1>
			<A href="/">"Back to the network"</A>
		</div>
	}
}
