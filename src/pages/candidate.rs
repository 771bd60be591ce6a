use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;

use crate::components::candidate_graph::CandidateGraph;

const GRAPH_HEIGHT: f64 = 640.0;

/// Graph view for `/candidates/:username`.
#[component]
pub fn CandidatePage() -> impl IntoView {
	let params = use_params_map();
	let username = Signal::derive(move || params.with(|p| p.get("username").unwrap_or_default()));

	// the graph may re-root away from the route parameter
	let focused = RwSignal::new(username.get_untracked());
	Effect::new(move |_| focused.set(username.get()));
	let on_identifier_change = Callback::new(move |identifier: String| focused.set(identifier));

	view! {
		<main class="candidate">
			<header class="candidate-header">
				<A href="/">"Back to search"</A>
				<h1>"Viewing " {move || focused.get()}</h1>
			</header>
			<CandidateGraph
				identifier=username
				height=GRAPH_HEIGHT
				on_identifier_change=on_identifier_change
			/>
		</main>
	}
}
