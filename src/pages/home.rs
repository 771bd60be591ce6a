use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

/// Candidate search form; submitting opens that candidate's graph.
#[component]
pub fn Home() -> impl IntoView {
	let username = RwSignal::new(String::new());
	let navigate = use_navigate();

	let on_submit = move |ev: SubmitEvent| {
		ev.prevent_default();
		let name = username.get_untracked();
		let name = name.trim();
		if name.is_empty() {
			return;
		}
		let encoded = String::from(js_sys::encode_uri_component(name));
		navigate(&format!("/candidates/{encoded}"), Default::default());
	};

	view! {
		<main class="home">
			<h1>"Candidate Graph"</h1>
			<p class="subtitle">
				"Enter a GitHub username to explore repositories, skills and connections."
			</p>
			<form on:submit=on_submit>
				<input type="text" placeholder="username" bind:value=username />
				<button type="submit">"Explore"</button>
			</form>
		</main>
	}
}
