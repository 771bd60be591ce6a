use leptos::prelude::*;
use log::warn;

use super::api::FetchError;

pub const ANALYSIS_UNAVAILABLE: &str = "Analysis currently unavailable.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AnalysisState {
	#[default]
	Closed,
	Loading {
		repo_url: String,
	},
	Loaded {
		repo_url: String,
		analysis: String,
	},
	Failed {
		repo_url: String,
	},
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisTicket {
	generation: u64,
	pub repo_url: String,
}

/// Repository analysis modal: `closed -> loading -> loaded | failed -> closed`.
/// Closing or reopening invalidates any response still in flight.
#[derive(Clone, Debug, Default)]
pub struct AnalysisModal {
	state: AnalysisState,
	generation: u64,
}

impl AnalysisModal {
	pub fn state(&self) -> &AnalysisState {
		&self.state
	}

	pub fn is_open(&self) -> bool {
		self.state != AnalysisState::Closed
	}

	pub fn open(&mut self, repo_url: String) -> AnalysisTicket {
		self.generation += 1;
		self.state = AnalysisState::Loading {
			repo_url: repo_url.clone(),
		};
		AnalysisTicket {
			generation: self.generation,
			repo_url,
		}
	}

	/// Apply a response. Returns false when the modal moved on without it.
	pub fn settle(&mut self, ticket: &AnalysisTicket, result: Result<String, FetchError>) -> bool {
		if ticket.generation != self.generation || !matches!(self.state, AnalysisState::Loading { .. })
		{
			return false;
		}
		let repo_url = ticket.repo_url.clone();
		self.state = match result {
			Ok(analysis) if !analysis.trim().is_empty() => AnalysisState::Loaded { repo_url, analysis },
			Ok(_) => AnalysisState::Failed { repo_url },
			Err(err) => {
				warn!("analysis of {repo_url} failed: {err}");
				AnalysisState::Failed { repo_url }
			}
		};
		true
	}

	pub fn close(&mut self) {
		self.generation += 1;
		self.state = AnalysisState::Closed;
	}
}

#[component]
pub fn RepoAnalysisModal(modal: RwSignal<AnalysisModal>) -> impl IntoView {
	let close = move |_: leptos::ev::MouseEvent| modal.update(AnalysisModal::close);
	let title = move || {
		modal.with(|m| match m.state() {
			AnalysisState::Closed => String::new(),
			AnalysisState::Loading { repo_url }
			| AnalysisState::Loaded { repo_url, .. }
			| AnalysisState::Failed { repo_url } => repo_url.clone(),
		})
	};
	let body = move || {
		modal.with(|m| match m.state() {
			AnalysisState::Loading { .. } => view! {
				<p class="analysis-loading">"Analyzing repository…"</p>
			}
			.into_any(),
			AnalysisState::Loaded { analysis, .. } => {
				let lines: Vec<String> = analysis.lines().map(str::to_string).collect();
				view! {
					<div class="analysis-text">
						{lines.into_iter().map(|line| view! { <p>{line}</p> }).collect_view()}
					</div>
				}
				.into_any()
			}
			AnalysisState::Failed { .. } => view! {
				<p class="analysis-error">{ANALYSIS_UNAVAILABLE}</p>
			}
			.into_any(),
			AnalysisState::Closed => ().into_any(),
		})
	};

	view! {
		<Show when=move || modal.with(AnalysisModal::is_open)>
			<div class="analysis-backdrop" on:click=close>
				<div class="analysis-modal" on:click=|ev| ev.stop_propagation()>
					<header>
						<h2>{title}</h2>
						<button class="analysis-close" on:click=close>"Close"</button>
					</header>
					{body}
				</div>
			</div>
		</Show>
	}
}
