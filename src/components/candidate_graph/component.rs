use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::html::{Canvas, Div};
use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, ResizeObserver, WheelEvent};

use super::analysis::{AnalysisModal, RepoAnalysisModal};
use super::api;
use super::avatar::{AvatarCache, HtmlImageLoader};
use super::interaction::{ClickAction, RootTracker, click_action};
use super::loader::{GraphLoader, LoadState};
use super::palette::legend_entries;
use super::render;
use super::state::{GraphState, Release};
use super::types::GraphData;
use crate::config::ApiConfig;

/// Step used for the first frame and as the ceiling after a stall.
const DEFAULT_FRAME_DT: f64 = 0.016;
const MAX_FRAME_DT: f64 = 0.1;
const FALLBACK_WIDTH: f64 = 800.0;

struct Scene {
	state: GraphState,
	canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl Scene {
	fn load(&mut self, data: &GraphData) {
		self.state.load(data, &self.ctx);
	}
}

type SceneCell = Rc<RefCell<Option<Scene>>>;
type FrameCell = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn pointer(canvas_ref: NodeRef<Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Seconds elapsed between two animation-frame timestamps given in
/// milliseconds. Clamped so a backgrounded tab does not fling the layout.
fn frame_dt(last: Option<f64>, now_ms: f64) -> f64 {
	match last {
		Some(last) => ((now_ms - last) / 1000.0).clamp(0.0, MAX_FRAME_DT),
		None => DEFAULT_FRAME_DT,
	}
}

fn request_frame(frame: &FrameCell) {
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Some(cb) = frame.borrow().as_ref() {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	match canvas.get_context("2d") {
		Ok(Some(ctx)) => ctx.dyn_into().ok(),
		Ok(None) => None,
		Err(err) => {
			error!("canvas context request failed: {err:?}");
			None
		}
	}
}

/// Force-directed relationship graph around one candidate.
///
/// The host supplies the identifier and a fixed height; width follows the
/// container. Re-rooting from inside the graph is reported through
/// `on_identifier_change`.
#[component]
pub fn CandidateGraph(
	#[prop(into)] identifier: Signal<String>,
	#[prop(default = 600.0)] height: f64,
	#[prop(optional)] on_identifier_change: Option<Callback<String>>,
	/// Shared avatar cache; a fresh one is created when omitted.
	#[prop(optional)]
	avatars: Option<Rc<AvatarCache<HtmlImageLoader>>>,
) -> impl IntoView {
	let config = use_context::<ApiConfig>().unwrap_or_default();
	let avatars = avatars.unwrap_or_else(|| Rc::new(AvatarCache::new(HtmlImageLoader)));
	let canvas_ref = NodeRef::<Canvas>::new();
	let container_ref = NodeRef::<Div>::new();
	let scene: SceneCell = Rc::new(RefCell::new(None));
	let loader = Rc::new(GraphLoader::default());

	let mounted = Arc::new(AtomicBool::new(true));
	let mounted_cleanup = mounted.clone();
	on_cleanup(move || mounted_cleanup.store(false, Ordering::Relaxed));

	let load_state = RwSignal::new(LoadState::default());
	let tracker = RwSignal::new(RootTracker::new(identifier.get_untracked()));
	let modal = RwSignal::new(AnalysisModal::default());
	let focused = Memo::new(move |_| tracker.with(|t| t.current().to_string()));
	let legend = Memo::new(move |_| {
		load_state.with(|state| state.graph().map(legend_entries).unwrap_or_default())
	});

	Effect::new(move |_| {
		let id = identifier.get();
		if id.trim().is_empty() {
			return;
		}
		if tracker.with_untracked(|t| t.current() != id) {
			tracker.update(|t| {
				t.sync_external(&id);
			});
		}
	});

	let (loader_fetch, config_fetch, mounted_fetch) = (loader.clone(), config.clone(), mounted.clone());
	Effect::new(move |_| {
		let identifier = focused.get();
		let Some(ticket) = loader_fetch.begin(&identifier) else {
			return;
		};
		info!("fetching graph for {}", ticket.identifier);
		load_state.set(LoadState::Loading);
		let (loader, config, mounted) = (loader_fetch.clone(), config_fetch.clone(), mounted_fetch.clone());
		spawn_local(async move {
			let result = api::fetch_graph(&config, &ticket.identifier).await;
			if !mounted.load(Ordering::Relaxed) {
				return;
			}
			if let Some(next) = loader.settle(&ticket, result) {
				load_state.set(next);
			}
		});
	});

	let (scene_apply, avatars_apply) = (scene.clone(), avatars.clone());
	Effect::new(move |_| {
		let cleared = GraphData::default();
		load_state.with(|state| {
			let data = match state {
				LoadState::Ready(data) => data,
				LoadState::Loading | LoadState::Idle => return,
				LoadState::Empty | LoadState::Failed(_) => &cleared,
			};
			avatars_apply.prefetch(&data.nodes);
			if let Some(scene) = scene_apply.borrow_mut().as_mut() {
				scene.load(data);
			}
		});
	});

	let (scene_init, avatars_frame, mounted_init) = (scene.clone(), avatars.clone(), mounted.clone());
	Effect::new(move |_| {
		let (Some(canvas), Some(container)) = (canvas_ref.get(), container_ref.get()) else {
			return;
		};
		if scene_init.borrow().is_some() {
			return;
		}
		let width = match container.client_width() as f64 {
			w if w > 0.0 => w,
			_ => FALLBACK_WIDTH,
		};
		canvas.set_width(width as u32);
		canvas.set_height(height as u32);
		let Some(ctx) = context_2d(&canvas) else {
			error!("2d canvas context unavailable, graph will not render");
			return;
		};

		let mut fresh = Scene {
			state: GraphState::new(width, height),
			canvas,
			ctx,
		};
		if let Some(data) = load_state.with_untracked(|state| state.graph().cloned()) {
			fresh.load(&data);
		}
		*scene_init.borrow_mut() = Some(fresh);

		let (scene_resize, mounted_resize) = (scene_init.clone(), mounted_init.clone());
		let observed = container.clone();
		let on_resize = Closure::<dyn FnMut(js_sys::Array, ResizeObserver)>::new(
			move |_entries: js_sys::Array, observer: ResizeObserver| {
				if !mounted_resize.load(Ordering::Relaxed) {
					observer.disconnect();
					return;
				}
				let width = observed.client_width() as f64;
				if width <= 0.0 {
					return;
				}
				if let Some(scene) = scene_resize.borrow_mut().as_mut() {
					if (scene.state.width - width).abs() >= 1.0 {
						scene.canvas.set_width(width as u32);
						scene.state.resize(width, height);
					}
				}
			},
		)
		.into_js_value();
		match ResizeObserver::new(on_resize.unchecked_ref()) {
			Ok(observer) => observer.observe(&container),
			Err(err) => warn!("resize observer unavailable: {err:?}"),
		}

		let frame: FrameCell = Rc::new(RefCell::new(None));
		let (scene_frame, frame_next, avatars, mounted) = (
			scene_init.clone(),
			frame.clone(),
			avatars_frame.clone(),
			mounted_init.clone(),
		);
		let mut last_timestamp = None;
		*frame.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
			if !mounted.load(Ordering::Relaxed) {
				return;
			}
			let dt = frame_dt(last_timestamp, timestamp);
			last_timestamp = Some(timestamp);
			if let Some(scene) = scene_frame.borrow_mut().as_mut() {
				scene.state.tick(dt);
				render::render(&mut scene.state, &scene.ctx, &avatars);
			}
			request_frame(&frame_next);
		}));
		request_frame(&frame);
	});

	let scene_md = scene.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(scene) = scene_md.borrow_mut().as_mut() {
			match scene.state.node_at_position(x, y) {
				Some(idx) => scene.state.begin_drag(idx, x, y),
				None => scene.state.begin_pan(x, y),
			}
		}
	};

	let scene_mm = scene.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(scene) = scene_mm.borrow_mut().as_mut() {
			let s = &mut scene.state;
			if s.drag.active {
				s.drag_to(x, y);
			} else {
				let hovered = s.node_at_position(x, y);
				s.set_hover(hovered);
				s.pan_to(x, y);
			}
		}
	};

	let (scene_mu, config_click, mounted_click) = (scene.clone(), config.clone(), mounted.clone());
	let on_mouseup = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		let action = {
			let mut guard = scene_mu.borrow_mut();
			let Some(scene) = guard.as_mut() else {
				return;
			};
			scene.state.end_pan();
			match scene.state.end_drag(x, y) {
				Some(Release::Click(idx)) => scene.state.node(idx).map(click_action),
				_ => None,
			}
		};

		match action {
			Some(ClickAction::Reroot { identifier }) => {
				if tracker.try_update(|t| t.reroot(&identifier)).unwrap_or(false) {
					info!("re-rooting graph on {identifier}");
					if let Some(cb) = on_identifier_change {
						cb.run(identifier);
					}
				}
			}
			Some(ClickAction::OpenAnalysis { repo_url }) => {
				let Some(ticket) = modal.try_update(|m| m.open(repo_url)) else {
					return;
				};
				info!("requesting analysis for {}", ticket.repo_url);
				let (config, mounted) = (config_click.clone(), mounted_click.clone());
				spawn_local(async move {
					let result = api::fetch_analysis(&config, &ticket.repo_url).await;
					if mounted.load(Ordering::Relaxed) {
						modal.update(|m| {
							m.settle(&ticket, result);
						});
					}
				});
			}
			Some(ClickAction::Ignore) | None => {}
		}
	};

	let scene_ml = scene.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(scene) = scene_ml.borrow_mut().as_mut() {
			scene.state.cancel_drag();
			scene.state.end_pan();
			scene.state.set_hover(None);
		}
	};

	let scene_wh = scene.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(scene) = scene_wh.borrow_mut().as_mut() {
			scene.state.zoom_at(x, y, ev.delta_y());
		}
	};

	let scene_reset = scene.clone();
	let on_reset = move |_: MouseEvent| {
		if let Some(scene) = scene_reset.borrow_mut().as_mut() {
			scene.state.reset_layout();
		}
		if let Some(original) = tracker.try_update(RootTracker::reset).flatten() {
			info!("reset re-roots graph on {original}");
			if let Some(cb) = on_identifier_change {
				cb.run(original);
			}
		}
	};

	let status = move || {
		load_state.with(|state| match state {
			LoadState::Loading => Some(
				view! { <div class="graph-status">"Loading graph…"</div> }.into_any(),
			),
			LoadState::Failed(message) => Some(
				view! {
					<div class="graph-status graph-error">
						{format!("Failed to load graph: {message}")}
					</div>
				}
				.into_any(),
			),
			LoadState::Empty => Some(
				view! { <div class="graph-status">"No graph data for this candidate."</div> }
					.into_any(),
			),
			LoadState::Idle | LoadState::Ready(_) => None,
		})
	};

	view! {
		<div
			node_ref=container_ref
			class="candidate-graph"
			style=format!("position: relative; width: 100%; height: {height}px;")
		>
			<canvas
				node_ref=canvas_ref
				class="candidate-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			<GraphLegend entries=legend />
			<button class="graph-reset" on:click=on_reset>
				"Reset"
			</button>
			{status}
			<RepoAnalysisModal modal=modal />
		</div>
	}
}

#[component]
fn GraphLegend(entries: Memo<Vec<(String, &'static str)>>) -> impl IntoView {
	view! {
		<Show when=move || entries.with(|e| !e.is_empty())>
			<ul class="graph-legend">
				{move || {
					entries
						.get()
						.into_iter()
						.map(|(caption, color)| {
							view! {
								<li>
									<span
										class="legend-swatch"
										style=format!("background-color: {color};")
									></span>
									{caption}
								</li>
							}
						})
						.collect_view()
				}}
			</ul>
		</Show>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_frame_uses_the_default_step() {
		assert_eq!(frame_dt(None, 1234.5), DEFAULT_FRAME_DT);
	}

	#[test]
	fn step_follows_the_frame_timestamps() {
		assert!((frame_dt(Some(1000.0), 1008.0) - 0.008).abs() < 1e-9);
		assert!((frame_dt(Some(1000.0), 1033.0) - 0.033).abs() < 1e-9);
	}

	#[test]
	fn stalls_and_clock_skew_are_clamped() {
		assert_eq!(frame_dt(Some(0.0), 5000.0), MAX_FRAME_DT);
		assert_eq!(frame_dt(Some(1000.0), 990.0), 0.0);
	}
}
