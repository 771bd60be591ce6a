use std::collections::{HashMap, HashSet};

use force_graph::DefaultNodeIdx;

use super::camera::{Camera, MAX_SCALE, MIN_SCALE};
use super::layout::{LayoutParams, Simulation, TextMeasure, configure};
use super::types::{GraphData, GraphNode};

/// Fallback hit radius for nodes not yet drawn.
pub const HIT_RADIUS: f64 = 12.0;
/// Pointer travel below which a press-release counts as a click.
pub const CLICK_SLOP: f64 = 4.0;

/// Hit-test footprint recorded by the renderer, centered on the node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeBounds {
	Circle { radius: f64 },
	Rect { width: f64, height: f64 },
	/// Avatar circle plus the caption chip centered `caption_dy` below it.
	Avatar {
		radius: f64,
		caption_width: f64,
		caption_height: f64,
		caption_dy: f64,
	},
}

impl NodeBounds {
	pub fn contains(&self, dx: f64, dy: f64) -> bool {
		match *self {
			NodeBounds::Circle { radius } => dx * dx + dy * dy <= radius * radius,
			NodeBounds::Rect { width, height } => {
				dx.abs() <= width / 2.0 && dy.abs() <= height / 2.0
			}
			NodeBounds::Avatar {
				radius,
				caption_width,
				caption_height,
				caption_dy,
			} => {
				NodeBounds::Circle { radius }.contains(dx, dy)
					|| NodeBounds::Rect {
						width: caption_width,
						height: caption_height,
					}
					.contains(dx, dy - caption_dy)
			}
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

/// What a finished press on a node amounted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
	Click(DefaultNodeIdx),
	Dropped(DefaultNodeIdx),
}

pub struct GraphState {
	pub sim: Simulation,
	pub camera: Camera,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	bounds: HashMap<DefaultNodeIdx, NodeBounds>,
}

impl GraphState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			sim: Simulation::new(LayoutParams::default()),
			camera: Camera::new(width, height),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			bounds: HashMap::new(),
		}
	}

	/// Replace the whole graph and replay the camera choreography.
	pub fn load(&mut self, data: &GraphData, measure: &impl TextMeasure) {
		let fresh = Simulation::new(self.sim.params.clone());
		let previous = std::mem::replace(&mut self.sim, fresh);
		self.sim = configure(previous, data, measure);
		self.bounds.clear();
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = HoverState::default();
		self.camera.start_choreography();
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.camera.transform.screen_to_graph(sx, sy)
	}

	/// Topmost node under the pointer; later nodes paint over earlier ones.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.sim.graph.visit_nodes(|node| {
			let idx = node.index();
			let bounds = self
				.bounds
				.get(&idx)
				.copied()
				.unwrap_or(NodeBounds::Circle { radius: HIT_RADIUS });
			if bounds.contains(gx - node.x() as f64, gy - node.y() as f64) {
				found = Some(idx);
			}
		});
		found
	}

	pub fn node(&self, idx: DefaultNodeIdx) -> Option<&GraphNode> {
		self.sim.node(idx)
	}

	pub fn record_bounds(&mut self, recorded: impl IntoIterator<Item = (DefaultNodeIdx, NodeBounds)>) {
		self.bounds.extend(recorded);
	}

	pub fn begin_drag(&mut self, idx: DefaultNodeIdx, sx: f64, sy: f64) {
		let Some((nx, ny)) = self.sim.position(idx) else {
			return;
		};
		self.drag = DragState {
			active: true,
			node_idx: Some(idx),
			start_x: sx,
			start_y: sy,
			node_start_x: nx,
			node_start_y: ny,
			moved: false,
		};
	}

	fn drag_target(drag: &DragState, k: f64, sx: f64, sy: f64) -> (f64, f64) {
		(
			drag.node_start_x + (sx - drag.start_x) / k,
			drag.node_start_y + (sy - drag.start_y) / k,
		)
	}

	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let (Some(idx), true) = (self.drag.node_idx, self.drag.active) else {
			return;
		};
		let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
		if !self.drag.moved && (dx * dx + dy * dy).sqrt() < CLICK_SLOP {
			return;
		}
		self.drag.moved = true;
		let (x, y) = Self::drag_target(&self.drag, self.camera.transform.k, sx, sy);
		self.sim.hold(idx, x, y);
	}

	/// Finish a press. A drag pins the node where it was released and reheats
	/// the layout; a press without travel is a click.
	pub fn end_drag(&mut self, sx: f64, sy: f64) -> Option<Release> {
		let drag = std::mem::take(&mut self.drag);
		let idx = drag.node_idx.filter(|_| drag.active)?;
		if !drag.moved {
			self.sim.release(idx);
			return Some(Release::Click(idx));
		}
		let (x, y) = Self::drag_target(&drag, self.camera.transform.k, sx, sy);
		self.sim.pin(idx, x, y);
		self.sim.reheat();
		Some(Release::Dropped(idx))
	}

	/// Abandon a press without pinning (pointer left the canvas).
	pub fn cancel_drag(&mut self) {
		if let Some(idx) = self.drag.node_idx.take() {
			self.sim.release(idx);
		}
		self.drag = DragState::default();
	}

	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.camera.interrupt();
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.camera.transform.x,
			transform_start_y: self.camera.transform.y,
		};
	}

	pub fn pan_to(&mut self, sx: f64, sy: f64) {
		if self.pan.active {
			self.camera.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.camera.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		}
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Zoom around the pointer.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
		self.camera.interrupt();
		let t = &mut self.camera.transform;
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (t.k * factor).clamp(MIN_SCALE, MAX_SCALE);
		let ratio = new_k / t.k;
		t.x = sx - (sx - t.x) * ratio;
		t.y = sy - (sy - t.y) * ratio;
		t.k = new_k;
	}

	/// Drop user pins (the focal node goes back to the origin), reheat and
	/// replay the camera choreography.
	pub fn reset_layout(&mut self) {
		self.drag = DragState::default();
		self.sim.unpin_all_except_focal();
		self.sim.reheat();
		self.camera.start_choreography();
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// keep the previous highlight around so it can fade out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for &(src, tgt) in self.sim.links() {
				if src == idx {
					self.hover.neighbors.insert(tgt);
				} else if tgt == idx {
					self.hover.neighbors.insert(src);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn tick(&mut self, dt: f64) {
		self.sim.tick();
		let (width, height) = (self.width, self.height);
		let sim = &self.sim;
		self.camera
			.step(dt, sim.is_settled(), || sim.extent(), width, height);

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
