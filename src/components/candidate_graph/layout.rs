//! Collision sizing per node kind and the force simulation built on `force_graph`.
//!
//! `force_graph` supplies charge repulsion and edge springs. The passes here add
//! what it lacks: a rest length along edges, collision between node footprints,
//! and weak pulls toward the origin. All extra passes are scaled by a cooling
//! `alpha`, and the simulation stops stepping once alpha falls below its minimum;
//! that moment is the "settled" signal the camera waits for.

use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use web_sys::CanvasRenderingContext2d;

use super::camera::Extent;
use super::palette::display_name_for;
use super::types::{GraphData, GraphNode, NodeKind};

pub const FOCAL_AVATAR_RADIUS: f64 = 22.0;
pub const AVATAR_RADIUS: f64 = 14.0;
pub const CAPTION_FONT_PX: f64 = 10.0;
pub const CAPTION_PADDING: f64 = 8.0;

pub const REPO_FONT_PX: f64 = 11.0;
pub const REPO_HEIGHT: f64 = 22.0;
pub const REPO_ICON_WIDTH: f64 = 12.0;
pub const REPO_ICON_GAP: f64 = 6.0;
pub const REPO_PADDING_X: f64 = 10.0;
const REPO_MARGIN: f64 = 6.0;

pub const LABEL_FONT_PX: f64 = 8.0;
pub const GENERIC_FONT_PX: f64 = 11.0;

/// Text width in graph units at a given font size.
pub trait TextMeasure {
	fn text_width(&self, text: &str, font_px: f64) -> f64;
}

/// Fixed advance per character; used in tests and before a canvas exists.
pub struct EstimatedText;

impl TextMeasure for EstimatedText {
	fn text_width(&self, text: &str, font_px: f64) -> f64 {
		text.chars().count() as f64 * font_px * 0.6
	}
}

impl TextMeasure for CanvasRenderingContext2d {
	fn text_width(&self, text: &str, font_px: f64) -> f64 {
		self.set_font(&font(font_px));
		self.measure_text(text)
			.map(|metrics| metrics.width())
			.unwrap_or_else(|_| EstimatedText.text_width(text, font_px))
	}
}

pub fn font(px: f64) -> String {
	format!("{px}px sans-serif")
}

pub fn avatar_radius(focal: bool) -> f64 {
	if focal {
		FOCAL_AVATAR_RADIUS
	} else {
		AVATAR_RADIUS
	}
}

/// Avatar circle plus the caption underneath it.
pub fn user_radius(focal: bool) -> f64 {
	avatar_radius(focal) + CAPTION_FONT_PX + CAPTION_PADDING
}

/// Full pill width: paddings, icon, gap and the name.
pub fn repository_width(name: &str, measure: &impl TextMeasure) -> f64 {
	REPO_PADDING_X * 2.0 + REPO_ICON_WIDTH + REPO_ICON_GAP + measure.text_width(name, REPO_FONT_PX)
}

pub fn repository_radius(name: &str, measure: &impl TextMeasure) -> f64 {
	repository_width(name, measure) / 2.0 + REPO_MARGIN
}

/// Kept small so labels can sit on the edges they annotate.
pub fn label_radius(text: &str) -> f64 {
	(4.0 + text.chars().count() as f64 * 1.5).min(20.0)
}

pub fn generic_radius(text: &str, measure: &impl TextMeasure) -> f64 {
	(measure.text_width(text, GENERIC_FONT_PX) / 2.0 * 1.3).max(8.0)
}

pub fn collision_radius(node: &GraphNode, measure: &impl TextMeasure) -> f64 {
	let text = display_name_for(node);
	match node.kind {
		NodeKind::User => user_radius(node.focal),
		NodeKind::Repository => repository_radius(text, measure),
		NodeKind::RelationshipLabel => label_radius(text),
		NodeKind::Generic => generic_radius(text, measure),
	}
}

fn mass_for(kind: NodeKind) -> f32 {
	match kind {
		NodeKind::RelationshipLabel => 3.0,
		NodeKind::Generic => 8.0,
		NodeKind::User | NodeKind::Repository => 10.0,
	}
}

#[derive(Clone, Debug)]
pub struct LayoutParams {
	pub charge: f32,
	pub spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping: f32,
	pub link_distance: f64,
	pub link_strength: f64,
	pub collision_strength: f64,
	pub center_strength: f64,
	pub axis_strength: f64,
	pub alpha_decay: f64,
	pub alpha_min: f64,
	pub step: f32,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			charge: 400.0,
			spring: 0.04,
			force_max: 100.0,
			node_speed: 3000.0,
			damping: 0.9,
			link_distance: 60.0,
			link_strength: 0.3,
			collision_strength: 0.8,
			center_strength: 0.05,
			axis_strength: 0.02,
			alpha_decay: 0.03,
			alpha_min: 0.001,
			step: 0.016,
		}
	}
}

impl LayoutParams {
	fn physics(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.charge,
			force_spring: self.spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping,
		}
	}
}

/// Per-node simulation payload.
#[derive(Clone, Debug)]
pub struct NodeInfo {
	pub node: GraphNode,
	pub radius: f64,
}

pub struct Simulation {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub params: LayoutParams,
	alpha: f64,
	links: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
	ids: HashMap<String, DefaultNodeIdx>,
}

/// Snapshot used by the extra passes.
struct Body {
	idx: DefaultNodeIdx,
	x: f64,
	y: f64,
	radius: f64,
	pinned: bool,
}

impl Simulation {
	pub fn new(params: LayoutParams) -> Self {
		Self {
			graph: ForceGraph::new(params.physics()),
			params,
			alpha: 0.0,
			links: Vec::new(),
			ids: HashMap::new(),
		}
	}

	pub fn is_settled(&self) -> bool {
		self.alpha < self.params.alpha_min
	}

	pub fn reheat(&mut self) {
		self.alpha = 1.0;
	}

	pub fn links(&self) -> &[(DefaultNodeIdx, DefaultNodeIdx)] {
		&self.links
	}

	#[cfg(test)]
	pub fn index_of(&self, id: &str) -> Option<DefaultNodeIdx> {
		self.ids.get(id).copied()
	}

	pub fn node(&self, idx: DefaultNodeIdx) -> Option<&GraphNode> {
		self.graph
			.get_graph()
			.node_weight(idx)
			.map(|node| &node.data.user_data.node)
	}

	pub fn position(&self, idx: DefaultNodeIdx) -> Option<(f64, f64)> {
		self.graph
			.get_graph()
			.node_weight(idx)
			.map(|node| (node.x() as f64, node.y() as f64))
	}

	#[cfg(test)]
	pub fn focal_index(&self) -> Option<DefaultNodeIdx> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.data.user_data.node.focal {
				found = Some(node.index());
			}
		});
		found
	}

	/// Move a node without pinning it permanently (drag in progress).
	pub fn hold(&mut self, idx: DefaultNodeIdx, x: f64, y: f64) {
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.x = x as f32;
				node.data.y = y as f32;
				node.data.is_anchor = true;
			}
		});
	}

	pub fn pin(&mut self, idx: DefaultNodeIdx, x: f64, y: f64) {
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.x = x as f32;
				node.data.y = y as f32;
				node.data.is_anchor = true;
				node.data.user_data.node.fixed = Some((x, y));
			}
		});
	}

	/// Release a held node that was never pinned.
	pub fn release(&mut self, idx: DefaultNodeIdx) {
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx && node.data.user_data.node.fixed.is_none() {
				node.data.is_anchor = false;
			}
		});
	}

	/// Clear every pin but the focal node's, which returns to the origin.
	pub fn unpin_all_except_focal(&mut self) {
		self.graph.visit_nodes_mut(|node| {
			let info = &mut node.data.user_data;
			if info.node.focal {
				info.node.fixed = Some((0.0, 0.0));
				node.data.x = 0.0;
				node.data.y = 0.0;
				node.data.is_anchor = true;
			} else {
				info.node.fixed = None;
				node.data.is_anchor = false;
			}
		});
	}

	/// Bounding box of every node's collision footprint.
	pub fn extent(&self) -> Option<Extent> {
		let mut extent: Option<Extent> = None;
		self.graph.visit_nodes(|node| {
			let (x, y, r) = (node.x() as f64, node.y() as f64, node.data.user_data.radius);
			let e = extent.get_or_insert(Extent {
				min_x: x - r,
				min_y: y - r,
				max_x: x + r,
				max_y: y + r,
			});
			e.min_x = e.min_x.min(x - r);
			e.min_y = e.min_y.min(y - r);
			e.max_x = e.max_x.max(x + r);
			e.max_y = e.max_y.max(y + r);
		});
		extent
	}

	/// Advance one step. Returns false once settled.
	pub fn tick(&mut self) -> bool {
		if self.is_settled() {
			return false;
		}
		self.graph.update(self.params.step);

		let mut bodies = self.bodies();
		let index: HashMap<DefaultNodeIdx, usize> =
			bodies.iter().enumerate().map(|(i, b)| (b.idx, i)).collect();
		self.apply_links(&mut bodies, &index);
		self.apply_collisions(&mut bodies);
		self.apply_centering(&mut bodies);

		let moved: HashMap<DefaultNodeIdx, (f64, f64)> = bodies
			.iter()
			.filter(|b| !b.pinned)
			.map(|b| (b.idx, (b.x, b.y)))
			.collect();
		self.graph.visit_nodes_mut(|node| {
			if let Some(&(x, y)) = moved.get(&node.index()) {
				node.data.x = x as f32;
				node.data.y = y as f32;
			}
		});

		self.alpha += (0.0 - self.alpha) * self.params.alpha_decay;
		true
	}

	fn bodies(&self) -> Vec<Body> {
		let mut bodies = Vec::new();
		self.graph.visit_nodes(|node| {
			bodies.push(Body {
				idx: node.index(),
				x: node.x() as f64,
				y: node.y() as f64,
				radius: node.data.user_data.radius,
				pinned: node.data.is_anchor,
			});
		});
		bodies
	}

	fn apply_links(&self, bodies: &mut [Body], index: &HashMap<DefaultNodeIdx, usize>) {
		let strength = self.params.link_strength * self.alpha;
		for (src, tgt) in &self.links {
			let (Some(&i), Some(&j)) = (index.get(src), index.get(tgt)) else {
				continue;
			};
			let (dx, dy) = (bodies[j].x - bodies[i].x, bodies[j].y - bodies[i].y);
			let dist = (dx * dx + dy * dy).sqrt().max(0.01);
			let delta = (dist - self.params.link_distance) / dist * strength;
			let (ix, iy) = (dx * delta, dy * delta);
			match (bodies[i].pinned, bodies[j].pinned) {
				(true, true) => {}
				(true, false) => {
					bodies[j].x -= ix;
					bodies[j].y -= iy;
				}
				(false, true) => {
					bodies[i].x += ix;
					bodies[i].y += iy;
				}
				(false, false) => {
					bodies[i].x += ix * 0.5;
					bodies[i].y += iy * 0.5;
					bodies[j].x -= ix * 0.5;
					bodies[j].y -= iy * 0.5;
				}
			}
		}
	}

	fn apply_collisions(&self, bodies: &mut [Body]) {
		let strength = self.params.collision_strength;
		for i in 0..bodies.len() {
			for j in (i + 1)..bodies.len() {
				let min = bodies[i].radius + bodies[j].radius;
				let (mut dx, mut dy) = (bodies[j].x - bodies[i].x, bodies[j].y - bodies[i].y);
				if dx == 0.0 && dy == 0.0 {
					// coincident: split along a deterministic direction
					let angle = (j - i) as f64;
					dx = angle.cos() * 0.01;
					dy = angle.sin() * 0.01;
				}
				let dist = (dx * dx + dy * dy).sqrt();
				if dist >= min {
					continue;
				}
				let push = (min - dist) / dist * strength;
				let (px, py) = (dx * push, dy * push);
				match (bodies[i].pinned, bodies[j].pinned) {
					(true, true) => {}
					(true, false) => {
						bodies[j].x += px;
						bodies[j].y += py;
					}
					(false, true) => {
						bodies[i].x -= px;
						bodies[i].y -= py;
					}
					(false, false) => {
						bodies[i].x -= px * 0.5;
						bodies[i].y -= py * 0.5;
						bodies[j].x += px * 0.5;
						bodies[j].y += py * 0.5;
					}
				}
			}
		}
	}

	fn apply_centering(&self, bodies: &mut [Body]) {
		let free: Vec<usize> = (0..bodies.len()).filter(|&i| !bodies[i].pinned).collect();
		if free.is_empty() {
			return;
		}
		let n = free.len() as f64;
		let (mx, my) = free.iter().fold((0.0, 0.0), |(sx, sy), &i| {
			(sx + bodies[i].x / n, sy + bodies[i].y / n)
		});
		let (center, axis) = (self.params.center_strength, self.params.axis_strength * self.alpha);
		for &i in &free {
			let body = &mut bodies[i];
			body.x -= mx * center + body.x * axis;
			body.y -= my * center + body.y * axis;
		}
	}
}

/// Bind a freshly loaded graph onto the simulation: nodes in paint order with
/// their collision radii, edges, and pins. Previous contents are discarded.
pub fn configure(mut sim: Simulation, data: &GraphData, measure: &impl TextMeasure) -> Simulation {
	sim.graph.clear();
	sim.graph.parameters = sim.params.physics();
	sim.links.clear();
	sim.ids.clear();

	let count = data.nodes.len().max(1) as f64;
	for (i, node) in data.nodes.iter().enumerate() {
		let (x, y, anchored) = match node.fixed {
			Some((fx, fy)) => (fx, fy, true),
			None => {
				let angle = i as f64 * 2.0 * PI / count;
				let ring = 80.0 + 4.0 * i as f64;
				(ring * angle.cos(), ring * angle.sin(), false)
			}
		};
		let idx = sim.graph.add_node(NodeData {
			x: x as f32,
			y: y as f32,
			mass: mass_for(node.kind),
			is_anchor: anchored,
			user_data: NodeInfo {
				radius: collision_radius(node, measure),
				node: node.clone(),
			},
		});
		sim.ids.insert(node.id.clone(), idx);
	}

	for edge in &data.edges {
		if let (Some(&src), Some(&tgt)) = (sim.ids.get(&edge.source), sim.ids.get(&edge.target)) {
			sim.graph.add_edge(src, tgt, EdgeData::default());
			sim.links.push((src, tgt));
		}
	}

	sim.reheat();
	sim
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::candidate_graph::loader::transform;
	use crate::components::candidate_graph::types::{RawGraph, RawLink, RawNode};

	fn raw() -> RawGraph {
		let node = |id: &str, label: &str, username: Option<&str>| RawNode {
			id: id.into(),
			name: Some(id.into()),
			username: username.map(Into::into),
			label: Some(label.into()),
			..Default::default()
		};
		let link = |s: &str, t: &str, r: &str| RawLink {
			source: s.into(),
			target: t.into(),
			relationship: r.into(),
		};
		RawGraph {
			nodes: vec![
				node("alice", "User", Some("alice")),
				node("bob", "User", Some("bob")),
				node("alice/tool", "Repo", None),
				node("Rust", "Skill", None),
			],
			links: vec![
				link("alice", "alice/tool", "HAS_TOP_REPO"),
				link("alice", "Rust", "HAS_SKILL"),
				link("bob", "Rust", "HAS_SKILL"),
			],
		}
	}

	fn configured() -> Simulation {
		configure(
			Simulation::new(LayoutParams::default()),
			&transform(raw(), "alice"),
			&EstimatedText,
		)
	}

	#[test]
	fn focal_user_is_larger_than_other_users() {
		assert!(user_radius(true) > user_radius(false));
		assert_eq!(user_radius(false), AVATAR_RADIUS + CAPTION_FONT_PX + CAPTION_PADDING);
	}

	#[test]
	fn repository_radius_tracks_name_width() {
		let short = repository_radius("a/b", &EstimatedText);
		let long = repository_radius("someone/a-much-longer-repository", &EstimatedText);
		assert!(long > short);
		let expected = (REPO_PADDING_X * 2.0
			+ REPO_ICON_WIDTH
			+ REPO_ICON_GAP
			+ EstimatedText.text_width("a/b", REPO_FONT_PX))
			/ 2.0 + REPO_MARGIN;
		assert_eq!(short, expected);
	}

	#[test]
	fn labels_stay_small() {
		let label = GraphNode::relationship_label("rel:0".into(), "HAS_TOP_REPO");
		let radius = collision_radius(&label, &EstimatedText);
		assert!(radius <= 20.0);
		assert!(radius < user_radius(false));
		assert!(label_radius("A") < label_radius("HAS_SKILL"));
	}

	#[test]
	fn generic_radius_has_margin_over_half_width() {
		let half = EstimatedText.text_width("Kubernetes", GENERIC_FONT_PX) / 2.0;
		assert!(generic_radius("Kubernetes", &EstimatedText) > half);
		assert_eq!(generic_radius("", &EstimatedText), 8.0);
	}

	#[test]
	fn configure_adds_every_node_and_edge() {
		let sim = configured();
		assert_eq!(sim.graph.get_graph().node_count(), 7);
		assert_eq!(sim.links().len(), 6);
		assert!(!sim.is_settled());
	}

	#[test]
	fn focal_node_stays_at_origin_while_settling() {
		let mut sim = configured();
		let focal = sim.focal_index().unwrap();
		assert_eq!(sim.position(focal), Some((0.0, 0.0)));
		let mut steps = 0;
		while sim.tick() {
			steps += 1;
			assert!(steps < 10_000);
		}
		assert!(sim.is_settled());
		assert_eq!(sim.position(focal), Some((0.0, 0.0)));
		assert_eq!(sim.node(focal).unwrap().fixed, Some((0.0, 0.0)));
	}

	#[test]
	fn settled_simulation_does_not_move() {
		let mut sim = configured();
		while sim.tick() {}
		let bob = sim.index_of("bob").unwrap();
		let before = sim.position(bob);
		assert!(!sim.tick());
		assert_eq!(sim.position(bob), before);
	}

	#[test]
	fn reheat_moves_free_nodes_again() {
		let mut sim = configured();
		while sim.tick() {}
		let repo = sim.index_of("alice/tool").unwrap();
		sim.pin(repo, 240.0, -180.0);
		sim.reheat();

		let before: Vec<(f64, f64)> = ["bob", "Rust"]
			.iter()
			.filter_map(|id| sim.index_of(id).and_then(|i| sim.position(i)))
			.collect();
		assert!(sim.tick());
		let after: Vec<(f64, f64)> = ["bob", "Rust"]
			.iter()
			.filter_map(|id| sim.index_of(id).and_then(|i| sim.position(i)))
			.collect();
		assert_ne!(before, after);
		assert_eq!(sim.position(repo), Some((240.0, -180.0)));
	}

	#[test]
	fn nodes_do_not_overlap_once_settled() {
		let mut sim = configured();
		while sim.tick() {}
		let alice = sim.index_of("alice").unwrap();
		let bob = sim.index_of("bob").unwrap();
		let (ax, ay) = sim.position(alice).unwrap();
		let (bx, by) = sim.position(bob).unwrap();
		let dist = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
		assert!(dist > user_radius(true));
	}

	#[test]
	fn unpin_keeps_only_focal_pinned() {
		let mut sim = configured();
		let bob = sim.index_of("bob").unwrap();
		let focal = sim.focal_index().unwrap();
		sim.pin(bob, 10.0, 10.0);
		sim.pin(focal, 50.0, 50.0);
		sim.unpin_all_except_focal();
		assert_eq!(sim.node(bob).unwrap().fixed, None);
		assert_eq!(sim.node(focal).unwrap().fixed, Some((0.0, 0.0)));
		assert_eq!(sim.position(focal), Some((0.0, 0.0)));
	}

	#[test]
	fn extent_covers_node_footprints() {
		let sim = configured();
		let extent = sim.extent().unwrap();
		assert!(extent.min_x <= -user_radius(true));
		assert!(extent.max_x >= user_radius(true));
	}
}
