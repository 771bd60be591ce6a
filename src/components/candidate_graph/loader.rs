use std::cell::Cell;

use log::{debug, warn};

use super::api::FetchError;
use super::types::{GraphData, GraphEdge, GraphNode, NodeKind, RawGraph};

/// Turn a raw payload into a renderable graph centered on `focal`.
///
/// Every raw link `(a, type, b)` becomes a relationship-label node `l` plus the
/// edges `(a, l)` and `(l, b)`, so no typed edge is ever drawn directly. Nodes
/// are ordered labels first and the focal node last, which is also paint order.
///
/// The focal node is the one whose username matches `focal`, or failing that
/// the one whose candidate id does.
pub fn transform(raw: RawGraph, focal: &str) -> GraphData {
	let focal_at = raw
		.nodes
		.iter()
		.position(|node| node.username.as_deref() == Some(focal))
		.or_else(|| {
			raw.nodes
				.iter()
				.position(|node| node.candidate_id.as_deref() == Some(focal))
		});
	let mut nodes: Vec<GraphNode> = raw.nodes.into_iter().map(GraphNode::from_raw).collect();
	let mut edges = Vec::with_capacity(raw.links.len() * 2);

	if let Some(node) = focal_at.and_then(|at| nodes.get_mut(at)) {
		node.focal = true;
		node.fixed = Some((0.0, 0.0));
	}

	for (i, link) in raw.links.into_iter().enumerate() {
		let label_id = format!("rel:{i}:{}:{}", link.source, link.target);
		nodes.push(GraphNode::relationship_label(label_id.clone(), &link.relationship));
		let relationship_type = Some(link.relationship);
		edges.push(GraphEdge {
			source: link.source,
			target: label_id.clone(),
			relationship_type: relationship_type.clone(),
		});
		edges.push(GraphEdge {
			source: label_id,
			target: link.target,
			relationship_type,
		});
	}

	nodes.sort_by_key(paint_rank);
	GraphData { nodes, edges }
}

fn paint_rank(node: &GraphNode) -> u8 {
	match (node.kind, node.focal) {
		(NodeKind::RelationshipLabel, _) => 0,
		(_, true) => 2,
		_ => 1,
	}
}

/// Outcome of a graph fetch as seen by the view.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LoadState {
	#[default]
	Idle,
	Loading,
	Ready(GraphData),
	Empty,
	Failed(String),
}

impl LoadState {
	pub fn graph(&self) -> Option<&GraphData> {
		match self {
			LoadState::Ready(data) => Some(data),
			_ => None,
		}
	}
}

/// Captured at request time; only the newest ticket may apply its result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
	generation: u64,
	pub identifier: String,
}

/// Sequences graph fetches so a slow response never overwrites a newer one.
#[derive(Debug, Default)]
pub struct GraphLoader {
	generation: Cell<u64>,
}

impl GraphLoader {
	/// Start a fetch for `identifier`. Blank identifiers start nothing.
	pub fn begin(&self, identifier: &str) -> Option<LoadTicket> {
		let identifier = identifier.trim();
		if identifier.is_empty() {
			return None;
		}
		let generation = self.generation.get() + 1;
		self.generation.set(generation);
		Some(LoadTicket {
			generation,
			identifier: identifier.to_string(),
		})
	}

	pub fn is_current(&self, ticket: &LoadTicket) -> bool {
		self.generation.get() == ticket.generation
	}

	/// Invalidate every outstanding ticket.
	pub fn cancel(&self) {
		self.generation.set(self.generation.get() + 1);
	}

	/// Resolve a fetch. Returns `None` when the ticket is stale and the
	/// result must be dropped.
	pub fn settle(
		&self,
		ticket: &LoadTicket,
		result: Result<RawGraph, FetchError>,
	) -> Option<LoadState> {
		if !self.is_current(ticket) {
			debug!("discarding stale graph response for {}", ticket.identifier);
			return None;
		}
		Some(match result {
			Ok(raw) if raw.nodes.is_empty() => LoadState::Empty,
			Ok(raw) => LoadState::Ready(transform(raw, &ticket.identifier)),
			Err(err) => {
				warn!("graph fetch for {} failed: {err}", ticket.identifier);
				LoadState::Failed(err.to_string())
			}
		})
	}
}
