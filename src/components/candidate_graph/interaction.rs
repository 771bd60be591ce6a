//! Click routing by node kind and tracking of the focused identifier.

use log::debug;

use super::palette::display_name_for;
use super::types::{GraphNode, NodeKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickAction {
	Ignore,
	OpenAnalysis { repo_url: String },
	Reroot { identifier: String },
}

pub fn click_action(node: &GraphNode) -> ClickAction {
	match node.kind {
		NodeKind::RelationshipLabel => ClickAction::Ignore,
		NodeKind::Repository => repository_click(node),
		NodeKind::User => user_click(node),
		NodeKind::Generic => ClickAction::Ignore,
	}
}

fn repository_click(node: &GraphNode) -> ClickAction {
	match normalize_repository(display_name_for(node)) {
		Some(repo_url) => ClickAction::OpenAnalysis { repo_url },
		None => {
			debug!("repository {:?} has no owner/name, ignoring click", node.id);
			ClickAction::Ignore
		}
	}
}

fn user_click(node: &GraphNode) -> ClickAction {
	if node.focal {
		return ClickAction::Ignore;
	}
	match node.username.as_deref().map(str::trim) {
		Some(username) if !username.is_empty() => ClickAction::Reroot {
			identifier: username.to_string(),
		},
		_ => ClickAction::Ignore,
	}
}

/// Normalize `owner/name`, `github.com/owner/name` or a full GitHub URL to
/// `github.com/owner/name`. Anything without both parts is rejected.
pub fn normalize_repository(raw: &str) -> Option<String> {
	let mut path = raw.trim();
	for prefix in ["https://", "http://"] {
		path = path.strip_prefix(prefix).unwrap_or(path);
	}
	path = path.strip_prefix("www.").unwrap_or(path);
	path = path.strip_prefix("github.com/").unwrap_or(path);

	let mut parts = path.split('/').map(str::trim).filter(|part| !part.is_empty());
	let owner = parts.next()?;
	let name = parts.next()?;
	let name = name.strip_suffix(".git").unwrap_or(name);
	if name.is_empty() || owner.contains(['.', ':']) {
		return None;
	}
	Some(format!("github.com/{owner}/{name}"))
}

/// The identifier a view was opened with and the one it is showing now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootTracker {
	original: String,
	current: String,
}

impl RootTracker {
	pub fn new(identifier: impl Into<String>) -> Self {
		let identifier = identifier.into();
		Self {
			original: identifier.clone(),
			current: identifier,
		}
	}

	pub fn current(&self) -> &str {
		&self.current
	}

	#[cfg(test)]
	pub fn original(&self) -> &str {
		&self.original
	}

	/// Focus another node from inside the view. Returns whether it changed.
	pub fn reroot(&mut self, identifier: &str) -> bool {
		if self.current == identifier {
			return false;
		}
		self.current = identifier.to_string();
		true
	}

	/// The host supplied an identifier. Blank input and echoes of the current
	/// one are ignored; anything else starts over with a new original.
	pub fn sync_external(&mut self, identifier: &str) -> bool {
		if identifier.trim().is_empty() || self.current == identifier {
			return false;
		}
		*self = Self::new(identifier);
		true
	}

	/// Return to the original identifier if the view was re-rooted away from it.
	pub fn reset(&mut self) -> Option<String> {
		if self.current == self.original {
			return None;
		}
		self.current = self.original.clone();
		Some(self.original.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::candidate_graph::loader::GraphLoader;

	fn node(kind: NodeKind, name: &str, username: Option<&str>, focal: bool) -> GraphNode {
		GraphNode {
			id: format!("id-{name}"),
			name: Some(name.into()),
			username: username.map(Into::into),
			kind,
			tags: Vec::new(),
			avatar_url: None,
			fixed: None,
			focal,
		}
	}

	#[test]
	fn labels_and_generic_nodes_are_inert() {
		let label = GraphNode::relationship_label("rel:0".into(), "OWNS");
		assert_eq!(click_action(&label), ClickAction::Ignore);
		let skill = node(NodeKind::Generic, "Rust", None, false);
		assert_eq!(click_action(&skill), ClickAction::Ignore);
	}

	#[test]
	fn repository_with_owner_opens_analysis() {
		let repo = node(NodeKind::Repository, "alice/tool", None, false);
		assert_eq!(
			click_action(&repo),
			ClickAction::OpenAnalysis {
				repo_url: "github.com/alice/tool".into()
			}
		);
	}

	#[test]
	fn bare_repository_name_does_nothing() {
		let repo = node(NodeKind::Repository, "tool", None, false);
		assert_eq!(click_action(&repo), ClickAction::Ignore);
	}

	#[test]
	fn other_users_reroot_focal_does_not() {
		let bob = node(NodeKind::User, "Bob", Some("bob"), false);
		assert_eq!(
			click_action(&bob),
			ClickAction::Reroot {
				identifier: "bob".into()
			}
		);
		let alice = node(NodeKind::User, "Alice", Some("alice"), true);
		assert_eq!(click_action(&alice), ClickAction::Ignore);
		let anonymous = node(NodeKind::User, "?", None, false);
		assert_eq!(click_action(&anonymous), ClickAction::Ignore);
	}

	#[test]
	fn normalizes_repository_forms() {
		for raw in [
			"alice/tool",
			"github.com/alice/tool",
			"https://github.com/alice/tool",
			"https://www.github.com/alice/tool.git",
			"http://github.com/alice/tool/tree/main",
			" alice/tool/ ",
		] {
			assert_eq!(
				normalize_repository(raw).as_deref(),
				Some("github.com/alice/tool"),
				"{raw}"
			);
		}
		assert_eq!(normalize_repository("tool"), None);
		assert_eq!(normalize_repository("alice/"), None);
		assert_eq!(normalize_repository(""), None);
		assert_eq!(normalize_repository("https://gitlab.com/alice"), None);
	}

	#[test]
	fn reset_after_reroot_returns_to_original_and_refetches() {
		let loader = GraphLoader::default();
		let mut tracker = RootTracker::new("alice");
		assert!(tracker.reroot("bob"));
		assert_eq!(tracker.current(), "bob");

		let target = tracker.reset();
		assert_eq!(target.as_deref(), Some("alice"));
		assert_eq!(tracker.current(), "alice");
		let ticket = loader.begin(tracker.current()).unwrap();
		assert_eq!(ticket.identifier, "alice");

		assert_eq!(tracker.reset(), None);
	}

	#[test]
	fn host_echo_keeps_original() {
		let mut tracker = RootTracker::new("alice");
		tracker.reroot("bob");
		assert!(!tracker.sync_external("bob"));
		assert_eq!(tracker.original(), "alice");
		assert!(tracker.sync_external("carol"));
		assert_eq!(tracker.original(), "carol");
		assert_eq!(tracker.reset(), None);
	}

	#[test]
	fn blank_host_identifier_is_ignored() {
		let mut tracker = RootTracker::new("alice");
		tracker.reroot("bob");
		assert!(!tracker.sync_external(""));
		assert!(!tracker.sync_external("   "));
		assert_eq!(tracker.current(), "bob");
		assert_eq!(tracker.original(), "alice");
		assert_eq!(tracker.reset(), Some("alice".to_string()));
	}
}
