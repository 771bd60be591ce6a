use std::collections::BTreeSet;

use serde::Deserialize;

/// What a node represents; drives collision sizing, drawing and click routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	User,
	Repository,
	RelationshipLabel,
	Generic,
}

impl NodeKind {
	pub fn as_str(self) -> &'static str {
		match self {
			NodeKind::User => "user",
			NodeKind::Repository => "repository",
			NodeKind::RelationshipLabel => "relationship-label",
			NodeKind::Generic => "generic",
		}
	}

	/// Classify a raw node from its label tags, falling back to structural markers.
	pub fn classify(tags: &[String], username: Option<&str>) -> Self {
		let has = |names: &[&str]| {
			tags.iter()
				.any(|tag| names.iter().any(|name| tag.eq_ignore_ascii_case(name)))
		};
		if has(&["User", "Candidate"]) {
			NodeKind::User
		} else if has(&["Repo", "Repository"]) {
			NodeKind::Repository
		} else if tags.is_empty() && username.is_some() {
			NodeKind::User
		} else {
			NodeKind::Generic
		}
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawNode {
	pub id: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub username: Option<String>,
	#[serde(default)]
	pub label: Option<String>,
	#[serde(default)]
	pub labels: Vec<String>,
	#[serde(default, alias = "avatarUrl")]
	pub avatar_url: Option<String>,
	#[serde(default, rename = "candidateId", alias = "candidate_id")]
	pub candidate_id: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawLink {
	pub source: String,
	pub target: String,
	#[serde(rename = "type", default)]
	pub relationship: String,
}

/// Payload of the candidate-graph endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawGraph {
	#[serde(default)]
	pub nodes: Vec<RawNode>,
	#[serde(default)]
	pub links: Vec<RawLink>,
}

/// A renderable node. Positions live in the simulation; hit-test bounds are
/// recorded per frame by the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	pub id: String,
	pub name: Option<String>,
	pub username: Option<String>,
	pub kind: NodeKind,
	/// Sorted, deduplicated label tags.
	pub tags: Vec<String>,
	pub avatar_url: Option<String>,
	/// Pin override; a pinned node is never moved by the layout.
	pub fixed: Option<(f64, f64)>,
	pub focal: bool,
}

impl GraphNode {
	pub fn from_raw(raw: RawNode) -> Self {
		let tags: BTreeSet<String> = raw
			.label
			.into_iter()
			.chain(raw.labels)
			.map(|tag| tag.trim().to_string())
			.filter(|tag| !tag.is_empty())
			.collect();
		let tags: Vec<String> = tags.into_iter().collect();
		let kind = NodeKind::classify(&tags, raw.username.as_deref());
		Self {
			id: raw.id,
			name: raw.name,
			username: raw.username,
			kind,
			tags,
			avatar_url: raw.avatar_url.filter(|url| !url.trim().is_empty()),
			fixed: None,
			focal: false,
		}
	}

	/// Synthetic node carrying a relationship's type as its display text.
	pub fn relationship_label(id: String, relationship: &str) -> Self {
		Self {
			id,
			name: Some(relationship.to_string()),
			username: None,
			kind: NodeKind::RelationshipLabel,
			tags: Vec::new(),
			avatar_url: None,
			fixed: None,
			focal: false,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
	pub source: String,
	pub target: String,
	pub relationship_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_by_tags_then_structure() {
		let tags = |t: &[&str]| t.iter().map(|s| s.to_string()).collect::<Vec<_>>();
		assert_eq!(NodeKind::classify(&tags(&["User"]), None), NodeKind::User);
		assert_eq!(NodeKind::classify(&tags(&["repo"]), None), NodeKind::Repository);
		assert_eq!(NodeKind::classify(&tags(&["Skill"]), None), NodeKind::Generic);
		assert_eq!(NodeKind::classify(&[], Some("alice")), NodeKind::User);
		assert_eq!(NodeKind::classify(&[], None), NodeKind::Generic);
	}

	#[test]
	fn from_raw_merges_and_sorts_tags() {
		let node = GraphNode::from_raw(RawNode {
			id: "4:abc:1".into(),
			label: Some("Skill".into()),
			labels: vec!["Language".into(), "Skill".into(), " ".into()],
			avatar_url: Some(String::new()),
			..Default::default()
		});
		assert_eq!(node.tags, vec!["Language".to_string(), "Skill".to_string()]);
		assert_eq!(node.kind, NodeKind::Generic);
		assert_eq!(node.avatar_url, None);
	}

	#[test]
	fn decodes_backend_payload_with_extra_properties() {
		let raw: RawGraph = serde_json::from_str(
			r#"{
				"nodes": [
					{"id": "1", "label": "User", "username": "alice", "candidateId": "c-9", "avatarUrl": "https://a/1.png"},
					{"id": "2", "label": "Repo", "name": "alice/tool"}
				],
				"links": [{"source": "1", "target": "2", "type": "HAS_TOP_REPO"}]
			}"#,
		)
		.unwrap();
		assert_eq!(raw.nodes.len(), 2);
		assert_eq!(raw.nodes[0].avatar_url.as_deref(), Some("https://a/1.png"));
		assert_eq!(raw.nodes[0].candidate_id.as_deref(), Some("c-9"));
		assert_eq!(raw.nodes[1].candidate_id, None);
		assert_eq!(raw.links[0].relationship, "HAS_TOP_REPO");
	}

	#[test]
	fn candidate_id_accepts_snake_case_key() {
		let raw: RawNode =
			serde_json::from_str(r#"{"id": "7", "username": "bob", "candidate_id": "c-1"}"#).unwrap();
		assert_eq!(raw.candidate_id.as_deref(), Some("c-1"));
	}
}
