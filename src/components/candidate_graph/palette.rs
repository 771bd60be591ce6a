use super::types::{GraphData, GraphNode, NodeKind};

/// Fill for relationship-label nodes regardless of their text.
pub const LABEL_COLOR: &str = "#94a3b8";

const KIND_PALETTE: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf", "#6366f1", "#14b8a6", "#f59e0b", "#ec4899", "#84cc16", "#0ea5e9",
];

// Muted tones so avatar fallbacks never read as a legend color.
const IDENTITY_PALETTE: &[&str] = &[
	"#7c3aed", "#2563eb", "#0891b2", "#059669", "#65a30d", "#ca8a04", "#ea580c", "#dc2626",
	"#db2777", "#9333ea", "#4f46e5", "#0d9488",
];

fn fnv1a(bytes: &[u8]) -> u32 {
	bytes.iter().fold(0x811c_9dc5, |hash, byte| {
		(hash ^ u32::from(*byte)).wrapping_mul(0x0100_0193)
	})
}

fn tag_key(node: &GraphNode) -> String {
	let mut tags: Vec<&str> = node.tags.iter().map(String::as_str).collect();
	tags.sort_unstable();
	tags.dedup();
	if tags.is_empty() {
		node.kind.as_str().to_string()
	} else {
		tags.join("|")
	}
}

/// Deterministic fill for a node, keyed on its sorted label tags.
pub fn color_for(node: &GraphNode) -> &'static str {
	if node.kind == NodeKind::RelationshipLabel {
		return LABEL_COLOR;
	}
	let hash = fnv1a(tag_key(node).as_bytes());
	KIND_PALETTE[hash as usize % KIND_PALETTE.len()]
}

/// Background for avatar fallbacks, keyed on the display name.
pub fn color_from_identity(name: &str) -> &'static str {
	let hash = name.chars().fold(0i32, |hash, c| {
		(c as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
	});
	IDENTITY_PALETTE[hash.unsigned_abs() as usize % IDENTITY_PALETTE.len()]
}

pub fn initials_for(name: &str) -> String {
	let name = name.trim();
	if name.is_empty() {
		return "?".into();
	}
	name.chars().take(2).flat_map(char::to_uppercase).collect()
}

pub fn display_name_for(node: &GraphNode) -> &str {
	[node.name.as_deref(), node.username.as_deref()]
		.into_iter()
		.flatten()
		.find(|text| !text.trim().is_empty())
		.unwrap_or(&node.id)
}

/// One swatch per distinct tag combination, sorted by caption.
pub fn legend_entries(data: &GraphData) -> Vec<(String, &'static str)> {
	let mut entries: Vec<(String, &'static str)> = data
		.nodes
		.iter()
		.filter(|node| node.kind != NodeKind::RelationshipLabel)
		.map(|node| (tag_key(node).replace('|', " / "), color_for(node)))
		.collect();
	entries.sort();
	entries.dedup();
	entries
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tagged(kind: NodeKind, tags: &[&str]) -> GraphNode {
		GraphNode {
			id: "n".into(),
			name: None,
			username: None,
			kind,
			tags: tags.iter().map(|t| t.to_string()).collect(),
			avatar_url: None,
			fixed: None,
			focal: false,
		}
	}

	#[test]
	fn same_tag_set_same_color() {
		let a = tagged(NodeKind::Generic, &["Skill", "Language"]);
		let b = tagged(NodeKind::Generic, &["Language", "Skill"]);
		assert_eq!(color_for(&a), color_for(&b));
		assert_eq!(color_for(&a), color_for(&a.clone()));
	}

	#[test]
	fn distinct_primary_labels_get_distinct_colors() {
		let user = color_for(&tagged(NodeKind::User, &["User"]));
		let repo = color_for(&tagged(NodeKind::Repository, &["Repo"]));
		let skill = color_for(&tagged(NodeKind::Generic, &["Skill"]));
		assert_ne!(user, repo);
		assert_ne!(repo, skill);
		assert_ne!(user, skill);
	}

	#[test]
	fn labels_are_always_neutral() {
		let label = GraphNode::relationship_label("rel:0".into(), "OWNS");
		assert_eq!(color_for(&label), LABEL_COLOR);
	}

	#[test]
	fn identity_colors_are_stable_and_separate_from_kind_palette() {
		assert_eq!(color_from_identity("alice"), color_from_identity("alice"));
		assert_ne!(color_from_identity("alice"), color_from_identity("bob"));
		assert!(!KIND_PALETTE.contains(&color_from_identity("alice")));
	}

	#[test]
	fn initials() {
		assert_eq!(initials_for("alice"), "AL");
		assert_eq!(initials_for("x"), "X");
		assert_eq!(initials_for(""), "?");
		assert_eq!(initials_for("  "), "?");
	}

	#[test]
	fn display_name_prefers_name_then_username_then_id() {
		let mut node = tagged(NodeKind::User, &["User"]);
		node.id = "4:xyz".into();
		assert_eq!(display_name_for(&node), "4:xyz");
		node.username = Some("alice".into());
		assert_eq!(display_name_for(&node), "alice");
		node.name = Some("Alice Liddell".into());
		assert_eq!(display_name_for(&node), "Alice Liddell");
	}

	#[test]
	fn legend_skips_labels_and_dedups() {
		let data = GraphData {
			nodes: vec![
				GraphNode::relationship_label("rel:0".into(), "OWNS"),
				tagged(NodeKind::Generic, &["Skill"]),
				tagged(NodeKind::Generic, &["Skill"]),
				tagged(NodeKind::User, &["User"]),
			],
			edges: Vec::new(),
		};
		let captions: Vec<String> = legend_entries(&data).into_iter().map(|(c, _)| c).collect();
		assert_eq!(captions, vec!["Skill".to_string(), "User".to_string()]);
	}
}
