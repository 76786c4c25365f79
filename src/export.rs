//! JSON and Markdown renderings of a graph.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::clock::rfc3339;
use crate::graph::{Edge, GraphState, HierarchyIndex, ROOT_ID};

/// One node of an [`ExportDocument`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportNode {
	pub id: String,
	pub label: String,
	pub topic: String,
	pub parent_id: Option<String>,
	pub children: Vec<String>,
	pub is_anchor: bool,
}

/// Counts and timestamp of an [`ExportDocument`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
	pub node_count: usize,
	pub edge_count: usize,
	/// RFC 3339 export time.
	pub exported_at: String,
}

/// Exchange document produced by [`export_json`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
	pub nodes: Vec<ExportNode>,
	pub edges: Vec<Edge>,
	pub metadata: ExportMetadata,
}

impl ExportDocument {
	/// Parent and children come from the edge set, not the nodes' back-references.
	pub fn build(state: &GraphState, exported_at_millis: u64) -> Self {
		let index = HierarchyIndex::new(&state.nodes, &state.edges);
		let nodes = state
			.nodes
			.iter()
			.map(|node| ExportNode {
				id: node.id.clone(),
				label: node.label.clone(),
				topic: node.topic.clone(),
				parent_id: state.parent_of(&node.id).map(str::to_string),
				children: index
					.children_of(&node.id)
					.iter()
					.map(|c| c.to_string())
					.collect(),
				is_anchor: node.is_anchor(),
			})
			.collect();

		Self {
			nodes,
			edges: state.edges.clone(),
			metadata: ExportMetadata {
				node_count: state.nodes.len(),
				edge_count: state.edges.len(),
				exported_at: rfc3339(exported_at_millis),
			},
		}
	}
}

/// Pretty-printed JSON export of `state`.
pub fn export_json(state: &GraphState, exported_at_millis: u64) -> String {
	let document = ExportDocument::build(state, exported_at_millis);
	serde_json::to_string_pretty(&document).unwrap_or_default()
}

/// Outline of the tree, depth-first from the root.
///
/// The root renders as a `#` heading; every deeper node is a bullet indented two spaces
/// per level below the anchors.
pub fn export_markdown(state: &GraphState) -> String {
	let index = HierarchyIndex::new(&state.nodes, &state.edges);
	let mut out = String::new();
	let mut seen = HashSet::new();
	let mut stack = vec![(ROOT_ID, 0usize)];

	while let Some((id, depth)) = stack.pop() {
		if !seen.insert(id) {
			continue;
		}
		let Some(node) = state.node(id) else {
			continue;
		};
		if depth == 0 {
			let _ = writeln!(out, "# {}", node.label);
		} else {
			let _ = writeln!(out, "{}- {}", "  ".repeat(depth - 1), node.label);
		}
		for child in index.children_of(id).iter().rev() {
			stack.push((*child, depth + 1));
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::graph::{GraphMutator, PlacementDecision};

	fn sample() -> GraphState {
		let mutator = GraphMutator::default();
		let mut state = GraphState::new(0);
		let anchor = PlacementDecision::NewAnchor {
			nearest: None,
			similarity: 0.0,
		};
		let under = |parent: &str| PlacementDecision::Attach {
			parent: parent.to_string(),
			similarity: None,
		};
		let combat = mutator.insert(&mut state, "combat", None, &anchor).unwrap().node;
		let sword = mutator
			.insert(&mut state, "sword", None, &under(&combat.id))
			.unwrap()
			.node;
		mutator.insert(&mut state, "hilt", None, &under(&sword.id)).unwrap();
		mutator.insert(&mut state, "shield", None, &under(&combat.id)).unwrap();
		mutator.insert(&mut state, "economy", None, &anchor).unwrap();
		state
	}

	#[test]
	fn markdown_outline_is_depth_first() {
		let markdown = export_markdown(&sample());
		assert_eq!(
			markdown,
			"# Ideas\n- combat\n  - sword\n    - hilt\n  - shield\n- economy\n"
		);
	}

	#[test]
	fn json_lists_structure_and_counts() {
		let state = sample();
		let json = export_json(&state, 0);
		let document: ExportDocument = serde_json::from_str(&json).unwrap();

		assert_eq!(document.metadata.node_count, 6);
		assert_eq!(document.metadata.edge_count, 5);
		assert_eq!(document.metadata.exported_at, "1970-01-01T00:00:00+00:00");

		let root = &document.nodes[0];
		assert_eq!(root.parent_id, None);
		assert_eq!(root.children.len(), 2);

		let combat = document.nodes.iter().find(|n| n.label == "combat").unwrap();
		assert!(combat.is_anchor);
		assert_eq!(combat.parent_id.as_deref(), Some(ROOT_ID));
		let hilt = document.nodes.iter().find(|n| n.label == "hilt").unwrap();
		assert!(!hilt.is_anchor);
		assert_eq!(hilt.topic, "combat");
		assert!(hilt.children.is_empty());
	}

	#[test]
	fn json_uses_camel_case_keys() {
		let json = export_json(&sample(), 0);
		assert!(json.contains("\"parentId\""));
		assert!(json.contains("\"isAnchor\""));
		assert!(json.contains("\"nodeCount\""));
		assert!(json.contains("\"exportedAt\""));
	}
}
