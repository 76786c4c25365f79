//! Saved graph collections and their import validation.
//!
//! A collection's content hash covers structure and text only (ids, labels, parents,
//! anchor flags and edges), so the same graph saved twice with different layouts,
//! colors or timestamps hashes identically.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::clock::now_millis;
use crate::error::ImportError;
use crate::graph::{Edge, GraphState, IdeaNode, ROOT_ID};

/// Graph data carried by a [`CollectionRecord`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
	pub nodes: Vec<IdeaNode>,
	pub edges: Vec<Edge>,
	#[serde(default)]
	pub color_cursor: usize,
}

/// A named, persisted graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRecord {
	pub id: String,
	pub name: String,
	pub color: String,
	pub created_at: u64,
	pub modified_at: u64,
	pub content_hash: String,
	pub graph: GraphPayload,
}

#[derive(Serialize)]
struct NodeKey<'a> {
	id: &'a str,
	label: &'a str,
	parent_id: Option<&'a str>,
	is_anchor: bool,
}

/// Structural hash of a graph: SHA-256 over the sorted node and edge tuples.
pub fn content_hash(nodes: &[IdeaNode], edges: &[Edge]) -> String {
	let mut node_keys: Vec<NodeKey<'_>> = nodes
		.iter()
		.map(|n| NodeKey {
			id: &n.id,
			label: &n.label,
			parent_id: edges
				.iter()
				.find(|e| e.target == n.id)
				.map(|e| e.source.as_str()),
			is_anchor: n.is_anchor(),
		})
		.collect();
	node_keys.sort_by(|a, b| a.id.cmp(b.id));

	let mut edge_keys: Vec<(&str, &str)> = edges
		.iter()
		.map(|e| (e.source.as_str(), e.target.as_str()))
		.collect();
	edge_keys.sort_unstable();

	let mut hasher = Sha256::new();
	for key in &node_keys {
		hasher.update(serde_json::to_vec(key).unwrap_or_default());
		hasher.update(b"\n");
	}
	hasher.update(b"--\n");
	for (source, target) in &edge_keys {
		hasher.update(source.as_bytes());
		hasher.update(b"\x1f");
		hasher.update(target.as_bytes());
		hasher.update(b"\n");
	}
	hex::encode(hasher.finalize())
}

impl CollectionRecord {
	/// Captures `state` under `name`. The selection is not part of a collection.
	pub fn capture(
		id: impl Into<String>,
		name: impl Into<String>,
		color: impl Into<String>,
		state: &GraphState,
	) -> Self {
		let now = now_millis();
		Self {
			id: id.into(),
			name: name.into(),
			color: color.into(),
			created_at: now,
			modified_at: now,
			content_hash: content_hash(&state.nodes, &state.edges),
			graph: GraphPayload {
				nodes: state.nodes.clone(),
				edges: state.edges.clone(),
				color_cursor: state.color_cursor,
			},
		}
	}

	/// Parses and validates a record. Any structural defect rejects the whole import.
	pub fn from_json(json: &str) -> Result<Self, ImportError> {
		let mut record: Self = serde_json::from_str(json)?;
		record.to_state()?;
		record.content_hash = content_hash(&record.graph.nodes, &record.graph.edges);
		Ok(record)
	}

	pub fn to_json(&self) -> String {
		serde_json::to_string(self).unwrap_or_default()
	}

	/// Builds a live graph from the payload, selecting the root.
	pub fn to_state(&self) -> Result<GraphState, ImportError> {
		let state = GraphState {
			nodes: self.graph.nodes.clone(),
			edges: self.graph.edges.clone(),
			selected: ROOT_ID.into(),
			color_cursor: self.graph.color_cursor,
		};
		state.validate()?;
		Ok(state)
	}

	/// Re-captures the payload from `state` and bumps the modification time.
	pub fn update(&mut self, state: &GraphState) {
		self.graph = GraphPayload {
			nodes: state.nodes.clone(),
			edges: state.edges.clone(),
			color_cursor: state.color_cursor,
		};
		self.content_hash = content_hash(&state.nodes, &state.edges);
		self.modified_at = now_millis();
	}
}

/// First record in `existing` whose content matches `incoming`.
pub fn find_duplicate<'a>(
	existing: &'a [CollectionRecord],
	incoming: &CollectionRecord,
) -> Option<&'a CollectionRecord> {
	existing
		.iter()
		.find(|r| r.content_hash == incoming.content_hash)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{GraphMutator, NodeKind, PlacementDecision};

	fn sample() -> GraphState {
		let mutator = GraphMutator::default();
		let mut state = GraphState::new(0);
		let anchor = PlacementDecision::NewAnchor {
			nearest: None,
			similarity: 0.0,
		};
		let combat = mutator
			.insert(&mut state, "combat", Some(vec![1.0, 0.0]), &anchor)
			.unwrap()
			.node;
		mutator
			.insert(
				&mut state,
				"sword",
				None,
				&PlacementDecision::Attach {
					parent: combat.id,
					similarity: None,
				},
			)
			.unwrap();
		state
	}

	#[test]
	fn round_trips_through_json() {
		let state = sample();
		let record = CollectionRecord::capture("c1", "Game ideas", "#123456", &state);
		let parsed = CollectionRecord::from_json(&record.to_json()).unwrap();
		assert_eq!(parsed, record);
		let restored = parsed.to_state().unwrap();
		assert_eq!(restored.nodes, state.nodes);
		assert_eq!(restored.color_cursor, state.color_cursor);
	}

	#[test]
	fn hash_ignores_colors_timestamps_and_order() {
		let state = sample();
		let mut shuffled = state.clone();
		shuffled.nodes.reverse();
		shuffled.edges.reverse();
		for node in &mut shuffled.nodes {
			node.color = "#000000".into();
			node.created_at += 1000;
		}
		assert_eq!(
			content_hash(&state.nodes, &state.edges),
			content_hash(&shuffled.nodes, &shuffled.edges)
		);
	}

	#[test]
	fn hash_tracks_labels() {
		let state = sample();
		let mut renamed = state.clone();
		renamed.nodes[1].label = "melee".into();
		assert_ne!(
			content_hash(&state.nodes, &state.edges),
			content_hash(&renamed.nodes, &renamed.edges)
		);
	}

	#[test]
	fn duplicates_are_found_by_content() {
		let state = sample();
		let saved = vec![
			CollectionRecord::capture("a", "Other", "#fff", &GraphState::new(0)),
			CollectionRecord::capture("b", "Game ideas", "#fff", &state),
		];
		let incoming = CollectionRecord::capture("c", "Copy", "#000", &state);
		assert_eq!(find_duplicate(&saved, &incoming).map(|r| r.id.as_str()), Some("b"));
	}

	#[test]
	fn rejects_broken_imports_whole() {
		let state = sample();
		let mut record = CollectionRecord::capture("c1", "Broken", "#fff", &state);
		record.graph.edges.push(Edge::new("ghost", ROOT_ID));
		assert!(matches!(
			CollectionRecord::from_json(&record.to_json()),
			Err(ImportError::UnknownEndpoint { .. })
		));

		let mut unlabeled = CollectionRecord::capture("c2", "Blank", "#fff", &state);
		unlabeled.graph.nodes[1].label = "  ".into();
		assert!(matches!(
			CollectionRecord::from_json(&unlabeled.to_json()),
			Err(ImportError::MissingLabel(_))
		));

		let mut swapped = CollectionRecord::capture("c3", "Swapped", "#fff", &state);
		swapped.graph.nodes[1].kind = NodeKind::Satellite;
		swapped.graph.nodes[2].kind = NodeKind::Anchor;
		assert!(matches!(
			CollectionRecord::from_json(&swapped.to_json()),
			Err(ImportError::KindMismatch(_))
		));

		assert!(matches!(
			CollectionRecord::from_json(r#"{"id": "x"}"#),
			Err(ImportError::Json(_))
		));
	}
}
