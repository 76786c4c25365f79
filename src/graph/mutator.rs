//! Structural edits on a [`GraphState`].
//!
//! Each operation validates first and then mutates, so a rejected request leaves the
//! state exactly as it was.

use std::collections::HashSet;

use log::{debug, info};

use super::hierarchy::HierarchyIndex;
use super::placement::PlacementDecision;
use super::state::GraphState;
use super::types::{Edge, IdeaNode, NodeKind, ROOT_ID, Vector};
use crate::clock::now_millis;
use crate::config::DEFAULT_PALETTE;
use crate::error::GraphError;

const ID_ATTEMPTS: usize = 4;

/// A node and its incoming edge, as spliced into the graph by [`GraphMutator::insert`].
#[derive(Clone, Debug, PartialEq)]
pub struct Insertion {
	pub node: IdeaNode,
	pub edge: Edge,
}

/// What [`GraphMutator::delete_subtree`] took out of the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removal {
	/// Removed node ids, the subtree root first, in pre-order.
	pub nodes: Vec<String>,
	pub edges: usize,
}

/// Applies placements, deletions and relabels.
#[derive(Clone, Debug)]
pub struct GraphMutator {
	palette: Vec<String>,
}

impl Default for GraphMutator {
	fn default() -> Self {
		Self::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
	}
}

impl GraphMutator {
	pub fn new(palette: Vec<String>) -> Self {
		Self { palette }
	}

	/// Creates the node for `text` where `decision` says and links it to its parent.
	///
	/// A new anchor takes the palette color under the state's color cursor and advances
	/// it; a satellite inherits color and topic from its parent.
	pub fn insert(
		&self,
		state: &mut GraphState,
		text: &str,
		embedding: Option<Vector>,
		decision: &PlacementDecision,
	) -> Result<Insertion, GraphError> {
		self.insert_with_ids(state, text, embedding, decision, generate_id)
	}

	fn insert_with_ids(
		&self,
		state: &mut GraphState,
		text: &str,
		embedding: Option<Vector>,
		decision: &PlacementDecision,
		mut next_id: impl FnMut() -> String,
	) -> Result<Insertion, GraphError> {
		let label = text.trim();
		if label.is_empty() {
			return Err(GraphError::EmptyLabel);
		}

		let parent = state
			.node(decision.parent())
			.ok_or_else(|| GraphError::UnknownNode(decision.parent().to_string()))?;

		let (kind, topic, color) = if parent.is_root() {
			let color = self.anchor_color(state.color_cursor);
			(NodeKind::Anchor, label.to_string(), color)
		} else {
			let topic = if parent.topic.is_empty() {
				parent.label.clone()
			} else {
				parent.topic.clone()
			};
			(NodeKind::Satellite, topic, parent.color.clone())
		};
		let parent_id = parent.id.clone();

		let mut id = next_id();
		let mut attempts = 1;
		while state.contains(&id) {
			if attempts == ID_ATTEMPTS {
				return Err(GraphError::IdCollision(id));
			}
			id = next_id();
			attempts += 1;
		}

		let node = IdeaNode {
			id: id.clone(),
			kind,
			label: label.to_string(),
			topic,
			color,
			embedding,
			parent_id: Some(parent_id.clone()),
			created_at: now_millis(),
		};
		let edge = Edge::new(parent_id, id);

		if kind == NodeKind::Anchor {
			state.color_cursor += 1;
		}
		state.nodes.push(node.clone());
		state.edges.push(edge.clone());
		info!("inserted {:?} {} under {}", kind, node.id, edge.source);

		Ok(Insertion { node, edge })
	}

	/// Removes `id` and everything below it.
	///
	/// Selection falls back to the root when it pointed into the removed subtree.
	pub fn delete_subtree(&self, state: &mut GraphState, id: &str) -> Result<Removal, GraphError> {
		let node = state
			.node(id)
			.ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
		if node.is_root() {
			return Err(GraphError::RootImmutable);
		}

		let doomed: Vec<String> = {
			let index = HierarchyIndex::new(&state.nodes, &state.edges);
			index
				.descendants(node.id.as_str())
				.into_iter()
				.map(str::to_string)
				.collect()
		};
		let set: HashSet<&str> = doomed.iter().map(String::as_str).collect();

		let edges_before = state.edges.len();
		state.nodes.retain(|n| !set.contains(n.id.as_str()));
		state
			.edges
			.retain(|e| !set.contains(e.source.as_str()) && !set.contains(e.target.as_str()));
		let edges = edges_before - state.edges.len();

		if set.contains(state.selected.as_str()) {
			state.selected = ROOT_ID.into();
		}

		info!("deleted subtree {id}: {} nodes, {edges} edges", doomed.len());
		Ok(Removal {
			nodes: doomed,
			edges,
		})
	}

	/// Changes a node's display label. Vector, color, topic and links are untouched.
	pub fn relabel(&self, state: &mut GraphState, id: &str, label: &str) -> Result<(), GraphError> {
		let label = label.trim();
		if label.is_empty() {
			return Err(GraphError::EmptyLabel);
		}
		let node = state
			.node_mut(id)
			.ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
		debug!("relabel {id}: {:?} -> {label:?}", node.label);
		node.label = label.to_string();
		Ok(())
	}

	fn anchor_color(&self, cursor: usize) -> String {
		match self.palette.len() {
			0 => DEFAULT_PALETTE[cursor % DEFAULT_PALETTE.len()].to_string(),
			len => self.palette[cursor % len].clone(),
		}
	}
}

/// Creation time in hex plus a random suffix.
fn generate_id() -> String {
	let suffix = uuid::Uuid::new_v4().simple().to_string();
	format!("idea-{:x}-{}", now_millis(), &suffix[..8])
}
