use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::types::{Edge, IdeaNode, NodeKind, ROOT_ID};
use crate::error::ImportError;

/// The complete mutable graph: nodes, edges, selection and the anchor color cursor.
///
/// Everything a snapshot must capture lives here, so history can restore it wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
	pub nodes: Vec<IdeaNode>,
	pub edges: Vec<Edge>,
	pub selected: String,
	/// Index of the palette color the next anchor receives.
	pub color_cursor: usize,
}

impl GraphState {
	/// A graph holding only the root.
	pub fn new(created_at: u64) -> Self {
		Self {
			nodes: vec![IdeaNode::root(created_at)],
			edges: Vec::new(),
			selected: ROOT_ID.into(),
			color_cursor: 0,
		}
	}

	/// Looks up a node by id.
	pub fn node(&self, id: &str) -> Option<&IdeaNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Mutable lookup by id.
	pub fn node_mut(&mut self, id: &str) -> Option<&mut IdeaNode> {
		self.nodes.iter_mut().find(|n| n.id == id)
	}

	/// Whether a node with `id` exists.
	pub fn contains(&self, id: &str) -> bool {
		self.node(id).is_some()
	}

	/// Parent of `id` according to the edge set.
	pub fn parent_of(&self, id: &str) -> Option<&str> {
		self.edges
			.iter()
			.find(|e| e.target == id)
			.map(|e| e.source.as_str())
	}

	/// Checks ids, labels, the rooted-tree invariant and node kinds.
	///
	/// Every non-root node must have exactly one incoming edge and be reachable from the
	/// root; together these rule out cycles. Anchors must sit directly under the root and
	/// satellites must not.
	pub fn validate(&self) -> Result<(), ImportError> {
		let mut ids = HashSet::with_capacity(self.nodes.len());
		let mut roots = 0;
		for (i, node) in self.nodes.iter().enumerate() {
			if node.id.trim().is_empty() {
				return Err(ImportError::MissingId(i));
			}
			if node.label.trim().is_empty() {
				return Err(ImportError::MissingLabel(node.id.clone()));
			}
			if !ids.insert(node.id.as_str()) {
				return Err(ImportError::DuplicateId(node.id.clone()));
			}
			if node.kind == NodeKind::Root {
				if node.id != ROOT_ID {
					return Err(ImportError::MissingRoot);
				}
				roots += 1;
			}
		}
		if roots != 1 {
			return Err(ImportError::MissingRoot);
		}

		let mut incoming: HashMap<&str, usize> = HashMap::new();
		let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
		let mut parent: HashMap<&str, &str> = HashMap::new();
		for edge in &self.edges {
			if !ids.contains(edge.source.as_str()) || !ids.contains(edge.target.as_str()) {
				return Err(ImportError::UnknownEndpoint {
					parent: edge.source.clone(),
					child: edge.target.clone(),
				});
			}
			*incoming.entry(edge.target.as_str()).or_default() += 1;
			parent.insert(edge.target.as_str(), edge.source.as_str());
			children
				.entry(edge.source.as_str())
				.or_default()
				.push(edge.target.as_str());
		}

		for node in &self.nodes {
			let parents = incoming.get(node.id.as_str()).copied().unwrap_or(0);
			let expected = if node.is_root() { 0 } else { 1 };
			if parents != expected {
				return Err(ImportError::NotATree(format!(
					"node {} has {parents} parents",
					node.id
				)));
			}
		}

		let mut seen = HashSet::with_capacity(self.nodes.len());
		let mut stack = vec![ROOT_ID];
		while let Some(id) = stack.pop() {
			if !seen.insert(id) {
				continue;
			}
			if let Some(kids) = children.get(id) {
				stack.extend(kids.iter().copied());
			}
		}
		if let Some(orphan) = self.nodes.iter().find(|n| !seen.contains(n.id.as_str())) {
			return Err(ImportError::NotATree(format!(
				"node {} is unreachable from the root",
				orphan.id
			)));
		}

		for node in &self.nodes {
			let under_root = parent.get(node.id.as_str()) == Some(&ROOT_ID);
			let misplaced = match node.kind {
				NodeKind::Root => false,
				NodeKind::Anchor => !under_root,
				NodeKind::Satellite => under_root,
			};
			if misplaced {
				return Err(ImportError::KindMismatch(node.id.clone()));
			}
		}
		Ok(())
	}
}
