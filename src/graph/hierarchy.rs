use std::collections::{HashMap, HashSet};

use super::types::{Edge, IdeaNode};

/// Parent to children adjacency over one graph state.
///
/// Built fresh from the edge list on every use; graphs stay in the hundreds of nodes and
/// an index that is never stale is worth more than incremental upkeep.
pub struct HierarchyIndex<'a> {
	nodes: HashMap<&'a str, &'a IdeaNode>,
	children: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> HierarchyIndex<'a> {
	pub fn new(nodes: &'a [IdeaNode], edges: &'a [Edge]) -> Self {
		let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
		for edge in edges {
			children
				.entry(edge.source.as_str())
				.or_default()
				.push(edge.target.as_str());
		}
		Self {
			nodes: nodes.iter().map(|n| (n.id.as_str(), n)).collect(),
			children,
		}
	}

	/// Direct children of `id`, in edge order.
	pub fn children_of(&self, id: &str) -> &[&'a str] {
		self.children.get(id).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn has_children(&self, id: &str) -> bool {
		!self.children_of(id).is_empty()
	}

	/// Every id in the subtree rooted at `id`, `id` first, in pre-order.
	///
	/// Uses an explicit stack and a visited set, so deep chains and malformed cyclic
	/// edge lists terminate.
	pub fn descendants(&self, id: &'a str) -> Vec<&'a str> {
		let mut order = Vec::new();
		let mut seen = HashSet::new();
		let mut stack = vec![id];
		while let Some(current) = stack.pop() {
			if !seen.insert(current) {
				continue;
			}
			order.push(current);
			stack.extend(self.children_of(current).iter().rev().copied());
		}
		order
	}

	/// Every embedding within the subtree rooted at `id`, including `id`'s own.
	pub fn descendant_vectors(&self, id: &'a str) -> Vec<&'a [f32]> {
		self.descendants(id)
			.into_iter()
			.filter_map(|d| self.nodes.get(d).copied()?.embedding.as_deref())
			.collect()
	}
}
