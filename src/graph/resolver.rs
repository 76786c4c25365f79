//! Finds the existing node a new idea belongs under.
//!
//! Two regimes are used depending on how much structure the graph has:
//!
//! * **Sparse**: with fewer than `sparse_candidate_min` vector-bearing candidates, or no
//!   edges at all, the candidate with the highest direct similarity wins. Clustering a
//!   handful of nodes produces spurious centroid effects.
//! * **Structured**: candidates with children ("cluster heads") are scored by blending
//!   the similarity to their subtree centroid with the similarity to their own vector;
//!   childless candidates ("leaves") are scored directly. The best head and best leaf are
//!   then compared according to [`TieBreak`].
//!
//! Comparing a leaf against the head's blended score lets an averaged subtree outrank a
//! sibling leaf that is actually the closer match, so the default compares raw
//! similarities on both sides.

use log::debug;

use super::hierarchy::HierarchyIndex;
use super::types::{Edge, IdeaNode};
use super::vector::{centroid, cosine_similarity};
use crate::config::{EngineConfig, TieBreak};

/// How the winning candidate was scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchKind {
	/// Direct similarity in a sparse graph.
	Nearest,
	/// Blended centroid score of a node with children.
	ClusterHead,
	/// Direct similarity of a childless node in a structured graph.
	Leaf,
}

/// Outcome of a resolution.
#[derive(Clone, Copy, Debug)]
pub struct Resolution<'a> {
	/// Best candidate, `None` when no non-root node carries a vector.
	pub candidate: Option<&'a IdeaNode>,
	/// Score of the candidate: the blended score for a cluster head, the direct
	/// similarity otherwise. `0.0` without a candidate.
	pub similarity: f32,
	/// `None` without a candidate.
	pub kind: Option<MatchKind>,
}

impl Resolution<'_> {
	fn none() -> Self {
		Self {
			candidate: None,
			similarity: 0.0,
			kind: None,
		}
	}
}

#[derive(Clone, Copy)]
struct Scored<'a> {
	node: &'a IdeaNode,
	score: f32,
	raw: f32,
}

/// Scores a new vector against a graph. See the module docs for the algorithm.
#[derive(Clone, Debug, PartialEq)]
pub struct ParentResolver {
	pub centroid_weight: f32,
	pub direct_weight: f32,
	pub sparse_candidate_min: usize,
	pub tie_break: TieBreak,
}

impl Default for ParentResolver {
	fn default() -> Self {
		Self::from_config(&EngineConfig::default())
	}
}

impl ParentResolver {
	pub fn from_config(config: &EngineConfig) -> Self {
		Self {
			centroid_weight: config.centroid_weight,
			direct_weight: config.direct_weight,
			sparse_candidate_min: config.sparse_candidate_min,
			tie_break: config.tie_break,
		}
	}

	/// Returns the best parent candidate for `vector`. The root is never a candidate.
	pub fn resolve<'a>(
		&self,
		vector: &[f32],
		nodes: &'a [IdeaNode],
		edges: &'a [Edge],
	) -> Resolution<'a> {
		let candidates: Vec<(&'a IdeaNode, &'a [f32])> = nodes
			.iter()
			.filter(|n| !n.is_root())
			.filter_map(|n| Some((n, n.embedding.as_deref()?)))
			.collect();

		if candidates.is_empty() {
			debug!("resolve: no vector-bearing candidates");
			return Resolution::none();
		}

		if candidates.len() < self.sparse_candidate_min || edges.is_empty() {
			return Self::nearest(vector, &candidates);
		}

		let index = HierarchyIndex::new(nodes, edges);
		let mut best_head: Option<Scored<'a>> = None;
		let mut best_leaf: Option<Scored<'a>> = None;

		for &(node, own) in &candidates {
			let raw = cosine_similarity(vector, own);
			if !raw.is_finite() {
				continue;
			}
			if index.has_children(&node.id) {
				let center = centroid(index.descendant_vectors(node.id.as_str()));
				let score = self.centroid_weight * cosine_similarity(vector, &center)
					+ self.direct_weight * raw;
				if !score.is_finite() {
					continue;
				}
				if best_head.is_none_or(|best| score > best.score) {
					best_head = Some(Scored { node, score, raw });
				}
			} else if best_leaf.is_none_or(|best| raw > best.score) {
				best_leaf = Some(Scored {
					node,
					score: raw,
					raw,
				});
			}
		}

		let (winner, kind) = match (best_head, best_leaf) {
			(Some(head), Some(leaf)) => {
				let head_value = match self.tie_break {
					TieBreak::RawSimilarity => head.raw,
					TieBreak::BlendedScore => head.score,
				};
				debug!(
					"resolve: head {} (score {:.4}, raw {:.4}) vs leaf {} ({:.4})",
					head.node.id, head.score, head.raw, leaf.node.id, leaf.raw
				);
				if leaf.raw > head_value {
					(leaf, MatchKind::Leaf)
				} else {
					(head, MatchKind::ClusterHead)
				}
			}
			(Some(head), None) => (head, MatchKind::ClusterHead),
			(None, Some(leaf)) => (leaf, MatchKind::Leaf),
			(None, None) => return Resolution::none(),
		};

		Resolution {
			candidate: Some(winner.node),
			similarity: winner.score,
			kind: Some(kind),
		}
	}

	fn nearest<'a>(vector: &[f32], candidates: &[(&'a IdeaNode, &'a [f32])]) -> Resolution<'a> {
		let mut best: Option<(&'a IdeaNode, f32)> = None;
		for &(node, own) in candidates {
			let sim = cosine_similarity(vector, own);
			if !sim.is_finite() {
				continue;
			}
			if best.is_none_or(|(_, s)| sim > s) {
				best = Some((node, sim));
			}
		}
		match best {
			Some((node, similarity)) => Resolution {
				candidate: Some(node),
				similarity,
				kind: Some(MatchKind::Nearest),
			},
			None => Resolution::none(),
		}
	}
}
