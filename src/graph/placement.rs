use log::debug;

use super::resolver::ParentResolver;
use super::state::GraphState;
use super::types::ROOT_ID;
use crate::config::EngineConfig;
use crate::error::GraphError;

/// Where a new idea goes.
#[derive(Clone, Debug, PartialEq)]
pub enum PlacementDecision {
	/// Attach as a satellite under `parent`, inheriting its color and topic.
	Attach {
		parent: String,
		/// Resolver score, `None` for a manual attach.
		similarity: Option<f32>,
	},
	/// Start a new top-level topic under the root.
	NewAnchor {
		/// The best candidate that failed the threshold, if any.
		nearest: Option<String>,
		similarity: f32,
	},
}

impl PlacementDecision {
	/// Parent id the new node will hang from.
	pub fn parent(&self) -> &str {
		match self {
			Self::Attach { parent, .. } => parent,
			Self::NewAnchor { .. } => ROOT_ID,
		}
	}
}

/// Threshold decision over a [`ParentResolver`] result.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementPolicy {
	/// A candidate must score strictly above this to receive the idea.
	pub threshold: f32,
	pub resolver: ParentResolver,
}

impl Default for PlacementPolicy {
	fn default() -> Self {
		Self::from_config(&EngineConfig::default())
	}
}

impl PlacementPolicy {
	pub fn from_config(config: &EngineConfig) -> Self {
		Self {
			threshold: config.similarity_threshold,
			resolver: ParentResolver::from_config(config),
		}
	}

	/// Decides where an idea with embedding `vector` belongs in `state`.
	pub fn decide(&self, vector: &[f32], state: &GraphState) -> PlacementDecision {
		let resolution = self.resolver.resolve(vector, &state.nodes, &state.edges);
		match resolution.candidate {
			Some(node) if resolution.similarity > self.threshold => {
				debug!(
					"placement: attach under {} ({:?}, {:.4} > {:.4})",
					node.id, resolution.kind, resolution.similarity, self.threshold
				);
				PlacementDecision::Attach {
					parent: node.id.clone(),
					similarity: Some(resolution.similarity),
				}
			}
			candidate => {
				debug!(
					"placement: new anchor (best {:?} at {:.4}, threshold {:.4})",
					candidate.map(|n| &n.id),
					resolution.similarity,
					self.threshold
				);
				PlacementDecision::NewAnchor {
					nearest: candidate.map(|n| n.id.clone()),
					similarity: resolution.similarity,
				}
			}
		}
	}

	/// Manual attach mode: skips scoring and places under `parent`.
	///
	/// Choosing the root itself starts a new anchor.
	pub fn decide_manual(
		&self,
		parent: &str,
		state: &GraphState,
	) -> Result<PlacementDecision, GraphError> {
		let node = state
			.node(parent)
			.ok_or_else(|| GraphError::UnknownNode(parent.to_string()))?;
		if node.is_root() {
			return Ok(PlacementDecision::NewAnchor {
				nearest: None,
				similarity: 0.0,
			});
		}
		Ok(PlacementDecision::Attach {
			parent: node.id.clone(),
			similarity: None,
		})
	}
}
