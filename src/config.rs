//! Tunable engine parameters.
//!
//! The placement weights and threshold are empirically tuned rather than derived, so every
//! one of them is a named field that callers may override, either in code or from a JSON
//! document via [`EngineConfig::from_json`]. Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Anchor colors, cycled as new top-level topics are created.
pub const DEFAULT_PALETTE: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// Similarity a candidate must strictly exceed to receive a new idea.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.4;
/// Weight of the subtree centroid in a cluster head's score.
pub const DEFAULT_CENTROID_WEIGHT: f32 = 0.7;
/// Weight of the head's own vector in a cluster head's score.
pub const DEFAULT_DIRECT_WEIGHT: f32 = 0.3;
/// Below this many vector-bearing candidates the graph is scored as flat.
pub const DEFAULT_SPARSE_CANDIDATE_MIN: usize = 3;
/// Number of snapshots kept for undo/redo.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
/// Dimension of the keyword fallback embedding when no provider dimension is known.
pub const DEFAULT_FALLBACK_DIMENSION: usize = 64;

/// How a cluster head and a leaf candidate are compared when both are available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
	/// Compare the leaf's similarity with the head's unweighted direct similarity.
	#[default]
	RawSimilarity,
	/// Compare the leaf's similarity with the head's blended cluster score.
	///
	/// Lets a subtree centroid outrank a sibling leaf that is the closer match; kept
	/// selectable for comparison.
	BlendedScore,
}

/// Force simulation parameters used by [`ForceLayout`](crate::graph::ForceLayout).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Repulsion between every pair of nodes.
	pub force_charge: f32,
	/// Spring stiffness along edges.
	pub force_spring: f32,
	/// Upper bound on the force applied to a node per tick.
	pub force_max: f32,
	/// Velocity scale.
	pub node_speed: f32,
	/// Velocity retained between ticks.
	pub damping_factor: f32,
	/// Simulation ticks run per layout pass.
	pub iterations: usize,
	/// Seconds advanced per tick.
	pub tick: f32,
	/// Radius of the initial circle new nodes are seeded on.
	pub seed_radius: f32,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			iterations: 300,
			tick: 0.016,
			seed_radius: 100.0,
		}
	}
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// See [`DEFAULT_SIMILARITY_THRESHOLD`].
	pub similarity_threshold: f32,
	/// See [`DEFAULT_CENTROID_WEIGHT`].
	pub centroid_weight: f32,
	/// See [`DEFAULT_DIRECT_WEIGHT`].
	pub direct_weight: f32,
	/// See [`DEFAULT_SPARSE_CANDIDATE_MIN`].
	pub sparse_candidate_min: usize,
	/// Head versus leaf comparison.
	pub tie_break: TieBreak,
	/// See [`DEFAULT_HISTORY_LIMIT`].
	pub history_limit: usize,
	/// Anchor colors.
	pub palette: Vec<String>,
	/// See [`DEFAULT_FALLBACK_DIMENSION`].
	pub fallback_dimension: usize,
	/// Force simulation parameters.
	pub layout: LayoutConfig,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
			centroid_weight: DEFAULT_CENTROID_WEIGHT,
			direct_weight: DEFAULT_DIRECT_WEIGHT,
			sparse_candidate_min: DEFAULT_SPARSE_CANDIDATE_MIN,
			tie_break: TieBreak::default(),
			history_limit: DEFAULT_HISTORY_LIMIT,
			palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
			fallback_dimension: DEFAULT_FALLBACK_DIMENSION,
			layout: LayoutConfig::default(),
		}
	}
}

impl EngineConfig {
	/// Parses and validates a JSON configuration document.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks every field against its accepted range.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let invalid = |field, reason: &str| {
			Err(ConfigError::Invalid {
				field,
				reason: reason.to_string(),
			})
		};

		if !(-1.0..=1.0).contains(&self.similarity_threshold) {
			return invalid("similarity_threshold", "must lie within [-1, 1]");
		}
		if !(self.centroid_weight >= 0.0 && self.direct_weight >= 0.0) {
			return invalid("centroid_weight", "weights must be non-negative");
		}
		if self.centroid_weight + self.direct_weight <= 0.0 {
			return invalid("direct_weight", "weights must not both be zero");
		}
		if self.history_limit == 0 {
			return invalid("history_limit", "must keep at least one snapshot");
		}
		if self.palette.is_empty() {
			return invalid("palette", "must contain at least one color");
		}
		if self.fallback_dimension == 0 {
			return invalid("fallback_dimension", "must be positive");
		}
		if !(self.layout.tick.is_finite() && self.layout.tick > 0.0) {
			return invalid("layout.tick", "must be a positive number of seconds");
		}
		Ok(())
	}
}
