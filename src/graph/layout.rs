use std::collections::HashMap;
use std::f32::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::types::{Edge, IdeaNode, Position};
use crate::config::LayoutConfig;
use crate::error::LayoutError;

/// Layout output keyed by node id.
pub type Positions = HashMap<String, Position>;

/// Turns a graph into 2-D coordinates.
pub trait LayoutEngine {
	/// Computes positions for every node, starting from `prior` where available.
	fn layout(
		&self,
		nodes: &[IdeaNode],
		edges: &[Edge],
		prior: &Positions,
	) -> Result<Positions, LayoutError>;
}

#[derive(Clone, Debug, Default)]
struct LayoutNode {
	id: String,
}

/// Force-directed layout that runs a fixed number of simulation ticks.
///
/// The root is pinned at the origin. Nodes without a prior position are seeded on a
/// circle around it so the simulation never starts from coincident points.
#[derive(Clone, Debug, Default)]
pub struct ForceLayout {
	config: LayoutConfig,
}

impl ForceLayout {
	pub fn new(config: LayoutConfig) -> Self {
		Self { config }
	}

	fn seed(&self, i: usize, count: usize) -> (f32, f32) {
		let angle = (i as f32) * 2.0 * PI / count.max(1) as f32;
		(
			self.config.seed_radius * angle.cos(),
			self.config.seed_radius * angle.sin(),
		)
	}
}

impl LayoutEngine for ForceLayout {
	fn layout(
		&self,
		nodes: &[IdeaNode],
		edges: &[Edge],
		prior: &Positions,
	) -> Result<Positions, LayoutError> {
		let mut graph: ForceGraph<LayoutNode, ()> = ForceGraph::new(SimulationParameters {
			force_charge: self.config.force_charge,
			force_spring: self.config.force_spring,
			force_max: self.config.force_max,
			node_speed: self.config.node_speed,
			damping_factor: self.config.damping_factor,
		});
		let mut id_to_idx = HashMap::with_capacity(nodes.len());

		for (i, node) in nodes.iter().enumerate() {
			let (x, y) = match prior.get(&node.id) {
				Some(p) => (p.x, p.y),
				None if node.is_root() => (0.0, 0.0),
				None => self.seed(i, nodes.len()),
			};
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor: node.is_root(),
				user_data: LayoutNode {
					id: node.id.clone(),
				},
			});
			id_to_idx.insert(node.id.as_str(), idx);
		}

		for edge in edges {
			if let (Some(&src), Some(&tgt)) = (
				id_to_idx.get(edge.source.as_str()),
				id_to_idx.get(edge.target.as_str()),
			) {
				graph.add_edge(src, tgt, EdgeData::default());
			}
		}

		for _ in 0..self.config.iterations {
			graph.update(self.config.tick);
		}

		let mut positions = Positions::with_capacity(nodes.len());
		let mut diverged = None;
		graph.visit_nodes(|node| {
			let (x, y) = (node.x(), node.y());
			let id = &node.data.user_data.id;
			if !(x.is_finite() && y.is_finite()) {
				diverged.get_or_insert_with(|| id.clone());
			}
			positions.insert(id.clone(), Position { x, y });
		});

		match diverged {
			Some(id) => Err(LayoutError::Diverged(id)),
			None => Ok(positions),
		}
	}
}
