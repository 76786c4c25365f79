//! The library surface consumed by a UI layer.
//!
//! [`IdeaGraph`] owns the live graph, its history and the layout positions, and runs
//! every operation synchronously. [`Workspace`] adds the asynchronous embedding step in
//! front of placement.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{info, warn};

use crate::clock::now_millis;
use crate::collection::CollectionRecord;
use crate::config::EngineConfig;
use crate::embed::{Embedding, EmbeddingProvider, EmbeddingSource, ResilientEmbedder};
use crate::error::{GraphError, ImportError};
use crate::export;
use crate::graph::{
	ForceLayout, GraphMutator, GraphState, HistoryStore, Insertion, LayoutEngine,
	PlacementDecision, PlacementPolicy, Positions, Removal,
};

/// An accepted placement.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
	pub decision: PlacementDecision,
	pub insertion: Insertion,
	/// Whether the vector came from the provider or the keyword fallback.
	pub source: EmbeddingSource,
}

/// A graph with placement, history and layout.
pub struct IdeaGraph {
	state: GraphState,
	history: HistoryStore,
	policy: PlacementPolicy,
	mutator: GraphMutator,
	layout: Box<dyn LayoutEngine>,
	positions: Positions,
	config: EngineConfig,
}

impl Default for IdeaGraph {
	fn default() -> Self {
		Self::new(EngineConfig::default())
	}
}

impl IdeaGraph {
	/// A root-only graph laid out with [`ForceLayout`].
	pub fn new(config: EngineConfig) -> Self {
		let layout = Box::new(ForceLayout::new(config.layout.clone()));
		Self::with_layout(config, layout)
	}

	pub fn with_layout(config: EngineConfig, layout: Box<dyn LayoutEngine>) -> Self {
		let state = GraphState::new(now_millis());
		let mut graph = Self {
			history: HistoryStore::new(&state, config.history_limit),
			policy: PlacementPolicy::from_config(&config),
			mutator: GraphMutator::new(config.palette.clone()),
			state,
			layout,
			positions: Positions::new(),
			config,
		};
		graph.relayout();
		graph
	}

	pub fn state(&self) -> &GraphState {
		&self.state
	}

	pub fn history(&self) -> &HistoryStore {
		&self.history
	}

	pub fn positions(&self) -> &Positions {
		&self.positions
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Places `text` under the most related node, or as a new anchor.
	pub fn place(&mut self, text: &str, embedding: Embedding) -> Result<Placement, GraphError> {
		let decision = self.policy.decide(&embedding.vector, &self.state);
		self.apply(text, embedding, decision)
	}

	/// Manual attach mode: places `text` under `parent` without scoring.
	pub fn place_under(
		&mut self,
		text: &str,
		embedding: Embedding,
		parent: &str,
	) -> Result<Placement, GraphError> {
		let decision = self.policy.decide_manual(parent, &self.state)?;
		self.apply(text, embedding, decision)
	}

	fn apply(
		&mut self,
		text: &str,
		embedding: Embedding,
		decision: PlacementDecision,
	) -> Result<Placement, GraphError> {
		let source = embedding.source;
		let insertion =
			self.mutator
				.insert(&mut self.state, text, Some(embedding.vector), &decision)?;
		if source == EmbeddingSource::Fallback {
			info!("placed {} using a fallback embedding", insertion.node.id);
		}
		self.commit();
		Ok(Placement {
			decision,
			insertion,
			source,
		})
	}

	/// Deletes `id` and its whole subtree.
	pub fn delete_node(&mut self, id: &str) -> Result<Removal, GraphError> {
		let removal = self.mutator.delete_subtree(&mut self.state, id)?;
		self.positions.retain(|k, _| !removal.nodes.contains(k));
		self.commit();
		Ok(removal)
	}

	pub fn relabel(&mut self, id: &str, label: &str) -> Result<(), GraphError> {
		self.mutator.relabel(&mut self.state, id, label)?;
		self.commit();
		Ok(())
	}

	/// Selection is view state: it is snapshotted with mutations but not recorded itself.
	pub fn select(&mut self, id: &str) -> Result<(), GraphError> {
		if !self.state.contains(id) {
			return Err(GraphError::UnknownNode(id.to_string()));
		}
		self.state.selected = id.to_string();
		Ok(())
	}

	/// Replaces the graph with a root-only one. Undoable.
	pub fn clear(&mut self) {
		let color_cursor = self.state.color_cursor;
		self.state = GraphState::new(now_millis());
		self.state.color_cursor = color_cursor;
		self.positions.clear();
		self.commit();
	}

	/// Returns `false` when there is nothing to undo.
	pub fn undo(&mut self) -> bool {
		let Some(snapshot) = self.history.undo() else {
			return false;
		};
		self.state = snapshot.restore();
		self.relayout();
		true
	}

	/// Returns `false` when there is nothing to redo.
	pub fn redo(&mut self) -> bool {
		let Some(snapshot) = self.history.redo() else {
			return false;
		};
		self.state = snapshot.restore();
		self.relayout();
		true
	}

	pub fn can_undo(&self) -> bool {
		self.history.can_undo()
	}

	pub fn can_redo(&self) -> bool {
		self.history.can_redo()
	}

	/// Switches to a saved collection. History starts over from the loaded graph.
	pub fn load_collection(&mut self, record: &CollectionRecord) -> Result<(), ImportError> {
		let state = record.to_state()?;
		info!(
			"loaded collection {} ({} nodes)",
			record.name,
			state.nodes.len()
		);
		self.state = state;
		self.history.reset(&self.state);
		self.positions.clear();
		self.relayout();
		Ok(())
	}

	pub fn to_collection(&self, id: &str, name: &str, color: &str) -> CollectionRecord {
		CollectionRecord::capture(id, name, color, &self.state)
	}

	/// Checks the tree invariant on the live graph.
	pub fn validate(&self) -> Result<(), ImportError> {
		self.state.validate()
	}

	pub fn export_json(&self) -> String {
		export::export_json(&self.state, now_millis())
	}

	pub fn export_markdown(&self) -> String {
		export::export_markdown(&self.state)
	}

	fn commit(&mut self) {
		self.history.record(&self.state);
		self.relayout();
	}

	fn relayout(&mut self) {
		match self
			.layout
			.layout(&self.state.nodes, &self.state.edges, &self.positions)
		{
			Ok(positions) => self.positions = positions,
			Err(err) => warn!("layout failed, keeping previous positions: {err}"),
		}
	}
}

/// An [`IdeaGraph`] fed by an embedding provider.
///
/// Placement awaits the embedding first and only then touches the graph, reading its
/// current state at that moment. A placement still waiting for its embedding when a
/// newer one starts, or when the graph is cleared or replaced by a collection, is
/// abandoned with [`GraphError::Superseded`].
pub struct Workspace<P> {
	graph: Rc<RefCell<IdeaGraph>>,
	embedder: ResilientEmbedder<P>,
	latest: Cell<u64>,
}

impl<P: EmbeddingProvider> Workspace<P> {
	pub fn new(graph: IdeaGraph, embedder: ResilientEmbedder<P>) -> Self {
		Self {
			graph: Rc::new(RefCell::new(graph)),
			embedder,
			latest: Cell::new(0),
		}
	}

	/// Shared handle to the underlying graph.
	pub fn graph(&self) -> Rc<RefCell<IdeaGraph>> {
		Rc::clone(&self.graph)
	}

	/// Embeds `text` and places it under the most related node.
	pub async fn place_new_idea(&self, text: &str) -> Result<Placement, GraphError> {
		let embedding = self.embed_latest(text).await?;
		self.graph.borrow_mut().place(text, embedding)
	}

	/// Embeds `text` and places it under `parent`.
	pub async fn place_new_idea_under(
		&self,
		text: &str,
		parent: &str,
	) -> Result<Placement, GraphError> {
		let embedding = self.embed_latest(text).await?;
		self.graph.borrow_mut().place_under(text, embedding, parent)
	}

	async fn embed_latest(&self, text: &str) -> Result<Embedding, GraphError> {
		let ticket = self.invalidate_pending();
		let embedding = self.embedder.embed(text).await;
		if self.latest.get() != ticket {
			info!("placement of {text:?} superseded");
			return Err(GraphError::Superseded(text.to_string()));
		}
		Ok(embedding)
	}

	/// Bumps the request generation so any placement still awaiting its embedding is
	/// dropped. Returns the new generation.
	fn invalidate_pending(&self) -> u64 {
		let ticket = self.latest.get() + 1;
		self.latest.set(ticket);
		ticket
	}

	/// Switches to a saved collection. Pending placements are superseded.
	pub fn load_collection(&self, record: &CollectionRecord) -> Result<(), ImportError> {
		self.graph.borrow_mut().load_collection(record)?;
		self.invalidate_pending();
		Ok(())
	}

	/// Clears the graph. Pending placements are superseded.
	pub fn clear(&self) {
		self.invalidate_pending();
		self.graph.borrow_mut().clear();
	}

	pub fn delete_node(&self, id: &str) -> Result<Removal, GraphError> {
		self.graph.borrow_mut().delete_node(id)
	}

	pub fn relabel(&self, id: &str, label: &str) -> Result<(), GraphError> {
		self.graph.borrow_mut().relabel(id, label)
	}

	pub fn undo(&self) -> bool {
		self.graph.borrow_mut().undo()
	}

	pub fn redo(&self) -> bool {
		self.graph.borrow_mut().redo()
	}

	pub fn export_json(&self) -> String {
		self.graph.borrow().export_json()
	}

	pub fn export_markdown(&self) -> String {
		self.graph.borrow().export_markdown()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::LayoutError;
	use crate::graph::{Edge, IdeaNode, ROOT_ID};

	struct Failing;

	impl LayoutEngine for Failing {
		fn layout(
			&self,
			_nodes: &[IdeaNode],
			_edges: &[Edge],
			_prior: &Positions,
		) -> Result<Positions, LayoutError> {
			Err(LayoutError::Diverged(ROOT_ID.into()))
		}
	}

	fn quick() -> EngineConfig {
		let mut config = EngineConfig::default();
		config.layout.iterations = 5;
		config
	}

	fn provided(vector: &[f32]) -> Embedding {
		Embedding {
			vector: vector.to_vec(),
			source: EmbeddingSource::Provider,
		}
	}

	#[test]
	fn every_mutation_records_once() {
		let mut graph = IdeaGraph::new(quick());
		let placed = graph.place("combat", provided(&[1.0, 0.0])).unwrap();
		assert_eq!(graph.history().len(), 2);
		graph.relabel(&placed.insertion.node.id, "fighting").unwrap();
		assert_eq!(graph.history().len(), 3);
		graph.delete_node(&placed.insertion.node.id).unwrap();
		assert_eq!(graph.history().len(), 4);
		graph.clear();
		assert_eq!(graph.history().len(), 5);

		assert!(graph.delete_node(ROOT_ID).is_err());
		assert_eq!(graph.history().len(), 5);
	}

	#[test]
	fn undo_and_redo_do_not_record() {
		let mut graph = IdeaGraph::new(quick());
		graph.place("combat", provided(&[1.0, 0.0])).unwrap();
		assert!(graph.undo());
		assert!(!graph.undo());
		assert!(graph.redo());
		assert!(!graph.redo());
		assert_eq!(graph.history().len(), 2);
		assert_eq!(graph.state().nodes.len(), 2);
	}

	#[test]
	fn positions_follow_the_graph() {
		let mut graph = IdeaGraph::new(quick());
		let placed = graph.place("combat", provided(&[1.0, 0.0])).unwrap();
		assert!(graph.positions().contains_key(&placed.insertion.node.id));
		graph.undo();
		assert!(!graph.positions().contains_key(&placed.insertion.node.id));
	}

	#[test]
	fn layout_failure_keeps_the_graph() {
		let mut graph = IdeaGraph::with_layout(quick(), Box::new(Failing));
		let placed = graph.place("combat", provided(&[1.0, 0.0])).unwrap();
		assert!(graph.positions().is_empty());
		assert!(graph.state().contains(&placed.insertion.node.id));
		assert!(graph.validate().is_ok());
	}

	#[test]
	fn selection_is_validated() {
		let mut graph = IdeaGraph::new(quick());
		assert_eq!(
			graph.select("ghost"),
			Err(GraphError::UnknownNode("ghost".into()))
		);
		let placed = graph.place("combat", provided(&[1.0, 0.0])).unwrap();
		graph.select(&placed.insertion.node.id).unwrap();
		assert_eq!(graph.state().selected, placed.insertion.node.id);
	}

	#[test]
	fn loading_a_collection_resets_history() {
		let mut source = IdeaGraph::new(quick());
		source.place("combat", provided(&[1.0, 0.0])).unwrap();
		let record = source.to_collection("c1", "Game", "#fff");

		let mut graph = IdeaGraph::new(quick());
		graph.place("economy", provided(&[0.0, 1.0])).unwrap();
		graph.load_collection(&record).unwrap();

		assert!(!graph.can_undo());
		assert_eq!(graph.history().len(), 1);
		assert_eq!(graph.state().nodes, source.state().nodes);
	}

	#[test]
	fn clear_keeps_the_color_cursor() {
		let mut graph = IdeaGraph::new(quick());
		graph.place("combat", provided(&[1.0, 0.0])).unwrap();
		graph.clear();
		assert_eq!(graph.state().nodes.len(), 1);
		let next = graph.place("economy", provided(&[0.0, 1.0])).unwrap();
		assert_eq!(next.insertion.node.color, graph.config().palette[1]);
	}
	mod workspace {
		use std::future::Future;
		use std::pin::Pin;
		use std::task::{Context, Poll};

		use async_trait::async_trait;
		use futures::executor::block_on;
		use futures::join;

		use super::*;
		use crate::error::EmbedError;
		use crate::graph::Vector;

		/// Pending once, then ready.
		struct YieldOnce(bool);

		impl Future for YieldOnce {
			type Output = ();

			fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
				if self.0 {
					return Poll::Ready(());
				}
				self.0 = true;
				cx.waker().wake_by_ref();
				Poll::Pending
			}
		}

		/// Texts starting with "slow" take a few polls to embed.
		struct Keyed;

		#[async_trait(?Send)]
		impl EmbeddingProvider for Keyed {
			async fn embed(&self, text: &str) -> Result<Vector, EmbedError> {
				if text.starts_with("slow") {
					for _ in 0..3 {
						YieldOnce(false).await;
					}
				}
				if text.contains("fail") {
					return Err(EmbedError::Unavailable("down".into()));
				}
				if text.contains("nan") {
					return Ok(vec![f32::NAN, 0.0]);
				}
				Ok(if text.contains("gold") {
					vec![0.0, 1.0]
				} else {
					vec![1.0, 0.0]
				})
			}

			fn dimension(&self) -> usize {
				2
			}
		}

		fn workspace() -> Workspace<Keyed> {
			Workspace::new(IdeaGraph::new(quick()), ResilientEmbedder::new(Keyed))
		}

		#[test]
		fn places_from_provider_vectors() {
			let ws = workspace();
			let combat = block_on(ws.place_new_idea("combat")).unwrap();
			assert_eq!(combat.source, EmbeddingSource::Provider);
			assert!(combat.insertion.node.is_anchor());

			let sword = block_on(ws.place_new_idea("sword")).unwrap();
			assert_eq!(sword.insertion.edge.source, combat.insertion.node.id);

			let gold = block_on(ws.place_new_idea("gold")).unwrap();
			assert!(gold.insertion.node.is_anchor());
		}

		#[test]
		fn provider_failure_still_places() {
			let ws = workspace();
			let placed = block_on(ws.place_new_idea("fail fast")).unwrap();
			assert_eq!(placed.source, EmbeddingSource::Fallback);
			assert_eq!(placed.insertion.node.embedding.as_ref().map(Vec::len), Some(2));
			assert_eq!(ws.graph().borrow().state().nodes.len(), 2);
		}

		#[test]
		fn non_finite_provider_vector_does_not_break_placement() {
			let ws = workspace();
			let bad = block_on(ws.place_new_idea("nan idea")).unwrap();
			assert_eq!(bad.source, EmbeddingSource::Fallback);
			assert!(
				bad.insertion
					.node
					.embedding
					.iter()
					.flatten()
					.all(|x| x.is_finite())
			);

			let combat = block_on(ws.place_new_idea("combat")).unwrap();
			let sword = block_on(ws.place_new_idea("sword")).unwrap();
			assert_eq!(sword.insertion.edge.source, combat.insertion.node.id);
		}

		#[test]
		fn switching_collections_supersedes_a_pending_placement() {
			let other = {
				let mut source = IdeaGraph::new(quick());
				source.place("economy", provided(&[0.0, 1.0])).unwrap();
				source.to_collection("c2", "Other", "#fff")
			};
			let ws = workspace();
			let (placed, loaded) = block_on(async {
				join!(ws.place_new_idea("slow idea typed before the switch"), async {
					ws.load_collection(&other)
				})
			});
			assert!(loaded.is_ok());
			assert_eq!(
				placed,
				Err(GraphError::Superseded(
					"slow idea typed before the switch".into()
				))
			);

			let graph = ws.graph();
			let graph = graph.borrow();
			let labels: Vec<&str> = graph
				.state()
				.nodes
				.iter()
				.map(|n| n.label.as_str())
				.collect();
			assert_eq!(labels, vec!["Ideas", "economy"]);
			assert!(!graph.can_undo());
		}

		#[test]
		fn clearing_supersedes_a_pending_placement() {
			let ws = workspace();
			let (placed, ()) =
				block_on(async { join!(ws.place_new_idea("slow sword"), async { ws.clear() }) });
			assert!(matches!(placed, Err(GraphError::Superseded(_))));
			assert_eq!(ws.graph().borrow().state().nodes.len(), 1);
		}

		#[test]
		fn newer_request_supersedes_a_pending_one() {
			let ws = workspace();
			let (slow, fast) = block_on(async {
				join!(ws.place_new_idea("slow sword"), ws.place_new_idea("shield"))
			});
			assert_eq!(slow, Err(GraphError::Superseded("slow sword".into())));
			let fast = fast.unwrap();

			let graph = ws.graph();
			let graph = graph.borrow();
			assert_eq!(graph.state().nodes.len(), 2);
			assert_eq!(graph.state().nodes[1].id, fast.insertion.node.id);
			assert_eq!(graph.history().len(), 2);
		}

		#[test]
		fn placement_reads_the_graph_after_the_embedding_arrives() {
			let ws = workspace();
			let combat = block_on(ws.place_new_idea("combat")).unwrap();
			let parent = combat.insertion.node.id.clone();

			let (placed, deleted) = block_on(async {
				join!(ws.place_new_idea_under("slow sword", &parent), async {
					ws.delete_node(&parent)
				})
			});
			assert!(deleted.is_ok());
			assert_eq!(placed, Err(GraphError::UnknownNode(parent)));
			assert_eq!(ws.graph().borrow().state().nodes.len(), 1);
		}

		#[test]
		fn undo_redo_through_the_workspace() {
			let ws = workspace();
			block_on(ws.place_new_idea("combat")).unwrap();
			assert!(ws.undo());
			assert!(ws.export_markdown().starts_with("# Ideas\n"));
			assert!(!ws.export_markdown().contains("combat"));
			assert!(ws.redo());
			assert!(ws.export_markdown().contains("- combat"));
		}
	}
}
