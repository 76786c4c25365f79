use idea_graph::collection::{CollectionRecord, find_duplicate};
use idea_graph::config::EngineConfig;
use idea_graph::embed::{Embedding, EmbeddingSource};
use idea_graph::session::IdeaGraph;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn engine(history_limit: usize) -> IdeaGraph {
	let mut config = EngineConfig::default();
	config.layout.iterations = 0;
	config.history_limit = history_limit;
	IdeaGraph::new(config)
}

fn provided(vector: &[f32]) -> Embedding {
	Embedding {
		vector: vector.to_vec(),
		source: EmbeddingSource::Provider,
	}
}

proptest! {
	#[test]
	fn undo_depth_never_exceeds_the_limit(limit in 1usize..8, placements in 0usize..20) {
		let mut graph = engine(limit);
		for i in 0..placements {
			graph.place(&format!("idea {i}"), provided(&[1.0, i as f32])).unwrap();
		}
		prop_assert!(graph.history().len() <= limit);

		let mut undone = 0;
		while graph.undo() {
			undone += 1;
		}
		prop_assert_eq!(undone, placements.min(limit - 1));
		prop_assert_eq!(graph.state().nodes.len(), 1 + placements - undone);
	}
}

#[test]
fn new_mutation_discards_the_redo_branch() {
	let mut graph = engine(50);
	graph.place("combat", provided(&[1.0, 0.0])).unwrap();
	graph.place("gold", provided(&[0.0, 1.0])).unwrap();
	assert!(graph.undo());
	assert!(graph.can_redo());

	graph.place("quest", provided(&[0.7, -0.7])).unwrap();
	assert!(!graph.can_redo());
	assert!(!graph.redo());
	let labels: Vec<&str> = graph
		.state()
		.nodes
		.iter()
		.map(|n| n.label.as_str())
		.collect();
	assert_eq!(labels, vec!["Ideas", "combat", "quest"]);
}

#[test]
fn collections_survive_a_save_and_load() {
	let mut graph = engine(50);
	let combat = graph.place("combat", provided(&[1.0, 0.0])).unwrap();
	graph
		.place_under("sword", provided(&[0.9, 0.1]), &combat.insertion.node.id)
		.unwrap();
	let saved = graph.to_collection("c1", "Game", "#d62728");
	let json = saved.to_json();

	let mut other = engine(50);
	other.place("unrelated", provided(&[0.0, 1.0])).unwrap();
	other
		.load_collection(&CollectionRecord::from_json(&json).unwrap())
		.unwrap();

	assert_eq!(other.state().nodes, graph.state().nodes);
	assert_eq!(other.state().edges, graph.state().edges);
	assert!(!other.can_undo());
	assert_eq!(other.export_markdown(), "# Ideas\n- combat\n  - sword\n");

	let copy = other.to_collection("c2", "Copy", "#000000");
	let existing = [saved];
	assert_eq!(
		find_duplicate(&existing, &copy).map(|r| r.id.as_str()),
		Some("c1")
	);
}
