use serde::{Deserialize, Serialize};

/// Id of the synthetic root every graph starts with.
pub const ROOT_ID: &str = "root";

/// Embedding vector attached to an idea.
pub type Vector = Vec<f32>;

/// Role of a node within the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	/// The single synthetic root.
	Root,
	/// A top-level topic directly under the root.
	Anchor,
	/// Any idea attached under an anchor or another satellite.
	Satellite,
}

/// A single idea in the graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaNode {
	/// Unique id; the root always uses [`ROOT_ID`].
	pub id: String,
	/// Role within the tree.
	pub kind: NodeKind,
	/// Text the user typed.
	pub label: String,
	/// Label of the anchor this node descends from.
	pub topic: String,
	/// Display color, inherited from the anchor.
	pub color: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub embedding: Option<Vector>,
	/// Display-only back-reference; edges are authoritative.
	#[serde(default)]
	pub parent_id: Option<String>,
	/// Milliseconds since the Unix epoch.
	pub created_at: u64,
}

impl IdeaNode {
	/// Builds the root node.
	pub fn root(created_at: u64) -> Self {
		Self {
			id: ROOT_ID.into(),
			kind: NodeKind::Root,
			label: "Ideas".into(),
			topic: String::new(),
			color: "#ffffff".into(),
			embedding: None,
			parent_id: None,
			created_at,
		}
	}

	/// True for the synthetic root.
	pub fn is_root(&self) -> bool {
		self.kind == NodeKind::Root
	}

	/// True for top-level topics.
	pub fn is_anchor(&self) -> bool {
		self.kind == NodeKind::Anchor
	}
}

/// Directed parent to child link.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
	/// Parent id.
	pub source: String,
	/// Child id.
	pub target: String,
}

impl Edge {
	/// Links `source` as the parent of `target`.
	pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}

	/// Whether `id` is either endpoint.
	pub fn touches(&self, id: &str) -> bool {
		self.source == id || self.target == id
	}
}

/// 2-D coordinate produced by the layout engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f32,
	pub y: f32,
}
