//! Error types for graph mutation, import, embedding, and layout.

use thiserror::Error;

/// A rejected graph operation. The live graph is untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
	/// The root node cannot be deleted.
	#[error("the root node cannot be deleted")]
	RootImmutable,

	/// The referenced node does not exist in the current graph.
	#[error("unknown node: {0}")]
	UnknownNode(String),

	/// Id allocation kept colliding with existing nodes.
	#[error("could not allocate a unique node id (last attempt: {0})")]
	IdCollision(String),

	/// Labels must contain at least one non-whitespace character.
	#[error("label must not be empty")]
	EmptyLabel,

	/// A newer placement request or a graph switch happened while this one awaited its
	/// embedding. Carries the text that was not placed.
	#[error("placement of {0:?} was superseded")]
	Superseded(String),
}

/// Reasons a collection import is rejected as a whole.
#[derive(Debug, Error)]
pub enum ImportError {
	/// The payload is not valid JSON for a collection record.
	#[error("malformed collection: {0}")]
	Json(#[from] serde_json::Error),

	/// A node has an empty id.
	#[error("node at position {0} has no id")]
	MissingId(usize),

	/// A node has an empty label.
	#[error("node {0} has no label")]
	MissingLabel(String),

	/// Two nodes share an id.
	#[error("duplicate node id: {0}")]
	DuplicateId(String),

	/// No node carries the root id, or more than one node is of root kind.
	#[error("collection must contain exactly one root node")]
	MissingRoot,

	/// An edge references a node that is not part of the collection.
	#[error("edge {parent} -> {child} references an unknown node")]
	UnknownEndpoint {
		/// Parent end of the edge.
		parent: String,
		/// Child end of the edge.
		child: String,
	},

	/// The edges do not form a tree rooted at the root node.
	#[error("edges do not form a rooted tree: {0}")]
	NotATree(String),

	/// An anchor that is not a child of the root, or a satellite that is.
	#[error("node {0} has the wrong kind for its position")]
	KindMismatch(String),
}

/// Failure reported by an embedding provider.
#[derive(Debug, Clone, Error)]
pub enum EmbedError {
	/// The provider could not be reached or refused the request.
	#[error("embedding provider unavailable: {0}")]
	Unavailable(String),

	/// The provider answered with a vector of the wrong size.
	#[error("embedding has dimension {got}, expected {expected}")]
	Dimension {
		/// Dimension the provider advertises.
		expected: usize,
		/// Dimension actually returned.
		got: usize,
	},

	/// The provider answered with something that is not a numeric vector.
	#[error("malformed embedding response: {0}")]
	Malformed(String),

	/// The provider answered with a NaN or infinite component.
	#[error("embedding component {0} is not finite")]
	NonFinite(usize),
}

/// Failure of the layout engine. Prior positions stay in place when this is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
	/// The simulation produced a non-finite coordinate.
	#[error("layout diverged at node {0}")]
	Diverged(String),
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The configuration document could not be parsed.
	#[error("config parse error: {0}")]
	Json(#[from] serde_json::Error),

	/// A field holds a value outside its accepted range.
	#[error("invalid value for '{field}': {reason}")]
	Invalid {
		/// Name of the offending field.
		field: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
}
