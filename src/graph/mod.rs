//! The placement engine: graph model, scoring, mutation and history.

mod hierarchy;
mod history;
mod layout;
mod mutator;
mod placement;
mod resolver;
mod state;
mod types;
pub mod vector;

pub use hierarchy::HierarchyIndex;
pub use history::{GraphSnapshot, HistoryStore};
pub use layout::{ForceLayout, LayoutEngine, Positions};
pub use mutator::{GraphMutator, Insertion, Removal};
pub use placement::{PlacementDecision, PlacementPolicy};
pub use resolver::{MatchKind, ParentResolver, Resolution};
pub use state::GraphState;
pub use types::{Edge, IdeaNode, NodeKind, Position, ROOT_ID, Vector};
