//! Semantic placement engine for trees of short text ideas.
//!
//! Each idea is embedded as a vector and attached under the existing node it relates to
//! most, or started as a new top-level topic when nothing is related enough. The graph
//! is always a single tree rooted at a fixed node.

use log::{Level, info};
use wasm_bindgen::prelude::*;

mod bindings;
mod clock;
pub mod collection;
pub mod config;
pub mod embed;
pub mod error;
pub mod export;
pub mod graph;
pub mod session;

pub use bindings::{IdeaGraphApp, JsEmbeddingProvider};
pub use config::{EngineConfig, LayoutConfig, TieBreak};
pub use error::{ConfigError, EmbedError, GraphError, ImportError, LayoutError};
pub use session::{IdeaGraph, Placement, Workspace};

/// Initialize logging and panic hooks for the WASM target.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}
