//! Browser entry points.
//!
//! Structured values cross the boundary as JSON strings; errors surface as rejected
//! promises or thrown strings.

use std::rc::Rc;

use async_trait::async_trait;
use js_sys::{Array, Float32Array, Function, Promise};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise};

use crate::collection::CollectionRecord;
use crate::config::EngineConfig;
use crate::embed::{EmbeddingProvider, EmbeddingSource, ResilientEmbedder};
use crate::error::{EmbedError, GraphError};
use crate::graph::{IdeaNode, PlacementDecision, Vector};
use crate::session::{IdeaGraph, Placement, Workspace};

fn describe(value: &JsValue) -> String {
	value
		.as_string()
		.or_else(|| {
			value
				.dyn_ref::<js_sys::Error>()
				.map(|e| String::from(e.message()))
		})
		.unwrap_or_else(|| format!("{value:?}"))
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
	JsValue::from_str(&err.to_string())
}

/// Embedding provider backed by a JS function of one string.
///
/// The function may return an array of numbers, a `Float32Array`, or a promise of either.
pub struct JsEmbeddingProvider {
	callback: Function,
	dimension: usize,
}

impl JsEmbeddingProvider {
	pub fn new(callback: Function, dimension: usize) -> Self {
		Self {
			callback,
			dimension,
		}
	}
}

fn to_vector(value: &JsValue) -> Result<Vector, EmbedError> {
	if let Some(typed) = value.dyn_ref::<Float32Array>() {
		return Ok(typed.to_vec());
	}
	if !Array::is_array(value) {
		return Err(EmbedError::Malformed(format!(
			"expected an array, got {}",
			describe(value)
		)));
	}
	Array::from(value)
		.iter()
		.enumerate()
		.map(|(i, v)| {
			v.as_f64()
				.map(|f| f as f32)
				.ok_or_else(|| EmbedError::Malformed(format!("component {i} is not a number")))
		})
		.collect()
}

#[async_trait(?Send)]
impl EmbeddingProvider for JsEmbeddingProvider {
	async fn embed(&self, text: &str) -> Result<Vector, EmbedError> {
		let value = self
			.callback
			.call1(&JsValue::NULL, &JsValue::from_str(text))
			.map_err(|e| EmbedError::Unavailable(describe(&e)))?;
		let value = match value.dyn_into::<Promise>() {
			Ok(promise) => JsFuture::from(promise)
				.await
				.map_err(|e| EmbedError::Unavailable(describe(&e)))?,
			Err(value) => value,
		};
		to_vector(&value)
	}

	fn dimension(&self) -> usize {
		self.dimension
	}

	fn name(&self) -> &str {
		"js-embedding"
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlacementReport<'a> {
	node: &'a IdeaNode,
	parent_id: &'a str,
	new_anchor: bool,
	similarity: Option<f32>,
	fallback: bool,
}

fn report(placement: &Placement) -> Result<JsValue, JsValue> {
	let similarity = match &placement.decision {
		PlacementDecision::Attach { similarity, .. } => *similarity,
		PlacementDecision::NewAnchor { .. } => None,
	};
	let report = PlacementReport {
		node: &placement.insertion.node,
		parent_id: &placement.insertion.edge.source,
		new_anchor: matches!(placement.decision, PlacementDecision::NewAnchor { .. }),
		similarity,
		fallback: placement.source == EmbeddingSource::Fallback,
	};
	serde_json::to_string(&report)
		.map(|json| JsValue::from_str(&json))
		.map_err(to_js)
}

/// Rejection value of a placement promise: a JSON object with the error message, plus
/// the unplaced text when the placement was superseded so the UI can offer a retry.
fn placement_error(err: GraphError) -> JsValue {
	let body = match &err {
		GraphError::Superseded(text) => serde_json::json!({
			"kind": "superseded",
			"message": err.to_string(),
			"text": text,
		}),
		_ => serde_json::json!({
			"kind": "rejected",
			"message": err.to_string(),
		}),
	};
	JsValue::from_str(&body.to_string())
}

fn parse_config(config_json: Option<String>) -> Result<EngineConfig, JsValue> {
	match config_json {
		Some(json) => EngineConfig::from_json(&json).map_err(to_js),
		None => Ok(EngineConfig::default()),
	}
}

/// An idea graph driven from JavaScript.
#[wasm_bindgen]
pub struct IdeaGraphApp {
	workspace: Rc<Workspace<JsEmbeddingProvider>>,
}

#[wasm_bindgen]
impl IdeaGraphApp {
	/// Uses `embed` as the embedding provider. `config_json` overrides engine defaults.
	#[wasm_bindgen(constructor)]
	pub fn new(
		embed: Function,
		dimension: usize,
		config_json: Option<String>,
	) -> Result<IdeaGraphApp, JsValue> {
		let config = parse_config(config_json)?;
		let provider = JsEmbeddingProvider::new(embed, dimension);
		Ok(Self {
			workspace: Rc::new(Workspace::new(
				IdeaGraph::new(config),
				ResilientEmbedder::new(provider),
			)),
		})
	}

	/// Keyword fallback embeddings only.
	pub fn offline(config_json: Option<String>) -> Result<IdeaGraphApp, JsValue> {
		let config = parse_config(config_json)?;
		let embedder = ResilientEmbedder::offline(config.fallback_dimension);
		Ok(Self {
			workspace: Rc::new(Workspace::new(IdeaGraph::new(config), embedder)),
		})
	}

	/// Resolves to a placement report once the idea is in the graph. Rejects with a JSON
	/// error object.
	#[wasm_bindgen(js_name = placeIdea)]
	pub fn place_idea(&self, text: String) -> Promise {
		let workspace = Rc::clone(&self.workspace);
		future_to_promise(async move {
			let placement = workspace
				.place_new_idea(&text)
				.await
				.map_err(placement_error)?;
			report(&placement)
		})
	}

	#[wasm_bindgen(js_name = placeIdeaUnder)]
	pub fn place_idea_under(&self, text: String, parent: String) -> Promise {
		let workspace = Rc::clone(&self.workspace);
		future_to_promise(async move {
			let placement = workspace
				.place_new_idea_under(&text, &parent)
				.await
				.map_err(placement_error)?;
			report(&placement)
		})
	}

	/// Returns the number of nodes removed.
	#[wasm_bindgen(js_name = deleteNode)]
	pub fn delete_node(&self, id: &str) -> Result<usize, JsValue> {
		let removal = self.workspace.delete_node(id).map_err(to_js)?;
		Ok(removal.nodes.len())
	}

	pub fn relabel(&self, id: &str, label: &str) -> Result<(), JsValue> {
		self.workspace.relabel(id, label).map_err(to_js)
	}

	pub fn select(&self, id: &str) -> Result<(), JsValue> {
		self.workspace.graph().borrow_mut().select(id).map_err(to_js)
	}

	/// Also rejects any placement still awaiting its embedding.
	pub fn clear(&self) {
		self.workspace.clear();
	}

	pub fn undo(&self) -> bool {
		self.workspace.undo()
	}

	pub fn redo(&self) -> bool {
		self.workspace.redo()
	}

	#[wasm_bindgen(js_name = canUndo)]
	pub fn can_undo(&self) -> bool {
		self.workspace.graph().borrow().can_undo()
	}

	#[wasm_bindgen(js_name = canRedo)]
	pub fn can_redo(&self) -> bool {
		self.workspace.graph().borrow().can_redo()
	}

	/// Live graph state: nodes, edges, selection.
	#[wasm_bindgen(js_name = graphJson)]
	pub fn graph_json(&self) -> Result<String, JsValue> {
		serde_json::to_string(self.workspace.graph().borrow().state()).map_err(to_js)
	}

	#[wasm_bindgen(js_name = positionsJson)]
	pub fn positions_json(&self) -> Result<String, JsValue> {
		serde_json::to_string(self.workspace.graph().borrow().positions()).map_err(to_js)
	}

	#[wasm_bindgen(js_name = exportJson)]
	pub fn export_json(&self) -> String {
		self.workspace.export_json()
	}

	#[wasm_bindgen(js_name = exportMarkdown)]
	pub fn export_markdown(&self) -> String {
		self.workspace.export_markdown()
	}

	/// Replaces the graph with a saved collection; undo history starts over and pending
	/// placements are rejected.
	#[wasm_bindgen(js_name = loadCollection)]
	pub fn load_collection(&self, json: &str) -> Result<(), JsValue> {
		let record = CollectionRecord::from_json(json).map_err(to_js)?;
		self.workspace.load_collection(&record).map_err(to_js)
	}

	#[wasm_bindgen(js_name = saveCollection)]
	pub fn save_collection(&self, id: &str, name: &str, color: &str) -> String {
		self.workspace
			.graph()
			.borrow()
			.to_collection(id, name, color)
			.to_json()
	}
}
