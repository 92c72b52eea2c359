//! relation-graph: interactive entity/relationship graph visualization.
//!
//! This crate provides a WASM-based canvas component that renders relation
//! graphs with force-directed layout, parallel and self edges, path queries,
//! highlighting, filtering, pan/zoom and interactive edge creation.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::relation_graph::{
	ClickTarget, GraphData, GraphError, GraphOptions, RelationGraph, RelationGraphCanvas,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("relation-graph: logging initialized");
}

/// Text content of the `<script>` element with the given id.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load graph data from a script element with id="graph-data".
/// Expected format: JSON with { vertexes: [...], edges: [...] }
fn load_graph_data() -> Option<GraphData> {
	let json_text = script_text("graph-data")?;

	match serde_json::from_str::<GraphData>(&json_text) {
		Ok(data) => {
			info!(
				"relation-graph: loaded {} vertexes, {} edges",
				data.vertexes.len(),
				data.edges.len()
			);
			Some(data)
		}
		Err(e) => {
			warn!("relation-graph: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Load options from an optional script element with id="graph-options".
fn load_graph_options() -> GraphOptions {
	let Some(json_text) = script_text("graph-options") else {
		return GraphOptions::default();
	};
	GraphOptions::from_json(&json_text).unwrap_or_else(|e| {
		warn!("relation-graph: ignoring graph options: {}", e);
		GraphOptions::default()
	})
}

/// Main application component.
/// Loads graph data and options from the DOM and renders the graph.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let graph_data = load_graph_data().unwrap_or_default();
	let graph_signal = Signal::derive(move || graph_data.clone());
	let options = load_graph_options();

	view! {
		<Html attr:lang="en" attr:dir="ltr" />
		<Title text="Relation Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<RelationGraphCanvas data=graph_signal options=options fullscreen=true />
			<div class="graph-overlay">
				<h1>"Relation Graph"</h1>
				<p class="subtitle">
					"Click a vertex to highlight its neighbors. Shift-drag between vertices to link them. Scroll to zoom."
				</p>
			</div>
		</div>
	}
}
