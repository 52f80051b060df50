//! investigation-graph: progressive-disclosure dependency graph for incident
//! investigations.
//!
//! This crate provides a WASM-based graph component that shows which agents,
//! sub-agents, tools and models took part in an investigation. Scopes start
//! collapsed and open on demand; the visible subgraph is laid out either as
//! layered levels or with a force simulation, and layouts are cached.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;

pub use components::dependency_graph::{
	DependencyGraphCanvas, ExpansionState, GraphCommand, GraphEdge, GraphNode, GraphRecord,
	GraphViewState, Layout, LayoutCache, LayoutConfig, LayoutKey, LayoutMode, NodeKind,
	VisibleGraph, visible_subgraph,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("investigation-graph: logging initialized");
}

/// Text content of the `<script>` element with the given id.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load the investigation record from a script element with id="graph-data".
/// Expected format: JSON with { nodes: [...], edges: [...] }
fn load_graph_record() -> Option<GraphRecord> {
	let json_text = script_text("graph-data")?;
	match GraphRecord::from_json(&json_text) {
		Ok(record) => Some(record),
		Err(e) => {
			warn!("investigation-graph: failed to parse graph data: {}", e);
			None
		}
	}
}

/// Load layout overrides from an optional script element with id="graph-config".
fn load_layout_config() -> LayoutConfig {
	let Some(json_text) = script_text("graph-config") else {
		return LayoutConfig::default();
	};
	match serde_json::from_str::<LayoutConfig>(&json_text) {
		Ok(config) => {
			info!("investigation-graph: layout config loaded, mode {:?}", config.mode);
			config
		}
		Err(e) => {
			warn!("investigation-graph: ignoring invalid layout config: {}", e);
			LayoutConfig::default()
		}
	}
}

/// Main application component.
/// Loads the record and layout config from the DOM and renders the graph.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let record = load_graph_record().unwrap_or_default();
	let config = load_layout_config();
	let record_signal = Signal::derive(move || record.clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Investigation Dependencies" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<DependencyGraphCanvas data=record_signal config=config fullscreen=true />
			<div class="graph-overlay">
				<h1>"Investigation dependencies"</h1>
				<p class="subtitle">
					"Click a node for details. Double-click to expand or collapse. Drag to pan, scroll to zoom."
				</p>
			</div>
		</div>
	}
}
