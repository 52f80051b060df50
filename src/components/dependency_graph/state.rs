//! View state for one dependency graph.
//!
//! [`GraphViewState`] owns everything that changes while a graph is on
//! screen: the record, expansion, selection, layout mode and layout cache.
//! All mutation goes through [`GraphCommand`] intents (or the method of the
//! same name), and everything the renderer needs is derived from that state.

use std::rc::Rc;

use log::{debug, info};

use super::cache::{LayoutCache, LayoutKey};
use super::expansion::ExpansionState;
use super::layout::{Layout, LayoutConfig, LayoutMode, Point};
use super::scope::ScopeIndex;
use super::selection::SelectionController;
use super::types::{GraphEdge, GraphNode, GraphRecord};
use super::visibility::{VisibleGraph, visible_subgraph};

/// Intents the surrounding UI can dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphCommand {
	ToggleExpansion(String),
	ExpandAll,
	CollapseAll,
	SetLayoutMode(LayoutMode),
	Select(String),
	Deselect,
	/// New data for the view. Always treated as a different graph.
	ReplaceRecord(GraphRecord),
}

/// A visible node with its computed position.
#[derive(Clone, Debug)]
pub struct PositionedNode<'a> {
	pub node: &'a GraphNode,
	pub position: Point,
	/// Whether the node's scope children are disclosed.
	pub expanded: bool,
	pub selected: bool,
}

/// A visible edge with endpoint positions and optional bend points.
#[derive(Clone, Debug)]
pub struct PositionedEdge<'a> {
	pub edge: &'a GraphEdge,
	pub from: Point,
	pub to: Point,
	pub bend_points: Vec<Point>,
}

/// Renderer input: the visible subgraph placed by the current layout.
#[derive(Clone, Debug)]
pub struct PositionedGraph<'a> {
	pub nodes: Vec<PositionedNode<'a>>,
	pub edges: Vec<PositionedEdge<'a>>,
	/// The cached layout these positions came from.
	pub layout: Rc<Layout>,
}

impl<'a> PositionedGraph<'a> {
	fn assemble(
		visible: VisibleGraph<'a>,
		layout: Rc<Layout>,
		expansion: &ExpansionState,
		selected: Option<&str>,
	) -> Self {
		let at = |id: &str| layout.position(id).unwrap_or_default();

		let nodes = visible
			.nodes
			.into_iter()
			.map(|node| PositionedNode {
				node,
				position: at(&node.id),
				expanded: expansion.is_expanded(&node.id),
				selected: selected == Some(node.id.as_str()),
			})
			.collect();

		let edges = visible
			.edges
			.into_iter()
			.enumerate()
			.map(|(i, edge)| PositionedEdge {
				edge,
				from: at(&edge.source_id),
				to: at(&edge.target_id),
				bend_points: layout
					.edge_paths
					.get(i)
					.map(|p| p.bend_points.clone())
					.unwrap_or_default(),
			})
			.collect();

		Self {
			nodes,
			edges,
			layout,
		}
	}

	pub fn bounds(&self) -> Option<(Point, Point)> {
		self.layout.bounds()
	}
}

/// Selected node plus every edge touching it, for the detail panel.
#[derive(Clone, Debug)]
pub struct SelectionDetail<'a> {
	pub node: &'a GraphNode,
	pub related_edges: Vec<&'a GraphEdge>,
}

/// Mutable state of one graph view.
pub struct GraphViewState {
	record: GraphRecord,
	scope: ScopeIndex,
	expansion: ExpansionState,
	selection: SelectionController,
	mode: LayoutMode,
	config: LayoutConfig,
	cache: LayoutCache,
}

impl GraphViewState {
	pub fn new(record: GraphRecord, config: LayoutConfig) -> Self {
		let scope = ScopeIndex::new(&record);
		let expansion = ExpansionState::for_record(&scope);
		Self {
			record,
			scope,
			expansion,
			selection: SelectionController::default(),
			mode: config.mode,
			cache: LayoutCache::new(config.cache_capacity),
			config,
		}
	}

	/// Dispatch one intent.
	pub fn apply(&mut self, command: GraphCommand) {
		match command {
			GraphCommand::ToggleExpansion(id) => self.toggle_expansion(&id),
			GraphCommand::ExpandAll => self.expand_all(),
			GraphCommand::CollapseAll => self.collapse_all(),
			GraphCommand::SetLayoutMode(mode) => self.set_layout_mode(mode),
			GraphCommand::Select(id) => self.select(&id),
			GraphCommand::Deselect => self.deselect(),
			GraphCommand::ReplaceRecord(record) => self.replace_record(record),
		}
	}

	/// Expand or collapse a visible node. Unknown and hidden ids are ignored,
	/// so no expanded node ever sits under a collapsed scope.
	pub fn toggle_expansion(&mut self, id: &str) {
		if !self.visible().contains(id) {
			debug!("view: toggle of unknown or hidden node {:?} ignored", id);
			return;
		}
		self.expansion.toggle(&self.scope, id);
		self.sync_selection();
	}

	pub fn expand_all(&mut self) {
		self.expansion.expand_all(&self.scope);
	}

	pub fn collapse_all(&mut self) {
		self.expansion.collapse_all(&self.scope);
		self.sync_selection();
	}

	pub fn set_layout_mode(&mut self, mode: LayoutMode) {
		if self.mode != mode {
			debug!("view: layout mode {:?} -> {:?}", self.mode, mode);
			self.mode = mode;
		}
	}

	/// Select a visible node, or clear the selection if it is already
	/// selected. Unknown and hidden ids are ignored.
	pub fn select(&mut self, id: &str) {
		if !self.visible().contains(id) {
			debug!("view: select of unknown or hidden node {:?} ignored", id);
			return;
		}
		self.selection.select(id);
	}

	pub fn deselect(&mut self) {
		self.selection.deselect();
	}

	/// Swap in a new record: expansion starts over, selection is dropped and
	/// every cached layout is discarded.
	pub fn replace_record(&mut self, record: GraphRecord) {
		info!(
			"view: new record with {} nodes, {} edges",
			record.nodes.len(),
			record.edges.len()
		);
		self.scope = ScopeIndex::new(&record);
		self.expansion = ExpansionState::for_record(&self.scope);
		self.record = record;
		self.selection.deselect();
		self.cache.invalidate();
	}

	pub fn record(&self) -> &GraphRecord {
		&self.record
	}

	pub fn expansion(&self) -> &ExpansionState {
		&self.expansion
	}

	pub fn is_expanded(&self, id: &str) -> bool {
		self.expansion.is_expanded(id)
	}

	pub fn mode(&self) -> LayoutMode {
		self.mode
	}

	pub fn selected(&self) -> Option<&str> {
		self.selection.selected()
	}

	pub fn cache(&self) -> &LayoutCache {
		&self.cache
	}

	pub fn visible(&self) -> VisibleGraph<'_> {
		visible_subgraph(&self.record, &self.expansion)
	}

	/// Positioned visible subgraph, or `None` when nothing is visible.
	///
	/// The layout comes from the cache when the visible set and mode are
	/// unchanged, so calling this every frame is cheap.
	pub fn positioned(&mut self) -> Option<PositionedGraph<'_>> {
		let visible = visible_subgraph(&self.record, &self.expansion);
		if visible.is_empty() {
			return None;
		}

		let key = LayoutKey::new(&visible, self.mode, &self.expansion);
		let (config, mode) = (&self.config, self.mode);
		let layout = self
			.cache
			.get_or_compute(key, || config.compute(mode, &visible));
		Some(PositionedGraph::assemble(
			visible,
			layout,
			&self.expansion,
			self.selection.selected(),
		))
	}

	pub fn selection_detail(&self) -> Option<SelectionDetail<'_>> {
		let id = self.selection.selected()?;
		let node = self.record.node(id)?;
		Some(SelectionDetail {
			node,
			related_edges: SelectionController::related_edges(&self.record.edges, id),
		})
	}

	fn sync_selection(&mut self) {
		let visible = visible_subgraph(&self.record, &self.expansion);
		self.selection.retain_visible(&visible);
	}
}
