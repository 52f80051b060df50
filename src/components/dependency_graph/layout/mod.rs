//! Layout strategies for the visible subgraph.
//!
//! Every strategy consumes a [`VisibleGraph`] and produces the same
//! [`Layout`] contract: a position per node id, plus one [`EdgePath`] per
//! visible edge (in visible edge order) that may carry bend points. Strategies
//! are selected by [`LayoutMode`]; the cache and visibility logic never look
//! inside them.

mod force;
mod hierarchical;

use std::collections::HashMap;

use serde::Deserialize;

use super::visibility::VisibleGraph;

pub use force::{ForceConfig, ForceDirectedLayout};
pub use hierarchical::{EdgeRouting, HierarchicalConfig, HierarchicalLayout};

/// A position in layout space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Route of one visible edge. `bend_points` excludes both endpoints.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgePath {
	pub source_id: String,
	pub target_id: String,
	pub bend_points: Vec<Point>,
}

/// Output shared by all layout strategies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
	pub positions: HashMap<String, Point>,
	/// Aligned with the visible edge list the layout was computed from.
	pub edge_paths: Vec<EdgePath>,
}

impl Layout {
	pub fn position(&self, id: &str) -> Option<Point> {
		self.positions.get(id).copied()
	}

	/// Axis-aligned bounds of all node positions and bend points as
	/// `(min, max)`, or `None` for an empty layout.
	pub fn bounds(&self) -> Option<(Point, Point)> {
		let points = self
			.positions
			.values()
			.chain(self.edge_paths.iter().flat_map(|p| p.bend_points.iter()));
		points.fold(None, |acc, p| match acc {
			None => Some((*p, *p)),
			Some((min, max)) => Some((
				Point::new(min.x.min(p.x), min.y.min(p.y)),
				Point::new(max.x.max(p.x), max.y.max(p.y)),
			)),
		})
	}

	/// Straight paths for every edge, used by strategies without routing.
	pub(crate) fn straight_paths(graph: &VisibleGraph<'_>) -> Vec<EdgePath> {
		graph
			.edges
			.iter()
			.map(|e| EdgePath {
				source_id: e.source_id.clone(),
				target_id: e.target_id.clone(),
				bend_points: Vec::new(),
			})
			.collect()
	}
}

/// Which strategy positions the graph.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
	#[default]
	Hierarchical,
	ForceDirected,
}

impl LayoutMode {
	/// The other mode, for a two-state toolbar toggle.
	pub fn toggled(self) -> Self {
		match self {
			LayoutMode::Hierarchical => LayoutMode::ForceDirected,
			LayoutMode::ForceDirected => LayoutMode::Hierarchical,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			LayoutMode::Hierarchical => "Hierarchical",
			LayoutMode::ForceDirected => "Force-directed",
		}
	}
}

/// A positioning algorithm.
pub trait LayoutStrategy {
	/// Position every node of a non-empty visible graph.
	fn layout(&self, graph: &VisibleGraph<'_>) -> Layout;
}

/// Layout engine configuration. Every field has a usable default, so a
/// partial JSON document overrides only what it names.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
	/// Mode used when a view is first created.
	pub mode: LayoutMode,
	pub hierarchical: HierarchicalConfig,
	pub force: ForceConfig,
	/// Maximum number of layouts kept by the cache.
	pub cache_capacity: usize,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			mode: LayoutMode::default(),
			hierarchical: HierarchicalConfig::default(),
			force: ForceConfig::default(),
			cache_capacity: 32,
		}
	}
}

impl LayoutConfig {
	/// Run the strategy selected by `mode`.
	pub fn compute(&self, mode: LayoutMode, graph: &VisibleGraph<'_>) -> Layout {
		match mode {
			LayoutMode::Hierarchical => HierarchicalLayout::new(&self.hierarchical).layout(graph),
			LayoutMode::ForceDirected => ForceDirectedLayout::new(&self.force).layout(graph),
		}
	}
}
