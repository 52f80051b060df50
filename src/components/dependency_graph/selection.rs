//! Single-node selection backing the detail panel.

use log::debug;

use super::types::GraphEdge;
use super::visibility::VisibleGraph;

/// Tracks at most one selected node id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionController {
	selected: Option<String>,
}

impl SelectionController {
	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	/// Select `id`, or clear the selection if `id` is already selected.
	pub fn select(&mut self, id: &str) {
		if self.selected.as_deref() == Some(id) {
			self.selected = None;
		} else {
			self.selected = Some(id.to_string());
		}
	}

	pub fn deselect(&mut self) {
		self.selected = None;
	}

	/// Clear the selection if the selected node is no longer visible, so the
	/// detail view never points at a hidden node.
	pub fn retain_visible(&mut self, visible: &VisibleGraph<'_>) {
		if let Some(id) = &self.selected {
			if !visible.contains(id) {
				debug!("selection: {:?} was hidden, clearing", id);
				self.selected = None;
			}
		}
	}

	/// Edges entering or leaving `id`, in input order.
	pub fn related_edges<'a>(edges: &'a [GraphEdge], id: &str) -> Vec<&'a GraphEdge> {
		edges.iter().filter(|e| e.touches(id)).collect()
	}
}
