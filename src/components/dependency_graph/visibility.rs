//! Visible subgraph selection.

use std::collections::HashSet;

use super::expansion::ExpansionState;
use super::scope::scope_parent;
use super::types::{GraphEdge, GraphNode, GraphRecord};

/// Nodes and edges currently disclosed, borrowed from the record in input order.
#[derive(Clone, Debug, Default)]
pub struct VisibleGraph<'a> {
	pub nodes: Vec<&'a GraphNode>,
	pub edges: Vec<&'a GraphEdge>,
}

impl<'a> VisibleGraph<'a> {
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.nodes.iter().any(|n| n.id == id)
	}
}

/// Compute the visible subgraph for a record and expansion state.
///
/// A node is visible when its scope parent is absent, is the origin, or is
/// expanded. An edge is visible when both endpoints are, which also drops
/// edges whose endpoints do not exist.
pub fn visible_subgraph<'a>(record: &'a GraphRecord, expansion: &ExpansionState) -> VisibleGraph<'a> {
	let origins: HashSet<&str> = record
		.nodes
		.iter()
		.filter(|n| n.is_origin())
		.map(|n| n.id.as_str())
		.collect();

	let nodes: Vec<&GraphNode> = record
		.nodes
		.iter()
		.filter(|n| match scope_parent(n.parent_scope_id.as_deref(), &origins) {
			None => true,
			Some(parent) => expansion.is_expanded(parent),
		})
		.collect();

	let visible_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
	let edges = record
		.edges
		.iter()
		.filter(|e| {
			visible_ids.contains(e.source_id.as_str()) && visible_ids.contains(e.target_id.as_str())
		})
		.collect();

	VisibleGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
	use super::super::scope::ScopeIndex;
	use super::super::types::fixtures::{edge, nested, single_agent};
	use super::*;

	fn ids<'a>(graph: &VisibleGraph<'a>) -> Vec<&'a str> {
		graph.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	#[test]
	fn auto_expanded_root_discloses_its_tools() {
		let record = single_agent();
		let expansion = ExpansionState::for_record(&ScopeIndex::new(&record));
		let visible = visible_subgraph(&record, &expansion);
		assert_eq!(ids(&visible), ["origin", "agentA", "toolX", "toolY"]);
		assert_eq!(visible.edges.len(), 4);
	}

	#[test]
	fn collapsed_root_hides_its_tools_and_their_edges() {
		let record = single_agent();
		let index = ScopeIndex::new(&record);
		let mut expansion = ExpansionState::for_record(&index);
		expansion.toggle(&index, "agentA");

		let visible = visible_subgraph(&record, &expansion);
		assert_eq!(ids(&visible), ["origin", "agentA"]);
		assert_eq!(visible.edges.len(), 1);
		assert!(
			!visible
				.edges
				.iter()
				.any(|e| e.source_id == "toolX" && e.target_id == "toolY")
		);
	}

	#[test]
	fn nested_scope_needs_direct_parent_expanded() {
		let record = nested();
		let index = ScopeIndex::new(&record);
		let mut expansion = ExpansionState::default();
		expansion.toggle(&index, "agentA");
		let visible = visible_subgraph(&record, &expansion);
		assert_eq!(ids(&visible), ["origin", "agentA", "agentB", "subA", "toolA"]);

		expansion.toggle(&index, "subA");
		let visible = visible_subgraph(&record, &expansion);
		assert!(visible.contains("toolSub"));
		assert!(!visible.contains("modelB"));
	}

	#[test]
	fn dangling_edges_are_excluded() {
		let mut record = single_agent();
		record.edges.push(edge("agentA", "ghost"));
		let expansion = ExpansionState::for_record(&ScopeIndex::new(&record));
		let visible = visible_subgraph(&record, &expansion);
		assert!(visible.edges.iter().all(|e| e.target_id != "ghost"));
	}

	#[test]
	fn empty_record_yields_empty_graph() {
		let record = GraphRecord::default();
		let visible = visible_subgraph(&record, &ExpansionState::default());
		assert!(visible.is_empty());
		assert!(visible.edges.is_empty());
	}
}
