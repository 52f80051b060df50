//! Graph record structures as delivered by the investigation service.

use std::collections::HashSet;

use log::{info, warn};
use serde::Deserialize;

/// Classification of a node in the dependency graph.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
	/// The user or entry point that started the investigation.
	#[serde(alias = "user")]
	Origin,
	Agent,
	SubAgent,
	Tool,
	Model,
	/// Any type string this build does not know about.
	#[default]
	#[serde(other)]
	Unknown,
}

/// Usage counters attached to a node. Both are optional upstream.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetrics {
	#[serde(default)]
	pub call_count: Option<u64>,
	#[serde(default)]
	pub total_tokens: Option<u64>,
}

/// A node in the dependency graph.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
	/// Unique identifier. Edges and scope links reference nodes by id.
	pub id: String,
	#[serde(default)]
	pub label: String,
	#[serde(rename = "type", default)]
	pub kind: NodeKind,
	/// Scope owner. The node is only disclosed while this one is expanded.
	#[serde(default)]
	pub parent_scope_id: Option<String>,
	#[serde(default)]
	pub expandable: bool,
	#[serde(default)]
	pub children_count: u32,
	#[serde(default)]
	pub metrics: NodeMetrics,
	#[serde(default)]
	pub has_error: bool,
}

impl GraphNode {
	/// Whether this node is the origin of the investigation.
	pub fn is_origin(&self) -> bool {
		self.kind == NodeKind::Origin
	}

	/// Label to show, falling back to the id when upstream sent none.
	pub fn display_label(&self) -> &str {
		if self.label.is_empty() {
			&self.id
		} else {
			&self.label
		}
	}
}

/// A directed call edge between two nodes. Call edges may form cycles.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
	pub source_id: String,
	pub target_id: String,
	#[serde(default)]
	pub label: String,
	#[serde(default)]
	pub call_count: u64,
	#[serde(default)]
	pub avg_duration_ms: f64,
	#[serde(default)]
	pub has_error: bool,
}

impl GraphEdge {
	/// Whether `id` is one of this edge's endpoints.
	pub fn touches(&self, id: &str) -> bool {
		self.source_id == id || self.target_id == id
	}
}

/// One investigation's dependency graph. Replaced wholesale on new data.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct GraphRecord {
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	#[serde(default, alias = "links")]
	pub edges: Vec<GraphEdge>,
}

impl GraphRecord {
	/// Parse a record from the service's JSON document.
	///
	/// Structural problems that the engine tolerates (dangling edge endpoints,
	/// duplicate ids) are logged here once instead of on every render.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		let record: GraphRecord = serde_json::from_str(json)?;
		record.report_anomalies();
		info!(
			"investigation-graph: loaded {} nodes, {} edges",
			record.nodes.len(),
			record.edges.len()
		);
		Ok(record)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.node(id).is_some()
	}

	/// Number of edges whose source or target is missing from the node list.
	pub fn dangling_edge_count(&self) -> usize {
		let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
		self.edges
			.iter()
			.filter(|e| {
				!ids.contains(e.source_id.as_str()) || !ids.contains(e.target_id.as_str())
			})
			.count()
	}

	fn report_anomalies(&self) {
		let dangling = self.dangling_edge_count();
		if dangling > 0 {
			warn!(
				"investigation-graph: {} edges reference unknown nodes and will be hidden",
				dangling
			);
		}

		let mut seen = HashSet::new();
		for node in &self.nodes {
			if !seen.insert(node.id.as_str()) {
				warn!("investigation-graph: duplicate node id {:?}", node.id);
			}
		}
	}
}

#[cfg(test)]
pub(crate) mod fixtures {
	use super::*;

	pub fn node(id: &str, kind: NodeKind, parent: Option<&str>, expandable: bool) -> GraphNode {
		GraphNode {
			id: id.to_string(),
			label: id.to_uppercase(),
			kind,
			parent_scope_id: parent.map(str::to_string),
			expandable,
			children_count: 0,
			metrics: NodeMetrics::default(),
			has_error: false,
		}
	}

	pub fn edge(source: &str, target: &str) -> GraphEdge {
		GraphEdge {
			source_id: source.to_string(),
			target_id: target.to_string(),
			label: format!("{source}->{target}"),
			call_count: 1,
			avg_duration_ms: 10.0,
			has_error: false,
		}
	}

	/// origin -> agentA, agentA scopes toolX and toolY.
	pub fn single_agent() -> GraphRecord {
		let mut agent = node("agentA", NodeKind::Agent, Some("origin"), true);
		agent.children_count = 2;
		GraphRecord {
			nodes: vec![
				node("origin", NodeKind::Origin, None, false),
				agent,
				node("toolX", NodeKind::Tool, Some("agentA"), false),
				node("toolY", NodeKind::Tool, Some("agentA"), false),
			],
			edges: vec![
				edge("origin", "agentA"),
				edge("agentA", "toolX"),
				edge("agentA", "toolY"),
				edge("toolX", "toolY"),
			],
		}
	}

	/// Two expandable agents under the origin; agentA owns a sub-agent with a
	/// tool of its own.
	pub fn nested() -> GraphRecord {
		GraphRecord {
			nodes: vec![
				node("origin", NodeKind::Origin, None, false),
				node("agentA", NodeKind::Agent, None, true),
				node("agentB", NodeKind::Agent, None, true),
				node("subA", NodeKind::SubAgent, Some("agentA"), true),
				node("toolA", NodeKind::Tool, Some("agentA"), false),
				node("toolSub", NodeKind::Tool, Some("subA"), false),
				node("modelB", NodeKind::Model, Some("agentB"), false),
			],
			edges: vec![
				edge("origin", "agentA"),
				edge("origin", "agentB"),
				edge("agentA", "subA"),
				edge("agentA", "toolA"),
				edge("subA", "toolSub"),
				edge("agentB", "modelB"),
				edge("subA", "agentA"),
			],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_camel_case_document() {
		let json = r#"{
			"nodes": [
				{"id": "u", "label": "User", "type": "user"},
				{"id": "a", "label": "Triage", "type": "sub-agent", "parentScopeId": "u",
				 "expandable": true, "childrenCount": 3,
				 "metrics": {"callCount": 4, "totalTokens": 900}, "hasError": true}
			],
			"edges": [
				{"sourceId": "u", "targetId": "a", "label": "invoke", "callCount": 2,
				 "avgDurationMs": 12.5, "hasError": false}
			]
		}"#;
		let record = GraphRecord::from_json(json).unwrap();

		assert_eq!(record.nodes[0].kind, NodeKind::Origin);
		let agent = &record.nodes[1];
		assert_eq!(agent.kind, NodeKind::SubAgent);
		assert_eq!(agent.parent_scope_id.as_deref(), Some("u"));
		assert!(agent.expandable);
		assert_eq!(agent.children_count, 3);
		assert_eq!(agent.metrics.call_count, Some(4));
		assert_eq!(agent.metrics.total_tokens, Some(900));
		assert!(agent.has_error);
		assert_eq!(record.edges[0].call_count, 2);
		assert_eq!(record.edges[0].avg_duration_ms, 12.5);
	}

	#[test]
	fn unknown_type_falls_back_to_unknown() {
		let json = r#"{"nodes": [{"id": "x", "type": "vector-store"}], "edges": []}"#;
		let record = GraphRecord::from_json(json).unwrap();
		assert_eq!(record.nodes[0].kind, NodeKind::Unknown);
		assert_eq!(record.nodes[0].display_label(), "x");
	}

	#[test]
	fn accepts_links_alias_and_missing_optionals() {
		let json = r#"{"nodes": [{"id": "a", "type": "tool"}],
			"links": [{"sourceId": "a", "targetId": "b"}]}"#;
		let record = GraphRecord::from_json(json).unwrap();
		assert_eq!(record.edges.len(), 1);
		assert_eq!(record.dangling_edge_count(), 1);
		assert!(!record.nodes[0].expandable);
		assert_eq!(record.nodes[0].metrics, NodeMetrics::default());
	}

	#[test]
	fn rejects_type_mismatches() {
		let json = r#"{"nodes": [{"id": 7, "type": "tool"}], "edges": []}"#;
		assert!(GraphRecord::from_json(json).is_err());
	}
}
