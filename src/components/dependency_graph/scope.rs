//! Scope tree index built once per graph record.
//!
//! The `parentScopeId` links form a forest that is separate from the call
//! edges. Expansion logic walks that forest constantly, so it is indexed up
//! front instead of rescanning the node list on every step.

use std::collections::{HashMap, HashSet};

use super::types::GraphRecord;

/// `parent -> children` lookup plus the node sets expansion rules need.
#[derive(Clone, Debug, Default)]
pub struct ScopeIndex {
	children: HashMap<String, Vec<String>>,
	expandable: HashSet<String>,
	known: HashSet<String>,
	/// Expandable, non-origin nodes at the top of the scope tree.
	roots: Vec<String>,
	has_origin: bool,
}

impl ScopeIndex {
	pub fn new(record: &GraphRecord) -> Self {
		let origins: HashSet<&str> = record
			.nodes
			.iter()
			.filter(|n| n.is_origin())
			.map(|n| n.id.as_str())
			.collect();

		let mut index = ScopeIndex {
			has_origin: !origins.is_empty(),
			..Default::default()
		};

		for node in &record.nodes {
			index.known.insert(node.id.clone());
			if node.expandable {
				index.expandable.insert(node.id.clone());
			}

			match scope_parent(node.parent_scope_id.as_deref(), &origins) {
				Some(parent) => index
					.children
					.entry(parent.to_string())
					.or_default()
					.push(node.id.clone()),
				None => {
					if node.expandable && !node.is_origin() && !index.roots.contains(&node.id) {
						index.roots.push(node.id.clone());
					}
				}
			}
		}

		index
	}

	/// Direct scope children of `id`, in record order.
	pub fn children(&self, id: &str) -> &[String] {
		self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn is_expandable(&self, id: &str) -> bool {
		self.expandable.contains(id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.known.contains(id)
	}

	pub fn expandable_ids(&self) -> impl Iterator<Item = &String> {
		self.expandable.iter()
	}

	pub fn roots(&self) -> &[String] {
		&self.roots
	}

	pub fn has_origin(&self) -> bool {
		self.has_origin
	}
}

/// Resolve a node's effective scope parent.
///
/// The origin is the always-disclosed top of the tree, so a node scoped
/// directly under it behaves like a top-level node.
pub(crate) fn scope_parent<'a>(parent: Option<&'a str>, origins: &HashSet<&str>) -> Option<&'a str> {
	parent.filter(|p| !origins.contains(p))
}

#[cfg(test)]
mod tests {
	use super::super::types::NodeKind;
	use super::super::types::fixtures::{nested, node, single_agent};
	use super::*;

	#[test]
	fn indexes_children_in_record_order() {
		let index = ScopeIndex::new(&nested());
		assert_eq!(index.children("agentA"), ["subA", "toolA"]);
		assert_eq!(index.children("subA"), ["toolSub"]);
		assert!(index.children("toolA").is_empty());
		assert!(index.children("missing").is_empty());
	}

	#[test]
	fn origin_children_are_roots() {
		let index = ScopeIndex::new(&single_agent());
		assert_eq!(index.roots(), ["agentA"]);
		assert!(index.children("origin").is_empty());
		assert!(index.has_origin());
	}

	#[test]
	fn roots_skip_origin_and_leaf_nodes() {
		let record = GraphRecord {
			nodes: vec![
				node("origin", NodeKind::Origin, None, true),
				node("tool", NodeKind::Tool, None, false),
				node("agent", NodeKind::Agent, None, true),
			],
			edges: vec![],
		};
		let index = ScopeIndex::new(&record);
		assert_eq!(index.roots(), ["agent"]);
		assert!(index.is_expandable("origin"));
		assert!(!index.is_expandable("tool"));
	}
}
