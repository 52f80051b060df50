//! Expansion state for progressive disclosure.
//!
//! The set of expanded node ids is only ever changed through the named
//! intents below. Every id in the set is known to be expandable.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use super::scope::ScopeIndex;

/// Set of node ids whose scope children are currently disclosed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpansionState {
	expanded: BTreeSet<String>,
}

impl ExpansionState {
	/// Fresh state for a newly loaded record, with the single-root rule applied.
	pub fn for_record(index: &ScopeIndex) -> Self {
		let mut state = Self::default();
		state.auto_expand_single_root(index);
		state
	}

	pub fn is_expanded(&self, id: &str) -> bool {
		self.expanded.contains(id)
	}

	pub fn len(&self) -> usize {
		self.expanded.len()
	}

	pub fn is_empty(&self) -> bool {
		self.expanded.is_empty()
	}

	/// Expanded ids in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &String> {
		self.expanded.iter()
	}

	/// Canonical serialization of the expanded set.
	///
	/// Independent of insertion order; ids are length-prefixed so no two
	/// different sets can serialize to the same string.
	pub fn fingerprint(&self) -> String {
		let mut out = String::new();
		for id in &self.expanded {
			out.push_str(&id.len().to_string());
			out.push(':');
			out.push_str(id);
		}
		out
	}

	/// Expand a collapsed node, or collapse an expanded one together with
	/// every expanded descendant. Unknown and non-expandable ids are ignored.
	pub fn toggle(&mut self, index: &ScopeIndex, id: &str) {
		if !index.is_expandable(id) {
			debug!("expansion: ignoring toggle of non-expandable {:?}", id);
			return;
		}
		if self.is_expanded(id) {
			self.collapse_with_descendants(index, id);
		} else {
			self.expanded.insert(id.to_string());
		}
	}

	/// Remove `id` and every scope descendant from the expanded set.
	///
	/// The whole subtree is walked, not only still-expanded branches, so a
	/// descendant expanded while an intermediate scope was closed is cleared
	/// too. Visited ids are tracked, so a malformed scope cycle terminates.
	pub fn collapse_with_descendants(&mut self, index: &ScopeIndex, id: &str) {
		let mut visited: HashSet<&str> = HashSet::new();
		let mut stack = vec![id];
		while let Some(current) = stack.pop() {
			if !visited.insert(current) {
				continue;
			}
			self.expanded.remove(current);
			stack.extend(index.children(current).iter().map(String::as_str));
		}
	}

	pub fn expand_all(&mut self, index: &ScopeIndex) {
		self.expanded.extend(index.expandable_ids().cloned());
	}

	pub fn collapse_all(&mut self, index: &ScopeIndex) {
		self.expanded.clear();
		self.auto_expand_single_root(index);
	}

	/// Expand the top-level node when it is the only expandable one.
	///
	/// Does nothing with zero or several candidate roots, and does nothing at
	/// all when the record has no origin node to anchor the tree.
	pub fn auto_expand_single_root(&mut self, index: &ScopeIndex) {
		if !index.has_origin() {
			return;
		}
		if let [root] = index.roots() {
			debug!("expansion: auto-expanding single root {:?}", root);
			self.expanded.insert(root.clone());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::super::types::fixtures::{nested, node, single_agent};
	use super::super::types::{GraphRecord, NodeKind};
	use super::*;

	fn state_with(ids: &[&str]) -> ExpansionState {
		ExpansionState {
			expanded: ids.iter().map(|s| s.to_string()).collect(),
		}
	}

	#[test]
	fn single_root_is_expanded_on_load() {
		let index = ScopeIndex::new(&single_agent());
		let state = ExpansionState::for_record(&index);
		assert_eq!(state, state_with(&["agentA"]));
	}

	#[test]
	fn toggling_the_root_collapses_it() {
		let index = ScopeIndex::new(&single_agent());
		let mut state = ExpansionState::for_record(&index);
		state.toggle(&index, "agentA");
		assert!(state.is_empty());
	}

	#[test]
	fn two_roots_are_left_alone() {
		let index = ScopeIndex::new(&nested());
		assert!(ExpansionState::for_record(&index).is_empty());
	}

	#[test]
	fn no_roots_means_no_auto_expand() {
		let record = GraphRecord {
			nodes: vec![node("origin", NodeKind::Origin, None, false)],
			edges: vec![],
		};
		let index = ScopeIndex::new(&record);
		assert!(ExpansionState::for_record(&index).is_empty());
	}

	#[test]
	fn missing_origin_disables_auto_expand() {
		let record = GraphRecord {
			nodes: vec![
				node("agent", NodeKind::Agent, None, true),
				node("tool", NodeKind::Tool, Some("agent"), false),
			],
			edges: vec![],
		};
		let index = ScopeIndex::new(&record);
		assert!(ExpansionState::for_record(&index).is_empty());
	}

	#[test]
	fn toggle_ignores_unknown_and_leaf_ids() {
		let index = ScopeIndex::new(&nested());
		let mut state = ExpansionState::default();
		state.toggle(&index, "toolA");
		state.toggle(&index, "nope");
		assert!(state.is_empty());
	}

	#[test]
	fn collapse_removes_expanded_descendants() {
		let index = ScopeIndex::new(&nested());
		let mut state = ExpansionState::default();
		state.expand_all(&index);
		assert_eq!(state, state_with(&["agentA", "agentB", "subA"]));

		state.toggle(&index, "agentA");
		assert_eq!(state, state_with(&["agentB"]));
	}

	#[test]
	fn collapse_is_idempotent() {
		let index = ScopeIndex::new(&nested());
		let mut state = ExpansionState::default();
		state.expand_all(&index);
		state.collapse_with_descendants(&index, "agentA");
		let once = state.clone();
		state.collapse_with_descendants(&index, "agentA");
		assert_eq!(state, once);
	}

	#[test]
	fn expand_then_collapse_restores_prior_state() {
		let index = ScopeIndex::new(&nested());
		let mut state = state_with(&["agentB"]);
		let before = state.clone();
		state.toggle(&index, "agentA");
		assert!(state.is_expanded("agentA"));
		state.toggle(&index, "agentA");
		assert_eq!(state, before);
	}

	#[test]
	fn collapse_all_reapplies_single_root() {
		let index = ScopeIndex::new(&single_agent());
		let mut state = ExpansionState::default();
		state.expand_all(&index);
		state.collapse_all(&index);
		assert_eq!(state, state_with(&["agentA"]));

		let index = ScopeIndex::new(&nested());
		let mut state = ExpansionState::default();
		state.expand_all(&index);
		state.collapse_all(&index);
		assert!(state.is_empty());
	}

	#[test]
	fn collapse_terminates_on_scope_cycle() {
		let record = GraphRecord {
			nodes: vec![
				node("a", NodeKind::Agent, Some("b"), true),
				node("b", NodeKind::Agent, Some("a"), true),
			],
			edges: vec![],
		};
		let index = ScopeIndex::new(&record);
		let mut state = ExpansionState::default();
		state.expand_all(&index);
		state.collapse_with_descendants(&index, "a");
		assert!(state.is_empty());
	}

	#[test]
	fn collapse_reaches_past_closed_scopes() {
		let index = ScopeIndex::new(&nested());
		let mut state = state_with(&["agentA"]);
		state.toggle(&index, "subA");
		state.toggle(&index, "agentA");
		assert!(state.is_empty());

		let mut state = state_with(&["subA"]);
		state.collapse_with_descendants(&index, "agentA");
		assert!(state.is_empty());
	}

	#[test]
	fn fingerprint_ignores_insertion_order() {
		let index = ScopeIndex::new(&nested());
		let mut first = ExpansionState::default();
		first.toggle(&index, "agentA");
		first.toggle(&index, "agentB");
		let mut second = ExpansionState::default();
		second.toggle(&index, "agentB");
		second.toggle(&index, "agentA");
		assert_eq!(first.fingerprint(), second.fingerprint());
		assert_ne!(first.fingerprint(), ExpansionState::default().fingerprint());
		assert_ne!(state_with(&["ab"]).fingerprint(), state_with(&["a", "b"]).fingerprint());
	}
}
