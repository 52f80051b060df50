//! Layout memoisation.
//!
//! The renderer asks for the positioned graph on every animation frame, while
//! layouts only change when the visible set or the mode does. Layouts are
//! keyed on an explicit [`LayoutKey`] and shared out as `Rc` so a hit hands
//! back the very same object.

use std::num::NonZeroUsize;
use std::rc::Rc;

use log::debug;
use lru::LruCache;

use super::expansion::ExpansionState;
use super::layout::{Layout, LayoutMode};
use super::visibility::VisibleGraph;

/// Everything that can change computed positions for a given record.
///
/// Edge labels and metrics are deliberately absent: they never move a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LayoutKey {
	pub node_count: usize,
	pub edge_count: usize,
	pub mode: LayoutMode,
	/// Canonical serialization of the expanded id set.
	pub expansion: String,
}

impl LayoutKey {
	pub fn new(graph: &VisibleGraph<'_>, mode: LayoutMode, expansion: &ExpansionState) -> Self {
		Self {
			node_count: graph.nodes.len(),
			edge_count: graph.edges.len(),
			mode,
			expansion: expansion.fingerprint(),
		}
	}
}

/// Bounded map from [`LayoutKey`] to computed layouts, least recently used
/// evicted first.
#[derive(Debug)]
pub struct LayoutCache {
	entries: LruCache<LayoutKey, Rc<Layout>>,
	hits: u64,
	misses: u64,
}

impl LayoutCache {
	/// A zero capacity is treated as one.
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
			hits: 0,
			misses: 0,
		}
	}

	/// Return the layout stored under `key`, computing and storing it first if
	/// needed. `compute` runs at most once per key until the key is evicted or
	/// the cache is invalidated. A hit refreshes the entry's recency.
	pub fn get_or_compute(&mut self, key: LayoutKey, compute: impl FnOnce() -> Layout) -> Rc<Layout> {
		if let Some(layout) = self.entries.get(&key) {
			self.hits += 1;
			return Rc::clone(layout);
		}

		self.misses += 1;
		debug!(
			"layout cache: miss for {:?} ({} nodes, {} edges)",
			key.mode, key.node_count, key.edge_count
		);
		let layout = Rc::new(compute());
		if let Some((evicted, _)) = self.entries.push(key, Rc::clone(&layout)) {
			debug!("layout cache: evicted {:?} layout", evicted.mode);
		}
		layout
	}

	/// Drop every stored layout, e.g. when the record is replaced.
	pub fn invalidate(&mut self) {
		if !self.entries.is_empty() {
			debug!("layout cache: invalidated {} entries", self.entries.len());
		}
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn hits(&self) -> u64 {
		self.hits
	}

	pub fn misses(&self) -> u64 {
		self.misses
	}
}

impl Default for LayoutCache {
	fn default() -> Self {
		Self::new(32)
	}
}
