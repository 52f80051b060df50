//! Layered (Sugiyama-style) layout.
//!
//! Phases:
//!   1. Cycle breaking: DFS in input order, back edges are reversed.
//!   2. Layering: longest path from the roots.
//!   3. Virtual nodes on edges spanning more than one level.
//!   4. Crossing minimisation: barycenter down/up sweeps, best ordering kept.
//!   5. Coordinates: each level centred on x = 0, levels stacked along y.
//!   6. Edge routing: virtual node positions become bend points.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;
use serde::Deserialize;

use super::super::visibility::VisibleGraph;
use super::{EdgePath, Layout, LayoutStrategy, Point};

/// How edges are routed between levels.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeRouting {
	/// Endpoint to endpoint, no bend points.
	Direct,
	/// Through virtual node positions, with an S-bend between adjacent levels.
	/// The renderer draws curves through the bend points.
	#[default]
	Curved,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct HierarchicalConfig {
	/// Horizontal distance between neighbours on one level.
	pub node_separation: f64,
	/// Vertical distance between levels.
	pub level_separation: f64,
	/// Upper bound on barycenter sweep passes.
	pub crossing_passes: usize,
	pub edge_routing: EdgeRouting,
}

impl Default for HierarchicalConfig {
	fn default() -> Self {
		Self {
			node_separation: 120.0,
			level_separation: 100.0,
			crossing_passes: 24,
			edge_routing: EdgeRouting::default(),
		}
	}
}

/// Layered layout strategy.
pub struct HierarchicalLayout<'c> {
	config: &'c HierarchicalConfig,
}

impl<'c> HierarchicalLayout<'c> {
	pub fn new(config: &'c HierarchicalConfig) -> Self {
		Self { config }
	}
}

/// Graph with virtual nodes. Indices below the real node count are real nodes.
#[derive(Default)]
struct LayeredGraph {
	layer: Vec<usize>,
	succ: Vec<Vec<usize>>,
	pred: Vec<Vec<usize>>,
}

impl LayeredGraph {
	fn add_node(&mut self, layer: usize) -> usize {
		self.layer.push(layer);
		self.succ.push(Vec::new());
		self.pred.push(Vec::new());
		self.layer.len() - 1
	}

	fn add_edge(&mut self, from: usize, to: usize) {
		self.succ[from].push(to);
		self.pred[to].push(from);
	}
}

/// One visible edge after cycle breaking.
#[derive(Clone, Copy)]
struct Link {
	from: usize,
	to: usize,
	reversed: bool,
}

impl LayoutStrategy for HierarchicalLayout<'_> {
	fn layout(&self, graph: &VisibleGraph<'_>) -> Layout {
		let mut ids: Vec<&str> = Vec::with_capacity(graph.nodes.len());
		let mut index: HashMap<&str, usize> = HashMap::new();
		for node in &graph.nodes {
			index.entry(node.id.as_str()).or_insert_with(|| {
				ids.push(node.id.as_str());
				ids.len() - 1
			});
		}
		let n = ids.len();

		// Self-loops and unresolved endpoints take no part in layering.
		let raw: Vec<Option<(usize, usize)>> = graph
			.edges
			.iter()
			.map(|e| {
				let from = *index.get(e.source_id.as_str())?;
				let to = *index.get(e.target_id.as_str())?;
				(from != to).then_some((from, to))
			})
			.collect();

		let links = break_cycles(n, &raw);
		let layers = assign_layers(n, &links);

		let mut layered = LayeredGraph::default();
		for &layer in &layers {
			layered.add_node(layer);
		}
		let chains: Vec<Option<Vec<usize>>> = links
			.iter()
			.map(|link| {
				let link = (*link)?;
				let mut chain = vec![link.from];
				let mut prev = link.from;
				for layer in layers[link.from] + 1..layers[link.to] {
					let virtual_node = layered.add_node(layer);
					layered.add_edge(prev, virtual_node);
					chain.push(virtual_node);
					prev = virtual_node;
				}
				layered.add_edge(prev, link.to);
				chain.push(link.to);
				if link.reversed {
					chain.reverse();
				}
				Some(chain)
			})
			.collect();

		let ordering = minimise_crossings(&layered, self.config.crossing_passes);

		let mut coords = vec![Point::default(); layered.layer.len()];
		for (level, row) in ordering.iter().enumerate() {
			let width = row.len().saturating_sub(1) as f64 * self.config.node_separation;
			for (slot, &v) in row.iter().enumerate() {
				coords[v] = Point::new(
					slot as f64 * self.config.node_separation - width / 2.0,
					level as f64 * self.config.level_separation,
				);
			}
		}

		let positions = ids
			.iter()
			.enumerate()
			.map(|(i, id)| (id.to_string(), coords[i]))
			.collect();

		let edge_paths = graph
			.edges
			.iter()
			.zip(&chains)
			.map(|(edge, chain)| EdgePath {
				source_id: edge.source_id.clone(),
				target_id: edge.target_id.clone(),
				bend_points: match (self.config.edge_routing, chain) {
					(EdgeRouting::Curved, Some(chain)) => route(chain, &coords),
					_ => Vec::new(),
				},
			})
			.collect();

		debug!(
			"hierarchical layout: {} nodes, {} virtual, {} levels",
			n,
			layered.layer.len() - n,
			ordering.len()
		);

		Layout {
			positions,
			edge_paths,
		}
	}
}

/// Bend points for an edge chain running from source to target.
fn route(chain: &[usize], coords: &[Point]) -> Vec<Point> {
	if let [from, to] = chain {
		let (a, b) = (coords[*from], coords[*to]);
		if (a.x - b.x).abs() < f64::EPSILON {
			return Vec::new();
		}
		let mid_y = (a.y + b.y) / 2.0;
		return vec![Point::new(a.x, mid_y), Point::new(b.x, mid_y)];
	}
	chain[1..chain.len().saturating_sub(1)]
		.iter()
		.map(|&v| coords[v])
		.collect()
}

/// Orient every edge so the result is acyclic, reversing DFS back edges.
fn break_cycles(n: usize, raw: &[Option<(usize, usize)>]) -> Vec<Option<Link>> {
	const UNSEEN: u8 = 0;
	const ON_STACK: u8 = 1;
	const DONE: u8 = 2;

	let mut out: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
	for (edge, pair) in raw.iter().enumerate() {
		if let Some((from, to)) = pair {
			out[*from].push((edge, *to));
		}
	}

	let mut reversed = vec![false; raw.len()];
	let mut state = vec![UNSEEN; n];
	for start in 0..n {
		if state[start] != UNSEEN {
			continue;
		}
		state[start] = ON_STACK;
		let mut stack = vec![(start, 0usize)];
		while let Some(frame) = stack.last_mut() {
			let node = frame.0;
			if let Some(&(edge, to)) = out[node].get(frame.1) {
				frame.1 += 1;
				match state[to] {
					UNSEEN => {
						state[to] = ON_STACK;
						stack.push((to, 0));
					}
					ON_STACK => reversed[edge] = true,
					_ => {}
				}
			} else {
				state[node] = DONE;
				stack.pop();
			}
		}
	}

	raw.iter()
		.zip(reversed)
		.map(|(pair, reversed)| {
			pair.map(|(from, to)| {
				if reversed {
					Link {
						from: to,
						to: from,
						reversed,
					}
				} else {
					Link { from, to, reversed }
				}
			})
		})
		.collect()
}

/// Longest-path layering over the acyclic links. Roots sit on level 0.
fn assign_layers(n: usize, links: &[Option<Link>]) -> Vec<usize> {
	let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
	let mut in_degree = vec![0usize; n];
	for link in links.iter().flatten() {
		out[link.from].push(link.to);
		in_degree[link.to] += 1;
	}

	let mut layers = vec![0usize; n];
	let mut ready: Vec<usize> = (0..n).rev().filter(|&v| in_degree[v] == 0).collect();
	while let Some(v) = ready.pop() {
		for &to in &out[v] {
			layers[to] = layers[to].max(layers[v] + 1);
			in_degree[to] -= 1;
			if in_degree[to] == 0 {
				ready.push(to);
			}
		}
	}
	layers
}

fn minimise_crossings(graph: &LayeredGraph, passes: usize) -> Vec<Vec<usize>> {
	let level_count = graph.layer.iter().copied().max().map_or(0, |max| max + 1);
	let mut ordering: Vec<Vec<usize>> = vec![Vec::new(); level_count];
	for (v, &layer) in graph.layer.iter().enumerate() {
		ordering[layer].push(v);
	}

	let mut position = vec![0usize; graph.layer.len()];
	for row in &ordering {
		for (slot, &v) in row.iter().enumerate() {
			position[v] = slot;
		}
	}

	let mut best = ordering.clone();
	let mut best_crossings = count_crossings(&ordering, &graph.succ, &position);

	for _ in 0..passes {
		if best_crossings == 0 {
			break;
		}
		for level in 1..level_count {
			sort_by_barycenter(&mut ordering[level], &graph.pred, &mut position);
		}
		for level in (0..level_count.saturating_sub(1)).rev() {
			sort_by_barycenter(&mut ordering[level], &graph.succ, &mut position);
		}

		let crossings = count_crossings(&ordering, &graph.succ, &position);
		if crossings >= best_crossings {
			break;
		}
		best_crossings = crossings;
		best.clone_from(&ordering);
	}

	best
}

/// Reorder one level by the mean position of each node's neighbours on the
/// adjacent level. Nodes without neighbours keep their slot as their key.
fn sort_by_barycenter(row: &mut [usize], neighbours: &[Vec<usize>], position: &mut [usize]) {
	let mut keyed: Vec<(f64, usize)> = row
		.iter()
		.enumerate()
		.map(|(slot, &v)| {
			let adjacent = &neighbours[v];
			let key = if adjacent.is_empty() {
				slot as f64
			} else {
				adjacent.iter().map(|&u| position[u] as f64).sum::<f64>() / adjacent.len() as f64
			};
			(key, v)
		})
		.collect();
	keyed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

	for (slot, (cell, (_, v))) in row.iter_mut().zip(keyed).enumerate() {
		*cell = v;
		position[v] = slot;
	}
}

fn count_crossings(ordering: &[Vec<usize>], succ: &[Vec<usize>], position: &[usize]) -> usize {
	let mut total = 0;
	for row in ordering {
		let segments: Vec<(usize, usize)> = row
			.iter()
			.flat_map(|&u| succ[u].iter().map(move |&v| (position[u], position[v])))
			.collect();
		for (i, a) in segments.iter().enumerate() {
			for b in &segments[i + 1..] {
				if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
					total += 1;
				}
			}
		}
	}
	total
}

#[cfg(test)]
mod tests {
	use super::super::super::types::fixtures::{edge, node};
	use super::super::super::types::{GraphEdge, GraphNode, NodeKind};
	use super::*;

	fn nodes(ids: &[&str]) -> Vec<GraphNode> {
		ids.iter().map(|id| node(id, NodeKind::Agent, None, false)).collect()
	}

	fn layout(nodes: &[GraphNode], edges: &[GraphEdge], config: &HierarchicalConfig) -> Layout {
		let graph = VisibleGraph {
			nodes: nodes.iter().collect(),
			edges: edges.iter().collect(),
		};
		HierarchicalLayout::new(config).layout(&graph)
	}

	#[test]
	fn chain_is_stacked_by_depth() {
		let config = HierarchicalConfig::default();
		let result = layout(&nodes(&["a", "b", "c"]), &[edge("a", "b"), edge("b", "c")], &config);
		assert_eq!(result.position("a"), Some(Point::new(0.0, 0.0)));
		assert_eq!(result.position("b"), Some(Point::new(0.0, config.level_separation)));
		assert_eq!(result.position("c"), Some(Point::new(0.0, 2.0 * config.level_separation)));
		assert!(result.edge_paths.iter().all(|p| p.bend_points.is_empty()));
	}

	#[test]
	fn long_edges_bend_through_virtual_nodes() {
		let config = HierarchicalConfig::default();
		let edges = [edge("a", "b"), edge("b", "c"), edge("a", "c")];
		let result = layout(&nodes(&["a", "b", "c"]), &edges, &config);

		assert_eq!(result.edge_paths.len(), 3);
		let long = &result.edge_paths[2];
		assert_eq!((long.source_id.as_str(), long.target_id.as_str()), ("a", "c"));
		assert_eq!(long.bend_points.len(), 1);
		assert_eq!(long.bend_points[0].y, config.level_separation);

		let direct = HierarchicalConfig {
			edge_routing: EdgeRouting::Direct,
			..HierarchicalConfig::default()
		};
		let result = layout(&nodes(&["a", "b", "c"]), &edges, &direct);
		assert!(result.edge_paths.iter().all(|p| p.bend_points.is_empty()));
	}

	#[test]
	fn barycenter_untangles_crossed_pair() {
		let config = HierarchicalConfig::default();
		let result = layout(
			&nodes(&["a", "b", "c", "d"]),
			&[edge("a", "d"), edge("b", "c")],
			&config,
		);
		let x = |id: &str| result.position(id).unwrap().x;
		assert!(x("a") < x("b"));
		assert!(x("d") < x("c"));
	}

	#[test]
	fn adjacent_offset_edges_get_an_s_bend() {
		let config = HierarchicalConfig::default();
		let result = layout(
			&nodes(&["a", "b", "c"]),
			&[edge("a", "b"), edge("a", "c")],
			&config,
		);
		let path = &result.edge_paths[0];
		assert_eq!(path.bend_points.len(), 2);
		assert_eq!(path.bend_points[0].x, result.position("a").unwrap().x);
		assert_eq!(path.bend_points[1].x, result.position("b").unwrap().x);
		assert_eq!(path.bend_points[0].y, config.level_separation / 2.0);
	}

	#[test]
	fn cycles_and_self_loops_are_tolerated() {
		let config = HierarchicalConfig::default();
		let edges = [edge("a", "b"), edge("b", "a"), edge("b", "b")];
		let result = layout(&nodes(&["a", "b"]), &edges, &config);
		let (a, b) = (result.position("a").unwrap(), result.position("b").unwrap());
		assert!(a.y < b.y);
		assert_eq!(result.edge_paths.len(), 3);
		assert!(result.edge_paths[2].bend_points.is_empty());
	}

	#[test]
	fn disconnected_components_are_all_placed() {
		let config = HierarchicalConfig::default();
		let result = layout(&nodes(&["x", "y", "lonely"]), &[edge("x", "y")], &config);
		assert_eq!(result.positions.len(), 3);
		let (x, lonely) = (result.position("x").unwrap(), result.position("lonely").unwrap());
		assert_eq!(x.y, lonely.y);
		assert_ne!(x.x, lonely.x);
	}

	#[test]
	fn reversed_edges_bend_from_source_to_target() {
		let config = HierarchicalConfig::default();
		let edges = [edge("a", "b"), edge("b", "c"), edge("c", "a")];
		let result = layout(&nodes(&["a", "b", "c"]), &edges, &config);
		let back = &result.edge_paths[2];
		assert_eq!(back.bend_points.len(), 1);
		assert_eq!(back.bend_points[0].y, config.level_separation);
		assert_eq!(result.position("c").unwrap().y, 2.0 * config.level_separation);
	}

	#[test]
	fn identical_input_gives_identical_layout() {
		let config = HierarchicalConfig::default();
		let ids = nodes(&["a", "b", "c", "d", "e"]);
		let edges = [edge("a", "c"), edge("b", "c"), edge("c", "d"), edge("a", "e"), edge("e", "a")];
		assert_eq!(layout(&ids, &edges, &config), layout(&ids, &edges, &config));
	}
}
