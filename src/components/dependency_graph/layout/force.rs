//! Force-directed layout on top of the `force_graph` simulation.
//!
//! Nodes repel pairwise and edges pull their endpoints together. The
//! simulation is seeded on a circle in sorted id order and stepped with a
//! fixed time step, so the same visible graph always settles to the same
//! positions.

use std::collections::HashMap;
use std::f32::consts::TAU;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, warn};
use serde::Deserialize;

use super::super::visibility::VisibleGraph;
use super::{Layout, LayoutStrategy, Point};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceConfig {
	/// Upper bound on simulation steps.
	pub iterations: usize,
	/// Simulated seconds per step.
	pub time_step: f32,
	/// Stop once no node moves further than this in one step.
	pub convergence_threshold: f32,
	/// Radius of the initial circle.
	pub seed_radius: f32,
	pub node_mass: f32,
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
}

impl Default for ForceConfig {
	fn default() -> Self {
		Self {
			iterations: 400,
			time_step: 0.016,
			convergence_threshold: 0.01,
			seed_radius: 100.0,
			node_mass: 10.0,
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		}
	}
}

impl ForceConfig {
	fn simulation_parameters(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

/// Per-node payload carried through the simulation.
#[derive(Clone, Debug, Default)]
struct SimNode {
	id: String,
}

/// Force-directed layout strategy.
pub struct ForceDirectedLayout<'c> {
	config: &'c ForceConfig,
}

impl<'c> ForceDirectedLayout<'c> {
	pub fn new(config: &'c ForceConfig) -> Self {
		Self { config }
	}

	fn seed(&self, slot: usize, count: usize) -> (f32, f32) {
		if count < 2 {
			return (0.0, 0.0);
		}
		let angle = slot as f32 * TAU / count as f32;
		(
			self.config.seed_radius * angle.cos(),
			self.config.seed_radius * angle.sin(),
		)
	}
}

impl LayoutStrategy for ForceDirectedLayout<'_> {
	fn layout(&self, graph: &VisibleGraph<'_>) -> Layout {
		let mut ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		ids.sort_unstable();
		ids.dedup();
		if ids.is_empty() {
			return Layout::default();
		}

		let mut sim: ForceGraph<SimNode, ()> = ForceGraph::new(self.config.simulation_parameters());
		let mut id_to_idx: HashMap<&str, DefaultNodeIdx> = HashMap::new();
		let mut seeds: HashMap<DefaultNodeIdx, (f32, f32)> = HashMap::new();

		for (slot, id) in ids.iter().enumerate() {
			let (x, y) = self.seed(slot, ids.len());
			let idx = sim.add_node(NodeData {
				x,
				y,
				mass: self.config.node_mass,
				is_anchor: false,
				user_data: SimNode { id: id.to_string() },
			});
			id_to_idx.insert(id, idx);
			seeds.insert(idx, (x, y));
		}

		// Self-loops have zero length and add nothing but instability.
		for edge in &graph.edges {
			if let (Some(&src), Some(&tgt)) = (
				id_to_idx.get(edge.source_id.as_str()),
				id_to_idx.get(edge.target_id.as_str()),
			) {
				if src != tgt {
					sim.add_edge(src, tgt, EdgeData::default());
				}
			}
		}

		let mut previous = seeds.clone();
		let mut steps = 0;
		while steps < self.config.iterations {
			sim.update(self.config.time_step);
			steps += 1;

			let mut max_shift: f32 = 0.0;
			sim.visit_nodes(|node| {
				let (x, y) = (node.x(), node.y());
				if let Some(prev) = previous.get_mut(&node.index()) {
					let (dx, dy) = (x - prev.0, y - prev.1);
					max_shift = max_shift.max((dx * dx + dy * dy).sqrt());
					*prev = (x, y);
				}
			});
			if max_shift < self.config.convergence_threshold {
				break;
			}
		}

		let mut positions: HashMap<String, Point> = HashMap::with_capacity(ids.len());
		let (mut sum_x, mut sum_y) = (0.0_f64, 0.0_f64);
		sim.visit_nodes(|node| {
			let (mut x, mut y) = (node.x(), node.y());
			if !x.is_finite() || !y.is_finite() {
				warn!(
					"force layout: non-finite position for {:?}, keeping seed",
					node.data.user_data.id
				);
				(x, y) = seeds.get(&node.index()).copied().unwrap_or_default();
			}
			sum_x += x as f64;
			sum_y += y as f64;
			positions.insert(node.data.user_data.id.clone(), Point::new(x as f64, y as f64));
		});

		// Summed in simulation order, not map order, to stay bit-for-bit stable.
		let count = positions.len() as f64;
		let (cx, cy) = (sum_x / count, sum_y / count);
		for p in positions.values_mut() {
			p.x -= cx;
			p.y -= cy;
		}

		debug!(
			"force layout: {} nodes settled after {} of {} steps",
			positions.len(),
			steps,
			self.config.iterations
		);

		Layout {
			positions,
			edge_paths: Layout::straight_paths(graph),
		}
	}
}
