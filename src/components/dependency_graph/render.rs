//! Canvas rendering for the dependency graph.
//!
//! Drawing uses multiple passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Edges, then arrow heads (world space)
//! 3. Nodes, rings and labels (world space)
//!
//! Visual mapping (colours per node kind, error styling) lives here and
//! nowhere else.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::layout::Point;
use super::state::{PositionedEdge, PositionedGraph, PositionedNode};
use super::types::NodeKind;
use super::viewport::{NODE_RADIUS, ViewTransform};

const BACKGROUND: &str = "#11151c";
const EDGE_COLOR: &str = "rgba(160, 174, 192, 0.7)";
const ERROR_COLOR: &str = "#e5484d";
const LABEL_COLOR: &str = "rgba(255, 255, 255, 0.9)";
const ARROW_SIZE: f64 = 6.0;

/// Fill colour for a node kind. Unknown kinds get a neutral grey.
fn kind_color(kind: NodeKind) -> &'static str {
	match kind {
		NodeKind::Origin => "#455a64",
		NodeKind::Agent => "#1976d2",
		NodeKind::SubAgent => "#7b1fa2",
		NodeKind::Tool => "#2e7d32",
		NodeKind::Model => "#e65100",
		NodeKind::Unknown => "#757575",
	}
}

/// Renders one frame. `graph` is `None` when nothing is visible.
pub fn render(
	ctx: &CanvasRenderingContext2d,
	graph: Option<&PositionedGraph<'_>>,
	transform: &ViewTransform,
	width: f64,
	height: f64,
) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);

	let Some(graph) = graph else {
		draw_empty_state(ctx, width, height);
		return;
	};

	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	for edge in &graph.edges {
		draw_edge(ctx, edge, transform.k);
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	for node in &graph.nodes {
		draw_node(ctx, node, transform.k);
	}

	ctx.restore();
}

fn draw_empty_state(ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
	ctx.set_fill_style_str("rgba(255, 255, 255, 0.6)");
	ctx.set_font("14px sans-serif");
	ctx.set_text_align("center");
	let _ = ctx.fill_text("No dependency data for this investigation", width / 2.0, height / 2.0);
	ctx.set_text_align("start");
}

fn draw_edge(ctx: &CanvasRenderingContext2d, edge: &PositionedEdge<'_>, k: f64) {
	let color = if edge.edge.has_error { ERROR_COLOR } else { EDGE_COLOR };
	ctx.set_stroke_style_str(color);
	ctx.set_line_width((1.0 + (edge.edge.call_count as f64).ln_1p() * 0.5) / k.max(0.5));
	if edge.edge.has_error {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(6.0),
			&JsValue::from_f64(4.0),
		));
	} else {
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}

	if edge.edge.source_id == edge.edge.target_id {
		let (centre, radius) = self_loop(edge.from);
		ctx.begin_path();
		let _ = ctx.arc(centre.x, centre.y, radius, 0.0, 2.0 * PI);
		ctx.stroke();
		return;
	}

	// Coincident endpoints have no direction to draw.
	let last = edge.bend_points.last().copied().unwrap_or(edge.from);
	let (dx, dy) = (edge.to.x - last.x, edge.to.y - last.y);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let tip = Point::new(edge.to.x - ux * NODE_RADIUS, edge.to.y - uy * NODE_RADIUS);
	let end = Point::new(tip.x - ux * ARROW_SIZE, tip.y - uy * ARROW_SIZE);

	let first = edge.bend_points.first().copied().unwrap_or(edge.to);
	let (sx, sy) = (first.x - edge.from.x, first.y - edge.from.y);
	let start_dist = (sx * sx + sy * sy).sqrt().max(0.001);
	let start = Point::new(
		edge.from.x + sx / start_dist * NODE_RADIUS,
		edge.from.y + sy / start_dist * NODE_RADIUS,
	);

	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	draw_through(ctx, &edge.bend_points, end);
	ctx.stroke();

	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_fill_style_str(color);
	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
	ctx.begin_path();
	ctx.move_to(tip.x, tip.y);
	ctx.line_to(end.x + px, end.y + py);
	ctx.line_to(end.x - px, end.y - py);
	ctx.close_path();
	ctx.fill();
}

/// Circle drawn for a self-loop: sits above the node and overlaps its rim.
fn self_loop(at: Point) -> (Point, f64) {
	let radius = NODE_RADIUS * 0.6;
	(Point::new(at.x, at.y - NODE_RADIUS - radius * 0.5), radius)
}

/// Smooth path through bend points: each bend is a quadratic control point
/// and the curve passes through the midpoints between consecutive bends.
fn draw_through(ctx: &CanvasRenderingContext2d, bends: &[Point], end: Point) {
	for (i, bend) in bends.iter().enumerate() {
		let next = bends.get(i + 1).copied().unwrap_or(end);
		let (mx, my) = ((bend.x + next.x) / 2.0, (bend.y + next.y) / 2.0);
		let _ = ctx.quadratic_curve_to(bend.x, bend.y, mx, my);
	}
	ctx.line_to(end.x, end.y);
}

fn draw_node(ctx: &CanvasRenderingContext2d, node: &PositionedNode<'_>, k: f64) {
	let Point { x, y } = node.position;

	ctx.begin_path();
	let _ = ctx.arc(x, y, NODE_RADIUS, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(kind_color(node.node.kind));
	ctx.fill();

	if node.node.has_error {
		ctx.set_stroke_style_str(ERROR_COLOR);
		ctx.set_line_width(2.5 / k.max(0.5));
		ctx.stroke();
	}

	if node.selected {
		ctx.begin_path();
		let _ = ctx.arc(x, y, NODE_RADIUS + 4.0, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str("rgba(255, 255, 255, 0.9)");
		ctx.set_line_width(1.5 / k.max(0.5));
		ctx.stroke();
	}

	ctx.set_fill_style_str(LABEL_COLOR);
	ctx.set_font("11px sans-serif");
	if node.node.expandable {
		// Collapsed nodes advertise how much they hide.
		let badge = if node.expanded {
			"\u{2212}".to_string()
		} else {
			format!("+{}", node.node.children_count)
		};
		ctx.set_text_align("center");
		let _ = ctx.fill_text(&badge, x, y + 4.0);
		ctx.set_text_align("start");
	}

	let _ = ctx.fill_text(node.node.display_label(), x + NODE_RADIUS + 4.0, y + 4.0);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn self_loop_hangs_off_the_node_rim() {
		let at = Point::new(10.0, 20.0);
		let (centre, radius) = self_loop(at);
		assert_eq!(centre.x, at.x);
		assert!(centre.y < at.y);
		let gap = at.y - centre.y;
		assert!(gap - radius < NODE_RADIUS, "loop detached from node");
		assert!(gap + radius > NODE_RADIUS, "loop hidden inside node");
	}
}
