//! Pan/zoom transform between layout space and canvas pixels.

use super::layout::Point;
use super::state::PositionedGraph;

/// Node radius in layout units, shared by drawing and hit testing.
pub const NODE_RADIUS: f64 = 14.0;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%, clamped to 0.1..10.0).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Transform that centres `bounds` in a `width` x `height` canvas with
	/// `padding` pixels on every side. Never zooms in past 100%.
	pub fn fit(bounds: (Point, Point), width: f64, height: f64, padding: f64) -> Self {
		let (min, max) = bounds;
		let (span_x, span_y) = ((max.x - min.x).max(1.0), (max.y - min.y).max(1.0));
		let (avail_x, avail_y) = (
			(width - 2.0 * padding).max(1.0),
			(height - 2.0 * padding).max(1.0),
		);
		let k = (avail_x / span_x).min(avail_y / span_y).clamp(0.1, 1.0);
		let (cx, cy) = ((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);
		Self {
			x: width / 2.0 - cx * k,
			y: height / 2.0 - cy * k,
			k,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Zoom by `factor` keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.k * factor).clamp(0.1, 10.0);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	/// Set once the pointer moved far enough that the release is not a click.
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Whether a release with the given `UIEvent.detail` click count is a plain
/// click. Synthetic events report zero.
pub fn is_single_click(detail: i32) -> bool {
	detail <= 1
}

/// Id of the topmost node under the screen point, if any.
pub fn node_at_position(
	graph: &PositionedGraph<'_>,
	transform: &ViewTransform,
	sx: f64,
	sy: f64,
) -> Option<String> {
	let (gx, gy) = transform.screen_to_graph(sx, sy);
	graph
		.nodes
		.iter()
		.rev()
		.find(|n| {
			let (dx, dy) = (n.position.x - gx, n.position.y - gy);
			(dx * dx + dy * dy).sqrt() < NODE_RADIUS
		})
		.map(|n| n.node.id.clone())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fit_centres_bounds() {
		let t = ViewTransform::fit((Point::new(-50.0, 0.0), Point::new(50.0, 200.0)), 800.0, 600.0, 40.0);
		assert_eq!(t.k, 1.0);
		assert_eq!((t.x, t.y), (400.0, 200.0));
	}

	#[test]
	fn fit_shrinks_large_layouts() {
		let t = ViewTransform::fit((Point::new(0.0, 0.0), Point::new(2000.0, 100.0)), 1000.0, 600.0, 0.0);
		assert_eq!(t.k, 0.5);
	}

	#[test]
	fn repeated_presses_are_not_clicks() {
		assert!(is_single_click(0));
		assert!(is_single_click(1));
		assert!(!is_single_click(2));
		assert!(!is_single_click(3));
	}

	#[test]
	fn zoom_keeps_anchor_fixed() {
		let mut t = ViewTransform::default();
		let before = t.screen_to_graph(100.0, 50.0);
		t.zoom_at(100.0, 50.0, 2.0);
		let after = t.screen_to_graph(100.0, 50.0);
		assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);
	}
}
