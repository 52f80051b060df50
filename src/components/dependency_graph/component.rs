//! Leptos component wrapping the dependency graph canvas.
//!
//! The component owns a [`GraphViewState`] and forwards UI gestures to it as
//! commands: click selects, double-click toggles expansion, the toolbar
//! expands, collapses and switches layout mode. Drag pans and the wheel
//! zooms. An animation loop runs via `requestAnimationFrame`, asking the
//! view for its positioned graph every frame; the layout cache keeps that
//! cheap.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::layout::{Layout, LayoutConfig};
use super::render;
use super::state::{GraphCommand, GraphViewState};
use super::types::GraphRecord;
use super::viewport::{PanState, ViewTransform, is_single_click, node_at_position};

/// Padding kept around the layout when fitting it to the canvas.
const FIT_PADDING: f64 = 40.0;
/// Pointer travel (pixels) after which a press counts as a drag.
const DRAG_THRESHOLD: f64 = 3.0;

/// Bundles the graph view with canvas-side interaction state.
struct ViewContext {
	state: GraphViewState,
	transform: ViewTransform,
	pan: PanState,
	width: f64,
	height: f64,
	/// Layout the transform was last fitted to.
	fitted: Option<Rc<Layout>>,
}

impl ViewContext {
	fn draw(&mut self, ctx: &CanvasRenderingContext2d) {
		let graph = self.state.positioned();
		if let Some(ref g) = graph {
			let fresh = self
				.fitted
				.as_ref()
				.is_none_or(|last| !Rc::ptr_eq(last, &g.layout));
			if fresh {
				if let Some(bounds) = g.bounds() {
					self.transform = ViewTransform::fit(bounds, self.width, self.height, FIT_PADDING);
				}
				self.fitted = Some(Rc::clone(&g.layout));
			}
		}
		render::render(ctx, graph.as_ref(), &self.transform, self.width, self.height);
	}

	fn node_at(&mut self, x: f64, y: f64) -> Option<String> {
		let transform = &self.transform;
		self.state
			.positioned()
			.and_then(|g| node_at_position(&g, transform, x, y))
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.fitted = None;
	}
}

/// Owned copy of the selection detail, for the reactive side panel.
#[derive(Clone, Debug, PartialEq)]
struct DetailView {
	label: String,
	kind: String,
	summary: String,
	edges: Vec<String>,
}

impl DetailView {
	fn from_state(state: &GraphViewState) -> Option<Self> {
		let detail = state.selection_detail()?;
		let node = detail.node;

		let mut summary = Vec::new();
		if let Some(calls) = node.metrics.call_count {
			summary.push(format!("{calls} calls"));
		}
		if let Some(tokens) = node.metrics.total_tokens {
			summary.push(format!("{tokens} tokens"));
		}
		if node.expandable {
			summary.push(format!("{} children", node.children_count));
		}
		if node.has_error {
			summary.push("error".to_string());
		}

		let edges = detail
			.related_edges
			.iter()
			.map(|e| {
				let mut line = format!(
					"{} \u{2192} {}: {} calls, {:.0} ms avg",
					e.source_id, e.target_id, e.call_count, e.avg_duration_ms
				);
				if !e.label.is_empty() {
					line = format!("{line} ({})", e.label);
				}
				if e.has_error {
					line.push_str(", error");
				}
				line
			})
			.collect();

		Some(Self {
			label: node.display_label().to_string(),
			kind: format!("{:?}", node.kind),
			summary: summary.join(" \u{b7} "),
			edges,
		})
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window
			.inner_width()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(800.0),
		window
			.inner_height()
			.ok()
			.and_then(|v| v.as_f64())
			.unwrap_or(600.0),
	)
}

fn canvas_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Renders an interactive, progressively disclosed dependency graph.
///
/// Pass the record via the reactive `data` signal; a new record resets
/// expansion and selection. The component sizes itself to its parent by
/// default; set `fullscreen = true` to fill the viewport and follow window
/// resizes. Explicit `width`/`height` override automatic sizing.
#[component]
pub fn DependencyGraphCanvas(
	#[prop(into)] data: Signal<GraphRecord>,
	#[prop(optional)] config: LayoutConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let context: Rc<RefCell<Option<ViewContext>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let detail = RwSignal::new(None::<DetailView>);
	let mode_label = RwSignal::new(config.mode.label());
	let (context_init, animate_init, resize_cb_init) =
		(context.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let record = data.get();
		if let Some(ref mut c) = *context_init.borrow_mut() {
			c.state.apply(GraphCommand::ReplaceRecord(record));
			c.fitted = None;
			detail.set(None);
			return;
		}

		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			log::warn!("investigation-graph: canvas has no 2d context");
			return;
		};

		*context_init.borrow_mut() = Some(ViewContext {
			state: GraphViewState::new(record, config.clone()),
			transform: ViewTransform::default(),
			pan: PanState::default(),
			width: w,
			height: h,
			fitted: None,
		});

		if fullscreen {
			let (context_resize, canvas_resize) = (context_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = window_size(&win);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut c) = *context_resize.borrow_mut() {
					c.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (context_anim, animate_inner) = (context_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut c) = *context_anim.borrow_mut() {
				c.draw(&ctx);
			}
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let context_md = context.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_md.borrow_mut() {
			c.pan = PanState {
				active: true,
				moved: false,
				start_x: x,
				start_y: y,
				transform_start_x: c.transform.x,
				transform_start_y: c.transform.y,
			};
		}
	};

	let context_mm = context.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_mm.borrow_mut() {
			if !c.pan.active {
				return;
			}
			let (dx, dy) = (x - c.pan.start_x, y - c.pan.start_y);
			if dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD {
				c.pan.moved = true;
			}
			if c.pan.moved {
				c.transform.x = c.pan.transform_start_x + dx;
				c.transform.y = c.pan.transform_start_y + dy;
			}
		}
	};

	let context_mu = context.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let point = canvas_point(canvas_ref, &ev);
		if let Some(ref mut c) = *context_mu.borrow_mut() {
			// The second press of a double-click belongs to the dblclick handler.
			let was_click = c.pan.active && !c.pan.moved && is_single_click(ev.detail());
			c.pan.active = false;
			if let (true, Some((x, y))) = (was_click, point) {
				match c.node_at(x, y) {
					Some(id) => c.state.apply(GraphCommand::Select(id)),
					None => c.state.apply(GraphCommand::Deselect),
				}
				detail.set(DetailView::from_state(&c.state));
			}
		}
	};

	let context_dc = context.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_dc.borrow_mut() {
			if let Some(id) = c.node_at(x, y) {
				c.state.apply(GraphCommand::ToggleExpansion(id));
				detail.set(DetailView::from_state(&c.state));
			}
		}
	};

	let context_ml = context.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut c) = *context_ml.borrow_mut() {
			c.pan.active = false;
		}
	};

	let context_wh = context.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = canvas_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut c) = *context_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			c.transform.zoom_at(x, y, factor);
		}
	};

	let context_expand = context.clone();
	let on_expand_all = move |_| {
		if let Some(ref mut c) = *context_expand.borrow_mut() {
			c.state.apply(GraphCommand::ExpandAll);
		}
	};

	let context_collapse = context.clone();
	let on_collapse_all = move |_| {
		if let Some(ref mut c) = *context_collapse.borrow_mut() {
			c.state.apply(GraphCommand::CollapseAll);
			detail.set(DetailView::from_state(&c.state));
		}
	};

	let context_mode = context.clone();
	let on_toggle_mode = move |_| {
		if let Some(ref mut c) = *context_mode.borrow_mut() {
			let next = c.state.mode().toggled();
			c.state.apply(GraphCommand::SetLayoutMode(next));
			mode_label.set(next.label());
		}
	};

	view! {
		<div class="dependency-graph">
			<div class="graph-toolbar">
				<button on:click=on_expand_all>"Expand all"</button>
				<button on:click=on_collapse_all>"Collapse all"</button>
				<button on:click=on_toggle_mode>
					{move || format!("Layout: {}", mode_label.get())}
				</button>
			</div>
			<canvas
				node_ref=canvas_ref
				class="dependency-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:dblclick=on_dblclick
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{move || {
				detail
					.get()
					.map(|d| {
						view! {
							<aside class="graph-detail">
								<h2>{d.label}</h2>
								<p class="graph-detail-kind">{d.kind}</p>
								<p class="graph-detail-summary">{d.summary}</p>
								<ul>
									{d.edges.into_iter().map(|e| view! { <li>{e}</li> }).collect_view()}
								</ul>
							</aside>
						}
					})
			}}
		</div>
	}
}
