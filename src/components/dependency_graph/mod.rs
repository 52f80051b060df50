//! Progressive-disclosure dependency graph for investigations.
//!
//! The engine half of this module is plain Rust and independent of the DOM:
//! - [`ScopeIndex`] answers scope-tree questions about a [`GraphRecord`]
//! - [`ExpansionState`] holds which expandable nodes are open
//! - [`visible_subgraph`] derives what is currently shown
//! - [`LayoutConfig`] positions it, hierarchically or force-directed
//! - [`LayoutCache`] memoises layouts by [`LayoutKey`]
//! - [`GraphViewState`] ties them together behind [`GraphCommand`]s
//!
//! [`DependencyGraphCanvas`] is the Leptos collaborator that renders a
//! [`GraphViewState`] onto a canvas and turns gestures into commands.
//!
//! # Example
//!
//! ```ignore
//! use investigation_graph::{DependencyGraphCanvas, GraphRecord};
//!
//! let record = GraphRecord::from_json(json)?;
//! view! { <DependencyGraphCanvas data=Signal::derive(move || record.clone()) /> }
//! ```

mod cache;
mod component;
mod expansion;
pub mod layout;
mod render;
mod scope;
mod selection;
mod state;
mod types;
mod viewport;
mod visibility;

pub use cache::{LayoutCache, LayoutKey};
pub use component::DependencyGraphCanvas;
pub use expansion::ExpansionState;
pub use layout::{Layout, LayoutConfig, LayoutMode, LayoutStrategy, Point};
pub use scope::ScopeIndex;
pub use selection::SelectionController;
pub use state::{
	GraphCommand, GraphViewState, PositionedEdge, PositionedGraph, PositionedNode, SelectionDetail,
};
pub use types::{GraphEdge, GraphNode, GraphRecord, NodeKind, NodeMetrics};
pub use viewport::ViewTransform;
pub use visibility::{VisibleGraph, visible_subgraph};
