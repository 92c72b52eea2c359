//! Interactive entity/relationship graph.
//!
//! Renders vertices and directed, possibly parallel or self-referencing edges
//! on an HTML canvas with:
//! - Force-directed layout driven through a pluggable simulator
//! - Curved geometry for parallel edges and loops for self edges
//! - Shortest-path and neighborhood queries over an adjacency index
//! - Highlight, filter and reset of the working vertex/edge sets
//! - Zoom, pan, vertex dragging and interactive edge creation
//!
//! # Example
//!
//! ```ignore
//! use relation_graph::{GraphData, RelationGraphCanvas};
//!
//! let data: GraphData = serde_json::from_str(r#"{
//!     "vertexes": [{"_id": "a", "name": "Alice"}, {"_id": "b", "name": "Bob"}],
//!     "edges": [{"_id": "e1", "_from": "a", "_to": "b", "label": "knows"}]
//! }"#)?;
//!
//! view! { <RelationGraphCanvas data=Signal::derive(move || data.clone()) fullscreen=true /> }
//! ```

mod component;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod linking;
pub mod model;
pub mod options;
pub mod path;
mod render;
pub mod selection;
pub mod state;
pub mod theme;
pub mod types;
pub mod viewport;

pub use component::RelationGraphCanvas;
pub use error::{GraphError, Result};
pub use options::GraphOptions;
pub use path::PathResult;
pub use state::{ClickTarget, RelationGraph};
pub use theme::Theme;
pub use types::{Collection, Edge, ElementState, GraphCount, GraphData, Point, Vertex};
pub use viewport::ViewTransform;
