//! Force-directed network of actors and stores drawn on a canvas.

mod component;
pub(crate) mod frame;
mod render;
pub mod simulation;
pub mod state;
pub mod transform;
pub mod types;

pub use component::ActivityGraphCanvas;
pub use state::{ActivityGraphState, ViewTransform, find_node_at_point};
pub use transform::build_graph;
pub use types::{GraphData, GraphEdge, GraphNode, NodeKey, NodeKind, Position};
