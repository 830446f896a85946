//! Nodes and edges of the activity network.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::activity::{ActivityType, Meta};

/// Node identity. Actors and stores live in separate namespaces so equal raw ids never merge.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
	/// An acting agent.
	Actor(String),
	/// A store.
	Store(String),
}

impl NodeKey {
	/// Id as the backend knows it.
	pub fn raw_id(&self) -> &str {
		match self {
			NodeKey::Actor(id) | NodeKey::Store(id) => id,
		}
	}

	/// Actor or store.
	pub fn kind(&self) -> NodeKind {
		match self {
			NodeKey::Actor(_) => NodeKind::Actor,
			NodeKey::Store(_) => NodeKind::Store,
		}
	}
}

impl fmt::Display for NodeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NodeKey::Actor(id) => write!(f, "actor:{id}"),
			NodeKey::Store(id) => write!(f, "store:{id}"),
		}
	}
}

/// What a node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// Drawn as a circle.
	Actor,
	/// Drawn as a rounded square; stays visible under any filter.
	Store,
}

/// A point in graph space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Position {
	/// Point at `(x, y)`.
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// An actor or a store in the activity network.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Namespaced identity.
	pub key: NodeKey,
	/// Display name.
	pub label: String,
	/// Up to two characters drawn inside the node.
	pub initials: String,
	/// Events touching this node in the current batch.
	pub activity_count: u32,
	/// Latest event timestamp touching this node.
	pub last_active: DateTime<Utc>,
	/// Layout position, `None` until the layout engine places it.
	pub position: Option<Position>,
	/// Pinned position while dragged.
	pub pinned: Option<Position>,
}

impl GraphNode {
	/// Actor or store.
	pub fn kind(&self) -> NodeKind {
		self.key.kind()
	}
}

/// One activity event, drawn as a line from actor to store.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	/// Id of the event this edge was built from.
	pub id: String,
	/// Actor endpoint.
	pub source: NodeKey,
	/// Store endpoint.
	pub target: NodeKey,
	/// Kind of activity.
	pub activity_type: ActivityType,
	/// Actor display name at the time of the event.
	pub actor_name: String,
	/// When the event happened.
	pub created_at: DateTime<Utc>,
	/// Event metadata.
	pub meta: Meta,
}

/// Node and edge snapshot produced by one transform call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	/// Nodes in first-seen order.
	pub nodes: Vec<GraphNode>,
	/// One edge per complete event, in input order.
	pub edges: Vec<GraphEdge>,
}
