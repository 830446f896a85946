//! View and interaction state of the network canvas, kept free of browser types.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::debug;

use super::simulation::{LayoutEngine, SimulationParameters};
use super::transform::{build_graph, node_map};
use super::types::{GraphData, GraphNode, NodeKey, NodeKind, Position};
use crate::activity::{ActivityEvent, ActivityType};

/// Furthest zoom out.
pub const MIN_ZOOM: f64 = 0.15;
/// Furthest zoom in.
pub const MAX_ZOOM: f64 = 4.0;
/// Scale factor per wheel notch or zoom button press.
pub const ZOOM_STEP: f64 = 1.1;
/// Hit radius of a store node, in graph units.
pub const STORE_HIT_RADIUS: f64 = 28.0;
/// Hit radius of an actor node, in graph units.
pub const ACTOR_HIT_RADIUS: f64 = 20.0;
/// Pointer travel (screen px) below which a press counts as a click.
pub const CLICK_SLOP: f64 = 3.0;

/// Pan offset and zoom scale mapping graph space onto the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal pan in screen pixels.
	pub x: f64,
	/// Vertical pan in screen pixels.
	pub y: f64,
	/// Zoom scale.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self { x: 0.0, y: 0.0, k: 1.0 }
	}
}

impl ViewTransform {
	/// Inverts the transform.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> Position {
		Position::new((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Screen position of a graph-space point.
	pub fn graph_to_screen(&self, p: Position) -> (f64, f64) {
		(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Scales by `factor` keeping the graph point under `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.k;
		self.x = sx - (sx - self.x) * ratio;
		self.y = sy - (sy - self.y) * ratio;
		self.k = new_k;
	}

	/// One wheel notch at the pointer; positive `delta_y` zooms out.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if delta_y == 0.0 {
			return;
		}
		let factor = if delta_y > 0.0 { 1.0 / ZOOM_STEP } else { ZOOM_STEP };
		self.zoom_at(sx, sy, factor);
	}

	/// One step in around the center of a `width` x `height` viewport.
	pub fn zoom_in(&mut self, width: f64, height: f64) {
		self.zoom_at(width / 2.0, height / 2.0, ZOOM_STEP);
	}

	/// One step out around the viewport center.
	pub fn zoom_out(&mut self, width: f64, height: f64) {
		self.zoom_at(width / 2.0, height / 2.0, 1.0 / ZOOM_STEP);
	}

	/// Shifts the view by a screen-space delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.x += dx;
		self.y += dy;
	}
}

/// How far from its center a node still catches the pointer.
pub fn hit_radius(kind: NodeKind) -> f64 {
	match kind {
		NodeKind::Store => STORE_HIT_RADIUS,
		NodeKind::Actor => ACTOR_HIT_RADIUS,
	}
}

/// Topmost node under a screen point. Later nodes are drawn above earlier ones, so they
/// are tested first.
pub fn find_node_at_point<'a>(
	sx: f64,
	sy: f64,
	nodes: &'a [GraphNode],
	transform: &ViewTransform,
) -> Option<&'a GraphNode> {
	node_index_at_point(sx, sy, nodes, transform).map(|i| &nodes[i])
}

fn node_index_at_point(sx: f64, sy: f64, nodes: &[GraphNode], transform: &ViewTransform) -> Option<usize> {
	let p = transform.screen_to_graph(sx, sy);
	nodes.iter().enumerate().rev().find_map(|(i, node)| {
		let pos = node.position?;
		let r = hit_radius(node.kind());
		let (dx, dy) = (pos.x - p.x, pos.y - p.y);
		(dx * dx + dy * dy <= r * r).then_some(i)
	})
}

#[derive(Clone, Debug, PartialEq)]
enum PointerState {
	Idle,
	Dragging {
		index: usize,
		start: (f64, f64),
		moved: bool,
	},
	Panning {
		last: (f64, f64),
	},
}

/// Hovered node and the nodes one visible edge away from it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HoverState {
	/// Hovered node index.
	pub node: Option<usize>,
	/// Nodes sharing a visible edge with the hovered one.
	pub neighbors: HashSet<usize>,
}

/// Everything the canvas needs between frames: layout, view transform, pointer and filters.
pub struct ActivityGraphState {
	/// Layout engine that owns positions between batches.
	pub engine: LayoutEngine,
	/// Graph of the latest batch, with positions synced from the engine.
	pub graph: GraphData,
	/// Current pan and zoom.
	pub transform: ViewTransform,
	/// Current hover focus.
	pub hover: HoverState,
	/// Canvas width in CSS pixels.
	pub width: f64,
	/// Canvas height in CSS pixels.
	pub height: f64,
	endpoints: Vec<Option<(usize, usize)>>,
	pointer: PointerState,
	enabled: BTreeSet<ActivityType>,
	fresh_until: HashMap<String, f64>,
	fresh_edge_ms: f64,
	/// Set by the first batch that carries any edge; earlier edges are never "new".
	seeded: bool,
}

impl ActivityGraphState {
	/// Empty state; edges stay flagged new for `fresh_edge_ms` after they first show up.
	pub fn new(params: SimulationParameters, fresh_edge_ms: f64) -> Self {
		Self {
			engine: LayoutEngine::new(params),
			graph: GraphData::default(),
			transform: ViewTransform::default(),
			hover: HoverState::default(),
			width: 0.0,
			height: 0.0,
			endpoints: Vec::new(),
			pointer: PointerState::Idle,
			enabled: ActivityType::ALL.into_iter().collect(),
			fresh_until: HashMap::new(),
			fresh_edge_ms,
			seeded: false,
		}
	}

	/// Starts the layout once both dimensions are non-zero.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.engine.resize(width, height);
		self.sync_positions();
	}

	/// Rebuilds the graph from a new batch, carrying positions over from the live layout.
	pub fn apply_activities(&mut self, activities: &[ActivityEvent], now_ms: f64) {
		self.sync_positions();
		let previous = node_map(&self.graph.nodes);
		let known: HashSet<&str> = self.graph.edges.iter().map(|e| e.id.as_str()).collect();
		let graph = build_graph(activities, &previous);

		if self.seeded {
			for edge in &graph.edges {
				if !known.contains(edge.id.as_str()) {
					self.fresh_until
						.insert(edge.id.clone(), now_ms + self.fresh_edge_ms);
				}
			}
		}
		self.seeded |= !graph.edges.is_empty();
		debug!(
			"graph rebuilt from {} activities: {} nodes, {} edges, {} fresh",
			activities.len(),
			graph.nodes.len(),
			graph.edges.len(),
			self.fresh_until.len()
		);

		let hovered = self.hover.node.map(|i| self.graph.nodes[i].key.clone());
		let dragged = match self.pointer {
			PointerState::Dragging { index, .. } => Some(self.graph.nodes[index].key.clone()),
			_ => None,
		};

		self.engine.update_graph(&graph.nodes, &graph.edges);
		let index: HashMap<&NodeKey, usize> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (&n.key, i))
			.collect();
		self.endpoints = graph
			.edges
			.iter()
			.map(|e| Some((*index.get(&e.source)?, *index.get(&e.target)?)))
			.collect();
		let hovered = hovered.and_then(|key| index.get(&key).copied());
		let dragged = dragged.and_then(|key| index.get(&key).copied());
		drop(index);
		self.graph = graph;
		self.hover = HoverState::default();

		self.pointer = match (self.pointer.clone(), dragged) {
			(PointerState::Dragging { start, moved, .. }, Some(index)) => {
				PointerState::Dragging { index, start, moved }
			}
			(PointerState::Dragging { index, .. }, None) => {
				// dragged node left the batch; its pin was the only one
				self.engine.end_drag(index);
				PointerState::Idle
			}
			(other, _) => other,
		};
		self.set_hover(hovered);
		self.sync_positions();
	}

	/// Copies live positions out of the layout engine into the node snapshot.
	pub fn sync_positions(&mut self) {
		let Some(sim) = self.engine.simulation() else {
			return;
		};
		for (node, body) in self.graph.nodes.iter_mut().zip(sim.nodes()) {
			node.position = Some(body.position());
			node.pinned = body.pinned();
		}
	}

	/// Steps the layout once and expires fresh-edge flags. Returns whether anything changed.
	pub fn tick(&mut self, now_ms: f64) -> bool {
		let stepped = self.engine.tick();
		if stepped {
			self.sync_positions();
		}
		let before = self.fresh_until.len();
		self.fresh_until.retain(|_, until| *until > now_ms);
		stepped || before != self.fresh_until.len()
	}

	/// Whether frames are still needed to animate something.
	pub fn is_animating(&self) -> bool {
		self.engine.is_active() || !self.fresh_until.is_empty()
	}

	/// Whether an edge still carries its "new" highlight at `now_ms`.
	pub fn is_fresh(&self, edge_id: &str, now_ms: f64) -> bool {
		self.fresh_until.get(edge_id).is_some_and(|until| *until > now_ms)
	}

	/// Activity types whose edges are drawn.
	pub fn enabled_types(&self) -> &BTreeSet<ActivityType> {
		&self.enabled
	}

	/// Replaces the type filter and recomputes the hover neighbourhood under it.
	pub fn set_enabled_types(&mut self, enabled: BTreeSet<ActivityType>) {
		self.enabled = enabled;
		let hovered = self.hover.node;
		self.hover.node = None;
		self.set_hover(hovered);
	}

	/// Edge passes the type filter and both its endpoints resolved.
	pub fn edge_visible(&self, edge: usize) -> bool {
		self.graph
			.edges
			.get(edge)
			.is_some_and(|e| self.enabled.contains(&e.activity_type))
			&& self.endpoints.get(edge).copied().flatten().is_some()
	}

	/// Resolved `(source, target)` node indices of a visible edge.
	pub fn visible_endpoints(&self, edge: usize) -> Option<(usize, usize)> {
		if self.edge_visible(edge) {
			self.endpoints[edge]
		} else {
			None
		}
	}

	/// Per node: does it have at least one edge passing the filter.
	pub fn nodes_with_visible_edges(&self) -> Vec<bool> {
		let mut connected = vec![false; self.graph.nodes.len()];
		for edge in 0..self.graph.edges.len() {
			if let Some((s, t)) = self.visible_endpoints(edge) {
				connected[s] = true;
				connected[t] = true;
			}
		}
		connected
	}

	/// Focuses `node` and collects its neighbours over visible edges.
	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		self.hover.node = node;
		self.hover.neighbors.clear();
		let Some(idx) = node else {
			return;
		};
		for edge in 0..self.graph.edges.len() {
			match self.visible_endpoints(edge) {
				Some((s, t)) if s == idx => {
					self.hover.neighbors.insert(t);
				}
				Some((s, t)) if t == idx => {
					self.hover.neighbors.insert(s);
				}
				_ => {}
			}
		}
	}

	/// Hovered node or one of its neighbours.
	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.neighbors.contains(&idx)
	}

	/// Index of the topmost node under a screen point.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<usize> {
		node_index_at_point(sx, sy, &self.graph.nodes, &self.transform)
	}

	/// Press: grab a node for dragging, or start panning on empty canvas.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		self.pointer = match self.node_at(sx, sy) {
			Some(index) => {
				self.engine.start_drag(index);
				self.sync_positions();
				PointerState::Dragging {
					index,
					start: (sx, sy),
					moved: false,
				}
			}
			None => PointerState::Panning { last: (sx, sy) },
		};
	}

	/// Move: drag, pan or update hover. Returns whether a redraw is needed.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> bool {
		if self.pointer == PointerState::Idle {
			let before = self.hover.node;
			let hovered = self.node_at(sx, sy);
			self.set_hover(hovered);
			return before != hovered;
		}
		match &mut self.pointer {
			PointerState::Dragging { index, start, moved } => {
				let index = *index;
				if (sx - start.0).hypot(sy - start.1) > CLICK_SLOP {
					*moved = true;
				}
				let at = self.transform.screen_to_graph(sx, sy);
				self.engine.drag(index, at);
				if let Some(node) = self.graph.nodes.get_mut(index) {
					node.pinned = Some(at);
				}
				true
			}
			PointerState::Panning { last } => {
				let (dx, dy) = (sx - last.0, sy - last.1);
				*last = (sx, sy);
				self.transform.pan_by(dx, dy);
				true
			}
			PointerState::Idle => false,
		}
	}

	/// Release. Returns the store id to navigate to when a store node was clicked.
	pub fn pointer_up(&mut self) -> Option<String> {
		let pointer = std::mem::replace(&mut self.pointer, PointerState::Idle);
		let PointerState::Dragging { index, moved, .. } = pointer else {
			return None;
		};
		self.engine.end_drag(index);
		self.sync_positions();
		match self.graph.nodes.get(index).map(|n| &n.key) {
			Some(NodeKey::Store(id)) if !moved => Some(id.clone()),
			_ => None,
		}
	}

	/// Pointer left the canvas: ends any drag or pan and clears hover.
	pub fn pointer_leave(&mut self) {
		if let PointerState::Dragging { index, .. } = self.pointer {
			self.engine.end_drag(index);
			self.sync_positions();
		}
		self.pointer = PointerState::Idle;
		self.set_hover(None);
	}

	/// A node is held under the pointer.
	pub fn is_dragging(&self) -> bool {
		matches!(self.pointer, PointerState::Dragging { .. })
	}

	/// Zooms toward the pointer.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		self.transform.wheel(sx, sy, delta_y);
	}

	/// Zooms in around the viewport center.
	pub fn zoom_in(&mut self) {
		self.transform.zoom_in(self.width, self.height);
	}

	/// Zooms out around the viewport center.
	pub fn zoom_out(&mut self) {
		self.transform.zoom_out(self.width, self.height);
	}

	/// Back to no pan and unit zoom.
	pub fn reset_view(&mut self) {
		self.transform = ViewTransform::default();
	}

	/// Nodes keyed by identity with current positions, for callers threading state.
	pub fn node_snapshot(&self) -> HashMap<NodeKey, GraphNode> {
		node_map(&self.graph.nodes)
	}

	/// Stops the layout for good.
	pub fn stop(&mut self) {
		self.engine.stop();
	}
}
