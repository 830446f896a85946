//! Force-directed layout for the activity network.
//!
//! The model follows the usual "alpha" cooling scheme: each tick moves `alpha` toward
//! `alpha_target`, every force scales its velocity contribution by `alpha`, and velocities
//! decay by a constant factor. Once `alpha` drops below `alpha_min` with a zero target the
//! simulation is cold and stops asking for frames until something reheats it.

mod forces;
mod quadtree;

use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, info};

use super::types::{GraphEdge, GraphNode, NodeKey, NodeKind, Position};
use quadtree::QuadNode;

/// Tuning knobs of the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationParameters {
	/// Rest length of a link.
	pub link_distance: f64,
	/// How strongly links pull toward their rest length.
	pub link_strength: f64,
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Barnes-Hut accuracy; larger is faster and coarser.
	pub theta: f64,
	/// Pull toward the container center on each axis.
	pub center_strength: f64,
	/// Collision radius of store nodes.
	pub store_radius: f64,
	/// Collision radius of actor nodes.
	pub actor_radius: f64,
	/// How hard overlapping nodes are pushed apart.
	pub collide_strength: f64,
	/// Below this alpha the simulation is considered settled.
	pub alpha_min: f64,
	/// Fraction of the distance to `alpha_target` covered per tick.
	pub alpha_decay: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Target alpha held while a node is dragged.
	pub drag_alpha_target: f64,
	/// Alpha applied when new graph data arrives.
	pub reheat_alpha: f64,
}

impl Default for SimulationParameters {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			link_distance: 120.0,
			link_strength: 0.4,
			charge_strength: -300.0,
			theta: 0.9,
			center_strength: 0.05,
			store_radius: 35.0,
			actor_radius: 22.0,
			collide_strength: 0.7,
			alpha_min,
			// reach alpha_min from 1.0 in ~300 ticks
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
			reheat_alpha: 0.3,
		}
	}
}

/// Per-node physics state.
#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
	/// Identity of the graph node this body belongs to.
	pub key: NodeKey,
	/// Horizontal position.
	pub x: f64,
	/// Vertical position.
	pub y: f64,
	/// Horizontal velocity.
	pub vx: f64,
	/// Vertical velocity.
	pub vy: f64,
	/// Pinned horizontal position.
	pub fx: Option<f64>,
	/// Pinned vertical position.
	pub fy: Option<f64>,
	/// Collision radius.
	pub radius: f64,
}

impl SimNode {
	/// Current position.
	pub fn position(&self) -> Position {
		Position::new(self.x, self.y)
	}

	/// Pinned position, if both axes are pinned.
	pub fn pinned(&self) -> Option<Position> {
		match (self.fx, self.fy) {
			(Some(x), Some(y)) => Some(Position::new(x, y)),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SimLink {
	pub(crate) source: usize,
	pub(crate) target: usize,
	bias: f64,
}

/// A running force simulation over one node set.
pub struct Simulation {
	params: SimulationParameters,
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	center: Position,
	alpha: f64,
	alpha_target: f64,
	scratch: Vec<Position>,
}

impl Simulation {
	/// Empty simulation centered on `center`, fully heated.
	pub fn new(params: SimulationParameters, center: Position) -> Self {
		Self {
			params,
			nodes: Vec::new(),
			links: Vec::new(),
			center,
			alpha: 1.0,
			alpha_target: 0.0,
			scratch: Vec::new(),
		}
	}

	/// Replaces nodes and links. Bodies whose key survives keep position, velocity and pin;
	/// new ones start at the node's carried position or on a spiral around the center.
	pub fn set_graph(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) {
		let mut previous: HashMap<NodeKey, SimNode> = self
			.nodes
			.drain(..)
			.map(|n| (n.key.clone(), n))
			.collect();

		let mut bodies = Vec::with_capacity(nodes.len());
		for (i, node) in nodes.iter().enumerate() {
			let radius = match node.kind() {
				NodeKind::Store => self.params.store_radius,
				NodeKind::Actor => self.params.actor_radius,
			};
			let body = match previous.remove(&node.key) {
				Some(mut body) => {
					body.radius = radius;
					body
				}
				None => {
					let start = node.position.unwrap_or_else(|| self.spiral_slot(i));
					SimNode {
						key: node.key.clone(),
						x: start.x,
						y: start.y,
						vx: 0.0,
						vy: 0.0,
						fx: node.pinned.map(|p| p.x),
						fy: node.pinned.map(|p| p.y),
						radius,
					}
				}
			};
			bodies.push(body);
		}
		self.nodes = bodies;

		let index: HashMap<&NodeKey, usize> = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (&n.key, i))
			.collect();
		let resolved: Vec<(usize, usize)> = edges
			.iter()
			.filter_map(|e| Some((*index.get(&e.source)?, *index.get(&e.target)?)))
			.collect();

		let mut degree = vec![0usize; self.nodes.len()];
		for &(s, t) in &resolved {
			degree[s] += 1;
			degree[t] += 1;
		}
		self.links = resolved
			.into_iter()
			.map(|(source, target)| SimLink {
				source,
				target,
				bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
			})
			.collect();
	}

	fn spiral_slot(&self, i: usize) -> Position {
		let radius = 10.0 * (0.5 + i as f64).sqrt();
		let angle = i as f64 * PI * (3.0 - 5f64.sqrt());
		Position::new(
			self.center.x + radius * angle.cos(),
			self.center.y + radius * angle.sin(),
		)
	}

	/// Advances the simulation by one step.
	pub fn step(&mut self) {
		let p = self.params;
		self.alpha += (self.alpha_target - self.alpha) * p.alpha_decay;
		let alpha = self.alpha;

		self.scratch.clear();
		self.scratch.extend(self.nodes.iter().map(SimNode::position));
		forces::apply_links(&mut self.nodes, &self.links, p.link_distance, p.link_strength, alpha);
		if let Some(tree) = QuadNode::build(&self.scratch) {
			forces::apply_many_body(&mut self.nodes, &self.scratch, &tree, p.charge_strength, p.theta, alpha);
		}
		forces::apply_center(&mut self.nodes, self.center, p.center_strength, alpha);

		self.scratch.clear();
		self.scratch
			.extend(self.nodes.iter().map(|n| Position::new(n.x + n.vx, n.y + n.vy)));
		if let Some(tree) = QuadNode::build(&self.scratch) {
			forces::apply_collision(&mut self.nodes, &self.scratch, &tree, p.collide_strength);
		}

		let keep = 1.0 - p.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= keep;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= keep;
					node.y += node.vy;
				}
			}
		}
	}

	/// Current energy.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Energy the simulation is moving toward.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Raises alpha to at least `alpha`.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha);
	}

	/// Settled and not being held warm.
	pub fn is_cold(&self) -> bool {
		self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min
	}

	/// Moves the centering target.
	pub fn set_center(&mut self, center: Position) {
		self.center = center;
	}

	/// Bodies in graph node order.
	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	/// Resolved links as `(source, target)` body indices.
	pub fn links(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
		self.links.iter().map(|l| (l.source, l.target))
	}

	fn pin(&mut self, index: usize, at: Position) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = Some(at.x);
			node.fy = Some(at.y);
		}
	}

	fn unpin(&mut self, index: usize) {
		if let Some(node) = self.nodes.get_mut(index) {
			node.fx = None;
			node.fy = None;
		}
	}
}

/// Where the engine is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutPhase {
	/// No usable container size yet.
	Uninitialized,
	/// Simulating.
	Running,
	/// Torn down; ignores all input.
	Stopped,
}

enum EngineState {
	Uninitialized {
		nodes: Vec<GraphNode>,
		edges: Vec<GraphEdge>,
	},
	Running(Simulation),
	Stopped,
}

/// Owns the simulation across data updates and container resizes.
pub struct LayoutEngine {
	params: SimulationParameters,
	state: EngineState,
	on_tick: Option<Box<dyn FnMut()>>,
}

impl LayoutEngine {
	/// Engine waiting for a container size.
	pub fn new(params: SimulationParameters) -> Self {
		Self {
			params,
			state: EngineState::Uninitialized {
				nodes: Vec::new(),
				edges: Vec::new(),
			},
			on_tick: None,
		}
	}

	/// Registers the callback invoked after every simulation step.
	pub fn on_tick(&mut self, callback: impl FnMut() + 'static) {
		self.on_tick = Some(Box::new(callback));
	}

	/// Current lifecycle phase.
	pub fn phase(&self) -> LayoutPhase {
		match self.state {
			EngineState::Uninitialized { .. } => LayoutPhase::Uninitialized,
			EngineState::Running(_) => LayoutPhase::Running,
			EngineState::Stopped => LayoutPhase::Stopped,
		}
	}

	/// The live simulation, once running.
	pub fn simulation(&self) -> Option<&Simulation> {
		match &self.state {
			EngineState::Running(sim) => Some(sim),
			_ => None,
		}
	}

	fn simulation_mut(&mut self) -> Option<&mut Simulation> {
		match &mut self.state {
			EngineState::Running(sim) => Some(sim),
			_ => None,
		}
	}

	/// Container size changed. A zero dimension never starts the simulation.
	pub fn resize(&mut self, width: f64, height: f64) {
		let center = Position::new(width / 2.0, height / 2.0);
		match &mut self.state {
			EngineState::Uninitialized { nodes, edges } => {
				if width <= 0.0 || height <= 0.0 {
					return;
				}
				let mut sim = Simulation::new(self.params, center);
				sim.set_graph(nodes, edges);
				info!(
					"layout initialized at {width}x{height} with {} nodes",
					sim.nodes().len()
				);
				self.state = EngineState::Running(sim);
			}
			EngineState::Running(sim) => {
				if width > 0.0 && height > 0.0 {
					sim.set_center(center);
				}
			}
			EngineState::Stopped => {}
		}
	}

	/// Swaps in a new node/edge set without restarting, then nudges alpha so it re-settles.
	pub fn update_graph(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) {
		let reheat = self.params.reheat_alpha;
		match &mut self.state {
			EngineState::Uninitialized {
				nodes: pending_nodes,
				edges: pending_edges,
			} => {
				*pending_nodes = nodes.to_vec();
				*pending_edges = edges.to_vec();
			}
			EngineState::Running(sim) => {
				sim.set_graph(nodes, edges);
				sim.reheat(reheat);
				debug!("layout updated: {} nodes, {} links", nodes.len(), edges.len());
			}
			EngineState::Stopped => {}
		}
	}

	/// Runs one step if the simulation is warm. Returns whether a step happened.
	pub fn tick(&mut self) -> bool {
		let Some(sim) = self.simulation_mut() else {
			return false;
		};
		if sim.is_cold() {
			return false;
		}
		sim.step();
		if let Some(callback) = self.on_tick.as_mut() {
			callback();
		}
		true
	}

	/// Whether ticking would do anything.
	pub fn is_active(&self) -> bool {
		self.simulation().is_some_and(|sim| !sim.is_cold())
	}

	/// Pins `index` where it stands and keeps the simulation warm.
	pub fn start_drag(&mut self, index: usize) {
		let target = self.params.drag_alpha_target;
		if let Some(sim) = self.simulation_mut() {
			sim.alpha_target = target;
			sim.reheat(target);
			if let Some(at) = sim.nodes.get(index).map(SimNode::position) {
				sim.pin(index, at);
			}
		}
	}

	/// Moves the pinned node.
	pub fn drag(&mut self, index: usize, at: Position) {
		if let Some(sim) = self.simulation_mut() {
			sim.pin(index, at);
		}
	}

	/// Releases the pin and lets the simulation cool down.
	pub fn end_drag(&mut self, index: usize) {
		if let Some(sim) = self.simulation_mut() {
			sim.alpha_target = 0.0;
			sim.unpin(index);
		}
	}

	/// Tears the engine down and drops the tick callback.
	pub fn stop(&mut self) {
		if self.phase() != LayoutPhase::Stopped {
			info!("layout stopped");
		}
		self.state = EngineState::Stopped;
		self.on_tick = None;
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use chrono::Utc;

	use super::*;
	use crate::activity::ActivityType;

	fn node(key: NodeKey) -> GraphNode {
		GraphNode {
			label: key.raw_id().to_string(),
			initials: "XX".into(),
			key,
			activity_count: 1,
			last_active: Utc::now(),
			position: None,
			pinned: None,
		}
	}

	fn edge(id: &str, source: &NodeKey, target: &NodeKey) -> GraphEdge {
		GraphEdge {
			id: id.into(),
			source: source.clone(),
			target: target.clone(),
			activity_type: ActivityType::OrderPlaced,
			actor_name: String::new(),
			created_at: Utc::now(),
			meta: Default::default(),
		}
	}

	fn star(actors: usize) -> (Vec<GraphNode>, Vec<GraphEdge>) {
		let store = NodeKey::Store("s".into());
		let mut nodes = vec![node(store.clone())];
		let mut edges = Vec::new();
		for i in 0..actors {
			let actor = NodeKey::Actor(format!("a{i}"));
			edges.push(edge(&format!("e{i}"), &actor, &store));
			nodes.push(node(actor));
		}
		(nodes, edges)
	}

	fn running(nodes: &[GraphNode], edges: &[GraphEdge]) -> LayoutEngine {
		let mut engine = LayoutEngine::new(SimulationParameters::default());
		engine.update_graph(nodes, edges);
		engine.resize(800.0, 600.0);
		engine
	}

	fn distance(a: &SimNode, b: &SimNode) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn zero_size_container_never_starts() {
		let (nodes, edges) = star(3);
		let mut engine = LayoutEngine::new(SimulationParameters::default());
		engine.update_graph(&nodes, &edges);
		engine.resize(0.0, 600.0);
		assert_eq!(engine.phase(), LayoutPhase::Uninitialized);
		assert!(!engine.tick());

		engine.resize(800.0, 600.0);
		assert_eq!(engine.phase(), LayoutPhase::Running);
		assert_eq!(engine.simulation().unwrap().nodes().len(), 4);
		assert!(engine.tick());
	}

	#[test]
	fn settles_within_a_few_hundred_ticks() {
		let (nodes, edges) = star(6);
		let mut engine = running(&nodes, &edges);
		let mut ticks = 0;
		while engine.tick() {
			ticks += 1;
			assert!(ticks < 400, "simulation never cooled");
		}
		assert!(ticks > 250, "cooled too fast: {ticks}");
		assert!(!engine.is_active());

		let sim = engine.simulation().unwrap();
		assert!(sim.nodes().iter().all(|n| n.x.is_finite() && n.y.is_finite()));
	}

	#[test]
	fn settled_star_respects_link_length_and_collision() {
		let (nodes, edges) = star(5);
		let mut engine = running(&nodes, &edges);
		while engine.tick() {}

		let sim = engine.simulation().unwrap();
		let hub = &sim.nodes()[0];
		for actor in &sim.nodes()[1..] {
			let d = distance(hub, actor);
			assert!(d > 57.0 * 0.9, "overlapping store and actor: {d}");
			assert!(d < 400.0, "link did not hold: {d}");
		}
		for (i, a) in sim.nodes()[1..].iter().enumerate() {
			for b in &sim.nodes()[i + 2..] {
				assert!(distance(a, b) > 44.0 * 0.9);
			}
		}
	}

	#[test]
	fn unlinked_nodes_repel() {
		let mut a = node(NodeKey::Actor("a".into()));
		let mut b = node(NodeKey::Actor("b".into()));
		a.position = Some(Position::new(395.0, 300.0));
		b.position = Some(Position::new(405.0, 300.0));
		let mut engine = running(&[a, b], &[]);
		for _ in 0..30 {
			engine.tick();
		}
		let sim = engine.simulation().unwrap();
		assert!(distance(&sim.nodes()[0], &sim.nodes()[1]) > 60.0);
	}

	#[test]
	fn graph_drifts_toward_container_center() {
		let mut lone = node(NodeKey::Store("s".into()));
		lone.position = Some(Position::new(0.0, 0.0));
		let mut engine = running(&[lone], &[]);
		while engine.tick() {}
		let body = &engine.simulation().unwrap().nodes()[0];
		assert!((body.x - 400.0).abs() < 200.0);
		assert!((body.y - 300.0).abs() < 150.0);
	}

	#[test]
	fn update_keeps_bodies_and_reheats() {
		let (nodes, edges) = star(3);
		let mut engine = running(&nodes, &edges);
		while engine.tick() {}
		let before = engine.simulation().unwrap().nodes()[1].clone();

		let (more_nodes, more_edges) = star(4);
		engine.update_graph(&more_nodes, &more_edges);
		let sim = engine.simulation().unwrap();
		assert_eq!(sim.nodes()[1], before);
		assert!(sim.alpha() >= 0.3);
		assert_eq!(sim.nodes().len(), 5);
		assert_eq!(sim.links().count(), 4);
		assert!(engine.is_active());
	}

	#[test]
	fn carried_positions_seed_new_bodies() {
		let mut seeded = node(NodeKey::Actor("a".into()));
		seeded.position = Some(Position::new(12.0, 34.0));
		let engine = running(&[seeded], &[]);
		let body = &engine.simulation().unwrap().nodes()[0];
		assert_eq!(body.position(), Position::new(12.0, 34.0));
	}

	#[test]
	fn drag_pins_node_and_keeps_simulation_warm() {
		let (nodes, edges) = star(3);
		let mut engine = running(&nodes, &edges);
		while engine.tick() {}

		engine.start_drag(1);
		assert_eq!(engine.simulation().unwrap().alpha_target(), 0.3);
		engine.drag(1, Position::new(500.0, 500.0));
		for _ in 0..50 {
			assert!(engine.tick());
		}
		let sim = engine.simulation().unwrap();
		assert_eq!(sim.nodes()[1].position(), Position::new(500.0, 500.0));
		assert_eq!(sim.nodes()[1].pinned(), Some(Position::new(500.0, 500.0)));

		engine.end_drag(1);
		let sim = engine.simulation().unwrap();
		assert_eq!(sim.nodes()[1].pinned(), None);
		assert_eq!(sim.alpha_target(), 0.0);
		let mut ticks = 0;
		while engine.tick() {
			ticks += 1;
			assert!(ticks < 400);
		}
	}

	#[test]
	fn tick_callback_fires_per_step_and_stop_is_final() {
		let (nodes, edges) = star(2);
		let mut engine = running(&nodes, &edges);
		let count = Rc::new(Cell::new(0));
		let seen = count.clone();
		engine.on_tick(move || seen.set(seen.get() + 1));

		for _ in 0..5 {
			engine.tick();
		}
		assert_eq!(count.get(), 5);

		engine.stop();
		assert_eq!(engine.phase(), LayoutPhase::Stopped);
		assert!(!engine.tick());
		engine.resize(800.0, 600.0);
		engine.update_graph(&nodes, &edges);
		assert_eq!(engine.phase(), LayoutPhase::Stopped);
		assert_eq!(count.get(), 5);
	}

	#[test]
	fn parallel_edges_stay_stable() {
		let store = NodeKey::Store("s".into());
		let actor = NodeKey::Actor("a".into());
		let nodes = vec![node(actor.clone()), node(store.clone())];
		let edges: Vec<_> = (0..20).map(|i| edge(&format!("e{i}"), &actor, &store)).collect();
		let mut engine = running(&nodes, &edges);
		while engine.tick() {}
		let sim = engine.simulation().unwrap();
		let d = distance(&sim.nodes()[0], &sim.nodes()[1]);
		assert!(d.is_finite());
		assert!((50.0..200.0).contains(&d), "unexpected rest distance {d}");
	}
}
