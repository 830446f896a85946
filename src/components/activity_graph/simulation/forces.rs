use super::super::types::Position;
use super::quadtree::QuadNode;
use super::{SimLink, SimNode};

const DISTANCE_MIN_SQ: f64 = 1.0;

/// Tiny deterministic offset used when two points coincide exactly.
fn jiggle(a: usize, b: usize) -> f64 {
	let t = ((a as f64) * 0.618_034 + (b as f64) * 0.414_214).fract();
	(t - 0.5) * 1e-6
}

/// Springs pulling linked nodes toward `distance`. Reads velocities already updated by
/// earlier links in the same pass, so parallel edges stay stable.
pub(super) fn apply_links(nodes: &mut [SimNode], links: &[SimLink], distance: f64, strength: f64, alpha: f64) {
	for (i, link) in links.iter().enumerate() {
		let (s, t) = (link.source, link.target);
		if s == t {
			continue;
		}
		let mut dx = nodes[t].x + nodes[t].vx - nodes[s].x - nodes[s].vx;
		let mut dy = nodes[t].y + nodes[t].vy - nodes[s].y - nodes[s].vy;
		if dx == 0.0 {
			dx = jiggle(i, s);
		}
		if dy == 0.0 {
			dy = jiggle(t, i);
		}
		let l = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
		let k = (l - distance) / l * alpha * strength;
		let (fx, fy) = (dx * k, dy * k);

		nodes[t].vx -= fx * link.bias;
		nodes[t].vy -= fy * link.bias;
		nodes[s].vx += fx * (1.0 - link.bias);
		nodes[s].vy += fy * (1.0 - link.bias);
	}
}

/// Barnes-Hut many-body force. Negative `strength` repels.
pub(super) fn apply_many_body(
	nodes: &mut [SimNode],
	positions: &[Position],
	tree: &QuadNode,
	strength: f64,
	theta: f64,
	alpha: f64,
) {
	let theta_sq = theta * theta;
	for (i, node) in nodes.iter_mut().enumerate() {
		let (mut ax, mut ay) = (0.0, 0.0);
		accumulate_charge(tree, i, positions, theta_sq, &mut ax, &mut ay);
		node.vx += ax * strength * alpha;
		node.vy += ay * strength * alpha;
	}
}

fn accumulate_charge(
	cell: &QuadNode,
	index: usize,
	positions: &[Position],
	theta_sq: f64,
	ax: &mut f64,
	ay: &mut f64,
) {
	if cell.mass <= 0.0 {
		return;
	}
	let p = positions[index];

	if cell.is_leaf() {
		for &other in &cell.indices {
			if other == index {
				continue;
			}
			let (dx, dy) = offset(p, positions[other], index, other);
			let l = softened(dx * dx + dy * dy);
			*ax += dx / l;
			*ay += dy / l;
		}
		return;
	}

	let dx = cell.center_of_mass.x - p.x;
	let dy = cell.center_of_mass.y - p.y;
	let l = dx * dx + dy * dy;
	let w = cell.bounds.side_length();
	if !cell.bounds.contains(p) && w * w / theta_sq < l {
		let l = softened(l);
		*ax += dx * cell.mass / l;
		*ay += dy * cell.mass / l;
		return;
	}

	for child in cell.children() {
		accumulate_charge(child, index, positions, theta_sq, ax, ay);
	}
}

fn offset(from: Position, to: Position, a: usize, b: usize) -> (f64, f64) {
	let mut dx = to.x - from.x;
	let mut dy = to.y - from.y;
	if dx == 0.0 && dy == 0.0 {
		dx = jiggle(a, b);
		dy = jiggle(b, a);
	}
	(dx, dy)
}

fn softened(l: f64) -> f64 {
	if l < DISTANCE_MIN_SQ {
		(DISTANCE_MIN_SQ * l).sqrt().max(f64::EPSILON)
	} else {
		l
	}
}

/// Weak pull of every node toward `center` on both axes.
pub(super) fn apply_center(nodes: &mut [SimNode], center: Position, strength: f64, alpha: f64) {
	for node in nodes {
		node.vx += (center.x - node.x) * strength * alpha;
		node.vy += (center.y - node.y) * strength * alpha;
	}
}

/// Pushes apart nodes whose collision circles overlap. `predicted` holds `x + vx` per node
/// and `tree` is built over it.
pub(super) fn apply_collision(
	nodes: &mut [SimNode],
	predicted: &[Position],
	tree: &QuadNode,
	strength: f64,
) {
	let max_radius = nodes.iter().map(|n| n.radius).fold(0.0, f64::max);
	let mut near = Vec::new();

	for i in 0..nodes.len() {
		let ri = nodes[i].radius;
		let (xi, yi) = (predicted[i].x, predicted[i].y);
		near.clear();
		tree.for_each_near(predicted[i], ri + max_radius, &mut |j| {
			if j > i {
				near.push(j);
			}
		});

		for &j in &near {
			let rj = nodes[j].radius;
			let r = ri + rj;
			let mut dx = xi - nodes[j].x - nodes[j].vx;
			let mut dy = yi - nodes[j].y - nodes[j].vy;
			let mut l = dx * dx + dy * dy;
			if l >= r * r {
				continue;
			}
			if dx == 0.0 {
				dx = jiggle(i, j);
				l += dx * dx;
			}
			if dy == 0.0 {
				dy = jiggle(j, i);
				l += dy * dy;
			}
			let dist = l.sqrt().max(f64::EPSILON);
			let k = (r - dist) / dist * strength;
			let (px, py) = (dx * k, dy * k);
			let share = (rj * rj) / (ri * ri + rj * rj);

			nodes[i].vx += px * share;
			nodes[i].vy += py * share;
			nodes[j].vx -= px * (1.0 - share);
			nodes[j].vy -= py * (1.0 - share);
		}
	}
}
