use super::super::types::Position;

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 12;

#[derive(Clone, Copy, Debug)]
pub(super) struct QuadBounds {
	pub(super) center: Position,
	pub(super) half_extent: f64,
}

impl QuadBounds {
	fn from_points(points: &[Position]) -> Option<Self> {
		let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
		let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for p in points {
			min_x = min_x.min(p.x);
			min_y = min_y.min(p.y);
			max_x = max_x.max(p.x);
			max_y = max_y.max(p.y);
		}
		if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
			return None;
		}

		let half_extent = ((max_x - min_x).max(max_y - min_y).max(1.0) * 0.5) + 1.0;
		Some(Self {
			center: Position::new((min_x + max_x) * 0.5, (min_y + max_y) * 0.5),
			half_extent,
		})
	}

	fn child(self, quadrant: usize) -> Self {
		let quarter = self.half_extent * 0.5;
		let (ox, oy) = match quadrant {
			0 => (-quarter, -quarter),
			1 => (quarter, -quarter),
			2 => (-quarter, quarter),
			_ => (quarter, quarter),
		};
		Self {
			center: Position::new(self.center.x + ox, self.center.y + oy),
			half_extent: quarter,
		}
	}

	fn quadrant_for(self, p: Position) -> usize {
		match (p.x >= self.center.x, p.y >= self.center.y) {
			(false, false) => 0,
			(true, false) => 1,
			(false, true) => 2,
			(true, true) => 3,
		}
	}

	pub(super) fn contains(self, p: Position) -> bool {
		(p.x - self.center.x).abs() <= self.half_extent && (p.y - self.center.y).abs() <= self.half_extent
	}

	pub(super) fn side_length(self) -> f64 {
		self.half_extent * 2.0
	}

	/// Squared distance from `p` to the nearest point of this square (0 inside).
	fn distance_sq_to(self, p: Position) -> f64 {
		let dx = ((p.x - self.center.x).abs() - self.half_extent).max(0.0);
		let dy = ((p.y - self.center.y).abs() - self.half_extent).max(0.0);
		dx * dx + dy * dy
	}
}

/// Barnes-Hut cell. Leaves hold point indices; inner cells only aggregate.
pub(super) struct QuadNode {
	pub(super) bounds: QuadBounds,
	pub(super) center_of_mass: Position,
	pub(super) mass: f64,
	pub(super) indices: Vec<usize>,
	children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
	pub(super) fn build(points: &[Position]) -> Option<Self> {
		let bounds = QuadBounds::from_points(points)?;
		Some(Self::build_node(bounds, (0..points.len()).collect(), points, 0))
	}

	fn build_node(bounds: QuadBounds, indices: Vec<usize>, points: &[Position], depth: usize) -> Self {
		let mass = indices.len() as f64;
		let (mut cx, mut cy) = (0.0, 0.0);
		for &i in &indices {
			cx += points[i].x;
			cy += points[i].y;
		}
		if mass > 0.0 {
			cx /= mass;
			cy /= mass;
		}

		let mut node = Self {
			bounds,
			center_of_mass: Position::new(cx, cy),
			mass,
			indices,
			children: std::array::from_fn(|_| None),
		};
		if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
			return node;
		}

		let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
		for &i in &node.indices {
			buckets[bounds.quadrant_for(points[i])].push(i);
		}
		// coincident points never separate, keep them in one leaf
		if buckets.iter().filter(|b| !b.is_empty()).count() <= 1 {
			return node;
		}

		for (quadrant, bucket) in buckets.into_iter().enumerate() {
			if bucket.is_empty() {
				continue;
			}
			node.children[quadrant] = Some(Box::new(Self::build_node(
				bounds.child(quadrant),
				bucket,
				points,
				depth + 1,
			)));
		}
		node.indices.clear();
		node
	}

	pub(super) fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}

	pub(super) fn children(&self) -> impl Iterator<Item = &QuadNode> {
		self.children.iter().filter_map(|c| c.as_deref())
	}

	/// Calls `f` with every point index whose cell lies within `radius` of `p`.
	/// Candidates still need an exact distance check.
	pub(super) fn for_each_near(&self, p: Position, radius: f64, f: &mut impl FnMut(usize)) {
		if self.bounds.distance_sq_to(p) > radius * radius {
			return;
		}
		if self.is_leaf() {
			for &i in &self.indices {
				f(i);
			}
			return;
		}
		for child in self.children() {
			child.for_each_near(p, radius, f);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn grid(n: usize) -> Vec<Position> {
		(0..n * n)
			.map(|i| Position::new((i % n) as f64 * 10.0, (i / n) as f64 * 10.0))
			.collect()
	}

	fn leaf_count(node: &QuadNode) -> usize {
		if node.is_leaf() {
			node.indices.len()
		} else {
			node.children().map(leaf_count).sum()
		}
	}

	#[test]
	fn every_point_lands_in_exactly_one_leaf() {
		let points = grid(10);
		let tree = QuadNode::build(&points).unwrap();
		assert!(!tree.is_leaf());
		assert_eq!(tree.mass, 100.0);
		assert_eq!(leaf_count(&tree), 100);
	}

	#[test]
	fn coincident_points_do_not_recurse_forever() {
		let points = vec![Position::new(3.0, 3.0); 50];
		let tree = QuadNode::build(&points).unwrap();
		assert!(tree.is_leaf());
		assert_eq!(tree.indices.len(), 50);
	}

	#[test]
	fn near_query_finds_all_points_in_radius() {
		let points = grid(10);
		let tree = QuadNode::build(&points).unwrap();
		let probe = Position::new(45.0, 45.0);
		let mut found = Vec::new();
		tree.for_each_near(probe, 15.0, &mut |i| found.push(i));

		for (i, p) in points.iter().enumerate() {
			let d = ((p.x - probe.x).powi(2) + (p.y - probe.y).powi(2)).sqrt();
			if d <= 15.0 {
				assert!(found.contains(&i), "missing point {i}");
			}
		}
		assert!(found.len() < points.len());
	}

	#[test]
	fn non_finite_points_yield_no_tree() {
		assert!(QuadNode::build(&[Position::new(f64::NAN, 0.0)]).is_none());
		assert!(QuadNode::build(&[]).is_none());
	}
}
