//! Orthographic globe projection and camera.

use std::f64::consts::PI;

use super::types::GeoCoord;

/// Angular distance (radians) below which two points count as coincident or antipodal.
const ARC_EPSILON: f64 = 1e-6;
const MAX_TILT: f64 = 60.0;
/// Degrees of longitude the globe turns per second while idle.
pub const AUTO_ROTATE_DEG_PER_SEC: f64 = 6.0;
/// Degrees of rotation per screen pixel of drag.
const DRAG_DEG_PER_PX: f64 = 0.25;

/// Projects geographic coordinates onto a disc of `radius` centered at `(cx, cy)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orthographic {
	pub center: GeoCoord,
	pub radius: f64,
	pub cx: f64,
	pub cy: f64,
}

impl Orthographic {
	/// Screen point of `coord`, or `None` when it sits on the far hemisphere.
	pub fn project(&self, coord: GeoCoord) -> Option<(f64, f64)> {
		let (phi, lambda) = (coord.lat.to_radians(), (coord.lng - self.center.lng).to_radians());
		let phi0 = self.center.lat.to_radians();
		let cos_c = phi0.sin() * phi.sin() + phi0.cos() * phi.cos() * lambda.cos();
		if cos_c < 0.0 {
			return None;
		}
		let x = self.radius * phi.cos() * lambda.sin();
		let y = self.radius * (phi0.cos() * phi.sin() - phi0.sin() * phi.cos() * lambda.cos());
		Some((self.cx + x, self.cy - y))
	}
}

fn to_unit(c: GeoCoord) -> [f64; 3] {
	let (lat, lng) = (c.lat.to_radians(), c.lng.to_radians());
	[lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
}

fn from_unit(v: [f64; 3]) -> GeoCoord {
	let lat = v[2].clamp(-1.0, 1.0).asin();
	let lng = v[1].atan2(v[0]);
	GeoCoord::new(lat.to_degrees(), lng.to_degrees())
}

/// `segments + 1` points along the shorter great circle from `a` to `b`, endpoints
/// included.
pub fn great_circle(a: GeoCoord, b: GeoCoord, segments: usize) -> Vec<GeoCoord> {
	let segments = segments.max(1);
	let (u, v) = (to_unit(a), to_unit(b));
	let dot = (u[0] * v[0] + u[1] * v[1] + u[2] * v[2]).clamp(-1.0, 1.0);
	let omega = dot.acos();
	if omega < ARC_EPSILON {
		return vec![a, b];
	}
	if PI - omega < ARC_EPSILON {
		return half_turn(u, segments);
	}
	let sin_omega = omega.sin();

	(0..=segments)
		.map(|i| {
			let t = i as f64 / segments as f64;
			let wa = ((1.0 - t) * omega).sin() / sin_omega;
			let wb = (t * omega).sin() / sin_omega;
			from_unit([
				wa * u[0] + wb * v[0],
				wa * u[1] + wb * v[1],
				wa * u[2] + wb * v[2],
			])
		})
		.collect()
}

/// Antipodes have no unique great circle. This one runs over the north pole, or along
/// the prime meridian when `u` sits near a pole.
fn half_turn(u: [f64; 3], segments: usize) -> Vec<GeoCoord> {
	let axis = if u[2].abs() > 0.9 { [1.0, 0.0, 0.0] } else { [0.0, 0.0, 1.0] };
	let along = u[0] * axis[0] + u[1] * axis[1] + u[2] * axis[2];
	let w = [axis[0] - along * u[0], axis[1] - along * u[1], axis[2] - along * u[2]];
	let norm = (w[0] * w[0] + w[1] * w[1] + w[2] * w[2]).sqrt();
	let w = [w[0] / norm, w[1] / norm, w[2] / norm];

	(0..=segments)
		.map(|i| {
			let theta = PI * i as f64 / segments as f64;
			let (sin, cos) = theta.sin_cos();
			from_unit([
				cos * u[0] + sin * w[0],
				cos * u[1] + sin * w[1],
				cos * u[2] + sin * w[2],
			])
		})
		.collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DragAnchor {
	x: f64,
	y: f64,
	center: GeoCoord,
}

/// Where the globe is looking. Spins on its own until grabbed.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobeCamera {
	pub center: GeoCoord,
	drag: Option<DragAnchor>,
}

impl Default for GlobeCamera {
	fn default() -> Self {
		Self {
			center: GeoCoord::new(20.0, 0.0),
			drag: None,
		}
	}
}

impl GlobeCamera {
	pub fn is_dragging(&self) -> bool {
		self.drag.is_some()
	}

	/// Advances auto-rotation by `elapsed_ms`. Paused while dragging.
	pub fn advance(&mut self, elapsed_ms: f64) {
		if self.drag.is_some() {
			return;
		}
		self.center.lng = wrap_lng(self.center.lng + AUTO_ROTATE_DEG_PER_SEC * elapsed_ms / 1000.0);
	}

	pub fn drag_start(&mut self, x: f64, y: f64) {
		self.drag = Some(DragAnchor {
			x,
			y,
			center: self.center,
		});
	}

	pub fn drag_move(&mut self, x: f64, y: f64) {
		let Some(anchor) = self.drag else {
			return;
		};
		self.center = GeoCoord::new(
			(anchor.center.lat + (y - anchor.y) * DRAG_DEG_PER_PX).clamp(-MAX_TILT, MAX_TILT),
			wrap_lng(anchor.center.lng - (x - anchor.x) * DRAG_DEG_PER_PX),
		);
	}

	pub fn drag_end(&mut self) {
		self.drag = None;
	}

	/// Projection filling most of a `width` x `height` viewport.
	pub fn projection(&self, width: f64, height: f64) -> Orthographic {
		Orthographic {
			center: self.center,
			radius: width.min(height) * 0.45,
			cx: width / 2.0,
			cy: height / 2.0,
		}
	}
}

fn wrap_lng(lng: f64) -> f64 {
	(lng + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
	use super::*;

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-6
	}

	fn globe() -> Orthographic {
		Orthographic {
			center: GeoCoord::new(0.0, 0.0),
			radius: 100.0,
			cx: 200.0,
			cy: 150.0,
		}
	}

	#[test]
	fn view_center_projects_to_disc_center() {
		let (x, y) = globe().project(GeoCoord::new(0.0, 0.0)).unwrap();
		assert!(close(x, 200.0) && close(y, 150.0));
	}

	#[test]
	fn limb_and_pole_land_on_the_rim() {
		let (x, y) = globe().project(GeoCoord::new(0.0, 90.0)).unwrap();
		assert!(close(x, 300.0) && close(y, 150.0));
		let (x, y) = globe().project(GeoCoord::new(90.0, 0.0)).unwrap();
		assert!(close(x, 200.0) && close(y, 50.0));
	}

	#[test]
	fn far_side_is_culled() {
		assert_eq!(globe().project(GeoCoord::new(0.0, 180.0)), None);
		assert_eq!(globe().project(GeoCoord::new(10.0, -120.0)), None);
	}

	#[test]
	fn great_circle_hits_endpoints_and_midpoint() {
		let path = great_circle(GeoCoord::new(0.0, 0.0), GeoCoord::new(0.0, 90.0), 8);
		assert_eq!(path.len(), 9);
		assert!(close(path[0].lat, 0.0) && close(path[0].lng, 0.0));
		assert!(close(path[8].lng, 90.0));
		assert!(close(path[4].lat, 0.0) && close(path[4].lng, 45.0));
	}

	#[test]
	fn great_circle_bulges_poleward() {
		let path = great_circle(GeoCoord::new(40.7, -74.0), GeoCoord::new(48.8, 2.3), 16);
		let peak = path.iter().map(|c| c.lat).fold(f64::MIN, f64::max);
		assert!(peak > 48.8);
	}

	#[test]
	fn coincident_endpoints_do_not_divide_by_zero() {
		let a = GeoCoord::new(10.0, 10.0);
		assert_eq!(great_circle(a, a, 8), vec![a, a]);
	}

	#[test]
	fn nearly_coincident_endpoints_skip_interpolation() {
		let a = GeoCoord::new(51.5, -0.1);
		let b = GeoCoord::new(51.5, -0.1 + 1e-9);
		assert_eq!(great_circle(a, b, 16), vec![a, b]);
	}

	#[test]
	fn antipodal_endpoints_route_over_the_pole() {
		let path = great_circle(GeoCoord::new(0.0, 0.0), GeoCoord::new(0.0, 180.0), 4);
		assert_eq!(path.len(), 5);
		assert!(close(path[0].lat, 0.0) && close(path[0].lng, 0.0));
		assert!(close(path[2].lat, 90.0));
		assert!(close(path[4].lat, 0.0) && close(path[4].lng.abs(), 180.0));
		assert!(path.iter().all(|c| c.lat.is_finite() && c.lng.is_finite()));

		let polar = great_circle(GeoCoord::new(90.0, 0.0), GeoCoord::new(-90.0, 0.0), 4);
		assert!(close(polar[2].lat, 0.0));
		assert!(polar.iter().all(|c| c.lat.is_finite()));
	}

	#[test]
	fn auto_rotation_pauses_while_dragging() {
		let mut camera = GlobeCamera::default();
		let start = camera.center.lng;
		camera.advance(1000.0);
		assert!(close(camera.center.lng, start + AUTO_ROTATE_DEG_PER_SEC));

		camera.drag_start(0.0, 0.0);
		let held = camera.center;
		camera.advance(1000.0);
		assert_eq!(camera.center, held);

		camera.drag_move(-40.0, 1_000.0);
		assert!(close(camera.center.lng, held.lng + 10.0));
		assert_eq!(camera.center.lat, MAX_TILT);
		camera.drag_end();
		assert!(!camera.is_dragging());
	}

	#[test]
	fn longitude_wraps() {
		let mut camera = GlobeCamera {
			center: GeoCoord::new(0.0, 179.0),
			..GlobeCamera::default()
		};
		camera.advance(1000.0);
		assert!(close(camera.center.lng, -175.0));
	}
}
