//! Maps activities and agent locations onto globe points and aggregated arcs.

use std::collections::{BTreeSet, HashMap};

use crate::activity::{ActivityEvent, ActivityType, AgentKind};

use super::types::{GeoDirectory, GlobeArc, GlobeData, GlobePoint};

/// Stroke of an arc backed by a single event.
pub const ARC_BASE_STROKE: f64 = 0.5;
/// Extra stroke per repeated event.
pub const ARC_STROKE_STEP: f64 = 0.25;
/// Widest an arc gets.
pub const ARC_MAX_STROKE: f64 = 3.0;

const MERCHANT_SIZE: f64 = 0.6;
const CUSTOMER_SIZE: f64 = 0.4;
const SIZE_PER_ACTIVITY: f64 = 0.05;
const MAX_SIZE_BONUS: f64 = 0.6;

/// Fill colour of an agent point.
pub fn point_color(kind: AgentKind) -> &'static str {
	match kind {
		AgentKind::Merchant => "#f59e0b",
		AgentKind::Customer => "#38bdf8",
	}
}

/// Kind-dependent base size plus a capped bonus for activity.
pub fn point_size(kind: AgentKind, activity_count: u32) -> f64 {
	let base = match kind {
		AgentKind::Merchant => MERCHANT_SIZE,
		AgentKind::Customer => CUSTOMER_SIZE,
	};
	base + (f64::from(activity_count) * SIZE_PER_ACTIVITY).min(MAX_SIZE_BONUS)
}

/// Builds globe points for every located agent and one arc per (actor, owner, type).
///
/// Only activities whose type is in `enabled` count. An event bumps its actor's point and
/// its store owner's point (once if they are the same agent) whether or not it also
/// yields an arc.
pub fn build_globe(
	activities: &[ActivityEvent],
	directory: &GeoDirectory,
	enabled: &BTreeSet<ActivityType>,
) -> GlobeData {
	let mut points: Vec<GlobePoint> = directory
		.locations
		.iter()
		.map(|(id, loc)| GlobePoint {
			id: id.clone(),
			name: loc.name.clone(),
			kind: loc.kind,
			coord: loc.coord,
			city: loc.city.clone(),
			activity_count: 0,
			size: point_size(loc.kind, 0),
			color: point_color(loc.kind),
		})
		.collect();
	let point_index: HashMap<&str, usize> = directory
		.locations
		.keys()
		.enumerate()
		.map(|(i, id)| (id.as_str(), i))
		.collect();

	let mut arcs: Vec<GlobeArc> = Vec::new();
	let mut arc_index: HashMap<(&str, &str, ActivityType), usize> = HashMap::new();

	for event in activities.iter().filter(|e| enabled.contains(&e.kind)) {
		let actor = event.actor_id();
		let owner = event
			.store()
			.and_then(|store| directory.store_owners.get(store))
			.map(String::as_str);

		let actor_point = actor.and_then(|id| point_index.get(id).copied());
		let owner_point = owner.and_then(|id| point_index.get(id).copied());
		if let Some(i) = actor_point {
			points[i].activity_count += 1;
		}
		if let Some(i) = owner_point.filter(|&i| Some(i) != actor_point) {
			points[i].activity_count += 1;
		}

		let (Some(actor), Some(owner), Some(a), Some(o)) = (actor, owner, actor_point, owner_point) else {
			continue;
		};
		if a == o {
			continue;
		}
		match arc_index.get(&(actor, owner, event.kind)) {
			Some(&i) => {
				let arc = &mut arcs[i];
				arc.count += 1;
				arc.stroke = (arc.stroke + ARC_STROKE_STEP).min(ARC_MAX_STROKE);
			}
			None => {
				arc_index.insert((actor, owner, event.kind), arcs.len());
				arcs.push(GlobeArc {
					actor_id: actor.to_string(),
					owner_id: owner.to_string(),
					activity_type: event.kind,
					start: points[a].coord,
					end: points[o].coord,
					count: 1,
					stroke: ARC_BASE_STROKE,
					color: event.kind.color(),
				});
			}
		}
	}

	for point in &mut points {
		point.size = point_size(point.kind, point.activity_count);
	}
	GlobeData { points, arcs }
}

#[cfg(test)]
mod tests {
	use chrono::Utc;
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::components::globe::types::{AgentLocation, GeoCoord};

	fn directory() -> GeoDirectory {
		let located = |name: &str, kind, lat, lng| AgentLocation {
			name: name.into(),
			kind,
			coord: GeoCoord::new(lat, lng),
			city: None,
		};
		GeoDirectory {
			locations: [
				("c1".to_string(), located("Cleo", AgentKind::Customer, 48.8, 2.3)),
				("c2".to_string(), located("Cato", AgentKind::Customer, 35.7, 139.7)),
				("m1".to_string(), located("Mira", AgentKind::Merchant, 40.7, -74.0)),
			]
			.into_iter()
			.collect(),
			store_owners: [
				("s1".to_string(), "m1".to_string()),
				("s2".to_string(), "ghost".to_string()),
			]
			.into_iter()
			.collect(),
		}
	}

	fn activity(kind: ActivityType, actor: Option<&str>, store: Option<&str>) -> ActivityEvent {
		ActivityEvent {
			id: "e".into(),
			kind,
			actor_agent_id: actor.map(Into::into),
			actor_name: None,
			actor_display_name: None,
			store_id: store.map(Into::into),
			created_at: Utc::now(),
			meta: Default::default(),
		}
	}

	fn all_types() -> BTreeSet<ActivityType> {
		ActivityType::ALL.into_iter().collect()
	}

	fn count(data: &GlobeData, id: &str) -> u32 {
		data.points.iter().find(|p| p.id == id).unwrap().activity_count
	}

	#[test]
	fn every_located_agent_gets_a_point() {
		let data = build_globe(&[], &directory(), &all_types());
		assert_eq!(data.points.len(), 3);
		assert!(data.arcs.is_empty());
		assert!(data.points.iter().all(|p| p.activity_count == 0));
		let merchant = data.points.iter().find(|p| p.id == "m1").unwrap();
		assert_eq!(merchant.size, MERCHANT_SIZE);
		assert_eq!(merchant.color, point_color(AgentKind::Merchant));
	}

	#[test]
	fn repeated_pairs_thicken_one_arc() {
		let order = activity(ActivityType::OrderPlaced, Some("c1"), Some("s1"));
		let once = build_globe(std::slice::from_ref(&order), &directory(), &all_types());
		let twice = build_globe(&[order.clone(), order.clone()], &directory(), &all_types());
		assert_eq!(once.arcs.len(), 1);
		assert_eq!(twice.arcs.len(), 1);
		assert!(twice.arcs[0].stroke > once.arcs[0].stroke);
		assert_eq!(twice.arcs[0].count, 2);
		assert_eq!(twice.arcs[0].start, GeoCoord::new(48.8, 2.3));
		assert_eq!(twice.arcs[0].end, GeoCoord::new(40.7, -74.0));

		let many = build_globe(&vec![order; 50], &directory(), &all_types());
		assert_eq!(many.arcs.len(), 1);
		assert_eq!(many.arcs[0].stroke, ARC_MAX_STROKE);
		assert_eq!(many.arcs[0].count, 50);
	}

	#[test]
	fn arcs_are_split_by_type_and_actor() {
		let data = build_globe(
			&[
				activity(ActivityType::OrderPlaced, Some("c1"), Some("s1")),
				activity(ActivityType::ReviewPosted, Some("c1"), Some("s1")),
				activity(ActivityType::OrderPlaced, Some("c2"), Some("s1")),
			],
			&directory(),
			&all_types(),
		);
		assert_eq!(data.arcs.len(), 3);
		assert_eq!(count(&data, "m1"), 3);
		assert_eq!(count(&data, "c1"), 2);
	}

	#[test]
	fn counts_do_not_depend_on_arc_eligibility() {
		let data = build_globe(
			&[
				// owner unknown to the directory
				activity(ActivityType::OrderPlaced, Some("c1"), Some("s2")),
				// store without owner mapping
				activity(ActivityType::OrderPlaced, Some("c1"), Some("s404")),
				// no actor
				activity(ActivityType::OrderPlaced, None, Some("s1")),
				// merchant buying from own store
				activity(ActivityType::OrderPlaced, Some("m1"), Some("s1")),
			],
			&directory(),
			&all_types(),
		);
		assert!(data.arcs.is_empty());
		assert_eq!(count(&data, "c1"), 2);
		assert_eq!(count(&data, "m1"), 2);
	}

	#[test]
	fn disabled_types_are_ignored() {
		let enabled = BTreeSet::from([ActivityType::ReviewPosted]);
		let data = build_globe(
			&[activity(ActivityType::OrderPlaced, Some("c1"), Some("s1"))],
			&directory(),
			&enabled,
		);
		assert!(data.arcs.is_empty());
		assert_eq!(count(&data, "c1"), 0);
	}

	#[test]
	fn point_size_is_capped() {
		assert!(point_size(AgentKind::Customer, 3) > point_size(AgentKind::Customer, 0));
		assert_eq!(
			point_size(AgentKind::Customer, 1_000),
			CUSTOMER_SIZE + MAX_SIZE_BONUS
		);
		assert!(point_size(AgentKind::Merchant, 0) > point_size(AgentKind::Customer, 0));
	}
}
