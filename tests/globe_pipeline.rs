use std::collections::BTreeSet;

use activity_network::activity::{ActivityEvent, ActivityType, AgentRecord, StoreRecord};
use activity_network::components::globe::transform::ARC_MAX_STROKE;
use activity_network::components::globe::{GeoDirectory, build_globe};
use pretty_assertions::assert_eq;

fn directory() -> GeoDirectory {
	let agents: Vec<AgentRecord> = serde_json::from_str(
		r#"[
			{"id": "c1", "display_name": "Cleo", "agent_type": "customer", "latitude": 48.8, "longitude": 2.3, "city": "Paris"},
			{"id": "m1", "name": "mira", "agent_type": "merchant", "latitude": 40.7, "longitude": -74.0},
			{"id": "nowhere", "agent_type": "customer"}
		]"#,
	)
	.unwrap();
	let stores: Vec<StoreRecord> =
		serde_json::from_str(r#"[{"id": "s1", "name": "Bakery", "owner_agent_id": "m1"}]"#).unwrap();
	GeoDirectory::from_records(&agents, &stores)
}

fn orders(n: usize) -> Vec<ActivityEvent> {
	(0..n)
		.map(|i| {
			serde_json::from_value(serde_json::json!({
				"id": format!("a{i}"),
				"type": "ORDER_PLACED",
				"actor_agent_id": "c1",
				"store_id": "s1",
				"created_at": "2024-01-01T00:00:00Z",
			}))
			.unwrap()
		})
		.collect()
}

#[test]
fn repeated_orders_aggregate_into_one_capped_arc() {
	let enabled: BTreeSet<_> = ActivityType::ALL.into_iter().collect();
	let geo = directory();
	assert_eq!(geo.locations.len(), 2);

	let one = build_globe(&orders(1), &geo, &enabled);
	let two = build_globe(&orders(2), &geo, &enabled);
	let fifty = build_globe(&orders(50), &geo, &enabled);

	assert_eq!(one.arcs.len(), 1);
	assert_eq!(two.arcs.len(), 1);
	assert!(two.arcs[0].stroke > one.arcs[0].stroke);
	assert_eq!(fifty.arcs.len(), 1);
	assert_eq!(fifty.arcs[0].stroke, ARC_MAX_STROKE);

	let merchant = fifty.points.iter().find(|p| p.id == "m1").unwrap();
	let customer = fifty.points.iter().find(|p| p.id == "c1").unwrap();
	assert_eq!(merchant.activity_count, 50);
	assert_eq!(customer.activity_count, 50);
	assert_eq!(customer.city.as_deref(), Some("Paris"));
}
