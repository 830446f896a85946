//! Geo lookups and the point/arc model drawn on the globe.

use std::collections::BTreeMap;

use crate::activity::{ActivityType, AgentKind, AgentRecord, StoreRecord};

/// Latitude/longitude in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoCoord {
	/// Degrees north.
	pub lat: f64,
	/// Degrees east.
	pub lng: f64,
}

impl GeoCoord {
	/// Coordinate from latitude and longitude.
	pub fn new(lat: f64, lng: f64) -> Self {
		Self { lat, lng }
	}
}

/// Where an agent lives and how to show it.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentLocation {
	/// Display name, falling back to the agent id.
	pub name: String,
	/// Merchant or customer.
	pub kind: AgentKind,
	/// Home coordinates.
	pub coord: GeoCoord,
	/// City shown next to the name, when known.
	pub city: Option<String>,
}

/// Lookups the geo view needs besides the activity stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoDirectory {
	/// Agents with known coordinates, by agent id.
	pub locations: BTreeMap<String, AgentLocation>,
	/// Owning merchant agent id, by store id.
	pub store_owners: BTreeMap<String, String>,
}

impl GeoDirectory {
	/// Agents without both coordinates and stores without an owner are left out.
	pub fn from_records(agents: &[AgentRecord], stores: &[StoreRecord]) -> Self {
		let locations = agents
			.iter()
			.filter_map(|agent| {
				let (lat, lng) = (agent.latitude?, agent.longitude?);
				let name = [agent.display_name.as_deref(), agent.name.as_deref()]
					.into_iter()
					.flatten()
					.find(|n| !n.trim().is_empty())
					.unwrap_or(&agent.id)
					.to_string();
				Some((
					agent.id.clone(),
					AgentLocation {
						name,
						kind: agent.agent_type,
						coord: GeoCoord::new(lat, lng),
						city: agent.city.clone(),
					},
				))
			})
			.collect();
		let store_owners = stores
			.iter()
			.filter_map(|store| {
				let owner = store.owner_agent_id.as_deref().filter(|o| !o.is_empty())?;
				Some((store.id.clone(), owner.to_string()))
			})
			.collect();
		Self {
			locations,
			store_owners,
		}
	}
}

/// One agent on the globe.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobePoint {
	/// Agent id.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Merchant or customer.
	pub kind: AgentKind,
	/// Where the point sits.
	pub coord: GeoCoord,
	/// City, when known.
	pub city: Option<String>,
	/// Enabled activities this agent took part in, as actor or store owner.
	pub activity_count: u32,
	/// Relative marker size; the renderer picks the unit.
	pub size: f64,
	/// Fill colour, fixed by kind.
	pub color: &'static str,
}

/// Aggregated relationship between an actor and a store owner for one activity type.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobeArc {
	/// Agent that acted.
	pub actor_id: String,
	/// Merchant owning the store acted on.
	pub owner_id: String,
	/// Kind of activity folded into this arc.
	pub activity_type: ActivityType,
	/// Actor location.
	pub start: GeoCoord,
	/// Owner location.
	pub end: GeoCoord,
	/// Events folded into this arc.
	pub count: u32,
	/// Line width, grows with `count` up to a cap.
	pub stroke: f64,
	/// Line colour of the activity type.
	pub color: &'static str,
}

/// Everything the globe draws for one batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobeData {
	/// One point per located agent.
	pub points: Vec<GlobePoint>,
	/// One arc per (actor, owner, activity type).
	pub arcs: Vec<GlobeArc>,
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn agent(id: &str, lat: Option<f64>, lng: Option<f64>) -> AgentRecord {
		AgentRecord {
			id: id.into(),
			name: Some(format!("{id}-name")),
			display_name: None,
			agent_type: AgentKind::Merchant,
			latitude: lat,
			longitude: lng,
			city: Some("Lisbon".into()),
		}
	}

	#[test]
	fn agents_without_coordinates_are_skipped() {
		let agents = vec![
			agent("m1", Some(38.7), Some(-9.1)),
			agent("m2", None, Some(2.0)),
			agent("m3", Some(1.0), None),
		];
		let directory = GeoDirectory::from_records(&agents, &[]);
		assert_eq!(directory.locations.len(), 1);
		let m1 = &directory.locations["m1"];
		assert_eq!(m1.name, "m1-name");
		assert_eq!(m1.coord, GeoCoord::new(38.7, -9.1));
	}

	#[test]
	fn stores_map_to_their_owner() {
		let stores = vec![
			StoreRecord {
				id: "s1".into(),
				name: Some("Bakery".into()),
				owner_agent_id: Some("m1".into()),
			},
			StoreRecord {
				id: "s2".into(),
				name: None,
				owner_agent_id: None,
			},
		];
		let directory = GeoDirectory::from_records(&[], &stores);
		assert_eq!(
			directory.store_owners,
			BTreeMap::from([("s1".to_string(), "m1".to_string())])
		);
	}
}
