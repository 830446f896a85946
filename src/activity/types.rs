use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kinds of marketplace activity the backend reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
	/// A merchant published a new listing.
	ListingCreated,
	/// A merchant edited a listing.
	ListingUpdated,
	/// A customer placed an order.
	OrderPlaced,
	/// A merchant fulfilled an order.
	OrderFulfilled,
	/// A customer made an offer on a listing.
	OfferMade,
	/// An offer was accepted.
	OfferAccepted,
	/// An offer was rejected.
	OfferRejected,
	/// A customer reviewed a store.
	ReviewPosted,
	/// A merchant opened a store.
	StoreCreated,
	/// Anything the backend sends that this client does not know about.
	#[serde(other)]
	Other,
}

impl ActivityType {
	/// Every kind, in display order.
	pub const ALL: [ActivityType; 10] = [
		ActivityType::OrderPlaced,
		ActivityType::OrderFulfilled,
		ActivityType::OfferMade,
		ActivityType::OfferAccepted,
		ActivityType::OfferRejected,
		ActivityType::ReviewPosted,
		ActivityType::ListingCreated,
		ActivityType::ListingUpdated,
		ActivityType::StoreCreated,
		ActivityType::Other,
	];

	/// Human readable name for filter chips and legends.
	pub fn label(self) -> &'static str {
		match self {
			ActivityType::ListingCreated => "Listing created",
			ActivityType::ListingUpdated => "Listing updated",
			ActivityType::OrderPlaced => "Order placed",
			ActivityType::OrderFulfilled => "Order fulfilled",
			ActivityType::OfferMade => "Offer made",
			ActivityType::OfferAccepted => "Offer accepted",
			ActivityType::OfferRejected => "Offer rejected",
			ActivityType::ReviewPosted => "Review posted",
			ActivityType::StoreCreated => "Store created",
			ActivityType::Other => "Other",
		}
	}

	/// Stroke colour used for edges and arcs of this kind.
	pub fn color(self) -> &'static str {
		match self {
			ActivityType::ListingCreated => "#2ca02c",
			ActivityType::ListingUpdated => "#98df8a",
			ActivityType::OrderPlaced => "#1f77b4",
			ActivityType::OrderFulfilled => "#17becf",
			ActivityType::OfferMade => "#ff7f0e",
			ActivityType::OfferAccepted => "#bcbd22",
			ActivityType::OfferRejected => "#d62728",
			ActivityType::ReviewPosted => "#9467bd",
			ActivityType::StoreCreated => "#e377c2",
			ActivityType::Other => "#7f7f7f",
		}
	}
}

impl fmt::Display for ActivityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// A scalar value inside an event's `meta` bag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
	/// JSON boolean.
	Bool(bool),
	/// JSON number.
	Number(f64),
	/// JSON string.
	Text(String),
	/// JSON null, or any nested structure this client does not read.
	Other(serde_json::Value),
}

impl MetaValue {
	/// The string payload, if this value is text.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			MetaValue::Text(s) => Some(s),
			_ => None,
		}
	}
}

/// Open key/value metadata attached to an event.
pub type Meta = BTreeMap<String, MetaValue>;

/// One marketplace action linking an acting agent to a store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
	/// Backend id of the event.
	pub id: String,
	/// What happened.
	#[serde(rename = "type")]
	pub kind: ActivityType,
	/// Agent who performed the action.
	#[serde(default)]
	pub actor_agent_id: Option<String>,
	/// Account name of the actor.
	#[serde(default)]
	pub actor_name: Option<String>,
	/// Display name of the actor.
	#[serde(default)]
	pub actor_display_name: Option<String>,
	/// Store the action touched.
	#[serde(default)]
	pub store_id: Option<String>,
	/// When the action happened.
	pub created_at: DateTime<Utc>,
	/// Free-form metadata, e.g. `store_name`.
	#[serde(default)]
	pub meta: Meta,
}

impl ActivityEvent {
	/// Actor id, treating empty strings as missing.
	pub fn actor_id(&self) -> Option<&str> {
		self.actor_agent_id.as_deref().filter(|id| !id.is_empty())
	}

	/// Store id, treating empty strings as missing.
	pub fn store(&self) -> Option<&str> {
		self.store_id.as_deref().filter(|id| !id.is_empty())
	}

	/// Best available name for the actor.
	pub fn actor_label(&self) -> Option<&str> {
		[self.actor_display_name.as_deref(), self.actor_name.as_deref()]
			.into_iter()
			.flatten()
			.find(|name| !name.trim().is_empty())
	}

	/// `meta.store_name` when it is a non-empty string.
	pub fn store_name(&self) -> Option<&str> {
		self.meta
			.get("store_name")
			.and_then(MetaValue::as_str)
			.filter(|name| !name.trim().is_empty())
	}
}

/// Whether an agent sells or buys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
	/// Owns one or more stores.
	Merchant,
	/// Buys from stores.
	#[serde(other)]
	Customer,
}

/// Agent profile as returned by the agents endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
	/// Agent id.
	pub id: String,
	/// Account name.
	#[serde(default)]
	pub name: Option<String>,
	/// Display name.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Merchant or customer.
	pub agent_type: AgentKind,
	/// Latitude in degrees.
	#[serde(default)]
	pub latitude: Option<f64>,
	/// Longitude in degrees.
	#[serde(default)]
	pub longitude: Option<f64>,
	/// City name, if known.
	#[serde(default)]
	pub city: Option<String>,
}

/// Store summary as returned by the stores endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreRecord {
	/// Store id.
	pub id: String,
	/// Store name.
	#[serde(default)]
	pub name: Option<String>,
	/// Merchant agent owning the store.
	#[serde(default)]
	pub owner_agent_id: Option<String>,
}
