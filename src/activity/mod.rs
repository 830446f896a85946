//! Activity events and the boundary that fetches them.

mod client;
mod error;
mod feed;
mod types;

pub use client::ActivityClient;
pub use error::ApiError;
pub use feed::{
	ActivityFeed, FeedState, FeedView, PollAction, PollGate, spawn_into, use_activity_feed,
};
pub use types::{
	ActivityEvent, ActivityType, AgentKind, AgentRecord, Meta, MetaValue, StoreRecord,
};
