//! Runtime configuration shared through Leptos context.

use serde::{Deserialize, Serialize};

const DEFAULT_API_URL: &str = "/api";

/// Settings for talking to the marketplace backend and pacing the views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// Base URL of the REST backend, without trailing slash.
	pub api_base_url: String,
	/// Max activities requested per fetch.
	pub activity_limit: u32,
	/// Interval between activity polls while the tab is visible.
	pub poll_interval_ms: u32,
	/// Requests taking longer than this are aborted.
	pub request_timeout_ms: u32,
	/// How long a newly arrived edge stays highlighted.
	pub fresh_edge_ms: f64,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			api_base_url: option_env!("ACTIVITY_API_URL")
				.unwrap_or(DEFAULT_API_URL)
				.trim_end_matches('/')
				.to_string(),
			activity_limit: 100,
			poll_interval_ms: 10_000,
			request_timeout_ms: 15_000,
			fresh_edge_ms: 2_500.0,
		}
	}
}

impl AppConfig {
	/// Options for a view that keeps refreshing.
	pub fn polling_feed(&self) -> FeedOptions {
		FeedOptions {
			limit: self.activity_limit,
			enable_polling: true,
		}
	}

	/// Options for a view that loads once (the globe re-triangulates on every update).
	pub fn static_feed(&self) -> FeedOptions {
		FeedOptions {
			limit: self.activity_limit,
			enable_polling: false,
		}
	}
}

/// Per-view fetch options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedOptions {
	/// Max activities requested per fetch.
	pub limit: u32,
	/// Whether to re-fetch on an interval.
	pub enable_polling: bool,
}
