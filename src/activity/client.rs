use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortSignal, Request, RequestInit, Response};

use super::error::ApiError;
use super::types::{ActivityEvent, AgentRecord, StoreRecord};
use crate::config::AppConfig;

/// Thin JSON client for the few backend endpoints the views read.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityClient {
	base_url: String,
	timeout_ms: u32,
}

impl ActivityClient {
	/// Client pointed at the configured backend.
	pub fn new(config: &AppConfig) -> Self {
		Self {
			base_url: config.api_base_url.clone(),
			timeout_ms: config.request_timeout_ms,
		}
	}

	/// URL of the activity list endpoint.
	pub fn activity_url(&self, limit: u32) -> String {
		format!("{}/activity?limit={}", self.base_url, limit)
	}

	/// URL of the agent directory endpoint.
	pub fn agents_url(&self) -> String {
		format!("{}/agents", self.base_url)
	}

	/// URL of the store directory endpoint.
	pub fn stores_url(&self) -> String {
		format!("{}/stores", self.base_url)
	}

	/// Most recent activities, at most `limit` of them.
	pub async fn fetch_activity(&self, limit: u32) -> Result<Vec<ActivityEvent>, ApiError> {
		self.get_json(&self.activity_url(limit)).await
	}

	/// All agents with their profile and location.
	pub async fn fetch_agents(&self) -> Result<Vec<AgentRecord>, ApiError> {
		self.get_json(&self.agents_url()).await
	}

	/// All stores with their owners.
	pub async fn fetch_stores(&self) -> Result<Vec<StoreRecord>, ApiError> {
		self.get_json(&self.stores_url()).await
	}

	/// A rejected fetch or body read is a timeout once the abort signal has fired.
	fn rejection(&self, aborted: bool, err: impl Into<ApiError>) -> ApiError {
		if aborted {
			ApiError::Timeout {
				ms: self.timeout_ms,
			}
		} else {
			err.into()
		}
	}

	async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
		let window = web_sys::window().ok_or(ApiError::NoWindow)?;
		let signal = AbortSignal::timeout_with_u32(self.timeout_ms);

		let init = RequestInit::new();
		init.set_method("GET");
		init.set_signal(Some(&signal));
		let request = Request::new_with_str_and_init(url, &init)?;
		request.headers().set("Accept", "application/json")?;

		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(|err| self.rejection(signal.aborted(), err))?
			.dyn_into()?;

		if !response.ok() {
			return Err(ApiError::Status {
				status: response.status(),
				url: url.to_string(),
			});
		}

		let body = JsFuture::from(response.text()?)
			.await
			.map_err(|err| self.rejection(signal.aborted(), err))?;
		let text = body
			.as_string()
			.ok_or_else(|| ApiError::Decode("response body is not text".into()))?;
		Ok(serde_json::from_str(&text)?)
	}
}
