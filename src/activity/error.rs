use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures at the ingestion boundary. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
	/// The request was aborted after the configured timeout.
	#[error("request timed out after {ms} ms")]
	Timeout {
		/// Timeout that elapsed.
		ms: u32,
	},
	/// The browser reported a transport failure.
	#[error("network error: {0}")]
	Network(String),
	/// The server answered with a non-success status.
	#[error("server responded with {status} for {url}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Requested URL.
		url: String,
	},
	/// The body was not the JSON shape we expected.
	#[error("could not decode response: {0}")]
	Decode(String),
	/// There is no `window` (not running in a browser).
	#[error("browser window is not available")]
	NoWindow,
}

impl From<JsValue> for ApiError {
	fn from(value: JsValue) -> Self {
		let message = value
			.as_string()
			.or_else(|| {
				js_sys::Reflect::get(&value, &JsValue::from_str("message"))
					.ok()
					.and_then(|m| m.as_string())
			})
			.unwrap_or_else(|| format!("{value:?}"));
		ApiError::Network(message)
	}
}

impl From<serde_json::Error> for ApiError {
	fn from(err: serde_json::Error) -> Self {
		ApiError::Decode(err.to_string())
	}
}
