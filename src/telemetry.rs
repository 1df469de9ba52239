//! Client identification header sent with every request unless telemetry is disabled.

// self
use crate::{
	_prelude::*,
	encoding,
	error::ConfigError,
	http::{HeaderMap, HeaderName, HeaderValue},
};

/// Header carrying the base64url-encoded [`ClientInfo`] document.
pub const CLIENT_HEADER: &str = "auth0-client";

/// Name reported when the caller does not override [`ClientInfo`].
pub const DEFAULT_CLIENT_NAME: &str = "myaccount-rs";

/// Identification document describing the SDK and its runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
	/// SDK or application name.
	pub name: String,
	/// SDK or application version.
	pub version: String,
	/// Runtime environment, keyed by runtime name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub env: Option<BTreeMap<String, String>>,
}
impl ClientInfo {
	/// Creates client info with a custom name and version and no runtime section.
	pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
		Self { name: name.into(), version: version.into(), env: None }
	}

	/// Describes this crate and the Rust toolchain it targets.
	pub fn generate() -> Self {
		Self {
			name: DEFAULT_CLIENT_NAME.into(),
			version: env!("CARGO_PKG_VERSION").into(),
			env: Some(runtime_env()),
		}
	}
}
impl Default for ClientInfo {
	fn default() -> Self {
		Self::generate()
	}
}

/// Precomputed telemetry header.
#[derive(Clone, Debug)]
pub struct ClientTelemetry {
	client_info: ClientInfo,
	header_value: HeaderValue,
}
impl ClientTelemetry {
	/// Encodes `client_info` once so every request reuses the same header value.
	pub fn new(client_info: ClientInfo) -> Result<Self, ConfigError> {
		let invalid = || ConfigError::InvalidHeader { name: CLIENT_HEADER.to_owned() };
		let encoded = encoding::encode_json(&client_info).map_err(|_| invalid())?;
		let header_value = HeaderValue::from_str(&encoded).map_err(|_| invalid())?;

		Ok(Self { client_info, header_value })
	}

	/// Returns the client info this telemetry reports.
	pub fn client_info(&self) -> &ClientInfo {
		&self.client_info
	}

	/// Returns the encoded header value.
	pub fn header_value(&self) -> &HeaderValue {
		&self.header_value
	}

	/// Returns `headers` with the telemetry header written last.
	pub fn apply(&self, headers: &HeaderMap) -> HeaderMap {
		let mut merged = headers.clone();

		merged.insert(HeaderName::from_static(CLIENT_HEADER), self.header_value.clone());

		merged
	}
}

fn runtime_env() -> BTreeMap<String, String> {
	let version = env!("CARGO_PKG_RUST_VERSION");
	let version = if version.is_empty() { "unknown" } else { version };

	BTreeMap::from([("rust".to_owned(), version.to_owned())])
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use super::*;

	#[test]
	fn generated_info_names_sdk_and_runtime() {
		let info = ClientInfo::generate();

		assert_eq!(info.name, DEFAULT_CLIENT_NAME);
		assert_eq!(info.version, env!("CARGO_PKG_VERSION"));

		let env = info.env.expect("Generated info should describe the runtime.");

		assert_eq!(env.len(), 1);
		assert!(env.get("rust").is_some_and(|version| !version.is_empty()));
	}

	#[test]
	fn header_value_decodes_to_client_info() {
		let info = ClientInfo::new("my-custom-app", "2.0.0");
		let telemetry = ClientTelemetry::new(info.clone()).expect("Telemetry should encode.");
		let raw = URL_SAFE_NO_PAD
			.decode(telemetry.header_value().as_bytes())
			.expect("Header should be base64url.");
		let decoded: ClientInfo = serde_json::from_slice(&raw).expect("Header should be JSON.");

		assert_eq!(decoded, info);
	}

	#[test]
	fn telemetry_overwrites_same_named_caller_header() {
		let telemetry =
			ClientTelemetry::new(ClientInfo::generate()).expect("Telemetry should encode.");
		let mut headers = HeaderMap::new();

		headers.insert("x-custom-header", HeaderValue::from_static("custom-value"));
		headers.insert(CLIENT_HEADER, HeaderValue::from_static("caller-value"));

		let merged = telemetry.apply(&headers);

		assert_eq!(merged["x-custom-header"], "custom-value");
		assert_eq!(&merged[CLIENT_HEADER], telemetry.header_value());
	}
}
