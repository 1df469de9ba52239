//! Declarative client configuration.

// self
use crate::{_prelude::*, error::ConfigError, telemetry::ClientInfo};

/// Serializable part of the client configuration.
///
/// Callables (token supplier, fetcher, DPoP provider) cannot be expressed in JSON and are
/// attached through [`MyAccountClientBuilder`](crate::client::MyAccountClientBuilder).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Tenant domain, with or without the `https://` prefix.
	pub domain: String,
	/// Explicit API base URL; overrides the one derived from `domain` verbatim.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub base_url: Option<String>,
	/// Headers sent with every request.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub headers: BTreeMap<String, String>,
	/// Sends the `Auth0-Client` header when true.
	#[serde(default = "default_telemetry")]
	pub telemetry: bool,
	/// Replaces the default client info; encoded exactly as given.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_info: Option<ClientInfo>,
	/// Per-request timeout applied by the default transport.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout_in_seconds: Option<u64>,
	/// Retry budget handed to the request executor; the dispatch layer never retries on its own.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_retries: Option<u32>,
}
impl ClientConfig {
	/// Creates a configuration for `domain` with every other field at its default.
	pub fn new(domain: impl Into<String>) -> Self {
		Self {
			domain: domain.into(),
			base_url: None,
			headers: BTreeMap::new(),
			telemetry: default_telemetry(),
			client_info: None,
			timeout_in_seconds: None,
			max_retries: None,
		}
	}

	/// Parses a JSON document; failures report the offending JSON path.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(raw);

		Ok(serde_path_to_error::deserialize(&mut deserializer)?)
	}

	/// Timeout as a [`std::time::Duration`], if configured.
	pub fn timeout(&self) -> Option<std::time::Duration> {
		self.timeout_in_seconds.map(std::time::Duration::from_secs)
	}
}

/// Strips a leading `https://` and a trailing `/` from `domain`.
pub fn sanitize_domain(domain: &str) -> &str {
	let domain = domain.trim();
	let domain = domain.strip_prefix("https://").unwrap_or(domain);

	domain.strip_suffix('/').unwrap_or(domain)
}

fn default_telemetry() -> bool {
	true
}
