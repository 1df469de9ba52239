//! Transport-neutral request and response records.
//!
//! [`RequestInit`] mirrors the fields a fetch-like transport needs (method, headers, body,
//! credentials policy, cancellation). The dispatch pipeline only adds authentication headers;
//! everything else reaches the transport exactly as the caller built it.

pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
pub use tokio_util::sync::CancellationToken;

// self
use crate::{_prelude::*, error::ConfigError};

/// Response returned by transports: status, headers, and the fully buffered body.
pub type HttpResponse = ::http::Response<Vec<u8>>;

/// Credentials policy forwarded to transports that distinguish cookie handling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
	/// Never send ambient credentials.
	Omit,
	/// Send ambient credentials to the same origin only.
	#[default]
	SameOrigin,
	/// Always send ambient credentials.
	Include,
}
impl Credentials {
	/// Returns the fetch-style label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Credentials::Omit => "omit",
			Credentials::SameOrigin => "same-origin",
			Credentials::Include => "include",
		}
	}
}

/// Generic request-init record handed to every transport.
#[derive(Clone, Debug, Default)]
pub struct RequestInit {
	/// HTTP method.
	pub method: Method,
	/// Request headers.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	/// Credentials policy.
	pub credentials: Credentials,
	/// Cancellation signal observed by the transport.
	pub signal: Option<CancellationToken>,
}
impl RequestInit {
	/// Creates an empty request for the given method.
	pub fn new(method: Method) -> Self {
		Self { method, ..Default::default() }
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, ConfigError> {
		let (name, value) = parse_header(name, value)?;

		self.headers.insert(name, value);

		Ok(self)
	}

	/// Sets a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `value` as the JSON body and sets `content-type`.
	pub fn with_json<T>(mut self, value: &T) -> Result<Self, serde_json::Error>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(value)?);
		self.headers
			.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Overrides the credentials policy.
	pub fn with_credentials(mut self, credentials: Credentials) -> Self {
		self.credentials = credentials;

		self
	}

	/// Attaches a cancellation signal.
	pub fn with_signal(mut self, signal: CancellationToken) -> Self {
		self.signal = Some(signal);

		self
	}

	/// Returns true once the attached signal has fired.
	pub fn is_aborted(&self) -> bool {
		self.signal.as_ref().is_some_and(CancellationToken::is_cancelled)
	}
}

/// Parses a caller-supplied header pair.
pub fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
	let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
	let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
	let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

	Ok((header_name, header_value))
}

/// Converts a string map into a [`HeaderMap`], validating every entry.
pub fn header_map<'a, I>(headers: I) -> Result<HeaderMap, ConfigError>
where
	I: IntoIterator<Item = (&'a String, &'a String)>,
{
	let mut map = HeaderMap::new();

	for (name, value) in headers {
		let (name, value) = parse_header(name, value)?;

		map.insert(name, value);
	}

	Ok(map)
}

/// Returns `base` with every header in `overlay` written on top (last write wins).
pub fn overlay_headers(base: &HeaderMap, overlay: &HeaderMap) -> HeaderMap {
	let mut merged = base.clone();

	for name in overlay.keys() {
		merged.remove(name);

		for value in overlay.get_all(name) {
			merged.append(name.clone(), value.clone());
		}
	}

	merged
}
