//! Access token wrapper that redacts sensitive material.

// self
use crate::_prelude::*;

/// Redacted access token keeping credentials out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);
impl BearerToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns true if the token string is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Formats the `Authorization` header value for the given scheme (`Bearer` or `DPoP`).
	pub fn authorization(&self, scheme: &str) -> String {
		format!("{scheme} {}", self.0)
	}
}
impl From<String> for BearerToken {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for BearerToken {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl AsRef<str> for BearerToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
