//! Unpadded base64url helpers shared by telemetry and DPoP proofs.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Encodes raw bytes as base64url without padding.
pub fn encode_bytes(bytes: impl AsRef<[u8]>) -> String {
	URL_SAFE_NO_PAD.encode(bytes)
}

/// Encodes the UTF-8 bytes of `value` as base64url without padding.
pub fn encode(value: &str) -> String {
	encode_bytes(value.as_bytes())
}

/// Serializes `value` to compact JSON and encodes it as base64url without padding.
pub fn encode_json<T>(value: &T) -> Result<String, serde_json::Error>
where
	T: ?Sized + Serialize,
{
	Ok(encode_bytes(serde_json::to_vec(value)?))
}
