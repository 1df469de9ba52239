//! Per-origin cache of server-issued DPoP nonces.

// self
use crate::_prelude::*;

type NonceMap = Arc<RwLock<HashMap<String, String>>>;

/// Thread-safe map from origin (`scheme://host[:port]`) to the latest nonce the server issued.
///
/// Each client owns its own cache, so two clients in one process never observe each other's
/// nonces. Clones share the same storage. Concurrent writers race with last-writer-wins
/// semantics.
#[derive(Clone, Debug, Default)]
pub struct NonceCache(NonceMap);
impl NonceCache {
	/// Returns the cached nonce for `origin`, if any.
	pub fn get(&self, origin: &str) -> Option<String> {
		self.0.read().get(origin).cloned()
	}

	/// Stores `nonce` for `origin`, returning the previous value.
	pub fn set(&self, origin: impl Into<String>, nonce: impl Into<String>) -> Option<String> {
		self.0.write().insert(origin.into(), nonce.into())
	}

	/// Forgets the nonce for `origin`.
	pub fn remove(&self, origin: &str) -> Option<String> {
		self.0.write().remove(origin)
	}

	/// Number of origins with a cached nonce.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when no nonce has been cached yet.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
