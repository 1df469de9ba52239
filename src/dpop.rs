//! DPoP (RFC 9449) proof-of-possession for outgoing requests.
//!
//! A [`DpopSigner`] asks the caller's [`DpopProvider`] for the current key pair and the cached
//! nonce of the request's origin, signs a fresh proof per request, and feeds server-issued
//! nonces back into the provider after every response.
//!
//! # Nonce Negotiation
//!
//! - The first request to an origin carries no `nonce` claim.
//! - Any response with a `DPoP-Nonce` header updates the provider's nonce for that origin.
//! - A response that rejects the nonce (see [`is_nonce_challenge`]) is retried exactly once with a
//!   new proof; a second rejection is surfaced as [`Error::NonceRejected`].

pub mod key;
pub mod nonce;
pub mod proof;

pub use key::*;
pub use nonce::*;
pub use proof::*;

// self
use crate::{
	_prelude::*,
	auth::BearerToken,
	error::SigningError,
	http::{HeaderValue, HttpResponse, Method, StatusCode, header::WWW_AUTHENTICATE},
};

/// Request header carrying the proof.
pub const DPOP_HEADER: &str = "dpop";
/// Response header carrying a server-issued nonce.
pub const DPOP_NONCE_HEADER: &str = "dpop-nonce";
/// OAuth error code signalling a missing or stale nonce.
pub const USE_DPOP_NONCE: &str = "use_dpop_nonce";
/// Authorization scheme for DPoP-bound tokens.
pub const DPOP_SCHEME: &str = "DPoP";

/// Boxed future returned by [`DpopProvider`] methods.
pub type DpopFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BoxError>> + 'a + Send>>;

/// Caller-supplied capability holding the key pair and nonce storage.
pub trait DpopProvider
where
	Self: Send + Sync,
{
	/// Returns the latest nonce for `origin`, if one was issued.
	fn get_nonce<'a>(&'a self, origin: &'a str) -> DpopFuture<'a, Option<String>>;

	/// Records a nonce issued by `origin`.
	fn set_nonce<'a>(&'a self, origin: &'a str, nonce: String) -> DpopFuture<'a, ()>;

	/// Returns the key pair to sign with, or `None` when no key is available.
	fn get_private_key_pair(&self) -> DpopFuture<'_, Option<DpopKeyPair>>;
}

/// In-process [`DpopProvider`] pairing a caller-owned key with a [`NonceCache`].
#[derive(Clone, Debug, Default)]
pub struct MemoryDpopProvider {
	key_pair: Option<DpopKeyPair>,
	nonces: NonceCache,
}
impl MemoryDpopProvider {
	/// Creates a provider that signs with `key_pair` and starts with an empty nonce cache.
	pub fn new(key_pair: DpopKeyPair) -> Self {
		Self { key_pair: Some(key_pair), nonces: NonceCache::default() }
	}

	/// Shares an existing nonce cache instead of the provider's own.
	pub fn with_nonce_cache(mut self, nonces: NonceCache) -> Self {
		self.nonces = nonces;

		self
	}

	/// Nonce cache backing this provider.
	pub fn nonces(&self) -> &NonceCache {
		&self.nonces
	}
}
impl DpopProvider for MemoryDpopProvider {
	fn get_nonce<'a>(&'a self, origin: &'a str) -> DpopFuture<'a, Option<String>> {
		let nonce = self.nonces.get(origin);

		Box::pin(async move { Ok(nonce) })
	}

	fn set_nonce<'a>(&'a self, origin: &'a str, nonce: String) -> DpopFuture<'a, ()> {
		self.nonces.set(origin, nonce);

		Box::pin(async { Ok(()) })
	}

	fn get_private_key_pair(&self) -> DpopFuture<'_, Option<DpopKeyPair>> {
		let key_pair = self.key_pair.clone();

		Box::pin(async move { Ok(key_pair) })
	}
}

/// Builds proofs and tracks nonces through a [`DpopProvider`].
#[derive(Clone)]
pub struct DpopSigner {
	provider: Arc<dyn DpopProvider>,
}
impl DpopSigner {
	/// Wraps the caller's provider.
	pub fn new(provider: Arc<dyn DpopProvider>) -> Self {
		Self { provider }
	}

	/// Signs a proof for `method` + `url`, bound to `token` when one is attached.
	///
	/// Reads the cached nonce for the URL's origin; the claim is omitted when none is cached.
	pub async fn sign(
		&self,
		method: &Method,
		url: &Url,
		token: Option<&BearerToken>,
	) -> Result<HeaderValue, SigningError> {
		let origin = origin_of(url);
		let nonce = self.provider.get_nonce(&origin).await.map_err(SigningError::provider)?;
		let key_pair = self
			.provider
			.get_private_key_pair()
			.await
			.map_err(SigningError::provider)?
			.ok_or(SigningError::MissingKeyPair)?;
		let mut claims = DpopClaims::new(method, url, nonce);

		if let Some(token) = token {
			claims = claims.with_access_token(token);
		}

		let proof = sign_proof(&key_pair, &claims)?;

		HeaderValue::from_str(&proof).map_err(|_| SigningError::InvalidHeader)
	}

	/// Stores any nonce carried by `response` and reports whether it rejected the proof's nonce.
	///
	/// Returns `Some(nonce)` when the response is a nonce challenge that supplied a fresh nonce,
	/// which is the only case worth retrying.
	pub async fn observe_response(
		&self,
		url: &Url,
		response: &HttpResponse,
	) -> Result<Option<String>, SigningError> {
		let Some(nonce) = response_nonce(response) else {
			return Ok(None);
		};
		let origin = origin_of(url);

		self.provider
			.set_nonce(&origin, nonce.clone())
			.await
			.map_err(SigningError::provider)?;

		Ok(is_nonce_challenge(response).then_some(nonce))
	}
}
impl Debug for DpopSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("DpopSigner(..)")
	}
}

/// Serialized origin (`scheme://host[:port]`) used as the nonce cache key.
pub fn origin_of(url: &Url) -> String {
	url.origin().ascii_serialization()
}

/// Returns true when `response` rejects the proof because of a missing or stale nonce.
///
/// The signal is a 400 or 401 status together with the `use_dpop_nonce` error code, either in a
/// `WWW-Authenticate` challenge or as the `error` member of a JSON body.
pub fn is_nonce_challenge(response: &HttpResponse) -> bool {
	#[derive(Deserialize)]
	struct ErrorBody {
		error: Option<String>,
	}

	let status = response.status();

	if status != StatusCode::BAD_REQUEST && status != StatusCode::UNAUTHORIZED {
		return false;
	}

	let challenged = response
		.headers()
		.get_all(WWW_AUTHENTICATE)
		.iter()
		.any(|value| value.to_str().is_ok_and(|value| value.contains(USE_DPOP_NONCE)));

	challenged
		|| serde_json::from_slice::<ErrorBody>(response.body())
			.is_ok_and(|body| body.error.as_deref() == Some(USE_DPOP_NONCE))
}

fn response_nonce(response: &HttpResponse) -> Option<String> {
	response
		.headers()
		.get(DPOP_NONCE_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.map(str::to_owned)
}
