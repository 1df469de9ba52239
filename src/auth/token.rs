//! Token suppliers and the adapter that turns them into a per-request token provider.
//!
//! Callers hand the client either a static access token or a callback. The callback always
//! receives a single [`TokenOptions`] record; endpoints without declared scopes produce
//! `TokenOptions { scope: None }`, so scope-blind callbacks can ignore the argument entirely
//! (or be registered through [`TokenSupplier::scope_blind`], which never sees it).

// std
use std::future;
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, EndpointMetadata, ScopeSet, extract_scopes},
	error::ConfigError,
};

/// Boxed future returned by [`TokenCallback::token`].
pub type TokenFuture<'a> =
	Pin<Box<dyn Future<Output = Result<BearerToken, BoxError>> + 'a + Send>>;

/// Options passed to token callbacks for each request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenOptions {
	/// Space-separated scopes declared by the endpoint, or `None` when it declares none.
	pub scope: Option<String>,
}
impl TokenOptions {
	/// Builds options from the endpoint's scope set.
	pub fn for_scopes(scopes: &ScopeSet) -> Self {
		let joined = scopes.joined();

		Self { scope: (!joined.is_empty()).then_some(joined) }
	}
}

/// Dynamic token source invoked fresh for every request.
///
/// No caching happens on the dispatch side; implementations that want to reuse tokens keep
/// their own cache.
pub trait TokenCallback
where
	Self: Send + Sync,
{
	/// Produces an access token for a request with the given options.
	fn token(&self, options: TokenOptions) -> TokenFuture<'_>;
}

/// Caller-facing token configuration.
#[derive(Clone)]
pub enum TokenSupplier {
	/// Fixed token reused for every request.
	Static(BearerToken),
	/// Callback invoked once per request.
	Callback(Arc<dyn TokenCallback>),
}
impl TokenSupplier {
	/// Wraps a fixed access token.
	pub fn from_static(token: impl Into<BearerToken>) -> Self {
		Self::Static(token.into())
	}

	/// Wraps a synchronous, scope-aware callback.
	pub fn from_fn<F, T, E>(f: F) -> Self
	where
		F: 'static + Fn(TokenOptions) -> Result<T, E> + Send + Sync,
		T: Into<BearerToken>,
		E: Into<BoxError>,
	{
		Self::Callback(Arc::new(SyncCallback(f)))
	}

	/// Wraps an asynchronous, scope-aware callback.
	pub fn from_async<F, Fut, T, E>(f: F) -> Self
	where
		F: 'static + Fn(TokenOptions) -> Fut + Send + Sync,
		Fut: 'static + Future<Output = Result<T, E>> + Send,
		T: Into<BearerToken>,
		E: Into<BoxError>,
	{
		Self::Callback(Arc::new(AsyncCallback(f)))
	}

	/// Wraps an asynchronous callback that takes no arguments and ignores declared scopes.
	pub fn scope_blind<F, Fut, T, E>(f: F) -> Self
	where
		F: 'static + Fn() -> Fut + Send + Sync,
		Fut: 'static + Future<Output = Result<T, E>> + Send,
		T: Into<BearerToken>,
		E: Into<BoxError>,
	{
		Self::Callback(Arc::new(ScopeBlindCallback(f)))
	}

	/// Wraps an existing [`TokenCallback`] implementation.
	pub fn callback(callback: Arc<dyn TokenCallback>) -> Self {
		Self::Callback(callback)
	}
}
impl From<&str> for TokenSupplier {
	fn from(value: &str) -> Self {
		Self::from_static(value)
	}
}
impl From<String> for TokenSupplier {
	fn from(value: String) -> Self {
		Self::from_static(value)
	}
}
impl Debug for TokenSupplier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Static(token) => f.debug_tuple("TokenSupplier::Static").field(token).finish(),
			Self::Callback(_) => f.write_str("TokenSupplier::Callback(..)"),
		}
	}
}

/// Token provider consumed by the dispatch pipeline, resolved once from a [`TokenSupplier`].
#[derive(Clone)]
pub enum CoreTokenProvider {
	/// Static token handed back unchanged on every request.
	Static(BearerToken),
	/// Callback invoked with the endpoint's scopes on every request.
	Dynamic(Arc<dyn TokenCallback>),
}
impl CoreTokenProvider {
	/// Resolves the supplier shape once; empty static tokens are rejected here so
	/// misconfiguration surfaces at client construction.
	pub fn adapt(supplier: TokenSupplier) -> Result<Self, ConfigError> {
		match supplier {
			TokenSupplier::Static(token) if token.is_empty() => Err(ConfigError::EmptyToken),
			TokenSupplier::Static(token) => Ok(Self::Static(token)),
			TokenSupplier::Callback(callback) => Ok(Self::Dynamic(callback)),
		}
	}

	/// Produces the token for an endpoint, extracting its scopes first.
	pub async fn token_for(&self, endpoint: &EndpointMetadata) -> Result<BearerToken> {
		self.resolve(&extract_scopes(endpoint)).await
	}

	/// Produces the token for an already-extracted scope set.
	///
	/// Callback failures are returned as [`Error::TokenAcquisition`] with the original error as
	/// the source. The callback is awaited exactly once.
	pub async fn resolve(&self, scopes: &ScopeSet) -> Result<BearerToken> {
		match self {
			Self::Static(token) => Ok(token.clone()),
			Self::Dynamic(callback) =>
				callback.token(TokenOptions::for_scopes(scopes)).await.map_err(Error::token_acquisition),
		}
	}

	/// Returns true for the static variant.
	pub fn is_static(&self) -> bool {
		matches!(self, Self::Static(_))
	}
}
impl Debug for CoreTokenProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Static(token) => f.debug_tuple("CoreTokenProvider::Static").field(token).finish(),
			Self::Dynamic(_) => f.write_str("CoreTokenProvider::Dynamic(..)"),
		}
	}
}

struct SyncCallback<F>(F);
impl<F, T, E> TokenCallback for SyncCallback<F>
where
	F: Fn(TokenOptions) -> Result<T, E> + Send + Sync,
	T: Into<BearerToken>,
	E: Into<BoxError>,
{
	fn token(&self, options: TokenOptions) -> TokenFuture<'_> {
		let result: Result<BearerToken, BoxError> =
			(self.0)(options).map(Into::into).map_err(Into::into);

		Box::pin(future::ready(result))
	}
}

struct AsyncCallback<F>(F);
impl<F, Fut, T, E> TokenCallback for AsyncCallback<F>
where
	F: Fn(TokenOptions) -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<T, E>> + Send,
	T: Into<BearerToken>,
	E: Into<BoxError>,
{
	fn token(&self, options: TokenOptions) -> TokenFuture<'_> {
		let fut = (self.0)(options);

		Box::pin(async move { fut.await.map(Into::into).map_err(Into::into) })
	}
}

struct ScopeBlindCallback<F>(F);
impl<F, Fut, T, E> TokenCallback for ScopeBlindCallback<F>
where
	F: Fn() -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<T, E>> + Send,
	T: Into<BearerToken>,
	E: Into<BoxError>,
{
	fn token(&self, _options: TokenOptions) -> TokenFuture<'_> {
		let fut = (self.0)();

		Box::pin(async move { fut.await.map(Into::into).map_err(Into::into) })
	}
}
