//! Transport seam between the dispatch pipeline and the network.
//!
//! Callers may bring their own [`Fetcher`] (for example one that already attaches credentials or
//! routes through a proxy); otherwise the client falls back to [`ReqwestFetcher`]. Either way the
//! pipeline talks to a single [`FetcherAdapter`], which adds the endpoint's [`AuthParams`] and
//! normalizes failures into [`TransportError`].

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::TransportError,
	http::{HttpResponse, RequestInit},
};

/// Boxed future returned by [`Fetcher::fetch`].
pub type FetchFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, BoxError>> + 'a + Send>>;

/// Authorization hints handed to custom fetchers for endpoints that declare scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthParams {
	/// Scopes the endpoint requires, in declaration order.
	pub scope: Vec<String>,
	/// API audience (`https://{domain}/me/`).
	pub audience: String,
}

/// Network function that executes one HTTP exchange.
///
/// Implementations receive the absolute URL, the request exactly as assembled by the pipeline,
/// and the endpoint's [`AuthParams`] (`None` for endpoints without declared scopes). Responses
/// are returned to the caller as-is; the pipeline never retries a transport failure.
pub trait Fetcher
where
	Self: Send + Sync,
{
	/// Executes the request.
	fn fetch(&self, url: Url, init: RequestInit, auth: Option<AuthParams>) -> FetchFuture<'_>;
}

/// Wraps an async closure as a [`Fetcher`].
pub fn from_fn<F, Fut, E>(f: F) -> Arc<dyn Fetcher>
where
	F: 'static + Fn(Url, RequestInit, Option<AuthParams>) -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<HttpResponse, E>> + Send,
	E: Into<BoxError>,
{
	Arc::new(FnFetcher(f))
}

/// Adapts a [`Fetcher`] into the transport used by the dispatch pipeline.
#[derive(Clone)]
pub struct FetcherAdapter {
	fetcher: Arc<dyn Fetcher>,
	audience: String,
}
impl FetcherAdapter {
	/// Binds `fetcher` to the API audience reported in every [`AuthParams`].
	pub fn adapt(fetcher: Arc<dyn Fetcher>, audience: impl Into<String>) -> Self {
		Self { fetcher, audience: audience.into() }
	}

	/// Audience attached to auth params.
	pub fn audience(&self) -> &str {
		&self.audience
	}

	/// Builds the auth params for a scope set; empty sets produce `None`.
	pub fn auth_params(&self, scopes: &ScopeSet) -> Option<AuthParams> {
		if scopes.is_empty() {
			return None;
		}

		Some(AuthParams { scope: scopes.as_slice().to_vec(), audience: self.audience.clone() })
	}

	/// Runs one exchange through the wrapped fetcher.
	///
	/// A [`TransportError`] raised by the fetcher itself is returned as-is; any other failure is
	/// wrapped in [`TransportError::Fetcher`] with the original error as its source.
	pub async fn call(
		&self,
		url: Url,
		init: RequestInit,
		scopes: &ScopeSet,
	) -> Result<HttpResponse, TransportError> {
		self.fetcher.fetch(url, init, self.auth_params(scopes)).await.map_err(|e| {
			match e.downcast::<TransportError>() {
				Ok(transport) => *transport,
				Err(other) => TransportError::fetcher(other),
			}
		})
	}
}
impl Debug for FetcherAdapter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FetcherAdapter").field("audience", &self.audience).finish_non_exhaustive()
	}
}

/// Default transport backed by [`ReqwestClient`].
///
/// Honors the request's cancellation signal; a timeout, when configured, is applied per request.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestFetcher {
	client: ReqwestClient,
	timeout: Option<std::time::Duration>,
}
#[cfg(feature = "reqwest")]
impl ReqwestFetcher {
	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, timeout: None }
	}

	/// Applies `timeout` to every request.
	pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Underlying reqwest client.
	pub fn client(&self) -> &ReqwestClient {
		&self.client
	}

	async fn exchange(&self, url: Url, init: RequestInit) -> Result<HttpResponse, TransportError> {
		let RequestInit { method, headers, body, signal, .. } = init;
		let mut request = self.client.request(method, url).headers(headers);

		if let Some(body) = body {
			request = request.body(body);
		}
		if let Some(timeout) = self.timeout {
			request = request.timeout(timeout);
		}

		let exchange = async {
			let response = request.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok::<_, TransportError>(response_new)
		};

		match signal {
			Some(signal) =>
				signal.run_until_cancelled(exchange).await.ok_or(TransportError::Aborted)?,
			None => exchange.await,
		}
	}
}
#[cfg(feature = "reqwest")]
impl Fetcher for ReqwestFetcher {
	fn fetch(&self, url: Url, init: RequestInit, _auth: Option<AuthParams>) -> FetchFuture<'_> {
		Box::pin(async move { self.exchange(url, init).await.map_err(BoxError::from) })
	}
}

struct FnFetcher<F>(F);
impl<F, Fut, E> Fetcher for FnFetcher<F>
where
	F: Fn(Url, RequestInit, Option<AuthParams>) -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<HttpResponse, E>> + Send,
	E: Into<BoxError>,
{
	fn fetch(&self, url: Url, init: RequestInit, auth: Option<AuthParams>) -> FetchFuture<'_> {
		let fut = (self.0)(url, init, auth);

		Box::pin(async move { fut.await.map_err(Into::into) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::{EndpointMetadata, extract_scopes},
		http::Method,
	};

	const AUDIENCE: &str = "https://example.com/me/";

	fn recording_fetcher(seen: Arc<Mutex<Vec<Option<AuthParams>>>>) -> Arc<dyn Fetcher> {
		from_fn(move |_url: Url, _init: RequestInit, auth: Option<AuthParams>| {
			seen.lock().push(auth);

			async { Ok::<_, BoxError>(HttpResponse::new(b"{}".to_vec())) }
		})
	}

	fn url() -> Url {
		Url::parse("https://example.com/me/v1/authentication-methods/auth_method_456")
			.expect("Test URL should parse.")
	}

	#[tokio::test]
	async fn scoped_endpoints_receive_scope_and_audience() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let adapter = FetcherAdapter::adapt(recording_fetcher(seen.clone()), AUDIENCE);
		let endpoint =
			EndpointMetadata::with_scopes("MyAccountAuth", ["read:me:authentication_methods"]);

		adapter
			.call(url(), RequestInit::new(Method::GET), &extract_scopes(&endpoint))
			.await
			.expect("Fetcher should succeed.");

		assert_eq!(
			*seen.lock(),
			vec![Some(AuthParams {
				scope: vec!["read:me:authentication_methods".into()],
				audience: AUDIENCE.into(),
			})]
		);
	}

	#[tokio::test]
	async fn unscoped_endpoints_omit_auth_params() {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let adapter = FetcherAdapter::adapt(recording_fetcher(seen.clone()), AUDIENCE);

		adapter
			.call(url(), RequestInit::new(Method::GET), &ScopeSet::default())
			.await
			.expect("Fetcher should succeed.");

		assert_eq!(*seen.lock(), vec![None]);
	}

	#[tokio::test]
	async fn fetcher_failures_keep_their_source() {
		let adapter = FetcherAdapter::adapt(
			from_fn(|_: Url, _: RequestInit, _: Option<AuthParams>| async {
				Err::<HttpResponse, _>("connection reset")
			}),
			AUDIENCE,
		);
		let err = adapter
			.call(url(), RequestInit::new(Method::GET), &ScopeSet::default())
			.await
			.expect_err("Fetcher failure must propagate.");

		match err {
			TransportError::Fetcher { source } => assert_eq!(source.to_string(), "connection reset"),
			other => panic!("Unexpected error variant: {other:?}."),
		}

		let adapter = FetcherAdapter::adapt(
			from_fn(|_: Url, _: RequestInit, _: Option<AuthParams>| async {
				Err::<HttpResponse, _>(TransportError::Aborted)
			}),
			AUDIENCE,
		);
		let err = adapter
			.call(url(), RequestInit::new(Method::GET), &ScopeSet::default())
			.await
			.expect_err("Fetcher failure must propagate.");

		assert!(matches!(err, TransportError::Aborted));
	}

	#[tokio::test]
	async fn request_init_reaches_the_fetcher_verbatim() {
		let seen = Arc::new(Mutex::new(None));
		let recorder = seen.clone();
		let adapter = FetcherAdapter::adapt(
			from_fn(move |_: Url, init: RequestInit, _: Option<AuthParams>| {
				*recorder.lock() = Some(init);

				async { Ok::<_, BoxError>(HttpResponse::new(Vec::new())) }
			}),
			AUDIENCE,
		);
		let init = RequestInit::new(Method::POST)
			.with_header("x-trace", "abc")
			.expect("Header should be valid.")
			.with_body("payload");

		adapter.call(url(), init, &ScopeSet::default()).await.expect("Fetcher should succeed.");

		let seen = seen.lock().take().expect("Fetcher should have been called.");

		assert_eq!(seen.method, Method::POST);
		assert_eq!(seen.headers["x-trace"], "abc");
		assert_eq!(seen.body.as_deref(), Some(b"payload".as_slice()));
	}
}
