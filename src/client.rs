//! Client assembly and the per-request dispatch pipeline.
//!
//! [`MyAccountClientBuilder::build`] validates the configuration once and freezes it into
//! [`BaseClientOptions`]. [`MyAccountClient::send`] then runs every request through the same
//! linear lifecycle: scope extraction, token acquisition, optional DPoP proof, transport, and at
//! most one replay when the server answers with a fresh DPoP nonce challenge.

pub mod config;

pub use config::*;

// self
use crate::{
	_prelude::*,
	auth::{
		BearerToken, CoreTokenProvider, EndpointMetadata, ScopeSet, TokenSupplier, extract_scopes,
	},
	dpop::{self, DPOP_HEADER, DPOP_SCHEME, DpopProvider, DpopSigner},
	error::ConfigError,
	fetcher::{Fetcher, FetcherAdapter},
	http::{
		self, HeaderMap, HeaderName, HeaderValue, HttpResponse, RequestInit,
		header::AUTHORIZATION,
	},
	obs::{self, RequestSpan, RequestStage},
	telemetry::{ClientInfo, ClientTelemetry},
};
#[cfg(feature = "reqwest")] use crate::fetcher::ReqwestFetcher;

/// Authorization scheme for tokens sent without a DPoP proof.
pub const BEARER_SCHEME: &str = "Bearer";

/// Frozen options shared by every request a client issues.
#[derive(Debug)]
pub struct BaseClientOptions {
	/// API base URL every request path is appended to.
	pub base_url: Url,
	/// Audience reported to fetchers (`https://{domain}/me/`).
	pub audience: String,
	/// Default headers, telemetry included when enabled.
	pub headers: HeaderMap,
	/// Token provider; `None` when the fetcher authenticates on its own.
	pub token: Option<CoreTokenProvider>,
	/// Transport used for every exchange.
	pub transport: FetcherAdapter,
	/// DPoP signer; `None` disables proof-of-possession.
	pub dpop: Option<DpopSigner>,
	/// Telemetry reported through the `Auth0-Client` header.
	pub telemetry: Option<ClientTelemetry>,
	/// Per-request timeout handed to the default transport.
	pub timeout: Option<std::time::Duration>,
	/// Retry budget for the request executor.
	pub max_retries: Option<u32>,
}

/// Builder for [`MyAccountClient`].
pub struct MyAccountClientBuilder {
	config: ClientConfig,
	token: Option<TokenSupplier>,
	fetcher: Option<Arc<dyn Fetcher>>,
	dpop: Option<Arc<dyn DpopProvider>>,
	#[cfg(feature = "reqwest")]
	http_client: Option<ReqwestClient>,
}
impl MyAccountClientBuilder {
	/// Starts from a parsed [`ClientConfig`].
	pub fn from_config(config: ClientConfig) -> Self {
		Self {
			config,
			token: None,
			fetcher: None,
			dpop: None,
			#[cfg(feature = "reqwest")]
			http_client: None,
		}
	}

	/// Sets the token supplier (a static token or a callback).
	pub fn token(mut self, token: impl Into<TokenSupplier>) -> Self {
		self.token = Some(token.into());

		self
	}

	/// Sets a custom fetcher.
	pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
		self.fetcher = Some(fetcher);

		self
	}

	/// Enables DPoP with the given key and nonce provider.
	pub fn dpop(mut self, provider: Arc<dyn DpopProvider>) -> Self {
		self.dpop = Some(provider);

		self
	}

	/// Overrides the base URL derived from the domain.
	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.config.base_url = Some(base_url.into());

		self
	}

	/// Adds a default header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.config.headers.insert(name.into(), value.into());

		self
	}

	/// Toggles the telemetry header.
	pub fn telemetry(mut self, enabled: bool) -> Self {
		self.config.telemetry = enabled;

		self
	}

	/// Overrides the reported client info; it is encoded exactly as given.
	pub fn client_info(mut self, client_info: ClientInfo) -> Self {
		self.config.client_info = Some(client_info);

		self
	}

	/// Sets the per-request timeout in seconds.
	pub fn timeout_in_seconds(mut self, seconds: u64) -> Self {
		self.config.timeout_in_seconds = Some(seconds);

		self
	}

	/// Sets the executor's retry budget.
	pub fn max_retries(mut self, max_retries: u32) -> Self {
		self.config.max_retries = Some(max_retries);

		self
	}

	/// Uses `client` for the default transport instead of a fresh one.
	#[cfg(feature = "reqwest")]
	pub fn http_client(mut self, client: ReqwestClient) -> Self {
		self.http_client = Some(client);

		self
	}

	/// Validates the configuration and assembles the client.
	///
	/// Every check happens here, before any network activity.
	pub fn build(self) -> Result<MyAccountClient, ConfigError> {
		let Self {
			config,
			token,
			fetcher,
			dpop,
			#[cfg(feature = "reqwest")]
			http_client,
		} = self;

		if token.is_none() && fetcher.is_none() {
			return Err(ConfigError::MissingAuthentication);
		}

		let domain = sanitize_domain(&config.domain);

		if domain.is_empty() {
			return Err(ConfigError::EmptyDomain);
		}

		let raw_base_url =
			config.base_url.clone().unwrap_or_else(|| format!("https://{domain}/me/v1"));
		let base_url = Url::parse(&raw_base_url)
			.map_err(|source| ConfigError::InvalidBaseUrl { url: raw_base_url, source })?;
		let audience = format!("https://{domain}/me/");
		let token = token.map(CoreTokenProvider::adapt).transpose()?;
		let mut headers = http::header_map(&config.headers)?;
		let telemetry = if config.telemetry {
			let telemetry = ClientTelemetry::new(config.client_info.clone().unwrap_or_default())?;

			headers = telemetry.apply(&headers);

			Some(telemetry)
		} else {
			None
		};
		let timeout = config.timeout();
		let fetcher: Arc<dyn Fetcher> = match fetcher {
			Some(fetcher) => fetcher,
			#[cfg(feature = "reqwest")]
			None => {
				let mut default = ReqwestFetcher::with_client(http_client.unwrap_or_default());

				if let Some(timeout) = timeout {
					default = default.with_timeout(timeout);
				}

				Arc::new(default)
			},
			#[cfg(not(feature = "reqwest"))]
			None => return Err(ConfigError::MissingTransport),
		};
		let options = BaseClientOptions {
			base_url,
			transport: FetcherAdapter::adapt(fetcher, audience.clone()),
			audience,
			headers,
			token,
			dpop: dpop.map(DpopSigner::new),
			telemetry,
			timeout,
			max_retries: config.max_retries,
		};

		Ok(MyAccountClient { options: Arc::new(options) })
	}
}
impl Debug for MyAccountClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MyAccountClientBuilder")
			.field("config", &self.config)
			.field("token", &self.token)
			.field("fetcher_set", &self.fetcher.is_some())
			.field("dpop_set", &self.dpop.is_some())
			.finish()
	}
}

/// Authenticated MyAccount API client.
///
/// Cheap to clone; clones share options, token provider, transport, and nonce state.
#[derive(Clone, Debug)]
pub struct MyAccountClient {
	options: Arc<BaseClientOptions>,
}
impl MyAccountClient {
	/// Starts a builder for `domain`.
	pub fn builder(domain: impl Into<String>) -> MyAccountClientBuilder {
		MyAccountClientBuilder::from_config(ClientConfig::new(domain))
	}

	/// Assembled options.
	pub fn options(&self) -> &BaseClientOptions {
		&self.options
	}

	/// Resolves `path` against the base URL.
	pub fn request_url(&self, path: &str) -> Result<Url, ConfigError> {
		let raw = format!(
			"{}/{}",
			self.options.base_url.as_str().trim_end_matches('/'),
			path.trim_start_matches('/')
		);

		Url::parse(&raw).map_err(|source| ConfigError::InvalidRequestUrl { url: raw, source })
	}

	/// Produces the access token for `endpoint`, or `None` when no token supplier is set.
	pub async fn token_for(&self, endpoint: &EndpointMetadata) -> Result<Option<BearerToken>> {
		match &self.options.token {
			Some(provider) => provider.token_for(endpoint).await.map(Some),
			None => Ok(None),
		}
	}

	/// Sends one request to `path` for an endpoint described by `endpoint`.
	///
	/// Headers are layered as client defaults, then `init.headers`, then the authentication
	/// headers. The response is returned unchanged whatever its status, except that a DPoP nonce
	/// challenge is replayed once with a fresh proof and fails with [`Error::NonceRejected`] if
	/// it repeats.
	pub async fn send(
		&self,
		endpoint: &EndpointMetadata,
		path: &str,
		init: RequestInit,
	) -> Result<HttpResponse> {
		let span = RequestSpan::new(&init.method, path);

		span.instrument(self.dispatch(endpoint, path, init)).await
	}

	async fn dispatch(
		&self,
		endpoint: &EndpointMetadata,
		path: &str,
		init: RequestInit,
	) -> Result<HttpResponse> {
		let url = self.request_url(path)?;
		let scopes = extract_scopes(endpoint);
		let token = match &self.options.token {
			Some(provider) => {
				let span = RequestSpan::stage(RequestStage::Token);
				let token = span.instrument(provider.resolve(&scopes)).await;

				Some(obs::record_stage(RequestStage::Token, token)?)
			},
			None => None,
		};
		let headers = http::overlay_headers(&self.options.headers, &init.headers);
		let init = RequestInit { headers, ..init };
		let response =
			self.exchange(&url, &init, token.as_ref(), &scopes, RequestStage::Transport).await?;
		let Some(signer) = &self.options.dpop else {
			return Ok(response);
		};

		match signer.observe_response(&url, &response).await? {
			Some(_) => {
				obs::nonce_retry_event(&dpop::origin_of(&url));

				let retry = self
					.exchange(&url, &init, token.as_ref(), &scopes, RequestStage::NonceRetry)
					.await?;

				signer.observe_response(&url, &retry).await?;

				if dpop::is_nonce_challenge(&retry) {
					return Err(Error::NonceRejected { origin: dpop::origin_of(&url) });
				}

				Ok(retry)
			},
			None if dpop::is_nonce_challenge(&response) =>
				Err(Error::NonceRejected { origin: dpop::origin_of(&url) }),
			None => Ok(response),
		}
	}

	async fn exchange(
		&self,
		url: &Url,
		init: &RequestInit,
		token: Option<&BearerToken>,
		scopes: &ScopeSet,
		stage: RequestStage,
	) -> Result<HttpResponse> {
		let mut init = init.clone();
		let proof = match &self.options.dpop {
			Some(signer) => {
				let span = RequestSpan::stage(RequestStage::Proof);
				let proof = span.instrument(signer.sign(&init.method, url, token)).await;

				Some(obs::record_stage(RequestStage::Proof, proof)?)
			},
			None => None,
		};

		if let Some(token) = token {
			let scheme = if proof.is_some() { DPOP_SCHEME } else { BEARER_SCHEME };
			let mut value = HeaderValue::from_str(&token.authorization(scheme)).map_err(|_| {
				ConfigError::InvalidHeader { name: AUTHORIZATION.as_str().to_owned() }
			})?;

			value.set_sensitive(true);
			init.headers.insert(AUTHORIZATION, value);
		}
		if let Some(proof) = proof {
			init.headers.insert(HeaderName::from_static(DPOP_HEADER), proof);
		}

		let span = RequestSpan::stage(stage);
		let response =
			span.instrument(self.options.transport.call(url.clone(), init, scopes)).await;

		Ok(obs::record_stage(stage, response)?)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	// self
	use super::*;
	use crate::{
		fetcher::{self, AuthParams},
		telemetry::{CLIENT_HEADER, DEFAULT_CLIENT_NAME},
	};

	fn noop_fetcher() -> Arc<dyn Fetcher> {
		fetcher::from_fn(|_: Url, _: RequestInit, _: Option<AuthParams>| async {
			Ok::<_, BoxError>(HttpResponse::new(Vec::new()))
		})
	}

	#[test]
	fn missing_authentication_fails_before_anything_else() {
		let err = MyAccountClient::builder("")
			.build()
			.expect_err("Clients without token or fetcher must be rejected.");

		assert!(matches!(err, ConfigError::MissingAuthentication));
		assert_eq!(
			err.to_string(),
			"MyAccountClient must be configured with either 'token' or 'fetcher'"
		);
	}

	#[test]
	fn domains_normalize_to_the_same_base_url() {
		for domain in ["https://t.example.com/", "t.example.com"] {
			let client = MyAccountClient::builder(domain)
				.token("at")
				.fetcher(noop_fetcher())
				.build()
				.expect("Client should build.");

			assert_eq!(client.options().base_url.as_str(), "https://t.example.com/me/v1");
			assert_eq!(client.options().audience, "https://t.example.com/me/");
		}
	}

	#[test]
	fn explicit_base_url_wins() {
		let client = MyAccountClient::builder("t.example.com")
			.fetcher(noop_fetcher())
			.base_url("https://proxy.example.com/custom/me/v1")
			.build()
			.expect("Client should build.");

		assert_eq!(client.options().base_url.as_str(), "https://proxy.example.com/custom/me/v1");
		assert_eq!(client.options().audience, "https://t.example.com/me/");
		assert_eq!(
			client.request_url("/factors").expect("Path should join.").as_str(),
			"https://proxy.example.com/custom/me/v1/factors"
		);
	}

	#[test]
	fn request_paths_append_to_the_base_path() {
		let client = MyAccountClient::builder("example.com")
			.fetcher(noop_fetcher())
			.build()
			.expect("Client should build.");

		assert_eq!(
			client
				.request_url("authentication-methods/auth_method_456")
				.expect("Path should join.")
				.as_str(),
			"https://example.com/me/v1/authentication-methods/auth_method_456"
		);
	}

	#[test]
	fn empty_domain_and_empty_token_are_rejected() {
		let err = MyAccountClient::builder("https:///")
			.fetcher(noop_fetcher())
			.build()
			.expect_err("Empty domains must be rejected.");

		assert!(matches!(err, ConfigError::EmptyDomain));

		let err = MyAccountClient::builder("t.example.com")
			.token("")
			.build()
			.expect_err("Empty static tokens must be rejected.");

		assert!(matches!(err, ConfigError::EmptyToken));
	}

	#[test]
	fn telemetry_is_applied_after_caller_headers() {
		let client = MyAccountClient::builder("t.example.com")
			.fetcher(noop_fetcher())
			.header("x-tenant", "acme")
			.header(CLIENT_HEADER, "caller-value")
			.build()
			.expect("Client should build.");
		let telemetry = client.options().telemetry.as_ref().expect("Telemetry is on by default.");

		assert_eq!(telemetry.client_info().name, DEFAULT_CLIENT_NAME);
		assert_eq!(client.options().headers["x-tenant"], "acme");
		assert_eq!(&client.options().headers[CLIENT_HEADER], telemetry.header_value());
	}

	#[test]
	fn disabled_telemetry_keeps_only_caller_headers() {
		let client = MyAccountClient::builder("t.example.com")
			.fetcher(noop_fetcher())
			.header(CLIENT_HEADER, "caller-value")
			.telemetry(false)
			.build()
			.expect("Client should build.");

		assert!(client.options().telemetry.is_none());
		assert_eq!(client.options().headers.len(), 1);
		assert_eq!(client.options().headers[CLIENT_HEADER], "caller-value");
	}

	#[test]
	fn client_info_override_is_reported_as_given() {
		let client = MyAccountClient::builder("t.example.com")
			.fetcher(noop_fetcher())
			.client_info(ClientInfo::new("my-app", "2.0.0"))
			.build()
			.expect("Client should build.");
		let info = client.options().telemetry.as_ref().expect("Telemetry is on.").client_info();

		assert_eq!(info.name, "my-app");
		assert_eq!(info.version, "2.0.0");
		assert!(info.env.is_none());

		let header = client.options().headers[CLIENT_HEADER].to_str().expect("Header is ASCII.");
		let decoded = URL_SAFE_NO_PAD.decode(header).expect("Header is base64url.");

		assert_eq!(
			serde_json::from_slice::<serde_json::Value>(&decoded).expect("Header is JSON."),
			serde_json::json!({ "name": "my-app", "version": "2.0.0" })
		);
	}

	#[test]
	fn pass_through_options_are_preserved() {
		let client = MyAccountClient::builder("t.example.com")
			.fetcher(noop_fetcher())
			.timeout_in_seconds(7)
			.max_retries(2)
			.build()
			.expect("Client should build.");

		assert_eq!(client.options().timeout, Some(std::time::Duration::from_secs(7)));
		assert_eq!(client.options().max_retries, Some(2));
		assert!(client.options().token.is_none());
		assert!(client.options().dpop.is_none());
	}
}
