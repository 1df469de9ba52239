//! Demonstrates a scope-aware token callback and DPoP-bound requests against a mock MyAccount
//! API using the default reqwest transport.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use myaccount_auth::{
	auth::{EndpointMetadata, TokenOptions, TokenSupplier},
	client::MyAccountClient,
	dpop::{DpopKeyPair, MemoryDpopProvider},
	error::BoxError,
	http::{Method, RequestInit},
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let factors_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/me/v1/factors")
				.header("authorization", "DPoP token-for:read:me:factors")
				.header_exists("dpop");
			then.status(200)
				.header("content-type", "application/json")
				.header("dpop-nonce", "server-nonce-1")
				.body(r#"[{"type":"totp","usage":["secondary"]}]"#);
		})
		.await;
	let provider = Arc::new(MemoryDpopProvider::new(DpopKeyPair::generate()));
	let client = MyAccountClient::builder("demo.example.com")
		.base_url(server.url("/me/v1"))
		.http_client(
			Client::builder()
				.danger_accept_invalid_certs(true)
				.danger_accept_invalid_hostnames(true)
				.build()?,
		)
		.token(TokenSupplier::from_async(|options: TokenOptions| async move {
			let scope = options.scope.unwrap_or_default();

			Ok::<_, BoxError>(format!("token-for:{scope}"))
		}))
		.dpop(provider.clone())
		.build()?;
	let endpoint = EndpointMetadata::with_scopes("MyAccountAuth", ["read:me:factors"]);
	let response = client.send(&endpoint, "factors", RequestInit::new(Method::GET)).await?;

	println!("Status: {}.", response.status());
	println!("Body: {}.", String::from_utf8_lossy(response.body()));
	println!(
		"Cached nonce for {}: {:?}.",
		server.base_url(),
		provider.nonces().get(&server.base_url())
	);

	factors_mock.assert_async().await;

	Ok(())
}
