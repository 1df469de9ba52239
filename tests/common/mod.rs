//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::{collections::VecDeque, sync::Arc};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
// self
#[cfg(feature = "reqwest")] use myaccount_auth::reqwest::Client as ReqwestClient;
use myaccount_auth::{
	dpop::DpopClaims,
	error::BoxError,
	fetcher::{AuthParams, FetchFuture, Fetcher},
	http::{HeaderValue, HttpResponse, RequestInit},
	url::Url,
};

/// One exchange observed by [`ScriptedFetcher`].
#[derive(Clone, Debug)]
pub struct RecordedCall {
	pub url: Url,
	pub init: RequestInit,
	pub auth: Option<AuthParams>,
}
impl RecordedCall {
	pub fn header(&self, name: &str) -> Option<&str> {
		self.init.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// Decodes the claims of the attached DPoP proof.
	pub fn proof_claims(&self) -> DpopClaims {
		let proof = self.header("dpop").expect("Request should carry a DPoP proof.");

		decode_claims(proof)
	}
}

/// Fetcher that replays canned responses in order and records every call.
///
/// Once the script runs out it answers `200 {}`.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
	script: Arc<Mutex<VecDeque<HttpResponse>>>,
	calls: Arc<Mutex<Vec<RecordedCall>>>,
}
impl ScriptedFetcher {
	pub fn new<I>(responses: I) -> Self
	where
		I: IntoIterator<Item = HttpResponse>,
	{
		Self { script: Arc::new(Mutex::new(responses.into_iter().collect())), ..Default::default() }
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.calls.lock().clone()
	}

	pub fn into_fetcher(self) -> Arc<dyn Fetcher> {
		Arc::new(self)
	}
}
impl Fetcher for ScriptedFetcher {
	fn fetch(&self, url: Url, init: RequestInit, auth: Option<AuthParams>) -> FetchFuture<'_> {
		self.calls.lock().push(RecordedCall { url, init, auth });

		let response = self.script.lock().pop_front().unwrap_or_else(|| response(200, None, "{}"));

		Box::pin(async move { Ok::<_, BoxError>(response) })
	}
}

/// Builds a reqwest client that accepts the self-signed certificates served by `httpmock`.
#[cfg(feature = "reqwest")]
pub fn insecure_reqwest_client() -> ReqwestClient {
	ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.")
}

/// Builds a buffered response with an optional `DPoP-Nonce` header.
pub fn response(status: u16, nonce: Option<&str>, body: &str) -> HttpResponse {
	let mut builder = myaccount_auth::http_types::Response::builder().status(status);

	if let Some(nonce) = nonce {
		builder = builder.header("dpop-nonce", HeaderValue::from_str(nonce).expect("Nonce is ASCII."));
	}

	builder.body(body.as_bytes().to_vec()).expect("Test response should build.")
}

/// Nonce challenge carrying `nonce`.
pub fn nonce_challenge(nonce: Option<&str>) -> HttpResponse {
	response(400, nonce, r#"{"error":"use_dpop_nonce","error_description":"nonce required"}"#)
}

pub fn decode_claims(proof: &str) -> DpopClaims {
	let payload = proof.split('.').nth(1).expect("Proof should have a payload.");
	let raw = URL_SAFE_NO_PAD.decode(payload).expect("Payload should be base64url.");

	serde_json::from_slice(&raw).expect("Payload should be JSON claims.")
}
