//! DPoP proof claims and compact JWS assembly.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::BearerToken,
	dpop::{DpopKeyPair, PublicJwk},
	encoding,
	error::SigningError,
	http::Method,
};

/// JOSE `typ` for DPoP proofs.
pub const PROOF_TYPE: &str = "dpop+jwt";

#[derive(Serialize)]
struct ProofHeader<'a> {
	typ: &'static str,
	alg: &'static str,
	jwk: &'a PublicJwk,
}

/// Claims carried by a single DPoP proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpopClaims {
	/// Unique proof identifier.
	pub jti: String,
	/// HTTP method of the request.
	pub htm: String,
	/// Target URI without query or fragment.
	pub htu: String,
	/// Issued-at, seconds since the Unix epoch.
	pub iat: i64,
	/// Server-issued nonce for the request's origin; omitted until the server sends one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub nonce: Option<String>,
	/// Hash of the access token the proof is bound to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ath: Option<String>,
}
impl DpopClaims {
	/// Builds claims for a request issued now with a fresh `jti`.
	pub fn new(method: &Method, url: &Url, nonce: Option<String>) -> Self {
		let mut htu = url.clone();

		htu.set_query(None);
		htu.set_fragment(None);

		Self {
			jti: encoding::encode_bytes(rand::random::<[u8; 16]>()),
			htm: method.as_str().to_owned(),
			htu: htu.into(),
			iat: OffsetDateTime::now_utc().unix_timestamp(),
			nonce,
			ath: None,
		}
	}

	/// Binds the proof to `token` through the `ath` claim.
	pub fn with_access_token(mut self, token: &BearerToken) -> Self {
		self.ath = Some(encoding::encode_bytes(Sha256::digest(token.expose().as_bytes())));

		self
	}
}

/// Signs `claims` with `key_pair`, producing `header.payload.signature`.
pub fn sign_proof(key_pair: &DpopKeyPair, claims: &DpopClaims) -> Result<String, SigningError> {
	let header = ProofHeader {
		typ: PROOF_TYPE,
		alg: DpopKeyPair::ALGORITHM,
		jwk: key_pair.public_jwk(),
	};
	let signing_input =
		format!("{}.{}", encoding::encode_json(&header)?, encoding::encode_json(claims)?);
	let signature = key_pair.sign(signing_input.as_bytes())?;

	Ok(format!("{signing_input}.{}", encoding::encode_bytes(signature)))
}
