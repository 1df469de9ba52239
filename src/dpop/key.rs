//! P-256 key pairs used to sign DPoP proofs.

// crates.io
use p256::ecdsa::{Signature, SigningKey, VerifyingKey, signature::Signer};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, encoding, error::SigningError};

/// Public half of a [`DpopKeyPair`] in JWK form, embedded in every proof header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicJwk {
	/// Key type, always `EC`.
	pub kty: String,
	/// Curve name, always `P-256`.
	pub crv: String,
	/// Base64url x coordinate.
	pub x: String,
	/// Base64url y coordinate.
	pub y: String,
}
impl PublicJwk {
	/// RFC 7638 thumbprint (`jkt`) of the key.
	pub fn thumbprint(&self) -> String {
		// Members in lexicographic order, no whitespace.
		let canonical = format!(
			"{{\"crv\":\"{}\",\"kty\":\"{}\",\"x\":\"{}\",\"y\":\"{}\"}}",
			self.crv, self.kty, self.x, self.y
		);

		encoding::encode_bytes(Sha256::digest(canonical.as_bytes()))
	}
}

/// ECDSA P-256 signing key owned by the caller's DPoP provider.
///
/// Dispatch never generates or persists keys; [`generate`](Self::generate) exists for providers
/// that want an ephemeral key.
#[derive(Clone)]
pub struct DpopKeyPair {
	signing_key: SigningKey,
	jwk: PublicJwk,
}
impl DpopKeyPair {
	/// Algorithm label written into proof headers.
	pub const ALGORITHM: &'static str = "ES256";

	/// Generates a fresh random key pair.
	pub fn generate() -> Self {
		loop {
			let secret: [u8; 32] = rand::random();

			// Zero and out-of-range scalars are rejected; draw again.
			if let Ok(pair) = Self::from_bytes(&secret) {
				return pair;
			}
		}
	}

	/// Loads a key pair from a raw 32-byte big-endian private scalar.
	pub fn from_bytes(secret: &[u8]) -> Result<Self, SigningError> {
		let signing_key = SigningKey::from_slice(secret).map_err(|_| SigningError::InvalidKey)?;

		Self::from_signing_key(signing_key)
	}

	/// Wraps an existing signing key.
	pub fn from_signing_key(signing_key: SigningKey) -> Result<Self, SigningError> {
		let point = signing_key.verifying_key().to_encoded_point(false);
		let (Some(x), Some(y)) = (point.x(), point.y()) else {
			return Err(SigningError::InvalidKey);
		};
		let jwk = PublicJwk {
			kty: "EC".into(),
			crv: "P-256".into(),
			x: encoding::encode_bytes(x),
			y: encoding::encode_bytes(y),
		};

		Ok(Self { signing_key, jwk })
	}

	/// Public key in JWK form.
	pub fn public_jwk(&self) -> &PublicJwk {
		&self.jwk
	}

	/// Verifying key matching this pair.
	pub fn verifying_key(&self) -> &VerifyingKey {
		self.signing_key.verifying_key()
	}

	/// Signs `message`, returning the fixed-size `r || s` encoding used by JWS.
	pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
		let signature: Signature =
			self.signing_key.try_sign(message).map_err(|source| SigningError::Signature { source })?;

		Ok(signature.to_bytes().to_vec())
	}
}
impl Debug for DpopKeyPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DpopKeyPair")
			.field("jwk", &self.jwk)
			.field("signing_key", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use p256::ecdsa::signature::Verifier;
	// self
	use super::*;

	#[test]
	fn generated_keys_sign_verifiable_messages() {
		let pair = DpopKeyPair::generate();
		let raw = pair.sign(b"header.payload").expect("Signing should succeed.");

		assert_eq!(raw.len(), 64);

		let signature = Signature::from_slice(&raw).expect("Signature should be r || s.");

		assert!(pair.verifying_key().verify(b"header.payload", &signature).is_ok());
	}

	#[test]
	fn invalid_scalars_are_rejected() {
		assert!(matches!(DpopKeyPair::from_bytes(&[0; 32]), Err(SigningError::InvalidKey)));
		assert!(matches!(DpopKeyPair::from_bytes(&[1; 7]), Err(SigningError::InvalidKey)));
	}

	#[test]
	fn jwk_describes_p256_and_thumbprint_is_stable() {
		let pair = DpopKeyPair::from_bytes(&[7; 32]).expect("Fixed scalar should be valid.");
		let jwk = pair.public_jwk();

		assert_eq!(jwk.kty, "EC");
		assert_eq!(jwk.crv, "P-256");
		assert_eq!(jwk.x.len(), 43);
		assert_eq!(jwk.y.len(), 43);
		assert_eq!(jwk.thumbprint(), pair.clone().public_jwk().thumbprint());
		assert_eq!(jwk.thumbprint().len(), 43);
		assert!(!format!("{pair:?}").contains("SigningKey"));
	}
}
