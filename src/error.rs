//! Dispatch-level error types shared by the token, proof, and transport stages.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error produced by caller-supplied callbacks (token suppliers, fetchers, DPoP providers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error surfaced to the caller of a single request or client construction.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem detected while building the client or a request.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The caller-supplied token callback failed; its error is carried unchanged.
	#[error("Token supplier failed to produce an access token.")]
	TokenAcquisition {
		/// Error raised by the token callback.
		#[source]
		source: BoxError,
	},
	/// DPoP proof construction failed; the request was not sent.
	#[error(transparent)]
	Signing(#[from] SigningError),
	/// The server rejected the DPoP nonce again after the single refresh retry.
	#[error("Server rejected the DPoP nonce for {origin} after one retry.")]
	NonceRejected {
		/// Origin whose nonce was rejected.
		origin: String,
	},
	/// The transport failed; caller fetcher errors are carried unchanged.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Wraps a token callback failure.
	pub fn token_acquisition(src: impl Into<BoxError>) -> Self {
		Self::TokenAcquisition { source: src.into() }
	}
}

/// Construction-time and request-building failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Neither a token supplier nor a fetcher was configured.
	#[error("MyAccountClient must be configured with either 'token' or 'fetcher'")]
	MissingAuthentication,
	/// No fetcher was supplied and the default transport is compiled out.
	#[error("A fetcher is required when the `reqwest` feature is disabled.")]
	MissingTransport,
	/// The domain is empty once the scheme prefix and trailing slash are removed.
	#[error("Domain must not be empty.")]
	EmptyDomain,
	/// A static token supplier was given an empty string.
	#[error("Static access token must not be empty.")]
	EmptyToken,
	/// The default or overridden base URL cannot be parsed.
	#[error("Base URL `{url}` is invalid.")]
	InvalidBaseUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A request path could not be joined onto the base URL.
	#[error("Request URL `{url}` is invalid.")]
	InvalidRequestUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A header name or value is not valid HTTP.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Configuration JSON could not be parsed.
	#[error("Client configuration is invalid.")]
	InvalidConfig(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// DPoP proof construction failures.
#[derive(Debug, ThisError)]
pub enum SigningError {
	/// The DPoP provider has no key pair to sign with.
	#[error("DPoP provider did not return a private key pair.")]
	MissingKeyPair,
	/// The key material supplied to the provider is not a valid P-256 scalar.
	#[error("DPoP key material is not a valid P-256 private key.")]
	InvalidKey,
	/// The DPoP provider failed while returning a key or nonce.
	#[error("DPoP provider failed.")]
	Provider {
		/// Error raised by the provider.
		#[source]
		source: BoxError,
	},
	/// The signing operation itself failed.
	#[error("DPoP proof signature could not be computed.")]
	Signature {
		/// Underlying signature failure.
		#[source]
		source: p256::ecdsa::Error,
	},
	/// Proof header or claims could not be serialized.
	#[error("DPoP proof could not be serialized.")]
	Serialization(#[from] serde_json::Error),
	/// The proof could not be attached as a header value.
	#[error("DPoP proof is not a valid header value.")]
	InvalidHeader,
}
impl SigningError {
	/// Wraps a DPoP provider failure.
	pub fn provider(src: impl Into<BoxError>) -> Self {
		Self::Provider { source: src.into() }
	}
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The caller-supplied fetcher failed; its error is carried unchanged.
	#[error("Custom fetcher failed.")]
	Fetcher {
		/// Error raised by the fetcher.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the MyAccount API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request's cancellation token fired before a response arrived.
	#[error("Request was aborted.")]
	Aborted,
	/// A response could not be assembled from the transport output.
	#[error(transparent)]
	Http(#[from] ::http::Error),
}
impl TransportError {
	/// Wraps a caller fetcher failure.
	pub fn fetcher(src: impl Into<BoxError>) -> Self {
		Self::Fetcher { source: src.into() }
	}

	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn missing_authentication_message_is_fixed() {
		let err = Error::from(ConfigError::MissingAuthentication);

		assert_eq!(
			err.to_string(),
			"MyAccountClient must be configured with either 'token' or 'fetcher'"
		);
	}

	#[test]
	fn caller_errors_stay_reachable_through_source() {
		let err = Error::token_acquisition("session expired");
		let source = err.source().expect("Token failures must expose the callback error.");

		assert_eq!(source.to_string(), "session expired");

		let err = Error::from(TransportError::fetcher("socket closed"));
		let source = err.source().expect("Transport failures must expose the fetcher error.");

		assert_eq!(source.to_string(), "socket closed");
	}
}
