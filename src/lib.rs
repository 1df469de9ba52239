//! Authentication dispatch for the MyAccount API: static or scope-aware tokens, pluggable
//! transports, and DPoP proof-of-possession with per-origin nonce tracking, assembled into one
//! request pipeline.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod dpop;
pub mod encoding;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod obs;
pub mod telemetry;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	#[cfg(test)] pub use parking_lot::Mutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{BoxError, Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use crate::http::CancellationToken;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
