//! Optional observability hooks for the dispatch pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap each dispatch in a `myaccount_auth.request` span carrying the
//!   request `method` and, for nested spans, the pipeline `stage`.
//! - Enable `metrics` to increment the `myaccount_auth_request_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Steps of a single dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestStage {
	/// Token acquisition from the configured supplier.
	Token,
	/// DPoP proof construction.
	Proof,
	/// Transport exchange.
	Transport,
	/// Replay after a DPoP nonce challenge.
	NonceRetry,
}
impl RequestStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestStage::Token => "token",
			RequestStage::Proof => "proof",
			RequestStage::Transport => "transport",
			RequestStage::NonceRetry => "nonce_retry",
		}
	}
}
impl Display for RequestStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records one attempt of `stage` together with its success or failure, then hands `result` back.
pub(crate) fn record_stage<T, E>(stage: RequestStage, result: Result<T, E>) -> Result<T, E> {
	let outcome = if result.is_ok() { RequestOutcome::Success } else { RequestOutcome::Failure };

	record_request_outcome(stage, RequestOutcome::Attempt);
	record_request_outcome(stage, outcome);

	result
}
