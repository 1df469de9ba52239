// self
use crate::{_prelude::*, http::Method, obs::RequestStage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// Span wrapping one dispatch or one of its stages.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates the top-level span for a request.
	pub fn new(method: &Method, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("myaccount_auth.request", method = method.as_str(), path);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, path);

			Self {}
		}
	}

	/// Creates a nested span for a single stage.
	pub fn stage(stage: RequestStage) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("myaccount_auth.stage", stage = stage.as_str());

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event when a DPoP nonce challenge triggers the single replay.
pub(crate) fn nonce_retry_event(origin: &str) {
	#[cfg(feature = "tracing")]
	tracing::debug!(origin, "DPoP nonce challenge received; replaying request once.");

	#[cfg(not(feature = "tracing"))]
	let _ = origin;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn stage_span_instruments_without_changing_output() {
		let span = RequestSpan::stage(RequestStage::Proof);

		assert_eq!(span.instrument(async { "proof" }).await, "proof");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = RequestSpan::new(&Method::GET, "factors");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
