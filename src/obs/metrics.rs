// self
use crate::obs::{RequestOutcome, RequestStage};

/// Records a stage outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(stage: RequestStage, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"myaccount_auth_request_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}
