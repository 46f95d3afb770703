// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"wage_advance_client_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

pub(crate) fn record_retry(status: Option<u16>) {
	#[cfg(feature = "metrics")]
	{
		let cause = if status.is_some() { "status" } else { "network" };

		metrics::counter!("wage_advance_client_retry_total", "cause" => cause).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = status;
	}
}

pub(crate) fn record_admission_delay() {
	#[cfg(feature = "metrics")]
	metrics::counter!("wage_advance_client_admission_delay_total").increment(1);
}
