// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by pipeline flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("wage_advance_client.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

pub(crate) fn emit_retry_scheduled(attempt: u32, delay: StdDuration, status: Option<u16>) {
	#[cfg(feature = "tracing")]
	tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, ?status, "retry scheduled");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (attempt, delay, status);
	}
}

pub(crate) fn emit_admission_delayed(wait: StdDuration) {
	#[cfg(feature = "tracing")]
	tracing::debug!(wait_ms = wait.as_millis() as u64, "admission delayed");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = wait;
	}
}

pub(crate) fn emit_token_refreshed(expires_at: OffsetDateTime, from_claim: bool) {
	#[cfg(feature = "tracing")]
	tracing::debug!(expires_at = expires_at.unix_timestamp(), from_claim, "bearer token refreshed");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (expires_at, from_claim);
	}
}
