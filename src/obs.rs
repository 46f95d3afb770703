//! Optional observability helpers for the request pipeline.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `wage_advance_client.flow` with the `flow`
//!   and `stage` fields, plus debug events for retries, admission delays, and token refreshes.
//! - Enable `metrics` to increment the `wage_advance_client_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and the retry/admission counters.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Pipeline flows observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Bearer-token login.
	Login,
	/// Business request through the transport chain.
	Request,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Login => "login",
			FlowKind::Request => "request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records that the retry layer scheduled another attempt after `delay`.
pub fn retry_scheduled(attempt: u32, delay: StdDuration, status: Option<u16>) {
	tracing::emit_retry_scheduled(attempt, delay, status);
	metrics::record_retry(status);
}

/// Records that the admission controller suspended a caller for `wait`.
pub fn admission_delayed(wait: StdDuration) {
	tracing::emit_admission_delayed(wait);
	metrics::record_admission_delay();
}

/// Records a freshly cached bearer token.
pub fn token_refreshed(expires_at: OffsetDateTime, from_claim: bool) {
	tracing::emit_token_refreshed(expires_at, from_claim);
}
