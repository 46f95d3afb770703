//! Exponential-backoff retry layer.
//!
//! Each attempt sends a fresh clone of the original request, so the layers beneath re-sign and
//! re-admit it. Network errors and 5xx responses are retried while budget remains; anything in
//! `[200, 500)` and every non-network error is returned immediately. Once the budget is spent,
//! the last outcome is returned as-is.

// self
use crate::{
	_prelude::*,
	http::{self, HttpRequest, Transport, TransportFuture},
	obs,
};

/// Retry budget and backoff base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Attempts allowed after the first one.
	pub max_retries: u32,
	/// Delay before the first retry; doubles for each further retry.
	pub base_delay: StdDuration,
}
impl RetryPolicy {
	/// Creates a policy with `max_retries` extra attempts.
	pub fn new(max_retries: u32, base_delay: StdDuration) -> Self {
		Self { max_retries, base_delay }
	}

	/// Policy that never retries.
	pub fn disabled() -> Self {
		Self::new(0, StdDuration::ZERO)
	}

	/// Returns `true` when at least one retry is allowed.
	pub fn is_enabled(&self) -> bool {
		self.max_retries > 0
	}

	/// Backoff before retry number `attempt + 1`: `base_delay * 2^attempt`.
	pub fn delay_for(&self, attempt: u32) -> StdDuration {
		let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);

		self.base_delay.saturating_mul(factor)
	}

	/// Classifies an outcome: `Some(status)` for a retryable response, `Some(None)` for a
	/// retryable network error, `None` when the outcome is final.
	fn retryable(outcome: &Result<http::HttpResponse>) -> Option<Option<u16>> {
		match outcome {
			Ok(response) if response.status().is_server_error() =>
				Some(Some(response.status().as_u16())),
			Err(Error::Network(_)) => Some(None),
			_ => None,
		}
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::disabled()
	}
}

/// Transport layer that retries transient failures of `inner`.
pub struct RetryLayer<T> {
	policy: RetryPolicy,
	inner: T,
}
impl<T> RetryLayer<T>
where
	T: Transport,
{
	/// Wraps `inner` with `policy`.
	pub fn new(policy: RetryPolicy, inner: T) -> Self {
		Self { policy, inner }
	}
}
impl<T> Transport for RetryLayer<T>
where
	T: Transport,
{
	fn send<'a>(&'a self, ctx: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a> {
		Box::pin(async move {
			let mut attempt = 0;

			loop {
				let outcome = self.inner.send(ctx, http::clone_request(&request)).await;

				if attempt >= self.policy.max_retries {
					return outcome;
				}

				let Some(status) = RetryPolicy::retryable(&outcome) else {
					return outcome;
				};
				let delay = self.policy.delay_for(attempt);

				obs::retry_scheduled(attempt + 1, delay, status);
				ctx.sleep(delay).await?;

				attempt += 1;
			}
		})
	}
}
