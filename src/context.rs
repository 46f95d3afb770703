//! Per-call cancellation and deadline propagation.
//!
//! Every suspension point in the pipeline (admission waits, retry backoff, the login
//! refresh lock, and network I/O) races a [`RequestContext`] so callers can abandon a
//! logical request at any time and observe a distinct [`Error::Cancelled`] or
//! [`Error::DeadlineExceeded`] outcome.

// crates.io
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
// self
use crate::_prelude::*;

/// Cancellation handle plus an optional deadline shared by one logical request.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
	token: CancellationToken,
	deadline: Option<Instant>,
}
impl RequestContext {
	/// Creates a context that never expires on its own.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a deadline `timeout` from now, keeping the earlier deadline if one exists.
	///
	/// A timeout too large to represent as an instant leaves the deadline unchanged.
	pub fn with_timeout(self, timeout: StdDuration) -> Self {
		match Instant::now().checked_add(timeout) {
			Some(deadline) => self.with_deadline(deadline),
			None => self,
		}
	}

	/// Sets an absolute deadline, keeping the earlier deadline if one exists.
	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(match self.deadline {
			Some(current) if current < deadline => current,
			_ => deadline,
		});

		self
	}

	/// Derives a context that is cancelled with `self` but can also be cancelled on its own.
	pub fn child(&self) -> Self {
		Self { token: self.token.child_token(), deadline: self.deadline }
	}

	/// Cancels this context and every child derived from it.
	pub fn cancel(&self) {
		self.token.cancel();
	}

	/// Returns the configured deadline, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Returns the termination reason if the context is already done.
	pub fn err(&self) -> Option<Error> {
		if self.token.is_cancelled() {
			return Some(Error::Cancelled);
		}
		if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
			return Some(Error::DeadlineExceeded);
		}

		None
	}

	/// Fails fast when the context is already done.
	pub fn check(&self) -> Result<()> {
		match self.err() {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}

	/// Resolves once the context is cancelled or its deadline passes.
	pub async fn done(&self) -> Error {
		match self.deadline {
			Some(deadline) => tokio::select! {
				biased;
				_ = self.token.cancelled() => Error::Cancelled,
				_ = tokio::time::sleep_until(deadline) => Error::DeadlineExceeded,
			},
			None => {
				self.token.cancelled().await;

				Error::Cancelled
			},
		}
	}

	/// Sleeps for `duration` unless the context finishes first.
	pub async fn sleep(&self, duration: StdDuration) -> Result<()> {
		self.run(tokio::time::sleep(duration)).await
	}

	/// Drives `fut` to completion unless the context finishes first.
	pub async fn run<F>(&self, fut: F) -> Result<F::Output>
	where
		F: Future,
	{
		self.check()?;

		tokio::select! {
			biased;
			err = self.done() => Err(err),
			output = fut => Ok(output),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn run_completes_when_context_stays_open() {
		let ctx = RequestContext::new();
		let value = ctx.run(async { 7 }).await.expect("Open context should run the future.");

		assert_eq!(value, 7);
	}

	#[tokio::test]
	async fn cancelled_context_short_circuits() {
		let ctx = RequestContext::new();

		ctx.cancel();

		assert!(matches!(ctx.err(), Some(Error::Cancelled)));
		assert!(matches!(ctx.sleep(StdDuration::from_secs(60)).await, Err(Error::Cancelled)));
	}

	#[tokio::test(start_paused = true)]
	async fn deadline_interrupts_sleep() {
		let ctx = RequestContext::new().with_timeout(StdDuration::from_millis(50));
		let started = Instant::now();
		let result = ctx.sleep(StdDuration::from_secs(10)).await;

		assert!(matches!(result, Err(Error::DeadlineExceeded)));
		assert!(started.elapsed() < StdDuration::from_secs(1));
	}

	#[tokio::test]
	async fn child_follows_parent_cancellation() {
		let parent = RequestContext::new();
		let child = parent.child();

		parent.cancel();

		assert!(matches!(child.done().await, Error::Cancelled));
	}

	#[test]
	fn unrepresentable_timeout_keeps_existing_deadline() {
		assert_eq!(RequestContext::new().with_timeout(StdDuration::MAX).deadline(), None);

		let bounded = RequestContext::new().with_timeout(StdDuration::from_secs(5));
		let deadline = bounded.deadline();

		assert!(deadline.is_some());
		assert_eq!(bounded.with_timeout(StdDuration::MAX).deadline(), deadline);
	}

	#[test]
	fn earlier_deadline_wins() {
		let now = Instant::now();
		let ctx = RequestContext::new()
			.with_deadline(now + StdDuration::from_secs(5))
			.with_deadline(now + StdDuration::from_secs(30));

		assert_eq!(ctx.deadline(), Some(now + StdDuration::from_secs(5)));
	}
}
