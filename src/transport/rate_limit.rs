//! Token-bucket admission controller and the transport layer that applies it.
//!
//! A bucket holds up to `burst` permits and refills continuously at `requests_per_second`.
//! Refill and spend happen as one step under a single lock, so permits are never
//! double-spent. A disabled limiter admits everything, letting callers skip branching on
//! whether limiting is configured.

// crates.io
use tokio::time::Instant;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{HttpRequest, Transport, TransportFuture},
	obs,
};

#[derive(Debug)]
struct TokenBucket {
	available: f64,
	capacity: f64,
	refill_per_second: f64,
	last_refill_at: Instant,
}
impl TokenBucket {
	fn projected(&self, now: Instant) -> f64 {
		let elapsed = now.saturating_duration_since(self.last_refill_at).as_secs_f64();

		(self.available + elapsed * self.refill_per_second).min(self.capacity)
	}

	fn refill(&mut self, now: Instant) {
		self.available = self.projected(now);
		self.last_refill_at = now;
	}

	fn try_take(&mut self, now: Instant) -> Result<(), StdDuration> {
		self.refill(now);

		if self.available >= 1.0 {
			self.available -= 1.0;

			return Ok(());
		}

		let deficit = (1.0 - self.available) / self.refill_per_second;

		Err(StdDuration::try_from_secs_f64(deficit)
			.unwrap_or(StdDuration::MAX)
			.max(RateLimiter::MIN_WAIT))
	}
}

/// Token-bucket limiter shared by every request sent through one transport chain.
#[derive(Debug)]
pub struct RateLimiter {
	bucket: Option<Mutex<TokenBucket>>,
}
impl RateLimiter {
	/// Shortest suspension used while waiting for a permit.
	pub const MIN_WAIT: StdDuration = StdDuration::from_millis(1);

	/// Creates a full bucket of `burst` permits refilling at `requests_per_second`.
	pub fn new(requests_per_second: f64, burst: u32) -> Result<Self, ConfigError> {
		if !(requests_per_second.is_finite() && requests_per_second > 0.0) || burst == 0 {
			return Err(ConfigError::InvalidRateLimit { requests_per_second, burst });
		}

		let capacity = f64::from(burst);
		let bucket = TokenBucket {
			available: capacity,
			capacity,
			refill_per_second: requests_per_second,
			last_refill_at: Instant::now(),
		};

		Ok(Self { bucket: Some(Mutex::new(bucket)) })
	}

	/// Limiter that admits every request immediately.
	pub fn disabled() -> Self {
		Self { bucket: None }
	}

	/// Returns `true` when a bucket is configured.
	pub fn is_enabled(&self) -> bool {
		self.bucket.is_some()
	}

	/// Refill rate in permits per second, when enabled.
	pub fn requests_per_second(&self) -> Option<f64> {
		self.bucket.as_ref().map(|bucket| bucket.lock().refill_per_second)
	}

	/// Bucket capacity, when enabled.
	pub fn burst(&self) -> Option<u32> {
		self.bucket.as_ref().map(|bucket| bucket.lock().capacity as u32)
	}

	/// Takes one permit if available.
	pub fn allow(&self) -> bool {
		self.allow_at(Instant::now())
	}

	/// Takes one permit if available at `now`.
	pub fn allow_at(&self, now: Instant) -> bool {
		self.try_acquire_at(now).is_ok()
	}

	/// Takes one permit at `now`, or reports how long until one refills.
	pub fn try_acquire_at(&self, now: Instant) -> Result<(), StdDuration> {
		match &self.bucket {
			Some(bucket) => bucket.lock().try_take(now),
			None => Ok(()),
		}
	}

	/// Suspends until a permit is taken or `ctx` finishes.
	pub async fn wait(&self, ctx: &RequestContext) -> Result<()> {
		loop {
			ctx.check()?;

			match self.try_acquire_at(Instant::now()) {
				Ok(()) => return Ok(()),
				Err(wait) => {
					obs::admission_delayed(wait);
					ctx.sleep(wait).await?;
				},
			}
		}
	}

	/// Permits available right now, without spending or refilling the bucket.
	pub fn available_tokens(&self) -> Option<f64> {
		self.available_tokens_at(Instant::now())
	}

	/// Permits available at `now`, without spending or refilling the bucket.
	pub fn available_tokens_at(&self, now: Instant) -> Option<f64> {
		self.bucket.as_ref().map(|bucket| bucket.lock().projected(now))
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		Self::disabled()
	}
}

/// Transport layer that waits for a permit before delegating.
pub struct AdmissionLayer<T> {
	limiter: Arc<RateLimiter>,
	inner: T,
}
impl<T> AdmissionLayer<T>
where
	T: Transport,
{
	/// Gates `inner` behind `limiter`.
	pub fn new(limiter: Arc<RateLimiter>, inner: T) -> Self {
		Self { limiter, inner }
	}
}
impl<T> Transport for AdmissionLayer<T>
where
	T: Transport,
{
	fn send<'a>(&'a self, ctx: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a> {
		Box::pin(async move {
			self.limiter.wait(ctx).await?;
			self.inner.send(ctx, request).await
		})
	}
}
