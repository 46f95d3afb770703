//! Composable transport chain wrapped around the base HTTP transport.
//!
//! Layers, outermost first:
//!
//! 1. [`RetryLayer`] clones the request per attempt and backs off on 5xx or network errors.
//! 2. [`SigningLayer`] stamps a fresh `X-Timestamp`/`X-Signature` on every attempt.
//! 3. [`AdmissionLayer`] waits for a token-bucket permit on every attempt.
//! 4. The base [`Transport`].
//!
//! A fully formed request is signed before it is admitted, and every retry re-enters beneath
//! the retry layer so it is re-signed and rate-limited like a first attempt. A chain is
//! immutable; reconfiguration builds a new one that shares the untouched components.

pub mod rate_limit;
pub mod request_signer;
pub mod retry;

pub use rate_limit::*;
pub use request_signer::*;
pub use retry::*;

// self
use crate::{
	_prelude::*,
	http::{HttpRequest, Transport, TransportFuture},
};

type Stack = RetryLayer<SigningLayer<AdmissionLayer<Arc<dyn Transport>>>>;

/// Immutable Retry → Signing → Admission → base pipeline.
pub struct TransportChain {
	retry: RetryPolicy,
	signer: Arc<RequestSigner>,
	limiter: Arc<RateLimiter>,
	base: Arc<dyn Transport>,
	stack: Stack,
}
impl TransportChain {
	/// Starts a chain around `base` with every layer disabled.
	pub fn builder(base: Arc<dyn Transport>) -> TransportChainBuilder {
		TransportChainBuilder {
			base,
			retry: RetryPolicy::disabled(),
			signer: Default::default(),
			limiter: Default::default(),
		}
	}

	/// Retry policy of the outermost layer.
	pub fn retry_policy(&self) -> RetryPolicy {
		self.retry
	}

	/// Signer used by the signing layer.
	pub fn signer(&self) -> &Arc<RequestSigner> {
		&self.signer
	}

	/// Limiter used by the admission layer.
	pub fn limiter(&self) -> &Arc<RateLimiter> {
		&self.limiter
	}

	/// Transport at the bottom of the chain.
	pub fn base(&self) -> &Arc<dyn Transport> {
		&self.base
	}

	/// Builder pre-filled with this chain's components.
	pub fn to_builder(&self) -> TransportChainBuilder {
		TransportChainBuilder {
			base: self.base.clone(),
			retry: self.retry,
			signer: self.signer.clone(),
			limiter: self.limiter.clone(),
		}
	}
}
impl Transport for TransportChain {
	fn send<'a>(&'a self, ctx: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a> {
		self.stack.send(ctx, request)
	}
}
impl Debug for TransportChain {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TransportChain")
			.field("retry", &self.retry)
			.field("signer", &self.signer)
			.field("limiter", &self.limiter)
			.finish()
	}
}

/// Builder for [`TransportChain`].
#[derive(Clone)]
pub struct TransportChainBuilder {
	base: Arc<dyn Transport>,
	retry: RetryPolicy,
	signer: Arc<RequestSigner>,
	limiter: Arc<RateLimiter>,
}
impl TransportChainBuilder {
	/// Sets the retry policy.
	pub fn retry(mut self, policy: RetryPolicy) -> Self {
		self.retry = policy;

		self
	}

	/// Sets the request signer.
	pub fn signer(mut self, signer: impl Into<Arc<RequestSigner>>) -> Self {
		self.signer = signer.into();

		self
	}

	/// Sets the admission limiter.
	pub fn limiter(mut self, limiter: impl Into<Arc<RateLimiter>>) -> Self {
		self.limiter = limiter.into();

		self
	}

	/// Assembles the layers.
	pub fn build(self) -> TransportChain {
		let admission = AdmissionLayer::new(self.limiter.clone(), self.base.clone());
		let signing = SigningLayer::new(self.signer.clone(), admission);
		let stack = RetryLayer::new(self.retry, signing);

		TransportChain {
			retry: self.retry,
			signer: self.signer,
			limiter: self.limiter,
			base: self.base,
			stack,
		}
	}
}
