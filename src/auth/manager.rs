//! Bearer-token lifecycle with a read-mostly cache and a single-flight login.
//!
//! [`TokenManager::token`] answers from the cache under a shared read lock while the token is
//! valid. Otherwise callers queue on a separate refresh lock, re-check the cache once they
//! hold it, and only the first of them performs the login call. A failed login never touches
//! the cache, so concurrent readers keep using a still-valid token and the next caller simply
//! tries again.

// crates.io
use ::http::{
	Method, Request,
	header::{ACCEPT, CONTENT_TYPE},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, LoginMetrics, Secret, claims},
	envelope::{self, ApiEnvelope, ErrorEnvelope, LoginRequest},
	error::{AuthError, ConfigError},
	http::Transport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Caches one bearer token and refreshes it through the base transport.
pub struct TokenManager {
	login_url: Url,
	username: String,
	password: Secret,
	transport: Arc<dyn Transport>,
	token: RwLock<Option<BearerToken>>,
	refresh_guard: AsyncMutex<()>,
	metrics: Arc<LoginMetrics>,
}
impl TokenManager {
	/// Lifetime assumed for tokens whose expiry claim cannot be read.
	pub const FALLBACK_LIFETIME: Duration = Duration::hours(23);

	/// Creates a manager that logs in at `login_url` with the provided credentials.
	pub fn new(
		login_url: Url,
		username: impl Into<String>,
		password: impl Into<Secret>,
		transport: Arc<dyn Transport>,
	) -> Result<Self, ConfigError> {
		let username = username.into();
		let password = password.into();

		if username.is_empty() || password.is_empty() {
			return Err(ConfigError::MissingCredentials);
		}

		Ok(Self {
			login_url,
			username,
			password,
			transport,
			token: RwLock::new(None),
			refresh_guard: AsyncMutex::new(()),
			metrics: Default::default(),
		})
	}

	/// Returns a valid bearer token, logging in at most once across concurrent callers.
	pub async fn token(&self, ctx: &RequestContext) -> Result<Secret> {
		if let Some(token) = self.valid_token() {
			return Ok(token);
		}

		let _singleflight = ctx.run(self.refresh_guard.lock()).await?;

		if let Some(token) = self.valid_token() {
			return Ok(token);
		}

		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		match span.instrument(self.login(ctx)).await {
			Ok(bearer) => {
				let value = bearer.secret().clone();

				*self.token.write() = Some(bearer);

				self.metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(value)
			},
			Err(e) => {
				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Err(e)
			},
		}
	}

	/// Returns a snapshot of the cached token, valid or not.
	pub fn cached(&self) -> Option<BearerToken> {
		self.token.read().clone()
	}

	/// Drops the cached token so the next call logs in again.
	pub fn clear_token(&self) {
		*self.token.write() = None;
	}

	/// Login counters for this manager.
	pub fn metrics(&self) -> &LoginMetrics {
		&self.metrics
	}

	fn valid_token(&self) -> Option<Secret> {
		let now = OffsetDateTime::now_utc();
		let guard = self.token.read();
		let token = guard.as_ref().filter(|token| token.is_valid_at(now))?;

		self.metrics.record_cache_hit();

		Some(token.secret().clone())
	}

	async fn login(&self, ctx: &RequestContext) -> Result<BearerToken> {
		let payload = LoginRequest { username: &self.username, password: self.password.expose() };
		let body = serde_json::to_vec(&payload)
			.map_err(|e| Error::Validation { field: "credentials", message: e.to_string() })?;
		let request = Request::builder()
			.method(Method::POST)
			.uri(self.login_url.as_str())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(body)
			.map_err(ConfigError::from)?;
		let response = match self.transport.send(ctx, request).await {
			Ok(response) => response,
			Err(Error::Network(source)) => return Err(AuthError::Network { source }.into()),
			Err(e) => return Err(e),
		};
		let status = response.status();

		if !status.is_success() {
			let message = ErrorEnvelope::parse(response.body())
				.map(|envelope| envelope.message)
				.filter(|message| !message.is_empty())
				.unwrap_or_else(|| format!("Login failed with status code {}", status.as_u16()));

			return Err(AuthError::Rejected { status: status.as_u16(), message }.into());
		}

		let envelope: ApiEnvelope<Value> = envelope::decode(response.body())
			.map_err(|source| AuthError::MalformedResponse { source })?;
		let token = envelope
			.data
			.as_ref()
			.and_then(|data| data.get("token"))
			.and_then(Value::as_str)
			.filter(|token| !token.is_empty())
			.ok_or(AuthError::MissingToken)?;
		let (expires_at, from_claim) = match claims::expiry(token) {
			Some(expires_at) => (expires_at, true),
			None => (OffsetDateTime::now_utc() + Self::FALLBACK_LIFETIME, false),
		};

		obs::token_refreshed(expires_at, from_claim);

		Ok(BearerToken::new(token, expires_at))
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("login_url", &self.login_url.as_str())
			.field("username", &self.username)
			.field("token_cached", &self.token.read().is_some())
			.finish()
	}
}
