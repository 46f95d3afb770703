//! Validated client configuration.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::ConfigError,
	store::CredentialStore,
	transport::RetryPolicy,
};

/// Token-bucket settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateLimitConfig {
	/// Refill rate in permits per second.
	pub requests_per_second: f64,
	/// Bucket capacity.
	pub burst: u32,
}
impl RateLimitConfig {
	/// Creates a configuration with the given rate and burst.
	pub fn new(requests_per_second: f64, burst: u32) -> Self {
		Self { requests_per_second, burst }
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.requests_per_second.is_finite() && self.requests_per_second > 0.0 && self.burst > 0
		{
			Ok(())
		} else {
			Err(ConfigError::InvalidRateLimit {
				requests_per_second: self.requests_per_second,
				burst: self.burst,
			})
		}
	}
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		Self::new(10.0, 20)
	}
}

/// Everything a [`Client`](crate::Client) needs at construction time.
#[derive(Clone)]
pub struct ClientConfig {
	/// API root; its path prefix is kept when joining request paths.
	pub base_url: Url,
	/// Login account name.
	pub username: String,
	/// Login password.
	pub password: Secret,
	/// Per-request timeout of the bundled transport.
	pub timeout: StdDuration,
	/// Admission control, when enabled.
	pub rate_limit: Option<RateLimitConfig>,
	/// Retry budget of the transport chain.
	pub retry: RetryPolicy,
	/// HMAC secret, when request signing is enabled.
	pub signing_secret: Option<Secret>,
	/// Vault password, when credential encryption is enabled.
	pub encryption_password: Option<Secret>,
	/// Store backing the vault; defaults to a [`MemoryStore`](crate::store::MemoryStore).
	pub credential_store: Option<Arc<dyn CredentialStore>>,
}
impl ClientConfig {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Starts a builder for the API rooted at `base_url`.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Joins `path` onto the base URL, keeping the base path prefix.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let path = path.trim_start_matches('/');

		Url::parse(&format!("{base}/{path}")).map_err(|source| ConfigError::InvalidUrl { source })
	}

	/// URL of the login endpoint.
	pub fn login_url(&self) -> Result<Url, ConfigError> {
		self.endpoint("/auth/login")
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("base_url", &self.base_url.as_str())
			.field("username", &self.username)
			.field("password", &self.password)
			.field("timeout", &self.timeout)
			.field("rate_limit", &self.rate_limit)
			.field("retry", &self.retry)
			.field("signing_enabled", &self.signing_secret.is_some())
			.field("encryption_enabled", &self.encryption_password.is_some())
			.field("custom_store", &self.credential_store.is_some())
			.finish()
	}
}

/// Builder for [`ClientConfig`] values.
pub struct ClientConfigBuilder {
	base_url: Url,
	username: String,
	password: Secret,
	timeout: StdDuration,
	rate_limit: Option<RateLimitConfig>,
	retry: RetryPolicy,
	signing_secret: Option<Secret>,
	encryption_password: Option<Secret>,
	credential_store: Option<Arc<dyn CredentialStore>>,
}
impl ClientConfigBuilder {
	/// Creates a builder seeded with defaults and the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			username: String::new(),
			password: Secret::new(""),
			timeout: ClientConfig::DEFAULT_TIMEOUT,
			rate_limit: None,
			retry: RetryPolicy::disabled(),
			signing_secret: None,
			encryption_password: None,
			credential_store: None,
		}
	}

	/// Sets the login credentials.
	pub fn credentials(mut self, username: impl Into<String>, password: impl Into<Secret>) -> Self {
		self.username = username.into();
		self.password = password.into();

		self
	}

	/// Overrides the per-request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Enables admission control.
	pub fn rate_limit(mut self, requests_per_second: f64, burst: u32) -> Self {
		self.rate_limit = Some(RateLimitConfig::new(requests_per_second, burst));

		self
	}

	/// Enables admission control with 10 rps and a burst of 20.
	pub fn default_rate_limit(mut self) -> Self {
		self.rate_limit = Some(RateLimitConfig::default());

		self
	}

	/// Enables retries.
	pub fn retry(mut self, max_retries: u32, base_delay: StdDuration) -> Self {
		self.retry = RetryPolicy::new(max_retries, base_delay);

		self
	}

	/// Enables HMAC request signing.
	pub fn signing_secret(mut self, secret: impl Into<Secret>) -> Self {
		self.signing_secret = Some(secret.into());

		self
	}

	/// Enables the credential vault.
	pub fn encryption_password(mut self, password: impl Into<Secret>) -> Self {
		self.encryption_password = Some(password.into());

		self
	}

	/// Backs the vault with a caller-supplied store.
	pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
		self.credential_store = Some(store);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut base_url = self.base_url;

		if !matches!(base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { scheme: base_url.scheme().to_owned() });
		}
		if self.username.is_empty() || self.password.is_empty() {
			return Err(ConfigError::MissingCredentials);
		}
		if let Some(rate_limit) = &self.rate_limit {
			rate_limit.validate()?;
		}
		if self.signing_secret.as_ref().is_some_and(Secret::is_empty) {
			return Err(ConfigError::EmptySigningSecret);
		}
		if self.encryption_password.as_ref().is_some_and(Secret::is_empty) {
			return Err(ConfigError::EmptyEncryptionPassword);
		}

		base_url.set_query(None);
		base_url.set_fragment(None);

		Ok(ClientConfig {
			base_url,
			username: self.username,
			password: self.password,
			timeout: self.timeout,
			rate_limit: self.rate_limit,
			retry: self.retry,
			signing_secret: self.signing_secret,
			encryption_password: self.encryption_password,
			credential_store: self.credential_store,
		})
	}
}
