//! Client-level error types shared across the pipeline, the vault, and the facade.

// self
use crate::{_prelude::*, store::StoreError, vault::VaultError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Login or token acquisition failed.
	#[error(transparent)]
	Authentication(#[from] AuthError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Network(#[from] TransportError),
	/// The API answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Credential vault failure.
	#[error(transparent)]
	Vault(#[from] VaultError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Request was rejected locally before anything was sent.
	#[error("Validation failed for `{field}`: {message}.")]
	Validation {
		/// Offending request field.
		field: &'static str,
		/// Human-readable reason.
		message: String,
	},
	/// A success response carried a body that is not a valid envelope.
	#[error("Response with status {status} is not a valid envelope.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// The request context was cancelled.
	#[error("Request was cancelled.")]
	Cancelled,
	/// The request context's deadline elapsed.
	#[error("Request deadline exceeded.")]
	DeadlineExceeded,
}
impl Error {
	/// Returns `true` for the two context-termination outcomes.
	pub fn is_cancellation(&self) -> bool {
		matches!(self, Self::Cancelled | Self::DeadlineExceeded)
	}
}
impl From<StoreError> for Error {
	fn from(e: StoreError) -> Self {
		Self::Vault(VaultError::Store(e))
	}
}

/// Failures raised while obtaining a bearer token.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// The login call never produced a response.
	#[error("Network error occurred while calling the login endpoint.")]
	Network {
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// The login endpoint answered with a non-success status.
	#[error("Login rejected with status {status}: {message}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Server-supplied message.
		message: String,
	},
	/// The login response body could not be parsed.
	#[error("Login endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The login envelope did not carry a token.
	#[error("Login response did not contain a token.")]
	MissingToken,
}

/// Non-success business response returned by the API.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("API request to `{endpoint}` failed with status {status}: {message}.")]
pub struct ApiError {
	/// Status code reported by the server.
	pub status: u16,
	/// Server-supplied message.
	pub message: String,
	/// Optional server-supplied details.
	pub details: Option<String>,
	/// Path of the endpoint that failed.
	pub endpoint: String,
}
impl ApiError {
	/// 4xx statuses.
	pub fn is_client_error(&self) -> bool {
		(400..500).contains(&self.status)
	}

	/// 5xx statuses.
	pub fn is_server_error(&self) -> bool {
		self.status >= 500
	}

	/// 401 Unauthorized.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// 403 Forbidden.
	pub fn is_forbidden(&self) -> bool {
		self.status == 403
	}

	/// 404 Not Found.
	pub fn is_not_found(&self) -> bool {
		self.status == 404
	}

	/// 409 Conflict.
	pub fn is_conflict(&self) -> bool {
		self.status == 409
	}

	/// 429 Too Many Requests.
	pub fn is_rate_limited(&self) -> bool {
		self.status == 429
	}
}

/// Configuration and validation failures raised while building or reconfiguring a client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// A built request could not be handed to the HTTP client.
	#[error("HTTP request could not be converted for the client.")]
	RequestConversion {
		/// Underlying conversion failure.
		#[source]
		source: BoxError,
	},
	/// Base URL or request URL cannot be parsed.
	#[error("URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http/https.
	#[error("Base URL scheme `{scheme}` is not supported.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},

	/// Username or password is empty.
	#[error("Login credentials are missing.")]
	MissingCredentials,
	/// Rate-limit values are not positive.
	#[error("Rate limit requires a positive rate and burst, got {requests_per_second} rps / {burst}.")]
	InvalidRateLimit {
		/// Requested refill rate.
		requests_per_second: f64,
		/// Requested burst capacity.
		burst: u32,
	},
	/// Signing secret is empty.
	#[error("Signing secret must not be empty.")]
	EmptySigningSecret,
	/// Vault password is empty.
	#[error("Encryption password must not be empty.")]
	EmptyEncryptionPassword,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a failure converting a request into the client's own type.
	pub fn request_conversion(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::RequestConversion { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeouts, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client gave up waiting.
	#[error("Request to the API timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout { source: Box::new(e) } } else { Self::network(e) }
	}
}
