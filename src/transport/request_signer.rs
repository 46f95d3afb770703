//! HMAC-SHA256 request signing and verification.
//!
//! The canonical string is six newline-joined lines:
//!
//! 1. HTTP method
//! 2. URL path
//! 3. raw query with its `&`-separated tokens sorted as whole strings
//! 4. `name:value` lines for `authorization`, `content-type`, `x-timestamp` (present ones only)
//! 5. lowercase hex SHA-256 of the body
//! 6. Unix timestamp in seconds
//!
//! The signature is the lowercase hex HMAC of that string and travels in `X-Signature` next to
//! the `X-Timestamp` it was computed for.

// crates.io
use ::http::{HeaderValue, header::HeaderName};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::{HttpRequest, Transport, TransportFuture},
};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signing timestamp.
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
/// Header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

const SIGNED_HEADERS: [&str; 3] = ["authorization", "content-type", "x-timestamp"];

/// Fields of one request that the signature binds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningContext {
	/// HTTP method, verbatim.
	pub method: String,
	/// URL path without host or query.
	pub path: String,
	/// Query tokens sorted lexicographically.
	pub sorted_query: String,
	/// Selected header lines.
	pub headers: String,
	/// Hex SHA-256 of the body.
	pub body_hash: String,
	/// Unix timestamp in seconds.
	pub timestamp: i64,
}
impl SigningContext {
	/// Captures the signed fields of `request` for `timestamp`.
	pub fn from_request(request: &HttpRequest, timestamp: i64) -> Self {
		let uri = request.uri();
		let sorted_query = match uri.query() {
			Some(query) if !query.is_empty() => {
				let mut tokens = query.split('&').collect::<Vec<_>>();

				tokens.sort_unstable();
				tokens.join("&")
			},
			_ => String::new(),
		};
		let headers = SIGNED_HEADERS
			.iter()
			.filter_map(|name| {
				let value = request.headers().get(*name)?;

				if value.is_empty() {
					return None;
				}

				Some(format!("{name}:{}", String::from_utf8_lossy(value.as_bytes()).trim()))
			})
			.collect::<Vec<_>>()
			.join("\n");

		Self {
			method: request.method().as_str().to_owned(),
			path: uri.path().to_owned(),
			sorted_query,
			headers,
			body_hash: hex::encode(Sha256::digest(request.body())),
			timestamp,
		}
	}

	/// Joins the six canonical lines.
	pub fn canonical_string(&self) -> String {
		[
			self.method.as_str(),
			self.path.as_str(),
			self.sorted_query.as_str(),
			self.headers.as_str(),
			self.body_hash.as_str(),
			&self.timestamp.to_string(),
		]
		.join("\n")
	}
}

/// Signs outgoing requests with a shared secret, or does nothing when disabled.
#[derive(Clone)]
pub struct RequestSigner {
	mac: Option<HmacSha256>,
}
impl RequestSigner {
	/// Maximum age (or future skew) of an accepted timestamp, in seconds.
	pub const REPLAY_WINDOW_SECS: i64 = 300;

	/// Creates a signer keyed by `secret`.
	pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, ConfigError> {
		let secret = secret.as_ref();

		if secret.is_empty() {
			return Err(ConfigError::EmptySigningSecret);
		}

		let mac = HmacSha256::new_from_slice(secret).map_err(|_| ConfigError::EmptySigningSecret)?;

		Ok(Self { mac: Some(mac) })
	}

	/// Signer that leaves requests untouched.
	pub fn disabled() -> Self {
		Self { mac: None }
	}

	/// Returns `true` when a secret is configured.
	pub fn is_enabled(&self) -> bool {
		self.mac.is_some()
	}

	/// Stamps `X-Timestamp` with the current time and sets `X-Signature`.
	pub fn sign_request(&self, request: &mut HttpRequest) -> Result<Option<String>, ConfigError> {
		self.sign_request_at(request, OffsetDateTime::now_utc().unix_timestamp())
	}

	/// Stamps `X-Timestamp` with `timestamp` and sets `X-Signature`.
	///
	/// Returns the signature, or `None` for a disabled signer.
	pub fn sign_request_at(
		&self,
		request: &mut HttpRequest,
		timestamp: i64,
	) -> Result<Option<String>, ConfigError> {
		let Some(mac) = &self.mac else {
			return Ok(None);
		};

		request
			.headers_mut()
			.insert(HeaderName::from_static(TIMESTAMP_HEADER), HeaderValue::from(timestamp));

		let context = SigningContext::from_request(request, timestamp);
		let signature = hex::encode(Self::tag(mac, &context));
		let value = HeaderValue::from_str(&signature).map_err(::http::Error::from)?;

		request.headers_mut().insert(HeaderName::from_static(SIGNATURE_HEADER), value);

		Ok(Some(signature))
	}

	/// Checks `signature` against `request` at the current time.
	pub fn verify_signature(&self, request: &HttpRequest, signature: &str) -> bool {
		self.verify_signature_at(request, signature, OffsetDateTime::now_utc().unix_timestamp())
	}

	/// Checks `signature` against `request` as if the current time were `now`.
	///
	/// A disabled signer accepts everything.
	pub fn verify_signature_at(&self, request: &HttpRequest, signature: &str, now: i64) -> bool {
		let Some(mac) = &self.mac else {
			return true;
		};
		let Some(timestamp) = request
			.headers()
			.get(TIMESTAMP_HEADER)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.parse::<i64>().ok())
		else {
			return false;
		};

		if now.abs_diff(timestamp) > Self::REPLAY_WINDOW_SECS.unsigned_abs() {
			return false;
		}

		// Signatures are canonical lowercase hex; other spellings never match.
		if signature.bytes().any(|b| b.is_ascii_uppercase()) {
			return false;
		}

		let Ok(expected) = hex::decode(signature) else {
			return false;
		};
		let mut mac = mac.clone();

		mac.update(SigningContext::from_request(request, timestamp).canonical_string().as_bytes());
		mac.verify_slice(&expected).is_ok()
	}

	fn tag(mac: &HmacSha256, context: &SigningContext) -> Vec<u8> {
		let mut mac = mac.clone();

		mac.update(context.canonical_string().as_bytes());

		mac.finalize().into_bytes().to_vec()
	}
}
impl Debug for RequestSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestSigner").field("enabled", &self.is_enabled()).finish()
	}
}
impl Default for RequestSigner {
	fn default() -> Self {
		Self::disabled()
	}
}

/// Transport layer that signs every request before delegating.
pub struct SigningLayer<T> {
	signer: Arc<RequestSigner>,
	inner: T,
}
impl<T> SigningLayer<T>
where
	T: Transport,
{
	/// Signs requests for `inner` with `signer`.
	pub fn new(signer: Arc<RequestSigner>, inner: T) -> Self {
		Self { signer, inner }
	}
}
impl<T> Transport for SigningLayer<T>
where
	T: Transport,
{
	fn send<'a>(
		&'a self,
		ctx: &'a RequestContext,
		mut request: HttpRequest,
	) -> TransportFuture<'a> {
		Box::pin(async move {
			self.signer.sign_request(&mut request)?;
			self.inner.send(ctx, request).await
		})
	}
}
