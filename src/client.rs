//! Request Executor facade.
//!
//! [`Client`] owns the token manager, the current [`TransportChain`] and the optional
//! credential vault. Every business call obtains a bearer token, builds the request against
//! the base URL, sends it through the chain and unwraps the `{statusCode, message, data}`
//! envelope. Reconfiguration builds a new chain and swaps it in; requests already in flight
//! finish on the chain they started with.

// crates.io
use ::http::{
	Method, Request,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenManager,
	config::{ClientConfig, RateLimitConfig},
	envelope::{self, ApiEnvelope, ErrorEnvelope},
	error::{ApiError, ConfigError},
	http::{HttpResponse, Transport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{CredentialStore, MemoryStore},
	transport::{RateLimiter, RequestSigner, RetryPolicy, TransportChain, TransportChainBuilder},
	vault::{CredentialVault, Credentials, VaultError},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const UNKNOWN_ERROR: &str = "Unknown error";

/// One business call: method, path relative to the base URL, query pairs and JSON body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path joined onto the base URL.
	pub path: String,
	/// Query pairs, appended in order.
	pub query: Vec<(String, String)>,
	/// Serialized JSON body.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request without query or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), body: None }
	}

	/// `GET path`.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST path`.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT path`.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `DELETE path`.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends one query pair.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Uses pre-serialized JSON bytes as the body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `value` as the JSON body.
	pub fn with_json<T>(self, value: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(value)
			.map_err(|e| Error::Validation { field: "body", message: e.to_string() })?;

		Ok(self.with_body(body))
	}

	fn validate(&self) -> Result<()> {
		let message = if self.path.trim().is_empty() {
			"must not be empty"
		} else if self.path.contains("://") {
			"must be relative to the base URL"
		} else if self.path.contains(['?', '#']) {
			"must not carry a query or fragment"
		} else if self.path.split(['/', '\\']).any(is_parent_segment) {
			"must not contain `..` segments"
		} else {
			return Ok(());
		};

		Err(Error::Validation { field: "path", message: message.into() })
	}
}

// `url` also resolves percent-encoded dots as a parent segment.
fn is_parent_segment(segment: &str) -> bool {
	["..", ".%2e", "%2e.", "%2e%2e"].iter().any(|dots| segment.eq_ignore_ascii_case(dots))
}

/// Unwrapped success response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Envelope message.
	pub message: String,
	/// Envelope `data` re-serialized as JSON; empty when the server sent none.
	pub data: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` when the envelope carried no `data`.
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Decodes `data` into `T`, reporting the failing JSON path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		envelope::decode(&self.data)
			.map_err(|source| Error::ResponseParse { source, status: self.status })
	}
}

/// Snapshot of the admission controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateLimitStatus {
	/// Whether admission control is on.
	pub enabled: bool,
	/// Configured rate and burst.
	pub limit: Option<RateLimitConfig>,
	/// Permits available right now.
	pub available_tokens: Option<f64>,
}

/// Which optional protections are active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SecurityStatus {
	/// Credential vault enabled.
	pub encryption: bool,
	/// Request signing enabled.
	pub signing: bool,
	/// Admission control enabled.
	pub rate_limiting: bool,
}

/// Client for the wage-advance API.
pub struct Client {
	config: ClientConfig,
	tokens: TokenManager,
	chain: RwLock<Arc<TransportChain>>,
	vault: RwLock<Option<Arc<CredentialVault>>>,
	credential_store: Arc<dyn CredentialStore>,
}
impl Client {
	/// Builds a client over the bundled reqwest transport.
	#[cfg(feature = "reqwest")]
	pub fn new(config: ClientConfig) -> Result<Self> {
		let transport = ReqwestTransport::new(config.timeout)?;

		Self::with_transport(config, Arc::new(transport))
	}

	/// Builds a client over a caller-supplied base transport.
	///
	/// The token manager logs in through `transport` directly; business calls go through the
	/// full chain built on top of it.
	pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
		let tokens = TokenManager::new(
			config.login_url()?,
			config.username.clone(),
			config.password.clone(),
			transport.clone(),
		)?;
		let mut builder = TransportChain::builder(transport).retry(config.retry);

		if let Some(limit) = config.rate_limit {
			builder = builder.limiter(RateLimiter::new(limit.requests_per_second, limit.burst)?);
		}
		if let Some(secret) = &config.signing_secret {
			builder = builder.signer(RequestSigner::new(secret.expose())?);
		}

		let credential_store: Arc<dyn CredentialStore> = match &config.credential_store {
			Some(store) => store.clone(),
			None => Arc::new(MemoryStore::default()),
		};
		let vault = match &config.encryption_password {
			Some(password) =>
				Some(Arc::new(CredentialVault::with_store(password.expose(), credential_store.clone())?)),
			None => None,
		};

		Ok(Self {
			config,
			tokens,
			chain: RwLock::new(Arc::new(builder.build())),
			vault: RwLock::new(vault),
			credential_store,
		})
	}

	/// Configuration the client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Token manager shared by every request.
	pub fn token_manager(&self) -> &TokenManager {
		&self.tokens
	}

	/// Chain that new requests are sent through.
	pub fn transport_chain(&self) -> Arc<TransportChain> {
		self.chain.read().clone()
	}

	/// Replaces the retry policy.
	pub fn configure_retry(&self, max_retries: u32, base_delay: StdDuration) {
		self.rebuild_chain(|builder| builder.retry(RetryPolicy::new(max_retries, base_delay)));
	}

	/// Replaces the admission controller with a full bucket.
	pub fn configure_rate_limit(&self, requests_per_second: f64, burst: u32) -> Result<()> {
		let limiter = RateLimiter::new(requests_per_second, burst)?;

		self.rebuild_chain(|builder| builder.limiter(limiter));

		Ok(())
	}

	/// Turns admission control off.
	pub fn disable_rate_limit(&self) {
		self.rebuild_chain(|builder| builder.limiter(RateLimiter::disabled()));
	}

	/// Signs every subsequent request with `secret`.
	pub fn enable_signing(&self, secret: &str) -> Result<()> {
		let signer = RequestSigner::new(secret)?;

		self.rebuild_chain(|builder| builder.signer(signer));

		Ok(())
	}

	/// Stops signing requests.
	pub fn disable_signing(&self) {
		self.rebuild_chain(|builder| builder.signer(RequestSigner::disabled()));
	}

	/// Opens a vault keyed by `password` over the configured credential store.
	pub fn enable_credential_encryption(&self, password: &str) -> Result<()> {
		let vault = CredentialVault::with_store(password, self.credential_store.clone())?;

		*self.vault.write() = Some(Arc::new(vault));

		Ok(())
	}

	/// Encrypts and stores a username/password pair under `key`.
	pub async fn store_secure_credentials(
		&self,
		key: &str,
		username: &str,
		password: &str,
	) -> Result<()> {
		Ok(self.vault()?.store_credentials(key, username, password).await?)
	}

	/// Loads and decrypts the pair stored under `key`.
	pub async fn retrieve_secure_credentials(&self, key: &str) -> Result<Credentials> {
		Ok(self.vault()?.retrieve_credentials(key).await?)
	}

	/// Removes the pair stored under `key`.
	pub async fn delete_secure_credentials(&self, key: &str) -> Result<()> {
		Ok(self.vault()?.delete_credentials(key).await?)
	}

	/// Reports whether a pair is stored under `key`.
	pub async fn secure_credentials_exist(&self, key: &str) -> Result<bool> {
		Ok(self.vault()?.credentials_exist(key).await?)
	}

	/// Drops the cached bearer token.
	pub fn logout(&self) {
		self.tokens.clear_token();
	}

	/// Current admission-controller settings and permit count.
	pub fn rate_limit_status(&self) -> RateLimitStatus {
		let chain = self.transport_chain();
		let limiter = chain.limiter();
		let limit = limiter
			.requests_per_second()
			.zip(limiter.burst())
			.map(|(requests_per_second, burst)| RateLimitConfig::new(requests_per_second, burst));

		RateLimitStatus {
			enabled: limiter.is_enabled(),
			limit,
			available_tokens: limiter.available_tokens(),
		}
	}

	/// Which of encryption, signing and rate limiting are on.
	pub fn security_status(&self) -> SecurityStatus {
		let chain = self.transport_chain();

		SecurityStatus {
			encryption: self.vault.read().is_some(),
			signing: chain.signer().is_enabled(),
			rate_limiting: chain.limiter().is_enabled(),
		}
	}

	/// Sends `request` with a bearer token through the transport chain and unwraps the
	/// response envelope.
	///
	/// Statuses of 400 and above become [`Error::Api`]; a success body that is not an envelope
	/// becomes [`Error::ResponseParse`].
	pub async fn execute_request(
		&self,
		ctx: &RequestContext,
		request: ApiRequest,
	) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "execute_request");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.execute(ctx, request)).await;
		let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

		obs::record_flow_outcome(KIND, outcome);

		result
	}

	/// `GET path`.
	pub async fn get(&self, ctx: &RequestContext, path: &str) -> Result<ApiResponse> {
		self.execute_request(ctx, ApiRequest::get(path)).await
	}

	/// `POST path` with a JSON body.
	pub async fn post<T>(&self, ctx: &RequestContext, path: &str, body: &T) -> Result<ApiResponse>
	where
		T: ?Sized + Serialize,
	{
		self.execute_request(ctx, ApiRequest::post(path).with_json(body)?).await
	}

	/// `PUT path` with a JSON body.
	pub async fn put<T>(&self, ctx: &RequestContext, path: &str, body: &T) -> Result<ApiResponse>
	where
		T: ?Sized + Serialize,
	{
		self.execute_request(ctx, ApiRequest::put(path).with_json(body)?).await
	}

	/// `DELETE path`.
	pub async fn delete(&self, ctx: &RequestContext, path: &str) -> Result<ApiResponse> {
		self.execute_request(ctx, ApiRequest::delete(path)).await
	}

	async fn execute(&self, ctx: &RequestContext, request: ApiRequest) -> Result<ApiResponse> {
		request.validate()?;

		let url = self.request_url(&request)?;
		let token = self.tokens.token(ctx).await?;
		let http_request = Request::builder()
			.method(request.method)
			.uri(url.as_str())
			.header(AUTHORIZATION, format!("Bearer {}", token.expose()))
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(request.body.unwrap_or_default())
			.map_err(ConfigError::from)?;
		let chain = self.transport_chain();
		let response = chain.send(ctx, http_request).await?;

		unwrap_envelope(&request.path, response)
	}

	fn request_url(&self, request: &ApiRequest) -> Result<Url> {
		let mut url = self.config.endpoint(&request.path)?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&request.query);
		}

		Ok(url)
	}

	fn rebuild_chain(&self, configure: impl FnOnce(TransportChainBuilder) -> TransportChainBuilder) {
		let mut chain = self.chain.write();

		*chain = Arc::new(configure(chain.to_builder()).build());
	}

	fn vault(&self) -> Result<Arc<CredentialVault>, VaultError> {
		self.vault.read().clone().ok_or(VaultError::EncryptionDisabled)
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("config", &self.config)
			.field("tokens", &self.tokens)
			.field("chain", &*self.chain.read())
			.field("encryption", &self.vault.read().is_some())
			.finish()
	}
}

fn unwrap_envelope(endpoint: &str, response: HttpResponse) -> Result<ApiResponse> {
	let status = response.status().as_u16();
	let body = response.into_body();

	if status >= 400 {
		return Err(api_error(endpoint, status, &body).into());
	}
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(ApiResponse { status, message: String::new(), data: Vec::new() });
	}

	let envelope: ApiEnvelope<Value> =
		envelope::decode(&body).map_err(|source| Error::ResponseParse { source, status })?;
	let data = match envelope.data {
		None | Some(Value::Null) => Vec::new(),
		Some(data) => data.to_string().into_bytes(),
	};

	Ok(ApiResponse { status, message: envelope.message, data })
}

fn api_error(endpoint: &str, status: u16, body: &[u8]) -> ApiError {
	let endpoint = endpoint.to_owned();

	match ErrorEnvelope::parse(body) {
		Some(envelope) => ApiError {
			status: if envelope.status_code == 0 { status } else { envelope.status_code },
			message: if envelope.message.is_empty() {
				UNKNOWN_ERROR.to_owned()
			} else {
				envelope.message
			},
			details: envelope.details.or(envelope.error),
			endpoint,
		},
		None => {
			let text = String::from_utf8_lossy(body).trim().to_owned();

			ApiError {
				status,
				message: UNKNOWN_ERROR.to_owned(),
				details: (!text.is_empty()).then_some(text),
				endpoint,
			}
		},
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
	};
	// crates.io
	use ::http::StatusCode;
	// self
	use super::*;
	use crate::{
		http::{HttpRequest, TransportFuture},
		transport::SIGNATURE_HEADER,
	};

	const LOGIN_BODY: &str = r#"{"statusCode":200,"message":"ok","data":{"token":"opaque-token"}}"#;

	/// Answers logins with a fixed token and business calls from a queue.
	#[derive(Default)]
	struct Backend {
		responses: Mutex<VecDeque<(u16, String)>>,
		seen: Mutex<Vec<HttpRequest>>,
		logins: AtomicUsize,
	}
	impl Backend {
		fn with<'a>(responses: impl IntoIterator<Item = (u16, &'a str)>) -> Arc<Self> {
			let responses = responses.into_iter().map(|(status, body)| (status, body.to_owned()));

			Arc::new(Self { responses: Mutex::new(responses.collect()), ..Default::default() })
		}

		fn business_calls(&self) -> usize {
			self.seen.lock().len()
		}
	}
	impl Transport for Backend {
		fn send<'a>(&'a self, _: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a> {
			let (status, body) = if request.uri().path().ends_with("/auth/login") {
				self.logins.fetch_add(1, Ordering::SeqCst);

				(200, LOGIN_BODY.to_owned())
			} else {
				self.seen.lock().push(request);

				self.responses.lock().pop_front().unwrap_or((200, String::new()))
			};

			Box::pin(async move {
				let mut response = HttpResponse::new(body.into_bytes());

				*response.status_mut() =
					StatusCode::from_u16(status).expect("Status fixture should be valid.");

				Ok(response)
			})
		}
	}

	fn config() -> ClientConfig {
		let base = Url::parse("https://api.example.com/uat-open-api")
			.expect("Base URL fixture should parse.");

		ClientConfig::builder(base)
			.credentials("ops", "hunter2")
			.build()
			.expect("Config fixture should build.")
	}

	fn client(backend: &Arc<Backend>) -> Client {
		Client::with_transport(config(), backend.clone()).expect("Client fixture should build.")
	}

	#[tokio::test]
	async fn execute_request_sends_headers_and_unwraps_data() {
		let backend = Backend::with([(
			200,
			r#"{"statusCode":200,"message":"Employees fetched","data":[{"id":7}]}"#,
		)]);
		let client = client(&backend);
		let request = ApiRequest::get("/employees").with_query("page", "2").with_query("q", "a b");
		let response = client
			.execute_request(&RequestContext::new(), request)
			.await
			.expect("Request should succeed.");

		assert_eq!(response.status, 200);
		assert_eq!(response.message, "Employees fetched");
		assert_eq!(
			response.json::<Value>().expect("Data should decode."),
			serde_json::json!([{ "id": 7 }])
		);

		let seen = backend.seen.lock();
		let sent = &seen[0];

		assert_eq!(
			sent.uri().to_string(),
			"https://api.example.com/uat-open-api/employees?page=2&q=a+b"
		);
		assert_eq!(sent.headers()[AUTHORIZATION], "Bearer opaque-token");
		assert_eq!(sent.headers()[CONTENT_TYPE], "application/json");
		assert_eq!(sent.headers()[ACCEPT], "application/json");
		assert!(sent.headers().get(SIGNATURE_HEADER).is_none());
		assert_eq!(backend.logins.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn token_is_reused_across_requests() {
		let backend = Backend::with(Vec::new());
		let client = client(&backend);
		let ctx = RequestContext::new();

		client.get(&ctx, "/a").await.expect("First request should succeed.");
		client.get(&ctx, "/b").await.expect("Second request should succeed.");

		assert_eq!(backend.logins.load(Ordering::SeqCst), 1);

		client.logout();
		client.get(&ctx, "/c").await.expect("Request after logout should succeed.");

		assert_eq!(backend.logins.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn error_envelope_becomes_api_error() {
		let backend = Backend::with([(
			404,
			r#"{"statusCode":404,"message":"Employee not found","details":"id 9"}"#,
		)]);
		let client = client(&backend);
		let err = client
			.get(&RequestContext::new(), "/employees/9")
			.await
			.expect_err("404 should fail.");
		let Error::Api(api) = err else { panic!("404 should be an API error.") };

		assert!(api.is_not_found());
		assert!(api.is_client_error());
		assert_eq!(api.message, "Employee not found");
		assert_eq!(api.details.as_deref(), Some("id 9"));
		assert_eq!(api.endpoint, "/employees/9");
	}

	#[tokio::test]
	async fn non_json_error_body_falls_back_to_status() {
		let backend = Backend::with([(502, "<html>bad gateway</html>"), (409, "{}")]);
		let client = client(&backend);
		let ctx = RequestContext::new();
		let Err(Error::Api(gateway)) = client.get(&ctx, "/x").await else {
			panic!("502 should be an API error.");
		};

		assert_eq!(gateway.status, 502);
		assert_eq!(gateway.message, "Unknown error");
		assert_eq!(gateway.details.as_deref(), Some("<html>bad gateway</html>"));
		assert!(gateway.is_server_error());

		let Err(Error::Api(conflict)) = client.get(&ctx, "/x").await else {
			panic!("409 should be an API error.");
		};

		assert_eq!(conflict.status, 409);
		assert_eq!(conflict.message, "Unknown error");
		assert!(conflict.is_conflict());
	}

	#[tokio::test]
	async fn invalid_paths_are_rejected_before_io() {
		let backend = Backend::with(Vec::new());
		let client = client(&backend);
		let ctx = RequestContext::new();

		for path in [
			"",
			"  ",
			"https://evil.example.com/x",
			"/x?y=1",
			"/x#frag",
			"/../admin",
			"/employees/../../admin",
			"/%2E%2e/admin",
			"..\\admin",
		] {
			assert!(matches!(
				client.get(&ctx, path).await,
				Err(Error::Validation { field: "path", .. })
			));
		}

		assert_eq!(backend.logins.load(Ordering::SeqCst), 0);
		assert_eq!(backend.business_calls(), 0);
	}

	#[test]
	fn dotted_names_are_not_parent_segments() {
		for path in ["/files/a..b", "/files/.hidden", "/files/./x", "/v1...2"] {
			assert!(ApiRequest::get(path).validate().is_ok(), "{path} should be accepted.");
		}
	}

	#[tokio::test]
	async fn success_bodies_are_unwrapped_or_reported() {
		let backend =
			Backend::with([(204, ""), (200, r#"{"statusCode":200,"data":null}"#), (200, "not json")]);
		let client = client(&backend);
		let ctx = RequestContext::new();

		assert!(client.delete(&ctx, "/a").await.expect("Empty body should succeed.").is_empty());
		assert!(client.get(&ctx, "/b").await.expect("Null data should succeed.").is_empty());
		assert!(matches!(
			client.get(&ctx, "/c").await,
			Err(Error::ResponseParse { status: 200, .. })
		));
	}

	#[tokio::test]
	async fn post_serializes_json_body() {
		let backend =
			Backend::with([(201, r#"{"statusCode":201,"message":"Created","data":{"id":1}}"#)]);
		let client = client(&backend);
		let response = client
			.post(&RequestContext::new(), "/employees", &serde_json::json!({ "name": "Ada" }))
			.await
			.expect("Post should succeed.");

		assert_eq!(response.status, 201);

		let seen = backend.seen.lock();
		let body: Value = serde_json::from_slice(seen[0].body()).expect("Body should be JSON.");

		assert_eq!(seen[0].method(), Method::POST);
		assert_eq!(body, serde_json::json!({ "name": "Ada" }));
	}

	#[tokio::test]
	async fn vault_requires_encryption() {
		let client = client(&Backend::with(Vec::new()));

		assert!(matches!(
			client.store_secure_credentials("k", "u", "p").await,
			Err(Error::Vault(VaultError::EncryptionDisabled))
		));
		assert!(!client.security_status().encryption);

		client.enable_credential_encryption("vault-password").expect("Encryption should enable.");
		client.store_secure_credentials("k", "u", "p").await.expect("Store should succeed.");

		let credentials =
			client.retrieve_secure_credentials("k").await.expect("Retrieve should succeed.");

		assert_eq!(credentials.username, "u");
		assert_eq!(credentials.password.expose(), "p");
		assert!(client.secure_credentials_exist("k").await.expect("Exists should succeed."));

		client.delete_secure_credentials("k").await.expect("Delete should succeed.");

		assert!(!client.secure_credentials_exist("k").await.expect("Exists should succeed."));
		assert!(client.security_status().encryption);
	}

	#[tokio::test]
	async fn reconfiguration_swaps_chain_and_keeps_limiter() {
		let backend = Backend::with(Vec::new());
		let client = client(&backend);

		assert_eq!(
			client.security_status(),
			SecurityStatus { encryption: false, signing: false, rate_limiting: false }
		);
		assert!(!client.rate_limit_status().enabled);

		client.configure_rate_limit(5.0, 10).expect("Rate limit should apply.");

		let limiter = client.transport_chain().limiter().clone();

		client.enable_signing("s3cret").expect("Signing should enable.");
		client.configure_retry(2, StdDuration::from_millis(10));

		let chain = client.transport_chain();

		assert!(Arc::ptr_eq(chain.limiter(), &limiter));
		assert_eq!(chain.retry_policy().max_retries, 2);

		let status = client.rate_limit_status();

		assert!(status.enabled);
		assert_eq!(status.limit, Some(RateLimitConfig::new(5.0, 10)));
		assert!(status.available_tokens.is_some());

		client.get(&RequestContext::new(), "/signed").await.expect("Request should succeed.");

		assert!(backend.seen.lock()[0].headers().get(SIGNATURE_HEADER).is_some());

		client.disable_signing();
		client.disable_rate_limit();

		assert_eq!(
			client.security_status(),
			SecurityStatus { encryption: false, signing: false, rate_limiting: false }
		);
		assert!(matches!(
			client.configure_rate_limit(-1.0, 10),
			Err(Error::Config(ConfigError::InvalidRateLimit { .. }))
		));
		assert!(matches!(client.enable_signing(""), Err(Error::Config(ConfigError::EmptySigningSecret))));
	}

	#[tokio::test]
	async fn cancelled_context_fails_fast() {
		let backend = Backend::with(Vec::new());
		let client = client(&backend);
		let ctx = RequestContext::new();

		ctx.cancel();

		assert!(matches!(client.get(&ctx, "/x").await, Err(Error::Cancelled)));
		assert_eq!(backend.business_calls(), 0);
	}

	#[test]
	fn with_json_rejects_unserializable_bodies() {
		let mut map = HashMap::new();

		map.insert(vec![1_u8], 1);

		assert!(matches!(
			ApiRequest::post("/x").with_json(&map),
			Err(Error::Validation { field: "body", .. })
		));
	}

	#[test]
	fn json_reports_the_failing_path() {
		let response =
			ApiResponse { status: 200, message: String::new(), data: br#"{"id":"x"}"#.to_vec() };

		#[derive(Debug, Deserialize)]
		struct Employee {
			#[allow(dead_code)]
			id: u64,
		}

		let Err(Error::ResponseParse { source, .. }) = response.json::<Employee>() else {
			panic!("Mismatched data should fail to decode.");
		};

		assert_eq!(source.path().to_string(), "id");
	}
}
