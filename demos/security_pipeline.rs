//! Walks a request through the full pipeline against an in-process stand-in for the API.
//!
//! 1. Build a [`ClientConfig`] with retries, a token bucket, request signing and a vault.
//! 2. Hand [`Client::with_transport`] a [`Transport`] that answers logins, fails the first
//!    business call with 503 and verifies every signature it receives.
//! 3. Issue a few requests, then reconfigure the live client and inspect its status.

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use color_eyre::Result;
use http::StatusCode;
use serde::Deserialize;
use url::Url;
// self
use wage_advance_client::{
	Client, ClientConfig, RequestContext,
	http::{HttpRequest, HttpResponse, Transport, TransportFuture},
	transport::{RequestSigner, SIGNATURE_HEADER},
};

const SIGNING_SECRET: &str = "demo-signing-secret";

#[derive(Debug, Deserialize)]
struct Employee {
	id: u64,
	name: String,
}

/// Stand-in API: logs in anyone, drops the first business call and checks signatures.
struct DemoApi {
	verifier: RequestSigner,
	calls: AtomicUsize,
}
impl DemoApi {
	fn reply(status: StatusCode, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = status;

		response
	}

	fn handle(&self, request: &HttpRequest) -> HttpResponse {
		if request.uri().path().ends_with("/auth/login") {
			return Self::reply(
				StatusCode::OK,
				r#"{"statusCode":200,"message":"Login successful","data":{"token":"demo-token"}}"#,
			);
		}

		let signed = request
			.headers()
			.get(SIGNATURE_HEADER)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|signature| self.verifier.verify_signature(request, signature));

		if !signed {
			return Self::reply(
				StatusCode::UNAUTHORIZED,
				r#"{"statusCode":401,"message":"Signature rejected"}"#,
			);
		}
		if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
			return Self::reply(StatusCode::SERVICE_UNAVAILABLE, "warming up");
		}

		Self::reply(
			StatusCode::OK,
			r#"{"statusCode":200,"message":"Employee fetched","data":{"id":42,"name":"Ada"}}"#,
		)
	}
}
impl Transport for DemoApi {
	fn send<'a>(&'a self, _: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a> {
		let response = self.handle(&request);

		Box::pin(async move { Ok(response) })
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ClientConfig::builder(Url::parse("https://api.example.com/uat-open-api")?)
		.credentials("payroll@example.com", "demo-password")
		.retry(3, Duration::from_millis(50))
		.rate_limit(5.0, 2)
		.signing_secret(SIGNING_SECRET)
		.encryption_password("demo-vault-password")
		.build()?;
	let verifier = RequestSigner::new(SIGNING_SECRET)?;
	let api = Arc::new(DemoApi { verifier, calls: AtomicUsize::new(0) });
	let client = Client::with_transport(config, api.clone())?;
	let ctx = RequestContext::new().with_timeout(Duration::from_secs(10));

	for _ in 0..3 {
		let employee = client.get(&ctx, "/employees/42").await?.json::<Employee>()?;

		println!("Fetched employee #{} ({}).", employee.id, employee.name);
	}

	println!(
		"Business calls seen by the API (including the retried one): {}.",
		api.calls.load(Ordering::SeqCst)
	);
	println!("Rate limit status: {:?}.", client.rate_limit_status());

	client.store_secure_credentials("payroll", "payroll@example.com", "demo-password").await?;

	let credentials = client.retrieve_secure_credentials("payroll").await?;

	println!("Vault round trip for {} (password {}).", credentials.username, credentials.password);

	client.disable_signing();

	let unsigned = client.get(&ctx, "/employees/42").await;

	println!("Unsigned request outcome: {unsigned:?}.");
	println!("Security status: {:?}.", client.security_status());

	Ok(())
}
