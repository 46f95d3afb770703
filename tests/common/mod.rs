#![allow(dead_code)]

// std
use std::{collections::VecDeque, sync::Arc};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use http::StatusCode;
use httpmock::prelude::*;
use parking_lot::Mutex;
use time::OffsetDateTime;
use tokio::time::Instant;
// self
use wage_advance_client::{
	ClientConfig, RequestContext, Result,
	config::ClientConfigBuilder,
	http::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportFuture, clone_request},
	url::Url,
};

pub const USERNAME: &str = "ops@example.com";
pub const PASSWORD: &str = "hunter2";
pub const BASE_PATH: &str = "/uat-open-api";
pub const LOGIN_PATH: &str = "/uat-open-api/auth/login";

/// Unsigned JWT whose `exp` claim lies `seconds` from now.
pub fn jwt_expiring_in(seconds: i64) -> String {
	let exp = OffsetDateTime::now_utc().unix_timestamp() + seconds;
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));

	format!("{header}.{payload}.signature")
}

pub fn login_body(token: &str) -> String {
	format!(r#"{{"statusCode":200,"message":"Login successful","data":{{"token":"{token}"}}}}"#)
}

pub fn base_url(server: &MockServer) -> Url {
	Url::parse(&server.url(BASE_PATH)).expect("Mock base URL should parse.")
}

pub fn login_url(server: &MockServer) -> Url {
	Url::parse(&server.url(LOGIN_PATH)).expect("Mock login URL should parse.")
}

pub fn config(server: &MockServer) -> ClientConfigBuilder {
	ClientConfig::builder(base_url(server)).credentials(USERNAME, PASSWORD)
}

/// Builder for clients whose base transport never touches the network.
pub fn offline_config() -> ClientConfigBuilder {
	let base = Url::parse("https://api.example.com/uat-open-api").expect("Base URL should parse.");

	ClientConfig::builder(base).credentials(USERNAME, PASSWORD)
}

pub fn reqwest_transport() -> ReqwestTransport {
	ReqwestTransport::new(ClientConfig::DEFAULT_TIMEOUT)
		.expect("Reqwest transport should build for tests.")
}

pub async fn mock_login<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
	let body = login_body(token);

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(LOGIN_PATH)
				.header("content-type", "application/json")
				.json_body(serde_json::json!({ "username": USERNAME, "password": PASSWORD }));
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

/// Records every business request (with its arrival time) before handing it to reqwest.
pub struct RecordingTransport {
	inner: ReqwestTransport,
	pub seen: Mutex<Vec<(Instant, HttpRequest)>>,
}
impl RecordingTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self { inner: reqwest_transport(), seen: Mutex::new(Vec::new()) })
	}
}
impl Transport for RecordingTransport {
	fn send<'a>(&'a self, ctx: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a> {
		if !request.uri().path().ends_with("/auth/login") {
			self.seen.lock().push((Instant::now(), clone_request(&request)));
		}

		self.inner.send(ctx, request)
	}
}

/// Answers logins with a fixed token and business calls from a status script.
pub struct ScriptedTransport {
	token: String,
	statuses: Mutex<VecDeque<u16>>,
	pub seen: Mutex<Vec<Instant>>,
}
impl ScriptedTransport {
	pub fn new(statuses: impl IntoIterator<Item = u16>) -> Arc<Self> {
		Arc::new(Self {
			token: jwt_expiring_in(3_600),
			statuses: Mutex::new(statuses.into_iter().collect()),
			seen: Mutex::new(Vec::new()),
		})
	}

	fn respond(status: u16, body: String) -> Result<HttpResponse> {
		let mut response = HttpResponse::new(body.into_bytes());

		*response.status_mut() =
			StatusCode::from_u16(status).expect("Scripted status should be valid.");

		Ok(response)
	}
}
impl Transport for ScriptedTransport {
	fn send<'a>(&'a self, _: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a> {
		let response = if request.uri().path().ends_with("/auth/login") {
			Self::respond(200, login_body(&self.token))
		} else {
			self.seen.lock().push(Instant::now());

			let status = self.statuses.lock().pop_front().unwrap_or(200);
			let body = format!(r#"{{"statusCode":{status},"message":"scripted","data":{{}}}}"#);

			Self::respond(status, body)
		};

		Box::pin(async move { response })
	}
}
