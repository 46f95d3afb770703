#![cfg(feature = "reqwest")]

mod common;

// std
use std::{net::TcpListener, sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
// self
use wage_advance_client::{
	Error, RequestContext,
	auth::{BearerToken, TokenManager},
	error::AuthError,
	url::Url,
};

fn manager(server: &MockServer) -> Arc<TokenManager> {
	let manager = TokenManager::new(
		common::login_url(server),
		common::USERNAME,
		common::PASSWORD,
		Arc::new(common::reqwest_transport()),
	)
	.expect("Token manager should build.");

	Arc::new(manager)
}

async fn concurrent_tokens(manager: &Arc<TokenManager>, callers: usize) -> Vec<String> {
	let tasks = (0..callers)
		.map(|_| {
			let manager = manager.clone();

			tokio::spawn(async move {
				manager
					.token(&RequestContext::new())
					.await
					.expect("Concurrent token call should succeed.")
					.expose()
					.to_owned()
			})
		})
		.collect::<Vec<_>>();
	let mut tokens = Vec::with_capacity(callers);

	for task in tasks {
		tokens.push(task.await.expect("Token task should not panic."));
	}

	tokens
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_share_one_login() {
	let server = MockServer::start_async().await;
	let jwt = common::jwt_expiring_in(3_600);
	let body = common::login_body(&jwt);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(common::LOGIN_PATH);
			then.status(200).delay(Duration::from_millis(200)).body(body);
		})
		.await;
	let manager = manager(&server);
	let tokens = concurrent_tokens(&manager, 16).await;

	mock.assert_calls_async(1).await;

	assert!(tokens.iter().all(|token| token == &jwt));
	assert_eq!(manager.metrics().attempts(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn valid_cached_token_needs_no_login() {
	let server = MockServer::start_async().await;
	let jwt = common::jwt_expiring_in(3_600);
	let mock = common::mock_login(&server, &jwt).await;
	let manager = manager(&server);

	manager.token(&RequestContext::new()).await.expect("Initial login should succeed.");

	let tokens = concurrent_tokens(&manager, 32).await;

	mock.assert_calls_async(1).await;

	assert_eq!(tokens.len(), 32);
	assert!(manager.metrics().cache_hits() >= 32);
}

#[tokio::test]
async fn token_inside_refresh_margin_is_replaced() {
	let server = MockServer::start_async().await;
	let expiring = common::jwt_expiring_in(60);
	let mock = common::mock_login(&server, &expiring).await;
	let manager = manager(&server);
	let ctx = RequestContext::new();

	manager.token(&ctx).await.expect("First login should succeed.");

	let cached = manager.cached().expect("Token should be cached.");

	assert!(cached.expires_at - BearerToken::REFRESH_MARGIN < time::OffsetDateTime::now_utc());

	manager.token(&ctx).await.expect("Second login should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn failed_login_is_not_cached() {
	let server = MockServer::start_async().await;
	let mut rejected = server
		.mock_async(|when, then| {
			when.method(POST).path(common::LOGIN_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"statusCode":401,"message":"Invalid credentials"}"#);
		})
		.await;
	let manager = manager(&server);
	let ctx = RequestContext::new();
	let err = manager.token(&ctx).await.expect_err("Rejected login should fail.");

	assert!(matches!(
		err,
		Error::Authentication(AuthError::Rejected { status: 401, ref message })
			if message == "Invalid credentials"
	));
	assert!(manager.cached().is_none());

	rejected.delete_async().await;

	let jwt = common::jwt_expiring_in(3_600);
	let accepted = common::mock_login(&server, &jwt).await;
	let token = manager.token(&ctx).await.expect("Next login should succeed.");

	assert_eq!(token.expose(), jwt);
	accepted.assert_calls_async(1).await;
}

#[tokio::test]
async fn unreachable_login_endpoint_is_a_network_error() {
	let listener = TcpListener::bind("127.0.0.1:0").expect("Ephemeral port should bind.");
	let port = listener.local_addr().expect("Listener should have an address.").port();

	drop(listener);

	let login_url = Url::parse(&format!("http://127.0.0.1:{port}{}", common::LOGIN_PATH))
		.expect("Closed-port URL should parse.");
	let manager = TokenManager::new(
		login_url,
		common::USERNAME,
		common::PASSWORD,
		Arc::new(common::reqwest_transport()),
	)
	.expect("Token manager should build.");
	let err = manager.token(&RequestContext::new()).await.expect_err("Login should fail.");

	assert!(matches!(err, Error::Authentication(AuthError::Network { .. })));
	assert!(manager.cached().is_none());
}

#[tokio::test]
async fn deadline_interrupts_slow_login() {
	let server = MockServer::start_async().await;
	let body = common::login_body("opaque");

	server
		.mock_async(|when, then| {
			when.method(POST).path(common::LOGIN_PATH);
			then.status(200).delay(Duration::from_secs(5)).body(body);
		})
		.await;

	let manager = manager(&server);
	let ctx = RequestContext::new().with_timeout(Duration::from_millis(100));

	assert!(matches!(manager.token(&ctx).await, Err(Error::DeadlineExceeded)));
	assert!(manager.cached().is_none());
}
