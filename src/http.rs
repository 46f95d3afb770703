//! Base transport primitives every layer of the pipeline is written against.
//!
//! [`Transport`] is the client's only dependency on an HTTP stack. Requests and responses are
//! plain [`http`] values with fully buffered bodies, so layers can clone a request before each
//! attempt and re-sign it without worrying about single-read streams. The bundled
//! [`ReqwestTransport`] (feature `reqwest`) is the default base transport.

// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::{ConfigError, TransportError};

/// Outbound request with a buffered body.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Inbound response with a buffered body.
pub type HttpResponse = http::Response<Vec<u8>>;

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse>> + 'a + Send>>;

/// Anything that can turn an [`HttpRequest`] into an [`HttpResponse`].
///
/// Implementations must observe `ctx` at every suspension point and surface
/// [`Error::Cancelled`]/[`Error::DeadlineExceeded`] unchanged. Network failures should be
/// reported as [`Error::Network`] so retry layers can classify them.
pub trait Transport
where
	Self: Send + Sync,
{
	/// Sends one request.
	fn send<'a>(&'a self, ctx: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a>;
}
impl<T> Transport for Arc<T>
where
	T: ?Sized + Transport,
{
	fn send<'a>(&'a self, ctx: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a> {
		(**self).send(ctx, request)
	}
}

/// Re-materializes a request (method, URI, version, headers, body) for another attempt.
pub fn clone_request(request: &HttpRequest) -> HttpRequest {
	let mut cloned = http::Request::new(request.body().clone());

	*cloned.method_mut() = request.method().clone();
	*cloned.uri_mut() = request.uri().clone();
	*cloned.version_mut() = request.version();
	*cloned.headers_mut() = request.headers().clone();

	cloned
}

/// Base transport backed by a [`ReqwestClient`].
///
/// Redirects are not followed: the API answers directly and a redirect would strip the
/// signature headers computed for the original path.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport whose client gives up after `timeout`.
	pub fn new(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn send<'a>(&'a self, ctx: &'a RequestContext, request: HttpRequest) -> TransportFuture<'a> {
		Box::pin(async move {
			let request =
				reqwest::Request::try_from(request).map_err(ConfigError::request_conversion)?;
			let response = ctx.run(self.0.execute(request)).await?.map_err(TransportError::from)?;
			let status = response.status();
			let version = response.version();
			let headers = response.headers().to_owned();
			let body = ctx.run(response.bytes()).await?.map_err(TransportError::from)?;
			let mut response_new = HttpResponse::new(body.to_vec());

			*response_new.status_mut() = status;
			*response_new.version_mut() = version;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
