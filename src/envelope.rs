//! Wire envelopes shared by the login endpoint and every business endpoint.

// self
use crate::_prelude::*;

/// Standard success envelope: `{statusCode, message, data}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
	/// Status code echoed by the server.
	#[serde(default)]
	pub status_code: u16,
	/// Human-readable message.
	#[serde(default)]
	pub message: String,
	/// Payload.
	pub data: Option<T>,
}

/// Error envelope: `{statusCode, message, error?, details?}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
	/// Status code echoed by the server.
	#[serde(default)]
	pub status_code: u16,
	/// Human-readable message.
	#[serde(default)]
	pub message: String,
	/// Short error label.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Longer explanation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<String>,
}
impl ErrorEnvelope {
	/// Parses an error body, returning `None` when it is not JSON.
	pub fn parse(body: &[u8]) -> Option<Self> {
		serde_json::from_slice(body).ok()
	}
}

/// Login request payload: `{username, password}`.
#[derive(Clone, Serialize)]
pub struct LoginRequest<'a> {
	/// Account name.
	pub username: &'a str,
	/// Account password.
	pub password: &'a str,
}
impl Debug for LoginRequest<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Decodes `bytes` as JSON with path-aware errors.
pub(crate) fn decode<T>(
	bytes: &[u8],
) -> std::result::Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
}
