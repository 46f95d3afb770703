//! Unverified JWT expiry decoding.
//!
//! The token was just issued by the trusted login endpoint over TLS, so the payload is read
//! without checking the signature. Anything that is not a three-part JWT with a numeric `exp`
//! claim yields `None` and the caller falls back to a fixed lifetime.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::Value;
// self
use crate::_prelude::*;

/// Extracts the `exp` claim of a JWT as an instant.
pub fn expiry(token: &str) -> Option<OffsetDateTime> {
	let mut parts = token.split('.');
	let (_, payload, _) = (parts.next()?, parts.next()?, parts.next()?);

	if parts.next().is_some() {
		return None;
	}

	let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
	let claims = serde_json::from_slice::<Value>(&bytes).ok()?;
	let exp = claims.get("exp")?;
	let secs = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64))?;

	OffsetDateTime::from_unix_timestamp(secs).ok()
}

#[cfg(test)]
pub(crate) fn encode_test_jwt(exp: i64) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"ops","exp":{exp}}}"#));

	format!("{header}.{payload}.signature")
}
