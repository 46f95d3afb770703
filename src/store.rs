//! Storage contract and the built-in in-memory backend for encrypted credential records.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend for encrypted credential records keyed by an opaque string.
///
/// The store only ever sees ciphertext. The bundled [`MemoryStore`] lives for the process;
/// durable backends are supplied by the caller.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the record under `key`.
	fn store<'a>(&'a self, key: &'a str, record: SecureCredentialRecord) -> StoreFuture<'a, ()>;

	/// Fetches the record under `key`, if present.
	fn retrieve<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<SecureCredentialRecord>>;

	/// Removes the record under `key`; removing a missing key succeeds.
	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

	/// Reports whether a record exists under `key`.
	fn exists<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool>;

	/// Removes every record. Backends that cannot enumerate keys keep the default.
	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async { Err(StoreError::Unsupported { operation: "clear" }) })
	}
}

/// Encrypted username/password pair plus the salt its record key was derived from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureCredentialRecord {
	/// Base64 nonce-prefixed AES-GCM ciphertext of the username.
	pub encrypted_username: String,
	/// Base64 nonce-prefixed AES-GCM ciphertext of the password.
	pub encrypted_password: String,
	/// Base64 random salt feeding the per-record key derivation.
	pub salt: String,
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Keys must be non-empty.
	#[error("Credential key must not be empty.")]
	InvalidKey,
	/// The backend does not implement the operation.
	#[error("Credential store does not support `{operation}`.")]
	Unsupported {
		/// Operation name.
		operation: &'static str,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
