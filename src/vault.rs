//! Credential vault: AEAD-protected username/password pairs over a pluggable store.
//!
//! Each stored record carries a random 32-byte salt. Both fields of the record are sealed
//! under a key derived from the vault key and that salt, so records never share a key even
//! though they share a password.

pub mod cipher;

pub use cipher::CredentialCipher;

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE};
use rand::RngCore;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::ConfigError,
	store::{CredentialStore, MemoryStore, SecureCredentialRecord, StoreError},
};

/// Salt length in bytes for each stored record.
pub const SALT_LEN: usize = 32;

/// Failures raised by the vault and its cipher.
#[derive(Debug, ThisError)]
pub enum VaultError {
	/// Credential encryption has not been enabled on the client.
	#[error("Credential encryption is not enabled.")]
	EncryptionDisabled,
	/// No record exists under the key.
	#[error("No credentials are stored under `{key}`.")]
	NotFound {
		/// Requested key.
		key: String,
	},
	/// Sealing failed.
	#[error("Credential encryption failed.")]
	Encryption,
	/// Ciphertext is shorter than a nonce.
	#[error("Ciphertext is too short ({len} bytes).")]
	CiphertextTooShort {
		/// Decoded length.
		len: usize,
	},
	/// Ciphertext is not valid base64.
	#[error("Ciphertext is not valid base64.")]
	Base64 {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Wrong key or tampered ciphertext.
	#[error("Ciphertext failed authentication.")]
	Authentication,
	/// Decrypted bytes are not UTF-8.
	#[error("Decrypted credential is not valid UTF-8.")]
	InvalidUtf8 {
		/// Underlying conversion failure.
		#[source]
		source: std::string::FromUtf8Error,
	},
	/// Stored salt cannot be decoded.
	#[error("Stored salt is not valid base64.")]
	InvalidSalt {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Record key could not be derived.
	#[error("Record key derivation failed.")]
	KeyDerivation,
	/// Storage backend failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		StoreError,
	),
}

/// Decrypted username/password pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
	/// Account name.
	pub username: String,
	/// Account password.
	pub password: Secret,
}

/// Encrypts credentials before they reach a [`CredentialStore`].
#[derive(Clone)]
pub struct CredentialVault {
	cipher: CredentialCipher,
	store: Arc<dyn CredentialStore>,
}
impl CredentialVault {
	/// Creates a vault over a fresh [`MemoryStore`].
	pub fn new(password: &str) -> Result<Self, ConfigError> {
		Self::with_store(password, Arc::new(MemoryStore::default()))
	}

	/// Creates a vault over a caller-supplied store.
	pub fn with_store(password: &str, store: Arc<dyn CredentialStore>) -> Result<Self, ConfigError> {
		Ok(Self { cipher: CredentialCipher::from_password(password)?, store })
	}

	/// Vault-level cipher.
	pub fn cipher(&self) -> &CredentialCipher {
		&self.cipher
	}

	/// Backing store.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.store
	}

	/// Encrypts with the vault-level key.
	pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
		self.cipher.encrypt(plaintext)
	}

	/// Decrypts with the vault-level key.
	pub fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
		self.cipher.decrypt(ciphertext)
	}

	/// Encrypts both fields under a fresh record key and persists them under `key`.
	pub async fn store_credentials(
		&self,
		key: &str,
		username: &str,
		password: &str,
	) -> Result<(), VaultError> {
		let mut salt = [0_u8; SALT_LEN];

		rand::rng().fill_bytes(&mut salt);

		let record_cipher = self.cipher.for_record(&salt)?;
		let record = SecureCredentialRecord {
			encrypted_username: record_cipher.encrypt(username)?,
			encrypted_password: record_cipher.encrypt(password)?,
			salt: URL_SAFE.encode(salt),
		};

		self.store.store(key, record).await?;

		Ok(())
	}

	/// Loads and decrypts the record under `key`.
	pub async fn retrieve_credentials(&self, key: &str) -> Result<Credentials, VaultError> {
		let record = self
			.store
			.retrieve(key)
			.await?
			.ok_or_else(|| VaultError::NotFound { key: key.to_owned() })?;
		let salt = URL_SAFE.decode(&record.salt).map_err(|source| VaultError::InvalidSalt { source })?;
		let record_cipher = self.cipher.for_record(&salt)?;

		Ok(Credentials {
			username: record_cipher.decrypt(&record.encrypted_username)?,
			password: Secret::new(record_cipher.decrypt(&record.encrypted_password)?),
		})
	}

	/// Removes the record under `key`.
	pub async fn delete_credentials(&self, key: &str) -> Result<(), VaultError> {
		Ok(self.store.delete(key).await?)
	}

	/// Reports whether a record exists under `key`.
	pub async fn credentials_exist(&self, key: &str) -> Result<bool, VaultError> {
		Ok(self.store.exists(key).await?)
	}

	/// Removes every record, when the store supports it.
	pub async fn clear_credentials(&self) -> Result<(), VaultError> {
		Ok(self.store.clear().await?)
	}
}
impl Debug for CredentialVault {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialVault").field("cipher", &self.cipher).finish_non_exhaustive()
	}
}
