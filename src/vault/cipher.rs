//! AES-256-GCM cipher keyed by a SHA-256 digest of the vault password.
//!
//! Ciphertexts are `base64url(nonce || sealed)` with a fresh 12-byte nonce per call and no
//! associated data. The empty string maps to itself in both directions and is never a valid
//! AEAD ciphertext.

// crates.io
use aes_gcm::{
	Aes256Gcm, Key, Nonce,
	aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::URL_SAFE};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, error::ConfigError, vault::VaultError};

const RECORD_KEY_INFO: &[u8] = b"credential-record";

/// Symmetric AEAD cipher for credential fields.
#[derive(Clone)]
pub struct CredentialCipher {
	key: [u8; 32],
	cipher: Aes256Gcm,
}
impl CredentialCipher {
	/// AES-GCM nonce length in bytes.
	pub const NONCE_LEN: usize = 12;

	/// Derives the key as a single SHA-256 of `password`.
	pub fn from_password(password: &str) -> Result<Self, ConfigError> {
		if password.is_empty() {
			return Err(ConfigError::EmptyEncryptionPassword);
		}

		Ok(Self::from_key(Sha256::digest(password.as_bytes()).into()))
	}

	fn from_key(key: [u8; 32]) -> Self {
		let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

		Self { key, cipher }
	}

	/// Derives a record-specific cipher with HKDF-SHA256 over this cipher's key and `salt`.
	///
	/// One output block is enough for a 256-bit key: `PRK = HMAC(salt, key)`, then
	/// `OKM = HMAC(PRK, info || 0x01)`.
	pub fn for_record(&self, salt: &[u8]) -> Result<Self, VaultError> {
		let mut extract =
			<Hmac<Sha256> as Mac>::new_from_slice(salt).map_err(|_| VaultError::KeyDerivation)?;

		extract.update(&self.key);

		let prk = extract.finalize().into_bytes();
		let mut expand =
			<Hmac<Sha256> as Mac>::new_from_slice(&prk).map_err(|_| VaultError::KeyDerivation)?;

		expand.update(RECORD_KEY_INFO);
		expand.update(&[1]);

		Ok(Self::from_key(expand.finalize().into_bytes().into()))
	}

	/// Seals `plaintext` under a fresh random nonce.
	pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
		if plaintext.is_empty() {
			return Ok(String::new());
		}

		let mut nonce = [0_u8; Self::NONCE_LEN];

		rand::rng().fill_bytes(&mut nonce);

		let sealed = self
			.cipher
			.encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
			.map_err(|_| VaultError::Encryption)?;
		let mut payload = Vec::with_capacity(Self::NONCE_LEN + sealed.len());

		payload.extend_from_slice(&nonce);
		payload.extend_from_slice(&sealed);

		Ok(URL_SAFE.encode(payload))
	}

	/// Opens a value produced by [`encrypt`](Self::encrypt).
	pub fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
		if ciphertext.is_empty() {
			return Ok(String::new());
		}

		let payload =
			URL_SAFE.decode(ciphertext).map_err(|source| VaultError::Base64 { source })?;

		if payload.len() < Self::NONCE_LEN {
			return Err(VaultError::CiphertextTooShort { len: payload.len() });
		}

		let (nonce, sealed) = payload.split_at(Self::NONCE_LEN);
		let plaintext = self
			.cipher
			.decrypt(Nonce::from_slice(nonce), sealed)
			.map_err(|_| VaultError::Authentication)?;

		String::from_utf8(plaintext).map_err(|source| VaultError::InvalidUtf8 { source })
	}
}
impl Debug for CredentialCipher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CredentialCipher(<redacted>)")
	}
}
