//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{CredentialStore, SecureCredentialRecord, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, SecureCredentialRecord>>>;

/// Process-lifetime storage backend; records do not survive a restart.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn store_now(
		map: &StoreMap,
		key: &str,
		record: SecureCredentialRecord,
	) -> Result<(), StoreError> {
		if key.is_empty() {
			return Err(StoreError::InvalidKey);
		}

		map.write().insert(key.to_owned(), record);

		Ok(())
	}
}
impl CredentialStore for MemoryStore {
	fn store<'a>(&'a self, key: &'a str, record: SecureCredentialRecord) -> StoreFuture<'a, ()> {
		Box::pin(async move { Self::store_now(&self.0, key, record) })
	}

	fn retrieve<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<SecureCredentialRecord>> {
		Box::pin(async move { Ok(self.0.read().get(key).cloned()) })
	}

	fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.0.write().remove(key);

			Ok(())
		})
	}

	fn exists<'a>(&'a self, key: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.0.read().contains_key(key)) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().clear();

			Ok(())
		})
	}
}
