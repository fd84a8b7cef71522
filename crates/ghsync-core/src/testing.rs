// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory collaborators for tests of the engine and its callers.
//!
//! Both fakes record every call so tests can assert on the number of
//! external requests a pass made.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use crypto_box::SecretKey;
use ghsync_common_secret::SecretBytes;
use rand::rngs::OsRng;

use crate::destination::DestinationStore;
use crate::error::{DestinationError, SourceError};
use crate::seal::open;
use crate::source::SecretValueSource;
use crate::types::{Collection, ExistingSecretSet, RecipientKey, SealedSecret, SourceValue};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A value source backed by a fixed map. Unknown keys are `NotFound`.
#[derive(Default)]
pub struct StaticSource {
	values: HashMap<String, Vec<u8>>,
	errors: HashMap<String, SourceError>,
	requested: Mutex<Vec<String>>,
}

impl StaticSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.with_bytes(key, value.into().into_bytes())
	}

	pub fn with_bytes(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
		self.values.insert(key.into(), value.into());
		self
	}

	pub fn with_error(mut self, key: impl Into<String>, error: SourceError) -> Self {
		self.errors.insert(key.into(), error);
		self
	}

	/// Keys requested so far, in call order.
	pub fn requested(&self) -> Vec<String> {
		lock(&self.requested).clone()
	}
}

#[async_trait]
impl SecretValueSource for StaticSource {
	async fn get_value(&self, key: &str) -> Result<SourceValue, SourceError> {
		lock(&self.requested).push(key.to_string());

		if let Some(error) = self.errors.get(key) {
			return Err(error.clone());
		}
		self
			.values
			.get(key)
			.map(|value| SourceValue::new(SecretBytes::new(value.clone())))
			.ok_or_else(|| SourceError::NotFound {
				key: key.to_string(),
			})
	}
}

/// Number of calls made to each [`DestinationStore`] method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
	pub list: usize,
	pub recipient_key: usize,
	pub upsert: usize,
	pub delete: usize,
}

impl CallCounts {
	pub fn total(&self) -> usize {
		self.list + self.recipient_key + self.upsert + self.delete
	}
}

struct KeyPair {
	secret: SecretKey,
	served: RecipientKey,
}

#[derive(Default)]
struct Failures {
	list: Option<DestinationError>,
	recipient_key: Option<DestinationError>,
	upsert: HashMap<String, DestinationError>,
	delete: HashMap<String, DestinationError>,
}

/// A destination that keeps secrets in memory and holds a real key pair,
/// so uploaded values can be opened and compared.
pub struct InMemoryDestination {
	key: Mutex<KeyPair>,
	existing: Mutex<BTreeSet<String>>,
	uploads: Mutex<BTreeMap<String, SealedSecret>>,
	failures: Mutex<Failures>,
	calls: Mutex<CallCounts>,
	rotations: Mutex<u32>,
}

impl Default for InMemoryDestination {
	fn default() -> Self {
		Self::new()
	}
}

impl InMemoryDestination {
	pub fn new() -> Self {
		Self {
			key: Mutex::new(generate_key_pair(1)),
			existing: Mutex::new(BTreeSet::new()),
			uploads: Mutex::new(BTreeMap::new()),
			failures: Mutex::new(Failures::default()),
			calls: Mutex::new(CallCounts::default()),
			rotations: Mutex::new(1),
		}
	}

	/// Serve `served` as the recipient key instead of the generated one.
	/// Uploads can no longer be opened.
	pub fn with_recipient_key(served: RecipientKey) -> Self {
		let destination = Self::new();
		lock(&destination.key).served = served;
		destination
	}

	pub fn insert_existing(&self, name: impl Into<String>) {
		lock(&self.existing).insert(name.into());
	}

	pub fn existing_names(&self) -> Vec<String> {
		lock(&self.existing).iter().cloned().collect()
	}

	pub fn calls(&self) -> CallCounts {
		*lock(&self.calls)
	}

	pub fn reset_calls(&self) {
		*lock(&self.calls) = CallCounts::default();
	}

	pub fn recipient(&self) -> RecipientKey {
		lock(&self.key).served.clone()
	}

	/// Replace the key pair, as the destination does on rotation.
	pub fn rotate_key(&self) -> RecipientKey {
		let mut rotations = lock(&self.rotations);
		*rotations += 1;
		let pair = generate_key_pair(*rotations);
		let served = pair.served.clone();
		*lock(&self.key) = pair;
		served
	}

	pub fn uploaded(&self, name: &str) -> Option<SealedSecret> {
		lock(&self.uploads).get(name).cloned()
	}

	/// Open the last upload for `name` with the current secret key.
	pub fn opened_bytes(&self, name: &str) -> Option<Vec<u8>> {
		let sealed = self.uploaded(name)?;
		let key = lock(&self.key);
		let plaintext = open(&key.secret, &sealed.encrypted_value).ok()?;
		Some(plaintext.to_vec())
	}

	pub fn opened_value(&self, name: &str) -> Option<String> {
		String::from_utf8(self.opened_bytes(name)?).ok()
	}

	pub fn fail_list(&self, error: DestinationError) {
		lock(&self.failures).list = Some(error);
	}

	pub fn fail_recipient_key(&self, error: DestinationError) {
		lock(&self.failures).recipient_key = Some(error);
	}

	pub fn fail_upsert(&self, name: impl Into<String>, error: DestinationError) {
		lock(&self.failures).upsert.insert(name.into(), error);
	}

	pub fn fail_delete(&self, name: impl Into<String>, error: DestinationError) {
		lock(&self.failures).delete.insert(name.into(), error);
	}

	pub fn clear_failures(&self) {
		*lock(&self.failures) = Failures::default();
	}
}

fn generate_key_pair(generation: u32) -> KeyPair {
	let secret = SecretKey::generate(&mut OsRng);
	let served = RecipientKey {
		key_id: format!("test-key-{generation}"),
		key: STANDARD.encode(secret.public_key().as_bytes()),
	};
	KeyPair { secret, served }
}

#[async_trait]
impl DestinationStore for InMemoryDestination {
	async fn list_secret_names(
		&self,
		_collection: &Collection,
	) -> Result<ExistingSecretSet, DestinationError> {
		lock(&self.calls).list += 1;
		if let Some(error) = lock(&self.failures).list.clone() {
			return Err(error);
		}
		Ok(lock(&self.existing).iter().cloned().collect())
	}

	async fn recipient_key(&self, _collection: &Collection) -> Result<RecipientKey, DestinationError> {
		lock(&self.calls).recipient_key += 1;
		if let Some(error) = lock(&self.failures).recipient_key.clone() {
			return Err(error);
		}
		Ok(lock(&self.key).served.clone())
	}

	async fn upsert_secret(
		&self,
		_collection: &Collection,
		secret: &SealedSecret,
	) -> Result<(), DestinationError> {
		lock(&self.calls).upsert += 1;
		if let Some(error) = lock(&self.failures).upsert.get(&secret.name).cloned() {
			return Err(error);
		}
		if secret.key_id != lock(&self.key).served.key_id {
			return Err(DestinationError::rejected(422, "key_id does not match current key"));
		}
		lock(&self.existing).insert(secret.name.clone());
		lock(&self.uploads).insert(secret.name.clone(), secret.clone());
		Ok(())
	}

	async fn delete_secret(&self, _collection: &Collection, name: &str) -> Result<(), DestinationError> {
		lock(&self.calls).delete += 1;
		if let Some(error) = lock(&self.failures).delete.get(name).cloned() {
			return Err(error);
		}
		lock(&self.existing).remove(name);
		lock(&self.uploads).remove(name);
		Ok(())
	}
}
