// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::DestinationError;
use crate::types::{Collection, ExistingSecretSet, RecipientKey, SealedSecret};

/// A CI platform's per-repository secret store.
///
/// Implementations must not cache: every call reflects the destination as it
/// is now. `upsert_secret` creates or overwrites; `delete_secret` treats an
/// already-absent name as success.
#[async_trait]
pub trait DestinationStore: Send + Sync {
	/// Names of every secret in the collection. Values are never returned.
	async fn list_secret_names(
		&self,
		collection: &Collection,
	) -> Result<ExistingSecretSet, DestinationError>;

	/// The key uploads must currently be sealed to.
	async fn recipient_key(&self, collection: &Collection)
		-> Result<RecipientKey, DestinationError>;

	async fn upsert_secret(
		&self,
		collection: &Collection,
		secret: &SealedSecret,
	) -> Result<(), DestinationError>;

	async fn delete_secret(&self, collection: &Collection, name: &str)
		-> Result<(), DestinationError>;
}
