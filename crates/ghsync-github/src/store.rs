// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! [`DestinationStore`] over the GitHub secrets API.

use async_trait::async_trait;
use ghsync_core::{
	Collection, DestinationError, DestinationStore, ExistingSecretSet, RecipientKey, SealedSecret,
};

use crate::client::GithubClient;

#[derive(Clone)]
pub struct GithubSecretStore {
	client: GithubClient,
}

impl GithubSecretStore {
	pub fn new(client: GithubClient) -> Self {
		Self { client }
	}
}

#[async_trait]
impl DestinationStore for GithubSecretStore {
	async fn list_secret_names(
		&self,
		collection: &Collection,
	) -> Result<ExistingSecretSet, DestinationError> {
		let names = self
			.client
			.list_secret_names(&collection.owner, &collection.repository)
			.await?;
		Ok(names.into_iter().collect())
	}

	async fn recipient_key(&self, collection: &Collection) -> Result<RecipientKey, DestinationError> {
		let key = self
			.client
			.get_public_key(&collection.owner, &collection.repository)
			.await?;
		Ok(RecipientKey {
			key_id: key.key_id,
			key: key.key,
		})
	}

	async fn upsert_secret(
		&self,
		collection: &Collection,
		secret: &SealedSecret,
	) -> Result<(), DestinationError> {
		self
			.client
			.put_secret(
				&collection.owner,
				&collection.repository,
				&secret.name,
				&secret.encrypted_value,
				&secret.key_id,
			)
			.await?;
		Ok(())
	}

	async fn delete_secret(&self, collection: &Collection, name: &str) -> Result<(), DestinationError> {
		self
			.client
			.delete_secret(&collection.owner, &collection.repository, name)
			.await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;
	use ghsync_common_http::RetryConfig;
	use ghsync_common_secret::SecretString;
	use serde_json::json;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use crate::config::GithubConfig;

	fn store(server: &MockServer) -> GithubSecretStore {
		let config = GithubConfig::new(SecretString::new("ghp_test".to_string()))
			.unwrap()
			.with_base_url(&server.uri())
			.unwrap()
			.with_retry_config(RetryConfig {
				max_attempts: 1,
				base_delay: Duration::from_millis(1),
				max_delay: Duration::from_millis(1),
				backoff_factor: 1.0,
				jitter: false,
			});
		GithubSecretStore::new(GithubClient::new(config).unwrap())
	}

	#[tokio::test]
	async fn list_maps_to_existing_set() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/repos/fr123k/infra/dependabot/secrets"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"total_count": 2,
				"secrets": [{"name": "A"}, {"name": "B"}]
			})))
			.mount(&server)
			.await;

		let existing = store(&server)
			.list_secret_names(&Collection::new("fr123k", "infra"))
			.await
			.unwrap();

		assert!(existing.contains("A"));
		assert!(existing.contains("B"));
		assert_eq!(existing.len(), 2);
	}

	#[tokio::test]
	async fn unavailable_destination_maps_to_unavailable() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/repos/fr123k/infra/dependabot/secrets/public-key"))
			.respond_with(ResponseTemplate::new(503))
			.mount(&server)
			.await;

		let err = store(&server)
			.recipient_key(&Collection::new("fr123k", "infra"))
			.await
			.unwrap_err();

		assert!(matches!(err, DestinationError::Unavailable(_)));
	}

	#[tokio::test]
	async fn rejected_upload_keeps_status() {
		let server = MockServer::start().await;
		Mock::given(method("PUT"))
			.and(path("/repos/fr123k/infra/dependabot/secrets/A"))
			.respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "invalid key_id"})))
			.mount(&server)
			.await;

		let err = store(&server)
			.upsert_secret(
				&Collection::new("fr123k", "infra"),
				&SealedSecret {
					name: "A".to_string(),
					key_id: "stale".to_string(),
					encrypted_value: "c2VhbGVk".to_string(),
				},
			)
			.await
			.unwrap_err();

		assert_eq!(err, DestinationError::rejected(422, "invalid key_id"));
	}
}
