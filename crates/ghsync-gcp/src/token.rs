// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OAuth access tokens for Secret Manager.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghsync_common_secret::SecretString;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::error::{GcpError, GcpResult};

pub const DEFAULT_METADATA_TOKEN_URL: &str =
	"http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh this long before the token expires.
const TOKEN_REFRESH_BUFFER_SECS: i64 = 60;

/// Upper bound on a reported `expires_in`. Metadata tokens live about an hour.
const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
	async fn access_token(&self) -> GcpResult<SecretString>;

	/// Drop any cached token after the API rejected it.
	async fn invalidate(&self) {}
}

/// A fixed token, e.g. from `GHSYNC_GCP_ACCESS_TOKEN`.
pub struct StaticToken(SecretString);

impl StaticToken {
	pub fn new(token: SecretString) -> Self {
		Self(token)
	}
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
	async fn access_token(&self) -> GcpResult<SecretString> {
		Ok(self.0.clone())
	}
}

struct CachedToken {
	token: SecretString,
	expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
	access_token: String,
	expires_in: i64,
}

/// Token for the attached service account from the GCE/GKE metadata server.
pub struct MetadataServerToken {
	http_client: reqwest::Client,
	token_url: String,
	cached: Arc<RwLock<Option<CachedToken>>>,
}

impl MetadataServerToken {
	pub fn new() -> GcpResult<Self> {
		Self::with_url(DEFAULT_METADATA_TOKEN_URL)
	}

	pub fn with_url(token_url: impl Into<String>) -> GcpResult<Self> {
		let http_client = ghsync_common_http::new_client_with_timeout(Duration::from_secs(10))
			.map_err(|e| GcpError::Configuration(format!("failed to create HTTP client: {e}")))?;

		Ok(Self {
			http_client,
			token_url: token_url.into(),
			cached: Arc::new(RwLock::new(None)),
		})
	}

	#[instrument(skip(self))]
	async fn fetch(&self) -> GcpResult<CachedToken> {
		let response = self
			.http_client
			.get(&self.token_url)
			.header("Metadata-Flavor", "Google")
			.send()
			.await
			.map_err(|e| GcpError::Token(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			warn!(status = %status, "Metadata server refused token request");
			return Err(GcpError::Token(format!("metadata server returned HTTP {status}")));
		}

		let body: MetadataTokenResponse = response
			.json()
			.await
			.map_err(|e| GcpError::InvalidResponse(e.to_string()))?;

		debug!(expires_in = body.expires_in, "Obtained access token from metadata server");
		Ok(CachedToken {
			token: SecretString::new(body.access_token),
			expires_at: Utc::now()
				+ chrono::Duration::seconds(body.expires_in.clamp(0, MAX_TOKEN_LIFETIME_SECS)),
		})
	}
}

#[async_trait]
impl AccessTokenProvider for MetadataServerToken {
	async fn access_token(&self) -> GcpResult<SecretString> {
		{
			let cached = self.cached.read().await;
			if let Some(ref token) = *cached {
				let refresh_at =
					token.expires_at - chrono::Duration::seconds(TOKEN_REFRESH_BUFFER_SECS);
				if Utc::now() < refresh_at {
					return Ok(token.token.clone());
				}
			}
		}

		let fresh = self.fetch().await?;
		let token = fresh.token.clone();
		*self.cached.write().await = Some(fresh);
		Ok(token)
	}

	async fn invalidate(&self) {
		*self.cached.write().await = None;
	}
}

impl std::fmt::Debug for MetadataServerToken {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MetadataServerToken")
			.field("token_url", &self.token_url)
			.field(
				"has_cached_token",
				&self.cached.try_read().map(|c| c.is_some()).unwrap_or(false),
			)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

	#[tokio::test]
	async fn caches_token_until_near_expiry() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(TOKEN_PATH))
			.and(header("Metadata-Flavor", "Google"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"access_token": "ya29.first",
				"expires_in": 3599,
				"token_type": "Bearer"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let provider = MetadataServerToken::with_url(format!("{}{TOKEN_PATH}", server.uri())).unwrap();

		assert_eq!(provider.access_token().await.unwrap().expose(), "ya29.first");
		assert_eq!(provider.access_token().await.unwrap().expose(), "ya29.first");
	}

	#[tokio::test]
	async fn short_lived_token_is_refetched() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"access_token": "ya29.short",
				"expires_in": 30
			})))
			.expect(2)
			.mount(&server)
			.await;

		let provider = MetadataServerToken::with_url(format!("{}{TOKEN_PATH}", server.uri())).unwrap();

		provider.access_token().await.unwrap();
		provider.access_token().await.unwrap();
	}

	#[tokio::test]
	async fn out_of_range_lifetime_is_clamped() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"access_token": "ya29.forever",
				"expires_in": i64::MAX
			})))
			.expect(1)
			.mount(&server)
			.await;

		let provider = MetadataServerToken::with_url(format!("{}{TOKEN_PATH}", server.uri())).unwrap();

		assert_eq!(provider.access_token().await.unwrap().expose(), "ya29.forever");
		assert_eq!(provider.access_token().await.unwrap().expose(), "ya29.forever");
	}

	#[tokio::test]
	async fn negative_lifetime_is_refetched() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"access_token": "ya29.expired",
				"expires_in": i64::MIN
			})))
			.expect(2)
			.mount(&server)
			.await;

		let provider = MetadataServerToken::with_url(format!("{}{TOKEN_PATH}", server.uri())).unwrap();

		provider.access_token().await.unwrap();
		provider.access_token().await.unwrap();
	}

	#[tokio::test]
	async fn metadata_error_is_a_token_error() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path(TOKEN_PATH))
			.respond_with(ResponseTemplate::new(404))
			.mount(&server)
			.await;

		let provider = MetadataServerToken::with_url(format!("{}{TOKEN_PATH}", server.uri())).unwrap();

		assert!(matches!(provider.access_token().await, Err(GcpError::Token(_))));
	}

	#[test]
	fn debug_does_not_leak_token() {
		let provider = MetadataServerToken::new().unwrap();
		assert!(!format!("{provider:?}").contains("ya29"));
	}
}
