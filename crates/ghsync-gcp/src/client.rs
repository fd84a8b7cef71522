// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Secret Manager `versions.access` client.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ghsync_common_http::{retry, RetryConfig};
use ghsync_common_secret::SecretBytes;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{GcpError, GcpResult};
use crate::token::AccessTokenProvider;

pub const DEFAULT_BASE_URL: &str = "https://secretmanager.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GcpConfig {
	pub project: String,
	pub base_url: String,
	pub retry_config: RetryConfig,
}

impl GcpConfig {
	pub fn new(project: impl Into<String>) -> Self {
		Self {
			project: project.into(),
			base_url: DEFAULT_BASE_URL.to_string(),
			retry_config: RetryConfig::default(),
		}
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
		self.retry_config = retry_config;
		self
	}
}

#[derive(Debug, Deserialize)]
struct AccessResponse {
	payload: Payload,
}

#[derive(Debug, Deserialize)]
struct Payload {
	#[serde(default)]
	data: String,
}

/// Google's JSON error envelope.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
	error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
	#[serde(default)]
	message: String,
}

/// Full version resource name for `key`.
///
/// A bare secret id resolves to the latest version in `project`. A key that
/// already starts with `projects/` is used as given, with
/// `/versions/latest` appended when it names no version.
pub fn resource_name(project: &str, key: &str) -> GcpResult<String> {
	let key = key.trim();
	let valid = |s: &str| {
		!s.is_empty()
			&& s
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
	};

	if let Some(rest) = key.strip_prefix("projects/") {
		let parts: Vec<&str> = rest.split('/').collect();
		return match parts.as_slice() {
			[p, "secrets", s] if valid(p) && valid(s) => Ok(format!("{key}/versions/latest")),
			[p, "secrets", s, "versions", v] if valid(p) && valid(s) && valid(v) => Ok(key.to_string()),
			_ => Err(GcpError::InvalidKey(key.to_string())),
		};
	}

	if !valid(key) {
		return Err(GcpError::InvalidKey(key.to_string()));
	}
	if !valid(project) {
		return Err(GcpError::Configuration(format!("invalid GCP project '{project}'")));
	}
	Ok(format!("projects/{project}/secrets/{key}/versions/latest"))
}

/// Reads secret versions from Secret Manager.
pub struct SecretManagerClient {
	http_client: reqwest::Client,
	config: GcpConfig,
	tokens: Arc<dyn AccessTokenProvider>,
}

impl SecretManagerClient {
	pub fn new(config: GcpConfig, tokens: Arc<dyn AccessTokenProvider>) -> GcpResult<Self> {
		if !config.base_url.starts_with("https://") && !config.base_url.starts_with("http://") {
			return Err(GcpError::Configuration(format!(
				"Secret Manager URL must be http(s), got '{}'",
				config.base_url
			)));
		}

		let http_client = ghsync_common_http::builder()
			.timeout(REQUEST_TIMEOUT)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(|e| GcpError::Configuration(format!("failed to create HTTP client: {e}")))?;

		info!(project = %config.project, base_url = %config.base_url, "Created Secret Manager client");

		Ok(Self {
			http_client,
			config,
			tokens,
		})
	}

	pub fn project(&self) -> &str {
		&self.config.project
	}

	/// Read the plaintext of `key` (see [`resource_name`]).
	#[instrument(skip(self))]
	pub async fn access(&self, key: &str) -> GcpResult<SecretBytes> {
		let name = resource_name(&self.config.project, key)?;
		retry(&self.config.retry_config, || self.access_with_refresh(&name)).await
	}

	/// One attempt, repeated once with a fresh token after a 401.
	async fn access_with_refresh(&self, name: &str) -> GcpResult<SecretBytes> {
		match self.access_inner(name).await {
			Err(GcpError::Unauthenticated) => {
				info!("Got 401, refreshing access token");
				self.tokens.invalidate().await;
				self.access_inner(name).await
			}
			other => other,
		}
	}

	async fn access_inner(&self, name: &str) -> GcpResult<SecretBytes> {
		let token = self.tokens.access_token().await?;
		let url = format!(
			"{}/v1/{name}:access",
			self.config.base_url.trim_end_matches('/')
		);

		debug!(url = %url, "Accessing secret version");

		let response = self
			.http_client
			.get(&url)
			.bearer_auth(token.expose())
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					return GcpError::Timeout;
				}
				GcpError::Http(e)
			})?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(map_gcp_error(status, name, &body));
		}

		let body: AccessResponse = response
			.json()
			.await
			.map_err(|e| GcpError::InvalidResponse(e.to_string()))?;

		STANDARD
			.decode(body.payload.data.as_bytes())
			.map(SecretBytes::new)
			.map_err(|e| GcpError::InvalidResponse(format!("payload is not base64: {e}")))
	}
}

impl std::fmt::Debug for SecretManagerClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SecretManagerClient")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

fn map_gcp_error(status: StatusCode, name: &str, body: &str) -> GcpError {
	let message = serde_json::from_str::<ErrorResponse>(body)
		.map(|e| e.error.message)
		.unwrap_or_else(|_| sanitize_body_for_error(body, 200));

	match status {
		StatusCode::NOT_FOUND => GcpError::NotFound(name.to_string()),
		StatusCode::FORBIDDEN => {
			warn!(secret = %name, "Access to secret denied");
			GcpError::AccessDenied(message)
		}
		StatusCode::UNAUTHORIZED => GcpError::Unauthenticated,
		_ => GcpError::Api {
			status: status.as_u16(),
			message,
		},
	}
}

fn sanitize_body_for_error(body: &str, max_len: usize) -> String {
	let sanitized: String = body
		.chars()
		.filter(|c| !c.is_control() || *c == ' ')
		.take(max_len)
		.collect();
	if body.chars().count() > max_len {
		format!("{sanitized}...")
	} else {
		sanitized
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::token::StaticToken;
	use ghsync_common_secret::SecretString;
	use serde_json::json;
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client(server: &MockServer) -> SecretManagerClient {
		let config = GcpConfig::new("fr123k-prod")
			.with_base_url(server.uri())
			.with_retry_config(RetryConfig {
				max_attempts: 2,
				base_delay: Duration::from_millis(1),
				max_delay: Duration::from_millis(2),
				backoff_factor: 1.0,
				jitter: false,
			});
		let tokens = Arc::new(StaticToken::new(SecretString::new("ya29.test".to_string())));
		SecretManagerClient::new(config, tokens).unwrap()
	}

	#[test]
	fn bare_key_resolves_to_latest_in_project() {
		assert_eq!(
			resource_name("fr123k-prod", "npm-token").unwrap(),
			"projects/fr123k-prod/secrets/npm-token/versions/latest"
		);
	}

	#[test]
	fn full_resource_names_are_kept() {
		assert_eq!(
			resource_name("ignored", "projects/other/secrets/db").unwrap(),
			"projects/other/secrets/db/versions/latest"
		);
		assert_eq!(
			resource_name("ignored", "projects/other/secrets/db/versions/3").unwrap(),
			"projects/other/secrets/db/versions/3"
		);
	}

	#[test]
	fn rejects_keys_that_escape_the_path() {
		assert!(resource_name("p", "../admin").is_err());
		assert!(resource_name("p", "a?b").is_err());
		assert!(resource_name("p", "").is_err());
		assert!(resource_name("p", "projects/p/keys/x").is_err());
	}

	#[tokio::test]
	async fn decodes_payload() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/projects/fr123k-prod/secrets/npm-token/versions/latest:access"))
			.and(header("authorization", "Bearer ya29.test"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"name": "projects/123/secrets/npm-token/versions/4",
				"payload": {"data": STANDARD.encode("npm_abc123")}
			})))
			.mount(&server)
			.await;

		let value = client(&server).access("npm-token").await.unwrap();

		assert_eq!(value.expose().as_slice(), b"npm_abc123");
	}

	#[tokio::test]
	async fn not_found_is_not_retried() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/projects/fr123k-prod/secrets/missing/versions/latest:access"))
			.respond_with(ResponseTemplate::new(404).set_body_json(json!({
				"error": {"code": 404, "message": "Secret [missing] not found", "status": "NOT_FOUND"}
			})))
			.expect(1)
			.mount(&server)
			.await;

		let err = client(&server).access("missing").await.unwrap_err();

		assert!(matches!(err, GcpError::NotFound(_)));
	}

	#[tokio::test]
	async fn permission_denied_carries_message() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/projects/fr123k-prod/secrets/db/versions/latest:access"))
			.respond_with(ResponseTemplate::new(403).set_body_json(json!({
				"error": {"code": 403, "message": "Permission 'secretmanager.versions.access' denied"}
			})))
			.mount(&server)
			.await;

		match client(&server).access("db").await.unwrap_err() {
			GcpError::AccessDenied(message) => {
				assert!(message.contains("secretmanager.versions.access"))
			}
			other => panic!("unexpected error: {other:?}"),
		}
	}

	#[tokio::test]
	async fn unavailable_is_retried() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/projects/fr123k-prod/secrets/db/versions/latest:access"))
			.respond_with(ResponseTemplate::new(503))
			.expect(2)
			.mount(&server)
			.await;

		let err = client(&server).access("db").await.unwrap_err();

		assert!(matches!(err, GcpError::Api { status: 503, .. }));
	}

	#[tokio::test]
	async fn binary_payload_is_returned_verbatim() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/projects/fr123k-prod/secrets/bin/versions/latest:access"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"payload": {"data": STANDARD.encode([0x30u8, 0x82, 0xff, 0xfe])}
			})))
			.mount(&server)
			.await;

		let value = client(&server).access("bin").await.unwrap();

		assert_eq!(value.expose().as_slice(), &[0x30, 0x82, 0xff, 0xfe]);
	}

	#[tokio::test]
	async fn malformed_base64_is_invalid_response() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/v1/projects/fr123k-prod/secrets/bad/versions/latest:access"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"payload": {"data": "not base64!"}
			})))
			.mount(&server)
			.await;

		let err = client(&server).access("bad").await.unwrap_err();

		assert!(matches!(err, GcpError::InvalidResponse(_)));
	}
}
