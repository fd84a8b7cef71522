// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the repository secrets REST endpoints.

use std::time::Duration;

use ghsync_common_http::{retry, RetryConfig};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use crate::config::GithubConfig;
use crate::error::GithubError;
use crate::types::{GithubErrorBody, PublicKeyResponse, PutSecretRequest, SecretListResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PER_PAGE: u32 = 100;
/// Upper bound on list pages, 10k secrets.
const MAX_PAGES: u32 = 100;

/// Client for the Dependabot or Actions repository secrets API, depending
/// on [`GithubConfig::scope`].
///
/// Every request is retried in-call on timeouts, rate limits and 5xx.
#[derive(Clone)]
pub struct GithubClient {
	http_client: Client,
	config: GithubConfig,
}

impl GithubClient {
	pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
		let http_client = ghsync_common_http::builder()
			.timeout(REQUEST_TIMEOUT)
			.build()
			.map_err(|e| GithubError::Config(format!("Failed to create HTTP client: {e}")))?;

		info!(
			base_url = %config.base_url(),
			scope = %config.scope(),
			"Created GitHub secrets client"
		);

		Ok(Self {
			http_client,
			config,
		})
	}

	pub fn retry_config(&self) -> &RetryConfig {
		&self.config.retry_config
	}

	pub fn config(&self) -> &GithubConfig {
		&self.config
	}

	/// Names of every secret in the repository, following pagination.
	#[instrument(skip(self))]
	pub async fn list_secret_names(&self, owner: &str, repo: &str) -> Result<Vec<String>, GithubError> {
		let mut names = Vec::new();
		let mut page = 1;

		loop {
			let response = retry(&self.config.retry_config, || {
				self.list_secrets_page(owner, repo, page)
			})
			.await?;

			let received = response.secrets.len();
			names.extend(response.secrets.into_iter().map(|s| s.name));
			debug!(page, received, total_count = response.total_count, "Listed secrets page");

			if received == 0 || names.len() as u64 >= response.total_count {
				break;
			}
			if page >= MAX_PAGES {
				warn!(page, collected = names.len(), "Stopping secret listing at page limit");
				break;
			}
			page += 1;
		}

		Ok(names)
	}

	async fn list_secrets_page(
		&self,
		owner: &str,
		repo: &str,
		page: u32,
	) -> Result<SecretListResponse, GithubError> {
		let mut url = self.endpoint(owner, repo, &["secrets"])?;
		url
			.query_pairs_mut()
			.append_pair("per_page", &PER_PAGE.to_string())
			.append_pair("page", &page.to_string());

		let response = self.send(self.http_client.get(url)).await?;
		parse_json(response, "secret list").await
	}

	/// The repository's current sealing key.
	#[instrument(skip(self))]
	pub async fn get_public_key(&self, owner: &str, repo: &str) -> Result<PublicKeyResponse, GithubError> {
		retry(&self.config.retry_config, || async {
			let url = self.endpoint(owner, repo, &["secrets", "public-key"])?;
			let response = self.send(self.http_client.get(url)).await?;
			parse_json(response, "public key").await
		})
		.await
	}

	/// Create or update a secret with a value sealed to `key_id`.
	#[instrument(skip(self, encrypted_value))]
	pub async fn put_secret(
		&self,
		owner: &str,
		repo: &str,
		name: &str,
		encrypted_value: &str,
		key_id: &str,
	) -> Result<(), GithubError> {
		let body = PutSecretRequest {
			encrypted_value,
			key_id,
		};

		retry(&self.config.retry_config, || async {
			let url = self.endpoint(owner, repo, &["secrets", name])?;
			let response = self.send(self.http_client.put(url).json(&body)).await?;
			match response.status() {
				StatusCode::CREATED => debug!("Secret created"),
				_ => debug!("Secret updated"),
			}
			Ok::<(), GithubError>(())
		})
		.await
	}

	/// Delete a secret. A secret that is already gone counts as deleted.
	#[instrument(skip(self))]
	pub async fn delete_secret(&self, owner: &str, repo: &str, name: &str) -> Result<(), GithubError> {
		let result = retry(&self.config.retry_config, || async {
			let url = self.endpoint(owner, repo, &["secrets", name])?;
			self.send(self.http_client.delete(url)).await.map(|_| ())
		})
		.await;

		match result {
			Err(GithubError::NotFound(_)) => {
				debug!("Secret already absent");
				Ok(())
			}
			other => other,
		}
	}

	/// `{base}/repos/{owner}/{repo}/{scope}/{tail...}`, each segment
	/// percent-encoded.
	fn endpoint(&self, owner: &str, repo: &str, tail: &[&str]) -> Result<Url, GithubError> {
		let mut url = self.config.base_url().clone();
		url
			.path_segments_mut()
			.map_err(|_| GithubError::Config("GitHub base URL cannot be a base".to_string()))?
			.pop_if_empty()
			.extend(["repos", owner, repo, self.config.scope().as_path()])
			.extend(tail);
		Ok(url)
	}

	async fn send(&self, request: RequestBuilder) -> Result<Response, GithubError> {
		let response = request
			.bearer_auth(self.config.token())
			.header("Accept", "application/vnd.github+json")
			.header("X-GitHub-Api-Version", "2022-11-28")
			.send()
			.await
			.map_err(|e| {
				if e.is_timeout() {
					return GithubError::Timeout;
				}
				GithubError::Network(e)
			})?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(map_github_error(status, &body));
		}
		Ok(response)
	}
}

async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, GithubError> {
	response.json().await.map_err(|e| {
		error!(error = %e, "Failed to parse {what} response");
		GithubError::InvalidResponse(format!("{what}: JSON parse error: {e}"))
	})
}

/// Map GitHub API error responses to [`GithubError`].
pub(crate) fn map_github_error(status: StatusCode, body: &str) -> GithubError {
	let status_code = status.as_u16();
	let message = serde_json::from_str::<GithubErrorBody>(body)
		.map(|b| b.message)
		.unwrap_or_else(|_| body.to_string());

	match status_code {
		401 => {
			warn!(status = status_code, "Unauthorized request to GitHub");
			GithubError::Unauthorized
		}
		403 if message.to_lowercase().contains("rate limit") => {
			warn!(status = status_code, "GitHub rate limit exceeded");
			GithubError::RateLimited
		}
		403 => {
			warn!(status = status_code, "Forbidden request to GitHub");
			GithubError::Forbidden(message)
		}
		404 => GithubError::NotFound(message),
		429 => {
			warn!(status = status_code, "GitHub rate limit exceeded");
			GithubError::RateLimited
		}
		_ => {
			error!(status = status_code, message = %message, "GitHub API error");
			GithubError::ApiError {
				status: status_code,
				message,
			}
		}
	}
}
