// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the GitHub secrets client.

use std::fmt;
use std::str::FromStr;

use ghsync_common_http::RetryConfig;
use ghsync_common_secret::SecretString;
use reqwest::Url;

use crate::error::GithubError;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Which repository secret collection to write to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SecretScope {
	#[default]
	Dependabot,
	Actions,
}

impl SecretScope {
	/// Path segment under `/repos/{owner}/{repo}/`.
	pub fn as_path(&self) -> &'static str {
		match self {
			SecretScope::Dependabot => "dependabot",
			SecretScope::Actions => "actions",
		}
	}
}

impl fmt::Display for SecretScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_path())
	}
}

impl FromStr for SecretScope {
	type Err = GithubError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"dependabot" => Ok(SecretScope::Dependabot),
			"actions" => Ok(SecretScope::Actions),
			other => Err(GithubError::Config(format!(
				"unknown secret scope '{other}', expected 'dependabot' or 'actions'"
			))),
		}
	}
}

/// Configuration for [`crate::GithubClient`].
///
/// The token is a [`SecretString`] and prints as `[REDACTED]`.
#[derive(Clone)]
pub struct GithubConfig {
	token: SecretString,
	base_url: Url,
	scope: SecretScope,
	pub retry_config: RetryConfig,
}

impl fmt::Debug for GithubConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GithubConfig")
			.field("token", &self.token)
			.field("base_url", &self.base_url.as_str())
			.field("scope", &self.scope)
			.field("retry_config", &self.retry_config)
			.finish()
	}
}

impl GithubConfig {
	/// Create a configuration against `https://api.github.com`.
	pub fn new(token: SecretString) -> Result<Self, GithubError> {
		Ok(Self {
			token,
			base_url: Self::validate_and_normalize_base_url(DEFAULT_BASE_URL)?,
			scope: SecretScope::default(),
			retry_config: RetryConfig::default(),
		})
	}

	/// Point the client at another API root, e.g. GitHub Enterprise
	/// (`https://ghe.example.com/api/v3`).
	pub fn with_base_url(mut self, raw: &str) -> Result<Self, GithubError> {
		self.base_url = Self::validate_and_normalize_base_url(raw)?;
		Ok(self)
	}

	pub fn with_scope(mut self, scope: SecretScope) -> Self {
		self.scope = scope;
		self
	}

	pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
		self.retry_config = retry_config;
		self
	}

	pub fn token(&self) -> &str {
		self.token.expose()
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	pub fn scope(&self) -> SecretScope {
		self.scope
	}

	/// Requirements:
	/// - must parse as a URL with a host
	/// - scheme is `https` or `http`
	/// - no query or fragment
	fn validate_and_normalize_base_url(raw: &str) -> Result<Url, GithubError> {
		let mut url = Url::parse(raw.trim())
			.map_err(|e| GithubError::Config(format!("Invalid GitHub base URL '{raw}': {e}")))?;

		if url.scheme() != "https" && url.scheme() != "http" {
			return Err(GithubError::Config(format!(
				"GitHub base URL must use https or http, got '{}'",
				url.scheme()
			)));
		}

		if url.host_str().is_none() {
			return Err(GithubError::Config(
				"GitHub base URL must include a host".to_string(),
			));
		}

		if url.query().is_some() || url.fragment().is_some() {
			return Err(GithubError::Config(
				"GitHub base URL must not carry a query or fragment".to_string(),
			));
		}

		let trimmed = url.path().trim_end_matches('/').to_string();
		url.set_path(&trimmed);
		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn token() -> SecretString {
		SecretString::new("ghp_test".to_string())
	}

	#[test]
	fn default_base_url() {
		let config = GithubConfig::new(token()).unwrap();
		assert_eq!(config.base_url().as_str(), "https://api.github.com/");
		assert_eq!(config.scope(), SecretScope::Dependabot);
	}

	#[test]
	fn enterprise_base_url_keeps_path() {
		let config = GithubConfig::new(token())
			.unwrap()
			.with_base_url("https://ghe.example.com/api/v3/")
			.unwrap();
		assert_eq!(config.base_url().path(), "/api/v3");
	}

	#[test]
	fn rejects_other_schemes() {
		let err = GithubConfig::new(token())
			.unwrap()
			.with_base_url("ftp://api.github.com")
			.unwrap_err();
		assert!(err.to_string().contains("https or http"));
	}

	#[test]
	fn rejects_query() {
		assert!(GithubConfig::new(token())
			.unwrap()
			.with_base_url("https://api.github.com/?x=1")
			.is_err());
	}

	#[test]
	fn debug_redacts_token() {
		let config = GithubConfig::new(token()).unwrap();
		let debug = format!("{config:?}");
		assert!(!debug.contains("ghp_test"));
		assert!(debug.contains("[REDACTED]"));
	}

	#[test]
	fn scope_parsing() {
		assert_eq!("Dependabot".parse::<SecretScope>().unwrap(), SecretScope::Dependabot);
		assert_eq!("actions".parse::<SecretScope>().unwrap(), SecretScope::Actions);
		assert!("codespaces".parse::<SecretScope>().is_err());
	}
}
