// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub destination configuration section.

use ghsync_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SECRET_SCOPE: &str = "dependabot";

/// GitHub configuration layer (all fields optional for layering).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfigLayer {
	/// Token with `secrets: write` on the target repositories.
	#[serde(skip_serializing)]
	pub token: Option<SecretString>,
	/// REST API base URL. Override for GitHub Enterprise Server.
	pub api_url: Option<String>,
	/// Repository owner (user or organization) for every resource.
	pub owner: Option<String>,
	/// `dependabot` or `actions`.
	pub secret_scope: Option<String>,
}

impl GithubConfigLayer {
	/// Merge with another layer, preferring values from `other`.
	pub fn merge(&mut self, other: GithubConfigLayer) {
		if other.token.is_some() {
			self.token = other.token;
		}
		if other.api_url.is_some() {
			self.api_url = other.api_url;
		}
		if other.owner.is_some() {
			self.owner = other.owner;
		}
		if other.secret_scope.is_some() {
			self.secret_scope = other.secret_scope;
		}
	}

	pub fn build(self) -> Result<GithubConfig, ConfigError> {
		let token = self.token.ok_or_else(|| {
			ConfigError::Missing(
				"GitHub token (set GHSYNC_GITHUB_TOKEN, GITHUB_TOKEN or a *_FILE variant)".to_string(),
			)
		})?;
		if token.expose().trim().is_empty() {
			return Err(ConfigError::Validation(
				"GitHub token cannot be empty".to_string(),
			));
		}

		let owner = self
			.owner
			.map(|o| o.trim().to_string())
			.filter(|o| !o.is_empty())
			.ok_or_else(|| ConfigError::Missing("github.owner (GHSYNC_GITHUB_OWNER)".to_string()))?;

		let api_url = self
			.api_url
			.unwrap_or_else(|| DEFAULT_API_URL.to_string());
		validate_url("github.api_url", &api_url)?;

		let secret_scope = self
			.secret_scope
			.map(|s| s.trim().to_ascii_lowercase())
			.unwrap_or_else(|| DEFAULT_SECRET_SCOPE.to_string());
		if secret_scope != "dependabot" && secret_scope != "actions" {
			return Err(ConfigError::InvalidValue {
				key: "github.secret_scope".to_string(),
				message: format!("expected 'dependabot' or 'actions', got '{secret_scope}'"),
			});
		}

		Ok(GithubConfig {
			token,
			api_url,
			owner,
			secret_scope,
		})
	}
}

/// Resolved GitHub configuration.
#[derive(Debug, Clone)]
pub struct GithubConfig {
	pub token: SecretString,
	pub api_url: String,
	pub owner: String,
	pub secret_scope: String,
}

pub(crate) fn validate_url(key: &str, url: &str) -> Result<(), ConfigError> {
	let rest = url
		.strip_prefix("https://")
		.or_else(|| url.strip_prefix("http://"));
	match rest {
		Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
		_ => Err(ConfigError::InvalidValue {
			key: key.to_string(),
			message: format!("expected an http(s) URL with a host, got '{url}'"),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn complete() -> GithubConfigLayer {
		GithubConfigLayer {
			token: Some(SecretString::new("ghp_test".to_string())),
			owner: Some("fr123k".to_string()),
			..Default::default()
		}
	}

	#[test]
	fn build_applies_defaults() {
		let config = complete().build().unwrap();
		assert_eq!(config.api_url, DEFAULT_API_URL);
		assert_eq!(config.secret_scope, "dependabot");
		assert_eq!(config.owner, "fr123k");
		assert_eq!(config.token.expose(), "ghp_test");
	}

	#[test]
	fn token_is_required() {
		let layer = GithubConfigLayer {
			token: None,
			..complete()
		};
		assert!(matches!(layer.build(), Err(ConfigError::Missing(_))));
	}

	#[test]
	fn blank_owner_is_missing() {
		let layer = GithubConfigLayer {
			owner: Some("  ".to_string()),
			..complete()
		};
		assert!(matches!(layer.build(), Err(ConfigError::Missing(_))));
	}

	#[test]
	fn scope_is_normalized_and_checked() {
		let layer = GithubConfigLayer {
			secret_scope: Some("Actions".to_string()),
			..complete()
		};
		assert_eq!(layer.build().unwrap().secret_scope, "actions");

		let layer = GithubConfigLayer {
			secret_scope: Some("codespaces".to_string()),
			..complete()
		};
		assert!(matches!(
			layer.build(),
			Err(ConfigError::InvalidValue { .. })
		));
	}

	#[test]
	fn api_url_must_be_http() {
		let layer = GithubConfigLayer {
			api_url: Some("ftp://github.example.com".to_string()),
			..complete()
		};
		assert!(layer.build().is_err());

		let layer = GithubConfigLayer {
			api_url: Some("https://github.example.com/api/v3".to_string()),
			..complete()
		};
		assert_eq!(
			layer.build().unwrap().api_url,
			"https://github.example.com/api/v3"
		);
	}

	#[test]
	fn merge_prefers_other() {
		let mut base = complete();
		base.merge(GithubConfigLayer {
			owner: Some("other-org".to_string()),
			..Default::default()
		});
		assert_eq!(base.owner.as_deref(), Some("other-org"));
		assert!(base.token.is_some());
	}

	#[test]
	fn token_is_not_serialized() {
		let toml_str = toml::to_string(&complete()).unwrap();
		assert!(!toml_str.contains("ghp_test"));
		assert!(toml_str.contains("fr123k"));
	}

	#[test]
	fn debug_redacts_token() {
		let config = complete().build().unwrap();
		let debug = format!("{config:?}");
		assert!(!debug.contains("ghp_test"));
		assert!(debug.contains("[REDACTED]"));
	}

	#[test]
	fn deserialize_partial_layer() {
		let layer: GithubConfigLayer = toml::from_str("owner = \"acme\"\n").unwrap();
		assert_eq!(layer.owner.as_deref(), Some("acme"));
		assert!(layer.token.is_none());
		assert!(layer.api_url.is_none());
	}
}
