// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GCP Secret Manager configuration section.

use ghsync_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sections::github::validate_url;

pub const DEFAULT_API_URL: &str = "https://secretmanager.googleapis.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GcpConfigLayer {
	pub project: Option<String>,
	pub api_url: Option<String>,
	/// Static OAuth access token. Without one the metadata server is used.
	#[serde(skip_serializing)]
	pub access_token: Option<SecretString>,
}

impl GcpConfigLayer {
	pub fn merge(&mut self, other: GcpConfigLayer) {
		if other.project.is_some() {
			self.project = other.project;
		}
		if other.api_url.is_some() {
			self.api_url = other.api_url;
		}
		if other.access_token.is_some() {
			self.access_token = other.access_token;
		}
	}

	pub fn build(self) -> Result<GcpConfig, ConfigError> {
		let project = self
			.project
			.map(|p| p.trim().to_string())
			.filter(|p| !p.is_empty())
			.ok_or_else(|| ConfigError::Missing("gcp.project (GHSYNC_GCP_PROJECT)".to_string()))?;

		let api_url = self
			.api_url
			.unwrap_or_else(|| DEFAULT_API_URL.to_string());
		validate_url("gcp.api_url", &api_url)?;

		Ok(GcpConfig {
			project,
			api_url,
			access_token: self.access_token,
		})
	}
}

#[derive(Debug, Clone)]
pub struct GcpConfig {
	pub project: String,
	pub api_url: String,
	pub access_token: Option<SecretString>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn project_is_required() {
		let layer = GcpConfigLayer::default();
		assert!(matches!(layer.build(), Err(ConfigError::Missing(_))));
	}

	#[test]
	fn defaults_to_public_endpoint_and_metadata_token() {
		let config = GcpConfigLayer {
			project: Some("my-project".to_string()),
			..Default::default()
		}
		.build()
		.unwrap();

		assert_eq!(config.project, "my-project");
		assert_eq!(config.api_url, DEFAULT_API_URL);
		assert!(config.access_token.is_none());
	}

	#[test]
	fn merge_keeps_token_from_lower_layer() {
		let mut base = GcpConfigLayer {
			access_token: Some(SecretString::new("ya29.token".to_string())),
			..Default::default()
		};
		base.merge(GcpConfigLayer {
			project: Some("p".to_string()),
			..Default::default()
		});

		let config = base.build().unwrap();
		assert_eq!(config.access_token.unwrap().expose(), "ya29.token");
	}
}
