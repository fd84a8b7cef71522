// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::env::load_first_secret_env;
use crate::error::ConfigError;
use crate::layer::GhsyncConfigLayer;
use crate::sections::{
	ControllerConfigLayer, GcpConfigLayer, GithubConfigLayer, LogFormat, LoggingConfigLayer,
};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/ghsync/config.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<GhsyncConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<GhsyncConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(GhsyncConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file is skipped.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<GhsyncConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(GhsyncConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: GhsyncConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: GHSYNC_<SECTION>_<FIELD>. The GitHub token also accepts the
/// conventional `GITHUB_TOKEN`, and both tokens accept a `*_FILE` variant.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<GhsyncConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(GhsyncConfigLayer {
			github: Some(load_github_from_env()?),
			gcp: Some(load_gcp_from_env()?),
			controller: Some(load_controller_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v == "true" || v == "1")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_github_from_env() -> Result<GithubConfigLayer, ConfigError> {
	let token = load_first_secret_env(&["GHSYNC_GITHUB_TOKEN", "GITHUB_TOKEN"])
		.map_err(|e| ConfigError::Secret(e.to_string()))?;

	Ok(GithubConfigLayer {
		token,
		api_url: env_var("GHSYNC_GITHUB_API_URL"),
		owner: env_var("GHSYNC_GITHUB_OWNER"),
		secret_scope: env_var("GHSYNC_GITHUB_SECRET_SCOPE"),
	})
}

fn load_gcp_from_env() -> Result<GcpConfigLayer, ConfigError> {
	let access_token = load_first_secret_env(&["GHSYNC_GCP_ACCESS_TOKEN"])
		.map_err(|e| ConfigError::Secret(e.to_string()))?;

	Ok(GcpConfigLayer {
		project: env_var("GHSYNC_GCP_PROJECT"),
		api_url: env_var("GHSYNC_GCP_API_URL"),
		access_token,
	})
}

fn load_controller_from_env() -> Result<ControllerConfigLayer, ConfigError> {
	Ok(ControllerConfigLayer {
		watch_namespace: env_var("GHSYNC_WATCH_NAMESPACE"),
		retry_after_secs: env_u64("GHSYNC_RETRY_AFTER_SECS")?,
		error_requeue_secs: env_u64("GHSYNC_ERROR_REQUEUE_SECS")?,
		cleanup_on_delete: env_bool("GHSYNC_CLEANUP_ON_DELETE"),
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("GHSYNC_LOG_FORMAT") {
		Some(raw) => Some(raw.parse::<LogFormat>().map_err(|message| {
			ConfigError::InvalidValue {
				key: "GHSYNC_LOG_FORMAT".to_string(),
				message,
			}
		})?),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("GHSYNC_LOG_LEVEL"),
		format,
	})
}
