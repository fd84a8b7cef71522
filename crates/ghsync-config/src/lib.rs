// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the ghsync operator.
//!
//! Sources are merged in precedence order: built-in defaults, then the TOML
//! file (`--config <path>` or `/etc/ghsync/config.toml`), then `GHSYNC_*`
//! environment variables. The merged layer is finalized into a
//! [`GhsyncConfig`] whose `Debug` output never contains a token.

pub mod env;
pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use env::{load_first_secret_env, load_secret_env, SecretEnvError};
pub use error::ConfigError;
pub use layer::GhsyncConfigLayer;
pub use sections::{
	ControllerConfig, GcpConfig, GithubConfig, LogFormat, LoggingConfig,
};
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved operator configuration.
#[derive(Debug, Clone)]
pub struct GhsyncConfig {
	pub github: GithubConfig,
	pub gcp: GcpConfig,
	pub controller: ControllerConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from defaults, the system config file and the environment.
pub fn load_config() -> Result<GhsyncConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<GhsyncConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<GhsyncConfig, ConfigError> {
	let mut merged = GhsyncConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Merge `sources` in precedence order and finalize the result.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<GhsyncConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = GhsyncConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: GhsyncConfigLayer) -> Result<GhsyncConfig, ConfigError> {
	let github = layer.github.unwrap_or_default().build()?;
	let gcp = layer.gcp.unwrap_or_default().build()?;
	let controller = layer.controller.unwrap_or_default().build()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	info!(
		owner = %github.owner,
		scope = %github.secret_scope,
		gcp_project = %gcp.project,
		namespace = controller.watch_namespace.as_deref().unwrap_or("*"),
		cleanup_on_delete = controller.cleanup_on_delete,
		"configuration loaded"
	);

	Ok(GhsyncConfig {
		github,
		gcp,
		controller,
		logging,
	})
}
