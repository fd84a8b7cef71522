// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared state handed to every reconcile.

use std::sync::Arc;
use std::time::Duration;

use ghsync_config::GhsyncConfig;
use ghsync_core::{
	ConvergenceEngine, DestinationStore, EngineConfig, RemovalEngine, SourceKind, SourceRegistry,
};
use ghsync_gcp::{
	AccessTokenProvider, GcpSecretSource, MetadataServerToken, SecretManagerClient, StaticToken,
};
use ghsync_github::{GithubClient, GithubSecretStore, SecretScope};
use tracing::info;

use crate::client::GithubSecretClient;
use crate::error::SetupError;

pub struct Context {
	pub resources: Arc<dyn GithubSecretClient>,
	pub engine: ConvergenceEngine,
	/// Present only when destination cleanup on deletion is enabled.
	pub removal: Option<RemovalEngine>,
	pub error_requeue: Duration,
}

impl Context {
	pub fn new(
		resources: Arc<dyn GithubSecretClient>,
		engine: ConvergenceEngine,
		removal: Option<RemovalEngine>,
		error_requeue: Duration,
	) -> Self {
		Self {
			resources,
			engine,
			removal,
			error_requeue,
		}
	}

	/// Wire the GitHub destination and the GCP source from configuration.
	pub fn from_config(
		config: &GhsyncConfig,
		resources: Arc<dyn GithubSecretClient>,
	) -> Result<Self, SetupError> {
		let scope: SecretScope = config.github.secret_scope.parse()?;
		let github_config = ghsync_github::GithubConfig::new(config.github.token.clone())?
			.with_base_url(&config.github.api_url)?
			.with_scope(scope);
		let destination: Arc<dyn DestinationStore> =
			Arc::new(GithubSecretStore::new(GithubClient::new(github_config)?));

		let tokens: Arc<dyn AccessTokenProvider> = match &config.gcp.access_token {
			Some(token) => Arc::new(StaticToken::new(token.clone())),
			None => {
				info!("no GCP access token configured, using the metadata server");
				Arc::new(MetadataServerToken::new()?)
			}
		};
		let gcp_config =
			ghsync_gcp::GcpConfig::new(&config.gcp.project).with_base_url(&config.gcp.api_url);
		let source = GcpSecretSource::new(SecretManagerClient::new(gcp_config, tokens)?);
		let sources =
			SourceRegistry::new().with_source(SourceKind::GcpSecretManager, Arc::new(source));

		let controller = &config.controller;
		let engine = ConvergenceEngine::new(
			EngineConfig::new(&config.github.owner).with_retry_after(controller.retry_after),
			sources,
			destination.clone(),
		);
		let removal = controller.cleanup_on_delete.then(|| {
			RemovalEngine::new(&config.github.owner, controller.retry_after, destination)
		});

		Ok(Self::new(resources, engine, removal, controller.error_requeue))
	}
}
