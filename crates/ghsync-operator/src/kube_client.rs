// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::client::GithubSecretClient;
use crate::crd::{GithubSecret, GithubSecretStatus};
use crate::error::ReconcileResult;

#[derive(Debug, Serialize)]
struct StatusPatch<'a> {
	status: &'a GithubSecretStatus,
}

#[derive(Debug, Serialize)]
struct FinalizerPatch {
	metadata: FinalizerMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FinalizerMetadata {
	finalizers: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	resource_version: Option<String>,
}

/// Production client backed by the kube crate.
#[derive(Clone)]
pub struct KubeClient {
	client: Client,
}

impl KubeClient {
	pub fn new(client: Client) -> Self {
		Self { client }
	}

	fn api(&self, namespace: &str) -> Api<GithubSecret> {
		Api::namespaced(self.client.clone(), namespace)
	}
}

#[async_trait]
impl GithubSecretClient for KubeClient {
	#[instrument(skip(self, status))]
	async fn patch_status(
		&self,
		namespace: &str,
		name: &str,
		status: &GithubSecretStatus,
	) -> ReconcileResult<()> {
		let patch = StatusPatch { status };
		self
			.api(namespace)
			.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
			.await?;
		debug!(conditions = status.conditions.len(), "status patched");
		Ok(())
	}

	#[instrument(skip(self))]
	async fn set_finalizers(
		&self,
		namespace: &str,
		name: &str,
		finalizers: Vec<String>,
		resource_version: Option<String>,
	) -> ReconcileResult<()> {
		let patch = FinalizerPatch {
			metadata: FinalizerMetadata {
				finalizers,
				resource_version,
			},
		};
		self
			.api(namespace)
			.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
			.await?;
		Ok(())
	}
}
