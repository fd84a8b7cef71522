// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::crd::GithubSecretStatus;
use crate::error::ReconcileResult;

/// Writes the reconciler makes to `GithubSecret` objects.
///
/// Kept behind a trait so the reconcile logic can be exercised without a
/// cluster.
#[async_trait]
pub trait GithubSecretClient: Send + Sync {
	/// Replace the status subresource's conditions.
	async fn patch_status(
		&self,
		namespace: &str,
		name: &str,
		status: &GithubSecretStatus,
	) -> ReconcileResult<()>;

	/// Replace the finalizer list. The write is rejected if the object
	/// changed since `resource_version`.
	async fn set_finalizers(
		&self,
		namespace: &str,
		name: &str,
		finalizers: Vec<String>,
		resource_version: Option<String>,
	) -> ReconcileResult<()>;
}
