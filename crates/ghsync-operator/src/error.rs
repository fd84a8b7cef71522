// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use ghsync_gcp::GcpError;
use ghsync_github::GithubError;
use thiserror::Error;

/// Result type alias for reconcile operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors that fail a reconcile as a whole. The controller requeues these
/// after the configured error delay.
#[derive(Error, Debug)]
pub enum ReconcileError {
	#[error("K8s API error: {message}")]
	ApiError { message: String },

	#[error("GithubSecret {name} has no namespace")]
	MissingNamespace { name: String },

	#[error("convergence pass failed: {message}")]
	PassFailed { message: String },
}

impl From<kube::Error> for ReconcileError {
	fn from(err: kube::Error) -> Self {
		ReconcileError::ApiError {
			message: err.to_string(),
		}
	}
}

/// Errors building the operator's collaborators from configuration.
#[derive(Error, Debug)]
pub enum SetupError {
	#[error("GitHub client setup failed: {0}")]
	Github(#[from] GithubError),

	#[error("GCP client setup failed: {0}")]
	Gcp(#[from] GcpError),
}
