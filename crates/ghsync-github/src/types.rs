// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types for the repository secrets endpoints.

use serde::{Deserialize, Serialize};

/// One page of `GET /repos/{owner}/{repo}/{scope}/secrets`.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretListResponse {
	pub total_count: u64,
	#[serde(default)]
	pub secrets: Vec<RepositorySecret>,
}

/// Secret metadata. GitHub never returns values.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositorySecret {
	pub name: String,
	#[serde(default)]
	pub created_at: Option<String>,
	#[serde(default)]
	pub updated_at: Option<String>,
}

/// `GET /repos/{owner}/{repo}/{scope}/secrets/public-key`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicKeyResponse {
	pub key_id: String,
	/// Base64 X25519 public key.
	pub key: String,
}

/// Body of `PUT /repos/{owner}/{repo}/{scope}/secrets/{name}`.
#[derive(Debug, Serialize)]
pub(crate) struct PutSecretRequest<'a> {
	pub encrypted_value: &'a str,
	pub key_id: &'a str,
}

/// GitHub's JSON error envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GithubErrorBody {
	pub message: String,
}
