// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Secret Manager client.

use ghsync_common_http::RetryableError;
use ghsync_core::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GcpError {
	/// Secret or version does not exist.
	#[error("secret not found: {0}")]
	NotFound(String),

	/// The credentials lack `secretmanager.versions.access`.
	#[error("access denied: {0}")]
	AccessDenied(String),

	/// The access token was rejected.
	#[error("unauthenticated: access token rejected")]
	Unauthenticated,

	/// Failed to obtain an access token.
	#[error("failed to obtain access token: {0}")]
	Token(String),

	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("request timed out")]
	Timeout,

	#[error("Secret Manager error: {status} - {message}")]
	Api { status: u16, message: String },

	#[error("invalid response: {0}")]
	InvalidResponse(String),

	#[error("invalid secret key '{0}'")]
	InvalidKey(String),

	#[error("configuration error: {0}")]
	Configuration(String),
}

pub type GcpResult<T> = Result<T, GcpError>;

impl RetryableError for GcpError {
	fn is_retryable(&self) -> bool {
		match self {
			GcpError::Http(e) => e.is_retryable(),
			GcpError::Timeout => true,
			GcpError::Api { status, .. } => *status == 429 || *status >= 500,
			_ => false,
		}
	}
}

impl GcpError {
	/// Convert into the engine's source error for `key`.
	pub fn into_source_error(self, key: &str) -> SourceError {
		match self {
			GcpError::NotFound(_) => SourceError::NotFound {
				key: key.to_string(),
			},
			GcpError::AccessDenied(message) => SourceError::AccessDenied {
				key: key.to_string(),
				message,
			},
			other => SourceError::unavailable(key, other.to_string()),
		}
	}
}
