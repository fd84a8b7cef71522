// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the GitHub secrets client.

use ghsync_common_http::RetryableError;
use ghsync_core::DestinationError;
use thiserror::Error;

/// Errors that can occur when talking to the GitHub secrets API.
#[derive(Debug, Error)]
pub enum GithubError {
	/// Network-level error during HTTP communication.
	#[error("Network error: {0}")]
	Network(#[from] reqwest::Error),

	/// Request timed out.
	#[error("Request timed out")]
	Timeout,

	/// Token missing, expired or revoked.
	#[error("Unauthorized: check the GitHub token")]
	Unauthorized,

	/// Token lacks the secrets permission on the repository.
	#[error("Forbidden: {0}")]
	Forbidden(String),

	/// Rate limit exceeded.
	#[error("Rate limit exceeded")]
	RateLimited,

	/// Repository or secret not found (or not visible to the token).
	#[error("Not found: {0}")]
	NotFound(String),

	/// GitHub API returned another error status.
	#[error("GitHub API error: {status} - {message}")]
	ApiError { status: u16, message: String },

	/// Invalid or unparseable response.
	#[error("Invalid response from GitHub: {0}")]
	InvalidResponse(String),

	/// Configuration error.
	#[error("Configuration error: {0}")]
	Config(String),
}

impl RetryableError for GithubError {
	fn is_retryable(&self) -> bool {
		match self {
			GithubError::Network(e) => e.is_retryable(),
			GithubError::Timeout => true,
			GithubError::RateLimited => true,
			GithubError::ApiError { status, .. } => *status >= 500,
			_ => false,
		}
	}
}

impl GithubError {
	pub fn api_error(status: u16, message: impl Into<String>) -> Self {
		Self::ApiError {
			status,
			message: message.into(),
		}
	}
}

impl From<GithubError> for DestinationError {
	fn from(err: GithubError) -> Self {
		match err {
			GithubError::Network(_)
			| GithubError::Timeout
			| GithubError::RateLimited
			| GithubError::InvalidResponse(_) => DestinationError::Unavailable(err.to_string()),
			GithubError::ApiError { status, .. } if status >= 500 => {
				DestinationError::Unavailable(err.to_string())
			}
			GithubError::ApiError { status, message } => DestinationError::rejected(status, message),
			GithubError::Unauthorized => DestinationError::rejected(401, err.to_string()),
			GithubError::Forbidden(_) => DestinationError::rejected(403, err.to_string()),
			GithubError::NotFound(_) => DestinationError::rejected(404, err.to_string()),
			GithubError::Config(_) => DestinationError::rejected(0, err.to_string()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn retryable_classification() {
		assert!(GithubError::Timeout.is_retryable());
		assert!(GithubError::RateLimited.is_retryable());
		assert!(GithubError::api_error(502, "Bad Gateway").is_retryable());
		assert!(!GithubError::api_error(422, "Unprocessable").is_retryable());
		assert!(!GithubError::Unauthorized.is_retryable());
		assert!(!GithubError::NotFound("repo".to_string()).is_retryable());
	}

	#[test]
	fn server_errors_map_to_unavailable() {
		let err: DestinationError = GithubError::api_error(503, "Service Unavailable").into();
		assert!(matches!(err, DestinationError::Unavailable(_)));

		let err: DestinationError = GithubError::RateLimited.into();
		assert!(matches!(err, DestinationError::Unavailable(_)));
	}

	#[test]
	fn client_errors_map_to_rejected() {
		let err: DestinationError = GithubError::api_error(422, "bad key_id").into();
		assert_eq!(err, DestinationError::rejected(422, "bad key_id"));

		let err: DestinationError = GithubError::Unauthorized.into();
		assert!(matches!(err, DestinationError::Rejected { status: 401, .. }));
	}
}
