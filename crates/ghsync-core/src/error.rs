// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy for the sealing primitive and the two collaborators.
//!
//! None of these variants carries a plaintext value. Source errors name the
//! store key that failed, never its payload.

use thiserror::Error;

/// Errors from [`crate::seal`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SealError {
	/// The recipient key is not valid base64.
	#[error("recipient public key is not valid base64: {0}")]
	InvalidKeyEncoding(String),

	/// The recipient key decoded to the wrong number of bytes.
	#[error("recipient public key has invalid length ({actual} bytes)")]
	InvalidKeyLength { actual: usize },

	/// The OS random source failed while generating the ephemeral key.
	#[error("random source failure: {0}")]
	RandomSource(String),

	/// The nonce hash could not be constructed or finalized.
	#[error("nonce derivation failed: {0}")]
	NonceDerivation(String),

	/// The box construction rejected its input.
	#[error("box encryption failed")]
	Encryption,

	/// A sealed envelope could not be opened.
	#[error("sealed value could not be opened: {0}")]
	Open(String),
}

/// Errors from a [`crate::SecretValueSource`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
	#[error("secret {key} not found in source store")]
	NotFound { key: String },

	#[error("access to secret {key} denied: {message}")]
	AccessDenied { key: String, message: String },

	#[error("source store unavailable while reading {key}: {message}")]
	Unavailable { key: String, message: String },
}

impl SourceError {
	pub fn unavailable(key: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Unavailable {
			key: key.into(),
			message: message.into(),
		}
	}
}

/// Errors from a [`crate::DestinationStore`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DestinationError {
	/// Transport failure, timeout, rate limit or 5xx. Worth retrying.
	#[error("destination unavailable: {0}")]
	Unavailable(String),

	/// The destination refused the request.
	#[error("destination rejected request ({status}): {message}")]
	Rejected { status: u16, message: String },
}

impl DestinationError {
	pub fn rejected(status: u16, message: impl Into<String>) -> Self {
		Self::Rejected {
			status,
			message: message.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_length_error_reports_actual_length() {
		let err = SealError::InvalidKeyLength { actual: 13 };
		assert_eq!(
			err.to_string(),
			"recipient public key has invalid length (13 bytes)"
		);
	}

	#[test]
	fn source_error_names_the_key() {
		let err = SourceError::unavailable("projects/p/secrets/db", "connection reset");
		assert!(err.to_string().contains("projects/p/secrets/db"));
	}

	#[test]
	fn rejected_error_display() {
		let err = DestinationError::rejected(422, "bad key_id");
		assert_eq!(
			err.to_string(),
			"destination rejected request (422): bad key_id"
		);
	}
}
