// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Engine-owned data records.
//!
//! These are deliberately plain: the Kubernetes resource and the GitHub/GCP
//! wire types are translated into them at the adapter boundary.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use ghsync_common_secret::SecretBytes;

/// Where a declared secret's plaintext lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKind {
	/// Google Cloud Secret Manager (`source: GCP`).
	GcpSecretManager,
	/// A source name this build does not know how to read.
	Unsupported(String),
}

impl SourceKind {
	/// Parse the resource's `source` field. Empty means the default, GCP.
	pub fn parse(raw: &str) -> Self {
		let trimmed = raw.trim();
		if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("gcp") {
			SourceKind::GcpSecretManager
		} else {
			SourceKind::Unsupported(trimmed.to_string())
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			SourceKind::GcpSecretManager => "GCP",
			SourceKind::Unsupported(name) => name,
		}
	}
}

impl fmt::Display for SourceKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One declared secret: the destination name and where to read its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
	pub name: String,
	pub source_key: String,
	pub source_kind: SourceKind,
}

impl SecretRef {
	pub fn new(name: impl Into<String>, source_key: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			source_key: source_key.into(),
			source_kind: SourceKind::GcpSecretManager,
		}
	}

	pub fn with_source(mut self, kind: SourceKind) -> Self {
		self.source_kind = kind;
		self
	}
}

/// Snapshot of one declared-state resource, immutable for a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredState {
	/// Identity of the declaring resource, used for logs only.
	pub name: String,
	pub generation: i64,
	pub repository: String,
	pub secrets: Vec<SecretRef>,
}

/// Destination scope: an owner/repository pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Collection {
	pub owner: String,
	pub repository: String,
}

impl Collection {
	pub fn new(owner: impl Into<String>, repository: impl Into<String>) -> Self {
		Self {
			owner: owner.into(),
			repository: repository.into(),
		}
	}
}

impl fmt::Display for Collection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.owner, self.repository)
	}
}

/// Secret names present at the destination, fetched fresh every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingSecretSet(BTreeSet<String>);

impl ExistingSecretSet {
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains(name)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}

impl<S: Into<String>> FromIterator<S> for ExistingSecretSet {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self(iter.into_iter().map(Into::into).collect())
	}
}

/// The destination's current sealing key.
///
/// `key` is the base64 form the destination hands out; [`crate::seal`]
/// decodes and validates it. May rotate between passes, so it is never
/// cached beyond the pass that fetched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientKey {
	pub key_id: String,
	pub key: String,
}

/// A sealed value ready for upload. Dropped right after the upsert.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedSecret {
	pub name: String,
	pub key_id: String,
	pub encrypted_value: String,
}

impl fmt::Debug for SealedSecret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SealedSecret")
			.field("name", &self.name)
			.field("key_id", &self.key_id)
			.field("encrypted_len", &self.encrypted_value.len())
			.finish()
	}
}

/// A plaintext read from the source store. Any byte content is allowed.
#[derive(Debug, Clone)]
pub struct SourceValue {
	pub value: SecretBytes,
	pub resolved_at: DateTime<Utc>,
}

impl SourceValue {
	pub fn new(value: SecretBytes) -> Self {
		Self {
			value,
			resolved_at: Utc::now(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn source_kind_parses_gcp_variants() {
		assert_eq!(SourceKind::parse("GCP"), SourceKind::GcpSecretManager);
		assert_eq!(SourceKind::parse("gcp"), SourceKind::GcpSecretManager);
		assert_eq!(SourceKind::parse(""), SourceKind::GcpSecretManager);
		assert_eq!(
			SourceKind::parse(" vault "),
			SourceKind::Unsupported("vault".to_string())
		);
		assert_eq!(SourceKind::parse("vault").to_string(), "vault");
	}

	#[test]
	fn collection_displays_as_owner_slash_repo() {
		assert_eq!(Collection::new("fr123k", "infra").to_string(), "fr123k/infra");
	}

	#[test]
	fn existing_set_collects_names() {
		let existing: ExistingSecretSet = ["A", "B", "A"].into_iter().collect();
		assert_eq!(existing.len(), 2);
		assert!(existing.contains("A"));
		assert!(!existing.contains("C"));
	}

	#[test]
	fn sealed_secret_debug_hides_ciphertext() {
		let sealed = SealedSecret {
			name: "NPM_TOKEN".to_string(),
			key_id: "k1".to_string(),
			encrypted_value: "c2VhbGVkLWJ5dGVz".to_string(),
		};
		let debug = format!("{sealed:?}");
		assert!(debug.contains("NPM_TOKEN"));
		assert!(!debug.contains("c2VhbGVkLWJ5dGVz"));
	}
}
