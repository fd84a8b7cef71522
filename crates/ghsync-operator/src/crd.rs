// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `GithubSecret` custom resource.
//!
//! ```yaml
//! apiVersion: ghsync.io/v1alpha1
//! kind: GithubSecret
//! metadata:
//!   name: infra-secrets
//! spec:
//!   repository: infra
//!   dependabotSecrets:
//!     secrets:
//!       - name: NPM_TOKEN
//!         key: npm-publish-token
//!         source: GCP
//! ```

use ghsync_core::{DeclaredState, SecretRef, SourceKind};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCE: &str = "GCP";

fn default_source() -> String {
	DEFAULT_SOURCE.to_string()
}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(
	group = "ghsync.io",
	version = "v1alpha1",
	kind = "GithubSecret",
	plural = "githubsecrets",
	shortname = "ghs",
	namespaced,
	status = "GithubSecretStatus",
	printcolumn = r#"{"name":"Repository","type":"string","jsonPath":".spec.repository"}"#,
	printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
	printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GithubSecretSpec {
	/// Repository name under the configured owner.
	pub repository: String,
	/// Also accepted under the legacy `dependaBotSecrets` spelling.
	#[serde(default, alias = "dependaBotSecrets")]
	pub dependabot_secrets: DependabotSecrets,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct DependabotSecrets {
	#[serde(default)]
	pub secrets: Vec<SecretEntry>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct SecretEntry {
	/// Key of the value in the source store.
	pub key: String,
	/// Secret name in the repository.
	pub name: String,
	#[serde(default = "default_source")]
	pub source: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct GithubSecretStatus {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub conditions: Vec<Condition>,
}

impl GithubSecret {
	/// Snapshot of the declared state for one pass.
	pub fn declared_state(&self) -> DeclaredState {
		let name = match self.namespace() {
			Some(ns) => format!("{ns}/{}", self.name_any()),
			None => self.name_any(),
		};
		DeclaredState {
			name,
			generation: self.metadata.generation.unwrap_or_default(),
			repository: self.spec.repository.clone(),
			secrets: self
				.spec
				.dependabot_secrets
				.secrets
				.iter()
				.map(|entry| {
					SecretRef::new(&entry.name, &entry.key).with_source(SourceKind::parse(&entry.source))
				})
				.collect(),
		}
	}

	pub fn conditions(&self) -> &[Condition] {
		self
			.status
			.as_ref()
			.map(|s| s.conditions.as_slice())
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use kube::CustomResourceExt;

	#[test]
	fn crd_is_namespaced_with_status_subresource() {
		let crd = GithubSecret::crd();
		assert_eq!(crd.metadata.name.as_deref(), Some("githubsecrets.ghsync.io"));
		assert_eq!(crd.spec.group, "ghsync.io");
		assert_eq!(crd.spec.scope, "Namespaced");
		assert_eq!(crd.spec.names.kind, "GithubSecret");

		let version = &crd.spec.versions[0];
		assert_eq!(version.name, "v1alpha1");
		assert!(version
			.subresources
			.as_ref()
			.and_then(|s| s.status.as_ref())
			.is_some());
	}

	#[test]
	fn source_defaults_to_gcp() {
		let spec: GithubSecretSpec = serde_json::from_value(serde_json::json!({
			"repository": "infra",
			"dependabotSecrets": {
				"secrets": [{ "key": "npm-token", "name": "NPM_TOKEN" }]
			}
		}))
		.unwrap();

		assert_eq!(spec.dependabot_secrets.secrets[0].source, "GCP");
	}

	#[test]
	fn legacy_field_spelling_is_accepted() {
		let spec: GithubSecretSpec = serde_json::from_value(serde_json::json!({
			"repository": "infra",
			"dependaBotSecrets": {
				"secrets": [{ "key": "k", "name": "N", "source": "GCP" }]
			}
		}))
		.unwrap();

		assert_eq!(spec.dependabot_secrets.secrets.len(), 1);
	}

	#[test]
	fn missing_secret_list_is_empty() {
		let spec: GithubSecretSpec =
			serde_json::from_value(serde_json::json!({ "repository": "infra" })).unwrap();
		assert!(spec.dependabot_secrets.secrets.is_empty());
	}

	#[test]
	fn declared_state_carries_generation_and_sources() {
		let mut resource = GithubSecret::new(
			"infra-secrets",
			GithubSecretSpec {
				repository: "infra".to_string(),
				dependabot_secrets: DependabotSecrets {
					secrets: vec![
						SecretEntry {
							key: "k1".to_string(),
							name: "A".to_string(),
							source: "GCP".to_string(),
						},
						SecretEntry {
							key: "k2".to_string(),
							name: "B".to_string(),
							source: "vault".to_string(),
						},
					],
				},
			},
		);
		resource.metadata.namespace = Some("team-a".to_string());
		resource.metadata.generation = Some(7);

		let declared = resource.declared_state();
		assert_eq!(declared.name, "team-a/infra-secrets");
		assert_eq!(declared.generation, 7);
		assert_eq!(declared.repository, "infra");
		assert_eq!(declared.secrets[0].source_kind, SourceKind::GcpSecretManager);
		assert_eq!(
			declared.secrets[1].source_kind,
			SourceKind::Unsupported("vault".to_string())
		);
		assert_eq!(declared.secrets[1].source_key, "k2");
	}
}
