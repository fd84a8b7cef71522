// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! A full pass through the engine against a mocked GitHub API.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use crypto_box::SecretKey;
use ghsync_common_secret::SecretString;
use ghsync_core::testing::StaticSource;
use ghsync_core::{
	open, ConvergenceEngine, ConvergenceStatus, DeclaredState, EngineConfig, RequeueAction,
	SecretRef, SourceKind, SourceRegistry,
};
use ghsync_github::{GithubClient, GithubConfig, GithubSecretStore, RetryConfig};
use rand::rngs::OsRng;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn missing_secret_is_uploaded_sealed_to_repository_key() {
	let server = MockServer::start().await;
	let repo_key = SecretKey::generate(&mut OsRng);

	Mock::given(method("GET"))
		.and(path("/repos/fr123k/infra/dependabot/secrets"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"total_count": 1,
			"secrets": [{"name": "EXISTING"}]
		})))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/repos/fr123k/infra/dependabot/secrets/public-key"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"key_id": "568250167242549743",
			"key": STANDARD.encode(repo_key.public_key().as_bytes())
		})))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("PUT"))
		.and(path("/repos/fr123k/infra/dependabot/secrets/NPM_TOKEN"))
		.respond_with(ResponseTemplate::new(201))
		.expect(1)
		.mount(&server)
		.await;

	let config = GithubConfig::new(SecretString::new("ghp_test".to_string()))
		.unwrap()
		.with_base_url(&server.uri())
		.unwrap()
		.with_retry_config(RetryConfig {
			max_attempts: 1,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(1),
			backoff_factor: 1.0,
			jitter: false,
		});
	let store = GithubSecretStore::new(GithubClient::new(config).unwrap());
	let source = StaticSource::new().with_value("npm-token", "npm_abc123");
	let engine = ConvergenceEngine::new(
		EngineConfig::new("fr123k"),
		SourceRegistry::new().with_source(SourceKind::GcpSecretManager, Arc::new(source)),
		Arc::new(store),
	);

	let declared = DeclaredState {
		name: "default/infra".to_string(),
		generation: 1,
		repository: "infra".to_string(),
		secrets: vec![
			SecretRef::new("EXISTING", "existing"),
			SecretRef::new("NPM_TOKEN", "npm-token"),
		],
	};
	let outcome = engine.run_pass(&declared, &ConvergenceStatus::new()).await;

	assert!(outcome.is_ready());
	assert_eq!(outcome.requeue, RequeueAction::None);

	let requests = server.received_requests().await.unwrap();
	let put = requests
		.iter()
		.find(|r| r.method.as_str() == "PUT")
		.unwrap();
	let body: Value = serde_json::from_slice(&put.body).unwrap();
	assert_eq!(body["key_id"], "568250167242549743");

	let sealed = body["encrypted_value"].as_str().unwrap();
	let opened = open(&repo_key, sealed).unwrap();
	assert_eq!(opened.as_slice(), b"npm_abc123");
}
