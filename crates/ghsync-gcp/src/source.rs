// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use ghsync_core::{SecretValueSource, SourceError, SourceValue};

use crate::client::SecretManagerClient;

/// [`SecretValueSource`] for `source: GCP` secrets.
#[derive(Clone)]
pub struct GcpSecretSource {
	client: Arc<SecretManagerClient>,
}

impl GcpSecretSource {
	pub fn new(client: SecretManagerClient) -> Self {
		Self {
			client: Arc::new(client),
		}
	}
}

#[async_trait]
impl SecretValueSource for GcpSecretSource {
	async fn get_value(&self, key: &str) -> Result<SourceValue, SourceError> {
		self
			.client
			.access(key)
			.await
			.map(SourceValue::new)
			.map_err(|e| e.into_source_error(key))
	}
}
