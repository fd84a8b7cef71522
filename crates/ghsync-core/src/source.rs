// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::{SourceKind, SourceValue};

/// A backing store that holds secret plaintexts.
#[async_trait]
pub trait SecretValueSource: Send + Sync {
	/// Read the current value stored under `key`.
	async fn get_value(&self, key: &str) -> Result<SourceValue, SourceError>;
}

/// Sources available to the engine, keyed by the kind declared on a secret.
#[derive(Clone, Default)]
pub struct SourceRegistry {
	sources: HashMap<SourceKind, Arc<dyn SecretValueSource>>,
}

impl SourceRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_source(mut self, kind: SourceKind, source: Arc<dyn SecretValueSource>) -> Self {
		self.register(kind, source);
		self
	}

	pub fn register(&mut self, kind: SourceKind, source: Arc<dyn SecretValueSource>) {
		self.sources.insert(kind, source);
	}

	pub fn get(&self, kind: &SourceKind) -> Option<&Arc<dyn SecretValueSource>> {
		self.sources.get(kind)
	}

	pub fn is_empty(&self) -> bool {
		self.sources.is_empty()
	}
}

impl std::fmt::Debug for SourceRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SourceRegistry")
			.field("kinds", &self.sources.keys().collect::<Vec<_>>())
			.finish()
	}
}
