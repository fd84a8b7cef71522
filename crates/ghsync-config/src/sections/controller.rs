// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Controller configuration section: watch scope, requeue timing and cleanup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_RETRY_AFTER_SECS: u64 = 300;
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 15;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfigLayer {
	/// Namespace to watch. Unset or empty watches every namespace.
	pub watch_namespace: Option<String>,
	/// Delay before retrying a pass that had item failures.
	pub retry_after_secs: Option<u64>,
	/// Delay before retrying a pass that failed as a whole.
	pub error_requeue_secs: Option<u64>,
	/// Delete destination secrets when a resource is deleted.
	pub cleanup_on_delete: Option<bool>,
}

impl ControllerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.watch_namespace.is_some() {
			self.watch_namespace = other.watch_namespace;
		}
		if other.retry_after_secs.is_some() {
			self.retry_after_secs = other.retry_after_secs;
		}
		if other.error_requeue_secs.is_some() {
			self.error_requeue_secs = other.error_requeue_secs;
		}
		if other.cleanup_on_delete.is_some() {
			self.cleanup_on_delete = other.cleanup_on_delete;
		}
	}

	pub fn build(self) -> Result<ControllerConfig, ConfigError> {
		let retry_after_secs = self.retry_after_secs.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
		if retry_after_secs == 0 {
			return Err(ConfigError::Validation(
				"controller.retry_after_secs must be greater than zero".to_string(),
			));
		}
		let error_requeue_secs = self
			.error_requeue_secs
			.unwrap_or(DEFAULT_ERROR_REQUEUE_SECS);
		if error_requeue_secs == 0 {
			return Err(ConfigError::Validation(
				"controller.error_requeue_secs must be greater than zero".to_string(),
			));
		}

		Ok(ControllerConfig {
			watch_namespace: self
				.watch_namespace
				.map(|ns| ns.trim().to_string())
				.filter(|ns| !ns.is_empty()),
			retry_after: Duration::from_secs(retry_after_secs),
			error_requeue: Duration::from_secs(error_requeue_secs),
			cleanup_on_delete: self.cleanup_on_delete.unwrap_or(false),
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
	pub watch_namespace: Option<String>,
	pub retry_after: Duration,
	pub error_requeue: Duration,
	pub cleanup_on_delete: bool,
}

impl Default for ControllerConfig {
	fn default() -> Self {
		Self {
			watch_namespace: None,
			retry_after: Duration::from_secs(DEFAULT_RETRY_AFTER_SECS),
			error_requeue: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
			cleanup_on_delete: false,
		}
	}
}
