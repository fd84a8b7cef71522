// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{ControllerConfigLayer, GcpConfigLayer, GithubConfigLayer, LoggingConfigLayer};

/// Operator configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GhsyncConfigLayer {
	#[serde(default)]
	pub github: Option<GithubConfigLayer>,
	#[serde(default)]
	pub gcp: Option<GcpConfigLayer>,
	#[serde(default)]
	pub controller: Option<ControllerConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl GhsyncConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: GhsyncConfigLayer) {
		merge_option(&mut self.github, other.github, GithubConfigLayer::merge);
		merge_option(&mut self.gcp, other.gcp, GcpConfigLayer::merge);
		merge_option(
			&mut self.controller,
			other.controller,
			ControllerConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}
