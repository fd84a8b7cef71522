// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conditions recorded on the declared-state resource.
//!
//! At most one condition per type. Error conditions are set with
//! `status = true` ("this problem is present") and removed once a pass gets
//! past them; `Ready` is removed whenever any error condition is present.

use std::fmt;

/// Machine-readable reasons attached to conditions.
pub mod reason {
	pub const RECONCILIATION_SUCCEEDED: &str = "ReconciliationSucceeded";
	pub const LIST_SECRETS_FAILED: &str = "ListSecretsFailed";
	pub const PUBLIC_KEY_FAILED: &str = "PublicKeyFailed";
	pub const SOURCE_READ_FAILED: &str = "SourceReadFailed";
	pub const SOURCE_NOT_CONFIGURED: &str = "SourceNotConfigured";
	pub const SEAL_FAILED: &str = "SealFailed";
	pub const UPLOAD_FAILED: &str = "UploadFailed";
	pub const DELETE_FAILED: &str = "DeleteFailed";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConditionType {
	/// Every declared secret exists at the destination.
	Ready,
	/// A declared secret names a source this build cannot read.
	SourceMissing,
	/// The source store could not return a value.
	StoreError,
	/// Listing, key retrieval, sealing or upload at the destination failed.
	DestinationError,
}

impl ConditionType {
	pub const ERRORS: [ConditionType; 3] = [
		ConditionType::SourceMissing,
		ConditionType::StoreError,
		ConditionType::DestinationError,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			ConditionType::Ready => "Ready",
			ConditionType::SourceMissing => "SourceMissing",
			ConditionType::StoreError => "StoreError",
			ConditionType::DestinationError => "DestinationError",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"Ready" => Some(ConditionType::Ready),
			"SourceMissing" => Some(ConditionType::SourceMissing),
			"StoreError" => Some(ConditionType::StoreError),
			"DestinationError" => Some(ConditionType::DestinationError),
			_ => None,
		}
	}

	pub fn is_error(&self) -> bool {
		Self::ERRORS.contains(self)
	}
}

impl fmt::Display for ConditionType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
	pub condition_type: ConditionType,
	pub status: bool,
	pub reason: String,
	pub message: String,
	pub observed_generation: i64,
}

impl Condition {
	pub fn new(
		condition_type: ConditionType,
		status: bool,
		reason: impl Into<String>,
		message: impl Into<String>,
		observed_generation: i64,
	) -> Self {
		Self {
			condition_type,
			status,
			reason: reason.into(),
			message: message.into(),
			observed_generation,
		}
	}
}

/// The condition list of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvergenceStatus {
	conditions: Vec<Condition>,
}

impl ConvergenceStatus {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_conditions(conditions: impl IntoIterator<Item = Condition>) -> Self {
		let mut status = Self::new();
		for condition in conditions {
			status.set(condition);
		}
		status
	}

	pub fn conditions(&self) -> &[Condition] {
		&self.conditions
	}

	pub fn get(&self, condition_type: ConditionType) -> Option<&Condition> {
		self
			.conditions
			.iter()
			.find(|c| c.condition_type == condition_type)
	}

	/// Insert or replace the condition of the same type.
	pub fn set(&mut self, condition: Condition) {
		match self
			.conditions
			.iter_mut()
			.find(|c| c.condition_type == condition.condition_type)
		{
			Some(existing) => *existing = condition,
			None => self.conditions.push(condition),
		}
	}

	pub fn remove(&mut self, condition_type: ConditionType) {
		self.conditions.retain(|c| c.condition_type != condition_type);
	}

	pub fn clear_errors(&mut self) {
		self.conditions.retain(|c| !c.condition_type.is_error());
	}

	pub fn has_errors(&self) -> bool {
		self.conditions.iter().any(|c| c.condition_type.is_error())
	}

	/// True when a pass already converged this generation.
	pub fn is_ready_for(&self, generation: i64) -> bool {
		self.get(ConditionType::Ready)
			.is_some_and(|c| c.status && c.observed_generation == generation)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ready(generation: i64) -> Condition {
		Condition::new(
			ConditionType::Ready,
			true,
			reason::RECONCILIATION_SUCCEEDED,
			"1 secret(s) synchronized to o/r",
			generation,
		)
	}

	#[test]
	fn set_replaces_same_type() {
		let mut status = ConvergenceStatus::new();
		status.set(Condition::new(
			ConditionType::StoreError,
			true,
			reason::SOURCE_READ_FAILED,
			"first",
			1,
		));
		status.set(Condition::new(
			ConditionType::StoreError,
			true,
			reason::SOURCE_READ_FAILED,
			"second",
			1,
		));

		assert_eq!(status.conditions().len(), 1);
		assert_eq!(
			status.get(ConditionType::StoreError).unwrap().message,
			"second"
		);
	}

	#[test]
	fn clear_errors_keeps_ready() {
		let mut status = ConvergenceStatus::from_conditions([
			ready(2),
			Condition::new(
				ConditionType::DestinationError,
				true,
				reason::UPLOAD_FAILED,
				"boom",
				2,
			),
		]);
		assert!(status.has_errors());

		status.clear_errors();

		assert!(!status.has_errors());
		assert!(status.get(ConditionType::Ready).is_some());
	}

	#[test]
	fn ready_is_scoped_to_generation() {
		let status = ConvergenceStatus::from_conditions([ready(3)]);
		assert!(status.is_ready_for(3));
		assert!(!status.is_ready_for(4));
	}

	#[test]
	fn false_ready_is_not_ready() {
		let mut condition = ready(1);
		condition.status = false;
		let status = ConvergenceStatus::from_conditions([condition]);
		assert!(!status.is_ready_for(1));
	}

	#[test]
	fn condition_type_names_roundtrip() {
		for ty in [
			ConditionType::Ready,
			ConditionType::SourceMissing,
			ConditionType::StoreError,
			ConditionType::DestinationError,
		] {
			assert_eq!(ConditionType::parse(ty.as_str()), Some(ty));
		}
		assert_eq!(ConditionType::parse("GithubActionSecretError"), None);
	}
}
