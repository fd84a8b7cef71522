// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use crate::types::{ExistingSecretSet, SecretRef};

/// Declared secrets whose names are absent at the destination.
///
/// Built fresh each pass. Names are compared exactly, so a secret that
/// exists with a stale value is not part of the delta. When the declared
/// set repeats a name, the last entry wins. Iteration is in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingDelta {
	entries: BTreeMap<String, SecretRef>,
}

impl PendingDelta {
	pub fn compute(declared: &[SecretRef], existing: &ExistingSecretSet) -> Self {
		let mut by_name: BTreeMap<String, SecretRef> = BTreeMap::new();
		for secret in declared {
			by_name.insert(secret.name.clone(), secret.clone());
		}
		by_name.retain(|name, _| !existing.contains(name));

		Self { entries: by_name }
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = &SecretRef> {
		self.entries.values()
	}
}
