// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Removal pass, run when a declared-state resource is deleted.
//!
//! Symmetric to the convergence pass but kept separate from it: every
//! declared name is deleted from the destination, items are isolated from
//! each other, and the caller may only release the resource once
//! `requeue` is [`RequeueAction::None`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::destination::DestinationStore;
use crate::engine::{ItemFailure, RequeueAction};
use crate::status::{reason, ConditionType};
use crate::types::{Collection, DeclaredState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalOutcome {
	pub removed: Vec<String>,
	pub failures: Vec<ItemFailure>,
	pub requeue: RequeueAction,
}

impl RemovalOutcome {
	pub fn is_complete(&self) -> bool {
		self.failures.is_empty()
	}
}

pub struct RemovalEngine {
	owner: String,
	retry_after: Duration,
	destination: Arc<dyn DestinationStore>,
}

impl RemovalEngine {
	pub fn new(
		owner: impl Into<String>,
		retry_after: Duration,
		destination: Arc<dyn DestinationStore>,
	) -> Self {
		Self {
			owner: owner.into(),
			retry_after,
			destination,
		}
	}

	#[instrument(skip(self, declared), fields(resource = %declared.name, repository = %declared.repository))]
	pub async fn remove(&self, declared: &DeclaredState) -> RemovalOutcome {
		let collection = Collection::new(&self.owner, &declared.repository);
		let names: BTreeSet<&str> = declared.secrets.iter().map(|s| s.name.as_str()).collect();

		let mut removed = Vec::new();
		let mut failures = Vec::new();
		for name in names {
			match self.destination.delete_secret(&collection, name).await {
				Ok(()) => {
					info!(secret = %name, "secret removed");
					removed.push(name.to_string());
				}
				Err(e) => {
					warn!(secret = %name, error = %e, "secret removal failed");
					failures.push(ItemFailure {
						name: name.to_string(),
						kind: ConditionType::DestinationError,
						reason: reason::DELETE_FAILED,
						message: e.to_string(),
					});
				}
			}
		}

		let requeue = if failures.is_empty() {
			RequeueAction::None
		} else {
			RequeueAction::After(self.retry_after)
		};
		RemovalOutcome {
			removed,
			failures,
			requeue,
		}
	}
}
