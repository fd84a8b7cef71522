// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One convergence pass: list, diff, then fetch → seal → upsert per item.
//!
//! ```text
//! START -> CHECK_READY -> LIST_EXISTING -> READY (empty delta)
//!                                       -> FOR_EACH_DELTA -> DONE
//! ```
//!
//! Pass-level failures (listing, recipient key) abort the pass and ask for
//! an immediate requeue. Item-level failures are isolated: siblings still
//! upload, and the pass asks to be retried after `retry_after`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::delta::PendingDelta;
use crate::destination::DestinationStore;
use crate::seal::seal;
use crate::source::SourceRegistry;
use crate::status::{reason, Condition, ConditionType, ConvergenceStatus};
use crate::types::{Collection, DeclaredState, RecipientKey, SealedSecret, SecretRef};

/// Delay before retrying a pass that had item failures.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Longest condition message written back to the resource.
const MAX_MESSAGE_LEN: usize = 4096;

/// What the invoking loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequeueAction {
	/// Converged, or nothing left to do until the declared state changes.
	None,
	/// A pass-level dependency failed; try again soon.
	Immediate,
	/// Some items failed; try again after a fixed delay.
	After(Duration),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
	/// Destination owner; the repository comes from the declared state.
	pub owner: String,
	pub retry_after: Duration,
}

impl EngineConfig {
	pub fn new(owner: impl Into<String>) -> Self {
		Self {
			owner: owner.into(),
			retry_after: DEFAULT_RETRY_AFTER,
		}
	}

	pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
		self.retry_after = retry_after;
		self
	}
}

/// One secret that did not make it to the destination this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
	pub name: String,
	pub kind: ConditionType,
	pub reason: &'static str,
	pub message: String,
}

/// Counters and failures from one pass, for logs and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
	pub short_circuited: bool,
	pub pending: usize,
	pub uploaded: Vec<String>,
	pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Clone)]
pub struct PassOutcome {
	pub status: ConvergenceStatus,
	pub requeue: RequeueAction,
	pub report: PassReport,
}

impl PassOutcome {
	pub fn is_ready(&self) -> bool {
		self.status
			.get(ConditionType::Ready)
			.is_some_and(|c| c.status)
	}
}

pub struct ConvergenceEngine {
	config: EngineConfig,
	sources: SourceRegistry,
	destination: Arc<dyn DestinationStore>,
}

impl ConvergenceEngine {
	pub fn new(
		config: EngineConfig,
		sources: SourceRegistry,
		destination: Arc<dyn DestinationStore>,
	) -> Self {
		Self {
			config,
			sources,
			destination,
		}
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Run one pass for `declared`, starting from the resource's `current`
	/// status. Returns the status to persist and the requeue directive.
	#[instrument(
		skip(self, declared, current),
		fields(resource = %declared.name, repository = %declared.repository, generation = declared.generation)
	)]
	pub async fn run_pass(
		&self,
		declared: &DeclaredState,
		current: &ConvergenceStatus,
	) -> PassOutcome {
		let generation = declared.generation;
		let mut report = PassReport::default();

		if current.is_ready_for(generation) {
			debug!("already ready for this generation, skipping pass");
			report.short_circuited = true;
			return PassOutcome {
				status: current.clone(),
				requeue: RequeueAction::None,
				report,
			};
		}

		let mut status = current.clone();
		let collection = Collection::new(&self.config.owner, &declared.repository);

		if declared.secrets.is_empty() {
			info!("no secrets declared");
			return ready_outcome(status, &collection, 0, report, generation);
		}

		let existing = match self.destination.list_secret_names(&collection).await {
			Ok(existing) => existing,
			Err(e) => {
				warn!(error = %e, "listing destination secrets failed");
				status.remove(ConditionType::Ready);
				status.clear_errors();
				status.set(Condition::new(
					ConditionType::DestinationError,
					true,
					reason::LIST_SECRETS_FAILED,
					truncate(format!("listing secrets in {collection} failed: {e}")),
					generation,
				));
				return PassOutcome {
					status,
					requeue: RequeueAction::Immediate,
					report,
				};
			}
		};

		let delta = PendingDelta::compute(&declared.secrets, &existing);
		report.pending = delta.len();
		info!(
			declared = declared.secrets.len(),
			existing = existing.len(),
			pending = delta.len(),
			"computed pending delta"
		);

		if delta.is_empty() {
			return ready_outcome(status, &collection, declared.secrets.len(), report, generation);
		}

		let mut recipient: Option<RecipientKey> = None;
		for secret in delta.iter() {
			if recipient.is_none() {
				match self.destination.recipient_key(&collection).await {
					Ok(key) => recipient = Some(key),
					Err(e) => {
						warn!(error = %e, "fetching recipient key failed");
						status.remove(ConditionType::Ready);
						status.clear_errors();
						status.set(Condition::new(
							ConditionType::DestinationError,
							true,
							reason::PUBLIC_KEY_FAILED,
							truncate(format!("fetching public key for {collection} failed: {e}")),
							generation,
						));
						return PassOutcome {
							status,
							requeue: RequeueAction::Immediate,
							report,
						};
					}
				}
			}
			let Some(key) = recipient.as_ref() else {
				continue;
			};

			match self.converge_item(&collection, secret, key).await {
				Ok(()) => {
					info!(secret = %secret.name, "secret uploaded");
					report.uploaded.push(secret.name.clone());
				}
				Err(failure) => {
					warn!(
						secret = %failure.name,
						kind = %failure.kind,
						error = %failure.message,
						"secret failed to converge"
					);
					report.failures.push(failure);
				}
			}
		}

		if report.failures.is_empty() {
			return ready_outcome(status, &collection, declared.secrets.len(), report, generation);
		}

		status.remove(ConditionType::Ready);
		// Error conditions from earlier passes describe items that may have
		// uploaded since; only this pass's failures are surfaced.
		status.clear_errors();
		for condition in failure_conditions(&report.failures, generation) {
			status.set(condition);
		}

		info!(
			uploaded = report.uploaded.len(),
			failed = report.failures.len(),
			retry_after_secs = self.config.retry_after.as_secs(),
			"pass finished with failures"
		);
		PassOutcome {
			status,
			requeue: RequeueAction::After(self.config.retry_after),
			report,
		}
	}

	/// Fetch, seal and upsert one secret. The plaintext is dropped (and
	/// zeroized) before this returns, whatever the outcome.
	async fn converge_item(
		&self,
		collection: &Collection,
		secret: &SecretRef,
		key: &RecipientKey,
	) -> Result<(), ItemFailure> {
		let failure = |kind: ConditionType, reason: &'static str, message: String| ItemFailure {
			name: secret.name.clone(),
			kind,
			reason,
			message,
		};

		let Some(source) = self.sources.get(&secret.source_kind) else {
			return Err(failure(
				ConditionType::SourceMissing,
				reason::SOURCE_NOT_CONFIGURED,
				format!("source {} is not configured", secret.source_kind),
			));
		};

		let value = source
			.get_value(&secret.source_key)
			.await
			.map_err(|e| failure(ConditionType::StoreError, reason::SOURCE_READ_FAILED, e.to_string()))?;

		let encrypted_value = seal(&key.key, value.value.expose()).map_err(|e| {
			failure(ConditionType::DestinationError, reason::SEAL_FAILED, e.to_string())
		})?;
		drop(value);

		let sealed = SealedSecret {
			name: secret.name.clone(),
			key_id: key.key_id.clone(),
			encrypted_value,
		};

		self.destination
			.upsert_secret(collection, &sealed)
			.await
			.map_err(|e| failure(ConditionType::DestinationError, reason::UPLOAD_FAILED, e.to_string()))
	}
}

fn ready_outcome(
	mut status: ConvergenceStatus,
	collection: &Collection,
	declared: usize,
	report: PassReport,
	generation: i64,
) -> PassOutcome {
	status.clear_errors();
	status.set(Condition::new(
		ConditionType::Ready,
		true,
		reason::RECONCILIATION_SUCCEEDED,
		format!("{declared} secret(s) synchronized to {collection}"),
		generation,
	));
	info!(uploaded = report.uploaded.len(), "declared secrets are ready");

	PassOutcome {
		status,
		requeue: RequeueAction::None,
		report,
	}
}

/// Fold item failures into one condition per type, naming every item.
fn failure_conditions(failures: &[ItemFailure], generation: i64) -> Vec<Condition> {
	let mut by_kind: BTreeMap<ConditionType, Vec<&ItemFailure>> = BTreeMap::new();
	for failure in failures {
		by_kind.entry(failure.kind).or_default().push(failure);
	}

	by_kind
		.into_iter()
		.map(|(kind, items)| {
			// Mixed seal and upload failures are reported as upload failures.
			let reason = match items.first() {
				Some(first) if items.iter().all(|f| f.reason == first.reason) => first.reason,
				_ => reason::UPLOAD_FAILED,
			};
			let details = items
				.iter()
				.map(|f| format!("{}: {}", f.name, f.message))
				.collect::<Vec<_>>()
				.join("; ");
			let message = format!("{} secret(s) failed: {details}", items.len());
			Condition::new(kind, true, reason, truncate(message), generation)
		})
		.collect()
}

fn truncate(mut message: String) -> String {
	if message.len() <= MAX_MESSAGE_LEN {
		return message;
	}
	let mut cut = MAX_MESSAGE_LEN - 3;
	while !message.is_char_boundary(cut) {
		cut -= 1;
	}
	message.truncate(cut);
	message.push_str("...");
	message
}
