// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reconciler for `GithubSecret` resources.
//!
//! Each reconcile runs one convergence pass, writes the resulting conditions
//! to the status subresource when they changed, and turns the pass's
//! requeue directive into a controller [`Action`]. The kube runtime runs at
//! most one reconcile per object at a time.
//!
//! With cleanup enabled, resources carry the [`FINALIZER`] and their
//! destination secrets are deleted before the resource is released.

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use ghsync_core::{ConditionType, ConvergenceStatus, RequeueAction};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Api, Client, ResourceExt};
use tracing::{debug, info, instrument, warn};

use crate::context::Context;
use crate::crd::{GithubSecret, GithubSecretStatus};
use crate::error::{ReconcileError, ReconcileResult};
use crate::status::{from_kube_conditions, to_kube_conditions};

pub const FINALIZER: &str = "ghsync.io/cleanup";

/// Map a pass's requeue directive to a controller action.
///
/// `Immediate` becomes an error so the controller's error policy applies
/// its shorter delay.
pub fn action_for(requeue: RequeueAction, status: &ConvergenceStatus) -> ReconcileResult<Action> {
	match requeue {
		RequeueAction::None => Ok(Action::await_change()),
		RequeueAction::After(delay) => Ok(Action::requeue(delay)),
		RequeueAction::Immediate => {
			let message = status
				.get(ConditionType::DestinationError)
				.map(|c| c.message.clone())
				.unwrap_or_else(|| "destination unavailable".to_string());
			Err(ReconcileError::PassFailed { message })
		}
	}
}

#[instrument(skip(resource, ctx), fields(resource = %resource.name_any(), generation = resource.metadata.generation))]
pub async fn reconcile(resource: Arc<GithubSecret>, ctx: Arc<Context>) -> ReconcileResult<Action> {
	let name = resource.name_any();
	let namespace = resource
		.namespace()
		.ok_or_else(|| ReconcileError::MissingNamespace { name: name.clone() })?;
	let has_finalizer = resource.finalizers().iter().any(|f| f == FINALIZER);

	if resource.metadata.deletion_timestamp.is_some() {
		if !has_finalizer {
			return Ok(Action::await_change());
		}
		return cleanup(&resource, &namespace, &name, &ctx).await;
	}

	if ctx.removal.is_some() && !has_finalizer {
		let mut finalizers = resource.finalizers().to_vec();
		finalizers.push(FINALIZER.to_string());
		ctx
			.resources
			.set_finalizers(&namespace, &name, finalizers, resource.resource_version())
			.await?;
		debug!("finalizer added");
	}

	apply(&resource, &namespace, &name, &ctx).await
}

async fn apply(
	resource: &GithubSecret,
	namespace: &str,
	name: &str,
	ctx: &Context,
) -> ReconcileResult<Action> {
	let previous = resource.conditions();
	let current = from_kube_conditions(previous);

	let outcome = ctx
		.engine
		.run_pass(&resource.declared_state(), &current)
		.await;

	let conditions = to_kube_conditions(&outcome.status, previous, &Time(Utc::now()));
	if conditions.as_slice() != previous {
		ctx
			.resources
			.patch_status(namespace, name, &GithubSecretStatus { conditions })
			.await?;
	}

	action_for(outcome.requeue, &outcome.status)
}

async fn cleanup(
	resource: &GithubSecret,
	namespace: &str,
	name: &str,
	ctx: &Context,
) -> ReconcileResult<Action> {
	match &ctx.removal {
		Some(removal) => {
			let outcome = removal.remove(&resource.declared_state()).await;
			if !outcome.is_complete() {
				warn!(
					failed = outcome.failures.len(),
					removed = outcome.removed.len(),
					"cleanup incomplete, keeping finalizer"
				);
				return action_for(outcome.requeue, &ConvergenceStatus::new());
			}
			info!(removed = outcome.removed.len(), "destination secrets removed");
		}
		None => {
			info!("cleanup disabled, releasing finalizer without touching the destination");
		}
	}

	let remaining: Vec<String> = resource
		.finalizers()
		.iter()
		.filter(|f| f.as_str() != FINALIZER)
		.cloned()
		.collect();
	ctx
		.resources
		.set_finalizers(namespace, name, remaining, resource.resource_version())
		.await?;
	Ok(Action::await_change())
}

pub fn error_policy(resource: Arc<GithubSecret>, error: &ReconcileError, ctx: Arc<Context>) -> Action {
	warn!(
		resource = %resource.name_any(),
		error = %error,
		requeue_secs = ctx.error_requeue.as_secs(),
		"reconcile failed"
	);
	Action::requeue(ctx.error_requeue)
}

/// Run the controller until a shutdown signal arrives.
pub async fn run(client: Client, ctx: Arc<Context>, namespace: Option<&str>) {
	let api: Api<GithubSecret> = match namespace {
		Some(ns) => Api::namespaced(client, ns),
		None => Api::all(client),
	};

	info!(namespace = namespace.unwrap_or("*"), "starting GithubSecret controller");
	Controller::new(api, watcher::Config::default())
		.shutdown_on_signal()
		.run(reconcile, error_policy, ctx)
		.for_each(|result| async move {
			match result {
				Ok((object, _)) => debug!(resource = %object.name, "reconciled"),
				Err(e) => debug!(error = %e, "reconcile error"),
			}
		})
		.await;
	info!("controller stopped");
}
