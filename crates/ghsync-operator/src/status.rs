// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conversion between engine conditions and `metav1.Condition`.

use ghsync_core::{Condition, ConditionType, ConvergenceStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{Condition as KubeCondition, Time};

fn status_str(status: bool) -> &'static str {
	if status {
		"True"
	} else {
		"False"
	}
}

/// Read the engine's view of a resource's conditions. Unknown types are
/// ignored.
pub fn from_kube_conditions(conditions: &[KubeCondition]) -> ConvergenceStatus {
	ConvergenceStatus::from_conditions(conditions.iter().filter_map(|c| {
		let condition_type = ConditionType::parse(&c.type_)?;
		Some(Condition::new(
			condition_type,
			c.status == "True",
			c.reason.clone(),
			c.message.clone(),
			c.observed_generation.unwrap_or_default(),
		))
	}))
}

/// Render `status` as Kubernetes conditions, merged into `previous`.
///
/// Conditions of types this operator does not own are kept, and existing
/// entries keep their position so an unchanged status compares equal.
/// `lastTransitionTime` is carried over from `previous` when a condition of
/// the same type had the same status, and set to `now` otherwise.
pub fn to_kube_conditions(
	status: &ConvergenceStatus,
	previous: &[KubeCondition],
	now: &Time,
) -> Vec<KubeCondition> {
	let mut rendered = render(status, previous, now);
	let mut merged = Vec::with_capacity(previous.len() + rendered.len());
	for p in previous {
		if ConditionType::parse(&p.type_).is_none() {
			merged.push(p.clone());
		} else if let Some(i) = rendered.iter().position(|c| c.type_ == p.type_) {
			merged.push(rendered.remove(i));
		}
	}
	merged.extend(rendered);
	merged
}

fn render(status: &ConvergenceStatus, previous: &[KubeCondition], now: &Time) -> Vec<KubeCondition> {
	status
		.conditions()
		.iter()
		.map(|c| {
			let type_ = c.condition_type.as_str();
			let status = status_str(c.status);
			let last_transition_time = previous
				.iter()
				.find(|p| p.type_ == type_ && p.status == status)
				.map(|p| p.last_transition_time.clone())
				.unwrap_or_else(|| now.clone());

			KubeCondition {
				type_: type_.to_string(),
				status: status.to_string(),
				reason: c.reason.clone(),
				message: c.message.clone(),
				observed_generation: Some(c.observed_generation),
				last_transition_time,
			}
		})
		.collect()
}
