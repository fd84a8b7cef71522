// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Kubernetes operator that keeps `GithubSecret` resources converged.

pub mod client;
pub mod context;
pub mod controller;
pub mod crd;
pub mod error;
pub mod kube_client;
pub mod status;

pub use client::GithubSecretClient;
pub use context::Context;
pub use controller::{action_for, error_policy, reconcile, run, FINALIZER};
pub use crd::{DependabotSecrets, GithubSecret, GithubSecretSpec, GithubSecretStatus, SecretEntry};
pub use error::{ReconcileError, ReconcileResult, SetupError};
pub use kube_client::KubeClient;
