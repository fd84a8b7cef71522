// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Convergence engine for mirroring declared secrets into a CI platform.
//!
//! A pass takes a declared set of secret references and the destination's
//! current state, and drives every missing secret through
//! fetch → seal → upsert:
//!
//! 1. [`SecretValueSource`] reads the plaintext from a backing store
//! 2. [`seal`] encrypts it to the destination's current public key
//! 3. [`DestinationStore`] upserts the sealed value
//!
//! The outcome is folded into a [`ConvergenceStatus`] and a
//! [`RequeueAction`] for whatever loop invoked the pass. Passes are
//! stateless: nothing about the destination is cached between them.
//!
//! This crate knows nothing about Kubernetes or HTTP. The operator and the
//! `ghsync-github` / `ghsync-gcp` adapters plug in at the two traits.

mod delta;
mod destination;
mod engine;
mod error;
mod removal;
mod seal;
mod source;
mod status;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
mod types;

pub use delta::PendingDelta;
pub use destination::DestinationStore;
pub use engine::{
	ConvergenceEngine, EngineConfig, ItemFailure, PassOutcome, PassReport, RequeueAction,
	DEFAULT_RETRY_AFTER,
};
pub use error::{DestinationError, SealError, SourceError};
pub use removal::{RemovalEngine, RemovalOutcome};
pub use seal::{open, seal, KEY_SIZE, NONCE_SIZE};
pub use source::{SecretValueSource, SourceRegistry};
pub use status::{reason, Condition, ConditionType, ConvergenceStatus};
pub use types::{
	Collection, DeclaredState, ExistingSecretSet, RecipientKey, SealedSecret, SecretRef,
	SourceKind, SourceValue,
};
