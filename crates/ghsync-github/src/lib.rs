// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! GitHub repository secrets client for ghsync.
//!
//! [`GithubClient`] speaks the Dependabot and Actions secrets REST
//! endpoints; [`GithubSecretStore`] adapts it to the engine's
//! [`ghsync_core::DestinationStore`] contract.

pub mod client;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use client::GithubClient;
pub use config::{GithubConfig, SecretScope};
pub use error::GithubError;
pub use ghsync_common_http::RetryConfig;
pub use store::GithubSecretStore;
pub use types::{PublicKeyResponse, RepositorySecret, SecretListResponse};
