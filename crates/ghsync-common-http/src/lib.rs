// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP plumbing for the GitHub and GCP adapters.
//!
//! - [`builder`]: a `reqwest` client builder carrying the ghsync User-Agent
//! - [`retry`]: exponential backoff with jitter for transient failures

mod client;
mod retry;

pub use client::{builder, new_client_with_timeout, user_agent};
pub use retry::{is_transient_status, retry, RetryConfig, RetryableError};
