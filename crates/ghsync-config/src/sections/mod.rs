// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

pub mod controller;
pub mod gcp;
pub mod github;
pub mod logging;

pub use controller::{ControllerConfig, ControllerConfigLayer};
pub use gcp::{GcpConfig, GcpConfigLayer};
pub use github::{GithubConfig, GithubConfigLayer};
pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
